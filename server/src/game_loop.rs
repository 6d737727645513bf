use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{Interval, MissedTickBehavior};
use vortex_shared::{ConnectionId, ErrorMsg, LaunchRequest, ServerMsg, WelcomeMsg};

use crate::broadcast::{Audience, Broadcast};
use crate::config::ServerConfig;
use crate::error::GatewayError;
use crate::session::SessionError;
use crate::state::GameState;

/// Commands from client connections to the game loop
#[derive(Debug)]
pub enum GameCommand {
    Join {
        response: oneshot::Sender<(ConnectionId, WelcomeMsg)>,
    },
    Launch {
        conn: ConnectionId,
        request: LaunchRequest,
    },
    Leave {
        conn: ConnectionId,
    },
}

fn routine_interval(period: Duration) -> Interval {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

/// Run the main game loop. Owns all game state.
///
/// Every routine tick and every command runs to completion before the next
/// one is picked, so the state needs no lock. The four routines keep their
/// own cadence and are not synchronized with each other. Returns once every
/// command sender has been dropped.
pub async fn run_game_loop<B: Broadcast>(
    mut cmd_rx: mpsc::Receiver<GameCommand>,
    mut out: B,
    server_config: ServerConfig,
) {
    let mut state = GameState::new(&server_config);

    let mut velocity = routine_interval(server_config.velocity_interval);
    let mut wormhole = routine_interval(server_config.wormhole_interval);
    let mut gem_check = routine_interval(server_config.gem_check_interval);
    let mut replenish = routine_interval(server_config.replenish_interval);

    loop {
        tokio::select! {
            _ = velocity.tick() => {
                report("integrate_velocity", state.integrate_velocity(&mut out));
            }

            _ = wormhole.tick() => {
                if let Some(dismissed) = report("check_wormhole", state.check_wormhole(&mut out)) {
                    for circle in dismissed {
                        tracing::debug!("Circle {} fell into the wormhole", circle.id);
                    }
                }
            }

            _ = gem_check.tick() => {
                if let Some(n) = report("check_gems", state.check_gems(&mut out)) {
                    if n > 0 {
                        tracing::debug!("{} gem(s) collected", n);
                    }
                }
            }

            _ = replenish.tick() => {
                if let Some(n) = report("replenish_gems", state.replenish_gems(&mut out)) {
                    if n > 0 {
                        tracing::debug!("Placed {} gem(s) for {} player(s)", n, state.store.player_count());
                    }
                }
            }

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(cmd) => handle_command(&mut state, cmd, &mut out),
                    None => break,
                }
            }
        }
    }

    tracing::info!("Game loop ended");
}

fn handle_command(state: &mut GameState, cmd: GameCommand, out: &mut impl Broadcast) {
    match cmd {
        GameCommand::Join { response } => {
            let (conn, welcome) = state.join();
            tracing::info!(
                "Player {} joined ({} connected)",
                conn,
                state.store.player_count()
            );
            if response.send((conn, welcome)).is_err() {
                // The socket went away before the welcome; undo the join.
                report("leave", state.leave(conn, out));
            }
        }
        GameCommand::Launch { conn, request } => match state.launch(conn, request, out) {
            Ok(id) => tracing::debug!("Player {} launched circle {}", conn, id),
            Err(SessionError::Rejected(e)) => {
                tracing::warn!("Rejected launch from player {}: {}", conn, e);
                let msg = ServerMsg::Error(ErrorMsg {
                    message: e.to_string(),
                });
                report("launch_rejection", out.send(Audience::Connection(conn), msg));
            }
            Err(SessionError::Gateway(e)) => {
                tracing::error!("launch broadcast failed: {}", e);
            }
        },
        GameCommand::Leave { conn } => {
            if let Some(removed) = report("leave", state.leave(conn, out)) {
                tracing::info!(
                    "Player {} left, {} circle(s) removed ({} connected)",
                    conn,
                    removed.len(),
                    state.store.player_count()
                );
            }
        }
    }
}

/// Log a failed tick and move on; one failing routine never stalls the others.
fn report<T>(routine: &str, result: Result<T, GatewayError>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::error!("{} failed: {}", routine, e);
            None
        }
    }
}

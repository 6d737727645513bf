//! Per-connection lifecycle: join, launch, leave.
//!
//! Ownership is an explicit map from connection to the circles it launched,
//! so two connections picking the same color never interfere.

use std::collections::HashMap;
use std::str::FromStr;

use vortex_shared::{Circle, CircleId, ConnectionId, LaunchRequest, ServerMsg};

use crate::broadcast::{Audience, Broadcast};
use crate::error::{GatewayError, LaunchError};
use crate::store::EntityStore;

/// What happens when a connection launches while it still owns a circle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LaunchPolicy {
    /// The previous circle is removed; a connection owns at most one.
    #[default]
    ReplacePrevious,
    /// Every circle stays in play and is removed when the owner leaves.
    AllowMany,
}

impl FromStr for LaunchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" | "replace_previous" | "single" => Ok(LaunchPolicy::ReplacePrevious),
            "many" | "allow_many" | "multi" => Ok(LaunchPolicy::AllowMany),
            other => Err(format!("unknown launch policy '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Joined, nothing in play
    Idle,
    /// Owns at least one circle still in play
    Active,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Rejected(#[from] LaunchError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Connected players and the circles they own
#[derive(Debug)]
pub struct Sessions {
    policy: LaunchPolicy,
    owned: HashMap<ConnectionId, Vec<CircleId>>,
    next_connection_id: ConnectionId,
}

impl Sessions {
    pub fn new(policy: LaunchPolicy) -> Self {
        Self {
            policy,
            owned: HashMap::new(),
            next_connection_id: 1,
        }
    }

    /// Register a new connection and count it as a player.
    pub fn join(&mut self, store: &mut EntityStore) -> ConnectionId {
        let id = self.next_connection_id;
        self.next_connection_id = self.next_connection_id.wrapping_add(1).max(1);
        self.owned.insert(id, Vec::new());
        store.add_player();
        id
    }

    /// Put a launched circle into play and tell everyone but the sender.
    pub fn launch(
        &mut self,
        store: &mut EntityStore,
        conn: ConnectionId,
        req: LaunchRequest,
        out: &mut impl Broadcast,
    ) -> Result<CircleId, SessionError> {
        validate_launch(&req)?;
        let owned = self
            .owned
            .get_mut(&conn)
            .ok_or(LaunchError::UnknownConnection(conn))?;

        match self.policy {
            LaunchPolicy::ReplacePrevious => {
                for prev in owned.drain(..) {
                    if store.remove_circle(prev).is_some() {
                        tracing::debug!("Connection {} replaced circle {}", conn, prev);
                    }
                }
            }
            LaunchPolicy::AllowMany => owned.retain(|id| store.contains_circle(*id)),
        }

        let id = store.push_circle(req);
        owned.push(id);

        out.send(
            Audience::RoomExcept(conn),
            ServerMsg::DrawChange {
                circles: store.circles().to_vec(),
            },
        )?;
        Ok(id)
    }

    /// Forget a connection, uncount it, and take its circles out of play.
    ///
    /// Unknown connections are ignored so a duplicate leave cannot skew the
    /// player count.
    pub fn leave(
        &mut self,
        store: &mut EntityStore,
        conn: ConnectionId,
        out: &mut impl Broadcast,
    ) -> Result<Vec<Circle>, GatewayError> {
        let Some(owned) = self.owned.remove(&conn) else {
            return Ok(Vec::new());
        };
        store.remove_player();

        let removed: Vec<Circle> = owned
            .into_iter()
            .filter_map(|id| store.remove_circle(id))
            .collect();

        if !removed.is_empty() {
            out.send(
                Audience::RoomExcept(conn),
                ServerMsg::DrawChange {
                    circles: store.circles().to_vec(),
                },
            )?;
        }
        Ok(removed)
    }

    pub fn state(&self, store: &EntityStore, conn: ConnectionId) -> Option<ConnectionState> {
        let owned = self.owned.get(&conn)?;
        if owned.iter().any(|id| store.contains_circle(*id)) {
            Some(ConnectionState::Active)
        } else {
            Some(ConnectionState::Idle)
        }
    }

    pub fn owned(&self, conn: ConnectionId) -> &[CircleId] {
        self.owned.get(&conn).map(Vec::as_slice).unwrap_or(&[])
    }
}

pub fn validate_launch(req: &LaunchRequest) -> Result<(), LaunchError> {
    let fields = [
        ("x", req.x),
        ("y", req.y),
        ("vx", req.vx),
        ("vy", req.vy),
        ("radius", req.radius),
    ];
    if let Some(&(name, _)) = fields.iter().find(|(_, v)| !v.is_finite()) {
        return Err(LaunchError::NonFinite(name));
    }
    if req.radius <= 0.0 {
        return Err(LaunchError::InvalidRadius(req.radius));
    }
    if req.color.trim().is_empty() {
        return Err(LaunchError::EmptyColor);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::Envelope;

    fn req(color: &str) -> LaunchRequest {
        LaunchRequest {
            x: 40.0,
            y: 60.0,
            vx: 1.0,
            vy: 0.5,
            radius: 4.0,
            color: color.to_string(),
        }
    }

    #[test]
    fn join_counts_players_and_starts_idle() {
        let mut store = EntityStore::new();
        let mut sessions = Sessions::new(LaunchPolicy::default());
        let a = sessions.join(&mut store);
        let b = sessions.join(&mut store);
        assert_ne!(a, b);
        assert_eq!(store.player_count(), 2);
        assert_eq!(sessions.state(&store, a), Some(ConnectionState::Idle));
    }

    #[test]
    fn launch_broadcasts_to_everyone_but_sender() {
        let mut store = EntityStore::new();
        let mut sessions = Sessions::new(LaunchPolicy::default());
        let a = sessions.join(&mut store);
        let mut out: Vec<Envelope> = Vec::new();

        let id = sessions.launch(&mut store, a, req("red"), &mut out).unwrap();

        assert_eq!(sessions.state(&store, a), Some(ConnectionState::Active));
        assert_eq!(sessions.owned(a), &[id]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].audience, Audience::RoomExcept(a));
        match &out[0].msg {
            ServerMsg::DrawChange { circles } => {
                assert_eq!(circles.len(), 1);
                assert_eq!(circles[0].id, id);
            }
            other => panic!("Expected DrawChange, got {:?}", other),
        }
    }

    #[test]
    fn malformed_launch_leaves_state_untouched() {
        let mut store = EntityStore::new();
        let mut sessions = Sessions::new(LaunchPolicy::default());
        let a = sessions.join(&mut store);
        let mut out: Vec<Envelope> = Vec::new();

        let mut bad = req("red");
        bad.vx = f64::NAN;
        assert!(matches!(
            sessions.launch(&mut store, a, bad, &mut out),
            Err(SessionError::Rejected(LaunchError::NonFinite("vx")))
        ));

        let mut bad = req("red");
        bad.radius = 0.0;
        assert!(matches!(
            sessions.launch(&mut store, a, bad, &mut out),
            Err(SessionError::Rejected(LaunchError::InvalidRadius(_)))
        ));

        assert!(matches!(
            sessions.launch(&mut store, a, req("  "), &mut out),
            Err(SessionError::Rejected(LaunchError::EmptyColor))
        ));

        assert!(store.circles().is_empty());
        assert!(out.is_empty());
        assert_eq!(sessions.state(&store, a), Some(ConnectionState::Idle));
    }

    #[test]
    fn launch_from_unknown_connection_is_rejected() {
        let mut store = EntityStore::new();
        let mut sessions = Sessions::new(LaunchPolicy::default());
        let result = sessions.launch(&mut store, 77, req("red"), &mut Vec::<Envelope>::new());
        assert!(matches!(
            result,
            Err(SessionError::Rejected(LaunchError::UnknownConnection(77)))
        ));
        assert!(store.circles().is_empty());
    }

    #[test]
    fn replace_previous_keeps_one_circle_per_connection() {
        let mut store = EntityStore::new();
        let mut sessions = Sessions::new(LaunchPolicy::ReplacePrevious);
        let a = sessions.join(&mut store);
        let first = sessions.launch(&mut store, a, req("red"), &mut Vec::<Envelope>::new()).unwrap();
        let second = sessions.launch(&mut store, a, req("red"), &mut Vec::<Envelope>::new()).unwrap();

        assert!(!store.contains_circle(first));
        assert!(store.contains_circle(second));
        assert_eq!(store.circles().len(), 1);
        assert_eq!(sessions.owned(a), &[second]);
    }

    #[test]
    fn allow_many_keeps_every_circle_until_leave() {
        let mut store = EntityStore::new();
        let mut sessions = Sessions::new(LaunchPolicy::AllowMany);
        let a = sessions.join(&mut store);
        let b = sessions.join(&mut store);
        sessions.launch(&mut store, a, req("red"), &mut Vec::<Envelope>::new()).unwrap();
        sessions.launch(&mut store, a, req("red"), &mut Vec::<Envelope>::new()).unwrap();
        let other = sessions.launch(&mut store, b, req("red"), &mut Vec::<Envelope>::new()).unwrap();
        assert_eq!(store.circles().len(), 3);

        let removed = sessions.leave(&mut store, a, &mut Vec::<Envelope>::new()).unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(store.circles().len(), 1);
        assert!(store.contains_circle(other));
    }

    #[test]
    fn leave_removes_only_own_circle_even_with_shared_color() {
        let mut store = EntityStore::new();
        let mut sessions = Sessions::new(LaunchPolicy::default());
        let a = sessions.join(&mut store);
        let b = sessions.join(&mut store);
        let mine = sessions.launch(&mut store, a, req("blue"), &mut Vec::<Envelope>::new()).unwrap();
        let theirs = sessions.launch(&mut store, b, req("blue"), &mut Vec::<Envelope>::new()).unwrap();
        let mut out: Vec<Envelope> = Vec::new();

        let removed = sessions.leave(&mut store, a, &mut out).unwrap();

        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id, mine);
        assert!(store.contains_circle(theirs));
        assert_eq!(store.player_count(), 1);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].audience, Audience::RoomExcept(a));
    }

    #[test]
    fn idle_leave_is_silent() {
        let mut store = EntityStore::new();
        let mut sessions = Sessions::new(LaunchPolicy::default());
        let a = sessions.join(&mut store);
        let mut out: Vec<Envelope> = Vec::new();
        assert!(sessions.leave(&mut store, a, &mut out).unwrap().is_empty());
        assert!(out.is_empty());
        assert_eq!(store.player_count(), 0);
        assert_eq!(sessions.state(&store, a), None);
    }

    #[test]
    fn leave_after_circle_was_consumed_removes_nothing() {
        let mut store = EntityStore::new();
        let mut sessions = Sessions::new(LaunchPolicy::default());
        let a = sessions.join(&mut store);
        let b = sessions.join(&mut store);
        let mine = sessions.launch(&mut store, a, req("red"), &mut Vec::<Envelope>::new()).unwrap();
        let theirs = sessions.launch(&mut store, b, req("red"), &mut Vec::<Envelope>::new()).unwrap();
        store.remove_circle(mine);
        assert_eq!(sessions.state(&store, a), Some(ConnectionState::Idle));

        let removed = sessions.leave(&mut store, a, &mut Vec::<Envelope>::new()).unwrap();
        assert!(removed.is_empty());
        assert!(store.contains_circle(theirs));
    }

    #[test]
    fn duplicate_leave_does_not_skew_player_count() {
        let mut store = EntityStore::new();
        let mut sessions = Sessions::new(LaunchPolicy::default());
        let a = sessions.join(&mut store);
        sessions.join(&mut store);
        sessions.leave(&mut store, a, &mut Vec::<Envelope>::new()).unwrap();
        sessions.leave(&mut store, a, &mut Vec::<Envelope>::new()).unwrap();
        assert_eq!(store.player_count(), 1);
    }

    #[test]
    fn launch_policy_parses_from_env_strings() {
        assert_eq!("replace".parse::<LaunchPolicy>(), Ok(LaunchPolicy::ReplacePrevious));
        assert_eq!("ALLOW_MANY".parse::<LaunchPolicy>(), Ok(LaunchPolicy::AllowMany));
        assert!("sometimes".parse::<LaunchPolicy>().is_err());
    }
}

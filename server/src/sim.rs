//! The four periodic vortex routines.
//!
//! Each routine runs to completion over the store before returning, and is a
//! no-op on an empty collection. They are scheduled independently by the game
//! loop and never assume another routine ran in between.

use rand::Rng;
use vortex_shared::{Circle, Gem, ServerMsg, VortexConfig};

use crate::broadcast::{Audience, Broadcast};
use crate::error::GatewayError;
use crate::geometry::{distance, pull_ratios};
use crate::store::EntityStore;

/// Pull every circle toward the center, damp it, and move it.
///
/// Broadcasts the full circle list once per pass when any circle exists.
pub fn integrate_velocity(
    store: &mut EntityStore,
    config: &VortexConfig,
    out: &mut impl Broadcast,
) -> Result<(), GatewayError> {
    if store.circles().is_empty() {
        return Ok(());
    }

    for circle in store.circles_mut() {
        apply_vortex(circle, config);
    }

    out.send(
        Audience::Room,
        ServerMsg::DrawChange {
            circles: store.circles().to_vec(),
        },
    )
}

fn apply_vortex(circle: &mut Circle, config: &VortexConfig) {
    let dist_x = (config.center_x - circle.x).abs();
    let dist_y = (config.center_y - circle.y).abs();
    let (rat_x, rat_y) = pull_ratios(dist_x, dist_y);

    if circle.y > config.center_y {
        circle.vy -= config.pull_strength * rat_y;
    } else {
        circle.vy += config.pull_strength * rat_y;
    }
    if circle.x > config.center_x {
        circle.vx -= config.pull_strength * rat_x;
    } else {
        circle.vx += config.pull_strength * rat_x;
    }

    circle.vx *= config.damping;
    circle.vy *= config.damping;
    circle.x += circle.vx;
    circle.y += circle.vy;
}

/// Remove every circle that has reached the wormhole.
///
/// For each consumed circle, in list order: `ballDismissed` with the circle,
/// then `drawChange` with the list after its removal. Returns the dismissed
/// circles.
pub fn check_wormhole(
    store: &mut EntityStore,
    config: &VortexConfig,
    out: &mut impl Broadcast,
) -> Result<Vec<Circle>, GatewayError> {
    let hits: Vec<usize> = store
        .circles()
        .iter()
        .enumerate()
        .filter(|(_, c)| {
            distance(c.x, c.y, config.center_x, config.center_y)
                <= c.radius * config.wormhole_factor
        })
        .map(|(i, _)| i)
        .collect();

    let mut dismissed = Vec::with_capacity(hits.len());
    // Indices were collected before any removal; shift by how many went already.
    for (removed, idx) in hits.into_iter().enumerate() {
        let Some(circle) = store.remove_circle_at(idx - removed) else {
            continue;
        };
        out.send(
            Audience::Room,
            ServerMsg::BallDismissed {
                circle: circle.clone(),
            },
        )?;
        out.send(
            Audience::Room,
            ServerMsg::DrawChange {
                circles: store.circles().to_vec(),
            },
        )?;
        dismissed.push(circle);
    }

    Ok(dismissed)
}

/// Let every circle collect every gem it touches.
///
/// Gem coordinates are scaled by `gem_scale` first. For each collected gem:
/// `scoredGem` with the collecting circle, then `gemsChange` with the list
/// after removal. A gem collected by one circle is gone for the circles after
/// it. Returns how many gems were collected.
pub fn check_gems(
    store: &mut EntityStore,
    config: &VortexConfig,
    out: &mut impl Broadcast,
) -> Result<usize, GatewayError> {
    if store.circles().is_empty() || store.gems().is_empty() {
        return Ok(0);
    }

    let mut collected = 0;
    for ci in 0..store.circles().len() {
        let circle = store.circles()[ci].clone();
        let reach = circle.radius * config.gem_hit_factor;
        let hits: Vec<usize> = store
            .gems()
            .iter()
            .enumerate()
            .filter(|(_, g)| gem_distance(&circle, g, config.gem_scale) <= reach)
            .map(|(i, _)| i)
            .collect();

        for (removed, idx) in hits.into_iter().enumerate() {
            if store.remove_gem_at(idx - removed).is_none() {
                continue;
            }
            collected += 1;
            out.send(
                Audience::Room,
                ServerMsg::ScoredGem {
                    circle: circle.clone(),
                },
            )?;
            out.send(
                Audience::Room,
                ServerMsg::GemsChange {
                    gems: store.gems().to_vec(),
                },
            )?;
        }
    }

    Ok(collected)
}

fn gem_distance(circle: &Circle, gem: &Gem, scale: f64) -> f64 {
    distance(
        circle.x,
        circle.y,
        f64::from(gem.x) * scale,
        f64::from(gem.y) * scale,
    )
}

/// Top the gem list up to `gems_per_player` per connected player.
///
/// Broadcasts the full gem list once if anything was added. Returns how many
/// gems were added.
pub fn replenish_gems(
    store: &mut EntityStore,
    config: &VortexConfig,
    rng: &mut impl Rng,
    out: &mut impl Broadcast,
) -> Result<usize, GatewayError> {
    let target = store.player_count() * config.gems_per_player;
    let before = store.gems().len();

    while store.gems().len() < target {
        store.push_gem(Gem {
            x: rng.gen_range(config.gem_min..config.gem_max),
            y: rng.gen_range(config.gem_min..config.gem_max),
        });
    }

    let added = store.gems().len() - before;
    if added > 0 {
        out.send(
            Audience::Room,
            ServerMsg::GemsChange {
                gems: store.gems().to_vec(),
            },
        )?;
    }
    Ok(added)
}

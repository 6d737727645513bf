use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::config::VortexConfig;

/// Protocol version - increment when making breaking changes.
pub const PROTOCOL_VERSION: u32 = 1;

/// Server-assigned circle identity
pub type CircleId = u32;

/// Server-assigned connection identity
pub type ConnectionId = u32;

// === Entities ===

/// A launched retriever
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
pub struct Circle {
    pub id: CircleId,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub radius: f64,
    pub color: String,
}

impl Circle {
    pub fn from_launch(id: CircleId, req: LaunchRequest) -> Self {
        Self {
            id,
            x: req.x,
            y: req.y,
            vx: req.vx,
            vy: req.vy,
            radius: req.radius,
            color: req.color,
        }
    }
}

/// A collectible. Coordinates live in the oversized gem space and are scaled
/// down by `VortexConfig::gem_scale` when compared with circles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
pub struct Gem {
    pub x: i32,
    pub y: i32,
}

// === Server -> Client ===

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(tag = "type")]
pub enum ServerMsg {
    #[serde(rename = "welcome")]
    Welcome(WelcomeMsg),
    #[serde(rename = "drawChange")]
    DrawChange { circles: Vec<Circle> },
    #[serde(rename = "ballDismissed")]
    BallDismissed { circle: Circle },
    #[serde(rename = "scoredGem")]
    ScoredGem { circle: Circle },
    #[serde(rename = "gemsChange")]
    GemsChange { gems: Vec<Gem> },
    #[serde(rename = "error")]
    Error(ErrorMsg),
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct WelcomeMsg {
    pub protocol_version: u32,
    pub self_id: ConnectionId,
    pub circles: Vec<Circle>,
    pub gems: Vec<Gem>,
    pub config: VortexConfig,
}

/// Sent only to the connection whose message was rejected
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
pub struct ErrorMsg {
    pub message: String,
}

// === Client -> Server ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
pub struct LaunchRequest {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub radius: f64,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(tag = "type")]
pub enum ClientMsg {
    #[serde(rename = "addCircle")]
    AddCircle(LaunchRequest),
}

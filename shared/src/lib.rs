//! Wire types and tunables shared between the vortex server and its clients.

pub mod config;
pub mod protocol;

pub use config::VortexConfig;
pub use protocol::{
    Circle, CircleId, ClientMsg, ConnectionId, ErrorMsg, Gem, LaunchRequest, ServerMsg,
    WelcomeMsg, PROTOCOL_VERSION,
};

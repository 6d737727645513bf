//! Room-scoped delivery of server messages.
//!
//! The game loop never touches sockets. It hands `ServerMsg`s to a
//! [`Broadcast`] sink together with an [`Audience`]; the production sink
//! ([`Gateway`]) encodes once and fans out over a tokio broadcast channel,
//! and every WebSocket task keeps only what is addressed to it.

use tokio::sync::broadcast;
use vortex_shared::{ConnectionId, ServerMsg};

use crate::error::GatewayError;

/// Who should receive a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// Every member of the room
    Room,
    /// Every member of the room except the sender
    RoomExcept(ConnectionId),
    /// A single connection
    Connection(ConnectionId),
}

impl Audience {
    pub fn includes(&self, id: ConnectionId) -> bool {
        match *self {
            Audience::Room => true,
            Audience::RoomExcept(sender) => sender != id,
            Audience::Connection(target) => target == id,
        }
    }
}

/// Anything the simulation and session code can emit to
pub trait Broadcast {
    fn send(&mut self, audience: Audience, msg: ServerMsg) -> Result<(), GatewayError>;
}

/// An encoded message on its way to the WebSocket tasks
#[derive(Debug, Clone)]
pub struct Outbound {
    pub audience: Audience,
    pub payload: String,
}

/// Production sink over the tokio broadcast channel
#[derive(Clone)]
pub struct Gateway {
    tx: broadcast::Sender<Outbound>,
}

impl Gateway {
    pub fn new(tx: broadcast::Sender<Outbound>) -> Self {
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Outbound> {
        self.tx.subscribe()
    }
}

impl Broadcast for Gateway {
    fn send(&mut self, audience: Audience, msg: ServerMsg) -> Result<(), GatewayError> {
        let payload = serde_json::to_string(&msg)?;
        // An empty room has no receivers; that is not a failure.
        let _ = self.tx.send(Outbound { audience, payload });
        Ok(())
    }
}

/// A message captured by the recording sink
#[derive(Debug, Clone)]
pub struct Envelope {
    pub audience: Audience,
    pub msg: ServerMsg,
}

impl Broadcast for Vec<Envelope> {
    fn send(&mut self, audience: Audience, msg: ServerMsg) -> Result<(), GatewayError> {
        self.push(Envelope { audience, msg });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vortex_shared::Gem;

    #[test]
    fn audience_filters_connections() {
        assert!(Audience::Room.includes(1));
        assert!(!Audience::RoomExcept(1).includes(1));
        assert!(Audience::RoomExcept(1).includes(2));
        assert!(Audience::Connection(2).includes(2));
        assert!(!Audience::Connection(2).includes(3));
    }

    #[test]
    fn gateway_encodes_once_for_all_subscribers() {
        let (tx, _) = broadcast::channel(8);
        let mut gateway = Gateway::new(tx);
        let mut rx1 = gateway.subscribe();
        let mut rx2 = gateway.subscribe();

        gateway
            .send(
                Audience::Room,
                ServerMsg::GemsChange {
                    gems: vec![Gem { x: 600, y: 900 }],
                },
            )
            .unwrap();

        let a = rx1.try_recv().unwrap();
        let b = rx2.try_recv().unwrap();
        assert_eq!(a.payload, b.payload);
        assert!(a.payload.contains("\"type\":\"gemsChange\""));
        assert_eq!(a.audience, Audience::Room);
    }

    #[test]
    fn gateway_without_subscribers_is_ok() {
        let (tx, rx) = broadcast::channel(8);
        drop(rx);
        let mut gateway = Gateway::new(tx);
        assert!(gateway
            .send(Audience::Room, ServerMsg::DrawChange { circles: vec![] })
            .is_ok());
    }
}

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use vortex_shared::{
    Circle, CircleId, ConnectionId, LaunchRequest, VortexConfig, WelcomeMsg, PROTOCOL_VERSION,
};

use crate::broadcast::Broadcast;
use crate::config::ServerConfig;
use crate::error::GatewayError;
use crate::session::{SessionError, Sessions};
use crate::sim;
use crate::store::EntityStore;

/// Central game state owned by the game loop task.
pub struct GameState {
    pub store: EntityStore,
    pub sessions: Sessions,
    pub config: VortexConfig,
    pub rng: ChaCha8Rng,
}

impl GameState {
    pub fn new(server_config: &ServerConfig) -> Self {
        let rng = match server_config.rng_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            store: EntityStore::new(),
            sessions: Sessions::new(server_config.launch_policy),
            config: server_config.vortex,
            rng,
        }
    }

    /// Register a connection, returning its id and the welcome it should get.
    pub fn join(&mut self) -> (ConnectionId, WelcomeMsg) {
        let id = self.sessions.join(&mut self.store);
        let welcome = WelcomeMsg {
            protocol_version: PROTOCOL_VERSION,
            self_id: id,
            circles: self.store.circles().to_vec(),
            gems: self.store.gems().to_vec(),
            config: self.config,
        };
        (id, welcome)
    }

    pub fn launch(
        &mut self,
        conn: ConnectionId,
        req: LaunchRequest,
        out: &mut impl Broadcast,
    ) -> Result<CircleId, SessionError> {
        self.sessions.launch(&mut self.store, conn, req, out)
    }

    pub fn leave(
        &mut self,
        conn: ConnectionId,
        out: &mut impl Broadcast,
    ) -> Result<Vec<Circle>, GatewayError> {
        self.sessions.leave(&mut self.store, conn, out)
    }

    pub fn integrate_velocity(&mut self, out: &mut impl Broadcast) -> Result<(), GatewayError> {
        sim::integrate_velocity(&mut self.store, &self.config, out)
    }

    pub fn check_wormhole(&mut self, out: &mut impl Broadcast) -> Result<Vec<Circle>, GatewayError> {
        sim::check_wormhole(&mut self.store, &self.config, out)
    }

    pub fn check_gems(&mut self, out: &mut impl Broadcast) -> Result<usize, GatewayError> {
        sim::check_gems(&mut self.store, &self.config, out)
    }

    pub fn replenish_gems(&mut self, out: &mut impl Broadcast) -> Result<usize, GatewayError> {
        sim::replenish_gems(&mut self.store, &self.config, &mut self.rng, out)
    }
}

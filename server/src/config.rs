use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use vortex_shared::VortexConfig;

use crate::session::LaunchPolicy;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Directory holding `index.html`, `vortex.jpg` and `gem.png`
    pub assets_dir: PathBuf,
    /// Gem placement seed; `None` draws one from the OS
    pub rng_seed: Option<u64>,
    pub velocity_interval: Duration,
    pub wormhole_interval: Duration,
    pub gem_check_interval: Duration,
    pub replenish_interval: Duration,
    pub launch_policy: LaunchPolicy,
    pub max_connections: usize,
    /// Inbound frames above this size close the connection
    pub max_message_bytes: usize,
    /// Undecodable frames tolerated before the connection is closed
    pub max_parse_errors: u32,
    pub vortex: VortexConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".to_string(),
            assets_dir: PathBuf::from("client"),
            rng_seed: None,
            velocity_interval: Duration::from_millis(20),
            wormhole_interval: Duration::from_millis(60),
            gem_check_interval: Duration::from_millis(40),
            replenish_interval: Duration::from_millis(3000),
            launch_policy: LaunchPolicy::ReplacePrevious,
            max_connections: 500,
            max_message_bytes: 1024,
            max_parse_errors: 5,
            vortex: VortexConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        let bind = std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env_parse::<u16>("PORT")
            .or_else(|| env_parse::<u16>("NODE_PORT"))
            .filter(|p| {
                if *p == 0 {
                    tracing::warn!("PORT must be > 0, using default");
                }
                *p > 0
            })
            .unwrap_or(3000);
        config.listen_addr = format!("{}:{}", bind, port);

        if let Ok(dir) = std::env::var("ASSETS_DIR") {
            config.assets_dir = PathBuf::from(dir);
        }
        if let Some(seed) = env_parse::<u64>("VORTEX_SEED") {
            config.rng_seed = Some(seed);
        }
        if let Some(policy) = env_parse::<LaunchPolicy>("LAUNCH_POLICY") {
            config.launch_policy = policy;
        }
        if let Some(max) = env_parse::<usize>("MAX_CONNECTIONS") {
            if max > 0 {
                config.max_connections = max;
            } else {
                tracing::warn!("MAX_CONNECTIONS must be > 0, using default");
            }
        }

        config
    }

    pub fn validate(&self) -> Result<(), String> {
        let intervals = [
            ("velocity_interval", self.velocity_interval),
            ("wormhole_interval", self.wormhole_interval),
            ("gem_check_interval", self.gem_check_interval),
            ("replenish_interval", self.replenish_interval),
        ];
        for (name, interval) in intervals {
            if interval.is_zero() {
                return Err(format!("{} must be > 0", name));
            }
        }
        if self.max_connections == 0 {
            return Err("max_connections must be > 0".to_string());
        }
        if self.max_message_bytes == 0 {
            return Err("max_message_bytes must be > 0".to_string());
        }
        self.vortex.validate()
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("Invalid {} '{}', using default", key, raw);
            None
        }
    }
}

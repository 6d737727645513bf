use thiserror::Error;
use vortex_shared::ConnectionId;

/// Why a launch payload was refused. Reported only to the sender.
#[derive(Debug, Error, PartialEq)]
pub enum LaunchError {
    #[error("field `{0}` must be a finite number")]
    NonFinite(&'static str),

    #[error("radius must be > 0, got {0}")]
    InvalidRadius(f64),

    #[error("color must not be empty")]
    EmptyColor,

    #[error("unknown connection {0}")]
    UnknownConnection(ConnectionId),
}

/// Failure to hand a message to the transport.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Failure to read a static asset from disk.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read asset {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_error_display_names_the_field() {
        let msg = LaunchError::NonFinite("vx").to_string();
        assert!(msg.contains("vx"));
        assert!(LaunchError::InvalidRadius(-1.0).to_string().contains("-1"));
    }

    #[test]
    fn asset_error_display_includes_path() {
        let e = AssetError::Read {
            path: "assets/gem.png".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(e.to_string().contains("assets/gem.png"));
    }
}

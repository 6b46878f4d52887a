use thiserror::Error;

/// Failure of a remote API call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("could not decode response from {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("invalid request URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Failure to decode a Mapbox Vector Tile.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TileError {
    #[error("malformed vector tile: {0}")]
    Malformed(String),

    #[error("vector tile layer {layer} unreadable: {reason}")]
    Layer { layer: usize, reason: String },
}

use thiserror::Error;

use crate::layer::LayerId;

/// Errors surfaced by the painting engine.
///
/// Structural mistakes (unknown layer ids, deleting the last layer, ...) are not
/// errors: they are logged and treated as no-ops. Only failures the caller has
/// to act on end up here.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A writable pixel surface could not be obtained
    #[error("cannot allocate a {width}x{height} surface")]
    SurfaceAllocation { width: u32, height: u32 },

    /// A history payload could not be decoded
    #[error("malformed pixel diff: {0}")]
    MalformedDiff(String),

    #[error("layer {0} not found")]
    LayerNotFound(LayerId),

    #[error("no layer is selected")]
    NoActiveLayer,

    /// The layer has an offloaded fill in flight
    #[error("layer {0} is busy with a pending fill")]
    LayerBusy(LayerId),

    #[error("invalid color {0:?}")]
    InvalidColor(String),

    /// The fill worker went away without delivering a result
    #[error("fill worker disconnected before returning a result")]
    FillCanceled,

    #[error("failed to spawn fill worker: {0}")]
    WorkerSpawn(#[from] std::io::Error),

    #[error("failed to encode image: {0}")]
    Encode(#[from] image::ImageError),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

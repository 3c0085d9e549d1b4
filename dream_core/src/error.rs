use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by the engine core.
///
/// Transient conditions (lock contention, unmet task dependencies) are not
/// errors; they are modelled as task deferral and never appear here.
#[derive(Debug, Error)]
pub enum DreamError {
    /// Programming error in scene construction, e.g. duplicating the root
    /// entity or spawning from an unknown template uuid. Fatal for the
    /// operation that raised it.
    #[error("structural error: {0}")]
    Structural(String),

    /// An asset runtime failed to materialize from its definition.
    /// The runtime is left unloaded; the owning entity keeps running.
    #[error("asset {uuid} failed to load: {reason}")]
    AssetLoad { uuid: Uuid, reason: String },

    /// The script VM reported a failed call. Recorded as sticky state on
    /// the script runtime by the caller.
    #[error("script error: {0}")]
    Script(String),

    /// A subsystem failed to initialise. Fatal at startup.
    #[error("subsystem init failed: {0}")]
    SubsystemInit(String),

    #[error("definition error: {0}")]
    Definition(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DreamError>;

//! # Drive control module
//!
//! Drive control runs the steering loop for one driving session. Each telemetry event from the
//! simulator is passed through the PID controller to produce a saturated steering command, and the
//! cross-track error is scored over fixed-length episodes. While tuning is active the end of each
//! episode hands the score to the [`TwiddleTuner`](crate::twiddle::TwiddleTuner), asks the
//! simulator to reset, and the gains it chose are applied on the first tick of the next episode.
//!
//! All state belongs to a single [`DriveCtrl`] instance, so independent sessions are independent
//! instances.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;
mod telemetry;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use params::Params;
pub use state::*;
pub use telemetry::*;

use util::params::LoadError;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during DriveCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum DriveCtrlError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(LoadError),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Could not create the archive: {0}")]
    ArchiveError(std::io::Error),

    #[error("Could not serialize the episode report: {0}")]
    SerializationError(serde_json::Error),

    /// The telemetry couldn't be read, the tick is skipped.
    #[error("Invalid telemetry: {0}")]
    TelemetryError(TelemetryError)
}

impl From<TelemetryError> for DriveCtrlError {
    fn from(e: TelemetryError) -> Self {
        DriveCtrlError::TelemetryError(e)
    }
}

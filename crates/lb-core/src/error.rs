//! Errors that abort a pipeline run.

use thiserror::Error;

use crate::publisher::PublishError;
use crate::template::LookupFailure;

/// A listener failed; the run stops at the first one.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A report's template path, including its fallback, is undefined.
    #[error(transparent)]
    Lookup(#[from] LookupFailure),

    /// Rendering or writing a page failed.
    #[error(transparent)]
    Publish(#[from] PublishError),
}

//! Counter error types

use crate::render::RenderError;
use crate::storage::StorageError;
use thiserror::Error;

/// Errors raised while updating or rendering a page's counter
#[derive(Error, Debug)]
pub enum CounterError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),
}

pub type CounterResult<T> = Result<T, CounterError>;

//! Library error type.

use thiserror::Error;

use crate::beautify::BeautifyError;

#[derive(Debug, Error)]
pub enum Error {
    /// The beautifier rejected the document.
    #[error(transparent)]
    Beautify(#[from] BeautifyError),

    /// The syntax definition could not be loaded or applied.
    #[error("highlighting failed: {0}")]
    Highlight(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

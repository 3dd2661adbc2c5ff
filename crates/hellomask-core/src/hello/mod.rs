pub mod assembler;
pub mod codec;
pub mod consts;
pub mod engine;
pub mod extensions;
pub mod grease;
pub mod inspect;
pub mod ja3;
pub mod serialize;
pub mod synthetic;
pub mod types;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HelloError {
    /// The caller's buffer cannot hold the framed output. Nothing was written.
    #[error("buffer too small: need {needed} bytes, got {available}")]
    BufferTooSmall { needed: usize, available: usize },
    #[error("invalid hello spec: {0}")]
    InvalidSpec(String),
    #[error("malformed extension data: {0}")]
    Malformed(String),
}

use crate::edit::PatchError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    #[error("invalid import path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error("invalid import alias {alias:?} for {path:?}")]
    InvalidAlias { path: String, alias: String },

    #[error("import block offset {offset} is outside the buffer (len {len})")]
    InvalidOffset { offset: usize, len: usize },

    #[error(transparent)]
    Patch(#[from] PatchError),
}

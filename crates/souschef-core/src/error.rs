//! Error taxonomy for the core crate.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SousChefError>;

/// Coarse classification used by callers to pick a client/server response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Internal,
}

#[derive(Error, Debug)]
pub enum SousChefError {
    #[error("Recipe not found: {0}")]
    RecipeNotFound(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Message cannot be empty")]
    EmptyMessage,

    #[error("Session storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid recipe data: {0}")]
    InvalidRecipeData(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl SousChefError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RecipeNotFound(_) | Self::SessionNotFound(_) => ErrorKind::NotFound,
            Self::EmptyMessage => ErrorKind::Validation,
            _ => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(SousChefError::RecipeNotFound("x".into()).kind(), ErrorKind::NotFound);
        assert_eq!(SousChefError::SessionNotFound("y".into()).kind(), ErrorKind::NotFound);
        assert_eq!(SousChefError::EmptyMessage.kind(), ErrorKind::Validation);
        assert_eq!(
            SousChefError::InvalidRecipeData("bad".into()).kind(),
            ErrorKind::Internal
        );
    }
}

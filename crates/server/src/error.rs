use data_loader::MovieId;
use engine::EngineError;
use thiserror::Error;

/// Errors returned by `MovieService`
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Rating {0} is out of range (0-10)")]
    InvalidRating(u8),

    #[error("Movie {0} is not in the catalog")]
    UnknownMovie(MovieId),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ServiceError {
    /// True for errors caused by the caller's input rather than the service
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ServiceError::InvalidRating(_)
                | ServiceError::UnknownMovie(_)
                | ServiceError::Engine(EngineError::NotFound { .. })
                | ServiceError::Engine(EngineError::InvalidArgument(_))
        )
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;

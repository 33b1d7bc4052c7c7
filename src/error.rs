// Crate-wide error type

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("container runtime: {0}")]
    Runtime(#[source] bollard::errors::Error),
    #[error("No such container: {0}")]
    NotFound(String),
    /// Runtime refused the request in the container's current state
    /// (already started, not running, paused...).
    #[error("{0}")]
    Conflict(String),
    #[error("missing container id")]
    MissingContainerId,
    #[error("invalid action: must be one of start, stop, restart, pause, unpause")]
    InvalidAction(String),
    #[error("sink delivery failed: {0}")]
    Sink(#[source] BoxError),
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    /// Errors caused by the request rather than the backend (reported to HTTP clients as 400).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_)
                | Error::Conflict(_)
                | Error::MissingContainerId
                | Error::InvalidAction(_)
        )
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

impl From<bollard::errors::Error> for Error {
    fn from(e: bollard::errors::Error) -> Self {
        match e {
            bollard::errors::Error::DockerResponseServerError {
                status_code: 404,
                message,
            } => Error::NotFound(message),
            bollard::errors::Error::DockerResponseServerError {
                status_code: 304 | 409,
                message,
            } => Error::Conflict(message),
            other => Error::Runtime(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

use thiserror::Error;

/// Failures while starting or reaching a disposable backing service.
#[derive(Debug, Error)]
pub enum TestInfraError {
    #[error("container failed: {0}")]
    Container(#[from] testcontainers::TestcontainersError),

    #[error("redis failed: {0}")]
    Redis(#[from] redis::RedisError),

    /// The server never accepted a connection within the readiness window.
    #[error("mysql not ready after {attempts} attempts: {source}")]
    MySqlNotReady {
        attempts: u32,
        #[source]
        source: sqlx::Error,
    },
}

pub type Result<T> = std::result::Result<T, TestInfraError>;

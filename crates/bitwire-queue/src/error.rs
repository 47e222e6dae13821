/// Errors that can occur while running a queue worker.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// The OS refused to spawn the worker thread.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// The worker thread panicked.
    #[error("worker thread {0} panicked")]
    Panicked(String),
}

pub type Result<T> = std::result::Result<T, WorkerError>;

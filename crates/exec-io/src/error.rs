use thiserror::Error;

#[derive(Error, Debug)]
pub enum IoRingError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("buffer pool exhausted (capacity {capacity})")]
    PoolExhausted { capacity: usize },
    #[error("ring submission queue full")]
    SubmissionQueueFull,
    #[error("unknown ticket {0:?}")]
    UnknownTicket(super::Ticket),
}

pub type IoRingResult<T> = Result<T, IoRingError>;

/// Errors that can occur while binding or copying wire data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// A byte slice is too short to hold the requested word or layout.
    #[error("buffer too small ({actual} bytes, need {required})")]
    BufferTooSmall { required: usize, actual: usize },

    /// The source data does not fit into a fixed-size array field.
    #[error("array field {field} overflow ({size} bytes, capacity {capacity})")]
    ArrayOverflow {
        field: &'static str,
        size: usize,
        capacity: usize,
    },

    /// Input ended before a complete fixed-size region was available.
    #[error("incomplete message ({missing} bytes missing)")]
    Incomplete { missing: usize },
}

pub type Result<T> = std::result::Result<T, CodecError>;

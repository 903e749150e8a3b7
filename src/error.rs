use std::fmt::Display;

/// Container level errors.
/// All of them are recoverable, the container remains valid after any of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StowError {
    /// Checked access outside of the live prefix.
    OutOfBounds { index: usize, len: usize },
    /// Underlying allocator couldn't provide storage for this many elements.
    AllocFailed { count: usize },
    /// Bounded strategy was asked for more than its fixed maximum.
    CapacityExceeded { requested: usize, max: usize },
}

impl StowError {
    pub fn out_of_bounds(index: usize, len: usize) -> Self {
        Self::OutOfBounds { index, len }
    }

    pub fn alloc_failed(count: usize) -> Self {
        Self::AllocFailed { count }
    }

    pub fn capacity_exceeded(requested: usize, max: usize) -> Self {
        Self::CapacityExceeded { requested, max }
    }

    pub fn is_out_of_bounds(&self) -> bool {
        matches!(self, Self::OutOfBounds { .. })
    }
}

impl Display for StowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfBounds { index, len } => write!(
                f,
                "Index {} is out of bounds for container of length {}.",
                index, len
            ),
            Self::AllocFailed { count } => {
                write!(f, "Failed to allocate storage for {} elements.", count)
            }
            Self::CapacityExceeded { requested, max } => write!(
                f,
                "Requested capacity {} exceeds fixed maximum {}.",
                requested, max
            ),
        }
    }
}

impl std::error::Error for StowError {}

use ark_serialize::SerializationError;
use ark_std::fmt;

/// Errors shared by the hashing, MSM and serde helpers in this crate.
#[derive(Debug)]
pub enum UtilsError {
    /// A scalar could not be derived from the given seed/bytes after the
    /// configured number of try-and-increment attempts.
    RandomGenerationFailed,
    /// `bases` and `scalars` (or similar paired inputs) had different lengths.
    MismatchedLengths(usize, usize),
    Serialization(SerializationError),
}

impl fmt::Display for UtilsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UtilsError::RandomGenerationFailed => {
                write!(f, "failed to derive a field element from the given seed")
            }
            UtilsError::MismatchedLengths(a, b) => {
                write!(f, "expected sequences of equal length, got {} and {}", a, b)
            }
            UtilsError::Serialization(e) => write!(f, "serialization error: {:?}", e),
        }
    }
}

impl From<SerializationError> for UtilsError {
    fn from(e: SerializationError) -> Self {
        UtilsError::Serialization(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for UtilsError {}

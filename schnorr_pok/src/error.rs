use ark_serialize::SerializationError;
use ark_std::fmt;

#[derive(Debug)]
pub enum SchnorrError {
    ExpectedSameSizeSequences(usize, usize),
    InvalidResponse,
    IndexOutOfBounds(usize, usize),
    UnknownWitnessRef(usize),
    Serialization(SerializationError),
}

impl fmt::Display for SchnorrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchnorrError::ExpectedSameSizeSequences(a, b) => write!(
                f,
                "expected sequences of the same size, got {} and {}",
                a, b
            ),
            SchnorrError::InvalidResponse => write!(f, "Schnorr response failed verification"),
            SchnorrError::IndexOutOfBounds(i, n) => {
                write!(f, "index {} out of bounds for length {}", i, n)
            }
            SchnorrError::UnknownWitnessRef(i) => {
                write!(f, "equation refers to unknown witness index {}", i)
            }
            SchnorrError::Serialization(e) => write!(f, "serialization error: {:?}", e),
        }
    }
}

impl From<SerializationError> for SchnorrError {
    fn from(e: SerializationError) -> Self {
        SchnorrError::Serialization(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SchnorrError {}

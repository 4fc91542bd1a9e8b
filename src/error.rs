use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("could not allocate a {0}-byte buffer")]
    AllocationFailure(usize),

    #[error("invalid CRILAYLA signature")]
    InvalidSignature,

    #[error("input exhausted before producing the declared output size: {0}")]
    InsufficientInput(String),

    #[error("back-reference at {at} points {distance} bytes back, past the {produced}-byte written region")]
    OutOfBoundsReference {
        at: usize,
        distance: usize,
        produced: usize,
    },
}

pub type Result<T> = std::result::Result<T, CodecError>;

/// Checks that an output buffer of `len` bytes is plausibly allocatable
/// before a codec reaches for `vec![0u8; len]`, turning a declared size
/// that's too large to represent into a structured error instead of an
/// allocator abort.
pub fn checked_buffer_len(len: usize) -> Result<usize> {
    if len > isize::MAX as usize {
        Err(CodecError::AllocationFailure(len))
    } else {
        Ok(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checked_buffer_len_passes_through_sane_sizes() {
        assert_eq!(checked_buffer_len(4096).unwrap(), 4096);
    }

    #[test]
    fn checked_buffer_len_rejects_unrepresentable_sizes() {
        assert!(matches!(
            checked_buffer_len(usize::MAX),
            Err(CodecError::AllocationFailure(_))
        ));
    }
}

//! Byte-oriented run-length encoding with two token shapes: a short
//! literal run and a repeated-byte run. Grounded on `cmp_misc.c`
//! (`decompressRLE`); the source only ever exposed a decoder, so no
//! encoder exists here either.

use crate::error::{checked_buffer_len, CodecError, Result};
use log::debug;

/// Decompresses an RLE stream into `decomp_length` bytes.
///
/// # Errors
/// [`CodecError::InsufficientInput`] if the stream runs out of flag or
/// payload bytes before producing `decomp_length` bytes.
pub fn decompress_rle(src: &[u8], decomp_length: usize) -> Result<Vec<u8>> {
    let mut out = vec![0u8; checked_buffer_len(decomp_length)?];
    let mut read = 0usize;
    let mut written = 0usize;

    while written < decomp_length {
        let flag = *src.get(read).ok_or_else(|| {
            CodecError::InsufficientInput(format!("missing RLE flag byte at {read}"))
        })?;
        read += 1;
        let mut length = (flag & 0x7f) as usize;

        if flag & 0x80 != 0 {
            length += 3;
            let byte = *src.get(read).ok_or_else(|| {
                CodecError::InsufficientInput(format!("missing repeat byte at {read}"))
            })?;
            read += 1;
            let end = (written + length).min(decomp_length);
            out[written..end].fill(byte);
            written = end;
        } else {
            length += 1;
            let end = (written + length).min(decomp_length);
            let copy_len = end - written;
            if read + copy_len > src.len() {
                return Err(CodecError::InsufficientInput(format!(
                    "literal run at {read} needs {copy_len} bytes, only {} available",
                    src.len().saturating_sub(read)
                )));
            }
            out[written..end].copy_from_slice(&src[read..read + copy_len]);
            read += copy_len;
            written = end;
        }
    }

    debug!("RLE decompress: {read} bytes in -> {written} bytes out");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_repeat_run() {
        let stream = [0x81, 0x41];
        let out = decompress_rle(&stream, 4).unwrap();
        assert_eq!(out, [0x41, 0x41, 0x41, 0x41]);
    }

    #[test]
    fn minimal_literal_run() {
        let stream = [0x02, 0x41, 0x42, 0x43];
        let out = decompress_rle(&stream, 3).unwrap();
        assert_eq!(out, [0x41, 0x42, 0x43]);
    }

    #[test]
    fn mixed_runs() {
        // 0x83 -> repeat, length 3+3=6, byte 0x00
        // 0x01 -> literal, length 1+1=2, bytes 0xAA 0xBB
        let stream = [0x83, 0x00, 0x01, 0xAA, 0xBB];
        let out = decompress_rle(&stream, 8).unwrap();
        assert_eq!(out, [0, 0, 0, 0, 0, 0, 0xAA, 0xBB]);
    }

    #[test]
    fn truncated_stream_reports_insufficient_input() {
        let stream = [0x05, 0x41, 0x42];
        assert!(matches!(
            decompress_rle(&stream, 6),
            Err(CodecError::InsufficientInput(_))
        ));
    }

    #[test]
    fn max_length_repeat_run() {
        let stream = [0xFF, 0x9];
        let out = decompress_rle(&stream, 0x7F + 3).unwrap();
        assert!(out.iter().all(|&b| b == 0x9));
        assert_eq!(out.len(), 0x7F + 3);
    }

    #[test]
    fn unrepresentable_decomp_length_reports_allocation_failure() {
        assert!(matches!(
            decompress_rle(&[], usize::MAX),
            Err(CodecError::AllocationFailure(_))
        ));
    }
}

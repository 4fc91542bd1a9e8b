//! RACJIN's byte-context LZ variant: matches are looked up through a
//! per-preceding-byte history table instead of a sliding window, and tokens
//! are packed nine bits at a time with no byte alignment between them.
//!
//! Grounded on `cmp_racjin.c` (`compressRACJIN`/`decompressRACJIN`). The
//! reference's "fold 8 codes into 9 bytes" loop and the decoder's
//! `bit_shift`/`index` bookkeeping are both just a continuous 9-bit
//! bit-packer in disguise: folding happens in groups of 8 purely because
//! 8 * 9 bits is a whole number of bytes, so packing the whole token stream
//! continuously (what [`TokenPacker`] does) produces byte-identical output.

use crate::bitstream::{TokenPacker, TokenUnpacker};
use crate::error::{checked_buffer_len, CodecError, Result};
use log::debug;

const HISTORY_SLOTS: usize = 32;
const MAX_MATCH: usize = 8;

/// Compresses `src` into a RACJIN token stream.
///
/// Byte literals are encoded as `1bbbbbbbb` (flag bit set); back-references
/// into the per-context history are encoded as `0ooooolll` where `ooooo` is
/// a history slot and `lll` is `length - 1`.
pub fn compress_racjin(src: &[u8]) -> Vec<u8> {
    // Widened to u16 so the source's `== 256` reset is representable; an
    // 8-bit cell would hit the same state through silent wraparound, but
    // the explicit check is kept to mirror the reference structure.
    let mut frequencies = [0u16; 256];
    let mut seq_indices = [0u32; 256 * HISTORY_SLOTS];
    let mut packer = TokenPacker::new();

    let mut index = 0usize;
    let mut last_enc_byte: u8 = 0;

    while index < src.len() {
        if frequencies[last_enc_byte as usize] == 256 {
            frequencies[last_enc_byte as usize] = 0;
        }
        let count = frequencies[last_enc_byte as usize];
        let positions_to_check = if count < 32 { count as u8 & 0x1f } else { 32 };
        let seq_index = index;

        let mut best_freq = 0u8;
        let mut best_match = 0u8;
        let max_length = if index + MAX_MATCH < src.len() {
            MAX_MATCH
        } else {
            src.len() - index
        };

        for freq in 0..positions_to_check {
            let key = freq as usize + last_enc_byte as usize * HISTORY_SLOTS;
            let src_index = seq_indices[key] as usize;
            let mut matched = 0u8;
            for offset in 0..max_length {
                if src[src_index + offset] == src[index + offset] {
                    matched += 1;
                } else {
                    break;
                }
            }
            if matched > best_match {
                best_freq = freq;
                best_match = matched;
            }
        }

        let code: u16 = if best_match > 0 {
            let code = ((best_freq as u16) << 3) | (best_match as u16 - 1);
            index += best_match as usize;
            code
        } else {
            let code = 0x100 | src[index] as u16;
            index += 1;
            code
        };
        packer.push(code, 9);

        let key = (frequencies[last_enc_byte as usize] & 0x1f) as usize
            + last_enc_byte as usize * HISTORY_SLOTS;
        seq_indices[key] = seq_index as u32;
        frequencies[last_enc_byte as usize] += 1;
        last_enc_byte = src[index - 1];
    }

    let out = packer.finish();
    debug!("RACJIN compress: {} bytes in -> {} bytes out", src.len(), out.len());
    out
}

/// Decompresses a RACJIN token stream into `decomp_length` bytes.
///
/// # Errors
/// [`CodecError::InsufficientInput`] if the token stream runs dry before
/// producing `decomp_length` bytes, or [`CodecError::OutOfBoundsReference`]
/// if a back-reference's history slot points past the bytes produced so
/// far.
pub fn decompress_racjin(src: &[u8], decomp_length: usize) -> Result<Vec<u8>> {
    let mut frequencies = [0u8; 256];
    let mut seq_indices = [0u32; 256 * HISTORY_SLOTS];
    let mut out = vec![0u8; checked_buffer_len(decomp_length)?];
    let mut unpacker = TokenUnpacker::new(src);

    let mut dest_index = 0usize;
    let mut last_dec_byte: u8 = 0;

    while dest_index < decomp_length {
        let next_code = unpacker.next_token(9)?;
        let seq_index = dest_index;

        if next_code & 0x100 != 0 {
            out[dest_index] = (next_code & 0xff) as u8;
            dest_index += 1;
        } else {
            let key = (((next_code >> 3) & 0x1f) as usize) + last_dec_byte as usize * HISTORY_SLOTS;
            let mut src_index = seq_indices[key] as usize;
            let length = (next_code & 0x07) + 1;
            for _ in 0..length {
                // The reference writes unconditionally here and only checks
                // the output bound after the loop; we check per-byte so a
                // run that would overshoot `decomp_length` can't write past
                // the allocated buffer.
                if dest_index >= decomp_length {
                    break;
                }
                let byte = *out.get(src_index).ok_or(CodecError::OutOfBoundsReference {
                    at: dest_index,
                    distance: dest_index.saturating_sub(src_index),
                    produced: dest_index,
                })?;
                out[dest_index] = byte;
                dest_index += 1;
                src_index += 1;
            }
        }

        if dest_index >= decomp_length {
            break;
        }

        let key = frequencies[last_dec_byte as usize] as usize + last_dec_byte as usize * HISTORY_SLOTS;
        seq_indices[key] = seq_index as u32;
        frequencies[last_dec_byte as usize] = frequencies[last_dec_byte as usize].wrapping_add(1) & 0x1f;
        last_dec_byte = out[dest_index - 1];
    }

    debug!("RACJIN decompress: produced {dest_index} bytes");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_literal_only_stream() {
        let input: Vec<u8> = (0..64).map(|i| (i * 31 + 7) as u8).collect();
        let compressed = compress_racjin(&input);
        let decompressed = decompress_racjin(&compressed, input.len()).unwrap();
        assert_eq!(decompressed, input);
    }

    #[test]
    fn round_trips_repetitive_stream() {
        let mut input = Vec::new();
        for _ in 0..40 {
            input.extend_from_slice(b"abcdefgh");
        }
        let compressed = compress_racjin(&input);
        let decompressed = decompress_racjin(&compressed, input.len()).unwrap();
        assert_eq!(decompressed, input);
    }

    #[test]
    fn round_trips_mixed_stream() {
        let mut input = Vec::new();
        input.extend_from_slice(b"The quick brown fox jumps over the lazy dog. ");
        input.extend(std::iter::repeat(0x7Au8).take(200));
        input.extend_from_slice(b"The quick brown fox jumps over the lazy dog. ");
        let compressed = compress_racjin(&input);
        let decompressed = decompress_racjin(&compressed, input.len()).unwrap();
        assert_eq!(decompressed, input);
    }

    #[test]
    fn single_byte_literal_round_trips() {
        let input = vec![0x42u8];
        let compressed = compress_racjin(&input);
        let decompressed = decompress_racjin(&compressed, 1).unwrap();
        assert_eq!(decompressed, input);
    }

    #[test]
    fn empty_input_compresses_to_empty_stream() {
        let compressed = compress_racjin(&[]);
        assert!(compressed.is_empty());
    }

    #[test]
    fn truncated_stream_reports_insufficient_input() {
        let stream = [0x00u8];
        assert!(matches!(
            decompress_racjin(&stream, 100),
            Err(CodecError::InsufficientInput(_))
        ));
    }

    #[test]
    fn unrepresentable_decomp_length_reports_allocation_failure() {
        assert!(matches!(
            decompress_racjin(&[], usize::MAX),
            Err(CodecError::AllocationFailure(_))
        ));
    }
}

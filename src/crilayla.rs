//! CRI Middleware's CRILAYLA container: a reverse-direction LZ77 variant
//! with a tiered variable-length match-length code.
//!
//! Grounded on `cmp_cri.c` (`compressCRILAYLA`/`decompressCRILAYLA`) and on
//! this crate's own CPK-extraction heritage (`compression.rs`), generalized
//! from "decompress only" to both directions and wired to a shared bit
//! reader/writer instead of inline pointer arithmetic.

use crate::bitstream::{BitAccumulator, ReverseBitReader};
use crate::error::{checked_buffer_len, CodecError, Result};
use log::{debug, trace};

const MAGIC: &[u8; 8] = b"CRILAYLA";
const HEADER_SIZE: usize = 0x10;
const PREFIX_SIZE: usize = 0x100;
const VLE_TIER_WIDTHS: [u32; 4] = [2, 3, 5, 8];

/// Decompresses a CRILAYLA container produced by [`compress_crilayla`] (or
/// any bit-compatible reference encoder).
///
/// # Errors
/// Returns [`CodecError::InvalidSignature`] if `src` does not start with
/// the `CRILAYLA` magic, [`CodecError::InsufficientInput`] if the header
/// claims more data than `src` holds or the bitstream runs dry before
/// producing the declared size, and [`CodecError::OutOfBoundsReference`] if
/// a back-reference would read outside the region decoded so far.
pub fn decompress_crilayla(src: &[u8]) -> Result<Vec<u8>> {
    if src.len() < HEADER_SIZE || &src[0..8] != MAGIC {
        return Err(CodecError::InvalidSignature);
    }

    let uncompressed_size = u32::from_le_bytes(src[0x08..0x0c].try_into().unwrap()) as usize;
    let header_offset = u32::from_le_bytes(src[0x0c..0x10].try_into().unwrap()) as usize;

    debug!(
        "CRILAYLA decompress: uncompressed_size={uncompressed_size}, header_offset={header_offset}"
    );

    let prefix_start = header_offset
        .checked_add(HEADER_SIZE)
        .ok_or_else(|| CodecError::InsufficientInput("header offset overflow".into()))?;
    if prefix_start
        .checked_add(PREFIX_SIZE)
        .is_none_or(|end| end > src.len())
    {
        return Err(CodecError::InsufficientInput(format!(
            "verbatim prefix at {prefix_start}..+{PREFIX_SIZE} exceeds input length {}",
            src.len()
        )));
    }
    if src.len() < PREFIX_SIZE + 1 {
        return Err(CodecError::InsufficientInput(
            "input too short to hold a compressed bitstream".into(),
        ));
    }

    let output_len = uncompressed_size
        .checked_add(PREFIX_SIZE)
        .ok_or(CodecError::AllocationFailure(uncompressed_size))?;
    let output_len = checked_buffer_len(output_len)?;
    let mut output = vec![0u8; output_len];
    output[0..PREFIX_SIZE].copy_from_slice(&src[prefix_start..prefix_start + PREFIX_SIZE]);

    let input_end = (src.len() - PREFIX_SIZE - 1) as i64;
    let output_end = (PREFIX_SIZE + uncompressed_size - 1) as i64;
    let mut reader = ReverseBitReader::new(src, input_end);
    let mut bytes_output: i64 = 0;

    while bytes_output < uncompressed_size as i64 {
        if reader.next_bits(1)? != 0 {
            let offset_bits = reader.next_bits(13)? as i64;
            let mut backref_offset = output_end - bytes_output + offset_bits + 3;
            let mut length: i64 = 3;

            let mut saturated_all_tiers = true;
            for &width in &VLE_TIER_WIDTHS {
                let this_level = reader.next_bits(width)? as i64;
                length += this_level;
                if this_level != (1i64 << width) - 1 {
                    saturated_all_tiers = false;
                    break;
                }
            }
            if saturated_all_tiers {
                loop {
                    let extra = reader.next_bits(8)? as i64;
                    length += extra;
                    if extra != 255 {
                        break;
                    }
                }
            }

            trace!(
                "CRILAYLA: back-reference len={length} offset={backref_offset} produced={bytes_output}"
            );

            for _ in 0..length {
                if bytes_output >= uncompressed_size as i64 {
                    break;
                }
                if backref_offset < 0 || backref_offset as usize >= output.len() {
                    return Err(CodecError::OutOfBoundsReference {
                        at: (output_end - bytes_output) as usize,
                        distance: offset_bits as usize + 3,
                        produced: (PREFIX_SIZE as i64 + bytes_output) as usize,
                    });
                }
                let write_pos = (output_end - bytes_output) as usize;
                output[write_pos] = output[backref_offset as usize];
                backref_offset -= 1;
                bytes_output += 1;
            }
        } else {
            let byte = reader.next_bits(8)? as u8;
            let write_pos = (output_end - bytes_output) as usize;
            output[write_pos] = byte;
            bytes_output += 1;
        }
    }

    debug!("CRILAYLA decompress: produced {bytes_output} bytes");
    Ok(output)
}

/// Compresses `src` into a CRILAYLA container, reproducing the reference
/// encoder's match policy and VLE tier layout byte-for-byte.
///
/// # Errors
/// Returns [`CodecError::InsufficientInput`] if `src` is shorter than the
/// 256-byte verbatim prefix the format requires.
pub fn compress_crilayla(src: &[u8]) -> Result<Vec<u8>> {
    if src.len() < PREFIX_SIZE {
        return Err(CodecError::InsufficientInput(format!(
            "CRILAYLA compression needs at least {PREFIX_SIZE} bytes, got {}",
            src.len()
        )));
    }

    let srclen = src.len();
    let destlen = srclen;
    let mut dest = vec![0u8; destlen];
    let mut m: i64 = destlen as i64 - 1;
    let mut acc = BitAccumulator::new();

    let write_byte = |dest: &mut [u8], m: &mut i64, byte: u8| {
        dest[*m as usize] = byte;
        *m -= 1;
    };
    let drain = |acc: &mut BitAccumulator, dest: &mut [u8], m: &mut i64| {
        for byte in acc.drain_bytes() {
            write_byte(dest, m, byte);
        }
    };

    let mut n: i64 = srclen as i64 - 1;
    while n >= PREFIX_SIZE as i64 {
        let window_end = ((n + 3 + 0x2000).min(srclen as i64)) as usize;
        let mut best_len: i64 = 0;
        let mut best_disp: i64 = 0;

        let mut i = (n + 3) as usize;
        while i < window_end {
            let max_k = n - PREFIX_SIZE as i64;
            let mut k: i64 = 0;
            while k <= max_k {
                if src[(n - k) as usize] != src[i - k as usize] {
                    break;
                }
                k += 1;
            }
            if k > best_len {
                best_disp = i as i64 - n - 3;
                best_len = k;
            }
            i += 1;
        }

        if best_len < 3 {
            acc.push(0, 1);
            acc.push(src[n as usize] as u32, 8);
            n -= 1;
        } else {
            acc.push(1, 1);
            acc.push(best_disp as u32, 13);
            n -= best_len;

            let mut p = best_len;
            if p < 6 {
                acc.push((p - 3) as u32, 2);
            } else if p < 13 {
                acc.push(0b11, 2);
                acc.push((p - 6) as u32, 3);
            } else if p < 44 {
                acc.push(0x1f, 5);
                acc.push((p - 13) as u32, 5);
            } else {
                acc.push(0x3ff, 10);
                p -= 44;
                loop {
                    drain(&mut acc, &mut dest, &mut m);
                    if p < 255 {
                        break;
                    }
                    acc.push(0xff, 8);
                    p -= 0xff;
                }
                acc.push(p as u32, 8);
            }
        }
        drain(&mut acc, &mut dest, &mut m);
    }

    if let Some(byte) = acc.flush_final() {
        write_byte(&mut dest, &mut m, byte);
    }
    write_byte(&mut dest, &mut m, 0);
    dest[m as usize] = 0; // second padding byte: no cursor advance, matches the reference's quirk

    loop {
        if (destlen as i64 - m) & 3 == 0 {
            break;
        }
        write_byte(&mut dest, &mut m, 0);
    }

    let payload_start = m as usize;
    let payload = &dest[payload_start..destlen];

    let mut container = Vec::with_capacity(HEADER_SIZE + payload.len() + PREFIX_SIZE);
    container.extend_from_slice(MAGIC);
    container.extend_from_slice(&((srclen - PREFIX_SIZE) as u32).to_le_bytes());
    container.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    container.extend_from_slice(payload);
    container.extend_from_slice(&src[0..PREFIX_SIZE]);

    debug!(
        "CRILAYLA compress: {srclen} bytes -> {} bytes (payload {})",
        container.len(),
        payload.len()
    );
    Ok(container)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(len: usize) -> Vec<u8> {
        (0..len).map(|i| ((i * 37 + i / 7) % 251) as u8).collect()
    }

    #[test]
    fn rejects_short_input_for_compression() {
        let tiny = vec![0u8; 10];
        assert!(matches!(
            compress_crilayla(&tiny),
            Err(CodecError::InsufficientInput(_))
        ));
    }

    #[test]
    fn rejects_missing_signature() {
        let bogus = vec![0u8; 20];
        assert!(matches!(
            decompress_crilayla(&bogus),
            Err(CodecError::InvalidSignature)
        ));
    }

    #[test]
    fn rejects_too_short_buffer() {
        let tiny = vec![0u8; 8];
        assert!(matches!(
            decompress_crilayla(&tiny),
            Err(CodecError::InvalidSignature)
        ));
    }

    #[test]
    fn round_trips_minimal_input() {
        let input = sample(PREFIX_SIZE);
        let compressed = compress_crilayla(&input).unwrap();
        let decompressed = decompress_crilayla(&compressed).unwrap();
        assert_eq!(decompressed, input);
    }

    #[test]
    fn round_trips_repetitive_input() {
        let mut input = sample(PREFIX_SIZE);
        // Extend with a long repeated pattern to exercise back-references,
        // including the tier-overflow length path.
        for i in 0..4000 {
            input.push((i % 13) as u8);
        }
        let compressed = compress_crilayla(&input).unwrap();
        let decompressed = decompress_crilayla(&compressed).unwrap();
        assert_eq!(decompressed, input);
    }

    #[test]
    fn round_trips_all_zero_input() {
        let input = vec![0u8; PREFIX_SIZE + 1024];
        let compressed = compress_crilayla(&input).unwrap();
        let decompressed = decompress_crilayla(&compressed).unwrap();
        assert_eq!(decompressed, input);
    }

    #[test]
    fn container_starts_with_magic_and_header_fields() {
        let input = sample(PREFIX_SIZE + 16);
        let compressed = compress_crilayla(&input).unwrap();
        assert_eq!(&compressed[0..8], MAGIC);
        let uncompressed_size = u32::from_le_bytes(compressed[8..12].try_into().unwrap());
        assert_eq!(uncompressed_size as usize, input.len() - PREFIX_SIZE);
    }
}

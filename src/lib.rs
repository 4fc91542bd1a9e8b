//! Codecs for the compressed resource streams found in packed console and
//! arcade game data files: CRI Middleware's CRILAYLA, Nintendo's LZ10/LZ11
//! LZSS variants, a plain run-length code, and RACJIN's context-keyed
//! dictionary codec.
//!
//! Every operation is a pure, buffer-to-buffer function: `&[u8]` in,
//! `Result<Vec<u8>, CodecError>` out. None of the codecs hold state between
//! calls or touch anything outside their own scratch buffers.

mod bitstream;
mod crilayla;
mod error;
mod lzss;
mod racjin;
mod rle;

pub use crilayla::{compress_crilayla, decompress_crilayla};
pub use error::{CodecError, Result};
pub use lzss::{compress_lz10, compress_lz11, decompress_lz10, decompress_lz11};
pub use racjin::{compress_racjin, decompress_racjin};
pub use rle::decompress_rle;

//! # LZSS decoder and encoder
//!
//! This crate provides an `Encoder` and `Decoder` for an LZSS stream layout
//! in which up to eight literal/match decisions are grouped behind a single
//! flag byte, most significant bit first. Matches reach at most 1023 bytes
//! back and copy between 3 and 63 bytes. The stream carries no length field
//! and no end marker; it simply stops when its source does, which is also
//! what makes the trailing block padding (§`Padding`) invisible.
//!
//! Exemplary use of both directions:
//!
//! ```
//! use zessl::{encode::Encoder, decode::Decoder, Padding};
//! let data = b"how much wood would a woodchuck chuck if a woodchuck could chuck wood";
//!
//! let mut compressed = vec![];
//! let mut enc = Encoder::with_padding(Padding::Exact);
//! enc.into_stream(&mut compressed).encode(&data[..]).status.unwrap();
//! assert_eq!(compressed.len() % 16, 0);
//!
//! let mut restored = vec![];
//! let mut dec = Decoder::new();
//! dec.into_stream(&mut restored).decode_all(&compressed[..]).status.unwrap();
//! assert_eq!(&restored[..], &data[..]);
//! ```
/// Reach of a backward reference, and the size of the decoder's ring.
pub(crate) const WINDOW_SIZE: usize = 1023;
/// Shortest run worth a match token; also the smallest real distance.
pub(crate) const MIN_MATCH: usize = 3;
/// Longest run a token can express with its six length bits.
pub(crate) const MAX_MATCH: usize = 63;
/// Size of the staging buffer a single match is replayed through.
pub(crate) const MAX_CODED: usize = MAX_MATCH + 1;
/// Alignment the padded stream lengths are rounded up to.
pub(crate) const BLOCK_SIZE: usize = 16;
/// Every ring slot starts out as this sentinel. Conformant streams never
/// read it but the priming is part of the format.
pub(crate) const FILL_BYTE: u8 = 0x11;

/// How the encoder closes out a stream.
#[derive(Debug, Clone, Copy)]
pub enum Padding {
    /// Emit the final flag group and stop.
    None,
    /// Append zero bytes until the stream length is a multiple of 16. A
    /// decoder that stops only at end of input reads these as literal zero
    /// bytes, so the decoded output grows by a run of `0x00`.
    Zeros,
    /// Align to 16 bytes with zero-length match tokens and all-ones flag
    /// blocks instead, which decode to nothing at all.
    Exact,
}

/// Wire layout of a match: six length bits over the ten distance bits.
pub(crate) fn pack_match(distance: u16, length: u8) -> [u8; 2] {
    [(length << 2) | (distance >> 8) as u8, (distance & 0xff) as u8]
}

/// Inverse of [`pack_match`], returning `(distance, length)`.
///
/// [`pack_match`]: fn.pack_match.html
pub(crate) fn unpack_match(high: u8, low: u8) -> (u16, u8) {
    (u16::from(low) | (u16::from(high & 0x03) << 8), high >> 2)
}

pub mod decode;
pub mod encode;

//! A module for all encoding needs.
use crate::decode::AllResult;
use crate::{pack_match, Padding, BLOCK_SIZE, MAX_MATCH, MIN_MATCH, WINDOW_SIZE};
use std::io::{self, Write};

/// The state for encoding data as an LZSS stream.
///
/// The search for backward references runs over the whole input slice, so
/// one call encodes one complete stream. What the encoder appends after the
/// final flag group is controlled by its [`Padding`].
///
/// [`Padding`]: ../enum.Padding.html
pub struct Encoder {
    padding: Padding,
}

/// An encoding stream sink.
///
/// See [`Encoder::into_stream`] on how to create this type.
///
/// [`Encoder::into_stream`]: struct.Encoder.html#method.into_stream
pub struct IntoStream<'d, W> {
    encoder: &'d mut Encoder,
    writer: W,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Match {
    distance: u16,
    length: u8,
}

/// Accumulator for one flag group: the flag byte, its descending bit mask,
/// and the wire bytes of at most 8 tokens.
struct Group {
    flags: u8,
    mask: u8,
    data: [u8; 16],
    len: usize,
}

/// Byte source for the exact padding blocks: a flag byte announcing eight
/// matches, then the two zero wire bytes of each zero-length match.
const PAD_BLOCK: [u8; 17] = [0xff, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];

/// How many bytes of repeated `PAD_BLOCK` to append, indexed by how far
/// short of a block edge the stream is. The values land the total exactly
/// on a 16-byte boundary while decoding to nothing; the table is part of
/// the format and must not be rederived.
const PAD_LENGTHS: [usize; 17] = [
    0x00, 0x01, 0x12, 0x03, 0x14, 0x05, 0x16, 0x07, 0x18, 0x09, 0x1a, 0x0b, 0x1c, 0x0d, 0x1e,
    0x0f, 0x00,
];

impl Encoder {
    /// Create a new encoder using the default zero padding.
    pub fn new() -> Self {
        Encoder::with_padding(Padding::Zeros)
    }

    /// Create a new encoder with an explicit trailing padding policy.
    pub fn with_padding(padding: Padding) -> Self {
        Encoder { padding }
    }

    /// Construct an encoder into a writer.
    pub fn into_stream<W: Write>(&mut self, writer: W) -> IntoStream<'_, W> {
        IntoStream {
            encoder: self,
            writer,
        }
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> IntoStream<'_, W> {
    /// Encode `data` as one complete stream, trailing padding included.
    ///
    /// Empty input writes nothing, not even padding.
    pub fn encode(&mut self, data: &[u8]) -> AllResult {
        let IntoStream { encoder, writer } = self;
        let mut bytes_read = 0;
        let mut bytes_written = 0;
        let status = encode_stream(
            data,
            encoder.padding,
            writer,
            &mut bytes_read,
            &mut bytes_written,
        );
        AllResult {
            bytes_read,
            bytes_written,
            status,
        }
    }
}

fn encode_stream<W: Write>(
    data: &[u8],
    padding: Padding,
    writer: &mut W,
    read: &mut usize,
    written: &mut usize,
) -> io::Result<()> {
    if data.is_empty() {
        return Ok(());
    }

    let mut group = Group::new();
    let mut pos = 0;

    while pos < data.len() {
        match longest_match(data, pos) {
            Some(found) => {
                group.push_match(found);
                pos += usize::from(found.length);
            }
            None => {
                group.push_literal(data[pos]);
                pos += 1;
            }
        }
        *read = pos;

        if group.is_full() {
            group.flush(writer, written)?;
        }
    }

    if let Padding::Exact = padding {
        // Absorb as much of the misalignment as the open group has room
        // for; each no-op token costs two bytes and one flag bit.
        while !group.is_empty() && !group.is_full() && (*written + group.len + 1) % BLOCK_SIZE != 0
        {
            group.push_match(Match {
                distance: 0,
                length: 0,
            });
        }
    }

    if !group.is_empty() {
        group.flush(writer, written)?;
    }

    if let Padding::Exact = padding {
        let run = PAD_LENGTHS[BLOCK_SIZE - *written % BLOCK_SIZE];
        let mut block = [0u8; 30];
        for (i, byte) in block[..run].iter_mut().enumerate() {
            *byte = PAD_BLOCK[i % PAD_BLOCK.len()];
        }
        writer.write_all(&block[..run])?;
        *written += run;
    }

    if let Padding::Zeros = padding {
        while *written % BLOCK_SIZE != 0 {
            writer.write_all(&[0])?;
            *written += 1;
        }
    }

    Ok(())
}

/// Greedy longest-match search over the bytes before `pos`.
///
/// Candidate distances are scanned from the smallest upward and the best
/// one is replaced only on strict improvement, so ties go to the nearest
/// copy. A candidate may match at most `min(remaining, distance)` bytes,
/// which keeps every emitted copy free of self-overlap. A run longer than
/// `MAX_MATCH` ends the scan at once, recording that candidate's distance
/// with the length capped; nearer candidates of the same capped length are
/// never revisited.
fn longest_match(data: &[u8], pos: usize) -> Option<Match> {
    let limit = pos.min(WINDOW_SIZE);
    if limit < MIN_MATCH {
        return None;
    }

    let remaining = data.len() - pos;
    let mut best_len = MIN_MATCH - 1;
    let mut best_dist = 0;

    for dist in MIN_MATCH..=limit {
        let cand = pos - dist;

        // Cheap rejections: the first byte, then the byte a current best
        // would have to beat. Neither may change the outcome.
        if data[cand] != data[pos] {
            continue;
        }
        if best_len < remaining && data[cand + best_len] != data[pos + best_len] {
            continue;
        }

        let max_check = remaining.min(dist);
        let mut len = 0;
        while len < max_check && data[cand + len] == data[pos + len] {
            len += 1;
        }

        if len > best_len {
            best_len = len;
            best_dist = dist;
        }
        if len > MAX_MATCH {
            best_len = MAX_MATCH;
            best_dist = dist;
            break;
        }
    }

    if best_len < MIN_MATCH {
        return None;
    }
    Some(Match {
        distance: best_dist as u16,
        length: best_len as u8,
    })
}

impl Group {
    fn new() -> Self {
        Group {
            flags: 0,
            mask: 0x80,
            data: [0; 16],
            len: 0,
        }
    }

    fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn is_full(&self) -> bool {
        self.mask == 0
    }

    fn push_literal(&mut self, byte: u8) {
        self.data[self.len] = byte;
        self.len += 1;
        self.mask >>= 1;
    }

    fn push_match(&mut self, found: Match) {
        let [high, low] = pack_match(found.distance, found.length);
        self.data[self.len] = high;
        self.data[self.len + 1] = low;
        self.len += 2;
        self.flags |= self.mask;
        self.mask >>= 1;
    }

    fn flush<W: Write>(&mut self, writer: &mut W, written: &mut usize) -> io::Result<()> {
        writer.write_all(&[self.flags])?;
        writer.write_all(&self.data[..self.len])?;
        *written += 1 + self.len;
        *self = Group::new();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{longest_match, Group, Match, PAD_BLOCK, PAD_LENGTHS};
    use crate::{pack_match, unpack_match};

    #[test]
    fn wire_layout_is_fixed() {
        assert_eq!(pack_match(3, 3), [0x0c, 0x03]);
        assert_eq!(pack_match(1023, 63), [0xff, 0xff]);
        assert_eq!(pack_match(0x0155, 21), [0x55, 0x55]);
        assert_eq!(unpack_match(0x0c, 0x03), (3, 3));
        assert_eq!(unpack_match(0xff, 0xff), (1023, 63));
        assert_eq!(unpack_match(0x00, 0x00), (0, 0));
    }

    #[test]
    fn no_match_without_history() {
        assert!(longest_match(b"aaaa", 0).is_none());
        assert!(longest_match(b"aaaa", 2).is_none());
    }

    #[test]
    fn ties_go_to_the_smallest_distance() {
        // Equal length-3 matches at distances 4 and 8.
        let found = longest_match(b"abc_abc_abc", 8).unwrap();
        assert_eq!(
            found,
            Match {
                distance: 4,
                length: 3
            }
        );
    }

    #[test]
    fn length_never_exceeds_distance() {
        // The pattern continues past three bytes, but the candidate sits
        // only three back.
        let found = longest_match(b"abcabcabcabc", 3).unwrap();
        assert_eq!(
            found,
            Match {
                distance: 3,
                length: 3
            }
        );
    }

    #[test]
    fn longer_beats_nearer() {
        let found = longest_match(b"abcabcabcabc", 6).unwrap();
        assert_eq!(
            found,
            Match {
                distance: 6,
                length: 6
            }
        );
    }

    #[test]
    fn overlong_runs_cap_and_keep_the_last_distance() {
        // At position 96 of a uniform run, distance 64 is the first
        // candidate to exceed the cap; the scan stops and keeps it even
        // though distance 63 matched equally far.
        let data = vec![b'A'; 200];
        let found = longest_match(&data, 96).unwrap();
        assert_eq!(
            found,
            Match {
                distance: 64,
                length: 63
            }
        );
    }

    #[test]
    fn group_packs_flags_msb_first() {
        let mut group = Group::new();
        group.push_literal(b'a');
        group.push_match(Match {
            distance: 3,
            length: 3,
        });
        group.push_literal(b'b');
        assert_eq!(group.flags, 0b0100_0000);
        assert_eq!(&group.data[..group.len], &[b'a', 0x0c, 0x03, b'b']);
        assert!(!group.is_full());
    }

    #[test]
    fn group_fills_after_eight_tokens() {
        let mut group = Group::new();
        for _ in 0..8 {
            group.push_literal(0);
        }
        assert!(group.is_full());
        assert_eq!(group.flags, 0);
        assert_eq!(group.len, 8);
    }

    #[test]
    fn padding_tables_are_fixed() {
        assert_eq!(PAD_BLOCK.len(), 17);
        assert_eq!(PAD_BLOCK[0], 0xff);
        assert!(PAD_BLOCK[1..].iter().all(|&byte| byte == 0));
        assert_eq!(
            PAD_LENGTHS,
            [
                0x00, 0x01, 0x12, 0x03, 0x14, 0x05, 0x16, 0x07, 0x18, 0x09, 0x1a, 0x0b, 0x1c,
                0x0d, 0x1e, 0x0f, 0x00
            ]
        );
    }
}

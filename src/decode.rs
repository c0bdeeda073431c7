use crate::{unpack_match, FILL_BYTE, MAX_CODED, WINDOW_SIZE};
use std::io::{self, BufRead, Write};

/// The state for decoding an LZSS stream.
///
/// The decoder is resumable: input can arrive in arbitrary chunks, and a
/// token split across chunk boundaries is carried over. The format has no
/// end marker, so the caller signals source exhaustion with [`finish`];
/// only then can the decoder classify running out of bytes as a clean end
/// or a truncation.
///
/// [`finish`]: #method.finish
pub struct Decoder {
    state: Box<DecodeState>,
}

/// A decoding stream sink.
///
/// See [`Decoder::into_stream`] on how to create this type.
///
/// [`Decoder::into_stream`]: struct.Decoder.html#method.into_stream
pub struct IntoStream<'d, W> {
    decoder: &'d mut Decoder,
    writer: W,
}

pub struct StreamResult {
    pub consumed_in: usize,
    pub consumed_out: usize,
    pub status: Result<LzssStatus, LzssError>,
}

pub struct AllResult {
    /// The total number of bytes consumed from the reader.
    pub bytes_read: usize,
    /// The total number of bytes written into the writer.
    pub bytes_written: usize,
    pub status: std::io::Result<()>,
}

#[derive(Debug, Clone, Copy)]
pub enum LzssStatus {
    Ok,
    NoProgress,
    Done,
}

#[derive(Debug, Clone, Copy)]
pub enum LzssError {
    /// The source ended between the two wire bytes of a match, losing the
    /// half-read token.
    Truncated,
}

struct DecodeState {
    /// History of the last `WINDOW_SIZE` output bytes.
    window: Window,

    /// Flag byte in use, already shifted so the next bit is on top.
    flags: u8,

    /// Bits consumed from `flags`; 8 forces a new flag byte.
    flags_used: u8,

    /// The token we are in the middle of reading.
    partial: Partial,

    /// Bytes produced by the last token but not yet handed to the caller.
    staged: [u8; MAX_CODED],
    staged_len: usize,
    staged_read: usize,

    /// The caller promised there is no input beyond what we have seen.
    has_ended: bool,

    done: bool,
    truncated: bool,
}

#[derive(Clone, Copy)]
enum Partial {
    /// At a token boundary; the next flag bit decides what follows.
    None,
    /// A literal byte is owed.
    Literal,
    /// The first wire byte of a match is owed.
    MatchHigh,
    /// The second wire byte of a match is owed.
    MatchLow(u8),
}

/// Ring buffer over the last `WINDOW_SIZE` bytes of output.
///
/// All wraparound arithmetic funnels through [`wrap`] so the writer and the
/// staged-copy reader can never disagree about indexing.
///
/// [`wrap`]: #method.wrap
struct Window {
    bytes: Box<[u8]>,
    /// Next write position.
    head: usize,
}

impl Decoder {
    /// Create a decoder, its window primed with the fill sentinel.
    pub fn new() -> Self {
        Decoder {
            state: Box::new(DecodeState::new()),
        }
    }

    /// Decode some bytes from `inp` into `out`, returning how much of each
    /// buffer was used. Either side may run out first; call again with the
    /// unconsumed input and fresh output space to continue.
    pub fn decode_bytes(&mut self, inp: &[u8], out: &mut [u8]) -> StreamResult {
        self.state.advance(inp, out)
    }

    /// Mark the input as complete.
    ///
    /// After this, exhausting the input resolves to `Truncated` only when
    /// it happens between the two wire bytes of a match. Every other
    /// stopping point is a clean `Done`: a flag-byte edge, an unstarted
    /// match, or a literal promised by nothing but the unused zero bits of
    /// a final flag group. Those are the tail shapes real streams end in.
    pub fn finish(&mut self) {
        self.state.has_ended = true;
    }

    /// Check whether the decoding has reached an end state.
    pub fn has_ended(&self) -> bool {
        self.state.done || self.state.truncated
    }

    /// Construct a decoder into a writer.
    pub fn into_stream<W: Write>(&mut self, writer: W) -> IntoStream<'_, W> {
        IntoStream {
            decoder: self,
            writer,
        }
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> IntoStream<'_, W> {
    /// Decode the stream from a reader, draining it until the source ends,
    /// and write the recovered bytes.
    ///
    /// Every byte decoded before a truncation is flushed to the writer; a
    /// truncated tail is reported as `UnexpectedEof` and the caller decides
    /// whether the short result is acceptable.
    pub fn decode_all(mut self, mut read: impl BufRead) -> AllResult {
        let IntoStream { decoder, writer } = &mut self;

        enum Progress {
            Ok,
            Done,
        }

        let mut bytes_read = 0;
        let mut bytes_written = 0;

        let read_bytes = &mut bytes_read;
        let write_bytes = &mut bytes_written;

        let mut outbuf = vec![0; 1 << 20];
        let once = move || {
            let data = read.fill_buf()?;
            if data.is_empty() {
                decoder.finish();
            }

            let result = decoder.decode_bytes(data, &mut outbuf[..]);
            *read_bytes += result.consumed_in;
            *write_bytes += result.consumed_out;
            read.consume(result.consumed_in);

            // Flush before looking at the status so that a truncated tail
            // still delivers everything decoded ahead of it.
            writer.write_all(&outbuf[..result.consumed_out])?;

            let done = result.status.map_err(|_| {
                io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "stream ended inside a coded token",
                )
            })?;

            if let LzssStatus::Done = done {
                return Ok(Progress::Done);
            }

            if let LzssStatus::NoProgress = done {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "no forward progress made while decoding",
                ));
            }

            Ok(Progress::Ok)
        };

        let status = core::iter::repeat_with(once)
            // scan+fuse can be replaced with map_while
            .scan((), |(), result| match result {
                Ok(Progress::Ok) => Some(Ok(())),
                Err(err) => Some(Err(err)),
                Ok(Progress::Done) => None,
            })
            .fuse()
            .collect();

        AllResult {
            bytes_read,
            bytes_written,
            status,
        }
    }
}

impl DecodeState {
    fn new() -> Self {
        DecodeState {
            window: Window::new(),
            flags: 0,
            flags_used: 8,
            partial: Partial::None,
            staged: [0; MAX_CODED],
            staged_len: 0,
            staged_read: 0,
            has_ended: false,
            done: false,
            truncated: false,
        }
    }

    fn advance(&mut self, inp: &[u8], out: &mut [u8]) -> StreamResult {
        let mut in_pos = 0;
        let mut out_pos = 0;
        let mut status = Ok(LzssStatus::Ok);

        loop {
            // Hand over whatever the previous token still has staged.
            if self.staged_read < self.staged_len {
                let n = (self.staged_len - self.staged_read).min(out.len() - out_pos);
                out[out_pos..out_pos + n]
                    .copy_from_slice(&self.staged[self.staged_read..self.staged_read + n]);
                self.staged_read += n;
                out_pos += n;
                if self.staged_read < self.staged_len {
                    break;
                }
                self.staged_len = 0;
                self.staged_read = 0;
            }

            if self.done {
                status = Ok(LzssStatus::Done);
                break;
            }
            if self.truncated {
                status = Err(LzssError::Truncated);
                break;
            }

            match self.partial {
                Partial::None => {
                    if self.flags_used == 8 {
                        if in_pos == inp.len() {
                            if self.has_ended {
                                self.done = true;
                                status = Ok(LzssStatus::Done);
                            }
                            break;
                        }
                        self.flags = inp[in_pos];
                        in_pos += 1;
                        self.flags_used = 0;
                    }
                    let coded = self.flags & 0x80 != 0;
                    self.flags <<= 1;
                    self.flags_used += 1;
                    self.partial = if coded {
                        Partial::MatchHigh
                    } else {
                        Partial::Literal
                    };
                }
                Partial::Literal => {
                    if in_pos == inp.len() {
                        if self.has_ended {
                            // Unused zero bits at the end of a final flag
                            // group promise literals that never arrive;
                            // stopping here is a normal end.
                            self.done = true;
                            status = Ok(LzssStatus::Done);
                        }
                        break;
                    }
                    let byte = inp[in_pos];
                    in_pos += 1;
                    self.window.push(byte);
                    self.staged[0] = byte;
                    self.staged_len = 1;
                    self.staged_read = 0;
                    self.partial = Partial::None;
                }
                Partial::MatchHigh => {
                    if in_pos == inp.len() {
                        if self.has_ended {
                            // Nothing of the token was read yet; padded
                            // streams routinely stop right here.
                            self.done = true;
                            status = Ok(LzssStatus::Done);
                        }
                        break;
                    }
                    self.partial = Partial::MatchLow(inp[in_pos]);
                    in_pos += 1;
                }
                Partial::MatchLow(high) => {
                    if in_pos == inp.len() {
                        if self.has_ended {
                            self.truncated = true;
                            status = Err(LzssError::Truncated);
                        }
                        break;
                    }
                    let low = inp[in_pos];
                    in_pos += 1;
                    let (distance, length) = unpack_match(high, low);
                    self.staged_len = self.window.copy(distance, length, &mut self.staged);
                    self.staged_read = 0;
                    self.partial = Partial::None;
                }
            }
        }

        if in_pos == 0 && out_pos == 0 {
            if let Ok(LzssStatus::Ok) = status {
                status = Ok(LzssStatus::NoProgress);
            }
        }

        StreamResult {
            consumed_in: in_pos,
            consumed_out: out_pos,
            status,
        }
    }
}

impl Window {
    fn new() -> Self {
        Window {
            bytes: vec![FILL_BYTE; WINDOW_SIZE].into_boxed_slice(),
            head: 0,
        }
    }

    fn wrap(pos: usize) -> usize {
        pos % WINDOW_SIZE
    }

    fn push(&mut self, byte: u8) {
        self.bytes[self.head] = byte;
        self.head = Self::wrap(self.head + 1);
    }

    /// Stage `length` bytes found `distance` before the head, then play
    /// them back into the window. Staging the whole run before the first
    /// window write keeps a copy readable even when a malformed stream
    /// makes it overlap the region being written.
    fn copy(&mut self, distance: u16, length: u8, staged: &mut [u8; MAX_CODED]) -> usize {
        let length = usize::from(length);
        let start = Self::wrap(self.head + WINDOW_SIZE - usize::from(distance));
        for (i, slot) in staged[..length].iter_mut().enumerate() {
            *slot = self.bytes[Self::wrap(start + i)];
        }
        for (i, &byte) in staged[..length].iter().enumerate() {
            self.bytes[Self::wrap(self.head + i)] = byte;
        }
        self.head = Self::wrap(self.head + length);
        length
    }
}

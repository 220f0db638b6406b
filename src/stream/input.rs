use std::io::{self, ErrorKind, Read};

use tracing::trace;

use super::{DEFAULT_CHUNK, EOF};
use crate::Integer;

/// Chunked reader over a byte source with decimal and UTF-8 decoders.
///
/// The buffer is refilled exactly when the cursor reaches the valid length.
/// A refill that yields zero bytes latches end-of-stream; the source is not
/// read again after that.
pub struct Input<R> {
    source: R,
    buffer: Box<[u8]>,
    len: usize,
    off: usize,
    eof: bool,
}

impl<R: Read> Input<R> {
    pub fn new(source: R) -> Self {
        Self::with_chunk_size(source, DEFAULT_CHUNK)
    }

    pub fn with_chunk_size(source: R, chunk: usize) -> Self {
        Self {
            source,
            buffer: vec![0; chunk.max(1)].into_boxed_slice(),
            len: 0,
            off: 0,
            eof: false,
        }
    }

    pub fn is_eof(&self) -> bool {
        self.eof
    }

    pub fn into_inner(self) -> R {
        self.source
    }

    /// Next byte of the source, or `None` at end of stream.
    pub fn next_byte(&mut self) -> io::Result<Option<u8>> {
        if self.eof {
            return Ok(None);
        }
        if self.off >= self.len {
            self.refill()?;
            if self.eof {
                return Ok(None);
            }
        }
        let byte = self.buffer[self.off];
        self.off += 1;
        Ok(Some(byte))
    }

    fn refill(&mut self) -> io::Result<()> {
        let n = loop {
            match self.source.read(&mut self.buffer) {
                Ok(n) => break n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        };
        trace!(bytes = n, "input refilled");
        self.off = 0;
        self.len = n;
        self.eof = n == 0;
        Ok(())
    }

    /// Parse an optionally negative decimal integer.
    ///
    /// Consumes digits up to and including the first non-digit byte, which
    /// is discarded. Returns [`EOF`] only if the stream was already at its
    /// end. Accumulation is unsigned and wrapping so `-9223372036854775808`
    /// parses exactly.
    pub fn read_decimal(&mut self) -> io::Result<Integer> {
        let Some(first) = self.next_byte()? else {
            return Ok(EOF);
        };
        let negative = first == b'-';
        let mut c = if negative {
            self.next_byte()?
        } else {
            Some(first)
        };

        let mut magnitude: u64 = 0;
        while let Some(digit @ b'0'..=b'9') = c {
            magnitude = magnitude
                .wrapping_mul(10)
                .wrapping_add(u64::from(digit - b'0'));
            c = self.next_byte()?;
        }

        let value = magnitude as Integer;
        Ok(if negative { value.wrapping_neg() } else { value })
    }

    /// Decode one UTF-8 sequence. Input is trusted: continuation prefixes
    /// and minimal-length encoding are not checked, and a sequence cut short
    /// by end of stream reads the missing bytes as `0xFF`.
    pub fn read_codepoint(&mut self) -> io::Result<Integer> {
        let Some(lead) = self.next_byte()? else {
            return Ok(EOF);
        };
        let lead = u32::from(lead);

        let (mut value, continuation) = if lead & 0x80 == 0 {
            return Ok(Integer::from(lead));
        } else if lead & 0x20 == 0 {
            (lead & 0x1F, 1)
        } else if lead & 0x10 == 0 {
            (lead & 0x0F, 2)
        } else {
            (lead & 0x07, 3)
        };

        for _ in 0..continuation {
            let byte = self.next_byte()?.unwrap_or(0xFF);
            value = (value << 6) | u32::from(byte & 0x3F);
        }
        Ok(Integer::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Source that hands out at most `step` bytes per read and counts reads.
    struct Trickle<'a> {
        data: &'a [u8],
        step: usize,
        reads: usize,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.reads += 1;
            let n = self.step.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("device gone"))
        }
    }

    fn input(bytes: &[u8]) -> Input<&[u8]> {
        Input::with_chunk_size(bytes, 4)
    }

    #[test]
    fn next_byte_spans_chunks() {
        let mut inp = input(b"abcdefghij");
        let mut out = Vec::new();
        while let Some(b) = inp.next_byte().unwrap() {
            out.push(b);
        }
        assert_eq!(out, b"abcdefghij");
        assert!(inp.is_eof());
    }

    #[test]
    fn eof_is_latched_without_further_reads() {
        let src = Trickle {
            data: b"xy",
            step: 1,
            reads: 0,
        };
        let mut inp = Input::with_chunk_size(src, 8);
        assert_eq!(inp.next_byte().unwrap(), Some(b'x'));
        assert_eq!(inp.next_byte().unwrap(), Some(b'y'));
        assert_eq!(inp.next_byte().unwrap(), None);
        assert_eq!(inp.next_byte().unwrap(), None);
        assert_eq!(inp.read_decimal().unwrap(), EOF);
        assert_eq!(inp.into_inner().reads, 3);
    }

    #[test]
    fn read_errors_propagate() {
        let mut inp = Input::new(Broken);
        let err = inp.next_byte().unwrap_err();
        assert_eq!(err.to_string(), "device gone");
    }

    #[test]
    fn decimal_values() {
        let mut inp = input(b"42 -17 0 9223372036854775807 -9223372036854775808");
        assert_eq!(inp.read_decimal().unwrap(), 42);
        assert_eq!(inp.read_decimal().unwrap(), -17);
        assert_eq!(inp.read_decimal().unwrap(), 0);
        assert_eq!(inp.read_decimal().unwrap(), i64::MAX);
        assert_eq!(inp.read_decimal().unwrap(), i64::MIN);
        assert_eq!(inp.read_decimal().unwrap(), EOF);
    }

    #[test]
    fn decimal_consumes_terminator() {
        let mut inp = input(b"12\n34");
        assert_eq!(inp.read_decimal().unwrap(), 12);
        assert_eq!(inp.next_byte().unwrap(), Some(b'3'));
    }

    #[test]
    fn decimal_without_digits_is_zero() {
        let mut inp = input(b"x-");
        assert_eq!(inp.read_decimal().unwrap(), 0);
        assert_eq!(inp.read_decimal().unwrap(), 0);
        assert_eq!(inp.read_decimal().unwrap(), EOF);
    }

    #[test]
    fn decimal_at_end_without_terminator() {
        let mut inp = input(b"21");
        assert_eq!(inp.read_decimal().unwrap(), 21);
        assert_eq!(inp.read_decimal().unwrap(), EOF);
    }

    #[test]
    fn codepoints_of_every_length() {
        let mut inp = input("a\u{e9}\u{d55c}\u{1f600}".as_bytes());
        assert_eq!(inp.read_codepoint().unwrap(), 0x61);
        assert_eq!(inp.read_codepoint().unwrap(), 0xE9);
        assert_eq!(inp.read_codepoint().unwrap(), 0xD55C);
        assert_eq!(inp.read_codepoint().unwrap(), 0x1F600);
        assert_eq!(inp.read_codepoint().unwrap(), EOF);
    }

    #[test]
    fn truncated_sequence_does_not_fail() {
        let mut inp = input(&[0xE2, 0x82]);
        let cp = inp.read_codepoint().unwrap();
        assert_eq!(cp, (0x2 << 12) | (0x02 << 6) | 0x3F);
        assert_eq!(inp.read_codepoint().unwrap(), EOF);
    }

    #[test]
    fn malformed_leads_decode_without_failing() {
        // stray continuation byte taken as a 2-byte lead, then a 0xFF lead
        let mut inp = input(&[0x80, 0x41, 0xFF, 0x80, 0x80, 0x80]);
        assert_eq!(inp.read_codepoint().unwrap(), 0x1);
        assert_eq!(inp.read_codepoint().unwrap(), 0x1C_0000);
        assert_eq!(inp.read_codepoint().unwrap(), EOF);

        let mut inp = input(&[0xFF]);
        assert_eq!(inp.read_codepoint().unwrap(), 0x1F_FFFF);
        assert_eq!(inp.read_codepoint().unwrap(), EOF);
    }
}

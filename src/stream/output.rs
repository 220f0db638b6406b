use std::io::{self, Write};

use tracing::trace;

use super::DEFAULT_CHUNK;
use crate::Integer;

/// Longest decimal rendering of an `i64`: sign plus 19 digits.
const DECIMAL_SCRATCH: usize = 20;

/// Byte-accumulating writer with decimal and UTF-8 encoders.
///
/// Bytes collect in a fixed-size buffer. A write that would overflow it
/// flushes the buffer first; whatever remains is written on [`flush`].
///
/// [`flush`]: Output::flush
pub struct Output<W> {
    sink: W,
    buffer: Box<[u8]>,
    off: usize,
}

impl<W: Write> Output<W> {
    pub fn new(sink: W) -> Self {
        Self::with_capacity(sink, DEFAULT_CHUNK)
    }

    pub fn with_capacity(sink: W, capacity: usize) -> Self {
        Self {
            sink,
            buffer: vec![0; capacity.max(1)].into_boxed_slice(),
            off: 0,
        }
    }

    /// Bytes currently buffered and not yet handed to the sink.
    pub fn pending(&self) -> &[u8] {
        &self.buffer[..self.off]
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    /// Hand buffered bytes to the sink and reset the cursor. Does nothing
    /// when the buffer is empty.
    pub fn flush(&mut self) -> io::Result<()> {
        if self.off == 0 {
            return Ok(());
        }
        self.sink.write_all(&self.buffer[..self.off])?;
        self.sink.flush()?;
        trace!(bytes = self.off, "output flushed");
        self.off = 0;
        Ok(())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        if self.off + bytes.len() > self.buffer.len() {
            self.flush()?;
        }
        if bytes.len() > self.buffer.len() {
            // Only reachable with a buffer smaller than one encoded value.
            return self.sink.write_all(bytes);
        }
        self.buffer[self.off..self.off + bytes.len()].copy_from_slice(bytes);
        self.off += bytes.len();
        Ok(())
    }

    pub fn write_decimal(&mut self, value: Integer) -> io::Result<()> {
        let mut scratch = [0u8; DECIMAL_SCRATCH];
        let mut start = scratch.len();
        let mut magnitude = value.unsigned_abs();
        loop {
            start -= 1;
            scratch[start] = b'0' + (magnitude % 10) as u8;
            magnitude /= 10;
            if magnitude == 0 {
                break;
            }
        }
        if value < 0 {
            start -= 1;
            scratch[start] = b'-';
        }
        self.write_bytes(&scratch[start..])
    }

    /// Encode `codepoint` as UTF-8. Surrogates and values above U+10FFFF
    /// are encoded without complaint.
    pub fn write_codepoint(&mut self, codepoint: Integer) -> io::Result<()> {
        let cp = codepoint;
        if cp < 0x80 {
            self.write_bytes(&[cp as u8])
        } else if cp < 0x800 {
            self.write_bytes(&[0xC0 | (cp >> 6) as u8, 0x80 | (cp & 0x3F) as u8])
        } else if cp < 0x10000 {
            self.write_bytes(&[
                0xE0 | (cp >> 12) as u8,
                0x80 | ((cp >> 6) & 0x3F) as u8,
                0x80 | (cp & 0x3F) as u8,
            ])
        } else {
            self.write_bytes(&[
                0xF0 | (cp >> 18) as u8,
                0x80 | ((cp >> 12) & 0x3F) as u8,
                0x80 | ((cp >> 6) & 0x3F) as u8,
                0x80 | (cp & 0x3F) as u8,
            ])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sink that records every write call separately.
    #[derive(Default)]
    struct Chunks(Vec<Vec<u8>>);

    impl Write for Chunks {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.push(buf.to_vec());
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("pipe closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn decimal(value: Integer) -> String {
        let mut out = Output::new(Vec::new());
        out.write_decimal(value).unwrap();
        out.flush().unwrap();
        String::from_utf8(out.into_inner()).unwrap()
    }

    #[test]
    fn decimal_formatting() {
        assert_eq!(decimal(0), "0");
        assert_eq!(decimal(7), "7");
        assert_eq!(decimal(-1), "-1");
        assert_eq!(decimal(1234567890), "1234567890");
        assert_eq!(decimal(i64::MAX), "9223372036854775807");
        assert_eq!(decimal(i64::MIN), "-9223372036854775808");
    }

    #[test]
    fn codepoints_match_std_encoding() {
        for ch in [
            '\0',
            'A',
            '\u{7f}',
            '\u{80}',
            '\u{7ff}',
            '\u{800}',
            '\u{d55c}',
            '\u{ffff}',
            '\u{10000}',
            '\u{10ffff}',
        ] {
            let mut out = Output::new(Vec::new());
            out.write_codepoint(ch as Integer).unwrap();
            out.flush().unwrap();
            assert_eq!(out.into_inner(), ch.to_string().into_bytes(), "{:?}", ch);
        }
    }

    #[test]
    fn nothing_reaches_sink_before_flush() {
        let mut out = Output::new(Chunks::default());
        out.write_decimal(5).unwrap();
        assert!(out.get_ref().0.is_empty());
        assert_eq!(out.pending(), b"5");
    }

    #[test]
    fn overflow_flushes_once_before_write() {
        let mut out = Output::with_capacity(Chunks::default(), 4);
        out.write_decimal(123).unwrap();
        out.write_decimal(45).unwrap();
        assert_eq!(out.get_ref().0, vec![b"123".to_vec()]);
        assert_eq!(out.pending(), b"45");
        out.write_decimal(67).unwrap();
        assert_eq!(out.get_ref().0.len(), 1);
        out.flush().unwrap();
        assert_eq!(out.into_inner().0, vec![b"123".to_vec(), b"4567".to_vec()]);
    }

    #[test]
    fn multibyte_codepoint_is_not_split_across_flushes() {
        let mut out = Output::with_capacity(Chunks::default(), 4);
        out.write_codepoint('a' as Integer).unwrap();
        out.write_codepoint(0x1F600).unwrap();
        out.flush().unwrap();
        let chunks = out.into_inner().0;
        assert_eq!(chunks[0], b"a".to_vec());
        assert_eq!(chunks[1], "\u{1f600}".as_bytes().to_vec());
    }

    #[test]
    fn value_larger_than_buffer_goes_straight_to_sink() {
        let mut out = Output::with_capacity(Vec::new(), 2);
        out.write_decimal(7).unwrap();
        out.write_decimal(-123456).unwrap();
        out.flush().unwrap();
        assert_eq!(out.into_inner(), b"7-123456");
    }

    #[test]
    fn flush_of_empty_buffer_is_a_no_op() {
        let mut out = Output::new(Chunks::default());
        out.flush().unwrap();
        out.flush().unwrap();
        assert!(out.into_inner().0.is_empty());
    }

    #[test]
    fn sink_errors_propagate() {
        let mut out = Output::new(Broken);
        out.write_decimal(1).unwrap();
        assert_eq!(out.flush().unwrap_err().to_string(), "pipe closed");
    }
}

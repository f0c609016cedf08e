//! # Command ingestor
//!
//! Frames the raw bytes of a command link into complete lines. Lines are terminated by `\n` or
//! `\r`, so `\r\n` endings simply produce an empty line which is ignored.
//!
//! Each link has a fixed capacity line buffer. Bytes which arrive once the buffer is full are
//! dropped, so an over-long line is truncated to its first [`MAX_LINE_LEN`] bytes rather than
//! overflowing. The truncated line is still dispatched when its terminator arrives, and will
//! normally fail to parse.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::trace;

use crate::hal::ByteStream;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Capacity of a line buffer, excluding the terminator.
pub const MAX_LINE_LEN: usize = 32;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A bounded buffer holding a partially received line.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: heapless::Vec<u8, MAX_LINE_LEN>,

    /// Bytes dropped from the current line because the buffer was full
    dropped: usize,
}

/// Line framer for a single command link.
#[derive(Debug, Default)]
pub struct CmdIngestor {
    line: LineBuffer,

    /// Total bytes dropped by truncation since start up
    pub num_dropped_bytes: usize,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl LineBuffer {
    /// Append a byte. Returns `false` and drops the byte if the buffer is full.
    pub fn push(&mut self, b: u8) -> bool {
        match self.buf.push(b) {
            Ok(_) => true,
            Err(_) => {
                self.dropped += 1;
                false
            }
        }
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.dropped = 0;
    }

    pub fn is_full(&self) -> bool {
        self.buf.is_full()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.buf.as_slice()
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

impl CmdIngestor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every byte currently available on `link`, calling `on_line` with each line completed.
    ///
    /// Never waits for more data. Returns the number of lines dispatched.
    pub fn drain<S, F>(&mut self, link: &mut S, mut on_line: F) -> usize
    where
        S: ByteStream,
        F: FnMut(&[u8])
    {
        let mut num_lines = 0;
        let mut remaining = link.available();

        while remaining > 0 {
            let b = match link.read_byte() {
                Some(b) => b,
                None => break
            };
            remaining -= 1;

            match b {
                b'\n' | b'\r' => {
                    if self.line.is_empty() {
                        continue
                    }

                    if self.line.dropped() > 0 {
                        trace!(
                            "Line truncated, {} bytes dropped",
                            self.line.dropped()
                        );
                        self.num_dropped_bytes += self.line.dropped();
                    }

                    on_line(self.line.as_bytes());
                    self.line.clear();
                    num_lines += 1;
                },
                _ => {
                    self.line.push(b);
                }
            }
        }

        num_lines
    }

    /// The line received so far.
    pub fn pending(&self) -> &LineBuffer {
        &self.line
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::hal::sim::SimLink;

    fn drain_all(ing: &mut CmdIngestor, link: &mut SimLink) -> Vec<Vec<u8>> {
        let mut lines = Vec::new();
        ing.drain(link, |l| lines.push(l.to_vec()));
        lines
    }

    #[test]
    fn test_line_buffer() {
        let mut buf = LineBuffer::default();
        for i in 0..MAX_LINE_LEN {
            assert!(buf.push(i as u8));
        }
        assert!(buf.is_full());
        assert!(!buf.push(0));
        assert_eq!(buf.dropped(), 1);
        assert_eq!(buf.as_bytes().len(), MAX_LINE_LEN);

        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.dropped(), 0);
    }

    #[test]
    fn test_framing() {
        let mut ing = CmdIngestor::new();
        let mut link = SimLink::default();

        link.push_str("100,100\r\nS3L\n\n\r50,");
        let lines = drain_all(&mut ing, &mut link);
        assert_eq!(lines, vec![b"100,100".to_vec(), b"S3L".to_vec()]);

        // Partial line is kept across drains
        assert_eq!(ing.pending().as_bytes(), b"50,");
        link.push_str("-50\n");
        let lines = drain_all(&mut ing, &mut link);
        assert_eq!(lines, vec![b"50,-50".to_vec()]);
        assert!(ing.pending().is_empty());
    }

    #[test]
    fn test_truncation() {
        let mut ing = CmdIngestor::new();
        let mut link = SimLink::default();

        let long = "1".repeat(40);
        link.push_str(&long);
        link.push_str("\nS1R\n");

        let lines = drain_all(&mut ing, &mut link);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].len(), MAX_LINE_LEN);
        assert_eq!(lines[1], b"S1R".to_vec());
        assert_eq!(ing.num_dropped_bytes, 8);
    }

    #[test]
    fn test_empty_link() {
        let mut ing = CmdIngestor::new();
        let mut link = SimLink::default();
        assert_eq!(ing.drain(&mut link, |_| panic!("no line expected")), 0);
    }
}

use crate::lcd::hd44780::{COLUMNS, LINES};

/// Capacity of the text buffer as seen by a byte-stream writer: one byte per character cell plus
/// the terminator slot, which is never filled with text.
pub const TEXT_CAPACITY: usize = LINES * COLUMNS + 1;
/// Longest text that is kept.
pub const MAX_TEXT_LEN: usize = TEXT_CAPACITY - 1;

/// The most recently written text, bounded to [MAX_TEXT_LEN] bytes.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TextBuffer {
    bytes: heapless::Vec<u8, MAX_TEXT_LEN>,
}

impl TextBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the contents with as much of `input` as fits, returning the number of bytes kept.
    ///
    /// A single trailing `\n` in the kept text is turned into a space, as the display would show
    /// it as a stray glyph.
    pub fn replace(&mut self, input: &[u8]) -> usize {
        self.bytes.clear();
        for &byte in input {
            if self.bytes.push(byte).is_err() {
                break;
            }
        }

        if let Some(last) = self.bytes.last_mut() {
            if *last == b'\n' {
                *last = b' ';
            }
        }
        self.bytes.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Copies the text starting at `offset` into `buf`, returning the number of bytes copied.
    /// Returns 0 once `offset` reaches the end of the text.
    pub fn read_at(&self, offset: usize, buf: &mut [u8]) -> usize {
        let Some(remaining) = self.bytes.get(offset..) else {
            return 0;
        };
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        n
    }
}

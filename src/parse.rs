use bstr::{BStr, ByteSlice};

/// A single line read from a stream of line delimited records.
///
/// Callers never need to deal with line terminators or with counting lines
/// themselves.
#[derive(Clone, Copy, Debug)]
pub struct Line<'a> {
    /// The line number, 1-indexed.
    number: usize,
    /// The full line including its line terminator if present.
    full: &'a BStr,
}

impl<'a> Line<'a> {
    pub fn new(number: usize, full: &'a [u8]) -> Line<'a> {
        Line { number, full: full.as_bstr() }
    }

    /// Return the one-indexed line number of this line.
    pub fn number(&self) -> usize {
        self.number
    }

    /// Return only the content of the line, i.e., the line without its
    /// terminator (if present).
    pub fn content(&self) -> &'a BStr {
        let full: &'a [u8] = self.full.as_bytes();
        let content = full.strip_suffix(b"\n").unwrap_or(full);
        content.strip_suffix(b"\r").unwrap_or(content).as_bstr()
    }

    /// Returns true when this line has nothing but whitespace in it.
    pub fn is_blank(&self) -> bool {
        self.content().trim_ascii().is_empty()
    }

    /// Deserializes the content of this line as a single JSON value.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> anyhow::Result<T> {
        Ok(serde_json::from_slice(self.content())?)
    }
}

/// An extension trait for `std::io::BufRead` that iterates over lines as
/// byte strings while reporting errors through `anyhow`.
pub trait BufReadExt: std::io::BufRead {
    /// Executes the given closure on each (`\n`|`\r\n`)-terminated line in
    /// the underlying reader.
    ///
    /// Iteration stops early when the closure returns `false` or an error.
    fn for_byte_line<F>(&mut self, mut for_each_line: F) -> anyhow::Result<()>
    where
        Self: Sized,
        F: FnMut(Line<'_>) -> anyhow::Result<bool>,
    {
        let mut number = 0;
        let mut bytes = vec![];
        loop {
            bytes.clear();
            if self.read_until(b'\n', &mut bytes)? == 0 {
                break;
            }
            number += 1;
            if !for_each_line(Line::new(number, &bytes))? {
                break;
            }
        }
        Ok(())
    }
}

impl<B: std::io::BufRead> BufReadExt for B {}

//! Line scanner for G-code text buffers
//!
//! Splits a document into `\n`-delimited lines while keeping the byte
//! offset of each line in the source buffer. Lines are handed out
//! untouched: comment stripping and trimming happen in the interpreter so
//! that offsets always point at the source text.

/// One line of the source document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScannedLine<'a> {
    /// Line text without the terminating `\n`
    pub text: &'a str,
    /// Byte offset of the first character of the line
    pub offset: usize,
}

/// Restartable line scanner over a complete document
#[derive(Debug, Clone, Copy)]
pub struct LineScanner<'a> {
    data: &'a str,
}

impl<'a> LineScanner<'a> {
    /// Create a scanner over the full document text
    pub fn new(data: &'a str) -> Self {
        Self { data }
    }

    /// Iterate over the lines from the start of the document
    pub fn lines(&self) -> Lines<'a> {
        Lines {
            data: self.data,
            pos: 0,
        }
    }

    /// Total size of the document in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Lazy iterator over scanned lines
#[derive(Debug, Clone)]
pub struct Lines<'a> {
    data: &'a str,
    pos: usize,
}

impl<'a> Iterator for Lines<'a> {
    type Item = ScannedLine<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.data.len() {
            return None;
        }

        let rest = &self.data[self.pos..];
        let offset = self.pos;
        match rest.find('\n') {
            Some(end) => {
                self.pos += end + 1;
                Some(ScannedLine {
                    text: &rest[..end],
                    offset,
                })
            }
            None => {
                // Final unterminated line
                self.pos = self.data.len();
                Some(ScannedLine { text: rest, offset })
            }
        }
    }
}

impl std::iter::FusedIterator for Lines<'_> {}

use std::io::BufRead;

use cairn_core::CairnError;

/// A stream of characters with a single character of pushback.
pub trait CharSource {
    /// The next character, or `None` once the input is exhausted.
    fn next_char(&mut self) -> Result<Option<char>, CairnError>;

    /// Push `c` back so the next call to `next_char` returns it.
    ///
    /// Returns `false` if a character is already pending.
    fn unread(&mut self, c: char) -> bool;
}

impl<S: CharSource + ?Sized> CharSource for &mut S {
    fn next_char(&mut self) -> Result<Option<char>, CairnError> {
        (**self).next_char()
    }

    fn unread(&mut self, c: char) -> bool {
        (**self).unread(c)
    }
}

/// Characters of an in-memory string.
#[derive(Debug, Clone)]
pub struct StrSource<'a> {
    chars: std::str::Chars<'a>,
    pending: Option<char>,
}

impl<'a> StrSource<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars(),
            pending: None,
        }
    }
}

impl CharSource for StrSource<'_> {
    fn next_char(&mut self) -> Result<Option<char>, CairnError> {
        if let Some(c) = self.pending.take() {
            return Ok(Some(c));
        }
        Ok(self.chars.next())
    }

    fn unread(&mut self, c: char) -> bool {
        if self.pending.is_some() {
            return false;
        }
        self.pending = Some(c);
        true
    }
}

/// Buffered-stream adapter: pulls one line at a time from a `BufRead`.
#[derive(Debug)]
pub struct StreamSource<R> {
    reader: R,
    line: String,
    pos: usize,
    pending: Option<char>,
}

impl<R: BufRead> StreamSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            pos: 0,
            pending: None,
        }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: BufRead> CharSource for StreamSource<R> {
    fn next_char(&mut self) -> Result<Option<char>, CairnError> {
        if let Some(c) = self.pending.take() {
            return Ok(Some(c));
        }
        while self.pos >= self.line.len() {
            self.line.clear();
            self.pos = 0;
            if self.reader.read_line(&mut self.line)? == 0 {
                return Ok(None);
            }
        }
        let c = self.line[self.pos..].chars().next();
        if let Some(c) = c {
            self.pos += c.len_utf8();
        }
        Ok(c)
    }

    fn unread(&mut self, c: char) -> bool {
        if self.pending.is_some() {
            return false;
        }
        self.pending = Some(c);
        true
    }
}

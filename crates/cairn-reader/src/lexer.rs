use std::fmt;

use cairn_core::error::{push_char, reserve_one};
use cairn_core::CairnError;

use crate::source::CharSource;

/// One word of input text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    text: String,
}

impl Token {
    pub fn new(text: impl Into<String>) -> Self {
        Token { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    pub fn is_open(&self) -> bool {
        self.text == "("
    }

    pub fn is_close(&self) -> bool {
        self.text == ")"
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    Quoted,
    Escape,
}

fn is_self_delimited(c: char) -> bool {
    c == '(' || c == ')'
}

/// Map the character after a backslash inside a string.
pub fn quote_escape(c: char) -> char {
    match c {
        'a' => '\x07',
        'b' => '\x08',
        'f' => '\x0c',
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        'v' => '\x0b',
        other => other,
    }
}

/// Read one word from `source`.
///
/// Returns `None` only when the source is exhausted before any character of
/// a word was seen.
pub fn read_word<S: CharSource + ?Sized>(source: &mut S) -> Result<Option<Token>, CairnError> {
    let mut mode = Mode::Normal;
    let mut text = String::new();

    while let Some(c) = source.next_char()? {
        match mode {
            Mode::Normal => {
                if text.is_empty() && c.is_whitespace() {
                    continue;
                }
                if is_self_delimited(c) {
                    if text.is_empty() {
                        push_char(&mut text, c, "token")?;
                    } else if !source.unread(c) {
                        return Err(CairnError::reader("pushback slot already in use", 0));
                    }
                    return Ok(Some(Token { text }));
                }
                if c.is_whitespace() {
                    return Ok(Some(Token { text }));
                }
                push_char(&mut text, c, "token")?;
                if c == '"' {
                    mode = Mode::Quoted;
                }
            }
            Mode::Quoted => {
                if c == '\\' {
                    mode = Mode::Escape;
                } else {
                    push_char(&mut text, c, "token")?;
                    if c == '"' {
                        mode = Mode::Normal;
                    }
                }
            }
            Mode::Escape => {
                push_char(&mut text, quote_escape(c), "token")?;
                mode = Mode::Quoted;
            }
        }
    }

    if text.is_empty() {
        Ok(None)
    } else {
        Ok(Some(Token { text }))
    }
}

/// Read the tokens of exactly one balanced top-level expression.
///
/// An empty vector means the source ended before the expression began.
pub fn read_expression<S: CharSource + ?Sized>(source: &mut S) -> Result<Vec<Token>, CairnError> {
    let mut tokens = Vec::new();
    let mut open = 0usize;
    let mut close = 0usize;

    while tokens.is_empty() || open != close {
        let Some(token) = read_word(source)? else {
            if tokens.is_empty() {
                return Ok(tokens);
            }
            return Err(CairnError::UnexpectedEof { open, close });
        };
        if token.is_open() {
            open += 1;
        } else if token.is_close() {
            close += 1;
            if close > open {
                return Err(CairnError::reader("unexpected ')'", tokens.len()));
            }
        }
        reserve_one(&mut tokens, "token buffer")?;
        tokens.push(token);
    }
    Ok(tokens)
}

/// Split a whole string into tokens, without framing.
pub fn tokenize(input: &str) -> Result<Vec<Token>, CairnError> {
    let mut source = crate::source::StrSource::new(input);
    let mut tokens = Vec::new();
    while let Some(token) = read_word(&mut source)? {
        reserve_one(&mut tokens, "token buffer")?;
        tokens.push(token);
    }
    Ok(tokens)
}

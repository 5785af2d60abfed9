use cairn_core::error::reserve_one;
use cairn_core::{CairnError, Machine, ObjRef};

use crate::lexer::{read_expression, Token};
use crate::source::StrSource;

/// How a non-paren token decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtomKind {
    String,
    Integer,
    Double,
    Symbol,
}

/// Classify an atom token by its text.
///
/// Numbers start with a digit, `+`, `-` or `.` and contain at least one
/// digit; a bare `+` or `-` is a symbol.
pub fn classify(text: &str) -> AtomKind {
    let Some(first) = text.chars().next() else {
        return AtomKind::Symbol;
    };
    if first == '"' {
        return AtomKind::String;
    }
    if first.is_ascii_digit() || matches!(first, '+' | '-' | '.') {
        if !text.chars().any(|c| c.is_ascii_digit()) {
            return AtomKind::Symbol;
        }
        if text.contains(|c| matches!(c, '.' | 'e' | 'E')) {
            return AtomKind::Double;
        }
        return AtomKind::Integer;
    }
    AtomKind::Symbol
}

/// Length of the leading run of ASCII digits in `bytes`.
fn digit_run(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

/// Decode the integer prefix of `text`: optional sign followed by digits.
/// Anything after the digits is ignored; no digits at all decodes as zero.
fn leading_integer(text: &str) -> Option<i64> {
    let bytes = text.as_bytes();
    let sign = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let digits = digit_run(&bytes[sign..]);
    if digits == 0 {
        return Some(0);
    }
    text[..sign + digits].parse().ok()
}

/// Decode the floating point prefix of `text`.
fn leading_double(text: &str) -> f64 {
    let bytes = text.as_bytes();
    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_digits = digit_run(&bytes[end..]);
    end += int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = digit_run(&bytes[end + 1..]);
        end += 1 + frac_digits;
    }
    if int_digits + frac_digits == 0 {
        return 0.0;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_digits = digit_run(&bytes[exp..]);
        if exp_digits > 0 {
            end = exp + exp_digits;
        }
    }
    text[..end].parse().unwrap_or(0.0)
}

/// Strip the surrounding quote characters from a string token.
fn string_body(text: &str) -> &str {
    let body = text.strip_prefix('"').unwrap_or(text);
    body.strip_suffix('"').unwrap_or(body)
}

struct Parser<'a, 'm> {
    machine: &'m mut Machine,
    tokens: &'a [Token],
    pos: usize,
}

impl<'a, 'm> Parser<'a, 'm> {
    fn new(machine: &'m mut Machine, tokens: &'a [Token]) -> Self {
        Parser {
            machine,
            tokens,
            pos: 0,
        }
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn unexpected_eof(&self) -> CairnError {
        let open = self.tokens.iter().filter(|t| t.is_open()).count();
        let close = self.tokens.iter().filter(|t| t.is_close()).count();
        CairnError::UnexpectedEof { open, close }
    }

    /// Parse one expression. Lists under construction live on an explicit
    /// stack, so nesting depth is bounded by memory rather than the call
    /// stack.
    fn parse_expr(&mut self) -> Result<ObjRef, CairnError> {
        // Elements collected so far for each unclosed `(`, innermost last.
        let mut open: Vec<Vec<ObjRef>> = Vec::new();
        loop {
            let position = self.pos;
            let Some(token) = self.advance() else {
                return Err(self.unexpected_eof());
            };
            let expr = if token.is_open() {
                reserve_one(&mut open, "list stack")?;
                open.push(Vec::new());
                continue;
            } else if token.is_close() {
                match open.pop() {
                    Some(items) => self.machine.list(&items)?,
                    None => return Err(CairnError::reader("unexpected ')'", position)),
                }
            } else {
                self.parse_atom(token, position)?
            };
            match open.last_mut() {
                Some(items) => {
                    reserve_one(items, "list buffer")?;
                    items.push(expr);
                }
                None => return Ok(expr),
            }
        }
    }

    fn parse_atom(&mut self, token: &Token, position: usize) -> Result<ObjRef, CairnError> {
        let text = token.as_str();
        match classify(text) {
            AtomKind::String => self.machine.string(string_body(text)),
            AtomKind::Integer => match leading_integer(text) {
                Some(n) => self.machine.int(n),
                None => Err(CairnError::reader(
                    format!("integer literal out of range: {text}"),
                    position,
                )),
            },
            AtomKind::Double => self.machine.double(leading_double(text)),
            AtomKind::Symbol => self.machine.symbol(text),
        }
    }
}

/// Build an object from the tokens of one expression.
///
/// Only the first expression is consumed; any tokens after it are ignored.
pub fn read(machine: &mut Machine, tokens: &[Token]) -> Result<ObjRef, CairnError> {
    Parser::new(machine, tokens).parse_expr()
}

/// Frame and parse every expression in `input`.
pub fn read_str(machine: &mut Machine, input: &str) -> Result<Vec<ObjRef>, CairnError> {
    let mut source = StrSource::new(input);
    let mut exprs = Vec::new();
    loop {
        let tokens = read_expression(&mut source)?;
        if tokens.is_empty() {
            return Ok(exprs);
        }
        let expr = read(machine, &tokens)?;
        reserve_one(&mut exprs, "expression buffer")?;
        exprs.push(expr);
    }
}

/// Faults raised by the runtime itself.
///
/// These are distinct from `Object::Error`, which is ordinary data produced by
/// a failed evaluation. A `CairnError` means the machine could not carry out
/// the request at all: malformed input text, exhausted resources, or an
/// internal invariant that no longer holds.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CairnError {
    #[error("Reader error at token {position}: {message}")]
    Reader { message: String, position: usize },

    #[error("Unexpected end of input ({open} open, {close} closed)")]
    UnexpectedEof { open: usize, close: usize },

    #[error("Recursion limit exceeded: evaluation nested {depth} levels deep")]
    RecursionLimit { depth: usize },

    #[error("Out of memory while growing {what}")]
    OutOfMemory { what: &'static str },

    #[error("Invalid handle #{handle}: expected {expected}")]
    InvalidHandle { handle: u32, expected: &'static str },

    #[error("Interrupted")]
    Interrupted,

    #[error("IO error: {0}")]
    Io(String),
}

impl CairnError {
    pub fn reader(message: impl Into<String>, position: usize) -> Self {
        CairnError::Reader {
            message: message.into(),
            position,
        }
    }

    pub fn out_of_memory(what: &'static str) -> Self {
        CairnError::OutOfMemory { what }
    }

    pub fn invalid_handle(handle: u32, expected: &'static str) -> Self {
        CairnError::InvalidHandle { handle, expected }
    }

    /// True for faults that leave the machine usable for the next expression.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CairnError::Reader { .. }
                | CairnError::UnexpectedEof { .. }
                | CairnError::RecursionLimit { .. }
                | CairnError::Interrupted
        )
    }
}

impl From<std::io::Error> for CairnError {
    fn from(err: std::io::Error) -> Self {
        CairnError::Io(err.to_string())
    }
}

/// Reserve room for one more element, mapping allocation failure to a fault.
pub fn reserve_one<T>(items: &mut Vec<T>, what: &'static str) -> Result<(), CairnError> {
    items
        .try_reserve(1)
        .map_err(|_| CairnError::out_of_memory(what))
}

/// Append a character to a text buffer without aborting on allocation failure.
pub fn push_char(text: &mut String, c: char, what: &'static str) -> Result<(), CairnError> {
    text.try_reserve(c.len_utf8())
        .map_err(|_| CairnError::out_of_memory(what))?;
    text.push(c);
    Ok(())
}

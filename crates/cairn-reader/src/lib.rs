pub mod lexer;
mod reader;
pub mod source;

pub use lexer::{read_expression, read_word, tokenize, Token};
pub use reader::{classify, read, read_str, AtomKind};
pub use source::{CharSource, StrSource, StreamSource};

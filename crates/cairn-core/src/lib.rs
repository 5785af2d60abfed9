pub mod env;
pub mod error;
pub mod machine;
pub mod printer;
pub mod symbol;
pub mod value;

pub use env::Env;
pub use error::CairnError;
pub use machine::{Machine, DEFAULT_MAX_EVAL_DEPTH};
pub use printer::Rendered;
pub use symbol::{Symbol, SymbolTable};
pub use value::{Closure, Heap, NativeFn, NativeFnInner, ObjRef, Object};

pub type EvalResult = Result<ObjRef, CairnError>;

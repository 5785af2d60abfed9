mod eval;
mod interpreter;
mod special_forms;

pub use eval::{apply_closure, eval, eval_args};
pub use interpreter::Interpreter;
pub use special_forms::{is_builtin, SPECIAL_FORM_NAMES};

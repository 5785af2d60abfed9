//! Builtin functions that operate on already-evaluated arguments and need no
//! access to the evaluator.

mod arithmetic;
mod list;

use cairn_core::{CairnError, Machine};

/// Bind every builtin function of this crate in the root environment.
pub fn register_stdlib(m: &mut Machine) -> Result<(), CairnError> {
    arithmetic::register(m)?;
    list::register(m)?;
    tracing::debug!(symbols = m.symbols.len(), "stdlib registered");
    Ok(())
}

//! Textual rendering of objects.
//!
//! Atoms render as `<symbol>`, `"string"`, integer or six-decimal floating
//! point text, each followed by a space. A list opens with `(` and closes
//! with `) ` where its nil terminator sits; nested lists open with `( `.
//! Pairs with exactly one absent field fall back to a dotted
//! `(car . cdr)` form.
//!
//! Rendering runs off an explicit work stack, so neither long nor deeply
//! nested structures consume call stack.

use std::fmt::{self, Write};

use crate::machine::Machine;
use crate::value::{ObjRef, Object};

/// A `Display` adapter for an object in a machine.
pub struct Rendered<'a> {
    machine: &'a Machine,
    obj: ObjRef,
}

impl Machine {
    pub fn display(&self, obj: ObjRef) -> Rendered<'_> {
        Rendered { machine: self, obj }
    }

    pub fn render(&self, obj: ObjRef) -> String {
        self.display(obj).to_string()
    }
}

impl fmt::Display for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let printer = Printer {
            machine: self.machine,
        };
        let first = if printer.is_list_cell(self.obj) {
            f.write_char('(')?;
            Step::Cell(self.obj)
        } else {
            Step::Element(self.obj)
        };
        printer.run(f, first)
    }
}

/// Pending rendering work, popped last-in first-out.
enum Step {
    Text(&'static str),
    /// An object in element position, followed by a space.
    Element(ObjRef),
    /// The remainder of a list whose opener is already written.
    Cell(ObjRef),
    /// A field of the dotted fallback form; `None` is an absent field.
    Dotted(Option<ObjRef>),
}

struct Printer<'a> {
    machine: &'a Machine,
}

impl Printer<'_> {
    /// Nil, or a pair with both fields present.
    fn is_list_cell(&self, obj: ObjRef) -> bool {
        matches!(
            self.machine.get(obj),
            Ok(Object::Pair {
                car: None,
                cdr: None
            }) | Ok(Object::Pair {
                car: Some(_),
                cdr: Some(_)
            })
        )
    }

    fn run(&self, f: &mut fmt::Formatter<'_>, first: Step) -> fmt::Result {
        let mut work = vec![first];
        while let Some(step) = work.pop() {
            match step {
                Step::Text(text) => f.write_str(text)?,
                Step::Element(obj) => self.element(f, obj, &mut work)?,
                Step::Cell(cell) => self.cell(f, cell, &mut work)?,
                Step::Dotted(None) => f.write_str("null")?,
                Step::Dotted(Some(obj)) => self.dotted(f, obj, &mut work)?,
            }
        }
        Ok(())
    }

    fn element(
        &self,
        f: &mut fmt::Formatter<'_>,
        obj: ObjRef,
        work: &mut Vec<Step>,
    ) -> fmt::Result {
        let Ok(object) = self.machine.get(obj) else {
            return f.write_str("*INVALID* ");
        };
        match object {
            Object::Pair { .. } if self.is_list_cell(obj) => {
                work.push(Step::Cell(obj));
                f.write_str("( ")
            }
            Object::Pair { .. } => {
                work.push(Step::Text(" "));
                work.push(Step::Dotted(Some(obj)));
                Ok(())
            }
            other => {
                self.atom(f, other)?;
                f.write_char(' ')
            }
        }
    }

    /// Render the head of a list cell and schedule the rest of the list.
    fn cell(
        &self,
        f: &mut fmt::Formatter<'_>,
        cell: ObjRef,
        work: &mut Vec<Step>,
    ) -> fmt::Result {
        let (car, cdr) = match self.machine.get(cell) {
            Ok(Object::Pair {
                car: Some(car),
                cdr: Some(cdr),
            }) => (*car, *cdr),
            _ => return f.write_str(") "),
        };
        if self.is_list_cell(cdr) {
            work.push(Step::Cell(cdr));
        } else {
            work.push(Step::Text(") "));
            work.push(Step::Element(cdr));
            work.push(Step::Text(". "));
        }
        work.push(Step::Element(car));
        Ok(())
    }

    fn dotted(
        &self,
        f: &mut fmt::Formatter<'_>,
        obj: ObjRef,
        work: &mut Vec<Step>,
    ) -> fmt::Result {
        let Ok(object) = self.machine.get(obj) else {
            return f.write_str("*INVALID*");
        };
        match object {
            Object::Pair { car, cdr } => {
                work.push(Step::Text(")"));
                work.push(Step::Dotted(*cdr));
                work.push(Step::Text(" . "));
                work.push(Step::Dotted(*car));
                f.write_char('(')
            }
            other => self.atom(f, other),
        }
    }

    fn atom(&self, f: &mut fmt::Formatter<'_>, obj: &Object) -> fmt::Result {
        match obj {
            Object::Symbol(sym) => write!(f, "<{}>", self.machine.symbol_name(*sym)),
            Object::String(s) => write!(f, "\"{s}\""),
            Object::Integer(n) => write!(f, "{n}"),
            Object::Double(d) => write!(f, "{d:.6}"),
            Object::Pair { .. } => f.write_str("*PAIR*"),
            Object::Environment(_) => f.write_str("*ENV*"),
            Object::Error => f.write_str("*ERROR*"),
            Object::BuiltinForm(_) => f.write_str("*BUILTIN_FORM*"),
            Object::BuiltinFunction(_) => f.write_str("*BUILTIN_FUNC*"),
            Object::Closure(_) => f.write_str("*CLOSURE*"),
        }
    }
}

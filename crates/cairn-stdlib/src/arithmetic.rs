use cairn_core::error::reserve_one;
use cairn_core::{CairnError, Machine, ObjRef, Object};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Num {
    Int(i64),
    Double(f64),
}

impl Num {
    fn from_object(obj: &Object) -> Option<Num> {
        match obj {
            Object::Integer(n) => Some(Num::Int(*n)),
            Object::Double(d) => Some(Num::Double(*d)),
            _ => None,
        }
    }

    fn to_double(self) -> f64 {
        match self {
            Num::Int(n) => n as f64,
            Num::Double(d) => d,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

impl Op {
    fn name(self) -> &'static str {
        match self {
            Op::Add => "+",
            Op::Sub => "-",
            Op::Mul => "*",
            Op::Div => "/",
        }
    }

    /// `None` on overflow or division by zero.
    fn ints(self, a: i64, b: i64) -> Option<i64> {
        match self {
            Op::Add => a.checked_add(b),
            Op::Sub => a.checked_sub(b),
            Op::Mul => a.checked_mul(b),
            Op::Div => a.checked_div(b),
        }
    }

    fn doubles(self, a: f64, b: f64) -> f64 {
        match self {
            Op::Add => a + b,
            Op::Sub => a - b,
            Op::Mul => a * b,
            Op::Div => a / b,
        }
    }

    /// Integers stay integers until a double shows up on either side.
    fn combine(self, acc: Num, next: Num) -> Option<Num> {
        match (acc, next) {
            (Num::Int(a), Num::Int(b)) => self.ints(a, b).map(Num::Int),
            (a, b) => Some(Num::Double(self.doubles(a.to_double(), b.to_double()))),
        }
    }

    /// Single-argument behavior of `-` and `/`.
    fn unary(self, n: Num) -> Option<Num> {
        match (self, n) {
            (Op::Sub, Num::Int(n)) => n.checked_neg().map(Num::Int),
            (Op::Sub, Num::Double(d)) => Some(Num::Double(-d)),
            (Op::Div, n) => Some(Num::Double(1.0 / n.to_double())),
            (_, n) => Some(n),
        }
    }
}

fn alloc_num(m: &mut Machine, n: Num) -> Result<ObjRef, CairnError> {
    match n {
        Num::Int(n) => m.int(n),
        Num::Double(d) => m.double(d),
    }
}

fn fold(m: &mut Machine, op: Op, args: ObjRef) -> Result<ObjRef, CairnError> {
    let items = m.heap.list_items(args)?;
    let mut nums = Vec::new();
    for item in items {
        let obj = m.get(item)?;
        match Num::from_object(obj) {
            Some(n) => {
                reserve_one(&mut nums, "argument buffer")?;
                nums.push(n);
            }
            None => {
                let type_name = obj.type_name();
                return m.error(format!("{}: expected number, got {type_name}", op.name()));
            }
        }
    }

    let result = match nums.as_slice() {
        [] => return m.error(format!("{}: expected at least one argument", op.name())),
        [only] if matches!(op, Op::Sub | Op::Div) => op.unary(*only),
        [first, rest @ ..] => rest
            .iter()
            .try_fold(*first, |acc, &next| op.combine(acc, next)),
    };
    match result {
        Some(n) => alloc_num(m, n),
        None => m.error(format!(
            "{}: integer overflow or division by zero",
            op.name()
        )),
    }
}

fn add(m: &mut Machine, args: ObjRef, _env: ObjRef) -> Result<ObjRef, CairnError> {
    fold(m, Op::Add, args)
}

fn sub(m: &mut Machine, args: ObjRef, _env: ObjRef) -> Result<ObjRef, CairnError> {
    fold(m, Op::Sub, args)
}

fn mul(m: &mut Machine, args: ObjRef, _env: ObjRef) -> Result<ObjRef, CairnError> {
    fold(m, Op::Mul, args)
}

fn div(m: &mut Machine, args: ObjRef, _env: ObjRef) -> Result<ObjRef, CairnError> {
    fold(m, Op::Div, args)
}

pub fn register(m: &mut Machine) -> Result<(), CairnError> {
    m.register_fn("+", add)?;
    m.register_fn("-", sub)?;
    m.register_fn("*", mul)?;
    m.register_fn("/", div)?;
    Ok(())
}

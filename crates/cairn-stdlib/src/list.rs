use cairn_core::{CairnError, Machine, ObjRef};

#[derive(Clone, Copy)]
enum Field {
    Car,
    Cdr,
}

/// First element of an evaluated argument list, if any.
fn first_arg(m: &Machine, args: ObjRef) -> Result<Option<ObjRef>, CairnError> {
    m.heap.car(args)
}

fn missing_arg(m: &mut Machine, name: &str) -> Result<ObjRef, CairnError> {
    m.error(format!("{name}: expected an argument"))
}

fn not_a_pair(m: &mut Machine, name: &str, obj: ObjRef) -> Result<ObjRef, CairnError> {
    let type_name = m.get(obj)?.type_name();
    m.error(format!("{name}: expected pair, got {type_name}"))
}

/// Project one field of a pair. An absent field reads as a fresh nil.
fn project(m: &mut Machine, name: &str, obj: ObjRef, field: Field) -> Result<ObjRef, CairnError> {
    let Some((car, cdr)) = m.get(obj)?.as_pair() else {
        return not_a_pair(m, name, obj);
    };
    let value = match field {
        Field::Car => car,
        Field::Cdr => cdr,
    };
    match value {
        Some(r) => Ok(r),
        None => m.nil(),
    }
}

fn car(m: &mut Machine, args: ObjRef, _env: ObjRef) -> Result<ObjRef, CairnError> {
    match first_arg(m, args)? {
        Some(obj) => project(m, "car", obj, Field::Car),
        None => missing_arg(m, "car"),
    }
}

fn cdr(m: &mut Machine, args: ObjRef, _env: ObjRef) -> Result<ObjRef, CairnError> {
    match first_arg(m, args)? {
        Some(obj) => project(m, "cdr", obj, Field::Cdr),
        None => missing_arg(m, "cdr"),
    }
}

fn cadr(m: &mut Machine, args: ObjRef, _env: ObjRef) -> Result<ObjRef, CairnError> {
    let Some(obj) = first_arg(m, args)? else {
        return missing_arg(m, "cadr");
    };
    let Some((_, rest)) = m.get(obj)?.as_pair() else {
        return not_a_pair(m, "cadr", obj);
    };
    match rest {
        Some(rest) => project(m, "cadr", rest, Field::Car),
        None => m.nil(),
    }
}

fn cons(m: &mut Machine, args: ObjRef, _env: ObjRef) -> Result<ObjRef, CairnError> {
    match m.heap.list_items(args)?.as_slice() {
        [head, tail] => m.cons(*head, *tail),
        items => {
            let count = items.len();
            m.error(format!("cons: expected 2 arguments, got {count}"))
        }
    }
}

fn list(_m: &mut Machine, args: ObjRef, _env: ObjRef) -> Result<ObjRef, CairnError> {
    Ok(args)
}

fn reverse(m: &mut Machine, args: ObjRef, _env: ObjRef) -> Result<ObjRef, CairnError> {
    let Some(obj) = first_arg(m, args)? else {
        return missing_arg(m, "reverse");
    };
    if !m.get(obj)?.is_pair() {
        return not_a_pair(m, "reverse", obj);
    }
    m.heap.reverse_list(obj)
}

pub fn register(m: &mut Machine) -> Result<(), CairnError> {
    m.register_fn("car", car)?;
    m.register_fn("cdr", cdr)?;
    m.register_fn("cadr", cadr)?;
    m.register_fn("cons", cons)?;
    m.register_fn("list", list)?;
    m.register_fn("reverse", reverse)?;
    Ok(())
}

use std::cmp::Ordering;

use bson::Bson;
use bson::oid::ObjectId;

/// Compare a stored value with a query operand.
///
/// Query operands from a URL arrive as strings; a string operand is coerced
/// to the stored value's type. `None` means the two are not comparable and
/// the condition does not match.
pub(crate) fn operand_cmp(stored: &Bson, query: &Bson) -> Option<Ordering> {
    match (stored, query) {
        // ── Direct type matches ─────────────────────────────────
        (Bson::String(a), Bson::String(b)) => Some(a.as_str().cmp(b.as_str())),
        (Bson::Boolean(a), Bson::Boolean(b)) => Some(a.cmp(b)),
        (Bson::DateTime(a), Bson::DateTime(b)) => {
            Some(a.timestamp_millis().cmp(&b.timestamp_millis()))
        }
        (Bson::ObjectId(a), Bson::ObjectId(b)) => Some(a.bytes().cmp(&b.bytes())),
        (Bson::Null, Bson::Null) => Some(Ordering::Equal),
        (a, b) if is_number(a) && is_number(b) => number_cmp(a, b),

        // ── Cross-type coercion: Bson::String → stored type ─
        (a, Bson::String(s)) if is_number(a) => {
            let b = s.trim().parse::<f64>().ok()?;
            as_f64(a)?.partial_cmp(&b)
        }
        (Bson::Boolean(a), Bson::String(s)) => match s.as_str() {
            "true" => Some(a.cmp(&true)),
            "false" => Some(a.cmp(&false)),
            _ => None,
        },
        (Bson::DateTime(a), Bson::String(s)) => bson::DateTime::parse_rfc3339_str(s)
            .ok()
            .map(|dt| a.timestamp_millis().cmp(&dt.timestamp_millis())),
        (Bson::ObjectId(a), Bson::String(s)) => ObjectId::parse_str(s)
            .ok()
            .map(|b| a.bytes().cmp(&b.bytes())),

        // ── Cross-type coercion: Int → DateTime (epoch seconds) ─
        (Bson::DateTime(a), Bson::Int64(b)) => {
            Some(a.timestamp_millis().cmp(&b.saturating_mul(1000)))
        }
        (Bson::DateTime(a), Bson::Int32(b)) => {
            Some(a.timestamp_millis().cmp(&(i64::from(*b) * 1000)))
        }

        // ── Incompatible types: silent exclusion ────────────────
        _ => None,
    }
}

pub(crate) fn operand_eq(stored: &Bson, query: &Bson) -> bool {
    operand_cmp(stored, query) == Some(Ordering::Equal)
}

/// Total order used for sorting. Missing fields sort with nulls, first.
pub(crate) fn sort_cmp(a: Option<&Bson>, b: Option<&Bson>) -> Ordering {
    let (ra, rb) = (type_rank(a), type_rank(b));
    if ra != rb {
        return ra.cmp(&rb);
    }
    match (a, b) {
        (Some(a), Some(b)) => match (a, b) {
            (Bson::Array(x), Bson::Array(y)) => {
                for (l, r) in x.iter().zip(y) {
                    let ord = sort_cmp(Some(l), Some(r));
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                x.len().cmp(&y.len())
            }
            (Bson::Document(x), Bson::Document(y)) => x.to_string().cmp(&y.to_string()),
            _ => operand_cmp(a, b).unwrap_or(Ordering::Equal),
        },
        _ => Ordering::Equal,
    }
}

fn type_rank(v: Option<&Bson>) -> u8 {
    match v {
        None | Some(Bson::Null) | Some(Bson::Undefined) => 0,
        Some(Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_)) => 1,
        Some(Bson::String(_) | Bson::Symbol(_)) => 2,
        Some(Bson::Document(_)) => 3,
        Some(Bson::Array(_)) => 4,
        Some(Bson::Binary(_)) => 5,
        Some(Bson::ObjectId(_)) => 6,
        Some(Bson::Boolean(_)) => 7,
        Some(Bson::DateTime(_)) => 8,
        Some(_) => 9,
    }
}

fn is_number(v: &Bson) -> bool {
    matches!(v, Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_))
}

pub(crate) fn as_f64(v: &Bson) -> Option<f64> {
    match v {
        Bson::Int32(n) => Some(f64::from(*n)),
        Bson::Int64(n) => Some(*n as f64),
        Bson::Double(n) => Some(*n),
        _ => None,
    }
}

fn number_cmp(a: &Bson, b: &Bson) -> Option<Ordering> {
    match (a, b) {
        (Bson::Int32(x), Bson::Int32(y)) => Some(x.cmp(y)),
        (Bson::Int64(x), Bson::Int64(y)) => Some(x.cmp(y)),
        (Bson::Int32(x), Bson::Int64(y)) => Some(i64::from(*x).cmp(y)),
        (Bson::Int64(x), Bson::Int32(y)) => Some(x.cmp(&i64::from(*y))),
        _ => as_f64(a)?.partial_cmp(&as_f64(b)?),
    }
}

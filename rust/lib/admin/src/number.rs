use serde::Serializer;
use serde_json::{Number, Value};

/// Largest integer an f64 holds exactly.
const MAX_EXACT: f64 = 9_007_199_254_740_992.0;

/// JSON number for `f`, written as an integer when it has no fraction.
///
/// Non-finite values have no JSON form and become `null`.
pub fn compact(f: f64) -> Value {
    if f.fract() == 0.0 && f.abs() <= MAX_EXACT {
        Value::Number(Number::from(f as i64))
    } else {
        Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
    }
}

/// `serialize_with` adapter for [`compact`].
pub fn serialize_compact<S: Serializer>(f: &f64, s: S) -> Result<S::Ok, S::Error> {
    if f.fract() == 0.0 && f.abs() <= MAX_EXACT {
        s.serialize_i64(*f as i64)
    } else {
        s.serialize_f64(*f)
    }
}

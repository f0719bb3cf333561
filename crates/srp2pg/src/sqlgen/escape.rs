//! Scalar-to-literal rendering for generated PostgreSQL statements.

use crate::error::{Result, TransferError};
use crate::value::SqlValue;

/// Render a value as a PostgreSQL literal.
///
/// Total over every [`SqlValue`] variant: the one variant that cannot be
/// rendered (`Unsupported`) is an explicit error, never a default
/// stringification. Timestamps keep millisecond precision to round-trip
/// through the `TIMESTAMP(3)` columns the type mapper emits.
pub fn escape(value: &SqlValue) -> Result<String> {
    let literal = match value {
        SqlValue::Null => "NULL".to_string(),
        SqlValue::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        SqlValue::I16(n) => n.to_string(),
        SqlValue::I32(n) => n.to_string(),
        SqlValue::I64(n) => n.to_string(),
        SqlValue::F32(n) => float_literal(f64::from(*n), n.to_string()),
        SqlValue::F64(n) => float_literal(*n, n.to_string()),
        SqlValue::Text(s) => format!("'{}'", s.replace('\'', "''")),
        SqlValue::Bytes(b) => format!("'\\x{}'", hex::encode(b)),
        SqlValue::Uuid(u) => format!("'{}'", u),
        SqlValue::Decimal(d) => d.to_string(),
        SqlValue::DateTime(dt) => format!("'{}'", dt.format("%Y-%m-%d %H:%M:%S%.3f")),
        SqlValue::Date(d) => format!("'{}'", d),
        SqlValue::Time(t) => format!("'{}'", t),
        SqlValue::Unsupported(type_name) => {
            return Err(TransferError::UnsupportedValue {
                type_name: type_name.clone(),
            })
        }
    };

    Ok(literal)
}

/// Non-finite floats need the quoted spellings PostgreSQL accepts
/// (`'NaN'`, `'Infinity'`, `'-Infinity'`); bare `NaN`/`inf` tokens are
/// rejected by the parser.
fn float_literal(value: f64, finite_repr: String) -> String {
    if value.is_finite() {
        finite_repr
    } else if value.is_nan() {
        "'NaN'".to_string()
    } else if value.is_sign_positive() {
        "'Infinity'".to_string()
    } else {
        "'-Infinity'".to_string()
    }
}

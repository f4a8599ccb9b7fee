//! Polars value helpers shared by the digest builder and the validator.

use std::collections::BTreeMap;

use polars::prelude::{AnyValue, Column};

/// Converts an AnyValue to its text form. Null becomes an empty string.
pub fn any_to_string(value: AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::Int8(v) => v.to_string(),
        AnyValue::Int16(v) => v.to_string(),
        AnyValue::Int32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::UInt8(v) => v.to_string(),
        AnyValue::UInt16(v) => v.to_string(),
        AnyValue::UInt32(v) => v.to_string(),
        AnyValue::UInt64(v) => v.to_string(),
        AnyValue::Float32(v) => format_numeric(f64::from(v)),
        AnyValue::Float64(v) => format_numeric(v),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        AnyValue::Boolean(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Formats a float without trailing fractional zeros.
pub fn format_numeric(v: f64) -> String {
    let s = format!("{v}");
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}

/// Null or blank cells in a column.
pub fn count_missing(column: &Column) -> u64 {
    let mut count = 0u64;
    for idx in 0..column.len() {
        let value = column.get(idx).unwrap_or(AnyValue::Null);
        if any_to_string(value).trim().is_empty() {
            count += 1;
        }
    }
    count
}

/// Occurrences of each non-missing value, keyed by text form.
pub fn value_counts(column: &Column) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for idx in 0..column.len() {
        let value = any_to_string(column.get(idx).unwrap_or(AnyValue::Null));
        let trimmed = value.trim();
        if trimmed.is_empty() {
            continue;
        }
        *counts.entry(trimmed.to_string()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{IntoColumn, NamedFrom, Series};

    #[test]
    fn format_numeric_keeps_integral_digits() {
        assert_eq!(format_numeric(100.0), "100");
        assert_eq!(format_numeric(12.50), "12.5");
        assert_eq!(format_numeric(0.25), "0.25");
    }

    #[test]
    fn missing_counts_nulls_and_blanks() {
        let column = Series::new(
            "Status".into(),
            &[Some("Normal"), None, Some("  "), Some("Review")],
        )
        .into_column();
        assert_eq!(count_missing(&column), 2);
        let counts = value_counts(&column);
        assert_eq!(counts.get("Normal"), Some(&1));
        assert_eq!(counts.get("Review"), Some(&1));
        assert_eq!(counts.len(), 2);
    }
}

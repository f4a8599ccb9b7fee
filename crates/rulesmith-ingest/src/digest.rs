//! Schema digest construction.

use polars::prelude::{AnyValue, DataFrame, DataType};
use rulesmith_model::{ColumnType, SAMPLE_ROW_COUNT, SchemaColumn, SchemaDigest};

use crate::values::any_to_string;

/// Map a Polars dtype onto the digest's coarse type vocabulary.
pub fn column_type(dtype: &DataType) -> ColumnType {
    match dtype {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => ColumnType::Integer,
        DataType::Float32 | DataType::Float64 => ColumnType::Float,
        DataType::Boolean => ColumnType::Boolean,
        DataType::String => ColumnType::Text,
        _ => ColumnType::Other,
    }
}

/// Summarize a table: column names and types, first rows, total size.
pub fn build_schema_digest(df: &DataFrame) -> SchemaDigest {
    let columns = df
        .get_columns()
        .iter()
        .map(|column| SchemaColumn {
            name: column.name().to_string(),
            column_type: column_type(column.dtype()),
        })
        .collect();

    let sample_len = df.height().min(SAMPLE_ROW_COUNT);
    let sample_rows = (0..sample_len)
        .map(|idx| {
            df.get_columns()
                .iter()
                .map(|column| any_to_string(column.get(idx).unwrap_or(AnyValue::Null)))
                .collect()
        })
        .collect();

    SchemaDigest {
        columns,
        sample_rows,
        total_rows: df.height(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{IntoColumn, NamedFrom, Series};

    #[test]
    fn digest_captures_types_and_samples() {
        let df = DataFrame::new(vec![
            Series::new("age".into(), &[200i64, 50, 10, 7]).into_column(),
            Series::new("profit".into(), &[25.5f64, 2.0, 1.0, 3.0]).into_column(),
            Series::new("sku".into(), &["A", "B", "C", "D"]).into_column(),
        ])
        .unwrap();

        let digest = build_schema_digest(&df);
        assert_eq!(digest.total_rows, 4);
        assert_eq!(digest.sample_rows.len(), SAMPLE_ROW_COUNT);
        assert_eq!(digest.sample_rows[0], vec!["200", "25.5", "A"]);
        assert_eq!(digest.sample_rows[1], vec!["50", "2", "B"]);
        assert_eq!(
            digest.columns.iter().map(|c| c.column_type).collect::<Vec<_>>(),
            vec![ColumnType::Integer, ColumnType::Float, ColumnType::Text]
        );
    }
}

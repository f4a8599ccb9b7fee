//! CSV reading and writing through Polars.

use std::fs::File;
use std::path::Path;

use polars::prelude::{
    CsvReadOptions, CsvWriter, DataFrame, NullValues, PlSmallStr, SerReader, SerWriter,
};

use crate::error::{IngestError, Result};

/// Cell texts read as missing values.
const MISSING_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Reads a CSV file with a single header row into a DataFrame.
///
/// Column types are inferred from every row, and the usual spreadsheet
/// placeholders such as `n/a`, `NA` and `null` become nulls.
pub fn read_table(path: &Path) -> Result<DataFrame> {
    if !path.is_file() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .map_parse_options(|options| options.with_null_values(Some(missing_values())))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .finish()
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    if df.width() == 0 {
        return Err(IngestError::NoColumns {
            path: path.to_path_buf(),
        });
    }

    tracing::debug!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "loaded table"
    );
    Ok(df)
}

fn missing_values() -> NullValues {
    NullValues::AllColumns(MISSING_TOKENS.iter().copied().map(PlSmallStr::from).collect())
}

/// Writes a DataFrame as CSV with a header row, creating parent directories.
pub fn write_table(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| IngestError::FileWrite {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    let mut file = File::create(path).map_err(|e| IngestError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .map_err(|e| IngestError::CsvWrite {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_read_table() {
        let file = create_temp_csv("age,profit,sku\n200,25.5,A\n50,2,B\n");
        let df = read_table(file.path()).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 3);
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_table(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, IngestError::FileNotFound { .. }));
    }

    #[test]
    fn test_types_inferred_from_every_row() {
        let mut content = String::from("age,profit\n");
        for row in 0..149 {
            content.push_str(&format!("{row},{}\n", row % 7));
        }
        content.push_str("200,2.5\n");
        let file = create_temp_csv(&content);
        let df = read_table(file.path()).unwrap();
        assert_eq!(df.height(), 150);
        let profit = df.column("profit").unwrap();
        assert!(profit.dtype().is_float());
        assert_eq!(profit.f64().unwrap().get(149), Some(2.5));
    }

    #[test]
    fn test_missing_tokens_become_nulls() {
        let file = create_temp_csv("sku,age\nA,200\nB,n/a\nC,NA\nD,\n");
        let df = read_table(file.path()).unwrap();
        let age = df.column("age").unwrap();
        assert!(age.dtype().is_integer(), "{:?}", age.dtype());
        assert_eq!(age.null_count(), 3);
    }

    #[test]
    fn test_write_then_read_preserves_shape() {
        let file = create_temp_csv("a,b\n1,x\n2,y\n3,z\n");
        let mut df = read_table(file.path()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("out.csv");
        write_table(&mut df, &out).unwrap();
        let reread = read_table(&out).unwrap();
        assert_eq!(reread.shape(), (3, 2));
    }
}

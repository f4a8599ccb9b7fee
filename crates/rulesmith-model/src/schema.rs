//! Schema digest: a compact description of the tabular input.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of sample rows captured in a digest.
pub const SAMPLE_ROW_COUNT: usize = 3;

/// Inferred column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Integer,
    Float,
    Boolean,
    Text,
    Other,
}

impl ColumnType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Text => "text",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaColumn {
    pub name: String,
    pub column_type: ColumnType,
}

/// Column list, sample rows, and size of an input table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDigest {
    pub columns: Vec<SchemaColumn>,
    /// Up to [`SAMPLE_ROW_COUNT`] rows, values rendered as text.
    pub sample_rows: Vec<Vec<String>>,
    pub total_rows: usize,
}

impl SchemaDigest {
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Text form handed to the synthesizer.
    pub fn render(&self) -> String {
        let names = self.column_names();
        let types: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("{}: {}", c.name, c.column_type))
            .collect();
        let mut out = String::new();
        out.push_str("DATA SCHEMA:\n");
        out.push_str(&format!("- Columns: [{}]\n", names.join(", ")));
        out.push_str(&format!("- Data Types: [{}]\n", types.join(", ")));
        out.push_str(&format!("- Total Rows: {}\n", self.total_rows));
        out.push('\n');
        out.push_str(&format!(
            "Sample Data (First {} Rows):\n",
            self.sample_rows.len()
        ));
        out.push_str(&format!("| {} |\n", names.join(" | ")));
        let separator = vec!["---"; names.len()];
        out.push_str(&format!("| {} |\n", separator.join(" | ")));
        for row in &self.sample_rows {
            out.push_str(&format!("| {} |\n", row.join(" | ")));
        }
        out
    }
}

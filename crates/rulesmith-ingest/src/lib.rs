//! Tabular input loading for rulesmith.
//!
//! This crate reads the input table into a Polars DataFrame, writes labelled
//! output back out, and summarizes a table as a [`SchemaDigest`] for the
//! synthesizer.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use rulesmith_ingest::{build_schema_digest, read_table};
//!
//! let df = read_table(Path::new("data/inventory.csv"))?;
//! let digest = build_schema_digest(&df);
//! println!("{}", digest.render());
//! ```
//!
//! [`SchemaDigest`]: rulesmith_model::SchemaDigest

mod csv;
mod digest;
mod error;
mod values;

// === Error Types ===
pub use error::{IngestError, Result};

// === CSV Reading ===
pub use csv::{read_table, write_table};

// === Schema Digest ===
pub use digest::{build_schema_digest, column_type};

// === Value Helpers ===
pub use values::{any_to_string, count_missing, format_numeric, value_counts};

use thiserror::Error;

/// Errors that abort a reconciliation run.
///
/// Data-quality problems (unmatched items, unparseable dates, blank
/// quantities) are not errors: they are recorded in
/// [`Diagnostics`](crate::model::Diagnostics) and the run continues.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// Config validation error (empty column name, no date formats, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),

    /// A required column is absent from an input table.
    #[error("{table} data: missing required column '{column}'")]
    MissingColumn { table: String, column: String },

    /// Demand is present but no BOM rows were supplied.
    #[error("BOM data is empty; cannot derive component demand for {demand_rows} demand row(s)")]
    MissingBomData { demand_rows: usize },

    /// A BOM row without a usable `qty_per`.
    #[error("BOM row {parent} -> {component}: missing qty_per")]
    MissingQtyPer { parent: String, component: String },

    /// A numeric cell that could not be read as a number.
    #[error("{table} data, row {row}, column '{column}': invalid number '{value}'")]
    InvalidNumber {
        table: String,
        row: usize,
        column: String,
        value: String,
    },

    /// A BOM source failed to supply rows.
    #[error("BOM source '{source_name}': {message}")]
    BomSource { source_name: String, message: String },
}

impl ReconError {
    pub fn missing_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    pub fn bom_source(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BomSource {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// True for errors caused by the shape of the input rather than config.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::MissingColumn { .. } | Self::MissingBomData { .. } | Self::MissingQtyPer { .. }
        )
    }
}

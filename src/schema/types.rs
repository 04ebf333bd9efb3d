//! Schema types

use serde::{Deserialize, Serialize};

/// Warehouse column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
    String,
    #[serde(alias = "FLOAT64")]
    Float,
    #[serde(alias = "BOOL")]
    Boolean,
    Timestamp,
    #[serde(alias = "STRUCT")]
    Record,
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnType::String => write!(f, "STRING"),
            ColumnType::Float => write!(f, "FLOAT"),
            ColumnType::Boolean => write!(f, "BOOLEAN"),
            ColumnType::Timestamp => write!(f, "TIMESTAMP"),
            ColumnType::Record => write!(f, "RECORD"),
        }
    }
}

/// Column cardinality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnMode {
    /// Single value, may be absent
    #[default]
    Nullable,
    /// Array-valued
    Repeated,
}

impl std::fmt::Display for ColumnMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnMode::Nullable => write!(f, "NULLABLE"),
            ColumnMode::Repeated => write!(f, "REPEATED"),
        }
    }
}

/// A table column, in the warehouse's JSON schema shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Sanitized column name
    pub name: String,

    /// Column type
    #[serde(rename = "type")]
    pub column_type: ColumnType,

    /// Cardinality
    #[serde(default)]
    pub mode: ColumnMode,

    /// Nested columns (RECORD only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Column>,
}

impl Column {
    /// Create a scalar column
    pub fn new(name: impl Into<String>, column_type: ColumnType, mode: ColumnMode) -> Self {
        Self {
            name: name.into(),
            column_type,
            mode,
            fields: Vec::new(),
        }
    }

    /// Create a RECORD column with nested fields
    pub fn record(name: impl Into<String>, mode: ColumnMode, fields: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            column_type: ColumnType::Record,
            mode,
            fields,
        }
    }

    /// Check if this is a RECORD column
    pub fn is_record(&self) -> bool {
        self.column_type == ColumnType::Record
    }

    /// Check if this column is array-valued
    pub fn is_repeated(&self) -> bool {
        self.mode == ColumnMode::Repeated
    }

    /// Look up a nested field by name
    pub fn field(&self, name: &str) -> Option<&Column> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.name, self.column_type)?;
        if self.is_repeated() {
            write!(f, "/{}", self.mode)?;
        }
        if self.is_record() {
            write!(f, "{{")?;
            for (i, field) in self.fields.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{field}")?;
            }
            write!(f, "}}")?;
        }
        Ok(())
    }
}

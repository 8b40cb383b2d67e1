use crate::ingestion::CanonicalField;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error(
        "Invalid CSV, missing columns: {}. Expected: Mes, Sucursal, Linea, Vendedora, Precio Total, Cantidad",
        join_fields(.0)
    )]
    MissingColumns(Vec<CanonicalField>),

    #[error("No valid rows were found in the CSV")]
    NoValidRows,

    #[error("Could not read the file: {0}. Close any application holding it open and try again")]
    UnreadableFile(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<csv::Error> for DashboardError {
    fn from(err: csv::Error) -> Self {
        DashboardError::UnreadableFile(err.to_string())
    }
}

fn join_fields(fields: &[CanonicalField]) -> String {
    fields
        .iter()
        .map(|f| f.header_name())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_message_names_every_field() {
        let err = DashboardError::MissingColumns(vec![CanonicalField::Seller, CanonicalField::Quantity]);
        let message = err.to_string();
        assert!(message.contains("missing columns: Vendedora, Cantidad."));
        assert!(message.contains("Expected: Mes"));
    }
}

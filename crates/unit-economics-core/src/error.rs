use thiserror::Error;

#[derive(Debug, Error)]
pub enum UnitEconomicsError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Unknown {kind}: '{id}'")]
    UnknownIdentifier { kind: String, id: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for UnitEconomicsError {
    fn from(e: serde_json::Error) -> Self {
        UnitEconomicsError::SerializationError(e.to_string())
    }
}

pub mod types;
pub mod registry;
pub mod synonyms;
pub mod sanitize;
pub mod patterns;
pub mod sections;
pub mod parser;
pub mod confidence;
pub mod codec;

pub use types::*;
pub use registry::*;
pub use synonyms::*;
pub use sanitize::*;
pub use patterns::*;
pub use sections::*;
pub use parser::*;
pub use confidence::*;
pub use codec::*;

use thiserror::Error;

use crate::models::enums::RoutineType;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Unknown {field} identifier: {value}")]
    UnknownIdentifier { field: String, value: String },

    #[error("Step '{step}' is not part of the {routine} routine")]
    UnknownStep { routine: RoutineType, step: String },

    #[error("JSON parsing error: {0}")]
    JsonParsing(String),

    #[error("JSON value matches no known analysis envelope shape")]
    UnrecognizedEnvelope,

    #[error("Empty analysis input")]
    EmptyInput,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

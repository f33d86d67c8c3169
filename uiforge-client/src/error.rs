use crate::generation::ServiceError;
use crate::history::StorageError;
use crate::widgets::WidgetError;
use thiserror::Error;
use uiforge_dsl::{IngestError, SchemaErrors};

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("Generation service proposed an invalid document: {0}")]
    InvalidProposal(SchemaErrors),

    #[error("History record {id} no longer validates: {errors}")]
    InvalidSnapshot { id: String, errors: SchemaErrors },

    #[error("Document changed while the generation service was working; reply discarded")]
    Superseded,

    #[error("History record not found: {0}")]
    RecordNotFound(String),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Widget(#[from] WidgetError),
}

//! UIForge client: renders UI-DSL documents with live widget state and
//! drives the generation loop (chat edits, hybrid generation, history).

pub mod config;
pub mod error;
pub mod generation;
pub mod history;
pub mod qa;
pub mod render;
pub mod session;
pub mod widgets;

pub use config::Config;
pub use error::{ClientError, ClientResult};
pub use generation::{
    AssistReply, AssistRequest, ChatMessage, GenerateReply, GenerateRequest, GenerationService,
    HttpGenerationService, Role, ServiceError,
};
pub use history::{FileStore, History, HistoryRecord, KeyValueStore, MemoryStore, SourceTag, StorageError};
pub use qa::QaReport;
pub use render::{render_document, render_value, Presentation};
pub use session::{sample_document, Session};
pub use widgets::{Activation, ButtonState, InstanceKey, Mount, RevealState, SubmitOutcome, WidgetError};

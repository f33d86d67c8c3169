//! The current document, its mounted widgets and the collaborators that can
//! replace it. Every replacement is a full swap; nothing is patched in place.

use crate::error::{ClientError, ClientResult};
use crate::generation::{AssistRequest, ChatMessage, GenerateRequest, GenerationService, Role};
use crate::history::{History, HistoryRecord, SourceTag};
use crate::render::{render_document, render_value, Presentation};
use crate::widgets::Mount;
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use uiforge_dsl::node::{DEFAULT_DEBOUNCE_MS, DEFAULT_GAP, DEFAULT_PADDING};
use uiforge_dsl::{
    ingest_with, validate_with, Button, ButtonVariant, Container, Direction, Form, HeuristicConverter,
    IngestPolicy, Input, InputKind, Node, Origin, Text, TextVariant, UiDocument,
};

/// A document together with the widgets mounted for it. Swapped as one unit.
struct Mounted {
    document: Arc<UiDocument>,
    mount: Arc<Mount>,
}

impl Mounted {
    fn new(document: UiDocument) -> Self {
        let mount = Arc::new(Mount::new(&document));
        Self {
            document: Arc::new(document),
            mount,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub document: Arc<UiDocument>,
    pub origin: Origin,
    pub record: HistoryRecord,
}

#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub document: Arc<UiDocument>,
    pub summary: Option<String>,
    pub record: HistoryRecord,
}

#[derive(Debug, Clone)]
pub struct GenerateOutcome {
    pub document: Arc<UiDocument>,
    pub generated_code: Option<String>,
    pub qa_text: Option<String>,
    pub record: HistoryRecord,
}

pub struct Session {
    current: RwLock<Mounted>,
    transcript: Mutex<Vec<ChatMessage>>,
    policy: IngestPolicy,
    converter: HeuristicConverter,
    service: Arc<dyn GenerationService>,
    history: History,
}

impl Session {
    pub fn new(initial: UiDocument, service: Arc<dyn GenerationService>, history: History) -> Self {
        Self {
            current: RwLock::new(Mounted::new(initial)),
            transcript: Mutex::new(Vec::new()),
            policy: IngestPolicy::default(),
            converter: HeuristicConverter::default(),
            service,
            history,
        }
    }

    pub fn with_policy(mut self, policy: IngestPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_converter(mut self, converter: HeuristicConverter) -> Self {
        self.converter = converter;
        self
    }

    pub fn document(&self) -> Arc<UiDocument> {
        self.current.read().unwrap_or_else(PoisonError::into_inner).document.clone()
    }

    /// Widgets of the current document. A handle kept across a replacement
    /// refers to the torn-down mount.
    pub fn mount(&self) -> Arc<Mount> {
        self.current.read().unwrap_or_else(PoisonError::into_inner).mount.clone()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn transcript(&self) -> Vec<ChatMessage> {
        self.transcript.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Swap in a new document and remount. The previous mount is torn down
    /// (timers cancelled) before this returns.
    pub fn replace(&self, document: UiDocument) -> Arc<UiDocument> {
        let next = Mounted::new(document);
        let current = next.document.clone();
        let previous = {
            let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *guard, next)
        };
        previous.mount.teardown();
        tracing::info!(nodes = current.nodes().len(), "document replaced");
        current
    }

    /// Like `replace`, but only while `base` is still the current document.
    fn replace_if_current(&self, base: &Arc<UiDocument>, document: UiDocument) -> ClientResult<Arc<UiDocument>> {
        let next = Mounted::new(document);
        let current = next.document.clone();
        let previous = {
            let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
            if !Arc::ptr_eq(&guard.document, base) {
                return Err(ClientError::Superseded);
            }
            std::mem::replace(&mut *guard, next)
        };
        previous.mount.teardown();
        tracing::info!(nodes = current.nodes().len(), "document replaced");
        Ok(current)
    }

    fn ensure_current(&self, base: &Arc<UiDocument>) -> ClientResult<()> {
        if Arc::ptr_eq(&self.document(), base) {
            Ok(())
        } else {
            tracing::warn!("reply arrived for a document that is no longer current");
            Err(ClientError::Superseded)
        }
    }

    /// Live presentation of the current document.
    pub fn render(&self) -> Presentation {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        render_document(&guard.document, Some(&guard.mount))
    }

    /// Ingest raw JSON. Nothing changes on failure.
    #[tracing::instrument(skip(self, raw))]
    pub async fn load(&self, raw: &Value, source: SourceTag) -> ClientResult<LoadOutcome> {
        let ingested = ingest_with(raw, &self.policy, &self.converter)?;
        let tag = match ingested.origin {
            Origin::Validated => source,
            Origin::Converted { .. } => SourceTag::Converted,
        };
        let record = self
            .history
            .append(HistoryRecord::new(tag, &ingested.document))
            .await?;
        let document = self.replace(ingested.document);
        Ok(LoadOutcome {
            document,
            origin: ingested.origin,
            record,
        })
    }

    pub async fn load_str(&self, text: &str, source: SourceTag) -> ClientResult<LoadOutcome> {
        let raw: Value = serde_json::from_str(text)?;
        self.load(&raw, source).await
    }

    /// Ask the Generation Service for an edit. Only a fully valid proposal
    /// replaces the current document, and only if no other replacement
    /// happened while the request was in flight (`ClientError::Superseded`).
    #[tracing::instrument(skip(self))]
    pub async fn chat(&self, instruction: &str) -> ClientResult<ChatOutcome> {
        let user = ChatMessage::user(instruction);
        let mut instructions = self.transcript();
        instructions.push(user.clone());
        let base = self.document();
        let request = AssistRequest {
            document: (*base).clone(),
            instructions,
        };

        let reply = self.service.assist(&request).await.map_err(|e| {
            tracing::warn!(error = %e, "assist request failed");
            e
        })?;
        let document = validate_with(&reply.document, &self.policy.validate).map_err(|errors| {
            tracing::warn!(%errors, "assist proposal rejected");
            ClientError::InvalidProposal(errors)
        })?;
        self.ensure_current(&base)?;

        let record = self
            .history
            .append(HistoryRecord::new(SourceTag::Chat, &document).with_summary(reply.summary.clone()))
            .await?;
        let document = self.replace_if_current(&base, document)?;

        let mut transcript = self.transcript.lock().unwrap_or_else(PoisonError::into_inner);
        transcript.push(user);
        if let Some(summary) = &reply.summary {
            transcript.push(ChatMessage {
                role: Role::Assistant,
                text: summary.clone(),
            });
        }
        drop(transcript);

        Ok(ChatOutcome {
            document,
            summary: reply.summary,
            record,
        })
    }

    /// Hybrid generation from the current document. Same acceptance rule as `chat`.
    #[tracing::instrument(skip(self))]
    pub async fn generate(&self) -> ClientResult<GenerateOutcome> {
        let base = self.document();
        let request = GenerateRequest {
            document: (*base).clone(),
        };
        let reply = self.service.generate(&request).await.map_err(|e| {
            tracing::warn!(error = %e, "generate request failed");
            e
        })?;
        let document = validate_with(&reply.document, &self.policy.validate).map_err(|errors| {
            tracing::warn!(%errors, "generated document rejected");
            ClientError::InvalidProposal(errors)
        })?;
        self.ensure_current(&base)?;

        let record = self
            .history
            .append(
                HistoryRecord::new(SourceTag::Hybrid, &document)
                    .with_generated(reply.generated_code.clone(), reply.qa_text.clone()),
            )
            .await?;
        let document = self.replace_if_current(&base, document)?;
        Ok(GenerateOutcome {
            document,
            generated_code: reply.generated_code,
            qa_text: reply.qa_text,
            record,
        })
    }

    /// Make a history snapshot current again, after re-validating it.
    #[tracing::instrument(skip(self))]
    pub async fn restore(&self, history_id: &str) -> ClientResult<Arc<UiDocument>> {
        let snapshot = self
            .history
            .get(history_id)
            .await?
            .ok_or_else(|| ClientError::RecordNotFound(history_id.to_string()))?;
        let document =
            validate_with(&snapshot.document, &self.policy.validate).map_err(|errors| ClientError::InvalidSnapshot {
                id: history_id.to_string(),
                errors,
            })?;
        self.history
            .append(HistoryRecord::new(SourceTag::Restored, &document).with_summary(snapshot.summary))
            .await?;
        Ok(self.replace(document))
    }

    /// Render a snapshot without making it current. Tolerates snapshots that
    /// no longer validate.
    pub async fn preview(&self, history_id: &str) -> ClientResult<Presentation> {
        let snapshot = self
            .history
            .get(history_id)
            .await?
            .ok_or_else(|| ClientError::RecordNotFound(history_id.to_string()))?;
        Ok(render_value(&snapshot.document))
    }
}

/// Built-in starting document: a small login screen.
pub fn sample_document() -> UiDocument {
    let input = |id: &str, name: &str, label: &str, kind: InputKind| {
        Node::Input(Input {
            id: id.to_string(),
            name: name.to_string(),
            label: Some(label.to_string()),
            placeholder: None,
            kind,
            show_toggle: true,
        })
    };
    UiDocument::new(Node::Container(Container {
        id: "root".to_string(),
        direction: Direction::Vertical,
        gap: DEFAULT_GAP,
        padding: DEFAULT_PADDING,
        children: vec![
            Node::Text(Text {
                id: "title".to_string(),
                content: "Sign in".to_string(),
                variant: TextVariant::H2,
            }),
            Node::Form(Form {
                id: "form".to_string(),
                children: vec![
                    input("email", "email", "Email", InputKind::Email),
                    input("pass", "password", "Password", InputKind::Password),
                    Node::Button(Button {
                        id: "cta".to_string(),
                        text: "Continue".to_string(),
                        variant: ButtonVariant::Primary,
                        debounce_ms: DEFAULT_DEBOUNCE_MS,
                    }),
                ],
            }),
        ],
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uiforge_dsl::validate;

    #[test]
    fn test_sample_document_is_canonical() {
        let sample = sample_document();
        let again = validate(&sample.to_json()).unwrap();
        assert_eq!(sample, again);
        assert_eq!(sample.nodes().len(), 6);
    }
}

//! # UIForge UI-DSL
//!
//! A small, versioned JSON tree language describing user interfaces.
//!
//! ## Features
//! - Seven node variants with documented defaults
//! - Validation that reports every issue in one pass, with paths
//! - Heuristic fallback that rebuilds a minimal document from loose JSON
//! - Palette contrast checks (WCAG AA/AAA)
//!
//! ## Example
//! ```ignore
//! use uiforge_dsl::{ingest, IngestPolicy};
//!
//! let raw = serde_json::json!({
//!     "version": "0.1",
//!     "root": { "type": "button", "text": "Go" }
//! });
//!
//! let ingested = ingest(&raw, &IngestPolicy::default()).expect("valid document");
//! println!("{}", ingested.document.to_json_string_pretty());
//! ```

pub mod document;
pub mod error;
pub mod heuristic;
pub mod ingest;
pub mod node;
pub mod palette;
pub mod validator;

// --- Core types ---
pub use document::{UiDocument, DSL_VERSION};
pub use error::{DslError, DslResult, IssueKind, IssuePath, PathSegment, SchemaErrors, SchemaIssue};
pub use node::{
    Button, ButtonVariant, Card, Container, Direction, Form, Image, Input, InputKind, Node, Text,
    TextVariant,
};
pub use palette::{contrast_ratio, ContrastCheck, Palette, WCAG_AA, WCAG_AAA};

// --- Pipeline ---
pub use heuristic::{Conversion, Heuristic, HeuristicConverter, KeywordLoginHeuristic};
pub use ingest::{ingest, ingest_with, IngestError, IngestPolicy, Ingested, Origin};
pub use validator::{parse_document, validate, validate_node, validate_with, IdStrategy, ValidateOptions};

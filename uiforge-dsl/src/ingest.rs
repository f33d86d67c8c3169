use crate::document::UiDocument;
use crate::error::SchemaErrors;
use crate::heuristic::HeuristicConverter;
use crate::validator::{validate_with, ValidateOptions};
use serde_json::Value;
use thiserror::Error;

/// Controls when the heuristic fallback may run.
#[derive(Debug, Clone)]
pub struct IngestPolicy {
    /// Run the fallback even when the input declared a different DSL version.
    pub fallback_on_version_mismatch: bool,
    pub heuristics_enabled: bool,
    pub validate: ValidateOptions,
}

impl Default for IngestPolicy {
    fn default() -> Self {
        Self {
            fallback_on_version_mismatch: false,
            heuristics_enabled: true,
            validate: ValidateOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Origin {
    Validated,
    Converted { strategy: &'static str },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ingested {
    pub document: UiDocument,
    pub origin: Origin,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IngestError {
    #[error("Invalid document: {0}")]
    Schema(SchemaErrors),

    #[error("Invalid document and no conversion matched: {schema_errors}")]
    ConversionMiss { schema_errors: SchemaErrors },
}

impl IngestError {
    /// Validator issues behind the rejection.
    pub fn schema_errors(&self) -> &SchemaErrors {
        match self {
            IngestError::Schema(errors) => errors,
            IngestError::ConversionMiss { schema_errors } => schema_errors,
        }
    }
}

/// Ingest with the default converter.
pub fn ingest(raw: &Value, policy: &IngestPolicy) -> Result<Ingested, IngestError> {
    ingest_with(raw, policy, &HeuristicConverter::default())
}

/// Validator first; on rejection, the converter when the policy allows it.
pub fn ingest_with(
    raw: &Value,
    policy: &IngestPolicy,
    converter: &HeuristicConverter,
) -> Result<Ingested, IngestError> {
    let errors = match validate_with(raw, &policy.validate) {
        Ok(document) => {
            return Ok(Ingested {
                document,
                origin: Origin::Validated,
            })
        }
        Err(errors) => errors,
    };

    if !policy.heuristics_enabled {
        return Err(IngestError::Schema(errors));
    }
    if errors.has_version_mismatch() && !policy.fallback_on_version_mismatch {
        tracing::debug!("version mismatch, heuristic fallback skipped");
        return Err(IngestError::Schema(errors));
    }

    match converter.convert(raw) {
        Some(conversion) => Ok(Ingested {
            document: conversion.document,
            origin: Origin::Converted {
                strategy: conversion.strategy,
            },
        }),
        None => Err(IngestError::ConversionMiss {
            schema_errors: errors,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_input_is_not_converted() {
        let raw = json!({"version": "0.1", "root": {"type": "button", "text": "Login"}});
        let ingested = ingest(&raw, &IngestPolicy::default()).unwrap();
        assert_eq!(ingested.origin, Origin::Validated);
    }

    #[test]
    fn test_version_mismatch_blocks_fallback_by_default() {
        let raw = json!({"version": "0.2", "root": {"type": "input", "kind": "email"}});
        let err = ingest(&raw, &IngestPolicy::default()).unwrap_err();
        assert!(matches!(err, IngestError::Schema(_)));
        assert!(err.schema_errors().has_version_mismatch());
    }

    #[test]
    fn test_version_mismatch_fallback_when_enabled() {
        let raw = json!({"version": "0.2", "root": {"type": "input", "kind": "email"}});
        let policy = IngestPolicy {
            fallback_on_version_mismatch: true,
            ..IngestPolicy::default()
        };
        let ingested = ingest(&raw, &policy).unwrap();
        assert_eq!(ingested.origin, Origin::Converted { strategy: "keyword-login" });
    }

    #[test]
    fn test_conversion_miss_carries_schema_errors() {
        let err = ingest(&json!({"hello": "world"}), &IngestPolicy::default()).unwrap_err();
        match err {
            IngestError::ConversionMiss { schema_errors } => {
                assert_eq!(schema_errors.to_string(), "version: Required; root: Required");
            }
            other => panic!("expected conversion miss, got {:?}", other),
        }
    }

    #[test]
    fn test_heuristics_disabled() {
        let policy = IngestPolicy {
            heuristics_enabled: false,
            ..IngestPolicy::default()
        };
        let err = ingest(&json!({"email": "a@b.c"}), &policy).unwrap_err();
        assert!(matches!(err, IngestError::Schema(_)));
    }
}

//! Layered error definitions
//!
//! Categorized by source: config / port

use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Port Errors =====
    /// Host refused to register an endpoint
    #[error("port '{port}' registration error: {message}")]
    PortRegistration { port: String, message: String },

    /// Downstream queue is full, message dropped
    #[error("port '{port}' queue full, message dropped")]
    PortFull { port: String },

    /// Downstream consumer went away
    #[error("port '{port}' closed")]
    PortClosed { port: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create port registration error
    pub fn port_registration(port: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PortRegistration {
            port: port.into(),
            message: message.into(),
        }
    }

    /// Convert `validator` output into a validation error.
    ///
    /// Only the first failing field is reported, with its dotted path
    /// (e.g. `distributor.shape.item_sizes`).
    pub fn from_validation(prefix: &str, errors: &ValidationErrors) -> Self {
        match first_violation(prefix, errors) {
            Some((field, message)) => Self::config_validation(field, message),
            None => Self::config_validation(prefix, "invalid value"),
        }
    }
}

fn first_violation(path: &str, errors: &ValidationErrors) -> Option<(String, String)> {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    for (name, kind) in fields {
        let field = if path.is_empty() {
            name.to_string()
        } else {
            format!("{path}.{name}")
        };
        let found = match kind {
            ValidationErrorsKind::Field(list) => list.first().map(|e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("failed '{}' check", e.code));
                (field.clone(), message)
            }),
            ValidationErrorsKind::Struct(inner) => first_violation(&field, inner),
            ValidationErrorsKind::List(items) => items
                .iter()
                .find_map(|(idx, inner)| first_violation(&format!("{field}[{idx}]"), inner)),
        };
        if found.is_some() {
            return found;
        }
    }
    None
}

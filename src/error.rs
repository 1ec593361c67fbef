//! Error types for template compilation and rendering

use thiserror::Error;

/// Template compilation and rendering errors
#[derive(Error, Debug)]
pub enum TemplateError {
    /// Unbalanced or malformed directive structure, or an expression that
    /// does not parse. Raised at compile time; no template is produced.
    #[error("Syntax error at offset {position}: {message}")]
    Syntax { position: usize, message: String },

    /// A host primitive failed while evaluating an expression, e.g. calling a
    /// method the receiver does not have.
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TemplateError {
    pub(crate) fn syntax(position: usize, message: impl Into<String>) -> Self {
        TemplateError::Syntax {
            position,
            message: message.into(),
        }
    }

    pub(crate) fn evaluation(message: impl Into<String>) -> Self {
        TemplateError::Evaluation(message.into())
    }

    /// Shift the offset of a syntax error raised on a substring so it points
    /// into the enclosing template.
    pub(crate) fn offset_by(self, base: usize) -> Self {
        match self {
            TemplateError::Syntax { position, message } => TemplateError::Syntax {
                position: base + position,
                message,
            },
            other => other,
        }
    }
}

/// Result type for template operations
pub type Result<T> = std::result::Result<T, TemplateError>;

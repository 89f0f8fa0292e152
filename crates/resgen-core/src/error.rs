use thiserror::Error;

/// Location information attached to every fatal error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// Dotted location inside the spec, e.g. `components.schemas.Note.poll`.
    pub path: String,
    /// Operation name, when the failure happened while compiling an endpoint.
    pub operation: Option<String>,
    /// Schema name, when the failure is tied to a named component schema.
    pub schema: Option<String>,
}

impl ErrorContext {
    pub fn at(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            operation: None,
            schema: None,
        }
    }

    pub fn operation(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            operation: Some(name.into()),
            schema: None,
        }
    }
}

impl std::fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path)?;
        if let Some(ref op) = self.operation {
            write!(f, " (operation {op})")?;
        }
        if let Some(ref schema) = self.schema {
            write!(f, " (schema {schema})")?;
        }
        Ok(())
    }
}

/// Fatal errors. Recoverable conditions are `Warning`s instead.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("failed to resolve spec at {context}: {message}")]
    SpecResolution {
        message: String,
        context: ErrorContext,
    },

    #[error("failed to parse schema at {context}: {message}")]
    SchemaParse {
        message: String,
        context: ErrorContext,
    },

    #[error("bad reference at {context}: {message}")]
    Reference {
        message: String,
        context: ErrorContext,
    },

    #[error("validation failed at {context}: {message}")]
    Validation {
        message: String,
        context: ErrorContext,
    },

    #[error("unbreakable schema cycle at {context}: {message}")]
    CircularSchema {
        message: String,
        context: ErrorContext,
    },

    #[error("failed to write {context}: {message}")]
    FileWrite {
        message: String,
        context: ErrorContext,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("unexpected failure at {context}: {message}")]
    Unknown {
        message: String,
        context: ErrorContext,
    },
}

/// Errors produced while deserializing a spec document.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported OpenAPI version: {0}")]
    UnsupportedVersion(String),
}

impl From<ParseError> for GeneratorError {
    fn from(err: ParseError) -> Self {
        GeneratorError::SpecResolution {
            message: err.to_string(),
            context: ErrorContext::at("document"),
        }
    }
}

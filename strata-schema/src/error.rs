//! Error types for model registration and configuration loading.

// These warnings are false positives - the fields are used by derive macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors that can occur while registering models or resolving associations.
#[derive(Error, Debug, Diagnostic)]
pub enum SchemaError {
    /// Error reading a file.
    #[error("failed to read file: {path}")]
    #[diagnostic(code(strata::schema::io_error))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Error parsing a TOML configuration file.
    #[error("failed to parse configuration")]
    #[diagnostic(code(strata::schema::toml_error))]
    Toml {
        #[source]
        source: toml::de::Error,
    },

    /// A model name that was never registered.
    #[error("unknown model `{name}`")]
    #[diagnostic(
        code(strata::schema::unknown_model),
        help("register the model with `SchemaBuilder::model` before referencing it")
    )]
    UnknownModel { name: String },

    /// An association name that does not resolve on the given model.
    #[error("model `{model}` has no association named `{name}`")]
    #[diagnostic(code(strata::schema::unknown_association))]
    UnknownAssociation { model: String, name: String },

    /// A through association without exactly one inverse.
    #[error(
        "through association `{model}.{name}` needs exactly one inverse on `{target}` via `{through}`, found {candidates}"
    )]
    #[diagnostic(
        code(strata::schema::missing_inverse),
        help("declare the opposite association on the target model, or pin it with `inverse_of`")
    )]
    MissingInverseAssociation {
        model: String,
        name: String,
        target: String,
        through: String,
        candidates: usize,
    },

    /// Duplicate definition.
    #[error("duplicate {kind} `{name}`")]
    #[diagnostic(code(strata::schema::duplicate))]
    Duplicate { kind: String, name: String },

    /// An association definition that cannot be satisfied.
    #[error("invalid association `{model}.{name}`: {message}")]
    #[diagnostic(code(strata::schema::invalid_association))]
    InvalidAssociation {
        model: String,
        name: String,
        message: String,
    },

    /// Invalid configuration value.
    #[error("invalid configuration: {message}")]
    #[diagnostic(code(strata::schema::invalid_config))]
    InvalidConfig { message: String },
}

impl SchemaError {
    /// Create an unknown model error.
    pub fn unknown_model(name: impl Into<String>) -> Self {
        Self::UnknownModel { name: name.into() }
    }

    /// Create an unknown association error.
    pub fn unknown_association(model: impl Into<String>, name: impl Into<String>) -> Self {
        Self::UnknownAssociation {
            model: model.into(),
            name: name.into(),
        }
    }

    /// Create a duplicate definition error.
    pub fn duplicate(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Duplicate {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Create an invalid association error.
    pub fn invalid_association(
        model: impl Into<String>,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidAssociation {
            model: model.into(),
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_association_message() {
        let err = SchemaError::unknown_association("Person", "pets");
        assert_eq!(err.to_string(), "model `Person` has no association named `pets`");
    }

    #[test]
    fn test_missing_inverse_message() {
        let err = SchemaError::MissingInverseAssociation {
            model: "Person".into(),
            name: "friend".into(),
            target: "Person".into(),
            through: "Friendship".into(),
            candidates: 0,
        };
        let message = err.to_string();
        assert!(message.contains("Person.friend"));
        assert!(message.contains("Friendship"));
        assert!(message.contains("found 0"));
    }

    #[test]
    fn test_diagnostic_code() {
        let err = SchemaError::unknown_model("Ghost");
        let code = err.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("strata::schema::unknown_model"));
    }
}

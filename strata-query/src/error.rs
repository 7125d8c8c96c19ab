//! Error types for query compilation and reification with actionable messages.
//!
//! Every error carries an [`ErrorCode`] for programmatic handling, plus
//! optional context (model, field, SQL) and suggestions.
//!
//! # Error Codes
//!
//! Error codes follow a pattern: S{category}{number}
//! - 1xxx: Compilation errors (unknown association, invalid sort field, ...)
//! - 3xxx: Row source errors
//! - 6xxx: Instance construction errors
//! - 7xxx: Configuration errors
//! - 9xxx: Internal errors
//!
//! ```rust
//! use strata_query::{ErrorCode, QueryError};
//!
//! let err = QueryError::unknown_association("Person", "pets");
//! assert_eq!(err.code, ErrorCode::UnknownAssociation);
//! assert!(err.to_string().contains("S1002"));
//! ```

use std::fmt;

use strata_schema::SchemaError;
use thiserror::Error;

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Compilation errors (1xxx)
    /// Model not registered (S1001).
    UnknownModel = 1001,
    /// Include names an association the parent model does not have (S1002).
    UnknownAssociation = 1002,
    /// Through association without exactly one inverse (S1003).
    MissingInverseAssociation = 1003,
    /// Sort references an unresolvable field (S1004).
    InvalidSortField = 1004,
    /// Condition references an unresolvable field (S1005).
    InvalidFilter = 1005,
    /// Includes nest deeper than configured (S1006).
    IncludeTooDeep = 1006,

    // Row source errors (3xxx)
    /// Failure reported by the row source (S3001).
    RowSource = 3001,
    /// Row lacks data the plan guarantees (S3002).
    MalformedRow = 3002,

    // Construction errors (6xxx)
    /// The instance constructor rejected a field map (S6001).
    Construction = 6001,

    // Configuration errors (7xxx)
    /// Invalid configuration (S7001).
    InvalidConfiguration = 7001,

    // Internal errors (9xxx)
    /// Internal error (S9001).
    Internal = 9001,
}

impl ErrorCode {
    /// Get the error code string (e.g., "S1002").
    pub fn code(&self) -> String {
        format!("S{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::UnknownModel => "Unknown model",
            Self::UnknownAssociation => "Unknown association",
            Self::MissingInverseAssociation => "Missing inverse association",
            Self::InvalidSortField => "Invalid sort field",
            Self::InvalidFilter => "Invalid filter condition",
            Self::IncludeTooDeep => "Includes nested too deeply",
            Self::RowSource => "Row source failure",
            Self::MalformedRow => "Malformed row",
            Self::Construction => "Instance construction failed",
            Self::InvalidConfiguration => "Invalid configuration",
            Self::Internal => "Internal error",
        }
    }

    /// Get the documentation URL for this error.
    pub fn docs_url(&self) -> String {
        format!("https://strata.rs/docs/errors/{}", self.code())
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Suggestion for fixing an error.
#[derive(Debug, Clone)]
pub struct Suggestion {
    /// The suggestion text.
    pub text: String,
    /// Optional code example.
    pub code: Option<String>,
}

impl Suggestion {
    /// Create a new suggestion.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            code: None,
        }
    }

    /// Add a code example.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// Additional context for an error.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The operation that was being performed.
    pub operation: Option<String>,
    /// The model involved.
    pub model: Option<String>,
    /// The field or association involved.
    pub field: Option<String>,
    /// The SQL statement (if available).
    pub sql: Option<String>,
    /// Suggestions for fixing the error.
    pub suggestions: Vec<Suggestion>,
    /// Help text.
    pub help: Option<String>,
}

/// Errors that can occur while compiling or reifying an eager-loading query.
#[derive(Error, Debug)]
pub struct QueryError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// Additional context.
    pub context: ErrorContext,
    /// The source error (if any).
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl QueryError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Add context about the operation.
    pub fn with_context(mut self, operation: impl Into<String>) -> Self {
        self.context.operation = Some(operation.into());
        self
    }

    /// Add a suggestion for fixing the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context.suggestions.push(Suggestion::new(suggestion));
        self
    }

    /// Add a code suggestion.
    pub fn with_code_suggestion(
        mut self,
        text: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        self.context
            .suggestions
            .push(Suggestion::new(text).with_code(code));
        self
    }

    /// Add help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.context.help = Some(help.into());
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.context.model = Some(model.into());
        self
    }

    /// Set the field.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.context.field = Some(field.into());
        self
    }

    /// Set the SQL statement.
    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.context.sql = Some(sql.into());
        self
    }

    /// Set the source error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // ============== Constructor Functions ==============

    /// Create an unknown model error.
    pub fn unknown_model(model: impl Into<String>) -> Self {
        let model = model.into();
        Self::new(ErrorCode::UnknownModel, format!("Model {} is not registered", model))
            .with_model(&model)
            .with_suggestion("Register the model on the SchemaBuilder before querying it")
    }

    /// Create an unknown association error.
    pub fn unknown_association(model: impl Into<String>, name: impl Into<String>) -> Self {
        let model = model.into();
        let name = name.into();
        Self::new(
            ErrorCode::UnknownAssociation,
            format!("Model {} has no association named {}", model, name),
        )
        .with_model(&model)
        .with_field(&name)
        .with_suggestion("Check the include for typos; names resolve against the parent model, not the root")
    }

    /// Create a missing inverse association error.
    pub fn missing_inverse(
        model: impl Into<String>,
        name: impl Into<String>,
        through: impl Into<String>,
        candidates: usize,
    ) -> Self {
        let model = model.into();
        let name = name.into();
        let through = through.into();
        Self::new(
            ErrorCode::MissingInverseAssociation,
            format!(
                "Through association {}.{} via {} needs exactly one inverse, found {}",
                model, name, through, candidates
            ),
        )
        .with_model(&model)
        .with_field(&name)
        .with_code_suggestion(
            "Declare the opposite association on the target model",
            format!(
                "AssociationDef::has_many(\"...\", \"{}\").through(\"{}\")",
                model, through
            ),
        )
        .with_suggestion("Pin the inverse explicitly with AssociationDef::inverse_of when several candidates exist")
    }

    /// Create an invalid sort field error.
    pub fn invalid_sort_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let field = field.into();
        Self::new(
            ErrorCode::InvalidSortField,
            format!("Cannot sort by {}: {}", field, message.into()),
        )
        .with_field(&field)
        .with_suggestion("Sort by a root property, or by `association.property` for an included association")
    }

    /// Create an invalid filter error.
    pub fn invalid_filter(field: impl Into<String>, message: impl Into<String>) -> Self {
        let field = field.into();
        Self::new(
            ErrorCode::InvalidFilter,
            format!("Cannot filter on {}: {}", field, message.into()),
        )
        .with_field(&field)
    }

    /// Create an include depth error.
    pub fn include_too_deep(path: impl Into<String>, max_depth: usize) -> Self {
        Self::new(
            ErrorCode::IncludeTooDeep,
            format!(
                "Include {} nests deeper than the configured maximum of {} levels",
                path.into(),
                max_depth
            ),
        )
        .with_suggestion("Raise query.max_include_depth in strata.toml or load the deep branch separately")
    }

    /// Create a row source error.
    pub fn row_source(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(ErrorCode::RowSource, format!("Row source error: {}", message))
    }

    /// Create a malformed row error.
    pub fn malformed_row(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MalformedRow, format!("Malformed row: {}", message.into()))
            .with_help("Rows must be produced from the statement the planner generated")
    }

    /// Create a construction error.
    pub fn construction(model: impl Into<String>, message: impl Into<String>) -> Self {
        let model = model.into();
        Self::new(
            ErrorCode::Construction,
            format!("Failed to construct {}: {}", model, message.into()),
        )
        .with_model(&model)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidConfiguration, message.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(ErrorCode::Internal, format!("Internal error: {}", message))
            .with_help("This is likely a bug in Strata - please report it")
    }

    // ============== Error Checks ==============

    /// Check if this error was raised while compiling the query, before any SQL ran.
    pub fn is_compile_error(&self) -> bool {
        (self.code as u16) < 2000
    }

    /// Check if this error came from the row source.
    pub fn is_row_source_error(&self) -> bool {
        self.code == ErrorCode::RowSource
    }

    // ============== Display Functions ==============

    /// Get the documentation URL for this error.
    pub fn docs_url(&self) -> String {
        self.code.docs_url()
    }

    /// Display the full error with all context and suggestions.
    pub fn display_full(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Error [{}]: {}\n", self.code.code(), self.message));

        if let Some(ref op) = self.context.operation {
            output.push_str(&format!("  → While: {}\n", op));
        }
        if let Some(ref model) = self.context.model {
            output.push_str(&format!("  → Model: {}\n", model));
        }
        if let Some(ref field) = self.context.field {
            output.push_str(&format!("  → Field: {}\n", field));
        }

        // SQL (truncated if too long)
        if let Some(ref sql) = self.context.sql {
            let sql_display = if sql.chars().count() > 200 {
                format!("{}...", sql.chars().take(200).collect::<String>())
            } else {
                sql.clone()
            };
            output.push_str(&format!("  → SQL: {}\n", sql_display));
        }

        if !self.context.suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for (i, suggestion) in self.context.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion.text));
                if let Some(ref code) = suggestion.code {
                    output.push_str(&format!(
                        "     ```\n     {}\n     ```\n",
                        code.replace('\n', "\n     ")
                    ));
                }
            }
        }

        if let Some(ref help) = self.context.help {
            output.push_str(&format!("\nHelp: {}\n", help));
        }

        output.push_str(&format!("\nMore info: {}\n", self.docs_url()));

        output
    }
}

impl From<SchemaError> for QueryError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::UnknownModel { name } => Self::unknown_model(name),
            SchemaError::UnknownAssociation { model, name } => {
                Self::unknown_association(model, name)
            }
            SchemaError::MissingInverseAssociation {
                model,
                name,
                through,
                candidates,
                ..
            } => Self::missing_inverse(model, name, through, candidates),
            other => Self::configuration(other.to_string()).with_source(other),
        }
    }
}

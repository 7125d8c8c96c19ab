//! Per-query compilation settings.

use strata_schema::StrataConfig;

use crate::dialect::Dialect;

/// Default deepest include nesting.
pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 8;

/// Settings consulted while compiling an eager-loading query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryConfig {
    /// Target dialect.
    pub dialect: Dialect,
    /// Deepest include nesting accepted.
    pub max_include_depth: usize,
    /// Log every compiled statement at debug level.
    pub log_queries: bool,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
            log_queries: false,
        }
    }
}

impl QueryConfig {
    /// Create a config with defaults for `dialect`.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            ..Self::default()
        }
    }

    /// Set the maximum include depth.
    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }

    /// Enable statement logging.
    pub fn with_query_logging(mut self) -> Self {
        self.log_queries = true;
        self
    }
}

impl From<&StrataConfig> for QueryConfig {
    fn from(config: &StrataConfig) -> Self {
        Self {
            dialect: config.database.provider.into(),
            max_include_depth: config.query.max_include_depth,
            log_queries: config.debug.log_queries,
        }
    }
}

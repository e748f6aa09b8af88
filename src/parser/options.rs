//! Per-call interpreter configuration, loadable from a JSON document.
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Which way a schema is walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    /// External input to internal value.
    Decode,
    /// Internal value back to its external representation.
    Encode,
}

impl Direction {
    pub fn flip(self) -> Self {
        match self {
            Direction::Decode => Direction::Encode,
            Direction::Encode => Direction::Decode,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorPolicy {
    /// Collect every sibling error at each level.
    #[default]
    All,
    /// Stop at the first failing sibling.
    First,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExcessPropertyPolicy {
    /// Drop keys a struct does not declare.
    #[default]
    #[serde(alias = "ignore")]
    Strip,
    /// Report undeclared keys as `Unexpected`.
    #[serde(alias = "error")]
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Execution {
    /// Leaves that suspend fail with `Forbidden`.
    #[default]
    Sync,
    /// Leaves may suspend; the caller awaits the result.
    All,
}

/// Per-call configuration of the interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParseOptions {
    pub errors: ErrorPolicy,
    pub on_excess_property: ExcessPropertyPolicy,
    pub execution: Execution,
}

impl ParseOptions {
    pub fn with_errors(mut self, errors: ErrorPolicy) -> Self {
        self.errors = errors;
        self
    }

    pub fn with_excess_property(mut self, policy: ExcessPropertyPolicy) -> Self {
        self.on_excess_property = policy;
        self
    }

    pub fn with_execution(mut self, execution: Execution) -> Self {
        self.execution = execution;
        self
    }

    pub fn allows_suspension(&self) -> bool {
        self.execution == Execution::All
    }

    /// Reads options from JSON text, e.g. `{"errors": "first"}`.
    pub fn from_json_str(src: &str) -> Result<Self, Error> {
        crate::path_de::from_str_with_path(src)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_collect_all_strip_sync() {
        let o = ParseOptions::default();
        assert_eq!(o.errors, ErrorPolicy::All);
        assert_eq!(o.on_excess_property, ExcessPropertyPolicy::Strip);
        assert_eq!(o.execution, Execution::Sync);
        assert!(!o.allows_suspension());
    }

    #[test]
    fn parses_partial_json_config() {
        let o = ParseOptions::from_json_str(r#"{"errors": "first", "onExcessProperty": "error"}"#)
            .unwrap();
        assert_eq!(o.errors, ErrorPolicy::First);
        assert_eq!(o.on_excess_property, ExcessPropertyPolicy::Fail);
        assert_eq!(o.execution, Execution::Sync);
    }

    #[test]
    fn bad_config_reports_field_path() {
        let err = ParseOptions::from_json_str(r#"{"execution": "parallel"}"#).unwrap_err();
        assert!(err.to_string().contains("execution"), "{err}");
    }

    #[test]
    fn trailing_text_after_config_is_rejected() {
        let err = ParseOptions::from_json_str(r#"{"errors": "first"} not json at all"#).unwrap_err();
        let Error::Deserialize { path, .. } = &err else { panic!("expected deserialize error") };
        assert_eq!(path, ".");
        assert!(ParseOptions::from_json_str("{}\n").is_ok());
    }
}

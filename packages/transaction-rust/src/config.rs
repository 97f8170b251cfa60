use std::str::FromStr;

use crate::error::TransactionError;
use crate::operation::TransactionKind;
use crate::table::TableOptions;

/// Caller-facing name of a transaction class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionType {
    Get,
    Write,
}

impl FromStr for TransactionType {
    type Err = TransactionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "get" => Ok(Self::Get),
            "write" => Ok(Self::Write),
            other => Err(TransactionError::InvalidType {
                value: other.to_string(),
            }),
        }
    }
}

impl From<TransactionType> for TransactionKind {
    fn from(t: TransactionType) -> Self {
        match t {
            TransactionType::Get => Self::Read,
            TransactionType::Write => Self::Write,
        }
    }
}

/// Effective settings for one transaction run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransactionSettings {
    /// Explicit class; `None` classifies from the batch contents.
    pub kind: Option<TransactionType>,
    /// Return the built request instead of executing it.
    pub return_request: bool,
}

impl TransactionSettings {
    /// Returns `self` with every option set in `options` applied on top.
    ///
    /// Neither input is modified.
    #[must_use]
    pub fn merged(&self, options: &TransactionOptions) -> Self {
        Self {
            kind: options.kind.or(self.kind),
            return_request: options.return_request.unwrap_or(self.return_request),
        }
    }
}

/// Per-call overrides supplied by the caller. Unset fields fall back to the
/// coordinator's defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransactionOptions {
    pub kind: Option<TransactionType>,
    pub return_request: Option<bool>,
}

impl TransactionOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the explicit class from its caller-facing name.
    ///
    /// # Errors
    ///
    /// Returns `TransactionError::InvalidType` for anything but `"get"` or `"write"`.
    pub fn with_type(mut self, name: &str) -> Result<Self, TransactionError> {
        self.kind = Some(name.parse()?);
        Ok(self)
    }

    #[must_use]
    pub fn with_kind(mut self, kind: TransactionType) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Short-circuits the run to return the built request.
    #[must_use]
    pub fn returning_request(mut self) -> Self {
        self.return_request = Some(true);
        self
    }
}

/// Coordinator-level configuration.
#[derive(Debug, Clone, Default)]
pub struct CoordinatorConfig {
    /// Settings applied when a call does not override them.
    pub defaults: TransactionSettings,
    /// Table options for models registered without explicit options.
    pub table_defaults: TableOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_types() {
        assert_eq!("get".parse::<TransactionType>(), Ok(TransactionType::Get));
        assert_eq!("write".parse::<TransactionType>(), Ok(TransactionType::Write));
    }

    #[test]
    fn rejects_unknown_types() {
        let err = "delete".parse::<TransactionType>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid type option, please pass in \"get\" or \"write\""
        );
        assert!(TransactionOptions::new().with_type("GET").is_err());
    }

    #[test]
    fn merge_prefers_overrides_and_leaves_inputs_untouched() {
        let defaults = TransactionSettings {
            kind: Some(TransactionType::Write),
            return_request: true,
        };
        let options = TransactionOptions::new().with_kind(TransactionType::Get);

        let merged = defaults.merged(&options);
        assert_eq!(merged.kind, Some(TransactionType::Get));
        assert!(merged.return_request);

        assert_eq!(defaults.kind, Some(TransactionType::Write));
        assert_eq!(options.return_request, None);
    }

    #[test]
    fn empty_options_keep_defaults() {
        let defaults = TransactionSettings::default();
        assert_eq!(defaults.merged(&TransactionOptions::new()), defaults);
        assert!(defaults.merged(&TransactionOptions::new().returning_request()).return_request);
    }

    #[test]
    fn type_maps_to_kind() {
        assert_eq!(TransactionKind::from(TransactionType::Get), TransactionKind::Read);
        assert_eq!(TransactionKind::from(TransactionType::Write), TransactionKind::Write);
    }
}

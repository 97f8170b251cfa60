//! Table metadata owned by registered models.

use std::time::Duration;

/// Lifecycle status of a table as reported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStatus {
    Creating,
    Updating,
    Deleting,
    Active,
}

/// Whether, and how long, to wait for a table to become active before
/// using it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitForActive {
    pub enabled: bool,
    /// Give up after this long.
    pub timeout: Duration,
    /// Delay between status checks.
    pub frequency: Duration,
}

impl Default for WaitForActive {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout: Duration::from_secs(180),
            frequency: Duration::from_secs(1),
        }
    }
}

/// Per-model table options.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableOptions {
    /// Prepended to the model name to form the table name.
    pub prefix: String,
    /// Appended to the model name to form the table name.
    pub suffix: String,
    pub wait_for_active: WaitForActive,
}

impl TableOptions {
    /// Options that never wait on table status.
    #[must_use]
    pub fn without_waiting() -> Self {
        Self {
            wait_for_active: WaitForActive {
                enabled: false,
                ..WaitForActive::default()
            },
            ..Self::default()
        }
    }
}

/// A store table backing one model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    name: String,
    options: TableOptions,
}

impl Table {
    /// Creates a table for `model_name`, applying the configured prefix and suffix.
    #[must_use]
    pub fn for_model(model_name: &str, options: TableOptions) -> Self {
        Self {
            name: format!("{}{}{}", options.prefix, model_name, options.suffix),
            options,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn options(&self) -> &TableOptions {
        &self.options
    }
}

use std::sync::Arc;

use dashmap::DashMap;
use dynaform_core::SchemaCodec;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{RegistryError, TransactionError};
use crate::model::Model;
use crate::operation::OperationDescriptor;
use crate::table::{Table, TableOptions};

static TABLE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_.\-]{3,255}$").expect("table name pattern is valid"));

// ---------------------------------------------------------------------------
// ModelRegistry
// ---------------------------------------------------------------------------

/// Registry of compiled models, keyed by model name.
///
/// Created once at application start and shared (via `Arc`) by every
/// coordinator that needs to resolve descriptor back-references. Lookups
/// are lock-free for readers.
pub struct ModelRegistry {
    by_name: DashMap<String, Arc<Model>>,
}

impl ModelRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            by_name: DashMap::new(),
        }
    }

    /// Compile and register a model. The table name is the model name with
    /// the configured prefix and suffix applied.
    ///
    /// Registering a name twice replaces the earlier model.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError` if the model name is empty or the resulting
    /// table name is not a legal store table name.
    pub fn register(
        &self,
        name: &str,
        codec: impl SchemaCodec + 'static,
        options: TableOptions,
    ) -> Result<Arc<Model>, RegistryError> {
        if name.is_empty() {
            return Err(RegistryError::EmptyModelName);
        }
        let table = Table::for_model(name, options);
        if !TABLE_NAME.is_match(table.name()) {
            return Err(RegistryError::InvalidTableName {
                name: table.name().to_string(),
            });
        }

        let model = Arc::new(Model::new(name, table, Arc::new(codec)));
        if self
            .by_name
            .insert(name.to_string(), Arc::clone(&model))
            .is_some()
        {
            tracing::warn!(model = name, "model re-registered, replacing previous definition");
        }
        Ok(model)
    }

    /// Retrieve a model by name.
    pub fn resolve(&self, name: &str) -> Option<Arc<Model>> {
        self.by_name.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Resolve the model that built `descriptor`.
    ///
    /// # Errors
    ///
    /// Returns `TransactionError::ModelNotFound`, naming the target table,
    /// when the descriptor has no back-reference or it names no registered
    /// model.
    pub fn lookup(&self, descriptor: &OperationDescriptor) -> Result<Arc<Model>, TransactionError> {
        descriptor
            .model
            .as_deref()
            .and_then(|name| self.resolve(name))
            .ok_or_else(|| TransactionError::ModelNotFound {
                table: descriptor.table_name().to_string(),
            })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

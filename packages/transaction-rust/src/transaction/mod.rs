//! Atomic batch transactions.
//!
//! A run moves through these stages:
//!
//! 1. **Classification** (`classify`): batch -> read or write transaction
//! 2. **Readiness gate** (`gate`): wait for every table that requires it
//! 3. **Execution** (`executor`): one atomic store call
//! 4. **Rehydration** (`rehydrate`): raw records -> typed documents, minus expired ones
//!
//! [`TransactionCoordinator`] composes the stages; [`run_with_callback`]
//! adapts it to error-first completion callbacks.

pub mod callback;
pub mod classify;
pub mod coordinator;
pub mod executor;
pub mod gate;
pub mod rehydrate;

pub use callback::run_with_callback;
pub use classify::classify;
pub use coordinator::{TransactionCoordinator, TransactionOutcome};
pub use executor::RawResponse;

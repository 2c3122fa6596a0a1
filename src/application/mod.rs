// Application layer - the ledger engine.
// Validates deposits and transfers against the account store and applies
// them inside a single unit of work.

pub mod error;
pub mod service;

pub use error::*;
pub use service::*;

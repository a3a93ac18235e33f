//! Plan data structures, validation, and loading

mod data;
mod events;
pub mod loader;
mod validate;

pub use data::{BucketConfig, DynamicParams, Plan, WithdrawalStrategy};
pub use events::{EventDate, EventKind, LifeEvent};
pub use validate::{
    validate, validate_with, EngineError, EnglishCatalog, MessageCatalog, ValidationRule,
};

//! Data module - crash CSV loading and record types

mod loader;
mod record;

pub use loader::CrashLoader;
pub use record::{CategoryField, CrashDataset, CrashRecord};

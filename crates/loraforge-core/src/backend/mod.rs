//! Trainer and registry backends.

mod local;

pub use local::{LocalBackend, LocalRegistry};

//! Loraforge Core
//!
//! Concrete backends for the launch primitives in `loraforge-training`.
//! Currently ships a minimal local CPU backend that exercises the whole
//! pipeline without GPU dependencies.

pub mod backend;

pub use backend::{LocalBackend, LocalRegistry};

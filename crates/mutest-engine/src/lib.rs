//! Mutation rule engine for compiled intermediate representations.
//!
//! Given a module's operation graph, the engine discovers points where a
//! small, structure-preserving edit can be applied, applies exactly one
//! such edit on demand, and deterministically replays a recorded trace of
//! edits against a re-derived copy of the same module. Selection is
//! randomized but reproducible (seeded ChaCha8); the packages it emits are
//! the resolved outcomes, carrying no randomness of their own.

pub mod engine;
pub mod history;
pub mod point;
pub mod rules;

pub use engine::MutationEngine;
pub use history::HistoryStore;
pub use point::{MutateRequest, MutateResponse, MutationPoint, TraceRecord};
pub use rules::{MutationCtx, Rule};

//! apikit — the core machinery of a resource-oriented application
//! framework.
//!
//! Two mechanisms live here:
//!
//! - a **type registry** ([`runtime::Scheme`]) mapping group/version/kind
//!   identity triples to concrete object types, with polymorphic creation,
//!   lookup and default-value application, plus an instance set
//!   ([`runtime::ObjectSet`]) serving copy-on-read example objects;
//! - a **plugin dependency resolver** ([`plugin::PluginRegistry`]) that
//!   accepts independently-registered components with named (or wildcard)
//!   requirements and produces a deterministic initialization order.
//!
//! Everything is populated during process startup and read-mostly
//! afterwards. Process-wide defaults exist for hosts that accept
//! one-registry-per-process semantics; all state is also available as
//! explicit, constructible objects so tests can stay isolated.

pub mod meta;
pub mod plugin;
pub mod runtime;
pub mod schema;
pub mod store;

pub use runtime::{Object, ObjectSet, Scheme, SchemeBuilder, SchemeError};
pub use schema::{GroupVersion, GroupVersionKind};

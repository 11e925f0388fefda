//! The registration table and the dependency graph resolver.
//!
//! `graph` is a best-effort depth-first expansion, not a cycle-safe
//! topological sort: it places every dependency of a registration before the
//! registration itself, expands the wildcard to all other enabled entries,
//! and caps recursion depth at the table length so that a cyclic requirement
//! chain stops expanding instead of overflowing the stack. The resulting
//! order for cyclic graphs is undefined beyond that guarantee.

use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use super::{PluginError, PluginType, Registration};

/// Append-only table of plugin registrations.
///
/// Registration is an init-time concern; after startup the table is
/// read-mostly. A single read-write lock guards the table shape. `graph`
/// runs under the read lock and only flips per-entry disabled flags, which
/// live outside the table shape.
#[derive(Default)]
pub struct PluginRegistry {
    table: RwLock<Vec<Arc<Registration>>>,
}

impl PluginRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a registration to the table.
    ///
    /// # Errors
    /// - [`PluginError::NoType`] for an empty category
    /// - [`PluginError::NoPluginId`] for an empty id
    /// - [`PluginError::IdRegistered`] when the URI collides with an
    ///   existing registration
    /// - [`PluginError::InvalidRequires`] when the wildcard is mixed with
    ///   other requirements
    ///
    /// A rejected registration is not added; earlier entries are unaffected.
    pub fn register(&self, r: Registration) -> Result<Arc<Registration>, PluginError> {
        if r.plugin_type.as_str().is_empty() {
            return Err(PluginError::NoType);
        }
        if r.id.is_empty() {
            return Err(PluginError::NoPluginId);
        }
        if r.requires.iter().any(PluginType::is_wildcard) && r.requires.len() != 1 {
            return Err(PluginError::InvalidRequires);
        }

        let mut table = self.table.write();
        let uri = r.uri();
        if table.iter().any(|existing| existing.uri() == uri) {
            return Err(PluginError::IdRegistered(uri));
        }

        tracing::debug!(plugin = %uri, requires = ?r.requires, "registered plugin");
        let r = Arc::new(r);
        table.push(Arc::clone(&r));
        Ok(r)
    }

    /// Snapshot of the table in insertion order.
    #[must_use]
    pub fn registrations(&self) -> Vec<Arc<Registration>> {
        self.table.read().clone()
    }

    /// Resolves an initialization order.
    ///
    /// First marks every registration matching `filter` as disabled (a
    /// visible side effect on the registrations themselves). Then walks the
    /// table in insertion order, placing each enabled registration after its
    /// requirements, depth-first. A registration is placed exactly once no
    /// matter how many dependents name it. Never fails; unresolvable
    /// requirements simply contribute nothing.
    pub fn graph(&self, filter: impl Fn(&Registration) -> bool) -> Vec<Arc<Registration>> {
        let table = self.table.read();

        for r in table.iter() {
            if filter(r) {
                tracing::debug!(plugin = %r.uri(), "disabled by filter");
                r.disable();
            }
        }

        let mut ordered = Vec::new();
        let mut placed: HashSet<String> = HashSet::new();
        for r in table.iter() {
            if r.is_disabled() {
                continue;
            }
            Self::children(r, &table, &mut placed, &mut ordered, 0);
            if placed.insert(r.uri()) {
                ordered.push(Arc::clone(r));
            }
        }
        ordered
    }

    /// Depth-first placement of `reg`'s requirements.
    ///
    /// A requirement matches a candidate by exact URI, or matches every
    /// other enabled candidate when it is the wildcard. `reg` itself and
    /// disabled entries never match. `depth` caps the recursion: a cyclic
    /// chain cannot exceed the table length without revisiting an entry.
    fn children(
        reg: &Arc<Registration>,
        table: &[Arc<Registration>],
        placed: &mut HashSet<String>,
        ordered: &mut Vec<Arc<Registration>>,
        depth: usize,
    ) {
        if depth >= table.len() {
            tracing::warn!(
                plugin = %reg.uri(),
                "requirement recursion limit reached; possible dependency cycle"
            );
            return;
        }
        for t in &reg.requires {
            for r in table {
                if r.is_disabled() || r.uri() == reg.uri() {
                    continue;
                }
                if t.is_wildcard() || r.uri() == t.as_str() {
                    Self::children(r, table, placed, ordered, depth + 1);
                    if placed.insert(r.uri()) {
                        ordered.push(Arc::clone(r));
                    }
                }
            }
        }
    }
}

static DEFAULT_REGISTRY: OnceLock<PluginRegistry> = OnceLock::new();

/// The process-wide registration table backing [`register`] and [`graph`].
pub fn default_registry() -> &'static PluginRegistry {
    DEFAULT_REGISTRY.get_or_init(PluginRegistry::new)
}

/// Calls [`PluginRegistry::register`] on the process-wide table.
///
/// # Errors
/// See [`PluginRegistry::register`].
pub fn register(r: Registration) -> Result<Arc<Registration>, PluginError> {
    default_registry().register(r)
}

/// Calls [`PluginRegistry::graph`] on the process-wide table.
pub fn graph(filter: impl Fn(&Registration) -> bool) -> Vec<Arc<Registration>> {
    default_registry().graph(filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::PluginInstance;

    fn reg(plugin_type: &str, id: &str, requires: &[&str]) -> Registration {
        Registration::new(plugin_type, id, |_| {
            Ok(Box::new(()) as PluginInstance)
        })
        .requires(requires.iter().copied().map(PluginType::from))
    }

    fn uris(ordered: &[Arc<Registration>]) -> Vec<String> {
        ordered.iter().map(|r| r.uri()).collect()
    }

    #[test]
    fn register_rejects_empty_type_and_id() {
        let registry = PluginRegistry::new();
        assert!(matches!(
            registry.register(reg("", "a", &[])),
            Err(PluginError::NoType)
        ));
        assert!(matches!(
            registry.register(reg("t", "", &[])),
            Err(PluginError::NoPluginId)
        ));
        assert!(registry.registrations().is_empty());
    }

    #[test]
    fn register_rejects_duplicate_uri_keeps_first() {
        let registry = PluginRegistry::new();
        registry.register(reg("t", "a", &[])).unwrap();
        let err = registry.register(reg("t", "a", &[])).unwrap_err();
        assert!(matches!(err, PluginError::IdRegistered(uri) if uri == "t.a"));
        assert_eq!(registry.registrations().len(), 1);
    }

    #[test]
    fn register_rejects_wildcard_mixed_with_other_requires() {
        let registry = PluginRegistry::new();
        let err = registry.register(reg("t", "a", &["*", "t.b"])).unwrap_err();
        assert!(matches!(err, PluginError::InvalidRequires));
        assert!(registry.registrations().is_empty());

        // Wildcard alone is valid.
        registry.register(reg("t", "b", &["*"])).unwrap();
    }

    #[test]
    fn graph_orders_dependencies_first() {
        // Insert in reverse dependency order; the resolver must still place
        // A before B before C.
        let registry = PluginRegistry::new();
        registry.register(reg("t", "c", &["t.b"])).unwrap();
        registry.register(reg("t", "b", &["t.a"])).unwrap();
        registry.register(reg("t", "a", &[])).unwrap();

        let ordered = registry.graph(|_| false);
        assert_eq!(uris(&ordered), vec!["t.a", "t.b", "t.c"]);
    }

    #[test]
    fn graph_places_each_registration_once() {
        let registry = PluginRegistry::new();
        registry.register(reg("t", "a", &[])).unwrap();
        registry.register(reg("t", "b", &["t.a"])).unwrap();
        registry.register(reg("t", "c", &["t.a", "t.b"])).unwrap();

        let ordered = registry.graph(|_| false);
        assert_eq!(uris(&ordered), vec!["t.a", "t.b", "t.c"]);
    }

    #[test]
    fn graph_wildcard_depends_on_everything_else() {
        let registry = PluginRegistry::new();
        registry.register(reg("t", "a", &[])).unwrap();
        registry.register(reg("t", "b", &["t.a"])).unwrap();
        registry.register(reg("t", "c", &["t.b"])).unwrap();
        registry.register(reg("t", "d", &["*"])).unwrap();

        let ordered = registry.graph(|_| false);
        assert_eq!(uris(&ordered), vec!["t.a", "t.b", "t.c", "t.d"]);
    }

    #[test]
    fn graph_wildcard_excludes_disabled_and_self() {
        let registry = PluginRegistry::new();
        registry.register(reg("t", "a", &[])).unwrap();
        registry.register(reg("t", "b", &[])).unwrap();
        registry.register(reg("t", "d", &["*"])).unwrap();

        let ordered = registry.graph(|r| r.id == "b");
        assert_eq!(uris(&ordered), vec!["t.a", "t.d"]);
    }

    #[test]
    fn disabled_dependency_contributes_nothing() {
        let registry = PluginRegistry::new();
        registry.register(reg("t", "a", &[])).unwrap();
        registry.register(reg("t", "b", &["t.a"])).unwrap();
        registry.register(reg("t", "c", &["t.b"])).unwrap();

        let ordered = registry.graph(|r| r.id == "b");
        // B is gone from the output and no longer satisfies C's edge;
        // C still appears, after whatever else resolved.
        assert_eq!(uris(&ordered), vec!["t.a", "t.c"]);
    }

    #[test]
    fn disable_filter_mutates_registrations_in_place() {
        let registry = PluginRegistry::new();
        let a = registry.register(reg("t", "a", &[])).unwrap();
        registry.graph(|r| r.id == "a");
        assert!(a.is_disabled());
    }

    #[test]
    fn graph_survives_requirement_cycles() {
        let registry = PluginRegistry::new();
        registry.register(reg("t", "a", &["t.b"])).unwrap();
        registry.register(reg("t", "b", &["t.a"])).unwrap();

        // Must terminate; each registration still placed exactly once.
        let ordered = registry.graph(|_| false);
        let mut got = uris(&ordered);
        got.sort();
        assert_eq!(got, vec!["t.a", "t.b"]);
    }

    #[test]
    fn graph_ignores_unresolvable_requirements() {
        let registry = PluginRegistry::new();
        registry.register(reg("t", "a", &["t.missing"])).unwrap();

        let ordered = registry.graph(|_| false);
        assert_eq!(uris(&ordered), vec!["t.a"]);
    }
}

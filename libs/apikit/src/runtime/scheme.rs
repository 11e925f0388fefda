//! The type registry: bidirectional identity-triple / concrete-type mapping
//! with zero-value instantiation and per-type defaulting.
//!
//! Instead of runtime type introspection the registry holds a factory table:
//! each registered triple maps to a closure producing a fresh zero value.
//! The concrete type only appears at the registration call site.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use super::errors::SchemeError;
use super::Object;
use crate::schema::{GroupVersion, GroupVersionKind};

type FactoryFn = Arc<dyn Fn() -> Box<dyn Object> + Send + Sync>;
type DefaultFn = Arc<dyn Fn(&mut dyn Object) + Send + Sync>;

/// Registry of known resource types.
///
/// Populated during process startup, read-mostly afterwards. A single
/// read-write lock guards all internal maps; readers hold it only for the
/// lookup itself. The maps are never exposed to callers.
#[derive(Default)]
pub struct Scheme {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    factories: HashMap<GroupVersionKind, FactoryFn>,
    gvks: HashMap<TypeId, GroupVersionKind>,
    defaulters: HashMap<TypeId, DefaultFn>,
    observed_versions: Vec<GroupVersion>,
}

impl Inner {
    fn observe_version(&mut self, gv: &GroupVersion) {
        if gv.version.is_empty() {
            return;
        }
        if !self.observed_versions.contains(gv) {
            self.observed_versions.push(gv.clone());
        }
    }
}

impl Scheme {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T` under `gv`, deriving the kind from the type name.
    ///
    /// Records the mapping in both directions and notes the group/version in
    /// the observed-versions list. Registering the same type again silently
    /// overwrites the previous entry. The batch form is
    /// [`crate::add_known_types!`].
    pub fn add_known_type<T: Object + Default>(&self, gv: &GroupVersion) {
        let gvk = gv.with_kind(short_type_name::<T>());
        tracing::debug!(gvk = %gvk, "adding known type");

        let mut inner = self.inner.write();
        inner.observe_version(gv);
        let factory: FactoryFn = Arc::new(|| Box::new(T::default()) as Box<dyn Object>);
        inner.factories.insert(gvk.clone(), factory);
        inner.gvks.insert(TypeId::of::<T>(), gvk);
    }

    /// Creates a fresh zero-value instance of the type registered under
    /// `gvk`. Two calls never alias.
    ///
    /// # Errors
    /// [`SchemeError::UnknownGvk`] when no type is registered for the triple.
    pub fn new_object(&self, gvk: &GroupVersionKind) -> Result<Box<dyn Object>, SchemeError> {
        let inner = self.inner.read();
        let factory = inner
            .factories
            .get(gvk)
            .ok_or_else(|| SchemeError::UnknownGvk(gvk.clone()))?;
        Ok(factory())
    }

    #[must_use]
    pub fn is_exists(&self, gvk: &GroupVersionKind) -> bool {
        self.inner.read().factories.contains_key(gvk)
    }

    /// The identity triple `T` was registered under, if any.
    #[must_use]
    pub fn gvk_for<T: Object>(&self) -> Option<GroupVersionKind> {
        self.inner.read().gvks.get(&TypeId::of::<T>()).cloned()
    }

    /// Applies the defaulting function bound to the instance's concrete
    /// type, in place. Dispatch is on the type, not the identity triple.
    ///
    /// # Errors
    /// [`SchemeError::UnknownType`] when no defaulting function is bound.
    pub fn default_object(&self, src: &mut dyn Object) -> Result<(), SchemeError> {
        let defaulter = {
            let inner = self.inner.read();
            inner.defaulters.get(&src.as_any().type_id()).cloned()
        };
        match defaulter {
            Some(f) => {
                f(src);
                Ok(())
            }
            None => Err(SchemeError::UnknownType(src.object_kind())),
        }
    }

    /// Binds `f` as the defaulting function for `T`, overwriting any prior
    /// binding.
    pub fn add_type_defaulting_func<T: Object>(
        &self,
        f: impl Fn(&mut T) + Send + Sync + 'static,
    ) {
        let wrapped: DefaultFn = Arc::new(move |obj: &mut dyn Object| {
            if let Some(concrete) = obj.as_any_mut().downcast_mut::<T>() {
                f(concrete);
            }
        });
        self.inner
            .write()
            .defaulters
            .insert(TypeId::of::<T>(), wrapped);
    }

    /// Snapshot of every group/version seen by [`Self::add_known_type`],
    /// in first-observation order.
    #[must_use]
    pub fn observed_versions(&self) -> Vec<GroupVersion> {
        self.inner.read().observed_versions.clone()
    }
}

fn short_type_name<T>() -> &'static str {
    let name = std::any::type_name::<T>();
    name.rsplit("::").next().unwrap_or(name)
}

static DEFAULT_SCHEME: OnceLock<Scheme> = OnceLock::new();

/// The process-wide scheme backing the free functions below.
///
/// A convenience for hosts that accept one registry per process; everything
/// is equally available on an explicitly constructed [`Scheme`].
pub fn default_scheme() -> &'static Scheme {
    DEFAULT_SCHEME.get_or_init(Scheme::new)
}

/// Calls [`Scheme::new_object`] on the process-wide scheme.
///
/// # Errors
/// [`SchemeError::UnknownGvk`] when no type is registered for the triple.
pub fn new_object(gvk: &GroupVersionKind) -> Result<Box<dyn Object>, SchemeError> {
    default_scheme().new_object(gvk)
}

/// Calls [`Scheme::is_exists`] on the process-wide scheme.
#[must_use]
pub fn is_exists(gvk: &GroupVersionKind) -> bool {
    default_scheme().is_exists(gvk)
}

/// Calls [`Scheme::add_known_type`] on the process-wide scheme.
pub fn add_known_type<T: Object + Default>(gv: &GroupVersion) {
    default_scheme().add_known_type::<T>(gv);
}

/// Calls [`Scheme::default_object`] on the process-wide scheme.
///
/// # Errors
/// [`SchemeError::UnknownType`] when no defaulting function is bound.
pub fn default_object(src: &mut dyn Object) -> Result<(), SchemeError> {
    default_scheme().default_object(src)
}

/// Calls [`Scheme::add_type_defaulting_func`] on the process-wide scheme.
pub fn add_type_defaulting_func<T: Object>(f: impl Fn(&mut T) + Send + Sync + 'static) {
    default_scheme().add_type_defaulting_func(f);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impl_object;

    #[derive(Clone, Default, Debug, PartialEq)]
    struct Widget {
        replicas: u32,
        label: String,
    }
    impl_object!(Widget, "apps", "v1");

    #[derive(Clone, Default)]
    struct Gadget;
    impl_object!(Gadget, "apps", "v1");

    fn gv() -> GroupVersion {
        GroupVersion::new("apps", "v1")
    }

    #[test]
    fn new_object_unknown_gvk_fails() {
        let scheme = Scheme::new();
        let err = scheme
            .new_object(&GroupVersionKind::new("apps", "v1", "Widget"))
            .unwrap_err();
        assert!(matches!(err, SchemeError::UnknownGvk(_)));
    }

    #[test]
    fn new_object_returns_distinct_instances() {
        let scheme = Scheme::new();
        scheme.add_known_type::<Widget>(&gv());

        let gvk = GroupVersionKind::new("apps", "v1", "Widget");
        let mut a = scheme.new_object(&gvk).unwrap();
        let b = scheme.new_object(&gvk).unwrap();

        assert_eq!(a.object_kind(), gvk);
        assert_eq!(b.object_kind(), gvk);

        a.as_any_mut().downcast_mut::<Widget>().unwrap().replicas = 3;
        assert_eq!(b.as_any().downcast_ref::<Widget>().unwrap().replicas, 0);
    }

    #[test]
    fn kind_is_derived_from_type_name() {
        let scheme = Scheme::new();
        scheme.add_known_type::<Widget>(&gv());
        assert!(scheme.is_exists(&gv().with_kind("Widget")));
        assert!(!scheme.is_exists(&gv().with_kind("Gadget")));
        assert_eq!(scheme.gvk_for::<Widget>(), Some(gv().with_kind("Widget")));
        assert_eq!(scheme.gvk_for::<Gadget>(), None);
    }

    #[test]
    fn add_known_types_macro_registers_batch() {
        let scheme = Scheme::new();
        crate::add_known_types!(scheme, &gv(), [Widget, Gadget]);
        assert!(scheme.is_exists(&gv().with_kind("Widget")));
        assert!(scheme.is_exists(&gv().with_kind("Gadget")));
    }

    #[test]
    fn default_dispatches_on_concrete_type() {
        let scheme = Scheme::new();
        scheme.add_known_type::<Widget>(&gv());
        scheme.add_type_defaulting_func::<Widget>(|w| {
            if w.replicas == 0 {
                w.replicas = 1;
            }
            w.label = "default".to_owned();
        });

        let mut obj = scheme.new_object(&gv().with_kind("Widget")).unwrap();
        scheme.default_object(obj.as_mut()).unwrap();
        let widget = obj.as_any().downcast_ref::<Widget>().unwrap();
        assert_eq!(widget.replicas, 1);
        assert_eq!(widget.label, "default");
    }

    #[test]
    fn default_without_binding_fails() {
        let scheme = Scheme::new();
        let mut obj = Gadget;
        let err = scheme.default_object(&mut obj).unwrap_err();
        assert!(matches!(err, SchemeError::UnknownType(_)));
    }

    #[test]
    fn defaulting_func_rebinding_overwrites() {
        let scheme = Scheme::new();
        scheme.add_type_defaulting_func::<Widget>(|w| w.replicas = 1);
        scheme.add_type_defaulting_func::<Widget>(|w| w.replicas = 2);

        let mut w = Widget::default();
        scheme.default_object(&mut w).unwrap();
        assert_eq!(w.replicas, 2);
    }

    #[test]
    fn observed_versions_deduplicated_and_skip_empty() {
        let scheme = Scheme::new();
        scheme.add_known_type::<Widget>(&gv());
        scheme.add_known_type::<Gadget>(&gv());
        scheme.add_known_type::<Gadget>(&GroupVersion::new("apps", ""));
        scheme.add_known_type::<Widget>(&GroupVersion::new("apps", "v2"));

        assert_eq!(
            scheme.observed_versions(),
            vec![gv(), GroupVersion::new("apps", "v2")]
        );
    }
}

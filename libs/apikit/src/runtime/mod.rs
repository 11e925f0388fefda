//! Runtime object model: the [`Object`] capability, the [`Scheme`] type
//! registry and the [`ObjectSet`] instance set.

use std::any::Any;

use crate::schema::GroupVersionKind;

mod errors;
mod scheme;
mod set;

pub use errors::SchemeError;
pub use scheme::{
    add_known_type, add_type_defaulting_func, default_object, default_scheme, is_exists,
    new_object, Scheme,
};
pub use set::{add_objs, default_object_set, get_obj, new_obj, ObjectSet};

/// Capability every registered resource type exposes.
///
/// Deliberately narrow: report identity, deep-copy, and overwrite-from-peer.
/// The `as_any` accessors exist so the scheme can dispatch defaulting
/// functions on the concrete type. Implement via [`crate::impl_object!`].
pub trait Object: Any + Send + Sync {
    /// The identity triple of the concrete type.
    fn object_kind(&self) -> GroupVersionKind;

    /// An independent deep copy; the caller owns the result.
    fn clone_object(&self) -> Box<dyn Object>;

    /// Overwrites this instance from another of the same concrete type.
    /// Instances of a different kind are left untouched.
    fn merge_from(&mut self, other: &dyn Object);

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl std::fmt::Debug for dyn Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Object")
            .field("kind", &self.object_kind())
            .finish()
    }
}

/// Implements [`Object`] for a `Clone` type. The kind is the type name,
/// fixed at the call site where the concrete type is statically known.
///
/// ```
/// use apikit::impl_object;
///
/// #[derive(Clone, Default)]
/// struct Widget {
///     spec: String,
/// }
/// impl_object!(Widget, "apps", "v1");
/// ```
#[macro_export]
macro_rules! impl_object {
    ($ty:ident, $group:expr, $version:expr) => {
        impl $crate::runtime::Object for $ty {
            fn object_kind(&self) -> $crate::schema::GroupVersionKind {
                $crate::schema::GroupVersionKind::new($group, $version, stringify!($ty))
            }

            fn clone_object(&self) -> ::std::boxed::Box<dyn $crate::runtime::Object> {
                ::std::boxed::Box::new(::std::clone::Clone::clone(self))
            }

            fn merge_from(&mut self, other: &dyn $crate::runtime::Object) {
                if let ::std::option::Option::Some(other) =
                    other.as_any().downcast_ref::<$ty>()
                {
                    *self = ::std::clone::Clone::clone(other);
                }
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }
        }
    };
}

/// Registers a batch of types under one group/version.
///
/// ```ignore
/// apikit::add_known_types!(scheme, &gv, [Widget, Gadget]);
/// ```
#[macro_export]
macro_rules! add_known_types {
    ($scheme:expr, $gv:expr, [$($ty:ty),+ $(,)?]) => {
        $( $scheme.add_known_type::<$ty>($gv); )+
    };
}

/// Deferred scheme population: collect registration functions, apply later.
///
/// Lets each API group declare its types next to their definitions and the
/// host wire all groups into one scheme at startup.
#[derive(Default)]
pub struct SchemeBuilder {
    funcs: Vec<fn(&Scheme) -> Result<(), SchemeError>>,
}

impl SchemeBuilder {
    #[must_use]
    pub fn new(funcs: impl IntoIterator<Item = fn(&Scheme) -> Result<(), SchemeError>>) -> Self {
        let mut sb = Self::default();
        sb.register(funcs);
        sb
    }

    pub fn register(
        &mut self,
        funcs: impl IntoIterator<Item = fn(&Scheme) -> Result<(), SchemeError>>,
    ) {
        self.funcs.extend(funcs);
    }

    /// Applies every collected function in registration order, stopping at
    /// the first failure.
    ///
    /// # Errors
    /// Returns the first error produced by a registration function.
    pub fn add_to_scheme(&self, scheme: &Scheme) -> Result<(), SchemeError> {
        for f in &self.funcs {
            f(scheme)?;
        }
        Ok(())
    }
}

//! The instance set: live example objects keyed by identity triple,
//! retrievable only as defensive copies.

use std::collections::HashMap;
use std::sync::OnceLock;

use parking_lot::RwLock;

use super::Object;
use crate::schema::GroupVersionKind;

/// Holds example instances by their self-reported identity triple.
///
/// Callers never see the stored instance itself; every read yields an
/// independent copy, taken while the read lock is still held.
#[derive(Default)]
pub struct ObjectSet {
    store: RwLock<HashMap<GroupVersionKind, Box<dyn Object>>>,
}

impl ObjectSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores each instance under its own identity triple. Last writer wins;
    /// replacing an existing entry is not an error.
    pub fn add_objs(&self, objs: impl IntoIterator<Item = Box<dyn Object>>) {
        let mut store = self.store.write();
        for obj in objs {
            store.insert(obj.object_kind(), obj);
        }
    }

    pub fn add_obj(&self, obj: Box<dyn Object>) {
        self.add_objs(std::iter::once(obj));
    }

    /// A copy of the instance stored under `gvk`, or `None`.
    #[must_use]
    pub fn get(&self, gvk: &GroupVersionKind) -> Option<Box<dyn Object>> {
        self.store.read().get(gvk).map(|obj| obj.clone_object())
    }

    /// Like [`Self::get`], but runs `transform` on the copy before returning
    /// it. The stored instance is never touched.
    pub fn new_obj(
        &self,
        gvk: &GroupVersionKind,
        transform: impl FnOnce(Box<dyn Object>) -> Box<dyn Object>,
    ) -> Option<Box<dyn Object>> {
        self.get(gvk).map(transform)
    }

    #[must_use]
    pub fn is_exists(&self, gvk: &GroupVersionKind) -> bool {
        self.store.read().contains_key(gvk)
    }
}

static DEFAULT_SET: OnceLock<ObjectSet> = OnceLock::new();

/// The process-wide instance set backing the free functions below.
pub fn default_object_set() -> &'static ObjectSet {
    DEFAULT_SET.get_or_init(ObjectSet::new)
}

/// Calls [`ObjectSet::add_objs`] on the process-wide set.
pub fn add_objs(objs: impl IntoIterator<Item = Box<dyn Object>>) {
    default_object_set().add_objs(objs);
}

/// Calls [`ObjectSet::get`] on the process-wide set.
#[must_use]
pub fn get_obj(gvk: &GroupVersionKind) -> Option<Box<dyn Object>> {
    default_object_set().get(gvk)
}

/// Calls [`ObjectSet::new_obj`] on the process-wide set.
pub fn new_obj(
    gvk: &GroupVersionKind,
    transform: impl FnOnce(Box<dyn Object>) -> Box<dyn Object>,
) -> Option<Box<dyn Object>> {
    default_object_set().new_obj(gvk, transform)
}

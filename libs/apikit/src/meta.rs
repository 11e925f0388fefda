//! Plain metadata carriers shared by registered resource types.
//!
//! These are data holders with getter/setter contracts only; nothing here is
//! algorithmic. Timestamps are unix seconds.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::schema::{GroupVersion, GroupVersionKind};

/// Kind and API version of a resource, as carried on the wire.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeMeta {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty", rename = "apiVersion")]
    pub api_version: String,
}

impl TypeMeta {
    #[must_use]
    pub fn from_gvk(gvk: &GroupVersionKind) -> Self {
        Self {
            kind: gvk.kind.clone(),
            api_version: gvk.group_version().api_version(),
        }
    }

    #[must_use]
    pub fn group_version_kind(&self) -> GroupVersionKind {
        GroupVersion::from_api_version(&self.api_version).with_kind(self.kind.clone())
    }
}

/// A reference to an owning resource.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerReference {
    #[serde(default, rename = "apiVersion")]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub uid: String,
}

/// Standard per-object metadata.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub resource_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub creation_timestamp: i64,
    #[serde(default)]
    pub update_timestamp: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub deletion_timestamp: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub generate_name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<OwnerReference>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero(v: &i64) -> bool {
    *v == 0
}

/// Getter/setter contract over [`ObjectMeta`], for callers that only hold a
/// resource through a trait object.
pub trait Meta {
    fn meta(&self) -> &ObjectMeta;
    fn meta_mut(&mut self) -> &mut ObjectMeta;

    fn name(&self) -> &str {
        &self.meta().name
    }
    fn set_name(&mut self, name: impl Into<String>)
    where
        Self: Sized,
    {
        self.meta_mut().name = name.into();
    }

    fn uid(&self) -> &str {
        &self.meta().uid
    }
    fn set_uid(&mut self, uid: impl Into<String>)
    where
        Self: Sized,
    {
        self.meta_mut().uid = uid.into();
    }

    fn namespace(&self) -> &str {
        &self.meta().namespace
    }
    fn set_namespace(&mut self, ns: impl Into<String>)
    where
        Self: Sized,
    {
        self.meta_mut().namespace = ns.into();
    }

    fn creation_timestamp(&self) -> i64 {
        self.meta().creation_timestamp
    }
    fn set_creation_timestamp(&mut self, t: i64) {
        self.meta_mut().creation_timestamp = t;
    }

    fn update_timestamp(&self) -> i64 {
        self.meta().update_timestamp
    }
    fn set_update_timestamp(&mut self, t: i64) {
        self.meta_mut().update_timestamp = t;
    }

    fn deletion_timestamp(&self) -> i64 {
        self.meta().deletion_timestamp
    }
    fn set_deletion_timestamp(&mut self, t: i64) {
        self.meta_mut().deletion_timestamp = t;
    }

    fn labels(&self) -> &BTreeMap<String, String> {
        &self.meta().labels
    }
    fn set_label(&mut self, key: impl Into<String>, value: impl Into<String>)
    where
        Self: Sized,
    {
        self.meta_mut().labels.insert(key.into(), value.into());
    }

    fn annotations(&self) -> &BTreeMap<String, String> {
        &self.meta().annotations
    }
    fn set_annotation(&mut self, key: impl Into<String>, value: impl Into<String>)
    where
        Self: Sized,
    {
        self.meta_mut().annotations.insert(key.into(), value.into());
    }

    fn references(&self) -> &[OwnerReference] {
        &self.meta().references
    }
    fn set_references(&mut self, refs: Vec<OwnerReference>) {
        self.meta_mut().references = refs;
    }
}

impl Meta for ObjectMeta {
    fn meta(&self) -> &ObjectMeta {
        self
    }
    fn meta_mut(&mut self) -> &mut ObjectMeta {
        self
    }
}

/// Pagination metadata for list responses.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMeta {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource_version: String,
    #[serde(default)]
    pub page: i32,
    #[serde(default)]
    pub size: i32,
    #[serde(default)]
    pub total: i64,
}

//! Persistence boundary: the contract a backing store implements per
//! registered type. No I/O lives in this crate; a concrete store obtains its
//! shape from the type registry and registers a factory here.

use std::collections::HashMap;
use std::sync::OnceLock;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::runtime::Object;
use crate::schema::GroupVersionKind;

/// CRUD and pagination over one resource type.
///
/// Implementations hydrate rows into the concrete shape they were created
/// for; callers hold results through the [`Object`] capability only.
#[async_trait]
pub trait Repo: Send + Sync {
    async fn create(&self, object: Box<dyn Object>) -> anyhow::Result<Box<dyn Object>>;

    async fn find_all(&self) -> anyhow::Result<Vec<Box<dyn Object>>>;

    async fn find_page(&self, page: i32, size: i32) -> anyhow::Result<Vec<Box<dyn Object>>>;

    async fn find_one(&self, uid: &str) -> anyhow::Result<Option<Box<dyn Object>>>;

    async fn count(&self) -> anyhow::Result<i64>;

    async fn update(&self, object: Box<dyn Object>) -> anyhow::Result<Box<dyn Object>>;

    /// `soft` marks the row deleted instead of removing it.
    async fn delete(&self, uid: &str, soft: bool) -> anyhow::Result<()>;
}

/// Builds a [`Repo`] for the given example instance.
pub type RepoCreator = Box<dyn Fn(&dyn Object) -> Box<dyn Repo> + Send + Sync>;

/// Registry of repo factories keyed by identity triple.
#[derive(Default)]
pub struct RepoSet {
    sets: RwLock<HashMap<GroupVersionKind, RepoCreator>>,
}

impl RepoSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `creator` to `gvk`, overwriting any prior binding.
    pub fn register_repo(&self, gvk: GroupVersionKind, creator: RepoCreator) {
        tracing::debug!(gvk = %gvk, "registered repo factory");
        self.sets.write().insert(gvk, creator);
    }

    /// Builds a repo for the instance's self-reported triple, or `None`
    /// when no factory is registered.
    #[must_use]
    pub fn new_repo(&self, object: &dyn Object) -> Option<Box<dyn Repo>> {
        let sets = self.sets.read();
        sets.get(&object.object_kind()).map(|creator| creator(object))
    }

    #[must_use]
    pub fn is_exists(&self, gvk: &GroupVersionKind) -> bool {
        self.sets.read().contains_key(gvk)
    }
}

static DEFAULT_REPO_SET: OnceLock<RepoSet> = OnceLock::new();

/// The process-wide repo set backing the free functions below.
pub fn default_repo_set() -> &'static RepoSet {
    DEFAULT_REPO_SET.get_or_init(RepoSet::new)
}

/// Calls [`RepoSet::register_repo`] on the process-wide set.
pub fn register_repo(gvk: GroupVersionKind, creator: RepoCreator) {
    default_repo_set().register_repo(gvk, creator);
}

/// Calls [`RepoSet::new_repo`] on the process-wide set.
#[must_use]
pub fn new_repo(object: &dyn Object) -> Option<Box<dyn Repo>> {
    default_repo_set().new_repo(object)
}

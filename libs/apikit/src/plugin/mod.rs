//! Declarative plugin registration and deferred initialization.
//!
//! Components declare a [`Registration`] during process startup: a
//! namespaced category, a unique id, the URIs of the plugins they require
//! (or the wildcard), and a deferred constructor. Once startup completes the
//! host asks the [`PluginRegistry`] for a dependency-respecting order and
//! initializes each registration in turn. Construction failures are captured
//! on the resulting [`Plugin`], never propagated out of `init`.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

mod registry;

pub use registry::{default_registry, graph, register, PluginRegistry};

/// The wildcard requirement: every other enabled registration.
pub const WILDCARD: &str = "*";

/// Namespaced plugin category, e.g. `io.app.service.v1`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PluginType(String);

impl PluginType {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.0 == WILDCARD
    }
}

impl fmt::Display for PluginType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PluginType {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("plugin: no type")]
    NoType,
    #[error("plugin: no id")]
    NoPluginId,
    #[error("plugin: id already registered: {0}")]
    IdRegistered(String),
    #[error("plugin: invalid requires")]
    InvalidRequires,
    /// Returned by an init function for a plugin that is configured not to
    /// load, as opposed to one that failed to load.
    #[error("skip plugin")]
    Skip,
    #[error("plugin not found: {0}")]
    NotFound(String),
    #[error("plugin already exists: {0}")]
    AlreadyExists(String),
}

/// Whether `err` marks a deliberately skipped plugin.
#[must_use]
pub fn is_skip(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<PluginError>(), Some(PluginError::Skip))
}

/// The opaque instance a plugin constructor produces.
pub type PluginInstance = Box<dyn Any + Send + Sync>;

type InitFn = Box<dyn Fn(&InitContext) -> anyhow::Result<PluginInstance> + Send + Sync>;

/// Everything a deferred constructor gets to see.
#[derive(Clone, Debug, Default)]
pub struct InitContext {
    pub config: Option<serde_json::Value>,
    pub properties: HashMap<String, String>,
}

impl InitContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(mut self, config: serde_json::Value) -> Self {
        self.config = Some(config);
        self
    }

    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// A declared component: category, id, requirements and a deferred
/// constructor. Registrations are append-only for the process lifetime;
/// only the `disabled` flag mutates after registration.
pub struct Registration {
    pub plugin_type: PluginType,
    pub id: String,
    pub config: Option<serde_json::Value>,
    /// URIs of required plugins, or exactly the single wildcard entry.
    pub requires: Vec<PluginType>,
    init: InitFn,
    disabled: AtomicBool,
}

impl Registration {
    pub fn new(
        plugin_type: impl Into<PluginType>,
        id: impl Into<String>,
        init: impl Fn(&InitContext) -> anyhow::Result<PluginInstance> + Send + Sync + 'static,
    ) -> Self {
        Self {
            plugin_type: plugin_type.into(),
            id: id.into(),
            config: None,
            requires: Vec::new(),
            init: Box::new(init),
            disabled: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: serde_json::Value) -> Self {
        self.config = Some(config);
        self
    }

    #[must_use]
    pub fn requires(mut self, requires: impl IntoIterator<Item = PluginType>) -> Self {
        self.requires = requires.into_iter().collect();
        self
    }

    #[must_use]
    pub fn disabled(self) -> Self {
        self.disable();
        self
    }

    /// The process-unique key `type.id`.
    #[must_use]
    pub fn uri(&self) -> String {
        format!("{}.{}", self.plugin_type, self.id)
    }

    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Acquire)
    }

    pub fn disable(&self) {
        self.disabled.store(true, Ordering::Release);
    }

    /// Invokes the deferred constructor. The outcome, success or failure,
    /// is carried on the returned [`Plugin`]; `init` itself never fails.
    #[must_use]
    pub fn init(self: &Arc<Self>, ctx: &InitContext) -> Plugin {
        let result = (self.init)(ctx);
        if let Err(err) = &result {
            tracing::debug!(plugin = %self.uri(), error = %err, "plugin init failed");
        }
        let (instance, err) = match result {
            Ok(instance) => (Some(instance), None),
            Err(err) => (None, Some(err)),
        };
        Plugin {
            registration: Arc::clone(self),
            config: ctx.config.clone(),
            properties: ctx.properties.clone(),
            instance,
            err,
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("plugin_type", &self.plugin_type)
            .field("id", &self.id)
            .field("config", &self.config)
            .field("requires", &self.requires)
            .field("disabled", &self.is_disabled())
            .finish_non_exhaustive()
    }
}

/// The outcome of initializing one registration.
pub struct Plugin {
    registration: Arc<Registration>,
    config: Option<serde_json::Value>,
    properties: HashMap<String, String>,
    instance: Option<PluginInstance>,
    err: Option<anyhow::Error>,
}

impl Plugin {
    #[must_use]
    pub fn registration(&self) -> &Registration {
        &self.registration
    }

    #[must_use]
    pub fn uri(&self) -> String {
        self.registration.uri()
    }

    #[must_use]
    pub fn config(&self) -> Option<&serde_json::Value> {
        self.config.as_ref()
    }

    #[must_use]
    pub fn properties(&self) -> &HashMap<String, String> {
        &self.properties
    }

    /// The constructed instance downcast to `T`, when init succeeded and the
    /// constructor produced a `T`.
    #[must_use]
    pub fn instance<T: 'static>(&self) -> Option<&T> {
        self.instance.as_ref()?.downcast_ref()
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.err.is_none()
    }

    /// The captured construction error, if any. The host decides per plugin
    /// whether a failure aborts startup or degrades.
    #[must_use]
    pub fn err(&self) -> Option<&anyhow::Error> {
        self.err.as_ref()
    }

    /// Whether this plugin declined to load via [`PluginError::Skip`].
    #[must_use]
    pub fn is_skip(&self) -> bool {
        self.err.as_ref().is_some_and(is_skip)
    }
}

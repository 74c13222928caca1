//! The [`Module`] trait: a named unit of bot functionality with a
//! start/end lifecycle.

use std::any::Any;
use std::sync::{Arc, Weak};

use async_trait::async_trait;

use crate::manager::ModuleManager;

/// A named, independently startable unit of functionality.
///
/// Modules are registered with a [`ModuleManager`], which calls
/// [`start`](Module::start) once at registration and [`end`](Module::end)
/// when the module is unregistered or the manager is disabled. Names are
/// unique within a manager, compared case-insensitively.
///
/// # Example
///
/// ```rust,ignore
/// struct Music;
///
/// #[async_trait]
/// impl Module for Music {
///     fn name(&self) -> &str { "Music" }
///
///     async fn start(&self, _ctx: ModuleContext) -> anyhow::Result<()> {
///         Ok(())
///     }
///
///     fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
///         self
///     }
/// }
/// ```
#[async_trait]
pub trait Module: Send + Sync + 'static {
    /// Returns the module name.
    fn name(&self) -> &str;

    /// Called once when the module is registered.
    ///
    /// Returning an error aborts the registration; the module is never
    /// committed to the registry.
    async fn start(&self, ctx: ModuleContext) -> anyhow::Result<()>;

    /// Called when the module is unregistered or the manager is disabled.
    async fn end(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Upcasts to `Any` so [`ModuleManager::require_as`] can downcast.
    ///
    /// Implementors should simply return `self`.
    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// A shared module.
pub type BoxedModule = Arc<dyn Module>;

/// Handed to [`Module::start`]; lets a module reach its siblings.
#[derive(Clone)]
pub struct ModuleContext {
    manager: Weak<ModuleManager>,
    name: String,
}

impl ModuleContext {
    pub(crate) fn new(manager: Weak<ModuleManager>, name: impl Into<String>) -> Self {
        Self {
            manager,
            name: name.into(),
        }
    }

    /// The name the module was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The owning manager, if it is still alive.
    pub fn manager(&self) -> Option<Arc<ModuleManager>> {
        self.manager.upgrade()
    }

    /// Looks up a sibling module by case-insensitive name.
    pub fn require(&self, name: &str) -> Option<BoxedModule> {
        self.manager()?.require(name)
    }

    /// Looks up a sibling module and downcasts it to `T`.
    pub fn require_as<T: Module>(&self, name: &str) -> Option<Arc<T>> {
        self.manager()?.require_as::<T>(name)
    }
}

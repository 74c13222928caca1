//! Module lifecycle management.
//!
//! [`ModuleManager`] owns every registered [`Module`]. It:
//!
//! - Enforces case-insensitive unique names.
//! - Starts each module at registration and commits it to the registry only
//!   once `start` succeeds. A failing start leaves the registry untouched.
//! - Ends modules on unregister and on [`disable`](ModuleManager::disable),
//!   isolating failures so one broken `end` never blocks the others.
//!
//! ```text
//! register_module() ──► reserve name ──► start() ──ok──► committed
//!                                           └──err──► released, StartFailed
//! ```

use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Weak};

use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::error::{RegistrationError, RegistrationResult, panic_to_error};
use crate::module::{BoxedModule, Module, ModuleContext};

struct ModuleEntry {
    key: String,
    module: BoxedModule,
}

/// Holds a name while its module is starting; releases it on drop.
struct Reservation<'a> {
    pending: &'a Mutex<HashSet<String>>,
    key: String,
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        self.pending.lock().remove(&self.key);
    }
}

/// Registry and lifecycle driver for [`Module`]s.
///
/// Always lives behind an `Arc` so modules can hold a weak back-reference
/// through their [`ModuleContext`].
pub struct ModuleManager {
    me: Weak<ModuleManager>,
    modules: RwLock<Vec<ModuleEntry>>,
    pending: Mutex<HashSet<String>>,
}

impl ModuleManager {
    /// Creates an empty manager.
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            modules: RwLock::new(Vec::new()),
            pending: Mutex::new(HashSet::new()),
        })
    }

    /// Registers and starts `module`.
    ///
    /// # Errors
    ///
    /// - [`RegistrationError::DuplicateModule`] if the name is taken
    ///   (case-insensitively), including by a module that is still starting.
    /// - [`RegistrationError::StartFailed`] if `start` returns an error.
    pub async fn register_module(&self, module: BoxedModule) -> RegistrationResult<()> {
        let name = module.name().to_string();
        let key = name.to_lowercase();
        let _reservation = self.reserve(key.clone(), &name)?;

        let ctx = ModuleContext::new(self.me.clone(), &name);
        let span = info_span!("module", name = %name);
        if let Err(e) = module.start(ctx).instrument(span).await {
            warn!(module = %name, error = %e, "Module failed to start, registration rolled back");
            return Err(RegistrationError::start_failed(name, e));
        }

        self.modules.write().push(ModuleEntry { key, module });
        info!(module = %name, "Module registered");
        Ok(())
    }

    /// Ends and removes `module`, matched by identity or by name.
    pub async fn unregister_module(&self, module: &BoxedModule) -> RegistrationResult<()> {
        let key = module.name().to_lowercase();
        let found = self
            .modules
            .read()
            .iter()
            .find(|e| Arc::ptr_eq(&e.module, module) || e.key == key)
            .map(|e| e.module.clone());
        self.remove(found, module.name()).await
    }

    /// Ends and removes the module named `name` (case-insensitive).
    pub async fn unregister_by_name(&self, name: &str) -> RegistrationResult<()> {
        let found = self.require(name);
        self.remove(found, name).await
    }

    /// Looks up a module by case-insensitive name.
    pub fn require(&self, name: &str) -> Option<BoxedModule> {
        let key = name.to_lowercase();
        self.modules
            .read()
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.module.clone())
    }

    /// Looks up a module and downcasts it to its concrete type.
    ///
    /// Returns `None` if no module has that name or it is not a `T`.
    pub fn require_as<T: Module>(&self, name: &str) -> Option<Arc<T>> {
        self.require(name)?.as_any().downcast::<T>().ok()
    }

    /// Names of all registered modules, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.modules
            .read()
            .iter()
            .map(|e| e.module.name().to_string())
            .collect()
    }

    /// Number of registered modules.
    pub fn len(&self) -> usize {
        self.modules.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reports how many modules are loaded.
    ///
    /// Modules are started at registration, so this only logs.
    pub fn init(&self) {
        let count = self.len();
        info!(count, "Loaded & enabled {count} module(s)");
    }

    /// Ends every module and clears the registry.
    ///
    /// A module whose `end` fails or panics is logged and skipped; the rest
    /// are still ended and the registry is always cleared.
    pub async fn disable(&self) {
        let modules: Vec<BoxedModule> = self
            .modules
            .read()
            .iter()
            .map(|e| e.module.clone())
            .collect();

        for module in &modules {
            end_isolated(module).await;
        }

        self.modules.write().clear();
        info!(count = modules.len(), "Disabled all modules");
    }

    fn reserve(&self, key: String, name: &str) -> RegistrationResult<Reservation<'_>> {
        let mut pending = self.pending.lock();
        let taken = pending.contains(&key) || self.modules.read().iter().any(|e| e.key == key);
        if taken {
            return Err(RegistrationError::DuplicateModule {
                name: name.to_string(),
            });
        }
        pending.insert(key.clone());
        Ok(Reservation {
            pending: &self.pending,
            key,
        })
    }

    async fn remove(&self, found: Option<BoxedModule>, name: &str) -> RegistrationResult<()> {
        let Some(module) = found else {
            return Err(RegistrationError::not_registered(name));
        };

        end_isolated(&module).await;
        self.modules.write().retain(|e| !Arc::ptr_eq(&e.module, &module));
        info!(module = %module.name(), "Module unregistered");
        Ok(())
    }
}

async fn end_isolated(module: &BoxedModule) {
    let name = module.name().to_string();
    let span = info_span!("module", name = %name);
    match AssertUnwindSafe(module.end().instrument(span))
        .catch_unwind()
        .await
    {
        Ok(Ok(())) => debug!(module = %name, "Module ended"),
        Ok(Err(e)) => error!(module = %name, error = %e, "Module failed to end cleanly"),
        Err(panic) => {
            let e = panic_to_error(panic);
            error!(module = %name, error = %e, "Module panicked while ending");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::any::Any;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Probe {
        name: String,
        fail_start: bool,
        fail_end: bool,
        panic_end: bool,
        ends: AtomicUsize,
    }

    impl Probe {
        fn named(name: &str) -> Self {
            Self {
                name: name.to_string(),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl Module for Probe {
        fn name(&self) -> &str {
            &self.name
        }

        async fn start(&self, _ctx: ModuleContext) -> anyhow::Result<()> {
            if self.fail_start {
                anyhow::bail!("cannot start");
            }
            Ok(())
        }

        async fn end(&self) -> anyhow::Result<()> {
            self.ends.fetch_add(1, Ordering::SeqCst);
            if self.panic_end {
                panic!("end exploded");
            }
            if self.fail_end {
                anyhow::bail!("cannot end");
            }
            Ok(())
        }

        fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
            self
        }
    }

    #[tokio::test]
    async fn test_duplicate_names_differing_in_case_rejected() {
        let manager = ModuleManager::new();
        manager
            .register_module(Arc::new(Probe::named("Music")))
            .await
            .unwrap();

        let err = manager
            .register_module(Arc::new(Probe::named("music")))
            .await
            .unwrap_err();

        assert!(matches!(err, RegistrationError::DuplicateModule { .. }));
        assert_eq!(manager.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_start_is_not_committed() {
        let manager = ModuleManager::new();
        let probe = Probe {
            fail_start: true,
            ..Probe::named("Broken")
        };

        let err = manager.register_module(Arc::new(probe)).await.unwrap_err();
        assert!(matches!(err, RegistrationError::StartFailed { .. }));
        assert!(manager.require("broken").is_none());

        // The name is released again.
        manager
            .register_module(Arc::new(Probe::named("Broken")))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_require_is_case_insensitive_and_downcasts() {
        let manager = ModuleManager::new();
        manager
            .register_module(Arc::new(Probe::named("Stats")))
            .await
            .unwrap();

        assert!(manager.require("STATS").is_some());
        assert!(manager.require("missing").is_none());
        let probe = manager.require_as::<Probe>("stats").unwrap();
        assert_eq!(probe.name, "Stats");
    }

    #[tokio::test]
    async fn test_unregister_by_identity_and_name() {
        let manager = ModuleManager::new();
        let probe: BoxedModule = Arc::new(Probe::named("A"));
        manager.register_module(probe.clone()).await.unwrap();
        manager
            .register_module(Arc::new(Probe::named("B")))
            .await
            .unwrap();

        manager.unregister_module(&probe).await.unwrap();
        manager.unregister_by_name("b").await.unwrap();
        assert!(manager.is_empty());

        let err = manager.unregister_by_name("a").await.unwrap_err();
        assert!(matches!(err, RegistrationError::NotRegistered { .. }));
    }

    #[tokio::test]
    async fn test_disable_isolates_failures_and_clears() {
        let manager = ModuleManager::new();
        let failing = Arc::new(Probe {
            fail_end: true,
            ..Probe::named("Failing")
        });
        let panicking = Arc::new(Probe {
            panic_end: true,
            ..Probe::named("Panicking")
        });
        let healthy = Arc::new(Probe::named("Healthy"));

        manager.register_module(failing.clone()).await.unwrap();
        manager.register_module(panicking.clone()).await.unwrap();
        manager.register_module(healthy.clone()).await.unwrap();
        manager.init();

        manager.disable().await;

        assert_eq!(failing.ends.load(Ordering::SeqCst), 1);
        assert_eq!(panicking.ends.load(Ordering::SeqCst), 1);
        assert_eq!(healthy.ends.load(Ordering::SeqCst), 1);
        assert!(manager.is_empty());
    }

    #[tokio::test]
    async fn test_context_reaches_siblings() {
        struct Dependent;

        #[async_trait]
        impl Module for Dependent {
            fn name(&self) -> &str {
                "Dependent"
            }

            async fn start(&self, ctx: ModuleContext) -> anyhow::Result<()> {
                ctx.require_as::<Probe>("base")
                    .map(|_| ())
                    .ok_or_else(|| anyhow::anyhow!("base module missing"))
            }

            fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
                self
            }
        }

        let manager = ModuleManager::new();
        assert!(manager.register_module(Arc::new(Dependent)).await.is_err());

        manager
            .register_module(Arc::new(Probe::named("Base")))
            .await
            .unwrap();
        manager.register_module(Arc::new(Dependent)).await.unwrap();
        assert_eq!(manager.names(), vec!["Base", "Dependent"]);
    }
}

//! Sub-commands hosted by a [`MultiCommand`](super::MultiCommand).

use std::sync::Arc;

use async_trait::async_trait;
use ivy_core::Permission;

use super::{CommandReturn, CommandServices, Invocation};

/// Metadata for a component.
///
/// `permission` is declarative: the hosting multi-command only enforces its
/// own permission before delegating.
#[derive(Debug, Clone)]
pub struct ComponentSpec {
    /// Component name; the first argument selects it case-insensitively.
    pub name: String,
    /// Usage text. A leading occurrence of the name is stripped in listings.
    pub help: String,
    /// Permission recorded for this component.
    pub permission: Permission,
}

impl ComponentSpec {
    pub fn new(name: impl Into<String>, help: impl Into<String>, permission: impl Into<Permission>) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            permission: permission.into(),
        }
    }

    /// Usage text with the component name removed.
    ///
    /// Returns the text after the first occurrence of the name, trimmed, or
    /// the whole help text when the name does not occur in it.
    pub fn usage(&self) -> &str {
        if self.help == self.name {
            return "";
        }
        match self.help.split_once(self.name.as_str()) {
            Some((_, rest)) => rest.trim(),
            None => self.help.trim(),
        }
    }
}

/// A sub-command operating on a shared manager `M`.
///
/// `M` is typically the module that owns the state the components act on.
#[async_trait]
pub trait CommandComponent<M>: Send + Sync + 'static
where
    M: Send + Sync + 'static,
{
    fn spec(&self) -> &ComponentSpec;

    /// Called once when the hosting command is registered.
    async fn start(&self, _manager: &Arc<M>, _services: &Arc<CommandServices>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs the component. `inv.args` excludes the component name.
    async fn execute(&self, manager: &Arc<M>, inv: Invocation) -> anyhow::Result<CommandReturn>;
}

/// A component bound to its manager, with the manager type erased.
///
/// This is what [`CommandKind::Multi`](super::CommandKind::Multi) hands to
/// the registrar.
#[async_trait]
pub trait ComponentHandle: Send + Sync {
    fn spec(&self) -> &ComponentSpec;

    async fn start(&self, services: &Arc<CommandServices>) -> anyhow::Result<()>;
}

pub(crate) struct BoundComponent<M: Send + Sync + 'static> {
    pub(crate) component: Arc<dyn CommandComponent<M>>,
    pub(crate) manager: Arc<M>,
}

#[async_trait]
impl<M> ComponentHandle for BoundComponent<M>
where
    M: Send + Sync + 'static,
{
    fn spec(&self) -> &ComponentSpec {
        self.component.spec()
    }

    async fn start(&self, services: &Arc<CommandServices>) -> anyhow::Result<()> {
        self.component.start(&self.manager, services).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_strips_name() {
        let spec = ComponentSpec::new("add", "add <url>", Permission::SuperPerms);
        assert_eq!(spec.usage(), "<url>");
    }

    #[test]
    fn test_usage_when_help_is_name() {
        let spec = ComponentSpec::new("skip", "skip", Permission::SuperPerms);
        assert_eq!(spec.usage(), "");
    }

    #[test]
    fn test_usage_without_name_keeps_help() {
        let spec = ComponentSpec::new("clear", "empties the queue", Permission::SuperPerms);
        assert_eq!(spec.usage(), "empties the queue");
    }
}

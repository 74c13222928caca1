//! Commands that delegate to named sub-commands.

use std::sync::Arc;

use async_trait::async_trait;
use ivy_core::EmbedField;
use tracing::debug;

use super::component::BoundComponent;
use super::{
    Command, CommandComponent, CommandKind, CommandReturn, CommandSpec, ComponentHandle,
    ComponentSpec, Invocation, respond,
};

/// Title of the generated component listing in the help embed.
pub const COMMAND_LIST_FIELD: &str = "Command List";

/// A command whose first argument selects a [`CommandComponent`].
///
/// ```text
/// .queue add <url>
///   │     │    └── forwarded to the component
///   │     └─────── component name (case-insensitive)
///   └───────────── multi-command
/// ```
///
/// An unknown or missing component name yields [`CommandReturn::HelpMenu`].
/// The help embed lists every component registered through the builder.
pub struct MultiCommand<M: Send + Sync + 'static> {
    spec: CommandSpec,
    manager: Arc<M>,
    components: Vec<Arc<dyn CommandComponent<M>>>,
}

/// Collects components, then generates help in [`build`](Self::build).
pub struct MultiCommandBuilder<M: Send + Sync + 'static> {
    spec: CommandSpec,
    manager: Arc<M>,
    components: Vec<Arc<dyn CommandComponent<M>>>,
}

impl<M: Send + Sync + 'static> MultiCommand<M> {
    /// Starts building a multi-command operating on `manager`.
    pub fn builder(spec: CommandSpec, manager: Arc<M>) -> MultiCommandBuilder<M> {
        MultiCommandBuilder {
            spec,
            manager,
            components: Vec::new(),
        }
    }

    /// Finds a component by case-insensitive name.
    pub fn component(&self, name: &str) -> Option<&Arc<dyn CommandComponent<M>>> {
        let name = name.to_lowercase();
        self.components
            .iter()
            .find(|c| c.spec().name.to_lowercase() == name)
    }

    /// Metadata of every component, in registration order.
    pub fn components(&self) -> Vec<&ComponentSpec> {
        self.components.iter().map(|c| c.spec()).collect()
    }

    pub fn manager(&self) -> &Arc<M> {
        &self.manager
    }
}

impl<M: Send + Sync + 'static> MultiCommandBuilder<M> {
    /// Adds a component. A component with the same name is replaced in place.
    pub fn register(mut self, component: impl CommandComponent<M>) -> Self {
        self.insert(Arc::new(component));
        self
    }

    /// Adds several shared components.
    pub fn register_all(mut self, components: impl IntoIterator<Item = Arc<dyn CommandComponent<M>>>) -> Self {
        for component in components {
            self.insert(component);
        }
        self
    }

    /// Finishes the command, prepending the component listing to its help
    /// fields.
    pub fn build(mut self) -> MultiCommand<M> {
        let listing = self
            .components
            .iter()
            .map(|c| {
                let spec = c.spec();
                match spec.usage() {
                    "" => format!("**.{} {}**", self.spec.name, spec.name),
                    usage => format!("**.{} {}** {}", self.spec.name, spec.name, usage),
                }
            })
            .collect::<Vec<_>>()
            .join("\n");

        self.spec
            .help_fields
            .insert(0, EmbedField::new(COMMAND_LIST_FIELD, listing.trim(), false));

        MultiCommand {
            spec: self.spec,
            manager: self.manager,
            components: self.components,
        }
    }

    fn insert(&mut self, component: Arc<dyn CommandComponent<M>>) {
        let key = component.spec().name.to_lowercase();
        match self
            .components
            .iter_mut()
            .find(|c| c.spec().name.to_lowercase() == key)
        {
            Some(slot) => *slot = component,
            None => self.components.push(component),
        }
    }
}

#[async_trait]
impl<M: Send + Sync + 'static> Command for MultiCommand<M> {
    fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    fn kind(&self) -> CommandKind {
        CommandKind::Multi(
            self.components
                .iter()
                .map(|component| {
                    Arc::new(BoundComponent {
                        component: component.clone(),
                        manager: self.manager.clone(),
                    }) as Arc<dyn ComponentHandle>
                })
                .collect(),
        )
    }

    async fn execute(&self, inv: Invocation) -> anyhow::Result<CommandReturn> {
        let Some(component) = inv.args.first().and_then(|token| self.component(token)).cloned() else {
            return Ok(CommandReturn::HelpMenu);
        };

        let services = inv.services().clone();
        if !services.gate().authorize(inv.message.as_ref(), &self.spec).await {
            let reply = services
                .messages()
                .permission(&inv.user, inv.message.as_ref(), &self.spec);
            respond(inv.message.as_ref(), reply).await;
            return Ok(CommandReturn::Exit);
        }

        debug!(command = %self.spec.name, component = %component.spec().name, "Delegating to component");
        component.execute(&self.manager, inv.shift()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::PermissionGate;
    use crate::messages::DefaultCommandMessages;
    use crate::command::CommandServices;
    use ivy_core::mock::{MockMessage, MockOracle};
    use ivy_core::{EmbedBuilder, Permission, User, UserId};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Playlist {
        calls: Mutex<Vec<(String, Vec<String>)>>,
    }

    struct Recorder(ComponentSpec);

    #[async_trait]
    impl CommandComponent<Playlist> for Recorder {
        fn spec(&self) -> &ComponentSpec {
            &self.0
        }

        async fn execute(&self, manager: &Arc<Playlist>, inv: Invocation) -> anyhow::Result<CommandReturn> {
            manager.calls.lock().push((self.0.name.clone(), inv.args.clone()));
            Ok(CommandReturn::Exit)
        }
    }

    fn recorder(name: &str, help: &str) -> Recorder {
        Recorder(ComponentSpec::new(name, help, Permission::named("ADMINISTRATOR")))
    }

    fn services(supers: &[&str]) -> Arc<CommandServices> {
        Arc::new(CommandServices::new(
            PermissionGate::new(Arc::new(MockOracle::new()), supers.iter().map(|s| UserId::new(*s))),
            EmbedBuilder::default(),
            Arc::new(DefaultCommandMessages::default()),
        ))
    }

    fn queue(playlist: Arc<Playlist>) -> MultiCommand<Playlist> {
        MultiCommand::builder(CommandSpec::new("queue", Permission::SuperPerms), playlist)
            .register(recorder("add", "add <url>"))
            .register(recorder("skip", "skip"))
            .build()
    }

    fn invocation(args: &[&str], author: &str, services: Arc<CommandServices>) -> (Arc<MockMessage>, Invocation) {
        let message = MockMessage::new(".queue", User::new(author, author), "g").shared();
        let inv = Invocation::new(
            message.clone(),
            "queue",
            args.iter().map(|s| s.to_string()).collect(),
            services,
        );
        (message, inv)
    }

    #[tokio::test]
    async fn test_unknown_component_yields_help_menu() {
        let playlist = Arc::new(Playlist::default());
        let command = queue(playlist.clone());

        let (_, inv) = invocation(&["shuffle"], "root", services(&["root"]));
        assert_eq!(command.execute(inv).await.unwrap(), CommandReturn::HelpMenu);

        let (_, inv) = invocation(&[], "root", services(&["root"]));
        assert_eq!(command.execute(inv).await.unwrap(), CommandReturn::HelpMenu);

        assert!(playlist.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_known_component_receives_remaining_args() {
        let playlist = Arc::new(Playlist::default());
        let command = queue(playlist.clone());

        let (_, inv) = invocation(&["ADD", "song", "now"], "root", services(&["root"]));
        assert_eq!(command.execute(inv).await.unwrap(), CommandReturn::Exit);

        let calls = playlist.calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "add");
        assert_eq!(calls[0].1, vec!["song", "now"]);
    }

    #[tokio::test]
    async fn test_component_permission_is_metadata_only() {
        let playlist = Arc::new(Playlist::default());
        let command = MultiCommand::builder(
            CommandSpec::new("queue", Permission::SuperPerms).permit_user("alice"),
            playlist.clone(),
        )
        .register(recorder("add", "add <url>"))
        .build();

        let spec = command.component("add").unwrap().spec();
        assert_eq!(spec.permission, Permission::named("ADMINISTRATOR"));

        // alice passes the base gate through the user allow-list and reaches
        // the component even though no oracle grants ADMINISTRATOR.
        let (_, inv) = invocation(&["add", "x"], "alice", services(&[]));
        command.execute(inv).await.unwrap();
        assert_eq!(playlist.calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_base_permission_rechecked() {
        let playlist = Arc::new(Playlist::default());
        let command = queue(playlist.clone());

        let (message, inv) = invocation(&["add", "x"], "mallory", services(&[]));
        assert_eq!(command.execute(inv).await.unwrap(), CommandReturn::Exit);
        assert!(playlist.calls.lock().is_empty());
        assert!(message.transcript().contains("Whoops"));
    }

    #[test]
    fn test_help_listing_prepended() {
        let command = MultiCommand::builder(
            CommandSpec::new("queue", Permission::SuperPerms).help_field("Tip", "try it", false),
            Arc::new(Playlist::default()),
        )
        .register(recorder("add", "add <url>"))
        .register(recorder("skip", "skip"))
        .build();

        let fields = &command.spec().help_fields;
        assert_eq!(fields[0].name, COMMAND_LIST_FIELD);
        assert_eq!(fields[0].value, "**.queue add** <url>\n**.queue skip**");
        assert_eq!(fields[1].name, "Tip");
    }

    #[test]
    fn test_duplicate_component_overwrites_in_place() {
        let command = MultiCommand::builder(
            CommandSpec::new("queue", Permission::SuperPerms),
            Arc::new(Playlist::default()),
        )
        .register(recorder("add", "add <url>"))
        .register(recorder("skip", "skip"))
        .register(recorder("Add", "Add <file>"))
        .build();

        let names: Vec<_> = command.components().iter().map(|c| c.name.clone()).collect();
        assert_eq!(names, vec!["Add", "skip"]);
        assert!(matches!(command.kind(), CommandKind::Multi(handles) if handles.len() == 2));
    }
}

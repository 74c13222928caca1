//! Diagnostic routines dispatched like commands.
//!
//! A flow reports one of three outcomes into the invoking channel:
//!
//! | `run` result               | report                                   |
//! |----------------------------|------------------------------------------|
//! | `Ok(Passed(payload))`      | ✅ finished, plus the payload as JSON     |
//! | `Ok(Failed(error))`        | ⚠️ finished with an error, plus its chain |
//! | `Err(error)` or a panic    | ❌ exception, plus its chain              |
//!
//! A flow never asks for the help menu.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::FutureExt;
use ivy_core::format::{code_block, emboss, time_diff};
use ivy_core::{BoxedMessage, Permission, User};
use serde_json::Value;
use tracing::{debug, warn};

use super::{CommandReturn, CommandSpec, Invocation, announce};
use crate::error::panic_to_error;

/// What a flow produced.
#[derive(Debug)]
pub enum FlowOutput {
    /// The flow completed, optionally with a payload to display.
    Passed(Option<Value>),
    /// The flow completed but reports an error.
    Failed(anyhow::Error),
}

impl FlowOutput {
    pub fn passed() -> Self {
        Self::Passed(None)
    }

    /// Passes with `payload` rendered as JSON.
    pub fn with_payload(payload: impl serde::Serialize) -> Self {
        match serde_json::to_value(payload) {
            Ok(value) => Self::Passed(Some(value)),
            Err(e) => Self::Failed(e.into()),
        }
    }
}

/// A self-contained diagnostic routine.
#[async_trait]
pub trait TestFlow: Send + Sync + 'static {
    fn name(&self) -> &str;

    async fn run(&self, user: &User, message: &BoxedMessage) -> anyhow::Result<FlowOutput>;
}

/// A diagnostic routine bound to the module it exercises.
#[async_trait]
pub trait GenericTestFlow<M>: Send + Sync + 'static
where
    M: Send + Sync + 'static,
{
    fn name(&self) -> &str;

    async fn run(&self, module: &Arc<M>, user: &User, message: &BoxedMessage) -> anyhow::Result<FlowOutput>;
}

struct BoundFlow<M: Send + Sync + 'static, F> {
    flow: F,
    module: Arc<M>,
}

#[async_trait]
impl<M, F> TestFlow for BoundFlow<M, F>
where
    M: Send + Sync + 'static,
    F: GenericTestFlow<M>,
{
    fn name(&self) -> &str {
        self.flow.name()
    }

    async fn run(&self, user: &User, message: &BoxedMessage) -> anyhow::Result<FlowOutput> {
        self.flow.run(&self.module, user, message).await
    }
}

/// Wraps a [`TestFlow`] so the command manager can dispatch it.
///
/// Flows require super permissions.
pub struct FlowCommand {
    spec: CommandSpec,
    flow: Arc<dyn TestFlow>,
}

impl FlowCommand {
    pub fn new(flow: impl TestFlow) -> Self {
        let spec = CommandSpec::new(flow.name(), Permission::SuperPerms).hidden();
        Self {
            spec,
            flow: Arc::new(flow),
        }
    }

    /// Wraps a flow bound to `module`.
    pub fn managed<M, F>(flow: F, module: Arc<M>) -> Self
    where
        M: Send + Sync + 'static,
        F: GenericTestFlow<M>,
    {
        Self::new(BoundFlow { flow, module })
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }
}

#[async_trait]
impl super::Command for FlowCommand {
    fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    async fn execute(&self, inv: Invocation) -> anyhow::Result<CommandReturn> {
        let name = emboss(&self.spec.name);
        let message = inv.message.as_ref();
        announce(message, format!("Executing test flow {name}..").into()).await;

        let start = Instant::now();
        let outcome = AssertUnwindSafe(self.flow.run(&inv.user, &inv.message))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(panic_to_error(panic)));
        let elapsed = emboss(format!("{}ms", time_diff(start)));

        match outcome {
            Ok(FlowOutput::Passed(payload)) => {
                debug!(flow = %self.spec.name, "Test flow passed");
                let mut report = format!(":white_check_mark: Test flow {name} finished in {elapsed}.");
                if let Some(payload) = payload.filter(|v| !v.is_null()) {
                    let rendered = serde_json::to_string_pretty(&payload)?;
                    report.push('\n');
                    report.push_str(&code_block("json", rendered));
                }
                announce(message, report.into()).await;
            }
            Ok(FlowOutput::Failed(error)) => {
                warn!(flow = %self.spec.name, error = %error, "Test flow finished with an error");
                let report = format!(
                    ":warning: Test flow {name} finished with an error in {elapsed}.\n{}",
                    code_block("", format!("{error:?}"))
                );
                announce(message, report.into()).await;
            }
            Err(error) => {
                warn!(flow = %self.spec.name, error = %error, "Test flow raised an exception");
                announce(
                    message,
                    format!(":x: Encountered an exception while executing test flow {name}..").into(),
                )
                .await;
                announce(
                    message,
                    format!(":x: Stack Trace:\n{}", code_block("", format!("{error:?}"))).into(),
                )
                .await;
            }
        }

        Ok(CommandReturn::Exit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Command, CommandServices, PermissionGate};
    use crate::messages::DefaultCommandMessages;
    use ivy_core::EmbedBuilder;
    use ivy_core::mock::{MockMessage, MockOracle};
    use serde_json::json;

    enum Behaviour {
        Pass(Option<Value>),
        Soft,
        Hard,
        Panic,
    }

    struct Probe(Behaviour);

    #[async_trait]
    impl TestFlow for Probe {
        fn name(&self) -> &str {
            "probe"
        }

        async fn run(&self, _user: &User, _message: &BoxedMessage) -> anyhow::Result<FlowOutput> {
            match &self.0 {
                Behaviour::Pass(payload) => Ok(FlowOutput::Passed(payload.clone())),
                Behaviour::Soft => Ok(FlowOutput::Failed(anyhow::anyhow!("soft failure"))),
                Behaviour::Hard => Err(anyhow::anyhow!("hard failure")),
                Behaviour::Panic => panic!("flow exploded"),
            }
        }
    }

    async fn run(behaviour: Behaviour) -> (CommandReturn, String) {
        let message = MockMessage::new(".probe", User::new("1", "root"), "g").shared();
        let services = Arc::new(CommandServices::new(
            PermissionGate::new(Arc::new(MockOracle::new()), []),
            EmbedBuilder::default(),
            Arc::new(DefaultCommandMessages::default()),
        ));
        let inv = Invocation::new(message.clone(), "probe", vec![], services);
        let result = FlowCommand::new(Probe(behaviour)).execute(inv).await.unwrap();
        (result, message.transcript())
    }

    #[tokio::test]
    async fn test_passed_with_payload() {
        let (result, transcript) = run(Behaviour::Pass(Some(json!({ "songs": 3 })))).await;
        assert_eq!(result, CommandReturn::Exit);
        assert!(transcript.starts_with("Executing test flow ``probe``.."));
        assert!(transcript.contains(":white_check_mark: Test flow ``probe`` finished in ``"));
        assert!(transcript.contains("```json\n{\n  \"songs\": 3\n}```"));
    }

    #[tokio::test]
    async fn test_passed_without_payload() {
        let (_, transcript) = run(Behaviour::Pass(None)).await;
        assert!(transcript.contains(":white_check_mark:"));
        assert!(!transcript.contains("```json"));
    }

    #[tokio::test]
    async fn test_soft_failure() {
        let (result, transcript) = run(Behaviour::Soft).await;
        assert_eq!(result, CommandReturn::Exit);
        assert!(transcript.contains(":warning: Test flow ``probe`` finished with an error in"));
        assert!(transcript.contains("soft failure"));
    }

    #[tokio::test]
    async fn test_hard_failure_and_panic() {
        for behaviour in [Behaviour::Hard, Behaviour::Panic] {
            let (result, transcript) = run(behaviour).await;
            assert_eq!(result, CommandReturn::Exit);
            assert!(transcript.contains(":x: Encountered an exception while executing test flow ``probe``.."));
            assert!(transcript.contains(":x: Stack Trace:"));
        }
    }

    #[test]
    fn test_flow_spec() {
        let command = FlowCommand::new(Probe(Behaviour::Soft));
        assert_eq!(command.name(), "probe");
        assert!(command.spec().permission.is_super());
        assert!(command.spec().hide_from_help);
    }
}

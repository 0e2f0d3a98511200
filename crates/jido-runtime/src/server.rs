//! Agent Server — the long-lived task owning one agent's state, intake,
//! directive queue, drain loop, and hierarchy (spec §4.2).

use crate::module::{build_router, AgentModule};
use crate::router::Router;
use jido_core::{
    lifecycle, Agent, AgentHandle, AgentOptions, CustomErrorHandler, Directive, DirectiveOutcome,
    Error, ErrorHandlerOutcome, ErrorPolicy, InstanceHandle, OnParentDeath, ParentRef, Result,
    Signal, TraceContext,
};
use jido_directives::{ExecutionContext, ExecutorRegistry};
use jido_strategy::{Instruction, Strategy, StrategyContext};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Internal-only lifecycle signal a terminating parent casts to each of its
/// children. Not part of the public reserved-signal-type surface (spec §6
/// lists the user-observable lifecycle types); this is the in-process
/// equivalent of an OS-level process monitor `DOWN` message, since a plain
/// tokio task has no such primitive of its own.
const PARENT_EXITED: &str = "jido.internal.parent_exited";

#[derive(Clone)]
struct ChildEntry {
    id: String,
    meta: Value,
}

enum Command {
    Cast(Signal),
    Call(Signal, oneshot::Sender<Result<Agent>>),
    State(oneshot::Sender<Agent>),
    Status(oneshot::Sender<Value>),
    Stop(String),
}

/// A live reference to a running `AgentServer` task, implementing the core
/// `AgentHandle` trait so directive executors and other agents can reach it
/// without depending on this crate.
pub struct AgentServerHandle {
    id: String,
    tx: mpsc::Sender<Command>,
}

#[async_trait::async_trait]
impl AgentHandle for AgentServerHandle {
    fn id(&self) -> &str {
        &self.id
    }

    async fn cast(&self, signal: Signal) -> Result<()> {
        self.tx
            .send(Command::Cast(signal))
            .await
            .map_err(|_| Error::not_found(self.id.clone()))
    }

    async fn call(&self, signal: Signal, timeout_ms: u64) -> Result<Agent> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Command::Call(signal, reply_tx))
            .await
            .map_err(|_| Error::not_found(self.id.clone()))?;
        match tokio::time::timeout(std::time::Duration::from_millis(timeout_ms), reply_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(Error::Internal("agent server dropped the reply".into())),
            Err(_) => Err(Error::Timeout),
        }
    }

    async fn stop(&self, reason: String) -> Result<()> {
        self.tx
            .send(Command::Stop(reason))
            .await
            .map_err(|_| Error::not_found(self.id.clone()))
    }
}

impl AgentServerHandle {
    /// Synchronous snapshot accessor used by `Instance`/tests that need the
    /// state/status surface without constructing a full `Signal`.
    pub async fn state(&self) -> Result<Agent> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(Command::State(tx))
            .await
            .map_err(|_| Error::not_found(self.id.clone()))?;
        rx.await.map_err(|_| Error::Internal("agent server dropped the reply".into()))
    }

    pub async fn status(&self) -> Result<Value> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(Command::Status(tx))
            .await
            .map_err(|_| Error::not_found(self.id.clone()))?;
        rx.await.map_err(|_| Error::Internal("agent server dropped the reply".into()))
    }
}

struct AgentServer {
    id: String,
    agent: Agent,
    module: Arc<dyn AgentModule>,
    router: Router,
    executors: Arc<ExecutorRegistry>,
    instance: Arc<dyn InstanceHandle>,
    parent: Option<ParentRef>,
    children: HashMap<String, ChildEntry>,
    on_parent_death: OnParentDeath,
    error_policy: ErrorPolicy,
    custom_error_handler: Option<CustomErrorHandler>,
    error_count: u64,
    last_error: Option<String>,
    max_queue_size: usize,
    dropped_directives: u64,
    cron_job_ids: std::collections::HashSet<String>,
}

/// Start an agent server task. Returns a handle implementing `AgentHandle`;
/// the caller (the Instance's `start_agent`) is responsible for registering
/// it under `id` and attaching it to the dynamic supervisor.
pub fn spawn(
    id: String,
    module: Arc<dyn AgentModule>,
    opts: AgentOptions,
    executors: Arc<ExecutorRegistry>,
    instance: Arc<dyn InstanceHandle>,
) -> (Arc<dyn AgentHandle>, tokio::task::JoinHandle<()>) {
    let mut agent = Agent::new(id.clone(), module.name()).with_initial_state(opts.initial_state);
    module.strategy().init(&mut agent);

    let server = AgentServer {
        id: id.clone(),
        agent,
        router: build_router(module.as_ref()),
        module,
        executors,
        instance,
        parent: opts.parent,
        children: HashMap::new(),
        on_parent_death: opts.on_parent_death,
        error_policy: opts.error_policy,
        custom_error_handler: opts.custom_error_handler,
        error_count: 0,
        last_error: None,
        max_queue_size: opts.max_queue_size,
        dropped_directives: 0,
        cron_job_ids: std::collections::HashSet::new(),
    };

    let (tx, rx) = mpsc::channel(opts.max_queue_size.max(1));
    let handle: Arc<dyn AgentHandle> = Arc::new(AgentServerHandle { id, tx });
    let join = tokio::spawn(server.run(rx));
    (handle, join)
}

impl AgentServer {
    #[tracing::instrument(name = "agent", skip_all, fields(id = %self.id))]
    async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        tracing::info!("agent server started");

        loop {
            let Some(command) = rx.recv().await else {
                self.terminate("channel_closed".into()).await;
                break;
            };

            match command {
                Command::Cast(signal) => {
                    if let Some(reason) = self.handle_signal(signal, None).await {
                        self.terminate(reason).await;
                        break;
                    }
                }
                Command::Call(signal, reply) => {
                    if let Some(reason) = self.handle_signal(signal, Some(reply)).await {
                        self.terminate(reason).await;
                        break;
                    }
                }
                Command::State(reply) => {
                    let _ = reply.send(self.agent.clone());
                }
                Command::Status(reply) => {
                    let _ = reply.send(self.status_snapshot());
                }
                Command::Stop(reason) => {
                    self.terminate(reason).await;
                    break;
                }
            }
        }

        tracing::info!("agent server stopped");
    }

    /// Process one signal end to end: pure phase, reply to `call` (if any)
    /// with the pure-transition result, then the effectful drain phase.
    /// Returns `Some(reason)` if a directive requested termination.
    #[tracing::instrument(name = "signal", skip_all, fields(agent_id = %self.id, signal_type = %signal.kind))]
    async fn handle_signal(
        &mut self,
        mut signal: Signal,
        call_reply: Option<oneshot::Sender<Result<Agent>>>,
    ) -> Option<String> {
        let trace_ctx = match signal.trace_context() {
            Some(ctx) => ctx,
            None => {
                let root = TraceContext::root();
                signal.set_trace_context(&root);
                root
            }
        };

        jido_core::trace::with_context(trace_ctx, || self.pure_and_drain(signal, call_reply)).await
    }

    async fn pure_and_drain(
        &mut self,
        signal: Signal,
        call_reply: Option<oneshot::Sender<Result<Agent>>>,
    ) -> Option<String> {
        if signal.kind == lifecycle::CHILD_EXIT {
            if let Some(tag) = signal.data.get("tag").and_then(Value::as_str) {
                self.children.remove(tag);
            }
        }
        if signal.kind == PARENT_EXITED {
            return self.apply_parent_death_policy().await;
        }

        if let Err(err) = signal.validate() {
            tracing::warn!(error = %err, "dropping malformed signal");
            if let Some(reply) = call_reply {
                let _ = reply.send(Err(err));
            }
            return None;
        }

        let pairs = self.pure_transition(signal);

        if let Some(reply) = call_reply {
            let _ = reply.send(Ok(self.agent.clone()));
        }

        self.drain(pairs).await
    }

    fn pure_transition(&mut self, signal: Signal) -> Vec<(Signal, Directive)> {
        let actions = self.router.route(&signal.kind);
        let instructions: Vec<Instruction> = actions
            .into_iter()
            .map(|action| Instruction::new(action.to_string(), signal.data.clone()))
            .collect();

        let ctx = StrategyContext {
            agent_id: self.id.clone(),
            input_signal_id: signal.id.clone(),
        };

        let agent = self.agent.clone();
        let (next_agent, directives) = self.module.strategy().cmd(agent, instructions, &ctx);

        let mut pairs: Vec<(Signal, Directive)> = directives
            .into_iter()
            .map(|d| (signal.clone(), d))
            .collect();

        if pairs.len() > self.max_queue_size {
            let dropped = pairs.len() - self.max_queue_size;
            self.dropped_directives += dropped as u64;
            tracing::warn!(dropped, max_queue_size = self.max_queue_size, "max_queue_size exceeded");
            pairs.truncate(self.max_queue_size);
        }

        self.agent = next_agent;
        pairs
    }

    /// Strategy snapshot merged with the counters status/telemetry observes
    /// (spec §7: "Dropped-overload directives increment a counter observable
    /// in status/telemetry"; "exposes its last error via status()").
    fn status_snapshot(&self) -> Value {
        let mut status = self.module.strategy().snapshot(&self.agent);
        if let Some(obj) = status.as_object_mut() {
            obj.insert("dropped_directives".into(), Value::from(self.dropped_directives));
            obj.insert("error_count".into(), Value::from(self.error_count));
            obj.insert(
                "last_error".into(),
                self.last_error.clone().map(Value::from).unwrap_or(Value::Null),
            );
        }
        status
    }

    async fn drain(&mut self, pairs: Vec<(Signal, Directive)>) -> Option<String> {
        for (input_signal, directive) in pairs {
            let directive = self.resolve_stop_child_tag(directive);

            let exec_ctx = ExecutionContext {
                agent_id: &self.id,
                instance: self.instance.clone(),
            };
            let state = self.agent.state.clone();
            let outcome = self
                .executors
                .execute(&directive, &input_signal, state, &exec_ctx)
                .await;

            match outcome {
                DirectiveOutcome::Ok(state) | DirectiveOutcome::Async(state) => {
                    self.agent.state = state;
                    self.post_process(&directive);
                    if let Directive::Error { error, .. } = &directive {
                        self.last_error = Some(error.clone());
                        if let Some(reason) = self.apply_error_policy(&directive, error) {
                            return Some(reason);
                        }
                    }
                }
                // The directive itself failed (spec §4.7 "directive execution
                // raises: same treatment [as a strategy raise]"): route it
                // through `error_policy` like an explicit `Directive::Error`,
                // but skip `post_process` since the directive never actually
                // took effect (e.g. an invalid cron job was never upserted).
                DirectiveOutcome::Failed { error, context, state } => {
                    self.agent.state = state;
                    self.last_error = Some(error.clone());
                    let error_directive = Directive::Error {
                        error: error.clone(),
                        context,
                    };
                    if let Some(reason) = self.apply_error_policy(&error_directive, &error) {
                        return Some(reason);
                    }
                }
                DirectiveOutcome::Stop { reason, state } => {
                    self.agent.state = state;
                    return Some(reason);
                }
            }
        }
        None
    }

    fn resolve_stop_child_tag(&self, directive: Directive) -> Directive {
        let Directive::StopChild { tag, pid, reason } = directive else {
            return directive;
        };
        if pid.is_some() {
            return Directive::StopChild { tag, pid, reason };
        }
        let resolved = tag
            .as_ref()
            .and_then(|t| self.children.get(t))
            .map(|entry| entry.id.clone());
        Directive::StopChild {
            tag,
            pid: resolved,
            reason,
        }
    }

    fn post_process(&mut self, directive: &Directive) {
        match directive {
            Directive::SpawnAgent { tag, opts, parent_meta, .. } => {
                let id = jido_directives::executors::spawn_agent::child_id(&self.id, tag, opts);
                self.children.insert(
                    tag.clone(),
                    ChildEntry {
                        id,
                        meta: parent_meta.clone(),
                    },
                );
            }
            Directive::Cron { job_id, .. } => {
                self.cron_job_ids.insert(job_id.clone());
            }
            Directive::CronCancel { job_id } => {
                self.cron_job_ids.remove(job_id);
            }
            _ => {}
        }
    }

    /// Applies the custom handler when one is set (spec §7's fifth policy
    /// kind takes precedence over `error_policy`), otherwise the configured
    /// `ErrorPolicy`.
    fn apply_error_policy(&mut self, directive: &Directive, error: &str) -> Option<String> {
        if let Some(handler) = &self.custom_error_handler {
            return match (handler.0)(directive, &self.agent.state) {
                ErrorHandlerOutcome::Ok(state) => {
                    self.agent.state = state;
                    None
                }
                ErrorHandlerOutcome::Stop { reason, state } => {
                    self.agent.state = state;
                    Some(reason)
                }
            };
        }

        match &self.error_policy {
            ErrorPolicy::LogOnly => None,
            ErrorPolicy::StopOnError => Some(format!("agent_error: {error}")),
            ErrorPolicy::EmitSignal { dispatch } => {
                self.emit_signal_error_policy(directive, error, dispatch.clone());
                None
            }
            ErrorPolicy::MaxErrors { n } => {
                self.error_count += 1;
                if self.error_count > *n {
                    Some(format!("max_errors_exceeded: {}", self.error_count))
                } else {
                    None
                }
            }
        }
    }

    /// `emit_signal(dispatch)` (spec §7): publish `jido.agent.error` via the
    /// given dispatch, the same `{"to": "<agent_id>"}` convention `Emit`
    /// honors, rather than `ErrorExecutor`'s unconditional cast into this
    /// agent's own intake.
    fn emit_signal_error_policy(&self, directive: &Directive, error: &str, dispatch: Value) {
        let context = match directive {
            Directive::Error { context, .. } => context.clone(),
            _ => Value::Null,
        };
        let telemetry = Signal::new(
            lifecycle::ERROR,
            self.id.clone(),
            serde_json::json!({"error": error, "context": context}),
        );

        let target = dispatch.get("to").and_then(Value::as_str).map(str::to_string);
        let registry = self.instance.registry();
        let job: std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>> =
            match target.and_then(|id| registry.whereis(&id)) {
                Some(handle) => Box::pin(async move {
                    if let Err(err) = handle.cast(telemetry).await {
                        tracing::warn!(error = %err, "emit_signal error-policy dispatch failed");
                    }
                }),
                None => {
                    tracing::warn!(agent_id = %self.id, "emit_signal error policy has no resolvable dispatch target");
                    Box::pin(async {})
                }
            };
        self.instance.task_pool().spawn(job);
    }

    async fn apply_parent_death_policy(&mut self) -> Option<String> {
        match self.on_parent_death {
            OnParentDeath::Stop => Some("parent_died".to_string()),
            OnParentDeath::Continue => {
                self.parent = None;
                None
            }
            OnParentDeath::EmitOrphan => {
                self.parent = None;
                let orphaned = Signal::bare(lifecycle::ORPHANED);
                let pairs = self.pure_transition(orphaned);
                self.drain(pairs).await
            }
        }
    }

    async fn terminate(&mut self, reason: String) {
        tracing::info!(reason, "agent terminating");

        for job_id in self.cron_job_ids.drain().collect::<Vec<_>>() {
            let name = jido_directives::executors::cron::job_name(&self.id, &job_id);
            self.instance.scheduler().delete_job(&name);
        }

        for child in self.children.values() {
            if let Some(handle) = self.instance.registry().whereis(&child.id) {
                let _ = handle.cast(Signal::bare(PARENT_EXITED)).await;
            }
        }

        if let Some(parent) = &self.parent {
            if let Some(handle) = self.instance.registry().whereis(&parent.id) {
                let exit_signal = Signal::new(
                    lifecycle::CHILD_EXIT,
                    self.id.clone(),
                    serde_json::json!({"tag": parent.tag, "reason": reason}),
                );
                let _ = handle.cast(exit_signal).await;
            }
        }
    }
}

//! jido-echo — a minimal `Echo` agent demonstrating the ping/pong scenario
//! (spec §8 scenario 1): a `ping` signal routes to an action that emits a
//! `pong` carrying the same `n`, dispatched back to the caller's own agent.

use jido::core::Signal;
use jido::{AgentOptions, Direct, GenericModule, Instance, InstanceOptions, ModuleRegistry};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn echo_modules() -> ModuleRegistry {
    let strategy = Arc::new(Direct::new().with_action(
        "ping",
        Arc::new(|agent, params, _ctx| {
            let n = params.get("n").cloned().unwrap_or(serde_json::Value::Null);
            let directive = jido::Directive::Emit {
                signal: Signal::new("pong", &agent.id, serde_json::json!({"n": n})),
                dispatch: Some(serde_json::json!({"to": agent.id})),
            };
            (agent, vec![directive])
        }),
    ));

    let mut modules = ModuleRegistry::new();
    modules.register(GenericModule::new("Echo", strategy).with_route("ping", "ping"));
    modules
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jido=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let instance = Instance::new(InstanceOptions::default(), echo_modules());

    let opts = AgentOptions {
        id: Some("echo".to_string()),
        ..Default::default()
    };
    let handle = instance.start_agent("Echo", opts).await?;

    let ping = Signal::new("ping", "jido-echo", serde_json::json!({"n": 7}));
    let reply = handle.call(ping, 200).await?;
    tracing::info!(agent = %reply.id, state = %serde_json::to_string(&reply.state)?, "call returned the pure-transition result");

    // The pong itself is delivered asynchronously by the Emit executor; give
    // the task pool a moment to run before the process exits.
    tokio::time::sleep(Duration::from_millis(50)).await;

    instance.stop_agent("echo").await?;
    Ok(())
}

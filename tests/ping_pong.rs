//! End-to-end scenario: a `ping` signal routes to an action that emits a
//! `pong` carrying the same payload (spec §8 scenario 1).

use jido::{AgentOptions, Direct, GenericModule, Instance, InstanceOptions, ModuleRegistry, Signal};
use std::sync::Arc;
use std::time::Duration;

fn echo_modules() -> ModuleRegistry {
    let strategy = Direct::new().with_action(
        "ping",
        Arc::new(|agent, params, _ctx| {
            let n = params.get("n").cloned().unwrap_or(serde_json::Value::Null);
            let directive = jido::Directive::Emit {
                signal: Signal::new("pong", &agent.id, serde_json::json!({"n": n})),
                dispatch: Some(serde_json::json!({"to": agent.id})),
            };
            (agent, vec![directive])
        }),
    );
    let mut modules = ModuleRegistry::new();
    modules.register(GenericModule::new("Echo", Arc::new(strategy)).with_route("ping", "ping"));
    modules
}

#[tokio::test]
async fn ping_is_answered_with_a_pong_carrying_the_same_payload() {
    let instance = Instance::new(InstanceOptions::default(), echo_modules());
    let opts = AgentOptions {
        id: Some("echo".to_string()),
        ..Default::default()
    };
    let handle = instance.start_agent("Echo", opts).await.unwrap();

    let ping = Signal::new("ping", "test", serde_json::json!({"n": 7}));
    let reply = handle.call(ping, 200).await.unwrap();
    assert_eq!(reply.id, "echo");

    // The pong is dispatched back to the same agent asynchronously; give the
    // task pool a moment to run before checking the instance is still up.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(instance.whereis("echo").is_some());
}

#[tokio::test]
async fn starting_the_same_id_twice_fails_already_started() {
    let instance = Instance::new(InstanceOptions::default(), echo_modules());
    let opts = AgentOptions {
        id: Some("echo-1".to_string()),
        ..Default::default()
    };
    instance.start_agent("Echo", opts.clone()).await.unwrap();
    let result = instance.start_agent("Echo", opts).await;
    assert!(result.is_err());
}

//! Jido — a runtime for autonomous, message-driven agents.
//!
//! This crate is a thin facade over the workspace members: `jido-core`'s
//! types, `jido-strategy`'s pure transition functions, `jido-directives`'
//! executor protocol, `jido-runtime`'s agent server, and `jido-instance`'s
//! supervision scope. Most embedding applications only need this crate.

pub use jido_core as core;
pub use jido_directives as directives;
pub use jido_instance as instance;
pub use jido_runtime as runtime;
pub use jido_strategy as strategy;

pub use jido_core::{
    lifecycle, Agent, AgentOptions, Directive, DirectiveOutcome, Error, ErrorPolicy,
    InstanceOptions, OnParentDeath, ParentRef, Result, Signal, TraceContext,
};
pub use jido_instance::Instance;
pub use jido_runtime::{AgentModule, GenericModule, ModuleRegistry};
pub use jido_strategy::{Direct, Fsm, FsmDefinition, Instruction, Strategy, StrategyContext, Transition};

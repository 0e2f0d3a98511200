//! Core types shared by every Jido crate: signals, agents, directives, the
//! error taxonomy, trace propagation, configuration, and the trait seams
//! that let directive executors and agent servers reach back into
//! instance-level services without a circular dependency.

pub mod agent;
pub mod config;
pub mod cron_expr;
pub mod directive;
pub mod error;
pub mod handle;
pub mod signal;
pub mod trace;
pub mod tracer;
pub mod validator;

pub use agent::Agent;
pub use config::{
    AgentOptions, CustomErrorHandler, ErrorHandler, ErrorHandlerOutcome, ErrorPolicy,
    InstanceOptions, OnParentDeath, ParentRef, RestartBudget,
};
pub use directive::{Directive, DirectiveOutcome, Dispatch};
pub use error::{Error, Result};
pub use handle::{AgentHandle, AgentRegistry, CronScheduler, CronTask, InstanceHandle, TaskPool};
pub use signal::{lifecycle, Signal};
pub use trace::TraceContext;
pub use tracer::{Tracer, TracingTracer};
pub use validator::{NullValidator, Validator};

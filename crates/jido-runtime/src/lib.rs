//! Runtime — the per-agent server task, its signal router, and the module
//! trait modules are bound to (spec §4).

pub mod module;
pub mod router;
pub mod server;

pub use module::{AgentModule, GenericModule, ModuleRegistry};
pub use router::Router;
pub use server::{spawn, AgentServerHandle};

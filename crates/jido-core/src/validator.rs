//! Schema validation seam (spec §1: "assumed: a validator that rejects
//! ill-typed state/configs"). The core only defines the trait and a
//! permissive default; real schema enforcement is an external collaborator.

use crate::error::Result;
use serde_json::Map;
use serde_json::Value;

/// Validates a module's agent state (or config) against whatever schema the
/// module declares. Implementations plug in at `AgentOptions::validator`.
pub trait Validator: Send + Sync {
    fn validate_state(&self, module: &str, state: &Map<String, Value>) -> Result<()>;
}

/// The default validator: accepts anything. Modules that want real
/// validation supply their own `Validator` impl.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullValidator;

impl Validator for NullValidator {
    fn validate_state(&self, _module: &str, _state: &Map<String, Value>) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_validator_accepts_anything() {
        assert!(NullValidator.validate_state("Echo", &Map::new()).is_ok());
    }
}

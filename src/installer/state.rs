//! The step-wrapping helper the Recipe Interpreter's pipeline runs every
//! verb through: turns a bare `AlbiusError` into a `RecipeError` carrying
//! the phase, step index, and verb name (§7's propagation policy).

use albius_disk_types::AlbiusError;

use crate::errors::{Phase, RecipeError};

/// Tracks which phase the interpreter is currently on, so each verb
/// dispatch can be wrapped with that context without threading it through
/// every call site by hand.
pub struct StepContext {
    phase: Phase,
}

impl StepContext {
    pub fn new(phase: Phase) -> Self {
        StepContext { phase }
    }

    /// Run `action`, wrapping any error it returns with this phase's
    /// context plus the given step index and verb name.
    pub fn apply<T>(
        &self,
        step_index: usize,
        verb: &str,
        action: impl FnOnce() -> Result<T, AlbiusError>,
    ) -> Result<T, RecipeError> {
        action().map_err(|source| RecipeError::new(self.phase, step_index, verb, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_wraps_failure_with_phase_and_step() {
        let ctx = StepContext::new(Phase::Setup);
        let err = ctx
            .apply(3, "mkpart", || Err(AlbiusError::NotFound { what: "disk".into() }))
            .unwrap_err();
        assert_eq!(err.phase, Phase::Setup);
        assert_eq!(err.step_index, 3);
        assert_eq!(err.verb, "mkpart");
    }

    #[test]
    fn apply_passes_through_success() {
        let ctx = StepContext::new(Phase::Mount);
        let value = ctx.apply(0, "mount", || Ok(42)).unwrap();
        assert_eq!(value, 42);
    }
}

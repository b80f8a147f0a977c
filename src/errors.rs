use std::fmt;

use albius_disk_types::AlbiusError;

/// Which stage of the Recipe Interpreter's pipeline produced an error.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Phase {
    Setup,
    Mount,
    Install,
    PostInstall,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Phase::Setup => "setup",
            Phase::Mount => "mount",
            Phase::Install => "install",
            Phase::PostInstall => "post-install",
        };
        f.write_str(name)
    }
}

/// The single error type the Recipe Interpreter hands to its caller: every
/// `AlbiusError` raised while running a recipe is wrapped in one of these
/// before propagating, carrying enough context to name the failing step.
#[derive(Debug)]
pub struct RecipeError {
    pub phase: Phase,
    pub step_index: usize,
    pub verb: String,
    pub context: Option<String>,
    pub source: AlbiusError,
}

impl RecipeError {
    pub fn new(phase: Phase, step_index: usize, verb: impl Into<String>, source: AlbiusError) -> Self {
        RecipeError { phase, step_index, verb: verb.into(), context: None, source }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl fmt::Display for RecipeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} step {} ({}) failed: {}", self.phase, self.step_index, self.verb, self.source)?;
        if let Some(ref context) = self.context {
            write!(f, " [{}]", context)?;
        }
        Ok(())
    }
}

impl failure::Fail for RecipeError {
    fn cause(&self) -> Option<&dyn failure::Fail> {
        Some(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_phase_step_and_verb() {
        let err = RecipeError::new(
            Phase::Setup,
            2,
            "mkpart",
            AlbiusError::Unsupported { kind: "hfs".into(), context: "mkfs" },
        );
        let rendered = err.to_string();
        assert!(rendered.starts_with("setup step 2 (mkpart) failed:"));
    }

    #[test]
    fn context_is_appended_when_present() {
        let err = RecipeError::new(Phase::Mount, 0, "mount", AlbiusError::NotFound { what: "disk".into() })
            .with_context("/dev/sda2 -> /");
        assert!(err.to_string().ends_with("[/dev/sda2 -> /]"));
    }
}

//! Tracer configuration
//!
//! Every field has a default, so an empty TOML file is a valid configuration.

use std::path::Path;

use eyre::WrapErr;
use protocol::class_matches;
use serde::Deserialize;

/// Hard cap on recorded execution points.
pub const DEFAULT_MAX_STEPS: usize = 256;

/// Hard cap on the number of frames a single record may render.
pub const DEFAULT_MAX_STACK_DEPTH: usize = 10;

/// Platform and library namespaces that are never traced.
pub const DEFAULT_EXCLUSIONS: [&str; 4] = ["java.*", "javax.*", "sun.*", "com.sun.*"];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TracerConfig {
    pub max_steps: usize,
    pub max_stack_depth: usize,

    /// Class globs excluded from every standing subscription
    pub exclusions: Vec<String>,

    /// Prefix of the tracer's own classes inside the target
    pub internal_namespace: String,

    /// Class of the entry stub that starts user code
    pub bootstrap_class: String,

    /// Also put line breakpoints on every loaded user class
    pub breakpoint_user_classes: bool,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            max_stack_depth: DEFAULT_MAX_STACK_DEPTH,
            exclusions: DEFAULT_EXCLUSIONS.iter().map(|s| s.to_string()).collect(),
            internal_namespace: "steptrace.".to_string(),
            bootstrap_class: "steptrace.shoelace.EntryStub".to_string(),
            breakpoint_user_classes: true,
        }
    }
}

impl TracerConfig {
    pub fn from_toml_str(contents: &str) -> eyre::Result<Self> {
        let config: Self = toml::from_str(contents).wrap_err("parsing tracer configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading configuration file {}", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("loading configuration from {}", path.display()))
    }

    fn validate(&self) -> eyre::Result<()> {
        eyre::ensure!(self.max_steps > 0, "max_steps must be at least 1");
        eyre::ensure!(
            self.max_stack_depth > 0,
            "max_stack_depth must be at least 1"
        );
        Ok(())
    }

    pub fn is_excluded(&self, class_name: &str) -> bool {
        self.exclusions
            .iter()
            .any(|pattern| class_matches(pattern, class_name))
    }

    pub fn is_internal(&self, class_name: &str) -> bool {
        class_name.starts_with(&self.internal_namespace)
    }

    pub fn is_bootstrap(&self, class_name: &str) -> bool {
        class_name == self.bootstrap_class
    }
}

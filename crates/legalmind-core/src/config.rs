//! Runtime configuration
//!
//! Defaults cover the standard operating limits; every field can be overridden
//! from the environment with the `LEGALMIND_` prefix. Validation happens
//! once, when the service container is assembled.

use serde::Deserialize;

use crate::error::{CoreError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Which ModelClient to bind ("gemini" is the only built-in).
    pub model_provider: String,
    /// When true, grounded agents must succeed via the grounded backend;
    /// a missing grounded configuration is a startup error, never a
    /// silent fallback.
    pub use_grounded_backend: bool,
    pub max_tool_iterations_default: usize,
    pub agent_turn_timeout_seconds: u64,
    pub request_timeout_seconds: u64,
    pub tool_timeout_seconds: u64,
    pub history_window_pairs: usize,
    pub context_token_budget_fraction: f64,
    pub model_context_window: usize,

    // Vertex AI binding for the Gemini adapter
    pub vertex_project: String,
    pub vertex_location: String,
    pub vertex_model: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            model_provider: "gemini".to_string(),
            use_grounded_backend: true,
            max_tool_iterations_default: 6,
            agent_turn_timeout_seconds: 30,
            request_timeout_seconds: 90,
            tool_timeout_seconds: 20,
            history_window_pairs: 6,
            context_token_budget_fraction: 0.75,
            model_context_window: 128_000,
            vertex_project: String::new(),
            vertex_location: "us-central1".to_string(),
            vertex_model: "gemini-2.0-flash".to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Defaults layered with `LEGALMIND_*` environment overrides.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(v) = std::env::var("LEGALMIND_MODEL_PROVIDER") {
            config.model_provider = v;
        }
        if let Ok(v) = std::env::var("LEGALMIND_USE_GROUNDED_BACKEND") {
            config.use_grounded_backend = v == "1" || v.eq_ignore_ascii_case("true");
        }
        if let Ok(v) = parse_env("LEGALMIND_MAX_TOOL_ITERATIONS") {
            config.max_tool_iterations_default = v;
        }
        if let Ok(v) = parse_env("LEGALMIND_AGENT_TURN_TIMEOUT_SECONDS") {
            config.agent_turn_timeout_seconds = v;
        }
        if let Ok(v) = parse_env("LEGALMIND_REQUEST_TIMEOUT_SECONDS") {
            config.request_timeout_seconds = v;
        }
        if let Ok(v) = parse_env("LEGALMIND_TOOL_TIMEOUT_SECONDS") {
            config.tool_timeout_seconds = v;
        }
        if let Ok(v) = parse_env("LEGALMIND_HISTORY_WINDOW_PAIRS") {
            config.history_window_pairs = v;
        }
        if let Ok(v) = parse_env("LEGALMIND_CONTEXT_TOKEN_BUDGET_FRACTION") {
            config.context_token_budget_fraction = v;
        }
        if let Ok(v) = parse_env("LEGALMIND_MODEL_CONTEXT_WINDOW") {
            config.model_context_window = v;
        }
        if let Ok(v) = std::env::var("LEGALMIND_VERTEX_PROJECT") {
            config.vertex_project = v;
        }
        if let Ok(v) = std::env::var("LEGALMIND_VERTEX_LOCATION") {
            config.vertex_location = v;
        }
        if let Ok(v) = std::env::var("LEGALMIND_VERTEX_MODEL") {
            config.vertex_model = v;
        }
        config
    }

    /// Fail-fast validation at container assembly.
    pub fn validate(&self) -> Result<()> {
        if self.max_tool_iterations_default == 0 {
            return Err(CoreError::Configuration(
                "max_tool_iterations_default must be at least 1".into(),
            ));
        }
        if !(self.context_token_budget_fraction > 0.0
            && self.context_token_budget_fraction <= 1.0)
        {
            return Err(CoreError::Configuration(
                "context_token_budget_fraction must be in (0, 1]".into(),
            ));
        }
        if self.use_grounded_backend && self.vertex_project.is_empty() {
            return Err(CoreError::Configuration(
                "use_grounded_backend requires vertex_project to be set".into(),
            ));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> std::result::Result<T, ()> {
    std::env::var(key).map_err(|_| ()).and_then(|v| v.parse().map_err(|_| ()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_standard_limits() {
        let c = RuntimeConfig::default();
        assert_eq!(c.max_tool_iterations_default, 6);
        assert_eq!(c.agent_turn_timeout_seconds, 30);
        assert_eq!(c.request_timeout_seconds, 90);
        assert_eq!(c.tool_timeout_seconds, 20);
        assert_eq!(c.history_window_pairs, 6);
        assert!((c.context_token_budget_fraction - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn grounded_backend_requires_project() {
        let mut c = RuntimeConfig::default();
        c.use_grounded_backend = true;
        c.vertex_project = String::new();
        assert!(c.validate().is_err());

        c.vertex_project = "demo-project".into();
        assert!(c.validate().is_ok());

        c.use_grounded_backend = false;
        c.vertex_project = String::new();
        assert!(c.validate().is_ok());
    }

    #[test]
    fn budget_fraction_bounds() {
        let mut c = RuntimeConfig::default();
        c.vertex_project = "p".into();
        c.context_token_budget_fraction = 0.0;
        assert!(c.validate().is_err());
        c.context_token_budget_fraction = 1.0;
        assert!(c.validate().is_ok());
    }
}

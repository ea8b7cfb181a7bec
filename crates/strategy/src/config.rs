use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One `[[strategy]]` entry of the ensemble config file (TOML).
///
/// ```toml
/// [[strategy]]
/// type = "bollinger_breakout"
/// name = "BB 20/2"
///
/// [strategy.params]
/// period = 20
/// std_dev = 2.0
/// min_confidence = 65
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StrategyConfig {
    /// Strategy type identifier, see [`crate::registry::STRATEGY_TYPES`].
    #[serde(rename = "type")]
    pub strategy_type: String,
    /// Name shown in logs and on opinions. Defaults to the type.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "enabled_default")]
    pub enabled: bool,
    /// Strategy-specific parameters; anything missing keeps its default.
    #[serde(default)]
    pub params: HashMap<String, toml::Value>,
}

fn enabled_default() -> bool {
    true
}

impl StrategyConfig {
    pub fn new(strategy_type: &str) -> Self {
        Self {
            strategy_type: strategy_type.to_string(),
            name: None,
            enabled: true,
            params: HashMap::new(),
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.strategy_type)
    }
}

//! Configuration system

pub use serde::{Serialize, Deserialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;
        
        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }
    
    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };
        
        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    
    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),
    
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),
    
    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Top-level runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Trigger cascade limits
    pub triggers: TriggerConfig,
    /// Obstacle synchronization settings
    pub navigation: NavigationConfig,
    /// Portal graph settings
    pub visibility: VisibilityConfig,
}

impl Config for EngineConfig {}

/// Trigger engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Deepest action chain a single invocation may follow
    pub max_cascade_depth: usize,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self { max_cascade_depth: 64 }
    }
}

/// Navigation/obstacle settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Item states that block pathfinding (compared case-insensitively)
    pub blocking_states: Vec<String>,
    /// Extra margin added around every obstacle box, in world units
    pub obstacle_padding: f32,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            blocking_states: vec!["closed".to_string(), "locked".to_string()],
            obstacle_padding: 0.0,
        }
    }
}

impl NavigationConfig {
    /// Whether an item in `state` should register an obstacle
    pub fn is_blocking(&self, state: &str) -> bool {
        self.blocking_states
            .iter()
            .any(|blocking| blocking.eq_ignore_ascii_case(state))
    }
}

/// Portal graph settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilityConfig {
    /// Tolerance used when comparing portal directions and positions
    pub portal_epsilon: f32,
    /// Frustum-test instances that belong to no placement
    pub cull_loose_objects: bool,
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            portal_epsilon: 1e-4,
            cull_loose_objects: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_block_closed_doors() {
        let config = NavigationConfig::default();
        assert!(config.is_blocking("closed"));
        assert!(config.is_blocking("Locked"));
        assert!(!config.is_blocking("open"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: EngineConfig = toml::from_str("[triggers]\nmax_cascade_depth = 8\n").unwrap();
        assert_eq!(config.triggers.max_cascade_depth, 8);
        assert_eq!(config.navigation, NavigationConfig::default());
    }

    #[test]
    fn test_ron_round_trip_through_file() {
        let path = std::env::temp_dir().join(format!("tile_engine_config_{}.ron", std::process::id()));
        let path = path.to_string_lossy().to_string();

        let mut config = EngineConfig::default();
        config.visibility.cull_loose_objects = false;
        config.save_to_file(&path).unwrap();

        let loaded = EngineConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let result = EngineConfig::default().save_to_file("engine.yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(path)) if path == "engine.yaml"));
    }
}

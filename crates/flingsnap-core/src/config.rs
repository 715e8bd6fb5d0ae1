use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub snap: SnapConfig,
    #[serde(default)]
    pub decay: DecayConfig,
    #[serde(default)]
    pub spring: SpringConfig,
    #[serde(default)]
    pub frame: FrameConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Where inside the viewport a snapped item rests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapAlignment {
    /// Item start flush with the viewport start
    Start,
    /// Item centered in the viewport
    #[default]
    Center,
    /// Item end flush with the viewport end
    End,
}

/// How a resolved target index is remapped before the fling starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapIndexPolicy {
    /// Use the resolved target as-is
    #[default]
    Target,
    /// Never move more than `max_skip` items away from the start index
    Adjacent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapConfig {
    /// Snap alignment: "start", "center", "end"
    #[serde(default)]
    pub alignment: SnapAlignment,
    /// Snap index remap: "target", "adjacent"
    #[serde(default)]
    pub snap_index: SnapIndexPolicy,
    /// Items a fling may skip when `snap_index = "adjacent"`
    #[serde(default = "default_max_skip")]
    pub max_skip: usize,
    /// Maximum fling distance in estimated item extents (unbounded when unset)
    #[serde(default)]
    pub max_fling_items: Option<f32>,
    /// Velocities below this pick the nearest item without projecting a fling
    #[serde(default = "default_near_zero_velocity")]
    pub near_zero_velocity: f32,
    /// Requested/consumed mismatch that ends an animation phase
    #[serde(default = "default_consumed_tolerance")]
    pub consumed_tolerance: f32,
    /// Hand off from decay to spring one item before far targets
    #[serde(default = "default_true")]
    pub fling_then_spring: bool,
    /// Minimum index distance for the decay-to-spring handoff
    #[serde(default = "default_spring_handoff_items")]
    pub spring_handoff_items: usize,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            alignment: SnapAlignment::default(),
            snap_index: SnapIndexPolicy::default(),
            max_skip: default_max_skip(),
            max_fling_items: None,
            near_zero_velocity: default_near_zero_velocity(),
            consumed_tolerance: default_consumed_tolerance(),
            fling_then_spring: default_true(),
            spring_handoff_items: default_spring_handoff_items(),
        }
    }
}

/// Decay model selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecayKind {
    /// Platform fling spline
    #[default]
    Spline,
    /// Exponential friction decay
    Exponential,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecayConfig {
    /// Decay model: "spline", "exponential"
    #[serde(default)]
    pub kind: DecayKind,
    /// Scroll friction for the spline model
    #[serde(default = "default_scroll_friction")]
    pub scroll_friction: f32,
    /// Logical-to-physical pixel density for the spline model
    #[serde(default = "default_density")]
    pub density: f32,
    /// Friction multiplier for the exponential model
    #[serde(default = "default_friction_multiplier")]
    pub friction_multiplier: f32,
    /// Velocity under which the exponential model stops
    #[serde(default = "default_velocity_threshold")]
    pub velocity_threshold: f32,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            kind: DecayKind::default(),
            scroll_friction: default_scroll_friction(),
            density: default_density(),
            friction_multiplier: default_friction_multiplier(),
            velocity_threshold: default_velocity_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpringConfig {
    /// Spring stiffness
    #[serde(default = "default_stiffness")]
    pub stiffness: f32,
    /// Damping ratio (1.0 = critically damped, no bounce)
    #[serde(default = "default_damping_ratio")]
    pub damping_ratio: f32,
    /// Displacement under which the spring counts as settled
    #[serde(default = "default_visibility_threshold")]
    pub visibility_threshold: f32,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            stiffness: default_stiffness(),
            damping_ratio: default_damping_ratio(),
            visibility_threshold: default_visibility_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameConfig {
    /// Frames per second for driven simulations
    #[serde(default = "default_fps")]
    pub fps: u32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self { fps: default_fps() }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_skip() -> usize {
    1
}

fn default_near_zero_velocity() -> f32 {
    0.5
}

fn default_consumed_tolerance() -> f32 {
    0.5
}

fn default_spring_handoff_items() -> usize {
    2
}

fn default_scroll_friction() -> f32 {
    0.015 // platform ViewConfiguration scroll friction
}

fn default_density() -> f32 {
    1.0
}

fn default_friction_multiplier() -> f32 {
    1.0
}

fn default_velocity_threshold() -> f32 {
    0.1
}

fn default_stiffness() -> f32 {
    400.0
}

fn default_damping_ratio() -> f32 {
    1.0
}

fn default_visibility_threshold() -> f32 {
    0.01
}

fn default_fps() -> u32 {
    60
}

fn ensure_positive(name: &str, value: f32) -> crate::Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(crate::Error::Config(format!(
            "{} must be a positive number, got {}",
            name, value
        )))
    }
}

impl AppConfig {
    /// Load configuration from the default path or return defaults
    pub fn load() -> crate::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a specific file, falling back to defaults when it is missing
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self =
                toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default path
    pub fn save(&self) -> crate::Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, self.to_toml()?)?;

        Ok(())
    }

    /// Render the configuration as pretty TOML
    pub fn to_toml(&self) -> crate::Result<String> {
        toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Get the configuration file path
    /// Always uses ~/.config/flingsnap/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("flingsnap")
            .join("config.toml")
    }

    /// Reject physical parameters the simulations cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        ensure_positive("spring.stiffness", self.spring.stiffness)?;
        ensure_positive("spring.damping_ratio", self.spring.damping_ratio)?;
        ensure_positive("spring.visibility_threshold", self.spring.visibility_threshold)?;
        ensure_positive("decay.scroll_friction", self.decay.scroll_friction)?;
        ensure_positive("decay.density", self.decay.density)?;
        ensure_positive("decay.friction_multiplier", self.decay.friction_multiplier)?;
        ensure_positive("decay.velocity_threshold", self.decay.velocity_threshold)?;
        if self.snap.near_zero_velocity < 0.0 {
            return Err(crate::Error::Config(
                "snap.near_zero_velocity must not be negative".to_string(),
            ));
        }
        ensure_positive("snap.consumed_tolerance", self.snap.consumed_tolerance)?;
        if let Some(items) = self.snap.max_fling_items {
            ensure_positive("snap.max_fling_items", items)?;
        }
        Ok(())
    }
}

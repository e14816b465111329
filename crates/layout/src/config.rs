use crate::error::{LayoutError, Result};
use crate::geometry::{Point, Size};
use serde::{Deserialize, Serialize};

/// What the grid packer minimizes when choosing a row count
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackObjective {
    /// Smallest bounding area
    MinArea,
    /// Bounding box closest to a square (`|w/h - 1|`)
    #[default]
    SquareAspect,
}

/// Grid packing parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Gap between and around nodes inside a group
    pub padding: f32,

    /// Gap between and around groups
    pub group_padding: f32,

    /// Objective for packing nodes inside one group
    pub objective: PackObjective,

    /// Objective for packing groups against each other
    pub group_objective: PackObjective,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            padding: 20.0,
            group_padding: 50.0,
            objective: PackObjective::SquareAspect,
            group_objective: PackObjective::MinArea,
        }
    }
}

/// Force-directed simulation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceConfig {
    pub steps: usize,

    /// Pairwise repulsion strength (force = repulsion / d^2)
    pub repulsion: f32,

    /// Edge attraction strength (force = attraction * d)
    pub attraction: f32,

    /// Velocity multiplier per step, strictly between 0 and 1
    pub damping: f32,

    /// Upper bound on a node's speed per step. Without it the simulation is not
    /// guaranteed to settle.
    pub max_speed: Option<f32>,

    /// Seed for the initial placement; random when absent
    pub seed: Option<u64>,

    /// Side of the square the initial positions are drawn from
    pub spread: f32,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            steps: 500,
            repulsion: 1000.0,
            attraction: 0.05,
            damping: 0.85,
            max_speed: Some(50.0),
            seed: None,
            spread: 400.0,
        }
    }
}

/// Uniform grid parameters for ungrouped nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniformGridConfig {
    /// Size assumed for nodes that never reported one; also the minimum cell size
    pub default_size: Size,

    pub horizontal_spacing: f32,
    pub vertical_spacing: f32,

    /// Top-left of the first cell
    pub origin: Point,

    /// Target columns/rows ratio
    pub aspect_ratio: f32,
}

impl Default for UniformGridConfig {
    fn default() -> Self {
        Self {
            default_size: Size::new(100.0, 200.0),
            horizontal_spacing: 50.0,
            vertical_spacing: 50.0,
            origin: Point::new(100.0, 100.0),
            aspect_ratio: 1.618,
        }
    }
}

/// Batched layout parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub max_nodes: usize,
    pub batch_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_nodes: 10_000,
            batch_size: 2_500,
        }
    }
}

/// Layout configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub grid: GridConfig,
    pub force: ForceConfig,
    pub uniform: UniformGridConfig,
    pub batch: BatchConfig,

    /// Properties kept per node
    pub max_properties: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            force: ForceConfig::default(),
            uniform: UniformGridConfig::default(),
            batch: BatchConfig::default(),
            max_properties: 5,
        }
    }
}

fn non_negative(name: &str, value: f32) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(LayoutError::invalid_config(format!(
            "{name} must be a finite value >= 0 (got {value})"
        )));
    }
    Ok(())
}

fn positive(name: &str, value: f32) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(LayoutError::invalid_config(format!(
            "{name} must be a finite value > 0 (got {value})"
        )));
    }
    Ok(())
}

impl GridConfig {
    pub fn validate(&self) -> Result<()> {
        non_negative("grid.padding", self.padding)?;
        non_negative("grid.group_padding", self.group_padding)
    }
}

impl ForceConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.damping > 0.0 && self.damping < 1.0) {
            return Err(LayoutError::invalid_config(format!(
                "force.damping must be in (0, 1) (got {})",
                self.damping
            )));
        }
        non_negative("force.repulsion", self.repulsion)?;
        non_negative("force.attraction", self.attraction)?;
        positive("force.spread", self.spread)?;
        if let Some(max_speed) = self.max_speed {
            positive("force.max_speed", max_speed)?;
        }
        Ok(())
    }
}

impl UniformGridConfig {
    pub fn validate(&self) -> Result<()> {
        positive("uniform.default_size.width", self.default_size.width)?;
        positive("uniform.default_size.height", self.default_size.height)?;
        non_negative("uniform.horizontal_spacing", self.horizontal_spacing)?;
        non_negative("uniform.vertical_spacing", self.vertical_spacing)?;
        positive("uniform.aspect_ratio", self.aspect_ratio)
    }
}

impl BatchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(LayoutError::invalid_config("batch.batch_size must be > 0"));
        }
        Ok(())
    }

    /// Number of batches needed for `max_nodes`
    pub fn batch_count(&self) -> usize {
        if self.batch_size == 0 {
            return 0;
        }
        self.max_nodes.div_ceil(self.batch_size)
    }
}

impl LayoutConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.grid.validate()?;
        self.force.validate()?;
        self.uniform.validate()?;
        self.batch.validate()
    }
}

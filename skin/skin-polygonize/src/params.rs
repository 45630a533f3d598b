//! Polygonization and blending parameters.

use hashbrown::HashMap;
use skin_field::{BlendOperator, FieldBounds, GRADIENT_STEP};
use skin_skeleton::BoneId;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{PolygonizeError, PolygonizeResult};

/// How bone fields are combined into one skeleton field.
///
/// Each bone combines its own value with its children's blended values
/// using its operator; the skeleton's roots are combined with
/// `root_operator`.
#[derive(Debug, Clone, Default)]
pub struct BlendParams {
    /// Combines the blended values of the skeleton's roots.
    pub root_operator: BlendOperator,
    /// Operator for bones without an override.
    pub default_operator: BlendOperator,
    /// Per-bone operators, keyed by bone id.
    pub overrides: HashMap<BoneId, BlendOperator>,
}

impl BlendParams {
    /// Use one operator everywhere.
    #[must_use]
    pub fn uniform(operator: BlendOperator) -> Self {
        Self {
            root_operator: operator.clone(),
            default_operator: operator,
            overrides: HashMap::new(),
        }
    }

    /// Set the root operator.
    #[must_use]
    pub fn with_root_operator(mut self, operator: BlendOperator) -> Self {
        self.root_operator = operator;
        self
    }

    /// Set the default bone operator.
    #[must_use]
    pub fn with_default_operator(mut self, operator: BlendOperator) -> Self {
        self.default_operator = operator;
        self
    }

    /// Override the operator of one bone.
    #[must_use]
    pub fn with_override(mut self, bone: BoneId, operator: BlendOperator) -> Self {
        self.overrides.insert(bone, operator);
        self
    }

    /// Operator used at `bone`.
    #[must_use]
    pub fn operator_for(&self, bone: BoneId) -> &BlendOperator {
        self.overrides.get(&bone).unwrap_or(&self.default_operator)
    }
}

/// Parameters for sampling and polygonizing a skeleton's field.
///
/// # Example
///
/// ```
/// use skin_polygonize::PolygonizeParams;
///
/// let params = PolygonizeParams::preview().with_cell_size(0.2);
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PolygonizeParams {
    /// Edge length of one grid cell.
    pub cell_size: f64,
    /// Extra cells around the sampling bounds.
    pub padding: usize,
    /// Field value of the extracted surface. Inside is above this value.
    pub iso_value: f64,
    /// Explicit sampling bounds. When `None`, the skeleton's world bounds are
    /// used.
    pub bounds: Option<FieldBounds>,
    /// Whether to compute per-vertex normals.
    pub compute_normals: bool,
    /// Finite-difference step for field gradients.
    pub normal_epsilon: f64,
    /// Maximum number of grid cells. An axis sampled at a single point still
    /// counts as one layer of cells.
    pub max_cells: usize,
    /// Blending operators.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub blend: BlendParams,
}

impl Default for PolygonizeParams {
    fn default() -> Self {
        Self {
            cell_size: 0.1,
            padding: 2,
            iso_value: 0.5,
            bounds: None,
            compute_normals: true,
            normal_epsilon: GRADIENT_STEP,
            max_cells: 16_000_000,
            blend: BlendParams::default(),
        }
    }
}

impl PolygonizeParams {
    /// Coarse settings for interactive feedback.
    #[must_use]
    pub fn preview() -> Self {
        Self {
            cell_size: 0.25,
            padding: 1,
            ..Self::default()
        }
    }

    /// Fine settings for final output.
    #[must_use]
    pub fn high_quality() -> Self {
        Self {
            cell_size: 0.025,
            padding: 3,
            normal_epsilon: 1e-5,
            max_cells: 128_000_000,
            ..Self::default()
        }
    }

    /// Set the cell size.
    #[must_use]
    pub fn with_cell_size(mut self, cell_size: f64) -> Self {
        self.cell_size = cell_size;
        self
    }

    /// Set the padding in cells.
    #[must_use]
    pub fn with_padding(mut self, padding: usize) -> Self {
        self.padding = padding;
        self
    }

    /// Set the iso value.
    #[must_use]
    pub fn with_iso_value(mut self, iso_value: f64) -> Self {
        self.iso_value = iso_value;
        self
    }

    /// Sample inside fixed bounds instead of the skeleton's bounds.
    #[must_use]
    pub fn with_bounds(mut self, bounds: FieldBounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Enable or disable normals.
    #[must_use]
    pub fn with_normals(mut self, compute_normals: bool) -> Self {
        self.compute_normals = compute_normals;
        self
    }

    /// Set the cell limit.
    #[must_use]
    pub fn with_max_cells(mut self, max_cells: usize) -> Self {
        self.max_cells = max_cells;
        self
    }

    /// Set the blending operators.
    #[must_use]
    pub fn with_blend(mut self, blend: BlendParams) -> Self {
        self.blend = blend;
        self
    }

    /// Check that the numeric parameters are usable.
    ///
    /// # Errors
    ///
    /// Returns the first invalid parameter found.
    pub fn validate(&self) -> PolygonizeResult<()> {
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(PolygonizeError::InvalidCellSize(self.cell_size));
        }
        if !self.iso_value.is_finite() {
            return Err(PolygonizeError::InvalidIsoValue(self.iso_value));
        }
        if !(self.normal_epsilon.is_finite() && self.normal_epsilon > 0.0) {
            return Err(PolygonizeError::InvalidNormalEpsilon(self.normal_epsilon));
        }
        if let Some(bounds) = self.bounds.filter(|b| !b.is_finite()) {
            return Err(PolygonizeError::InvalidBounds(bounds));
        }
        Ok(())
    }
}

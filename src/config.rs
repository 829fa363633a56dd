use crate::{
    error::{FluidError, Result},
    forces::Buoyancy,
    Grid2, LinearSolverConfig, SolverChoice,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FluidConfig {
    /// Interior cells per axis.
    pub resolution: usize,
    pub dt: f32,
    pub viscosity: f32,
    pub diffusion: f32,
    pub solver: SolverChoice,
    pub linear: LinearSolverConfig,
    /// Falls back to `solver` when unset.
    pub projection_solver: Option<SolverChoice>,
    pub projection_iterations: usize,
    /// Vorticity confinement strength; zero turns it off.
    pub vorticity: f32,
    pub buoyancy: Option<Buoyancy>,
}

impl Default for FluidConfig {
    fn default() -> Self {
        Self {
            resolution: 64,
            dt: 0.1,
            viscosity: 0.0,
            diffusion: 0.0,
            solver: SolverChoice::default(),
            linear: LinearSolverConfig::default(),
            projection_solver: None,
            projection_iterations: 20,
            vorticity: 1.0,
            buoyancy: None,
        }
    }
}

impl FluidConfig {
    pub fn validate(&self) -> Result<()> {
        if self.resolution < Grid2::MIN_RESOLUTION {
            return Err(FluidError::ResolutionTooSmall {
                resolution: self.resolution,
                min: Grid2::MIN_RESOLUTION,
            });
        }
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(FluidError::InvalidTimeStep(self.dt));
        }
        non_negative("viscosity", self.viscosity)?;
        non_negative("diffusion", self.diffusion)?;
        non_negative("vorticity", self.vorticity)?;
        if let Some(buoyancy) = self.buoyancy {
            if !buoyancy.weight.is_finite() {
                return Err(FluidError::InvalidCoefficient {
                    what: "buoyancy weight",
                    value: buoyancy.weight,
                });
            }
            if !buoyancy.lift.is_finite() {
                return Err(FluidError::InvalidCoefficient {
                    what: "buoyancy lift",
                    value: buoyancy.lift,
                });
            }
        }
        if self.projection_iterations == 0 {
            return Err(FluidError::ZeroIterations { what: "projection" });
        }
        self.linear.validate()
    }

    pub fn grid(&self) -> Grid2 {
        Grid2::new(self.resolution)
    }

    pub fn projection_choice(&self) -> SolverChoice {
        self.projection_solver.unwrap_or(self.solver)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

fn non_negative(what: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(FluidError::InvalidCoefficient { what, value })
    }
}

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FluidError>;

/// Setup-time failures. Nothing in a simulation step returns these; a step
/// only runs once the configuration has been accepted.
#[derive(Error, Debug)]
pub enum FluidError {
    #[error("grid resolution {resolution} is below the minimum of {min} interior cells")]
    ResolutionTooSmall { resolution: usize, min: usize },

    #[error("multigrid needs at least one level")]
    NoLevels,

    #[error("resolution {resolution} is not divisible by {divisor} as required by {levels} multigrid levels")]
    IndivisibleResolution {
        resolution: usize,
        levels: usize,
        divisor: usize,
    },

    #[error("{levels} multigrid levels leave {coarsest} interior cells on the coarsest grid, need at least {min}")]
    LevelsTooDeep {
        levels: usize,
        coarsest: usize,
        min: usize,
    },

    #[error("relaxation factor must lie in (0, 2), got {0}")]
    InvalidRelaxation(f32),

    #[error("{what} iteration count must be positive")]
    ZeroIterations { what: &'static str },

    #[error("conjugate gradient requires the five-point stencil")]
    UnsupportedStencil,

    #[error("conjugate gradient tolerance must be finite and non-negative, got {0}")]
    InvalidTolerance(f32),

    #[error("time step must be finite and positive, got {0}")]
    InvalidTimeStep(f32),

    #[error("{what} coefficient must be finite and non-negative, got {value}")]
    InvalidCoefficient { what: &'static str, value: f32 },

    #[error("unknown linear solver `{0}`")]
    UnknownSolver(String),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}

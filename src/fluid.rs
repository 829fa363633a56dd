use crate::{
    advect::advect,
    build_solver,
    config::FluidConfig,
    error::Result,
    forces::{add_source, buoyancy_into, vorticity_confinement_into},
    project::project,
    Coefficients, Field2, Grid2, LinearSolver, Orientation,
};
use std::mem::swap;

/// Stable-fluids state: velocity and density with their source buffers.
///
/// Sources written between steps (through the `*_source_mut` accessors or
/// the `add_*` helpers) are consumed and cleared by the next step.
pub struct FluidSolver {
    config: FluidConfig,
    grid: Grid2,
    u: Field2,
    u_prev: Field2,
    v: Field2,
    v_prev: Field2,
    density: Field2,
    density_prev: Field2,
    curl: Field2,
    diffusion_solver: Box<dyn LinearSolver>,
    projection_solver: Box<dyn LinearSolver>,
}

impl FluidSolver {
    pub fn new(config: FluidConfig) -> Result<Self> {
        config.validate()?;
        let grid = config.grid();
        let diffusion_solver = build_solver(config.solver, config.linear, grid)?;
        let projection_solver = build_solver(config.projection_choice(), config.linear, grid)?;
        log::info!(
            "fluid grid {}x{}, diffusion solver {}, projection solver {} ({} / {} iterations)",
            grid.resolution(),
            grid.resolution(),
            diffusion_solver.name(),
            projection_solver.name(),
            config.linear.iterations,
            config.projection_iterations
        );
        Ok(Self {
            config,
            grid,
            u: Field2::zeros(grid),
            u_prev: Field2::zeros(grid),
            v: Field2::zeros(grid),
            v_prev: Field2::zeros(grid),
            density: Field2::zeros(grid),
            density_prev: Field2::zeros(grid),
            curl: Field2::zeros(grid),
            diffusion_solver,
            projection_solver,
        })
    }

    pub fn config(&self) -> &FluidConfig {
        &self.config
    }

    pub fn grid(&self) -> Grid2 {
        self.grid
    }

    pub fn idx(&self, i: usize, j: usize) -> usize {
        self.grid.idx(i, j)
    }

    pub fn density(&self) -> &Field2 {
        &self.density
    }

    pub fn velocity(&self) -> (&Field2, &Field2) {
        (&self.u, &self.v)
    }

    pub fn density_source_mut(&mut self) -> &mut Field2 {
        &mut self.density_prev
    }

    pub fn velocity_source_mut(&mut self) -> (&mut Field2, &mut Field2) {
        (&mut self.u_prev, &mut self.v_prev)
    }

    pub fn add_density(&mut self, i: usize, j: usize, amount: f32) {
        self.density_prev.add(i, j, amount);
    }

    pub fn add_velocity(&mut self, i: usize, j: usize, fx: f32, fy: f32) {
        self.u_prev.add(i, j, fx);
        self.v_prev.add(i, j, fy);
    }

    pub fn is_finite(&self) -> bool {
        self.u.is_finite() && self.v.is_finite() && self.density.is_finite()
    }

    /// Zeroes every field without reallocating.
    pub fn reset(&mut self) {
        for field in [
            &mut self.u,
            &mut self.u_prev,
            &mut self.v,
            &mut self.v_prev,
            &mut self.density,
            &mut self.density_prev,
            &mut self.curl,
        ] {
            field.fill(0.0);
        }
    }

    pub fn step(&mut self, dt: f32) {
        debug_assert!(dt.is_finite() && dt > 0.0, "invalid time step {dt}");
        self.velocity_step(dt);
        self.density_step(dt);
    }

    pub fn velocity_step(&mut self, dt: f32) {
        add_source(&mut self.u, &self.u_prev, dt);
        add_source(&mut self.v, &self.v_prev, dt);
        if self.config.vorticity > 0.0 {
            vorticity_confinement_into(
                &mut self.u_prev,
                &mut self.v_prev,
                &mut self.curl,
                &self.u,
                &self.v,
                self.config.vorticity,
            );
            add_source(&mut self.u, &self.u_prev, dt);
            add_source(&mut self.v, &self.v_prev, dt);
        }
        if let Some(buoyancy) = self.config.buoyancy {
            buoyancy_into(&mut self.v_prev, &self.density, buoyancy);
            add_source(&mut self.v, &self.v_prev, dt);
        }

        // Velocity components diffuse with the scalar boundary; projection
        // re-applies the no-through condition afterwards.
        let iterations = self.config.linear.iterations;
        let viscous = self.diffusion_coefficients(self.config.viscosity, dt);
        swap(&mut self.u, &mut self.u_prev);
        self.diffusion_solver
            .relax(Orientation::Scalar, iterations, &mut self.u, &self.u_prev, viscous);
        swap(&mut self.v, &mut self.v_prev);
        self.diffusion_solver
            .relax(Orientation::Scalar, iterations, &mut self.v, &self.v_prev, viscous);
        self.project_velocity();

        swap(&mut self.u, &mut self.u_prev);
        swap(&mut self.v, &mut self.v_prev);
        advect(Orientation::X, &mut self.u, &self.u_prev, &self.u_prev, &self.v_prev, dt);
        advect(Orientation::Y, &mut self.v, &self.v_prev, &self.u_prev, &self.v_prev, dt);
        self.project_velocity();

        self.u_prev.fill(0.0);
        self.v_prev.fill(0.0);
    }

    pub fn density_step(&mut self, dt: f32) {
        add_source(&mut self.density, &self.density_prev, dt);
        swap(&mut self.density, &mut self.density_prev);
        let coefficients = self.diffusion_coefficients(self.config.diffusion, dt);
        self.diffusion_solver.relax(
            Orientation::Scalar,
            self.config.linear.iterations,
            &mut self.density,
            &self.density_prev,
            coefficients,
        );
        swap(&mut self.density, &mut self.density_prev);
        advect(
            Orientation::Scalar,
            &mut self.density,
            &self.density_prev,
            &self.u,
            &self.v,
            dt,
        );
        self.density_prev.fill(0.0);
    }

    fn diffusion_coefficients(&self, k: f32, dt: f32) -> Coefficients {
        let n = self.grid.resolution() as f32;
        Coefficients::diffusion(dt * k * n * n, self.config.linear.stencil)
    }

    fn project_velocity(&mut self) {
        project(
            &mut self.u,
            &mut self.v,
            &mut self.u_prev,
            &mut self.v_prev,
            self.projection_solver.as_mut(),
            self.config.projection_iterations,
            Coefficients::poisson(self.config.linear.stencil),
        );
    }
}

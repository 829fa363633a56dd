use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use stable_fluids::{max_divergence, FluidConfig, FluidSolver, SolverChoice};
use std::path::PathBuf;
use std::time::Instant;

/// Headless stable-fluids runner: a centre emitter pushes density and
/// momentum into the grid while per-step statistics are logged.
#[derive(Parser, Debug)]
#[command(name = "stable-fluids", version, about)]
struct Cli {
    /// JSON configuration file; unset fields take their defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Interior cells per axis.
    #[arg(short, long)]
    resolution: Option<usize>,

    /// jacobi, gauss-seidel, conjugate-gradient or multigrid.
    #[arg(short, long)]
    solver: Option<SolverChoice>,

    #[arg(long)]
    dt: Option<f32>,

    #[arg(long, default_value_t = 200)]
    steps: usize,

    /// Log statistics every this many steps.
    #[arg(long, default_value_t = 20)]
    report_every: usize,

    /// Density injected per step at the emitter.
    #[arg(long, default_value_t = 100.0)]
    emit_density: f32,

    /// Upward force applied per step at the emitter.
    #[arg(long, default_value_t = 20.0)]
    emit_force: f32,

    /// Write the effective configuration as JSON and exit.
    #[arg(long)]
    dump_config: Option<PathBuf>,

    /// Log filter (trace, debug, info, warn, error or env_logger directives).
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn load_config(cli: &Cli) -> Result<FluidConfig> {
    let mut config = match &cli.config {
        Some(path) => FluidConfig::load_json(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => FluidConfig::default(),
    };
    if let Some(resolution) = cli.resolution {
        config.resolution = resolution;
    }
    if let Some(solver) = cli.solver {
        config.solver = solver;
    }
    if let Some(dt) = cli.dt {
        config.dt = dt;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn emit(fluid: &mut FluidSolver, density: f32, force: f32) {
    let n = fluid.grid().resolution();
    let centre = n / 2;
    let lo = centre.saturating_sub(1).max(1);
    let hi = (centre + 1).min(n);
    for j in lo..=hi {
        for i in lo..=hi {
            fluid.add_density(i, j, density);
            fluid.add_velocity(i, j, 0.0, force);
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .init();

    let config = load_config(&cli)?;
    if let Some(path) = &cli.dump_config {
        config
            .save_json(path)
            .with_context(|| format!("writing {}", path.display()))?;
        info!("wrote configuration to {}", path.display());
        return Ok(());
    }

    let dt = config.dt;
    let mut fluid = FluidSolver::new(config).context("setting up fluid solver")?;
    let report_every = cli.report_every.max(1);
    let started = Instant::now();
    let mut resets = 0;
    for step in 1..=cli.steps {
        emit(&mut fluid, cli.emit_density, cli.emit_force);
        fluid.step(dt);
        if !fluid.is_finite() {
            warn!("non-finite values after step {step}, resetting fields");
            fluid.reset();
            resets += 1;
            continue;
        }
        if step % report_every == 0 || step == cli.steps {
            let stats = fluid.density().stats();
            let (u, v) = fluid.velocity();
            info!(
                "step {step:>5} mass {:.4} density [{:.4}, {:.4}] |u| {:.4} |v| {:.4} max div {:.3e}",
                stats.sum,
                stats.min,
                stats.max,
                u.interior_abs_max(),
                v.interior_abs_max(),
                max_divergence(u, v)
            );
        }
    }
    let elapsed = started.elapsed();
    info!(
        "{} steps in {:.2?} ({:.2} ms/step), {resets} resets",
        cli.steps,
        elapsed,
        elapsed.as_secs_f64() * 1000.0 / cli.steps.max(1) as f64
    );
    Ok(())
}

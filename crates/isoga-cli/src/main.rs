//! isoga command-line interface.

mod report;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use isoga_solver::stencil::{laplace_1d, laplace_2d};
use isoga_solver::{
    BlockOperator, CsrMatrix, LinearOperator, MatrixOp, SmootherConfig, SmootherKind,
    build_smoother, norm2,
};

use crate::report::print_history;

#[derive(Parser)]
#[command(name = "isoga")]
#[command(about = "Relaxation smoothers for isogeometric solvers", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a smoother as a stationary iteration on a model problem
    Smooth {
        /// Model problem
        #[arg(long, value_enum, default_value = "laplace1d")]
        problem: Problem,

        /// Grid points per direction
        #[arg(long, default_value_t = 32)]
        size: usize,

        #[command(flatten)]
        smoother: SmootherArgs,
    },

    /// Run one smoother per diagonal block of a two-block system
    Block {
        /// Size of the first block (the second has one more unknown)
        #[arg(long, default_value_t = 16)]
        size: usize,

        #[command(flatten)]
        smoother: SmootherArgs,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Problem {
    /// 1D Laplacian, tridiagonal
    #[value(name = "laplace1d")]
    Laplace1d,
    /// 2D Laplacian, 5-point stencil
    #[value(name = "laplace2d")]
    Laplace2d,
}

#[derive(Args)]
struct SmootherArgs {
    /// Smoother: richardson, jacobi, gauss-seidel or symmetric-gauss-seidel
    #[arg(long, default_value = "symmetric-gauss-seidel")]
    smoother: SmootherKind,

    /// Sweeps per smoother application
    #[arg(long, default_value_t = 1)]
    sweeps: usize,

    /// Damping factor (Richardson and Jacobi only)
    #[arg(long)]
    damping: Option<f64>,

    /// Outer iterations
    #[arg(long, default_value_t = 20)]
    iterations: usize,

    /// JSON smoother configuration (overrides --smoother, --sweeps and --damping)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the residual of every iteration
    #[arg(short, long)]
    verbose: bool,
}

impl SmootherArgs {
    fn smoother_config(&self) -> Result<SmootherConfig> {
        if let Some(ref path) = self.config {
            return load_config(path);
        }

        let mut config = SmootherConfig::new(self.smoother).with_sweeps(self.sweeps);
        if let Some(damping) = self.damping {
            config = config.with_damping(damping);
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Smooth {
            problem,
            size,
            smoother,
        } => run_smooth(problem, size, &smoother),
        Command::Block { size, smoother } => run_block(size, &smoother),
    }
}

fn load_config(path: &Path) -> Result<SmootherConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("invalid smoother configuration in {}", path.display()))
}

fn run_smooth(problem: Problem, size: usize, args: &SmootherArgs) -> Result<()> {
    let (name, matrix): (String, CsrMatrix) = match problem {
        Problem::Laplace1d => (format!("1D Laplacian, n = {}", size), laplace_1d(size)?),
        Problem::Laplace2d => (
            format!("2D Laplacian, {}x{} grid", size, size),
            laplace_2d(size, size)?,
        ),
    };
    let matrix = Arc::new(matrix);
    let config = args.smoother_config()?;

    let smoother = build_smoother(Arc::clone(&matrix), &config)
        .context("failed to build smoother")?;
    let system = MatrixOp::from_shared(matrix);

    println!("Problem:  {} ({} unknowns)", name, system.rows());
    println!("Smoother: {} ({} sweeps)", config.kind, config.sweeps);
    println!();

    let rhs = vec![1.0; system.rows()];
    let history = stationary_iteration(&system, &smoother, &rhs, args.iterations)?;
    print_history(&history, args.verbose);
    Ok(())
}

fn run_block(size: usize, args: &SmootherArgs) -> Result<()> {
    let config = args.smoother_config()?;
    let sizes = [size, size + 1];

    let mut system = BlockOperator::new(2, 2);
    let mut precond = BlockOperator::new(2, 2);
    for (i, &n) in sizes.iter().enumerate() {
        let matrix = Arc::new(laplace_1d(n)?);
        let smoother = build_smoother(Arc::clone(&matrix), &config)
            .with_context(|| format!("failed to build smoother for block {}", i))?;

        system.add_operator(i, i, Arc::new(MatrixOp::from_shared(matrix)))?;
        precond.add_operator(i, i, Arc::new(smoother))?;
    }
    let unknowns = system.try_rows()?;

    println!(
        "Problem:  block-diagonal 1D Laplacians, n = {} + {} ({} unknowns)",
        sizes[0], sizes[1], unknowns
    );
    println!(
        "Smoother: {} per block ({} sweeps)",
        config.kind, config.sweeps
    );
    println!();

    let rhs = vec![1.0; unknowns];
    let history = stationary_iteration(&system, &precond, &rhs, args.iterations)?;
    print_history(&history, args.verbose);
    Ok(())
}

/// Run x <- x + P (f - A x) from x = 0 and return the residual norm history.
fn stationary_iteration(
    system: &dyn LinearOperator,
    precond: &dyn LinearOperator,
    rhs: &[f64],
    iterations: usize,
) -> Result<Vec<f64>> {
    let n = rhs.len();
    let mut x = vec![0.0; n];
    let mut ax = vec![0.0; n];
    let mut r = vec![0.0; n];
    let mut correction = vec![0.0; n];
    let mut history = Vec::with_capacity(iterations + 1);

    for k in 0..=iterations {
        system.apply(&x, &mut ax)?;
        for i in 0..n {
            r[i] = rhs[i] - ax[i];
        }
        history.push(norm2(&r));

        if k == iterations {
            break;
        }

        precond.apply(&r, &mut correction)?;
        for (xi, &ci) in x.iter_mut().zip(correction.iter()) {
            *xi += ci;
        }
    }

    Ok(history)
}

//! Finite-Size Percolation Threshold - Bisection on Sampled P(p)
//! ===============================================================
//! Estimates pc(N) for one lattice side, then characterises the lattice at the
//! estimate (one trial plus a batch of M trials split by outcome). With
//! `--sweep`, estimates pc(N) for every side in the configured list instead.
//! Author: Francisco Molina Burgos

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use percolation::{
    aggregate, finite_size_thresholds, run_trial, AggregateMetrics, FiniteSizeThreshold,
    MonteCarloSampler, SimulationConfig, ThresholdEstimate, TrialResult,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// JSON config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Lattice side N
    #[arg(short = 'n', long)]
    size: Option<usize>,

    /// Trials per bisection step (M)
    #[arg(short = 'm', long)]
    trials: Option<usize>,

    /// Accept p once |P(p) - 0.5| <= tolerance
    #[arg(long)]
    tolerance: Option<f64>,

    /// Bisection step cap
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Wall-clock budget per search, in seconds
    #[arg(long)]
    time_budget: Option<f64>,

    #[arg(long)]
    seed: Option<u64>,

    /// Estimate pc(N) for every configured lattice side
    #[arg(long, default_value_t = false)]
    sweep: bool,

    /// Lattice sides for --sweep, comma separated
    #[arg(long, value_delimiter = ',')]
    sizes: Option<Vec<usize>>,

    #[arg(long)]
    out_dir: Option<String>,
}

impl Args {
    fn into_config(self) -> Result<(SimulationConfig, bool)> {
        let mut cfg = match &self.config {
            Some(path) => SimulationConfig::from_json_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => SimulationConfig::default(),
        };
        if let Some(n) = self.size {
            cfg.lattice_size = n;
        }
        if let Some(m) = self.trials {
            cfg.trials = m;
        }
        if let Some(t) = self.tolerance {
            cfg.tolerance = t;
        }
        if let Some(i) = self.max_iterations {
            cfg.max_iterations = i;
        }
        if self.time_budget.is_some() {
            cfg.time_budget_secs = self.time_budget;
        }
        if let Some(seed) = self.seed {
            cfg.seed = seed;
        }
        if let Some(sizes) = self.sizes {
            cfg.sizes = sizes;
        }
        if let Some(dir) = self.out_dir {
            cfg.out_dir = dir;
        }
        cfg.validate()?;
        Ok((cfg, self.sweep))
    }
}

#[derive(Serialize)]
struct ThresholdReport {
    n: usize,
    trials: usize,
    seed: u64,
    tolerance: f64,
    estimate: ThresholdEstimate,
    single_trial: TrialResult,
    metrics: AggregateMetrics,
    total_time_sec: f64,
}

#[derive(Serialize)]
struct SweepReport {
    trials: usize,
    seed: u64,
    tolerance: f64,
    thresholds: Vec<FiniteSizeThreshold>,
    total_time_sec: f64,
}

fn run_single(cfg: &SimulationConfig) -> Result<ThresholdReport> {
    let n = cfg.lattice_size;
    println!("\n{}", "=".repeat(70));
    println!("THRESHOLD SEARCH: N={}, M={} trials/step", n, cfg.trials);
    println!("{}", "=".repeat(70));

    let start = Instant::now();
    let mut rng = ChaCha8Rng::seed_from_u64(cfg.seed);

    let mut sampler = MonteCarloSampler::new(n, cfg.trials, &mut rng)?;
    let estimate = cfg.threshold_search()?.run(&mut sampler)?;
    println!(
        "Finite threshold for N={}: {:.5} (P={:.3}, {} steps, bracket [{:.5}, {:.5}])",
        n,
        estimate.threshold,
        estimate.sampled_probability,
        estimate.iterations,
        estimate.lower,
        estimate.upper
    );

    let single_trial = run_trial(n, estimate.threshold, &mut rng)?;
    println!(
        "Percolated: {} | Largest cluster: {} | Total clusters: {}",
        single_trial.percolated, single_trial.largest_cluster_size, single_trial.cluster_count
    );

    let metrics = aggregate(n, estimate.threshold, cfg.trials, &mut rng)?;
    print_metrics(&metrics);

    Ok(ThresholdReport {
        n,
        trials: cfg.trials,
        seed: cfg.seed,
        tolerance: cfg.tolerance,
        estimate,
        single_trial,
        metrics,
        total_time_sec: start.elapsed().as_secs_f64(),
    })
}

fn print_metrics(m: &AggregateMetrics) {
    println!("\n--- {} trials at the estimated threshold ---", m.trials);
    println!(
        "Percolated:     theta={:.3} | trials={} | mean largest={:.2} | max={} | clusters={:.2}",
        m.percolation_probability,
        m.percolating.count,
        m.percolating.mean_largest_cluster,
        m.percolating.max_largest_cluster().unwrap_or(0),
        m.percolating.mean_cluster_count
    );
    println!(
        "Not percolated: theta={:.3} | trials={} | mean largest={:.2} | max={} | clusters={:.2}",
        m.non_percolation_probability,
        m.non_percolating.count,
        m.non_percolating.mean_largest_cluster,
        m.non_percolating.max_largest_cluster().unwrap_or(0),
        m.non_percolating.mean_cluster_count
    );
}

fn run_sweep(cfg: &SimulationConfig) -> Result<SweepReport> {
    println!("\n{}", "=".repeat(70));
    println!("FINITE-SIZE SWEEP: N={:?}, M={} trials/step", cfg.sizes, cfg.trials);
    println!("{}", "=".repeat(70));

    let start = Instant::now();
    let mut rng = ChaCha8Rng::seed_from_u64(cfg.seed);
    let search = cfg.threshold_search()?;
    let thresholds = finite_size_thresholds(&cfg.sizes, cfg.trials, &search, &mut rng)?;

    for entry in &thresholds {
        match (&entry.estimate, &entry.best, entry.stopped) {
            (Some(est), _, _) => println!(
                "  N={:>5}: pc(N) = {:.5} ({} steps)",
                entry.n, est.threshold, est.iterations
            ),
            (None, Some(best), Some(reason)) => println!(
                "  N={:>5}: not converged ({}), best {:.5} with P={:.3}",
                entry.n, reason, best.threshold, best.sampled_probability
            ),
            _ => println!("  N={:>5}: no estimate", entry.n),
        }
    }

    Ok(SweepReport {
        trials: cfg.trials,
        seed: cfg.seed,
        tolerance: cfg.tolerance,
        thresholds,
        total_time_sec: start.elapsed().as_secs_f64(),
    })
}

fn write_json<T: Serialize>(dir: &str, name: &str, value: &T) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating {dir}"))?;
    let path = Path::new(dir).join(name);
    let json = serde_json::to_string_pretty(value)?;
    fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(path = %path.display(), "report written");
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let (cfg, sweep) = Args::parse().into_config()?;

    println!("{}", "=".repeat(70));
    println!("SITE PERCOLATION THRESHOLD (seed {})", cfg.seed);
    println!("{}", "=".repeat(70));

    if sweep {
        let report = run_sweep(&cfg)?;
        write_json(&cfg.out_dir, "thresholds_sweep.json", &report)?;
    } else {
        let report = run_single(&cfg)?;
        let name = format!("threshold_N{}.json", report.n);
        write_json(&cfg.out_dir, &name, &report)?;
    }

    println!("\n{}", "=".repeat(70));
    println!("COMPLETE");
    println!("{}", "=".repeat(70));
    Ok(())
}

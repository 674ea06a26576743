//! Cluster Statistics at Fixed p - Largest Cluster and Cluster Count
//! ==================================================================
//! Runs M trials at a fixed (N, p) and summarises the distribution of the
//! largest-cluster size and of the number of clusters (min, quartiles, max),
//! overall and split by whether the trial percolated.
//! Author: Francisco Molina Burgos

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use percolation::{
    aggregate, AggregateMetrics, FiveNumberSummary, SimulationConfig, SubgroupMetrics,
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

    /// Lattice side N [default: 512, or the config file's value]
    #[arg(short = 'n', long)]
    size: Option<usize>,

    /// Occupation probability p [default: 0.6, or the config file's value]
    #[arg(short = 'p', long)]
    probability: Option<f64>,

    /// Number of trials
    #[arg(short = 'm', long)]
    trials: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    out_dir: Option<String>,
}

/// Lattice side used when neither the config file nor a flag sets one.
const DEFAULT_SIZE: usize = 512;

impl Args {
    fn into_config(self) -> Result<SimulationConfig> {
        let mut cfg = match &self.config {
            Some(path) => SimulationConfig::from_json_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => SimulationConfig {
                lattice_size: DEFAULT_SIZE,
                ..SimulationConfig::default()
            },
        };
        if let Some(n) = self.size {
            cfg.lattice_size = n;
        }
        if let Some(p) = self.probability {
            cfg.probability = p;
        }
        if let Some(m) = self.trials {
            cfg.trials = m;
        }
        if let Some(seed) = self.seed {
            cfg.seed = seed;
        }
        if let Some(dir) = self.out_dir {
            cfg.out_dir = dir;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

#[derive(Serialize)]
struct DistributionSummary {
    largest_cluster: Option<FiveNumberSummary>,
    cluster_count: Option<FiveNumberSummary>,
}

impl DistributionSummary {
    fn of(largest: &[usize], counts: &[usize]) -> Self {
        Self {
            largest_cluster: FiveNumberSummary::from_counts(largest),
            cluster_count: FiveNumberSummary::from_counts(counts),
        }
    }

    fn of_subgroup(group: &SubgroupMetrics) -> Self {
        Self::of(&group.largest_cluster_sizes, &group.cluster_counts)
    }
}

#[derive(Serialize)]
struct ClusterStatsReport {
    n: usize,
    p: f64,
    trials: usize,
    seed: u64,
    all: DistributionSummary,
    percolating: DistributionSummary,
    non_percolating: DistributionSummary,
    metrics: AggregateMetrics,
    total_time_sec: f64,
}

fn print_summary(label: &str, n_trials: usize, n: usize, p: f64, s: &Option<FiveNumberSummary>) {
    println!("\nSummary of {} over {} trials with N = {} and p = {}", label, n_trials, n, p);
    match s {
        Some(s) => println!(
            "Min: {} | Q1: {} | Median: {} | Q3: {} | Max: {}",
            s.min, s.q1, s.median, s.q3, s.max
        ),
        None => println!("(no trials)"),
    }
}

fn run_stats(n: usize, p: f64, trials: usize, seed: u64) -> Result<ClusterStatsReport> {
    println!("\n{}", "=".repeat(70));
    println!("CLUSTER STATISTICS: N={}, p={}, {} trials", n, p, trials);
    println!("{}", "=".repeat(70));

    let start = Instant::now();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let metrics = aggregate(n, p, trials, &mut rng)?;

    let mut largest = metrics.percolating.largest_cluster_sizes.clone();
    largest.extend_from_slice(&metrics.non_percolating.largest_cluster_sizes);
    let mut counts = metrics.percolating.cluster_counts.clone();
    counts.extend_from_slice(&metrics.non_percolating.cluster_counts);
    let all = DistributionSummary::of(&largest, &counts);

    print_summary("the largest cluster", trials, n, p, &all.largest_cluster);
    print_summary("the cluster count", trials, n, p, &all.cluster_count);
    println!(
        "\nPercolated in {}/{} trials (theta = {:.3})",
        metrics.percolating.count, trials, metrics.percolation_probability
    );

    Ok(ClusterStatsReport {
        n,
        p,
        trials,
        seed,
        all,
        percolating: DistributionSummary::of_subgroup(&metrics.percolating),
        non_percolating: DistributionSummary::of_subgroup(&metrics.non_percolating),
        metrics,
        total_time_sec: start.elapsed().as_secs_f64(),
    })
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cfg = Args::parse().into_config()?;

    let report = run_stats(cfg.lattice_size, cfg.probability, cfg.trials, cfg.seed)?;

    fs::create_dir_all(&cfg.out_dir).with_context(|| format!("creating {}", cfg.out_dir))?;
    let name = format!("cluster_stats_N{}_p{}.json", report.n, report.p);
    let path = Path::new(&cfg.out_dir).join(name);
    let json = serde_json::to_string_pretty(&report)?;
    fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(path = %path.display(), "report written");

    println!("\n{}", "=".repeat(70));
    println!("COMPLETE");
    println!("{}", "=".repeat(70));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(tag: &str, json: &str) -> PathBuf {
        let path = std::env::temp_dir()
            .join(format!("cluster_stats_{}_{}.json", tag, std::process::id()));
        fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn config_file_sets_size_and_probability() {
        let path = write_config("file", r#"{"lattice_size": 8, "probability": 0.3, "trials": 5}"#);
        let args = Args::try_parse_from(["cluster_stats", "--config", path.to_str().unwrap()])
            .unwrap();
        let cfg = args.into_config().unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(cfg.lattice_size, 8);
        assert_eq!(cfg.probability, 0.3);
        assert_eq!(cfg.trials, 5);
    }

    #[test]
    fn flags_override_config_file() {
        let path = write_config("flags", r#"{"lattice_size": 8, "probability": 0.3}"#);
        let args = Args::try_parse_from([
            "cluster_stats",
            "--config",
            path.to_str().unwrap(),
            "-n",
            "32",
            "-p",
            "0.55",
        ])
        .unwrap();
        let cfg = args.into_config().unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(cfg.lattice_size, 32);
        assert_eq!(cfg.probability, 0.55);
    }

    #[test]
    fn defaults_without_file_or_flags() {
        let cfg = Args::try_parse_from(["cluster_stats"]).unwrap().into_config().unwrap();
        assert_eq!(cfg.lattice_size, DEFAULT_SIZE);
        assert_eq!(cfg.probability, 0.6);
    }

    #[test]
    fn invalid_probability_flag_is_rejected() {
        let args = Args::try_parse_from(["cluster_stats", "-p", "1.5"]).unwrap();
        assert!(args.into_config().is_err());
    }
}

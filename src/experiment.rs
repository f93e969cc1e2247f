//! Replication harness: seed plans, batches of replications, and common-random-number comparisons.

use crate::config::Config;
use crate::metrics::{Metric, Summary};
use crate::replication;
use crate::stats::{self, Estimate};
use serde::Serialize;
use tracing::{debug, info};

/// Seeds for configuration number `config_index` in an experiment whose configurations must not share random
/// numbers: `base + 1000 * config_index + r`.
pub fn independent_seeds(base: u64, config_index: u64, replications: usize) -> Vec<u64> {
    common_seeds(base + 1000 * config_index, replications)
}

/// Seeds shared by every configuration in a common-random-number experiment: `base + r`.
pub fn common_seeds(base: u64, replications: usize) -> Vec<u64> {
    (0..replications as u64).map(|r| base + r).collect()
}

/// Run `config` once per seed, in order.
///
/// # Errors
///
/// The first replication that fails. A configuration error surfaces before anything runs.
pub fn replicate(config: &Config, seeds: &[u64]) -> crate::Result<Vec<Summary>> {
    config.validate()?;
    let summaries = seeds
        .iter()
        .map(|seed| replication::run(&config.with_seed(*seed)))
        .collect::<crate::Result<Vec<_>>>()?;

    debug!(replications = summaries.len(), "replications complete");
    Ok(summaries)
}

/// Mean and confidence interval of every statistic over a batch of replications.
pub fn estimates(summaries: &[Summary]) -> Vec<(Metric, Estimate)> {
    Metric::ALL
        .iter()
        .map(|metric| (*metric, stats::estimate(summaries, *metric)))
        .collect()
}

/// One statistic of a two-configuration comparison.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Comparison {
    pub metric: Metric,
    pub left: Estimate,
    pub right: Estimate,
    /// `left - right`, paired by replication.
    pub difference: Estimate,
}

/// Run both configurations on the same `replications` seeds starting at `base_seed` and compare every statistic.
///
/// Only the seeds of the two configurations are overridden; everything else is taken as given.
///
/// # Errors
///
/// See [`replicate()`].
pub fn compare_crn(
    left: &Config,
    right: &Config,
    replications: usize,
    base_seed: u64,
) -> crate::Result<Vec<Comparison>> {
    let seeds = common_seeds(base_seed, replications);
    let left_runs = replicate(left, &seeds)?;
    let right_runs = replicate(right, &seeds)?;

    let comparisons = Metric::ALL
        .iter()
        .map(|metric| {
            Ok(Comparison {
                metric: *metric,
                left: stats::estimate(&left_runs, *metric),
                right: stats::estimate(&right_runs, *metric),
                difference: stats::crn_difference(&left_runs, &right_runs, *metric)?,
            })
        })
        .collect::<crate::Result<Vec<_>>>()?;

    info!(replications, base_seed, "common random number comparison complete");
    Ok(comparisons)
}

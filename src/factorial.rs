//! Two-level full factorial designs over [`Config`] and the effect-coded regression fitted to them.
//!
//! Each factor maps a [`Level`] onto a configuration. The `2^k` corners are enumerated in standard (Yates) order,
//! with the first factor alternating fastest, and every corner is replicated on the same seeds so that effects are
//! estimated under common random numbers. Effects come from an ordinary least squares fit of the corner means on the
//! coded levels, so a main effect is half the average change in the response from the low to the high level.

use crate::config::{Config, DurationDistribution};
use crate::experiment;
use crate::metrics::{Metric, Summary};
use crate::stats;
use serde::Serialize;
use std::fmt::{Debug, Formatter};
use tracing::debug;

/// Pivots smaller than this make the normal equations singular.
const PIVOT_TOLERANCE: f64 = 1e-12;

/// Level of one factor at one corner, coded -1 (low) or +1 (high).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub fn coded(self) -> f64 {
        match self {
            Level::Low => -1.0,
            Level::High => 1.0,
        }
    }
}

type Apply = Box<dyn Fn(&mut Config, Level)>;

/// A named input of the design and how each of its levels changes a configuration.
pub struct Factor {
    name: String,
    apply: Apply,
}

impl Factor {
    pub fn new<F>(name: impl Into<String>, apply: F) -> Self
    where
        F: Fn(&mut Config, Level) + 'static,
    {
        Self {
            name: name.into(),
            apply: Box::new(apply),
        }
    }

    /// Number of preparation rooms, named `P`.
    pub fn preparation_rooms(low: usize, high: usize) -> Self {
        Self::new("P", move |config, level| config.preparation_rooms = pick(level, low, high))
    }

    /// Number of recovery beds, named `R`.
    pub fn recovery_beds(low: usize, high: usize) -> Self {
        Self::new("R", move |config, level| config.recovery_beds = pick(level, low, high))
    }

    pub fn interarrival(low: DurationDistribution, high: DurationDistribution) -> Self {
        Self::new("interarrival", move |config, level| config.interarrival = pick(level, low, high))
    }

    pub fn preparation(low: DurationDistribution, high: DurationDistribution) -> Self {
        Self::new("preparation", move |config, level| config.preparation = pick(level, low, high))
    }

    pub fn recovery(low: DurationDistribution, high: DurationDistribution) -> Self {
        Self::new("recovery", move |config, level| config.recovery = pick(level, low, high))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn apply(&self, config: &mut Config, level: Level) {
        (self.apply)(config, level)
    }
}

impl Debug for Factor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Factor").field("name", &self.name).finish_non_exhaustive()
    }
}

fn pick<T: Copy>(level: Level, low: T, high: T) -> T {
    match level {
        Level::Low => low,
        Level::High => high,
    }
}

/// Replications at one corner of the design.
#[derive(Clone, Debug, Serialize)]
pub struct CornerResult {
    pub levels: Vec<Level>,
    pub config: Config,
    pub summaries: Vec<Summary>,
}

impl CornerResult {
    /// Mean of `metric` over this corner's replications, if every replication defined it.
    pub fn mean(&self, metric: Metric) -> Option<f64> {
        stats::estimate(&self.summaries, metric).mean
    }
}

/// A full two-level factorial design.
#[derive(Debug)]
pub struct FactorialDesign {
    factors: Vec<Factor>,
}

impl FactorialDesign {
    /// # Errors
    ///
    /// [`Error::Design`](crate::Error::Design) if there are no factors or two factors share a name.
    pub fn new(factors: Vec<Factor>) -> crate::Result<Self> {
        if factors.is_empty() {
            return Err(crate::Error::Design("a design needs at least one factor".into()));
        }
        for (i, factor) in factors.iter().enumerate() {
            if factors[..i].iter().any(|other| other.name == factor.name) {
                return Err(crate::Error::Design(format!("factor {} appears twice", factor.name)));
            }
        }

        Ok(Self { factors })
    }

    pub fn factors(&self) -> &[Factor] {
        &self.factors
    }

    /// All `2^k` corners in standard order: factor `j` is high exactly when bit `j` of the corner index is set.
    pub fn corners(&self) -> Vec<Vec<Level>> {
        (0..1usize << self.factors.len())
            .map(|index| {
                (0..self.factors.len())
                    .map(|j| if (index >> j) & 1 == 1 { Level::High } else { Level::Low })
                    .collect()
            })
            .collect()
    }

    /// `base` with every factor set to its level at `corner`.
    pub fn configure(&self, base: &Config, corner: &[Level]) -> Config {
        let mut config = base.clone();
        for (factor, level) in self.factors.iter().zip(corner) {
            factor.apply(&mut config, *level);
        }
        config
    }

    /// Replicate every corner `replications` times on the common seeds `base_seed + r`.
    ///
    /// # Errors
    ///
    /// The first corner whose configuration is rejected, or whose replications fail.
    pub fn run(&self, base: &Config, replications: usize, base_seed: u64) -> crate::Result<Vec<CornerResult>> {
        let seeds = experiment::common_seeds(base_seed, replications);
        self.corners()
            .into_iter()
            .map(|levels| {
                let config = self.configure(base, &levels);
                debug!(?levels, "replicating corner");
                let summaries = experiment::replicate(&config, &seeds)?;
                Ok(CornerResult {
                    levels,
                    config,
                    summaries,
                })
            })
            .collect()
    }

    /// Fit `metric` on the coded levels, with all two-factor interactions if `interactions` is set.
    ///
    /// Returns `Ok(None)` if `metric` is undefined at any corner.
    ///
    /// # Errors
    ///
    /// [`Error::Design`](crate::Error::Design) if there are no results, a corner has the wrong number of levels, or
    /// the normal equations are singular (e.g. corners missing from the design).
    pub fn fit(&self, results: &[CornerResult], metric: Metric, interactions: bool) -> crate::Result<Option<Effects>> {
        if results.is_empty() {
            return Err(crate::Error::Design("no corner results to fit".into()));
        }

        let terms = self.term_names(interactions);
        let mut rows = Vec::with_capacity(results.len());
        let mut responses = Vec::with_capacity(results.len());
        for result in results {
            if result.levels.len() != self.factors.len() {
                return Err(crate::Error::Design(format!(
                    "corner has {} levels for {} factors",
                    result.levels.len(),
                    self.factors.len()
                )));
            }
            let Some(response) = result.mean(metric) else {
                return Ok(None);
            };
            rows.push(regressors(&result.levels, interactions));
            responses.push(response);
        }

        let coefficients = least_squares(&rows, &responses)?;
        debug!(%metric, ?coefficients, "fitted factorial effects");
        Ok(Some(Effects {
            metric,
            interactions,
            terms: terms.into_iter().zip(coefficients).collect(),
        }))
    }

    fn term_names(&self, interactions: bool) -> Vec<String> {
        let mut names = vec![String::from("intercept")];
        names.extend(self.factors.iter().map(|factor| factor.name.clone()));
        if interactions {
            for i in 0..self.factors.len() {
                for j in i + 1..self.factors.len() {
                    names.push(format!("{}:{}", self.factors[i].name, self.factors[j].name));
                }
            }
        }
        names
    }
}

/// Intercept, coded main effects, then pairwise products in `(i, j)` order with `i < j`.
fn regressors(levels: &[Level], interactions: bool) -> Vec<f64> {
    let coded: Vec<f64> = levels.iter().map(|level| level.coded()).collect();
    let mut row = Vec::with_capacity(1 + coded.len() * (coded.len() + 1) / 2);
    row.push(1.0);
    row.extend_from_slice(&coded);
    if interactions {
        for i in 0..coded.len() {
            for j in i + 1..coded.len() {
                row.push(coded[i] * coded[j]);
            }
        }
    }
    row
}

/// Solve the normal equations `X'X b = X'y` by Gaussian elimination with partial pivoting.
fn least_squares(rows: &[Vec<f64>], responses: &[f64]) -> crate::Result<Vec<f64>> {
    let width = rows.first().map_or(0, Vec::len);
    let mut augmented = vec![vec![0.0; width + 1]; width];
    for (row, response) in rows.iter().zip(responses) {
        for i in 0..width {
            for j in 0..width {
                augmented[i][j] += row[i] * row[j];
            }
            augmented[i][width] += row[i] * response;
        }
    }

    for column in 0..width {
        let pivot = (column..width)
            .max_by(|a, b| augmented[*a][column].abs().total_cmp(&augmented[*b][column].abs()))
            .unwrap_or(column);
        if augmented[pivot][column].abs() < PIVOT_TOLERANCE {
            return Err(crate::Error::Design("normal equations are singular".into()));
        }
        augmented.swap(column, pivot);

        for row in column + 1..width {
            let factor = augmented[row][column] / augmented[column][column];
            for k in column..=width {
                augmented[row][k] -= factor * augmented[column][k];
            }
        }
    }

    let mut solution = vec![0.0; width];
    for row in (0..width).rev() {
        let tail: f64 = (row + 1..width).map(|k| augmented[row][k] * solution[k]).sum();
        solution[row] = (augmented[row][width] - tail) / augmented[row][row];
    }
    Ok(solution)
}

/// Fitted coefficients for one response statistic, in term order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Effects {
    pub metric: Metric,
    pub interactions: bool,
    pub terms: Vec<(String, f64)>,
}

impl Effects {
    /// Coefficient of a term: `"intercept"`, a factor name, or `"A:B"` for an interaction.
    pub fn get(&self, term: &str) -> Option<f64> {
        self.terms.iter().find(|(name, _)| name == term).map(|(_, beta)| *beta)
    }

    pub fn intercept(&self) -> f64 {
        self.terms[0].1
    }

    /// Fitted response at `levels`, which must list one level per factor.
    pub fn predict(&self, levels: &[Level]) -> f64 {
        regressors(levels, self.interactions)
            .iter()
            .zip(&self.terms)
            .map(|(x, (_, beta))| x * beta)
            .sum()
    }
}

//! Inference across replications: Student-t confidence intervals, common-random-number pairing, and the
//! independent-sample comparison it improves on.

use crate::metrics::{Metric, Summary};
use serde::Serialize;

/// Two-sided 95% Student-t critical value for 19 degrees of freedom, i.e. twenty replications.
pub const T_CRIT_DF19: f64 = 2.093;

/// Mean and confidence interval of one statistic. Every field is `None` when it cannot be computed.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Estimate {
    /// Replications (or pairs) the estimate was asked to cover, including any that left the statistic undefined.
    pub samples: usize,
    pub mean: Option<f64>,
    pub half_width: Option<f64>,
    pub interval: Option<(f64, f64)>,
}

impl Estimate {
    pub const UNDEFINED: Estimate = Estimate {
        samples: 0,
        mean: None,
        half_width: None,
        interval: None,
    };

    /// Nothing could be computed over `samples` replications, e.g. because one of them left the statistic undefined.
    pub fn undefined(samples: usize) -> Self {
        Self {
            samples,
            ..Self::UNDEFINED
        }
    }

    /// `half_width / mean`, defined only for a positive mean.
    pub fn relative_half_width(&self) -> Option<f64> {
        match (self.mean, self.half_width) {
            (Some(mean), Some(half)) if mean > 0.0 => Some(half / mean),
            _ => None,
        }
    }

    /// Whether the interval excludes zero, i.e. a difference is significant at the 95% level.
    pub fn excludes_zero(&self) -> Option<bool> {
        self.interval.map(|(low, high)| low > 0.0 || high < 0.0)
    }
}

impl std::fmt::Display for Estimate {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match (self.mean, self.interval) {
            (Some(mean), Some((low, high))) => write!(f, "mean={mean:.6}, 95%CI=({low:.6},{high:.6})"),
            _ => write!(f, "mean=nan, 95%CI=(nan,nan)"),
        }
    }
}

fn sample_variance(samples: &[f64], mean: f64) -> f64 {
    samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (samples.len() - 1) as f64
}

/// Sample mean and `T_CRIT_DF19 * s / sqrt(n)` half-width, with the Bessel-corrected standard deviation `s`.
///
/// With no samples everything is undefined. With one sample the mean is that sample, the half-width is undefined,
/// and the interval collapses to the point.
pub fn mean_ci(samples: &[f64]) -> Estimate {
    let n = samples.len();
    if n == 0 {
        return Estimate::UNDEFINED;
    }

    let mean = samples.iter().sum::<f64>() / n as f64;
    if n == 1 {
        return Estimate {
            samples: n,
            mean: Some(mean),
            half_width: None,
            interval: Some((mean, mean)),
        };
    }

    let half = T_CRIT_DF19 * sample_variance(samples, mean).sqrt() / (n as f64).sqrt();
    Estimate {
        samples: n,
        mean: Some(mean),
        half_width: Some(half),
        interval: Some((mean - half, mean + half)),
    }
}

/// One statistic across replications, or `None` if any replication left it undefined.
pub fn collect(summaries: &[Summary], metric: Metric) -> Option<Vec<f64>> {
    summaries.iter().map(|summary| summary.get(metric)).collect()
}

/// [`mean_ci()`] of one statistic across replications. Undefined if any replication left it undefined.
pub fn estimate(summaries: &[Summary], metric: Metric) -> Estimate {
    collect(summaries, metric).map_or_else(|| Estimate::undefined(summaries.len()), |samples| mean_ci(&samples))
}

/// Replication-by-replication differences `left - right`, for replications that shared seeds.
///
/// `Ok(None)` if either side left the statistic undefined in any replication.
///
/// # Errors
///
/// [`Error::UnpairedSamples`](crate::Error::UnpairedSamples) if the two lists differ in length.
pub fn paired_differences(left: &[Summary], right: &[Summary], metric: Metric) -> crate::Result<Option<Vec<f64>>> {
    if left.len() != right.len() {
        return Err(crate::Error::UnpairedSamples {
            left: left.len(),
            right: right.len(),
        });
    }

    Ok(left
        .iter()
        .zip(right)
        .map(|(l, r)| Some(l.get(metric)? - r.get(metric)?))
        .collect())
}

/// Confidence interval of `left - right` under common random numbers: [`mean_ci()`] of the paired differences.
///
/// # Errors
///
/// See [`paired_differences()`].
pub fn crn_difference(left: &[Summary], right: &[Summary], metric: Metric) -> crate::Result<Estimate> {
    let differences = paired_differences(left, right, metric)?;
    Ok(differences.map_or_else(|| Estimate::undefined(left.len()), |d| mean_ci(&d)))
}

/// Confidence interval of `left - right` treating the two samples as independent: the difference of means with
/// half-width `T_CRIT_DF19 * sqrt(s_l^2 / n_l + s_r^2 / n_r)`.
///
/// Needs at least two replications on each side.
pub fn independent_difference(left: &[f64], right: &[f64]) -> Estimate {
    if left.len() < 2 || right.len() < 2 {
        return Estimate::undefined(left.len().min(right.len()));
    }

    let mean_left = left.iter().sum::<f64>() / left.len() as f64;
    let mean_right = right.iter().sum::<f64>() / right.len() as f64;
    let standard_error = (sample_variance(left, mean_left) / left.len() as f64
        + sample_variance(right, mean_right) / right.len() as f64)
        .sqrt();

    let mean = mean_left - mean_right;
    let half = T_CRIT_DF19 * standard_error;
    Estimate {
        samples: left.len().min(right.len()),
        mean: Some(mean),
        half_width: Some(half),
        interval: Some((mean - half, mean + half)),
    }
}

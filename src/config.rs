//! Immutable replication input.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Distribution family for a stage duration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dist")]
pub enum DurationDistribution {
    /// Exponential with the given mean.
    #[serde(rename = "exp")]
    Exponential { mean: f64 },
    /// Uniform on `[low, high)`.
    #[serde(rename = "unif")]
    Uniform { low: f64, high: f64 },
}

impl DurationDistribution {
    pub fn exponential(mean: f64) -> Self {
        Self::Exponential { mean }
    }

    pub fn uniform(low: f64, high: f64) -> Self {
        Self::Uniform { low, high }
    }

    pub fn mean(&self) -> f64 {
        match *self {
            Self::Exponential { mean } => mean,
            Self::Uniform { low, high } => (low + high) / 2.0,
        }
    }

    /// Same family with every time parameter multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        match *self {
            Self::Exponential { mean } => Self::exponential(mean * factor),
            Self::Uniform { low, high } => Self::uniform(low * factor, high * factor),
        }
    }

    pub(crate) fn validate(&self, parameter: &'static str) -> Result<(), ConfigError> {
        match *self {
            Self::Exponential { mean } => positive(parameter, mean),
            Self::Uniform { low, high } => {
                non_negative(parameter, low)?;
                if !(low < high) || !high.is_finite() {
                    return Err(ConfigError::EmptyRange { parameter, low, high });
                }
                Ok(())
            },
        }
    }
}

/// How operation times are drawn.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scenario", rename_all = "lowercase")]
pub enum OperationScenario {
    /// Every patient is "base" and draws one exponential operation time.
    Original { mean: f64 },
    /// Each patient is "severe" with probability `severe_prob`, otherwise "mild"; each kind has its own
    /// exponential mean.
    Twisted {
        severe_prob: f64,
        severe_mean: f64,
        mild_mean: f64,
    },
}

impl OperationScenario {
    pub fn twisted(severe_prob: f64, severe_mean: f64, mild_mean: f64) -> Self {
        Self::Twisted {
            severe_prob,
            severe_mean,
            mild_mean,
        }
    }

    /// Expected operation time across patient kinds.
    pub fn mean(&self) -> f64 {
        match *self {
            Self::Original { mean } => mean,
            Self::Twisted {
                severe_prob,
                severe_mean,
                mild_mean,
            } => severe_prob * severe_mean + (1.0 - severe_prob) * mild_mean,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Self::Original { mean } => positive("operation mean", mean),
            Self::Twisted {
                severe_prob,
                severe_mean,
                mild_mean,
            } => {
                if !(0.0..=1.0).contains(&severe_prob) {
                    return Err(ConfigError::Probability { value: severe_prob });
                }
                positive("severe operation mean", severe_mean)?;
                positive("mild operation mean", mild_mean)
            },
        }
    }
}

/// Parameters of one replication.
///
/// Capacities, horizon and seed are plain fields; each stage carries its own distribution. A `Config` is never
/// mutated by a replication, so the same value can drive many seeds or, under common random numbers, many
/// configurations can share one seed.
///
/// Deserializing fills missing fields from [`Config::default()`]:
///
/// ```
/// let config = theatre_flow::Config::from_json_str(
///     r#"{ "P": 4, "R": 5, "recovery": { "dist": "unif", "low": 30.0, "high": 50.0 } }"#,
/// ).unwrap();
/// assert_eq!(4, config.preparation_rooms);
/// assert_eq!(1, config.theatres);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of preparation rooms.
    #[serde(rename = "P")]
    pub preparation_rooms: usize,
    /// Number of recovery beds.
    #[serde(rename = "R")]
    pub recovery_beds: usize,
    /// Number of operating theatres.
    #[serde(rename = "OP")]
    pub theatres: usize,
    /// Length of the observation window, after warm-up.
    #[serde(rename = "sim_time")]
    pub observation: f64,
    /// Length of the discarded warm-up period.
    pub warmup: f64,
    /// Interval between preparation-queue samples.
    #[serde(rename = "monitor_dt")]
    pub monitor_interval: f64,
    pub seed: u64,
    pub interarrival: DurationDistribution,
    pub preparation: DurationDistribution,
    pub operation: OperationScenario,
    pub recovery: DurationDistribution,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            preparation_rooms: 3,
            recovery_beds: 3,
            theatres: 1,
            observation: 1000.0,
            warmup: 200.0,
            monitor_interval: 1.0,
            seed: 123,
            interarrival: DurationDistribution::exponential(25.0),
            preparation: DurationDistribution::exponential(40.0),
            operation: OperationScenario::Original { mean: 20.0 },
            recovery: DurationDistribution::exponential(40.0),
        }
    }
}

impl Config {
    /// Default configuration with the given preparation rooms and recovery beds, the "xPyR" shorthand.
    pub fn with_capacities(preparation_rooms: usize, recovery_beds: usize) -> Self {
        Self {
            preparation_rooms,
            recovery_beds,
            ..Self::default()
        }
    }

    /// Copy of this configuration driven by a different seed.
    pub fn with_seed(&self, seed: u64) -> Self {
        Self { seed, ..self.clone() }
    }

    /// Parse a JSON document, filling missing fields from the defaults. The result is validated.
    ///
    /// # Errors
    ///
    /// Malformed JSON, unknown distribution or scenario selectors, and values failing [`Config::validate()`].
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Simulated time at which the replication stops.
    pub fn horizon(&self) -> f64 {
        self.warmup + self.observation
    }

    /// Expected operating time requested per unit of time, per theatre.
    pub fn offered_load(&self) -> f64 {
        self.operation.mean() / (self.interarrival.mean() * self.theatres as f64)
    }

    /// Copy running `operation` instead, with interarrival times stretched by the ratio of mean operation times so
    /// that [`Config::offered_load()`] is unchanged. Comparing the two then isolates the shape of the operation-time
    /// distribution from the amount of theatre work.
    pub fn with_operation_at_same_load(&self, operation: OperationScenario) -> Self {
        let stretch = operation.mean() / self.operation.mean();
        Self {
            operation,
            interarrival: self.interarrival.scaled(stretch),
            ..self.clone()
        }
    }

    /// Check every parameter before a scheduler is built.
    ///
    /// # Errors
    ///
    /// The first offending parameter, as a [`ConfigError`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        let capacities = [
            ("preparation", self.preparation_rooms),
            ("theatre", self.theatres),
            ("recovery", self.recovery_beds),
        ];
        for (resource, capacity) in capacities {
            if capacity == 0 {
                return Err(ConfigError::ZeroCapacity { resource });
            }
        }

        positive("observation length", self.observation)?;
        non_negative("warm-up length", self.warmup)?;
        positive("monitor interval", self.monitor_interval)?;

        self.interarrival.validate("interarrival")?;
        self.preparation.validate("preparation")?;
        self.operation.validate()?;
        self.recovery.validate("recovery")
    }
}

fn positive(parameter: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { parameter, value })
    }
}

fn non_negative(parameter: &'static str, value: f64) -> Result<(), ConfigError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::Negative { parameter, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(1200.0, config.horizon());
        assert_eq!(20.0, config.operation.mean());
    }

    #[test]
    fn zero_capacity_names_the_resource() {
        let config = Config {
            theatres: 0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroCapacity { resource: "theatre" })
        ));
    }

    #[test]
    fn non_positive_means_are_rejected() {
        let config = Config {
            preparation: DurationDistribution::exponential(0.0),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive {
                parameter: "preparation",
                ..
            })
        ));

        let config = Config {
            operation: OperationScenario::twisted(0.3, 35.0, -1.0),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::NonPositive { .. })));
    }

    #[test]
    fn uniform_needs_a_nonempty_range() {
        let config = Config {
            recovery: DurationDistribution::uniform(50.0, 30.0),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::EmptyRange { .. })));

        let config = Config {
            recovery: DurationDistribution::uniform(30.0, 50.0),
            ..Config::default()
        };
        config.validate().unwrap();
        assert_eq!(40.0, config.recovery.mean());
    }

    #[test]
    fn probability_outside_unit_interval_is_rejected() {
        let config = Config {
            operation: OperationScenario::twisted(1.2, 35.0, 15.0),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Probability { .. })));
    }

    #[test]
    fn negative_warmup_is_rejected_but_zero_is_fine() {
        let config = Config {
            warmup: -1.0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Negative { .. })));

        let config = Config {
            warmup: 0.0,
            ..Config::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn json_uses_the_original_parameter_names() {
        let config = Config::from_json_str(
            r#"{
                "P": 4, "R": 5, "OP": 1, "sim_time": 500.0, "warmup": 0.0, "monitor_dt": 0.5, "seed": 9,
                "interarrival": { "dist": "unif", "low": 20.0, "high": 30.0 },
                "operation": { "scenario": "twisted", "severe_prob": 0.3, "severe_mean": 35.0, "mild_mean": 15.0 }
            }"#,
        )
        .unwrap();

        assert_eq!(4, config.preparation_rooms);
        assert_eq!(5, config.recovery_beds);
        assert_eq!(500.0, config.observation);
        assert_eq!(0.5, config.monitor_interval);
        assert_eq!(DurationDistribution::uniform(20.0, 30.0), config.interarrival);
        assert_eq!(DurationDistribution::exponential(40.0), config.preparation);
        assert!((config.operation.mean() - 21.0).abs() < 1e-12);
    }

    #[test]
    fn unknown_selectors_fail_to_parse() {
        let result = Config::from_json_str(r#"{ "preparation": { "dist": "lognormal", "mean": 3.0 } }"#);
        assert!(matches!(result, Err(ConfigError::Parse(_))), "unknown distribution should be rejected");

        let result = Config::from_json_str(r#"{ "operation": { "scenario": "sideways", "mean": 3.0 } }"#);
        assert!(matches!(result, Err(ConfigError::Parse(_))), "unknown scenario should be rejected");
    }

    #[test]
    fn json_validation_runs_after_parsing() {
        let result = Config::from_json_str(r#"{ "R": 0 }"#);
        assert!(matches!(result, Err(ConfigError::ZeroCapacity { resource: "recovery" })));
    }

    #[test]
    fn reseeding_keeps_everything_else() {
        let base = Config::with_capacities(4, 5);
        let reseeded = base.with_seed(77);
        assert_eq!(77, reseeded.seed);
        assert_eq!(Config { seed: base.seed, ..reseeded }, base);
    }

    #[test]
    fn twisted_operations_at_the_same_load() {
        let base = Config::with_capacities(3, 5);
        let twisted = base.with_operation_at_same_load(OperationScenario::twisted(0.3, 35.0, 15.0));

        assert!(matches!(twisted.interarrival, DurationDistribution::Exponential { mean } if (mean - 26.25).abs() < 1e-12));
        assert_eq!(DurationDistribution::exponential(25.0), base.interarrival);
        assert!((base.offered_load() - 0.8).abs() < 1e-12);
        assert!((twisted.offered_load() - base.offered_load()).abs() < 1e-12);
        assert_eq!(base.preparation, twisted.preparation);
        assert_eq!(base.seed, twisted.seed);
    }

    #[test]
    fn scaling_keeps_the_family() {
        assert_eq!(
            DurationDistribution::uniform(40.0, 60.0),
            DurationDistribution::uniform(20.0, 30.0).scaled(2.0)
        );
        assert_eq!(50.0, DurationDistribution::exponential(25.0).scaled(2.0).mean());
    }
}

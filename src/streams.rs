//! Named random streams and the samplers that draw from them.
//!
//! Each stage of the patient flow draws from its own generator, so two configurations run on the same seed see the
//! same arrivals and the same service durations no matter how differently their queues evolve. That is the
//! precondition for the paired, common-random-number comparisons in [`stats`](crate::stats).

use crate::config::{Config, DurationDistribution, OperationScenario};
use crate::error::ConfigError;
use rand::distr::{Bernoulli, Uniform};
use rand::SeedableRng;
use rand_distr::{Distribution, Exp};
use rand_pcg::Pcg64;
use serde::Serialize;

const ARRIVAL_OFFSET: u64 = 100;
const PREPARATION_OFFSET: u64 = 200;
const OPERATION_OFFSET: u64 = 300;
const RECOVERY_OFFSET: u64 = 400;

/// Four independently seeded generators, one per purpose.
#[derive(Clone, Debug)]
pub struct RandomStreams {
    pub arrival: Pcg64,
    pub preparation: Pcg64,
    pub operation: Pcg64,
    pub recovery: Pcg64,
}

impl RandomStreams {
    /// Derive all four streams from one replication seed.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            arrival: Pcg64::seed_from_u64(seed.wrapping_add(ARRIVAL_OFFSET)),
            preparation: Pcg64::seed_from_u64(seed.wrapping_add(PREPARATION_OFFSET)),
            operation: Pcg64::seed_from_u64(seed.wrapping_add(OPERATION_OFFSET)),
            recovery: Pcg64::seed_from_u64(seed.wrapping_add(RECOVERY_OFFSET)),
        }
    }
}

/// Category a patient falls into, which only affects how the operation time was drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PatientKind {
    Base,
    Severe,
    Mild,
}

impl PatientKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Severe => "severe",
            Self::Mild => "mild",
        }
    }
}

impl std::fmt::Display for PatientKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated [`DurationDistribution`], ready to sample.
#[derive(Clone, Debug)]
pub enum DurationSampler {
    Exponential(Exp<f64>),
    Uniform(Uniform<f64>),
}

impl DurationSampler {
    pub fn new(distribution: &DurationDistribution, parameter: &'static str) -> Result<Self, ConfigError> {
        distribution.validate(parameter)?;
        match *distribution {
            DurationDistribution::Exponential { mean } => exponential(parameter, mean).map(Self::Exponential),
            DurationDistribution::Uniform { low, high } => Uniform::new(low, high)
                .map(Self::Uniform)
                .map_err(|_| ConfigError::EmptyRange { parameter, low, high }),
        }
    }

    pub fn sample(&self, rng: &mut Pcg64) -> f64 {
        match self {
            Self::Exponential(exp) => exp.sample(rng),
            Self::Uniform(uniform) => uniform.sample(rng),
        }
    }
}

/// A validated [`OperationScenario`]. Sampling returns the operation time together with the patient's kind.
#[derive(Clone, Debug)]
pub enum OperationSampler {
    Original(Exp<f64>),
    Twisted { severe: Bernoulli, severe_time: Exp<f64>, mild_time: Exp<f64> },
}

impl OperationSampler {
    pub fn new(scenario: &OperationScenario) -> Result<Self, ConfigError> {
        match *scenario {
            OperationScenario::Original { mean } => exponential("operation mean", mean).map(Self::Original),
            OperationScenario::Twisted {
                severe_prob,
                severe_mean,
                mild_mean,
            } => Ok(Self::Twisted {
                severe: Bernoulli::new(severe_prob).map_err(|_| ConfigError::Probability { value: severe_prob })?,
                severe_time: exponential("severe operation mean", severe_mean)?,
                mild_time: exponential("mild operation mean", mild_mean)?,
            }),
        }
    }

    pub fn sample(&self, rng: &mut Pcg64) -> (f64, PatientKind) {
        match self {
            Self::Original(exp) => (exp.sample(rng), PatientKind::Base),
            Self::Twisted {
                severe,
                severe_time,
                mild_time,
            } => {
                if severe.sample(rng) {
                    (severe_time.sample(rng), PatientKind::Severe)
                } else {
                    (mild_time.sample(rng), PatientKind::Mild)
                }
            },
        }
    }
}

/// Every sampler a replication needs, built once from a [`Config`].
#[derive(Clone, Debug)]
pub struct Samplers {
    pub interarrival: DurationSampler,
    pub preparation: DurationSampler,
    pub operation: OperationSampler,
    pub recovery: DurationSampler,
}

impl Samplers {
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            interarrival: DurationSampler::new(&config.interarrival, "interarrival")?,
            preparation: DurationSampler::new(&config.preparation, "preparation")?,
            operation: OperationSampler::new(&config.operation)?,
            recovery: DurationSampler::new(&config.recovery, "recovery")?,
        })
    }
}

fn exponential(parameter: &'static str, mean: f64) -> Result<Exp<f64>, ConfigError> {
    if !(mean > 0.0 && mean.is_finite()) {
        return Err(ConfigError::NonPositive { parameter, value: mean });
    }
    Exp::new(1.0 / mean).map_err(|_| ConfigError::NonPositive { parameter, value: mean })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn sample_mean(sampler: &DurationSampler, rng: &mut Pcg64, n: usize) -> f64 {
        (0..n).map(|_| sampler.sample(rng)).sum::<f64>() / n as f64
    }

    #[test]
    fn streams_are_reproducible_and_distinct() {
        let mut first = RandomStreams::from_seed(123);
        let mut second = RandomStreams::from_seed(123);
        let a: Vec<u64> = (0..4).map(|_| first.arrival.random()).collect();
        let b: Vec<u64> = (0..4).map(|_| second.arrival.random()).collect();
        assert_eq!(a, b, "same seed should give the same arrival draws");

        let p: Vec<u64> = (0..4).map(|_| first.preparation.random()).collect();
        assert_ne!(a, p, "arrival and preparation streams should differ");
    }

    #[test]
    fn drawing_from_one_stream_leaves_the_others_alone() {
        let mut touched = RandomStreams::from_seed(5);
        let mut untouched = RandomStreams::from_seed(5);
        for _ in 0..100 {
            let _: f64 = touched.operation.random();
        }
        assert_eq!(
            untouched.recovery.random::<u64>(),
            touched.recovery.random::<u64>(),
            "recovery stream shifted when operation stream was used"
        );
    }

    #[test]
    fn exponential_sampler_matches_mean() {
        let sampler = DurationSampler::new(&DurationDistribution::exponential(40.0), "prep").unwrap();
        let mut rng = Pcg64::seed_from_u64(1);
        let mean = sample_mean(&sampler, &mut rng, 200_000);
        assert!((mean - 40.0).abs() < 0.5, "sample mean {mean} too far from 40");
    }

    #[test]
    fn uniform_sampler_stays_in_range() {
        let sampler = DurationSampler::new(&DurationDistribution::uniform(30.0, 50.0), "rec").unwrap();
        let mut rng = Pcg64::seed_from_u64(2);
        for _ in 0..10_000 {
            let x = sampler.sample(&mut rng);
            assert!((30.0..50.0).contains(&x), "{x} outside [30, 50)");
        }
    }

    #[test]
    fn invalid_distributions_are_rejected() {
        assert!(DurationSampler::new(&DurationDistribution::exponential(-3.0), "prep").is_err());
        assert!(DurationSampler::new(&DurationDistribution::uniform(5.0, 5.0), "prep").is_err());
        assert!(OperationSampler::new(&OperationScenario::twisted(-0.1, 35.0, 15.0)).is_err());
    }

    #[test]
    fn original_scenario_only_yields_base_patients() {
        let sampler = OperationSampler::new(&OperationScenario::Original { mean: 20.0 }).unwrap();
        let mut rng = Pcg64::seed_from_u64(3);
        assert!((0..1_000).all(|_| sampler.sample(&mut rng).1 == PatientKind::Base));
    }

    #[test]
    fn twisted_scenario_splits_by_severity() {
        let sampler = OperationSampler::new(&OperationScenario::twisted(0.3, 35.0, 15.0)).unwrap();
        let mut rng = Pcg64::seed_from_u64(4);
        let n = 100_000;
        let mut severe = 0;
        let mut total = 0.0;
        for _ in 0..n {
            let (time, kind) = sampler.sample(&mut rng);
            assert_ne!(PatientKind::Base, kind);
            if kind == PatientKind::Severe {
                severe += 1;
            }
            total += time;
        }

        let share = severe as f64 / n as f64;
        assert!((share - 0.3).abs() < 0.01, "severe share {share} too far from 0.3");
        let mean = total / n as f64;
        assert!((mean - 21.0).abs() < 0.5, "mixture mean {mean} too far from 21");
    }
}

/// Errors that may be encountered while configuring, running or analysing replications.
///
/// The [`BackInTime`] variant originates from the [`EventQueue`] to indicate that an event's wake time is prior to
/// the queue's current time. It corresponds to a logical bug in an event, e.g. scheduling with a negative delay.
///
/// The [`Config`] variant is raised before any scheduler is built, so a replication either starts from a fully
/// validated configuration or does not start at all.
///
/// Statistics that cannot be computed (no observation time, no samples, no replications) are not errors; they are
/// reported as `None` inside [`Summary`] and [`Estimate`].
///
/// [`EventQueue`]: crate::engine::EventQueue
/// [`BackInTime`]: Error::BackInTime
/// [`Config`]: Error::Config
/// [`Summary`]: crate::Summary
/// [`Estimate`]: crate::stats::Estimate
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The event queue rejected an event that would have been scheduled for a time that has already passed.
    #[error("event execution time is less than current simulation time")]
    BackInTime,
    /// The configuration was rejected before the simulation started.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// Paired (common random number) analysis was given replication lists of different lengths.
    #[error("cannot pair {left} replications with {right} replications")]
    UnpairedSamples { left: usize, right: usize },
    /// A factorial design or its regression input was malformed.
    #[error("invalid factorial design: {0}")]
    Design(String),
}

/// Reasons a [`Config`] is rejected.
///
/// [`Config`]: crate::Config
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{resource} capacity must be at least 1")]
    ZeroCapacity { resource: &'static str },
    #[error("{parameter} must be positive, got {value}")]
    NonPositive { parameter: &'static str, value: f64 },
    #[error("{parameter} must not be negative, got {value}")]
    Negative { parameter: &'static str, value: f64 },
    #[error("{parameter} needs low < high, got [{low}, {high}]")]
    EmptyRange { parameter: &'static str, low: f64, high: f64 },
    #[error("severe_prob must lie in [0, 1], got {value}")]
    Probability { value: f64 },
    #[error("could not parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// [`std::result::Result`]`<T, `[`Error`]`>`, defaulting to `T = ()`.
///
/// A type alias that simplifies the signatures of event execution and scheduling, which mostly return nothing.
pub type Result<T = ()> = std::result::Result<T, Error>;

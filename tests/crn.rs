mod util;

use theatre_flow::experiment::{common_seeds, compare_crn, independent_seeds, replicate};
use theatre_flow::stats::{self, T_CRIT_DF19};
use theatre_flow::config::{DurationDistribution, OperationScenario};
use theatre_flow::{run, Config, Metric};

const REPLICATIONS: usize = 20;

#[test]
fn preparation_statistics_ignore_recovery_capacity() {
    for seed in [123, 124, 125] {
        let four_beds = run(&Config::with_capacities(3, 4).with_seed(seed)).unwrap();
        let five_beds = run(&Config::with_capacities(3, 5).with_seed(seed)).unwrap();
        assert_eq!(four_beds.avg_prep_queue_length, five_beds.avg_prep_queue_length);
        assert_eq!(four_beds.avg_prep_idle_capacity, five_beds.avg_prep_idle_capacity);
    }
}

#[test]
fn common_random_numbers_tighten_the_difference() {
    let left = Config::with_capacities(3, 4);
    let right = Config::with_capacities(3, 5);
    let metric = Metric::TheatreUtilization;

    let seeds = common_seeds(123, REPLICATIONS);
    let paired = stats::crn_difference(
        &replicate(&left, &seeds).unwrap(),
        &replicate(&right, &seeds).unwrap(),
        metric,
    )
    .unwrap();

    let left_alone = replicate(&left, &independent_seeds(123, 0, REPLICATIONS)).unwrap();
    let right_alone = replicate(&right, &independent_seeds(123, 1, REPLICATIONS)).unwrap();
    let independent = stats::independent_difference(
        &stats::collect(&left_alone, metric).unwrap(),
        &stats::collect(&right_alone, metric).unwrap(),
    );

    assert_eq!(REPLICATIONS, paired.samples);
    assert!(
        paired.half_width.unwrap() <= independent.half_width.unwrap(),
        "paired half-width {:?} should not exceed independent half-width {:?}",
        paired.half_width,
        independent.half_width
    );
}

#[test]
fn comparison_matches_manual_pairing() {
    let left = Config {
        observation: 400.0,
        ..Config::with_capacities(3, 4)
    };
    let right = Config {
        observation: 400.0,
        ..Config::with_capacities(4, 5)
    };

    let comparisons = compare_crn(&left, &right, 5, 900).unwrap();
    let seeds = common_seeds(900, 5);
    let left_runs = replicate(&left, &seeds).unwrap();
    let right_runs = replicate(&right, &seeds).unwrap();

    for comparison in comparisons {
        let manual = stats::crn_difference(&left_runs, &right_runs, comparison.metric).unwrap();
        assert_eq!(manual, comparison.difference);
        if let (Some(l), Some(r), Some(d)) = (comparison.left.mean, comparison.right.mean, comparison.difference.mean) {
            assert!((l - r - d).abs() < 1e-9, "mean difference should be the difference of means");
        }
    }
}

#[test]
fn interval_is_centered_on_the_mean() {
    let summaries = replicate(&Config::default(), &common_seeds(7, 4)).unwrap();
    let estimate = stats::estimate(&summaries, Metric::AvgThroughputTime);
    let (low, high) = estimate.interval.unwrap();
    let mean = estimate.mean.unwrap();
    assert_floats_near_equal!(mean, (low + high) / 2.0, "interval should be symmetric");

    let samples = stats::collect(&summaries, Metric::AvgThroughputTime).unwrap();
    let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / 3.0;
    assert_floats_near_equal!(
        T_CRIT_DF19 * variance.sqrt() / 2.0,
        estimate.half_width.unwrap(),
        "half-width should use the fixed critical value"
    );
}

#[test]
fn load_matched_operation_mixture_keeps_utilization() {
    let original = Config::with_capacities(3, 5);
    let twisted = original.with_operation_at_same_load(OperationScenario::twisted(0.3, 35.0, 15.0));
    let slowed_original = Config {
        interarrival: DurationDistribution::exponential(26.25),
        ..original.clone()
    };

    let seeds = common_seeds(40_000, REPLICATIONS);
    let utilization = |config: &Config| {
        stats::estimate(&replicate(config, &seeds).unwrap(), Metric::TheatreUtilization)
            .mean
            .unwrap()
    };
    let original = utilization(&original);
    let twisted = utilization(&twisted);
    let slowed_original = utilization(&slowed_original);

    assert!(
        (twisted - original).abs() < 0.015,
        "equal offered load should give similar utilization: {original} vs {twisted}"
    );
    assert!((slowed_original - original).abs() > (twisted - original).abs());
}

//! Compares ward layouts with common random numbers.
//!
//! Every layout is replicated on the same seeds, so replication `r` of each layout sees the same patients: the same
//! arrival instants and the same preparation, operation and recovery times. The differences between layouts are then
//! analysed pairwise, replication by replication, which removes most of the noise that independent runs would
//! contribute to the comparison. Each layout runs on its own thread; replications own all of their state, so nothing
//! is shared between them.
//!
//! For contrast, the same layouts are also run on independent seeds and compared as independent samples. The paired
//! intervals should come out narrower.
//!
//! Blocking is rarer than a full recovery ward, so it is harder to estimate: the relative half-widths of the two
//! probabilities show how much more precise one estimate is than the other on the same replications.
//!
//! The last comparison swaps the single operation-time distribution (mean 20) for a mixture of severe and mild cases
//! (mean 21), stretching interarrival times from 25 to 26.25 so that the theatre's offered load stays at 0.8. What is
//! left of the difference is the effect of the shape of the operation times.
//!
//! Run with `RUST_LOG=theatre_flow=debug` to see each replication as it finishes.

use std::thread;
use theatre_flow::config::OperationScenario;
use theatre_flow::experiment::{self, common_seeds, independent_seeds};
use theatre_flow::stats::{self, Estimate};
use theatre_flow::{Config, Metric, Summary};

const REPLICATIONS: usize = 20;
const BASE_SEED: u64 = 123;

const REPORTED: [Metric; 4] = [
    Metric::TheatreBlockRate,
    Metric::ProbRecoveryAllBusy,
    Metric::AvgPrepQueueLength,
    Metric::AvgThroughputTime,
];

const LAYOUTS: [(usize, usize); 3] = [(3, 4), (3, 5), (4, 5)];

fn replicate_on_thread(config: Config, seeds: Vec<u64>) -> thread::JoinHandle<Vec<Summary>> {
    thread::spawn(move || experiment::replicate(&config, &seeds).expect("demo configurations should be valid"))
}

fn label(layout: (usize, usize)) -> String {
    format!("{}P{}R", layout.0, layout.1)
}

fn report(label: &str, summaries: &[Summary]) {
    println!("{label}:");
    for metric in REPORTED {
        println!("  {:<24} {}", metric.key(), stats::estimate(summaries, metric));
    }
}

fn report_difference(label: &str, left: &[Summary], right: &[Summary]) {
    println!("{label}:");
    for metric in REPORTED {
        let difference: Estimate =
            stats::crn_difference(left, right, metric).expect("both sides ran the same number of replications");
        let verdict = match difference.excludes_zero() {
            Some(true) => "significant",
            Some(false) => "not significant",
            None => "undefined",
        };
        println!("  {:<24} {difference} ({verdict})", metric.key());
    }
}

fn report_independent_difference(label: &str, left: &[Summary], right: &[Summary]) {
    println!("{label}:");
    for metric in REPORTED {
        let difference = match (stats::collect(left, metric), stats::collect(right, metric)) {
            (Some(left), Some(right)) => stats::independent_difference(&left, &right),
            _ => Estimate::undefined(left.len().min(right.len())),
        };
        println!("  {:<24} {difference}", metric.key());
    }
}

fn report_precision(label: &str, summaries: &[Summary]) {
    let relative = |metric| stats::estimate(summaries, metric).relative_half_width();
    let block = relative(Metric::TheatreBlockRate);
    let full = relative(Metric::ProbRecoveryAllBusy);
    let verdict = match (block, full) {
        (Some(block), Some(full)) if block < full => "block rate is estimated more precisely",
        (Some(_), Some(_)) => "recovery-full probability is estimated more precisely",
        _ => "undefined",
    };
    println!(
        "  {label}: relative half-width block_rate={} prob_recovery_full={} ({verdict})",
        block.map_or("nan".into(), |value| format!("{value:.4}")),
        full.map_or("nan".into(), |value| format!("{value:.4}")),
    );
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let seeds = common_seeds(BASE_SEED, REPLICATIONS);
    let handles = LAYOUTS.map(|layout| {
        replicate_on_thread(Config::with_capacities(layout.0, layout.1), seeds.clone())
    });
    let results: Vec<Vec<Summary>> = handles
        .into_iter()
        .map(|handle| handle.join().expect("thread should return normally"))
        .collect();

    println!("{REPLICATIONS} replications per layout on common seeds {BASE_SEED}..{}", BASE_SEED + REPLICATIONS as u64);
    for (layout, summaries) in LAYOUTS.iter().zip(&results) {
        report(&label(*layout), summaries);
    }
    for (i, j) in [(0, 1), (1, 2), (0, 2)] {
        let name = format!("{} - {} (paired)", label(LAYOUTS[i]), label(LAYOUTS[j]));
        report_difference(&name, &results[i], &results[j]);
    }

    let handles = LAYOUTS.iter().enumerate().map(|(index, layout)| {
        let seeds = independent_seeds(BASE_SEED, index as u64, REPLICATIONS);
        replicate_on_thread(Config::with_capacities(layout.0, layout.1), seeds)
    });
    let independent: Vec<Vec<Summary>> = handles
        .collect::<Vec<_>>()
        .into_iter()
        .map(|handle| handle.join().expect("thread should return normally"))
        .collect();

    println!("{REPLICATIONS} replications per layout on independent seeds:");
    for (layout, summaries) in LAYOUTS.iter().zip(&independent) {
        report(&label(*layout), summaries);
    }
    for (i, j) in [(0, 1), (1, 2), (0, 2)] {
        let name = format!("{} - {} (independent)", label(LAYOUTS[i]), label(LAYOUTS[j]));
        report_independent_difference(&name, &independent[i], &independent[j]);
    }

    println!("precision of the blocking estimates:");
    for (layout, summaries) in LAYOUTS.iter().zip(&results) {
        report_precision(&label(*layout), summaries);
    }

    let original = Config::with_capacities(3, 5);
    let twisted = original.with_operation_at_same_load(OperationScenario::twisted(0.3, 35.0, 15.0));
    let original_runs = replicate_on_thread(original, seeds.clone());
    let twisted_runs = replicate_on_thread(twisted, seeds);
    let original_runs = original_runs.join().expect("thread should return normally");
    let twisted_runs = twisted_runs.join().expect("thread should return normally");

    report("3P5R original operations, interarrival 25", &original_runs);
    report("3P5R severe/mild operations, interarrival 26.25", &twisted_runs);
    report_difference("twisted - original", &twisted_runs, &original_runs);
}

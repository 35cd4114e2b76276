//! Derived comparison metrics computed across experiments.

use colonies_report_model::Experiment;

/// Speedup per replica count, relative to the smallest available count.
///
/// Defined as `baseline_avg_latency / avg_latency[i]`. A zero baseline or a
/// zero sample yields 0.0 for that point; callers must check the source
/// values before reading a zero as "no speedup" rather than "undefined".
pub fn speedup(experiment: &Experiment) -> Vec<f64> {
    let Some(baseline) = experiment.avg_latency.get(0) else {
        return Vec::new();
    };
    experiment
        .avg_latency
        .values()
        .iter()
        .map(|&latency| {
            if baseline > 0.0 && latency > 0.0 {
                baseline / latency
            } else {
                0.0
            }
        })
        .collect()
}

/// Ideal linear-scaling reference: speedup N at N replicas. Used only as a
/// chart overlay, never written back into experiment data.
pub fn ideal_linear(max_replicas: u32) -> Vec<(u32, f64)> {
    (1..=max_replicas)
        .map(|replicas| (replicas, f64::from(replicas)))
        .collect()
}

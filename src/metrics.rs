use criterion_stats::Distribution;
use eyre::ensure;
use serde::{Deserialize, Serialize};

/// Performance metrics for GET and POST timings across the tested batch
/// sizes, one entry per size in test order.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ScaleMetrics {
    pub n_clusters: Vec<usize>,
    pub get_average: Vec<f64>,
    pub get_min: Vec<f64>,
    pub get_max: Vec<f64>,
    pub get_std: Vec<f64>,
    pub post_average: Vec<f64>,
    pub post_min: Vec<f64>,
    pub post_max: Vec<f64>,
    pub post_std: Vec<f64>,
}

impl ScaleMetrics {
    pub fn push(&mut self, n_clusters: usize, get: Summary, post: Summary) {
        self.n_clusters.push(n_clusters);
        self.get_average.push(get.average);
        self.get_min.push(get.min);
        self.get_max.push(get.max);
        self.get_std.push(get.std);
        self.post_average.push(post.average);
        self.post_min.push(post.min);
        self.post_max.push(post.max);
        self.post_std.push(post.std);
    }
}

/// Summary statistics over one batch of timing samples
#[derive(Clone, Copy, Debug)]
pub struct Summary {
    pub average: f64,
    pub min: f64,
    pub max: f64,
    pub std: f64,
}

/// Compute mean, extremes, and sample standard deviation for a batch.
///
/// The sample standard deviation uses the n - 1 denominator and is undefined
/// for a single sample, so batches of fewer than two samples are an error.
pub fn summarize(samples: &[f64]) -> eyre::Result<Summary> {
    ensure!(!samples.is_empty(), "Cannot summarize an empty batch");
    ensure!(
        samples.len() >= 2,
        "Sample standard deviation is undefined for a batch of 1"
    );

    let n = samples.len() as f64;
    let dist = Distribution::from(samples.to_vec().into_boxed_slice());
    let average = dist.mean();
    let variance = samples.iter().map(|x| (x - average).powi(2)).sum::<f64>() / (n - 1.);

    Ok(Summary {
        average,
        min: dist.min(),
        max: dist.max(),
        std: variance.sqrt(),
    })
}

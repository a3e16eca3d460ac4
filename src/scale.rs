use std::path::Path;
use std::time::Duration;

use eyre::WrapErr;
use reqwest::blocking::Client;
use reqwest::Method;
use tracing as trc;

use crate::client::{time_request, time_upload, Endpoints};
use crate::metrics::{summarize, ScaleMetrics};

/// Pause between batch sizes to give the API time to recover
pub static TIME_BETWEEN_TESTS: Duration = Duration::from_secs(30);

/// Fixed inputs for a scale run
pub struct ScaleConfig<'a> {
    pub endpoints: &'a Endpoints,
    pub archive: &'a Path,
    /// Recovery pause after each batch; tests inject `Duration::ZERO`
    pub pause: Duration,
}

/// Run sequential GET+POST timing pairs for each batch size and summarize
/// each operation's samples.
///
/// Batches run strictly one request at a time; a single unexpected status
/// anywhere aborts the whole run. A batch size below 2 fails at the
/// summarizing step because its standard deviation is undefined.
pub fn calculate_performance_metrics(
    client: &Client,
    access_token: &str,
    config: &ScaleConfig,
    cluster_sizes: &[usize],
) -> eyre::Result<ScaleMetrics> {
    let mut result = ScaleMetrics::default();

    for &n_clusters in cluster_sizes {
        trc::info_span!("batch", n_clusters).in_scope(|| -> eyre::Result<()> {
            let mut get_times = Vec::with_capacity(n_clusters);
            let mut post_times = Vec::with_capacity(n_clusters);

            for trial in 0..n_clusters {
                trc::debug!(trial, "timing request pair");
                get_times.push(
                    time_request(
                        client,
                        access_token,
                        &config.endpoints.reports,
                        Method::GET,
                        None,
                    )?
                    .as_secs_f64(),
                );
                post_times.push(
                    time_upload(client, access_token, &config.endpoints.upload, config.archive)?
                        .as_secs_f64(),
                );
            }

            let get = summarize(&get_times).wrap_err("Could not summarize GET timings")?;
            let post = summarize(&post_times).wrap_err("Could not summarize POST timings")?;

            trc::info!(
                get_average = get.average,
                post_average = post.average,
                "batch complete"
            );

            result.push(n_clusters, get, post);

            std::thread::sleep(config.pause);
            Ok(())
        })?;
    }

    Ok(result)
}

use std::path::PathBuf;

use argh::FromArgs;
use eyre::WrapErr;
use reqwest::Method;
use thiserror::Error;
use tracing as trc;

use crate::client::{self, Credentials, Endpoints};
use crate::scale::{self, ScaleConfig};

mod plot;

/// Address of the Insights Proxy used for the proxied half of the comparison
static PROXY_URL: &'static str =
    "http://a7329a76ff0ba441683d8558a6fce358-1215085193.us-east-1.elb.amazonaws.com:80";

/// Archive uploaded by the POST timing
static IO_PATH: &'static str = "io-archive.tar.gz";

/// Where the scale chart is written
static CHART_PATH: &'static str = "scale_results.png";

/// Batch sizes tested when none are given on the command line
static DEFAULT_SIZES: &'static str = "10,50,100";

/// An error that indicates that the program should exit with the given code
#[derive(Error, Debug)]
#[error("Program exited {0}")]
struct Exit(i32);

#[derive(FromArgs)]
/// Measure Insights API latency, directly and through the proxy.
struct Args {
    /// proxy address to route the proxied timings through
    #[argh(option, short = 'p')]
    proxy: Option<String>,

    /// path to the archive uploaded by the POST timing
    #[argh(option, default = "PathBuf::from(IO_PATH)")]
    archive: PathBuf,

    /// run the scale test over the batch sizes and render the chart
    #[argh(switch, short = 's')]
    scale: bool,

    /// comma-separated batch sizes for the scale test
    #[argh(option, default = "DEFAULT_SIZES.to_string()")]
    sizes: String,

    /// output path for the chart image
    #[argh(option, default = "PathBuf::from(CHART_PATH)")]
    out: PathBuf,
}

/// Start program logic
fn start() -> eyre::Result<()> {
    let args: Args = trc::debug_span!("Parsing commandline args").in_scope(|| argh::from_env());

    let credentials = Credentials::from_env();
    let endpoints = Endpoints::console();

    let direct = client::http_client(None)?;
    let access_token = client::fetch_access_token(&direct, client::TOKEN_URL, &credentials)
        .wrap_err("Could not fetch access token")?;

    trc::info!("Timing direct requests");
    let took = client::time_request(
        &direct,
        &access_token,
        &endpoints.reports,
        Method::GET,
        None,
    )?;
    println!("GET total time: {} seconds", took.as_secs_f64());
    let took = client::time_upload(&direct, &access_token, &endpoints.upload, &args.archive)?;
    println!("POST total time: {} seconds", took.as_secs_f64());

    println!("With Insights Proxy:");
    let proxy_url = args.proxy.as_deref().unwrap_or(PROXY_URL);
    let proxied = client::http_client(Some(proxy_url))?;
    let took = client::time_request(
        &proxied,
        &access_token,
        &endpoints.reports,
        Method::GET,
        None,
    )?;
    println!("GET total time: {} seconds", took.as_secs_f64());
    let took = client::time_upload(&proxied, &access_token, &endpoints.upload, &args.archive)?;
    println!("POST total time: {} seconds", took.as_secs_f64());

    if args.scale {
        let sizes = parse_sizes(&args.sizes)?;
        let config = ScaleConfig {
            endpoints: &endpoints,
            archive: &args.archive,
            pause: scale::TIME_BETWEEN_TESTS,
        };

        trc::info!(?sizes, "Starting scale test");
        let result =
            scale::calculate_performance_metrics(&direct, &access_token, &config, &sizes)?;

        println!("\nResults:");
        println!("{}", serde_json::to_string_pretty(&result)?);

        plot::plot_results(&result, &args.out)?;
        trc::info!("Plot saved as {}", args.out.display());
    }

    Ok(())
}

fn parse_sizes(input: &str) -> eyre::Result<Vec<usize>> {
    input
        .split(',')
        .map(|size| size.trim())
        .filter(|size| !size.is_empty())
        .map(|size| {
            size.parse::<usize>()
                .wrap_err_with(|| format!("Invalid batch size: {}", size))
        })
        .collect()
}

/// Run the CLI
pub fn run() {
    // Load credentials from a local .env file if there is one
    dotenv::dotenv().ok();
    // Install tracing for logs
    install_tracing();
    // Install color error printing
    color_eyre::install().expect("Could not install error handler");

    // Start the application and capture errors
    match start() {
        // Do nothing for happy runs!
        Ok(()) => (),
        // Handle errors
        Err(report) => {
            // If the error is an exit code
            if let Some(e) = report.downcast_ref::<Exit>() {
                let code = e.0;

                // If the code is zero, exit cleanly
                if code == 0 {
                    std::process::exit(0);

                // If the code is non-zero print the error and then exit with that code
                } else {
                    trc::error!("{:?}", report);
                    std::process::exit(e.0);
                }
            // If the error is any other kind of error print it and exit 1
            } else {
                trc::error!("{:?}", report);
                std::process::exit(1);
            }
        }
    }
}

fn install_tracing() {
    use tracing_error::ErrorLayer;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{fmt, fmt::format::FmtSpan, EnvFilter};

    // Build the tracing layers
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_span_events(FmtSpan::FULL);
    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();

    // Add all of the layers to the subscriber and initialize it
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .with(ErrorLayer::default())
        .init();
}

#[cfg(test)]
mod tests {
    use super::parse_sizes;

    #[test]
    fn sizes_parse_in_order() {
        assert_eq!(parse_sizes("10,50,100").unwrap(), vec![10, 50, 100]);
    }

    #[test]
    fn sizes_tolerate_whitespace_and_trailing_commas() {
        assert_eq!(parse_sizes(" 1, 2 ,3,").unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn non_numeric_size_fails() {
        assert!(parse_sizes("10,many").is_err());
    }
}

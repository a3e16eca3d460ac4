use std::path::Path;
use std::time::{Duration, Instant};

use eyre::WrapErr;
use reqwest::blocking::{multipart, Client};
use reqwest::{header, Method, Proxy, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing as trc;

/// The cluster whose report data the GET path fetches; also identifies us to
/// the ingress service through the upload User-Agent.
pub static CLUSTER_ID: &'static str = "d4efb5bf-4156-4b52-9599-0443add543d5";

/// SSO endpoint for the client-credentials token exchange
pub static TOKEN_URL: &'static str =
    "https://sso.redhat.com/auth/realms/redhat-external/protocol/openid-connect/token";

/// Content type the ingress service expects for periodic archives
static ARCHIVE_CONTENT_TYPE: &'static str = "application/vnd.redhat.openshift.periodic+tar";

/// Uploads that take longer than this are considered failed
static UPLOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// An HTTP response outside the set of statuses the caller accepts
#[derive(Error, Debug)]
#[error("Unexpected status {status}: {body}")]
pub struct UnexpectedStatus {
    pub status: StatusCode,
    pub body: String,
}

/// OAuth2 client credentials, taken from the environment.
///
/// Missing variables are not validated here; an empty pair simply fails later
/// at the token endpoint.
#[derive(Clone, Debug)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    pub fn from_env() -> Self {
        Credentials {
            client_id: std::env::var("CLIENT_ID").unwrap_or_default(),
            client_secret: std::env::var("CLIENT_SECRET").unwrap_or_default(),
        }
    }
}

/// The two console endpoints the timings run against
#[derive(Clone, Debug)]
pub struct Endpoints {
    pub reports: String,
    pub upload: String,
}

impl Endpoints {
    pub fn console() -> Self {
        Endpoints {
            reports: format!(
                "https://console.redhat.com/api/insights-results-aggregator/v2/cluster/{}/reports?get_disabled=false",
                CLUSTER_ID
            ),
            upload: "https://console.redhat.com/api/ingress/v1/upload".to_string(),
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Build a blocking client, optionally routing all traffic through a proxy.
///
/// The client carries no overall timeout: the GET timing is allowed to block
/// for as long as the server takes. The upload path sets its own per-request
/// timeout instead.
pub fn http_client(proxy: Option<&str>) -> eyre::Result<Client> {
    let mut builder = Client::builder().timeout(None);

    if let Some(url) = proxy {
        builder = builder.proxy(Proxy::all(url).wrap_err("Invalid proxy address")?);
    }

    Ok(builder.build().wrap_err("Could not build HTTP client")?)
}

/// Exchange client credentials for a bearer token at the given token endpoint
#[trc::instrument(skip(client, credentials))]
pub fn fetch_access_token(
    client: &Client,
    token_url: &str,
    credentials: &Credentials,
) -> eyre::Result<String> {
    let response = client
        .post(token_url)
        .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
        .form(&[("grant_type", "client_credentials")])
        .send()
        .wrap_err("Token request failed")?
        .error_for_status()
        .wrap_err("Token endpoint rejected the credentials")?;

    let token: TokenResponse = response
        .json()
        .wrap_err("Could not parse token response")?;

    Ok(token.access_token)
}

/// Time a single authenticated request of the given method.
///
/// A 200 or a 404 both count as success: a cluster with no reports yet
/// answers 404 and we still want its latency. Returns the wall-clock elapsed
/// time including connection setup.
#[trc::instrument(skip(client, access_token, body))]
pub fn time_request(
    client: &Client,
    access_token: &str,
    url: &str,
    method: Method,
    body: Option<String>,
) -> eyre::Result<Duration> {
    let start = Instant::now();

    let mut request = client.request(method, url).bearer_auth(access_token);
    if let Some(body) = body {
        request = request.body(body);
    }

    let response = request.send().wrap_err("Request failed")?;

    let status = response.status();
    if status != StatusCode::OK && status != StatusCode::NOT_FOUND {
        let body = response.text().unwrap_or_default();
        return Err(UnexpectedStatus { status, body }).wrap_err("Expected 200 or 404");
    }

    Ok(start.elapsed())
}

/// Time a single authenticated multipart upload of the archive.
///
/// The archive is read fresh on every call so the timing includes the same
/// file I/O on each trial. Any non-2xx status is fatal.
#[trc::instrument(skip(client, access_token))]
pub fn time_upload(
    client: &Client,
    access_token: &str,
    url: &str,
    archive: &Path,
) -> eyre::Result<Duration> {
    let start = Instant::now();

    let bytes = std::fs::read(archive)
        .wrap_err_with(|| format!("Could not read archive {}", archive.display()))?;
    let file_name = archive
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "archive.tar.gz".to_string());

    let form = multipart::Form::new()
        .part(
            "file",
            multipart::Part::bytes(bytes)
                .file_name(file_name)
                .mime_str(ARCHIVE_CONTENT_TYPE)
                .wrap_err("Invalid archive content type")?,
        )
        .text("metadata", "");

    let response = client
        .post(url)
        .bearer_auth(access_token)
        .header(header::ACCEPT, "application/json")
        .header(header::USER_AGENT, format!("cluster/{}", CLUSTER_ID))
        .multipart(form)
        .timeout(UPLOAD_TIMEOUT)
        .send()
        .wrap_err("Upload request failed")?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(UnexpectedStatus { status, body }).wrap_err("Upload rejected");
    }

    Ok(start.elapsed())
}

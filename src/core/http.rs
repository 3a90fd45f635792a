use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_ENCODING};
use reqwest::Client;

const APP_USER_AGENT: &str = concat!("fix-lwjgl/", env!("CARGO_PKG_VERSION"));

/// Shared client for every remote module fetch.
///
/// Per-download deadlines are enforced by the downloader; the client only
/// bounds how long establishing a connection may take.
pub fn build_http_client(connect_timeout: Duration) -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));
    default_headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/java-archive, application/octet-stream, */*"),
    );

    Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers)
        .connect_timeout(connect_timeout)
        .build()
}

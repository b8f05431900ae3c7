//! HAR (HTTP Archive) capture reader.
//!
//! Each HAR entry becomes one [`Exchange`]: the request and response header
//! messages in capture order. Only the fields needed to rebuild the header
//! blocks are deserialized; everything else in the archive is ignored.

use std::fs;
use std::path::Path;

use hdrzip::HeaderMessage;
use hdrzip::constants::{
    HOST_HEADER, PSEUDO_HEADER_PREFIX, PSEUDO_HOST, PSEUDO_METHOD, PSEUDO_PATH, PSEUDO_SCHEME,
    PSEUDO_STATUS, PSEUDO_STATUS_TEXT, PSEUDO_VERSION,
};
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::BenchError;

/// Version used when the capture records none or an unrecognized one.
pub const DEFAULT_HTTP_VERSION: &str = "HTTP/1.1";

#[derive(Debug, Deserialize)]
struct HarFile {
    log: HarLog,
}

#[derive(Debug, Deserialize)]
struct HarLog {
    #[serde(default)]
    entries: Vec<HarEntry>,
}

#[derive(Debug, Deserialize)]
struct HarEntry {
    request: HarRequest,
    response: HarResponse,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HarRequest {
    method: String,
    url: String,
    #[serde(default)]
    http_version: String,
    #[serde(default)]
    headers: Vec<HarHeader>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HarResponse {
    status: i64,
    #[serde(default)]
    status_text: String,
    #[serde(default)]
    http_version: String,
    #[serde(default)]
    headers: Vec<HarHeader>,
}

#[derive(Debug, Deserialize)]
struct HarHeader {
    name: String,
    value: String,
}

/// One request and the response it received.
#[derive(Debug, Clone, PartialEq)]
pub struct Exchange {
    pub request: HeaderMessage,
    pub response: HeaderMessage,
}

impl Exchange {
    /// Host the request was sent to.
    pub fn host(&self) -> &str {
        self.request.get(PSEUDO_HOST).unwrap_or_default()
    }
}

/// Maps a HAR version string onto the `HTTP/x` form used on top lines.
pub fn normalize_version(version: &str) -> String {
    let version = version.trim();
    match version.to_ascii_lowercase().as_str() {
        "h2" | "h2c" | "http/2" | "http/2.0" => "HTTP/2".to_string(),
        "h3" | "http/3" | "http/3.0" => "HTTP/3".to_string(),
        lower if lower.starts_with("http/1.") => version.to_ascii_uppercase(),
        _ => DEFAULT_HTTP_VERSION.to_string(),
    }
}

/// Copies HAR headers into `message`, lowercasing names.
///
/// Names starting with `:` are HTTP/2 pseudo-headers recorded by the browser;
/// they are rebuilt from the request line instead.
fn copy_headers(headers: &[HarHeader], message: &mut HeaderMessage) {
    for header in headers {
        if header.name.starts_with(PSEUDO_HEADER_PREFIX) {
            continue;
        }
        message.append(header.name.trim().to_ascii_lowercase(), header.value.trim());
    }
}

fn build_request(request: &HarRequest) -> Result<HeaderMessage, String> {
    let url = Url::parse(&request.url).map_err(|e| format!("bad URL {:?}: {e}", request.url))?;

    let mut message = HeaderMessage::new();
    copy_headers(&request.headers, &mut message);

    let host = match message.remove(HOST_HEADER) {
        Some(host) => host,
        None => {
            let host = url
                .host_str()
                .ok_or_else(|| format!("URL {:?} has no host", request.url))?;
            match url.port() {
                Some(port) => format!("{host}:{port}"),
                None => host.to_string(),
            }
        }
    };
    let path = match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_string(),
    };

    message.insert(PSEUDO_METHOD, request.method.trim());
    message.insert(PSEUDO_PATH, path);
    message.insert(PSEUDO_VERSION, normalize_version(&request.http_version));
    message.insert(PSEUDO_SCHEME, url.scheme());
    message.insert(PSEUDO_HOST, host);
    Ok(message)
}

fn build_response(response: &HarResponse) -> HeaderMessage {
    let mut message = HeaderMessage::new();
    copy_headers(&response.headers, &mut message);
    message.insert(PSEUDO_VERSION, normalize_version(&response.http_version));
    message.insert(PSEUDO_STATUS, response.status.to_string());
    message.insert(PSEUDO_STATUS_TEXT, response.status_text.trim());
    message
}

fn build_exchange(entry: &HarEntry) -> Result<Exchange, String> {
    let request = build_request(&entry.request)?;
    let response = build_response(&entry.response);
    request.validate().map_err(|e| e.to_string())?;
    response.validate().map_err(|e| e.to_string())?;
    Ok(Exchange { request, response })
}

/// Parses a HAR document into exchanges, in capture order.
///
/// Entries that cannot form valid messages (an unparseable URL, an aborted
/// request without a status, invalid header names) are skipped with a warning.
///
/// # Parameters
/// - `json`: The HAR document.
/// - `source`: Name of the document for diagnostics.
///
/// # Errors
/// - [`BenchError::Capture`] - The document is not valid HAR JSON
pub fn parse_har(json: &str, source: &str) -> Result<Vec<Exchange>, BenchError> {
    let har: HarFile = serde_json::from_str(json).map_err(|e| BenchError::Capture {
        path: source.to_string(),
        description: e.to_string(),
    })?;

    let mut exchanges = Vec::with_capacity(har.log.entries.len());
    for (index, entry) in har.log.entries.iter().enumerate() {
        if entry.response.status <= 0 {
            debug!(source, entry = index, "skipping entry without a response");
            continue;
        }
        match build_exchange(entry) {
            Ok(exchange) => exchanges.push(exchange),
            Err(description) => warn!(source, entry = index, "skipping entry: {description}"),
        }
    }
    Ok(exchanges)
}

/// Reads and parses the HAR file at `path`.
///
/// # Errors
/// - [`BenchError::Io`] - The file cannot be read
/// - [`BenchError::Capture`] - The file is not valid HAR JSON
pub fn read_har_file(path: &Path) -> Result<Vec<Exchange>, BenchError> {
    let json = fs::read_to_string(path)?;
    let exchanges = parse_har(&json, &path.display().to_string())?;
    info!(path = %path.display(), exchanges = exchanges.len(), "loaded capture");
    Ok(exchanges)
}

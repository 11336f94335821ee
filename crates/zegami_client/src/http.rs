//! HTTP helpers.
//!
//! Blocking reqwest session with optional request auth, plus the JSON,
//! file upload and streamed download primitives the API client is built on.
//! Every helper raises on a non-2xx status before looking at the body.

use std::fs::File;
use std::io::{ErrorKind, Read, Write};
use std::path::Path;

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Body, Request, RequestBuilder, Response};
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, Url};
use serde::Serialize;

use crate::error::{Result, ZegamiError};

// ── Constants ───────────────────────────────────────────────────────

/// Read size used when pumping a download to disk (32 KiB).
pub const CHUNK_SIZE: usize = 1 << 15;

pub(crate) const USER_AGENT: &str = concat!("zegami-client/", env!("CARGO_PKG_VERSION"));

// ── Auth ────────────────────────────────────────────────────────────

/// Decides the `Authorization` header for an outgoing request.
///
/// Called once per request with the prepared request URL. Returning `None`
/// leaves the request untouched.
pub trait RequestAuth: Send + Sync {
    fn authorization(&self, url: &str) -> Option<String>;
}

/// Bearer token auth restricted to URLs under one endpoint prefix.
///
/// The endpoint is stored in the same serialised form reqwest gives request
/// URLs (default port dropped, scheme and host lowercased), so the prefix
/// check compares like with like.
pub struct TokenEndpointAuth {
    endpoint: String,
    token: String,
}

impl TokenEndpointAuth {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self { endpoint: normalize_endpoint(endpoint.into()), token: token.into() }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl RequestAuth for TokenEndpointAuth {
    fn authorization(&self, url: &str) -> Option<String> {
        bearer_header(url, &self.endpoint, &self.token)
    }
}

impl std::fmt::Debug for TokenEndpointAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenEndpointAuth")
            .field("endpoint", &self.endpoint)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Re-serialise through `Url`; unparseable endpoints are kept verbatim.
fn normalize_endpoint(endpoint: String) -> String {
    match Url::parse(&endpoint) {
        Ok(url) => url.into(),
        Err(_) => endpoint,
    }
}

/// `Bearer <token>` if `url` starts with `endpoint`, otherwise `None`.
pub fn bearer_header(url: &str, endpoint: &str, token: &str) -> Option<String> {
    url.starts_with(endpoint).then(|| format!("Bearer {}", token))
}

/// Auth handler that only sends `token` to URLs prefixed by `endpoint`.
pub fn scoped_bearer_auth(endpoint: &str, token: &str) -> TokenEndpointAuth {
    TokenEndpointAuth::new(endpoint, token)
}

// ── Session ─────────────────────────────────────────────────────────

/// Reusable connection pool with optional auth applied to every request.
pub struct Session {
    http: reqwest::blocking::Client,
    auth: Option<Box<dyn RequestAuth>>,
}

impl Session {
    /// Wrap a caller-configured transport (timeouts, proxies, TLS roots).
    pub fn with_client(
        http: reqwest::blocking::Client,
        auth: Option<Box<dyn RequestAuth>>,
    ) -> Self {
        Self { http, auth }
    }

    pub fn has_auth(&self) -> bool {
        self.auth.is_some()
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http.request(method, url)
    }

    /// Build, authorize and send. Non-2xx responses become `ZegamiError::Http`.
    fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let mut request = builder.build()?;
        self.authorize(&mut request)?;

        log::debug!("{} {}", request.method(), request.url());
        let response = self.http.execute(request)?;
        error_for_status(response)
    }

    fn authorize(&self, request: &mut Request) -> Result<()> {
        let Some(auth) = &self.auth else {
            return Ok(());
        };
        if let Some(value) = auth.authorization(request.url().as_str()) {
            let mut value = HeaderValue::from_str(&value)?;
            value.set_sensitive(true);
            request.headers_mut().insert(AUTHORIZATION, value);
        }
        Ok(())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("has_auth", &self.has_auth())
            .finish()
    }
}

/// Create a session with optional auth handling. No network I/O.
pub fn make_session(auth: Option<Box<dyn RequestAuth>>) -> Result<Session> {
    let http = reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .build()?;
    Ok(Session::with_client(http, auth))
}

// ── Request helpers ─────────────────────────────────────────────────

/// Send a JSON body and decode the JSON response.
pub fn post_json<T: Serialize + ?Sized>(
    session: &Session,
    url: &str,
    payload: &T,
) -> Result<serde_json::Value> {
    let response = session.send(session.request(Method::POST, url).json(payload))?;
    decode_json(response)
}

/// Put a JSON body and decode the JSON response.
pub fn put_json<T: Serialize + ?Sized>(
    session: &Session,
    url: &str,
    payload: &T,
) -> Result<serde_json::Value> {
    let response = session.send(session.request(Method::PUT, url).json(payload))?;
    decode_json(response)
}

/// Send a file as the `file` part of a multipart form.
///
/// The reader is drained into memory before the request goes out.
pub fn post_file<R: Read>(
    session: &Session,
    url: &str,
    name: &str,
    mut filelike: R,
    mimetype: &str,
) -> Result<serde_json::Value> {
    let mut content = Vec::new();
    filelike.read_to_end(&mut content)?;

    let part = Part::bytes(content)
        .file_name(name.to_string())
        .mime_str(mimetype)?;
    let form = Form::new().part("file", part);

    let response = session.send(session.request(Method::POST, url).multipart(form))?;
    decode_json(response)
}

/// Put binary content as the raw body and decode the JSON response.
pub fn put_file<R: Read + Send + 'static>(
    session: &Session,
    url: &str,
    filelike: R,
    mimetype: &str,
) -> Result<serde_json::Value> {
    let builder = session
        .request(Method::PUT, url)
        .header(CONTENT_TYPE, mimetype)
        .body(Body::new(filelike));
    let response = session.send(builder)?;
    decode_json(response)
}

/// Fetch `url` and write the body into `destination`.
///
/// The destination is only created once the response status is known to be
/// 2xx. Returns the number of bytes written.
pub fn download(session: &Session, url: &str, destination: &Path) -> Result<u64> {
    let response = session.send(session.request(Method::GET, url))?;

    let mut file = File::create(destination)?;
    let written = pump(response, &mut file)?;
    file.flush()?;

    log::debug!("Downloaded {} bytes to {}", written, destination.display());
    Ok(written)
}

/// Copy `source` into `sink` in `CHUNK_SIZE` reads.
pub fn pump<R: Read, W: Write>(mut source: R, sink: &mut W) -> std::io::Result<u64> {
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut total = 0u64;
    loop {
        let n = match source.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        sink.write_all(&buf[..n])?;
        total += n as u64;
    }
    Ok(total)
}

// ── Response handling ───────────────────────────────────────────────

fn error_for_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let body = response.text().unwrap_or_default();
    log::warn!("{} returned HTTP {}", url, status.as_u16());
    Err(ZegamiError::Http { status: status.as_u16(), body })
}

fn decode_json(response: Response) -> Result<serde_json::Value> {
    let text = response.text()?;
    Ok(serde_json::from_str(&text)?)
}

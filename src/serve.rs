//! `siteops serve`: a small static file server for local previews.
//!
//! One accept loop, one thread per connection, no keep-alive. Request
//! handling is a pure function from `(root, Request)` to a [`Response`], so
//! routing, caching headers and error pages are tested without sockets.
//!
//! ## Routing
//!
//! | Request                          | Response                                |
//! |----------------------------------|-----------------------------------------|
//! | `GET /`, `GET /dir/`             | `index.html` of that directory          |
//! | `GET /file` (exists)             | 200 with `ETag`, `Last-Modified`        |
//! | `If-None-Match` matches the ETag | 304, no body                            |
//! | missing file, `..`, other method | 404 with `404.html` (or built-in page)  |
//! | I/O error while reading          | 500 with `500.html` (or built-in page)  |
//!
//! `HEAD` gets the same headers as `GET` without a body.

use chrono::{DateTime, Utc};
use maud::{DOCTYPE, Markup, html};
use sha2::{Digest, Sha256};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::{Component, Path, PathBuf};
use std::thread;
use std::time::{Duration, SystemTime};
use thiserror::Error;

/// At most this many bytes of a request head are read.
const MAX_HEAD_BYTES: usize = 16 * 1024;

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },
}

/// The parts of an HTTP request the server looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub target: String,
    pub if_none_match: Option<String>,
}

impl Request {
    pub fn get(target: &str) -> Self {
        Self {
            method: "GET".to_string(),
            target: target.to_string(),
            if_none_match: None,
        }
    }

    /// Parse a request head (request line plus headers, without the body).
    pub fn parse(head: &str) -> Option<Self> {
        let mut lines = head.lines();
        let mut parts = lines.next()?.split_whitespace();
        let method = parts.next()?.to_string();
        let target = parts.next()?.to_string();

        let if_none_match = lines
            .take_while(|line| !line.is_empty())
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("if-none-match"))
            .map(|(_, value)| value.trim().to_string());

        Some(Self {
            method,
            target,
            if_none_match,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Serialize status line, headers and (unless `head_only`) the body.
    pub fn to_bytes(&self, head_only: bool) -> Vec<u8> {
        let mut out = format!("HTTP/1.1 {} {}\r\n", self.status, reason(self.status));
        for (name, value) in &self.headers {
            out.push_str(&format!("{name}: {value}\r\n"));
        }
        out.push_str(&format!("Content-Length: {}\r\n", self.body.len()));
        out.push_str("Connection: close\r\n\r\n");
        let mut bytes = out.into_bytes();
        if !head_only {
            bytes.extend_from_slice(&self.body);
        }
        bytes
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        304 => "Not Modified",
        400 => "Bad Request",
        404 => "Not Found",
        _ => "Internal Server Error",
    }
}

pub fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "application/javascript; charset=utf-8",
        "json" => "application/json",
        "webmanifest" => "application/manifest+json",
        "xml" => "application/xml",
        "txt" => "text/plain; charset=utf-8",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "gif" => "image/gif",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        _ => "application/octet-stream",
    }
}

/// Map a request target to a file under `root`.
///
/// The query string and fragment are dropped and `%XX` escapes decoded.
/// Returns `None` for targets that are not absolute paths or that contain a
/// `..` segment. Directories map to their `index.html`.
pub fn resolve_target(root: &Path, target: &str) -> Option<PathBuf> {
    let path = target.split(['?', '#']).next().unwrap_or_default();
    if !path.starts_with('/') {
        return None;
    }
    let decoded = percent_decode(path)?;
    let relative = Path::new(decoded.trim_start_matches('/'));
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return None;
    }

    let full = root.join(relative);
    if full.is_dir() {
        Some(full.join("index.html"))
    } else {
        Some(full)
    }
}

/// Decode `%XX` escapes. `None` on a malformed escape or non-UTF-8 result.
pub(crate) fn percent_decode(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = input.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

/// Strong ETag: quoted hex SHA-256 of the body.
pub fn etag(body: &[u8]) -> String {
    format!("\"{:x}\"", Sha256::digest(body))
}

/// RFC 1123 date as used by `Last-Modified`.
pub fn http_date(time: SystemTime) -> String {
    let utc: DateTime<Utc> = time.into();
    utc.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn etag_matches(header: &str, tag: &str) -> bool {
    header.split(',').map(str::trim).any(|candidate| {
        candidate == "*" || candidate.strip_prefix("W/").unwrap_or(candidate) == tag
    })
}

/// Produce the response for `request` against the site under `root`.
pub fn handle(root: &Path, request: &Request) -> Response {
    if request.method != "GET" && request.method != "HEAD" {
        return error_page(root, 404);
    }
    let Some(path) = resolve_target(root, &request.target) else {
        return error_page(root, 404);
    };
    if !path.is_file() {
        return error_page(root, 404);
    }

    match serve_file(&path, request.if_none_match.as_deref()) {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("failed to serve {}: {e}", path.display());
            error_page(root, 500)
        }
    }
}

fn serve_file(path: &Path, if_none_match: Option<&str>) -> std::io::Result<Response> {
    let body = std::fs::read(path)?;
    let modified = std::fs::metadata(path)?.modified()?;
    let tag = etag(&body);

    let headers = vec![
        ("Content-Type", content_type(path).to_string()),
        ("ETag", tag.clone()),
        ("Last-Modified", http_date(modified)),
        ("Cache-Control", "public, max-age=0".to_string()),
    ];

    if if_none_match.is_some_and(|h| etag_matches(h, &tag)) {
        return Ok(Response {
            status: 304,
            headers,
            body: Vec::new(),
        });
    }
    Ok(Response {
        status: 200,
        headers,
        body,
    })
}

/// The site's own `404.html` / `500.html`, or a built-in page when absent.
fn error_page(root: &Path, status: u16) -> Response {
    let body = match std::fs::read(root.join(format!("{status}.html"))) {
        Ok(body) => body,
        Err(_) => fallback_page(status).into_string().into_bytes(),
    };
    Response {
        status,
        headers: vec![("Content-Type", "text/html; charset=utf-8".to_string())],
        body,
    }
}

fn fallback_page(status: u16) -> Markup {
    let title = format!("{status} {}", reason(status));
    let detail = if status == 404 {
        "The requested page does not exist."
    } else {
        "Something went wrong while serving this page."
    };
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
            }
            body {
                main role="main" {
                    h1 { (title) }
                    p { (detail) }
                    a href="/" { "Back to home" }
                }
            }
        }
    }
}

/// A bound listener serving one site root.
pub struct Server {
    listener: TcpListener,
    root: PathBuf,
}

impl Server {
    pub fn bind(root: &Path, host: &str, port: u16) -> Result<Self, ServeError> {
        let addr = format!("{host}:{port}");
        let listener =
            TcpListener::bind(&addr).map_err(|source| ServeError::Bind { addr, source })?;
        Ok(Self {
            listener,
            root: root.to_path_buf(),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServeError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections forever, one thread each.
    pub fn run(self) -> Result<(), ServeError> {
        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) => {
                    let root = self.root.clone();
                    thread::spawn(move || {
                        if let Err(e) = handle_connection(stream, &root) {
                            tracing::debug!("connection error: {e}");
                        }
                    });
                }
                Err(e) => tracing::warn!("accept failed: {e}"),
            }
        }
        Ok(())
    }
}

fn handle_connection(mut stream: TcpStream, root: &Path) -> std::io::Result<()> {
    stream.set_read_timeout(Some(Duration::from_secs(5)))?;
    let head = read_head(&mut stream)?;

    let Some(request) = Request::parse(&head) else {
        let response = Response {
            status: 400,
            headers: vec![("Content-Type", "text/plain; charset=utf-8".to_string())],
            body: b"Bad Request".to_vec(),
        };
        return stream.write_all(&response.to_bytes(false));
    };

    let response = handle(root, &request);
    tracing::info!(
        "{} {} -> {}",
        request.method,
        request.target,
        response.status
    );
    stream.write_all(&response.to_bytes(request.method == "HEAD"))?;
    stream.flush()
}

/// Read up to the blank line ending the head, never more than
/// `MAX_HEAD_BYTES` in total, newline or not.
fn read_head(stream: impl Read) -> std::io::Result<String> {
    let mut reader = BufReader::new(stream.take(MAX_HEAD_BYTES as u64));
    let mut head = String::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        let end = line == "\r\n" || line == "\n";
        head.push_str(&line);
        if end {
            break;
        }
    }
    Ok(head)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::write;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn site() -> TempDir {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "index.html", "<h1>home</h1>");
        write(tmp.path(), "about.html", "<h1>about</h1>");
        write(tmp.path(), "blog/index.html", "<h1>blog</h1>");
        write(tmp.path(), "assets/css/main.css", "body{margin:0}");
        write(tmp.path(), "404.html", "<h1>custom not found</h1>");
        tmp
    }

    #[test]
    fn root_serves_index() {
        let tmp = site();
        let response = handle(tmp.path(), &Request::get("/"));
        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"<h1>home</h1>");
        assert_eq!(
            response.header("content-type"),
            Some("text/html; charset=utf-8")
        );
    }

    #[test]
    fn directory_serves_its_index() {
        let tmp = site();
        assert_eq!(handle(tmp.path(), &Request::get("/blog/")).body, b"<h1>blog</h1>");
        assert_eq!(handle(tmp.path(), &Request::get("/blog")).body, b"<h1>blog</h1>");
    }

    #[test]
    fn file_has_caching_headers() {
        let tmp = site();
        let response = handle(tmp.path(), &Request::get("/assets/css/main.css?v=3"));
        assert_eq!(response.status, 200);
        assert_eq!(response.header("Content-Type"), Some("text/css; charset=utf-8"));
        assert_eq!(response.header("ETag"), Some(etag(b"body{margin:0}").as_str()));
        assert_eq!(response.header("Cache-Control"), Some("public, max-age=0"));
        let last_modified = response.header("Last-Modified").unwrap();
        assert!(last_modified.ends_with(" GMT"), "{last_modified}");
    }

    #[test]
    fn matching_etag_gives_not_modified() {
        let tmp = site();
        let first = handle(tmp.path(), &Request::get("/about.html"));
        let tag = first.header("ETag").unwrap().to_string();

        let mut request = Request::get("/about.html");
        request.if_none_match = Some(format!("\"stale\", {tag}"));
        let second = handle(tmp.path(), &request);
        assert_eq!(second.status, 304);
        assert!(second.body.is_empty());

        request.if_none_match = Some("\"stale\"".to_string());
        assert_eq!(handle(tmp.path(), &request).status, 200);
    }

    #[test]
    fn missing_file_uses_site_404_page() {
        let tmp = site();
        let response = handle(tmp.path(), &Request::get("/nope.html"));
        assert_eq!(response.status, 404);
        assert_eq!(response.body, b"<h1>custom not found</h1>");
    }

    #[test]
    fn traversal_and_other_methods_are_not_found() {
        let tmp = site();
        for target in ["/../secret.txt", "/assets/../../etc/passwd", "/%2e%2e/x", "about.html"] {
            assert_eq!(handle(tmp.path(), &Request::get(target)).status, 404, "{target}");
        }
        let mut post = Request::get("/about.html");
        post.method = "POST".to_string();
        assert_eq!(handle(tmp.path(), &post).status, 404);
    }

    #[test]
    fn builtin_pages_when_site_has_none() {
        let tmp = TempDir::new().unwrap();
        let not_found = handle(tmp.path(), &Request::get("/missing"));
        assert_eq!(not_found.status, 404);
        let body = String::from_utf8(not_found.body).unwrap();
        assert!(body.starts_with("<!DOCTYPE html>"));
        assert!(body.contains("404 Not Found"));

        let internal = error_page(tmp.path(), 500);
        assert_eq!(internal.status, 500);
        assert!(String::from_utf8(internal.body).unwrap().contains("500 Internal Server Error"));
    }

    #[test]
    fn site_500_page_preferred() {
        let tmp = site();
        write(tmp.path(), "500.html", "<h1>oops</h1>");
        assert_eq!(error_page(tmp.path(), 500).body, b"<h1>oops</h1>");
    }

    #[test]
    fn percent_escapes_decoded() {
        let tmp = site();
        write(tmp.path(), "our team.html", "team");
        assert_eq!(handle(tmp.path(), &Request::get("/our%20team.html")).body, b"team");
        assert_eq!(resolve_target(tmp.path(), "/bad%zz"), None);
    }

    #[test]
    fn parse_request_head() {
        let request = Request::parse(
            "GET /about.html HTTP/1.1\r\nHost: localhost\r\nIf-None-Match: \"abc\"\r\n\r\n",
        )
        .unwrap();
        assert_eq!(request.method, "GET");
        assert_eq!(request.target, "/about.html");
        assert_eq!(request.if_none_match.as_deref(), Some("\"abc\""));
        assert!(Request::parse("").is_none());
    }

    #[test]
    fn head_reading_stops_at_blank_line() {
        let raw = "GET / HTTP/1.1\r\nHost: a\r\n\r\nbody bytes";
        let head = read_head(Cursor::new(raw)).unwrap();
        assert_eq!(head, "GET / HTTP/1.1\r\nHost: a\r\n\r\n");
    }

    #[test]
    fn head_reading_is_bounded_without_newline() {
        let endless = format!("GET /{}", "a".repeat(4 * MAX_HEAD_BYTES));
        let head = read_head(Cursor::new(endless)).unwrap();
        assert_eq!(head.len(), MAX_HEAD_BYTES);
    }

    #[test]
    fn head_response_omits_body() {
        let response = Response {
            status: 200,
            headers: vec![("Content-Type", "text/plain".to_string())],
            body: b"hello".to_vec(),
        };
        let head = String::from_utf8(response.to_bytes(true)).unwrap();
        assert!(head.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(head.contains("Content-Length: 5\r\n"));
        assert!(head.ends_with("\r\n\r\n"));
    }

    #[test]
    fn http_date_format() {
        let epoch = SystemTime::UNIX_EPOCH + Duration::from_secs(784_111_777);
        assert_eq!(http_date(epoch), "Sun, 06 Nov 1994 08:49:37 GMT");
    }

    #[test]
    fn live_socket_round_trip() {
        let tmp = site();
        let server = Server::bind(tmp.path(), "127.0.0.1", 0).unwrap();
        let addr = server.local_addr().unwrap();
        thread::spawn(move || server.run());

        let mut stream = TcpStream::connect(addr).unwrap();
        stream
            .write_all(b"GET /about.html HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .unwrap();
        let mut reply = String::new();
        stream.read_to_string(&mut reply).unwrap();
        assert!(reply.starts_with("HTTP/1.1 200 OK"), "{reply}");
        assert!(reply.ends_with("<h1>about</h1>"));
    }
}

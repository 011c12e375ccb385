//! Static file serving.
//!
//! [`FileHandler`] is the terminal handler of a typical kiosk deployment: it
//! maps the request target onto a root directory and serves files, index
//! pages, and directory listings from it. Only HEAD and GET are supported;
//! everything else gets `405` before the request body is touched.
//!
//! The per-exchange decision sequence is fixed: method gate, body discard,
//! path resolution (with containment check), existence check, then the
//! method/file-kind branch. Every branch finalizes the exchange, including
//! branches reached through an I/O failure mid-stream.

use std::fmt::Write as _;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use http::StatusCode;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::warn;

use crate::error::{Error, Result};
use crate::exchange::{BodyLength, Exchange};
use crate::filter::FilterChain;
use crate::handler::{BoxFuture, Handler};
use crate::log::{OutputFilter, OutputLevel};
use crate::method::Method;
use crate::mime;

/// Maps a file name to a media type, or `None` when it has no opinion.
pub type MediaTypeResolver = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Media type used when the resolver yields nothing.
const UNKNOWN_MEDIA_TYPE: &str = "content/unknown";

/// Index files tried, in order, before rendering a directory listing.
const INDEX_FILES: [&str; 2] = ["index.html", "index.htm"];

/// Replaces the HTML-significant characters of `input` with entity
/// references, so untrusted text (request paths, directory entry names) can
/// be echoed into a response body without opening a markup injection.
///
/// All of `& < > " ' /` are neutralized.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            other => out.push(other),
        }
    }
    out
}

/// Percent-encodes a directory entry name for use as an anchor href.
///
/// Everything outside the URI unreserved set becomes `%XX`, so names
/// containing quotes, spaces, or markup cannot terminate the surrounding
/// attribute. `/` passes through untouched; entry names cannot contain one,
/// only the trailing separator appended to directory entries does.
fn percent_encode(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for b in name.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(b as char)
            }
            _ => {
                let _ = write!(out, "%{b:02X}");
            }
        }
    }
    out
}

/// Serves the static content of one directory.
pub struct FileHandler {
    root: PathBuf,
    resolver: MediaTypeResolver,
}

impl FileHandler {
    /// Builds a handler serving `root` with an explicit content-type
    /// resolver.
    ///
    /// `root` must name an existing directory by absolute path, otherwise
    /// construction fails with [`Error::Config`]. The root is fixed for the
    /// handler's lifetime.
    pub fn new(
        root: impl Into<PathBuf>,
        resolver: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) -> Result<Self> {
        let root = root.into();
        if !root.is_absolute() {
            return Err(Error::config(format!(
                "root `{}` is not an absolute path",
                root.display()
            )));
        }
        match std::fs::metadata(&root) {
            Ok(metadata) if metadata.is_dir() => {}
            Ok(_) => {
                return Err(Error::config(format!(
                    "root `{}` is not a directory",
                    root.display()
                )));
            }
            Err(e) => {
                return Err(Error::config(format!(
                    "root `{}` is not usable: {e}",
                    root.display()
                )));
            }
        }
        // Containment checks below compare canonical paths; canonicalize the
        // root once here rather than per request.
        let root = root
            .canonicalize()
            .map_err(|e| Error::config(format!("cannot canonicalize root: {e}")))?;
        Ok(Self { root, resolver: Arc::new(resolver) })
    }

    /// Builds a handler serving `root` with the default resolver backed by
    /// [`mime::media_type`].
    pub fn serving(root: impl Into<PathBuf>) -> Result<Self> {
        Self::new(root, |name: &str| mime::media_type(name).map(str::to_owned))
    }

    /// The canonical root directory this handler serves.
    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn process(&self, exchange: &mut Exchange) -> Result<()> {
        if !matches!(exchange.method(), Method::Head | Method::Get) {
            // Unsupported method: answer without reading the request body.
            exchange
                .send_response_headers(StatusCode::METHOD_NOT_ALLOWED, BodyLength::None)
                .await?;
            return exchange.close().await;
        }
        exchange.discard_request_body().await?;

        let request_path = exchange.request().path().to_owned();
        let context_path = exchange.context_path().to_owned();

        let Some(resolved) = self.resolve(&request_path, &context_path).await else {
            return self.not_found(exchange, &request_path).await;
        };
        let metadata = match fs::metadata(&resolved).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return self.not_found(exchange, &request_path).await;
            }
            Err(e) => return Err(e.into()),
        };

        if exchange.method() == Method::Head {
            exchange
                .response_headers_mut()
                .set("Content-Length", metadata.len().to_string());
            exchange
                .send_response_headers(StatusCode::OK, BodyLength::None)
                .await?;
            return exchange.close().await;
        }

        if metadata.is_dir() {
            if !request_path.ends_with('/') {
                return self.redirect(exchange, &request_path).await;
            }
            for index in INDEX_FILES {
                let candidate = resolved.join(index);
                match fs::metadata(&candidate).await {
                    Ok(meta) if meta.is_file() => {
                        let media_type = self.media_type_for(index);
                        return self
                            .serve_file(exchange, &candidate, meta.len(), media_type)
                            .await;
                    }
                    _ => {}
                }
            }
            return self.list_directory(exchange, &resolved, &request_path).await;
        }

        let media_type = self.media_type_for(&request_path);
        self.serve_file(exchange, &resolved, metadata.len(), media_type).await
    }

    /// Maps the request path, relative to the mount point, onto the root.
    ///
    /// Returns `None` when nothing exists at the candidate path *or* when the
    /// canonicalized candidate escapes the root (`..` segments, symlinks out
    /// of the tree); both answer 404 to the client.
    async fn resolve(&self, request_path: &str, context_path: &str) -> Option<PathBuf> {
        let relative = request_path.strip_prefix(context_path).unwrap_or(request_path);
        let relative = relative.trim_start_matches('/');
        let candidate = if relative.is_empty() {
            self.root.clone()
        } else {
            self.root.join(relative)
        };
        let resolved = fs::canonicalize(&candidate).await.ok()?;
        if resolved.starts_with(&self.root) {
            Some(resolved)
        } else {
            warn!(
                requested = request_path,
                resolved = %resolved.display(),
                "request escaped the served root, answering 404"
            );
            None
        }
    }

    fn media_type_for(&self, name: &str) -> String {
        (self.resolver)(name).unwrap_or_else(|| UNKNOWN_MEDIA_TYPE.to_owned())
    }

    async fn serve_file(
        &self,
        exchange: &mut Exchange,
        path: &Path,
        size: u64,
        media_type: String,
    ) -> Result<()> {
        exchange.response_headers_mut().set("Content-Type", media_type);
        exchange
            .send_response_headers(StatusCode::OK, BodyLength::Known(size))
            .await?;
        let streamed = match fs::File::open(path).await {
            Ok(mut file) => tokio::io::copy(&mut file, exchange.response_body())
                .await
                .map(drop),
            Err(e) => Err(e),
        };
        // The status is already on the wire; all that is left on a failed
        // stream is to release the connection before propagating.
        exchange.close().await?;
        streamed?;
        Ok(())
    }

    async fn not_found(&self, exchange: &mut Exchange, request_path: &str) -> Result<()> {
        let body = format!("<h2>File not found</h2>{}<p>", escape_html(request_path));
        exchange.response_headers_mut().set("Content-Type", "text/html");
        exchange
            .send_response_headers(StatusCode::NOT_FOUND, BodyLength::Known(body.len() as u64))
            .await?;
        let written = exchange.response_body().write_all(body.as_bytes()).await;
        exchange.close().await?;
        written?;
        Ok(())
    }

    async fn redirect(&self, exchange: &mut Exchange, request_path: &str) -> Result<()> {
        let host = exchange.request_headers().first("Host").unwrap_or("").to_owned();
        let location = format!("http://{host}{request_path}/");
        let headers = exchange.response_headers_mut();
        headers.set("Content-Type", "text/html");
        headers.set("Location", location);
        exchange
            .send_response_headers(StatusCode::MOVED_PERMANENTLY, BodyLength::None)
            .await?;
        exchange.close().await
    }

    async fn list_directory(
        &self,
        exchange: &mut Exchange,
        dir: &Path,
        request_path: &str,
    ) -> Result<()> {
        let mut names = Vec::new();
        let mut entries = fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let mut name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
                name.push('/');
            }
            names.push(name);
        }
        // Filesystem enumeration order is arbitrary; sort for stable output.
        names.sort();

        let mut body = String::from("<!DOCTYPE html>\n<html>\n<body>\n");
        let _ = writeln!(body, "<h2>Directory listing for {}</h2>", escape_html(request_path));
        body.push_str("<ul>\n");
        for name in &names {
            // Percent-encoding for the attribute, entity escaping for the
            // visible text; each context gets its own neutralization.
            let _ = writeln!(
                body,
                "<li><a href=\"{}\">{}</a></li>",
                percent_encode(name),
                escape_html(name)
            );
        }
        body.push_str("</ul><p><hr>\n</body>\n</html>\n");

        exchange.response_headers_mut().set("Content-Type", "text/html");
        exchange
            .send_response_headers(StatusCode::OK, BodyLength::Known(body.len() as u64))
            .await?;
        let written = exchange.response_body().write_all(body.as_bytes()).await;
        exchange.close().await?;
        written?;
        Ok(())
    }
}

impl Handler for FileHandler {
    fn handle<'a>(&'a self, exchange: &'a mut Exchange) -> BoxFuture<'a> {
        Box::pin(async move {
            let outcome = self.process(exchange).await;
            if outcome.is_err() {
                // Release the connection even when processing failed midway;
                // the original failure is the one worth reporting.
                let _ = exchange.close().await;
            }
            outcome
        })
    }
}

/// Assembles the out-of-the-box file server: a [`FileHandler`] with the
/// default resolver, wrapped in a [`FilterChain`] that carries an
/// [`OutputFilter`] writing to `sink` unless `level` is
/// [`OutputLevel::None`].
///
/// The transport engine drives the returned chain with one call to
/// [`FilterChain::run`] per exchange.
pub fn file_server(
    root: impl Into<PathBuf>,
    level: OutputLevel,
    sink: impl io::Write + Send + 'static,
) -> Result<FilterChain> {
    let chain = FilterChain::new(FileHandler::serving(root)?);
    match level {
        OutputLevel::None => Ok(chain),
        level => Ok(chain.with(OutputFilter::new(sink, level)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_neutralizes_all_six_characters() {
        assert_eq!(
            escape_html(r#"&<>"'/"#),
            "&amp;&lt;&gt;&quot;&#x27;&#x2F;"
        );
        let escaped = escape_html("<script>alert('/etc/passwd')</script>");
        assert!(!escaped.contains('<'));
        assert!(!escaped.contains('>'));
        assert!(!escaped.contains('\''));
        assert!(!escaped.contains('/'));
    }

    #[test]
    fn escape_leaves_ordinary_text_alone() {
        assert_eq!(escape_html("plain text-file_1.txt"), "plain text-file_1.txt");
        assert_eq!(escape_html(""), "");
    }

    #[test]
    fn escaping_twice_re_escapes_the_ampersands() {
        // Not idempotent, and deliberately so: `&` from the first pass is
        // itself escapable input to a second pass.
        assert_eq!(escape_html(&escape_html("<")), "&amp;lt;");
    }

    #[test]
    fn percent_encoding_neutralizes_attribute_breakouts() {
        assert_eq!(
            percent_encode("a\" onmouseover=\"alert(1)"),
            "a%22%20onmouseover%3D%22alert%281%29"
        );
        assert_eq!(percent_encode("with space.txt"), "with%20space.txt");
        assert_eq!(percent_encode("a<&>'quote.txt"), "a%3C%26%3E%27quote.txt");
    }

    #[test]
    fn percent_encoding_keeps_unreserved_names_and_the_dir_separator() {
        assert_eq!(percent_encode("plain-file_1.txt"), "plain-file_1.txt");
        assert_eq!(percent_encode("sub/"), "sub/");
    }

    #[test]
    fn construction_requires_an_absolute_existing_directory() {
        assert!(FileHandler::serving("relative/path").is_err());
        assert!(FileHandler::serving("/definitely/not/there").is_err());

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        std::fs::write(&file, b"x").unwrap();
        assert!(FileHandler::serving(&file).is_err());
        assert!(FileHandler::serving(dir.path()).is_ok());
    }

    #[test]
    fn resolver_fallback_is_content_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let handler = FileHandler::serving(dir.path()).unwrap();
        assert_eq!(handler.media_type_for("strange.xyz"), "content/unknown");
        assert_eq!(handler.media_type_for("page.html"), "text/html");
    }

    #[test]
    fn file_server_skips_the_filter_at_level_none() {
        let dir = tempfile::tempdir().unwrap();
        let silent = file_server(dir.path(), OutputLevel::None, Vec::<u8>::new()).unwrap();
        assert!(silent.descriptions().is_empty());

        let logged = file_server(dir.path(), OutputLevel::Verbose, Vec::<u8>::new()).unwrap();
        assert_eq!(logged.descriptions(), ["exchange output filter (verbose)"]);
    }
}

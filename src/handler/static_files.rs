//! Static file serving module
//!
//! Maps a request path onto a file under the root directory, refusing
//! anything that would escape it, and builds the file response.

use crate::config::AppState;
use crate::handler::router::RequestContext;
use crate::http::cache::{self, CachePolicy};
use crate::http::range::RangeOutcome;
use crate::http::response::{self, FileHeaders};
use crate::http::{self, mime};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;

/// Why a request path produced no file
#[derive(Debug)]
pub enum ServeError {
    /// Nothing servable at that path (missing, a directory, undecodable name)
    NotFound,
    /// The path points outside the root
    Traversal,
    /// Any other filesystem failure
    Io(io::Error),
}

impl From<io::Error> for ServeError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::NotADirectory | io::ErrorKind::InvalidInput => {
                Self::NotFound
            }
            _ => Self::Io(e),
        }
    }
}

/// A file loaded from under the root
#[derive(Debug)]
pub struct StaticFile {
    pub data: Bytes,
    pub content_type: &'static str,
    pub modified: Option<SystemTime>,
}

/// Serve the file named by the request path
pub async fn serve(ctx: &RequestContext<'_>, state: &AppState) -> Response<Full<Bytes>> {
    let loaded = match resolve_request_path(state.root(), ctx.path, state.index_file()) {
        Ok(candidate) => load_file(state.root(), &candidate).await,
        Err(e) => Err(e),
    };

    match loaded {
        Ok(file) => {
            logger::log_debug(&format!("Serving {} ({} bytes)", ctx.path, file.data.len()));
            build_static_file_response(&file, ctx, state.cache_policy())
        }
        Err(ServeError::NotFound) => http::build_404_response(ctx.is_head),
        Err(ServeError::Traversal) => {
            logger::log_warning(&format!("Path traversal attempt blocked: {}", ctx.path));
            http::build_404_response(ctx.is_head)
        }
        Err(ServeError::Io(e)) => {
            logger::log_error(&format!("Failed to read '{}': {e}", ctx.path));
            http::build_500_response(ctx.is_head)
        }
    }
}

/// Turn a raw (still percent-encoded) request path into a candidate file path
///
/// `/` maps to `index_file`. The result is lexically inside `root`; symlinks
/// are checked later by [`load_file`].
pub fn resolve_request_path(root: &Path, request_path: &str, index_file: &str) -> Result<PathBuf, ServeError> {
    let decoded = percent_decode(request_path).ok_or(ServeError::NotFound)?;
    if decoded.contains('\0') {
        return Err(ServeError::NotFound);
    }

    let relative = match decoded.trim_start_matches('/') {
        "" => index_file,
        rest => rest,
    };

    let mut target = root.to_path_buf();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => target.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ServeError::Traversal);
            }
        }
    }
    Ok(target)
}

/// Read a regular file, provided its canonical location is still under `root`
///
/// `root` must already be canonical.
pub async fn load_file(root: &Path, candidate: &Path) -> Result<StaticFile, ServeError> {
    let canonical = fs::canonicalize(candidate).await?;
    if !canonical.starts_with(root) {
        return Err(ServeError::Traversal);
    }

    let metadata = fs::metadata(&canonical).await?;
    if !metadata.is_file() {
        return Err(ServeError::NotFound);
    }

    let data = fs::read(&canonical).await?;
    Ok(StaticFile {
        data: Bytes::from(data),
        content_type: mime::content_type_for(candidate),
        modified: metadata.modified().ok(),
    })
}

/// Decode `%XX` escapes; `None` for malformed escapes or non-UTF-8 results
///
/// `+` is left alone, it only means space in query strings.
pub fn percent_decode(raw: &str) -> Option<String> {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hi = hex_value(*bytes.get(i + 1)?)?;
            let lo = hex_value(*bytes.get(i + 2)?)?;
            out.push((hi << 4) | lo);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

const fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Build the file response, honoring conditional and Range headers
fn build_static_file_response(
    file: &StaticFile,
    ctx: &RequestContext<'_>,
    policy: CachePolicy,
) -> Response<Full<Bytes>> {
    let etag = cache::generate_etag(&file.data);
    let last_modified = file.modified.map(cache::format_http_date);
    let cache_control = policy.to_header_value();
    let headers = FileHeaders {
        content_type: file.content_type,
        etag: &etag,
        last_modified: last_modified.as_deref(),
        cache_control: &cache_control,
    };

    // If-Modified-Since only counts when no If-None-Match was sent
    let not_modified = match ctx.if_none_match.as_deref() {
        Some(_) => cache::check_etag_match(ctx.if_none_match.as_deref(), &etag),
        None => file
            .modified
            .is_some_and(|m| cache::not_modified_since(ctx.if_modified_since.as_deref(), m)),
    };
    if not_modified {
        return http::build_304_response(&headers);
    }

    match http::parse_range_header(ctx.range_header.as_deref(), file.data.len()) {
        RangeOutcome::Partial(range) => {
            response::build_partial_response(&file.data, range, &headers, ctx.is_head)
        }
        RangeOutcome::Unsatisfiable => http::build_416_response(file.data.len()),
        RangeOutcome::Full => response::build_file_response(file.data.clone(), &headers, ctx.is_head),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn game_root() -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("www/img")).unwrap();
        std::fs::write(dir.path().join("www/index.html"), "A").unwrap();
        std::fs::write(dir.path().join("www/style.css"), "B").unwrap();
        std::fs::write(dir.path().join("www/img/cat.png"), [0x89, b'P', b'N', b'G']).unwrap();
        std::fs::write(dir.path().join("secret.txt"), "top secret").unwrap();
        let root = dir.path().join("www").canonicalize().unwrap();
        (dir, root)
    }

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode("/my%20game.js").as_deref(), Some("/my game.js"));
        assert_eq!(percent_decode("/%2e%2E/x").as_deref(), Some("/../x"));
        assert_eq!(percent_decode("/a+b").as_deref(), Some("/a+b"));
        assert_eq!(percent_decode("/caf%C3%A9").as_deref(), Some("/café"));
        assert!(percent_decode("/bad%2").is_none());
        assert!(percent_decode("/bad%zz").is_none());
        assert!(percent_decode("/bad%ff").is_none());
    }

    #[test]
    fn test_io_error_mapping() {
        let kind = |k: io::ErrorKind| ServeError::from(io::Error::from(k));
        assert!(matches!(kind(io::ErrorKind::NotFound), ServeError::NotFound));
        assert!(matches!(kind(io::ErrorKind::NotADirectory), ServeError::NotFound));
        assert!(matches!(kind(io::ErrorKind::InvalidInput), ServeError::NotFound));
        assert!(matches!(kind(io::ErrorKind::PermissionDenied), ServeError::Io(_)));
        assert!(matches!(kind(io::ErrorKind::Interrupted), ServeError::Io(_)));
    }

    #[test]
    fn test_root_maps_to_index() {
        let root = Path::new("/srv/game");
        assert_eq!(
            resolve_request_path(root, "/", "index.html").unwrap(),
            root.join("index.html")
        );
        assert_eq!(
            resolve_request_path(root, "/js/app.js", "index.html").unwrap(),
            root.join("js/app.js")
        );
        assert_eq!(
            resolve_request_path(root, "//./js//app.js", "index.html").unwrap(),
            root.join("js/app.js")
        );
    }

    #[test]
    fn test_traversal_is_rejected_lexically() {
        let root = Path::new("/srv/game");
        for path in [
            "/../../etc/passwd",
            "/img/../../secret.txt",
            "/%2e%2e/secret.txt",
            "/..%2fsecret.txt",
            "/img/..",
        ] {
            assert!(
                matches!(resolve_request_path(root, path, "index.html"), Err(ServeError::Traversal)),
                "{path} should be rejected"
            );
        }
    }

    #[test]
    fn test_undecodable_is_not_found() {
        let root = Path::new("/srv/game");
        assert!(matches!(resolve_request_path(root, "/%zz", "index.html"), Err(ServeError::NotFound)));
        assert!(matches!(resolve_request_path(root, "/a%00.js", "index.html"), Err(ServeError::NotFound)));
    }

    #[tokio::test]
    async fn test_load_existing_file() {
        let (_dir, root) = game_root();
        let file = load_file(&root, &root.join("style.css")).await.unwrap();
        assert_eq!(file.data, "B");
        assert_eq!(file.content_type, "text/css; charset=utf-8");
        assert!(file.modified.is_some());
    }

    #[tokio::test]
    async fn test_load_missing_and_directory() {
        let (_dir, root) = game_root();
        assert!(matches!(load_file(&root, &root.join("missing.js")).await, Err(ServeError::NotFound)));
        assert!(matches!(load_file(&root, &root.join("img")).await, Err(ServeError::NotFound)));
        assert!(matches!(
            load_file(&root, &root.join("index.html/child")).await,
            Err(ServeError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_candidate_outside_root_is_refused() {
        let (dir, root) = game_root();
        let outside = dir.path().join("secret.txt");
        assert!(matches!(load_file(&root, &outside).await, Err(ServeError::Traversal)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_escape_is_refused() {
        let (dir, root) = game_root();
        std::os::unix::fs::symlink(dir.path().join("secret.txt"), root.join("leak.txt")).unwrap();
        std::os::unix::fs::symlink(dir.path(), root.join("parent")).unwrap();

        assert!(matches!(load_file(&root, &root.join("leak.txt")).await, Err(ServeError::Traversal)));
        assert!(matches!(
            load_file(&root, &root.join("parent/secret.txt")).await,
            Err(ServeError::Traversal)
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_loop_is_an_io_error() {
        let (_dir, root) = game_root();
        std::os::unix::fs::symlink(root.join("pong.js"), root.join("ping.js")).unwrap();
        std::os::unix::fs::symlink(root.join("ping.js"), root.join("pong.js")).unwrap();
        assert!(matches!(load_file(&root, &root.join("ping.js")).await, Err(ServeError::Io(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_inside_root_is_served() {
        let (_dir, root) = game_root();
        std::os::unix::fs::symlink(root.join("img/cat.png"), root.join("logo.png")).unwrap();
        let file = load_file(&root, &root.join("logo.png")).await.unwrap();
        assert_eq!(file.content_type, "image/png");
        assert_eq!(file.data.len(), 4);
    }
}

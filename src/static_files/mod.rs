//! Static file serving from a public directory.
//!
//! A [`Public`] mapping ties a URL prefix to a directory on disk. A request path
//! under `prefix/` maps to the directory joined with the rest of the path, and if
//! a regular file exists there it is served ahead of any dynamic route. A missing
//! file is not an error: the request simply falls through to routing.
//!
//! The part after the prefix is percent-decoded segment by segment, so
//! `/static/my%20file.txt` finds `my file.txt`. Routing itself still sees the
//! raw path.

use std::path::{Component, Path, PathBuf};

use percent_encoding::percent_decode_str;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::http::mime;
use crate::{Response, StatusCode};

/// URL prefix → directory mapping.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use zapi::static_files::Public;
///
/// let public = Public::new("/static", "./public");
/// assert_eq!(
///     public.resolve("/static/css/site.css"),
///     Some(PathBuf::from("./public/css/site.css"))
/// );
/// assert_eq!(public.resolve("/staticfile"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Public {
    /// URL prefix without a trailing slash, e.g. `/static`.
    pub prefix: String,
    /// Directory the prefix maps onto.
    pub dir: PathBuf,
}

impl Public {
    /// Map `prefix` onto `dir`.
    pub fn new(prefix: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
            dir: dir.into(),
        }
    }

    /// Maps a request path to a file path.
    ///
    /// Returns `None` if the path is not under `prefix/`, a segment does not
    /// decode to UTF-8 or decodes to something containing `/` or NUL, or the
    /// decoded path tries to climb out of the directory with `..`.
    pub fn resolve(&self, path: &str) -> Option<PathBuf> {
        let rest = path.strip_prefix(self.prefix.as_str())?;
        let rest = rest.strip_prefix('/')?;

        let mut resolved = self.dir.clone();
        for segment in rest.split('/') {
            let segment = percent_decode_str(segment).decode_utf8().ok()?;
            if segment.contains(['/', '\0']) {
                return None;
            }
            for component in Path::new(&*segment).components() {
                match component {
                    Component::Normal(part) => resolved.push(part),
                    Component::CurDir => {}
                    _ => return None,
                }
            }
        }
        Some(resolved)
    }

    /// Serves the file `path` maps to, if it exists as a regular file.
    ///
    /// Returns `None` when the path is outside the mapping or no readable file is
    /// there, in which case the caller should continue with routing.
    pub async fn serve(&self, path: &str) -> Option<Response> {
        let file = self.resolve(path)?;

        match tokio::fs::metadata(&file).await {
            Ok(meta) if meta.is_file() => {}
            _ => return None,
        }

        match tokio::fs::read(&file).await {
            Ok(data) => {
                debug!(path, file = %file.display(), "serving static file");
                Some(
                    Response::new(StatusCode::Ok)
                        .header("Content-Type", mime::content_type(&file))
                        .body_bytes(data),
                )
            }
            Err(e) => {
                warn!(file = %file.display(), error = %e, "static file unreadable");
                None
            }
        }
    }
}

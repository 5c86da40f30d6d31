//! URL to vendored file resolution.

use std::path::{Path, PathBuf};

/// URL prefix of the vendored front-end libraries.
pub const VENDOR_PREFIX: &str = "/vendor/";

/// Library directories under the vendor dir that may be served.
const VENDOR_LIBS: &[&str] = &["mermaid", "svg-pan-zoom", "highlight"];

/// Resolve a `/vendor/<lib>/<file>` URL to a file inside `vendor_dir`.
///
/// Returns `None` for unknown libraries, traversal attempts, anything that
/// escapes `vendor_dir` through symlinks, and non-files.
pub fn resolve_vendor(url: &str, vendor_dir: &Path) -> Option<PathBuf> {
    let clean = normalize_url(url);
    let rest = clean.strip_prefix(VENDOR_PREFIX.trim_start_matches('/'))?;

    // Reject paths with suspicious patterns early
    if rest.contains("..") || rest.contains('\\') {
        return None;
    }

    let lib = rest.split('/').next()?;
    if !VENDOR_LIBS.contains(&lib) {
        return None;
    }

    let local = vendor_dir.join(rest);

    // Canonicalize to resolve symlinks and verify path is under vendor_dir
    let canonical = local.canonicalize().ok()?;
    let root_canonical = vendor_dir.canonicalize().ok()?;

    if !canonical.starts_with(&root_canonical) {
        return None;
    }

    canonical.is_file().then_some(canonical)
}

/// Normalize URL: decode, strip query string, trim slashes
fn normalize_url(url: &str) -> String {
    use percent_encoding::percent_decode_str;

    let path = url.split(['?', '#']).next().unwrap_or(url);
    let decoded = percent_decode_str(path)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_default();

    decoded.trim_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn vendor() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("mermaid")).unwrap();
        fs::create_dir_all(dir.path().join("other")).unwrap();
        fs::write(dir.path().join("mermaid/mermaid.min.js"), "m").unwrap();
        fs::write(dir.path().join("other/x.js"), "x").unwrap();
        fs::write(dir.path().join("secret.txt"), "s").unwrap();
        dir
    }

    #[test]
    fn test_resolves_known_library() {
        let dir = vendor();
        let path = resolve_vendor("/vendor/mermaid/mermaid.min.js?v=1", dir.path()).unwrap();
        assert!(path.ends_with("mermaid/mermaid.min.js"));
    }

    #[test]
    fn test_rejects_unknown_library() {
        let dir = vendor();
        assert!(resolve_vendor("/vendor/other/x.js", dir.path()).is_none());
        assert!(resolve_vendor("/vendor/secret.txt", dir.path()).is_none());
    }

    #[test]
    fn test_rejects_traversal() {
        let dir = vendor();
        assert!(resolve_vendor("/vendor/mermaid/../secret.txt", dir.path()).is_none());
        assert!(resolve_vendor("/vendor/mermaid/%2e%2e/secret.txt", dir.path()).is_none());
    }

    #[test]
    fn test_rejects_directories_and_missing() {
        let dir = vendor();
        assert!(resolve_vendor("/vendor/mermaid/", dir.path()).is_none());
        assert!(resolve_vendor("/vendor/mermaid/absent.js", dir.path()).is_none());
        assert!(resolve_vendor("/other/mermaid/mermaid.min.js", dir.path()).is_none());
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("/vendor/a%20b.js?x#y"), "vendor/a b.js");
        assert_eq!(normalize_url("/"), "");
    }
}

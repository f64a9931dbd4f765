use std::path::Path;

use sonar_backend::BackendError;

/// What a brew-managed symlink points at, recovered from its target path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedInstall {
    /// The Cellar directory name: `opensearch`, `opensearch@1`, or the
    /// pre-aliasing `opensearch1` spelling.
    pub formula: String,
    /// The point version from the keg directory (`1.3.9`), with any brew
    /// revision suffix (`_2`) stripped. Absent in the oldest layout, which
    /// had no version directory.
    pub version: Option<String>,
}

/// Parse a link target under the Homebrew Cellar.
///
/// Accepted shapes — exactly the historical layouts brew has used:
/// - `../Cellar/opensearch@1/1.3.9/bin/opensearch`
/// - `../Cellar/opensearch/1.3.12_2/bin/opensearch`
/// - `../Cellar/opensearch1/bin/opensearch`
///
/// # Errors
/// Anything else fails with `LinkFailed` rather than returning an empty
/// match.
pub fn parse_link_target(target: &Path) -> Result<LinkedInstall, BackendError> {
    let components: Vec<&str> = target
        .components()
        .filter_map(|component| component.as_os_str().to_str())
        .collect();

    let cellar = components
        .iter()
        .position(|component| *component == "Cellar")
        .ok_or_else(|| link_failed(target, "no Cellar component"))?;

    let formula = components
        .get(cellar + 1)
        .filter(|name| name.starts_with("opensearch"))
        .ok_or_else(|| link_failed(target, "no opensearch keg after Cellar"))?;

    let version = components
        .get(cellar + 2)
        .filter(|dir| looks_like_version(dir))
        .map(|dir| strip_revision(dir).to_string());

    Ok(LinkedInstall {
        formula: (*formula).to_string(),
        version,
    })
}

fn looks_like_version(dir: &str) -> bool {
    dir.starts_with(|c: char| c.is_ascii_digit()) && dir.contains('.')
}

/// Drop brew's `_N` rebuild suffix: plugin artifacts embed `1.3.12`, never
/// `1.3.12_2`.
fn strip_revision(version: &str) -> &str {
    version.split('_').next().unwrap_or(version)
}

fn link_failed(target: &Path, details: &str) -> BackendError {
    BackendError::link_failed(target.display().to_string(), details)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::parse_link_target;

    #[test]
    fn parses_versioned_keg_with_at_suffix() {
        let linked = parse_link_target(Path::new("../Cellar/opensearch@1/1.3.9/bin/opensearch"))
            .expect("versioned keg parses");

        assert_eq!(linked.formula, "opensearch@1");
        assert_eq!(linked.version.as_deref(), Some("1.3.9"));
    }

    #[test]
    fn parses_plain_keg_and_strips_rebuild_suffix() {
        let linked = parse_link_target(Path::new(
            "/opt/homebrew/Cellar/opensearch/1.3.12_2/bin/opensearch",
        ))
        .expect("plain keg parses");

        assert_eq!(linked.formula, "opensearch");
        assert_eq!(linked.version.as_deref(), Some("1.3.12"));
    }

    #[test]
    fn parses_legacy_unversioned_layout() {
        let linked = parse_link_target(Path::new("../Cellar/opensearch1/bin/opensearch"))
            .expect("legacy layout parses");

        assert_eq!(linked.formula, "opensearch1");
        assert_eq!(linked.version, None);
    }

    #[test]
    fn rejects_paths_outside_the_cellar() {
        let error = parse_link_target(Path::new("/usr/local/bin/opensearch"))
            .expect_err("no Cellar component");

        assert!(matches!(error, sonar_backend::BackendError::LinkFailed { .. }));
    }

    #[test]
    fn rejects_foreign_kegs() {
        let error = parse_link_target(Path::new("../Cellar/solr/9.4.0/bin/solr"))
            .expect_err("not an opensearch keg");

        assert!(matches!(error, sonar_backend::BackendError::LinkFailed { .. }));
    }
}

/// Locating the Proton Mail Beta executable.
///
/// Resolution order:
/// 1. an explicit path (CLI flag), which always wins and is persisted,
/// 2. the path remembered in the config file, returned verbatim without an
///    existence check,
/// 3. a fixed probe over the known install locations, where the first hit is
///    persisted for next time.
use crate::config::{load_config, save_config};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Standard install locations of Proton Mail Beta, probed in order.
const CANDIDATE_PATHS: &[&str] = &[
    "/usr/lib/proton-mail/Proton Mail Beta",
    "/opt/proton-mail/Proton Mail Beta",
];

/// Resolve the path to the Proton Mail Beta executable, or `None` if it
/// cannot be found anywhere.
pub fn resolve(explicit: Option<&Path>, config_path: &Path) -> Option<PathBuf> {
    let candidates: Vec<PathBuf> = CANDIDATE_PATHS.iter().map(PathBuf::from).collect();
    resolve_with_candidates(explicit, config_path, &candidates)
}

/// Same as [`resolve`], with the probe list injected so tests can point it at
/// temporary directories.
pub fn resolve_with_candidates(
    explicit: Option<&Path>,
    config_path: &Path,
    candidates: &[PathBuf],
) -> Option<PathBuf> {
    let mut config = load_config(config_path);

    if let Some(path) = explicit {
        info!(path = %path.display(), "Proton Mail path provided via CLI");
        config.proton_mail_path = Some(path.to_path_buf());
        persist(config_path, &config);
        return Some(path.to_path_buf());
    }

    if let Some(path) = config.proton_mail_path.clone() {
        info!(path = %path.display(), "Proton Mail path found in config");
        return Some(path);
    }

    info!("Proton Mail path not in config, probing standard locations");
    let found = candidates.iter().find(|path| path.exists())?.clone();
    info!(path = %found.display(), "found Proton Mail Beta");
    config.proton_mail_path = Some(found.clone());
    persist(config_path, &config);
    Some(found)
}

fn persist(config_path: &Path, config: &crate::config::TrayConfig) {
    if let Err(e) = save_config(config_path, config) {
        warn!(path = %config_path.display(), error = %e, "unable to persist config");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn config_json(path: &Path) -> serde_json::Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn test_explicit_path_wins_and_is_persisted() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        fs::write(&config_path, r#"{"proton_mail_path": "/stale/previous"}"#).unwrap();

        let result = resolve_with_candidates(
            Some(Path::new("/opt/x/App")),
            &config_path,
            &[],
        );

        assert_eq!(result, Some(PathBuf::from("/opt/x/App")));
        assert_eq!(config_json(&config_path)["proton_mail_path"], "/opt/x/App");
    }

    #[test]
    fn test_explicit_path_is_idempotent() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");

        resolve_with_candidates(Some(Path::new("/opt/x/App")), &config_path, &[]);
        let first = fs::read_to_string(&config_path).unwrap();
        resolve_with_candidates(Some(Path::new("/opt/x/App")), &config_path, &[]);
        let second = fs::read_to_string(&config_path).unwrap();

        assert_eq!(first, second);
        assert_eq!(config_json(&config_path)["proton_mail_path"], "/opt/x/App");
    }

    #[test]
    fn test_persisted_path_returned_verbatim_even_if_stale() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        fs::write(
            &config_path,
            r#"{"proton_mail_path": "/no/longer/exists"}"#,
        )
        .unwrap();

        // Existing candidate that must NOT be picked over the persisted value.
        let candidate = dir.path().join("installed-app");
        fs::write(&candidate, "").unwrap();

        let result = resolve_with_candidates(None, &config_path, &[candidate]);

        assert_eq!(result, Some(PathBuf::from("/no/longer/exists")));
    }

    #[test]
    fn test_first_existing_candidate_is_returned_and_persisted() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");

        let missing = dir.path().join("missing-app");
        let first = dir.path().join("first-app");
        let second = dir.path().join("second-app");
        fs::write(&first, "").unwrap();
        fs::write(&second, "").unwrap();

        let result = resolve_with_candidates(
            None,
            &config_path,
            &[missing, first.clone(), second],
        );

        assert_eq!(result, Some(first.clone()));
        assert_eq!(
            config_json(&config_path)["proton_mail_path"],
            first.to_str().unwrap()
        );
    }

    #[test]
    fn test_no_candidate_exists_returns_none_and_persists_nothing() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");

        let result = resolve_with_candidates(
            None,
            &config_path,
            &[dir.path().join("nope"), dir.path().join("also-nope")],
        );

        assert_eq!(result, None);
        assert!(!config_path.exists());
    }

    #[test]
    fn test_empty_config_with_explicit_path_scenario() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        fs::write(&config_path, "{}").unwrap();

        let result = resolve_with_candidates(Some(Path::new("/opt/x/App")), &config_path, &[]);

        assert_eq!(result, Some(PathBuf::from("/opt/x/App")));
        let json = config_json(&config_path);
        assert_eq!(json, serde_json::json!({"proton_mail_path": "/opt/x/App"}));
    }
}

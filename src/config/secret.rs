// src/config/secret.rs
use std::fs;
use std::path::Path;

/// Resolve a secret value that may either be the secret itself or a path to a
/// file holding it (e.g. a mounted docker/k8s secret).
///
/// If `raw` names an existing file its contents are returned, trimmed of
/// surrounding whitespace. Otherwise `raw` is returned unchanged.
pub fn resolve_secret(raw: &str) -> String {
    let path = Path::new(raw);
    if raw.is_empty() || !path.is_file() {
        return raw.to_string();
    }
    match fs::read_to_string(path) {
        Ok(content) => content.trim().to_string(),
        Err(e) => {
            tracing::warn!(error = ?e, path = %path.display(), "secret file unreadable, using literal value");
            raw.to_string()
        }
    }
}

/// Read `var` from the environment and resolve it with [`resolve_secret`].
/// Unset or blank values yield `None`.
pub fn secret_from_env(var: &str) -> Option<String> {
    let raw = std::env::var(var).ok()?;
    let value = resolve_secret(raw.trim());
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

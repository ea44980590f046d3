//! Persisted client state.
//!
//! Tokens and UI state survive restarts in a JSON document whose single
//! top-level key is a versioned root key (for example `hermes-v1`):
//!
//! ```json
//! {
//!   "hermes-v1": {
//!     "token": { "access_token": "..." },
//!     "elevated_token": null,
//!     "ui": { "theme": "dark", "nav_collapsed": false, "redirect_path": null, "feedback": {} }
//!   }
//! }
//! ```
//!
//! A document written under another root key is treated as absent, so
//! bumping the version discards stale state.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::{HermesError, HermesResult};
use crate::store::{Action, Store, Token, UiState};

/// The part of the store that is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PersistedState {
    /// Access token.
    #[serde(default)]
    pub token: Option<Token>,
    /// Elevated token.
    #[serde(default)]
    pub elevated_token: Option<Token>,
    /// UI state.
    #[serde(default)]
    pub ui: UiState,
}

impl PersistedState {
    /// Captures the persisted part of a store.
    #[must_use]
    pub fn capture(store: &Store) -> Self {
        store.select(|state| Self {
            token: state.token.clone(),
            elevated_token: state.elevated_token.clone(),
            ui: state.ui.clone(),
        })
    }
}

impl Store {
    /// Loads persisted state into the store through regular actions.
    pub fn hydrate(&self, persisted: PersistedState) {
        if let Some(token) = persisted.token {
            self.dispatch(Action::SetToken(token));
        }
        if let Some(token) = persisted.elevated_token {
            self.dispatch(Action::SetElevatedToken(token));
        }
        let ui = persisted.ui;
        self.dispatch(Action::SetTheme(ui.theme));
        self.dispatch(Action::SetNavCollapsed(ui.nav_collapsed));
        self.dispatch(Action::SetRedirectPath(ui.redirect_path));
        self.dispatch(Action::SetFeedback(ui.feedback));
    }
}

/// Writes the persisted part of the store under `root_key`.
///
/// The document is written to a temporary file next to `path` and renamed
/// over it, so a reader never sees a partial write.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn save_state(path: impl AsRef<Path>, root_key: &str, store: &Store) -> HermesResult<()> {
    let path = path.as_ref();
    let mut document = serde_json::Map::new();
    document.insert(
        root_key.to_string(),
        serde_json::to_value(PersistedState::capture(store))?,
    );
    let content = serde_json::to_string_pretty(&serde_json::Value::Object(document))?;

    let write_error = |e: std::io::Error| {
        HermesError::internal(format!("failed to write {}: {e}", path.display()))
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir).map_err(write_error)?;
    file.write_all(content.as_bytes()).map_err(write_error)?;
    file.as_file().sync_all().map_err(write_error)?;
    file.persist(path).map_err(|e| write_error(e.error))?;

    tracing::debug!(path = %path.display(), root_key, "persisted client state");
    Ok(())
}

/// Reads persisted state written under `root_key`.
///
/// Returns `Ok(None)` if the file does not exist, was written under a
/// different root key or cannot be decoded. Undecodable state is logged
/// and left for the next [`save_state`] to overwrite.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub fn load_state(path: impl AsRef<Path>, root_key: &str) -> HermesResult<Option<PersistedState>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path).map_err(|e| {
        HermesError::internal(format!("failed to read {}: {e}", path.display()))
    })?;

    let decoded = serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(&content)
        .and_then(|mut document| {
            document
                .remove(root_key)
                .map(serde_json::from_value::<PersistedState>)
                .transpose()
        });

    match decoded {
        Ok(Some(state)) => Ok(Some(state)),
        Ok(None) => {
            tracing::debug!(path = %path.display(), root_key, "no persisted state for root key");
            Ok(None)
        }
        Err(error) => {
            tracing::warn!(
                path = %path.display(),
                root_key,
                error = %error,
                "discarding unreadable persisted state"
            );
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Theme;

    #[test]
    fn test_save_then_load_restores_tokens_and_ui() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = Store::new();
        store.dispatch(Action::SetToken(Token::new("abc")));
        store.dispatch(Action::SetTheme(Theme::Dark));
        store.dispatch(Action::SetRedirectPath(Some("/databases".into())));
        save_state(&path, "hermes-v1", &store).unwrap();

        let restored = Store::new();
        restored.hydrate(load_state(&path, "hermes-v1").unwrap().unwrap());

        assert_eq!(restored.access_token().as_deref(), Some("abc"));
        assert_eq!(restored.ui().theme, Theme::Dark);
        assert_eq!(restored.ui().redirect_path.as_deref(), Some("/databases"));
    }

    #[test]
    fn test_other_root_key_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        save_state(&path, "hermes-v1", &Store::new()).unwrap();
        assert!(load_state(&path, "hermes-v2").unwrap().is_none());
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_state(dir.path().join("nope.json"), "hermes-v1")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_truncated_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, r#"{"hermes-v1": {"token": "#).unwrap();
        assert!(load_state(&path, "hermes-v1").unwrap().is_none());

        fs::write(&path, r#"{"hermes-v1": {"token": 42}}"#).unwrap();
        assert!(load_state(&path, "hermes-v1").unwrap().is_none());
    }

    #[test]
    fn test_save_replaces_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "not json").unwrap();

        let store = Store::new();
        store.dispatch(Action::SetToken(Token::new("fresh")));
        save_state(&path, "hermes-v1", &store).unwrap();

        let loaded = load_state(&path, "hermes-v1").unwrap().unwrap();
        assert_eq!(loaded.token.unwrap().access_token, "fresh");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}

//! The shared client store.
//!
//! The store is the only shared mutable resource in Hermes. Every write goes
//! through [`Store::dispatch`] with an [`Action`]; the reducer runs under a
//! single write lock, so there is exactly one writer at a time. Reads go
//! through [`Store::select`] or one of the typed selectors.
//!
//! Entities are normalized: one table per resource type (`app`, `database`,
//! `operation`, ...) keyed by id, in first-seen order.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::loader::LoaderState;
use crate::signal::AbortSignal;

/// A bearer token issued by the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// The bearer credential.
    pub access_token: String,
    /// Token id on the auth service.
    #[serde(default)]
    pub id: Option<String>,
    /// Expiry, if known.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// URL of the user the token belongs to.
    #[serde(default)]
    pub user_url: Option<String>,
}

impl Token {
    /// Creates a token with only the bearer credential.
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            id: None,
            expires_at: None,
            user_url: None,
        }
    }

    /// Returns true if the token has a known expiry in the past.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }

    /// Builds a token from an auth-service token resource.
    ///
    /// Returns `None` if the resource has no `access_token`.
    #[must_use]
    pub fn from_resource(resource: &serde_json::Value) -> Option<Self> {
        let access_token = resource.get("access_token")?.as_str()?.to_string();
        let id = resource.get("id").and_then(|id| match id {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        });
        let expires_at = resource
            .get("expires_at")
            .and_then(serde_json::Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));
        let user_url = resource
            .pointer("/_links/user/href")
            .and_then(serde_json::Value::as_str)
            .map(ToString::to_string);

        Some(Self {
            access_token,
            id,
            expires_at,
            user_url,
        })
    }
}

/// Color theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    /// Light theme.
    #[default]
    Light,
    /// Dark theme.
    Dark,
}

/// Feedback prompts the user already answered.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeedbackState {
    /// The pre-deploy survey was answered.
    #[serde(default)]
    pub pre_deploy_survey_answered: bool,
    /// Free-form feedback was given.
    #[serde(default)]
    pub freeform_feedback_given: bool,
}

/// Client-side UI state that survives restarts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UiState {
    /// Color theme.
    #[serde(default)]
    pub theme: Theme,
    /// Whether the navigation sidebar is collapsed.
    #[serde(default)]
    pub nav_collapsed: bool,
    /// Where to send the user after login.
    #[serde(default)]
    pub redirect_path: Option<String>,
    /// Feedback prompt state.
    #[serde(default)]
    pub feedback: FeedbackState,
}

/// Everything the store holds.
#[derive(Debug, Clone, Default)]
pub struct StoreState {
    /// Current access token.
    pub token: Option<Token>,
    /// Current elevated (step-up) token.
    pub elevated_token: Option<Token>,
    /// Loaders by id.
    pub loaders: HashMap<String, LoaderState>,
    /// Entity tables: resource type, then id.
    pub entities: HashMap<String, IndexMap<String, serde_json::Value>>,
    /// UI state.
    pub ui: UiState,
}

/// A state transition.
#[derive(Debug, Clone)]
pub enum Action {
    /// Store a new access token.
    SetToken(Token),
    /// Forget the access token so the next call re-authenticates.
    ResetToken,
    /// Store a new elevated token.
    SetElevatedToken(Token),
    /// Forget the elevated token.
    ResetElevatedToken,
    /// Mark a loader as in flight.
    LoaderStart {
        /// Loader id.
        id: String,
    },
    /// Mark a loader as succeeded.
    LoaderSuccess {
        /// Loader id.
        id: String,
        /// Metadata to attach.
        meta: serde_json::Value,
    },
    /// Mark a loader as failed.
    LoaderError {
        /// Loader id.
        id: String,
        /// Error message.
        message: String,
        /// Metadata to attach.
        meta: serde_json::Value,
    },
    /// Return a loader to idle.
    LoaderReset {
        /// Loader id.
        id: String,
    },
    /// Insert or shallow-merge entities of one resource type.
    UpsertEntities {
        /// Resource type (`app`, `database`, ...).
        kind: String,
        /// Entities; each needs an `id`.
        entities: Vec<serde_json::Value>,
    },
    /// Remove one entity.
    RemoveEntity {
        /// Resource type.
        kind: String,
        /// Entity id.
        id: String,
    },
    /// Change the color theme.
    SetTheme(Theme),
    /// Collapse or expand navigation.
    SetNavCollapsed(bool),
    /// Remember or clear the post-login redirect.
    SetRedirectPath(Option<String>),
    /// Replace feedback state.
    SetFeedback(FeedbackState),
    /// Clear everything and abort all in-flight calls.
    ResetStore,
}

impl Action {
    /// Short name for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SetToken(_) => "set_token",
            Self::ResetToken => "reset_token",
            Self::SetElevatedToken(_) => "set_elevated_token",
            Self::ResetElevatedToken => "reset_elevated_token",
            Self::LoaderStart { .. } => "loader_start",
            Self::LoaderSuccess { .. } => "loader_success",
            Self::LoaderError { .. } => "loader_error",
            Self::LoaderReset { .. } => "loader_reset",
            Self::UpsertEntities { .. } => "upsert_entities",
            Self::RemoveEntity { .. } => "remove_entity",
            Self::SetTheme(_) => "set_theme",
            Self::SetNavCollapsed(_) => "set_nav_collapsed",
            Self::SetRedirectPath(_) => "set_redirect_path",
            Self::SetFeedback(_) => "set_feedback",
            Self::ResetStore => "reset_store",
        }
    }
}

struct StoreInner {
    state: RwLock<StoreState>,
    signal: RwLock<AbortSignal>,
    generation: AtomicU64,
}

/// Shared, cloneable handle to the client store.
///
/// # Example
///
/// ```
/// use hermes_core::{Action, Store, Token};
///
/// let store = Store::new();
/// store.dispatch(Action::SetToken(Token::new("abc")));
/// assert_eq!(store.access_token().as_deref(), Some("abc"));
///
/// store.dispatch(Action::ResetToken);
/// assert!(store.access_token().is_none());
/// ```
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_state(StoreState::default())
    }

    /// Creates a store from existing state.
    #[must_use]
    pub fn with_state(state: StoreState) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                state: RwLock::new(state),
                signal: RwLock::new(AbortSignal::new()),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Applies an action.
    pub fn dispatch(&self, action: Action) {
        tracing::trace!(action = action.kind(), "dispatch");

        if matches!(action, Action::ResetStore) {
            self.reset();
            return;
        }

        let mut state = self.inner.state.write();
        reduce(&mut state, action);
    }

    /// Reads from the state.
    pub fn select<R>(&self, f: impl FnOnce(&StoreState) -> R) -> R {
        f(&self.inner.state.read())
    }

    /// Returns the current access token credential.
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.select(|s| s.token.as_ref().map(|t| t.access_token.clone()))
    }

    /// Returns the current elevated token credential.
    #[must_use]
    pub fn elevated_token(&self) -> Option<String> {
        self.select(|s| s.elevated_token.as_ref().map(|t| t.access_token.clone()))
    }

    /// Returns a loader, idle if it never ran.
    #[must_use]
    pub fn loader(&self, id: &str) -> LoaderState {
        self.select(|s| {
            s.loaders
                .get(id)
                .cloned()
                .unwrap_or_else(|| LoaderState::idle(id))
        })
    }

    /// Returns one entity.
    #[must_use]
    pub fn entity(&self, kind: &str, id: &str) -> Option<serde_json::Value> {
        self.select(|s| s.entities.get(kind).and_then(|t| t.get(id)).cloned())
    }

    /// Returns every entity of one type, in first-seen order.
    #[must_use]
    pub fn entities(&self, kind: &str) -> Vec<serde_json::Value> {
        self.select(|s| {
            s.entities
                .get(kind)
                .map(|t| t.values().cloned().collect())
                .unwrap_or_default()
        })
    }

    /// Returns the UI state.
    #[must_use]
    pub fn ui(&self) -> UiState {
        self.select(|s| s.ui.clone())
    }

    /// Returns the abort signal that in-flight calls race against.
    #[must_use]
    pub fn abort_signal(&self) -> AbortSignal {
        self.inner.signal.read().clone()
    }

    /// Fires the current abort signal and installs a fresh one.
    ///
    /// Calls started afterwards are unaffected.
    pub fn abort_in_flight(&self) {
        let mut signal = self.inner.signal.write();
        signal.abort();
        *signal = AbortSignal::new();
    }

    /// Returns the reset generation. It changes on every [`Action::ResetStore`].
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        self.abort_in_flight();
        *self.inner.state.write() = StoreState::default();
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("generation", &self.generation())
            .finish_non_exhaustive()
    }
}

fn entity_id(entity: &serde_json::Value) -> Option<String> {
    match entity.get("id")? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn reduce(state: &mut StoreState, action: Action) {
    let now = Utc::now();
    match action {
        Action::SetToken(token) => state.token = Some(token),
        Action::ResetToken => state.token = None,
        Action::SetElevatedToken(token) => state.elevated_token = Some(token),
        Action::ResetElevatedToken => state.elevated_token = None,
        Action::LoaderStart { id } => {
            state
                .loaders
                .entry(id.clone())
                .or_insert_with(|| LoaderState::idle(id))
                .start(now);
        }
        Action::LoaderSuccess { id, meta } => {
            state
                .loaders
                .entry(id.clone())
                .or_insert_with(|| LoaderState::idle(id))
                .succeed(now, meta);
        }
        Action::LoaderError { id, message, meta } => {
            state
                .loaders
                .entry(id.clone())
                .or_insert_with(|| LoaderState::idle(id))
                .fail(message, meta);
        }
        Action::LoaderReset { id } => {
            if let Some(loader) = state.loaders.get_mut(&id) {
                loader.reset();
            }
        }
        Action::UpsertEntities { kind, entities } => {
            let table = state.entities.entry(kind).or_default();
            for entity in entities {
                let Some(id) = entity_id(&entity) else {
                    continue;
                };
                let merged = match (table.get_mut(&id), &entity) {
                    (
                        Some(serde_json::Value::Object(existing)),
                        serde_json::Value::Object(incoming),
                    ) => {
                        existing.extend(incoming.clone());
                        true
                    }
                    _ => false,
                };
                if !merged {
                    table.insert(id, entity);
                }
            }
        }
        Action::RemoveEntity { kind, id } => {
            if let Some(table) = state.entities.get_mut(&kind) {
                table.shift_remove(&id);
            }
        }
        Action::SetTheme(theme) => state.ui.theme = theme,
        Action::SetNavCollapsed(collapsed) => state.ui.nav_collapsed = collapsed,
        Action::SetRedirectPath(path) => state.ui.redirect_path = path,
        Action::SetFeedback(feedback) => state.ui.feedback = feedback,
        // handled by Store::reset
        Action::ResetStore => {}
    }
}

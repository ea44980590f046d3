//! Per-operation loader state.
//!
//! A loader tracks one operation (a single call, or a composite such as a
//! paginated fetch) by id. Consumers render banners and spinners from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoaderStatus {
    /// Never run, or reset.
    #[default]
    Idle,
    /// In flight.
    Loading,
    /// Last run succeeded.
    Success,
    /// Last run failed.
    Error,
}

/// The state of one loader.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LoaderState {
    /// Loader id (usually the request key).
    pub id: String,
    /// Current status.
    pub status: LoaderStatus,
    /// Error message for the last failed run, empty otherwise.
    pub message: String,
    /// When the last run started.
    pub last_run: Option<DateTime<Utc>>,
    /// When the last run succeeded.
    pub last_success: Option<DateTime<Utc>>,
    /// Free-form metadata recorded by the operation.
    #[serde(default)]
    pub meta: serde_json::Value,
}

impl LoaderState {
    /// Creates an idle loader.
    #[must_use]
    pub fn idle(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Returns true while in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.status == LoaderStatus::Loading
    }

    /// Returns true if the last run failed.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.status == LoaderStatus::Error
    }

    /// Returns true if the last run succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == LoaderStatus::Success
    }

    /// Returns true if the loader never ran or was reset.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.status == LoaderStatus::Idle
    }

    /// Returns true on the first load only: loading and never succeeded.
    #[must_use]
    pub fn is_initial_loading(&self) -> bool {
        self.is_loading() && self.last_success.is_none()
    }

    pub(crate) fn start(&mut self, now: DateTime<Utc>) {
        self.status = LoaderStatus::Loading;
        self.message.clear();
        self.last_run = Some(now);
    }

    pub(crate) fn succeed(&mut self, now: DateTime<Utc>, meta: serde_json::Value) {
        self.status = LoaderStatus::Success;
        self.message.clear();
        self.last_success = Some(now);
        self.meta = meta;
    }

    pub(crate) fn fail(&mut self, message: String, meta: serde_json::Value) {
        self.status = LoaderStatus::Error;
        self.message = message;
        self.meta = meta;
    }

    pub(crate) fn reset(&mut self) {
        self.status = LoaderStatus::Idle;
        self.message.clear();
    }
}

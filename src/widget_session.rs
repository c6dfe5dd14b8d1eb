//! Per-visitor widget sessions.
//!
//! Each landing page view gets its own [`ChatWidgetController`], kept in
//! memory and addressed by UUID. Sessions are never persisted; they live
//! until the visitor deletes them or they sit idle past the timeout.
//!
//! # Example
//!
//! ```rust
//! use study_chat_widget::catalog::SUBJECTS;
//! use study_chat_widget::controller::{ChatWidgetController, WidgetSettings};
//! use study_chat_widget::landing::LandingPage;
//! use study_chat_widget::random::ThreadRandom;
//! use study_chat_widget::widget_session::WidgetSessionStore;
//!
//! let store = WidgetSessionStore::new();
//! let page = LandingPage::new(&SUBJECTS).session("demo").build();
//! let widget =
//!     ChatWidgetController::mount(page, WidgetSettings::default(), Box::new(ThreadRandom))
//!         .unwrap();
//! let session = store.insert("demo", widget);
//!
//! session.with_controller(|w| {
//!     w.type_text("Olá");
//!     w.click_send();
//! });
//! assert_eq!(session.with_controller(|w| w.transcript().len()), 1);
//! assert_eq!(store.len(), 1);
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::controller::ChatWidgetController;

/// Default idle timeout (30 minutes).
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// A single visitor's widget.
#[derive(Debug, Clone)]
pub struct WidgetSession {
    inner: Arc<WidgetSessionInner>,
}

#[derive(Debug)]
struct WidgetSessionInner {
    id: String,
    widget: Mutex<ClockedWidget>,
    created_at: DateTime<Utc>,
    last_activity: RwLock<DateTime<Utc>>,
}

/// Controller plus the wall-clock instant its virtual clock last caught up to.
#[derive(Debug)]
struct ClockedWidget {
    controller: ChatWidgetController,
    last_tick: Instant,
}

impl WidgetSession {
    fn new(id: String, controller: ChatWidgetController) -> Self {
        let now = Utc::now();
        Self {
            inner: Arc::new(WidgetSessionInner {
                id,
                widget: Mutex::new(ClockedWidget {
                    controller,
                    last_tick: Instant::now(),
                }),
                created_at: now,
                last_activity: RwLock::new(now),
            }),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Run `f` on the controller.
    ///
    /// The controller's clock is first advanced by the wall time elapsed
    /// since the previous call, so replies and reveals that came due in
    /// between are applied before `f` sees the page.
    pub fn with_controller<R>(&self, f: impl FnOnce(&mut ChatWidgetController) -> R) -> R {
        let mut guard = self
            .inner
            .widget
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        let elapsed = now.duration_since(guard.last_tick);
        guard.last_tick = now;
        guard.controller.advance(elapsed);

        let result = f(&mut guard.controller);
        drop(guard);
        self.touch();
        result
    }

    fn touch(&self) {
        let mut guard = self
            .inner
            .last_activity
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = Utc::now();
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    #[must_use]
    pub fn last_activity(&self) -> DateTime<Utc> {
        *self
            .inner
            .last_activity
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_with_timeout(DEFAULT_SESSION_TIMEOUT)
    }

    #[must_use]
    pub fn is_expired_with_timeout(&self, timeout: Duration) -> bool {
        // Negative spans (clock skew) count as fresh.
        (Utc::now() - self.last_activity())
            .to_std()
            .is_ok_and(|idle| idle > timeout)
    }
}

/// Thread-safe store for widget sessions.
#[derive(Debug, Clone)]
pub struct WidgetSessionStore {
    inner: Arc<WidgetSessionStoreInner>,
}

#[derive(Debug)]
struct WidgetSessionStoreInner {
    sessions: RwLock<HashMap<String, WidgetSession>>,
}

impl Default for WidgetSessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl WidgetSessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(WidgetSessionStoreInner {
                sessions: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Register a mounted controller under `id`, replacing any previous one.
    pub fn insert(&self, id: impl Into<String>, controller: ChatWidgetController) -> WidgetSession {
        let id = id.into();
        let session = WidgetSession::new(id.clone(), controller);
        self.write().insert(id, session.clone());
        session
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<WidgetSession> {
        self.read().get(id).cloned()
    }

    pub fn remove(&self, id: &str) -> Option<WidgetSession> {
        self.write().remove(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn list_ids(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Remove sessions idle longer than the default timeout.
    pub fn cleanup_expired(&self) -> usize {
        self.cleanup_expired_with_timeout(DEFAULT_SESSION_TIMEOUT)
    }

    /// Remove sessions idle longer than `timeout`. Returns how many went.
    pub fn cleanup_expired_with_timeout(&self, timeout: Duration) -> usize {
        let mut guard = self.write();
        let before = guard.len();
        guard.retain(|_, session| !session.is_expired_with_timeout(timeout));
        before - guard.len()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, WidgetSession>> {
        self.inner
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, WidgetSession>> {
        self.inner
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SUBJECTS;
    use crate::controller::WidgetSettings;
    use crate::landing::LandingPage;
    use crate::random::ScriptedRandom;

    fn controller() -> ChatWidgetController {
        ChatWidgetController::mount(
            LandingPage::new(&SUBJECTS).build(),
            WidgetSettings::default(),
            Box::new(ScriptedRandom::new([0.0])),
        )
        .unwrap()
    }

    #[test]
    fn test_store_lifecycle() {
        let store = WidgetSessionStore::new();
        assert!(store.is_empty());

        let session = store.insert("a", controller());
        store.insert("b", controller());
        assert_eq!(store.len(), 2);

        let fetched = store.get("a").unwrap();
        assert_eq!(fetched.id(), session.id());

        let mut ids = store.list_ids();
        ids.sort();
        assert_eq!(ids, vec!["a", "b"]);

        assert!(store.remove("a").is_some());
        assert!(store.get("a").is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_clones_share_controller() {
        let store = WidgetSessionStore::new();
        let session = store.insert("a", controller());

        session.with_controller(|w| {
            w.type_text("oi");
            w.click_send();
        });
        let len = store
            .get("a")
            .unwrap()
            .with_controller(|w| w.transcript().len());
        assert_eq!(len, 1);
    }

    #[test]
    fn test_cleanup_expired() {
        let store = WidgetSessionStore::new();
        store.insert("a", controller());

        assert_eq!(store.cleanup_expired(), 0);
        assert_eq!(store.len(), 1);

        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(store.cleanup_expired_with_timeout(Duration::from_millis(1)), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_activity_is_tracked() {
        let store = WidgetSessionStore::new();
        let session = store.insert("a", controller());
        let before = session.last_activity();
        std::thread::sleep(Duration::from_millis(2));
        session.with_controller(|_| ());
        assert!(session.last_activity() > before);
        assert!(session.created_at() <= before);
    }
}

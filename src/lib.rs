//! Study platform chat widget
//!
//! A headless rendition of the ENEM study page's interactive bits: a
//! simulated "ask the AI" chat that answers with canned replies after a
//! randomized delay, and subject cards that fade in as they scroll into view.
//!
//! # Architecture
//!
//! - **Page model**: an element arena with layout, inline style and a small
//!   CSS selector engine ([`dom`], [`selector`])
//! - **Widget**: message exchange and scroll reveal wired through an event
//!   bus and a virtual-clock timer queue ([`chat`], [`reveal`], [`controller`])
//! - **Server**: Axum + HTMX; each visitor drives their own widget session
//!   ([`server`], [`widget_session`])
//!
//! # Modules
//!
//! - [`landing`]: landing page markup built from the subject [`catalog`]
//! - [`events`], [`timer`], [`random`]: injectable plumbing for the controller
//! - [`config`]: layered configuration (defaults, file, environment, CLI)

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::float_cmp)]

pub mod catalog;
pub mod chat;
pub mod config;
pub mod controller;
pub mod dom;
pub mod error;
pub mod events;
pub mod landing;
pub mod random;
pub mod reveal;
pub mod selector;
pub mod server;
pub mod telemetry;
pub mod timer;
pub mod widget_session;

use std::sync::Arc;

use uuid::Uuid;

use crate::catalog::SUBJECTS;
use crate::config::AppConfig;
use crate::controller::{ChatWidgetController, WidgetSettings};
use crate::error::Result;
use crate::landing::LandingPage;
use crate::widget_session::{WidgetSession, WidgetSessionStore};

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Live widget sessions, one per page view.
    pub sessions: WidgetSessionStore,
    /// Validated widget behavior shared by every session.
    pub settings: Arc<WidgetSettings>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Validate the widget sections of `config` and set up an empty store.
    pub fn new(config: AppConfig) -> Result<Self> {
        let settings = config.widget_settings()?;
        Ok(Self {
            sessions: WidgetSessionStore::new(),
            settings: Arc::new(settings),
            config: Arc::new(config),
        })
    }

    /// Build a landing page wired to a fresh session id and mount a widget on it.
    pub fn open_session(&self) -> Result<WidgetSession> {
        let id = Uuid::new_v4().to_string();
        let page = LandingPage::new(&SUBJECTS)
            .viewport_height(self.config.page.viewport_height)
            .session(id.as_str())
            .build();
        let controller = ChatWidgetController::mount(
            page,
            WidgetSettings::clone(&self.settings),
            random::from_seed(self.config.server.seed),
        )?;
        Ok(self.sessions.insert(id, controller))
    }
}

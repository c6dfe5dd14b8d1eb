//! Landing page markup.
//!
//! Builds the [`Page`] the widget mounts on: a hero with catalog stats, one
//! `.subject-card` per subject laid out in a three-column grid, and the `#ai`
//! chat section. When a session id is attached, the polling and form
//! elements carry the HTMX attributes that drive that session on the server.

use crate::catalog::{self, Subject};
use crate::dom::{ElementId, Layout, Page};

pub const CHAT_LOG_SELECTOR: &str = "#chat-log";
pub const SUBJECT_GRID_SELECTOR: &str = "#subject-grid";

pub const DEFAULT_VIEWPORT_HEIGHT: f64 = 800.0;

/// Swapping `#chat-log` replaces the message list; keep it pinned to the
/// newest message. htmx splits swap modifiers on whitespace, so the scroll
/// target must be a single compound selector.
const LOG_SWAP: &str = "outerHTML scroll:.message-list:bottom";

const HEADER_HEIGHT: f64 = 64.0;
const HERO_HEIGHT: f64 = 416.0;
const SECTION_HEADING: f64 = 96.0;
const SECTION_GAP: f64 = 64.0;
const CARD_HEIGHT: f64 = 200.0;
const CARD_GAP: f64 = 20.0;
const COLUMNS: usize = 3;
const CHAT_HEADING: f64 = 64.0;
const MESSAGE_LIST_HEIGHT: f64 = 320.0;
const ROW_HEIGHT: f64 = 64.0;

/// Landing page builder.
#[derive(Debug, Clone)]
pub struct LandingPage<'a> {
    subjects: &'a [Subject],
    viewport_height: f64,
    session_id: Option<String>,
}

impl<'a> LandingPage<'a> {
    #[must_use]
    pub fn new(subjects: &'a [Subject]) -> Self {
        Self {
            subjects,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            session_id: None,
        }
    }

    #[must_use]
    pub fn viewport_height(mut self, height: f64) -> Self {
        self.viewport_height = height;
        self
    }

    /// Wire the page's HTMX endpoints to a widget session.
    #[must_use]
    pub fn session(mut self, id: impl Into<String>) -> Self {
        self.session_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn build(&self) -> Page {
        let mut page = Page::new(self.viewport_height);
        let body = page.root();

        let header = child(&mut page, body, "header", "site-header");
        page.set_layout(header, Layout::new(0.0, HEADER_HEIGHT));
        let brand = child(&mut page, header, "a", "brand");
        page.set_attribute(brand, "href", "/");
        page.set_text(brand, "ENEM Estudos");

        let stats = catalog::stats(self.subjects);
        let hero = child(&mut page, body, "section", "hero");
        page.set_attribute(hero, "id", "hero");
        page.set_layout(hero, Layout::new(HEADER_HEIGHT, HERO_HEIGHT));
        let title = child(&mut page, hero, "h1", "");
        page.set_text(title, "Prepare-se para o ENEM");
        let summary = child(&mut page, hero, "p", "hero-stats");
        page.set_text(
            summary,
            format!(
                "{} disciplinas em {} áreas do conhecimento",
                stats.subjects, stats.areas
            ),
        );

        let grid_bottom = self.subjects_section(&mut page, HEADER_HEIGHT + HERO_HEIGHT);
        self.chat_section(&mut page, grid_bottom + SECTION_GAP);
        page
    }

    fn subjects_section(&self, page: &mut Page, top: f64) -> f64 {
        let body = page.root();
        let section = child(page, body, "section", "subjects");
        page.set_attribute(section, "id", "subjects");
        let heading = child(page, section, "h2", "");
        page.set_text(heading, "Disciplinas");

        let grid_top = top + SECTION_HEADING;
        let rows = self.subjects.len().div_ceil(COLUMNS);
        let grid_height = if rows == 0 {
            0.0
        } else {
            px(rows) * (CARD_HEIGHT + CARD_GAP) - CARD_GAP
        };
        page.set_layout(section, Layout::new(top, SECTION_HEADING + grid_height));

        let grid = child(page, section, "div", "grid");
        page.set_attribute(grid, "id", "subject-grid");
        page.set_layout(grid, Layout::new(grid_top, grid_height));
        if let Some(id) = &self.session_id {
            page.set_attribute(grid, "hx-post", &format!("/api/widget/{id}/scroll"));
            page.set_attribute(grid, "hx-trigger", "scroll from:window throttle:150ms, every 1s");
            page.set_attribute(
                grid,
                "hx-vals",
                "js:{scroll_y: window.scrollY, viewport_height: window.innerHeight}",
            );
            page.set_attribute(grid, "hx-swap", "outerHTML");
        }

        for (index, subject) in self.subjects.iter().enumerate() {
            let row = index / COLUMNS;
            let card = child(
                page,
                grid,
                "div",
                &format!("subject-card area-{}", subject.area.slug()),
            );
            page.set_layout(
                card,
                Layout::new(grid_top + px(row) * (CARD_HEIGHT + CARD_GAP), CARD_HEIGHT),
            );

            let badge = child(page, card, "span", "area-badge");
            page.set_text(badge, subject.area.label());
            let name = child(page, card, "h3", "");
            page.set_text(name, subject.name);
            let description = child(page, card, "p", "");
            page.set_text(description, subject.description);
        }

        grid_top + grid_height
    }

    fn chat_section(&self, page: &mut Page, top: f64) {
        let body = page.root();
        let section = child(page, body, "section", "ai-section");
        page.set_attribute(section, "id", "ai");
        page.set_layout(
            section,
            Layout::new(top, CHAT_HEADING + MESSAGE_LIST_HEIGHT + 2.0 * ROW_HEIGHT),
        );
        let heading = child(page, section, "h2", "");
        page.set_text(heading, "Tire suas dúvidas com a IA");

        let panel_top = top + CHAT_HEADING;
        let panel = child(page, section, "div", "ai-chat");
        page.set_attribute(panel, "id", "chat-panel");
        page.set_layout(
            panel,
            Layout::new(panel_top, MESSAGE_LIST_HEIGHT + 2.0 * ROW_HEIGHT),
        );

        let log = child(page, panel, "div", "");
        page.set_attribute(log, "id", "chat-log");
        page.set_layout(log, Layout::new(panel_top, MESSAGE_LIST_HEIGHT + ROW_HEIGHT));

        let list = child(page, log, "div", "space-y-4 message-list");
        page.set_layout(list, Layout::new(panel_top, MESSAGE_LIST_HEIGHT));

        let typing_row = child(page, log, "div", "flex justify-start typing-row");
        page.set_layout(
            typing_row,
            Layout::new(panel_top + MESSAGE_LIST_HEIGHT, ROW_HEIGHT),
        );
        let typing_bubble = child(page, typing_row, "div", "message ai-message p-3");
        let indicator = child(page, typing_bubble, "div", "typing-indicator");
        for _ in 0..3 {
            child(page, indicator, "span", "dot");
        }

        let form = child(page, panel, "form", "flex gap-2");
        page.set_attribute(form, "id", "chat-form");
        page.set_layout(
            form,
            Layout::new(panel_top + MESSAGE_LIST_HEIGHT + ROW_HEIGHT, ROW_HEIGHT),
        );
        let input = child(page, form, "input", "chat-input");
        page.set_attribute(input, "type", "text");
        page.set_attribute(input, "name", "message");
        page.set_attribute(input, "placeholder", "Digite sua dúvida...");
        page.set_attribute(input, "autocomplete", "off");
        let button = child(page, form, "button", "send-button");
        page.set_attribute(button, "type", "submit");
        page.set_text(button, "Enviar");

        if let Some(id) = &self.session_id {
            page.set_attribute(log, "hx-get", &format!("/api/widget/{id}/log"));
            page.set_attribute(log, "hx-trigger", "every 500ms");
            page.set_attribute(log, "hx-swap", LOG_SWAP);

            page.set_attribute(form, "hx-post", &format!("/api/widget/{id}/send"));
            page.set_attribute(form, "hx-target", CHAT_LOG_SELECTOR);
            page.set_attribute(form, "hx-swap", LOG_SWAP);
            page.set_attribute(form, "hx-on::after-request", "this.reset()");
        }
    }
}

fn child(page: &mut Page, parent: ElementId, tag: &str, class: &str) -> ElementId {
    let id = page.create_element(tag);
    if !class.is_empty() {
        page.set_class(id, class);
    }
    page.append_child(parent, id);
    id
}

#[allow(clippy::cast_precision_loss)]
fn px(n: usize) -> f64 {
    n as f64
}

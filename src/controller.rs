//! The chat widget controller.
//!
//! [`ChatWidgetController`] owns a [`Page`] and wires the message exchange
//! and the card reveal to it. Mounting resolves every element up front, so a
//! page missing part of the contract is rejected with a [`WidgetError`]
//! instead of failing inside a handler later.
//!
//! Time is virtual: timers fire only when [`ChatWidgetController::advance`]
//! moves the clock. The server advances it by wall-clock time on each
//! request; tests advance it explicitly.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use study_chat_widget::catalog::SUBJECTS;
//! use study_chat_widget::controller::{ChatWidgetController, WidgetSettings};
//! use study_chat_widget::landing::LandingPage;
//! use study_chat_widget::random::ScriptedRandom;
//!
//! let page = LandingPage::new(&SUBJECTS).build();
//! let mut widget = ChatWidgetController::mount(
//!     page,
//!     WidgetSettings::default(),
//!     Box::new(ScriptedRandom::new([0.0])),
//! )
//! .unwrap();
//!
//! widget.type_text("Hello");
//! widget.press_key("Enter");
//! assert!(widget.is_typing());
//!
//! widget.advance(Duration::from_millis(1500));
//! assert_eq!(widget.transcript().len(), 2);
//! assert!(!widget.is_typing());
//! ```

use std::time::Duration;

use tracing::{debug, info};

use crate::chat::{ChatElements, Message, MessageExchange, ReplyPolicy};
use crate::dom::Page;
use crate::error::Result;
use crate::events::{Event, EventBus, EventKind, EventTarget, SubscriptionId};
use crate::random::RandomSource;
use crate::reveal::{CardState, RevealPolicy, ScrollReveal};
use crate::selector::Selector;
use crate::timer::TimerQueue;

/// Behavior knobs for one widget instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WidgetSettings {
    pub reply: ReplyPolicy,
    pub reveal: RevealPolicy,
}

/// Handlers the controller subscribes on its event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Handler {
    Send,
    SendOnEnter,
    RevealPass,
}

/// Work scheduled on the virtual clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Task {
    DeliverReply,
    RevealCard(usize),
}

#[derive(Debug)]
pub struct ChatWidgetController {
    page: Page,
    chat: MessageExchange,
    reveal: ScrollReveal,
    events: EventBus<Handler>,
    subscriptions: Vec<SubscriptionId>,
    timers: TimerQueue<Task>,
    rng: Box<dyn RandomSource>,
}

impl ChatWidgetController {
    /// Attach the widget to `page`.
    ///
    /// Hides the typing indicator, puts every card in its hidden state,
    /// subscribes the send and scroll handlers, then runs one reveal pass so
    /// cards already in view are scheduled right away.
    pub fn mount(
        mut page: Page,
        settings: WidgetSettings,
        rng: Box<dyn RandomSource>,
    ) -> Result<Self> {
        let elements = ChatElements::locate(&page)?;
        let reveal = ScrollReveal::locate(&page, settings.reveal)?;
        let chat = MessageExchange::new(elements, settings.reply);

        chat.hide_typing(&mut page);
        reveal.prepare(&mut page);

        let mut events = EventBus::new();
        let subscriptions = vec![
            events.subscribe(
                EventKind::Click,
                EventTarget::Element(elements.send_button),
                Handler::Send,
            ),
            events.subscribe(
                EventKind::KeyPress,
                EventTarget::Element(elements.input),
                Handler::SendOnEnter,
            ),
            events.subscribe(EventKind::Scroll, EventTarget::Window, Handler::RevealPass),
        ];

        info!(
            name: "widget.mounted",
            cards = reveal.cards().len(),
            viewport_height = page.viewport().height,
            "Chat widget mounted"
        );

        let mut controller = Self {
            page,
            chat,
            reveal,
            events,
            subscriptions,
            timers: TimerQueue::new(),
            rng,
        };
        controller.animate_cards();
        Ok(controller)
    }

    /// Drop every subscription. Later events are ignored; pending timers
    /// still fire when the clock advances.
    pub fn unmount(&mut self) {
        for id in self.subscriptions.drain(..) {
            self.events.unsubscribe(id);
        }
        debug!(name: "widget.unmounted", "Chat widget handlers removed");
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    /// Deliver an event to the subscribed handlers. Returns how many ran.
    pub fn dispatch(&mut self, event: &Event) -> usize {
        let handlers = self.events.dispatch(event);
        for &handler in &handlers {
            match handler {
                Handler::Send => {
                    self.send_message();
                }
                Handler::SendOnEnter => {
                    if event.key.as_deref() == Some("Enter") {
                        self.send_message();
                    }
                }
                Handler::RevealPass => {
                    self.animate_cards();
                }
            }
        }
        handlers.len()
    }

    /// Send whatever is in the input. Returns `true` if a reply was queued.
    ///
    /// Repeated sends are not debounced; each queues its own reply.
    pub fn send_message(&mut self) -> bool {
        match self.chat.send(&mut self.page, self.rng.as_mut()) {
            Some(delay) => {
                self.timers.schedule(delay, Task::DeliverReply);
                true
            }
            None => false,
        }
    }

    /// Run one reveal pass. Returns how many reveals were scheduled.
    pub fn animate_cards(&mut self) -> usize {
        let due = self.reveal.reveal_pass(&self.page);
        for &(index, delay) in &due {
            self.timers.schedule(delay, Task::RevealCard(index));
        }
        due.len()
    }

    /// Move the clock forward by `by`, firing every timer that falls due.
    /// Returns the number of timers fired.
    pub fn advance(&mut self, by: Duration) -> usize {
        let until = self.timers.now().saturating_add(by);
        let mut fired = 0;
        while let Some((_, task)) = self.timers.pop_due(until) {
            self.run(task);
            fired += 1;
        }
        self.timers.settle(until);
        fired
    }

    /// Advance until no timers are pending.
    pub fn run_until_idle(&mut self) -> usize {
        let mut fired = 0;
        while let Some(deadline) = self.timers.next_deadline() {
            fired += self.advance(deadline.saturating_sub(self.timers.now()));
        }
        fired
    }

    fn run(&mut self, task: Task) {
        match task {
            Task::DeliverReply => {
                self.chat.deliver_reply(&mut self.page, self.rng.as_mut());
            }
            Task::RevealCard(index) => {
                self.reveal.reveal(&mut self.page, index);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // User-agent stand-ins
    // ─────────────────────────────────────────────────────────────────────

    /// Replace the input's value.
    pub fn type_text(&mut self, text: &str) {
        self.page.set_value(self.chat.elements().input, text);
    }

    pub fn press_key(&mut self, key: &str) -> usize {
        self.dispatch(&Event::key_press(self.chat.elements().input, key))
    }

    pub fn click_send(&mut self) -> usize {
        self.dispatch(&Event::click(self.chat.elements().send_button))
    }

    /// Scroll the window and fire the scroll event.
    pub fn scroll_to(&mut self, y: f64) -> usize {
        self.page.scroll_window_to(y);
        self.dispatch(&Event::scroll())
    }

    /// Apply window metrics reported by the browser.
    ///
    /// The scroll event fires only when the viewport actually changed, so a
    /// client re-reporting the same position does not run a reveal pass.
    /// Returns how many handlers ran.
    pub fn sync_window(&mut self, scroll_y: f64, viewport_height: Option<f64>) -> usize {
        let before = self.page.viewport();
        if let Some(height) = viewport_height {
            self.resize_viewport(height);
        }
        self.page.scroll_window_to(scroll_y);
        if self.page.viewport() == before {
            return 0;
        }
        self.dispatch(&Event::scroll())
    }

    /// Change the viewport height. Does not fire any event.
    pub fn resize_viewport(&mut self, height: f64) {
        self.page.set_viewport_height(height);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────

    #[must_use]
    pub fn page(&self) -> &Page {
        &self.page
    }

    #[must_use]
    pub fn elements(&self) -> ChatElements {
        self.chat.elements()
    }

    #[must_use]
    pub fn transcript(&self) -> &[Message] {
        self.chat.transcript()
    }

    #[must_use]
    pub fn is_typing(&self) -> bool {
        self.chat.is_typing(&self.page)
    }

    #[must_use]
    pub fn card_states(&self) -> Vec<CardState> {
        self.reveal.states(&self.page)
    }

    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.timers.now()
    }

    /// Outer HTML of the first element matching `selector`.
    pub fn render_fragment(&self, selector: &str) -> Result<Option<String>> {
        let selector = Selector::parse(selector)?;
        Ok(self
            .page
            .query_selector(&selector)
            .map(|id| self.page.render(id)))
    }
}

//! Message exchange simulator.
//!
//! Sending appends the user's bubble, clears the input, shows the typing
//! indicator and hands back the delay after which the caller should run
//! [`MessageExchange::deliver_reply`]. Nothing here talks to a model: the
//! reply is one of a fixed set of canned responses.

use std::ops::Range;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dom::{Display, ElementId, Layout, Page};
use crate::error::{Result, WidgetError};
use crate::random::RandomSource;
use crate::selector::Selector;

pub const INPUT_SELECTOR: &str = r#"#ai input[type="text"]"#;
pub const SEND_BUTTON_SELECTOR: &str = "#ai button";
pub const MESSAGE_LIST_SELECTOR: &str = ".ai-chat .space-y-4";
pub const TYPING_INDICATOR_SELECTOR: &str = ".typing-indicator";

/// Levels between `.typing-indicator` and the row that is shown and hidden.
const TYPING_ROW_DEPTH: usize = 2;

/// Layout height given to each appended bubble row.
pub const BUBBLE_HEIGHT: f64 = 64.0;

pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1500);
pub const DEFAULT_DELAY_JITTER: Duration = Duration::from_millis(1000);

pub const DEFAULT_RESPONSES: [&str; 4] = [
    "Entendi sua dúvida! Vou explicar isso de forma clara e detalhada.",
    "Ótima pergunta! Vamos abordar esse tópico passo a passo.",
    "Posso te ajudar com isso. Aqui está a explicação que você precisa:",
    "Esse é um conceito importante. Deixe-me esclarecer para você.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    fn row_class(self) -> &'static str {
        match self {
            Self::User => "flex justify-end",
            Self::Assistant => "flex justify-start",
        }
    }

    fn bubble_class(self) -> &'static str {
        match self {
            Self::User => "message user-message p-3",
            Self::Assistant => "message ai-message p-3",
        }
    }
}

/// One rendered chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub sender: Sender,
}

/// Reply latency and the pool of canned responses.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplyPolicy {
    base_delay: Duration,
    jitter: Duration,
    responses: Vec<String>,
}

impl Default for ReplyPolicy {
    fn default() -> Self {
        Self {
            base_delay: DEFAULT_BASE_DELAY,
            jitter: DEFAULT_DELAY_JITTER,
            responses: DEFAULT_RESPONSES.iter().map(ToString::to_string).collect(),
        }
    }
}

impl ReplyPolicy {
    pub fn new(base_delay: Duration, jitter: Duration, responses: Vec<String>) -> Result<Self> {
        if responses.is_empty() {
            return Err(WidgetError::NoResponses);
        }
        Ok(Self {
            base_delay,
            jitter,
            responses,
        })
    }

    /// Delays are drawn from `base..base + jitter`.
    #[must_use]
    pub fn delay_range(&self) -> Range<Duration> {
        self.base_delay..self.base_delay + self.jitter
    }

    pub fn delay(&self, rng: &mut dyn RandomSource) -> Duration {
        // Floor in whole nanoseconds so a draw just below 1.0 stays below the
        // upper bound instead of rounding onto it.
        #[allow(
            clippy::cast_precision_loss,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss
        )]
        let jitter = Duration::from_nanos(
            (self.jitter.as_nanos() as f64 * rng.next_unit()).floor() as u64,
        );
        self.base_delay + jitter.min(self.jitter.saturating_sub(Duration::from_nanos(1)))
    }

    pub fn pick(&self, rng: &mut dyn RandomSource) -> &str {
        &self.responses[rng.pick_index(self.responses.len())]
    }

    #[must_use]
    pub fn responses(&self) -> &[String] {
        &self.responses
    }
}

/// References to the chat elements, resolved once at mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatElements {
    pub input: ElementId,
    pub send_button: ElementId,
    pub message_list: ElementId,
    /// Row wrapping the typing indicator; this is what gets shown and hidden.
    pub typing_row: ElementId,
}

impl ChatElements {
    pub fn locate(page: &Page) -> Result<Self> {
        let input = find(page, "chat input", INPUT_SELECTOR)?;
        let send_button = find(page, "send button", SEND_BUTTON_SELECTOR)?;
        let message_list = find(page, "message list", MESSAGE_LIST_SELECTOR)?;
        let indicator = find(page, "typing indicator", TYPING_INDICATOR_SELECTOR)?;
        let typing_row = page.ancestor(indicator, TYPING_ROW_DEPTH).ok_or_else(|| {
            WidgetError::MissingAncestor {
                selector: TYPING_INDICATOR_SELECTOR.to_string(),
                levels: TYPING_ROW_DEPTH,
            }
        })?;

        Ok(Self {
            input,
            send_button,
            message_list,
            typing_row,
        })
    }
}

fn find(page: &Page, role: &'static str, selector: &str) -> Result<ElementId> {
    let parsed = Selector::parse(selector)?;
    page.query_selector(&parsed)
        .ok_or_else(|| WidgetError::MissingElement {
            role,
            selector: selector.to_string(),
        })
}

/// Chat state bound to one page.
#[derive(Debug, Clone)]
pub struct MessageExchange {
    elements: ChatElements,
    policy: ReplyPolicy,
    transcript: Vec<Message>,
}

impl MessageExchange {
    #[must_use]
    pub fn new(elements: ChatElements, policy: ReplyPolicy) -> Self {
        Self {
            elements,
            policy,
            transcript: Vec::new(),
        }
    }

    #[must_use]
    pub fn elements(&self) -> ChatElements {
        self.elements
    }

    /// Messages in the order they were rendered.
    #[must_use]
    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    #[must_use]
    pub fn is_typing(&self, page: &Page) -> bool {
        page[self.elements.typing_row].style().display != Some(Display::None)
    }

    pub fn hide_typing(&self, page: &mut Page) {
        page[self.elements.typing_row].style_mut().display = Some(Display::None);
    }

    fn show_typing(&self, page: &mut Page) {
        page[self.elements.typing_row].style_mut().display = Some(Display::Flex);
    }

    /// Handle a send action.
    ///
    /// Returns the delay before the reply is due, or `None` when the input
    /// was blank and nothing happened.
    pub fn send(&mut self, page: &mut Page, rng: &mut dyn RandomSource) -> Option<Duration> {
        let text = page[self.elements.input].value().trim().to_string();
        if text.is_empty() {
            return None;
        }

        let chars = text.chars().count();
        self.append(page, Sender::User, text);
        page.set_value(self.elements.input, "");
        self.show_typing(page);
        page.scroll_to_bottom(self.elements.message_list);

        let delay = self.policy.delay(rng);
        debug!(
            name: "widget.message.sent",
            chars,
            delay_ms = delay.as_millis(),
            "User message appended, reply scheduled"
        );
        Some(delay)
    }

    /// Hide the typing indicator and append a canned reply.
    pub fn deliver_reply(&mut self, page: &mut Page, rng: &mut dyn RandomSource) -> &Message {
        self.hide_typing(page);
        let text = self.policy.pick(rng).to_string();
        self.append(page, Sender::Assistant, text);
        page.scroll_to_bottom(self.elements.message_list);

        debug!(
            name: "widget.reply.delivered",
            messages = self.transcript.len(),
            "Canned reply appended"
        );
        &self.transcript[self.transcript.len() - 1]
    }

    fn append(&mut self, page: &mut Page, sender: Sender, text: String) -> ElementId {
        let list = self.elements.message_list;
        let top = page[list].layout().top + page.content_height(list);

        let row = page.create_element("div");
        page.set_class(row, sender.row_class());
        page.set_layout(row, Layout::new(top, BUBBLE_HEIGHT));

        let bubble = page.create_element("div");
        page.set_class(bubble, sender.bubble_class());
        let paragraph = page.create_element("p");
        page.set_text(paragraph, text.clone());

        page.append_child(bubble, paragraph);
        page.append_child(row, bubble);
        page.append_child(list, row);

        self.transcript.push(Message { text, sender });
        row
    }
}

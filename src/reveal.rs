//! Scroll-triggered card reveal.
//!
//! Cards start transparent and pushed down. Each reveal pass checks every
//! card against `viewport_height / threshold_divisor`; cards above that line
//! get a reveal scheduled after `index × stagger`, which brings them to full
//! opacity and zero offset. Cards never go back to hidden.

use std::time::Duration;

use tracing::trace;

use crate::dom::{ElementId, Page};
use crate::error::{Result, WidgetError};
use crate::selector::Selector;

pub const CARD_SELECTOR: &str = ".subject-card";

pub const DEFAULT_THRESHOLD_DIVISOR: f64 = 1.3;
pub const DEFAULT_STAGGER: Duration = Duration::from_millis(100);
pub const DEFAULT_OFFSET_PX: f64 = 20.0;
pub const DEFAULT_TRANSITION: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq)]
pub struct RevealPolicy {
    threshold_divisor: f64,
    stagger: Duration,
    offset_px: f64,
    transition: Duration,
}

impl Default for RevealPolicy {
    fn default() -> Self {
        Self {
            threshold_divisor: DEFAULT_THRESHOLD_DIVISOR,
            stagger: DEFAULT_STAGGER,
            offset_px: DEFAULT_OFFSET_PX,
            transition: DEFAULT_TRANSITION,
        }
    }
}

impl RevealPolicy {
    pub fn new(
        threshold_divisor: f64,
        stagger: Duration,
        offset_px: f64,
        transition: Duration,
    ) -> Result<Self> {
        if !threshold_divisor.is_finite() || threshold_divisor <= 0.0 {
            return Err(WidgetError::InvalidThreshold(threshold_divisor));
        }
        Ok(Self {
            threshold_divisor,
            stagger,
            offset_px,
            transition,
        })
    }

    /// Viewport-relative line a card's top must be above to reveal.
    #[must_use]
    pub fn threshold(&self, viewport_height: f64) -> f64 {
        viewport_height / self.threshold_divisor
    }

    /// Delay before the card at `index` is revealed.
    #[must_use]
    pub fn stagger_for(&self, index: usize) -> Duration {
        self.stagger
            .saturating_mul(u32::try_from(index).unwrap_or(u32::MAX))
    }

    #[must_use]
    pub fn offset_px(&self) -> f64 {
        self.offset_px
    }

    #[must_use]
    pub fn transition_css(&self) -> String {
        let secs = self.transition.as_secs_f64();
        format!("opacity {secs}s ease, transform {secs}s ease")
    }
}

/// Visibility of a card, derived from its inline style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardState {
    Hidden,
    Revealed,
}

#[derive(Debug, Clone)]
pub struct ScrollReveal {
    cards: Vec<ElementId>,
    policy: RevealPolicy,
}

impl ScrollReveal {
    #[must_use]
    pub fn new(cards: Vec<ElementId>, policy: RevealPolicy) -> Self {
        Self { cards, policy }
    }

    /// Collect every card on the page. Finding none is not an error.
    pub fn locate(page: &Page, policy: RevealPolicy) -> Result<Self> {
        let selector = Selector::parse(CARD_SELECTOR)?;
        Ok(Self::new(page.query_selector_all(&selector), policy))
    }

    #[must_use]
    pub fn cards(&self) -> &[ElementId] {
        &self.cards
    }

    /// Put every card in the hidden start state.
    pub fn prepare(&self, page: &mut Page) {
        let transition = self.policy.transition_css();
        for &card in &self.cards {
            let style = page[card].style_mut();
            style.opacity = Some(0.0);
            style.translate_y = Some(self.policy.offset_px);
            style.transition = Some(transition.clone());
        }
    }

    /// Run one visibility check.
    ///
    /// Returns `(card index, delay)` for each card that qualifies, including
    /// cards that are already revealed.
    #[must_use]
    pub fn reveal_pass(&self, page: &Page) -> Vec<(usize, Duration)> {
        let threshold = self.policy.threshold(page.viewport().height);
        self.cards
            .iter()
            .enumerate()
            .filter(|&(_, &card)| page.bounding_top(card) < threshold)
            .map(|(index, _)| (index, self.policy.stagger_for(index)))
            .collect()
    }

    /// Apply the revealed end state to the card at `index`.
    ///
    /// Returns `false` when there is no such card.
    pub fn reveal(&self, page: &mut Page, index: usize) -> bool {
        let Some(&card) = self.cards.get(index) else {
            return false;
        };
        let style = page[card].style_mut();
        style.opacity = Some(1.0);
        style.translate_y = Some(0.0);
        trace!(name: "widget.card.revealed", index, "Card revealed");
        true
    }

    #[must_use]
    pub fn state(&self, page: &Page, index: usize) -> Option<CardState> {
        let &card = self.cards.get(index)?;
        let style = page[card].style();
        let revealed = style.opacity == Some(1.0) && style.translate_y == Some(0.0);
        Some(if revealed {
            CardState::Revealed
        } else {
            CardState::Hidden
        })
    }

    #[must_use]
    pub fn states(&self, page: &Page) -> Vec<CardState> {
        (0..self.cards.len())
            .filter_map(|index| self.state(page, index))
            .collect()
    }
}

//! End-to-end widget scenarios against the landing page.

use std::time::Duration;

use study_chat_widget::catalog::SUBJECTS;
use study_chat_widget::chat::{DEFAULT_RESPONSES, Sender};
use study_chat_widget::controller::{ChatWidgetController, WidgetSettings};
use study_chat_widget::dom::Page;
use study_chat_widget::landing::LandingPage;
use study_chat_widget::random::{RandomSource, ScriptedRandom, SeededRandom};
use study_chat_widget::reveal::CardState;
use study_chat_widget::selector::Selector;

fn mount_with(rng: Box<dyn RandomSource>) -> ChatWidgetController {
    let page = LandingPage::new(&SUBJECTS).build();
    ChatWidgetController::mount(page, WidgetSettings::default(), rng)
        .expect("landing page satisfies the widget contract")
}

fn select_all(page: &Page, selector: &str) -> Vec<study_chat_widget::dom::ElementId> {
    page.query_selector_all(&Selector::parse(selector).unwrap())
}

#[test]
fn test_page_load_reveal_scenario() {
    let mut widget = mount_with(Box::new(ScriptedRandom::new([0.0])));

    // Every card starts transparent, even those already in view
    let cards = select_all(widget.page(), ".subject-card");
    assert_eq!(cards.len(), SUBJECTS.len());
    for &card in &cards {
        assert_eq!(widget.page()[card].style().opacity, Some(0.0));
    }

    // Initial pass: only the first row sits above 800 / 1.3
    widget.run_until_idle();
    let states = widget.card_states();
    assert_eq!(
        states.iter().filter(|s| **s == CardState::Revealed).count(),
        3
    );
    for &card in &cards[3..] {
        assert_eq!(widget.page()[card].style().opacity, Some(0.0));
    }

    // Scrolling to the bottom brings the rest in
    let bottom = widget.page().document_height();
    widget.scroll_to(bottom);
    widget.run_until_idle();
    for &card in &cards {
        let style = widget.page()[card].style();
        assert_eq!(style.opacity, Some(1.0));
        assert_eq!(style.translate_y, Some(0.0));
    }
}

#[test]
fn test_repeated_reveal_pass_keeps_end_state() {
    let mut widget = mount_with(Box::new(ScriptedRandom::new([0.0])));
    widget.run_until_idle();
    let first = widget.page().render(widget.page().root());

    widget.animate_cards();
    widget.animate_cards();
    widget.run_until_idle();
    assert_eq!(widget.page().render(widget.page().root()), first);
}

#[test]
fn test_hello_round_trip() {
    let mut widget = mount_with(Box::new(ScriptedRandom::new([0.25, 0.6])));
    widget.run_until_idle();

    widget.type_text("Hello");
    widget.click_send();

    let elements = widget.elements();
    assert_eq!(widget.page()[elements.input].value(), "");
    assert!(widget.is_typing());

    let user_rows = select_all(widget.page(), ".message-list .justify-end");
    assert_eq!(user_rows.len(), 1);
    assert_eq!(widget.page().text_content(user_rows[0]), "Hello");
    assert!(select_all(widget.page(), ".message-list .justify-start").is_empty());

    widget.run_until_idle();
    assert!(!widget.is_typing());

    let ai_rows = select_all(widget.page(), ".message-list .justify-start");
    assert_eq!(ai_rows.len(), 1);
    let reply = widget.page().text_content(ai_rows[0]);
    assert!(DEFAULT_RESPONSES.contains(&reply.as_str()));

    let transcript = widget.transcript();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0].sender, Sender::User);
    assert_eq!(transcript[1].sender, Sender::Assistant);
    assert_eq!(transcript[1].text, reply);
}

#[test]
fn test_blank_send_keeps_typing_state() {
    let mut widget = mount_with(Box::new(ScriptedRandom::new([0.0])));

    widget.type_text("   ");
    widget.click_send();
    assert!(widget.transcript().is_empty());
    assert!(!widget.is_typing());
    assert_eq!(widget.pending_timers(), 3);

    widget.type_text("Oi");
    widget.press_key("Enter");
    assert!(widget.is_typing());

    widget.type_text("\t\n ");
    widget.press_key("Enter");
    assert!(widget.is_typing());
    assert_eq!(widget.transcript().len(), 1);
}

#[test]
fn test_reply_delay_stays_in_window() {
    for seed in 0..50 {
        let mut widget = mount_with(Box::new(SeededRandom::new(seed)));
        widget.run_until_idle();
        let sent_at = widget.now();

        widget.type_text("Quanto tempo?");
        widget.click_send();

        widget.advance(Duration::from_millis(1499));
        assert_eq!(widget.transcript().len(), 1, "seed {seed}: reply too early");

        widget.advance(Duration::from_millis(1001));
        assert_eq!(widget.transcript().len(), 2, "seed {seed}: reply too late");
        assert!(widget.now() - sent_at <= Duration::from_millis(2500));
    }
}

#[test]
fn test_message_list_follows_new_messages() {
    let mut widget = mount_with(Box::new(ScriptedRandom::new([0.0])));
    let list = widget.elements().message_list;

    for n in 0..8 {
        widget.type_text(&format!("mensagem {n}"));
        widget.click_send();
    }
    widget.run_until_idle();

    let page = widget.page();
    assert!(page.scroll_height(list) > page.client_height(list));
    assert_eq!(
        page[list].scroll_top(),
        page.scroll_height(list) - page.client_height(list)
    );
}

use axum::http::StatusCode;
use axum_test::TestServer;
use serde::Serialize;
use serde_json::Value;

use study_chat_widget::AppState;
use study_chat_widget::config::AppConfig;
use study_chat_widget::server::router;

#[derive(Serialize)]
struct SendForm<'a> {
    message: &'a str,
}

#[derive(Serialize)]
struct ScrollForm {
    scroll_y: f64,
    viewport_height: f64,
}

fn setup() -> (TestServer, AppState) {
    let mut config = AppConfig::from_defaults().expect("defaults are valid");
    config.server.seed = Some(42);
    let state = AppState::new(config).expect("default widget settings are valid");
    let server = TestServer::new(router(state.clone())).expect("Failed to start test server");
    (server, state)
}

async fn create_session(server: &TestServer) -> String {
    let response = server.post("/api/widget").await;
    response.assert_status_ok();
    let body: Value = response.json();
    body["session_id"]
        .as_str()
        .expect("session_id is a string")
        .to_string()
}

#[tokio::test]
async fn test_health() {
    let (server, _) = setup();
    let response = server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.text(), "ok");
}

#[tokio::test]
async fn test_index_renders_landing_page() {
    let (server, state) = setup();

    let response = server.get("/").await;
    response.assert_status_ok();
    let html = response.text();

    assert!(html.starts_with("<!DOCTYPE html>"));
    assert_eq!(html.matches("subject-card area-").count(), 13);
    assert!(html.contains(r#"id="ai""#));
    assert!(html.contains(r#"class="typing-indicator""#));
    assert!(html.contains("13 disciplinas em 4 áreas do conhecimento"));

    // The page is wired to the session it opened
    assert_eq!(state.sessions.len(), 1);
    let id = state.sessions.list_ids().remove(0);
    assert!(html.contains(&format!(r#"hx-post="/api/widget/{id}/send""#)));
}

#[tokio::test]
async fn test_send_returns_user_bubble_and_typing_indicator() {
    let (server, _) = setup();
    let id = create_session(&server).await;

    let response = server
        .post(&format!("/api/widget/{id}/send"))
        .form(&SendForm {
            message: "Como estudar <b>redação</b>?",
        })
        .await;
    response.assert_status_ok();
    let html = response.text();

    assert!(html.starts_with("<div "));
    assert!(html.contains(r#"id="chat-log""#));
    assert!(html.contains("message user-message p-3"));
    assert!(html.contains("Como estudar &lt;b&gt;redação&lt;/b&gt;?"));
    assert!(html.contains(r#"class="flex justify-start typing-row" style="display: flex""#));

    let transcript: Value = server
        .get(&format!("/api/widget/{id}/transcript"))
        .await
        .json();
    let messages = transcript.as_array().expect("transcript is an array");
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["sender"], "user");
    assert_eq!(messages[0]["text"], "Como estudar <b>redação</b>?");
}

#[tokio::test]
async fn test_blank_send_adds_nothing() {
    let (server, _) = setup();
    let id = create_session(&server).await;

    let response = server
        .post(&format!("/api/widget/{id}/send"))
        .form(&SendForm { message: "   " })
        .await;
    response.assert_status_ok();
    let html = response.text();
    assert!(!html.contains("user-message"));
    assert!(html.contains(r#"style="display: none""#));
}

#[tokio::test]
async fn test_scroll_returns_card_grid() {
    let (server, _) = setup();
    let id = create_session(&server).await;

    let response = server
        .post(&format!("/api/widget/{id}/scroll"))
        .form(&ScrollForm {
            scroll_y: 600.0,
            viewport_height: 900.0,
        })
        .await;
    response.assert_status_ok();
    let html = response.text();
    assert!(html.starts_with(r#"<div class="grid""#));
    assert!(html.contains(r#"id="subject-grid""#));
    assert_eq!(html.matches("subject-card area-").count(), 13);
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let (server, _) = setup();

    let response = server.get("/api/widget/missing/log").await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert!(response.text().contains("missing"));

    let response = server
        .post("/api/widget/missing/send")
        .form(&SendForm { message: "oi" })
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_session() {
    let (server, state) = setup();
    let id = create_session(&server).await;
    assert_eq!(state.sessions.len(), 1);

    server
        .delete(&format!("/api/widget/{id}"))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    assert!(state.sessions.is_empty());

    server
        .get(&format!("/api/widget/{id}/log"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[derive(Serialize)]
struct RawScrollForm<'a> {
    scroll_y: &'a str,
    viewport_height: &'a str,
}

#[tokio::test]
async fn test_log_keeps_message_list_at_bottom() {
    let (server, _) = setup();
    let id = create_session(&server).await;

    // 8 rows of 64px overflow the 320px list
    let mut html = String::new();
    for n in 0..8 {
        let message = format!("pergunta {n}");
        let response = server
            .post(&format!("/api/widget/{id}/send"))
            .form(&SendForm { message: &message })
            .await;
        response.assert_status_ok();
        html = response.text();
    }

    assert!(html.contains(r#"hx-swap="outerHTML scroll:.message-list:bottom""#));
    let list_tag = html
        .split("<div class=\"space-y-4 message-list\"")
        .nth(1)
        .and_then(|rest| rest.split('>').next())
        .expect("message list is rendered");
    assert!(list_tag.contains("data-scroll-top=\""), "{list_tag}");
}

#[tokio::test]
async fn test_unchanged_window_does_not_rerun_reveal() {
    let (server, state) = setup();
    let id = create_session(&server).await;
    let session = state.sessions.get(&id).expect("session exists");
    session.with_controller(|widget| {
        widget.run_until_idle();
    });

    let post_scroll = |scroll_y: f64| {
        server
            .post(&format!("/api/widget/{id}/scroll"))
            .form(&ScrollForm {
                scroll_y,
                viewport_height: 800.0,
            })
    };

    post_scroll(0.0).await.assert_status_ok();
    assert_eq!(session.with_controller(|widget| widget.pending_timers()), 0);

    // Three rows come into range, the last card 800ms out
    post_scroll(600.0).await.assert_status_ok();
    let scheduled = session.with_controller(|widget| {
        let pending = widget.pending_timers();
        widget.run_until_idle();
        pending
    });
    assert!(scheduled > 0);

    post_scroll(600.0).await.assert_status_ok();
    assert_eq!(session.with_controller(|widget| widget.pending_timers()), 0);
}

#[tokio::test]
async fn test_non_finite_scroll_is_rejected() {
    let (server, state) = setup();
    let id = create_session(&server).await;

    for (scroll_y, viewport_height) in [("NaN", "800"), ("inf", "800"), ("0", "NaN"), ("0", "-5")] {
        server
            .post(&format!("/api/widget/{id}/scroll"))
            .form(&RawScrollForm {
                scroll_y,
                viewport_height,
            })
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    let viewport = state
        .sessions
        .get(&id)
        .expect("session exists")
        .with_controller(|widget| widget.page().viewport());
    assert_eq!(viewport.scroll_y, 0.0);
    assert_eq!(viewport.height, 800.0);
}

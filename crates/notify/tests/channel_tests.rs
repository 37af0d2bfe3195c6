//! Delivery tests for the webhook channel and environment wiring.

use notify::{
    ChannelError, MessageCatalog, MessageKey, Notifier, NotifyChannel, SlackChannel,
};
use serial_test::serial;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn failure_message() -> notify::UserMessage {
    MessageCatalog::new("fr").message(MessageKey::EditFailure, &[])
}

#[tokio::test]
async fn test_slack_posts_attachment() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(body_partial_json(serde_json::json!({
            "attachments": [{
                "title": "Wikidata edit failed",
                "color": "#e74c3c"
            }]
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let channel = SlackChannel::new(format!("{}/hook", server.uri()));
    channel.send(&failure_message()).await.unwrap();
}

#[tokio::test]
async fn test_slack_rate_limit_reads_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "12"))
        .mount(&server)
        .await;

    let channel = SlackChannel::new(server.uri());
    let err = channel.send(&failure_message()).await.unwrap_err();

    assert!(matches!(
        err,
        ChannelError::RateLimited {
            retry_after_secs: 12
        }
    ));
}

#[tokio::test]
async fn test_slack_rejection_keeps_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid_payload"))
        .mount(&server)
        .await;

    let channel = SlackChannel::new(server.uri());
    let err = channel.send(&failure_message()).await.unwrap_err();

    match err {
        ChannelError::Rejected { status, body } => {
            assert_eq!(status, 400);
            assert_eq!(body, "invalid_payload");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[test]
#[serial]
fn test_from_env_disabled() {
    std::env::set_var("NOTIFY_DISABLED", "true");
    let notifier = Notifier::from_env();
    std::env::remove_var("NOTIFY_DISABLED");

    assert!(!notifier.has_channels());
}

#[test]
#[serial]
fn test_from_env_channels_and_locale() {
    std::env::remove_var("NOTIFY_DISABLED");
    std::env::set_var("NOTIFY_CONSOLE", "true");
    std::env::set_var("SLACK_WEBHOOK_URL", "http://127.0.0.1:9/hook");
    std::env::set_var("NOTIFY_LOCALE", "de-DE");

    let notifier = Notifier::from_env();

    std::env::remove_var("NOTIFY_CONSOLE");
    std::env::remove_var("SLACK_WEBHOOK_URL");
    std::env::remove_var("NOTIFY_LOCALE");

    assert_eq!(notifier.channel_count(), 2);
    assert_eq!(notifier.catalog().language(), "de");
}

#[test]
#[serial]
fn test_from_env_console_off_without_slack() {
    std::env::remove_var("NOTIFY_DISABLED");
    std::env::remove_var("SLACK_WEBHOOK_URL");
    std::env::set_var("NOTIFY_CONSOLE", "false");

    let notifier = Notifier::from_env();
    std::env::remove_var("NOTIFY_CONSOLE");

    assert!(!notifier.has_channels());
}

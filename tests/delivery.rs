// tests/delivery.rs
//
// Webhook delivery reports descriptive status strings and never raises.

use chrono::DateTime;
use httpmock::prelude::*;

use trendwire::notify::{Delivery, SlackWebhook};

#[tokio::test]
async fn successful_delivery_reports_a_timestamped_status() {
    let server = MockServer::start();
    let hook = server.mock(|when, then| {
        when.method(POST)
            .path("/hook")
            .json_body_partial(r#"{"text": "digest body"}"#);
        then.status(200).body("ok");
    });

    let delivery = SlackWebhook::new(Some(server.url("/hook")));
    let status = delivery.deliver("digest body").await;

    hook.assert();
    assert!(status.starts_with("Success sending draft to webhook at "));
    let ts = status
        .rsplit(' ')
        .next()
        .expect("status ends with a timestamp");
    assert!(DateTime::parse_from_rfc3339(ts).is_ok(), "bad timestamp: {ts}");
}

#[tokio::test]
async fn rejected_delivery_reports_failure_with_the_status_code() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/hook");
        then.status(500);
    });

    let delivery = SlackWebhook::new(Some(server.url("/hook")));
    let status = delivery.deliver("digest body").await;

    assert!(status.starts_with("Failed to send draft to webhook:"));
    assert!(status.contains("500"));
}

#[tokio::test]
async fn unreachable_webhook_reports_failure_not_panic() {
    // Port 1 is never listening.
    let delivery = SlackWebhook::new(Some("http://127.0.0.1:1/hook".to_string()));
    let status = delivery.deliver("digest body").await;
    assert!(status.starts_with("Failed to send draft to webhook:"));
}

#[tokio::test]
async fn missing_webhook_url_means_delivery_is_skipped() {
    let delivery = SlackWebhook::new(None);
    let status = delivery.deliver("digest body").await;
    assert_eq!(status, "Delivery skipped: no webhook configured");
}

//! Background poller for article-update notifications.
//!
//! Every cycle asks the backend for articles updated since the last
//! *successful* poll. The watermark is captured before the request is
//! sent and only advances when the request succeeds, so updates landing
//! during an outage are reported on the next good cycle rather than
//! silently skipped.

use crate::api::ApiClient;
use crate::app::AppEvent;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::sync::mpsc;

/// Runs until the event channel closes (i.e. the app shut down).
pub async fn poll_updates(
    client: ApiClient,
    event_tx: mpsc::Sender<AppEvent>,
    poll_interval: Duration,
) {
    let mut interval = tokio::time::interval(poll_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // The first tick fires immediately; skip it so startup traffic stays
    // at one board load, and updates predating launch are not reported.
    interval.tick().await;

    let mut watermark: DateTime<Utc> = Utc::now();

    loop {
        interval.tick().await;

        // Captured before the request so updates arriving mid-flight
        // fall into the next window instead of a gap.
        let polled_at = Utc::now();
        match client.fetch_updates(watermark).await {
            Ok(updates) => {
                watermark = polled_at;
                if !updates.is_empty() {
                    tracing::debug!(count = updates.len(), "article updates received");
                    if event_tx.send(AppEvent::UpdatesPolled { updates }).await.is_err() {
                        return;
                    }
                }
            }
            Err(e) => {
                // Watermark untouched: the failed window is retried whole.
                tracing::warn!(error = %e, "update poll failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::RetryPolicy;
    use url::Url;
    use wiremock::matchers::{method, path, query_param_contains};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base: &str) -> ApiClient {
        ApiClient::new(
            Url::parse(base).unwrap(),
            reqwest::Client::new(),
            RetryPolicy {
                max_retries: 0,
                request_timeout: Duration::from_millis(500),
            },
        )
    }

    #[tokio::test]
    async fn watermark_survives_failed_cycle() {
        let server = MockServer::start().await;
        // First poll fails, second succeeds; the failing cycle must not
        // swallow the update window.
        Mock::given(method("GET"))
            .and(path("/api/article-updates"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/article-updates"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "titular": "Titular actualizado", "updated_on": "2025-03-01 10:00:00" }
            ])))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let (tx, mut rx) = mpsc::channel(8);
        let handle = tokio::spawn(poll_updates(client, tx, Duration::from_millis(50)));

        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("poller should deliver the update");
        assert!(matches!(
            event,
            Some(AppEvent::UpdatesPolled { ref updates }) if updates.len() == 1
        ));
        handle.abort();
    }

    #[tokio::test]
    async fn since_parameter_is_rfc3339() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/article-updates"))
            .and(query_param_contains("since", "T"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1..)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let (tx, _rx) = mpsc::channel(8);
        let handle = tokio::spawn(poll_updates(client, tx, Duration::from_millis(50)));
        tokio::time::sleep(Duration::from_millis(300)).await;
        handle.abort();
        server.verify().await;
    }

    #[tokio::test]
    async fn empty_update_list_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/article-updates"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let (tx, mut rx) = mpsc::channel(8);
        let handle = tokio::spawn(poll_updates(client, tx, Duration::from_millis(50)));
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(rx.try_recv().is_err());
        handle.abort();
    }
}

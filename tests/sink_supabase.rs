// tests/sink_supabase.rs
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use trend_scraper::sink::supabase::SupabaseSink;
use trend_scraper::{Batch, Sink, Story, Trend};

fn trend(title: &str, score: u32) -> Trend {
    Trend {
        topic_title: title.into(),
        topic_desc: format!("about {title}"),
        trend_score: score,
    }
}

#[tokio::test]
async fn trends_are_inserted_as_one_batch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/trending_topics"))
        .and(header("apikey", "service-key"))
        .and(header("authorization", "Bearer service-key"))
        .and(header("prefer", "return=minimal"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let sink = SupabaseSink::new(reqwest::Client::new(), server.uri(), "service-key");
    let n = sink
        .write(Batch::Trends(vec![trend("openai", 40), trend("agents", 20)]))
        .await
        .expect("insert ok");
    assert_eq!(n, 2);

    let received = server.received_requests().await.expect("recording enabled");
    let rows: Vec<Value> = received[0].body_json().expect("json array");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["topic_title"], "openai");
    assert_eq!(rows[0]["trend_score"], 40);
    assert_eq!(rows[1]["topic_desc"], "about agents");
    assert!(rows[0]["date"].as_str().is_some_and(|d| !d.is_empty()));
    assert_eq!(rows[0]["date"], rows[1]["date"]);
}

#[tokio::test]
async fn stories_mode_uses_flat_score_rows_and_custom_table() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/raw_topics"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let sink = SupabaseSink::new(reqwest::Client::new(), format!("{}/", server.uri()), "k")
        .with_table("raw_topics");
    sink.write(Batch::Stories(vec![Story {
        headline: "Simon on LLM pricing".into(),
        link: "https://simonwillison.net/2025/pricing".into(),
        date_posted: "2025-03-01".into(),
    }]))
    .await
    .expect("insert ok");

    let received = server.received_requests().await.expect("recording enabled");
    let rows: Vec<Value> = received[0].body_json().expect("json array");
    assert_eq!(rows[0]["topic_title"], "Simon on LLM pricing");
    assert_eq!(
        rows[0]["topic_desc"],
        "Source: https://simonwillison.net/2025/pricing"
    );
    assert_eq!(rows[0]["trend_score"], 1);
}

#[tokio::test]
async fn store_error_is_surfaced_with_its_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": "PGRST204",
            "message": "Could not find the 'topic_desc' column"
        })))
        .mount(&server)
        .await;

    let sink = SupabaseSink::new(reqwest::Client::new(), server.uri(), "k");
    let err = sink
        .write(Batch::Trends(vec![trend("x", 20)]))
        .await
        .unwrap_err()
        .to_string();
    assert!(err.starts_with("Failed to insert trends"), "{err}");
    assert!(err.contains("Could not find the 'topic_desc' column"), "{err}");
}

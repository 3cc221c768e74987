//! Outbound clients against local fake upstreams

use std::collections::HashMap;
use std::time::Duration;

use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::StreamExt;
use geoguide::config::{GeolocationConfig, LlmConfig, MapsConfig};
use geoguide::{
    AzureMapsClient, ChatCompletionClient, Coordinate, GeoLocator, GeoguideError, IpInfoLocator,
    NarrativeGenerator, PoiQuery, PoiSearch,
};
use serde_json::{Value, json};

async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn query() -> PoiQuery {
    PoiQuery::new(Coordinate::new(40.7128, -74.006).unwrap(), "restaurant")
}

fn maps_config(endpoint: String) -> MapsConfig {
    MapsConfig {
        subscription_key: Some("maps_test_key".to_string()),
        endpoint,
        timeout_seconds: 1,
        ..MapsConfig::default()
    }
}

fn llm_config(base_url: String) -> LlmConfig {
    LlmConfig {
        api_key: Some("gsk_test".to_string()),
        model: Some("llama3-8b-8192".to_string()),
        base_url,
        timeout_seconds: 1,
        ..LlmConfig::default()
    }
}

// Azure Maps

async fn fake_poi_search(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    let expected = [
        ("api-version", "1.0"),
        ("subscription-key", "maps_test_key"),
        ("query", "restaurant"),
        ("limit", "1"),
        ("lat", "40.7128"),
        ("lon", "-74.006"),
    ];
    for (key, value) in expected {
        if params.get(key).map(String::as_str) != Some(value) {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": format!("unexpected {key}: {:?}", params.get(key))})),
            );
        }
    }

    (
        StatusCode::OK,
        Json(json!({
            "summary": {"query": "restaurant", "numResults": 1},
            "results": [{
                "type": "POI",
                "poi": {"name": "Test Restaurant", "categories": ["restaurant"]},
                "address": {"freeformAddress": "123 Test St, Test City"},
                "position": {"lat": 40.71, "lon": -74.0}
            }]
        })),
    )
}

#[tokio::test]
async fn test_poi_search_success() {
    let base = spawn(Router::new().route("/search/poi/json", get(fake_poi_search))).await;
    let client = AzureMapsClient::new(&maps_config(format!("{base}/"))).unwrap();

    let place = client.search(&query()).await.unwrap();
    assert_eq!(place.name, "Test Restaurant");
    assert_eq!(place.address, "123 Test St, Test City");
}

#[tokio::test]
async fn test_poi_search_error_status() {
    let base = spawn(Router::new().route(
        "/search/poi/json",
        get(|| async { (StatusCode::UNAUTHORIZED, "invalid subscription key") }),
    ))
    .await;
    let client = AzureMapsClient::new(&maps_config(base)).unwrap();

    let err = client.search(&query()).await.unwrap_err();
    assert!(matches!(err, GeoguideError::Upstream { .. }));
    let message = err.to_string();
    assert!(message.contains("401"), "{message}");
    assert!(message.contains("invalid subscription key"), "{message}");
}

#[tokio::test]
async fn test_poi_search_empty_results() {
    let base = spawn(Router::new().route(
        "/search/poi/json",
        get(|| async { Json(json!({"summary": {"numResults": 0}, "results": []})) }),
    ))
    .await;
    let client = AzureMapsClient::new(&maps_config(base)).unwrap();

    let err = client.search(&query()).await.unwrap_err();
    assert_eq!(err.to_string(), "Azure Maps error: no results found");
}

#[tokio::test]
async fn test_poi_search_malformed_body() {
    let base = spawn(Router::new().route("/search/poi/json", get(|| async { "<html>oops</html>" })))
        .await;
    let client = AzureMapsClient::new(&maps_config(base)).unwrap();

    let err = client.search(&query()).await.unwrap_err();
    assert!(err.to_string().contains("Failed to parse POI search response"));
}

#[tokio::test]
async fn test_poi_search_timeout() {
    let base = spawn(Router::new().route(
        "/search/poi/json",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Json(json!({"results": []}))
        }),
    ))
    .await;
    let client = AzureMapsClient::new(&maps_config(base)).unwrap();

    let err = client.search(&query()).await.unwrap_err();
    assert!(matches!(err, GeoguideError::Timeout { seconds: 1, .. }), "{err}");
}

// Chat completions

const STREAM_BODY: &str = concat!(
    "data: {\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\"}}]}\n\n",
    "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"  The nearest \"}}]}\n\n",
    "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"restaurant is Joe's.\\n\"}}]}\n\n",
    "data: [DONE]\n\n",
);

async fn fake_chat(headers: HeaderMap, Json(body): Json<Value>) -> axum::response::Response {
    if headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) != Some("Bearer gsk_test") {
        return (StatusCode::UNAUTHORIZED, "missing bearer token").into_response();
    }

    let user = &body["messages"][1]["content"];
    if body["model"] != "llama3-8b-8192"
        || body["messages"][0]["content"] != "You are an assistant providing geospatial information."
        || user != "Find the nearest restaurant to the location latitude 40.7128, longitude -74.006."
        || body["max_tokens"] != 300
    {
        return (StatusCode::BAD_REQUEST, format!("unexpected request: {body}")).into_response();
    }

    if body["stream"] == true {
        ([(header::CONTENT_TYPE, "text/event-stream")], STREAM_BODY).into_response()
    } else {
        Json(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Finding the nearest restaurant..."},
                "finish_reason": "stop"
            }]
        }))
        .into_response()
    }
}

#[tokio::test]
async fn test_chat_completion() {
    let base = spawn(Router::new().route("/chat/completions", post(fake_chat))).await;
    let client = ChatCompletionClient::new(&llm_config(base)).unwrap();

    let text = client.generate(&query()).await.unwrap();
    assert_eq!(text, "Finding the nearest restaurant...");
}

#[tokio::test]
async fn test_chat_completion_streaming() {
    let base = spawn(Router::new().route("/chat/completions", post(fake_chat))).await;
    let client = ChatCompletionClient::new(&llm_config(format!("{base}/"))).unwrap();

    let deltas: Vec<String> = client
        .stream(&query())
        .await
        .unwrap()
        .map(|delta| delta.unwrap())
        .collect()
        .await;
    assert_eq!(deltas, vec!["  The nearest ", "restaurant is Joe's.\n"]);

    let text = client.generate_streaming(&query()).await.unwrap();
    assert_eq!(text, "The nearest restaurant is Joe's.");
}

#[tokio::test]
async fn test_chat_completion_rejected() {
    let base = spawn(Router::new().route("/chat/completions", post(fake_chat))).await;
    let mut config = llm_config(base);
    config.api_key = Some("wrong".to_string());
    let client = ChatCompletionClient::new(&config).unwrap();

    let err = client.generate(&query()).await.unwrap_err();
    assert!(matches!(err, GeoguideError::Upstream { .. }));
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn test_chat_completion_malformed_stream() {
    let base = spawn(Router::new().route(
        "/chat/completions",
        post(|| async {
            (
                [(header::CONTENT_TYPE, "text/event-stream")],
                "data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n\ndata: {broken\n\n",
            )
        }),
    ))
    .await;
    let client = ChatCompletionClient::new(&llm_config(base)).unwrap();

    let err = client.generate_streaming(&query()).await.unwrap_err();
    assert!(err.to_string().contains("Failed to parse completion chunk"));
}

// Geolocation

#[tokio::test]
async fn test_geolocation_resolves() {
    let base = spawn(Router::new().route(
        "/json",
        get(|| async { Json(json!({"ip": "203.0.113.7", "city": "New York", "loc": "40.7128,-74.0060"})) }),
    ))
    .await;
    let locator = IpInfoLocator::new(&GeolocationConfig {
        endpoint: format!("{base}/json"),
        timeout_seconds: 1,
    })
    .unwrap();

    assert_eq!(
        locator.resolve().await,
        Some(Coordinate {
            latitude: 40.7128,
            longitude: -74.006
        })
    );
}

#[tokio::test]
async fn test_geolocation_without_coordinates() {
    let base = spawn(Router::new().route(
        "/json",
        get(|| async { Json(json!({"ip": "10.0.0.1", "bogon": true})) }),
    ))
    .await;
    let locator = IpInfoLocator::new(&GeolocationConfig {
        endpoint: format!("{base}/json"),
        timeout_seconds: 1,
    })
    .unwrap();

    assert_eq!(locator.resolve().await, None);
}

#[tokio::test]
async fn test_geolocation_provider_failure() {
    let base = spawn(Router::new().route(
        "/json",
        get(|| async { (StatusCode::TOO_MANY_REQUESTS, "rate limited") }),
    ))
    .await;
    let locator = IpInfoLocator::new(&GeolocationConfig {
        endpoint: format!("{base}/json"),
        timeout_seconds: 1,
    })
    .unwrap();

    assert!(locator.lookup().await.unwrap_err().is_upstream());
    assert_eq!(locator.resolve().await, None);
}

#[tokio::test]
async fn test_geolocation_unreachable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let locator = IpInfoLocator::new(&GeolocationConfig {
        endpoint: format!("http://{addr}/json"),
        timeout_seconds: 1,
    })
    .unwrap();

    assert_eq!(locator.resolve().await, None);
}

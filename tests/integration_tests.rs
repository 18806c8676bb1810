//! Integration tests for the travel agent HTTP API
//!
//! Every provider (geocoding, forecast, LLM, places) is served by a single
//! wiremock server; requests go through the full router with its layers.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use rstest::rstest;
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, header as header_matcher, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use travel_agent::{AppState, TravelAgentConfig, web};

const OPENAI_KEY: &str = "sk-test-0123456789";

const ITINERARY_JSON: &str = r#"{
    "location": "Lisboa",
    "weather_overview": "Soleado con algo de lluvia",
    "days": [
        {"date": "2030-06-01", "title": "Belém", "morning": "Torre", "afternoon": "Pasteles", "evening": "Fado", "notes": ""},
        {"date": "2030-06-02", "title": "Museos", "morning": "Gulbenkian", "afternoon": "Azulejo", "evening": "Cena", "notes": "Paraguas"}
    ]
}"#;

fn test_config(server: &MockServer) -> TravelAgentConfig {
    let mut config = TravelAgentConfig::default();
    config.apply_defaults();
    config.weather.forecast_base_url = server.uri();
    config.weather.geocoding_base_url = server.uri();
    config.weather.max_retries = 0;
    config.llm.base_url = server.uri();
    config.llm.max_retries = 0;
    config.places.base_url = server.uri();
    config
}

fn app(server: &MockServer) -> Router {
    let config = test_config(server);
    let state = AppState::from_config(&config).unwrap();
    web::build_app(&config.server, state).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn mount_lisbon_weather(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("name", "Lisboa"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{
                "name": "Lisboa",
                "latitude": 38.71667,
                "longitude": -9.13333,
                "country": "Portugal",
                "timezone": "Europe/Lisbon"
            }]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "daily": {
                "time": ["2030-06-01", "2030-06-02"],
                "weathercode": [0, 63],
                "temperature_2m_max": [27.0, 21.5],
                "temperature_2m_min": [17.0, 15.0],
                "precipitation_sum": [0.0, 7.5]
            }
        })))
        .mount(server)
        .await;
}

async fn mount_completion(server: &MockServer, content: &str) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header_matcher("Authorization", format!("Bearer {OPENAI_KEY}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-test",
            "choices": [{
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_health() {
    let server = MockServer::start().await;
    let (status, body) = send(app(&server), get("/api/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["version"], travel_agent::VERSION);
    assert!(body["time"].as_str().is_some());
}

#[tokio::test]
async fn test_unknown_route() {
    let server = MockServer::start().await;
    let response = app(&server).oneshot(get("/api/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_chat_requires_key() {
    let server = MockServer::start().await;
    let (status, body) = send(app(&server), post_json("/api/chat", &json!({"message": "Hola"}))).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Falta tu OPENAI_API_KEY.");
}

#[tokio::test]
async fn test_chat_rejects_short_key() {
    let server = MockServer::start().await;
    let request = json!({"keys": {"openai_api_key": "sk-1"}, "message": "Hola"});
    let (status, _) = send(app(&server), post_json("/api/chat", &request)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_asks_for_prefs() {
    let server = MockServer::start().await;
    let request = json!({"keys": {"openai_api_key": OPENAI_KEY}, "message": "Quiero un itinerario"});
    let (status, body) = send(app(&server), post_json("/api/chat", &request)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "need_prefs");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_chat_small_talk() {
    let server = MockServer::start().await;
    mount_completion(&server, "¡Hola! ¿A dónde viajamos?").await;

    let request = json!({
        "keys": {"openai_api_key": OPENAI_KEY},
        "message": "Hola",
        "history": [{"role": "assistant", "content": "Bienvenido"}]
    });
    let (status, body) = send(app(&server), post_json("/api/chat", &request)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "chat");
    assert_eq!(body["message"], "¡Hola! ¿A dónde viajamos?");
}

#[tokio::test]
async fn test_chat_blank_answer_falls_back() {
    let server = MockServer::start().await;
    mount_completion(&server, "").await;

    let request = json!({"keys": {"openai_api_key": OPENAI_KEY}, "message": "Hola"});
    let (status, body) = send(app(&server), post_json("/api/chat", &request)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "chat");
    assert_eq!(
        body["message"],
        "Puedo ayudarte con destinos, clima e itinerarios. ¿A dónde te gustaría viajar?"
    );
}

#[tokio::test]
async fn test_chat_with_prefs_plans_trip() {
    let server = MockServer::start().await;
    mount_lisbon_weather(&server).await;
    mount_completion(&server, ITINERARY_JSON).await;

    let request = json!({
        "keys": {"openai_api_key": OPENAI_KEY},
        "message": "Planifica",
        "prefs": {"location": "Lisboa", "days": 2, "start_date": "2030-06-01"}
    });
    let (status, body) = send(app(&server), post_json("/api/chat", &request)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "itinerary");
    assert_eq!(body["itinerary"]["location"], "Lisboa");
    assert_eq!(body["itinerary"]["timezone"], "Europe/Lisbon");
    assert_eq!(body["weather"]["days"].as_array().unwrap().len(), 2);
    assert!(
        body["weather"]["overview"]
            .as_str()
            .unwrap()
            .starts_with("Panorama general: lluvioso.")
    );
    // no places key, no places section
    assert!(body.get("places").is_none());
}

#[tokio::test]
async fn test_weather_endpoint() {
    let server = MockServer::start().await;
    mount_lisbon_weather(&server).await;

    let (status, body) = send(
        app(&server),
        get("/api/weather?city=Lisboa&days=2&start_date=2030-06-01"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["geo"]["name"], "Lisboa");
    assert_eq!(body["days"][1]["summary"], "lluvia moderada");
    assert_eq!(body["days"][0]["date"], "2030-06-01");
}

async fn last_forecast_end_date(server: &MockServer) -> Option<String> {
    let requests = server.received_requests().await.unwrap();
    let forecast = requests
        .iter()
        .rev()
        .find(|request| request.url.path() == "/forecast")?;
    forecast
        .url
        .query_pairs()
        .find(|(key, _)| key == "end_date")
        .map(|(_, value)| value.into_owned())
}

#[rstest]
#[case("90", "2030-06-14")]
#[case("0", "2030-06-01")]
#[case("-2", "2030-06-01")]
#[tokio::test]
async fn test_weather_clamps_days(#[case] days: &str, #[case] expected_end: &str) {
    let server = MockServer::start().await;
    mount_lisbon_weather(&server).await;

    let uri = format!("/api/weather?city=Lisboa&days={days}&start_date=2030-06-01");
    let (status, _) = send(app(&server), get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        last_forecast_end_date(&server).await.as_deref(),
        Some(expected_end)
    );
}

#[tokio::test]
async fn test_weather_rejects_non_numeric_days() {
    let server = MockServer::start().await;
    let (status, body) = send(app(&server), get("/api/weather?city=Lisboa&days=tres")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "days debe ser un número entero");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_weather_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let (status, body) = send(app(&server), get("/api/weather")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Falta el parámetro city");

    let (status, body) = send(app(&server), get("/api/weather?city=Atlantis")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "No se encontró la ciudad: Atlantis");

    let (status, _) = send(
        app(&server),
        get("/api/weather?city=Lisboa&start_date=pasado"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_itinerary_endpoint_with_places() {
    let server = MockServer::start().await;
    mount_lisbon_weather(&server).await;
    mount_completion(&server, ITINERARY_JSON).await;
    Mock::given(method("POST"))
        .and(path("/places:searchText"))
        .and(header_matcher("X-Goog-Api-Key", "places-key-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "places": [{"displayName": {"text": "Oceanário"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = json!({
        "openai_api_key": OPENAI_KEY,
        "places_api_key": "places-key-123",
        "city": "Lisboa",
        "days": 2,
        "start_date": "2030-06-01"
    });
    let (status, body) = send(app(&server), post_json("/api/itinerary", &request)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["location"], "Lisboa");
    assert_eq!(body["days"].as_array().unwrap().len(), 2);

    // the suggested place reached the planning prompt
    let requests = server.received_requests().await.unwrap();
    let completion = requests
        .iter()
        .find(|request| request.url.path() == "/chat/completions")
        .unwrap();
    let payload: Value = serde_json::from_slice(&completion.body).unwrap();
    let prompt = payload["messages"][1]["content"].as_str().unwrap();
    assert!(prompt.contains("- Oceanário"));
    assert_eq!(payload["response_format"]["type"], "json_schema");
}

#[tokio::test]
async fn test_itinerary_bad_requests() {
    let server = MockServer::start().await;

    let (status, body) = send(app(&server), post_json("/api/itinerary", &json!([1, 2]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Parámetros inválidos");

    // key problems are a bad request shape here, not a 401 as on /chat
    let (status, body) = send(app(&server), post_json("/api/itinerary", &json!({"city": "Lisboa"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Parámetros inválidos");

    let request = json!({"openai_api_key": "sk-1", "city": "Lisboa"});
    let (status, body) = send(app(&server), post_json("/api/itinerary", &request)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Parámetros inválidos");

    let request = json!({"openai_api_key": OPENAI_KEY, "city": "  "});
    let (status, body) = send(app(&server), post_json("/api/itinerary", &request)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Parámetros inválidos");
}

#[tokio::test]
async fn test_itinerary_upstream_failure() {
    let server = MockServer::start().await;
    mount_lisbon_weather(&server).await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"model": "gpt-4.1-mini"})))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let request = json!({"openai_api_key": OPENAI_KEY, "city": "Lisboa", "days": 2});
    let (status, body) = send(app(&server), post_json("/api/itinerary", &request)).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["detail"].as_str().unwrap().starts_with("Error al contactar"));
}

#[tokio::test]
async fn test_download_txt() {
    let server = MockServer::start().await;
    let itinerary: Value = serde_json::from_str(ITINERARY_JSON).unwrap();

    let (status, body) = send(app(&server), post_json("/api/download/txt", &itinerary)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["filename"], "itinerario_Lisboa.txt");
    let content = body["content"].as_str().unwrap();
    assert!(content.starts_with("Itinerario: Lisboa\n"));
    assert!(content.contains("Notas: Paraguas"));
}

#[tokio::test]
async fn test_download_ics() {
    let server = MockServer::start().await;
    let mut itinerary: Value = serde_json::from_str(ITINERARY_JSON).unwrap();
    itinerary["timezone"] = json!("Europe/Lisbon");

    let (status, body) = send(app(&server), post_json("/api/download/ics", &itinerary)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["filename"], "itinerario_Lisboa.ics");
    let content = body["content"].as_str().unwrap();
    assert!(content.starts_with("BEGIN:VCALENDAR\r\n"));
    assert_eq!(content.matches("BEGIN:VEVENT").count(), 2);
    // Lisbon is UTC+1 in summer
    assert!(content.contains("DTSTART:20300601T080000Z\r\n"));
}

#[tokio::test]
async fn test_download_rejects_invalid_itinerary() {
    let server = MockServer::start().await;

    for uri in ["/api/download/txt", "/api/download/ics"] {
        let (status, body) = send(app(&server), post_json(uri, &json!({"days": "nope"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Itinerario inválido");
    }
}

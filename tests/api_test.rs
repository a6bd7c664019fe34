use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{Duration as ChronoDuration, Utc};
use http_body_util::BodyExt;
use meal_data_service::config::AppConfig;
use meal_data_service::infrastructure::{database, storage};
use meal_data_service::services::error::TransferError;
use meal_data_service::services::url_issuer::{HttpMethod, PresignedUrl, UrlIssuer};
use meal_data_service::{AppState, create_app};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Issues unsigned URLs pointing at a mock object store.
struct MockStoreIssuer {
    base: String,
}

#[async_trait]
impl UrlIssuer for MockStoreIssuer {
    async fn issue_put(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<PresignedUrl, TransferError> {
        let now = Utc::now();
        Ok(PresignedUrl {
            url: format!("{}/{}/{}", self.base, bucket, key),
            method: HttpMethod::Put,
            issued_at: now,
            expires_at: now + ChronoDuration::seconds(expires_in.as_secs() as i64),
        })
    }

    async fn issue_get(
        &self,
        bucket: &str,
        key: &str,
        _entity: &str,
        expires_in: Duration,
    ) -> Result<PresignedUrl, TransferError> {
        let now = Utc::now();
        Ok(PresignedUrl {
            url: format!("{}/{}/{}", self.base, bucket, key),
            method: HttpMethod::Get,
            issued_at: now,
            expires_at: now + ChronoDuration::seconds(expires_in.as_secs() as i64),
        })
    }
}

async fn test_app(config: AppConfig, issuer: Arc<dyn UrlIssuer>) -> Router {
    let db = database::setup_database("sqlite::memory:").await.unwrap();
    create_app(AppState::new(db, issuer, config))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_health_reports_database_and_request_id() {
    let app = test_app(
        AppConfig::default(),
        Arc::new(MockStoreIssuer {
            base: "http://store.invalid".into(),
        }),
    )
    .await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "req-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-request-id"], "req-42");

    let body: Value =
        serde_json::from_slice(&response.into_body().collect().await.unwrap().to_bytes()).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "connected");
    assert_eq!(body["bucket"], "meal-data-exports");
}

#[tokio::test]
async fn test_meal_component_flow() {
    let app = test_app(
        AppConfig::default(),
        Arc::new(MockStoreIssuer {
            base: "http://store.invalid".into(),
        }),
    )
    .await;

    // 1. Create a meal and reject its duplicate
    let (status, meal) = send(
        &app,
        "POST",
        "/meals",
        Some(json!({"name": "Lasagne", "description": "Layered pasta"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let meal_id = meal["id"].as_str().unwrap().to_string();

    let (status, err) = send(&app, "POST", "/meals", Some(json!({"name": "Lasagne"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(err["error"].as_str().unwrap().contains("already exists"));

    let (status, _) = send(&app, "POST", "/meals", Some(json!({"name": ""}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // 2. Link a component
    let (status, component) = send(
        &app,
        "POST",
        "/components",
        Some(json!({"name": "Bechamel", "description": null})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let component_id = component["id"].as_str().unwrap().to_string();

    let (status, link) = send(
        &app,
        "POST",
        &format!("/meals/{}/components", meal_id),
        Some(json!({"component_id": component_id, "component_quantity": 0.5})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(link["meal_id"], meal_id.as_str());

    let (status, _) = send(
        &app,
        "POST",
        &format!("/meals/{}/components", meal_id),
        Some(json!({"component_id": "missing", "component_quantity": 1.0})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // 3. Nested read
    let (status, meals) = send(&app, "GET", "/meals", None).await;
    assert_eq!(status, StatusCode::OK);
    let meals = meals.as_array().unwrap();
    assert_eq!(meals.len(), 1);
    assert_eq!(meals[0]["meal_components"][0]["component"]["name"], "Bechamel");
    assert_eq!(meals[0]["meal_components"][0]["component_quantity"], 0.5);

    // 4. Delete, then delete again
    let (status, deleted) = send(&app, "DELETE", &format!("/meals/{}", meal_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["name"], "Lasagne");

    let (status, _) = send(&app, "DELETE", &format!("/meals/{}", meal_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, meals) = send(&app, "GET", "/meals", None).await;
    assert!(meals.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_search_returns_exact_match_first() {
    let app = test_app(
        AppConfig::default(),
        Arc::new(MockStoreIssuer {
            base: "http://store.invalid".into(),
        }),
    )
    .await;

    for name in ["Chicken Soup", "Baked Chicken", "Chicken", "Beef Stew"] {
        let (status, _) = send(&app, "POST", "/meals", Some(json!({"name": name}))).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, found) = send(&app, "GET", "/meals/search?name=Chicken", None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = found
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Chicken", "Baked Chicken", "Chicken Soup"]);
}

#[tokio::test]
async fn test_data_source_pages() {
    let app = test_app(
        AppConfig::default(),
        Arc::new(MockStoreIssuer {
            base: "http://store.invalid".into(),
        }),
    )
    .await;

    for (name, unit) in [("Salt", "g"), ("Butter", "g"), ("Milk", "ml")] {
        let (status, _) = send(
            &app,
            "POST",
            "/ingredients",
            Some(json!({"name": name, "unit": unit})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, page) = send(&app, "GET", "/data/ingredient?skip=1&take=1", None).await;
    assert_eq!(status, StatusCode::OK);
    let page = page.as_array().unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0]["name"], "Milk");
    assert_eq!(page[0]["unit"], "ml");

    let (status, page) = send(&app, "GET", "/data/ingredients?skip=3&take=10", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(page.as_array().unwrap().is_empty());

    let (status, _) = send(&app, "GET", "/data/ingredient?take=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "GET", "/data/widgets", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_export_reads_own_data_source_and_uploads_csv() {
    let store = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/meal-data-exports/meal/today.csv"))
        .and(header("content-type", "text/csv"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&store)
        .await;

    // Serve the API for real so the exporter can page through /data/
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let config = AppConfig {
        base_url: format!("http://{}/data/", addr),
        export_page_size: 1,
        ..AppConfig::default()
    };
    let app = test_app(config, Arc::new(MockStoreIssuer { base: store.uri() })).await;

    let server_app = app.clone();
    tokio::spawn(async move {
        axum::serve(listener, server_app).await.unwrap();
    });

    for name in ["Apple Pie", "Zucchini \"Fritters\""] {
        let (status, _) = send(&app, "POST", "/meals", Some(json!({"name": name}))).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, receipt) = send(
        &app,
        "POST",
        "/exports",
        Some(json!({"entity": "meal", "key": "meal/today.csv"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", receipt);
    assert_eq!(receipt["rows"], 2);
    // The empty page that ends the walk is not counted
    assert_eq!(receipt["pages"], 2);
    assert_eq!(receipt["entity"], "meal");

    let uploads: Vec<_> = store
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.method.as_str() == "PUT")
        .collect();
    assert_eq!(uploads.len(), 1);

    let body = String::from_utf8(uploads[0].body.clone()).unwrap();
    assert_eq!(receipt["bytes"], body.len());
    assert_eq!(
        uploads[0].headers["content-length"].to_str().unwrap(),
        body.len().to_string()
    );

    let lines: Vec<&str> = body.split("\r\n").collect();
    assert_eq!(lines[0], "id,name,description,created_at");
    assert!(lines[1].contains(",Apple Pie,,"));
    assert!(lines[2].contains(",\"Zucchini \"\"Fritters\"\"\",,"));
    assert_eq!(lines[3], "");
}

#[tokio::test]
async fn test_export_surfaces_storage_rejection() {
    let store = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(403).set_body_string("SignatureDoesNotMatch"))
        .expect(1)
        .mount(&store)
        .await;

    let data = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/component"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&data)
        .await;

    let config = AppConfig {
        base_url: format!("{}/data/", data.uri()),
        ..AppConfig::default()
    };
    let app = test_app(config, Arc::new(MockStoreIssuer { base: store.uri() })).await;

    let (status, err) = send(
        &app,
        "POST",
        "/exports",
        Some(json!({"entity": "components", "key": "component/x.csv"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(err["error"].as_str().unwrap().contains("403"));
}

/// Hands out upload URLs that carry a signature but point at a closed port.
struct UnreachableStoreIssuer;

#[async_trait]
impl UrlIssuer for UnreachableStoreIssuer {
    async fn issue_put(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<PresignedUrl, TransferError> {
        let now = Utc::now();
        Ok(PresignedUrl {
            url: format!(
                "http://127.0.0.1:9/{}/{}?X-Amz-Credential=AKIDEXAMPLE&X-Amz-Signature=deadbeefcafe",
                bucket, key
            ),
            method: HttpMethod::Put,
            issued_at: now,
            expires_at: now + ChronoDuration::seconds(expires_in.as_secs() as i64),
        })
    }

    async fn issue_get(
        &self,
        _bucket: &str,
        _key: &str,
        _entity: &str,
        _expires_in: Duration,
    ) -> Result<PresignedUrl, TransferError> {
        unreachable!("no download URL after a failed upload")
    }
}

#[tokio::test]
async fn test_upload_transport_error_does_not_leak_signed_url() {
    let data = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/meal"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&data)
        .await;

    let config = AppConfig {
        base_url: format!("{}/data/", data.uri()),
        ..AppConfig::default()
    };
    let app = test_app(config, Arc::new(UnreachableStoreIssuer)).await;

    let (status, err) = send(
        &app,
        "POST",
        "/exports",
        Some(json!({"entity": "meal", "key": "k.csv"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let message = err["error"].as_str().unwrap();
    assert!(message.starts_with("Upload transport failed"), "{}", message);
    assert!(!message.contains("X-Amz-Signature"), "{}", message);
    assert!(!message.contains("AKIDEXAMPLE"), "{}", message);
}

#[tokio::test]
async fn test_oversized_page_size_is_clamped_to_data_source_limit() {
    let store = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&store)
        .await;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let config = AppConfig {
        base_url: format!("http://{}/data/", addr),
        export_page_size: 5000,
        ..AppConfig::default()
    };
    let app = test_app(config, Arc::new(MockStoreIssuer { base: store.uri() })).await;

    let server_app = app.clone();
    tokio::spawn(async move {
        axum::serve(listener, server_app).await.unwrap();
    });

    let (status, _) = send(&app, "POST", "/meals", Some(json!({"name": "Risotto"}))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, receipt) = send(&app, "POST", "/exports", Some(json!({"entity": "meal"}))).await;
    assert_eq!(status, StatusCode::CREATED, "{}", receipt);
    assert_eq!(receipt["rows"], 1);
    assert_eq!(receipt["pages"], 1);
}

#[tokio::test]
async fn test_export_rejects_unknown_entity_before_any_io() {
    let store = MockServer::start().await;
    let app = test_app(
        AppConfig::default(),
        Arc::new(MockStoreIssuer { base: store.uri() }),
    )
    .await;

    let (status, _) = send(&app, "POST", "/exports", Some(json!({"entity": "widget"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(store.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_download_url_is_signed_for_csv() {
    // Static credentials and a custom endpoint keep signing offline
    let config = AppConfig::development();
    let issuer = storage::setup_storage(&config).await;
    let app = test_app(config, issuer).await;

    let (status, url) = send(
        &app,
        "GET",
        "/exports/meal/url?key=meal/today.csv",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(url["method"], "GET");

    let signed = url["url"].as_str().unwrap();
    assert!(signed.starts_with("http://127.0.0.1:9000/meal-data-exports/meal/today.csv?"));
    assert!(signed.contains("X-Amz-Expires=300"));
    assert!(signed.contains("response-content-type=text%2Fcsv"));
    assert!(signed.contains("Meal.csv"));

    let (status, _) = send(&app, "GET", "/exports/widget/url?key=x.csv", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

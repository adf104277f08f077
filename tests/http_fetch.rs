use arcgis_scraper::{ArcGisScraper, Error, LayerQuery, ServiceConfig, TransportError};
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SERVICE: &str = "/arcgis/rest/services/Parcels/FeatureServer";

fn service_config(server: &MockServer, dir: &TempDir) -> ServiceConfig {
    let mut config = ServiceConfig::new(format!("{}{}/", server.uri(), SERVICE));
    config.export_directory = dir.path().to_path_buf();
    config.max_requests_per_second = 0.0;
    config.max_retries = 0;
    config.request_timeout_secs = 5;
    config
}

fn page(start: usize, count: usize) -> Value {
    let features: Vec<Value> = (start..start + count)
        .map(|id| json!({"attributes": {"OBJECTID": id, "NAME": format!("parcel-{id}")}}))
        .collect();
    json!({"objectIdFieldName": "OBJECTID", "features": features})
}

#[tokio::test]
async fn walks_every_page_over_http() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = service_config(&server, &dir);
    config.page_size = 3;

    for (offset, count) in [(0, 3), (3, 3), (6, 1), (9, 0)] {
        Mock::given(method("GET"))
            .and(path(format!("{SERVICE}/0/query")))
            .and(query_param("where", "1=1"))
            .and(query_param("outFields", "*"))
            .and(query_param("f", "json"))
            .and(query_param("resultRecordCount", "3"))
            .and(query_param("resultOffset", offset.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(offset, count)))
            .expect(1)
            .mount(&server)
            .await;
    }

    let scraper = ArcGisScraper::new(&config).unwrap();
    let features = scraper.fetch_layer(&LayerQuery::new("0/query")).await.unwrap();

    assert_eq!(features.len(), 7);
    let ids: Vec<u64> = features
        .iter()
        .map(|f| f["attributes"]["OBJECTID"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, (0..7).collect::<Vec<_>>());
}

#[tokio::test]
async fn sends_token_and_geometry_when_configured() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = service_config(&server, &dir);
    config.token = Some("s3cret".to_string());

    Mock::given(method("GET"))
        .and(path(format!("{SERVICE}/1/query")))
        .and(query_param("token", "s3cret"))
        .and(query_param("geometry", "-71.1,42.3,-71.0,42.4"))
        .and(query_param("where", "ACRES > 5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"features": []})))
        .expect(1)
        .mount(&server)
        .await;

    let scraper = ArcGisScraper::new(&config).unwrap();
    let query = LayerQuery::new("1/query")
        .with_where("ACRES > 5")
        .with_geometry("-71.1,42.3,-71.0,42.4");
    let features = scraper.fetch_layer(&query).await.unwrap();
    assert!(features.is_empty());
}

#[tokio::test]
async fn metadata_is_fetched_from_the_layer_endpoint() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = service_config(&server, &dir);
    config.token = Some("s3cret".to_string());

    let metadata = json!({
        "name": "Parcels",
        "geometryType": "esriGeometryPolygon",
        "fields": [{"name": "OBJECTID", "type": "esriFieldTypeOID"}]
    });
    Mock::given(method("GET"))
        .and(path(format!("{SERVICE}/0")))
        .and(query_param("f", "json"))
        .and(query_param("token", "s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(metadata.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let scraper = ArcGisScraper::new(&config).unwrap();
    assert_eq!(scraper.fetch_metadata("0/query").await.unwrap(), metadata);
}

#[tokio::test]
async fn server_errors_are_retried() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = service_config(&server, &dir);
    config.max_retries = 1;

    Mock::given(method("GET"))
        .and(path(format!("{SERVICE}/0")))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{SERVICE}/0")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "Parcels"})))
        .expect(1)
        .mount(&server)
        .await;

    let scraper = ArcGisScraper::new(&config).unwrap();
    let metadata = scraper.fetch_metadata("0").await.unwrap();

    assert_eq!(metadata["name"], "Parcels");
    assert_eq!(scraper.metrics().retries, 1);
}

#[tokio::test]
async fn client_errors_can_fail_fast() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = service_config(&server, &dir);
    config.max_retries = 3;
    config.retry_client_errors = false;
    config.token = Some("s3cret".to_string());

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let scraper = ArcGisScraper::new(&config).unwrap();
    let err = scraper
        .fetch_layer(&LayerQuery::new("0/query"))
        .await
        .unwrap_err();

    match err {
        Error::Request { attempts, source } => {
            assert_eq!(attempts, 1);
            match &source {
                TransportError::Status { status, url } => {
                    assert_eq!(*status, 403);
                    assert!(!url.contains("s3cret"));
                }
                other => panic!("unexpected transport error: {other}"),
            }
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn non_json_bodies_are_transport_errors() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = service_config(&server, &dir);

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let scraper = ArcGisScraper::new(&config).unwrap();
    let err = scraper.fetch_metadata("0").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Request {
            attempts: 1,
            source: TransportError::Decode(_)
        }
    ));
}

#[tokio::test]
async fn service_error_documents_end_pagination() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = service_config(&server, &dir);

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": {"code": 400, "message": "Invalid query parameters"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let scraper = ArcGisScraper::new(&config).unwrap();
    let features = scraper.fetch_layer(&LayerQuery::new("0/query")).await.unwrap();
    assert!(features.is_empty());
}

#[tokio::test]
async fn network_errors_do_not_expose_the_token() {
    let dir = TempDir::new().unwrap();
    let mut config = ServiceConfig::new(format!("http://127.0.0.1:1{SERVICE}"));
    config.export_directory = dir.path().to_path_buf();
    config.max_requests_per_second = 0.0;
    config.max_retries = 0;
    config.request_timeout_secs = 5;
    config.token = Some("s3cret".to_string());

    let scraper = ArcGisScraper::new(&config).unwrap();
    let err = scraper
        .fetch_layer(&LayerQuery::new("0/query"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Request {
            attempts: 1,
            source: TransportError::Network(_)
        }
    ));
    let message = err.to_string();
    assert!(message.contains("/0/query"));
    assert!(!message.contains("s3cret"));
    assert!(!format!("{err:?}").contains("s3cret"));
}

#[tokio::test]
async fn failure_after_a_full_page_discards_the_layer() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = service_config(&server, &dir);
    config.page_size = 2;

    Mock::given(method("GET"))
        .and(path(format!("{SERVICE}/0/query")))
        .and(query_param("resultOffset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(0, 2)))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{SERVICE}/0/query")))
        .and(query_param("resultOffset", "2"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let scraper = ArcGisScraper::new(&config).unwrap();
    let query = LayerQuery::new("0/query");

    let err = scraper.fetch_layer(&query).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Request {
            attempts: 1,
            source: TransportError::Status { status: 500, .. }
        }
    ));

    let err = scraper.scrape_layer(&query, Some("partial")).await.unwrap_err();
    assert!(matches!(err, Error::Request { .. }));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    assert_eq!(scraper.metrics().features_fetched, 4);
    assert_eq!(scraper.metrics().records_exported, 0);
}

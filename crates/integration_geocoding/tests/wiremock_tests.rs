//! Integration tests for the Nominatim geocoding client (wiremock-based)

use std::sync::Arc;
use std::time::Duration;

use domain::Address;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use integration_geocoding::{
    Clock, GeocodeLookup, Geocoder, GeocodingConfig, GeocodingError, ManualClock,
    NominatimGeocodeClient,
};

fn config_for_mock(base_url: &str) -> GeocodingConfig {
    GeocodingConfig {
        base_url: base_url.to_string(),
        ..GeocodingConfig::for_testing()
    }
}

fn main_st() -> Address {
    Address::new("123 Main St", "Colorado Springs", "CO").unwrap()
}

fn geocoder_for_mock(base_url: &str, clock: &Arc<ManualClock>) -> Geocoder {
    let config = config_for_mock(base_url);
    let client = NominatimGeocodeClient::new(&config).unwrap();
    Geocoder::with_lookup(Arc::new(client), Arc::clone(clock) as Arc<dyn Clock>, &config)
}

const fn colorado_springs_json() -> &'static str {
    r#"[{
        "place_id": 297462115,
        "lat": "38.83",
        "lon": "-104.82",
        "display_name": "123 Main St, Colorado Springs, CO, USA",
        "address": {
            "house_number": "123",
            "road": "Main St",
            "city": "Colorado Springs",
            "state": "Colorado",
            "country_code": "us"
        }
    }]"#
}

const fn miami_json() -> &'static str {
    r#"[{ "lat": "25.0", "lon": "-80.0", "display_name": "Miami, FL, USA" }]"#
}

#[tokio::test]
async fn test_geocode_end_to_end() {
    let server = MockServer::start().await;
    let config = config_for_mock(&server.uri());

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "123 Main St, Colorado Springs, CO, USA"))
        .and(query_param("format", "json"))
        .and(query_param("limit", "1"))
        .and(query_param("countrycodes", "us"))
        .and(query_param("addressdetails", "1"))
        .and(header("user-agent", config.user_agent_header().as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string(colorado_springs_json()))
        .expect(1)
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new());
    let result = geocoder_for_mock(&server.uri(), &clock)
        .geocode(&main_st())
        .await
        .unwrap();

    assert!((result.latitude() - 38.83).abs() < f64::EPSILON);
    assert!((result.longitude() - -104.82).abs() < f64::EPSILON);
    assert_eq!(
        result.formatted_address(),
        "123 Main St, Colorado Springs, CO, USA"
    );
}

#[tokio::test]
async fn test_query_includes_optional_parts() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param(
            "q",
            "123 Main St Apt 4, Colorado Springs, CO 80903, USA",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string(colorado_springs_json()))
        .expect(1)
        .mount(&server)
        .await;

    let client = NominatimGeocodeClient::new(&config_for_mock(&server.uri())).unwrap();
    let address = main_st().with_apartment("Apt 4").with_postal_code("80903");

    assert!(client.lookup(&address).await.is_ok());
}

#[tokio::test]
async fn test_lookup_rate_limited() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "30"))
        .mount(&server)
        .await;

    let client = NominatimGeocodeClient::new(&config_for_mock(&server.uri())).unwrap();
    let err = client.lookup(&main_st()).await.unwrap_err();

    assert!(err.is_retryable());
    assert!(matches!(
        err,
        GeocodingError::RateLimited {
            retry_after_secs: Some(30)
        }
    ));
}

#[tokio::test]
async fn test_lookup_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = NominatimGeocodeClient::new(&config_for_mock(&server.uri())).unwrap();
    let err = client.lookup(&main_st()).await.unwrap_err();

    assert!(matches!(
        err,
        GeocodingError::TransportFailure {
            status: Some(500),
            ..
        }
    ));
}

#[tokio::test]
async fn test_lookup_empty_results() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .mount(&server)
        .await;

    let client = NominatimGeocodeClient::new(&config_for_mock(&server.uri())).unwrap();
    let err = client.lookup(&main_st()).await.unwrap_err();

    assert!(matches!(err, GeocodingError::NotFound(_)));
}

#[tokio::test]
async fn test_lookup_out_of_region() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(miami_json()))
        .mount(&server)
        .await;

    let client = NominatimGeocodeClient::new(&config_for_mock(&server.uri())).unwrap();
    let err = client.lookup(&main_st()).await.unwrap_err();

    match err {
        GeocodingError::OutOfRegion {
            latitude,
            longitude,
            address,
        } => {
            assert!((latitude - 25.0).abs() < f64::EPSILON);
            assert!((longitude - -80.0).abs() < f64::EPSILON);
            assert_eq!(address, main_st());
        },
        other => unreachable!("expected OutOfRegion, got {other:?}"),
    }
}

#[tokio::test]
async fn test_lookup_malformed_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = NominatimGeocodeClient::new(&config_for_mock(&server.uri())).unwrap();
    let err = client.lookup(&main_st()).await.unwrap_err();

    assert!(matches!(
        err,
        GeocodingError::TransportFailure { status: None, .. }
    ));
}

#[tokio::test]
async fn test_lookup_connection_refused() {
    // Unpooled server, so dropping it actually closes the port
    let server = MockServer::builder().start().await;
    let uri = server.uri();
    drop(server);

    let client = NominatimGeocodeClient::new(&config_for_mock(&uri)).unwrap();
    let err = client.lookup(&main_st()).await.unwrap_err();

    assert!(matches!(
        err,
        GeocodingError::TransportFailure { status: None, .. }
    ));
}

#[tokio::test]
async fn test_geocode_retries_after_throttling() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(colorado_springs_json()))
        .expect(1)
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new());
    let result = geocoder_for_mock(&server.uri(), &clock)
        .geocode(&main_st())
        .await
        .unwrap();

    assert!((result.latitude() - 38.83).abs() < f64::EPSILON);
    assert_eq!(clock.sleeps(), vec![Duration::from_secs(2)]);
}

#[tokio::test]
async fn test_geocode_gives_up_after_three_throttled_attempts() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new());
    let err = geocoder_for_mock(&server.uri(), &clock)
        .geocode_with_retries(&main_st(), 3)
        .await
        .unwrap_err();

    assert!(matches!(err, GeocodingError::RateLimited { .. }));
    assert_eq!(
        clock.sleeps(),
        vec![Duration::from_secs(2), Duration::from_secs(4)]
    );
}

#[tokio::test]
async fn test_geocode_does_not_retry_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(1)
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new());
    let err = geocoder_for_mock(&server.uri(), &clock)
        .geocode(&main_st())
        .await
        .unwrap_err();

    assert!(matches!(err, GeocodingError::NotFound(_)));
    assert!(clock.sleeps().is_empty());
}

#[tokio::test]
async fn test_geocode_or_none_on_out_of_region() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(miami_json()))
        .expect(1)
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new());
    let result = geocoder_for_mock(&server.uri(), &clock)
        .geocode_or_none(&main_st())
        .await;

    assert!(result.is_none());
}

#[tokio::test]
async fn test_geocode_or_none_on_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new());
    let result = geocoder_for_mock(&server.uri(), &clock)
        .geocode_or_none(&main_st())
        .await;

    assert!(result.is_none());
}

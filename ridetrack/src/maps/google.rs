//! Google Maps web service client.
//!
//! # API Endpoints
//!
//! - Autocomplete: `{base}/place/autocomplete/json?input=..&key=..`
//! - Details: `{base}/place/details/json?place_id=..&fields=geometry,formatted_address,name&key=..`
//! - Reverse geocode: `{base}/geocode/json?latlng=lat,lng&key=..`
//! - Distance matrix: `{base}/distancematrix/json?origins=..&destinations=..&mode=driving&traffic_model=best_guess&departure_time=now&key=..`
//! - Directions: `{base}/directions/json?origin=..&destination=..&mode=driving&departure_time=now&key=..`
//!
//! Every response carries a `status` field. `OK` is success and
//! `ZERO_RESULTS` is a normal empty outcome; anything else is a failure whose
//! `error_message` is kept as a diagnostic.

use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use url::Url;

use crate::coord::Coordinate;

use super::config::{MapsClientConfig, MIN_SEARCH_QUERY_LEN};
use super::error::MapsError;
use super::http::{AsyncHttpClient, AsyncReqwestClient};
use super::polyline;
use super::response::{
    AutocompleteResponse, DetailsResponse, DirectionsResponse, DistanceMatrixResponse,
    GeocodeResponse, STATUS_OK, STATUS_ZERO_RESULTS,
};
use super::service::MappingService;
use super::types::{Directions, EtaResult, PlaceDetails, PlacePrediction, ReverseGeocode, RouteQuery};

const DETAILS_FIELDS: &str = "geometry,formatted_address,name";

/// Mapping service backed by the Google Maps web services.
///
/// # Example
///
/// ```no_run
/// use ridetrack::maps::{GoogleMapsClient, MapsClientConfig, MappingService};
///
/// # async fn demo() -> Result<(), ridetrack::maps::MapsError> {
/// let maps = GoogleMapsClient::from_config(MapsClientConfig::with_api_key("KEY"))?;
/// let places = maps.search_places("Lagos").await?;
/// # Ok(())
/// # }
/// ```
pub struct GoogleMapsClient<C: AsyncHttpClient> {
    http_client: C,
    config: MapsClientConfig,
}

impl GoogleMapsClient<AsyncReqwestClient> {
    /// Build a client with a reqwest transport using the config's timeout.
    pub fn from_config(config: MapsClientConfig) -> Result<Self, MapsError> {
        let http_client = AsyncReqwestClient::with_timeout(config.timeout)?;
        Ok(Self::new(http_client, config))
    }
}

impl<C: AsyncHttpClient> GoogleMapsClient<C> {
    pub fn new(http_client: C, config: MapsClientConfig) -> Self {
        Self {
            http_client,
            config,
        }
    }

    pub fn config(&self) -> &MapsClientConfig {
        &self.config
    }

    fn api_key(&self) -> Result<&str, MapsError> {
        if self.config.has_credential() {
            Ok(self.config.api_key.trim())
        } else {
            Err(MapsError::Config("Google Maps API key not configured".to_string()))
        }
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<String, MapsError> {
        let key = self.api_key()?;
        let base = format!("{}/{}", self.config.base_url.trim_end_matches('/'), path);
        let mut url = Url::parse(&base)
            .map_err(|e| MapsError::Config(format!("Invalid maps base URL '{}': {}", base, e)))?;
        url.query_pairs_mut()
            .extend_pairs(params)
            .append_pair("key", key);
        Ok(url.into())
    }

    async fn fetch<T: DeserializeOwned>(&self, url: &str) -> Result<T, MapsError> {
        let body = self.http_client.get(url).await?;
        serde_json::from_slice(&body).map_err(|e| MapsError::InvalidResponse(e.to_string()))
    }
}

fn provider_error(status: String, message: Option<String>, fallback: &str) -> MapsError {
    MapsError::Provider {
        status,
        message: message.unwrap_or_else(|| fallback.to_string()),
    }
}

impl<C: AsyncHttpClient> MappingService for GoogleMapsClient<C> {
    async fn search_places(&self, query: &str) -> Result<Vec<PlacePrediction>, MapsError> {
        let query = query.trim();
        if query.chars().count() < MIN_SEARCH_QUERY_LEN {
            return Ok(Vec::new());
        }

        let url = self.endpoint("place/autocomplete/json", &[("input", query)])?;
        debug!(query = %query, "Searching places");
        let response: AutocompleteResponse = self.fetch(&url).await?;

        match response.status.as_str() {
            STATUS_OK | STATUS_ZERO_RESULTS => Ok(response
                .predictions
                .into_iter()
                .map(|p| {
                    let formatting = p.structured_formatting.unwrap_or_default();
                    PlacePrediction {
                        place_id: p.place_id,
                        description: p.description,
                        main_text: formatting.main_text,
                        secondary_text: formatting.secondary_text,
                    }
                })
                .collect()),
            _ => {
                warn!(status = %response.status, "Place search failed");
                Err(provider_error(
                    response.status,
                    response.error_message,
                    "Failed to search places",
                ))
            }
        }
    }

    async fn get_place_details(&self, place_id: &str) -> Result<PlaceDetails, MapsError> {
        let url = self.endpoint(
            "place/details/json",
            &[("place_id", place_id), ("fields", DETAILS_FIELDS)],
        )?;
        debug!(place_id = %place_id, "Getting place details");
        let response: DetailsResponse = self.fetch(&url).await?;

        if response.status == STATUS_OK {
            if let Some(result) = response.result {
                let location = result.geometry.location;
                let coordinate = Coordinate::new(location.lat, location.lng)
                    .map_err(|e| MapsError::InvalidResponse(e.to_string()))?;
                return Ok(PlaceDetails {
                    coordinate,
                    formatted_address: result.formatted_address,
                    name: result.name,
                });
            }
        }

        match response.status.as_str() {
            STATUS_OK | STATUS_ZERO_RESULTS | "NOT_FOUND" => {
                Err(MapsError::NotFound(format!("place {}", place_id)))
            }
            _ => Err(provider_error(
                response.status,
                response.error_message,
                "Failed to get place details",
            )),
        }
    }

    async fn reverse_geocode(&self, coordinate: Coordinate) -> Result<ReverseGeocode, MapsError> {
        let latlng = coordinate.to_query_param();
        let url = self.endpoint("geocode/json", &[("latlng", latlng.as_str())])?;
        debug!(latlng = %latlng, "Reverse geocoding");
        let response: GeocodeResponse = self.fetch(&url).await?;

        match response.status.as_str() {
            STATUS_OK | STATUS_ZERO_RESULTS => {
                let first = response
                    .results
                    .into_iter()
                    .next()
                    .ok_or_else(|| MapsError::NotFound(format!("no address for {}", latlng)))?;
                let short_address = first
                    .address_components
                    .into_iter()
                    .next()
                    .map(|c| c.long_name)
                    .filter(|name| !name.is_empty())
                    .unwrap_or_else(|| first.formatted_address.clone());
                Ok(ReverseGeocode {
                    formatted_address: first.formatted_address,
                    short_address,
                })
            }
            _ => Err(provider_error(
                response.status,
                response.error_message,
                "Failed to reverse geocode",
            )),
        }
    }

    async fn calculate_eta(&self, query: RouteQuery) -> EtaResult {
        let origins = query.origin.to_query_param();
        let destinations = query.destination.to_query_param();
        let url = match self.endpoint(
            "distancematrix/json",
            &[
                ("origins", origins.as_str()),
                ("destinations", destinations.as_str()),
                ("mode", "driving"),
                ("traffic_model", "best_guess"),
                ("departure_time", "now"),
            ],
        ) {
            Ok(url) => url,
            Err(e) => return EtaResult::failure(e.to_string()),
        };

        let response: DistanceMatrixResponse = match self.fetch(&url).await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "ETA request failed");
                return EtaResult::failure(e.to_string());
            }
        };

        let element = response
            .rows
            .into_iter()
            .next()
            .and_then(|row| row.elements.into_iter().next());

        match element {
            Some(el) if response.status == STATUS_OK && el.status == STATUS_OK => {
                let (Some(distance), Some(duration)) = (el.distance, el.duration) else {
                    return EtaResult::failure("ETA response missing distance or duration");
                };
                info!(
                    origin = %origins,
                    destination = %destinations,
                    distance_m = distance.value,
                    duration_s = duration.value,
                    "ETA calculated"
                );
                EtaResult {
                    distance_meters: distance.value,
                    distance_text: distance.text,
                    duration_seconds: duration.value,
                    duration_text: duration.text,
                    duration_in_traffic_seconds: el.duration_in_traffic.as_ref().map(|d| d.value),
                    duration_in_traffic_text: el.duration_in_traffic.map(|d| d.text),
                    success: true,
                    error: None,
                }
            }
            other => {
                let status = other
                    .map(|el| el.status)
                    .filter(|_| response.status == STATUS_OK)
                    .unwrap_or(response.status);
                warn!(status = %status, "ETA unavailable");
                EtaResult::failure(response.error_message.unwrap_or(status))
            }
        }
    }

    async fn get_directions(&self, query: RouteQuery) -> Result<Directions, MapsError> {
        let origin = query.origin.to_query_param();
        let destination = query.destination.to_query_param();
        let url = self.endpoint(
            "directions/json",
            &[
                ("origin", origin.as_str()),
                ("destination", destination.as_str()),
                ("mode", "driving"),
                ("departure_time", "now"),
            ],
        )?;
        let response: DirectionsResponse = self.fetch(&url).await?;

        match response.status.as_str() {
            STATUS_OK => {
                let route = response.routes.into_iter().next().ok_or_else(|| {
                    MapsError::NotFound(format!("no route {} -> {}", origin, destination))
                })?;
                let points = polyline::decode_strict(&route.overview_polyline.points)
                    .map_err(|e| MapsError::InvalidResponse(e.to_string()))?;

                let mut directions = Directions {
                    polyline: route.overview_polyline.points,
                    points,
                    distance_meters: 0,
                    distance_text: String::new(),
                    duration_seconds: 0,
                    duration_text: String::new(),
                };
                if let Some(leg) = route.legs.into_iter().next() {
                    if let Some(d) = leg.distance {
                        directions.distance_meters = d.value;
                        directions.distance_text = d.text;
                    }
                    if let Some(d) = leg.duration {
                        directions.duration_seconds = d.value;
                        directions.duration_text = d.text;
                    }
                }
                debug!(points = directions.points.len(), "Directions received");
                Ok(directions)
            }
            STATUS_ZERO_RESULTS | "NOT_FOUND" => Err(MapsError::NotFound(format!(
                "no route {} -> {}",
                origin, destination
            ))),
            _ => Err(provider_error(
                response.status,
                response.error_message,
                "Failed to get directions",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maps::http::tests::MockAsyncHttpClient;

    fn client(mock: MockAsyncHttpClient) -> GoogleMapsClient<MockAsyncHttpClient> {
        GoogleMapsClient::new(mock, MapsClientConfig::with_api_key("test-key"))
    }

    fn lagos() -> RouteQuery {
        RouteQuery::new(
            Coordinate::new(6.4541, 3.3947).unwrap(),
            Coordinate::new(6.6018, 3.3515).unwrap(),
        )
    }

    const AUTOCOMPLETE_OK: &str = r#"{
        "status": "OK",
        "predictions": [
            {
                "place_id": "p1",
                "description": "Lagos, Nigeria",
                "structured_formatting": {"main_text": "Lagos", "secondary_text": "Nigeria"}
            },
            {"place_id": "p2", "description": "Lagos, Portugal"}
        ]
    }"#;

    const MATRIX_OK: &str = r#"{
        "status": "OK",
        "rows": [{"elements": [{
            "status": "OK",
            "distance": {"text": "18.2 km", "value": 18200},
            "duration": {"text": "32 mins", "value": 1920},
            "duration_in_traffic": {"text": "45 mins", "value": 2700}
        }]}]
    }"#;

    #[tokio::test]
    async fn test_short_query_skips_network() {
        let mock = MockAsyncHttpClient::new().route("autocomplete", AUTOCOMPLETE_OK);
        let maps = client(mock.clone());

        assert_eq!(maps.search_places("a").await, Ok(Vec::new()));
        assert_eq!(maps.search_places("  b  ").await, Ok(Vec::new()));
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_search_places_maps_predictions_in_order() {
        let mock = MockAsyncHttpClient::new().route("autocomplete", AUTOCOMPLETE_OK);
        let maps = client(mock.clone());

        let predictions = maps.search_places("Lagos").await.unwrap();
        assert_eq!(predictions.len(), 2);
        assert_eq!(predictions[0].place_id, "p1");
        assert_eq!(predictions[0].main_text, "Lagos");
        assert_eq!(predictions[1].secondary_text, "");

        let url = mock.last_request().unwrap();
        assert!(url.starts_with("https://maps.googleapis.com/maps/api/place/autocomplete/json?"));
        assert!(url.contains("input=Lagos"));
        assert!(url.contains("key=test-key"));
    }

    #[tokio::test]
    async fn test_search_zero_results_is_empty_success() {
        let mock = MockAsyncHttpClient::new()
            .route("autocomplete", r#"{"status":"ZERO_RESULTS","predictions":[]}"#);
        assert_eq!(client(mock).search_places("zzzz").await, Ok(Vec::new()));
    }

    #[tokio::test]
    async fn test_search_provider_error_keeps_message() {
        let mock = MockAsyncHttpClient::new().route(
            "autocomplete",
            r#"{"status":"REQUEST_DENIED","error_message":"The provided API key is invalid."}"#,
        );
        let err = client(mock).search_places("Lagos").await.unwrap_err();
        assert_eq!(
            err,
            MapsError::Provider {
                status: "REQUEST_DENIED".into(),
                message: "The provided API key is invalid.".into()
            }
        );
    }

    #[tokio::test]
    async fn test_missing_key_is_config_error() {
        let mock = MockAsyncHttpClient::new().route("", "{}");
        let maps = GoogleMapsClient::new(mock.clone(), MapsClientConfig::default());

        assert!(matches!(maps.search_places("Lagos").await, Err(MapsError::Config(_))));
        assert!(matches!(maps.get_place_details("p1").await, Err(MapsError::Config(_))));
        assert!(!maps.calculate_eta(lagos()).await.success);
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_place_details() {
        let mock = MockAsyncHttpClient::new().route(
            "details",
            r#"{"status":"OK","result":{
                "geometry":{"location":{"lat":6.5244,"lng":3.3792}},
                "formatted_address":"Lagos, Nigeria","name":"Lagos"}}"#,
        );
        let maps = client(mock.clone());

        let details = maps.get_place_details("p1").await.unwrap();
        assert_eq!(details.coordinate, Coordinate::new(6.5244, 3.3792).unwrap());
        assert_eq!(details.name, "Lagos");
        assert!(mock
            .last_request()
            .unwrap()
            .contains("fields=geometry%2Cformatted_address%2Cname"));
    }

    #[tokio::test]
    async fn test_place_details_not_found() {
        let mock = MockAsyncHttpClient::new().route("details", r#"{"status":"NOT_FOUND"}"#);
        assert!(matches!(
            client(mock).get_place_details("gone").await,
            Err(MapsError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_reverse_geocode_short_address() {
        let mock = MockAsyncHttpClient::new().route(
            "geocode",
            r#"{"status":"OK","results":[{
                "formatted_address":"12 Broad St, Lagos Island, Lagos, Nigeria",
                "address_components":[{"long_name":"12"},{"long_name":"Broad Street"}]}]}"#,
        );
        let maps = client(mock.clone());

        let address = maps
            .reverse_geocode(Coordinate::new(6.4541, 3.3947).unwrap())
            .await
            .unwrap();
        assert_eq!(address.short_address, "12");
        assert!(mock.last_request().unwrap().contains("latlng=6.4541%2C3.3947"));
    }

    #[tokio::test]
    async fn test_reverse_geocode_falls_back_to_formatted() {
        let mock = MockAsyncHttpClient::new().route(
            "geocode",
            r#"{"status":"OK","results":[{"formatted_address":"Lagos, Nigeria"}]}"#,
        );
        let address = client(mock)
            .reverse_geocode(Coordinate::new(6.5, 3.4).unwrap())
            .await
            .unwrap();
        assert_eq!(address.short_address, "Lagos, Nigeria");
    }

    #[tokio::test]
    async fn test_reverse_geocode_zero_results_not_found() {
        let mock = MockAsyncHttpClient::new()
            .route("geocode", r#"{"status":"ZERO_RESULTS","results":[]}"#);
        assert!(matches!(
            client(mock).reverse_geocode(Coordinate::new(0.0, 0.0).unwrap()).await,
            Err(MapsError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_calculate_eta_success() {
        let mock = MockAsyncHttpClient::new().route("distancematrix", MATRIX_OK);
        let maps = client(mock.clone());

        let eta = maps.calculate_eta(lagos()).await;
        assert!(eta.success);
        assert_eq!(eta.distance_meters, 18_200);
        assert_eq!(eta.duration_seconds, 1_920);
        assert_eq!(eta.duration_in_traffic_seconds, Some(2_700));
        assert_eq!(eta.duration_in_traffic_text.as_deref(), Some("45 mins"));

        let url = mock.last_request().unwrap();
        assert!(url.contains("traffic_model=best_guess"));
        assert!(url.contains("departure_time=now"));
        assert!(url.contains("mode=driving"));
    }

    #[tokio::test]
    async fn test_calculate_eta_zero_results_is_failure_not_error() {
        let mock = MockAsyncHttpClient::new()
            .route("distancematrix", r#"{"status":"ZERO_RESULTS","rows":[]}"#);
        let eta = client(mock).calculate_eta(lagos()).await;
        assert!(!eta.success);
        assert_eq!(eta.error.as_deref(), Some("ZERO_RESULTS"));
    }

    #[tokio::test]
    async fn test_calculate_eta_element_not_ok() {
        let mock = MockAsyncHttpClient::new().route(
            "distancematrix",
            r#"{"status":"OK","rows":[{"elements":[{"status":"ZERO_RESULTS"}]}]}"#,
        );
        let eta = client(mock).calculate_eta(lagos()).await;
        assert!(!eta.success);
        assert_eq!(eta.error.as_deref(), Some("ZERO_RESULTS"));
    }

    #[tokio::test]
    async fn test_calculate_eta_network_failure() {
        let mock = MockAsyncHttpClient::new()
            .fail("distancematrix", MapsError::Network("connection reset".into()));
        let eta = client(mock).calculate_eta(lagos()).await;
        assert!(!eta.success);
        assert!(eta.error.unwrap().contains("connection reset"));
    }

    #[tokio::test]
    async fn test_calculate_eta_garbage_body() {
        let mock = MockAsyncHttpClient::new().route("distancematrix", "<html>");
        assert!(!client(mock).calculate_eta(lagos()).await.success);
    }

    #[tokio::test]
    async fn test_get_directions_decodes_polyline() {
        let mock = MockAsyncHttpClient::new().route(
            "directions",
            r#"{"status":"OK","routes":[{
                "overview_polyline":{"points":"_p~iF~ps|U_ulLnnqC_mqNvxq`@"},
                "legs":[{"distance":{"text":"500 km","value":500000},
                         "duration":{"text":"5 hours","value":18000}}]}]}"#,
        );
        let directions = client(mock).get_directions(lagos()).await.unwrap();
        assert_eq!(directions.points.len(), 3);
        assert_eq!(directions.distance_meters, 500_000);
        assert_eq!(directions.duration_text, "5 hours");
    }

    #[tokio::test]
    async fn test_get_directions_zero_results() {
        let mock = MockAsyncHttpClient::new()
            .route("directions", r#"{"status":"ZERO_RESULTS","routes":[]}"#);
        assert!(matches!(
            client(mock).get_directions(lagos()).await,
            Err(MapsError::NotFound(_))
        ));
    }

    #[test]
    fn test_custom_base_url() {
        let config = MapsClientConfig {
            base_url: "http://localhost:8080/maps/".into(),
            ..MapsClientConfig::with_api_key("k")
        };
        let maps = GoogleMapsClient::new(MockAsyncHttpClient::new(), config);
        let url = maps.endpoint("geocode/json", &[("latlng", "1,2")]).unwrap();
        assert_eq!(url, "http://localhost:8080/maps/geocode/json?latlng=1%2C2&key=k");
    }
}

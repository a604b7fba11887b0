//! Mapping service client.
//!
//! Stateless wrappers around the place autocomplete, place details, reverse
//! geocoding, distance matrix and directions web services, plus the pure
//! [`polyline`] codec.
//!
//! [`MappingService`] is the seam the session orchestrator depends on;
//! [`GoogleMapsClient`] implements it over an [`AsyncHttpClient`].

mod config;
mod error;
mod google;
mod http;
pub mod polyline;
mod response;
mod service;
mod types;

pub use config::{
    is_usable_api_key, MapsClientConfig, DEFAULT_MAPS_BASE_URL, DEFAULT_MAPS_TIMEOUT,
    MIN_SEARCH_QUERY_LEN, PLACEHOLDER_API_KEY,
};
pub use error::MapsError;
pub use google::GoogleMapsClient;
pub use http::{AsyncHttpClient, AsyncReqwestClient};
pub use polyline::PolylineError;
pub use service::MappingService;
pub use types::{
    Directions, EtaResult, PlaceDetails, PlacePrediction, ReverseGeocode, RouteQuery,
    TrafficLevel, HEAVY_TRAFFIC_DELAY_SECS, LIGHT_TRAFFIC_DELAY_SECS,
};

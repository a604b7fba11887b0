//! The mapping service seam used by the session orchestrator.

use std::future::Future;

use crate::coord::Coordinate;

use super::error::MapsError;
use super::polyline;
use super::types::{Directions, EtaResult, PlaceDetails, PlacePrediction, ReverseGeocode, RouteQuery};

/// Place search, geocoding and routing operations.
///
/// Every operation is idempotent and independent of the others.
pub trait MappingService: Send + Sync + 'static {
    /// Autocomplete suggestions for free text, in provider order.
    ///
    /// Queries shorter than two characters (after trimming) succeed with no
    /// predictions and perform no request. No matches is an empty success.
    fn search_places(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<PlacePrediction>, MapsError>> + Send;

    /// Resolve a place id from a prediction.
    fn get_place_details(
        &self,
        place_id: &str,
    ) -> impl Future<Output = Result<PlaceDetails, MapsError>> + Send;

    /// Address of a coordinate.
    fn reverse_geocode(
        &self,
        coordinate: Coordinate,
    ) -> impl Future<Output = Result<ReverseGeocode, MapsError>> + Send;

    /// Traffic-aware driving ETA. Never fails; check `success`.
    fn calculate_eta(&self, query: RouteQuery) -> impl Future<Output = EtaResult> + Send;

    /// Driving directions with the decoded overview polyline.
    fn get_directions(
        &self,
        query: RouteQuery,
    ) -> impl Future<Output = Result<Directions, MapsError>> + Send;

    /// Decode an encoded polyline. Pure; performs no I/O.
    fn decode_polyline(&self, encoded: &str) -> Vec<Coordinate> {
        polyline::decode(encoded)
    }
}

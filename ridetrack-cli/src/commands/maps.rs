//! One-shot mapping queries.

use ridetrack::coord::Coordinate;
use ridetrack::maps::{polyline, MappingService, RouteQuery};

use super::common::format_eta;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Search places and print one prediction per line.
pub fn run_search(query: &str, debug: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(debug, false)?;
    runner.log_startup("search");
    let client = runner.maps_client()?;

    let predictions = runner.runtime()?.block_on(client.search_places(query))?;
    if predictions.is_empty() {
        println!("No places found for '{}'", query);
        return Ok(());
    }
    for p in predictions {
        println!("{}  {}", p.place_id, p.description);
    }
    Ok(())
}

/// Print a place's coordinate and address.
pub fn run_place(place_id: &str, debug: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(debug, false)?;
    runner.log_startup("place");
    let client = runner.maps_client()?;

    let place = runner.runtime()?.block_on(client.get_place_details(place_id))?;
    println!("{}", place.name);
    println!("  Address:    {}", place.formatted_address);
    println!("  Coordinate: {}", place.coordinate);
    Ok(())
}

/// Print the address at a coordinate.
pub fn run_geocode(coordinate: Coordinate, debug: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(debug, false)?;
    runner.log_startup("geocode");
    let client = runner.maps_client()?;

    let geocode = runner.runtime()?.block_on(client.reverse_geocode(coordinate))?;
    println!("{}", geocode.formatted_address);
    println!("  Short: {}", geocode.short_address);
    Ok(())
}

/// Print a traffic-aware ETA.
pub fn run_eta(from: Coordinate, to: Coordinate, debug: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(debug, false)?;
    runner.log_startup("eta");
    let client = runner.maps_client()?;

    let eta = runner
        .runtime()?
        .block_on(client.calculate_eta(RouteQuery::new(from, to)));
    println!("{}", format_eta(&eta));
    if eta.success {
        println!("  Distance: {} m", eta.distance_meters);
        println!("  Duration: {} s", eta.duration_seconds);
        if let Some(in_traffic) = eta.duration_in_traffic_seconds {
            println!("  In traffic: {} s", in_traffic);
        }
    }
    Ok(())
}

/// Print a driving route summary.
pub fn run_route(from: Coordinate, to: Coordinate, points: bool, debug: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(debug, false)?;
    runner.log_startup("route");
    let client = runner.maps_client()?;

    let route = runner
        .runtime()?
        .block_on(client.get_directions(RouteQuery::new(from, to)))?;
    println!("{} / {}", route.duration_text, route.distance_text);
    println!("  Points:   {}", route.points.len());
    println!("  Polyline: {}", route.polyline);
    if points {
        for p in &route.points {
            println!("{}", p);
        }
    }
    Ok(())
}

/// Decode a polyline without contacting any service.
pub fn run_decode(encoded: &str) -> Result<(), CliError> {
    let points = polyline::decode_strict(encoded.trim())?;
    for p in &points {
        println!("{}", p);
    }
    eprintln!("{} points", points.len());
    Ok(())
}

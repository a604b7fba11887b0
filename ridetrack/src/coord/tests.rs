//! Tests for coordinates and distances

use super::*;

#[test]
fn test_new_accepts_bounds() {
    assert!(Coordinate::new(90.0, 180.0).is_ok());
    assert!(Coordinate::new(-90.0, -180.0).is_ok());
    assert!(Coordinate::new(6.5244, 3.3792).is_ok());
}

#[test]
fn test_new_rejects_out_of_range() {
    assert_eq!(
        Coordinate::new(90.5, 0.0),
        Err(CoordError::InvalidLatitude(90.5))
    );
    assert_eq!(
        Coordinate::new(0.0, -180.1),
        Err(CoordError::InvalidLongitude(-180.1))
    );
}

#[test]
fn test_parse_lat_lng_pair() {
    let c: Coordinate = "6.5244, 3.3792".parse().unwrap();
    assert_eq!(c.latitude, 6.5244);
    assert_eq!(c.longitude, 3.3792);
}

#[test]
fn test_parse_rejects_garbage() {
    assert!(matches!(
        "lagos".parse::<Coordinate>(),
        Err(CoordError::Malformed(_))
    ));
    assert!(matches!(
        "6.5,abc".parse::<Coordinate>(),
        Err(CoordError::Malformed(_))
    ));
    assert!(matches!(
        "95.0,3.0".parse::<Coordinate>(),
        Err(CoordError::InvalidLatitude(_))
    ));
}

#[test]
fn test_query_param_format() {
    let c = Coordinate::new(6.5244, 3.3792).unwrap();
    assert_eq!(c.to_query_param(), "6.5244,3.3792");
}

#[test]
fn test_haversine_zero_distance() {
    let c = Coordinate::new(6.5244, 3.3792).unwrap();
    assert!(haversine_km(&c, &c).abs() < 1e-9);
}

#[test]
fn test_haversine_lagos_island_to_ikeja() {
    // Lagos Island to Ikeja is roughly 9 km as the crow flies
    let island = Coordinate::new(6.5244, 3.3792).unwrap();
    let ikeja = Coordinate::new(6.6018, 3.3515).unwrap();
    let km = haversine_km(&island, &ikeja);
    assert!((8.5..9.5).contains(&km), "got {} km", km);
}

#[test]
fn test_haversine_is_symmetric() {
    let a = Coordinate::new(51.5074, -0.1278).unwrap();
    let b = Coordinate::new(48.8566, 2.3522).unwrap();
    assert!((haversine_km(&a, &b) - haversine_km(&b, &a)).abs() < 1e-9);
    // London to Paris ~344 km
    assert!((340.0..350.0).contains(&haversine_km(&a, &b)));
}

#[test]
fn test_distance_m_scales_km() {
    let a = Coordinate::new(0.0, 0.0).unwrap();
    let b = Coordinate::new(0.0, 0.001).unwrap();
    let m = distance_m(&a, &b);
    // 0.001 degrees of longitude at the equator is ~111 m
    assert!((110.0..112.5).contains(&m), "got {} m", m);
}

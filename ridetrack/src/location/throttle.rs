//! Time/distance throttle for raw location readings.

use std::time::Duration;

use tokio::time::Instant;

use crate::coord::distance_m;

use super::fix::LocationFix;

/// Decides which raw readings reach subscribers.
///
/// A reading is emitted when it is the first one, when it lies further than
/// `min_distance_m` from the last emitted fix, or when `interval` has passed
/// since the last emission. Anything else is held as pending and released by
/// [`FixThrottle::flush`] once the interval elapses, so a stationary device
/// still reports at the configured cadence.
#[derive(Debug)]
pub struct FixThrottle {
    interval: Duration,
    min_distance_m: f64,
    last_emitted: Option<(LocationFix, Instant)>,
    pending: Option<LocationFix>,
}

impl FixThrottle {
    pub fn new(interval: Duration, min_distance_m: f64) -> Self {
        Self {
            interval,
            min_distance_m,
            last_emitted: None,
            pending: None,
        }
    }

    /// Offer a raw reading. Returns the fix to emit, if any.
    pub fn offer(&mut self, fix: LocationFix, now: Instant) -> Option<LocationFix> {
        let emit = match &self.last_emitted {
            None => true,
            Some((last, at)) => {
                distance_m(&last.coordinate(), &fix.coordinate()) > self.min_distance_m
                    || now.duration_since(*at) >= self.interval
            }
        };

        if emit {
            self.pending = None;
            self.last_emitted = Some((fix.clone(), now));
            Some(fix)
        } else {
            self.pending = Some(fix);
            None
        }
    }

    /// Release the pending reading if the interval has elapsed.
    pub fn flush(&mut self, now: Instant) -> Option<LocationFix> {
        let due = self.next_deadline().is_some_and(|deadline| now >= deadline);
        if !due {
            return None;
        }
        let fix = self.pending.take()?;
        self.last_emitted = Some((fix.clone(), now));
        Some(fix)
    }

    /// When the pending reading becomes due, if one is held.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (&self.pending, &self.last_emitted) {
            (Some(_), Some((_, at))) => Some(*at + self.interval),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix(lat: f64, lng: f64) -> LocationFix {
        LocationFix::new(lat, lng, 0).unwrap()
    }

    #[test]
    fn test_first_reading_is_emitted() {
        let mut throttle = FixThrottle::new(Duration::from_secs(7), 10.0);
        assert!(throttle.offer(fix(6.5, 3.4), Instant::now()).is_some());
    }

    #[test]
    fn test_close_reading_is_held_until_interval() {
        let start = Instant::now();
        let mut throttle = FixThrottle::new(Duration::from_secs(7), 10.0);
        throttle.offer(fix(6.5, 3.4), start);

        // ~1 m north
        let near = fix(6.50001, 3.4);
        assert!(throttle.offer(near.clone(), start + Duration::from_secs(1)).is_none());
        assert_eq!(throttle.next_deadline(), Some(start + Duration::from_secs(7)));
        assert!(throttle.flush(start + Duration::from_secs(3)).is_none());
        assert_eq!(throttle.flush(start + Duration::from_secs(7)), Some(near));
        assert_eq!(throttle.next_deadline(), None);
    }

    #[test]
    fn test_far_reading_bypasses_interval() {
        let start = Instant::now();
        let mut throttle = FixThrottle::new(Duration::from_secs(7), 10.0);
        throttle.offer(fix(6.5, 3.4), start);

        // ~111 m north
        let far = fix(6.501, 3.4);
        assert_eq!(throttle.offer(far.clone(), start + Duration::from_millis(500)), Some(far));
    }

    #[test]
    fn test_interval_elapsed_on_offer() {
        let start = Instant::now();
        let mut throttle = FixThrottle::new(Duration::from_secs(7), 10.0);
        throttle.offer(fix(6.5, 3.4), start);
        assert!(throttle
            .offer(fix(6.5, 3.4), start + Duration::from_secs(8))
            .is_some());
    }

    #[test]
    fn test_pending_replaced_by_newer() {
        let start = Instant::now();
        let mut throttle = FixThrottle::new(Duration::from_secs(7), 10.0);
        throttle.offer(fix(6.5, 3.4), start);
        throttle.offer(fix(6.50001, 3.4), start + Duration::from_secs(1));
        let newer = fix(6.50002, 3.4);
        throttle.offer(newer.clone(), start + Duration::from_secs(2));
        assert_eq!(throttle.flush(start + Duration::from_secs(7)), Some(newer));
    }
}

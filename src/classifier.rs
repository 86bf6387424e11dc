//! Flight phase classification
//!
//!  Turns one raw observation into a `ClassifiedFlight` by finding the nearest
//!  airport of the registry and looking at the vertical rate:
//!
//!  - no valid position           -> Unknown
//!  - nearest airport beyond radius -> EnRoute
//!  - inside radius, descending   -> Arriving
//!  - inside radius, climbing     -> Departing
//!  - inside radius, level or no vertical rate -> EnRoute
//!
//!  The radius boundary is inclusive. Classification is a pure function of its
//!  inputs and never fails.

use crate::airport::{AirportRef, AirportRegistry};
use crate::flight::{ClassifiedFlight, Phase, Position, RawSample};
use crate::geodesy;

/// Classify one sample against the registry
pub fn classify(sample: &RawSample, airports: &AirportRegistry) -> ClassifiedFlight {
    let Some(pos) = sample.position() else {
        return ClassifiedFlight {
            sample: sample.clone(),
            nearest: None,
            distance_km: None,
            phase: Phase::Unknown,
        };
    };

    let nearest = nearest_airport(pos, airports);
    let phase = match nearest {
        Some((ap, dist)) if dist <= ap.radius_km => phase_from_vertical_rate(sample.vertical_rate),
        _ => Phase::EnRoute,
    };

    ClassifiedFlight {
        sample: sample.clone(),
        nearest: nearest.map(|(ap, _)| ap.clone()),
        distance_km: nearest.map(|(_, d)| d),
        phase,
    }
}

/// Nearest airport and its distance in km. First registered airport wins ties.
pub fn nearest_airport(pos: Position, airports: &AirportRegistry) -> Option<(&AirportRef, f64)> {
    let mut best: Option<(&AirportRef, f64)> = None;
    for ap in airports.iter() {
        let d = geodesy::distance_km(pos.lat, pos.lon, ap.lat, ap.lon);
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((ap, d)),
        }
    }
    best
}

fn phase_from_vertical_rate(vertical_rate: Option<f64>) -> Phase {
    match vertical_rate {
        Some(v) if v < 0.0 => Phase::Arriving,
        Some(v) if v > 0.0 => Phase::Departing,
        _ => Phase::EnRoute,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KM_PER_DEGREE: f64 = geodesy::EARTH_RADIUS_KM * std::f64::consts::PI / 180.0;

    fn sample_at(lat: f64, lon: f64, vertical_rate: Option<f64>) -> RawSample {
        RawSample {
            latitude: Some(lat),
            longitude: Some(lon),
            vertical_rate,
            ..RawSample::new("4ca7b5")
        }
    }

    fn origin_registry(radius_km: f64) -> AirportRegistry {
        AirportRegistry::new(vec![AirportRef::new("ORG", "Origin Field", 0.0, 0.0, radius_km)])
    }

    #[test]
    fn test_missing_position_is_unknown() {
        let mut s = RawSample::new("4ca7b5");
        s.latitude = Some(42.6);
        s.vertical_rate = Some(-5.0);
        let cf = classify(&s, &AirportRegistry::builtin());
        assert_eq!(cf.phase, Phase::Unknown);
        assert!(cf.nearest.is_none());
        assert!(cf.distance_km.is_none());
    }

    #[test]
    fn test_arriving_near_pristina() {
        let cf = classify(&sample_at(42.60, 21.00, Some(-5.0)), &AirportRegistry::builtin());
        assert_eq!(cf.phase, Phase::Arriving);
        assert_eq!(cf.nearest.as_ref().map(|a| a.code.as_str()), Some("PRN"));
        assert!(cf.distance_km.unwrap() < 5.0);
    }

    #[test]
    fn test_vertical_rate_inside_radius() {
        let reg = origin_registry(50.0);
        assert_eq!(classify(&sample_at(0.1, 0.0, Some(3.0)), &reg).phase, Phase::Departing);
        assert_eq!(classify(&sample_at(0.1, 0.0, Some(0.0)), &reg).phase, Phase::EnRoute);
        assert_eq!(classify(&sample_at(0.1, 0.0, None), &reg).phase, Phase::EnRoute);
    }

    #[test]
    fn test_outside_radius_still_reports_nearest() {
        let cf = classify(&sample_at(2.0, 0.0, Some(-5.0)), &origin_registry(50.0));
        assert_eq!(cf.phase, Phase::EnRoute);
        assert_eq!(cf.nearest.as_ref().map(|a| a.code.as_str()), Some("ORG"));
        assert!(cf.distance_km.unwrap() > 200.0);
        assert!(cf.airport_in_range().is_none());
    }

    #[test]
    fn test_radius_boundary_both_sides() {
        let reg = origin_registry(50.0);
        let inside = sample_at(49.999 / KM_PER_DEGREE, 0.0, Some(-1.0));
        let outside = sample_at(50.001 / KM_PER_DEGREE, 0.0, Some(-1.0));
        assert_eq!(classify(&inside, &reg).phase, Phase::Arriving);
        assert_eq!(classify(&outside, &reg).phase, Phase::EnRoute);
    }

    #[test]
    fn test_radius_boundary_is_inclusive() {
        let lat = 0.4;
        let exact = geodesy::distance_km(lat, 0.0, 0.0, 0.0);
        let reg = origin_registry(exact);
        assert_eq!(classify(&sample_at(lat, 0.0, Some(-1.0)), &reg).phase, Phase::Arriving);
    }

    #[test]
    fn test_tie_goes_to_first_registered() {
        let reg = AirportRegistry::new(vec![
            AirportRef::new("NTH", "North", 1.0, 0.0, 200.0),
            AirportRef::new("STH", "South", -1.0, 0.0, 200.0),
        ]);
        let cf = classify(&sample_at(0.0, 0.0, Some(-2.0)), &reg);
        assert_eq!(cf.nearest.as_ref().map(|a| a.code.as_str()), Some("NTH"));
    }

    #[test]
    fn test_classification_is_idempotent() {
        let reg = AirportRegistry::builtin();
        let s = sample_at(41.5, 19.8, Some(7.5));
        assert_eq!(classify(&s, &reg), classify(&s, &reg));
    }

    #[test]
    fn test_empty_registry_is_en_route() {
        let cf = classify(&sample_at(41.5, 19.8, Some(-3.0)), &AirportRegistry::default());
        assert_eq!(cf.phase, Phase::EnRoute);
        assert!(cf.nearest.is_none());
    }
}

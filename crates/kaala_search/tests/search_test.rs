//! Integration tests for event search on the mean-motion ephemeris.
//!
//! Every body moves linearly, so each expected instant has a closed form.

use chrono::{DateTime, TimeDelta, Utc};
use proptest::prelude::*;

use kaala_search::{
    ALL_ASPECTS, AngularRootFinder, Aspect, Body, BodyLongitude, EphemerisConfig, EphemerisPort,
    IngressConfig, MeanMotionEphemeris, NatalPoint, RootFindProblem, SearchError,
    SolarReturnConfig, TransitConfig, exact_solar_return, find_ingresses, find_transit_aspects,
    j2000, normalize_to_pm180, solar_return_for_year,
};

fn after_days(days: f64) -> DateTime<Utc> {
    j2000() + TimeDelta::microseconds((days * 86_400_000_000.0).round() as i64)
}

fn assert_near(actual: DateTime<Utc>, expected: DateTime<Utc>, max_seconds: i64) {
    let diff = (actual - expected).num_seconds().abs();
    assert!(
        diff <= max_seconds,
        "{actual} is {diff}s from {expected} (allowed {max_seconds}s)"
    );
}

#[test]
fn moon_conjunction_at_analytic_instant() {
    let eph = MeanMotionEphemeris::default();
    let points = [NatalPoint::new("Sun", 150.0)];
    let events = find_transit_aspects(
        &eph,
        &points,
        &[Body::Moon],
        &[Aspect::Conjunction],
        j2000(),
        after_days(30.0),
        &TransitConfig::default(),
    )
    .unwrap();
    assert_eq!(events.len(), 1);
    let ev = &events[0];
    assert_eq!(ev.mover, Body::Moon);
    assert_eq!(ev.target, "Sun");
    assert_eq!(ev.aspect, Aspect::Conjunction);
    assert_near(ev.instant, after_days(50.0 / 13.176_358), 60);
    assert!(ev.residual_deg < 0.01);
}

#[test]
fn trine_found_on_both_sides_in_order() {
    let eph = MeanMotionEphemeris::default();
    let points = [NatalPoint::new("Lagna", 0.0)];
    let events = find_transit_aspects(
        &eph,
        &points,
        &[Body::Moon],
        &[Aspect::Trine],
        j2000(),
        after_days(20.0),
        &TransitConfig::default(),
    )
    .unwrap();
    assert_eq!(events.len(), 2);
    assert_near(events[0].instant, after_days(20.0 / 13.176_358), 60);
    assert!((events[0].separation_deg - 120.0).abs() < 1e-9);
    assert_near(events[1].instant, after_days(140.0 / 13.176_358), 60);
    assert!((events[1].separation_deg - 240.0).abs() < 1e-9);
}

#[test]
fn transits_are_chronological_across_movers() {
    let eph = MeanMotionEphemeris::default();
    let points = [NatalPoint::new("Moon", 200.0), NatalPoint::new("Lagna", 10.0)];
    let events = find_transit_aspects(
        &eph,
        &points,
        &[Body::Moon, Body::Sun, Body::Mars],
        &ALL_ASPECTS,
        j2000(),
        after_days(60.0),
        &TransitConfig::default(),
    )
    .unwrap();
    assert!(!events.is_empty());
    for w in events.windows(2) {
        assert!(w[0].instant <= w[1].instant);
    }
}

#[test]
fn sun_enters_leo() {
    let eph = MeanMotionEphemeris::default();
    let events = find_ingresses(
        &eph,
        &[Body::Sun],
        j2000(),
        after_days(30.0),
        &IngressConfig::default(),
    )
    .unwrap();
    assert_eq!(events.len(), 1);
    let ev = &events[0];
    assert_eq!(ev.sign, "Leo");
    assert_eq!(ev.from_sign, "Cancer");
    assert_eq!(ev.sign_index, 4);
    assert!(!ev.retrograde);
    assert_near(ev.instant, after_days(20.0 / 0.985_647), 30);
}

#[test]
fn rahu_ingress_is_retrograde() {
    let eph = MeanMotionEphemeris::default();
    let cfg = IngressConfig {
        step_minutes: 720.0,
        ..IngressConfig::default()
    };
    let events = find_ingresses(&eph, &[Body::Rahu], j2000(), after_days(400.0), &cfg).unwrap();
    assert_eq!(events.len(), 1);
    let ev = &events[0];
    assert!(ev.retrograde);
    assert_eq!(ev.from_sign, "Libra");
    assert_eq!(ev.sign, "Virgo");
    assert_near(ev.instant, after_days(20.0 / 0.052_953_9), 30);
}

#[test]
fn invalid_transit_config_rejected() {
    let eph = MeanMotionEphemeris::default();
    let cfg = TransitConfig {
        step_minutes: 0.0,
        ..TransitConfig::default()
    };
    let err = find_transit_aspects(
        &eph,
        &[NatalPoint::new("Sun", 10.0)],
        &[Body::Moon],
        &[Aspect::Square],
        j2000(),
        after_days(1.0),
        &cfg,
    )
    .unwrap_err();
    assert!(matches!(err, SearchError::InvalidConfig(_)));
}

#[test]
fn ayanamsha_shifts_solar_return_target_not_instant() {
    // A constant offset moves both natal and return longitudes equally.
    let tropical = MeanMotionEphemeris::default();
    let sidereal = MeanMotionEphemeris::new(EphemerisConfig {
        ayanamsha: 23.85,
        ..EphemerisConfig::default()
    });
    let birth = after_days(-5000.0);
    let year = 2012;
    let cfg = SolarReturnConfig::default();
    let a = solar_return_for_year(&tropical, birth, year, &cfg).unwrap();
    let b = solar_return_for_year(&sidereal, birth, year, &cfg).unwrap();
    assert_near(a.instant, b.instant, 2);
}

struct FailingEphemeris;

impl EphemerisPort for FailingEphemeris {
    fn longitude_of(&self, body: Body, _: DateTime<Utc>) -> Result<BodyLongitude, SearchError> {
        Err(SearchError::Ephemeris(format!("{body} unavailable")))
    }
}

#[test]
fn ephemeris_errors_propagate() {
    let cfg = SolarReturnConfig::default();
    let err = exact_solar_return(&FailingEphemeris, 10.0, j2000(), &cfg).unwrap_err();
    assert_eq!(err, SearchError::Ephemeris("Sun unavailable".into()));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn linear_root_anywhere_in_window(root_hours in 0.5f64..47.5, slope in 0.1f64..3.5) {
        let problem = RootFindProblem::new(j2000(), after_days(2.0), TimeDelta::hours(1));
        let finder = AngularRootFinder::new(problem).unwrap();
        let root = finder
            .find_root(|t| {
                let h = (t - j2000()).num_milliseconds() as f64 / 3_600_000.0;
                Ok(normalize_to_pm180(slope * (h - root_hours)))
            })
            .unwrap();
        let expected = after_days(root_hours / 24.0);
        prop_assert!((root.instant - expected).num_milliseconds().abs() <= 1000);
    }

    #[test]
    fn solar_return_from_nearby_guess(
        natal in 0.0f64..360.0,
        cycles in 1u32..60,
        offset_days in -1.2f64..1.2,
        bisection in any::<bool>(),
    ) {
        let eph = MeanMotionEphemeris::default();
        let year_days = 360.0 / 0.985_647;
        let first = (natal - 100.0).rem_euclid(360.0) / 0.985_647;
        let expected = after_days(first + f64::from(cycles) * year_days);
        let approx = expected + TimeDelta::seconds((offset_days * 86_400.0) as i64);
        let cfg = if bisection {
            SolarReturnConfig::bisection()
        } else {
            SolarReturnConfig::default()
        };
        let sr = exact_solar_return(&eph, natal, approx, &cfg).unwrap();
        prop_assert!((sr.instant - expected).num_seconds().abs() <= 60);
        prop_assert!(sr.residual_deg.abs() < 1e-3);
    }
}

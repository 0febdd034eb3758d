mod common;

use common::*;
use nalgebra::Vector3;
use satvis::constants::JulianDay;
use satvis::ephemeris::flare::mirror_normals;
use satvis::ephemeris::{earth_rotation_angle, observe_with, EphemerisConfig};
use satvis::observers::Observer;
use satvis::propagator::Propagator;
use satvis::sun_moon::{sun_position, umbra_depth};
use satvis::tracker::Tracker;
use satvis::{next_flares, next_pass, rise_set_transit, SearchParams};

fn madrid() -> Observer {
    Observer::new(-3.7, 40.4, 0.65, Some("Madrid".into())).unwrap()
}

#[test]
fn test_no_pass_from_high_latitude() {
    let mut prop = Propagator::new(&equatorial_leo()).unwrap();
    let site = Observer::new(25.0, 70.0, 0.1, None).unwrap();
    let from = prop.epoch_jd();

    let res = next_pass(
        &mut prop,
        &site,
        &EphemerisConfig::default(),
        &SearchParams::default(),
        from,
        10.0,
        3.0,
        false,
    )
    .unwrap();
    assert_eq!(res, 0.0);
}

#[test]
fn test_next_pass_inside_window() {
    let mut prop = Propagator::new(&iridium_like()).unwrap();
    let site = madrid();
    let config = EphemerisConfig::default();
    let params = SearchParams::default();

    let mut from = prop.epoch_jd();
    for _ in 0..4 {
        let res = next_pass(&mut prop, &site, &config, &params, from, 10.0, 1.0, false).unwrap();
        assert!(res != 0.0, "a polar orbit passes over Madrid every day");

        let jd = res.abs();
        assert!(jd >= from && jd <= from + 1.0);

        let eph = observe_with(&mut prop, jd, &site, &config);
        assert!(eph.is_above(10.0));
        assert_eq!(res < 0.0, eph.eclipsed);

        // skip past this pass
        from = jd + 0.02;
    }
}

#[test]
fn test_rise_set_transit_bounds() {
    let mut prop = Propagator::new(&iridium_like()).unwrap();
    let site = madrid();
    let config = EphemerisConfig::default();
    let params = SearchParams::default();
    let from = prop.epoch_jd();

    let start = next_pass(&mut prop, &site, &config, &params, from, 20.0, 1.0, false)
        .unwrap()
        .abs();
    let eph = observe_with(&mut prop, start, &site, &config);
    let rst = rise_set_transit(&mut prop, &eph, &site, &config, params.horizon_refraction).unwrap();

    assert!(rst.rise > 0.0 && rst.set > 0.0);
    assert!(rst.rise <= rst.transit && rst.transit <= rst.set);
    assert!(rst.rise < start && start < rst.set);
    assert!(rst.transit_elevation >= 20.0);

    for jd in [rst.rise, rst.set] {
        let at = observe_with(&mut prop, jd, &site, &config);
        assert!(at.elevation <= rst.transit_elevation);
        assert!(at.geometric_elevation() < 1.0);
    }
    // one second outside the pass the satellite is below the depressed horizon
    let outside = observe_with(&mut prop, rst.set + 1.0 / 86_400.0, &site, &config);
    assert!(outside.geometric_elevation() < -params.horizon_refraction);
}

/// A sunlit instant and a ground point hit by the reflection of the Sun on the first
/// mirror, seen at a steep elevation.
fn specular_point(prop: &mut Propagator) -> (JulianDay, Observer) {
    let epoch = prop.epoch_jd();
    for minute in 0..4320 {
        let jd = epoch + minute as f64 / 1440.0;
        let state = prop.propagate_jd(jd);
        let (r, v) = (state.position, state.velocity);
        let sun = sun_position(jd);
        if umbra_depth(&r, &sun) > -0.02 {
            continue;
        }

        let n0 = mirror_normals(&r, &v)[0];
        let d = (sun - r).normalize();
        let dn = d.dot(&n0);
        if dn <= 0.0 {
            continue;
        }
        let ray = 2.0 * dn * n0 - d;

        let b = r.dot(&ray);
        let disc = b * b - (r.norm_squared() - 6371.0 * 6371.0);
        if b >= 0.0 || disc < 0.0 {
            continue;
        }
        let p = r + (-b - disc.sqrt()) * ray;
        if (-ray.dot(&p.normalize())).asin().to_degrees() < 20.0 {
            continue;
        }

        let (s, c) = earth_rotation_angle(jd).sin_cos();
        let body_fixed = Vector3::new(c * p.x + s * p.y, -s * p.x + c * p.y, p.z);
        return (jd, Observer::from_body_fixed(&body_fixed, None).unwrap());
    }
    panic!("no specular geometry in three days");
}

#[test]
fn test_flare_found_at_specular_geometry() {
    let mut prop = Propagator::new(&iridium_like()).unwrap();
    let config = EphemerisConfig::default();
    let (jd, site) = specular_point(&mut prop);

    let eph = observe_with(&mut prop, jd, &site, &config);
    let flare = eph.flare.as_ref().unwrap();
    assert!(flare.sun_angle.unwrap() < 0.05);
    assert_eq!(flare.mirror, Some(0));
    assert!(!eph.eclipsed);

    let events = next_flares(
        &mut prop,
        &site,
        &config,
        &SearchParams::default(),
        jd - 0.02,
        0.0,
        1.0,
        1,
    )
    .unwrap();

    let near: Vec<_> = events
        .iter()
        .filter(|e| (e.peak - jd).abs() * 86_400.0 < 60.0)
        .collect();
    assert_eq!(near.len(), 1, "events: {events:?}");
    let event = near[0];
    assert!(event.peak_angle < 1.0);
    assert!(event.start <= event.peak && event.peak <= event.end);
    assert!(event.start <= jd && jd <= event.end);
    assert_eq!(event.mirror, 0);
}

#[test]
fn test_tracker_end_to_end() {
    let mut tracker = Tracker::with_defaults(madrid());
    let iridium = tracker.add_satellite(&iridium_like()).unwrap();
    let molniya = tracker.add_satellite(&molniya()).unwrap();
    assert_eq!(
        tracker.names().collect::<Vec<_>>(),
        vec!["IRIDIUM-like", "MOLNIYA-like"]
    );

    let from = tracker.satellite(iridium).unwrap().epoch_jd();
    let start = tracker.next_pass(iridium, from, 10.0, 1.0, false).unwrap();
    assert!(start != 0.0);

    let eph = tracker
        .observe_with_events(iridium, start.abs(), 10.0, 1.0)
        .unwrap();
    assert!(eph.elevation >= 10.0);
    let rst = eph.rise_set.unwrap();
    assert!(rst.rise <= eph.jd && eph.jd <= rst.set);
    let following = eph.next_pass.unwrap();
    assert!(following == 0.0 || following.abs() > rst.set);

    // the deep-space satellite goes through the same queries
    let eph = tracker.observe(molniya, from).unwrap();
    assert!(eph.range > 0.0);
    assert!(tracker
        .next_flares(molniya, from, 0.0, 1.0, 5)
        .unwrap()
        .is_empty());
}

#[test]
fn test_searches_stop_on_decayed_orbit() {
    let mut prop = Propagator::new(&reentering()).unwrap();
    let site = madrid();
    let config = EphemerisConfig::default();
    let params = SearchParams::default();
    let from = prop.epoch_jd() + 2.0;

    let eph = observe_with(&mut prop, from, &site, &config);
    assert!(eph.decayed);
    assert!(!eph.is_above(0.0));

    let res = next_pass(&mut prop, &site, &config, &params, from, 10.0, 1.0, false).unwrap();
    assert_eq!(res, 0.0);
    let res = next_pass(&mut prop, &site, &config, &params, from, 10.0, 1.0, true).unwrap();
    assert_eq!(res, 0.0);

    let events = next_flares(&mut prop, &site, &config, &params, from, 0.0, 1.0, 1).unwrap();
    assert!(events.is_empty());

    let mut tracker = Tracker::with_defaults(madrid());
    let idx = tracker.add_satellite(&reentering()).unwrap();
    let eph = tracker.observe_with_events(idx, from, 10.0, 1.0).unwrap();
    assert!(eph.decayed);
    assert_eq!(eph.next_pass, Some(0.0));
    assert!(eph.rise_set.is_none());
}

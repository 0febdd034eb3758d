mod common;

use approx::assert_relative_eq;
use common::*;
use satvis::constants::XKMPER;
use satvis::elements::Regime;
use satvis::propagator::deep_space::ResonanceKind;
use satvis::propagator::{propagate, Propagator};

/// Position (km) and velocity (km/s) published in Spacetrack Report #3.
type Reference = (f64, [f64; 3], [f64; 3]);

const SGP4_88888: [Reference; 5] = [
    (
        0.0,
        [2328.97048951, -5995.22076416, 1719.97067261],
        [2.91207230, -0.98341546, -7.09081703],
    ),
    (
        360.0,
        [2456.10705566, -6071.93853760, 1222.89727783],
        [2.67938992, -0.44829041, -7.22879231],
    ),
    (
        720.0,
        [2567.56195068, -6112.50384522, 713.96397400],
        [2.44024599, 0.09810869, -7.31995916],
    ),
    (
        1080.0,
        [2663.09078980, -6115.48229980, 196.39640427],
        [2.19611958, 0.65241995, -7.36282432],
    ),
    (
        1440.0,
        [2742.55133057, -6079.67144775, -326.38095856],
        [1.94850229, 1.21106251, -7.35619372],
    ),
];

const SDP4_11801: [Reference; 5] = [
    (
        0.0,
        [7473.37066650, 428.95261765, 5828.74786377],
        [5.10715130, 6.44468284, -0.18613096],
    ),
    (
        360.0,
        [-3305.22537232, 32410.86328125, -24697.17675781],
        [-1.30113538, -1.15131518, -0.28333528],
    ),
    (
        720.0,
        [14271.28759766, 24110.46411133, -4725.76837158],
        [-0.32050445, 2.67984074, -2.08405289],
    ),
    (
        1080.0,
        [-9990.05883789, 22717.35522461, -23616.89062500],
        [-1.01667246, -2.29026759, 0.72892364],
    ),
    (
        1440.0,
        [9787.86975097, 33753.34667969, -15030.81176758],
        [-1.09425066, 0.92358845, -1.52230928],
    ),
];

/// Vallado, Crawford, Hujsak & Kelso (2006), test case 00005.
const VALLADO_00005: [Reference; 3] = [
    (
        0.0,
        [7022.46529266, -1400.08296755, 0.03995155],
        [1.893841015, 6.405893759, 4.534807250],
    ),
    (
        360.0,
        [-7154.03120202, -3783.17682504, -3536.19412294],
        [4.741887409, -4.151817765, -2.093935425],
    ),
    (
        720.0,
        [-7134.59340119, 6531.68641334, 3260.27186483],
        [-4.113793027, -2.911922039, -2.557327851],
    ),
];

fn check_reference(prop: &mut Propagator, cases: &[Reference]) {
    for (tsince, pos, vel) in cases {
        let (pv, converged) = prop.propagate_with_status(*tsince);
        assert!(converged, "Kepler solve did not converge at {tsince} min");
        assert_vector_close(&pv.position, *pos, 1.0);
        assert_vector_close(&pv.velocity, *vel, 1e-3);
    }
}

#[test]
fn test_sgp4_reference_vectors() {
    let mut prop = Propagator::new(&sgp4_88888()).unwrap();
    assert_eq!(prop.regime(), Regime::NearEarth);
    // perigee below 220 km
    assert!(prop.state().simplified_drag);
    check_reference(&mut prop, &SGP4_88888);
}

#[test]
fn test_sgp4_full_drag_reference_vectors() {
    let mut prop = Propagator::new(&vallado_00005()).unwrap();
    assert_eq!(prop.regime(), Regime::NearEarth);
    // perigee near 650 km keeps the higher-order drag terms
    assert!(!prop.state().simplified_drag);
    check_reference(&mut prop, &VALLADO_00005);
}

#[test]
fn test_decayed_orbit_is_flagged() {
    let mut prop = Propagator::new(&reentering()).unwrap();
    let (pv, converged) = prop.propagate_with_status(0.0);
    assert!(converged);
    assert!(!pv.decayed);
    assert!(pv.position.norm() > XKMPER);

    for tsince in [2880.0, 14_400.0, 71_460.0] {
        let (pv, converged) = prop.propagate_with_status(tsince);
        assert!(pv.decayed, "not decayed at {tsince} min");
        assert!(!converged);
        assert!(pv.position.iter().all(|x| x.is_finite()));
        assert!(pv.velocity.iter().all(|x| x.is_finite()));
        assert_relative_eq!(pv.position.norm(), XKMPER, max_relative = 1e-9);
    }
}

#[test]
fn test_sdp4_reference_vectors() {
    let mut prop = Propagator::new(&sdp4_11801()).unwrap();
    assert_eq!(prop.regime(), Regime::DeepSpace);
    assert!(prop.resonance().is_none());
    check_reference(&mut prop, &SDP4_11801);

    // backward order gives the same answers
    let mut reversed = Propagator::new(&sdp4_11801()).unwrap();
    let cases: Vec<Reference> = SDP4_11801.iter().rev().copied().collect();
    check_reference(&mut reversed, &cases);
}

#[test]
fn test_free_function_matches_propagator() {
    let elements = sgp4_88888();
    let mut prop = Propagator::new(&elements).unwrap();
    let jd = prop.epoch_jd() + 0.25;

    let pv = propagate(&elements, jd).unwrap();
    assert_eq!(pv, prop.propagate_jd(jd));
    assert_relative_eq!(pv.tsince, 360.0, epsilon = 1e-6);
    assert_vector_close(&pv.position, SGP4_88888[1].1, 1.0);
}

#[test]
fn test_regime_is_stable() {
    for (elements, regime) in [
        (sgp4_88888(), Regime::NearEarth),
        (iridium_like(), Regime::NearEarth),
        (sdp4_11801(), Regime::DeepSpace),
        (molniya(), Regime::DeepSpace),
        (geostationary(), Regime::DeepSpace),
    ] {
        let mut prop = Propagator::new(&elements).unwrap();
        assert_eq!(prop.regime(), regime, "{}", elements.name);
        assert_eq!(prop.period() >= 225.0, regime == Regime::DeepSpace);
        for t in [-2000.0, 10.0, 5000.0] {
            prop.propagate(t);
            assert_eq!(prop.regime(), regime);
        }
    }
}

#[test]
fn test_resonance_classes() {
    let molniya = Propagator::new(&molniya()).unwrap();
    assert_eq!(
        molniya.resonance().map(|r| r.kind()),
        Some(ResonanceKind::HalfDay)
    );
    let geo = Propagator::new(&geostationary()).unwrap();
    assert_eq!(
        geo.resonance().map(|r| r.kind()),
        Some(ResonanceKind::Synchronous)
    );
}

#[test]
fn test_zero_time_mean_elements_near_earth() {
    let elements = sgp4_88888();
    let mut prop = Propagator::new(&elements).unwrap();
    let mean = prop.mean_elements(0.0);
    let rec = &prop.state().recovered;

    assert_relative_eq!(mean.eccentricity, elements.eccentricity, epsilon = 1e-12);
    assert_relative_eq!(
        mean.inclination,
        elements.inclination.to_radians(),
        epsilon = 1e-12
    );
    assert_relative_eq!(mean.raan, elements.raan.to_radians(), epsilon = 1e-12);
    assert_relative_eq!(
        mean.arg_perigee,
        elements.arg_perigee.to_radians(),
        epsilon = 1e-12
    );
    assert_relative_eq!(
        mean.mean_anomaly(),
        elements.mean_anomaly.to_radians(),
        epsilon = 1e-10
    );
    assert_relative_eq!(mean.semi_major_axis, rec.aodp, epsilon = 1e-12);
}

#[test]
fn test_zero_time_mean_elements_deep_space() {
    // only the lunar-solar periodic amplitudes separate the two
    for elements in [sdp4_11801(), molniya(), geostationary()] {
        let mut prop = Propagator::new(&elements).unwrap();
        let mean = prop.mean_elements(0.0);
        assert_relative_eq!(mean.eccentricity, elements.eccentricity, epsilon = 1e-3);
        assert_relative_eq!(
            mean.inclination,
            elements.inclination.to_radians(),
            epsilon = 1e-3
        );
        assert_relative_eq!(
            mean.semi_major_axis,
            prop.state().recovered.aodp,
            max_relative = 1e-5
        );
    }
}

#[test]
fn test_radius_envelope() {
    for elements in [sgp4_88888(), sdp4_11801(), molniya(), geostationary()] {
        let mut prop = Propagator::new(&elements).unwrap();
        let a = prop.state().recovered.aodp * XKMPER;
        let e = elements.eccentricity;
        let (perigee, apogee) = (a * (1.0 - e), a * (1.0 + e));
        let slack = 0.01 * a;

        for k in 0..=96 {
            let t = k as f64 * 15.0;
            let r = prop.propagate(t).position.norm();
            assert!(
                r > perigee - slack && r < apogee + slack,
                "{}: r = {r} km at {t} min, envelope [{perigee}, {apogee}]",
                elements.name
            );
        }
    }
}

#[test]
fn test_geostationary_stays_put() {
    let mut prop = Propagator::new(&geostationary()).unwrap();
    for day in 0..10 {
        let r = prop.propagate(day as f64 * 1440.0).position.norm();
        assert!((r - 42_164.0).abs() < 50.0, "radius {r} km at day {day}");
    }
}

#[test]
fn test_resonance_reset_on_reversal() {
    let mut prop = Propagator::new(&molniya()).unwrap();
    let eps = 1e-6;

    let at_zero = prop.propagate(0.0).position;
    let forward = prop.propagate(eps).position;
    let resets = prop.resonance().map(|r| r.resets()).unwrap_or_default();

    let backward = prop.propagate(-eps).position;
    let after_reversal = prop.resonance().map(|r| r.resets()).unwrap_or_default();
    assert_eq!(after_reversal, resets + 1);
    assert_eq!(prop.resonance().and_then(|r| r.last_requested()), Some(-eps));

    // continuous across the epoch
    assert!((forward - at_zero).norm() < 1e-2);
    assert!((backward - at_zero).norm() < 1e-2);

    // a far request and a return give the same state as a direct one
    let far = prop.propagate(4000.0).position;
    prop.propagate(-4000.0);
    let again = prop.propagate(4000.0).position;
    assert_relative_eq!((far - again).norm(), 0.0, epsilon = 1e-9);
}

#[test]
fn test_backward_propagation_near_earth() {
    let mut prop = Propagator::new(&sgp4_88888()).unwrap();
    let pv = prop.propagate(-1440.0);
    let r = pv.position.norm();
    assert!(r > XKMPER && r < XKMPER + 1000.0);
    // vis-viva for a near-circular orbit
    let v = pv.velocity.norm();
    assert!((v - (398_600.8 / r).sqrt()).abs() < 0.2);
}

#![allow(dead_code)]

use approx::assert_relative_eq;
use nalgebra::Vector3;
use satvis::elements::OrbitalElementSet;

/// Near-Earth test case of Spacetrack Report #3.
pub fn sgp4_88888() -> OrbitalElementSet {
    OrbitalElementSet {
        name: "SGP4 TEST".into(),
        catalog_number: 88888,
        epoch_year: 80,
        epoch_day: 275.98708465,
        inclination: 72.8435,
        raan: 115.9689,
        eccentricity: 0.0086731,
        arg_perigee: 52.6988,
        mean_anomaly: 110.5714,
        mean_motion: 16.05824518,
        mean_motion_dot: 0.00073094,
        mean_motion_ddot: 0.13844e-3,
        bstar: 0.66816e-4,
        revolution_number: 105,
        ..Default::default()
    }
}

/// Deep-space test case of Spacetrack Report #3 (no resonance).
pub fn sdp4_11801() -> OrbitalElementSet {
    OrbitalElementSet {
        name: "SDP4 TEST".into(),
        catalog_number: 11801,
        epoch_year: 80,
        epoch_day: 230.29629788,
        inclination: 46.7916,
        raan: 230.4354,
        eccentricity: 0.7318036,
        arg_perigee: 47.4722,
        mean_anomaly: 10.4117,
        mean_motion: 2.28537848,
        mean_motion_dot: 0.01431103,
        bstar: 0.14311e-1,
        revolution_number: 13,
        ..Default::default()
    }
}

/// Half-day resonant, highly eccentric orbit.
pub fn molniya() -> OrbitalElementSet {
    OrbitalElementSet {
        name: "MOLNIYA-like".into(),
        catalog_number: 90001,
        epoch_year: 24,
        epoch_day: 120.5,
        inclination: 63.4,
        raan: 300.0,
        eccentricity: 0.72,
        arg_perigee: 270.0,
        mean_anomaly: 10.0,
        mean_motion: 2.00563,
        bstar: 1e-4,
        ..Default::default()
    }
}

/// Synchronous resonant orbit.
pub fn geostationary() -> OrbitalElementSet {
    OrbitalElementSet {
        name: "GEO-like".into(),
        catalog_number: 90002,
        epoch_year: 24,
        epoch_day: 120.5,
        inclination: 0.05,
        raan: 85.0,
        eccentricity: 0.0002,
        arg_perigee: 180.0,
        mean_anomaly: 20.0,
        mean_motion: 1.00273,
        ..Default::default()
    }
}

/// Polar low orbit with reflective panels.
pub fn iridium_like() -> OrbitalElementSet {
    OrbitalElementSet {
        name: "IRIDIUM-like".into(),
        catalog_number: 90003,
        epoch_year: 24,
        epoch_day: 172.25,
        inclination: 86.4,
        raan: 40.0,
        eccentricity: 0.0002,
        arg_perigee: 90.0,
        mean_anomaly: 0.0,
        mean_motion: 14.342,
        bstar: 2e-5,
        reflective: true,
        standard_magnitude: Some(6.0),
        ..Default::default()
    }
}

/// Low-inclination low orbit, out of sight of high latitudes.
pub fn equatorial_leo() -> OrbitalElementSet {
    OrbitalElementSet {
        name: "EQ-LEO".into(),
        catalog_number: 90004,
        epoch_year: 24,
        epoch_day: 150.0,
        inclination: 5.0,
        raan: 10.0,
        eccentricity: 0.001,
        arg_perigee: 0.0,
        mean_anomaly: 0.0,
        mean_motion: 15.5,
        bstar: 1e-5,
        ..Default::default()
    }
}

/// Vanguard 1 (catalog 00005): near-Earth, eccentric, full drag terms.
pub fn vallado_00005() -> OrbitalElementSet {
    OrbitalElementSet {
        name: "VANGUARD 1".into(),
        catalog_number: 5,
        epoch_year: 0,
        epoch_day: 179.78495062,
        inclination: 34.2682,
        raan: 348.7242,
        eccentricity: 0.1859667,
        arg_perigee: 331.7664,
        mean_anomaly: 19.3264,
        mean_motion: 10.82419157,
        mean_motion_dot: 0.00000023,
        bstar: 0.28098e-4,
        revolution_number: 41366,
        ..Default::default()
    }
}

/// Low perigee and heavy drag: below the surface about a day after epoch.
pub fn reentering() -> OrbitalElementSet {
    OrbitalElementSet {
        name: "REENTRY".into(),
        catalog_number: 90010,
        epoch_year: 24,
        epoch_day: 150.0,
        inclination: 51.6,
        raan: 40.0,
        eccentricity: 0.001,
        arg_perigee: 90.0,
        mean_anomaly: 0.0,
        mean_motion: 16.3,
        bstar: 0.01,
        reflective: true,
        ..Default::default()
    }
}

pub fn assert_vector_close(actual: &Vector3<f64>, expected: [f64; 3], epsilon: f64) {
    assert_relative_eq!(actual.x, expected[0], epsilon = epsilon);
    assert_relative_eq!(actual.y, expected[1], epsilon = epsilon);
    assert_relative_eq!(actual.z, expected[2], epsilon = epsilon);
}

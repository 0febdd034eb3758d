//! # Low-precision Sun and Moon
//!
//! Geocentric positions of the Sun and the Moon from the short series of the
//! *Astronomical Almanac* (accuracy about 0.01° for the Sun and 0.3° for the Moon over
//! 1950–2050), and the Earth-shadow test used for satellite eclipses.
//!
//! Positions are returned in km in the true-equator inertial frame, which is close
//! enough to the mean equator of date for illumination and flare geometry.

use nalgebra::Vector3;

use crate::constants::{JulianDay, AU, JD2000, RADEG, SUN_RADIUS, XKMPER};
use crate::earth_orientation::obleq;
use crate::time::jd_to_mjd;

/// One periodic term `amp · trig(phase + rate·T)`, angles in degrees, `T` in Julian
/// centuries from J2000.
struct PeriodicTerm {
    amp: f64,
    phase: f64,
    rate: f64,
}

const fn pt(amp: f64, phase: f64, rate: f64) -> PeriodicTerm {
    PeriodicTerm { amp, phase, rate }
}

fn sum_sin(terms: &[PeriodicTerm], t: f64) -> f64 {
    terms
        .iter()
        .map(|p| p.amp * ((p.phase + p.rate * t) * RADEG).sin())
        .sum()
}

fn sum_cos(terms: &[PeriodicTerm], t: f64) -> f64 {
    terms
        .iter()
        .map(|p| p.amp * ((p.phase + p.rate * t) * RADEG).cos())
        .sum()
}

/// Ecliptic longitude of the Moon, periodic part (degrees).
const MOON_LONGITUDE: [PeriodicTerm; 6] = [
    pt(6.29, 135.0, 477198.87),
    pt(-1.27, 259.3, -413335.36),
    pt(0.66, 235.7, 890534.22),
    pt(0.21, 269.9, 954397.74),
    pt(-0.19, 357.5, 35999.05),
    pt(-0.11, 186.5, 966404.03),
];

/// Ecliptic latitude of the Moon (degrees).
const MOON_LATITUDE: [PeriodicTerm; 4] = [
    pt(5.13, 93.3, 483202.02),
    pt(0.28, 228.2, 960400.89),
    pt(-0.28, 318.3, 6003.15),
    pt(-0.17, 217.6, -407332.21),
];

/// Horizontal parallax of the Moon, periodic part (degrees).
const MOON_PARALLAX: [PeriodicTerm; 4] = [
    pt(0.0518, 135.0, 477198.87),
    pt(0.0095, 259.3, -413335.36),
    pt(0.0078, 235.7, 890534.22),
    pt(0.0028, 269.9, 954397.74),
];

/// Rotate ecliptic spherical coordinates to the equator.
fn ecliptic_to_equatorial(lambda: f64, beta: f64, dist: f64, eps: f64) -> Vector3<f64> {
    let (sl, cl) = lambda.sin_cos();
    let (sb, cb) = beta.sin_cos();
    let (se, ce) = eps.sin_cos();
    dist * Vector3::new(cb * cl, ce * cb * sl - se * sb, se * cb * sl + ce * sb)
}

/// Geocentric position of the Sun.
///
/// Arguments
/// ---------
/// * `jd`: Julian Date.
///
/// Return
/// ------
/// * position in km.
///
/// See also
/// ------------
/// * [`moon_position`] – same treatment for the Moon.
pub fn sun_position(jd: JulianDay) -> Vector3<f64> {
    let n = jd - JD2000;
    let l = 280.460 + 0.9856474 * n;
    let g = (357.528 + 0.9856003 * n) * RADEG;

    let lambda = (l + 1.915 * g.sin() + 0.020 * (2.0 * g).sin()) * RADEG;
    let r = 1.00014 - 0.01671 * g.cos() - 0.00014 * (2.0 * g).cos();

    ecliptic_to_equatorial(lambda, 0.0, r * AU, obleq(jd_to_mjd(jd)))
}

/// Geocentric position of the Moon.
///
/// Arguments
/// ---------
/// * `jd`: Julian Date.
///
/// Return
/// ------
/// * position in km.
pub fn moon_position(jd: JulianDay) -> Vector3<f64> {
    let t = (jd - JD2000) / 36525.0;

    let lambda = (218.32 + 481267.881 * t + sum_sin(&MOON_LONGITUDE, t)) * RADEG;
    let beta = sum_sin(&MOON_LATITUDE, t) * RADEG;
    let parallax = (0.9508 + sum_cos(&MOON_PARALLAX, t)) * RADEG;

    let dist = XKMPER / parallax.sin();
    ecliptic_to_equatorial(lambda, beta, dist, obleq(jd_to_mjd(jd)))
}

/// Depth of a satellite inside the Earth's umbra.
///
/// With `θe` the apparent radius of the Earth seen from the satellite, `θs` that of the
/// Sun and `θ` the angle between the Earth and Sun directions, the satellite is in the
/// umbral cone when `θe > θs` and `θ < θe − θs`.
///
/// Arguments
/// ---------
/// * `satellite`: geocentric satellite position in km.
/// * `sun`: geocentric Sun position in km.
///
/// Return
/// ------
/// * `θe − θs − θ` in radians: positive inside the umbra.
pub fn umbra_depth(satellite: &Vector3<f64>, sun: &Vector3<f64>) -> f64 {
    // distances in Earth radii
    let to_earth = -satellite / XKMPER;
    let to_sun = (sun - satellite) / XKMPER;

    let rho_e = to_earth.norm();
    let rho_s = to_sun.norm();
    let theta_e = (1.0 / rho_e).min(1.0).asin();
    let theta_s = (SUN_RADIUS / XKMPER / rho_s).min(1.0).asin();
    let theta = to_earth.angle(&to_sun);

    theta_e - theta_s - theta
}

/// Eclipse state of a satellite (inside the umbral cone).
pub fn is_eclipsed(satellite: &Vector3<f64>, sun: &Vector3<f64>) -> bool {
    umbra_depth(satellite, sun) > 0.0
}

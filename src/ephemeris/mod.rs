//! # Topocentric observables
//!
//! Turns a propagated [`PositionVelocity`] into what a ground observer sees:
//!
//! 1. **Earth orientation**: the propagator frame is true equator, mean equinox, so the
//!    site is rotated into it by the Greenwich mean sidereal angle ([`gmst`]) alone.
//!    Apparent right ascensions are then moved to the true equinox by the equation of
//!    the equinoxes ([`equequ`]).
//! 2. **Observer state**: inertial position and velocity of the site
//!    ([`Observer::inertial_pv`]).
//! 3. **Horizon coordinates**: the range vector projected on the local up/east/north
//!    triad gives azimuth (from north through east) and elevation.
//! 4. **Sub-satellite point** on a spherical Earth ([`spherical_sub_point`]).
//! 5. **Range-rate** from the relative velocity, observer rotation included.
//! 6. **Illumination**: low-precision Sun, umbral eclipse test, phase angle and the
//!    illuminated fraction `(1 + cos φ) / 2`.
//! 7. **Flares** for reflective satellites ([`flare`]).
//! 8. **Visual magnitude** when a standard magnitude is known ([`visual_magnitude`]).
//!
//! Refraction and extinction follow [`EphemerisConfig`].
//!
//! ## Units
//!
//! Angles in degrees, distances in km, range-rate in km/s.

pub mod flare;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::atmosphere::{extinction, refraction};
use crate::constants::{Degree, JulianDay, Kilometer, Radian};
use crate::earth_orientation::equequ;
use crate::elements::OrbitalElementSet;
use crate::observers::{spherical_sub_point, Observer};
use crate::propagator::{PositionVelocity, Propagator};
use crate::satvis_errors::SatvisError;
use crate::search::pass::RiseSetTransit;
use crate::sun_moon::{moon_position, sun_position, umbra_depth};
use crate::time::{gmst, jd_to_mjd};

use self::flare::{flare_geometry, FlareGeometry};

/// Range at which standard magnitudes are given, in km.
const STANDARD_RANGE: Kilometer = 1000.0;

/// Diffuse-sphere phase functions below this value are treated as unlit.
const MIN_PHASE_FUNCTION: f64 = 1e-9;

/// How observables are computed.
///
/// Default: apparent, topocentric, no extinction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EphemerisConfig {
    /// Refraction, and right ascension from the true equinox (otherwise geometric
    /// elevation and right ascension from the mean equinox).
    pub apparent: bool,
    /// Right ascension and declination seen from the observer (otherwise from the geocentre).
    pub topocentric: bool,
    /// Add atmospheric extinction to the magnitude estimate.
    pub extinction: bool,
}

impl Default for EphemerisConfig {
    fn default() -> Self {
        EphemerisConfig {
            apparent: true,
            topocentric: true,
            extinction: false,
        }
    }
}

impl EphemerisConfig {
    /// Correction added to right ascensions, in radians: the equation of the equinoxes
    /// when apparent, zero otherwise.
    pub fn right_ascension_offset(&self, jd: JulianDay) -> Radian {
        if self.apparent {
            equequ(jd_to_mjd(jd))
        } else {
            0.0
        }
    }
}

/// Angle between the body-fixed frame and the inertial frame of the propagator at a
/// Julian Date (Greenwich mean sidereal angle).
pub fn earth_rotation_angle(jd: JulianDay) -> Radian {
    gmst(jd_to_mjd(jd))
}

/// Observables of one satellite for one observer at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct SatelliteEphemeris {
    pub jd: JulianDay,
    /// Inertial state the observables derive from.
    pub state: PositionVelocity,

    pub right_ascension: Degree,
    pub declination: Degree,
    /// Azimuth from north through east, in [0, 360).
    pub azimuth: Degree,
    /// Elevation, including `refraction`.
    pub elevation: Degree,
    /// Refraction included in `elevation`, zero unless apparent.
    pub refraction: Degree,
    pub range: Kilometer,
    /// Range-rate in km/s, positive when receding.
    pub range_rate: f64,

    pub sub_longitude: Degree,
    pub sub_latitude: Degree,
    /// Height above the spherical Earth.
    pub altitude: Kilometer,

    /// Angle between the Sun and the satellite seen from the observer.
    pub solar_elongation: Degree,
    /// Elevation of the Sun for the observer, geometric.
    pub sun_elevation: Degree,
    /// Sun–satellite–observer angle.
    pub phase_angle: Degree,
    /// Illuminated fraction of the disk seen by the observer, in [0, 1].
    pub illumination: f64,
    pub eclipsed: bool,
    /// Depth inside the umbra in radians, negative when lit.
    pub eclipse_depth: Radian,

    pub revolution: i64,
    /// Flare angles, for reflective satellites only.
    pub flare: Option<FlareGeometry>,
    /// Visual magnitude estimate, when a standard magnitude is known and the satellite is lit.
    pub magnitude: Option<f64>,

    /// Next pass start as returned by [`next_pass`](crate::search::pass::next_pass), when requested.
    pub next_pass: Option<f64>,
    /// Rise, set and transit of the pass in progress, when requested.
    pub rise_set: Option<RiseSetTransit>,
    /// The orbit has decayed; the geometry above is not meaningful.
    pub decayed: bool,
}

/// Horizon coordinates only, for the search loops.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookAngles {
    pub jd: JulianDay,
    pub azimuth: Degree,
    /// Elevation, including `refraction`.
    pub elevation: Degree,
    pub refraction: Degree,
    pub range: Kilometer,
    pub decayed: bool,
}

impl LookAngles {
    /// Elevation without refraction.
    pub fn geometric_elevation(&self) -> Degree {
        self.elevation - self.refraction
    }

    /// In orbit and at or above the given elevation. A NaN elevation counts as below.
    pub fn is_above(&self, min_elevation: Degree) -> bool {
        !self.decayed && self.elevation >= min_elevation
    }

    /// In orbit and at or above a geometric (unrefracted) elevation.
    pub fn clears_horizon(&self, depression: Degree) -> bool {
        !self.decayed && self.geometric_elevation() >= depression
    }
}

impl SatelliteEphemeris {
    /// Elevation without refraction.
    pub fn geometric_elevation(&self) -> Degree {
        self.elevation - self.refraction
    }

    /// In orbit and at or above the given elevation. A NaN elevation counts as below.
    pub fn is_above(&self, min_elevation: Degree) -> bool {
        !self.decayed && self.elevation >= min_elevation
    }
}

/// Angle between two vectors, in degrees.
fn separation(a: &Vector3<f64>, b: &Vector3<f64>) -> Degree {
    a.angle(b).to_degrees()
}

/// Elevation and azimuth of a direction in the local horizon triad.
fn horizon_coordinates(
    rho: &Vector3<f64>,
    (up, east, north): &(Vector3<f64>, Vector3<f64>, Vector3<f64>),
) -> (Degree, Degree) {
    let u = rho.normalize();
    let elevation = u.dot(up).clamp(-1.0, 1.0).asin().to_degrees();
    let azimuth = u.dot(east).atan2(u.dot(north)).to_degrees().rem_euclid(360.0);
    (azimuth, elevation)
}

fn apparent_lift(config: &EphemerisConfig, geometric_elevation: Degree) -> Degree {
    if config.apparent {
        refraction(geometric_elevation)
    } else {
        0.0
    }
}

/// Azimuth, elevation and range of a satellite, without the illumination and flare work
/// of [`observe_with`].
pub fn look_angles(
    propagator: &mut Propagator,
    jd: JulianDay,
    observer: &Observer,
    config: &EphemerisConfig,
) -> LookAngles {
    let state = propagator.propagate_jd(jd);
    let gst = earth_rotation_angle(jd);
    let (r_obs, _) = observer.inertial_pv(gst);

    let rho = state.position - r_obs;
    let (azimuth, geometric_elevation) = horizon_coordinates(&rho, &observer.horizon_frame(gst));
    let refraction = apparent_lift(config, geometric_elevation);
    LookAngles {
        jd,
        azimuth,
        elevation: geometric_elevation + refraction,
        refraction,
        range: rho.norm(),
        decayed: state.decayed,
    }
}

/// Visual magnitude of a diffusely reflecting sphere.
///
/// ```text
/// m = m₀ + 5·log10(d / 1000 km) − 2.5·log10(F(φ)),   F(φ) = ((π − φ)·cos φ + sin φ) / π
/// ```
///
/// Arguments
/// ---------
/// * `standard_magnitude`: magnitude at 1000 km and full phase.
/// * `range`: observer distance in km.
/// * `phase_angle`: Sun–satellite–observer angle in degrees.
///
/// Return
/// ------
/// * `None` when the phase function vanishes (satellite seen from behind).
pub fn visual_magnitude(standard_magnitude: f64, range: Kilometer, phase_angle: Degree) -> Option<f64> {
    let phi = phase_angle.to_radians();
    let phase = ((std::f64::consts::PI - phi) * phi.cos() + phi.sin()) / std::f64::consts::PI;
    if phase < MIN_PHASE_FUNCTION {
        return None;
    }
    Some(standard_magnitude + 5.0 * (range / STANDARD_RANGE).log10() - 2.5 * phase.log10())
}

/// Observables from an already built propagator.
///
/// Arguments
/// ---------
/// * `propagator`: the satellite propagator, advanced to `jd`.
/// * `jd`: Julian Date (UTC).
/// * `observer`: the ground site.
/// * `config`: apparent/geometric, topocentric/geocentric, extinction.
///
/// Return
/// ------
/// * the full [`SatelliteEphemeris`].
///
/// See also
/// ------------
/// * [`observe`] – same from an element set.
pub fn observe_with(
    propagator: &mut Propagator,
    jd: JulianDay,
    observer: &Observer,
    config: &EphemerisConfig,
) -> SatelliteEphemeris {
    let state = propagator.propagate_jd(jd);
    let r = state.position;
    let v = state.velocity;

    let gst = earth_rotation_angle(jd);
    let (r_obs, v_obs) = observer.inertial_pv(gst);
    let frame = observer.horizon_frame(gst);

    let rho = r - r_obs;
    let range = rho.norm();
    let range_rate = rho.dot(&(v - v_obs)) / range;

    let (azimuth, geometric_elevation) = horizon_coordinates(&rho, &frame);
    let refraction = apparent_lift(config, geometric_elevation);
    let elevation = geometric_elevation + refraction;

    let line = if config.topocentric { rho } else { r };
    let right_ascension = (line.y.atan2(line.x) + config.right_ascension_offset(jd))
        .to_degrees()
        .rem_euclid(360.0);
    let declination = (line.z / line.norm()).asin().to_degrees();

    let (sub_longitude, sub_latitude, altitude) = spherical_sub_point(&r, gst);

    let sun = sun_position(jd);
    let observer_to_sun = sun - r_obs;
    let (_, sun_elevation) = horizon_coordinates(&observer_to_sun, &frame);
    let solar_elongation = separation(&observer_to_sun, &rho);
    let phase_angle = separation(&(sun - r), &-rho);
    let illumination = 0.5 * (1.0 + phase_angle.to_radians().cos());

    let eclipse_depth = umbra_depth(&r, &sun);
    let eclipsed = eclipse_depth > 0.0;

    let elements = propagator.elements();
    let flare = elements
        .reflective
        .then(|| flare_geometry(&r, &v, &r_obs, &sun, &moon_position(jd)));

    let magnitude = elements
        .standard_magnitude
        .filter(|_| !eclipsed)
        .and_then(|m0| visual_magnitude(m0, range, phase_angle))
        .map(|m| {
            let loss = if config.extinction {
                extinction(elevation).unwrap_or(0.0)
            } else {
                0.0
            };
            m + loss
        });

    SatelliteEphemeris {
        jd,
        decayed: state.decayed,
        state,
        right_ascension,
        declination,
        azimuth,
        elevation,
        refraction,
        range,
        range_rate,
        sub_longitude,
        sub_latitude,
        altitude,
        solar_elongation,
        sun_elevation,
        phase_angle,
        illumination,
        eclipsed,
        eclipse_depth,
        revolution: propagator.revolutions_at(jd),
        flare,
        magnitude,
        next_pass: None,
        rise_set: None,
    }
}

/// Observables of an element set for an observer.
///
/// Arguments
/// ---------
/// * `elements`: catalog elements.
/// * `jd`: Julian Date (UTC).
/// * `observer`: the ground site.
/// * `config`: see [`EphemerisConfig`].
///
/// Return
/// ------
/// * the full [`SatelliteEphemeris`].
///
/// Errors
/// ------
/// * construction errors of [`Propagator::new`].
pub fn observe(
    elements: &OrbitalElementSet,
    jd: JulianDay,
    observer: &Observer,
    config: &EphemerisConfig,
) -> Result<SatelliteEphemeris, SatvisError> {
    let mut propagator = Propagator::new(elements)?;
    Ok(observe_with(&mut propagator, jd, observer, config))
}

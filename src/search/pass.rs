//! # Passes, rise, set and transit
//!
//! ## Next pass
//!
//! The step follows the time a satellite needs to cross the sky. For a mean altitude `h`,
//! the satellite is above the horizon of the sub-point for a fraction of its period
//!
//! ```text
//! traverse = P · 2·acos(Re / (Re + h)) / 2π
//! ```
//!
//! and the search steps by a tenth of it (never less than 10 s). Deep below the horizon
//! the step is multiplied (×3 below −25°, ×2 below −15°). Once the elevation reaches the
//! minimum, the search steps back one unit and walks again at 10 s, which bounds the
//! precision of the returned crossing. There is no bisection.
//!
//! ## Rise, set and transit
//!
//! From any instant of a pass, 1-second steps backward and forward until the geometric
//! elevation drops below the depressed horizon (−34′ by default). The highest elevation
//! seen on the way is the transit.
use itertools::iterate;

use crate::constants::{Degree, JulianDay, SECONDS_PER_DAY, XKMPER};
use crate::ephemeris::{look_angles, EphemerisConfig, LookAngles, SatelliteEphemeris};
use crate::observers::Observer;
use crate::propagator::Propagator;
use crate::satvis_errors::SatvisError;
use crate::sun_moon::{is_eclipsed, sun_position};

use super::{validate_window, SearchParams};

/// Smallest coarse step and step of the bracketing walk, in seconds.
const FINE_STEP_SECONDS: f64 = 10.0;

/// One second, in days.
const SECOND: f64 = 1.0 / SECONDS_PER_DAY;

/// Cap on the 1-second steps of each rise or set walk (12 hours).
pub const RISE_SET_MAX_STEPS: usize = 43_200;

/// Rise, set and culmination of a pass.
///
/// `rise` and `set` are `0.0` when the walk hit its step cap without reaching the horizon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiseSetTransit {
    pub rise: JulianDay,
    pub set: JulianDay,
    pub transit: JulianDay,
    /// Elevation at `transit`, refraction included when apparent.
    pub transit_elevation: Degree,
    pub rise_azimuth: Degree,
    pub set_azimuth: Degree,
}

/// Coarse step of the next-pass search, in days.
///
/// A tenth of the estimated sky-traverse duration, 10 s at least.
pub fn traverse_step(propagator: &Propagator) -> f64 {
    let height = propagator.mean_altitude().max(0.0);
    let visible_arc = 2.0 * (XKMPER / (XKMPER + height)).acos();
    let traverse = propagator.period_seconds() * visible_arc / std::f64::consts::TAU;
    (traverse / 10.0).max(FINE_STEP_SECONDS) / SECONDS_PER_DAY
}

/// Step multiplier while below the horizon.
fn step_multiplier(elevation: Degree) -> f64 {
    if elevation < -25.0 {
        3.0
    } else if elevation < -15.0 {
        2.0
    } else {
        1.0
    }
}

/// `jd`, negated when the satellite is in the Earth's shadow at `jd`.
fn sign_for_eclipse(propagator: &mut Propagator, jd: JulianDay) -> f64 {
    let state = propagator.propagate_jd(jd);
    if is_eclipsed(&state.position, &sun_position(jd)) {
        -jd
    } else {
        jd
    }
}

/// Start of the next pass above a minimum elevation.
///
/// Arguments
/// ---------
/// * `propagator`: the satellite.
/// * `observer`: the ground site.
/// * `config`: elevations are apparent (refracted) when `config.apparent`.
/// * `params`: `max_search_steps` caps the propagations.
/// * `from_jd`: reference Julian Date.
/// * `min_elevation`: degrees, in [0, 90).
/// * `max_days`: length of the search window.
/// * `include_current`: when the satellite is already above `min_elevation` at `from_jd`,
///   return `from_jd` instead of waiting for the following pass.
///
/// Return
/// ------
/// * the Julian Date of the crossing, within 10 s after the true crossing, in
///   `[from_jd, from_jd + max_days]`;
/// * negated when the satellite is eclipsed at that instant;
/// * `0.0` when no pass starts inside the window.
///
/// Errors
/// ------
/// * [`SatvisError::InvalidMinElevation`] outside [0, 90).
/// * [`SatvisError::InvalidInput`] when `max_days` is not strictly positive.
#[allow(clippy::too_many_arguments)]
pub fn next_pass(
    propagator: &mut Propagator,
    observer: &Observer,
    config: &EphemerisConfig,
    params: &SearchParams,
    from_jd: JulianDay,
    min_elevation: Degree,
    max_days: f64,
    include_current: bool,
) -> Result<f64, SatvisError> {
    validate_window(min_elevation, max_days)?;

    let end_jd = from_jd + max_days;
    let step = traverse_step(propagator);
    let mut budget = ((max_days / step).ceil() as usize + 2).min(params.max_search_steps);
    let look = |p: &mut Propagator, jd: JulianDay| look_angles(p, jd, observer, config);

    let mut jd = from_jd;
    let mut sample = look(propagator, jd);

    if sample.is_above(min_elevation) {
        if include_current {
            tracing::debug!(
                satellite = %propagator.elements().name,
                jd = from_jd,
                "pass in progress at the reference date"
            );
            return Ok(sign_for_eclipse(propagator, from_jd));
        }
        while sample.is_above(min_elevation) {
            jd += step;
            budget = budget.saturating_sub(1);
            if jd > end_jd || budget == 0 {
                tracing::debug!(
                    satellite = %propagator.elements().name,
                    "satellite stays above {min_elevation}° for the whole window"
                );
                return Ok(0.0);
            }
            sample = look(propagator, jd);
        }
    }

    // NaN elevations count as below
    let mut previous = jd;
    while !sample.is_above(min_elevation) {
        if sample.decayed {
            tracing::debug!(
                satellite = %propagator.elements().name,
                jd,
                "orbit decayed before the next pass"
            );
            return Ok(0.0);
        }
        previous = jd;
        jd += step * step_multiplier(sample.elevation);
        budget = budget.saturating_sub(1);
        if jd > end_jd + step || budget == 0 {
            tracing::debug!(
                satellite = %propagator.elements().name,
                from_jd,
                max_days,
                "no pass above {min_elevation}°"
            );
            return Ok(0.0);
        }
        sample = look(propagator, jd);
    }

    // bracket the crossing between the last sample below and the first above
    let fine = FINE_STEP_SECONDS / SECONDS_PER_DAY;
    let crossing = iterate(previous, |t| t + fine)
        .take_while(|t| *t < jd)
        .find(|t| look(propagator, *t).is_above(min_elevation))
        .unwrap_or(jd);

    if crossing > end_jd {
        tracing::debug!(
            satellite = %propagator.elements().name,
            crossing,
            "next pass starts after the search window"
        );
        return Ok(0.0);
    }

    let signed = sign_for_eclipse(propagator, crossing);
    tracing::debug!(
        satellite = %propagator.elements().name,
        jd = crossing,
        eclipsed = signed < 0.0,
        "next pass above {min_elevation}°"
    );
    Ok(signed)
}

/// Outcome of a walk toward the horizon.
#[derive(Debug, Clone, Copy)]
struct HorizonWalk {
    /// Last sample above the depressed horizon.
    last_above: LookAngles,
    /// Highest sample.
    peak: LookAngles,
}

/// Walk in 1-second steps from `start` until the geometric elevation drops below
/// `threshold` or the orbit decays.
///
/// Return
/// ------
/// * the walk and `true` when the horizon was reached within [`RISE_SET_MAX_STEPS`].
fn walk_to_horizon(
    propagator: &mut Propagator,
    observer: &Observer,
    config: &EphemerisConfig,
    start: JulianDay,
    direction: f64,
    threshold: Degree,
) -> (HorizonWalk, bool) {
    let first = look_angles(propagator, start, observer, config);
    let mut walk = HorizonWalk {
        last_above: first,
        peak: first,
    };
    if !first.clears_horizon(threshold) {
        return (walk, true);
    }

    for jd in iterate(start, |t| t + direction * SECOND)
        .skip(1)
        .take(RISE_SET_MAX_STEPS)
    {
        let look = look_angles(propagator, jd, observer, config);
        if !look.clears_horizon(threshold) {
            return (walk, true);
        }
        if look.elevation > walk.peak.elevation {
            walk.peak = look;
        }
        walk.last_above = look;
    }
    (walk, false)
}

/// Rise, set and transit of the pass containing an ephemeris.
///
/// Arguments
/// ---------
/// * `propagator`: the satellite.
/// * `at_pass`: any ephemeris during the pass, typically at the time from [`next_pass`].
/// * `observer`, `config`: as used for `at_pass`.
/// * `horizon_refraction`: depression of the horizon in degrees, in [0, 5].
///
/// Return
/// ------
/// * the [`RiseSetTransit`]. `rise` (or `set`) is `0.0` when the backward (or forward)
///   walk did not reach the horizon within 12 hours. When `at_pass` is already below the
///   horizon, rise, set and transit all equal `at_pass.jd`.
///
/// Errors
/// ------
/// * [`SatvisError::InvalidSearchParameter`] when `horizon_refraction` is outside [0, 5].
pub fn rise_set_transit(
    propagator: &mut Propagator,
    at_pass: &SatelliteEphemeris,
    observer: &Observer,
    config: &EphemerisConfig,
    horizon_refraction: Degree,
) -> Result<RiseSetTransit, SatvisError> {
    if !(0.0..=5.0).contains(&horizon_refraction) {
        return Err(SatvisError::InvalidSearchParameter(format!(
            "horizon refraction must lie in [0, 5] degrees, got {horizon_refraction}"
        )));
    }
    let threshold = -horizon_refraction;

    let (before, rise_found) =
        walk_to_horizon(propagator, observer, config, at_pass.jd, -1.0, threshold);
    let (after, set_found) =
        walk_to_horizon(propagator, observer, config, at_pass.jd, 1.0, threshold);

    let peak = if after.peak.elevation > before.peak.elevation {
        after.peak
    } else {
        before.peak
    };

    if !(rise_found && set_found) {
        tracing::debug!(
            satellite = %propagator.elements().name,
            rise_found,
            set_found,
            "rise/set walk reached its step cap"
        );
    }

    Ok(RiseSetTransit {
        rise: if rise_found { before.last_above.jd } else { 0.0 },
        set: if set_found { after.last_above.jd } else { 0.0 },
        transit: peak.jd,
        transit_elevation: peak.elevation,
        rise_azimuth: before.last_above.azimuth,
        set_azimuth: after.last_above.azimuth,
    })
}

//! # Flare search
//!
//! Flares last seconds, passes minutes. The search therefore works pass by pass:
//!
//! 1. find the next pass above the minimum elevation ([`next_pass`]);
//! 2. scan the pass at the caller's precision (1 to 10 s) until the Sun flare angle drops
//!    below the threshold;
//! 3. step back one coarse unit and rescan at 1 s, recording the first and last samples
//!    below the threshold and the smallest angle;
//! 4. discard the candidate when the satellite is eclipsed at the smallest angle;
//! 5. resume the coarse scan after the flare, then move to the next pass.
use std::fmt;

use itertools::iterate;

use crate::constants::{Degree, JulianDay, Kilometer, SECONDS_PER_DAY};
use crate::ephemeris::{observe_with, EphemerisConfig, SatelliteEphemeris};
use crate::observers::Observer;
use crate::propagator::Propagator;
use crate::satvis_errors::SatvisError;
use crate::time::jd_to_epoch;

use super::pass::next_pass;
use super::{validate_window, SearchParams};

/// One second, in days.
const SECOND: f64 = 1.0 / SECONDS_PER_DAY;

/// Cap on the 1-second samples of one flare.
const FLARE_MAX_SECONDS: usize = 600;

/// A specular flare seen by an observer.
#[derive(Debug, Clone, PartialEq)]
pub struct FlareEvent {
    /// First sample below the threshold.
    pub start: JulianDay,
    /// Sample with the smallest flare angle.
    pub peak: JulianDay,
    /// Last sample below the threshold.
    pub end: JulianDay,
    /// Flare angle at `peak`.
    pub peak_angle: Degree,
    /// Mirror producing the flare at `peak`.
    pub mirror: usize,
    pub azimuth: Degree,
    pub elevation: Degree,
    pub range: Kilometer,
    /// Visual magnitude of the satellite body at `peak`, when known.
    pub magnitude: Option<f64>,
}

impl FlareEvent {
    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        (self.end - self.start) * SECONDS_PER_DAY
    }
}

impl fmt::Display for FlareEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "flare at {} ({:.0} s), angle {:.2}° on mirror {}, az {:.1}° el {:.1}° range {:.0} km",
            jd_to_epoch(self.peak),
            self.duration(),
            self.peak_angle,
            self.mirror,
            self.azimuth,
            self.elevation,
            self.range
        )
    }
}

/// Sun flare angle and mirror of an ephemeris, when below the threshold and above the
/// minimum elevation.
fn qualifying_angle(
    eph: &SatelliteEphemeris,
    threshold: Degree,
    min_elevation: Degree,
) -> Option<(Degree, usize)> {
    if !eph.is_above(min_elevation) {
        return None;
    }
    let flare = eph.flare.as_ref()?;
    flare
        .sun_angle
        .zip(flare.mirror)
        .filter(|(angle, _)| *angle < threshold)
}

/// Rescan a flare at 1 s from `from`.
///
/// Return
/// ------
/// * the event, `None` when eclipsed at the smallest angle or when no sample qualifies;
/// * the Julian Date of the last sample examined, where the coarse scan resumes.
fn refine_flare(
    propagator: &mut Propagator,
    observer: &Observer,
    config: &EphemerisConfig,
    threshold: Degree,
    min_elevation: Degree,
    from: JulianDay,
) -> (Option<FlareEvent>, JulianDay) {
    let mut best: Option<(SatelliteEphemeris, Degree, usize)> = None;
    let mut bounds: Option<(JulianDay, JulianDay)> = None;
    let mut examined = from;

    for jd in iterate(from, |t| t + SECOND).take(FLARE_MAX_SECONDS) {
        let eph = observe_with(propagator, jd, observer, config);
        examined = jd;
        match qualifying_angle(&eph, threshold, min_elevation) {
            Some((angle, mirror)) => {
                bounds = Some(bounds.map_or((jd, jd), |(start, _)| (start, jd)));
                if best.as_ref().map_or(true, |(_, a, _)| angle < *a) {
                    best = Some((eph, angle, mirror));
                }
            }
            None if bounds.is_some() => break,
            None => {}
        }
    }

    let (Some((start, end)), Some((peak, angle, mirror))) = (bounds, best) else {
        return (None, examined);
    };

    if peak.eclipsed {
        tracing::debug!(
            satellite = %propagator.elements().name,
            peak = peak.jd,
            angle,
            "discarding flare candidate, satellite eclipsed at peak"
        );
        return (None, examined);
    }

    let event = FlareEvent {
        start,
        peak: peak.jd,
        end,
        peak_angle: angle,
        mirror,
        azimuth: peak.azimuth,
        elevation: peak.elevation,
        range: peak.range,
        magnitude: peak.magnitude,
    };
    (Some(event), examined)
}

/// Flares of a reflective satellite over a time window.
///
/// Arguments
/// ---------
/// * `propagator`: the satellite; non-reflective satellites give no event.
/// * `observer`, `config`: the ground site and how observables are computed.
/// * `params`: flare threshold and caps.
/// * `from_jd`: start of the window.
/// * `min_elevation`: degrees, in [0, 90).
/// * `max_days`: length of the window.
/// * `precision_seconds`: coarse scan step, 1 to 10 s.
///
/// Return
/// ------
/// * the flares in time order, at most `params.max_flare_events`.
///
/// Errors
/// ------
/// * [`SatvisError::InvalidMinElevation`], [`SatvisError::InvalidInput`] as
///   [`next_pass`].
/// * [`SatvisError::InvalidSearchParameter`] when `precision_seconds` is outside [1, 10].
#[allow(clippy::too_many_arguments)]
pub fn next_flares(
    propagator: &mut Propagator,
    observer: &Observer,
    config: &EphemerisConfig,
    params: &SearchParams,
    from_jd: JulianDay,
    min_elevation: Degree,
    max_days: f64,
    precision_seconds: u32,
) -> Result<Vec<FlareEvent>, SatvisError> {
    validate_window(min_elevation, max_days)?;
    if !(1..=10).contains(&precision_seconds) {
        return Err(SatvisError::InvalidSearchParameter(format!(
            "flare scan precision must lie in [1, 10] seconds, got {precision_seconds}"
        )));
    }

    let mut events = Vec::new();
    if !propagator.elements().reflective {
        tracing::debug!(
            satellite = %propagator.elements().name,
            "no flare search for a non-reflective satellite"
        );
        return Ok(events);
    }

    let end_jd = from_jd + max_days;
    let coarse = precision_seconds as f64 * SECOND;
    let mut budget = params.max_search_steps;
    let mut jd = from_jd;
    let mut include_current = true;

    'passes: while jd < end_jd && budget > 0 {
        let pass = next_pass(
            propagator,
            observer,
            config,
            params,
            jd,
            min_elevation,
            end_jd - jd,
            include_current,
        )?;
        include_current = false;
        if pass == 0.0 {
            break;
        }

        let mut t = pass.abs();
        while t <= end_jd {
            if budget == 0 {
                break 'passes;
            }
            budget -= 1;

            let eph = observe_with(propagator, t, observer, config);
            // end of the pass, or a decayed orbit (NaN elevations count as below)
            if !eph.is_above(min_elevation) {
                break;
            }
            if qualifying_angle(&eph, params.flare_threshold, min_elevation).is_some() {
                let from = (t - coarse).max(pass.abs());
                let (event, resume) = refine_flare(
                    propagator,
                    observer,
                    config,
                    params.flare_threshold,
                    min_elevation,
                    from,
                );
                if let Some(event) = event {
                    tracing::debug!(
                        satellite = %propagator.elements().name,
                        "{event}"
                    );
                    events.push(event);
                    if events.len() >= params.max_flare_events {
                        break 'passes;
                    }
                }
                t = resume;
            }
            t += coarse;
        }
        jd = t;
    }

    tracing::debug!(
        satellite = %propagator.elements().name,
        from_jd,
        max_days,
        count = events.len(),
        "flare search done"
    );
    Ok(events)
}

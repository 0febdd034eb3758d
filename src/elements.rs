//! # Mean orbital elements and element recovery
//!
//! This module holds the caller-supplied [`OrbitalElementSet`] and the
//! [`RecoveredElements`] derived from it before any propagation happens.
//!
//! ## Recovery
//!
//! Catalog elements carry a *Kozai* mean motion. The analytic theory works with the
//! *Brouwer* mean motion and semi-major axis, recovered with a single J2 correction:
//!
//! ```text
//! a₁   = (kₑ / n₀)^(2/3)
//! δ₁   = 3/2 · k₂ · (3cos²i − 1) / (a₁² · (1 − e²)^(3/2))
//! a₀   = a₁ · (1 − δ₁/3 − δ₁² − 134/81 · δ₁³)
//! δ₀   = 3/2 · k₂ · (3cos²i − 1) / (a₀² · (1 − e²)^(3/2))
//! n₀'' = n₀ / (1 + δ₀),   a₀'' = a₀ / (1 − δ₀)
//! ```
//!
//! The recovered period `2π / n₀''` selects the [`Regime`] once and for all:
//! 225 minutes and above is deep space.
//!
//! ## Units
//!
//! * [`OrbitalElementSet`] uses catalog units: degrees, revolutions per day.
//! * [`RecoveredElements`] uses the theory's canonical units: radians, radians per
//!   minute, Earth radii.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{
    Degree, JulianDay, Minutes, AE, CK2, DEEP_SPACE_PERIOD, DPI, MINUTES_PER_DAY, RADEG, TOTHRD,
    XKE,
};
use crate::satvis_errors::SatvisError;
use crate::time::epoch_to_jd;

/// Classical mean-element description of an Earth satellite orbit.
///
/// Field units follow the two-line element convention. The set is never mutated by the
/// propagation layers; a [`Propagator`](crate::propagator::Propagator) keeps its own copy.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OrbitalElementSet {
    /// Satellite common name.
    pub name: String,
    /// Catalog number.
    pub catalog_number: u32,
    /// Epoch year, two-digit (catalog convention) or four-digit.
    pub epoch_year: i32,
    /// Epoch day of year with fraction, `1.0` is January 1st at 0h UT.
    pub epoch_day: f64,
    /// Inclination in degrees.
    pub inclination: Degree,
    /// Right ascension of the ascending node in degrees.
    pub raan: Degree,
    /// Eccentricity, in [0, 1).
    pub eccentricity: f64,
    /// Argument of perigee in degrees.
    pub arg_perigee: Degree,
    /// Mean anomaly in degrees.
    pub mean_anomaly: Degree,
    /// Mean motion in revolutions per day.
    pub mean_motion: f64,
    /// First derivative of mean motion divided by two, rev/day².
    pub mean_motion_dot: f64,
    /// Second derivative of mean motion divided by six, rev/day³.
    pub mean_motion_ddot: f64,
    /// B* drag term, in inverse Earth radii.
    pub bstar: f64,
    /// Revolution number at epoch.
    pub revolution_number: u32,
    /// Satellite carries flat reflective panels producing flares.
    #[serde(default)]
    pub reflective: bool,
    /// Visual magnitude at 1000 km range and full phase.
    #[serde(default)]
    pub standard_magnitude: Option<f64>,
}

impl OrbitalElementSet {
    /// Check the element set and resolve its epoch.
    ///
    /// Return
    /// ------
    /// * the Julian Date of the epoch.
    ///
    /// Errors
    /// ------
    /// * [`SatvisError::InvalidInput`] when a value is not finite, the eccentricity is
    ///   outside [0, 1) or the mean motion is not strictly positive.
    /// * [`SatvisError::InvalidEpoch`] when the epoch is not a calendar date.
    pub fn validate(&self) -> Result<JulianDay, SatvisError> {
        let values = [
            ("inclination", self.inclination),
            ("raan", self.raan),
            ("eccentricity", self.eccentricity),
            ("arg_perigee", self.arg_perigee),
            ("mean_anomaly", self.mean_anomaly),
            ("mean_motion", self.mean_motion),
            ("mean_motion_dot", self.mean_motion_dot),
            ("mean_motion_ddot", self.mean_motion_ddot),
            ("bstar", self.bstar),
        ];
        if let Some((field, value)) = values.iter().find(|(_, v)| !v.is_finite()) {
            return Err(SatvisError::InvalidInput(format!(
                "{field} must be finite, got {value}"
            )));
        }

        if !(0.0..1.0).contains(&self.eccentricity) {
            return Err(SatvisError::InvalidInput(format!(
                "eccentricity must lie in [0, 1), got {}",
                self.eccentricity
            )));
        }
        if self.mean_motion <= 0.0 {
            return Err(SatvisError::InvalidInput(format!(
                "mean motion must be positive, got {} rev/day",
                self.mean_motion
            )));
        }

        epoch_to_jd(self.epoch_year, self.epoch_day)
    }

    /// Number of complete revolutions at a given Julian Date.
    ///
    /// Uses the catalog mean motion and its first derivative, which is the
    /// convention of the revolution counter in element sets.
    pub fn revolutions_at(&self, epoch_jd: JulianDay, jd: JulianDay) -> i64 {
        let dt = jd - epoch_jd;
        let orbits =
            self.mean_motion * dt + self.mean_motion_dot * dt * dt + self.mean_anomaly / 360.0;
        self.revolution_number as i64 + orbits.floor() as i64
    }
}

impl fmt::Display for OrbitalElementSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) epoch {:02}/{:.8}: i={:.4}° Ω={:.4}° e={:.7} ω={:.4}° M={:.4}° n={:.8} rev/d",
            self.name,
            self.catalog_number,
            self.epoch_year,
            self.epoch_day,
            self.inclination,
            self.raan,
            self.eccentricity,
            self.arg_perigee,
            self.mean_anomaly,
            self.mean_motion
        )
    }
}

/// Propagation branch of a satellite, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Regime {
    /// Period below 225 minutes: atmospheric drag and zonal harmonics only.
    NearEarth,
    /// Period of 225 minutes or more: lunar-solar and resonance terms added.
    DeepSpace,
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Regime::NearEarth => write!(f, "near-Earth"),
            Regime::DeepSpace => write!(f, "deep-space"),
        }
    }
}

/// Mean elements in canonical units, with the recovered semi-major axis and mean motion.
///
/// All angles in radians, mean motions in radians per minute, distances in Earth radii.
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveredElements {
    /// Julian Date of the epoch.
    pub epoch_jd: JulianDay,
    pub xincl: f64,
    pub xnodeo: f64,
    pub eo: f64,
    pub omegao: f64,
    pub xmo: f64,
    /// Catalog (Kozai) mean motion.
    pub xno: f64,
    /// Recovered (Brouwer) mean motion.
    pub xnodp: f64,
    /// Recovered semi-major axis.
    pub aodp: f64,
    pub bstar: f64,

    pub cosio: f64,
    pub sinio: f64,
    /// cos²i
    pub theta2: f64,
    /// 3cos²i − 1
    pub x3thm1: f64,
    /// e²
    pub eosq: f64,
    /// 1 − e²
    pub betao2: f64,
    /// sqrt(1 − e²)
    pub betao: f64,

    /// Recovered period in minutes.
    pub period: Minutes,
    pub regime: Regime,
}

impl RecoveredElements {
    /// Convert an element set into canonical units and recover the Brouwer mean motion.
    ///
    /// Arguments
    /// ---------
    /// * `elements`: the catalog elements.
    ///
    /// Return
    /// ------
    /// * the recovered elements with the regime already classified.
    ///
    /// Errors
    /// ------
    /// * any error from [`OrbitalElementSet::validate`].
    pub fn recover(elements: &OrbitalElementSet) -> Result<Self, SatvisError> {
        let epoch_jd = elements.validate()?;

        let xincl = elements.inclination * RADEG;
        let eo = elements.eccentricity;
        let xno = elements.mean_motion * DPI / MINUTES_PER_DAY;

        let (sinio, cosio) = xincl.sin_cos();
        let theta2 = cosio * cosio;
        let x3thm1 = 3.0 * theta2 - 1.0;
        let eosq = eo * eo;
        let betao2 = 1.0 - eosq;
        let betao = betao2.sqrt();

        let a1 = (XKE / xno).powf(TOTHRD);
        let del1 = 1.5 * CK2 * x3thm1 / (a1 * a1 * betao * betao2);
        let ao = a1 * (1.0 - del1 * (0.5 * TOTHRD + del1 * (1.0 + 134.0 / 81.0 * del1)));
        let delo = 1.5 * CK2 * x3thm1 / (ao * ao * betao * betao2);
        let xnodp = xno / (1.0 + delo);
        let aodp = ao / (1.0 - delo);

        let period = DPI / xnodp;
        let regime = if period >= DEEP_SPACE_PERIOD {
            Regime::DeepSpace
        } else {
            Regime::NearEarth
        };

        Ok(RecoveredElements {
            epoch_jd,
            xincl,
            xnodeo: elements.raan * RADEG,
            eo,
            omegao: elements.arg_perigee * RADEG,
            xmo: elements.mean_anomaly * RADEG,
            xno,
            xnodp,
            aodp,
            bstar: elements.bstar,
            cosio,
            sinio,
            theta2,
            x3thm1,
            eosq,
            betao2,
            betao,
            period,
            regime,
        })
    }

    /// Perigee height above the equatorial radius, in Earth radii.
    pub fn perigee_height(&self) -> f64 {
        self.aodp * (1.0 - self.eo) - AE
    }
}

#[cfg(test)]
mod elements_test {
    use super::*;
    use approx::assert_relative_eq;

    fn sgp4_test_elements() -> OrbitalElementSet {
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
            mean_motion_ddot: 1.3844e-4,
            bstar: 0.66816e-4,
            revolution_number: 105,
            ..Default::default()
        }
    }

    #[test]
    fn test_recovery_near_earth() {
        let rec = RecoveredElements::recover(&sgp4_test_elements()).unwrap();
        assert_eq!(rec.regime, Regime::NearEarth);
        assert_relative_eq!(rec.period, 89.62387464325512, epsilon = 1e-6);
        assert_relative_eq!(rec.epoch_jd, 2_444_514.48708465, epsilon = 1e-6);
        // 3cos²i − 1 < 0 above 54.7°, the correction raises the mean motion
        assert!(rec.xnodp > rec.xno);
        assert_relative_eq!(rec.xnodp, 0.070106155666552, epsilon = 1e-12);
        assert_relative_eq!(rec.aodp, 1.040117522690952, epsilon = 1e-12);
    }

    #[test]
    fn test_recovery_deep_space() {
        let mut el = sgp4_test_elements();
        el.mean_motion = 2.28537848;
        el.eccentricity = 0.7318036;
        let rec = RecoveredElements::recover(&el).unwrap();
        assert_eq!(rec.regime, Regime::DeepSpace);
        assert!(rec.period >= DEEP_SPACE_PERIOD);
    }

    #[test]
    fn test_regime_boundary() {
        let mut el = sgp4_test_elements();
        el.eccentricity = 0.0;
        el.inclination = 54.7356; // 3cos²i − 1 ≈ 0, no J2 correction
        el.mean_motion = MINUTES_PER_DAY / 224.0;
        let rec = RecoveredElements::recover(&el).unwrap();
        assert_eq!(rec.regime, Regime::NearEarth);

        el.mean_motion = MINUTES_PER_DAY / 226.0;
        let rec = RecoveredElements::recover(&el).unwrap();
        assert_eq!(rec.regime, Regime::DeepSpace);
    }

    #[test]
    fn test_invalid_elements() {
        let mut el = sgp4_test_elements();
        el.eccentricity = 1.0;
        assert!(matches!(
            RecoveredElements::recover(&el),
            Err(SatvisError::InvalidInput(_))
        ));

        let mut el = sgp4_test_elements();
        el.mean_motion = 0.0;
        assert!(matches!(
            RecoveredElements::recover(&el),
            Err(SatvisError::InvalidInput(_))
        ));

        let mut el = sgp4_test_elements();
        el.bstar = f64::NAN;
        assert!(matches!(
            RecoveredElements::recover(&el),
            Err(SatvisError::InvalidInput(_))
        ));

        let mut el = sgp4_test_elements();
        el.epoch_day = 367.0;
        assert_eq!(
            RecoveredElements::recover(&el),
            Err(SatvisError::InvalidEpoch {
                year: 80,
                day: 367.0
            })
        );
    }

    #[test]
    fn test_revolutions() {
        let el = sgp4_test_elements();
        let epoch = el.validate().unwrap();
        assert_eq!(el.revolutions_at(epoch, epoch), 105);
        assert_eq!(el.revolutions_at(epoch, epoch + 1.0), 105 + 16);
    }

    #[test]
    fn test_serde_defaults() {
        let el = sgp4_test_elements();
        assert!(!el.reflective);
        assert!(el.standard_magnitude.is_none());
        assert!(el.to_string().starts_with("SGP4 TEST (88888)"));
    }
}

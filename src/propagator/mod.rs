//! # Analytic orbit propagation
//!
//! Dual-regime analytic propagator for Earth satellites given by mean elements.
//!
//! - **Near-Earth** ([`near_earth`]): zonal harmonics J2–J4 and a power-density
//!   atmospheric drag model, for recovered periods below 225 minutes.
//! - **Deep-space** ([`deep_space`]): the same zonal terms plus lunar and solar
//!   gravitational perturbations and, for 12-hour and 24-hour orbits, geopotential
//!   resonance terms integrated numerically.
//!
//! Both branches end in the same stage: long-period J3 terms, Kepler's equation in
//! equinoctial form ([`kepler::solve_kepler`]), short-period J2 terms and the assembly
//! of position/velocity from the orientation vectors.
//!
//! ## Construction & state
//!
//! [`Propagator::new`] performs all one-time setup. After construction the only state
//! that changes is owned by the deep-space branch (resonance integrator and the cache
//! of lunar-solar periodic terms), which is why [`Propagator::propagate`] takes
//! `&mut self`. Use one propagator per satellite per thread.
//!
//! ## Frames & units
//!
//! Output vectors are expressed in the true-equator, mean-equinox inertial frame of
//! the theory, in **km** and **km/s**. Time arguments are minutes since epoch
//! ([`Propagator::propagate`]) or Julian Dates ([`Propagator::propagate_jd`]).
//!
//! ## Errors
//!
//! Only construction can fail (see [`RecoveredElements::recover`]). Propagation
//! itself never errors; the Kepler solve falls back on its last iterate.
//!
//! Once drag has shrunk the orbit into the Earth (radius below one Earth radius,
//! non-positive semi-latus rectum or non-finite terms) the state is reported with
//! [`PositionVelocity::decayed`] set. Position and velocity then describe a circular
//! motion on the Earth's surface along the mean orbit plane, finite but meaningless.

pub mod deep_space;
pub mod kepler;
pub mod near_earth;

use nalgebra::Vector3;

use crate::constants::{
    JulianDay, Minutes, AE, CK2, CK4, MINUTES_PER_DAY, QOMS2T, SECONDS_PER_DAY, S_DENSITY, XJ3,
    XKE, XKMPER,
};
use crate::elements::{OrbitalElementSet, RecoveredElements, Regime};
use crate::satvis_errors::SatvisError;

use self::deep_space::{DeepSpaceTerms, ResonanceIntegrator};
use self::kepler::{principal_angle, solve_kepler};
use self::near_earth::NearEarthTerms;

/// Lower and upper bounds applied to the perturbed eccentricity before the Kepler solve.
const ECC_MIN: f64 = 1e-6;
const ECC_MAX: f64 = 0.999_999;

/// Guard for the `1 + cos i` divisor of the long-period coefficient at i = 180°.
const COSIO_GUARD: f64 = 1.5e-12;

/// Inertial position and velocity of a satellite at a requested time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionVelocity {
    /// Position in km.
    pub position: Vector3<f64>,
    /// Velocity in km/s.
    pub velocity: Vector3<f64>,
    /// Minutes elapsed since the element epoch.
    pub tsince: Minutes,
    /// Julian Date of the state.
    pub jd: JulianDay,
    /// The orbit has decayed at this time; position and velocity are placeholders.
    pub decayed: bool,
}

/// Mean elements at a requested time, after secular and lunar-solar corrections and
/// before the long-period and short-period terms.
///
/// Angles in radians, semi-major axis in Earth radii.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeanElements {
    pub semi_major_axis: f64,
    pub eccentricity: f64,
    pub inclination: f64,
    pub arg_perigee: f64,
    pub raan: f64,
    /// Mean longitude `M + ω + Ω`.
    pub mean_longitude: f64,
}

impl MeanElements {
    /// Mean anomaly in [0, 2π).
    pub fn mean_anomaly(&self) -> f64 {
        principal_angle(self.mean_longitude - self.arg_perigee - self.raan)
    }
}

/// Outcome of the osculating stage, in Earth radii and Earth radii per minute.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Osculating {
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub converged: bool,
    pub decayed: bool,
}

/// Unit position and in-plane transverse directions for an argument of latitude,
/// inclination and node.
fn orientation(u: f64, inclination: f64, node: f64) -> (Vector3<f64>, Vector3<f64>) {
    let (sinu, cosu) = u.sin_cos();
    let (sini, cosi) = inclination.sin_cos();
    let (sinno, cosno) = node.sin_cos();
    let xmx = -sinno * cosi;
    let xmy = cosno * cosi;
    (
        Vector3::new(xmx * sinu + cosno * cosu, xmy * sinu + sinno * cosu, sini * sinu),
        Vector3::new(xmx * cosu - cosno * sinu, xmy * cosu - sinno * sinu, sini * cosu),
    )
}

/// Placeholder state of a decayed orbit: circular motion at one Earth radius in the
/// mean orbit plane.
fn decayed_state(mean: &MeanElements) -> Osculating {
    let finite = |x: f64| if x.is_finite() { x } else { 0.0 };
    let (ux, vx) = orientation(
        finite(mean.mean_longitude - mean.raan),
        finite(mean.inclination),
        finite(mean.raan),
    );
    Osculating {
        position: ux * AE,
        velocity: vx * XKE,
        converged: false,
        decayed: true,
    }
}

/// Secular drift shared by both branches, before any branch-specific term.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SecularDrift {
    pub xmdf: f64,
    pub omgadf: f64,
    pub xnode: f64,
    pub tempa: f64,
    pub tempe: f64,
    pub templ: f64,
}

/// Constants derived once per satellite and shared by the two branches.
///
/// Immutable after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct PropagatorState {
    pub recovered: RecoveredElements,

    /// Density function parameter, adjusted for low perigees.
    pub s4: f64,
    /// (q0 − s)⁴, adjusted for low perigees.
    pub qoms24: f64,
    pub tsi: f64,
    pub eta: f64,
    pub etasq: f64,
    pub eeta: f64,
    pub coef: f64,
    pub coef1: f64,

    pub c1: f64,
    pub c4: f64,
    /// Secular rate of the mean anomaly (rad/min).
    pub xmdot: f64,
    /// Secular rate of the argument of perigee (rad/min).
    pub omgdot: f64,
    /// Secular rate of the ascending node (rad/min).
    pub xnodot: f64,
    pub xnodcf: f64,
    pub t2cof: f64,
    pub xlcof: f64,
    pub aycof: f64,
    pub x1mth2: f64,
    pub x7thm1: f64,
    pub a3ovk2: f64,

    /// Perigee below 220 km: cubic and quartic drag terms are dropped.
    pub simplified_drag: bool,
}

impl PropagatorState {
    /// Compute the drag and zonal-harmonic coefficients common to both branches.
    pub fn new(recovered: RecoveredElements) -> Self {
        let r = &recovered;
        let aodp = r.aodp;
        let xnodp = r.xnodp;

        let simplified_drag = r.perigee_height() < 220.0 / XKMPER;

        // Atmospheric density parameters, lowered for perigees under 156 km
        let perigee_km = r.perigee_height() * XKMPER;
        let (s4, qoms24) = if perigee_km < 156.0 {
            let s4_km = if perigee_km <= 98.0 {
                20.0
            } else {
                perigee_km - 78.0
            };
            (
                s4_km / XKMPER + AE,
                ((120.0 - s4_km) * AE / XKMPER).powi(4),
            )
        } else {
            (S_DENSITY, QOMS2T)
        };

        let pinvsq = 1.0 / (aodp * aodp * r.betao2 * r.betao2);
        let tsi = 1.0 / (aodp - s4);
        let eta = aodp * r.eo * tsi;
        let etasq = eta * eta;
        let eeta = r.eo * eta;
        let psisq = (1.0 - etasq).abs();
        let coef = qoms24 * tsi.powi(4);
        let coef1 = coef / psisq.powf(3.5);

        let c2 = coef1
            * xnodp
            * (aodp * (1.0 + 1.5 * etasq + eeta * (4.0 + etasq))
                + 0.75 * CK2 * tsi / psisq * r.x3thm1 * (8.0 + 3.0 * etasq * (8.0 + etasq)));
        let c1 = r.bstar * c2;

        let a3ovk2 = -XJ3 / CK2 * AE.powi(3);
        let x1mth2 = 1.0 - r.theta2;

        let c4 = 2.0
            * xnodp
            * coef1
            * aodp
            * r.betao2
            * (eta * (2.0 + 0.5 * etasq) + r.eo * (0.5 + 2.0 * etasq)
                - 2.0 * CK2 * tsi / (aodp * psisq)
                    * (-3.0 * r.x3thm1 * (1.0 - 2.0 * eeta + etasq * (1.5 - 0.5 * eeta))
                        + 0.75
                            * x1mth2
                            * (2.0 * etasq - eeta * (1.0 + etasq))
                            * (2.0 * r.omegao).cos()));

        // Secular rates from J2 and J4
        let theta4 = r.theta2 * r.theta2;
        let temp1 = 3.0 * CK2 * pinvsq * xnodp;
        let temp2 = temp1 * CK2 * pinvsq;
        let temp3 = 1.25 * CK4 * pinvsq * pinvsq * xnodp;

        let xmdot = xnodp
            + 0.5 * temp1 * r.betao * r.x3thm1
            + 0.0625 * temp2 * r.betao * (13.0 - 78.0 * r.theta2 + 137.0 * theta4);
        let x1m5th = 1.0 - 5.0 * r.theta2;
        let omgdot = -0.5 * temp1 * x1m5th
            + 0.0625 * temp2 * (7.0 - 114.0 * r.theta2 + 395.0 * theta4)
            + temp3 * (3.0 - 36.0 * r.theta2 + 49.0 * theta4);
        let xhdot1 = -temp1 * r.cosio;
        let xnodot = xhdot1
            + (0.5 * temp2 * (4.0 - 19.0 * r.theta2) + 2.0 * temp3 * (3.0 - 7.0 * r.theta2))
                * r.cosio;

        let mut denom = 1.0 + r.cosio;
        if denom.abs() < COSIO_GUARD {
            denom = COSIO_GUARD;
        }

        PropagatorState {
            s4,
            qoms24,
            tsi,
            eta,
            etasq,
            eeta,
            coef,
            coef1,
            c1,
            c4,
            xmdot,
            omgdot,
            xnodot,
            xnodcf: 3.5 * r.betao2 * xhdot1 * c1,
            t2cof: 1.5 * c1,
            xlcof: 0.125 * a3ovk2 * r.sinio * (3.0 + 5.0 * r.cosio) / denom,
            aycof: 0.25 * a3ovk2 * r.sinio,
            x1mth2,
            x7thm1: 7.0 * r.theta2 - 1.0,
            a3ovk2,
            simplified_drag,
            recovered,
        }
    }

    /// Linear and quadratic secular terms shared by both branches.
    pub(crate) fn secular(&self, tsince: Minutes) -> SecularDrift {
        let r = &self.recovered;
        let tsq = tsince * tsince;
        SecularDrift {
            xmdf: r.xmo + self.xmdot * tsince,
            omgadf: r.omegao + self.omgdot * tsince,
            xnode: r.xnodeo + self.xnodot * tsince + self.xnodcf * tsq,
            tempa: 1.0 - self.c1 * tsince,
            tempe: r.bstar * self.c4 * tsince,
            templ: self.t2cof * tsq,
        }
    }

    /// Long-period, Kepler and short-period stages, then position/velocity assembly.
    ///
    /// Arguments
    /// ---------
    /// * `mean`: corrected mean elements at the requested time.
    ///
    /// Return
    /// ------
    /// * the osculating state with the convergence flag of the Kepler solve, or the
    ///   placeholder of [`decayed_state`] when the orbit has reached the Earth.
    pub(crate) fn osculating(&self, mean: &MeanElements) -> Osculating {
        let r = &self.recovered;
        let a = mean.semi_major_axis;
        if !(a.is_finite() && a > 0.0) {
            return decayed_state(mean);
        }
        let e = mean.eccentricity.clamp(ECC_MIN, ECC_MAX);
        let omega = mean.arg_perigee;
        let xnode = mean.raan;

        let beta = (1.0 - e * e).sqrt();
        let xn = XKE / a.powf(1.5);

        // Long-period periodics
        let axn = e * omega.cos();
        let temp = 1.0 / (a * beta * beta);
        let xll = temp * self.xlcof * axn;
        let aynl = temp * self.aycof;
        let xlt = mean.mean_longitude + xll;
        let ayn = e * omega.sin() + aynl;

        let capu = principal_angle(xlt - xnode);
        let (epw, converged) = solve_kepler(capu, axn, ayn);
        let (sinepw, cosepw) = epw.sin_cos();

        // Short-period preliminary quantities
        let ecose = axn * cosepw + ayn * sinepw;
        let esine = axn * sinepw - ayn * cosepw;
        let elsq = axn * axn + ayn * ayn;
        let temp = 1.0 - elsq;
        let pl = a * temp;
        if pl.is_nan() || pl <= 0.0 {
            return decayed_state(mean);
        }
        let radius = a * (1.0 - ecose);
        let temp1 = 1.0 / radius;
        let rdot = XKE * a.sqrt() * esine * temp1;
        let rfdot = XKE * pl.sqrt() * temp1;
        let temp2 = a * temp1;
        let betal = temp.sqrt();
        let temp3 = 1.0 / (1.0 + betal);
        let cosu = temp2 * (cosepw - axn + ayn * esine * temp3);
        let sinu = temp2 * (sinepw - ayn - axn * esine * temp3);
        let u = sinu.atan2(cosu);
        let sin2u = 2.0 * sinu * cosu;
        let cos2u = 2.0 * cosu * cosu - 1.0;

        // Short-period J2 corrections
        let temp = 1.0 / pl;
        let temp1 = CK2 * temp;
        let temp2 = temp1 * temp;
        let rk = radius * (1.0 - 1.5 * temp2 * betal * r.x3thm1)
            + 0.5 * temp1 * self.x1mth2 * cos2u;
        let uk = u - 0.25 * temp2 * self.x7thm1 * sin2u;
        let xnodek = xnode + 1.5 * temp2 * r.cosio * sin2u;
        let xinck = mean.inclination + 1.5 * temp2 * r.cosio * r.sinio * cos2u;
        let rdotk = rdot - xn * temp1 * self.x1mth2 * sin2u;
        let rfdotk = rfdot + xn * temp1 * (self.x1mth2 * cos2u + 1.5 * r.x3thm1);

        // below the surface
        if rk.is_nan() || rk < AE {
            return decayed_state(mean);
        }

        let (ux, vx) = orientation(uk, xinck, xnodek);
        let position = rk * ux;
        let velocity = rdotk * ux + rfdotk * vx;
        if !position.iter().chain(velocity.iter()).all(|x| x.is_finite()) {
            return decayed_state(mean);
        }

        Osculating {
            position,
            velocity,
            converged,
            decayed: false,
        }
    }
}

#[derive(Debug, Clone)]
enum Model {
    NearEarth(NearEarthTerms),
    DeepSpace(Box<DeepSpaceTerms>),
}

/// Analytic propagator for one satellite.
///
/// Built once with [`Propagator::new`]; the regime is fixed for the lifetime of the
/// instance.
///
/// See also
/// ------------
/// * [`propagate`] – one-shot propagation to a Julian Date.
/// * [`observe`](crate::ephemeris::observe) – topocentric observables on top of this.
#[derive(Debug, Clone)]
pub struct Propagator {
    elements: OrbitalElementSet,
    state: PropagatorState,
    model: Model,
}

impl Propagator {
    /// Recover the elements and precompute every coefficient of the selected branch.
    ///
    /// Arguments
    /// ---------
    /// * `elements`: the catalog elements, copied into the propagator.
    ///
    /// Return
    /// ------
    /// * a ready-to-use propagator.
    ///
    /// Errors
    /// ------
    /// * [`SatvisError::InvalidEpoch`] or [`SatvisError::InvalidInput`] from
    ///   [`RecoveredElements::recover`].
    pub fn new(elements: &OrbitalElementSet) -> Result<Self, SatvisError> {
        let recovered = RecoveredElements::recover(elements)?;
        let state = PropagatorState::new(recovered);

        let model = match state.recovered.regime {
            Regime::NearEarth => Model::NearEarth(NearEarthTerms::new(&state)),
            Regime::DeepSpace => Model::DeepSpace(Box::new(DeepSpaceTerms::new(&state))),
        };

        let resonance = match &model {
            Model::DeepSpace(ds) => ds.resonance().map(|r| r.kind()),
            Model::NearEarth(_) => None,
        };
        tracing::debug!(
            satellite = %elements.name,
            catalog = elements.catalog_number,
            regime = %state.recovered.regime,
            period_min = state.recovered.period,
            simplified_drag = state.simplified_drag,
            resonance = ?resonance,
            "propagator initialised"
        );

        Ok(Propagator {
            elements: elements.clone(),
            state,
            model,
        })
    }

    /// The element set this propagator was built from.
    pub fn elements(&self) -> &OrbitalElementSet {
        &self.elements
    }

    /// Derived constants of the theory.
    pub fn state(&self) -> &PropagatorState {
        &self.state
    }

    pub fn regime(&self) -> Regime {
        self.state.recovered.regime
    }

    /// Recovered orbital period in minutes.
    pub fn period(&self) -> Minutes {
        self.state.recovered.period
    }

    /// Julian Date of the element epoch.
    pub fn epoch_jd(&self) -> JulianDay {
        self.state.recovered.epoch_jd
    }

    /// Resonance integrator of a resonant deep-space orbit, `None` otherwise.
    pub fn resonance(&self) -> Option<&ResonanceIntegrator> {
        match &self.model {
            Model::DeepSpace(ds) => ds.resonance(),
            Model::NearEarth(_) => None,
        }
    }

    /// Mean elements at `tsince` minutes from epoch, before periodic J2/J3 terms.
    ///
    /// For deep-space orbits this advances the resonance integrator and may refresh the
    /// lunar-solar periodic cache.
    pub fn mean_elements(&mut self, tsince: Minutes) -> MeanElements {
        let secular = self.state.secular(tsince);
        match &mut self.model {
            Model::NearEarth(terms) => terms.mean_elements(&self.state, tsince, secular),
            Model::DeepSpace(terms) => terms.mean_elements(&self.state, tsince, secular),
        }
    }

    /// Propagate to `tsince` minutes from epoch.
    ///
    /// Return
    /// ------
    /// * position (km) and velocity (km/s) in the inertial frame of the theory.
    pub fn propagate(&mut self, tsince: Minutes) -> PositionVelocity {
        self.propagate_with_status(tsince).0
    }

    /// Propagate to `tsince` minutes from epoch and report whether the Kepler solve
    /// converged.
    ///
    /// The flag is `false` for a decayed state.
    pub fn propagate_with_status(&mut self, tsince: Minutes) -> (PositionVelocity, bool) {
        let mean = self.mean_elements(tsince);
        let osc = self.state.osculating(&mean);
        if osc.decayed {
            tracing::trace!(
                satellite = %self.elements.name,
                tsince,
                "orbit decayed, returning a placeholder state"
            );
        }

        let pv = PositionVelocity {
            position: osc.position * XKMPER,
            velocity: osc.velocity * (XKMPER / 60.0),
            tsince,
            jd: self.epoch_jd() + tsince / MINUTES_PER_DAY,
            decayed: osc.decayed,
        };
        (pv, osc.converged)
    }

    /// Propagate to a Julian Date.
    pub fn propagate_jd(&mut self, jd: JulianDay) -> PositionVelocity {
        let tsince = (jd - self.epoch_jd()) * MINUTES_PER_DAY;
        let mut pv = self.propagate(tsince);
        pv.jd = jd;
        pv
    }

    /// Revolution count at a Julian Date.
    pub fn revolutions_at(&self, jd: JulianDay) -> i64 {
        self.elements.revolutions_at(self.epoch_jd(), jd)
    }

    /// Mean altitude above the equatorial radius, in km, from the recovered semi-major axis.
    pub fn mean_altitude(&self) -> f64 {
        (self.state.recovered.aodp - AE) * XKMPER
    }

    /// Orbital period in seconds.
    pub fn period_seconds(&self) -> f64 {
        self.period() * SECONDS_PER_DAY / MINUTES_PER_DAY
    }
}

/// Propagate an element set to a Julian Date.
///
/// Arguments
/// ---------
/// * `elements`: the catalog elements.
/// * `jd`: requested Julian Date (UTC).
///
/// Return
/// ------
/// * position (km) and velocity (km/s) in the inertial frame of the theory.
///
/// Errors
/// ------
/// * construction errors of [`Propagator::new`].
///
/// See also
/// ------------
/// * [`Propagator::propagate_jd`] – repeated propagation without rebuilding the state.
pub fn propagate(
    elements: &OrbitalElementSet,
    jd: JulianDay,
) -> Result<PositionVelocity, SatvisError> {
    let mut propagator = Propagator::new(elements)?;
    Ok(propagator.propagate_jd(jd))
}

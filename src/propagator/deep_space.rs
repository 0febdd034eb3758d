//! # Deep-space perturbations
//!
//! Lunar-solar and geopotential-resonance corrections for orbits whose recovered period
//! is 225 minutes or more.
//!
//! ## Structure
//!
//! * **Setup** ([`DeepSpaceTerms::new`]): sidereal time at epoch, the position of the
//!   lunar node from a 1950-referenced model, then the secular rates ([`SecularRates`])
//!   and periodic amplitudes ([`PeriodicCoefficients`]) of the Sun and the Moon.
//!   The orbit is then classified into a [`ResonanceKind`].
//! * **Secular step**: lunar-solar rates applied linearly in time. Resonant orbits also
//!   advance a [`ResonanceIntegrator`] which replaces the mean motion and mean longitude.
//! * **Periodic step**: lunar-solar periodic terms, cached for 30 minutes of
//!   propagation time, applied directly or through the Lyddane substitution for
//!   inclinations below 0.2 rad.
//!
//! ## Resonance integrator
//!
//! The integrator advances the mean-longitude-like phase `xli` and the mean-motion-like
//! rate `xni` from epoch with a fixed ±720 minute step and a second-order Taylor update.
//! It is a small state machine:
//!
//! ```text
//!            request t                    sign(t) ≠ sign(last) or |t| < |atime|
//!   Reset ──────────────▶ Stepping ◀─────────────────────────────────────────────┐
//!                           │  step toward t while |t − atime| ≥ 720            │
//!                           └───────────────────────────────────────────────────┘
//! ```
//!
//! so requests alternating in sign restart from epoch every time.

use std::f64::consts::PI;

use crate::constants::{Minutes, DPI, TOTHRD, XKE};
use crate::time::{days_since_1950, thetag_1950};

use super::{MeanElements, PropagatorState, SecularDrift};

// -------------------------------------------------------------------------------------------------
// Lunar-solar constants (1950-referenced)
// -------------------------------------------------------------------------------------------------

/// Solar mean motion (rad/min)
const ZNS: f64 = 1.19459e-5;
/// Solar perturbation coefficient
const C1SS: f64 = 2.9864797e-6;
/// Solar eccentricity
const ZES: f64 = 0.01675;
/// Lunar mean motion (rad/min)
const ZNL: f64 = 1.5835218e-4;
/// Lunar perturbation coefficient
const C1L: f64 = 4.7968065e-7;
/// Lunar eccentricity
const ZEL: f64 = 0.05490;
/// cos and sin of the solar inclination to the equator
const ZCOSIS: f64 = 0.91744867;
const ZSINIS: f64 = 0.39785416;
/// sin and cos of the solar argument of perigee
const ZSINGS: f64 = -0.98088458;
const ZCOSGS: f64 = 0.1945905;

/// Earth rotation rate (rad/min) used by the resonance terms
const THDT: f64 = 4.3752691e-3;

/// Inclination (3°) below which the solar and lunar node rates are dropped.
const SMALL_INCLINATION: f64 = 5.2359877e-2;

/// Inclination below which the Lyddane substitution is used for the periodic terms.
const LYDDANE_INCLINATION: f64 = 0.2;

/// Minutes of propagation time a periodic evaluation stays valid.
const PERIODIC_CACHE_SPAN: Minutes = 30.0;

// -------------------------------------------------------------------------------------------------
// Resonance constants
// -------------------------------------------------------------------------------------------------

/// Synchronous resonance band (rad/min).
const SYNCHRONOUS_BAND: (f64, f64) = (0.0034906585, 0.0052359877);
/// 12-hour resonance band (rad/min), only for eccentricities from 0.5 up.
const HALF_DAY_BAND: (f64, f64) = (0.00826, 0.00924);
const HALF_DAY_MIN_ECC: f64 = 0.5;

/// Phase angles of the synchronous terms.
const FASX2: f64 = 0.13130908;
const FASX4: f64 = 2.8843198;
const FASX6: f64 = 0.37448087;

/// Phase angles of the 12-hour tesseral terms.
const G22: f64 = 5.7686396;
const G32: f64 = 0.95240898;
const G44: f64 = 1.8014998;
const G52: f64 = 1.0508330;
const G54: f64 = 4.4108898;

/// Normalized tesseral harmonic amplitudes of the 12-hour terms.
const ROOT22: f64 = 1.7891679e-6;
const ROOT32: f64 = 3.7393792e-7;
const ROOT44: f64 = 7.3636953e-9;
const ROOT52: f64 = 1.1428639e-7;
const ROOT54: f64 = 2.1765803e-9;

/// Amplitudes of the synchronous terms.
const Q22: f64 = 1.7891679e-6;
const Q31: f64 = 2.1460748e-6;
const Q33: f64 = 2.2123015e-7;

/// Integrator step (minutes) and half its square.
const STEP: f64 = 720.0;
const STEP2: f64 = 259_200.0;

/// Secular rates of the lunar-solar perturbations (per minute).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SecularRates {
    pub sse: f64,
    pub ssi: f64,
    pub ssl: f64,
    pub ssg: f64,
    pub ssh: f64,
}

/// Periodic amplitudes of one perturbing body.
///
/// Multiply `*2` terms by `f2`, `*3` by `f3` and `*4` by `sin zf`, with `zf` the true
/// anomaly of the body.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PeriodicCoefficients {
    pub e2: f64,
    pub e3: f64,
    pub i2: f64,
    pub i3: f64,
    pub l2: f64,
    pub l3: f64,
    pub l4: f64,
    pub gh2: f64,
    pub gh3: f64,
    pub gh4: f64,
    pub h2: f64,
    pub h3: f64,
}

/// Unscaled contributions of one body: secular rates before the `sin i` division, and
/// its periodic amplitudes.
struct BodyTerms {
    se: f64,
    si: f64,
    sl: f64,
    sgh: f64,
    sh: f64,
    periodic: PeriodicCoefficients,
}

/// Orientation and strength of a perturbing body seen from the satellite orbit.
struct BodyGeometry {
    zcosg: f64,
    zsing: f64,
    zcosi: f64,
    zsini: f64,
    zcosh: f64,
    zsinh: f64,
    cc: f64,
    zn: f64,
    ze: f64,
}

/// Orbit quantities entering the lunar-solar amplitudes.
struct OrbitGeometry {
    eq: f64,
    eqsq: f64,
    siniq: f64,
    cosiq: f64,
    rteqsq: f64,
    bsq: f64,
    sing: f64,
    cosg: f64,
    xnoi: f64,
    xqncl: f64,
}

impl BodyGeometry {
    fn terms(&self, orbit: &OrbitGeometry) -> BodyTerms {
        let OrbitGeometry {
            eq,
            eqsq,
            siniq,
            cosiq,
            rteqsq,
            bsq,
            sing,
            cosg,
            xnoi,
            xqncl,
        } = *orbit;

        let a1 = self.zcosg * self.zcosh + self.zsing * self.zcosi * self.zsinh;
        let a3 = -self.zsing * self.zcosh + self.zcosg * self.zcosi * self.zsinh;
        let a7 = -self.zcosg * self.zsinh + self.zsing * self.zcosi * self.zcosh;
        let a8 = self.zsing * self.zsini;
        let a9 = self.zsing * self.zsinh + self.zcosg * self.zcosi * self.zcosh;
        let a10 = self.zcosg * self.zsini;
        let a2 = cosiq * a7 + siniq * a8;
        let a4 = cosiq * a9 + siniq * a10;
        let a5 = -siniq * a7 + cosiq * a8;
        let a6 = -siniq * a9 + cosiq * a10;

        let x1 = a1 * cosg + a2 * sing;
        let x2 = a3 * cosg + a4 * sing;
        let x3 = -a1 * sing + a2 * cosg;
        let x4 = -a3 * sing + a4 * cosg;
        let x5 = a5 * sing;
        let x6 = a6 * sing;
        let x7 = a5 * cosg;
        let x8 = a6 * cosg;

        let z31 = 12.0 * x1 * x1 - 3.0 * x3 * x3;
        let z32 = 24.0 * x1 * x2 - 6.0 * x3 * x4;
        let z33 = 12.0 * x2 * x2 - 3.0 * x4 * x4;
        let mut z1 = 3.0 * (a1 * a1 + a2 * a2) + z31 * eqsq;
        let mut z2 = 6.0 * (a1 * a3 + a2 * a4) + z32 * eqsq;
        let mut z3 = 3.0 * (a3 * a3 + a4 * a4) + z33 * eqsq;
        let z11 = -6.0 * a1 * a5 + eqsq * (-24.0 * x1 * x7 - 6.0 * x3 * x5);
        let z12 = -6.0 * (a1 * a6 + a3 * a5)
            + eqsq * (-24.0 * (x2 * x7 + x1 * x8) - 6.0 * (x3 * x6 + x4 * x5));
        let z13 = -6.0 * a3 * a6 + eqsq * (-24.0 * x2 * x8 - 6.0 * x4 * x6);
        let z21 = 6.0 * a2 * a5 + eqsq * (24.0 * x1 * x5 - 6.0 * x3 * x7);
        let z22 = 6.0 * (a4 * a5 + a2 * a6)
            + eqsq * (24.0 * (x2 * x5 + x1 * x6) - 6.0 * (x4 * x7 + x3 * x8));
        let z23 = 6.0 * a4 * a6 + eqsq * (24.0 * x2 * x6 - 6.0 * x4 * x8);
        z1 = z1 + z1 + bsq * z31;
        z2 = z2 + z2 + bsq * z32;
        z3 = z3 + z3 + bsq * z33;

        let s3 = self.cc * xnoi;
        let s2 = -0.5 * s3 / rteqsq;
        let s4 = s3 * rteqsq;
        let s1 = -15.0 * eq * s4;
        let s5 = x1 * x3 + x2 * x4;
        let s6 = x2 * x3 + x1 * x4;
        let s7 = x2 * x4 - x1 * x3;

        let zn = self.zn;
        let sh = if xqncl < SMALL_INCLINATION {
            0.0
        } else {
            -zn * s2 * (z21 + z23)
        };

        BodyTerms {
            se: s1 * zn * s5,
            si: s2 * zn * (z11 + z13),
            sl: -zn * s3 * (z1 + z3 - 14.0 - 6.0 * eqsq),
            sgh: s4 * zn * (z31 + z33 - 6.0),
            sh,
            periodic: PeriodicCoefficients {
                e2: 2.0 * s1 * s6,
                e3: 2.0 * s1 * s7,
                i2: 2.0 * s2 * z12,
                i3: 2.0 * s2 * (z13 - z11),
                l2: -2.0 * s3 * z2,
                l3: -2.0 * s3 * (z3 - z1),
                l4: -2.0 * s3 * (-21.0 - 9.0 * eqsq) * self.ze,
                gh2: 2.0 * s4 * z32,
                gh3: 2.0 * s4 * (z33 - z31),
                gh4: -18.0 * s4 * self.ze,
                h2: -2.0 * s2 * z22,
                h3: -2.0 * s2 * (z23 - z21),
            },
        }
    }
}

/// Geopotential resonance class of a deep-space orbit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResonanceKind {
    /// One revolution per sidereal day.
    Synchronous,
    /// Two revolutions per sidereal day, eccentric (Molniya-type) orbits.
    HalfDay,
}

/// Resonance coefficients, one variant per [`ResonanceKind`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resonance {
    Synchronous {
        del1: f64,
        del2: f64,
        del3: f64,
    },
    HalfDay {
        d2201: f64,
        d2211: f64,
        d3210: f64,
        d3222: f64,
        d4410: f64,
        d4422: f64,
        d5220: f64,
        d5232: f64,
        d5421: f64,
        d5433: f64,
    },
}

impl Resonance {
    /// Classify an orbit and build its resonance coefficients.
    ///
    /// Arguments
    /// ---------
    /// * `xnq`: recovered mean motion (rad/min).
    /// * `eq`: eccentricity.
    /// * `cosiq`, `siniq`: cosine and sine of the inclination.
    /// * `aqnv`: inverse of the recovered semi-major axis.
    ///
    /// Return
    /// ------
    /// * `None` outside both resonance bands.
    pub fn classify(xnq: f64, eq: f64, cosiq: f64, siniq: f64, aqnv: f64) -> Option<Resonance> {
        let eqsq = eq * eq;
        let theta2 = cosiq * cosiq;

        if xnq > SYNCHRONOUS_BAND.0 && xnq < SYNCHRONOUS_BAND.1 {
            let g200 = 1.0 + eqsq * (-2.5 + 0.8125 * eqsq);
            let g310 = 1.0 + 2.0 * eqsq;
            let g300 = 1.0 + eqsq * (-6.0 + 6.60937 * eqsq);
            let f220 = 0.75 * (1.0 + cosiq) * (1.0 + cosiq);
            let f311 = 0.9375 * siniq * siniq * (1.0 + 3.0 * cosiq) - 0.75 * (1.0 + cosiq);
            let f330 = 1.875 * (1.0 + cosiq).powi(3);
            let del1 = 3.0 * xnq * xnq * aqnv * aqnv;
            return Some(Resonance::Synchronous {
                del1: del1 * f311 * g310 * Q31 * aqnv,
                del2: 2.0 * del1 * f220 * g200 * Q22,
                del3: 3.0 * del1 * f330 * g300 * Q33 * aqnv,
            });
        }

        if xnq < HALF_DAY_BAND.0 || xnq > HALF_DAY_BAND.1 || eq < HALF_DAY_MIN_ECC {
            return None;
        }

        let eoc = eq * eqsq;
        let g201 = -0.306 - (eq - 0.64) * 0.440;
        let (g211, g310, g322, g410, g422, g520) = if eq <= 0.65 {
            (
                3.616 - 13.247 * eq + 16.290 * eqsq,
                -19.302 + 117.390 * eq - 228.419 * eqsq + 156.591 * eoc,
                -18.9068 + 109.7927 * eq - 214.6334 * eqsq + 146.5816 * eoc,
                -41.122 + 242.694 * eq - 471.094 * eqsq + 313.953 * eoc,
                -146.407 + 841.880 * eq - 1629.014 * eqsq + 1083.435 * eoc,
                -532.114 + 3017.977 * eq - 5740.0 * eqsq + 3708.276 * eoc,
            )
        } else {
            let g520 = if eq <= 0.715 {
                1464.74 - 4664.75 * eq + 3763.64 * eqsq
            } else {
                -5149.66 + 29936.92 * eq - 54087.36 * eqsq + 31324.56 * eoc
            };
            (
                -72.099 + 331.819 * eq - 508.738 * eqsq + 266.724 * eoc,
                -346.844 + 1582.851 * eq - 2415.925 * eqsq + 1246.113 * eoc,
                -342.585 + 1554.908 * eq - 2366.899 * eqsq + 1215.972 * eoc,
                -1052.797 + 4758.686 * eq - 7193.992 * eqsq + 3651.957 * eoc,
                -3581.69 + 16178.11 * eq - 24462.77 * eqsq + 12422.52 * eoc,
                g520,
            )
        };
        let (g533, g521, g532) = if eq < 0.7 {
            (
                -919.2277 + 4988.61 * eq - 9064.77 * eqsq + 5542.21 * eoc,
                -822.71072 + 4568.6173 * eq - 8491.4146 * eqsq + 5337.524 * eoc,
                -853.666 + 4690.25 * eq - 8624.77 * eqsq + 5341.4 * eoc,
            )
        } else {
            (
                -37995.78 + 161616.52 * eq - 229838.2 * eqsq + 109377.94 * eoc,
                -51752.104 + 218913.95 * eq - 309468.16 * eqsq + 146349.42 * eoc,
                -40023.88 + 170470.89 * eq - 242699.48 * eqsq + 115605.82 * eoc,
            )
        };

        let sini2 = siniq * siniq;
        let f220 = 0.75 * (1.0 + 2.0 * cosiq + theta2);
        let f221 = 1.5 * sini2;
        let f321 = 1.875 * siniq * (1.0 - 2.0 * cosiq - 3.0 * theta2);
        let f322 = -1.875 * siniq * (1.0 + 2.0 * cosiq - 3.0 * theta2);
        let f441 = 35.0 * sini2 * f220;
        let f442 = 39.3750 * sini2 * sini2;
        let f522 = 9.84375
            * siniq
            * (sini2 * (1.0 - 2.0 * cosiq - 5.0 * theta2)
                + 0.33333333 * (-2.0 + 4.0 * cosiq + 6.0 * theta2));
        let f523 = siniq
            * (4.92187512 * sini2 * (-2.0 - 4.0 * cosiq + 10.0 * theta2)
                + 6.56250012 * (1.0 + 2.0 * cosiq - 3.0 * theta2));
        let f542 = 29.53125
            * siniq
            * (2.0 - 8.0 * cosiq + theta2 * (-12.0 + 8.0 * cosiq + 10.0 * theta2));
        let f543 = 29.53125
            * siniq
            * (-2.0 - 8.0 * cosiq + theta2 * (12.0 + 8.0 * cosiq - 10.0 * theta2));

        let mut temp1 = 3.0 * xnq * xnq * aqnv * aqnv;
        let temp = temp1 * ROOT22;
        let d2201 = temp * f220 * g201;
        let d2211 = temp * f221 * g211;
        temp1 *= aqnv;
        let temp = temp1 * ROOT32;
        let d3210 = temp * f321 * g310;
        let d3222 = temp * f322 * g322;
        temp1 *= aqnv;
        let temp = 2.0 * temp1 * ROOT44;
        let d4410 = temp * f441 * g410;
        let d4422 = temp * f442 * g422;
        temp1 *= aqnv;
        let temp = temp1 * ROOT52;
        let d5220 = temp * f522 * g520;
        let d5232 = temp * f523 * g532;
        let temp = 2.0 * temp1 * ROOT54;
        let d5421 = temp * f542 * g521;
        let d5433 = temp * f543 * g533;

        Some(Resonance::HalfDay {
            d2201,
            d2211,
            d3210,
            d3222,
            d4410,
            d4422,
            d5220,
            d5232,
            d5421,
            d5433,
        })
    }

    pub fn kind(&self) -> ResonanceKind {
        match self {
            Resonance::Synchronous { .. } => ResonanceKind::Synchronous,
            Resonance::HalfDay { .. } => ResonanceKind::HalfDay,
        }
    }
}

/// Phase of the resonance integrator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IntegratorPhase {
    /// Next request restarts from epoch.
    Reset,
    /// Integrated up to `atime` minutes from epoch.
    Stepping { atime: f64, xli: f64, xni: f64 },
}

/// Numerical integrator of the resonance terms.
///
/// See the module documentation for the restart rule.
#[derive(Debug, Clone, PartialEq)]
pub struct ResonanceIntegrator {
    resonance: Resonance,
    /// Mean-longitude-like phase at epoch.
    xlamo: f64,
    /// Drift of the phase relative to the mean motion.
    xfact: f64,
    /// Recovered mean motion at epoch.
    xnq: f64,
    omegaq: f64,
    omgdot: f64,
    thgr: f64,
    phase: IntegratorPhase,
    last_requested: Option<Minutes>,
    resets: u64,
}

impl ResonanceIntegrator {
    pub fn kind(&self) -> ResonanceKind {
        self.resonance.kind()
    }

    pub fn resonance(&self) -> &Resonance {
        &self.resonance
    }

    pub fn phase(&self) -> IntegratorPhase {
        self.phase
    }

    /// Time of the previous request, `None` before the first one.
    pub fn last_requested(&self) -> Option<Minutes> {
        self.last_requested
    }

    /// Number of restarts from epoch so far.
    pub fn resets(&self) -> u64 {
        self.resets
    }

    /// Force a restart on the next request.
    pub fn reset(&mut self) {
        self.phase = IntegratorPhase::Reset;
    }

    /// Whether a request at `t` must restart from epoch.
    pub fn needs_reset(&self, t: Minutes) -> bool {
        match self.phase {
            IntegratorPhase::Reset => true,
            IntegratorPhase::Stepping { atime, .. } => {
                let reversed = self
                    .last_requested
                    .map_or(true, |last| (t >= 0.0) != (last >= 0.0));
                reversed || t.abs() < atime.abs()
            }
        }
    }

    /// Derivatives `(xldot, xndot, xnddt)` at a given integrator state.
    fn derivatives(&self, atime: f64, xli: f64, xni: f64) -> (f64, f64, f64) {
        let (xndot, xnddt) = match self.resonance {
            Resonance::Synchronous { del1, del2, del3 } => (
                del1 * (xli - FASX2).sin()
                    + del2 * (2.0 * (xli - FASX4)).sin()
                    + del3 * (3.0 * (xli - FASX6)).sin(),
                del1 * (xli - FASX2).cos()
                    + 2.0 * del2 * (2.0 * (xli - FASX4)).cos()
                    + 3.0 * del3 * (3.0 * (xli - FASX6)).cos(),
            ),
            Resonance::HalfDay {
                d2201,
                d2211,
                d3210,
                d3222,
                d4410,
                d4422,
                d5220,
                d5232,
                d5421,
                d5433,
            } => {
                let xomi = self.omegaq + self.omgdot * atime;
                let x2omi = xomi + xomi;
                let x2li = xli + xli;
                (
                    d2201 * (x2omi + xli - G22).sin()
                        + d2211 * (xli - G22).sin()
                        + d3210 * (xomi + xli - G32).sin()
                        + d3222 * (-xomi + xli - G32).sin()
                        + d4410 * (x2omi + x2li - G44).sin()
                        + d4422 * (x2li - G44).sin()
                        + d5220 * (xomi + xli - G52).sin()
                        + d5232 * (-xomi + xli - G52).sin()
                        + d5421 * (xomi + x2li - G54).sin()
                        + d5433 * (-xomi + x2li - G54).sin(),
                    d2201 * (x2omi + xli - G22).cos()
                        + d2211 * (xli - G22).cos()
                        + d3210 * (xomi + xli - G32).cos()
                        + d3222 * (-xomi + xli - G32).cos()
                        + d5220 * (xomi + xli - G52).cos()
                        + d5232 * (-xomi + xli - G52).cos()
                        + 2.0
                            * (d4410 * (x2omi + x2li - G44).cos()
                                + d4422 * (x2li - G44).cos()
                                + d5421 * (xomi + x2li - G54).cos()
                                + d5433 * (-xomi + x2li - G54).cos()),
                )
            }
        };

        let xldot = xni + self.xfact;
        (xldot, xndot, xnddt * xldot)
    }

    /// Integrate to `t` minutes from epoch.
    ///
    /// Arguments
    /// ---------
    /// * `t`: requested minutes since epoch.
    /// * `xnodes`: node after the lunar-solar secular step.
    /// * `omgasm`: argument of perigee after the lunar-solar secular step.
    ///
    /// Return
    /// ------
    /// * `(xll, xn)`: resonant mean anomaly and mean motion at `t`.
    pub fn advance(&mut self, t: Minutes, xnodes: f64, omgasm: f64) -> (f64, f64) {
        if self.needs_reset(t) {
            tracing::trace!(
                requested = t,
                previous = ?self.last_requested,
                "resonance integrator restarted from epoch"
            );
            self.phase = IntegratorPhase::Stepping {
                atime: 0.0,
                xli: self.xlamo,
                xni: self.xnq,
            };
            self.resets += 1;
        }
        self.last_requested = Some(t);

        let (mut atime, mut xli, mut xni) = match self.phase {
            IntegratorPhase::Stepping { atime, xli, xni } => (atime, xli, xni),
            IntegratorPhase::Reset => (0.0, self.xlamo, self.xnq),
        };
        let delt = if t >= 0.0 { STEP } else { -STEP };

        let (xldot, xndot, xnddt) = loop {
            let (xldot, xndot, xnddt) = self.derivatives(atime, xli, xni);
            if (t - atime).abs() < STEP {
                break (xldot, xndot, xnddt);
            }
            xli += xldot * delt + xndot * STEP2;
            xni += xndot * delt + xnddt * STEP2;
            atime += delt;
        };
        self.phase = IntegratorPhase::Stepping { atime, xli, xni };

        let ft = t - atime;
        let xn = xni + xndot * ft + xnddt * ft * ft * 0.5;
        let xl = xli + xldot * ft + xndot * ft * ft * 0.5;

        let temp = -xnodes + self.thgr + t * THDT;
        let xll = match self.resonance {
            Resonance::Synchronous { .. } => xl - omgasm + temp,
            Resonance::HalfDay { .. } => xl + temp + temp,
        };
        (xll, xn)
    }
}

/// Sum of the solar and lunar periodic terms at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LunarSolarPeriodics {
    pub pe: f64,
    pub pinc: f64,
    pub pl: f64,
    pub pgh: f64,
    pub ph: f64,
}

/// Deep-space coefficients and mutable state of one satellite.
#[derive(Debug, Clone, PartialEq)]
pub struct DeepSpaceTerms {
    /// Greenwich sidereal time at epoch.
    pub thgr: f64,
    pub xqncl: f64,
    pub siniq: f64,
    pub cosiq: f64,
    pub secular: SecularRates,
    pub solar: PeriodicCoefficients,
    pub lunar: PeriodicCoefficients,
    /// Mean anomaly of the Sun at epoch.
    zmos: f64,
    /// Mean anomaly of the Moon at epoch.
    zmol: f64,
    resonance: Option<ResonanceIntegrator>,
    /// Last periodic evaluation and its time.
    cache: Option<(Minutes, LunarSolarPeriodics)>,
}

impl DeepSpaceTerms {
    pub fn new(state: &PropagatorState) -> Self {
        let r = &state.recovered;
        let ds50 = days_since_1950(r.epoch_jd);
        let thgr = thetag_1950(ds50);

        let eq = r.eo;
        let xnq = r.xnodp;
        let aqnv = 1.0 / r.aodp;
        let xqncl = r.xincl;
        let siniq = r.sinio;
        let cosiq = r.cosio;
        let (sinq, cosq) = r.xnodeo.sin_cos();
        let (sing, cosg) = r.omegao.sin_cos();

        // Lunar node, inclination and perigee from the 1950 model
        let day = ds50 + 18261.5;
        let xnodce = 4.5236020 - 9.2422029e-4 * day;
        let (stem, ctem) = xnodce.sin_cos();
        let zcosil = 0.91375164 - 0.03568096 * ctem;
        let zsinil = (1.0 - zcosil * zcosil).sqrt();
        let zsinhl = 0.089683511 * stem / zsinil;
        let zcoshl = (1.0 - zsinhl * zsinhl).sqrt();
        let c = 4.7199672 + 0.22997150 * day;
        let gam = 5.8351514 + 0.0019443680 * day;
        let zmol = (c - gam).rem_euclid(DPI);
        let zx = 0.39785416 * stem / zsinil;
        let zy = zcoshl * ctem + 0.91744867 * zsinhl * stem;
        let zx = gam + zx.atan2(zy) - xnodce;
        let (zsingl, zcosgl) = zx.sin_cos();
        let zmos = (6.2565837 + 0.017201977 * day).rem_euclid(DPI);

        let orbit = OrbitGeometry {
            eq,
            eqsq: r.eosq,
            siniq,
            cosiq,
            rteqsq: r.betao,
            bsq: r.betao2,
            sing,
            cosg,
            xnoi: 1.0 / xnq,
            xqncl,
        };

        let sun = BodyGeometry {
            zcosg: ZCOSGS,
            zsing: ZSINGS,
            zcosi: ZCOSIS,
            zsini: ZSINIS,
            zcosh: cosq,
            zsinh: sinq,
            cc: C1SS,
            zn: ZNS,
            ze: ZES,
        }
        .terms(&orbit);

        let moon = BodyGeometry {
            zcosg: zcosgl,
            zsing: zsingl,
            zcosi: zcosil,
            zsini: zsinil,
            zcosh: zcoshl * cosq + zsinhl * sinq,
            zsinh: sinq * zcoshl - cosq * zsinhl,
            cc: C1L,
            zn: ZNL,
            ze: ZEL,
        }
        .terms(&orbit);

        let node_rate = |sh: f64| if siniq.abs() > 1e-12 { sh / siniq } else { 0.0 };
        let shs = node_rate(sun.sh);
        let shl = node_rate(moon.sh);
        let secular = SecularRates {
            sse: sun.se + moon.se,
            ssi: sun.si + moon.si,
            ssl: sun.sl + moon.sl,
            ssg: (sun.sgh - cosiq * shs) + (moon.sgh - cosiq * shl),
            ssh: shs + shl,
        };

        let resonance = Resonance::classify(xnq, eq, cosiq, siniq, aqnv).map(|resonance| {
            let (xlamo, bfact) = match resonance {
                Resonance::Synchronous { .. } => (
                    r.xmo + r.xnodeo + r.omegao - thgr,
                    state.xmdot + state.omgdot + state.xnodot - THDT
                        + secular.ssl
                        + secular.ssg
                        + secular.ssh,
                ),
                Resonance::HalfDay { .. } => (
                    r.xmo + 2.0 * r.xnodeo - 2.0 * thgr,
                    state.xmdot + 2.0 * state.xnodot - 2.0 * THDT
                        + secular.ssl
                        + 2.0 * secular.ssh,
                ),
            };
            ResonanceIntegrator {
                resonance,
                xlamo,
                xfact: bfact - xnq,
                xnq,
                omegaq: r.omegao,
                omgdot: state.omgdot,
                thgr,
                phase: IntegratorPhase::Reset,
                last_requested: None,
                resets: 0,
            }
        });

        DeepSpaceTerms {
            thgr,
            xqncl,
            siniq,
            cosiq,
            secular,
            solar: sun.periodic,
            lunar: moon.periodic,
            zmos,
            zmol,
            resonance,
            cache: None,
        }
    }

    pub fn resonance(&self) -> Option<&ResonanceIntegrator> {
        self.resonance.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn resonance_mut(&mut self) -> Option<&mut ResonanceIntegrator> {
        self.resonance.as_mut()
    }

    /// Time of the cached periodic evaluation, if any.
    pub fn cached_at(&self) -> Option<Minutes> {
        self.cache.map(|(t, _)| t)
    }

    /// Lunar-solar periodic terms at `t`, reusing the cache within 30 minutes.
    pub fn periodics(&mut self, t: Minutes) -> LunarSolarPeriodics {
        match self.cache {
            Some((saved, p)) if (saved - t).abs() < PERIODIC_CACHE_SPAN => p,
            _ => {
                let p = self.evaluate_periodics(t);
                self.cache = Some((t, p));
                p
            }
        }
    }

    fn evaluate_periodics(&self, t: Minutes) -> LunarSolarPeriodics {
        let body = |zm0: f64, zn: f64, ze: f64, c: &PeriodicCoefficients| {
            let zm = zm0 + zn * t;
            let zf = zm + 2.0 * ze * zm.sin();
            let (sinzf, coszf) = zf.sin_cos();
            let f2 = 0.5 * sinzf * sinzf - 0.25;
            let f3 = -0.5 * sinzf * coszf;
            LunarSolarPeriodics {
                pe: c.e2 * f2 + c.e3 * f3,
                pinc: c.i2 * f2 + c.i3 * f3,
                pl: c.l2 * f2 + c.l3 * f3 + c.l4 * sinzf,
                pgh: c.gh2 * f2 + c.gh3 * f3 + c.gh4 * sinzf,
                ph: c.h2 * f2 + c.h3 * f3,
            }
        };

        let s = body(self.zmos, ZNS, ZES, &self.solar);
        let l = body(self.zmol, ZNL, ZEL, &self.lunar);
        LunarSolarPeriodics {
            pe: s.pe + l.pe,
            pinc: s.pinc + l.pinc,
            pl: s.pl + l.pl,
            pgh: s.pgh + l.pgh,
            ph: s.ph + l.ph,
        }
    }

    /// Secular lunar-solar and resonance step.
    ///
    /// Return
    /// ------
    /// * `(xll, omgasm, xnodes, em, xinc, xn)`.
    fn secular_step(
        &mut self,
        state: &PropagatorState,
        t: Minutes,
        xll: f64,
        omgasm: f64,
        xnodes: f64,
    ) -> (f64, f64, f64, f64, f64, f64) {
        let r = &state.recovered;
        let s = self.secular;

        let mut xll = xll + s.ssl * t;
        let mut omgasm = omgasm + s.ssg * t;
        let mut xnodes = xnodes + s.ssh * t;
        let em = r.eo + s.sse * t;
        let mut xinc = r.xincl + s.ssi * t;

        if xinc < 0.0 {
            xinc = -xinc;
            xnodes += PI;
            omgasm -= PI;
        }

        let mut xn = r.xnodp;
        if let Some(integrator) = self.resonance.as_mut() {
            let (xll_res, xn_res) = integrator.advance(t, xnodes, omgasm);
            xll = xll_res;
            xn = xn_res;
        }

        (xll, omgasm, xnodes, em, xinc, xn)
    }

    /// Periodic lunar-solar step.
    ///
    /// Return
    /// ------
    /// * `(em, xinc, omgasm, xnodes, xll)`.
    fn periodic_step(
        &mut self,
        t: Minutes,
        em: f64,
        xinc: f64,
        omgasm: f64,
        xnodes: f64,
        xll: f64,
    ) -> (f64, f64, f64, f64, f64) {
        let (sinis, cosis) = xinc.sin_cos();
        let LunarSolarPeriodics {
            pe,
            pinc,
            pl,
            pgh,
            ph,
        } = self.periodics(t);

        let xinc = xinc + pinc;
        let em = em + pe;

        if self.xqncl >= LYDDANE_INCLINATION {
            let ph = ph / self.siniq;
            let pgh = pgh - self.cosiq * ph;
            return (em, xinc, omgasm + pgh, xnodes + ph, xll + pl);
        }

        // Lyddane substitution for low inclinations
        let (sinok, cosok) = xnodes.sin_cos();
        let alfdp = sinis * sinok + ph * cosok + pinc * cosis * sinok;
        let betdp = sinis * cosok - ph * sinok + pinc * cosis * cosok;

        let xnodes = xnodes.rem_euclid(DPI);
        let xls = xll + omgasm + cosis * xnodes + pl + pgh - pinc * xnodes * sinis;

        let xnoh = xnodes;
        let mut xnodes = alfdp.atan2(betdp).rem_euclid(DPI);
        if (xnoh - xnodes).abs() > PI {
            if xnodes < xnoh {
                xnodes += DPI;
            } else {
                xnodes -= DPI;
            }
        }

        let xll = xll + pl;
        let omgasm = xls - xll - xinc.cos() * xnodes;
        (em, xinc, omgasm, xnodes, xll)
    }

    /// Deep-space mean elements at `tsince`.
    pub(crate) fn mean_elements(
        &mut self,
        state: &PropagatorState,
        tsince: Minutes,
        secular: SecularDrift,
    ) -> MeanElements {
        let (xll, omgasm, xnodes, em, xinc, xn) =
            self.secular_step(state, tsince, secular.xmdf, secular.omgadf, secular.xnode);

        let a = (XKE / xn).powf(TOTHRD) * secular.tempa * secular.tempa;
        let e = em - secular.tempe;
        let xmam = xll + state.recovered.xnodp * secular.templ;

        let (e, xinc, omgasm, xnodes, xmam) =
            self.periodic_step(tsince, e, xinc, omgasm, xnodes, xmam);

        MeanElements {
            semi_major_axis: a,
            eccentricity: e,
            inclination: xinc,
            arg_perigee: omgasm,
            raan: xnodes,
            mean_longitude: xmam + omgasm + xnodes,
        }
    }
}

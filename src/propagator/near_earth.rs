//! Near-Earth branch: secular drag and zonal-harmonic terms for periods below 225 minutes.
//!
//! Drag enters through the power-density atmosphere and B*. The semi-major axis decays as
//!
//! ```text
//! a(t) = a₀ · (1 − C1·t − D2·t² − D3·t³ − D4·t⁴)²
//! ```
//!
//! and the mean longitude picks up `n₀·(3/2·C1·t² + T3·t³ + t⁴·(T4 + T5·t))`. When the
//! perigee lies below 220 km only the linear and quadratic terms are kept.

use crate::constants::{Minutes, AE, TOTHRD};

use super::{MeanElements, PropagatorState, SecularDrift};

/// Eccentricities below this value drop the terms divided by `e`.
const SMALL_ECCENTRICITY: f64 = 1e-4;

/// Cubic and quartic drag coefficients, absent under simplified drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HigherOrderDrag {
    pub d2: f64,
    pub d3: f64,
    pub d4: f64,
    pub t3cof: f64,
    pub t4cof: f64,
    pub t5cof: f64,
}

/// Coefficients specific to the near-Earth branch.
#[derive(Debug, Clone, PartialEq)]
pub struct NearEarthTerms {
    pub c5: f64,
    pub omgcof: f64,
    pub xmcof: f64,
    pub delmo: f64,
    pub sinmo: f64,
    /// `None` when the perigee is below 220 km.
    pub drag: Option<HigherOrderDrag>,
}

impl NearEarthTerms {
    pub fn new(state: &PropagatorState) -> Self {
        let r = &state.recovered;
        let large_ecc = r.eo > SMALL_ECCENTRICITY;

        let c3 = if large_ecc {
            state.coef * state.tsi * state.a3ovk2 * r.xnodp * AE * r.sinio / r.eo
        } else {
            0.0
        };
        let c5 = 2.0
            * state.coef1
            * r.aodp
            * r.betao2
            * (1.0 + 2.75 * (state.etasq + state.eeta) + state.eeta * state.etasq);

        let xmcof = if large_ecc {
            -TOTHRD * state.coef * r.bstar * AE / state.eeta
        } else {
            0.0
        };

        let drag = (!state.simplified_drag).then(|| {
            let c1 = state.c1;
            let c1sq = c1 * c1;
            let d2 = 4.0 * r.aodp * state.tsi * c1sq;
            let temp = d2 * state.tsi * c1 / 3.0;
            let d3 = (17.0 * r.aodp + state.s4) * temp;
            let d4 = 0.5 * temp * r.aodp * state.tsi * (221.0 * r.aodp + 31.0 * state.s4) * c1;
            HigherOrderDrag {
                d2,
                d3,
                d4,
                t3cof: d2 + 2.0 * c1sq,
                t4cof: 0.25 * (3.0 * d3 + c1 * (12.0 * d2 + 10.0 * c1sq)),
                t5cof: 0.2
                    * (3.0 * d4 + 12.0 * c1 * d3 + 6.0 * d2 * d2 + 15.0 * c1sq * (2.0 * d2 + c1sq)),
            }
        });

        NearEarthTerms {
            c5,
            omgcof: r.bstar * c3 * r.omegao.cos(),
            xmcof,
            delmo: (1.0 + state.eta * r.xmo.cos()).powi(3),
            sinmo: r.xmo.sin(),
            drag,
        }
    }

    pub fn is_simplified(&self) -> bool {
        self.drag.is_none()
    }

    /// Apply the drag terms on top of the shared secular drift.
    pub(crate) fn mean_elements(
        &self,
        state: &PropagatorState,
        tsince: Minutes,
        secular: SecularDrift,
    ) -> MeanElements {
        let r = &state.recovered;
        let SecularDrift {
            xmdf,
            omgadf,
            xnode,
            mut tempa,
            mut tempe,
            mut templ,
        } = secular;

        let mut xmp = xmdf;
        let mut omega = omgadf;

        if let Some(drag) = &self.drag {
            let delomg = self.omgcof * tsince;
            let delm = self.xmcof * ((1.0 + state.eta * xmdf.cos()).powi(3) - self.delmo);
            let temp = delomg + delm;
            xmp = xmdf + temp;
            omega = omgadf - temp;

            let tsq = tsince * tsince;
            let tcube = tsq * tsince;
            let tfour = tsince * tcube;
            tempa -= drag.d2 * tsq + drag.d3 * tcube + drag.d4 * tfour;
            tempe += r.bstar * self.c5 * (xmp.sin() - self.sinmo);
            templ += drag.t3cof * tcube + tfour * (drag.t4cof + tsince * drag.t5cof);
        }

        MeanElements {
            semi_major_axis: r.aodp * tempa * tempa,
            eccentricity: r.eo - tempe,
            inclination: r.xincl,
            arg_perigee: omega,
            raan: xnode,
            mean_longitude: xmp + omega + xnode + r.xnodp * templ,
        }
    }
}

#[cfg(test)]
mod near_earth_test {
    use super::*;
    use crate::elements::{OrbitalElementSet, RecoveredElements};

    fn state_for(perigee_km: f64) -> PropagatorState {
        // circular-ish orbit whose perigee sits at the requested altitude
        let a_km = 6378.135 + perigee_km + 20.0;
        let n_rad_min = 0.0743669161 * (a_km / 6378.135f64).powf(-1.5);
        let el = OrbitalElementSet {
            name: "LOW".into(),
            epoch_year: 24,
            epoch_day: 100.0,
            inclination: 51.6,
            eccentricity: 20.0 / a_km,
            mean_motion: n_rad_min * 1440.0 / std::f64::consts::TAU,
            bstar: 1e-4,
            ..Default::default()
        };
        PropagatorState::new(RecoveredElements::recover(&el).unwrap())
    }

    #[test]
    fn test_simplified_drag_flag() {
        let low = state_for(180.0);
        assert!(low.simplified_drag);
        assert!(NearEarthTerms::new(&low).is_simplified());

        let high = state_for(400.0);
        assert!(!high.simplified_drag);
        assert!(!NearEarthTerms::new(&high).is_simplified());
    }

    #[test]
    fn test_density_adjustment_below_156_km() {
        let low = state_for(120.0);
        assert!(low.s4 < crate::constants::S_DENSITY);
        let high = state_for(400.0);
        assert_eq!(high.s4, crate::constants::S_DENSITY);
    }

    #[test]
    fn test_drag_decays_semi_major_axis() {
        let state = state_for(400.0);
        let terms = NearEarthTerms::new(&state);
        let a0 = terms
            .mean_elements(&state, 0.0, state.secular(0.0))
            .semi_major_axis;
        let a1 = terms
            .mean_elements(&state, 1440.0, state.secular(1440.0))
            .semi_major_axis;
        assert_eq!(a0, state.recovered.aodp);
        assert!(a1 < a0);
    }
}

use crate::constants::DPI;

/// Maximum number of iterations of the Kepler solve.
pub const KEPLER_MAX_ITER: usize = 10;

/// Convergence tolerance on successive iterates, in radians.
pub const KEPLER_TOLERANCE: f64 = 1e-6;

/// Largest correction allowed in one Kepler step, in radians.
const KEPLER_MAX_STEP: f64 = 0.95;

/// Returns the principal value of an angle in radians, in [0, 2π).
pub(crate) fn principal_angle(a: f64) -> f64 {
    a.rem_euclid(DPI)
}

/// Solve Kepler's equation written in equinoctial form.
///
/// Finds `E + ω` such that
///
/// ```text
/// capu = (E + ω) − axn·sin(E + ω) + ayn·cos(E + ω)
/// ```
///
/// where `axn = e·cos ω` and `ayn = e·sin ω` (plus the long-period corrections).
/// With `ayn = 0` and `axn = e` this reduces to the classic `M = E − e·sin E`.
///
/// Arguments
/// ---------
/// * `capu`: mean longitude minus node, in radians.
/// * `axn`, `ayn`: equinoctial eccentricity components.
///
/// Return
/// ------
/// * `(value, converged)`: the last iterate and whether successive iterates came within
///   [`KEPLER_TOLERANCE`] in at most [`KEPLER_MAX_ITER`] steps. The iterate is usable
///   even when `converged` is `false`.
pub fn solve_kepler(capu: f64, axn: f64, ayn: f64) -> (f64, bool) {
    let mut epw = capu;

    for _ in 0..KEPLER_MAX_ITER {
        let (sinepw, cosepw) = epw.sin_cos();

        let residual = capu - ayn * cosepw + axn * sinepw - epw;
        let slope = 1.0 - axn * cosepw - ayn * sinepw;
        let delta = (residual / slope).clamp(-KEPLER_MAX_STEP, KEPLER_MAX_STEP);

        let next = epw + delta;
        if (next - epw).abs() <= KEPLER_TOLERANCE {
            return (next, true);
        }
        epw = next;
    }

    (epw, false)
}

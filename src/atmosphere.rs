//! # Atmospheric refraction and extinction
//!
//! Two small empirical models used for the apparent observables:
//!
//! * **Refraction**: Sæmundsson's formula, giving the apparent lift of an object from its
//!   true (geometric) altitude,
//!
//!   ```text
//!   R[′] = 1.02 / tan(h + 10.3 / (h + 5.11)),   h in degrees
//!   ```
//!
//! * **Extinction**: Kasten & Young relative airmass times a single zenith extinction
//!   coefficient (0.2 mag per airmass, a typical clear-sky V-band value).

use crate::constants::Degree;

/// Zenith extinction coefficient in magnitudes per airmass.
pub const EXTINCTION_COEFFICIENT: f64 = 0.2;

/// Lowest true altitude at which the refraction formula is evaluated. Below it the
/// refraction at this altitude is used.
const REFRACTION_FLOOR: Degree = -1.0;

/// Atmospheric refraction for a true altitude.
///
/// Arguments
/// ---------
/// * `altitude`: geometric altitude in degrees.
///
/// Return
/// ------
/// * refraction in degrees, to be added to the geometric altitude. Never negative.
pub fn refraction(altitude: Degree) -> Degree {
    let h = altitude.max(REFRACTION_FLOOR);
    let arcmin = 1.02 / (h + 10.3 / (h + 5.11)).to_radians().tan();
    arcmin.max(0.0) / 60.0
}

/// Relative airmass at an apparent altitude (Kasten & Young, 1989).
///
/// Return
/// ------
/// * `None` below the horizon, `Some(X)` with `X ≈ 1` at the zenith and `X ≈ 37.9` on the
///   horizon.
pub fn airmass(altitude: Degree) -> Option<f64> {
    if altitude < 0.0 {
        return None;
    }
    let z = 90.0 - altitude;
    Some(1.0 / (z.to_radians().cos() + 0.50572 * (96.07995 - z).powf(-1.6364)))
}

/// Magnitude loss through the atmosphere at an apparent altitude.
pub fn extinction(altitude: Degree) -> Option<f64> {
    airmass(altitude).map(|x| EXTINCTION_COEFFICIENT * x)
}

#[cfg(test)]
mod atmosphere_test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_refraction() {
        assert_relative_eq!(refraction(0.0) * 60.0, 28.98, epsilon = 0.01);
        assert_relative_eq!(refraction(45.0) * 60.0, 1.013, epsilon = 1e-3);
        assert!(refraction(90.0) < 1e-3);
        assert!(refraction(90.0) >= 0.0);
        // decreasing with altitude
        assert!(refraction(5.0) < refraction(1.0));
        // clamped below the floor
        assert_eq!(refraction(-10.0), refraction(-1.0));
    }

    #[test]
    fn test_airmass() {
        assert_eq!(airmass(-0.1), None);
        assert_relative_eq!(airmass(90.0).unwrap(), 1.0, epsilon = 1e-3);
        assert_relative_eq!(airmass(30.0).unwrap(), 1.9943, epsilon = 1e-4);
        assert_relative_eq!(airmass(0.0).unwrap(), 37.92, epsilon = 0.01);
        assert_relative_eq!(
            extinction(90.0).unwrap(),
            EXTINCTION_COEFFICIENT,
            epsilon = 1e-3
        );
    }
}

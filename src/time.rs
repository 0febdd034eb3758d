use hifitime::Epoch;

use crate::constants::{JulianDay, Radian, DPI, JD1950, JDTOMJD, MJD, SIDEREAL_RATIO, T2000};
use crate::satvis_errors::SatvisError;

/// Expand a two-digit element-set year into a full year.
///
/// Years 57–99 belong to the 1900s (first artificial satellite in 1957),
/// 00–56 to the 2000s. Four-digit years are returned unchanged.
pub fn full_year(year: i32) -> i32 {
    match year {
        0..=56 => 2000 + year,
        57..=99 => 1900 + year,
        _ => year,
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Resolve an element-set epoch (year + fractional day of year) into a Julian Date (UTC).
///
/// Arguments
/// ---------
/// * `year`: epoch year, two-digit (catalog convention) or four-digit.
/// * `day_of_year`: fractional day of year, `1.0` being January 1st at 0h UT.
///
/// Return
/// ------
/// * the Julian Date of the epoch.
///
/// Errors
/// ------
/// * [`SatvisError::InvalidEpoch`] when the day is not finite, lies outside
///   `[1, days_in_year + 1)`, or the year cannot be represented as a calendar date.
pub fn epoch_to_jd(year: i32, day_of_year: f64) -> Result<JulianDay, SatvisError> {
    let invalid = || SatvisError::InvalidEpoch {
        year,
        day: day_of_year,
    };

    let year_full = full_year(year);
    if !(1900..=2199).contains(&year_full) {
        return Err(invalid());
    }

    let days_in_year = if is_leap_year(year_full) { 366.0 } else { 365.0 };
    if !day_of_year.is_finite() || day_of_year < 1.0 || day_of_year >= days_in_year + 1.0 {
        return Err(invalid());
    }

    let jan_first = Epoch::maybe_from_gregorian_utc(year_full, 1, 1, 0, 0, 0, 0)
        .map_err(|_| invalid())?;

    Ok(jan_first.to_jde_utc_days() + day_of_year - 1.0)
}

/// Julian Date → Modified Julian Date
pub fn jd_to_mjd(jd: JulianDay) -> MJD {
    jd - JDTOMJD
}

/// Modified Julian Date → Julian Date
pub fn mjd_to_jd(mjd: MJD) -> JulianDay {
    mjd + JDTOMJD
}

/// Convert a Julian Date (UTC) into a [`hifitime::Epoch`], mostly for display purposes.
pub fn jd_to_epoch(jd: JulianDay) -> Epoch {
    Epoch::from_jde_utc(jd)
}

/// Compute the Greenwich Mean Sidereal Time (GMST) in radians
/// for a given Modified Julian Date (UT time scale).
///
/// The IAU 1982 cubic gives GMST at 0h UT for the integer part of the date,
/// then the fraction of day is added scaled by the sidereal/solar rate ratio.
///
/// # Arguments
/// * `tjm` - Modified Julian Date (UT)
///
/// # Returns
/// * GMST angle in radians, normalized to the interval [0, 2π).
pub fn gmst(tjm: MJD) -> Radian {
    // Polynomial coefficients for GMST at 0h UT (in seconds)
    const C0: f64 = 24110.54841;
    const C1: f64 = 8640184.812866;
    const C2: f64 = 9.3104e-2;
    const C3: f64 = -6.2e-6;

    let itjm = tjm.floor();
    let t = (itjm - T2000) / 36525.0;

    let gmst0 = (((C3 * t + C2) * t + C1) * t + C0) * DPI / 86400.0;

    // tjm - itjm stays in [0, 1) for negative dates too
    let h = (tjm - itjm) * DPI;

    (gmst0 + h * SIDEREAL_RATIO).rem_euclid(DPI)
}

/// Greenwich sidereal time from days elapsed since 1950 January 0.0 UT.
///
/// Linear model used by the deep-space lunar-solar theory, consistent with its
/// 1950-referenced constants.
pub fn thetag_1950(ds50: f64) -> Radian {
    (1.72944494 + 6.3003880987 * ds50).rem_euclid(DPI)
}

/// Days elapsed since 1950 January 0.0 UT for a Julian Date.
pub fn days_since_1950(jd: JulianDay) -> f64 {
    jd - JD1950
}

#[cfg(test)]
mod time_test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_full_year() {
        assert_eq!(full_year(80), 1980);
        assert_eq!(full_year(57), 1957);
        assert_eq!(full_year(24), 2024);
        assert_eq!(full_year(2008), 2008);
    }

    #[test]
    fn test_epoch_to_jd() {
        // 2000 January 1.5 is J2000.0
        let jd = epoch_to_jd(0, 1.5).unwrap();
        assert_relative_eq!(jd, 2_451_545.0, epsilon = 1e-6);

        // 1980 day 275.98708465
        let jd = epoch_to_jd(80, 275.98708465).unwrap();
        assert_relative_eq!(jd, 2_444_514.48708465, epsilon = 1e-6);
    }

    #[test]
    fn test_invalid_epoch() {
        assert_eq!(
            epoch_to_jd(23, 366.5),
            Err(SatvisError::InvalidEpoch {
                year: 23,
                day: 366.5
            })
        );
        assert!(epoch_to_jd(24, 366.5).is_ok());
        assert!(epoch_to_jd(24, 0.5).is_err());
        assert!(epoch_to_jd(24, f64::NAN).is_err());
        assert!(epoch_to_jd(1800, 10.0).is_err());
    }

    #[test]
    fn test_mjd_round_trip_constants() {
        assert_eq!(jd_to_mjd(2459215.5), 59215.0);
        assert_eq!(mjd_to_jd(59216.0), 2459216.5);
    }

    #[test]
    fn test_gmst() {
        let res_gmst = gmst(T2000);
        assert_relative_eq!(res_gmst, 4.894961212789145, epsilon = 1e-9);

        let res_gmst = gmst(57028.478514610404);
        assert_relative_eq!(res_gmst, 4.851925725092499, epsilon = 1e-9);
    }

    #[test]
    fn test_thetag_1950_matches_gmst() {
        // both sidereal models agree to a few hundredths of a degree over decades
        let jd = 2_451_545.0;
        let a = thetag_1950(days_since_1950(jd));
        let b = gmst(jd_to_mjd(jd));
        let diff = (a - b + std::f64::consts::PI).rem_euclid(DPI) - std::f64::consts::PI;
        assert!(diff.abs() < 1e-3, "difference {diff}");
    }
}

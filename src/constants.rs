//! # Constants and type definitions for satvis
//!
//! This module centralizes the **physical constants**, **conversion factors**, and
//! **type aliases** used throughout the crate.
//!
//! ## Overview
//!
//! - Unit conversions (degrees ↔ radians, days ↔ minutes, JD ↔ MJD)
//! - The WGS-72 gravity model of the analytic propagation theory (`XKE`, `CK2`, `CK4`, …)
//! - Earth shape and rotation constants used by the observer and topocentric code
//! - Core type aliases shared across modules
//!
//! All gravity constants are expressed in the canonical units of the theory:
//! distances in **Earth radii** (`AE = 1`) and time in **minutes**.

// -------------------------------------------------------------------------------------------------
// Unit conversions
// -------------------------------------------------------------------------------------------------

/// 2π, useful for trigonometric conversions
pub const DPI: f64 = 2. * std::f64::consts::PI;

/// Number of seconds in a day
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Number of minutes in a day
pub const MINUTES_PER_DAY: f64 = 1_440.0;

/// Astronomical Unit in kilometers (IAU 2012)
pub const AU: f64 = 149_597_870.7;

/// MJD epoch of J2000.0 (2000-01-01 12:00:00)
pub const T2000: f64 = 51544.5;

/// Julian Date of J2000.0
pub const JD2000: f64 = 2_451_545.0;

/// Julian Date of 1950 January 0.0 UT, origin of the 1950-referenced lunar-node model
pub const JD1950: f64 = 2_433_281.5;

/// Conversion factor between Julian Date and Modified Julian Date
pub const JDTOMJD: f64 = 2400000.5;

/// Degrees → radians
pub const RADEG: f64 = std::f64::consts::PI / 180.0;

/// Arcseconds → radians
pub const RADSEC: f64 = std::f64::consts::PI / 648000.0;

// -------------------------------------------------------------------------------------------------
// WGS-72 gravity model (canonical units: Earth radii, minutes)
// -------------------------------------------------------------------------------------------------

/// Earth equatorial radius in kilometers (WGS-72)
pub const XKMPER: f64 = 6378.135;

/// Distance unit of the theory, in Earth radii
pub const AE: f64 = 1.0;

/// sqrt(GM) in (Earth radii)^1.5 / minute
pub const XKE: f64 = 0.0743669161;

/// ½·J2·AE²
pub const CK2: f64 = 5.413080e-4;

/// −⅜·J4·AE⁴
pub const CK4: f64 = 0.62098875e-6;

/// Third zonal harmonic J3
pub const XJ3: f64 = -2.53881e-6;

/// (q0 − s0)⁴ of the atmospheric density function, q0 = 120 km, s0 = 78 km
pub const QOMS2T: f64 = 1.88027916e-9;

/// Density function parameter s = AE·(1 + 78 km / XKMPER)
pub const S_DENSITY: f64 = 1.01222928;

/// 2/3
pub const TOTHRD: f64 = 2.0 / 3.0;

/// Orbital period (minutes) at and above which the deep-space branch is used
pub const DEEP_SPACE_PERIOD: f64 = 225.0;

// -------------------------------------------------------------------------------------------------
// Earth shape, rotation and Sun
// -------------------------------------------------------------------------------------------------

/// Earth flattening (WGS-72)
pub const EARTH_FLATTENING: f64 = 1.0 / 298.26;

/// Ratio of the sidereal to the solar rotation rate
pub const SIDEREAL_RATIO: f64 = 1.00273790934;

/// Earth rotation rate in rad/s
pub const EARTH_ROTATION_RATE: f64 = DPI * SIDEREAL_RATIO / SECONDS_PER_DAY;

/// Solar radius in kilometers
pub const SUN_RADIUS: f64 = 696_000.0;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in arcseconds
pub type ArcSec = f64;
/// Angle in radians
pub type Radian = f64;
/// Distance in kilometers
pub type Kilometer = f64;
/// Elapsed time in minutes
pub type Minutes = f64;
/// Julian Date (days, UT)
pub type JulianDay = f64;
/// Modified Julian Date (days)
pub type MJD = f64;

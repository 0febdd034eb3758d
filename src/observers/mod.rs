//! # Observer & Site Geometry
//!
//! Ground observer handling for topocentric computations:
//!
//! - An [`Observer`](crate::observers::Observer) type storing geodetic coordinates, the
//!   **geocentric parallax coordinates** (ρ·cosφ, ρ·sinφ) and a **precomputed body-fixed**
//!   position and velocity.
//! - The observer's **inertial** position and velocity at a given Greenwich sidereal angle
//!   ([`Observer::inertial_pv`](crate::observers::Observer::inertial_pv)).
//! - The local **up/east/north** triad used to project a range vector on the horizon
//!   ([`Observer::horizon_frame`](crate::observers::Observer::horizon_frame)).
//! - Geodetic → parallax conversion on an ellipsoid given by its equatorial radius and
//!   flattening ([`geodetic_to_parallax`](crate::observers::geodetic_to_parallax)).
//! - The sub-satellite point on a **spherical** Earth
//!   ([`spherical_sub_point`](crate::observers::spherical_sub_point)).
//!
//! ## Frames & conventions
//!
//! ```text
//! Body-fixed  --(rotation by the Greenwich sidereal angle θg about z)-->  True-equator inertial
//! ```
//!
//! The inertial frame is the one of the analytic propagator output. Using the apparent
//! sidereal angle (mean sidereal time plus equation of the equinoxes) or the mean one is
//! the caller's choice, see [`EphemerisConfig`](crate::ephemeris::EphemerisConfig).
//!
//! ## Units
//!
//! - Longitude, latitude: **degrees** (east and north positive, geodetic latitude).
//! - Height: **kilometers** above the ellipsoid.
//! - Parallax coordinates: **Earth radii**.
//! - Positions: **km**, velocities: **km/s**.
//!
//! ## Earth model
//!
//! Equatorial radius [`XKMPER`](crate::constants::XKMPER) and flattening
//! [`EARTH_FLATTENING`](crate::constants::EARTH_FLATTENING) (WGS-72), the Earth model of the
//! propagation theory.

use nalgebra::Vector3;
use ordered_float::NotNan;

use crate::constants::{
    Degree, Kilometer, Radian, EARTH_FLATTENING, EARTH_ROTATION_RATE, RADEG, XKMPER,
};
use crate::satvis_errors::SatvisError;

/// Ground observer with precomputed body-fixed state.
///
/// Units
/// -----
/// * `longitude`, `latitude`: degrees (geodetic).
/// * `height`: km above the ellipsoid.
/// * `rho_cos_phi`, `rho_sin_phi`: Earth radii.
/// * `observer_fixed_coord`: km.
/// * `observer_velocity`: km/s (from the Earth rotation cross product).
///
/// See also
/// ------------
/// * [`geodetic_to_parallax`] – Converts geodetic latitude/height to (ρ·cosφ, ρ·sinφ).
/// * [`Observer::inertial_pv`] – Inertial position and velocity at a sidereal angle.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct Observer {
    /// Geodetic longitude in **degrees** east of Greenwich.
    pub longitude: NotNan<f64>,

    /// Geodetic latitude in **degrees**.
    pub latitude: NotNan<f64>,

    /// Height above the ellipsoid in **km**.
    pub height: NotNan<f64>,

    /// ρ·cosφ (geocentric latitude φ), in **Earth radii**.
    pub rho_cos_phi: NotNan<f64>,

    /// ρ·sinφ (geocentric latitude φ), in **Earth radii**.
    pub rho_sin_phi: NotNan<f64>,

    /// Optional human-readable site name.
    pub name: Option<String>,

    /// Precomputed **body-fixed** position of the observer in **km**.
    observer_fixed_coord: Vector3<NotNan<f64>>,

    /// Precomputed **body-fixed** velocity of the observer in **km/s**.
    observer_velocity: Vector3<NotNan<f64>>,
}

impl Observer {
    /// Create a new observer from geodetic coordinates.
    ///
    /// Converts `(latitude, height)` into `(ρ·cosφ, ρ·sinφ)` with [`geodetic_to_parallax`],
    /// builds the body-fixed position in **km** and the body-fixed velocity `ω × r` in
    /// **km/s**.
    ///
    /// Arguments
    /// -----------------
    /// * `longitude`: Geodetic longitude in **degrees** (east positive).
    /// * `latitude`: Geodetic latitude in **degrees**, within [-90, 90].
    /// * `height`: Height above the ellipsoid in **km**.
    /// * `name`: Optional site name.
    ///
    /// Return
    /// ----------
    /// * A constructed [`Observer`] with precomputed body-fixed state.
    ///
    /// Errors
    /// ----------
    /// * [`SatvisError::NanValue`] if an input is NaN.
    /// * [`SatvisError::InvalidInput`] if the latitude is outside [-90, 90] or a value is infinite.
    pub fn new(
        longitude: Degree,
        latitude: Degree,
        height: Kilometer,
        name: Option<String>,
    ) -> Result<Observer, SatvisError> {
        let longitude = NotNan::new(longitude)?;
        let latitude = NotNan::new(latitude)?;
        let height = NotNan::new(height)?;

        if !(-90.0..=90.0).contains(&latitude.into_inner()) {
            return Err(SatvisError::InvalidInput(format!(
                "latitude must lie in [-90, 90] degrees, got {latitude}"
            )));
        }
        if !longitude.is_finite() || !height.is_finite() {
            return Err(SatvisError::InvalidInput(
                "observer longitude and height must be finite".into(),
            ));
        }

        let (rho_cos_phi, rho_sin_phi) = geodetic_to_parallax(*latitude, *height);

        // Angular velocity of Earth rotation (rad/s) on the z-axis.
        let omega: Vector3<NotNan<f64>> = Vector3::new(
            NotNan::new(0.0)?,
            NotNan::new(0.0)?,
            NotNan::new(EARTH_ROTATION_RATE)?,
        );

        // Body-fixed position in km from (ρ·cosφ, ρ·sinφ) scaled by the equatorial radius.
        let lon_radians = longitude.to_radians();
        let body_fixed_coord: Vector3<NotNan<f64>> = Vector3::new(
            NotNan::new(XKMPER * rho_cos_phi * lon_radians.cos())?,
            NotNan::new(XKMPER * rho_cos_phi * lon_radians.sin())?,
            NotNan::new(XKMPER * rho_sin_phi)?,
        );

        // Body-fixed velocity from Earth rotation.
        let dvbf = omega.cross(&body_fixed_coord);

        Ok(Observer {
            longitude,
            latitude,
            height,
            rho_cos_phi: NotNan::new(rho_cos_phi)?,
            rho_sin_phi: NotNan::new(rho_sin_phi)?,
            name,
            observer_fixed_coord: body_fixed_coord,
            observer_velocity: dvbf,
        })
    }

    /// Create an observer from a body-fixed position.
    ///
    /// Arguments
    /// -----------------
    /// * `position`: body-fixed position in **km**.
    /// * `name`: Optional site name.
    ///
    /// Errors
    /// ----------
    /// * same as [`Observer::new`].
    ///
    /// See also
    /// ------------
    /// * [`body_fixed_to_geodetic`] – the inversion used here.
    pub fn from_body_fixed(
        position: &Vector3<f64>,
        name: Option<String>,
    ) -> Result<Observer, SatvisError> {
        let (lon, lat, height) = body_fixed_to_geodetic(position);
        Observer::new(lon, lat, height, name)
    }

    /// Body-fixed position of the observer, in km.
    pub fn body_fixed_coord(&self) -> Vector3<f64> {
        self.observer_fixed_coord.map(|x| x.into_inner())
    }

    /// Body-fixed velocity of the observer due to Earth rotation, in km/s.
    pub fn body_fixed_velocity(&self) -> Vector3<f64> {
        self.observer_velocity.map(|x| x.into_inner())
    }

    /// Local sidereal angle of the site for a given Greenwich sidereal angle.
    pub fn local_sidereal_angle(&self, gst: Radian) -> Radian {
        gst + self.longitude.to_radians()
    }

    /// Inertial position and velocity of the observer.
    ///
    /// Arguments
    /// ---------
    /// * `gst`: Greenwich sidereal angle in radians (mean or apparent).
    ///
    /// Return
    /// ------
    /// * `(position, velocity)` in km and km/s in the true-equator inertial frame.
    pub fn inertial_pv(&self, gst: Radian) -> (Vector3<f64>, Vector3<f64>) {
        let (s, c) = gst.sin_cos();
        let rotate = |v: Vector3<f64>| Vector3::new(c * v.x - s * v.y, s * v.x + c * v.y, v.z);

        (
            rotate(self.body_fixed_coord()),
            rotate(self.body_fixed_velocity()),
        )
    }

    /// Local horizon triad of the site in the inertial frame.
    ///
    /// Arguments
    /// ---------
    /// * `gst`: Greenwich sidereal angle in radians.
    ///
    /// Return
    /// ------
    /// * `(up, east, north)` unit vectors, `up` along the ellipsoid normal.
    pub fn horizon_frame(&self, gst: Radian) -> (Vector3<f64>, Vector3<f64>, Vector3<f64>) {
        let theta = self.local_sidereal_angle(gst);
        let (sin_lat, cos_lat) = (self.latitude.into_inner() * RADEG).sin_cos();
        let (sin_t, cos_t) = theta.sin_cos();

        let up = Vector3::new(cos_lat * cos_t, cos_lat * sin_t, sin_lat);
        let east = Vector3::new(-sin_t, cos_t, 0.0);
        let north = Vector3::new(-sin_lat * cos_t, -sin_lat * sin_t, cos_lat);
        (up, east, north)
    }
}

/// Convert geodetic latitude (in radians) and height (in kilometers)
/// into normalized parallax coordinates.
///
/// With `f` the flattening and `R` the equatorial radius,
///
/// ```text
/// C = 1 / sqrt(1 − f(2 − f)·sin²φ)      S = (1 − f)²·C
/// ρ·cosφ' = (C + h/R)·cosφ              ρ·sinφ' = (S + h/R)·sinφ
/// ```
///
/// Return
/// ------
/// * `(rho_cos_phi, rho_sin_phi)` in Earth radii.
pub fn lat_alt_to_parallax(lat: f64, height: f64) -> (f64, f64) {
    let (sin_lat, cos_lat) = lat.sin_cos();
    let e2 = EARTH_FLATTENING * (2.0 - EARTH_FLATTENING);

    let c = 1.0 / (1.0 - e2 * sin_lat * sin_lat).sqrt();
    let s = (1.0 - EARTH_FLATTENING).powi(2) * c;
    let h = height / XKMPER;

    ((c + h) * cos_lat, (s + h) * sin_lat)
}

/// Convert geodetic latitude (in degrees) and height (in kilometers)
/// into normalized parallax coordinates.
///
/// See also
/// --------
/// * [`lat_alt_to_parallax`] – Performs the actual computation given latitude in radians.
pub fn geodetic_to_parallax(lat: Degree, height: Kilometer) -> (f64, f64) {
    lat_alt_to_parallax(lat.to_radians(), height)
}

/// Iterations of the geodetic latitude fixed point, enough for sub-millimetre heights
/// anywhere below geostationary altitude.
const GEODETIC_ITERATIONS: usize = 6;

/// Geodetic longitude, latitude and height of a body-fixed position.
///
/// Fixed-point iteration on the latitude,
///
/// ```text
/// N = R / sqrt(1 − e²·sin²φ)
/// h = p / cos φ − N
/// φ = atan2(z, p·(1 − e²·N / (N + h)))
/// ```
///
/// started from the geocentric latitude corrected by `1 − e²`.
///
/// Return
/// ------
/// * `(longitude, latitude, height)` in degrees and km.
pub fn body_fixed_to_geodetic(position: &Vector3<f64>) -> (Degree, Degree, Kilometer) {
    let e2 = EARTH_FLATTENING * (2.0 - EARTH_FLATTENING);
    let p = position.x.hypot(position.y);
    let lon = position.y.atan2(position.x);

    let mut lat = position.z.atan2(p * (1.0 - e2));
    let mut height = 0.0;
    for _ in 0..GEODETIC_ITERATIONS {
        let sin_lat = lat.sin();
        let n = XKMPER / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        height = if lat.cos().abs() > 1e-10 {
            p / lat.cos() - n
        } else {
            position.z.abs() - n * (1.0 - e2)
        };
        lat = position.z.atan2(p * (1.0 - e2 * n / (n + height)));
    }

    (lon.to_degrees(), lat.to_degrees(), height)
}

/// Sub-satellite point on a spherical Earth.
///
/// The latitude is the geocentric declination of the position vector and the height is
/// measured above a sphere of equatorial radius. This overestimates the height by up to
/// about 21 km at the poles.
///
/// Arguments
/// ---------
/// * `position`: inertial position in km.
/// * `gst`: Greenwich sidereal angle in radians.
///
/// Return
/// ------
/// * `(longitude, latitude, height)` in degrees (longitude in (-180, 180]) and km.
pub fn spherical_sub_point(position: &Vector3<f64>, gst: Radian) -> (Degree, Degree, Kilometer) {
    let r = position.norm();
    let lat = (position.z / r).asin();
    let mut lon = (position.y.atan2(position.x) - gst).to_degrees().rem_euclid(360.0);
    if lon > 180.0 {
        lon -= 360.0;
    }
    (lon, lat.to_degrees(), r - XKMPER)
}

#[cfg(test)]
mod observer_test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_observer_constructor() {
        let observer = Observer::new(0.0, 0.0, 0.0, None).unwrap();
        assert_eq!(observer.longitude, 0.0);
        assert_eq!(observer.rho_cos_phi, 1.0);
        assert_eq!(observer.rho_sin_phi, 0.0);
        assert_eq!(
            observer.body_fixed_coord(),
            Vector3::new(XKMPER, 0.0, 0.0)
        );

        assert!(matches!(
            Observer::new(0.0, f64::NAN, 0.0, None),
            Err(SatvisError::NanValue(_))
        ));
        assert!(matches!(
            Observer::new(0.0, 91.0, 0.0, None),
            Err(SatvisError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_polar_radius() {
        let pole = Observer::new(0.0, 90.0, 0.0, None).unwrap();
        let r = pole.body_fixed_coord();
        assert_relative_eq!(r.z, XKMPER * (1.0 - EARTH_FLATTENING), epsilon = 1e-9);
        assert_relative_eq!(r.x, 0.0, epsilon = 1e-9);
        // no rotation speed on the axis
        assert_relative_eq!(pole.body_fixed_velocity().norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_equatorial_rotation_speed() {
        let site = Observer::new(45.0, 0.0, 0.0, None).unwrap();
        assert_relative_eq!(
            site.body_fixed_velocity().norm(),
            0.46510,
            epsilon = 1e-4
        );
        // velocity is perpendicular to position
        assert_relative_eq!(
            site.body_fixed_velocity().dot(&site.body_fixed_coord()),
            0.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_inertial_rotation() {
        let site = Observer::new(30.0, 40.0, 0.2, Some("site".into())).unwrap();
        let (r0, _) = site.inertial_pv(0.0);
        assert_eq!(r0, site.body_fixed_coord());

        let (r1, v1) = site.inertial_pv(1.0);
        assert_relative_eq!(r1.norm(), r0.norm(), epsilon = 1e-9);
        assert_relative_eq!(r1.z, r0.z, epsilon = 1e-12);
        let lon = r1.y.atan2(r1.x);
        assert_relative_eq!(lon, 1.0 + 30f64.to_radians(), epsilon = 1e-12);
        assert_relative_eq!(v1.dot(&r1), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_horizon_frame_is_orthonormal() {
        let site = Observer::new(-71.0, -33.0, 1.2, None).unwrap();
        let (up, east, north) = site.horizon_frame(2.3);
        assert_relative_eq!(up.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(east.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(north.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(up.dot(&east), 0.0, epsilon = 1e-12);
        assert_relative_eq!(up.dot(&north), 0.0, epsilon = 1e-12);
        assert_relative_eq!(east.cross(&north), up, epsilon = 1e-12);

        // the site position leans toward the ellipsoid normal
        let (r, _) = site.inertial_pv(2.3);
        assert!(r.normalize().dot(&up) > 0.99);
    }

    #[test]
    fn test_geodetic_inversion() {
        for (lon, lat, h) in [
            (10.0, 0.0, 0.0),
            (-120.0, 45.0, 1.5),
            (170.0, -63.4, -0.3),
            (0.0, 89.9, 3.0),
        ] {
            let site = Observer::new(lon, lat, h, None).unwrap();
            let (lon2, lat2, h2) = body_fixed_to_geodetic(&site.body_fixed_coord());
            assert_relative_eq!(lon2, lon, epsilon = 1e-9);
            assert_relative_eq!(lat2, lat, epsilon = 1e-9);
            assert_relative_eq!(h2, h, epsilon = 1e-6);

            let back = Observer::from_body_fixed(&site.body_fixed_coord(), None).unwrap();
            assert_relative_eq!(
                back.body_fixed_coord(),
                site.body_fixed_coord(),
                epsilon = 1e-6
            );
        }
    }

    #[test]
    fn test_spherical_sub_point() {
        let p = Vector3::new(0.0, 7000.0, 7000.0);
        let (lon, lat, h) = spherical_sub_point(&p, 0.0);
        assert_relative_eq!(lon, 90.0, epsilon = 1e-12);
        assert_relative_eq!(lat, 45.0, epsilon = 1e-12);
        assert_relative_eq!(h, 7000.0 * 2f64.sqrt() - XKMPER, epsilon = 1e-9);

        let (lon, _, _) = spherical_sub_point(&Vector3::new(-7000.0, -1.0, 0.0), 0.0);
        assert!(lon > -180.0 && lon <= 180.0);
        assert_relative_eq!(lon, -179.99181, epsilon = 1e-4);
    }
}

//! # Specular flares from flat satellite panels
//!
//! Reflective satellites carry three flat mirrors fixed to a body frame that follows the
//! orbit:
//!
//! ```text
//! f  = v̂                 (along track)
//! l  = (r × v)^          (orbit normal)
//! up = f × l             (radial, away from the Earth)
//!
//! n_k = cos τ·(−up) + sin τ·(cos ψ_k·f + sin ψ_k·l),   τ = 40°,  ψ = 0°, +120°, −120°
//! ```
//!
//! Mirror 0 faces forward, mirrors 1 and 2 face the rear at ±120° of yaw. A light source
//! in direction `d` seen from the satellite is reflected along `2(d·n)n − d`; the *flare
//! angle* is the angle between that ray and the direction of the observer. Small flare
//! angles mean the observer sits close to the centre of the reflected beam.
//!
//! A mirror only reflects toward the observer when both the source and the observer lie
//! in front of it (`d·n > 0` and `s·n > 0`).

use nalgebra::Vector3;
use ordered_float::OrderedFloat;
use smallvec::SmallVec;

use crate::constants::Degree;

/// Tilt of each mirror normal away from nadir, in degrees.
pub const MIRROR_TILT: Degree = 40.0;

/// Yaw of the three mirror normals around the radial axis, in degrees.
pub const MIRROR_YAWS: [Degree; 3] = [0.0, 120.0, -120.0];

/// Flare angles of one mirror.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MirrorReflection {
    /// Mirror index, 0 for the forward mirror.
    pub mirror: usize,
    /// Angle between the reflected sunlight and the observer direction.
    pub sun_angle: Option<Degree>,
    /// Same for moonlight.
    pub moon_angle: Option<Degree>,
}

/// Flare geometry of a reflective satellite at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct FlareGeometry {
    /// Smallest Sun flare angle over the mirrors.
    pub sun_angle: Option<Degree>,
    /// Mirror producing `sun_angle`.
    pub mirror: Option<usize>,
    /// Smallest Moon flare angle over the mirrors.
    pub moon_angle: Option<Degree>,
    /// Mirror producing `moon_angle`.
    pub moon_mirror: Option<usize>,
    pub reflections: SmallVec<[MirrorReflection; 3]>,
}

/// Unit normals of the three mirrors.
///
/// Arguments
/// ---------
/// * `position`, `velocity`: inertial satellite state (any consistent units).
pub fn mirror_normals(position: &Vector3<f64>, velocity: &Vector3<f64>) -> [Vector3<f64>; 3] {
    let f = velocity.normalize();
    let l = position.cross(velocity).normalize();
    let up = f.cross(&l);

    let (sin_tilt, cos_tilt) = MIRROR_TILT.to_radians().sin_cos();
    MIRROR_YAWS.map(|yaw| {
        let (sin_yaw, cos_yaw) = yaw.to_radians().sin_cos();
        cos_tilt * -up + sin_tilt * (cos_yaw * f + sin_yaw * l)
    })
}

/// Angle between the reflection of a source on a mirror and the observer direction.
///
/// Arguments
/// ---------
/// * `normal`: unit mirror normal.
/// * `to_source`: unit vector from the satellite to the light source.
/// * `to_observer`: unit vector from the satellite to the observer.
///
/// Return
/// ------
/// * the flare angle in degrees, `None` when the source or the observer is behind the mirror.
pub fn reflection_angle(
    normal: &Vector3<f64>,
    to_source: &Vector3<f64>,
    to_observer: &Vector3<f64>,
) -> Option<Degree> {
    let dn = to_source.dot(normal);
    if dn <= 0.0 || to_observer.dot(normal) <= 0.0 {
        return None;
    }
    let reflected = 2.0 * dn * normal - to_source;
    Some(reflected.angle(to_observer).to_degrees())
}

fn best(
    reflections: &[MirrorReflection],
    angle: impl Fn(&MirrorReflection) -> Option<Degree>,
) -> Option<(usize, Degree)> {
    reflections
        .iter()
        .filter_map(|r| angle(r).map(|a| (r.mirror, a)))
        .min_by_key(|(_, a)| OrderedFloat(*a))
}

/// Flare geometry of a satellite for an observer.
///
/// Arguments
/// ---------
/// * `position`, `velocity`: inertial satellite state in km and km/s.
/// * `observer`: inertial observer position in km.
/// * `sun`, `moon`: geocentric Sun and Moon positions in km.
pub fn flare_geometry(
    position: &Vector3<f64>,
    velocity: &Vector3<f64>,
    observer: &Vector3<f64>,
    sun: &Vector3<f64>,
    moon: &Vector3<f64>,
) -> FlareGeometry {
    let to_observer = (observer - position).normalize();
    let to_sun = (sun - position).normalize();
    let to_moon = (moon - position).normalize();

    let reflections: SmallVec<[MirrorReflection; 3]> = mirror_normals(position, velocity)
        .iter()
        .enumerate()
        .map(|(mirror, n)| MirrorReflection {
            mirror,
            sun_angle: reflection_angle(n, &to_sun, &to_observer),
            moon_angle: reflection_angle(n, &to_moon, &to_observer),
        })
        .collect();

    let sun_best = best(&reflections, |r| r.sun_angle);
    let moon_best = best(&reflections, |r| r.moon_angle);

    FlareGeometry {
        sun_angle: sun_best.map(|(_, a)| a),
        mirror: sun_best.map(|(m, _)| m),
        moon_angle: moon_best.map(|(_, a)| a),
        moon_mirror: moon_best.map(|(m, _)| m),
        reflections,
    }
}

#[cfg(test)]
mod flare_test {
    use super::*;
    use approx::assert_relative_eq;

    fn state() -> (Vector3<f64>, Vector3<f64>) {
        (Vector3::new(7000.0, 0.0, 0.0), Vector3::new(0.0, 7.5, 0.0))
    }

    #[test]
    fn test_mirror_normals() {
        let (r, v) = state();
        let normals = mirror_normals(&r, &v);
        for n in &normals {
            assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-12);
            // all mirrors face the Earth at 40° from nadir
            assert_relative_eq!(
                n.dot(&-r.normalize()),
                MIRROR_TILT.to_radians().cos(),
                epsilon = 1e-12
            );
        }
        // forward mirror leans along track
        assert!(normals[0].y > 0.0);
        assert!(normals[1].y < 0.0 && normals[2].y < 0.0);
        // rear mirrors are symmetric about the orbit plane
        assert_relative_eq!(normals[1].z, -normals[2].z, epsilon = 1e-12);
    }

    #[test]
    fn test_reflection_angle() {
        let n = Vector3::new(0.0, 0.0, 1.0);
        let src = Vector3::new(1.0, 0.0, 1.0).normalize();
        let obs = Vector3::new(-1.0, 0.0, 1.0).normalize();
        assert_relative_eq!(reflection_angle(&n, &src, &obs).unwrap(), 0.0, epsilon = 1e-5);

        let off = Vector3::new(0.0, 0.0, 1.0);
        assert_relative_eq!(reflection_angle(&n, &src, &off).unwrap(), 45.0, epsilon = 1e-6);

        // source behind the mirror
        assert_eq!(reflection_angle(&n, &-src, &obs), None);
        // observer behind the mirror
        assert_eq!(reflection_angle(&n, &src, &-obs), None);
    }

    #[test]
    fn test_specular_observer() {
        let (r, v) = state();
        let n0 = mirror_normals(&r, &v)[0];
        let sun_dir = (-r.normalize() + Vector3::new(0.0, 0.0, 0.2)).normalize();
        let sun = r + 1.5e8 * sun_dir;

        // reflect the sunlight off the forward mirror and put the observer on the ray
        let to_sun = sun_dir;
        let reflected = 2.0 * to_sun.dot(&n0) * n0 - to_sun;
        assert!(to_sun.dot(&n0) > 0.0);
        let observer = r + 800.0 * reflected;

        let geom = flare_geometry(&r, &v, &observer, &sun, &(-sun));
        assert_eq!(geom.mirror, Some(0));
        assert!(geom.sun_angle.unwrap() < 1e-3);
        assert_eq!(geom.reflections.len(), 3);
        assert!(geom.moon_angle.map_or(true, |a| a > 1.0));
    }
}

use crate::constants::{ArcSec, Radian, MJD, RADSEC, T2000};

/// Compute the mean obliquity of the ecliptic at a given epoch (IAU 1976 model).
///
/// Arguments
/// ---------
/// * `tjm`: Modified Julian Date.
///
/// Returns
/// --------
/// * Mean obliquity of the ecliptic in radians.
///
/// Formula
/// -------
/// ```text
/// ε(t) = ε₀ + ε₁·T + ε₂·T² + ε₃·T³,   T = (tjm - T2000) / 36525
/// ```
/// evaluated with Horner's method.
///
/// # See also
/// * [`equequ`] – projects the nutation in longitude with this obliquity
/// * [`sun_position`](crate::sun_moon::sun_position) – rotates ecliptic coordinates to the equator
pub fn obleq(tjm: MJD) -> Radian {
    let ob0 = ((23.0 * 3600.0 + 26.0 * 60.0) + 21.448) * RADSEC;
    let ob1 = -46.815 * RADSEC;
    let ob2 = -0.0006 * RADSEC;
    let ob3 = 0.00181 * RADSEC;

    let t = (tjm - T2000) / 36525.0;

    ((ob3 * t + ob2) * t + ob1) * t + ob0
}

/// One periodic term of the nutation series.
///
/// The argument is the integer combination
/// `l·M + lp·M' + f·F + d·D + om·Ω` of the Delaunay arguments, the amplitudes are
/// in units of 0.1 milliarcsecond with a linear rate per Julian century.
struct NutationTerm {
    l: f64,
    lp: f64,
    f: f64,
    d: f64,
    om: f64,
    psi: f64,
    psi_t: f64,
    eps: f64,
    eps_t: f64,
}

const fn term(
    l: f64,
    lp: f64,
    f: f64,
    d: f64,
    om: f64,
    psi: f64,
    psi_t: f64,
    eps: f64,
    eps_t: f64,
) -> NutationTerm {
    NutationTerm {
        l,
        lp,
        f,
        d,
        om,
        psi,
        psi_t,
        eps,
        eps_t,
    }
}

/// Leading terms of the IAU 1980 series, enough for sub-arcsecond sidereal time.
const NUTATION_TERMS: [NutationTerm; 9] = [
    term(0., 0., 0., 0., 1., -171996., -174.2, 92025., 8.9),
    term(0., 0., 2., -2., 2., -13187., -1.6, 5736., -3.1),
    term(0., 0., 2., 0., 2., -2274., -0.2, 977., -0.5),
    term(0., 0., 0., 0., 2., 2062., 0.2, -895., 0.5),
    term(0., 1., 0., 0., 0., 1426., -3.4, 54., -0.1),
    term(1., 0., 0., 0., 0., 712., 0.1, -7., 0.),
    term(0., 1., 2., -2., 2., -517., 1.2, 224., -0.6),
    term(0., 0., 2., 0., 1., -386., -0.4, 200., 0.),
    term(1., 0., 2., 0., 2., -301., 0., 129., -0.1),
];

/// Compute the nutation angles in longitude and obliquity (truncated IAU 1980 series).
///
/// Arguments
/// ---------
/// * `tjm`: Modified Julian Date.
///
/// Returns
/// --------
/// * A tuple `(Δψ, Δε)` in arcseconds.
///
/// The fundamental lunar and solar arguments are the cubic polynomials of the
/// IAU 1980 theory; only the dominant periodic terms are summed, which keeps the
/// error on Δψ below 0.05″.
pub fn nutation(tjm: MJD) -> (ArcSec, ArcSec) {
    let t = (tjm - T2000) / 36525.0;
    let t2 = t * t;
    let t3 = t2 * t;

    let l = (485866.733 + 1717915922.633 * t + 31.310 * t2 + 0.064 * t3) * RADSEC;
    let lp = (1287099.804 + 129596581.224 * t - 0.577 * t2 - 0.012 * t3) * RADSEC;
    let f = (335778.877 + 1739527263.137 * t - 13.257 * t2 + 0.011 * t3) * RADSEC;
    let d = (1072261.307 + 1602961601.328 * t - 6.891 * t2 + 0.019 * t3) * RADSEC;
    let om = (450160.280 - 6962890.539 * t + 7.455 * t2 + 0.008 * t3) * RADSEC;

    let (dpsi, deps) = NUTATION_TERMS
        .iter()
        .fold((0.0, 0.0), |(dpsi, deps), nt| {
            let arg = nt.l * l + nt.lp * lp + nt.f * f + nt.d * d + nt.om * om;
            (
                dpsi + (nt.psi + nt.psi_t * t) * arg.sin(),
                deps + (nt.eps + nt.eps_t * t) * arg.cos(),
            )
        });

    (dpsi * 1e-4, deps * 1e-4)
}

/// Compute the equation of the equinoxes, difference between apparent and
/// mean sidereal time, in radians.
///
/// Arguments
/// ---------
/// * `tjm`: Modified Julian Date.
///
/// Returns
/// --------
/// * `Δψ·cos(ε)` in radians.
///
/// # See also
/// * [`gmst`](crate::time::gmst) – mean sidereal time this correction is added to
pub fn equequ(tjm: MJD) -> Radian {
    let oblm = obleq(tjm);
    let (dpsi, _deps) = nutation(tjm);
    RADSEC * dpsi * oblm.cos()
}

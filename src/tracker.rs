//! # Tracker: one observer, many satellites
//!
//! [`Tracker`] is the central context of the crate. It owns
//!
//! 1. the ground [`Observer`],
//! 2. the [`EphemerisConfig`] applied to every observable,
//! 3. the [`SearchParams`] of the visibility searches,
//! 4. a registry of satellites, one [`Propagator`] each, addressed by the index returned
//!    from [`Tracker::add_satellite`].
//!
//! Propagators keep mutable deep-space state, so every query takes `&mut self`. To spread
//! satellites over threads, build one tracker per thread.
//!
//! ## Typical usage
//!
//! ```rust,no_run
//! use satvis::elements::OrbitalElementSet;
//! use satvis::observers::Observer;
//! use satvis::tracker::Tracker;
//!
//! let site = Observer::new(2.35, 48.85, 0.05, Some("Paris".into())).unwrap();
//! let mut tracker = Tracker::with_defaults(site);
//!
//! let elements = OrbitalElementSet::default(); // filled by the caller's catalog reader
//! let idx = tracker.add_satellite(&elements).unwrap();
//!
//! let jd = 2_460_500.5;
//! let next = tracker.next_pass(idx, jd, 10.0, 1.0, false).unwrap();
//! if next != 0.0 {
//!     let eph = tracker.observe(idx, next.abs()).unwrap();
//!     println!("{:.1}° az, {:.1}° el", eph.azimuth, eph.elevation);
//! }
//! ```
//!
//! ## See also
//! ------------
//! * [`propagate`](crate::propagator::propagate), [`observe`](crate::ephemeris::observe) –
//!   one-shot free functions.
//! * [`next_pass`](crate::search::pass::next_pass),
//!   [`rise_set_transit`](crate::search::pass::rise_set_transit),
//!   [`next_flares`](crate::search::flare::next_flares) – the searches behind the tracker.

use crate::{
    constants::{Degree, JulianDay},
    elements::OrbitalElementSet,
    ephemeris::{observe_with, EphemerisConfig, SatelliteEphemeris},
    observers::Observer,
    propagator::{PositionVelocity, Propagator},
    satvis_errors::SatvisError,
    search::{
        flare::{next_flares, FlareEvent},
        pass::{next_pass, rise_set_transit, RiseSetTransit},
        SearchParams,
    },
};

#[derive(Debug, Clone)]
pub struct Tracker {
    observer: Observer,
    config: EphemerisConfig,
    params: SearchParams,
    satellites: Vec<Propagator>,
}

impl Tracker {
    /// Construct a tracker with an empty registry.
    ///
    /// Arguments
    /// -----------------
    /// * `observer`: the ground site shared by every query.
    /// * `config`: apparent/geometric, topocentric/geocentric, extinction.
    /// * `params`: tunables of the searches.
    pub fn new(observer: Observer, config: EphemerisConfig, params: SearchParams) -> Self {
        Tracker {
            observer,
            config,
            params,
            satellites: Vec::new(),
        }
    }

    /// Same as [`Tracker::new`] with the default configuration and search parameters.
    pub fn with_defaults(observer: Observer) -> Self {
        Self::new(observer, EphemerisConfig::default(), SearchParams::default())
    }

    pub fn observer(&self) -> &Observer {
        &self.observer
    }

    pub fn config(&self) -> &EphemerisConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: EphemerisConfig) {
        self.config = config;
    }

    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    /// Build a propagator for an element set and register it.
    ///
    /// Return
    /// ----------
    /// * the index of the satellite in the registry.
    ///
    /// Errors
    /// ----------
    /// * construction errors of [`Propagator::new`]; the registry is left unchanged.
    pub fn add_satellite(&mut self, elements: &OrbitalElementSet) -> Result<usize, SatvisError> {
        let propagator = Propagator::new(elements)?;
        self.satellites.push(propagator);
        Ok(self.satellites.len() - 1)
    }

    /// Propagator of a registered satellite.
    ///
    /// Errors
    /// ----------
    /// * [`SatvisError::InvalidSatelliteIndex`] for an unknown index.
    pub fn satellite(&self, idx: usize) -> Result<&Propagator, SatvisError> {
        self.satellites
            .get(idx)
            .ok_or(SatvisError::InvalidSatelliteIndex(idx))
    }

    /// A propagator together with the shared context, borrowed field by field.
    fn context(
        &mut self,
        idx: usize,
    ) -> Result<(&mut Propagator, &Observer, &EphemerisConfig, &SearchParams), SatvisError> {
        let propagator = self
            .satellites
            .get_mut(idx)
            .ok_or(SatvisError::InvalidSatelliteIndex(idx))?;
        Ok((propagator, &self.observer, &self.config, &self.params))
    }

    /// Number of registered satellites.
    pub fn len(&self) -> usize {
        self.satellites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.satellites.is_empty()
    }

    /// Names of the registered satellites, in index order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.satellites.iter().map(|p| p.elements().name.as_str())
    }

    /// Inertial state of a satellite at a Julian Date.
    pub fn propagate(&mut self, idx: usize, jd: JulianDay) -> Result<PositionVelocity, SatvisError> {
        let (propagator, ..) = self.context(idx)?;
        Ok(propagator.propagate_jd(jd))
    }

    /// Observables of a satellite at a Julian Date.
    pub fn observe(&mut self, idx: usize, jd: JulianDay) -> Result<SatelliteEphemeris, SatvisError> {
        let (propagator, observer, config, _) = self.context(idx)?;
        Ok(observe_with(propagator, jd, observer, config))
    }

    /// Observables with the pass fields filled.
    ///
    /// `next_pass` is the start of the next pass above `min_elevation` after `jd`
    /// (see [`Tracker::next_pass`]). `rise_set` is set when the satellite is above the
    /// depressed horizon at `jd`.
    pub fn observe_with_events(
        &mut self,
        idx: usize,
        jd: JulianDay,
        min_elevation: Degree,
        max_days: f64,
    ) -> Result<SatelliteEphemeris, SatvisError> {
        let mut eph = self.observe(idx, jd)?;
        eph.next_pass = Some(self.next_pass(idx, jd, min_elevation, max_days, false)?);
        if !eph.decayed && eph.geometric_elevation() >= -self.params.horizon_refraction {
            eph.rise_set = Some(self.rise_set_transit(idx, &eph)?);
        }
        Ok(eph)
    }

    /// Start of the next pass of a satellite, see [`next_pass`].
    pub fn next_pass(
        &mut self,
        idx: usize,
        from_jd: JulianDay,
        min_elevation: Degree,
        max_days: f64,
        include_current: bool,
    ) -> Result<f64, SatvisError> {
        let (propagator, observer, config, params) = self.context(idx)?;
        next_pass(
            propagator,
            observer,
            config,
            params,
            from_jd,
            min_elevation,
            max_days,
            include_current,
        )
    }

    /// Rise, set and transit around an ephemeris, with the tracker's horizon refraction.
    pub fn rise_set_transit(
        &mut self,
        idx: usize,
        at_pass: &SatelliteEphemeris,
    ) -> Result<RiseSetTransit, SatvisError> {
        let (propagator, observer, config, params) = self.context(idx)?;
        rise_set_transit(
            propagator,
            at_pass,
            observer,
            config,
            params.horizon_refraction,
        )
    }

    /// Flares of a satellite, see [`next_flares`].
    pub fn next_flares(
        &mut self,
        idx: usize,
        from_jd: JulianDay,
        min_elevation: Degree,
        max_days: f64,
        precision_seconds: u32,
    ) -> Result<Vec<FlareEvent>, SatvisError> {
        let (propagator, observer, config, params) = self.context(idx)?;
        next_flares(
            propagator,
            observer,
            config,
            params,
            from_jd,
            min_elevation,
            max_days,
            precision_seconds,
        )
    }
}

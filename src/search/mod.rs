//! # Visibility search
//!
//! Time searches built from repeated calls to the propagator and the observable layer:
//!
//! * [`pass::next_pass`]: adaptive forward stepping to the next time a satellite rises
//!   above a minimum elevation.
//! * [`pass::rise_set_transit`]: 1-second refinement of the rise, set and culmination of
//!   a pass.
//! * [`flare::next_flares`]: coarse then fine scan of the passes of a reflective
//!   satellite for specular flares.
//!
//! Every loop is bounded by a step cap derived from the requested day-span and by the
//! hard caps of [`SearchParams`]. Exhausting a search is not an error: the routines
//! return the `0.0` sentinel or an empty list.
//!
//! ## Example
//!
//! ```rust,no_run
//! use satvis::search::SearchParams;
//!
//! let params = SearchParams::builder()
//!     .flare_threshold(3.0)
//!     .max_flare_events(10)
//!     .build()
//!     .unwrap();
//! println!("{params:#}");
//! ```
use crate::constants::Degree;
use crate::satvis_errors::SatvisError;
use std::cmp::Ordering::{Equal, Greater, Less};
use std::fmt;

pub mod flare;
pub mod pass;

/// Tunables of the visibility searches.
///
/// Fields
/// -----------------
/// * `flare_threshold` – flare angle (degrees) below which a reflection counts as a flare.
/// * `horizon_refraction` – depression of the geometric horizon (degrees) used for rise and
///   set, 34′ by convention.
/// * `max_search_steps` – hard cap on the propagations of one next-pass or flare search.
/// * `max_flare_events` – flare search stops after this many events.
///
/// Defaults
/// -----------------
/// * `flare_threshold`: 5.0°
/// * `horizon_refraction`: 34′
/// * `max_search_steps`: 1 000 000
/// * `max_flare_events`: 100
///
/// Notes & Validation
/// -----------------
/// * `0 < flare_threshold < 90`.
/// * `0 ≤ horizon_refraction ≤ 5`.
/// * `max_search_steps ≥ 1`, `max_flare_events ≥ 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    pub flare_threshold: Degree,
    pub horizon_refraction: Degree,
    pub max_search_steps: usize,
    pub max_flare_events: usize,
}

impl SearchParams {
    /// Same as [`SearchParams::default()`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Fluent builder, see [`SearchParamsBuilder`].
    pub fn builder() -> SearchParamsBuilder {
        SearchParamsBuilder::new()
    }
}

impl Default for SearchParams {
    fn default() -> Self {
        SearchParams {
            flare_threshold: 5.0,
            horizon_refraction: 34.0 / 60.0,
            max_search_steps: 1_000_000,
            max_flare_events: 100,
        }
    }
}

/// Builder for [`SearchParams`], with validation.
#[derive(Debug, Clone)]
pub struct SearchParamsBuilder {
    params: SearchParams,
}

impl Default for SearchParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchParamsBuilder {
    /// Create a new builder initialized with default values.
    pub fn new() -> Self {
        Self {
            params: SearchParams::default(),
        }
    }

    pub fn flare_threshold(mut self, v: Degree) -> Self {
        self.params.flare_threshold = v;
        self
    }
    pub fn horizon_refraction(mut self, v: Degree) -> Self {
        self.params.horizon_refraction = v;
        self
    }
    pub fn max_search_steps(mut self, v: usize) -> Self {
        self.params.max_search_steps = v;
        self
    }
    pub fn max_flare_events(mut self, v: usize) -> Self {
        self.params.max_flare_events = v;
        self
    }

    /// Return true iff x > 0.0 and comparable (i.e., not NaN).
    #[inline]
    fn gt0(x: f64) -> bool {
        x.partial_cmp(&0.0) == Some(Greater)
    }

    /// Return true iff x >= 0.0 and comparable (i.e., not NaN).
    #[inline]
    fn ge0(x: f64) -> bool {
        matches!(x.partial_cmp(&0.0), Some(Greater) | Some(Equal))
    }

    /// Return true iff a < b and comparable (i.e., not NaN).
    #[inline]
    fn lt(a: f64, b: f64) -> bool {
        a.partial_cmp(&b) == Some(Less)
    }

    /// Return true iff a <= b and comparable (i.e., not NaN).
    #[inline]
    fn le(a: f64, b: f64) -> bool {
        matches!(a.partial_cmp(&b), Some(Less) | Some(Equal))
    }

    /// Finalize the builder.
    ///
    /// Validation rules
    /// -----------------
    /// * `0 < flare_threshold < 90`.
    /// * `0 ≤ horizon_refraction ≤ 5`.
    /// * `max_search_steps ≥ 1`, `max_flare_events ≥ 1`.
    ///
    /// Returns
    /// -----------------
    /// * `Ok(SearchParams)` if all values are valid.
    /// * `Err(SatvisError::InvalidSearchParameter)` naming the first rule that fails.
    pub fn build(self) -> Result<SearchParams, SatvisError> {
        let p = &self.params;

        if !(Self::gt0(p.flare_threshold) && Self::lt(p.flare_threshold, 90.0)) {
            return Err(SatvisError::InvalidSearchParameter(
                "flare_threshold must lie in (0, 90) degrees".into(),
            ));
        }
        if !(Self::ge0(p.horizon_refraction) && Self::le(p.horizon_refraction, 5.0)) {
            return Err(SatvisError::InvalidSearchParameter(
                "horizon_refraction must lie in [0, 5] degrees".into(),
            ));
        }
        if p.max_search_steps == 0 {
            return Err(SatvisError::InvalidSearchParameter(
                "max_search_steps must be >= 1".into(),
            ));
        }
        if p.max_flare_events == 0 {
            return Err(SatvisError::InvalidSearchParameter(
                "max_flare_events must be >= 1".into(),
            ));
        }

        Ok(self.params)
    }
}

impl fmt::Display for SearchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            const PARAM_COL: usize = 40;
            writeln!(f, "Visibility Search Parameters")?;
            writeln!(f, "----------------------------")?;

            macro_rules! line {
                ($fmt:expr, $val:expr, $comment:expr) => {{
                    let s = format!($fmt, $val);
                    let pad = if s.len() < PARAM_COL {
                        " ".repeat(PARAM_COL - s.len())
                    } else {
                        " ".to_string()
                    };
                    writeln!(f, "  {}{}# {}", s, pad, $comment)
                }};
            }

            line!(
                "flare_threshold    = {:.2}°",
                self.flare_threshold,
                "Flare angle counted as a flare"
            )?;
            line!(
                "horizon_refraction = {:.2}′",
                self.horizon_refraction * 60.0,
                "Horizon depression for rise/set"
            )?;
            line!(
                "max_search_steps   = {}",
                self.max_search_steps,
                "Propagation cap per search"
            )?;
            line!(
                "max_flare_events   = {}",
                self.max_flare_events,
                "Flare events kept per search"
            )?;
            Ok(())
        } else {
            write!(
                f,
                "SearchParams(flare_threshold={:.2}°, horizon_refraction={:.2}′, max_search_steps={}, max_flare_events={})",
                self.flare_threshold,
                self.horizon_refraction * 60.0,
                self.max_search_steps,
                self.max_flare_events,
            )
        }
    }
}

/// Check a minimum elevation and a search span.
///
/// Errors
/// ------
/// * [`SatvisError::InvalidMinElevation`] outside [0, 90).
/// * [`SatvisError::InvalidInput`] when `max_days` is not strictly positive and finite.
pub(crate) fn validate_window(min_elevation: Degree, max_days: f64) -> Result<(), SatvisError> {
    if !(0.0..90.0).contains(&min_elevation) {
        return Err(SatvisError::InvalidMinElevation(min_elevation));
    }
    if !(max_days.is_finite() && max_days > 0.0) {
        return Err(SatvisError::InvalidInput(format!(
            "search span must be a positive number of days, got {max_days}"
        )));
    }
    Ok(())
}

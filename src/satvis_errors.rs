use thiserror::Error;

#[derive(Error, Debug)]
pub enum SatvisError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Element epoch cannot be resolved to a calendar date: year {year}, day {day}")]
    InvalidEpoch { year: i32, day: f64 },

    #[error("Minimum elevation must lie in [0°, 90°), got {0}°")]
    InvalidMinElevation(f64),

    #[error("No satellite registered at index {0}")]
    InvalidSatelliteIndex(usize),

    #[error("Invalid search parameter: {0}")]
    InvalidSearchParameter(String),

    #[error("NaN encountered where a finite value is required")]
    NanValue(#[from] ordered_float::FloatIsNan),
}

impl PartialEq for SatvisError {
    fn eq(&self, other: &Self) -> bool {
        use SatvisError::*;
        match (self, other) {
            (InvalidInput(a), InvalidInput(b)) => a == b,
            (InvalidEpoch { year: y1, day: d1 }, InvalidEpoch { year: y2, day: d2 }) => {
                y1 == y2 && (d1 == d2 || (d1.is_nan() && d2.is_nan()))
            }
            (InvalidMinElevation(a), InvalidMinElevation(b)) => a == b,
            (InvalidSatelliteIndex(a), InvalidSatelliteIndex(b)) => a == b,
            (InvalidSearchParameter(a), InvalidSearchParameter(b)) => a == b,

            // FloatIsNan carries no payload
            (NanValue(_), NanValue(_)) => true,

            _ => false,
        }
    }
}

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CalcError {
    #[error("invalid input: {field} {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("invalid slab table: {0}")]
    InvalidSlabs(String),

    #[error("export failed: {0}")]
    Export(String),
}

impl CalcError {
    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        CalcError::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

pub type CalcResult<T> = Result<T, CalcError>;

pub(crate) fn ensure_finite(field: &str, value: f64) -> CalcResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(CalcError::invalid(field, "must be a finite number"))
    }
}

pub(crate) fn ensure_range(field: &str, value: f64, min: f64, max: f64) -> CalcResult<()> {
    ensure_finite(field, value)?;
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(CalcError::invalid(
            field,
            format!("must be between {min} and {max}"),
        ))
    }
}

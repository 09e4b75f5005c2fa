use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum CalculationError {
    #[error("Unsupported input shape for a {0} calculation")]
    UnsupportedInput(&'static str),

    #[error("Calculation error: Division by zero encountered ({0} / 0)")]
    DivisionByZero(f64),

    /// Overflow or an undefined result. JSON cannot carry it, so it is never persisted.
    #[error("The {0} calculation produced a non-finite value")]
    NonFinite(&'static str),
}

use thiserror::Error;

/// Error types for the compute module
#[derive(Error, Debug)]
pub enum ComputeError {
    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Input rejected before touching the database
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Guard clause failures of the calculator functions.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalculatorError {
    #[error("Cannot divide by zero.")]
    DivisionByZero,

    #[error("Cannot perform modulus with zero.")]
    ModulusByZero,

    #[error("Cannot compute square root of a negative number.")]
    NegativeSquareRoot,

    #[error("Cannot compute factorial of a negative number.")]
    NegativeFactorial,

    #[error("Logarithm undefined for non-positive values.")]
    NonPositiveLogarithm,

    #[error("Logarithm base must be positive and different from 1.")]
    InvalidLogarithmBase,

    #[error("Cannot compute GCD or LCM with zero.")]
    ZeroOperand,

    #[error("Input must be greater than or equal to 2.")]
    PrimeOutOfRange,

    #[error("Input must be a non-negative integer.")]
    NegativeFibonacci,

    #[error("Input must be a positive integer.")]
    NonPositiveIndex,

    #[error("Result does not fit in a 64-bit integer.")]
    Overflow,
}

/// Type alias for Result with ComputeError
pub type Result<T> = std::result::Result<T, ComputeError>;

//! Business logic that sits between the HTTP layer and the entities:
//! tag/ingredient association for recipe writes, plus the standalone
//! calculator helpers.

pub mod associations;
pub mod calculator;
pub mod error;

pub use error::{CalculatorError, ComputeError};

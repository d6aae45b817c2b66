//! Stateless arithmetic helpers.
//!
//! Floating point operations take and return `f64`; the number theoretic
//! ones work on integers and report overflow instead of wrapping.

use crate::error::CalculatorError;

/// Result type of the fallible calculator functions.
pub type CalcResult<T> = std::result::Result<T, CalculatorError>;

pub fn add(a: f64, b: f64) -> f64 {
    a + b
}

pub fn subtract(a: f64, b: f64) -> f64 {
    a - b
}

pub fn multiply(a: f64, b: f64) -> f64 {
    a * b
}

/// Returns `a / b`, refusing a zero divisor.
pub fn divide(a: f64, b: f64) -> CalcResult<f64> {
    if b == 0.0 {
        return Err(CalculatorError::DivisionByZero);
    }
    Ok(a / b)
}

pub fn power(base: f64, exponent: f64) -> f64 {
    base.powf(exponent)
}

/// Floored modulo: the result carries the sign of the divisor,
/// so `modulus(-7.0, 3.0) == 2.0` and `modulus(7.0, -3.0) == -2.0`.
pub fn modulus(a: f64, b: f64) -> CalcResult<f64> {
    if b == 0.0 {
        return Err(CalculatorError::ModulusByZero);
    }
    let remainder = a % b;
    if remainder != 0.0 && (remainder < 0.0) != (b < 0.0) {
        Ok(remainder + b)
    } else {
        Ok(remainder)
    }
}

pub fn square_root(x: f64) -> CalcResult<f64> {
    if x < 0.0 {
        return Err(CalculatorError::NegativeSquareRoot);
    }
    Ok(x.sqrt())
}

pub fn absolute_value(x: f64) -> f64 {
    x.abs()
}

/// Iterative factorial.
pub fn factorial(n: i64) -> CalcResult<u64> {
    if n < 0 {
        return Err(CalculatorError::NegativeFactorial);
    }
    (2..=n as u64).try_fold(1u64, |acc, i| acc.checked_mul(i).ok_or(CalculatorError::Overflow))
}

/// Recursive factorial; same contract as [`factorial`].
pub fn factorial_recursive(n: i64) -> CalcResult<u64> {
    if n < 0 {
        return Err(CalculatorError::NegativeFactorial);
    }
    if n <= 1 {
        return Ok(1);
    }
    factorial_recursive(n - 1)?
        .checked_mul(n as u64)
        .ok_or(CalculatorError::Overflow)
}

/// Logarithm of `x` in the given base.
pub fn logarithm(x: f64, base: f64) -> CalcResult<f64> {
    if x <= 0.0 {
        return Err(CalculatorError::NonPositiveLogarithm);
    }
    if base <= 0.0 || base == 1.0 {
        return Err(CalculatorError::InvalidLogarithmBase);
    }
    Ok(x.ln() / base.ln())
}

/// Base 10 logarithm, the default base of [`logarithm`].
pub fn log10(x: f64) -> CalcResult<f64> {
    logarithm(x, 10.0)
}

pub fn sine(angle: f64) -> f64 {
    angle.sin()
}

pub fn cosine(angle: f64) -> f64 {
    angle.cos()
}

pub fn tangent(angle: f64) -> f64 {
    angle.tan()
}

/// Greatest common divisor (Euclid). Always non-negative.
pub fn gcd(a: i64, b: i64) -> CalcResult<i64> {
    if a == 0 || b == 0 {
        return Err(CalculatorError::ZeroOperand);
    }
    let (mut a, mut b) = (a.unsigned_abs(), b.unsigned_abs());
    while b != 0 {
        (a, b) = (b, a % b);
    }
    i64::try_from(a).map_err(|_| CalculatorError::Overflow)
}

/// Least common multiple. Always non-negative.
pub fn lcm(a: i64, b: i64) -> CalcResult<i64> {
    let divisor = gcd(a, b)?.unsigned_abs();
    (a.unsigned_abs() / divisor)
        .checked_mul(b.unsigned_abs())
        .and_then(|product| i64::try_from(product).ok())
        .ok_or(CalculatorError::Overflow)
}

/// Trial division primality test. Inputs below 2 are rejected.
pub fn is_prime(n: i64) -> CalcResult<bool> {
    if n < 2 {
        return Err(CalculatorError::PrimeOutOfRange);
    }
    let mut i: i64 = 2;
    while i <= n / i {
        if n % i == 0 {
            return Ok(false);
        }
        i += 1;
    }
    Ok(true)
}

/// The n-th Fibonacci number with `fibonacci(0) == 0`.
pub fn fibonacci(n: i64) -> CalcResult<u64> {
    if n < 0 {
        return Err(CalculatorError::NegativeFibonacci);
    }
    if n == 0 {
        return Ok(0);
    }
    let (mut a, mut b) = (0u64, 1u64);
    for _ in 1..n {
        let next = a.checked_add(b).ok_or(CalculatorError::Overflow)?;
        a = b;
        b = next;
    }
    Ok(b)
}

/// The n-th prime, 1-indexed: `nth_prime(1) == 2`.
pub fn nth_prime(n: i64) -> CalcResult<u64> {
    if n < 1 {
        return Err(CalculatorError::NonPositiveIndex);
    }
    let mut count = 0;
    let mut candidate: i64 = 1;
    while count < n {
        candidate += 1;
        if is_prime(candidate)? {
            count += 1;
        }
    }
    Ok(candidate as u64)
}

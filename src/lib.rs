//! altsum - alternating-sign range sums and subtraction GCD
//!
//! Reads two bounds `n` and `m`, prints every value of `n..=m` with the even
//! ones negated, then the doubled running sum and `gcd(n, m)`.
//!
//! This crate provides the arithmetic, the console driver, configuration and
//! logging; the `altsum` binary wires them to the command line.

pub mod arith;
pub mod config;
pub mod driver;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use arith::{add, double, gcd};
pub use config::{Config, DriverConfig, OutputFormat};
pub use driver::{run, Bounds, Report};
pub use error::{AltsumError, AltsumResult};

/// Run the driver over in-memory input and capture what it prints
///
/// Returns a tuple of (report, stdout_text).
///
/// # Example
/// ```
/// use altsum::{run_with_output, DriverConfig};
///
/// let (report, output) = run_with_output("1\n4\n", &DriverConfig::default()).unwrap();
/// assert_eq!(report.sum, -4);
/// assert!(output.ends_with("gcd (n, m) = 1\n"));
/// ```
pub fn run_with_output(input: &str, config: &DriverConfig) -> AltsumResult<(Report, String)> {
    let mut out = Vec::new();
    let report = run(input.as_bytes(), &mut out, config)?;
    let text = String::from_utf8(out).map_err(|e| AltsumError::Io(e.to_string()))?;
    Ok((report, text))
}

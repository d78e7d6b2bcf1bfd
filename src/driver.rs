use std::collections::VecDeque;
use std::io::{BufRead, Write};

use serde::Serialize;
use serde_json::json;

use crate::arith::{add, double, gcd_bounded, gcd_counted, GcdOutcome};
use crate::config::{DriverConfig, OutputFormat};
use crate::error::{AltsumError, AltsumResult};
use crate::logging;

const TARGET: &str = "altsum::driver";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub n: i64,
    pub m: i64,
}

/// One loop iteration: the cursor, the value printed for it, and the running sum after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub i: i64,
    pub j: i64,
    pub sum: i64,
}

/// Everything a run printed, minus the per-iteration values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Report {
    pub n: i64,
    pub m: i64,
    pub iterations: u64,
    pub sum: i64,
    pub gcd: i64,
    pub gcd_steps: u64,
}

/// Even values are negated, odd ones pass through.
pub fn alternate(i: i64) -> i64 {
    if i % 2 == 0 {
        i.wrapping_neg()
    } else {
        i
    }
}

/// The loop phase as an iterator. Empty when `n > m`.
pub fn steps(bounds: Bounds) -> impl Iterator<Item = Step> {
    (bounds.n..=bounds.m).scan(0i64, |sum, i| {
        let j = alternate(i);
        *sum = add(*sum, double(j));
        Some(Step { i, j, sum: *sum })
    })
}

/// Whitespace-delimited tokens pulled a line at a time. Kept as raw bytes so
/// input that isn't UTF-8 is reported against the bound it was meant for.
struct Tokens<R> {
    input: R,
    pending: VecDeque<Vec<u8>>,
}

impl<R: BufRead> Tokens<R> {
    fn new(input: R) -> Self {
        Tokens {
            input,
            pending: VecDeque::new(),
        }
    }

    fn next_token(&mut self) -> AltsumResult<Option<Vec<u8>>> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Ok(Some(token));
            }
            let mut line = Vec::new();
            if self.input.read_until(b'\n', &mut line)? == 0 {
                return Ok(None);
            }
            self.pending.extend(
                line.split(|b| b.is_ascii_whitespace())
                    .filter(|t| !t.is_empty())
                    .map(<[u8]>::to_vec),
            );
        }
    }

    fn read_i64(&mut self, name: &str) -> AltsumResult<i64> {
        let token = self.next_token()?.ok_or_else(|| AltsumError::MissingInput {
            name: name.to_string(),
        })?;
        std::str::from_utf8(&token)
            .ok()
            .and_then(|text| text.parse::<i64>().ok())
            .ok_or_else(|| AltsumError::InvalidInput {
                name: name.to_string(),
                value: String::from_utf8_lossy(&token).into_owned(),
            })
    }
}

fn prompt<W: Write>(output: &mut W, text: &str) -> AltsumResult<()> {
    write!(output, "{}", text)?;
    output.flush()?;
    Ok(())
}

/// Read `n` then `m`, prompting for each when `prompts` is set.
pub fn read_bounds<R: BufRead, W: Write>(
    input: R,
    output: &mut W,
    prompts: bool,
) -> AltsumResult<Bounds> {
    let mut tokens = Tokens::new(input);
    if prompts {
        prompt(output, "n = ")?;
    }
    let n = tokens.read_i64("n")?;
    if prompts {
        prompt(output, "m = ")?;
    }
    let m = tokens.read_i64("m")?;
    Ok(Bounds { n, m })
}

fn compute_gcd(bounds: Bounds, limit: Option<u64>) -> AltsumResult<GcdOutcome> {
    let outcome = match limit {
        Some(max_steps) => gcd_bounded(bounds.n, bounds.m, max_steps).inspect_err(|err| {
            logging::warn(TARGET, "gcd gave up", &[("error", json!(err.to_string()))]);
        })?,
        None => gcd_counted(bounds.n, bounds.m),
    };
    logging::debug(
        TARGET,
        "gcd computed",
        &[
            ("value", json!(outcome.value)),
            ("steps", json!(outcome.steps)),
        ],
    );
    Ok(outcome)
}

/// The loop and GCD phases without any printing.
pub fn evaluate(bounds: Bounds, gcd_limit: Option<u64>) -> AltsumResult<Report> {
    let (iterations, sum) = steps(bounds).fold((0u64, 0i64), |(count, _), step| {
        (count + 1, step.sum)
    });
    let outcome = compute_gcd(bounds, gcd_limit)?;
    Ok(Report {
        n: bounds.n,
        m: bounds.m,
        iterations,
        sum,
        gcd: outcome.value,
        gcd_steps: outcome.steps,
    })
}

/// Full driver: read the bounds, print each value, then the sum and the GCD.
pub fn run<R: BufRead, W: Write>(
    input: R,
    output: &mut W,
    config: &DriverConfig,
) -> AltsumResult<Report> {
    let bounds = read_bounds(input, output, config.show_prompts())?;
    logging::info(
        TARGET,
        "run started",
        &[("n", json!(bounds.n)), ("m", json!(bounds.m))],
    );

    let report = match config.output {
        OutputFormat::Text => run_text(bounds, output, config.gcd_limit)?,
        OutputFormat::Json => {
            let report = evaluate(bounds, config.gcd_limit)?;
            let encoded = serde_json::to_string(&report)
                .map_err(|e| AltsumError::Io(format!("encoding report: {}", e)))?;
            writeln!(output, "{}", encoded)?;
            report
        }
    };
    output.flush()?;

    logging::info(
        TARGET,
        "run finished",
        &[
            ("iterations", json!(report.iterations)),
            ("sum", json!(report.sum)),
            ("gcd", json!(report.gcd)),
        ],
    );
    Ok(report)
}

fn run_text<W: Write>(
    bounds: Bounds,
    output: &mut W,
    gcd_limit: Option<u64>,
) -> AltsumResult<Report> {
    let mut iterations = 0u64;
    let mut sum = 0i64;
    for step in steps(bounds) {
        logging::debug(
            TARGET,
            "step",
            &[
                ("i", json!(step.i)),
                ("j", json!(step.j)),
                ("sum", json!(step.sum)),
            ],
        );
        writeln!(output, "{}", step.j)?;
        iterations += 1;
        sum = step.sum;
    }
    writeln!(output, "sum = {}", sum)?;
    output.flush()?;

    let outcome = compute_gcd(bounds, gcd_limit)?;
    writeln!(output, "gcd (n, m) = {}", outcome.value)?;

    Ok(Report {
        n: bounds.n,
        m: bounds.m,
        iterations,
        sum,
        gcd: outcome.value,
        gcd_steps: outcome.steps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run_str(input: &str, config: &DriverConfig) -> (AltsumResult<Report>, String) {
        let mut out = Vec::new();
        let result = run(input.as_bytes(), &mut out, config);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_alternate() {
        assert_eq!(alternate(1), 1);
        assert_eq!(alternate(2), -2);
        assert_eq!(alternate(0), 0);
        assert_eq!(alternate(-3), -3);
        assert_eq!(alternate(-4), 4);
        assert_eq!(alternate(i64::MIN), i64::MIN);
    }

    #[test]
    fn test_steps_running_sum() {
        let collected: Vec<Step> = steps(Bounds { n: 1, m: 4 }).collect();
        let js: Vec<i64> = collected.iter().map(|s| s.j).collect();
        let sums: Vec<i64> = collected.iter().map(|s| s.sum).collect();
        assert_eq!(js, vec![1, -2, 3, -4]);
        assert_eq!(sums, vec![2, -2, 4, -4]);
    }

    #[test]
    fn test_steps_empty_when_n_exceeds_m() {
        assert_eq!(steps(Bounds { n: 4, m: 2 }).count(), 0);
    }

    #[test]
    fn test_steps_terminate_at_i64_max() {
        let bounds = Bounds {
            n: i64::MAX - 1,
            m: i64::MAX,
        };
        assert_eq!(steps(bounds).count(), 2);
    }

    #[test]
    fn test_read_bounds_on_separate_lines() {
        let mut out = Vec::new();
        let bounds = read_bounds("1\n4\n".as_bytes(), &mut out, true).unwrap();
        assert_eq!(bounds, Bounds { n: 1, m: 4 });
        assert_eq!(String::from_utf8(out).unwrap(), "n = m = ");
    }

    #[test]
    fn test_read_bounds_same_line_without_prompts() {
        let mut out = Vec::new();
        let bounds = read_bounds("  -7   +12  ".as_bytes(), &mut out, false).unwrap();
        assert_eq!(bounds, Bounds { n: -7, m: 12 });
        assert!(out.is_empty());
    }

    #[test]
    fn test_read_bounds_skips_blank_lines() {
        let mut out = Vec::new();
        let bounds = read_bounds("\n\n3\n\n\n9".as_bytes(), &mut out, false).unwrap();
        assert_eq!(bounds, Bounds { n: 3, m: 9 });
    }

    #[test]
    fn test_read_bounds_invalid_token() {
        let mut out = Vec::new();
        let err = read_bounds("1\nfour\n".as_bytes(), &mut out, true).unwrap_err();
        assert_eq!(
            err,
            AltsumError::InvalidInput {
                name: "m".to_string(),
                value: "four".to_string()
            }
        );
    }

    #[test]
    fn test_read_bounds_out_of_range() {
        let mut out = Vec::new();
        let err = read_bounds("99999999999999999999 1".as_bytes(), &mut out, false).unwrap_err();
        assert_eq!(err.bound_name(), Some("n"));
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_read_bounds_non_utf8_is_invalid_input() {
        let mut out = Vec::new();
        let err = read_bounds(&b"\xff\n4\n"[..], &mut out, true).unwrap_err();
        assert_eq!(
            err,
            AltsumError::InvalidInput {
                name: "n".to_string(),
                value: "\u{FFFD}".to_string()
            }
        );
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);

        let err = read_bounds(&b"7 4\xe2\x82\n"[..], &mut out, false).unwrap_err();
        assert_eq!(err.bound_name(), Some("m"));
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_run_non_utf8_input_prints_only_prompt() {
        let mut out = Vec::new();
        let err = run(&b"\xff\n4\n"[..], &mut out, &DriverConfig::default()).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
        assert_eq!(out, b"n = ");
    }

    #[test]
    fn test_read_bounds_missing_input() {
        let mut out = Vec::new();
        let err = read_bounds("5\n".as_bytes(), &mut out, false).unwrap_err();
        assert_eq!(
            err,
            AltsumError::MissingInput {
                name: "m".to_string()
            }
        );
        let err = read_bounds("".as_bytes(), &mut out, false).unwrap_err();
        assert_eq!(err.bound_name(), Some("n"));
    }

    #[test]
    fn test_run_ascending_range() {
        let (result, out) = run_str("1\n4\n", &DriverConfig::default());
        assert_eq!(out, "n = m = 1\n-2\n3\n-4\nsum = -4\ngcd (n, m) = 1\n");
        let report = result.unwrap();
        assert_eq!(report.iterations, 4);
        assert_eq!(report.sum, -4);
        assert_eq!(report.gcd, 1);
        assert_eq!(report.gcd_steps, 3);
    }

    #[test]
    fn test_run_single_value() {
        let (result, out) = run_str("5 5", &DriverConfig::default());
        assert_eq!(out, "n = m = 5\nsum = 10\ngcd (n, m) = 5\n");
        assert_eq!(result.unwrap().sum, 10);
    }

    #[test]
    fn test_run_empty_range() {
        let (result, out) = run_str("4\n2\n", &DriverConfig::default());
        assert_eq!(out, "n = m = sum = 0\ngcd (n, m) = 2\n");
        let report = result.unwrap();
        assert_eq!(report.iterations, 0);
        assert_eq!(report.gcd, 2);
    }

    #[test]
    fn test_run_is_repeatable() {
        let config = DriverConfig::default();
        let first = run_str("3\n10\n", &config);
        let second = run_str("3\n10\n", &config);
        assert_eq!(first, second);
    }

    #[test]
    fn test_run_json_output() {
        let config = DriverConfig {
            output: OutputFormat::Json,
            ..DriverConfig::default()
        };
        let (result, out) = run_str("1 4", &config);
        let report = result.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(parsed["n"], 1);
        assert_eq!(parsed["m"], 4);
        assert_eq!(parsed["iterations"], 4);
        assert_eq!(parsed["sum"], -4);
        assert_eq!(parsed["gcd"], 1);
        assert_eq!(parsed["gcd_steps"], report.gcd_steps);
    }

    #[test]
    fn test_run_gcd_limit_trips_after_sum() {
        let config = DriverConfig {
            prompts: false,
            gcd_limit: Some(50),
            ..DriverConfig::default()
        };
        let (result, out) = run_str("0 2", &config);
        assert_eq!(out, "0\n1\n-2\nsum = -2\n");
        assert_eq!(
            result.unwrap_err(),
            AltsumError::GcdStepLimit {
                a: 0,
                b: 2,
                limit: 50
            }
        );
    }

    #[test]
    fn test_run_gcd_limit_not_hit() {
        let config = DriverConfig {
            prompts: false,
            gcd_limit: Some(10),
            ..DriverConfig::default()
        };
        let (result, out) = run_str("6 9", &config);
        assert!(out.ends_with("gcd (n, m) = 3\n"));
        assert_eq!(result.unwrap().gcd_steps, 2);
    }

    #[test]
    fn test_run_invalid_input_prints_only_prompts() {
        let (result, out) = run_str("x\n", &DriverConfig::default());
        assert_eq!(out, "n = ");
        assert!(matches!(result, Err(AltsumError::InvalidInput { .. })));
    }

    #[test]
    fn test_evaluate_matches_run() {
        let bounds = Bounds { n: -5, m: 20 };
        let err = evaluate(bounds, Some(1_000)).unwrap_err();
        // -5 and 20 never meet by subtraction.
        assert!(matches!(err, AltsumError::GcdStepLimit { .. }));

        let bounds = Bounds { n: 12, m: 30 };
        let evaluated = evaluate(bounds, None).unwrap();
        let (ran, _) = run_str("12 30", &DriverConfig::default());
        assert_eq!(evaluated, ran.unwrap());
    }
}

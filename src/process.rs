//! Scalar reductions behind `/api/process`
//!
//! Integer inputs keep integer sums; any float (or an i64 overflow) widens the
//! sum to f64. `min`/`max` echo the original numbers.

use crate::ProcessError;
use serde::Serialize;
use serde_json::{Number, Value};
use std::time::{SystemTime, UNIX_EPOCH};

/// Result of reducing a list of numbers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub sum: Number,
    pub avg: Number,
    pub min: Option<Number>,
    pub max: Option<Number>,
    pub processed_at: f64,
}

/// Running sum that stays integral as long as it can
#[derive(Debug, Clone, Copy)]
enum Total {
    Int(i64),
    Float(f64),
}

impl Total {
    fn add(self, n: &Number) -> Self {
        match (self, n.as_i64()) {
            (Total::Int(acc), Some(i)) => match acc.checked_add(i) {
                Some(sum) => Total::Int(sum),
                None => Total::Float(acc as f64 + i as f64),
            },
            (total, _) => Total::Float(total.as_f64() + as_f64(n)),
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Total::Int(i) => i as f64,
            Total::Float(f) => f,
        }
    }

    fn into_number(self) -> Number {
        match self {
            Total::Int(i) => Number::from(i),
            Total::Float(f) => float_number(f),
        }
    }
}

fn as_f64(n: &Number) -> f64 {
    n.as_f64().unwrap_or(f64::NAN)
}

/// JSON has no NaN or infinities; those collapse to 0
fn float_number(f: f64) -> Number {
    Number::from_f64(f).unwrap_or_else(|| Number::from(0))
}

/// Reduce the `values` field of a request body
pub fn summarize(values: &Value) -> Result<Summary, ProcessError> {
    let items = values.as_array().ok_or(ProcessError::NotAnArray)?;
    let numbers = items
        .iter()
        .enumerate()
        .map(|(i, v)| match v {
            Value::Number(n) => Ok(n),
            _ => Err(ProcessError::NonNumeric(i)),
        })
        .collect::<Result<Vec<&Number>, _>>()?;

    Ok(reduce(&numbers, now_secs()))
}

fn reduce(numbers: &[&Number], processed_at: f64) -> Summary {
    let total = numbers.iter().fold(Total::Int(0), |acc, n| acc.add(n));

    let avg = if numbers.is_empty() {
        Number::from(0)
    } else {
        float_number(total.as_f64() / numbers.len() as f64)
    };

    // first occurrence wins on ties
    let mut min: Option<&Number> = None;
    let mut max: Option<&Number> = None;
    for &n in numbers {
        if min.is_none_or(|m| as_f64(n) < as_f64(m)) {
            min = Some(n);
        }
        if max.is_none_or(|m| as_f64(n) > as_f64(m)) {
            max = Some(n);
        }
    }

    Summary {
        sum: total.into_number(),
        avg,
        min: min.cloned(),
        max: max.cloned(),
        processed_at,
    }
}

/// Current wall-clock time as fractional Unix seconds
fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

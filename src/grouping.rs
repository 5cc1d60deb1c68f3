//! Grouping functions and their registry
//!
//! Grouping functions are pure key functions: each maps a single coordinate
//! value (plus optional static arguments) to a [`GroupKey`]. The registry is
//! a closed table populated once at startup; unknown names fail with a typed
//! configuration error and are never resolved through dynamic evaluation.

use crate::errors::{GridAggError, Result};
use crate::field::CoordValue;
use chrono::{Datelike, NaiveDateTime};
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// The value produced by a grouping function for one coordinate value.
///
/// Keys are hashable and totally ordered; `YearMonth` orders
/// chronologically. Within one group index all keys come from the same
/// grouping function and therefore share a variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupKey {
    Int(i64),
    YearMonth { year: i32, month: u32 },
    Label(String),
}

impl GroupKey {
    /// Numeric encoding used as the output coordinate value, where one
    /// exists. `YearMonth` encodes as `year * 100 + month` (e.g. 200002 for
    /// February 2000); label keys have no numeric form.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            GroupKey::Int(v) => Some(*v as f64),
            GroupKey::YearMonth { year, month } => {
                Some((*year as i64 * 100 + *month as i64) as f64)
            }
            GroupKey::Label(_) => None,
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Int(v) => write!(f, "{}", v),
            GroupKey::YearMonth { year, month } => write!(f, "{:04}-{:02}", year, month),
            GroupKey::Label(s) => write!(f, "{}", s),
        }
    }
}

type GroupingImpl = fn(CoordValue, &[String]) -> Result<GroupKey>;

/// A named, pure key function in the grouping registry.
pub struct GroupingFn {
    pub name: &'static str,
    /// Expected coordinate value type, static arguments and produced key.
    pub summary: &'static str,
    /// Whether group keys have a natural (chronological/numeric) order.
    /// When false, output groups keep first-occurrence order.
    pub sorted: bool,
    func: GroupingImpl,
}

impl GroupingFn {
    /// Compute the group key for one coordinate value.
    pub fn key(&self, value: CoordValue, args: &[String]) -> Result<GroupKey> {
        (self.func)(value, args)
    }
}

static GROUPING_REGISTRY: OnceLock<HashMap<&'static str, GroupingFn>> = OnceLock::new();

/// The closed table of grouping functions.
pub fn registry() -> &'static HashMap<&'static str, GroupingFn> {
    GROUPING_REGISTRY.get_or_init(|| {
        let entries = [
            GroupingFn {
                name: "year",
                summary: "time value -> calendar year; no arguments; integer key",
                sorted: true,
                func: group_year,
            },
            GroupingFn {
                name: "month",
                summary: "time value -> calendar month 1-12 across years; no arguments; integer key",
                sorted: true,
                func: group_month,
            },
            GroupingFn {
                name: "yearmonth",
                summary: "time value -> (year, month) pair; no arguments; chronological key",
                sorted: true,
                func: group_yearmonth,
            },
            GroupingFn {
                name: "season",
                summary: "time value -> DJF/MAM/JJA/SON; no arguments; label key",
                sorted: false,
                func: group_season,
            },
            GroupingFn {
                name: "dayofyear",
                summary: "time value -> ordinal day 1-366 across years; no arguments; integer key",
                sorted: true,
                func: group_dayofyear,
            },
            GroupingFn {
                name: "bin",
                summary: "numeric value -> bin index; arguments: width [, origin=0]; integer key",
                sorted: true,
                func: group_bin,
            },
        ];
        entries.into_iter().map(|g| (g.name, g)).collect()
    })
}

/// Resolve a grouping function name against the registry.
pub fn resolve(name: &str) -> Result<&'static GroupingFn> {
    registry()
        .get(name)
        .ok_or_else(|| GridAggError::UnknownFunction {
            registry: "grouping",
            name: name.to_string(),
        })
}

fn expect_time(value: CoordValue, function: &'static str) -> Result<NaiveDateTime> {
    match value {
        CoordValue::Time(t) => Ok(t),
        CoordValue::Number(n) => Err(GridAggError::Evaluation {
            function: function.to_string(),
            detail: format!("expected a time coordinate value, got {}", n),
        }),
    }
}

fn expect_number(value: CoordValue, function: &'static str) -> Result<f64> {
    match value {
        CoordValue::Number(n) => Ok(n),
        CoordValue::Time(t) => Err(GridAggError::Evaluation {
            function: function.to_string(),
            detail: format!("expected a numeric coordinate value, got {}", t),
        }),
    }
}

fn group_year(value: CoordValue, _args: &[String]) -> Result<GroupKey> {
    let t = expect_time(value, "year")?;
    Ok(GroupKey::Int(t.year() as i64))
}

fn group_month(value: CoordValue, _args: &[String]) -> Result<GroupKey> {
    let t = expect_time(value, "month")?;
    Ok(GroupKey::Int(t.month() as i64))
}

fn group_yearmonth(value: CoordValue, _args: &[String]) -> Result<GroupKey> {
    let t = expect_time(value, "yearmonth")?;
    Ok(GroupKey::YearMonth {
        year: t.year(),
        month: t.month(),
    })
}

fn group_season(value: CoordValue, _args: &[String]) -> Result<GroupKey> {
    let t = expect_time(value, "season")?;
    let label = match t.month() {
        12 | 1 | 2 => "DJF",
        3..=5 => "MAM",
        6..=8 => "JJA",
        _ => "SON",
    };
    Ok(GroupKey::Label(label.to_string()))
}

fn group_dayofyear(value: CoordValue, _args: &[String]) -> Result<GroupKey> {
    let t = expect_time(value, "dayofyear")?;
    Ok(GroupKey::Int(t.ordinal() as i64))
}

fn group_bin(value: CoordValue, args: &[String]) -> Result<GroupKey> {
    let v = expect_number(value, "bin")?;
    let width: f64 = args
        .first()
        .ok_or_else(|| GridAggError::Evaluation {
            function: "bin".to_string(),
            detail: "missing required width argument".to_string(),
        })?
        .parse()
        .map_err(|_| GridAggError::Evaluation {
            function: "bin".to_string(),
            detail: format!("width argument '{}' is not a number", args[0]),
        })?;
    if !width.is_finite() || width <= 0.0 {
        return Err(GridAggError::Evaluation {
            function: "bin".to_string(),
            detail: format!("width must be a positive number, got {}", width),
        });
    }
    let origin: f64 = match args.get(1) {
        Some(arg) => arg.parse().map_err(|_| GridAggError::Evaluation {
            function: "bin".to_string(),
            detail: format!("origin argument '{}' is not a number", arg),
        })?,
        None => 0.0,
    };
    Ok(GroupKey::Int(((v - origin) / width).floor() as i64))
}

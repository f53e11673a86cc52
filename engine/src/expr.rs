//! Dice expressions: `[+-] (NdM | int) ([+-] ...)*`, `""`/`"0"`, and the `-1/2` marker.
//!
//! `-1/2` is not a fraction. It evaluates to `-0.5` and damage resolution reads that
//! exact total as "halve the running subtotal".

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Dice, EngineError};

pub const HALVE_MARKER: &str = "-1/2";
pub const HALVE_TOTAL: f64 = -0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiceTerm {
    Dice { count: u32, sides: u32, negative: bool },
    Flat(i32),
}

impl DiceTerm {
    fn is_negative(&self) -> bool {
        match *self {
            DiceTerm::Dice { negative, .. } => negative,
            DiceTerm::Flat(n) => n < 0,
        }
    }

    fn magnitude(&self) -> String {
        match *self {
            DiceTerm::Dice { count, sides, .. } => format!("{}d{}", count, sides),
            DiceTerm::Flat(n) => n.abs().to_string(),
        }
    }

    fn roll(&self, dice: &mut Dice) -> i32 {
        match *self {
            DiceTerm::Dice { count, sides, negative } => {
                let sum: i32 = (0..count).map(|_| dice.roll_die(sides)).sum();
                if negative { -sum } else { sum }
            }
            DiceTerm::Flat(n) => n,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DiceExpr {
    Terms(Vec<DiceTerm>),
    Halve,
}

/// Evaluated expression: numeric total plus the canonical formula that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollResult {
    pub total: f64,
    pub formula: String,
}

impl RollResult {
    pub fn zero() -> Self {
        Self { total: 0.0, formula: "0".to_string() }
    }

    pub fn is_halve(&self) -> bool {
        self.total == HALVE_TOTAL
    }
}

impl Default for DiceExpr {
    fn default() -> Self {
        DiceExpr::Terms(Vec::new())
    }
}

impl DiceExpr {
    pub fn zero() -> Self {
        Self::default()
    }

    /// `count`d`sides`, negative when `count < 0`.
    pub fn dice(count: i32, sides: u32) -> Self {
        DiceExpr::Terms(vec![DiceTerm::Dice {
            count: count.unsigned_abs(),
            sides,
            negative: count < 0,
        }])
    }

    pub fn flat(n: i32) -> Self {
        if n == 0 {
            return Self::zero();
        }
        DiceExpr::Terms(vec![DiceTerm::Flat(n)])
    }

    pub fn parse(src: &str) -> Result<Self, EngineError> {
        let s = src.trim();
        if s.is_empty() || s == "0" {
            return Ok(Self::zero());
        }
        if s == HALVE_MARKER {
            return Ok(DiceExpr::Halve);
        }

        let invalid = |reason: &str| EngineError::InvalidExpression {
            expr: src.to_string(),
            reason: reason.to_string(),
        };

        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        let mut terms = Vec::new();
        let mut rest = compact.as_str();
        let mut first = true;
        while !rest.is_empty() {
            let negative = match rest.as_bytes()[0] {
                b'-' => {
                    rest = &rest[1..];
                    true
                }
                b'+' => {
                    rest = &rest[1..];
                    false
                }
                _ if first => false,
                _ => return Err(invalid("expected '+' or '-' between terms")),
            };
            first = false;
            let end = rest.find(['+', '-']).unwrap_or(rest.len());
            let body = &rest[..end];
            rest = &rest[end..];
            if body.is_empty() {
                return Err(invalid("empty term"));
            }
            terms.push(parse_term(body, negative).map_err(|r| invalid(&r))?);
        }
        Ok(DiceExpr::Terms(terms))
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, DiceExpr::Terms(t) if t.is_empty())
    }

    /// True when the rendered expression starts with `-`.
    pub fn leads_negative(&self) -> bool {
        match self {
            DiceExpr::Halve => true,
            DiceExpr::Terms(t) => t.first().is_some_and(DiceTerm::is_negative),
        }
    }

    pub fn roll(&self, dice: &mut Dice) -> RollResult {
        match self {
            DiceExpr::Halve => RollResult { total: HALVE_TOTAL, formula: HALVE_MARKER.to_string() },
            DiceExpr::Terms(terms) => {
                let total: i32 = terms.iter().map(|t| t.roll(dice)).sum();
                RollResult { total: total as f64, formula: self.to_string() }
            }
        }
    }
}

fn parse_term(body: &str, negative: bool) -> Result<DiceTerm, String> {
    let lower = body.to_ascii_lowercase();
    if let Some((count, sides)) = lower.split_once('d') {
        let count: u32 = if count.is_empty() {
            1
        } else {
            count.parse().map_err(|_| format!("bad dice count '{}'", count))?
        };
        let sides: u32 = sides.parse().map_err(|_| format!("bad die size '{}'", sides))?;
        if sides == 0 {
            return Err("die size must be at least 1".to_string());
        }
        Ok(DiceTerm::Dice { count, sides, negative })
    } else {
        let n: i32 = lower.parse().map_err(|_| format!("bad number '{}'", body))?;
        Ok(DiceTerm::Flat(if negative { -n } else { n }))
    }
}

/// Parse and roll in one step.
pub fn roll_expr(dice: &mut Dice, expr: &str) -> Result<RollResult, EngineError> {
    Ok(DiceExpr::parse(expr)?.roll(dice))
}

impl fmt::Display for DiceExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiceExpr::Halve => f.write_str(HALVE_MARKER),
            DiceExpr::Terms(terms) if terms.is_empty() => f.write_str("0"),
            DiceExpr::Terms(terms) => {
                for (i, term) in terms.iter().enumerate() {
                    let sign = term.is_negative();
                    match (i, sign) {
                        (0, true) => write!(f, "-{}", term.magnitude())?,
                        (0, false) => write!(f, "{}", term.magnitude())?,
                        (_, true) => write!(f, " - {}", term.magnitude())?,
                        (_, false) => write!(f, " + {}", term.magnitude())?,
                    }
                }
                Ok(())
            }
        }
    }
}

impl FromStr for DiceExpr {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiceExpr::parse(s)
    }
}

impl TryFrom<String> for DiceExpr {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        DiceExpr::parse(&value)
    }
}

impl From<DiceExpr> for String {
    fn from(value: DiceExpr) -> Self {
        value.to_string()
    }
}

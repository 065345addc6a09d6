//! calc, convert, fibonacci
//!
//! `calc` accepts numbers, parentheses and the operators below, loosest
//! binding first:
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('+' | '-') unary | power
//! power   := primary (('^' | '**') unary)?
//! primary := number | '(' expr ')'
//! ```
//!
//! Exponentiation is right-associative and binds tighter than unary minus,
//! so `-2^2` is `-4` and `2^-1` is `0.5`.

use thiserror::Error;

use crate::context::Invocation;
use crate::error::CommandError;
use crate::output::CommandOutput;
use crate::reply::Embed;
use crate::table::{Category, CommandSpec, CommandTable, HandlerResult};

const CALC_CHARS: &str = "0123456789+-*/().^ ";

/// Why an expression could not be evaluated
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalcError {
    #[error("unexpected character at offset {0}")]
    UnexpectedToken(usize),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("invalid number at offset {0}")]
    InvalidNumber(usize),
    #[error("division by zero")]
    DivisionByZero,
    #[error("result is not a finite number")]
    NotFinite,
}

/// Evaluate an arithmetic expression over `+ - * / ^ ( )`
pub fn evaluate(expression: &str) -> Result<f64, CalcError> {
    let mut parser = Parser {
        src: expression.as_bytes(),
        pos: 0,
    };
    let value = parser.expr()?;
    if parser.peek().is_some() {
        return Err(CalcError::UnexpectedToken(parser.pos));
    }
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CalcError::NotFinite)
    }
}

struct Parser<'a> {
    src: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn peek(&mut self) -> Option<u8> {
        while self.src.get(self.pos).is_some_and(|c| c.is_ascii_whitespace()) {
            self.pos += 1;
        }
        self.src.get(self.pos).copied()
    }

    fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_power(&mut self) -> bool {
        match self.peek() {
            Some(b'^') => {
                self.pos += 1;
                true
            }
            Some(b'*') if self.src.get(self.pos + 1) == Some(&b'*') => {
                self.pos += 2;
                true
            }
            _ => false,
        }
    }

    fn expr(&mut self) -> Result<f64, CalcError> {
        let mut value = self.term()?;
        loop {
            if self.eat(b'+') {
                value += self.term()?;
            } else if self.eat(b'-') {
                value -= self.term()?;
            } else {
                return Ok(value);
            }
        }
    }

    fn term(&mut self) -> Result<f64, CalcError> {
        let mut value = self.unary()?;
        loop {
            if self.eat(b'*') {
                value *= self.unary()?;
            } else if self.eat(b'/') {
                let divisor = self.unary()?;
                if divisor == 0.0 {
                    return Err(CalcError::DivisionByZero);
                }
                value /= divisor;
            } else {
                return Ok(value);
            }
        }
    }

    fn unary(&mut self) -> Result<f64, CalcError> {
        if self.eat(b'-') {
            Ok(-self.unary()?)
        } else if self.eat(b'+') {
            self.unary()
        } else {
            self.power()
        }
    }

    fn power(&mut self) -> Result<f64, CalcError> {
        let base = self.primary()?;
        if self.eat_power() {
            let exponent = self.unary()?;
            Ok(base.powf(exponent))
        } else {
            Ok(base)
        }
    }

    fn primary(&mut self) -> Result<f64, CalcError> {
        match self.peek() {
            None => Err(CalcError::UnexpectedEnd),
            Some(b'(') => {
                self.pos += 1;
                let value = self.expr()?;
                if self.eat(b')') {
                    Ok(value)
                } else if self.peek().is_none() {
                    Err(CalcError::UnexpectedEnd)
                } else {
                    Err(CalcError::UnexpectedToken(self.pos))
                }
            }
            Some(c) if c.is_ascii_digit() || c == b'.' => self.number(),
            Some(_) => Err(CalcError::UnexpectedToken(self.pos)),
        }
    }

    fn number(&mut self) -> Result<f64, CalcError> {
        let start = self.pos;
        while self
            .src
            .get(self.pos)
            .is_some_and(|c| c.is_ascii_digit() || *c == b'.')
        {
            self.pos += 1;
        }
        std::str::from_utf8(&self.src[start..self.pos])
            .ok()
            .and_then(|text| text.parse().ok())
            .ok_or(CalcError::InvalidNumber(start))
    }
}

/// Integers print without a fractional part
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

pub(crate) fn register(table: &mut CommandTable) -> Result<(), CommandError> {
    table.register(
        CommandSpec::new("calc", "<expression>", "Calculate math expressions", Category::Math),
        calc,
    )?;
    table.register(
        CommandSpec::new("convert", "<value> <from> <to>", "Unit conversion", Category::Math),
        convert,
    )?;
    table.register(
        CommandSpec::new("fibonacci", "<n>", "Fibonacci sequence", Category::Math),
        fibonacci,
    )
}

fn calc(inv: &Invocation) -> HandlerResult {
    let expression = inv.args.text().ok_or_else(|| {
        CommandError::usage(format!(
            "Usage: `{p}calc <expression>`\nExample: `{p}calc 2 + 2 * 3`",
            p = inv.prefix
        ))
    })?;
    if !expression.chars().all(|c| CALC_CHARS.contains(c)) {
        return Err(CommandError::invalid("Invalid characters in expression!"));
    }
    let result = evaluate(expression).map_err(|_| CommandError::invalid("Invalid math expression!"))?;

    Ok(CommandOutput::reply(
        Embed::new("🧮 Calculator")
            .description(format!(
                "**Expression:** {}\n**Result:** {}",
                expression,
                format_number(result)
            ))
            .color(0x32cd32),
    ))
}

fn conversion(from: &str, to: &str, value: f64) -> Option<f64> {
    let result = match (from, to) {
        ("cm", "m") => value * 0.01,
        ("m", "cm") => value * 100.0,
        ("kg", "lb") => value * 2.20462,
        ("lb", "kg") => value * 0.453592,
        ("c", "f") => value * 9.0 / 5.0 + 32.0,
        ("f", "c") => (value - 32.0) * 5.0 / 9.0,
        _ => return None,
    };
    Some(result)
}

fn convert(inv: &Invocation) -> HandlerResult {
    let (Some(raw), Some(from), Some(to)) = (inv.args.get(0), inv.args.get(1), inv.args.get(2))
    else {
        return Err(CommandError::usage(format!(
            "Usage: `{p}convert <value> <from_unit> <to_unit>`\nExample: `{p}convert 100 cm m`",
            p = inv.prefix
        )));
    };
    let value: f64 = raw
        .parse()
        .map_err(|_| CommandError::invalid("Invalid number!"))?;
    let result = conversion(&from.to_lowercase(), &to.to_lowercase(), value).ok_or_else(|| {
        CommandError::invalid("Conversion not supported! Try: cm↔m, kg↔lb, c↔f")
    })?;

    Ok(CommandOutput::reply(
        Embed::new("🔄 Unit Converter")
            .description(format!("**{} {}** = **{:.2} {}**", value, from, result, to))
            .color(0x32cd32),
    ))
}

fn fibonacci_sequence(n: usize) -> Vec<u64> {
    let mut seq = Vec::with_capacity(n);
    let (mut a, mut b) = (0u64, 1u64);
    for _ in 0..n {
        seq.push(a);
        (a, b) = (b, a + b);
    }
    seq
}

fn fibonacci(inv: &Invocation) -> HandlerResult {
    let n = inv
        .args
        .parse::<i64>(0)
        .ok()
        .flatten()
        .filter(|n| (1..=20).contains(n))
        .ok_or_else(|| CommandError::invalid("Please provide a number between 1 and 20!"))?;
    let sequence = fibonacci_sequence(n as usize)
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    Ok(CommandOutput::reply(
        Embed::new("🔢 Fibonacci Sequence")
            .description(format!("First {} numbers: {}", n, sequence))
            .color(0xffd700),
    ))
}

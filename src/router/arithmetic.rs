//! Arithmetic evaluator — tokenizer plus recursive-descent parser.
//!
//! Only numeric literals, `+ - * / // % **` and parentheses are recognised.
//! There are no identifiers, so nothing in the input can reach names,
//! builtins, or the host environment.
//!
//! Grammar (Python precedence):
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := unary (('*' | '/' | '//' | '%') unary)*
//! unary  := ('+' | '-') unary | power
//! power  := atom ('**' unary)?
//! atom   := NUMBER | '(' expr ')'
//! ```
//!
//! `**` is right-associative and binds tighter than a unary minus on its
//! left, so `-2**2 == -4` and `2**-1 == 0.5`.

use std::fmt;

use thiserror::Error;

/// Parser recursion bound; deeper input is rejected instead of risking the stack.
const MAX_DEPTH: usize = 200;

// ── Values ────────────────────────────────────────────────────────────────────

/// Result of an evaluation. Integer arithmetic stays integral until a `/`
/// or a float operand forces a float.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Number::Int(i) => i == 0,
            Number::Float(f) => f == 0.0,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Number::Int(i) => write!(f, "{i}"),
            Number::Float(x) => f.write_str(&format_float(x)),
        }
    }
}

/// Shortest round-trip float text, always with a fractional part or an
/// exponent: `2.0`, `0.30000000000000004`, `1e+16`, `1e-05`.
fn format_float(x: f64) -> String {
    if x.is_nan() {
        return "nan".into();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf".into() } else { "-inf".into() };
    }
    let abs = x.abs();
    if abs >= 1e16 || (abs != 0.0 && abs < 1e-4) {
        let sci = format!("{x:e}");
        return match sci.split_once('e') {
            Some((mantissa, exp)) => {
                let (sign, digits) = match exp.strip_prefix('-') {
                    Some(d) => ('-', d),
                    None => ('+', exp),
                };
                format!("{mantissa}e{sign}{digits:0>2}")
            }
            None => sci,
        };
    }
    let mut s = format!("{x}");
    if !s.contains('.') {
        s.push_str(".0");
    }
    s
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("empty expression")]
    Empty,
    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },
    #[error("unexpected '{token}' at position {pos}")]
    UnexpectedToken { token: String, pos: usize },
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unbalanced parentheses")]
    UnbalancedParens,
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("numeric overflow")]
    Overflow,
    #[error("result is not a real number")]
    Domain,
    #[error("expression nested too deeply")]
    TooDeep,
}

// ── Tokens ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
enum Tok {
    Num(Number),
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    SlashSlash,
    Percent,
    LParen,
    RParen,
}

impl fmt::Display for Tok {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tok::Num(n) => write!(f, "{n}"),
            Tok::Plus => f.write_str("+"),
            Tok::Minus => f.write_str("-"),
            Tok::Star => f.write_str("*"),
            Tok::StarStar => f.write_str("**"),
            Tok::Slash => f.write_str("/"),
            Tok::SlashSlash => f.write_str("//"),
            Tok::Percent => f.write_str("%"),
            Tok::LParen => f.write_str("("),
            Tok::RParen => f.write_str(")"),
        }
    }
}

/// `(token, char position)` pairs.
fn tokenize(input: &str) -> Result<Vec<(Tok, usize)>, EvalError> {
    let chars: Vec<char> = input.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let start = i;
        let tok = match c {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '+' => Tok::Plus,
            '-' => Tok::Minus,
            '%' => Tok::Percent,
            '(' => Tok::LParen,
            ')' => Tok::RParen,
            '*' if chars.get(i + 1) == Some(&'*') => {
                i += 1;
                Tok::StarStar
            }
            '*' => Tok::Star,
            '/' if chars.get(i + 1) == Some(&'/') => {
                i += 1;
                Tok::SlashSlash
            }
            '/' => Tok::Slash,
            c if c.is_ascii_digit() || c == '.' => {
                let (num, end) = lex_number(&chars, i)?;
                i = end;
                out.push((Tok::Num(num), start));
                continue;
            }
            other => return Err(EvalError::UnexpectedChar { ch: other, pos: i }),
        };
        out.push((tok, start));
        i += 1;
    }
    Ok(out)
}

/// Lex a numeric literal starting at `start`; returns the value and the
/// index one past its end.
fn lex_number(chars: &[char], start: usize) -> Result<(Number, usize), EvalError> {
    let mut i = start;
    let mut int_digits = 0;
    let mut frac_digits = 0;
    let mut is_float = false;

    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
        int_digits += 1;
    }
    if i < chars.len() && chars[i] == '.' {
        is_float = true;
        i += 1;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
            frac_digits += 1;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return Err(EvalError::UnexpectedChar { ch: chars[start], pos: start });
    }
    if i < chars.len() && matches!(chars[i], 'e' | 'E') {
        is_float = true;
        i += 1;
        if i < chars.len() && matches!(chars[i], '+' | '-') {
            i += 1;
        }
        let exp_start = i;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            let text: String = chars[start..i].iter().collect();
            return Err(EvalError::InvalidNumber(text));
        }
    }

    let text: String = chars[start..i].iter().collect();
    let num = if is_float {
        text.parse::<f64>()
            .map(Number::Float)
            .map_err(|_| EvalError::InvalidNumber(text.clone()))?
    } else {
        text.parse::<i64>().map(Number::Int).map_err(|_| EvalError::Overflow)?
    };
    Ok((num, i))
}

// ── Parser ────────────────────────────────────────────────────────────────────

struct Parser {
    tokens: Vec<(Tok, usize)>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<Tok> {
        self.tokens.get(self.pos).map(|(t, _)| *t)
    }

    fn bump(&mut self) -> Option<(Tok, usize)> {
        let t = self.tokens.get(self.pos).copied();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn descend(&mut self) -> Result<(), EvalError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(EvalError::TooDeep);
        }
        Ok(())
    }

    fn expr(&mut self) -> Result<Number, EvalError> {
        let mut lhs = self.term()?;
        while let Some(op @ (Tok::Plus | Tok::Minus)) = self.peek() {
            self.bump();
            let rhs = self.term()?;
            lhs = binary(op, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Number, EvalError> {
        let mut lhs = self.unary()?;
        while let Some(op @ (Tok::Star | Tok::Slash | Tok::SlashSlash | Tok::Percent)) = self.peek() {
            self.bump();
            let rhs = self.unary()?;
            lhs = binary(op, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Number, EvalError> {
        match self.peek() {
            Some(Tok::Plus) => {
                self.bump();
                self.descend()?;
                let v = self.unary();
                self.depth -= 1;
                v
            }
            Some(Tok::Minus) => {
                self.bump();
                self.descend()?;
                let v = self.unary().and_then(negate);
                self.depth -= 1;
                v
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<Number, EvalError> {
        let base = self.atom()?;
        if self.peek() == Some(Tok::StarStar) {
            self.bump();
            self.descend()?;
            let exp = self.unary();
            self.depth -= 1;
            return pow(base, exp?);
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Number, EvalError> {
        match self.bump() {
            Some((Tok::Num(n), _)) => Ok(n),
            Some((Tok::LParen, _)) => {
                self.descend()?;
                let v = self.expr()?;
                self.depth -= 1;
                match self.bump() {
                    Some((Tok::RParen, _)) => Ok(v),
                    None => Err(EvalError::UnbalancedParens),
                    Some((tok, pos)) => Err(EvalError::UnexpectedToken { token: tok.to_string(), pos }),
                }
            }
            Some((tok, pos)) => Err(EvalError::UnexpectedToken { token: tok.to_string(), pos }),
            None => Err(EvalError::UnexpectedEnd),
        }
    }
}

// ── Semantics ─────────────────────────────────────────────────────────────────

fn negate(v: Number) -> Result<Number, EvalError> {
    match v {
        Number::Int(i) => i.checked_neg().map(Number::Int).ok_or(EvalError::Overflow),
        Number::Float(f) => Ok(Number::Float(-f)),
    }
}

fn binary(op: Tok, a: Number, b: Number) -> Result<Number, EvalError> {
    use Number::{Float, Int};

    match (op, a, b) {
        (Tok::Plus, Int(x), Int(y)) => x.checked_add(y).map(Int).ok_or(EvalError::Overflow),
        (Tok::Minus, Int(x), Int(y)) => x.checked_sub(y).map(Int).ok_or(EvalError::Overflow),
        (Tok::Star, Int(x), Int(y)) => x.checked_mul(y).map(Int).ok_or(EvalError::Overflow),
        (Tok::Plus, _, _) => Ok(Float(a.as_f64() + b.as_f64())),
        (Tok::Minus, _, _) => Ok(Float(a.as_f64() - b.as_f64())),
        (Tok::Star, _, _) => Ok(Float(a.as_f64() * b.as_f64())),

        (Tok::Slash | Tok::SlashSlash | Tok::Percent, _, _) if b.is_zero() => {
            Err(EvalError::DivisionByZero)
        }
        (Tok::Slash, _, _) => Ok(Float(a.as_f64() / b.as_f64())),
        (Tok::SlashSlash, Int(x), Int(y)) => floor_div(x, y).map(Int),
        (Tok::SlashSlash, _, _) => Ok(Float((a.as_f64() / b.as_f64()).floor())),
        (Tok::Percent, Int(x), Int(y)) => floor_mod(x, y).map(Int),
        (Tok::Percent, _, _) => {
            let (x, y) = (a.as_f64(), b.as_f64());
            let r = x % y;
            Ok(Float(if r != 0.0 && (r < 0.0) != (y < 0.0) { r + y } else { r }))
        }

        (Tok::StarStar, _, _) => pow(a, b),
        _ => Err(EvalError::UnexpectedToken { token: op.to_string(), pos: 0 }),
    }
}

/// Integer division rounding toward negative infinity.
fn floor_div(x: i64, y: i64) -> Result<i64, EvalError> {
    let q = x.checked_div(y).ok_or(EvalError::Overflow)?;
    if x % y != 0 && ((x < 0) != (y < 0)) { Ok(q - 1) } else { Ok(q) }
}

/// Remainder with the sign of the divisor.
fn floor_mod(x: i64, y: i64) -> Result<i64, EvalError> {
    // `i64::MIN % -1` traps in `checked_rem`, but the remainder is always 0.
    if y == -1 {
        return Ok(0);
    }
    let r = x.checked_rem(y).ok_or(EvalError::Overflow)?;
    if r != 0 && ((r < 0) != (y < 0)) { Ok(r + y) } else { Ok(r) }
}

fn pow(base: Number, exp: Number) -> Result<Number, EvalError> {
    if let (Number::Int(b), Number::Int(e)) = (base, exp) {
        if e >= 0 {
            match b {
                0 => return Ok(Number::Int(i64::from(e == 0))),
                1 => return Ok(Number::Int(1)),
                -1 => return Ok(Number::Int(if e % 2 == 0 { 1 } else { -1 })),
                _ => {}
            }
            let e = u32::try_from(e).map_err(|_| EvalError::Overflow)?;
            return b.checked_pow(e).map(Number::Int).ok_or(EvalError::Overflow);
        }
    }

    let (b, e) = (base.as_f64(), exp.as_f64());
    if b == 0.0 && e < 0.0 {
        return Err(EvalError::DivisionByZero);
    }
    let r = b.powf(e);
    if r.is_nan() && !b.is_nan() && !e.is_nan() {
        return Err(EvalError::Domain);
    }
    if r.is_infinite() && b.is_finite() && e.is_finite() {
        return Err(EvalError::Overflow);
    }
    Ok(Number::Float(r))
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Evaluate an arithmetic expression. Whitespace anywhere is ignored.
pub fn evaluate(input: &str) -> Result<Number, EvalError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(EvalError::Empty);
    }
    let mut parser = Parser { tokens, pos: 0, depth: 0 };
    let value = parser.expr()?;
    match parser.bump() {
        None => Ok(value),
        Some((Tok::RParen, _)) => Err(EvalError::UnbalancedParens),
        Some((tok, pos)) => Err(EvalError::UnexpectedToken { token: tok.to_string(), pos }),
    }
}

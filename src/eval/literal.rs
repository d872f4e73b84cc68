//! Literal values and structural comparison
//!
//! Expected outputs are written by people and actual outputs come from
//! `repr()`, so the same value can be spelled several ways (`3` / `3.0`,
//! `'a'` / `"a"`, `(1, 2)` / `[1, 2]`, `None` / `null`). Both sides are parsed
//! into a [`Literal`] tree and compared with [`Literal::equivalent`].
//!
//! The grammar is the common subset of Python literals and JSON: `None`,
//! booleans, integers (decimal, hex, octal, binary, `_` separators), floats
//! (including `inf` and `nan`), strings and bytes with the usual prefixes and
//! escapes, lists, tuples, sets and dicts.
//!
//! Nesting is capped at [`MAX_DEPTH`]; deeper input is a parse error rather
//! than unbounded recursion.

use thiserror::Error;

/// Deepest container nesting accepted by [`Literal::parse`]
pub const MAX_DEPTH: usize = 256;

/// A parsed literal value
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    None,
    Bool(bool),
    Int(i128),
    /// Integer outside the `i128` range, as canonical signed decimal digits
    BigInt(String),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Literal>),
    Tuple(Vec<Literal>),
    Set(Vec<Literal>),
    Dict(Vec<(Literal, Literal)>),
}

/// Where and why parsing stopped
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid literal at offset {offset}: {message}")]
pub struct LiteralError {
    pub offset: usize,
    pub message: String,
}

/// Float comparison policy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    /// Allowed difference relative to the larger magnitude
    pub relative: f64,
    /// Allowed absolute difference
    pub absolute: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Tolerance {
            relative: 1e-9,
            absolute: 0.0,
        }
    }
}

impl Tolerance {
    /// Exact float equality (NaN still equals NaN)
    pub fn exact() -> Self {
        Tolerance {
            relative: 0.0,
            absolute: 0.0,
        }
    }

    fn floats_equal(&self, a: f64, b: f64) -> bool {
        if a.is_nan() || b.is_nan() {
            return a.is_nan() && b.is_nan();
        }
        if a == b {
            return true;
        }
        if a.is_infinite() || b.is_infinite() {
            return false;
        }
        let diff = (a - b).abs();
        diff <= (self.relative * a.abs().max(b.abs())).max(self.absolute)
    }
}

impl Literal {
    /// Parse one complete literal; trailing input is an error
    pub fn parse(source: &str) -> Result<Literal, LiteralError> {
        let mut parser = Parser::new(source);
        let value = parser.value()?;
        parser.skip_ws();
        if !parser.at_end() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(value)
    }

    /// Structural equality under `tolerance`
    ///
    /// - numbers compare by value across int and float; integers compare
    ///   exactly at any size
    /// - bool is never equal to a number
    /// - lists and tuples are interchangeable ordered sequences
    /// - sets and dicts ignore element order
    pub fn equivalent(&self, other: &Literal, tolerance: &Tolerance) -> bool {
        use Literal::*;

        match (self, other) {
            (None, None) => true,
            (Bool(a), Bool(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Int(a), Float(b)) | (Float(b), Int(a)) => tolerance.floats_equal(*a as f64, *b),
            (Float(a), Float(b)) => tolerance.floats_equal(*a, *b),
            (BigInt(a), BigInt(b)) => a == b,
            (BigInt(a), Float(b)) | (Float(b), BigInt(a)) => a
                .parse::<f64>()
                .is_ok_and(|a| tolerance.floats_equal(a, *b)),
            (Str(a), Str(b)) => a == b,
            (Bytes(a), Bytes(b)) => a == b,
            (List(a) | Tuple(a), List(b) | Tuple(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b).all(|(x, y)| x.equivalent(y, tolerance))
            }
            (Set(a), Set(b)) => unordered_match(a, b, |x, y| x.equivalent(y, tolerance)),
            (Dict(a), Dict(b)) => unordered_match(a, b, |(ka, va), (kb, vb)| {
                ka.equivalent(kb, tolerance) && va.equivalent(vb, tolerance)
            }),
            _ => false,
        }
    }
}

/// Every element of `a` pairs with a distinct element of `b`
fn unordered_match<T, F>(a: &[T], b: &[T], eq: F) -> bool
where
    F: Fn(&T, &T) -> bool,
{
    if a.len() != b.len() {
        return false;
    }
    let mut used = vec![false; b.len()];
    a.iter().all(|x| {
        match b
            .iter()
            .enumerate()
            .position(|(i, y)| !used[i] && eq(x, y))
        {
            Some(i) => {
                used[i] = true;
                true
            }
            None => false,
        }
    })
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Parser {
            src,
            pos: 0,
            depth: 0,
        }
    }

    fn error(&self, message: impl Into<String>) -> LiteralError {
        LiteralError {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), LiteralError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", expected)))
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn value(&mut self) -> Result<Literal, LiteralError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error(format!("nested deeper than {} levels", MAX_DEPTH)));
        }
        self.depth += 1;
        let value = self.nested_value();
        self.depth -= 1;
        value
    }

    fn nested_value(&mut self) -> Result<Literal, LiteralError> {
        self.skip_ws();
        match self.peek() {
            None => Err(self.error("unexpected end of input")),
            Some('[') => {
                self.bump();
                Ok(Literal::List(self.items(']')?))
            }
            Some('(') => self.paren(),
            Some('{') => self.brace(),
            Some('\'') | Some('"') => self.string(),
            Some(c) if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => self.number(),
            Some(c) if c.is_ascii_alphabetic() || c == '_' => self.word(),
            Some(c) => Err(self.error(format!("unexpected character {:?}", c))),
        }
    }

    /// Comma-separated values up to `close`, trailing comma allowed
    fn items(&mut self, close: char) -> Result<Vec<Literal>, LiteralError> {
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.eat(close) {
                return Ok(items);
            }
            items.push(self.value()?);
            self.skip_ws();
            if self.eat(close) {
                return Ok(items);
            }
            self.expect(',')?;
        }
    }

    fn paren(&mut self) -> Result<Literal, LiteralError> {
        self.expect('(')?;
        self.skip_ws();
        if self.eat(')') {
            return Ok(Literal::Tuple(Vec::new()));
        }
        let first = self.value()?;
        self.skip_ws();
        if self.eat(')') {
            // Plain grouping, not a tuple.
            return Ok(first);
        }
        self.expect(',')?;
        let mut items = vec![first];
        items.extend(self.items(')')?);
        Ok(Literal::Tuple(items))
    }

    fn brace(&mut self) -> Result<Literal, LiteralError> {
        self.expect('{')?;
        self.skip_ws();
        if self.eat('}') {
            return Ok(Literal::Dict(Vec::new()));
        }

        let first = self.value()?;
        self.skip_ws();
        if !self.eat(':') {
            let mut items = vec![first];
            if !self.eat('}') {
                self.expect(',')?;
                items.extend(self.items('}')?);
            }
            return Ok(Literal::Set(items));
        }

        let mut entries = vec![(first, self.value()?)];
        loop {
            self.skip_ws();
            if self.eat('}') {
                return Ok(Literal::Dict(entries));
            }
            self.expect(',')?;
            self.skip_ws();
            if self.eat('}') {
                return Ok(Literal::Dict(entries));
            }
            let key = self.value()?;
            self.skip_ws();
            self.expect(':')?;
            let value = self.value()?;
            entries.push((key, value));
        }
    }

    fn word(&mut self) -> Result<Literal, LiteralError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            self.bump();
        }
        let word = &self.src[start..self.pos];

        // String prefixes: r'', b'', rb'', u'' ...
        if matches!(self.peek(), Some('\'') | Some('"')) && word.len() <= 2 {
            let lower = word.to_ascii_lowercase();
            if matches!(lower.as_str(), "r" | "u" | "b" | "rb" | "br") {
                self.pos = start;
                return self.string();
            }
        }

        match word {
            "None" | "null" => Ok(Literal::None),
            "True" | "true" => Ok(Literal::Bool(true)),
            "False" | "false" => Ok(Literal::Bool(false)),
            "inf" | "Infinity" => Ok(Literal::Float(f64::INFINITY)),
            "nan" | "NaN" => Ok(Literal::Float(f64::NAN)),
            "set" | "frozenset" => {
                self.skip_ws();
                self.expect('(')?;
                self.skip_ws();
                if self.eat(')') {
                    return Ok(Literal::Set(Vec::new()));
                }
                let inner = self.value()?;
                self.skip_ws();
                self.expect(')')?;
                match inner {
                    Literal::Set(items) | Literal::List(items) | Literal::Tuple(items) => {
                        Ok(Literal::Set(items))
                    }
                    Literal::Dict(entries) if entries.is_empty() => Ok(Literal::Set(Vec::new())),
                    _ => Err(self.error("set() expects an iterable literal")),
                }
            }
            _ => {
                self.pos = start;
                Err(self.error(format!("unknown name '{}'", word)))
            }
        }
    }

    fn number(&mut self) -> Result<Literal, LiteralError> {
        let negative = if self.eat('-') {
            true
        } else {
            self.eat('+');
            false
        };
        self.skip_ws();

        if matches!(self.peek(), Some(c) if c.is_ascii_alphabetic()) {
            let start = self.pos;
            return match self.word()? {
                Literal::Float(f) if f.is_infinite() || f.is_nan() => {
                    Ok(Literal::Float(if negative { -f } else { f }))
                }
                _ => {
                    self.pos = start;
                    Err(self.error("expected a number"))
                }
            };
        }

        let start = self.pos;
        let radix = match self.rest().get(..2).map(|p| p.to_ascii_lowercase()) {
            Some(p) if p == "0x" => Some(16),
            Some(p) if p == "0o" => Some(8),
            Some(p) if p == "0b" => Some(2),
            _ => None,
        };

        if let Some(radix) = radix {
            self.pos += 2;
            let digits_start = self.pos;
            while matches!(self.peek(), Some(c) if c.is_digit(radix) || c == '_') {
                self.bump();
            }
            let digits: String = self.src[digits_start..self.pos]
                .chars()
                .filter(|c| *c != '_')
                .collect();
            if digits.is_empty() {
                return Err(self.error("expected digits"));
            }
            return Ok(match i128::from_str_radix(&digits, radix) {
                Ok(magnitude) => Literal::Int(if negative { -magnitude } else { magnitude }),
                Err(_) => big_int(negative, &to_decimal(&digits, radix)),
            });
        }

        let mut is_float = false;
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' | '_' => {}
                '.' => is_float = true,
                'e' | 'E' => {
                    is_float = true;
                    self.bump();
                    if matches!(self.peek(), Some('+') | Some('-')) {
                        self.bump();
                    }
                    continue;
                }
                _ => break,
            }
            self.bump();
        }

        if matches!(self.peek(), Some('j') | Some('J')) {
            return Err(self.error("complex numbers are not supported"));
        }

        let text: String = self.src[start..self.pos]
            .chars()
            .filter(|c| *c != '_')
            .collect();
        if text.is_empty() || text == "." {
            return Err(self.error("expected a number"));
        }

        if !is_float {
            return Ok(match text.parse::<i128>() {
                Ok(magnitude) => Literal::Int(if negative { -magnitude } else { magnitude }),
                Err(_) => big_int(negative, &text),
            });
        }

        let value: f64 = text
            .parse()
            .map_err(|_| self.error(format!("bad number '{}'", text)))?;
        Ok(Literal::Float(if negative { -value } else { value }))
    }

    fn string(&mut self) -> Result<Literal, LiteralError> {
        let mut raw = false;
        let mut bytes = false;
        while let Some(c) = self.peek() {
            match c.to_ascii_lowercase() {
                'r' => raw = true,
                'b' => bytes = true,
                'u' => {}
                _ => break,
            }
            self.bump();
        }

        let quote = match self.bump() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(self.error("expected a quote")),
        };
        let triple = self.rest().starts_with(&format!("{q}{q}", q = quote));
        if triple {
            self.pos += 2;
        }

        let mut out = String::new();
        loop {
            let c = self
                .bump()
                .ok_or_else(|| self.error("unterminated string"))?;

            if c == quote {
                if !triple {
                    break;
                }
                if self.rest().starts_with(&format!("{q}{q}", q = quote)) {
                    self.pos += 2;
                    break;
                }
                out.push(c);
                continue;
            }

            if c == '\n' && !triple {
                return Err(self.error("newline in single-quoted string"));
            }

            if c != '\\' {
                out.push(c);
                continue;
            }

            if raw {
                // Raw strings keep the backslash but it still protects a quote.
                out.push('\\');
                if let Some(next) = self.bump() {
                    out.push(next);
                }
                continue;
            }

            self.escape(&mut out, bytes)?;
        }

        if bytes {
            let mut buf = Vec::with_capacity(out.len());
            for ch in out.chars() {
                let code = ch as u32;
                if code > 0xff {
                    return Err(self.error("non-byte character in bytes literal"));
                }
                buf.push(code as u8);
            }
            Ok(Literal::Bytes(buf))
        } else {
            Ok(Literal::Str(out))
        }
    }

    fn escape(&mut self, out: &mut String, bytes: bool) -> Result<(), LiteralError> {
        let c = self
            .bump()
            .ok_or_else(|| self.error("unterminated escape"))?;
        match c {
            '\n' => {}
            '\\' | '\'' | '"' | '/' => out.push(c),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'v' => out.push('\x0b'),
            '0'..='7' => {
                let mut code = c.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match self.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            code = code * 8 + d;
                            self.bump();
                        }
                        None => break,
                    }
                }
                out.push(self.code_point(code)?);
            }
            'x' => {
                let code = self.hex_digits(2)?;
                out.push(self.code_point(code)?);
            }
            'u' if !bytes => {
                let code = self.hex_digits(4)?;
                // JSON spells astral characters as surrogate pairs.
                if (0xd800..0xdc00).contains(&code) && self.rest().starts_with("\\u") {
                    let save = self.pos;
                    self.pos += 2;
                    let low = self.hex_digits(4)?;
                    if (0xdc00..0xe000).contains(&low) {
                        let combined = 0x10000 + ((code - 0xd800) << 10) + (low - 0xdc00);
                        out.push(self.code_point(combined)?);
                        return Ok(());
                    }
                    self.pos = save;
                }
                out.push(self.code_point(code)?);
            }
            'U' if !bytes => {
                let code = self.hex_digits(8)?;
                out.push(self.code_point(code)?);
            }
            other => {
                // Unknown escapes are kept verbatim, as Python does.
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    fn hex_digits(&mut self, count: usize) -> Result<u32, LiteralError> {
        let digits = self
            .rest()
            .get(..count)
            .filter(|d| d.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or_else(|| self.error(format!("expected {} hex digits", count)))?;
        let code = u32::from_str_radix(digits, 16)
            .map_err(|e| self.error(format!("bad hex escape: {}", e)))?;
        self.pos += count;
        Ok(code)
    }

    fn code_point(&self, code: u32) -> Result<char, LiteralError> {
        char::from_u32(code).ok_or_else(|| self.error(format!("invalid code point {:#x}", code)))
    }
}

fn big_int(negative: bool, digits: &str) -> Literal {
    let digits = digits.trim_start_matches('0');
    if negative {
        Literal::BigInt(format!("-{}", digits))
    } else {
        Literal::BigInt(digits.to_string())
    }
}

/// Decimal spelling of `digits` in `radix`, for values too wide for i128
fn to_decimal(digits: &str, radix: u32) -> String {
    const LIMB: u64 = 1_000_000_000;
    // Little-endian base 10^9 limbs.
    let mut limbs: Vec<u64> = vec![0];
    for d in digits.chars().filter_map(|c| c.to_digit(radix)) {
        let mut carry = d as u64;
        for limb in limbs.iter_mut() {
            let v = *limb * radix as u64 + carry;
            *limb = v % LIMB;
            carry = v / LIMB;
        }
        while carry > 0 {
            limbs.push(carry % LIMB);
            carry /= LIMB;
        }
    }

    let mut out = String::new();
    for (i, limb) in limbs.iter().rev().enumerate() {
        if i == 0 {
            out.push_str(&limb.to_string());
        } else {
            out.push_str(&format!("{:09}", limb));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Literal {
        Literal::parse(s).unwrap_or_else(|e| panic!("{:?}: {}", s, e))
    }

    fn same(a: &str, b: &str) -> bool {
        parse(a).equivalent(&parse(b), &Tolerance::default())
    }

    #[test]
    fn test_scalars() {
        assert_eq!(parse("None"), Literal::None);
        assert_eq!(parse("null"), Literal::None);
        assert_eq!(parse("True"), Literal::Bool(true));
        assert_eq!(parse("false"), Literal::Bool(false));
        assert_eq!(parse("42"), Literal::Int(42));
        assert_eq!(parse("-7"), Literal::Int(-7));
        assert_eq!(parse("1_000"), Literal::Int(1000));
        assert_eq!(parse("0xff"), Literal::Int(255));
        assert_eq!(parse("-0b101"), Literal::Int(-5));
        assert_eq!(parse("0o17"), Literal::Int(15));
        assert_eq!(parse("2.5"), Literal::Float(2.5));
        assert_eq!(parse(".5"), Literal::Float(0.5));
        assert_eq!(parse("1e3"), Literal::Float(1000.0));
        assert_eq!(parse("1.5E-2"), Literal::Float(0.015));
        assert_eq!(parse("-inf"), Literal::Float(f64::NEG_INFINITY));
        assert!(matches!(parse("nan"), Literal::Float(f) if f.is_nan()));
    }

    #[test]
    fn test_strings() {
        assert_eq!(parse("'abc'"), Literal::Str("abc".into()));
        assert_eq!(parse("\"it's\""), Literal::Str("it's".into()));
        assert_eq!(parse(r"'a\nb\t\'c\''"), Literal::Str("a\nb\t'c'".into()));
        assert_eq!(parse(r"'\x41é\U0001F600'"), Literal::Str("Aé😀".into()));
        assert_eq!(parse(r#""😀""#), Literal::Str("😀".into()));
        assert_eq!(parse(r"r'\d+'"), Literal::Str(r"\d+".into()));
        assert_eq!(parse("'''multi\nline'''"), Literal::Str("multi\nline".into()));
        assert_eq!(parse(r"b'\x00\xffA'"), Literal::Bytes(vec![0, 255, b'A']));
    }

    #[test]
    fn test_containers() {
        assert_eq!(
            parse("[1, 'a', None]"),
            Literal::List(vec![Literal::Int(1), Literal::Str("a".into()), Literal::None])
        );
        assert_eq!(parse("()"), Literal::Tuple(vec![]));
        assert_eq!(parse("(1,)"), Literal::Tuple(vec![Literal::Int(1)]));
        assert_eq!(parse("(1)"), Literal::Int(1));
        assert_eq!(parse("{}"), Literal::Dict(vec![]));
        assert_eq!(parse("set()"), Literal::Set(vec![]));
        assert_eq!(parse("{1, 2,}"), Literal::Set(vec![Literal::Int(1), Literal::Int(2)]));
        assert_eq!(
            parse("{'a': [1, 2], 'b': {}}"),
            Literal::Dict(vec![
                (
                    Literal::Str("a".into()),
                    Literal::List(vec![Literal::Int(1), Literal::Int(2)])
                ),
                (Literal::Str("b".into()), Literal::Dict(vec![])),
            ])
        );
    }

    #[test]
    fn test_rejects_non_literals() {
        for bad in ["", "foo", "[1, 2", "1 2", "'open", "os.system('x')", "1j", "{1: }"] {
            assert!(Literal::parse(bad).is_err(), "{:?} should not parse", bad);
        }
    }

    #[test]
    fn test_numeric_equivalence() {
        assert!(same("3", "3.0"));
        assert!(same("0.1 ", "0.1"));
        assert!(same("0.30000000000000004", "0.3"));
        assert!(!same("0.31", "0.3"));
        assert!(same("nan", "NaN"));
        assert!(same("inf", "Infinity"));
        assert!(!same("inf", "-inf"));
        assert!(!same("1", "True"));
        assert!(!same("0", "False"));
    }

    #[test]
    fn test_big_integers_compare_exactly() {
        let big = format!("1{}", "0".repeat(50));
        let big_plus_one = format!("1{}1", "0".repeat(49));
        assert_eq!(parse(&big), Literal::BigInt(big.clone()));
        assert!(!same(&big, &big_plus_one));
        assert!(same(&big, &big.replace('1', "0001")));
        assert!(same(&format!("-{}", big), &format!("-{}", big)));
        assert!(!same(&big, &format!("-{}", big)));

        // Floats on the other side still get tolerance.
        assert!(same(&big, "1e50"));
        assert!(!same(&big, "1"));

        // Wide hex literals land on the same decimal spelling.
        assert_eq!(
            parse("0x100000000000000000000000000000000"),
            Literal::BigInt("340282366920938463463374607431768211456".into())
        );
        assert!(same(
            "0x100000000000000000000000000000000",
            "340_282_366_920_938_463_463_374_607_431_768_211_456"
        ));
    }

    #[test]
    fn test_nesting_is_bounded() {
        let err = Literal::parse(&"[".repeat(200_000)).unwrap_err();
        assert!(err.message.contains("nested"), "{}", err);
        assert!(Literal::parse(&"(".repeat(MAX_DEPTH + 1)).is_err());

        let deep = format!("{}{}", "[".repeat(100), "]".repeat(100));
        assert!(same(&deep, &deep));

        // Depth is restored between siblings.
        let wide = format!("[{}]", vec!["[[1]]"; 1000].join(", "));
        assert!(Literal::parse(&wide).is_ok());
    }

    #[test]
    fn test_absolute_tolerance() {
        let tolerance = Tolerance {
            relative: 0.0,
            absolute: 0.01,
        };
        assert!(parse("1.005").equivalent(&parse("1.0"), &tolerance));
        assert!(!parse("1.02").equivalent(&parse("1.0"), &tolerance));
        assert!(!parse("1.0000001").equivalent(&parse("1.0"), &Tolerance::exact()));
    }

    #[test]
    fn test_container_equivalence() {
        assert!(same("[1, 2]", "(1, 2)"));
        assert!(!same("[1, 2]", "[2, 1]"));
        assert!(same("{1, 2, 3}", "{3, 1, 2}"));
        assert!(same("{'a': 1, 'b': 2.0}", "{\"b\": 2, \"a\": 1}"));
        assert!(!same("{'a': 1}", "{'a': 1, 'b': 2}"));
        assert!(same("[[1, 2], {'k': None}]", "[(1, 2.0), {'k': null}]"));
        assert!(!same("'1'", "1"));
        assert!(!same("set()", "{}"));
    }
}

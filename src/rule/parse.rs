//! Text front end for rule expressions.
//!
//! ```text
//! union   := inter (':' inter)*
//! inter   := factor+
//! factor  := ('-' | '#') '(' union ')'     complement of the group
//!          | '(' union ')'
//!          | ['-' | '+'] digits ['M' | 'N']
//! ```
//!
//! Juxtaposition is intersection and binds tighter than `:`.

use crate::error::{Result, RuleError};

use super::expr::{BaseSel, RuleExpr};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number {
        negative: bool,
        magnitude: i32,
        base: BaseSel,
    },
    Open,
    Close,
    Colon,
    Complement,
}

fn parse_error(position: usize, message: impl Into<String>) -> RuleError {
    RuleError::Parse {
        position,
        message: message.into(),
    }
}

fn tokenize(text: &str, allow_suffix: bool) -> Result<Vec<(usize, Token)>> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        match c {
            b' ' | b'\t' | b'\n' | b'\r' => i += 1,
            b'(' => {
                tokens.push((i, Token::Open));
                i += 1;
            }
            b')' => {
                tokens.push((i, Token::Close));
                i += 1;
            }
            b':' => {
                tokens.push((i, Token::Colon));
                i += 1;
            }
            b'#' => {
                tokens.push((i, Token::Complement));
                i += 1;
            }
            b'-' | b'+' | b'0'..=b'9' => {
                let start = i;
                let negative = c == b'-';
                if !c.is_ascii_digit() {
                    i += 1;
                }
                if c == b'-' && bytes.get(i) == Some(&b'(') {
                    tokens.push((start, Token::Complement));
                    continue;
                }
                let digits_start = i;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                if i == digits_start {
                    return Err(parse_error(start, "sign without surface number").into());
                }
                let magnitude: i32 = text[digits_start..i]
                    .parse()
                    .map_err(|_| parse_error(start, "surface number overflows"))?;
                if magnitude == 0 {
                    return Err(parse_error(start, "surface number 0 is not allowed").into());
                }
                let suffix = bytes.get(i).copied();
                if !allow_suffix && matches!(suffix, Some(b'M' | b'N')) {
                    return Err(parse_error(i, "base suffix in a concrete rule").into());
                }
                let base = match suffix {
                    Some(b'M') => {
                        i += 1;
                        BaseSel::M
                    }
                    Some(b'N') => {
                        i += 1;
                        BaseSel::N
                    }
                    _ => BaseSel::Primary,
                };
                tokens.push((
                    start,
                    Token::Number {
                        negative,
                        magnitude,
                        base,
                    },
                ));
            }
            _ => {
                return Err(parse_error(i, format!("unexpected character '{}'", char::from(c))).into())
            }
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |(o, _)| *o)
    }

    fn union(&mut self) -> Result<RuleExpr> {
        let mut items = vec![self.intersection()?];
        while self.peek() == Some(&Token::Colon) {
            self.pos += 1;
            items.push(self.intersection()?);
        }
        Ok(if items.len() == 1 {
            items.remove(0)
        } else {
            RuleExpr::Or(items)
        })
    }

    fn intersection(&mut self) -> Result<RuleExpr> {
        let mut items = Vec::new();
        while matches!(
            self.peek(),
            Some(Token::Number { .. } | Token::Open | Token::Complement)
        ) {
            items.push(self.factor()?);
        }
        match items.len() {
            0 => Err(parse_error(self.offset(), "expected surface or group").into()),
            1 => Ok(items.remove(0)),
            _ => Ok(RuleExpr::And(items)),
        }
    }

    fn factor(&mut self) -> Result<RuleExpr> {
        let at = self.offset();
        let Some((_, token)) = self.tokens.get(self.pos).cloned() else {
            return Err(parse_error(at, "unexpected end of rule").into());
        };
        self.pos += 1;
        match token {
            Token::Number {
                negative,
                magnitude,
                base,
            } => Ok(RuleExpr::Offset {
                base,
                magnitude,
                negative,
            }),
            Token::Open => self.group(),
            Token::Complement => {
                if self.peek() != Some(&Token::Open) {
                    return Err(parse_error(self.offset(), "complement must be followed by '('").into());
                }
                self.pos += 1;
                Ok(RuleExpr::Not(Box::new(self.group()?)))
            }
            Token::Close | Token::Colon => Err(parse_error(at, "expected surface or group").into()),
        }
    }

    fn group(&mut self) -> Result<RuleExpr> {
        let inner = self.union()?;
        if self.peek() != Some(&Token::Close) {
            return Err(parse_error(self.offset(), "missing ')'").into());
        }
        self.pos += 1;
        Ok(inner)
    }
}

/// Parses rule text into an unresolved expression.
///
/// Returns `Ok(None)` for blank text.
///
/// # Errors
///
/// Returns [`RuleError::Parse`] with the byte offset of the problem.
pub fn parse_expr(text: &str) -> Result<Option<RuleExpr>> {
    parse_tokens(text, true)
}

/// Parses rule text whose numbers are final surface numbers, so `M`/`N`
/// base suffixes are rejected at their byte offset.
///
/// # Errors
///
/// Returns [`RuleError::Parse`] with the byte offset of the problem.
pub(crate) fn parse_concrete_expr(text: &str) -> Result<Option<RuleExpr>> {
    parse_tokens(text, false)
}

fn parse_tokens(text: &str, allow_suffix: bool) -> Result<Option<RuleExpr>> {
    let tokens = tokenize(text, allow_suffix)?;
    if tokens.is_empty() {
        return Ok(None);
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: text.len(),
    };
    let expr = parser.union()?;
    if parser.pos != parser.tokens.len() {
        return Err(parse_error(parser.offset(), "unexpected trailing input").into());
    }
    Ok(Some(expr))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::BeamgeomError;

    fn off(negative: bool, magnitude: i32, base: BaseSel) -> RuleExpr {
        RuleExpr::Offset {
            base,
            magnitude,
            negative,
        }
    }

    #[test]
    fn plain_intersection() {
        let e = parse_expr("3 -4 5 -6").unwrap().unwrap();
        assert_eq!(
            e,
            RuleExpr::And(vec![
                off(false, 3, BaseSel::Primary),
                off(true, 4, BaseSel::Primary),
                off(false, 5, BaseSel::Primary),
                off(true, 6, BaseSel::Primary),
            ])
        );
    }

    #[test]
    fn base_suffixes() {
        let e = parse_expr("-7M 2N 1").unwrap().unwrap();
        assert_eq!(
            e,
            RuleExpr::And(vec![
                off(true, 7, BaseSel::M),
                off(false, 2, BaseSel::N),
                off(false, 1, BaseSel::Primary),
            ])
        );
    }

    #[test]
    fn union_binds_looser() {
        let e = parse_expr("1 2 : 3").unwrap().unwrap();
        assert_eq!(
            e,
            RuleExpr::Or(vec![
                RuleExpr::And(vec![off(false, 1, BaseSel::Primary), off(false, 2, BaseSel::Primary)]),
                off(false, 3, BaseSel::Primary),
            ])
        );
    }

    #[test]
    fn complement_group_forms() {
        let minus = parse_expr("1 -(2 : 3)").unwrap().unwrap();
        let hash = parse_expr("1 #(2:3)").unwrap().unwrap();
        assert_eq!(minus, hash);
        assert!(matches!(minus, RuleExpr::And(ref v) if matches!(v[1], RuleExpr::Not(_))));
    }

    #[test]
    fn blank_is_empty() {
        assert_eq!(parse_expr("   ").unwrap(), None);
    }

    #[test]
    fn errors_carry_position() {
        for (text, pos) in [("1 (2 : 3", 8), ("1 : : 2", 4), ("1 x", 2), ("1 0", 2), ("- 3", 0), ("1 )", 2)] {
            match parse_expr(text) {
                Err(BeamgeomError::Rule(RuleError::Parse { position, .. })) => {
                    assert_eq!(position, pos, "{text}");
                }
                other => panic!("{text}: expected parse error, got {other:?}"),
            }
        }
    }

    #[test]
    fn concrete_rule_reports_suffix_offset() {
        for (text, pos) in [("1 -23M", 5), ("4N", 1), ("(1 : 2) 17M", 10)] {
            match parse_concrete_expr(text) {
                Err(BeamgeomError::Rule(RuleError::Parse { position, .. })) => {
                    assert_eq!(position, pos, "{text}");
                }
                other => panic!("{text}: expected parse error, got {other:?}"),
            }
        }
        assert!(parse_concrete_expr("1 -23").unwrap().is_some());
    }
}

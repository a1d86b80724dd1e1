//! Text form of path expressions.
//!
//! Parses the same surface the `Display` impl produces for access-only
//! expressions: a `T`/`S`/`A` root followed by `.name`, `[literal]`,
//! `(...)` calls, `.*`, and `.**`. Operator-wrapped expressions have no
//! text form and are rejected.

use std::rc::Rc;

use glean_value::Value;

use super::{PathExpr, Root};
use crate::spec::Spec;

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

/// Parse a rendered path expression.
pub fn parse_expr(src: &str) -> Result<PathExpr, String> {
    let mut p = Parser { src, pos: 0 };
    let expr = p.parse()?;
    p.skip_ws();
    if p.pos != p.src.len() {
        return Err(format!("trailing input at offset {}", p.pos));
    }
    Ok(expr)
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), String> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(format!("expected '{c}' at offset {}", self.pos))
        }
    }

    fn parse(&mut self) -> Result<PathExpr, String> {
        self.skip_ws();
        let root = match self.bump() {
            Some('T') => Root::Target,
            Some('S') => Root::Scope,
            Some('A') => Root::Assign,
            other => {
                return Err(format!(
                    "expected root T, S, or A, found {other:?}"
                ));
            }
        };
        let mut expr = PathExpr::new(root);
        loop {
            match self.peek() {
                Some('.') => {
                    self.pos += 1;
                    if self.eat('*') {
                        if self.eat('*') {
                            expr = expr.deep_star();
                        } else {
                            expr = expr.star();
                        }
                    } else {
                        expr = expr.attr(self.ident()?);
                    }
                }
                Some('[') => {
                    self.pos += 1;
                    self.skip_ws();
                    let key = self.literal()?;
                    self.skip_ws();
                    self.expect(']')?;
                    expr = expr.item(key);
                }
                Some('(') => {
                    self.pos += 1;
                    let (args, kwargs) = self.call_args()?;
                    expr = expr.call_kw(args, kwargs);
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn ident(&mut self) -> Result<Rc<str>, String> {
        let start = self.pos;
        if !matches!(self.peek(), Some(c) if c.is_ascii_alphabetic() || c == '_') {
            return Err(format!("expected identifier at offset {}", self.pos));
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            self.pos += 1;
        }
        Ok(Rc::from(&self.src[start..self.pos]))
    }

    fn literal(&mut self) -> Result<Value, String> {
        match self.peek() {
            Some('\'') => self.string_literal(),
            Some(c) if c == '-' || c.is_ascii_digit() => self.number_literal(),
            Some('t') if self.rest().starts_with("true") => {
                self.pos += 4;
                Ok(Value::Bool(true))
            }
            Some('f') if self.rest().starts_with("false") => {
                self.pos += 5;
                Ok(Value::Bool(false))
            }
            Some('n') if self.rest().starts_with("null") => {
                self.pos += 4;
                Ok(Value::Null)
            }
            other => Err(format!("expected literal, found {other:?}")),
        }
    }

    fn string_literal(&mut self) -> Result<Value, String> {
        self.expect('\'')?;
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('\'') => return Ok(Value::string(out)),
                Some('\\') => match self.bump() {
                    Some('\'') => out.push('\''),
                    Some('\\') => out.push('\\'),
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    other => return Err(format!("bad escape {other:?}")),
                },
                Some(c) => out.push(c),
                None => return Err("unterminated string literal".into()),
            }
        }
    }

    fn number_literal(&mut self) -> Result<Value, String> {
        let start = self.pos;
        self.eat('-');
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }
        let mut is_float = false;
        if self.peek() == Some('.')
            && matches!(self.rest()[1..].chars().next(), Some(c) if c.is_ascii_digit())
        {
            is_float = true;
            self.pos += 1;
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        let text = &self.src[start..self.pos];
        if is_float {
            text.parse::<f64>()
                .map(Value::Float)
                .map_err(|e| format!("bad float literal '{text}': {e}"))
        } else {
            text.parse::<i64>()
                .map(Value::Int)
                .map_err(|e| format!("bad int literal '{text}': {e}"))
        }
    }

    fn call_args(&mut self) -> Result<(Vec<Spec>, Vec<(Rc<str>, Spec)>), String> {
        let mut args = Vec::new();
        let mut kwargs = Vec::new();
        self.skip_ws();
        if self.eat(')') {
            return Ok((args, kwargs));
        }
        loop {
            self.skip_ws();
            // Keyword arguments are `ident=spec`; disambiguate from a bare
            // nested expression by scanning for the '='.
            if let Some(name) = self.try_kwarg_name() {
                kwargs.push((name, self.arg_spec()?));
            } else if kwargs.is_empty() {
                args.push(self.arg_spec()?);
            } else {
                return Err("positional argument after keyword argument".into());
            }
            self.skip_ws();
            if self.eat(',') {
                continue;
            }
            self.expect(')')?;
            return Ok((args, kwargs));
        }
    }

    fn try_kwarg_name(&mut self) -> Option<Rc<str>> {
        let rest = self.rest();
        let mut end = 0;
        for (i, c) in rest.char_indices() {
            if i == 0 {
                if !(c.is_ascii_alphabetic() || c == '_') {
                    return None;
                }
            } else if !(c.is_ascii_alphanumeric() || c == '_') {
                end = i;
                break;
            }
            end = i + c.len_utf8();
        }
        if end == 0 || !rest[end..].starts_with('=') {
            return None;
        }
        let name = Rc::from(&rest[..end]);
        self.pos += end + 1;
        Some(name)
    }

    fn arg_spec(&mut self) -> Result<Spec, String> {
        match self.peek() {
            Some('T' | 'S' | 'A') => Ok(Spec::Expr(self.parse()?)),
            _ => Ok(Spec::Lit(self.literal()?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::t;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_attrs_items_and_wildcards() {
        let expr = parse_expr("T.a['b c'][-1].*.**").unwrap();
        assert_eq!(
            expr,
            t().attr("a")
                .item(Value::string("b c"))
                .item(Value::Int(-1))
                .star()
                .deep_star()
        );
    }

    #[test]
    fn parses_calls_with_nested_exprs_and_kwargs() {
        let expr = parse_expr("T.f(T.a, 1, sep=', ')").unwrap();
        assert_eq!(
            expr,
            t().attr("f").call_kw(
                vec![Spec::Expr(t().attr("a")), Spec::Lit(Value::Int(1))],
                vec![(Rc::from("sep"), Spec::Lit(Value::string(", ")))],
            )
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_expr("X.a").is_err());
        assert!(parse_expr("T.").is_err());
        assert!(parse_expr("T['unterminated").is_err());
        assert!(parse_expr("T.a extra").is_err());
    }
}

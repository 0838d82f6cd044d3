//! Winnow parser for the expression sub-language.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! or       := and ("||" and)*
//! and      := equality ("&&" equality)*
//! equality := compare (("==" | "!=") compare)*
//! compare  := additive (("<=" | ">=" | "<" | ">") additive)*
//! additive := term (("+" | "-") term)*
//! term     := unary (("*" | "/" | "%") unary)*
//! unary    := ("!" | "-")* postfix
//! postfix  := primary ("." ident | "[" or "]")*
//! primary  := "(" or ")" | string | ident-path ["!"] [call-args] | number
//! ```

use winnow::{
    Parser as _,
    ascii::{float, multispace0},
    combinator::{alt, delimited, opt, peek, preceded, repeat, separated},
    error::{ContextError, ErrMode, ModalResult},
    stream::Stream as _,
    token::{any, none_of, one_of, take_while},
};

use crate::expr::{BinaryOp, ExprKind, Lit, UnaryOp};

/// Parse a complete expression text.
pub(crate) fn parse_expr_text(text: &str) -> Result<ExprKind, String> {
    delimited(multispace0, or_expr, multispace0)
        .parse(text)
        .map_err(|err| err.to_string())
}

/// Left-associative chain of one binary precedence level.
fn binary_chain<'s>(
    input: &mut &'s str,
    mut next: impl winnow::Parser<&'s str, ExprKind, ErrMode<ContextError>>,
    mut op: impl winnow::Parser<&'s str, BinaryOp, ErrMode<ContextError>>,
) -> ModalResult<ExprKind> {
    let mut lhs = next.parse_next(input)?;
    loop {
        let checkpoint = input.checkpoint();
        multispace0.parse_next(input)?;
        match opt(op.by_ref()).parse_next(input)? {
            Some(op) => {
                multispace0.parse_next(input)?;
                let rhs = next.parse_next(input)?;
                lhs = ExprKind::binary(op, lhs, rhs);
            }
            None => {
                input.reset(&checkpoint);
                break;
            }
        }
    }
    Ok(lhs)
}

fn or_expr(input: &mut &str) -> ModalResult<ExprKind> {
    binary_chain(input, and_expr, "||".value(BinaryOp::Or))
}

fn and_expr(input: &mut &str) -> ModalResult<ExprKind> {
    binary_chain(input, equality, "&&".value(BinaryOp::And))
}

fn equality(input: &mut &str) -> ModalResult<ExprKind> {
    binary_chain(
        input,
        compare,
        alt(("==".value(BinaryOp::Eq), "!=".value(BinaryOp::Ne))),
    )
}

fn compare(input: &mut &str) -> ModalResult<ExprKind> {
    binary_chain(
        input,
        additive,
        alt((
            "<=".value(BinaryOp::Le),
            ">=".value(BinaryOp::Ge),
            "<".value(BinaryOp::Lt),
            ">".value(BinaryOp::Gt),
        )),
    )
}

fn additive(input: &mut &str) -> ModalResult<ExprKind> {
    binary_chain(
        input,
        term,
        alt(('+'.value(BinaryOp::Add), '-'.value(BinaryOp::Sub))),
    )
}

fn term(input: &mut &str) -> ModalResult<ExprKind> {
    binary_chain(
        input,
        unary,
        alt((
            '*'.value(BinaryOp::Mul),
            '/'.value(BinaryOp::Div),
            '%'.value(BinaryOp::Mod),
        )),
    )
}

fn unary(input: &mut &str) -> ModalResult<ExprKind> {
    match opt(alt(('!'.value(UnaryOp::Not), '-'.value(UnaryOp::Neg)))).parse_next(input)? {
        Some(op) => {
            multispace0.parse_next(input)?;
            let operand = unary.parse_next(input)?;
            Ok(ExprKind::Unary {
                op,
                operand: Box::new(operand),
            })
        }
        None => postfix(input),
    }
}

fn postfix(input: &mut &str) -> ModalResult<ExprKind> {
    let mut base = primary.parse_next(input)?;
    loop {
        if let Some(field) = opt(preceded('.', identifier)).parse_next(input)? {
            base = ExprKind::Member(Box::new(base), field);
            continue;
        }
        let index = opt(delimited(
            ('[', multispace0),
            or_expr,
            (multispace0, ']'),
        ))
        .parse_next(input)?;
        if let Some(index) = index {
            base = ExprKind::Index(Box::new(base), Box::new(index));
            continue;
        }
        break;
    }
    Ok(base)
}

fn primary(input: &mut &str) -> ModalResult<ExprKind> {
    alt((parens, string_literal, ident_path, number)).parse_next(input)
}

fn parens(input: &mut &str) -> ModalResult<ExprKind> {
    delimited(('(', multispace0), or_expr, (multispace0, ')')).parse_next(input)
}

fn number(input: &mut &str) -> ModalResult<ExprKind> {
    let n: f64 = float.parse_next(input)?;
    Ok(ExprKind::Literal(Lit::Number(n)))
}

/// An identifier path, optionally a call.
///
/// Greedily consumes `ident ("." ident)*`. When the path is followed by an
/// argument list (possibly after a `!` re-execution marker) the whole path
/// is the call name; otherwise the first segment is a variable and the
/// rest are member accessors.
fn ident_path(input: &mut &str) -> ModalResult<ExprKind> {
    let first = identifier.parse_next(input)?;
    let rest: Vec<String> = repeat(0.., preceded('.', identifier)).parse_next(input)?;
    let bang = opt('!').parse_next(input)?.is_some();
    let is_call = opt(peek('(')).parse_next(input)?.is_some();

    if is_call {
        let args: Vec<ExprKind> = delimited(
            ('(', multispace0),
            separated(0.., or_expr, (multispace0, ',', multispace0)),
            (multispace0, ')'),
        )
        .parse_next(input)?;
        let mut name = first;
        for segment in &rest {
            name.push('.');
            name.push_str(segment);
        }
        if bang {
            name.push('!');
        }
        return Ok(ExprKind::Call { name, args });
    }
    if bang {
        // `name!` is only valid as a call
        return Err(ErrMode::Backtrack(ContextError::new()));
    }

    if rest.is_empty() {
        match first.as_str() {
            "null" => return Ok(ExprKind::Literal(Lit::Null)),
            "true" => return Ok(ExprKind::Literal(Lit::Bool(true))),
            "false" => return Ok(ExprKind::Literal(Lit::Bool(false))),
            _ => {}
        }
    }

    let mut expr = ExprKind::Var(first);
    for segment in rest {
        expr = ExprKind::Member(Box::new(expr), segment);
    }
    Ok(expr)
}

fn identifier(input: &mut &str) -> ModalResult<String> {
    (
        one_of(|c: char| c.is_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_alphanumeric() || c == '_'),
    )
        .take()
        .map(str::to_string)
        .parse_next(input)
}

fn string_literal(input: &mut &str) -> ModalResult<ExprKind> {
    alt((quoted_string('\''), quoted_string('"')))
        .map(|s| ExprKind::Literal(Lit::Str(s)))
        .parse_next(input)
}

fn quoted_string<'s>(quote: char) -> impl FnMut(&mut &'s str) -> ModalResult<String> {
    move |input: &mut &'s str| {
        delimited(
            quote,
            repeat(
                0..,
                alt((preceded('\\', escape_char), none_of([quote, '\\']))),
            )
            .fold(String::new, |mut acc, c| {
                acc.push(c);
                acc
            }),
            quote,
        )
        .parse_next(input)
    }
}

fn escape_char(input: &mut &str) -> ModalResult<char> {
    any.map(|c| match c {
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        other => other,
    })
    .parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> ExprKind {
        parse_expr_text(text).unwrap()
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            parse(r#"'a\'b'"#),
            ExprKind::Literal(Lit::Str("a'b".to_string()))
        );
        assert_eq!(
            parse(r#""tab\there""#),
            ExprKind::Literal(Lit::Str("tab\there".to_string()))
        );
    }

    #[test]
    fn test_logical_operators() {
        let expr = parse("a && b || c");
        assert!(matches!(
            expr,
            ExprKind::Binary {
                op: BinaryOp::Or,
                ..
            }
        ));
    }

    #[test]
    fn test_unary_stacking() {
        let expr = parse("!!x");
        match expr {
            ExprKind::Unary {
                op: UnaryOp::Not,
                operand,
            } => assert!(matches!(
                *operand,
                ExprKind::Unary {
                    op: UnaryOp::Not,
                    ..
                }
            )),
            other => panic!("expected unary, got {:?}", other),
        }
    }

    #[test]
    fn test_call_without_arguments() {
        assert_eq!(
            parse("greet()"),
            ExprKind::Call {
                name: "greet".to_string(),
                args: vec![],
            }
        );
    }

    #[test]
    fn test_member_after_call() {
        let expr = parse("profile().name");
        assert!(matches!(expr, ExprKind::Member(..)));
    }

    #[test]
    fn test_bang_requires_call() {
        assert!(parse_expr_text("greet!").is_err());
    }

    #[test]
    fn test_nested_index() {
        let expr = parse("rows[i + 1]");
        match expr {
            ExprKind::Index(base, index) => {
                assert_eq!(*base, ExprKind::Var("rows".to_string()));
                assert!(matches!(
                    *index,
                    ExprKind::Binary {
                        op: BinaryOp::Add,
                        ..
                    }
                ));
            }
            other => panic!("expected index, got {:?}", other),
        }
    }
}

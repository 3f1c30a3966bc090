//! A `nom`-based parser for the report expression language.
//!
//! Precedence, loosest first: `?:`, `or`/`||`, `and`/`&&`, `==`/`!=`,
//! relational, additive, multiplicative, unary `-`/`!`/`not`.

use crate::ast::*;
use crate::error::ExpressionError;
use crate::functions::Function;
use banded_types::{Decimal, Value};
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit1, multispace0, one_of, satisfy},
    combinator::{map, map_res, not, opt, recognize},
    error::{Error, ErrorKind},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded, terminated},
};
use std::str::FromStr;

// --- Main Public Parser ---

pub fn parse_expression(input: &str) -> Result<Expression, ExpressionError> {
    let source = input.trim();
    match expression(source) {
        Ok(("", expr)) => Ok(expr),
        Ok((rem, _)) => Err(ExpressionError::Syntax {
            source_text: source.to_string(),
            message: format!("unexpected input at '{}'", rem),
        }),
        Err(e) => Err(ExpressionError::Syntax {
            source_text: source.to_string(),
            message: describe(source, e),
        }),
    }
}

fn describe(source: &str, err: nom::Err<Error<&str>>) -> String {
    match err {
        nom::Err::Incomplete(_) => "incomplete expression".to_string(),
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            if e.input.is_empty() {
                if source.is_empty() {
                    "empty expression".to_string()
                } else {
                    "unexpected end of expression".to_string()
                }
            } else {
                format!("cannot parse '{}'", e.input)
            }
        }
    }
}

// --- Combinators & Helpers ---

fn ws<'a, F, O, E>(inner: F) -> impl Parser<&'a str, Output = O, Error = E>
where
    F: Parser<&'a str, Output = O, Error = E>,
    E: nom::error::ParseError<&'a str>,
{
    delimited(multispace0, inner, multispace0)
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// A word that must not run on into an identifier (`or` but not `order`).
fn keyword<'a>(
    word: &'static str,
) -> impl Parser<&'a str, Output = &'a str, Error = Error<&'a str>> {
    terminated(tag(word), not(satisfy(is_ident_char)))
}

fn build_binary_expr_parser<'a, F, G>(
    sub_expr_parser: F,
    op_parser: G,
) -> impl FnMut(&'a str) -> IResult<&'a str, Expression>
where
    F: Parser<&'a str, Output = Expression, Error = Error<&'a str>> + Clone,
    G: Parser<&'a str, Output = BinaryOperator, Error = Error<&'a str>> + Clone,
{
    move |input: &str| {
        let (input, mut left) = sub_expr_parser.clone().parse(input)?;
        let (input, remainder) =
            many0(pair(ws(op_parser.clone()), sub_expr_parser.clone())).parse(input)?;

        for (op, right) in remainder {
            left = Expression::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok((input, left))
    }
}

// --- Expression Parsers (in order of precedence) ---

fn expression(input: &str) -> IResult<&str, Expression> {
    let (i, condition) = or_expr(input)?;
    let (i, branches) = opt(pair(
        preceded(ws(char('?')), expression),
        preceded(ws(char(':')), expression),
    ))
    .parse(i)?;

    match branches {
        Some((then_branch, else_branch)) => Ok((
            i,
            Expression::Conditional {
                condition: Box::new(condition),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            },
        )),
        None => Ok((i, condition)),
    }
}

fn or_op(input: &str) -> IResult<&str, BinaryOperator> {
    map(alt((tag("||"), keyword("or"))), |_| BinaryOperator::Or).parse(input)
}

fn and_op(input: &str) -> IResult<&str, BinaryOperator> {
    map(alt((tag("&&"), keyword("and"))), |_| BinaryOperator::And).parse(input)
}

fn or_expr(input: &str) -> IResult<&str, Expression> {
    build_binary_expr_parser(and_expr, or_op)(input)
}

fn and_expr(input: &str) -> IResult<&str, Expression> {
    build_binary_expr_parser(equality_expr, and_op)(input)
}

fn equality_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        map(tag("=="), |_| BinaryOperator::Equals),
        map(tag("!="), |_| BinaryOperator::NotEquals),
    ))
    .parse(input)
}

fn relational_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        map(tag("<="), |_| BinaryOperator::LessThanOrEqual),
        map(tag(">="), |_| BinaryOperator::GreaterThanOrEqual),
        map(char('<'), |_| BinaryOperator::LessThan),
        map(char('>'), |_| BinaryOperator::GreaterThan),
    ))
    .parse(input)
}

fn additive_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        map(char('+'), |_| BinaryOperator::Plus),
        map(char('-'), |_| BinaryOperator::Minus),
    ))
    .parse(input)
}

fn multiplicative_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        map(char('*'), |_| BinaryOperator::Multiply),
        map(char('/'), |_| BinaryOperator::Divide),
        map(char('%'), |_| BinaryOperator::Modulo),
    ))
    .parse(input)
}

fn equality_expr(input: &str) -> IResult<&str, Expression> {
    build_binary_expr_parser(relational_expr, equality_op)(input)
}

fn relational_expr(input: &str) -> IResult<&str, Expression> {
    build_binary_expr_parser(additive_expr, relational_op)(input)
}

fn additive_expr(input: &str) -> IResult<&str, Expression> {
    build_binary_expr_parser(multiplicative_expr, additive_op)(input)
}

fn multiplicative_expr(input: &str) -> IResult<&str, Expression> {
    build_binary_expr_parser(unary_expr, multiplicative_op)(input)
}

fn unary_expr(input: &str) -> IResult<&str, Expression> {
    alt((
        map(preceded(ws(char('-')), unary_expr), |expr| match expr {
            Expression::Literal(Value::Number(n)) => Expression::Literal(Value::Number(-n)),
            other => Expression::Unary {
                op: UnaryOperator::Minus,
                expr: Box::new(other),
            },
        }),
        map(
            preceded(ws(alt((tag("!"), keyword("not")))), unary_expr),
            |expr| Expression::Unary {
                op: UnaryOperator::Not,
                expr: Box::new(expr),
            },
        ),
        primary_expr,
    ))
    .parse(input)
}

fn primary_expr(input: &str) -> IResult<&str, Expression> {
    ws(alt((
        dollar_reference,
        prefixed_reference,
        map(number_literal, |n| Expression::Literal(Value::Number(n))),
        map(string_literal, |s| Expression::Literal(Value::String(s))),
        map(keyword("true"), |_| Expression::Literal(Value::Boolean(true))),
        map(keyword("false"), |_| Expression::Literal(Value::Boolean(false))),
        map(keyword("null"), |_| Expression::Literal(Value::Null)),
        function_call,
        delimited(ws(char('(')), expression, ws(char(')'))),
    )))
    .parse(input)
}

// --- Literal Parsers ---

fn number_literal(input: &str) -> IResult<&str, Decimal> {
    map_res(
        recognize(pair(digit1, opt(pair(char('.'), digit1)))),
        Decimal::from_str,
    )
    .parse(input)
}

/// Single- or double-quoted text with backslash escapes. An unterminated
/// literal is a hard failure so no other alternative is tried.
fn string_literal(input: &str) -> IResult<&str, String> {
    let mut chars = input.char_indices();
    let quote = match chars.next() {
        Some((_, q @ ('"' | '\''))) => q,
        _ => return Err(nom::Err::Error(Error::new(input, ErrorKind::Char))),
    };
    let mut out = String::new();
    let mut escaped = false;
    for (idx, c) in chars {
        if escaped {
            out.push(match c {
                'n' => '\n',
                't' => '\t',
                other => other,
            });
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            return Ok((&input[idx + c.len_utf8()..], out));
        } else {
            out.push(c);
        }
    }
    Err(nom::Err::Failure(Error::new(input, ErrorKind::Char)))
}

// --- Reference Parsers ---

fn reference(kind: RefKind, name: &str) -> Expression {
    let name = name.trim();
    let kind = match kind {
        RefKind::Variable if Builtin::from_name(name).is_some() => RefKind::Builtin,
        other => other,
    };
    Expression::Reference(Reference::new(kind, name))
}

/// `$F{name}`, `$V{name}`, `$P{name}`.
fn dollar_reference(input: &str) -> IResult<&str, Expression> {
    map(
        preceded(
            char('$'),
            pair(
                one_of("FVP"),
                delimited(char('{'), take_while1(|c| c != '}'), char('}')),
            ),
        ),
        |(kind, name): (char, &str)| {
            let kind = match kind {
                'F' => RefKind::Field,
                'V' => RefKind::Variable,
                _ => RefKind::Parameter,
            };
            reference(kind, name)
        },
    )
    .parse(input)
}

/// `field:name`, `variable:name`, `parameter:name`, `builtin:NAME`.
fn prefixed_reference(input: &str) -> IResult<&str, Expression> {
    map(
        pair(
            alt((
                map(tag("field"), |_| RefKind::Field),
                map(tag("variable"), |_| RefKind::Variable),
                map(tag("parameter"), |_| RefKind::Parameter),
                map(tag("builtin"), |_| RefKind::Builtin),
            )),
            preceded(char(':'), identifier),
        ),
        |(kind, name)| reference(kind, name),
    )
    .parse(input)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_alphabetic() || c == '_'),
        take_while(is_ident_char),
    ))
    .parse(input)
}

// --- Function Call Parser ---

fn function_call(input: &str) -> IResult<&str, Expression> {
    let (i, name) = identifier(input)?;
    let (i, _) = multispace0(i)?;
    let (i, args) = delimited(
        char('('),
        separated_list0(ws(char(',')), expression),
        ws(char(')')),
    )
    .parse(i)?;

    Ok((
        i,
        Expression::Call {
            name: name.to_string(),
            function: Function::from_name(name),
            args,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str) -> Expression {
        Expression::Reference(Reference::new(RefKind::Field, name))
    }

    fn number(n: i64) -> Expression {
        Expression::Literal(Value::Number(Decimal::from(n)))
    }

    #[test]
    fn test_parse_reference_forms() {
        assert_eq!(parse_expression("$F{amount}").unwrap(), field("amount"));
        assert_eq!(parse_expression("field:amount").unwrap(), field("amount"));
        assert_eq!(
            parse_expression("$P{ Title }").unwrap(),
            Expression::Reference(Reference::new(RefKind::Parameter, "Title"))
        );
        assert_eq!(
            parse_expression("$V{PAGE_NUMBER}").unwrap(),
            Expression::Reference(Reference::new(RefKind::Builtin, "PAGE_NUMBER"))
        );
        assert_eq!(
            parse_expression("builtin:PAGE_COUNT").unwrap(),
            Expression::Reference(Reference::new(RefKind::Builtin, "PAGE_COUNT"))
        );
    }

    #[test]
    fn test_precedence() {
        let result = parse_expression("1 + 2 * 3").unwrap();
        assert_eq!(
            result,
            Expression::Binary {
                left: Box::new(number(1)),
                op: BinaryOperator::Plus,
                right: Box::new(Expression::Binary {
                    left: Box::new(number(2)),
                    op: BinaryOperator::Multiply,
                    right: Box::new(number(3)),
                }),
            }
        );

        let result = parse_expression("$F{a} > 1 and $F{b} < 2 or $F{c} == 3").unwrap();
        assert!(matches!(
            result,
            Expression::Binary {
                op: BinaryOperator::Or,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_unary_minus() {
        assert_eq!(parse_expression("-5").unwrap(), number(-5));
        let result = parse_expression("10 - -5").unwrap();
        assert_eq!(
            result,
            Expression::Binary {
                left: Box::new(number(10)),
                op: BinaryOperator::Minus,
                right: Box::new(number(-5)),
            }
        );
        assert_eq!(
            parse_expression("-$F{x}").unwrap(),
            Expression::Unary {
                op: UnaryOperator::Minus,
                expr: Box::new(field("x")),
            }
        );
    }

    #[test]
    fn test_parse_conditional() {
        let result = parse_expression("$F{qty} > 0 ? \"in stock\" : 'sold out'").unwrap();
        let Expression::Conditional {
            then_branch,
            else_branch,
            ..
        } = result
        else {
            panic!("expected conditional");
        };
        assert_eq!(*then_branch, Expression::Literal(Value::from("in stock")));
        assert_eq!(*else_branch, Expression::Literal(Value::from("sold out")));
    }

    #[test]
    fn test_parse_function_calls() {
        let result = parse_expression("round( $F{x} , 2 )").unwrap();
        assert_eq!(
            result,
            Expression::Call {
                name: "round".into(),
                function: Some(Function::Round),
                args: vec![field("x"), number(2)],
            }
        );
        let unknown = parse_expression("frobnicate()").unwrap();
        assert!(matches!(unknown, Expression::Call { function: None, .. }));
    }

    #[test]
    fn test_keywords_need_word_boundary() {
        assert!(matches!(
            parse_expression("not $F{flag}").unwrap(),
            Expression::Unary {
                op: UnaryOperator::Not,
                ..
            }
        ));
        assert!(matches!(
            parse_expression("nothing(1)").unwrap(),
            Expression::Call { function: None, .. }
        ));
        assert_eq!(
            parse_expression("null").unwrap(),
            Expression::Literal(Value::Null)
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            parse_expression(r#""say \"hi\"\n""#).unwrap(),
            Expression::Literal(Value::from("say \"hi\"\n"))
        );
    }

    #[test]
    fn test_syntax_errors() {
        assert!(matches!(
            parse_expression("1 +"),
            Err(ExpressionError::Syntax { .. })
        ));
        assert!(matches!(
            parse_expression("\"unterminated"),
            Err(ExpressionError::Syntax { .. })
        ));
        assert!(matches!(
            parse_expression(""),
            Err(ExpressionError::Syntax { .. })
        ));
        assert!(matches!(
            parse_expression("$F{a} $F{b}"),
            Err(ExpressionError::Syntax { .. })
        ));
    }

    #[test]
    fn test_display_round_trips() {
        let text = "(($F{a} + 1) > $V{total} ? upper($P{name}) : \"none\")";
        let parsed = parse_expression(text).unwrap();
        assert_eq!(parse_expression(&parsed.to_string()).unwrap(), parsed);
    }
}

//! A `nom`-based parser for the XPath 1.0 expression language.

use super::ast::*;
use crate::error::XPathError;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit0, digit1, multispace0, satisfy},
    combinator::{map, not, opt, peek, recognize, value},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded, terminated},
};

// --- Main Public Parser ---

pub fn parse_expression(input: &str) -> Result<Expression, XPathError> {
    match expression(input.trim()) {
        Ok(("", expr)) => Ok(expr),
        Ok((rem, _)) => Err(XPathError::XPathParse(
            input.to_string(),
            format!("Parser did not consume all input. Remainder: '{}'", rem),
        )),
        Err(e) => Err(XPathError::XPathParse(input.to_string(), e.to_string())),
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

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '.'
}

/// An operator name such as `div`, which must not run on into a longer name.
fn keyword<'a>(word: &'static str) -> impl Parser<&'a str, Output = &'a str, Error = nom::error::Error<&'a str>> {
    terminated(tag(word), not(satisfy(is_name_char)))
}

fn build_binary_expr_parser<'a, F, G>(
    sub_expr_parser: F,
    op_parser: G,
) -> impl FnMut(&'a str) -> IResult<&'a str, Expression>
where
    F: Parser<&'a str, Output = Expression, Error = nom::error::Error<&'a str>> + Clone,
    G: Parser<&'a str, Output = BinaryOperator, Error = nom::error::Error<&'a str>> + Clone,
{
    move |input: &str| {
        let (input, mut left) = sub_expr_parser.clone().parse(input)?;
        let (input, remainder) =
            many0(pair(ws(op_parser.clone()), sub_expr_parser.clone())).parse(input)?;

        for (op, right) in remainder {
            left = Expression::BinaryOp {
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
    or_expr(input)
}

fn or_op(input: &str) -> IResult<&str, BinaryOperator> {
    value(BinaryOperator::Or, keyword("or")).parse(input)
}

fn and_op(input: &str) -> IResult<&str, BinaryOperator> {
    value(BinaryOperator::And, keyword("and")).parse(input)
}

fn or_expr(input: &str) -> IResult<&str, Expression> {
    build_binary_expr_parser(and_expr, or_op)(input)
}

fn and_expr(input: &str) -> IResult<&str, Expression> {
    build_binary_expr_parser(equality_expr, and_op)(input)
}

fn equality_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        value(BinaryOperator::Equals, tag("=")),
        value(BinaryOperator::NotEquals, tag("!=")),
    ))
    .parse(input)
}

fn relational_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        value(BinaryOperator::LessThanOrEqual, tag("<=")),
        value(BinaryOperator::GreaterThanOrEqual, tag(">=")),
        value(BinaryOperator::LessThan, tag("<")),
        value(BinaryOperator::GreaterThan, tag(">")),
    ))
    .parse(input)
}

fn additive_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        value(BinaryOperator::Plus, char('+')),
        value(BinaryOperator::Minus, char('-')),
    ))
    .parse(input)
}

fn multiplicative_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        value(BinaryOperator::Multiply, char('*')),
        value(BinaryOperator::Divide, keyword("div")),
        value(BinaryOperator::Modulo, keyword("mod")),
    ))
    .parse(input)
}

fn union_op(input: &str) -> IResult<&str, BinaryOperator> {
    value(BinaryOperator::Union, char('|')).parse(input)
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
    let (i, negated) = opt(ws(char('-'))).parse(input)?;
    if negated.is_some() {
        let (i, expr) = unary_expr(i)?;
        return Ok((
            i,
            Expression::UnaryOp {
                op: UnaryOperator::Minus,
                expr: Box::new(expr),
            },
        ));
    }
    union_expr(i)
}

fn union_expr(input: &str) -> IResult<&str, Expression> {
    build_binary_expr_parser(path_expr, union_op)(input)
}

/// Handles the ambiguity between location paths and filter expressions that
/// continue as a path, e.g. `id('a')/b` or `(//a)[1]/b`.
fn path_expr(input: &str) -> IResult<&str, Expression> {
    // Primary expressions go first: `position()` would otherwise parse as a step named `position`.
    let (i, start_expr) = alt((
        filter_expr,
        map(location_path, Expression::LocationPath),
    ))
    .parse(input)?;

    let (i, remainder_steps) = many0(pair(alt((tag("//"), tag("/"))), step)).parse(i)?;

    if remainder_steps.is_empty() {
        return Ok((i, start_expr));
    }

    let (start_point, is_absolute, mut steps) = match start_expr {
        Expression::LocationPath(lp) => (lp.start_point, lp.is_absolute, lp.steps),
        other => (Some(Box::new(other)), false, vec![]),
    };
    append_steps(&mut steps, remainder_steps);

    Ok((
        i,
        Expression::LocationPath(LocationPath {
            start_point,
            is_absolute,
            steps,
        }),
    ))
}

fn append_steps(steps: &mut Vec<Step>, remainder: Vec<(&str, Step)>) {
    for (sep, next_step) in remainder {
        if sep == "//" {
            steps.push(Step::descendant_or_self());
        }
        steps.push(next_step);
    }
}

fn filter_expr(input: &str) -> IResult<&str, Expression> {
    let (i, primary) = primary_expr(input)?;
    let (i, predicates) = many0(predicate).parse(i)?;
    if predicates.is_empty() {
        Ok((i, primary))
    } else {
        Ok((
            i,
            Expression::Filter {
                expr: Box::new(primary),
                predicates,
            },
        ))
    }
}

fn primary_expr(input: &str) -> IResult<&str, Expression> {
    ws(alt((
        map(number, Expression::Number),
        map(string_literal, Expression::Literal),
        function_call,
        delimited(ws(char('(')), expression, ws(char(')'))),
    )))
    .parse(input)
}

// --- Literal Parsers ---

/// XPath numbers are plain decimals: no sign, exponent, `inf` or `nan`.
fn number(input: &str) -> IResult<&str, f64> {
    let (i, digits) = recognize(alt((
        recognize(pair(digit1, opt(pair(char('.'), digit0)))),
        recognize(pair(char('.'), digit1)),
    )))
    .parse(input)?;
    match digits.parse::<f64>() {
        Ok(n) => Ok((i, n)),
        Err(_) => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Float,
        ))),
    }
}

fn string_literal(input: &str) -> IResult<&str, String> {
    map(
        alt((
            delimited(char('\''), take_while(|c| c != '\''), char('\'')),
            delimited(char('"'), take_while(|c| c != '"'), char('"')),
        )),
        |s: &str| s.to_string(),
    )
    .parse(input)
}

// --- Name and NodeTest Parsers ---

fn nc_name(input: &str) -> IResult<&str, &str> {
    recognize(pair(take_while1(is_name_start), take_while(is_name_char))).parse(input)
}

fn q_name(input: &str) -> IResult<&str, String> {
    map(
        recognize(pair(nc_name, opt(pair(char(':'), nc_name)))),
        |s: &str| s.to_string(),
    )
    .parse(input)
}

fn node_type_test(input: &str) -> IResult<&str, NodeTest> {
    alt((
        map(
            terminated(
                alt((tag("text"), tag("node"), tag("comment"))),
                pair(ws(char('(')), char(')')),
            ),
            |node_type: &str| match node_type {
                "text" => NodeTest::NodeType(NodeTypeTest::Text),
                "comment" => NodeTest::NodeType(NodeTypeTest::Comment),
                _ => NodeTest::NodeType(NodeTypeTest::Node),
            },
        ),
        map(
            delimited(
                pair(tag("processing-instruction"), ws(char('('))),
                opt(ws(string_literal)),
                char(')'),
            ),
            |target| NodeTest::NodeType(NodeTypeTest::ProcessingInstruction(target)),
        ),
    ))
    .parse(input)
}

fn name_test(input: &str) -> IResult<&str, NodeTest> {
    let (i, first) = nc_name(input)?;
    if let Ok((rest, _)) = pair(char::<&str, nom::error::Error<&str>>(':'), char('*')).parse(i) {
        return Ok((rest, NodeTest::NamespaceWildcard(first.to_string())));
    }
    let (i, local) = opt(preceded(char(':'), nc_name)).parse(i)?;
    let test = match local {
        Some(local) => NameTest {
            prefix: Some(first.to_string()),
            local_part: local.to_string(),
        },
        None => NameTest::local(first),
    };
    Ok((i, NodeTest::Name(test)))
}

pub fn node_test(input: &str) -> IResult<&str, NodeTest> {
    alt((
        value(NodeTest::Wildcard, char('*')),
        node_type_test,
        name_test,
    ))
    .parse(input)
}

// --- Path Parsers ---

fn axis(input: &str) -> IResult<&str, Axis> {
    terminated(
        alt((
            value(Axis::AncestorOrSelf, tag("ancestor-or-self")),
            value(Axis::Ancestor, tag("ancestor")),
            value(Axis::Attribute, tag("attribute")),
            value(Axis::Child, tag("child")),
            value(Axis::DescendantOrSelf, tag("descendant-or-self")),
            value(Axis::Descendant, tag("descendant")),
            value(Axis::FollowingSibling, tag("following-sibling")),
            value(Axis::Following, tag("following")),
            value(Axis::Parent, tag("parent")),
            value(Axis::PrecedingSibling, tag("preceding-sibling")),
            value(Axis::Preceding, tag("preceding")),
            value(Axis::SelfAxis, tag("self")),
        )),
        ws(tag("::")),
    )
    .parse(input)
}

fn predicate(input: &str) -> IResult<&str, Expression> {
    delimited(ws(char('[')), expression, ws(char(']'))).parse(input)
}

fn step(input: &str) -> IResult<&str, Step> {
    let (i, (axis, node_test)) = alt((
        value(
            (Axis::Parent, NodeTest::NodeType(NodeTypeTest::Node)),
            tag(".."),
        ),
        value(
            (Axis::SelfAxis, NodeTest::NodeType(NodeTypeTest::Node)),
            char('.'),
        ),
        map(preceded(char('@'), node_test), |nt| (Axis::Attribute, nt)),
        map(pair(opt(axis), node_test), |(ax, nt)| {
            (ax.unwrap_or(Axis::Child), nt)
        }),
    ))
    .parse(input)?;
    let (i, predicates) = many0(predicate).parse(i)?;
    Ok((
        i,
        Step {
            axis,
            node_test,
            predicates,
        },
    ))
}

fn location_path(input: &str) -> IResult<&str, LocationPath> {
    let (i, is_absolute, mut steps) = if let Some(rem) = input.strip_prefix("//") {
        let (rem, first) = step(rem)?;
        (rem, true, vec![Step::descendant_or_self(), first])
    } else if let Some(rem) = input.strip_prefix('/') {
        match step(rem) {
            Ok((rem, first)) => (rem, true, vec![first]),
            // A lone "/" selects the root.
            Err(_) => (rem, true, vec![]),
        }
    } else {
        let (rem, first) = step(input)?;
        (rem, false, vec![first])
    };

    let (i, remainder) = if steps.is_empty() {
        (i, Vec::new())
    } else {
        many0(pair(alt((tag("//"), tag("/"))), step)).parse(i)?
    };
    append_steps(&mut steps, remainder);

    Ok((
        i,
        LocationPath {
            start_point: None,
            is_absolute,
            steps,
        },
    ))
}

// --- Function Call Parser ---

fn function_call(input: &str) -> IResult<&str, Expression> {
    // A QName followed by '('. The lookahead keeps `foo` in `foo/bar` a step.
    let (i, name) = q_name(input)?;
    let (i, _) = peek(ws(char('('))).parse(i)?;

    // Node-type tests like text() are handled by the step parser.
    if matches!(
        name.as_str(),
        "text" | "node" | "comment" | "processing-instruction"
    ) {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Verify,
        )));
    }

    let (i, _) = multispace0(i)?;
    let (i, args) = delimited(
        char('('),
        separated_list0(ws(char(',')), ws(expression)),
        char(')'),
    )
    .parse(i)?;

    Ok((i, Expression::FunctionCall { name, args }))
}

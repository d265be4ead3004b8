//! The XPath 1.0 core function library.

use super::engine::{EvaluationContext, XPathValue, string_to_number};
use crate::datasource::{DataSourceNode, NodeType, XML_NAMESPACE};
use crate::error::XPathError;

type FnResult<N> = Result<XPathValue<N>, XPathError>;

/// Dispatches a function call to the correct implementation.
pub fn evaluate_function<'a, 'd, N: DataSourceNode<'a>>(
    name: &str,
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, 'd, N>,
) -> FnResult<N> {
    let args = Args::new(name, args);
    match name {
        // Node-set
        "last" => args.exactly(0).map(|_| XPathValue::Number(e_ctx.context_size as f64)),
        "position" => args
            .exactly(0)
            .map(|_| XPathValue::Number(e_ctx.context_position as f64)),
        "count" => func_count(args),
        "id" => func_id(args, e_ctx),
        "local-name" => func_node_name(args, e_ctx, |n| {
            n.name().map(|q| q.local_part.to_string()).unwrap_or_default()
        }),
        "namespace-uri" => func_node_name(args, e_ctx, |n| {
            n.namespace_uri().unwrap_or_default().to_string()
        }),
        "name" => func_node_name(args, e_ctx, |n| {
            n.name().map(|q| q.to_string()).unwrap_or_default()
        }),

        // String
        "string" => {
            let s = args.optional_string(e_ctx)?;
            Ok(XPathValue::String(s))
        }
        "concat" => func_concat(args),
        "starts-with" => {
            let [s, prefix] = args.strings::<2>()?;
            Ok(XPathValue::Boolean(s.starts_with(&prefix)))
        }
        "contains" => {
            let [s, needle] = args.strings::<2>()?;
            Ok(XPathValue::Boolean(s.contains(&needle)))
        }
        "substring-before" => {
            let [s, sep] = args.strings::<2>()?;
            let before = s.find(&sep).map(|i| &s[..i]).unwrap_or_default();
            Ok(XPathValue::String(before.to_string()))
        }
        "substring-after" => {
            let [s, sep] = args.strings::<2>()?;
            let after = s.find(&sep).map(|i| &s[i + sep.len()..]).unwrap_or_default();
            Ok(XPathValue::String(after.to_string()))
        }
        "substring" => func_substring(args),
        "string-length" => {
            let s = args.optional_string(e_ctx)?;
            Ok(XPathValue::Number(s.chars().count() as f64))
        }
        "normalize-space" => {
            let s = args.optional_string(e_ctx)?;
            Ok(XPathValue::String(
                s.split_whitespace().collect::<Vec<_>>().join(" "),
            ))
        }
        "translate" => func_translate(args),

        // Boolean
        "boolean" => Ok(XPathValue::Boolean(args.single()?.to_bool())),
        "not" => Ok(XPathValue::Boolean(!args.single()?.to_bool())),
        "true" => args.exactly(0).map(|_| XPathValue::Boolean(true)),
        "false" => args.exactly(0).map(|_| XPathValue::Boolean(false)),
        "lang" => func_lang(args, e_ctx),

        // Number
        "number" => {
            let n = match args.optional()? {
                Some(value) => value.to_number(),
                None => string_to_number(&e_ctx.context_node.string_value()),
            };
            Ok(XPathValue::Number(n))
        }
        "sum" => func_sum(args),
        "floor" => Ok(XPathValue::Number(args.single()?.to_number().floor())),
        "ceiling" => Ok(XPathValue::Number(args.single()?.to_number().ceil())),
        "round" => Ok(XPathValue::Number(round(args.single()?.to_number()))),

        _ => Err(XPathError::function(name, "Unknown XPath function")),
    }
}

/// Evaluated arguments together with the name of the function they belong to,
/// so arity errors can name it.
struct Args<'n, N> {
    function: &'n str,
    values: Vec<XPathValue<N>>,
}

impl<'n, 'a, N: DataSourceNode<'a>> Args<'n, N> {
    fn new(function: &'n str, values: Vec<XPathValue<N>>) -> Self {
        Self { function, values }
    }

    fn arity_error(&self, expected: &str) -> XPathError {
        XPathError::function(
            self.function,
            format!("Expected {}, got {}", expected, self.values.len()),
        )
    }

    fn exactly(self, n: usize) -> Result<Vec<XPathValue<N>>, XPathError> {
        if self.values.len() != n {
            let plural = if n == 1 { "" } else { "s" };
            return Err(self.arity_error(&format!("{} argument{}", n, plural)));
        }
        Ok(self.values)
    }

    fn single(self) -> Result<XPathValue<N>, XPathError> {
        let mut values = self.exactly(1)?;
        Ok(values.remove(0))
    }

    fn optional(mut self) -> Result<Option<XPathValue<N>>, XPathError> {
        match self.values.len() {
            0 => Ok(None),
            1 => Ok(self.values.pop()),
            _ => Err(self.arity_error("0 or 1 arguments")),
        }
    }

    /// The string value of the only argument, or of the context node.
    fn optional_string(self, e_ctx: &EvaluationContext<'a, '_, N>) -> Result<String, XPathError> {
        Ok(match self.optional()? {
            Some(value) => value.to_string(),
            None => e_ctx.context_node.string_value(),
        })
    }

    fn strings<const K: usize>(self) -> Result<[String; K], XPathError> {
        let values = self.exactly(K)?;
        let strings: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        strings
            .try_into()
            .map_err(|_| XPathError::TypeError("argument count mismatch".to_string()))
    }
}

fn func_count<'a, N: DataSourceNode<'a>>(args: Args<'_, N>) -> FnResult<N> {
    match args.single()? {
        XPathValue::NodeSet(nodes) => Ok(XPathValue::Number(nodes.len() as f64)),
        _ => Err(XPathError::function("count", "Argument must be a node-set")),
    }
}

/// Selects elements whose `id` attribute matches any whitespace separated token.
fn func_id<'a, 'd, N: DataSourceNode<'a>>(
    args: Args<'_, N>,
    e_ctx: &EvaluationContext<'a, 'd, N>,
) -> FnResult<N> {
    let tokens: Vec<String> = match args.single()? {
        XPathValue::NodeSet(nodes) => nodes
            .iter()
            .flat_map(|n| {
                n.string_value()
                    .split_whitespace()
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect(),
        other => other
            .to_string()
            .split_whitespace()
            .map(str::to_string)
            .collect(),
    };
    let mut found = Vec::new();
    let mut stack = vec![e_ctx.root_node];
    while let Some(node) = stack.pop() {
        if node.node_type() == NodeType::Element {
            let matched = node.attributes().any(|attr| {
                attr.name().is_some_and(|q| q.local_part == "id" && q.prefix.is_none())
                    && tokens.contains(&attr.string_value())
            });
            if matched {
                found.push(node);
            }
        }
        stack.extend(node.children());
    }
    found.sort();
    Ok(XPathValue::NodeSet(found))
}

fn func_node_name<'a, 'd, N, F>(
    args: Args<'_, N>,
    e_ctx: &EvaluationContext<'a, 'd, N>,
    extract: F,
) -> FnResult<N>
where
    N: DataSourceNode<'a>,
    F: Fn(&N) -> String,
{
    let function = args.function.to_string();
    let node = match args.optional()? {
        None => Some(e_ctx.context_node),
        Some(XPathValue::NodeSet(nodes)) => nodes.first().copied(),
        Some(_) => return Err(XPathError::function(&function, "Argument must be a node-set")),
    };
    Ok(XPathValue::String(node.map(|n| extract(&n)).unwrap_or_default()))
}

fn func_concat<'a, N: DataSourceNode<'a>>(args: Args<'_, N>) -> FnResult<N> {
    if args.values.len() < 2 {
        return Err(args.arity_error("at least 2 arguments"));
    }
    Ok(XPathValue::String(
        args.values.iter().map(|v| v.to_string()).collect(),
    ))
}

fn func_substring<'a, N: DataSourceNode<'a>>(args: Args<'_, N>) -> FnResult<N> {
    if !(2..=3).contains(&args.values.len()) {
        return Err(args.arity_error("2 or 3 arguments"));
    }
    let mut values = args.values;
    let length = if values.len() == 3 {
        Some(values.remove(2).to_number())
    } else {
        None
    };
    let start = round(values.remove(1).to_number());
    let s = values.remove(0).to_string();
    let end = length.map(|l| start + round(l)).unwrap_or(f64::INFINITY);

    // Positions are 1-based; NaN comparisons fail and select nothing.
    let result = s
        .chars()
        .enumerate()
        .filter(|(i, _)| {
            let pos = (*i + 1) as f64;
            pos >= start && pos < end
        })
        .map(|(_, c)| c)
        .collect::<String>();
    Ok(XPathValue::String(result))
}

fn func_translate<'a, N: DataSourceNode<'a>>(args: Args<'_, N>) -> FnResult<N> {
    let [source, from, to] = args.strings::<3>()?;
    let from: Vec<char> = from.chars().collect();
    let to: Vec<char> = to.chars().collect();
    let result = source
        .chars()
        .filter_map(|c| match from.iter().position(|&fc| fc == c) {
            Some(pos) => to.get(pos).copied(),
            None => Some(c),
        })
        .collect::<String>();
    Ok(XPathValue::String(result))
}

fn func_lang<'a, 'd, N: DataSourceNode<'a>>(
    args: Args<'_, N>,
    e_ctx: &EvaluationContext<'a, 'd, N>,
) -> FnResult<N> {
    let wanted = args.single()?.to_string().to_lowercase();
    let mut current = Some(e_ctx.context_node);
    if current.is_some_and(|n| n.node_type() != NodeType::Element) {
        current = current.and_then(|n| n.parent());
    }

    while let Some(node) = current {
        let lang = node.attributes().find(|attr| {
            attr.name().is_some_and(|q| q.local_part == "lang")
                && attr.namespace_uri() == Some(XML_NAMESPACE)
        });
        if let Some(attr) = lang {
            let lang = attr.string_value().to_lowercase();
            // "en" matches "en-GB"; the nearest xml:lang wins.
            let matched = lang == wanted || lang.starts_with(&format!("{}-", wanted));
            return Ok(XPathValue::Boolean(matched));
        }
        current = node.parent();
    }
    Ok(XPathValue::Boolean(false))
}

fn func_sum<'a, N: DataSourceNode<'a>>(args: Args<'_, N>) -> FnResult<N> {
    match args.single()? {
        XPathValue::NodeSet(nodes) => Ok(XPathValue::Number(
            nodes
                .iter()
                .map(|node| string_to_number(&node.string_value()))
                .sum(),
        )),
        _ => Err(XPathError::function("sum", "Argument must be a node-set")),
    }
}

/// XPath rounding: halves go towards positive infinity.
fn round(n: f64) -> f64 {
    if n.is_nan() || n.is_infinite() || n == 0.0 {
        n
    } else {
        (n + 0.5).floor()
    }
}

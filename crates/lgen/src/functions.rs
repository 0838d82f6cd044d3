//! The builtin function table.
//!
//! Call names resolve in a fixed order: custom functions from the
//! [`EngineConfig`](crate::EngineConfig), then this table, then templates
//! of the combined set, then the engine-level functions (`template`,
//! `fromFile`, `isTemplate`, `ActivityAttachment`) handled by the
//! evaluator itself.

use indexmap::IndexMap;
use lgen_core::Value;

use crate::document::Template;

pub(crate) type BuiltinFn = fn(&[Value]) -> Result<Value, String>;

/// Look up a builtin by name.
pub(crate) fn builtin(name: &str) -> Option<BuiltinFn> {
    Some(match name {
        "length" | "count" => fn_length,
        "join" => fn_join,
        "concat" => fn_concat,
        "toUpper" => fn_to_upper,
        "toLower" => fn_to_lower,
        "trim" => fn_trim,
        "string" => fn_string,
        "int" => fn_int,
        "float" => fn_float,
        "if" => fn_if,
        _ => return None,
    })
}

/// Whether `name` is handled by the evaluator itself.
pub(crate) fn is_engine_function(name: &str) -> bool {
    matches!(
        name,
        "template" | "fromFile" | "isTemplate" | "ActivityAttachment"
    )
}

/// Resolve a call name to a template of the set: the bare name, the name
/// without a trailing `!` re-execution marker, or the name without an
/// `lg.` prefix.
pub(crate) fn resolve_template_name(
    name: &str,
    templates: &IndexMap<String, Template>,
) -> Option<String> {
    let base = name.strip_suffix('!').unwrap_or(name);
    if templates.contains_key(base) {
        return Some(base.to_string());
    }
    let stripped = base.strip_prefix("lg.")?;
    templates
        .contains_key(stripped)
        .then(|| stripped.to_string())
}

fn require(args: &[Value], name: &str, count: usize) -> Result<(), String> {
    if args.len() == count {
        Ok(())
    } else {
        Err(format!(
            "{} expects {} argument(s), got {}",
            name,
            count,
            args.len()
        ))
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) | Value::Tagged { .. } => "an object",
    }
}

fn fn_length(args: &[Value]) -> Result<Value, String> {
    require(args, "length", 1)?;
    let length = match &args[0] {
        Value::String(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        Value::Object(fields) | Value::Tagged { fields, .. } => fields.len(),
        other => return Err(format!("length is not defined for {}", kind_name(other))),
    };
    Ok(Value::Number(length as f64))
}

fn fn_join(args: &[Value]) -> Result<Value, String> {
    require(args, "join", 2)?;
    let Value::Array(items) = &args[0] else {
        return Err(format!(
            "join expects an array, got {}",
            kind_name(&args[0])
        ));
    };
    let separator = args[1].to_string();
    let rendered: Vec<String> = items.iter().map(Value::to_string).collect();
    Ok(Value::String(rendered.join(&separator)))
}

/// Array concatenation when every argument is an array, string
/// concatenation of the rendered forms otherwise.
fn fn_concat(args: &[Value]) -> Result<Value, String> {
    if !args.is_empty() && args.iter().all(|value| matches!(value, Value::Array(_))) {
        let mut items = Vec::new();
        for arg in args {
            if let Value::Array(more) = arg {
                items.extend(more.iter().cloned());
            }
        }
        return Ok(Value::Array(items));
    }
    Ok(Value::String(args.iter().map(Value::to_string).collect()))
}

fn fn_to_upper(args: &[Value]) -> Result<Value, String> {
    require(args, "toUpper", 1)?;
    Ok(Value::String(args[0].to_string().to_uppercase()))
}

fn fn_to_lower(args: &[Value]) -> Result<Value, String> {
    require(args, "toLower", 1)?;
    Ok(Value::String(args[0].to_string().to_lowercase()))
}

fn fn_trim(args: &[Value]) -> Result<Value, String> {
    require(args, "trim", 1)?;
    Ok(Value::String(args[0].to_string().trim().to_string()))
}

fn fn_string(args: &[Value]) -> Result<Value, String> {
    require(args, "string", 1)?;
    Ok(Value::String(args[0].to_string()))
}

fn fn_int(args: &[Value]) -> Result<Value, String> {
    require(args, "int", 1)?;
    match &args[0] {
        Value::Number(n) => Ok(Value::Number(n.trunc())),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(|n| Value::Number(n.trunc()))
            .map_err(|_| format!("cannot convert `{}` to int", s)),
        other => Err(format!("cannot convert {} to int", kind_name(other))),
    }
}

fn fn_float(args: &[Value]) -> Result<Value, String> {
    require(args, "float", 1)?;
    match &args[0] {
        Value::Number(n) => Ok(Value::Number(*n)),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Number)
            .map_err(|_| format!("cannot convert `{}` to float", s)),
        other => Err(format!("cannot convert {} to float", kind_name(other))),
    }
}

fn fn_if(args: &[Value]) -> Result<Value, String> {
    require(args, "if", 3)?;
    Ok(if args[0].is_truthy() {
        args[1].clone()
    } else {
        args[2].clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_variants() {
        assert_eq!(
            fn_length(&[Value::string("héllo")]),
            Ok(Value::Number(5.0))
        );
        assert_eq!(
            fn_length(&[Value::Array(vec![Value::Null, Value::Null])]),
            Ok(Value::Number(2.0))
        );
        assert!(fn_length(&[Value::Bool(true)]).is_err());
    }

    #[test]
    fn test_join_renders_elements() {
        let items = Value::Array(vec![
            Value::Number(1.0),
            Value::string("two"),
            Value::Null,
        ]);
        assert_eq!(
            fn_join(&[items, Value::string(", ")]),
            Ok(Value::string("1, two, "))
        );
    }

    #[test]
    fn test_concat_arrays_vs_strings() {
        let arrays = [
            Value::Array(vec![Value::Number(1.0)]),
            Value::Array(vec![Value::Number(2.0)]),
        ];
        assert_eq!(
            fn_concat(&arrays),
            Ok(Value::Array(vec![Value::Number(1.0), Value::Number(2.0)]))
        );
        assert_eq!(
            fn_concat(&[Value::string("a"), Value::Number(1.0)]),
            Ok(Value::string("a1"))
        );
    }

    #[test]
    fn test_int_truncates() {
        assert_eq!(fn_int(&[Value::Number(3.9)]), Ok(Value::Number(3.0)));
        assert_eq!(fn_int(&[Value::string(" 42 ")]), Ok(Value::Number(42.0)));
        assert!(fn_int(&[Value::string("nope")]).is_err());
    }

    #[test]
    fn test_if_selects_branch() {
        assert_eq!(
            fn_if(&[Value::Bool(false), Value::string("a"), Value::string("b")]),
            Ok(Value::string("b"))
        );
        assert_eq!(
            fn_if(&[Value::Number(0.0), Value::string("a"), Value::string("b")]),
            Ok(Value::string("a"))
        );
    }

    #[test]
    fn test_wrong_arity_is_reported() {
        let err = fn_trim(&[]).unwrap_err();
        assert!(err.contains("trim expects 1"));
    }
}

//! Scope-aware template evaluation.
//!
//! Evaluation is deterministic: a text body always produces its first
//! alternative. Unless strict mode is on, recoverable expression failures
//! degrade to null (rendering as the empty string); structural failures
//! such as a missing template or wrong arity always propagate.

use std::{fs, path::Path};

use indexmap::IndexMap;
use lgen_core::{Scope, Value};
use lgen_parser::{
    ast::{Alternative, CondBranch, Segment, SwitchBody, TemplateBody},
    expr::{BinaryOp, ExprKind, Expression, Lit, UnaryOp},
    parse_segments,
};
use log::trace;

use crate::{config::EngineConfig, document::Template, error::LgenError, functions};

pub(crate) struct Evaluator<'e> {
    templates: &'e IndexMap<String, Template>,
    config: &'e EngineConfig,
    strict: bool,
    stack: Vec<&'e Template>,
}

impl<'e> Evaluator<'e> {
    pub(crate) fn new(
        templates: &'e IndexMap<String, Template>,
        config: &'e EngineConfig,
        strict: bool,
    ) -> Self {
        Evaluator {
            templates,
            config,
            strict,
            stack: Vec::new(),
        }
    }

    pub(crate) fn evaluate(&mut self, name: &str, scope: &Scope<'_>) -> Result<Value, LgenError> {
        let template = self.lookup(name)?;
        self.eval_template(template, scope)
    }

    pub(crate) fn templates(&self) -> &'e IndexMap<String, Template> {
        self.templates
    }

    pub(crate) fn lookup(&self, name: &str) -> Result<&'e Template, LgenError> {
        self.templates
            .get(name)
            .ok_or_else(|| LgenError::TemplateNotFound(name.to_string()))
    }

    pub(crate) fn enter(&mut self, template: &'e Template) -> Result<(), LgenError> {
        if self.stack.len() >= self.config.max_depth() {
            return Err(LgenError::RecursionLimitExceeded {
                template: template.name.clone(),
                limit: self.config.max_depth(),
            });
        }
        self.stack.push(template);
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.stack.pop();
    }

    fn eval_template(
        &mut self,
        template: &'e Template,
        scope: &Scope<'_>,
    ) -> Result<Value, LgenError> {
        self.enter(template)?;
        trace!(template = template.name.as_str(), depth = self.stack.len(); "Evaluating template");
        let result = self.eval_body(&template.body, scope);
        self.leave();
        result
    }

    fn eval_body(&mut self, body: &TemplateBody, scope: &Scope<'_>) -> Result<Value, LgenError> {
        match body {
            TemplateBody::Text(alternatives) => self.eval_first(alternatives, scope),
            TemplateBody::Conditional(branches) => self.eval_conditional(branches, scope),
            TemplateBody::Switch(switch) => self.eval_switch(switch, scope),
            TemplateBody::Structured(structured) => {
                let mut fields = IndexMap::new();
                for (key, alternatives) in &structured.bindings {
                    fields.insert(key.clone(), self.eval_first(alternatives, scope)?);
                }
                Ok(Value::Tagged {
                    tag: structured.type_name.clone(),
                    fields,
                })
            }
        }
    }

    /// Deterministic choice: always the first alternative.
    fn eval_first(
        &mut self,
        alternatives: &[Alternative],
        scope: &Scope<'_>,
    ) -> Result<Value, LgenError> {
        match alternatives.first() {
            Some(alternative) => self.eval_alternative(alternative, scope),
            None => Ok(Value::Null),
        }
    }

    fn eval_conditional(
        &mut self,
        branches: &[CondBranch],
        scope: &Scope<'_>,
    ) -> Result<Value, LgenError> {
        for branch in branches {
            let taken = match &branch.condition {
                Some(condition) => self.eval_condition(condition, scope)?,
                None => true,
            };
            if taken {
                return self.eval_first(&branch.body, scope);
            }
        }
        Ok(Value::Null)
    }

    fn eval_switch(&mut self, switch: &SwitchBody, scope: &Scope<'_>) -> Result<Value, LgenError> {
        let subject = match &switch.subject {
            Some(subject) => self.eval_expression(subject, scope)?,
            None => Value::Null,
        };
        for case in &switch.cases {
            if let Some(matcher) = &case.matcher {
                if self.eval_expression(matcher, scope)? == subject {
                    return self.eval_first(&case.body, scope);
                }
            }
        }
        match &switch.default {
            Some(default) => self.eval_first(default, scope),
            None => Ok(Value::Null),
        }
    }

    /// A single-expression alternative returns the raw value; anything
    /// else renders to a string.
    pub(crate) fn eval_alternative(
        &mut self,
        alternative: &Alternative,
        scope: &Scope<'_>,
    ) -> Result<Value, LgenError> {
        if let [Segment::Expr(expression)] = alternative.segments.as_slice() {
            return self.eval_expression(expression, scope);
        }
        let mut out = String::new();
        for segment in &alternative.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Expr(expression) => {
                    let value = self.eval_expression(expression, scope)?;
                    out.push_str(&value.to_string());
                }
            }
        }
        Ok(Value::String(out))
    }

    /// Evaluate an embedded expression, degrading recoverable failures to
    /// null when strict mode is off.
    pub(crate) fn eval_expression(
        &mut self,
        expression: &Expression,
        scope: &Scope<'_>,
    ) -> Result<Value, LgenError> {
        match self.eval_kind(expression.kind(), scope) {
            Err(err) if !self.strict && err.is_degradable() => {
                trace!(expression = expression.text(); "Expression degraded to null");
                Ok(Value::Null)
            }
            other => other,
        }
    }

    fn eval_condition(
        &mut self,
        condition: &Expression,
        scope: &Scope<'_>,
    ) -> Result<bool, LgenError> {
        match self.eval_kind(condition.kind(), scope) {
            Ok(value) => {
                if self.strict && value.is_null() {
                    return Err(self.fail(format!(
                        "condition `{}` evaluated to null",
                        condition.text()
                    )));
                }
                Ok(value.is_truthy())
            }
            Err(err) if !self.strict && err.is_degradable() => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn fail(&self, message: String) -> LgenError {
        let template = self
            .stack
            .last()
            .map(|template| template.name.clone())
            .unwrap_or_default();
        LgenError::Eval { template, message }
    }

    fn eval_kind(&mut self, kind: &ExprKind, scope: &Scope<'_>) -> Result<Value, LgenError> {
        match kind {
            ExprKind::Literal(lit) => Ok(literal(lit)),
            ExprKind::Var(name) => match scope.get(name) {
                Some(value) => Ok(value.clone()),
                None => Err(self.fail(format!("undefined variable `{}`", name))),
            },
            ExprKind::Member(base, field) => {
                let base = self.eval_kind(base, scope)?;
                match base.field(field) {
                    Some(value) => Ok(value.clone()),
                    None => Err(self.fail(format!("no property `{}`", field))),
                }
            }
            ExprKind::Index(base, index) => {
                let base = self.eval_kind(base, scope)?;
                let index = self.eval_kind(index, scope)?;
                self.eval_index(&base, &index)
            }
            ExprKind::Unary { op, operand } => {
                let value = self.eval_kind(operand, scope)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
                    UnaryOp::Neg => match value.as_number() {
                        Some(n) => Ok(Value::Number(-n)),
                        None => Err(self.fail("cannot negate a non-number".to_string())),
                    },
                }
            }
            ExprKind::Binary { op, left, right } => self.eval_binary(*op, left, right, scope),
            ExprKind::Call { name, args } => self.eval_call(name, args, scope),
        }
    }

    fn eval_index(&self, base: &Value, index: &Value) -> Result<Value, LgenError> {
        match (base, index) {
            (Value::Array(items), Value::Number(n)) => {
                let i = *n as usize;
                if n.fract() == 0.0 && *n >= 0.0 && i < items.len() {
                    Ok(items[i].clone())
                } else {
                    Err(self.fail(format!(
                        "index {} out of bounds ({} items)",
                        n,
                        items.len()
                    )))
                }
            }
            (Value::Object(_) | Value::Tagged { .. }, Value::String(key)) => {
                match base.field(key) {
                    Some(value) => Ok(value.clone()),
                    None => Err(self.fail(format!("no property `{}`", key))),
                }
            }
            _ => Err(self.fail("value is not indexable".to_string())),
        }
    }

    fn eval_binary(
        &mut self,
        op: BinaryOp,
        left: &ExprKind,
        right: &ExprKind,
        scope: &Scope<'_>,
    ) -> Result<Value, LgenError> {
        if matches!(op, BinaryOp::And | BinaryOp::Or) {
            let left = self.eval_kind(left, scope)?.is_truthy();
            let short_circuit = match op {
                BinaryOp::And => !left,
                _ => left,
            };
            if short_circuit {
                return Ok(Value::Bool(left));
            }
            return Ok(Value::Bool(self.eval_kind(right, scope)?.is_truthy()));
        }

        let left = self.eval_kind(left, scope)?;
        let right = self.eval_kind(right, scope)?;
        match op {
            BinaryOp::Eq => Ok(Value::Bool(left == right)),
            BinaryOp::Ne => Ok(Value::Bool(left != right)),
            BinaryOp::Add => match (&left, &right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(_), _) | (_, Value::String(_)) => {
                    Ok(Value::String(format!("{}{}", left, right)))
                }
                _ => Err(self.fail("operands of `+` must be numbers or strings".to_string())),
            },
            BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                let (Some(a), Some(b)) = (left.as_number(), right.as_number()) else {
                    return Err(self.fail("arithmetic operands must be numbers".to_string()));
                };
                match op {
                    BinaryOp::Sub => Ok(Value::Number(a - b)),
                    BinaryOp::Mul => Ok(Value::Number(a * b)),
                    BinaryOp::Div if b == 0.0 => {
                        Err(self.fail("division by zero".to_string()))
                    }
                    BinaryOp::Div => Ok(Value::Number(a / b)),
                    BinaryOp::Mod if b == 0.0 => {
                        Err(self.fail("division by zero".to_string()))
                    }
                    _ => Ok(Value::Number(a % b)),
                }
            }
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                let ordering = match (&left, &right) {
                    (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
                    (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
                    _ => None,
                };
                let Some(ordering) = ordering else {
                    return Err(self.fail(
                        "comparison operands must both be numbers or both be strings".to_string(),
                    ));
                };
                let result = match op {
                    BinaryOp::Lt => ordering.is_lt(),
                    BinaryOp::Le => ordering.is_le(),
                    BinaryOp::Gt => ordering.is_gt(),
                    _ => ordering.is_ge(),
                };
                Ok(Value::Bool(result))
            }
            BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
        }
    }

    fn eval_call(
        &mut self,
        name: &str,
        args: &[ExprKind],
        scope: &Scope<'_>,
    ) -> Result<Value, LgenError> {
        let config = self.config;
        if let Some(function) = config.function(name) {
            let function = function.clone();
            let values = self.eval_args(args, scope)?;
            return function(&values).map_err(|message| self.fail(message));
        }
        if let Some(function) = functions::builtin(name) {
            let values = self.eval_args(args, scope)?;
            return function(&values).map_err(|message| self.fail(message));
        }
        if let Some(target) = functions::resolve_template_name(name, self.templates) {
            return self.call_template(&target, args, scope);
        }
        match name {
            "template" => {
                let [first, rest @ ..] = args else {
                    return Err(self.fail("template() expects a template name".to_string()));
                };
                let value = self.eval_kind(first, scope)?;
                let Some(target) = value.as_str().map(str::to_string) else {
                    return Err(self.fail("template() name must be a string".to_string()));
                };
                self.call_template(&target, rest, scope)
            }
            "fromFile" => self.eval_from_file(args, scope),
            "isTemplate" => {
                let values = self.eval_args(args, scope)?;
                let [Value::String(target)] = values.as_slice() else {
                    return Err(self.fail("isTemplate() expects a template name".to_string()));
                };
                Ok(Value::Bool(self.templates.contains_key(target)))
            }
            "ActivityAttachment" => {
                let values = self.eval_args(args, scope)?;
                let [content, Value::String(content_type)] = values.as_slice() else {
                    return Err(self.fail(
                        "ActivityAttachment() expects content and a content type".to_string(),
                    ));
                };
                let mut fields = IndexMap::new();
                fields.insert(
                    "contenttype".to_string(),
                    Value::string(content_type.clone()),
                );
                fields.insert("content".to_string(), content.clone());
                Ok(Value::Tagged {
                    tag: "attachment".to_string(),
                    fields,
                })
            }
            _ => Err(self.fail(format!("unknown function `{}`", name))),
        }
    }

    /// Invoke a template by name. A zero-argument call shares the
    /// caller's scope; otherwise the argument count must match the
    /// parameter list exactly.
    fn call_template(
        &mut self,
        name: &str,
        args: &[ExprKind],
        scope: &Scope<'_>,
    ) -> Result<Value, LgenError> {
        let template = self.lookup(name)?;
        if args.is_empty() {
            return self.eval_template(template, scope);
        }
        if args.len() != template.parameters.len() {
            return Err(LgenError::ArgumentMismatch {
                template: name.to_string(),
                expected: template.parameters.len(),
                actual: args.len(),
            });
        }
        let frame = self.eval_frame(&template.parameters, args, scope)?;
        let child = scope.child(frame);
        self.eval_template(template, &child)
    }

    /// Bind formal parameters to evaluated arguments.
    pub(crate) fn eval_frame(
        &mut self,
        parameters: &[String],
        args: &[ExprKind],
        scope: &Scope<'_>,
    ) -> Result<IndexMap<String, Value>, LgenError> {
        let mut frame = IndexMap::new();
        for (parameter, arg) in parameters.iter().zip(args) {
            let value = match self.eval_kind(arg, scope) {
                Err(err) if !self.strict && err.is_degradable() => Value::Null,
                other => other?,
            };
            frame.insert(parameter.clone(), value);
        }
        Ok(frame)
    }

    fn eval_args(&mut self, args: &[ExprKind], scope: &Scope<'_>) -> Result<Vec<Value>, LgenError> {
        args.iter().map(|arg| self.eval_kind(arg, scope)).collect()
    }

    /// `fromFile(path)`: load a text file relative to the declaring
    /// document and evaluate its embedded expressions against the current
    /// scope.
    fn eval_from_file(&mut self, args: &[ExprKind], scope: &Scope<'_>) -> Result<Value, LgenError> {
        let values = self.eval_args(args, scope)?;
        let [Value::String(target)] = values.as_slice() else {
            return Err(self.fail("fromFile() expects a file path".to_string()));
        };
        let base = self
            .stack
            .last()
            .map(|template| template.source_id.clone())
            .unwrap_or_default();
        let path = {
            let target = Path::new(target);
            if target.is_absolute() {
                target.to_path_buf()
            } else {
                Path::new(&base)
                    .parent()
                    .map(|parent| parent.join(target))
                    .unwrap_or_else(|| target.to_path_buf())
            }
        };
        let content = fs::read_to_string(&path)
            .map_err(|err| self.fail(format!("fromFile(`{}`): {}", target, err)))?;
        let segments = parse_segments(&content)
            .map_err(|err| self.fail(format!("fromFile(`{}`): {}", target, err)))?;
        let mut out = String::new();
        for segment in &segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Expr(expression) => {
                    let value = self.eval_expression(expression, scope)?;
                    out.push_str(&value.to_string());
                }
            }
        }
        Ok(Value::String(out))
    }
}

fn literal(lit: &Lit) -> Value {
    match lit {
        Lit::Null => Value::Null,
        Lit::Bool(b) => Value::Bool(*b),
        Lit::Number(n) => Value::Number(*n),
        Lit::Str(s) => Value::String(s.clone()),
    }
}

//! Exhaustive expansion of template alternatives.
//!
//! Where evaluation picks one deterministic output, expansion enumerates
//! every output a template can produce: all text alternatives, every
//! conditional and switch branch (conditions are not consulted), and the
//! cartesian product across expansion points. Results come in declaration
//! order with the leftmost expansion point varying slowest.

use indexmap::IndexMap;
use lgen_core::{Scope, Value};
use lgen_parser::{
    ast::{Alternative, Segment, StructuredBody, TemplateBody},
    expr::{ExprKind, Expression, Lit},
};

use crate::{
    config::EngineConfig, document::Template, error::LgenError, eval::Evaluator, functions,
};

pub(crate) struct Expander<'e> {
    evaluator: Evaluator<'e>,
}

impl<'e> Expander<'e> {
    pub(crate) fn new(
        templates: &'e IndexMap<String, Template>,
        config: &'e EngineConfig,
        strict: bool,
    ) -> Self {
        Expander {
            evaluator: Evaluator::new(templates, config, strict),
        }
    }

    pub(crate) fn expand(
        &mut self,
        name: &str,
        scope: &Scope<'_>,
    ) -> Result<Vec<Value>, LgenError> {
        let template = self.evaluator.lookup(name)?;
        self.expand_template(template, scope)
    }

    fn expand_template(
        &mut self,
        template: &'e Template,
        scope: &Scope<'_>,
    ) -> Result<Vec<Value>, LgenError> {
        self.evaluator.enter(template)?;
        let result = self.expand_body(&template.body, scope);
        self.evaluator.leave();
        result
    }

    fn expand_body(
        &mut self,
        body: &TemplateBody,
        scope: &Scope<'_>,
    ) -> Result<Vec<Value>, LgenError> {
        match body {
            TemplateBody::Text(alternatives) => self.expand_alternatives(alternatives, scope),
            TemplateBody::Conditional(branches) => {
                // every branch contributes; conditions are not evaluated
                let mut results = Vec::new();
                for branch in branches {
                    results.extend(self.expand_alternatives(&branch.body, scope)?);
                }
                Ok(results)
            }
            TemplateBody::Switch(switch) => {
                let mut results = Vec::new();
                for case in &switch.cases {
                    results.extend(self.expand_alternatives(&case.body, scope)?);
                }
                if let Some(default) = &switch.default {
                    results.extend(self.expand_alternatives(default, scope)?);
                }
                Ok(results)
            }
            TemplateBody::Structured(structured) => self.expand_structured(structured, scope),
        }
    }

    fn expand_alternatives(
        &mut self,
        alternatives: &[Alternative],
        scope: &Scope<'_>,
    ) -> Result<Vec<Value>, LgenError> {
        let mut results = Vec::new();
        for alternative in alternatives {
            results.extend(self.expand_alternative(alternative, scope)?);
        }
        Ok(results)
    }

    fn expand_alternative(
        &mut self,
        alternative: &Alternative,
        scope: &Scope<'_>,
    ) -> Result<Vec<Value>, LgenError> {
        if let [Segment::Expr(expression)] = alternative.segments.as_slice() {
            return self.expand_expression(expression, scope);
        }
        let mut rendered = vec![String::new()];
        for segment in &alternative.segments {
            match segment {
                Segment::Text(text) => {
                    for prefix in &mut rendered {
                        prefix.push_str(text);
                    }
                }
                Segment::Expr(expression) => {
                    let values = self.expand_expression(expression, scope)?;
                    let mut next = Vec::with_capacity(rendered.len() * values.len());
                    for prefix in &rendered {
                        for value in &values {
                            next.push(format!("{}{}", prefix, value));
                        }
                    }
                    rendered = next;
                }
            }
        }
        Ok(rendered.into_iter().map(Value::String).collect())
    }

    /// A direct template call is an expansion point and multiplies the
    /// output; any other expression contributes its single evaluated
    /// value. That includes template calls nested inside a larger
    /// expression (`${toUpper(greet())}`): the inner call goes through
    /// the evaluator and yields the first alternative, so only a call
    /// that is the whole expression multiplies the output.
    fn expand_expression(
        &mut self,
        expression: &Expression,
        scope: &Scope<'_>,
    ) -> Result<Vec<Value>, LgenError> {
        if let ExprKind::Call { name, args } = expression.kind() {
            let templates = self.evaluator.templates();
            if let Some(target) = functions::resolve_template_name(name, templates) {
                return self.expand_call(&target, args, scope);
            }
            if name == "template" {
                if let Some(ExprKind::Literal(Lit::Str(target))) = args.first() {
                    let target = target.clone();
                    return self.expand_call(&target, &args[1..], scope);
                }
            }
        }
        Ok(vec![self.evaluator.eval_expression(expression, scope)?])
    }

    fn expand_call(
        &mut self,
        name: &str,
        args: &[ExprKind],
        scope: &Scope<'_>,
    ) -> Result<Vec<Value>, LgenError> {
        let template = self.evaluator.lookup(name)?;
        if args.is_empty() {
            return self.expand_template(template, scope);
        }
        if args.len() != template.parameters.len() {
            return Err(LgenError::ArgumentMismatch {
                template: name.to_string(),
                expected: template.parameters.len(),
                actual: args.len(),
            });
        }
        let frame = self.evaluator.eval_frame(&template.parameters, args, scope)?;
        let child = scope.child(frame);
        self.expand_template(template, &child)
    }

    /// Cartesian product over the binding values, binding order preserved
    /// and earlier keys varying slowest.
    fn expand_structured(
        &mut self,
        structured: &StructuredBody,
        scope: &Scope<'_>,
    ) -> Result<Vec<Value>, LgenError> {
        let mut results: Vec<IndexMap<String, Value>> = vec![IndexMap::new()];
        for (key, alternatives) in &structured.bindings {
            let values = self.expand_alternatives(alternatives, scope)?;
            let mut next = Vec::with_capacity(results.len() * values.len());
            for fields in &results {
                for value in &values {
                    let mut fields = fields.clone();
                    fields.insert(key.clone(), value.clone());
                    next.push(fields);
                }
            }
            results = next;
        }
        Ok(results
            .into_iter()
            .map(|fields| Value::Tagged {
                tag: structured.type_name.clone(),
                fields,
            })
            .collect())
    }
}

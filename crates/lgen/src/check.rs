//! Static checks over the merged template set.
//!
//! Checks run once at load time, after import resolution. Errors block
//! evaluation; warnings are advisory. Unknown template references are a
//! warning rather than an error so a document can be loaded, edited, and
//! inspected while a reference is dangling; invoking the missing template
//! still fails at evaluation time.

use indexmap::IndexMap;
use lgen_parser::{
    ast::TemplateBody,
    error::{Diagnostic, ErrorCode},
    expr::{ExprKind, Lit},
    position::Position,
};

use crate::{document::Template, functions};

pub(crate) fn check(templates: &IndexMap<String, Template>) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for template in templates.values() {
        check_body(template, &mut diagnostics);
        template.body.for_each_expression(&mut |expression| {
            expression.walk(&mut |kind| {
                if let ExprKind::Call { name, args } = kind {
                    check_call(template, name, args, templates, &mut diagnostics);
                }
            });
        });
    }
    diagnostics
}

fn check_body(template: &Template, diagnostics: &mut Vec<Diagnostic>) {
    match &template.body {
        TemplateBody::Structured(body) if body.bindings.is_empty() => {
            diagnostics.push(at_template(
                Diagnostic::error(format!(
                    "structured body of `{}` has no properties",
                    template.name
                ))
                .with_code(ErrorCode::E203),
                template,
            ));
        }
        TemplateBody::Switch(switch) if switch.cases.is_empty() => {
            diagnostics.push(at_template(
                Diagnostic::warning(format!(
                    "switch in `{}` has no CASE branches",
                    template.name
                ))
                .with_code(ErrorCode::W303),
                template,
            ));
        }
        _ => {}
    }
}

fn check_call(
    template: &Template,
    name: &str,
    args: &[ExprKind],
    templates: &IndexMap<String, Template>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if let Some(target) = functions::resolve_template_name(name, templates) {
        // zero arguments means "evaluate against the caller's scope"
        let expected = templates[&target].parameters.len();
        if !args.is_empty() && args.len() != expected {
            diagnostics.push(at_template(
                Diagnostic::error(format!(
                    "`{}` calls `{}` with {} argument(s), expected {}",
                    template.name,
                    target,
                    args.len(),
                    expected
                ))
                .with_code(ErrorCode::E202),
                template,
            ));
        }
        return;
    }

    if name == "template" {
        if let Some(ExprKind::Literal(Lit::Str(target))) = args.first() {
            match templates.get(target.as_str()) {
                Some(callee) => {
                    let supplied = args.len() - 1;
                    let expected = callee.parameters.len();
                    if supplied != 0 && supplied != expected {
                        diagnostics.push(at_template(
                            Diagnostic::error(format!(
                                "`{}` calls `{}` with {} argument(s), expected {}",
                                template.name, target, supplied, expected
                            ))
                            .with_code(ErrorCode::E202),
                            template,
                        ));
                    }
                }
                None => {
                    diagnostics.push(at_template(
                        Diagnostic::warning(format!(
                            "`{}` references unknown template `{}`",
                            template.name, target
                        ))
                        .with_code(ErrorCode::W301),
                        template,
                    ));
                }
            }
        }
        return;
    }

    if functions::builtin(name).is_some() || functions::is_engine_function(name) {
        return;
    }

    // a `!` marker or `lg.` prefix is template-call syntax
    if name.ends_with('!') || name.starts_with("lg.") {
        diagnostics.push(at_template(
            Diagnostic::warning(format!(
                "`{}` references unknown template `{}`",
                template.name,
                name.trim_start_matches("lg.").trim_end_matches('!')
            ))
            .with_code(ErrorCode::W301),
            template,
        ));
        return;
    }

    // may still be a custom function supplied at evaluation time
    diagnostics.push(at_template(
        Diagnostic::warning(format!(
            "`{}` calls unknown function `{}`",
            template.name, name
        ))
        .with_code(ErrorCode::W302),
        template,
    ));
}

fn at_template(diagnostic: Diagnostic, template: &Template) -> Diagnostic {
    diagnostic
        .with_position(Position::line_start(template.range.start))
        .with_document(template.source_id.clone())
}

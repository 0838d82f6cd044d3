//! Static analysis of variable and template usage.

use indexmap::{IndexMap, IndexSet};
use lgen_parser::expr::{ExprKind, Lit};

use crate::{document::Template, error::LgenError, functions};

/// The free variables and templates a template transitively depends on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnalyzerResult {
    /// Free variable paths in first-use order. Formal parameters of the
    /// visited templates are excluded.
    pub variables: Vec<String>,
    /// Referenced template names in first-use order, including names only
    /// reachable through `template("...")` with a literal argument.
    pub template_references: Vec<String>,
}

pub(crate) fn analyze(
    templates: &IndexMap<String, Template>,
    name: &str,
) -> Result<AnalyzerResult, LgenError> {
    let Some(template) = templates.get(name) else {
        return Err(LgenError::TemplateNotFound(name.to_string()));
    };
    let mut variables = IndexSet::new();
    let mut references = IndexSet::new();
    let mut visited = IndexSet::new();
    visit(templates, template, &mut variables, &mut references, &mut visited);
    Ok(AnalyzerResult {
        variables: variables.into_iter().collect(),
        template_references: references.into_iter().collect(),
    })
}

fn visit(
    templates: &IndexMap<String, Template>,
    template: &Template,
    variables: &mut IndexSet<String>,
    references: &mut IndexSet<String>,
    visited: &mut IndexSet<String>,
) {
    if !visited.insert(template.name.clone()) {
        return;
    }
    let mut local_references = IndexSet::new();
    template.body.for_each_expression(&mut |expression| {
        collect(
            expression.kind(),
            &template.parameters,
            templates,
            variables,
            &mut local_references,
        );
    });
    for reference in local_references {
        references.insert(reference.clone());
        if let Some(next) = templates.get(&reference) {
            visit(templates, next, variables, references, visited);
        }
    }
}

fn collect(
    kind: &ExprKind,
    parameters: &[String],
    templates: &IndexMap<String, Template>,
    variables: &mut IndexSet<String>,
    references: &mut IndexSet<String>,
) {
    match kind {
        ExprKind::Literal(_) => {}
        ExprKind::Var(_) | ExprKind::Member(..) => {
            if let Some(path) = kind.var_path() {
                let root = path.split('.').next().unwrap_or("");
                if !parameters.iter().any(|parameter| parameter == root) {
                    variables.insert(path);
                }
            } else if let ExprKind::Member(base, _) = kind {
                collect(base, parameters, templates, variables, references);
            }
        }
        ExprKind::Index(base, index) => {
            collect(base, parameters, templates, variables, references);
            collect(index, parameters, templates, variables, references);
        }
        ExprKind::Call { name, args } => {
            if let Some(target) = functions::resolve_template_name(name, templates) {
                references.insert(target);
            } else if name == "template" {
                if let Some(ExprKind::Literal(Lit::Str(target))) = args.first() {
                    references.insert(target.clone());
                }
            }
            for arg in args {
                collect(arg, parameters, templates, variables, references);
            }
        }
        ExprKind::Unary { operand, .. } => {
            collect(operand, parameters, templates, variables, references);
        }
        ExprKind::Binary { left, right, .. } => {
            collect(left, parameters, templates, variables, references);
            collect(right, parameters, templates, variables, references);
        }
    }
}

//! Parsed document model for `.lg` source files.
//!
//! [`parse`](crate::parse) turns raw source into a [`ParsedFile`]:
//! templates in declaration order, imports, raw options, and the local
//! diagnostics collected along the way. Import resolution, static checking,
//! and evaluation live in the engine crate; this model is purely syntactic.

use indexmap::IndexMap;

use crate::{error::Diagnostic, expr::Expression, position::LineRange};

/// One parsed `.lg` file or text blob.
#[derive(Debug, Clone, Default)]
pub struct ParsedFile {
    /// Templates in declaration order.
    pub templates: Vec<ParsedTemplate>,
    /// Import statements in declaration order.
    pub imports: Vec<Import>,
    /// Raw option strings, e.g. `@strict = true`.
    pub options: Vec<String>,
    /// Local syntax diagnostics for this file only.
    pub diagnostics: Vec<Diagnostic>,
}

/// A named, parameterized template with one typed body.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTemplate {
    /// Template name, unique within the file.
    pub name: String,
    /// Formal parameter names in declaration order.
    pub parameters: Vec<String>,
    /// The template body.
    pub body: TemplateBody,
    /// 1-based inclusive line range, from the header line to the last
    /// non-blank body line.
    pub range: LineRange,
}

/// An `[text](target)` import statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// The raw import target as written. May use either path separator
    /// convention.
    pub target: String,
    /// 1-based line of the import statement.
    pub line: usize,
}

/// A template body, one of four variants.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateBody {
    /// One or more text alternatives; evaluation picks the first,
    /// expansion enumerates all of them.
    Text(Vec<Alternative>),
    /// `- IF:`/`- ELSEIF:`/`- ELSE:` branches in declaration order.
    Conditional(Vec<CondBranch>),
    /// `- SWITCH:`/`- CASE:`/`- DEFAULT:` body.
    Switch(SwitchBody),
    /// `[TypeName ... ]` structured output body.
    Structured(StructuredBody),
}

/// One output alternative: literal text interleaved with embedded
/// expressions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Alternative {
    pub segments: Vec<Segment>,
}

/// A piece of an alternative.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Literal text, with escapes already resolved.
    Text(String),
    /// An embedded `${...}` expression.
    Expr(Expression),
}

/// One branch of a conditional body. `condition` is `None` for the `ELSE`
/// branch (and for branches whose condition failed to parse, which always
/// comes with an error diagnostic).
#[derive(Debug, Clone, PartialEq)]
pub struct CondBranch {
    pub condition: Option<Expression>,
    pub body: Vec<Alternative>,
    /// 1-based line of the branch marker.
    pub line: usize,
}

/// A switch body: subject expression, cases, optional default.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SwitchBody {
    pub subject: Option<Expression>,
    pub cases: Vec<SwitchCase>,
    pub default: Option<Vec<Alternative>>,
}

/// One `- CASE:` of a switch body.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    pub matcher: Option<Expression>,
    pub body: Vec<Alternative>,
    /// 1-based line of the case marker.
    pub line: usize,
}

/// A structured output body: a type name plus ordered key/value bindings.
/// Each binding value is a list of `|`-separated alternatives.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredBody {
    pub type_name: String,
    pub bindings: IndexMap<String, Vec<Alternative>>,
}

impl Alternative {
    /// Visit every embedded expression of this alternative.
    pub fn for_each_expression(&self, f: &mut impl FnMut(&Expression)) {
        for segment in &self.segments {
            if let Segment::Expr(expr) = segment {
                f(expr);
            }
        }
    }
}

impl TemplateBody {
    /// Visit every embedded expression of this body: text segments,
    /// branch conditions, switch subject and case matchers, and
    /// structured binding values.
    pub fn for_each_expression(&self, f: &mut impl FnMut(&Expression)) {
        fn visit_alternatives(alternatives: &[Alternative], f: &mut impl FnMut(&Expression)) {
            for alternative in alternatives {
                alternative.for_each_expression(f);
            }
        }

        match self {
            TemplateBody::Text(alternatives) => visit_alternatives(alternatives, f),
            TemplateBody::Conditional(branches) => {
                for branch in branches {
                    if let Some(condition) = &branch.condition {
                        f(condition);
                    }
                    visit_alternatives(&branch.body, f);
                }
            }
            TemplateBody::Switch(switch) => {
                if let Some(subject) = &switch.subject {
                    f(subject);
                }
                for case in &switch.cases {
                    if let Some(matcher) = &case.matcher {
                        f(matcher);
                    }
                    visit_alternatives(&case.body, f);
                }
                if let Some(default) = &switch.default {
                    visit_alternatives(default, f);
                }
            }
            TemplateBody::Structured(structured) => {
                for alternatives in structured.bindings.values() {
                    visit_alternatives(alternatives, f);
                }
            }
        }
    }
}

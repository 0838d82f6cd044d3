//! The loaded document model.
//!
//! A [`Document`] is one root `.lg` source together with the parsed units
//! of its transitive imports, the merged template set, and the diagnostics
//! of parsing and static checking. Documents are immutable values: the
//! editing operations return a fresh document built from modified source.

use std::{fmt, sync::Arc};

use indexmap::IndexMap;
use log::debug;
use lgen_core::{Scope, Value};
use lgen_parser::{
    ast::TemplateBody,
    error::{Diagnostic, ErrorCode, ParseError},
    position::{LineRange, Position},
};

use crate::{
    analyze::{self, AnalyzerResult},
    check,
    config::EngineConfig,
    error::LgenError,
    eval::Evaluator,
    expand::Expander,
    import::{self, ImportResolver},
};

/// A template of the combined set: its parsed form plus the id of the
/// document that declared it.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    /// Template name, unique within the combined set once checked.
    pub name: String,
    /// Formal parameter names in declaration order.
    pub parameters: Vec<String>,
    /// The parsed body.
    pub body: TemplateBody,
    /// 1-based inclusive line range in the declaring document.
    pub range: LineRange,
    /// Resolved id of the declaring document.
    pub source_id: String,
}

/// An import statement with its resolution result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// The target as written in the source.
    pub target: String,
    /// Canonical id the target resolved to. The deduplication key.
    pub resolved_id: String,
    /// 1-based line of the import statement.
    pub line: usize,
}

/// One parsed source unit: a root document or an import.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    id: String,
    content: String,
    templates: Vec<Template>,
    imports: Vec<Import>,
    options: Vec<String>,
    diagnostics: Vec<Diagnostic>,
}

impl SourceUnit {
    /// Parse source text into a unit owned by document `id`.
    pub(crate) fn parse(content: &str, id: &str) -> SourceUnit {
        let parsed = lgen_parser::parse(content);
        let templates = parsed
            .templates
            .into_iter()
            .map(|template| Template {
                name: template.name,
                parameters: template.parameters,
                body: template.body,
                range: template.range,
                source_id: id.to_string(),
            })
            .collect();
        let imports = parsed
            .imports
            .into_iter()
            .map(|import| Import {
                target: import.target,
                resolved_id: String::new(),
                line: import.line,
            })
            .collect();
        let diagnostics = parsed
            .diagnostics
            .into_iter()
            .map(|diagnostic| diagnostic.with_document(id))
            .collect();
        SourceUnit {
            id: id.to_string(),
            content: content.to_string(),
            templates,
            imports,
            options: parsed.options,
            diagnostics,
        }
    }

    /// The resolved id of this unit.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The raw source text.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Templates declared by this unit, in declaration order.
    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    /// Imports declared by this unit.
    pub fn imports(&self) -> &[Import] {
        &self.imports
    }

    pub(crate) fn imports_mut(&mut self) -> &mut [Import] {
        &mut self.imports
    }

    /// Raw option strings, e.g. `@strict = true`.
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Parse diagnostics local to this unit.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

/// A loaded root document with its import closure.
pub struct Document {
    unit: SourceUnit,
    references: IndexMap<String, SourceUnit>,
    check_diagnostics: Vec<Diagnostic>,
    template_map: IndexMap<String, Template>,
    resolver: Arc<dyn ImportResolver>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.unit.id)
            .field("templates", &self.template_map.len())
            .field("references", &self.references.len())
            .finish_non_exhaustive()
    }
}

/// Documents compare by identity and source text, not by resolver.
impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.unit.id == other.unit.id && self.unit.content == other.unit.content
    }
}

impl Document {
    /// Parse and resolve a document. The `cache` shares parsed units
    /// across a batch of roots.
    pub(crate) fn build(
        content: &str,
        id: &str,
        resolver: Arc<dyn ImportResolver>,
        cache: &mut IndexMap<String, SourceUnit>,
    ) -> Result<Document, LgenError> {
        let mut unit = SourceUnit::parse(content, id);
        let references = import::resolve_references(&mut unit, resolver.as_ref(), cache)?;
        cache
            .entry(id.to_string())
            .or_insert_with(|| unit.clone());
        let (template_map, mut check_diagnostics) = merge_templates(&unit, &references);
        check_diagnostics.extend(check::check(&template_map));
        debug!(
            id = id,
            templates = template_map.len(),
            references = references.len();
            "Loaded document"
        );
        Ok(Document {
            unit,
            references,
            check_diagnostics,
            template_map,
            resolver,
        })
    }

    /// The document's resolved id.
    pub fn id(&self) -> &str {
        self.unit.id()
    }

    /// The raw source text of the root document.
    pub fn content(&self) -> &str {
        self.unit.content()
    }

    /// Templates declared by the root document itself.
    pub fn templates(&self) -> &[Template] {
        self.unit.templates()
    }

    /// The root document's imports, with resolved ids filled in.
    pub fn imports(&self) -> &[Import] {
        self.unit.imports()
    }

    /// Raw option strings of the root document.
    pub fn options(&self) -> &[String] {
        self.unit.options()
    }

    /// The import closure, keyed by resolved id in discovery order.
    pub fn references(&self) -> &IndexMap<String, SourceUnit> {
        &self.references
    }

    /// Every template visible from this document. The root's templates
    /// come first, then imports in discovery order.
    pub fn all_templates(&self) -> impl Iterator<Item = &Template> {
        self.template_map.values()
    }

    /// Look up a visible template by name.
    pub fn template(&self, name: &str) -> Option<&Template> {
        self.template_map.get(name)
    }

    /// Parse diagnostics of the root document only.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.unit.diagnostics()
    }

    /// All diagnostics: root parse, reference parse, and static check.
    pub fn all_diagnostics(&self) -> Vec<&Diagnostic> {
        self.unit
            .diagnostics()
            .iter()
            .chain(
                self.references
                    .values()
                    .flat_map(|unit| unit.diagnostics().iter()),
            )
            .chain(self.check_diagnostics.iter())
            .collect()
    }

    /// Whether any diagnostic is an error.
    pub fn has_errors(&self) -> bool {
        self.all_diagnostics()
            .iter()
            .any(|diagnostic| diagnostic.severity().is_error())
    }

    /// Whether strict evaluation is enabled via a `@strict = true` option
    /// on the root document. The last strict option wins.
    pub fn strict_mode(&self) -> bool {
        let mut strict = false;
        for option in self.unit.options() {
            let Some((key, value)) = option.trim_start_matches('@').split_once('=') else {
                continue;
            };
            if key.trim().eq_ignore_ascii_case("strict") {
                if let Ok(value) = value.trim().parse::<bool>() {
                    strict = value;
                }
            }
        }
        strict
    }

    /// Evaluate a template against a scope with default settings.
    ///
    /// # Errors
    ///
    /// Fails when the document carries error diagnostics, the template
    /// does not exist, or evaluation fails (see [`LgenError`]).
    pub fn evaluate(&self, name: &str, scope: &Scope<'_>) -> Result<Value, LgenError> {
        self.evaluate_with(name, scope, &EngineConfig::default())
    }

    /// Evaluate a template with custom functions and limits.
    pub fn evaluate_with(
        &self,
        name: &str,
        scope: &Scope<'_>,
        config: &EngineConfig,
    ) -> Result<Value, LgenError> {
        self.ensure_valid()?;
        let mut evaluator = Evaluator::new(&self.template_map, config, self.strict_mode());
        evaluator.evaluate(name, scope)
    }

    /// Enumerate every output a template can produce, in declaration
    /// order with the leftmost varying expansion point changing slowest.
    pub fn expand(&self, name: &str, scope: &Scope<'_>) -> Result<Vec<Value>, LgenError> {
        self.expand_with(name, scope, &EngineConfig::default())
    }

    /// [`Document::expand`] with custom functions and limits.
    pub fn expand_with(
        &self,
        name: &str,
        scope: &Scope<'_>,
        config: &EngineConfig,
    ) -> Result<Vec<Value>, LgenError> {
        self.ensure_valid()?;
        let mut expander = Expander::new(&self.template_map, config, self.strict_mode());
        expander.expand(name, scope)
    }

    /// Report the free variables and template references a template
    /// transitively depends on.
    pub fn analyze(&self, name: &str) -> Result<AnalyzerResult, LgenError> {
        self.ensure_valid()?;
        analyze::analyze(&self.template_map, name)
    }

    pub(crate) fn template_map(&self) -> &IndexMap<String, Template> {
        &self.template_map
    }

    pub(crate) fn resolver(&self) -> Arc<dyn ImportResolver> {
        Arc::clone(&self.resolver)
    }

    fn ensure_valid(&self) -> Result<(), LgenError> {
        let errors: Vec<Diagnostic> = self
            .all_diagnostics()
            .into_iter()
            .filter(|diagnostic| diagnostic.severity().is_error())
            .cloned()
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(LgenError::CheckFailed(ParseError::new(errors)))
        }
    }
}

/// Merge the root's templates with its references' into one map, keyed by
/// name. Cross-document duplicates produce an E201 diagnostic; the first
/// declaration wins.
fn merge_templates(
    unit: &SourceUnit,
    references: &IndexMap<String, SourceUnit>,
) -> (IndexMap<String, Template>, Vec<Diagnostic>) {
    let mut map: IndexMap<String, Template> = IndexMap::new();
    let mut diagnostics = Vec::new();
    let all = unit
        .templates()
        .iter()
        .chain(references.values().flat_map(|unit| unit.templates().iter()));
    for template in all {
        match map.get(&template.name) {
            Some(existing) if existing.source_id != template.source_id => {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "template `{}` is defined in both `{}` and `{}`",
                        template.name, existing.source_id, template.source_id
                    ))
                    .with_code(ErrorCode::E201)
                    .with_position(Position::line_start(template.range.start))
                    .with_document(template.source_id.clone()),
                );
            }
            // same-document duplicates already carry an E110 from the parser
            Some(_) => {}
            None => {
                map.insert(template.name.clone(), template.clone());
            }
        }
    }
    (map, diagnostics)
}

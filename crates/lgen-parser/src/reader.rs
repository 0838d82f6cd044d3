//! Line-level reader for `.lg` source files.
//!
//! The reader walks source line by line, assembling template headers,
//! bodies, imports, and options into a [`ParsedFile`]. It is
//! error-recovering: malformed constructs produce diagnostics and the walk
//! continues, so a single pass collects every local problem in the file.
//!
//! The public entry points are [`parse`] and [`parse_segments`].

use indexmap::IndexMap;
use log::trace;
use thiserror::Error;

use crate::{
    ast::{
        Alternative, CondBranch, Import, ParsedFile, ParsedTemplate, Segment, StructuredBody,
        SwitchBody, SwitchCase, TemplateBody,
    },
    error::{Diagnostic, DiagnosticCollector, ErrorCode},
    expr::Expression,
    position::{LineRange, Position},
};

/// A failure while splitting text into segments.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct SegmentError {
    pub code: ErrorCode,
    pub message: String,
}

/// Parse `.lg` source into a [`ParsedFile`].
///
/// Never fails: syntax problems become error diagnostics on the returned
/// file, and the surrounding well-formed content is still assembled.
pub fn parse(source: &str) -> ParsedFile {
    let mut collector = DiagnosticCollector::new();
    let mut templates: Vec<ParsedTemplate> = Vec::new();
    let mut imports = Vec::new();
    let mut options = Vec::new();
    let mut draft: Option<TemplateDraft> = None;

    for (index, raw) in source.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();

        if trimmed.starts_with('#') {
            finalize(draft.take(), &mut templates, &mut collector);
            draft = parse_header(trimmed, line, &mut collector);
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix('>') {
            // `> !` marks an option line, anything else is a comment
            if let Some(option) = rest.trim_start().strip_prefix('!') {
                let option = option.trim_start().trim_start_matches('#').trim();
                if !option.is_empty() {
                    options.push(option.to_string());
                }
            }
            continue;
        }

        if let Some(target) = parse_import(trimmed) {
            finalize(draft.take(), &mut templates, &mut collector);
            imports.push(Import { target, line });
            continue;
        }

        match draft.as_mut() {
            Some(draft) => draft.body.push((line, raw.to_string())),
            None if trimmed.is_empty() => {}
            None => collector.emit(
                Diagnostic::error(format!("unexpected content outside of a template: `{}`", trimmed))
                    .with_code(ErrorCode::E101)
                    .with_position(Position::line_start(line)),
            ),
        }
    }
    finalize(draft.take(), &mut templates, &mut collector);

    trace!(templates = templates.len(), imports = imports.len(); "Parsed source");
    ParsedFile {
        templates,
        imports,
        options,
        diagnostics: collector.finish(),
    }
}

/// Split literal text into [`Segment`]s at `${...}` boundaries.
///
/// `\$` escapes a literal dollar, `\\` a literal backslash, `\|` a literal
/// pipe; any other backslash pair is kept verbatim. String literals inside
/// an expression may contain `}` without closing it.
pub fn parse_segments(text: &str) -> Result<Vec<Segment>, SegmentError> {
    let chars: Vec<char> = text.chars().collect();
    let mut segments = Vec::new();
    let mut buf = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '\\' && i + 1 < chars.len() {
            let next = chars[i + 1];
            match next {
                '$' | '\\' | '|' => buf.push(next),
                _ => {
                    buf.push('\\');
                    buf.push(next);
                }
            }
            i += 2;
            continue;
        }
        if c == '$' && chars.get(i + 1) == Some(&'{') {
            let end = find_expression_end(&chars, i + 2).ok_or_else(|| SegmentError {
                code: ErrorCode::E001,
                message: format!("unterminated expression in `{}`", text),
            })?;
            let expr_text: String = chars[i + 2..end].iter().collect();
            if !buf.is_empty() {
                segments.push(Segment::Text(std::mem::take(&mut buf)));
            }
            let expr = Expression::parse(expr_text).map_err(|message| SegmentError {
                code: ErrorCode::E002,
                message: format!("invalid expression: {}", message),
            })?;
            segments.push(Segment::Expr(expr));
            i = end + 1;
            continue;
        }
        buf.push(c);
        i += 1;
    }
    if !buf.is_empty() {
        segments.push(Segment::Text(buf));
    }
    Ok(segments)
}

/// Find the `}` closing an expression that starts at `from`, skipping
/// string literals.
fn find_expression_end(chars: &[char], from: usize) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut i = from;
    while i < chars.len() {
        let c = chars[i];
        match quote {
            Some(q) => {
                if c == '\\' {
                    i += 1;
                } else if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' => quote = Some(c),
                '}' => return Some(i),
                _ => {}
            },
        }
        i += 1;
    }
    None
}

/// A template header plus the raw body lines collected so far.
struct TemplateDraft {
    name: String,
    parameters: Vec<String>,
    header_line: usize,
    body: Vec<(usize, String)>,
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn is_template_name(text: &str) -> bool {
    !text.is_empty() && text.split('.').all(is_identifier)
}

fn parse_header(
    trimmed: &str,
    line: usize,
    collector: &mut DiagnosticCollector,
) -> Option<TemplateDraft> {
    let rest = trimmed.trim_start_matches('#').trim();
    let malformed = |collector: &mut DiagnosticCollector| {
        collector.emit(
            Diagnostic::error(format!("malformed template header `{}`", trimmed))
                .with_code(ErrorCode::E103)
                .with_position(Position::line_start(line)),
        );
        None
    };

    let (name, parameters) = match rest.split_once('(') {
        Some((name, params)) => {
            let Some(params) = params.strip_suffix(')') else {
                return malformed(collector);
            };
            let parameters: Vec<String> = params
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
            if !parameters.iter().all(|p| is_identifier(p)) {
                return malformed(collector);
            }
            (name.trim(), parameters)
        }
        None => (rest, Vec::new()),
    };
    if !is_template_name(name) {
        return malformed(collector);
    }

    Some(TemplateDraft {
        name: name.to_string(),
        parameters,
        header_line: line,
        body: Vec::new(),
    })
}

/// Recognize `[text](target)` import lines. Structured body openers like
/// `[Activity` do not match because they carry no `](` link part.
fn parse_import(trimmed: &str) -> Option<String> {
    if !trimmed.starts_with('[') || !trimmed.ends_with(')') {
        return None;
    }
    let link = trimmed.find("](")?;
    let target = trimmed[link + 2..trimmed.len() - 1].trim();
    (!target.is_empty()).then(|| target.to_string())
}

fn finalize(
    draft: Option<TemplateDraft>,
    templates: &mut Vec<ParsedTemplate>,
    collector: &mut DiagnosticCollector,
) {
    let Some(draft) = draft else { return };

    let end_line = draft
        .body
        .iter()
        .rev()
        .find(|(_, text)| !text.trim().is_empty())
        .map(|(line, _)| *line)
        .unwrap_or(draft.header_line);
    let meaningful: Vec<(usize, &str)> = draft
        .body
        .iter()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(line, text)| (*line, text.as_str()))
        .collect();

    let body = if meaningful.is_empty() {
        collector.emit(
            Diagnostic::error(format!("template `{}` has no body", draft.name))
                .with_code(ErrorCode::E109)
                .with_position(Position::line_start(draft.header_line)),
        );
        TemplateBody::Text(Vec::new())
    } else {
        parse_body(&meaningful, collector)
    };

    if templates.iter().any(|t| t.name == draft.name) {
        collector.emit(
            Diagnostic::error(format!(
                "template `{}` is defined more than once in this file",
                draft.name
            ))
            .with_code(ErrorCode::E110)
            .with_position(Position::line_start(draft.header_line)),
        );
        return;
    }

    templates.push(ParsedTemplate {
        name: draft.name,
        parameters: draft.parameters,
        body,
        range: LineRange::new(draft.header_line, end_line),
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    If,
    ElseIf,
    Else,
    Switch,
    Case,
    Default,
}

/// Recognize branch/case marker lines like `- IF: ${x}`. The keyword match
/// is case-insensitive and `ELSE IF` is accepted for `ELSEIF`.
fn parse_marker(trimmed: &str) -> Option<(Marker, &str)> {
    let rest = trimmed.strip_prefix('-')?.trim_start();
    let colon = rest.find(':')?;
    let keyword = rest[..colon].trim().to_ascii_uppercase().replace(' ', "");
    let tail = rest[colon + 1..].trim();
    let marker = match keyword.as_str() {
        "IF" => Marker::If,
        "ELSEIF" => Marker::ElseIf,
        "ELSE" => Marker::Else,
        "SWITCH" => Marker::Switch,
        "CASE" => Marker::Case,
        "DEFAULT" => Marker::Default,
        _ => return None,
    };
    Some((marker, tail))
}

fn parse_body(lines: &[(usize, &str)], collector: &mut DiagnosticCollector) -> TemplateBody {
    let first = lines[0].1.trim();
    match parse_marker(first) {
        Some((Marker::If | Marker::ElseIf | Marker::Else, _)) => {
            TemplateBody::Conditional(parse_conditional(lines, collector))
        }
        Some((Marker::Switch | Marker::Case | Marker::Default, _)) => {
            TemplateBody::Switch(parse_switch(lines, collector))
        }
        None if first.starts_with('[') => {
            TemplateBody::Structured(parse_structured(lines, collector))
        }
        None => TemplateBody::Text(parse_plain(lines, collector)),
    }
}

fn parse_plain(lines: &[(usize, &str)], collector: &mut DiagnosticCollector) -> Vec<Alternative> {
    let mut alternatives = Vec::new();
    for (line, raw) in lines {
        let trimmed = raw.trim();
        match trimmed.strip_prefix('-') {
            Some(rest) => {
                let text = rest.strip_prefix(' ').unwrap_or(rest);
                alternatives.push(parse_alternative(text, *line, collector));
            }
            None => emit_invalid_body_line(trimmed, *line, collector),
        }
    }
    alternatives
}

fn parse_alternative(text: &str, line: usize, collector: &mut DiagnosticCollector) -> Alternative {
    match parse_segments(text) {
        Ok(segments) => Alternative { segments },
        Err(err) => {
            collector.emit(
                Diagnostic::error(err.message)
                    .with_code(err.code)
                    .with_position(Position::line_start(line)),
            );
            Alternative {
                segments: vec![Segment::Text(text.to_string())],
            }
        }
    }
}

/// Parse a branch condition or case matcher. The `${...}` wrapper is
/// optional.
fn parse_condition(
    tail: &str,
    line: usize,
    collector: &mut DiagnosticCollector,
) -> Option<Expression> {
    let inner = match tail.strip_prefix("${").and_then(|t| t.strip_suffix('}')) {
        Some(inner) => inner,
        None => tail,
    };
    match Expression::parse(inner) {
        Ok(expr) => Some(expr),
        Err(message) => {
            collector.emit(
                Diagnostic::error(format!("invalid condition expression: {}", message))
                    .with_code(ErrorCode::E002)
                    .with_position(Position::line_start(line)),
            );
            None
        }
    }
}

fn emit_invalid_body_line(trimmed: &str, line: usize, collector: &mut DiagnosticCollector) {
    collector.emit(
        Diagnostic::error(format!("invalid template body line: `{}`", trimmed))
            .with_code(ErrorCode::E102)
            .with_position(Position::line_start(line)),
    );
}

fn parse_conditional(
    lines: &[(usize, &str)],
    collector: &mut DiagnosticCollector,
) -> Vec<CondBranch> {
    let mut branches: Vec<CondBranch> = Vec::new();
    let mut seen_else = false;
    let mut structure_error = |message: String, line: usize, collector: &mut DiagnosticCollector| {
        collector.emit(
            Diagnostic::error(message)
                .with_code(ErrorCode::E104)
                .with_position(Position::line_start(line)),
        );
    };

    for (line, raw) in lines {
        let trimmed = raw.trim();
        if let Some((marker, tail)) = parse_marker(trimmed) {
            match marker {
                Marker::If => {
                    if !branches.is_empty() {
                        structure_error("IF must be the first branch".to_string(), *line, collector);
                    }
                    branches.push(CondBranch {
                        condition: parse_condition(tail, *line, collector),
                        body: Vec::new(),
                        line: *line,
                    });
                }
                Marker::ElseIf => {
                    if branches.is_empty() || seen_else {
                        structure_error("ELSEIF is not allowed here".to_string(), *line, collector);
                    }
                    branches.push(CondBranch {
                        condition: parse_condition(tail, *line, collector),
                        body: Vec::new(),
                        line: *line,
                    });
                }
                Marker::Else => {
                    if branches.is_empty() || seen_else {
                        structure_error("ELSE is not allowed here".to_string(), *line, collector);
                    }
                    seen_else = true;
                    branches.push(CondBranch {
                        condition: None,
                        body: Vec::new(),
                        line: *line,
                    });
                }
                Marker::Switch | Marker::Case | Marker::Default => {
                    structure_error(
                        "switch markers are not allowed in a conditional body".to_string(),
                        *line,
                        collector,
                    );
                }
            }
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix('-') {
            let text = rest.strip_prefix(' ').unwrap_or(rest);
            match branches.last_mut() {
                Some(branch) => branch.body.push(parse_alternative(text, *line, collector)),
                None => {
                    structure_error("alternative before any IF branch".to_string(), *line, collector)
                }
            }
            continue;
        }
        emit_invalid_body_line(trimmed, *line, collector);
    }

    for branch in &branches {
        if branch.body.is_empty() {
            collector.emit(
                Diagnostic::error("conditional branch has an empty body")
                    .with_code(ErrorCode::E106)
                    .with_position(Position::line_start(branch.line)),
            );
        }
    }
    branches
}

fn parse_switch(lines: &[(usize, &str)], collector: &mut DiagnosticCollector) -> SwitchBody {
    enum Target {
        Subject,
        Case,
        Default,
    }

    let mut switch = SwitchBody::default();
    let mut default_line = 0;
    let mut target = Target::Subject;
    let mut seen_switch = false;
    let mut structure_error = |message: String, line: usize, collector: &mut DiagnosticCollector| {
        collector.emit(
            Diagnostic::error(message)
                .with_code(ErrorCode::E105)
                .with_position(Position::line_start(line)),
        );
    };

    for (line, raw) in lines {
        let trimmed = raw.trim();
        if let Some((marker, tail)) = parse_marker(trimmed) {
            match marker {
                Marker::Switch => {
                    if seen_switch {
                        structure_error("duplicate SWITCH line".to_string(), *line, collector);
                    } else {
                        seen_switch = true;
                        switch.subject = parse_condition(tail, *line, collector);
                    }
                }
                Marker::Case => {
                    if !seen_switch {
                        structure_error("CASE before SWITCH".to_string(), *line, collector);
                    }
                    switch.cases.push(SwitchCase {
                        matcher: parse_condition(tail, *line, collector),
                        body: Vec::new(),
                        line: *line,
                    });
                    target = Target::Case;
                }
                Marker::Default => {
                    if !seen_switch {
                        structure_error("DEFAULT before SWITCH".to_string(), *line, collector);
                    }
                    if switch.default.is_some() {
                        structure_error("more than one DEFAULT case".to_string(), *line, collector);
                    } else {
                        switch.default = Some(Vec::new());
                        default_line = *line;
                        target = Target::Default;
                    }
                }
                Marker::If | Marker::ElseIf | Marker::Else => {
                    structure_error(
                        "conditional markers are not allowed in a switch body".to_string(),
                        *line,
                        collector,
                    );
                }
            }
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix('-') {
            let text = rest.strip_prefix(' ').unwrap_or(rest);
            let alternative = parse_alternative(text, *line, collector);
            match target {
                Target::Subject => {
                    structure_error(
                        "alternatives are not allowed under the SWITCH line".to_string(),
                        *line,
                        collector,
                    );
                }
                Target::Case => {
                    if let Some(case) = switch.cases.last_mut() {
                        case.body.push(alternative);
                    }
                }
                Target::Default => {
                    if let Some(default) = switch.default.as_mut() {
                        default.push(alternative);
                    }
                }
            }
            continue;
        }
        emit_invalid_body_line(trimmed, *line, collector);
    }

    for case in &switch.cases {
        if case.body.is_empty() {
            collector.emit(
                Diagnostic::error("switch case has an empty body")
                    .with_code(ErrorCode::E106)
                    .with_position(Position::line_start(case.line)),
            );
        }
    }
    if let Some(default) = &switch.default {
        if default.is_empty() {
            collector.emit(
                Diagnostic::error("DEFAULT case has an empty body")
                    .with_code(ErrorCode::E106)
                    .with_position(Position::line_start(default_line)),
            );
        }
    }
    switch
}

fn parse_structured(
    lines: &[(usize, &str)],
    collector: &mut DiagnosticCollector,
) -> StructuredBody {
    let (first_line, first_raw) = lines[0];
    let inner = first_raw.trim().strip_prefix('[').unwrap_or_default();
    let name_end = inner
        .find(|c: char| c.is_whitespace() || c == ']')
        .unwrap_or(inner.len());
    let type_name = inner[..name_end].to_string();
    if type_name.is_empty() {
        collector.emit(
            Diagnostic::error("structured body is missing a type name")
                .with_code(ErrorCode::E108)
                .with_position(Position::line_start(first_line)),
        );
    }
    let mut closed = inner[name_end..].trim() == "]";

    let mut bindings: IndexMap<String, Vec<Alternative>> = IndexMap::new();
    for (line, raw) in &lines[1..] {
        let trimmed = raw.trim();
        if closed {
            emit_invalid_body_line(trimmed, *line, collector);
            continue;
        }
        if trimmed == "]" {
            closed = true;
            continue;
        }
        let Some((key, value)) = trimmed.split_once('=') else {
            collector.emit(
                Diagnostic::error(format!("structured body line is not a `key = value` pair: `{}`", trimmed))
                    .with_code(ErrorCode::E108)
                    .with_position(Position::line_start(*line)),
            );
            continue;
        };
        let key = key.trim();
        if !is_identifier(key) {
            collector.emit(
                Diagnostic::error(format!("invalid structured binding key `{}`", key))
                    .with_code(ErrorCode::E108)
                    .with_position(Position::line_start(*line)),
            );
            continue;
        }
        if bindings.contains_key(key) {
            collector.emit(
                Diagnostic::error(format!("duplicate structured binding `{}`", key))
                    .with_code(ErrorCode::E108)
                    .with_position(Position::line_start(*line)),
            );
            continue;
        }
        let alternatives = split_alternatives(value.trim())
            .into_iter()
            .map(|part| parse_alternative(&part, *line, collector))
            .collect();
        bindings.insert(key.to_string(), alternatives);
    }

    if !closed {
        collector.emit(
            Diagnostic::error("structured body is never closed with `]`")
                .with_code(ErrorCode::E107)
                .with_position(Position::line_start(first_line)),
        );
    }
    StructuredBody {
        type_name,
        bindings,
    }
}

/// Split a structured binding value on `|`, ignoring pipes that are
/// escaped or inside a `${...}` expression.
fn split_alternatives(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut parts = Vec::new();
    let mut buf = String::new();
    let mut in_expr = false;
    let mut quote: Option<char> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '\\' && i + 1 < chars.len() {
            buf.push(c);
            buf.push(chars[i + 1]);
            i += 2;
            continue;
        }
        if in_expr {
            match quote {
                Some(q) => {
                    if c == q {
                        quote = None;
                    }
                }
                None => match c {
                    '\'' | '"' => quote = Some(c),
                    '}' => in_expr = false,
                    _ => {}
                },
            }
            buf.push(c);
            i += 1;
            continue;
        }
        if c == '$' && chars.get(i + 1) == Some(&'{') {
            in_expr = true;
            buf.push(c);
            i += 1;
            continue;
        }
        if c == '|' {
            parts.push(std::mem::take(&mut buf).trim().to_string());
            i += 1;
            continue;
        }
        buf.push(c);
        i += 1;
    }
    parts.push(buf.trim().to_string());
    parts
}

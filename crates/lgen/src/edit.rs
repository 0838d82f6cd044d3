//! Line-precise template editing.
//!
//! Edits are source-level: the target template's line range is spliced
//! out of the raw text and the whole document is re-parsed and
//! re-resolved. Documents are immutable values, so every edit returns a
//! fresh one and the original stays usable.

use indexmap::IndexMap;
use log::debug;

use crate::{document::Document, error::LgenError};

impl Document {
    /// Append a new template at the end of the document.
    ///
    /// `parameters` of `None` produces a bare `# name` header; an empty
    /// list produces `# name()`. Body lines that themselves look like
    /// template headers are demoted to plain alternatives.
    ///
    /// # Errors
    ///
    /// Fails with [`LgenError::AlreadyExists`] when the name is already
    /// visible from this document.
    pub fn add_template(
        &self,
        name: &str,
        parameters: Option<Vec<String>>,
        body: &str,
    ) -> Result<Document, LgenError> {
        if self.template_map().contains_key(name) {
            return Err(LgenError::AlreadyExists(name.to_string()));
        }
        let block = template_block(name, parameters.as_deref(), body);
        let trimmed = self.content().trim_end_matches(['\r', '\n']);
        let content = if trimmed.is_empty() {
            block
        } else {
            format!("{}\r\n\r\n{}", trimmed, block)
        };
        let document = self.reload(&content)?;
        debug!(template = name, document = self.id(); "Added template");
        Ok(document)
    }

    /// Replace a template's header and body, optionally renaming it.
    ///
    /// # Errors
    ///
    /// Fails with [`LgenError::TemplateNotFound`] when `name` is not
    /// declared by the root document itself. Imported templates cannot be
    /// edited through the importer.
    pub fn update_template(
        &self,
        name: &str,
        new_name: &str,
        parameters: Option<Vec<String>>,
        body: &str,
    ) -> Result<Document, LgenError> {
        let range = self.own_template_range(name)?;
        let block = template_block(new_name, parameters.as_deref(), body);
        let content = splice_lines(self.content(), range, Some(&block))?;
        let document = self.reload(&content)?;
        debug!(template = name, renamed = new_name, document = self.id(); "Updated template");
        Ok(document)
    }

    /// Remove a template declared by the root document.
    pub fn delete_template(&self, name: &str) -> Result<Document, LgenError> {
        let range = self.own_template_range(name)?;
        let content = splice_lines(self.content(), range, None)?;
        let document = self.reload(&content)?;
        debug!(template = name, document = self.id(); "Deleted template");
        Ok(document)
    }

    /// 0-based inclusive line range of a template declared by the root
    /// document.
    fn own_template_range(&self, name: &str) -> Result<(usize, usize), LgenError> {
        self.templates()
            .iter()
            .find(|template| template.name == name)
            .map(|template| (template.range.start - 1, template.range.end - 1))
            .ok_or_else(|| LgenError::TemplateNotFound(name.to_string()))
    }

    fn reload(&self, content: &str) -> Result<Document, LgenError> {
        Document::build(content, self.id(), self.resolver(), &mut IndexMap::new())
    }
}

/// Render a header plus converted body as one block.
fn template_block(name: &str, parameters: Option<&[String]>, body: &str) -> String {
    let header = match parameters {
        None => format!("# {}", name),
        Some(parameters) => format!("# {}({})", name, parameters.join(", ")),
    };
    format!("{}\r\n{}", header, convert_body(body))
}

/// Demote body lines that look like template headers to plain
/// alternatives, so an edit cannot smuggle in extra templates.
fn convert_body(body: &str) -> String {
    body.split('\n')
        .map(|line| {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.trim_start().starts_with('#') {
                format!("- {}", line.trim_start())
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\r\n")
}

/// Replace the 0-based inclusive line range with an optional block.
///
/// Blank lines around the splice point and around the block are trimmed,
/// and single blank separator lines are re-inserted, so repeated edits do
/// not accumulate whitespace. Lines are re-joined with CRLF except where
/// an original line already carried its own `\r`.
fn splice_lines(
    content: &str,
    (start, stop): (usize, usize),
    block: Option<&str>,
) -> Result<String, LgenError> {
    let lines: Vec<&str> = content.split('\n').collect();
    if start > stop || stop >= lines.len() {
        return Err(LgenError::EditRange {
            start: start + 1,
            stop: stop + 1,
            len: lines.len(),
        });
    }

    let mut head: Vec<&str> = lines[..start].to_vec();
    while head.last().is_some_and(|line| line.trim().is_empty()) {
        head.pop();
    }
    let mut tail: Vec<&str> = lines[stop + 1..].to_vec();
    while tail.first().is_some_and(|line| line.trim().is_empty()) {
        tail.remove(0);
    }

    let mut result: Vec<String> = head.iter().map(|line| (*line).to_string()).collect();
    match block {
        Some(block) => {
            let mut block_lines: Vec<&str> = block.split('\n').collect();
            while block_lines.first().is_some_and(|line| line.trim().is_empty()) {
                block_lines.remove(0);
            }
            while block_lines.last().is_some_and(|line| line.trim().is_empty()) {
                block_lines.pop();
            }
            if !result.is_empty() {
                result.push(String::new());
            }
            result.extend(block_lines.iter().map(|line| (*line).to_string()));
            if !tail.is_empty() {
                result.push(String::new());
            }
        }
        None => {
            if !result.is_empty() && !tail.is_empty() {
                result.push(String::new());
            }
        }
    }
    result.extend(tail.iter().map(|line| (*line).to_string()));
    Ok(join_lines(&result))
}

fn join_lines(lines: &[String]) -> String {
    let mut out = String::new();
    for (index, line) in lines.iter().enumerate() {
        out.push_str(line);
        if index + 1 < lines.len() {
            if line.ends_with('\r') {
                out.push('\n');
            } else {
                out.push_str("\r\n");
            }
        }
    }
    out
}

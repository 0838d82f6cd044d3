//! Error codes for the lgen diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E0xx` - Expression errors
//! - `E1xx` - Document parse errors
//! - `E2xx` - Static check errors
//! - `W3xx` - Static check warnings

use std::fmt;

/// Error codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Expression Errors (E0xx)
    // =========================================================================
    /// Unterminated embedded expression.
    ///
    /// A `${` was opened but the closing `}` was never found.
    E001,

    /// Invalid expression.
    ///
    /// The text inside `${...}` is not a valid expression.
    E002,

    // =========================================================================
    // Document Parse Errors (E1xx)
    // =========================================================================
    /// Content outside of any template.
    ///
    /// A non-comment line was found before the first template header.
    E101,

    /// Invalid body line.
    ///
    /// A template body line does not start with `-` and is not part of a
    /// structured body.
    E102,

    /// Malformed template header.
    ///
    /// The header does not follow `# name` or `# name(p1, p2)`.
    E103,

    /// Invalid conditional structure.
    ///
    /// Branch markers are out of order, e.g. `ELSE` without `IF`, a branch
    /// after `ELSE`, or more than one `ELSE`.
    E104,

    /// Invalid switch structure.
    ///
    /// Case markers are out of order, e.g. `CASE` before `SWITCH`, content
    /// under the `SWITCH` line, or more than one `DEFAULT`.
    E105,

    /// Empty branch body.
    ///
    /// A conditional branch or switch case has no alternatives.
    E106,

    /// Unterminated structured body.
    ///
    /// A structured body was opened with `[` but never closed with `]`.
    E107,

    /// Malformed structured binding.
    ///
    /// A structured body line is not a `key = value` pair.
    E108,

    /// Empty template body.
    ///
    /// A template header has no body lines.
    E109,

    /// Duplicate template in document.
    ///
    /// A template with this name has already been defined in this file.
    E110,

    // =========================================================================
    // Static Check Errors (E2xx)
    // =========================================================================
    /// Duplicate template across the combined set.
    ///
    /// Two imported documents (or the root and an import) define the same
    /// template name.
    E201,

    /// Argument count mismatch.
    ///
    /// A template is invoked with a literal name and an argument count that
    /// is neither zero nor the template's parameter count.
    E202,

    /// Structured body has no bindings.
    E203,

    // =========================================================================
    // Static Check Warnings (W3xx)
    // =========================================================================
    /// Reference to an unknown template.
    ///
    /// The referenced template does not exist in the combined set. The
    /// reference fails at evaluation time with a template-not-found error.
    W301,

    /// Call to an unknown function.
    ///
    /// The name matches no builtin, engine function, or template. The call
    /// resolves to null at evaluation time (an error under strict mode).
    W302,

    /// Switch body with no CASE branches.
    W303,
}

impl ErrorCode {
    /// Returns the code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            // Expression errors
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            // Document parse errors
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E103 => "E103",
            ErrorCode::E104 => "E104",
            ErrorCode::E105 => "E105",
            ErrorCode::E106 => "E106",
            ErrorCode::E107 => "E107",
            ErrorCode::E108 => "E108",
            ErrorCode::E109 => "E109",
            ErrorCode::E110 => "E110",
            // Static check errors
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
            ErrorCode::E203 => "E203",
            // Static check warnings
            ErrorCode::W301 => "W301",
            ErrorCode::W302 => "W302",
            ErrorCode::W303 => "W303",
        }
    }

    /// Returns a short description of what this code means.
    pub fn description(&self) -> &'static str {
        match self {
            // Expression errors
            ErrorCode::E001 => "unterminated expression",
            ErrorCode::E002 => "invalid expression",
            // Document parse errors
            ErrorCode::E101 => "content outside template",
            ErrorCode::E102 => "invalid body line",
            ErrorCode::E103 => "malformed template header",
            ErrorCode::E104 => "invalid conditional structure",
            ErrorCode::E105 => "invalid switch structure",
            ErrorCode::E106 => "empty branch body",
            ErrorCode::E107 => "unterminated structured body",
            ErrorCode::E108 => "malformed structured binding",
            ErrorCode::E109 => "empty template body",
            ErrorCode::E110 => "duplicate template in document",
            // Static check errors
            ErrorCode::E201 => "duplicate template",
            ErrorCode::E202 => "argument count mismatch",
            ErrorCode::E203 => "structured body has no bindings",
            // Static check warnings
            ErrorCode::W301 => "unknown template reference",
            ErrorCode::W302 => "unknown function",
            ErrorCode::W303 => "switch with no cases",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::E001.to_string(), "E001");
        assert_eq!(ErrorCode::E110.to_string(), "E110");
        assert_eq!(ErrorCode::W301.to_string(), "W301");
    }

    #[test]
    fn test_error_code_description() {
        assert_eq!(ErrorCode::E001.description(), "unterminated expression");
        assert_eq!(ErrorCode::E201.description(), "duplicate template");
        assert_eq!(ErrorCode::W302.description(), "unknown function");
    }
}

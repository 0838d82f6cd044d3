//! Collector for accumulating diagnostics during a processing phase.
//!
//! The [`DiagnosticCollector`] allows the reader and checker to report
//! multiple errors and warnings instead of failing on the first one.

use crate::error::Diagnostic;

/// A collector for accumulating diagnostics during a processing phase.
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    /// Create a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit a diagnostic to this collector.
    pub fn emit(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Finish collection and return the accumulated diagnostics.
    pub fn finish(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_accumulates_in_order() {
        let mut collector = DiagnosticCollector::new();
        collector.emit(Diagnostic::warning("advisory"));
        collector.emit(Diagnostic::error("fatal"));

        let diagnostics = collector.finish();
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics[0].severity().is_warning());
        assert!(diagnostics[1].severity().is_error());
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticCategory {
    Warning,
    Error,
    Suggestion,
    Message,
}

impl DiagnosticCategory {
    pub fn is_error(self) -> bool {
        matches!(self, DiagnosticCategory::Error)
    }
}

/// Diagnostic codes owned by the transpilation driver. Front-end diagnostics
/// keep whatever codes the front-end assigned them.
pub mod diagnostic_codes {
    pub const COULD_NOT_RESOLVE_PLUGIN: u32 = 9001;
    pub const PLUGIN_CONTRIBUTES_NOTHING: u32 = 9002;
    pub const UNSUPPORTED_SYNTAX_KIND: u32 = 9101;
    pub const INVALID_JSON_SOURCE: u32 = 9102;
    pub const BUNDLE_REQUIRES_BUNDLE_ENTRY: u32 = 9201;
    pub const BUNDLE_ENTRY_REQUIRES_BUNDLE: u32 = 9202;
    pub const DECLARATION_ONLY_REQUIRES_DECLARATION: u32 = 9203;
    pub const COULD_NOT_WRITE_FILE: u32 = 9301;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub code: u32,
    pub file: String,
    pub start: u32,
    pub length: u32,
    pub message_text: String,
}

impl Diagnostic {
    pub fn error(
        file: impl Into<String>,
        start: u32,
        length: u32,
        message: impl Into<String>,
        code: u32,
    ) -> Self {
        Self {
            category: DiagnosticCategory::Error,
            message_text: message.into(),
            code,
            file: file.into(),
            start,
            length,
        }
    }

    pub fn warning(
        file: impl Into<String>,
        start: u32,
        length: u32,
        message: impl Into<String>,
        code: u32,
    ) -> Self {
        Self {
            category: DiagnosticCategory::Warning,
            message_text: message.into(),
            code,
            file: file.into(),
            start,
            length,
        }
    }

    /// A diagnostic that is not anchored to a position in a source file,
    /// e.g. an option-validation or plugin-resolution failure.
    pub fn global(message: impl Into<String>, code: u32) -> Self {
        Self::error("", 0, 0, message, code)
    }

    pub fn is_error(&self) -> bool {
        self.category.is_error()
    }
}

/// True if any diagnostic in the sequence has error severity.
pub fn contains_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_constructor() {
        let diag = Diagnostic::error(
            "main.ts",
            10,
            4,
            "unsupported syntax",
            diagnostic_codes::UNSUPPORTED_SYNTAX_KIND,
        );
        assert_eq!(diag.category, DiagnosticCategory::Error);
        assert_eq!(diag.file, "main.ts");
        assert!(diag.is_error());
    }

    #[test]
    fn test_global_has_no_file() {
        let diag = Diagnostic::global(
            "bundle requires bundleEntry",
            diagnostic_codes::BUNDLE_REQUIRES_BUNDLE_ENTRY,
        );
        assert!(diag.file.is_empty());
        assert_eq!(diag.start, 0);
    }

    #[test]
    fn test_contains_errors() {
        let warning = Diagnostic::warning("a.ts", 0, 0, "w", 1);
        assert!(!contains_errors(&[warning.clone()]));
        let error = Diagnostic::error("a.ts", 0, 0, "e", 2);
        assert!(contains_errors(&[warning, error]));
    }
}

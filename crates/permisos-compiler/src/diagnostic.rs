//! Diagnostic collection and rendering
//!
//! Errors are recorded as they happen and reported together once
//! processing is over, so one bad type does not hide the others.

use crate::error::ProcessError;
use std::io::{self, Write};
use termcolor::{Color, ColorSpec, WriteColor};

/// A rendered error pointing at zero or more elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Error message, possibly multi-line
    pub message: String,
    /// Qualified names of the offending elements
    pub elements: Vec<String>,
}

impl Diagnostic {
    /// Build a diagnostic from a processing error
    pub fn from_error(error: &ProcessError) -> Self {
        Self {
            message: error.to_string(),
            elements: error.elements().into_iter().map(str::to_string).collect(),
        }
    }

    /// Write the diagnostic; the trailer is red and bold when `out` supports color
    pub fn emit<W: WriteColor + ?Sized>(&self, tag: &str, out: &mut W) -> io::Result<()> {
        writeln!(out, "[{}]", tag)?;
        writeln!(out, "{}", self.message)?;
        for element in &self.elements {
            writeln!(out, "  at {}", element)?;
        }
        let mut spec = ColorSpec::new();
        spec.set_fg(Some(Color::Red)).set_bold(true);
        out.set_color(&spec)?;
        write!(
            out,
            "[{}] Processing did not complete. See error above for details.",
            tag
        )?;
        out.reset()?;
        writeln!(out)
    }
}

/// Accumulates diagnostics across processing rounds
#[derive(Debug)]
pub struct ErrorHandler {
    tag: String,
    diagnostics: Vec<Diagnostic>,
}

impl ErrorHandler {
    /// Create a handler; `tag` prefixes every report (e.g. `Permisos`)
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            diagnostics: Vec::new(),
        }
    }

    /// Record a processing error
    pub fn record(&mut self, error: &ProcessError) {
        self.diagnostics.push(Diagnostic::from_error(error));
    }

    /// Record a free-form error
    pub fn record_message(&mut self, message: impl Into<String>, element: Option<String>) {
        self.diagnostics.push(Diagnostic {
            message: message.into(),
            elements: element.into_iter().collect(),
        });
    }

    /// Whether anything was recorded
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// Recorded diagnostics, oldest first
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Report tag
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Drain the recorded diagnostics; `Err` if there were any
    pub fn check_errors(&mut self) -> Result<(), Vec<Diagnostic>> {
        if self.diagnostics.is_empty() {
            Ok(())
        } else {
            Err(std::mem::take(&mut self.diagnostics))
        }
    }

    /// Write every recorded diagnostic to `out`
    pub fn emit_all<W: WriteColor + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        for diagnostic in &self.diagnostics {
            diagnostic.emit(&self.tag, out)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use termcolor::Buffer;

    fn handler_with_error() -> ErrorHandler {
        let mut handler = ErrorHandler::new("Permisos");
        handler.record(&ProcessError::UnsupportedBaseType {
            message: "@Permisos base class must extend ComponentActivity, (support) Fragment."
                .to_string(),
            element: "com.example.Widget".to_string(),
        });
        handler
    }

    #[test]
    fn test_plain_rendering() {
        let handler = handler_with_error();
        let mut buffer = Buffer::no_color();
        handler.emit_all(&mut buffer).unwrap();
        let text = String::from_utf8(buffer.into_inner()).unwrap();
        assert_eq!(
            text,
            "[Permisos]\n\
             @Permisos base class must extend ComponentActivity, (support) Fragment.\n  \
             at com.example.Widget\n\
             [Permisos] Processing did not complete. See error above for details.\n"
        );
    }

    #[test]
    fn test_colored_trailer() {
        let handler = handler_with_error();
        let mut buffer = Buffer::ansi();
        handler.emit_all(&mut buffer).unwrap();
        let text = String::from_utf8(buffer.into_inner()).unwrap();
        assert!(text.contains("\x1b[0m"));
        assert!(text.contains("\x1b[1m"));
        assert!(text.contains("\x1b[31m"));
    }

    #[test]
    fn test_check_errors_drains() {
        let mut handler = handler_with_error();
        handler.record_message("second", None);
        assert!(handler.has_errors());
        let drained = handler.check_errors().unwrap_err();
        assert_eq!(drained.len(), 2);
        assert!(drained[1].elements.is_empty());
        assert!(handler.check_errors().is_ok());
    }
}

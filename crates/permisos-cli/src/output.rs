//! Colored terminal output
//!
//! Honors `NO_COLOR`; otherwise colors only when the stream is a terminal.

use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Color choice for this process
pub fn color_choice() -> ColorChoice {
    if std::env::var_os("NO_COLOR").is_some() {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    }
}

/// Standard output with the process color choice
pub fn stdout() -> StandardStream {
    StandardStream::stdout(color_choice())
}

/// Standard error with the process color choice
pub fn stderr() -> StandardStream {
    StandardStream::stderr(color_choice())
}

/// `label` in bold green, then `text`
pub fn status<W: WriteColor>(out: &mut W, label: &str, text: &str) -> io::Result<()> {
    let mut spec = ColorSpec::new();
    spec.set_fg(Some(Color::Green)).set_bold(true);
    out.set_color(&spec)?;
    write!(out, "{:>12}", label)?;
    out.reset()?;
    writeln!(out, " {}", text)
}

/// `key:` in bold, then `value`
pub fn field<W: WriteColor>(out: &mut W, key: &str, value: &str) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_bold(true))?;
    write!(out, "{}:", key)?;
    out.reset()?;
    writeln!(out, " {}", value)
}

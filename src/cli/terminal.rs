//! Coloured terminal output

use owo_colors::{colors::css, OwoColorize};

/// Detects whether colored output should be enabled
pub fn supports_color() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

fn styled(text: &str, style: impl FnOnce(&str) -> String) -> String {
    if supports_color() {
        style(text)
    } else {
        text.to_string()
    }
}

/// Extension trait for colorizing output
pub trait Colorize {
    /// Color as success (green)
    fn success(&self) -> String;
    /// Color as warning (amber)
    fn warning(&self) -> String;
    /// Color as info (blue)
    fn info(&self) -> String;
    /// Dim the text
    fn dim(&self) -> String;
}

impl<T: AsRef<str> + ?Sized> Colorize for T {
    fn success(&self) -> String {
        styled(self.as_ref(), |text| text.fg::<css::Green>().to_string())
    }

    fn warning(&self) -> String {
        styled(self.as_ref(), |text| text.fg::<css::Orange>().to_string())
    }

    fn info(&self) -> String {
        styled(self.as_ref(), |text| text.fg::<css::LightBlue>().to_string())
    }

    fn dim(&self) -> String {
        styled(self.as_ref(), |text| text.dimmed().to_string())
    }
}

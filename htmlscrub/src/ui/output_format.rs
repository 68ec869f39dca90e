//! Formatting of the one-line status messages written to stderr.

use owo_colors::OwoColorize;
use std::io::{self, Write};

use crate::ui::theme::{ThemeEntry, ThemeMap};

/// Applies the theme color for `entry` to `text` when color is supported.
pub fn styled(text: &str, entry: ThemeEntry, theme_map: &ThemeMap, supports_color: bool) -> String {
    if !supports_color {
        return text.to_string();
    }
    match theme_map.get(&entry).and_then(|style| style.fg.as_ref()) {
        Some(color) => text.color(color.to_ansi_color()).to_string(),
        None => text.to_string(),
    }
}

fn print_message<W: Write + ?Sized>(
    writer: &mut W,
    prefix: &str,
    msg: &str,
    entry: ThemeEntry,
    theme_map: &ThemeMap,
    supports_color: bool,
) -> io::Result<()> {
    writeln!(writer, "{}", styled(&format!("{}{}", prefix, msg), entry, theme_map, supports_color))
}

pub fn print_info_message<W: Write + ?Sized>(writer: &mut W, msg: &str, theme_map: &ThemeMap, supports_color: bool) -> io::Result<()> {
    print_message(writer, "", msg, ThemeEntry::Info, theme_map, supports_color)
}

pub fn print_success_message<W: Write + ?Sized>(writer: &mut W, msg: &str, theme_map: &ThemeMap, supports_color: bool) -> io::Result<()> {
    print_message(writer, "", msg, ThemeEntry::Success, theme_map, supports_color)
}

pub fn print_warn_message<W: Write + ?Sized>(writer: &mut W, msg: &str, theme_map: &ThemeMap, supports_color: bool) -> io::Result<()> {
    print_message(writer, "Warning: ", msg, ThemeEntry::Warn, theme_map, supports_color)
}

pub fn print_error_message<W: Write + ?Sized>(writer: &mut W, msg: &str, theme_map: &ThemeMap, supports_color: bool) -> io::Result<()> {
    print_message(writer, "Error: ", msg, ThemeEntry::Error, theme_map, supports_color)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::theme::ThemeStyle;

    #[test]
    fn plain_output_without_color() {
        let theme = ThemeStyle::default_theme_map();
        let mut out = Vec::new();
        print_error_message(&mut out, "bad rules", &theme, false).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Error: bad rules\n");
    }

    #[test]
    fn colored_output_contains_escape_codes() {
        let theme = ThemeStyle::default_theme_map();
        let text = styled("ok", ThemeEntry::Success, &theme, true);
        assert!(text.contains("\u{1b}["));
        assert!(text.contains("ok"));
    }
}

// htmlscrub/src/ui/diff_viewer.rs
//! Line diff between the input markup and the sanitised markup.
//!
//! Markup is broken after every tag before diffing, so a change inside a
//! single long line of HTML shows up as a small, readable hunk.

use anyhow::Result;
use diffy::{create_patch, Line as DiffLine};
use std::io::Write;

use crate::ui::output_format::styled;
use crate::ui::theme::{ThemeEntry, ThemeMap};

/// Splits markup so each tag starts on its own line.
pub fn break_tags(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len() + markup.len() / 8);
    let mut chars = markup.chars().peekable();
    while let Some(c) = chars.next() {
        out.push(c);
        if c == '>' && chars.peek().is_some_and(|next| *next != '\n') {
            out.push('\n');
        }
    }
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// Writes a unified-style diff of `original` against `sanitized`.
pub fn print_diff<W: Write + ?Sized>(
    original: &str,
    sanitized: &str,
    writer: &mut W,
    theme_map: &ThemeMap,
    supports_color: bool,
) -> Result<()> {
    let before = break_tags(original);
    let after = break_tags(sanitized);
    let patch = create_patch(&before, &after);

    writeln!(writer, "{}", styled("--- Diff View ---", ThemeEntry::DiffHeader, theme_map, supports_color))?;

    let mut changed = false;
    for hunk in patch.hunks() {
        for line in hunk.lines() {
            match line {
                DiffLine::Delete(s) => {
                    changed = true;
                    let text = format!("-{}", s.trim_end_matches('\n'));
                    writeln!(writer, "{}", styled(&text, ThemeEntry::DiffRemoved, theme_map, supports_color))?;
                }
                DiffLine::Insert(s) => {
                    changed = true;
                    let text = format!("+{}", s.trim_end_matches('\n'));
                    writeln!(writer, "{}", styled(&text, ThemeEntry::DiffAdded, theme_map, supports_color))?;
                }
                DiffLine::Context(s) => {
                    writeln!(writer, " {}", s.trim_end_matches('\n'))?;
                }
            }
        }
    }

    if !changed {
        writeln!(writer, "No changes were made.")?;
    }
    writeln!(writer, "{}", styled("-----------------", ThemeEntry::DiffHeader, theme_map, supports_color))?;
    Ok(())
}

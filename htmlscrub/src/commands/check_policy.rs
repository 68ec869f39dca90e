// htmlscrub/src/commands/check_policy.rs
//! `check-policy` command: compiles rule text and prints the policy.

use anyhow::Result;
use is_terminal::IsTerminal;
use std::io::{self, Write};

use htmlscrub_core::compile;

use crate::ui::output_format::styled;
use crate::ui::theme::{ThemeEntry, ThemeMap};

/// Compiles `rules` and writes one canonical element spec per line.
///
/// A malformed rule string surfaces as the `PolicyFormatError`, which names
/// the offending fragment.
pub fn run_check_policy(rules: &str, theme_map: &ThemeMap) -> Result<()> {
    let policy = compile(rules)?;

    let stdout = io::stdout();
    let supports_color = stdout.is_terminal();
    let mut writer = stdout.lock();

    writeln!(
        writer,
        "{}",
        styled(
            &format!("Policy OK: {} element entries", policy.len()),
            ThemeEntry::Success,
            theme_map,
            supports_color
        )
    )?;
    if !policy.global_attributes().is_empty() {
        let globals: Vec<String> = policy.global_attributes().iter().map(ToString::to_string).collect();
        writeln!(writer, "@[{}]", globals.join("|"))?;
    }
    for line in policy.describe() {
        writeln!(writer, "{}", line)?;
    }
    Ok(())
}

// htmlscrub/src/ui/summary.rs
//! Tabular summary of the changes a sanitisation pass made.

use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use std::io::Write;

use htmlscrub_core::SanitizationSummaryItem;

use crate::ui::output_format::styled;
use crate::ui::theme::{ThemeEntry, ThemeMap};

/// Number of distinct targets listed per action before eliding the rest.
const MAX_TARGETS_SHOWN: usize = 6;

fn format_targets(targets: &[String]) -> String {
    if targets.len() <= MAX_TARGETS_SHOWN {
        return targets.join(", ");
    }
    format!(
        "{} (+{} more)",
        targets[..MAX_TARGETS_SHOWN].join(", "),
        targets.len() - MAX_TARGETS_SHOWN
    )
}

/// Total number of changes across all summary items.
pub fn total_occurrences(summary: &[SanitizationSummaryItem]) -> usize {
    summary.iter().map(|item| item.occurrences).sum()
}

pub fn print_summary<W: Write + ?Sized>(
    summary: &[SanitizationSummaryItem],
    writer: &mut W,
    theme_map: &ThemeMap,
    supports_color: bool,
) -> Result<()> {
    writeln!(writer, "{}", styled("--- Sanitisation Summary ---", ThemeEntry::Header, theme_map, supports_color))?;

    if summary.is_empty() {
        writeln!(writer, "{}", styled("No changes were necessary.", ThemeEntry::Success, theme_map, supports_color))?;
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Action", "Occurrences", "Targets"]);
    if !supports_color {
        table.force_no_tty();
    }

    for item in summary {
        table.add_row(vec![
            styled(item.action.as_str(), ThemeEntry::SummaryAction, theme_map, supports_color),
            styled(&item.occurrences.to_string(), ThemeEntry::SummaryOccurrences, theme_map, supports_color),
            format_targets(&item.targets),
        ]);
    }

    writeln!(writer, "{}", table)?;
    writeln!(writer, "Total changes: {}", total_occurrences(summary))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::theme::ThemeStyle;
    use htmlscrub_core::SanitiseAction;

    #[test]
    fn long_target_lists_are_elided() {
        let targets: Vec<String> = (0..8).map(|i| format!("t{}", i)).collect();
        assert_eq!(format_targets(&targets), "t0, t1, t2, t3, t4, t5 (+2 more)");
    }

    #[test]
    fn summary_lists_actions_and_total() {
        let summary = vec![SanitizationSummaryItem {
            action: SanitiseAction::ElementUnwrapped,
            occurrences: 2,
            targets: vec!["div".to_string()],
        }];
        let mut out = Vec::new();
        print_summary(&summary, &mut out, &ThemeStyle::default_theme_map(), false).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("element_unwrapped"));
        assert!(text.contains("Total changes: 2"));
    }
}

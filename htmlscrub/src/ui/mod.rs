//! Terminal presentation: theme, status messages, diff and summary output.

pub mod diff_viewer;
pub mod output_format;
pub mod summary;
pub mod theme;

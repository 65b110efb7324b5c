//! Terminal renderer: per-component unified diffs and a summary.

use colored::Colorize;

use crate::config::ColorMode;
use crate::models::{ComponentDiff, DiffResult};
use crate::output::OutputRenderer;

/// Apply the `--color` choice to the global `colored` switch.
///
/// `Auto` leaves `colored`'s own terminal detection in charge.
pub fn apply_color_mode(mode: ColorMode) {
    match mode {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => colored::control::unset_override(),
    }
}

/// Terminal output renderer.
pub struct TerminalRenderer;

impl TerminalRenderer {
    /// One component: a header line, the diff (or build error), a blank line.
    pub fn component(&self, cd: &ComponentDiff) -> String {
        let mut output = String::new();

        if let Some(error) = &cd.error {
            let header = format!("=== {} ({}) === BUILD ERROR", cd.path, cd.env);
            output.push_str(&format!("{}\n", header.red().bold()));
            output.push_str(&format!("{}\n", error.red()));
            output.push('\n');
            return output;
        }

        let header = format!(
            "=== {} ({}) === +{} -{}",
            cd.path, cd.env, cd.added, cd.removed
        );
        output.push_str(&format!("{}\n", header.cyan().bold()));
        for line in cd.diff.lines() {
            output.push_str(&format!("{}\n", colorize_line(line)));
        }
        output.push('\n');
        output
    }

    /// Aggregate statistics for a whole run.
    pub fn summary(&self, result: &DiffResult) -> String {
        if result.is_empty() {
            return "\nNo render differences detected.\n".to_string();
        }

        let mut output = String::from("\n--- Summary ---\n");
        for d in &result.sorted().diffs {
            if d.is_error() {
                output.push_str(&format!(
                    "  {} ({}): {}\n",
                    d.path,
                    d.env,
                    "BUILD ERROR".red()
                ));
            } else {
                output.push_str(&format!(
                    "  {} ({}): {} {}\n",
                    d.path,
                    d.env,
                    format!("+{}", d.added).green(),
                    format!("-{}", d.removed).red()
                ));
            }
        }
        output.push_str(&format!(
            "\nTotal: {} components, +{} -{} lines\n",
            result.len(),
            result.total_added,
            result.total_removed
        ));
        output
    }
}

impl OutputRenderer for TerminalRenderer {
    fn render(&self, result: &DiffResult) -> String {
        let mut output = String::new();
        for cd in &result.sorted().diffs {
            output.push_str(&self.component(cd));
        }
        output.push_str(&self.summary(result));
        output
    }
}

fn colorize_line(line: &str) -> String {
    if line.starts_with("+++") || line.starts_with("---") {
        line.bold().to_string()
    } else if line.starts_with("@@") {
        line.cyan().to_string()
    } else if line.starts_with('+') {
        line.green().to_string()
    } else if line.starts_with('-') {
        line.red().to_string()
    } else {
        line.to_string()
    }
}

use owo_colors::OwoColorize;
use rolemark_core::{LabelSummary, Role, StatsSnapshot};

use crate::VERSION;

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!(
        "\n{} {} {}",
        "Rolemark".bold().bright_blue(),
        "v".dimmed(),
        VERSION.dimmed()
    );
    eprintln!("{}", "Label HTML elements with mobile layout roles\n".dimmed());
}

/// Print a styled step message
pub fn print_step(step: usize, total: usize, message: &str) {
    eprintln!("{} {}", format!("[{}/{}]", step, total).dimmed(), message.bright_cyan());
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message.bright_blue());
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message.bright_yellow());
}

/// Print labeling details
pub fn print_label_details(summary: &LabelSummary) {
    eprintln!("\n{}", "═".repeat(60).dimmed());
    eprintln!("{}", "Labeling Details".bold().cyan());
    eprintln!("{}", "═".repeat(60).dimmed());

    for role in Role::ALL {
        let ids = summary.ids.get(role);
        if ids.is_empty() {
            continue;
        }
        eprintln!(
            "  {} {}",
            format!("{:<14}", format!("{}:", role)).dimmed(),
            ids.join(", ").bright_white()
        );
    }
    eprintln!(
        "  {} {} labeled, {} inferred, {} unlabeled, {} ambiguous\n",
        "Elements:".dimmed(),
        summary.labeled.to_string().bright_white(),
        summary.inferred.to_string().bright_white(),
        summary.unlabeled.to_string().bright_white(),
        summary.ambiguous.to_string().bright_white()
    );
}

/// Print the counters reported while labeling
pub fn print_counters(stats: &StatsSnapshot) {
    eprintln!("{}", "Counters".bold().cyan());
    eprintln!(
        "  {} {}  {} {}",
        "pages labeled:".dimmed(),
        stats.pages_labeled.to_string().bright_white(),
        "pages with roles added:".dimmed(),
        stats.pages_role_added.to_string().bright_white()
    );
}

/// Format file size for display
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * KB;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

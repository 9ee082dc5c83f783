//! Console styling for the human-facing subcommands.

use console::{style, Style};

fn marked(mark: &str, color: Style, msg: &str) -> String {
    format!("{} {}", color.apply_to(mark), msg)
}

/// Green check mark line.
pub fn success(msg: &str) -> String {
    marked("✓", Style::new().green(), msg)
}

/// Red cross line.
pub fn error(msg: &str) -> String {
    marked("✗", Style::new().red(), msg)
}

/// Yellow warning line.
pub fn warn(msg: &str) -> String {
    marked("⚠", Style::new().yellow(), msg)
}

pub fn header(msg: &str) -> String {
    style(msg).bold().to_string()
}

pub fn dim(msg: &str) -> String {
    style(msg).dim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_output_without_colors() {
        console::set_colors_enabled(false);
        assert_eq!(success("realm written"), "✓ realm written");
        assert_eq!(error("bad config"), "✗ bad config");
        assert_eq!(warn("2 skipped"), "⚠ 2 skipped");
        assert_eq!(header("Summary"), "Summary");
        assert_eq!(dim("defaults"), "defaults");
    }
}

use ansi_term::{Colour, Style};

use crate::{cli::favicon::FaviconService, utils::percentage::share_percentage};

use super::{analysis::UsageStats, StatsView};

/// Items shown before the list is collapsed.
pub const DEFAULT_VISIBLE_ITEMS: usize = 5;
const BAR_WIDTH: usize = 24;
pub const NO_ACTIVITY_PLACEHOLDER: &str = "No activity recorded yet.";

pub struct RenderOptions {
    /// Show every item instead of the first [DEFAULT_VISIBLE_ITEMS].
    pub expanded: bool,
    pub colored: bool,
    pub favicons: Option<FaviconService>,
}

/// Formats milliseconds the way the totals are displayed: `1h 1m`, `1m 5s` or `9s`. Always
/// truncates.
pub fn format_time(ms: u64) -> String {
    let seconds = ms / 1000;
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let seconds = seconds % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

fn paint(style: Style, text: &str, colored: bool) -> String {
    if colored {
        style.paint(text).to_string()
    } else {
        text.to_string()
    }
}

/// Bar proportional to the share of the biggest item.
fn usage_bar(value_ms: u64, max_ms: u64) -> String {
    let filled = (*share_percentage(value_ms, max_ms) / 100. * BAR_WIDTH as f64).floor() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

pub fn render_stats(stats: &UsageStats, view: StatsView, options: &RenderOptions) -> String {
    let heading = match view {
        StatsView::Daily => "Today",
        StatsView::Weekly => "Last 7 days",
    };
    let mut lines = vec![
        format!(
            "{}  {}",
            paint(Style::new().bold(), heading, options.colored),
            paint(
                Colour::Cyan.bold(),
                &format_time(stats.total_ms),
                options.colored
            )
        ),
        String::new(),
    ];

    if stats.is_empty() {
        lines.push(paint(
            Colour::Fixed(246).normal(),
            NO_ACTIVITY_PLACEHOLDER,
            options.colored,
        ));
        return join_lines(lines);
    }

    let shown = if options.expanded {
        &stats.items[..]
    } else {
        &stats.items[..stats.items.len().min(DEFAULT_VISIBLE_ITEMS)]
    };
    let max_ms = stats.max_ms();
    let domain_width = shown.iter().map(|i| i.domain.chars().count()).max().unwrap_or(0);

    lines.extend(shown.iter().map(|item| {
        let mut line = format!(
            "{:<domain_width$}  {}  {:>7}",
            item.domain,
            paint(
                Colour::Blue.normal(),
                &usage_bar(item.total_ms, max_ms),
                options.colored
            ),
            format_time(item.total_ms),
        );
        if let Some(favicons) = &options.favicons {
            line.push_str("  ");
            line.push_str(favicons.lookup_url(&item.domain).as_str());
        }
        line
    }));

    if stats.items.len() > DEFAULT_VISIBLE_ITEMS {
        let toggle = if options.expanded {
            "Show Less".to_string()
        } else {
            format!(
                "Show More ({} more, pass --all)",
                stats.items.len() - DEFAULT_VISIBLE_ITEMS
            )
        };
        lines.push(String::new());
        lines.push(paint(Colour::Fixed(246).italic(), &toggle, options.colored));
    }

    join_lines(lines)
}

fn join_lines(lines: Vec<String>) -> String {
    let mut output = lines.join("\n");
    output.push('\n');
    output
}

#[cfg(test)]
mod tests {
    use crate::cli::{
        favicon::{FaviconService, DEFAULT_FAVICON_SERVICE},
        output::{
            analysis::{DomainUsage, UsageStats},
            StatsView,
        },
    };

    use super::{format_time, render_stats, usage_bar, RenderOptions, NO_ACTIVITY_PLACEHOLDER};

    fn plain(expanded: bool) -> RenderOptions {
        RenderOptions {
            expanded,
            colored: false,
            favicons: None,
        }
    }

    fn stats(values: &[(&str, u64)]) -> UsageStats {
        UsageStats {
            items: values
                .iter()
                .map(|(d, ms)| DomainUsage {
                    domain: (*d).into(),
                    total_ms: *ms,
                })
                .collect(),
            total_ms: values.iter().map(|(_, ms)| ms).sum(),
        }
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(3661000), "1h 1m");
        assert_eq!(format_time(65000), "1m 5s");
        assert_eq!(format_time(9000), "9s");
        assert_eq!(format_time(59999), "59s");
        assert_eq!(format_time(0), "0s");
        assert_eq!(format_time(3600000 * 30 + 59000), "30h 0m");
    }

    #[test]
    fn test_bar_is_relative_to_maximum() {
        assert_eq!(usage_bar(9000, 9000), "█".repeat(24));
        assert_eq!(usage_bar(4500, 9000), format!("{}{}", "█".repeat(12), "░".repeat(12)));
        assert_eq!(usage_bar(0, 9000), "░".repeat(24));
    }

    #[test]
    fn test_empty_stats_render_placeholder() {
        let output = render_stats(&UsageStats::default(), StatsView::Daily, &plain(false));

        assert_eq!(output, format!("Today  0s\n\n{NO_ACTIVITY_PLACEHOLDER}\n"));
    }

    #[test]
    fn test_list_is_capped_until_expanded() {
        let stats = stats(&[
            ("a.com", 700_000),
            ("bb.com", 600_000),
            ("c.com", 500_000),
            ("d.com", 400_000),
            ("e.com", 300_000),
            ("f.com", 200_000),
            ("g.com", 1_000),
        ]);

        let collapsed = render_stats(&stats, StatsView::Weekly, &plain(false));
        assert!(collapsed.starts_with("Last 7 days  45m 1s"));
        assert!(collapsed.contains("e.com "));
        assert!(!collapsed.contains("f.com"));
        assert!(collapsed.contains("Show More (2 more, pass --all)"));

        let expanded = render_stats(&stats, StatsView::Weekly, &plain(true));
        assert!(expanded.contains("g.com "));
        assert!(expanded.contains("Show Less"));
    }

    #[test]
    fn test_items_line_up() {
        let output = render_stats(
            &stats(&[("docs.rs", 3661000), ("a.io", 65000)]),
            StatsView::Daily,
            &plain(false),
        );
        let lines = output.lines().skip(2).collect::<Vec<_>>();

        assert_eq!(
            lines,
            vec![
                format!("docs.rs  {}    1h 1m", "█".repeat(24)),
                format!("a.io     {}{}    1m 5s", "█".repeat(0), "░".repeat(24)),
            ]
        );
        assert!(!output.contains("Show"));
    }

    #[test]
    fn test_favicon_column() {
        let options = RenderOptions {
            expanded: false,
            colored: false,
            favicons: Some(FaviconService::new(
                url::Url::parse(DEFAULT_FAVICON_SERVICE).unwrap(),
            )),
        };
        let output = render_stats(&stats(&[("a.com", 1000)]), StatsView::Daily, &options);

        assert!(output.contains("pageUrl=https%3A%2F%2Fa.com"));
    }
}

//! Text output formatting: aligned tables and colored status marks.

use std::path::Path;

use earncal_core::ResultSet;
use earncal_store::Config;

use super::json::CrumbReport;

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";

/// Cells wider than this are cut with an ellipsis.
const MAX_CELL_WIDTH: usize = 32;

const COLUMN_GAP: &str = "  ";

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
    max_cell_width: usize,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self {
            use_colors,
            max_cell_width: MAX_CELL_WIDTH,
        }
    }

    /// Formats a result set as an aligned table with a row count footer.
    pub fn format_results(&self, results: &ResultSet) -> String {
        let columns = results.columns();
        let rows: Vec<Vec<String>> = results
            .rows()
            .map(|cells| {
                cells
                    .iter()
                    .map(|cell| {
                        if cell.is_missing() {
                            "-".to_string()
                        } else {
                            self.fit(&cell.to_string())
                        }
                    })
                    .collect()
            })
            .collect();

        let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut lines = Vec::with_capacity(rows.len() + 4);
        lines.push(self.bold(&render_row(columns, &widths)));
        let rule_width =
            widths.iter().sum::<usize>() + COLUMN_GAP.len() * widths.len().saturating_sub(1);
        lines.push("─".repeat(rule_width));
        for row in &rows {
            lines.push(render_row(row, &widths));
        }

        lines.push(String::new());
        let footer = match results.len() {
            0 => "No earnings events found".to_string(),
            1 => "1 event".to_string(),
            n => format!("{n} events"),
        };
        lines.push(self.dim(&footer));

        lines.join("\n")
    }

    /// Formats the attempts of one crumb chain run.
    pub fn format_crumb_report(&self, report: &CrumbReport) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Crumb chain for {}", self.bold(&report.date.to_string())));
        lines.push("─".repeat(40));

        let id_width = report
            .attempts
            .iter()
            .map(|a| a.strategy.len())
            .max()
            .unwrap_or(0);
        for attempt in &report.attempts {
            let mark = if attempt.success {
                self.green("✓")
            } else {
                self.red("✗")
            };
            let mut line = format!(
                "{mark} {:<id_width$}  {}",
                attempt.strategy,
                self.dim(&format!("{} ms", attempt.duration_ms)),
            );
            if let Some(error) = &attempt.error {
                line.push_str(&format!("\n    {error}"));
            }
            lines.push(line);
        }

        lines.push(String::new());
        match (&report.strategy, &report.error) {
            (Some(strategy), _) => {
                let mut summary = format!("Credential: {} via {strategy}", self.green("complete"));
                if let Some(name) = &report.cookie_name {
                    summary.push_str(&format!(" (cookie {name}"));
                    if let Some(len) = report.crumb_length {
                        summary.push_str(&format!(", crumb {len} chars"));
                    }
                    summary.push(')');
                }
                lines.push(summary);
                if let Some(crumb) = &report.crumb {
                    lines.push(format!("Crumb: {crumb}"));
                }
            }
            (None, error) => {
                lines.push(format!(
                    "Credential: {}",
                    self.red(error.as_deref().unwrap_or("not obtained"))
                ));
            }
        }

        lines.join("\n")
    }

    /// Formats the effective configuration.
    pub fn format_config(&self, config: &Config, path: &Path) -> String {
        let yahoo = &config.yahoo;
        let endpoints = config.endpoints();

        let mut lines = vec![
            self.bold("earncal Configuration"),
            "─".repeat(40),
            format!("Config file:   {}", self.dim(&path.display().to_string())),
            String::new(),
            format!("Log level:     {}", config.general.log_level),
            format!("Timeout:       {}s", yahoo.timeout_secs),
            format!("Region:        {}", yahoo.region),
            format!("Page size:     {}", yahoo.page_size),
            format!("Request delay: {} ms", yahoo.request_delay_ms),
            format!("User-Agent:    {}", self.fit(&yahoo.user_agent)),
        ];

        if !yahoo.endpoints.is_empty() {
            lines.push(String::new());
            lines.push(self.dim("Endpoint overrides:"));
            lines.push(format!("  cookie:        {}", endpoints.cookie_url));
            lines.push(format!("  crumb:         {}", endpoints.crumb_url));
            lines.push(format!("  calendar:      {}", endpoints.calendar_url));
            lines.push(format!("  visualization: {}", endpoints.visualization_url));
        }

        lines.join("\n")
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn fit(&self, text: &str) -> String {
        if text.chars().count() <= self.max_cell_width {
            return text.to_string();
        }
        let kept: String = text.chars().take(self.max_cell_width - 1).collect();
        format!("{kept}…")
    }

    fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.use_colors {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }
}

fn render_row(cells: &[String], widths: &[usize]) -> String {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join(COLUMN_GAP);
    line.trim_end().to_string()
}

// ============================================================================
// Tests
// ============================================================================

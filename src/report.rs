//! Rendering run summaries and status reports

use std::io::Write;

use anyhow::Result;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::config::OutputFormat;
use crate::pipeline::{RunSummary, StoreStatus};

/// Trait for report formatters
pub trait ReportFormatter {
    /// Render the outcome of a run
    fn render_run(&self, summary: &RunSummary, writer: &mut dyn WriteColor) -> Result<()>;

    /// Render a remote status probe
    fn render_status(&self, status: &StoreStatus, writer: &mut dyn WriteColor) -> Result<()>;
}

/// Create a formatter for an output format
pub fn formatter(format: OutputFormat) -> Box<dyn ReportFormatter> {
    match format {
        OutputFormat::Terminal => Box::new(TerminalReport::new()),
        OutputFormat::Json => Box::new(JsonReport::new()),
    }
}

fn stdout_for(format: OutputFormat) -> StandardStream {
    let choice = match format {
        OutputFormat::Terminal => ColorChoice::Auto,
        OutputFormat::Json => ColorChoice::Never,
    };
    StandardStream::stdout(choice)
}

/// Render a run summary to stdout
pub fn render_to_stdout(summary: &RunSummary, format: OutputFormat) -> Result<()> {
    let mut stdout = stdout_for(format);
    formatter(format).render_run(summary, &mut stdout)
}

/// Render a status report to stdout
pub fn render_status_to_stdout(status: &StoreStatus, format: OutputFormat) -> Result<()> {
    let mut stdout = stdout_for(format);
    formatter(format).render_status(status, &mut stdout)
}

/// Human-readable report with colors
pub struct TerminalReport;

impl TerminalReport {
    pub fn new() -> Self {
        Self
    }

    fn write_colored(
        &self,
        writer: &mut dyn WriteColor,
        color: Color,
        text: &str,
    ) -> Result<()> {
        writer.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
        write!(writer, "{}", text)?;
        writer.reset()?;
        Ok(())
    }

    fn write_header(&self, summary: &RunSummary, writer: &mut dyn WriteColor) -> Result<()> {
        writeln!(writer, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        writeln!(writer, " ordersync: {}", summary.input_file.display())?;
        writeln!(writer, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        writeln!(writer)?;
        Ok(())
    }

    fn write_counts(&self, summary: &RunSummary, writer: &mut dyn WriteColor) -> Result<()> {
        let c = &summary.counts;
        let data = vec![
            vec!["class".to_string(), "rows".to_string()],
            vec!["new".to_string(), c.new.to_string()],
            vec!["updated".to_string(), c.updated.to_string()],
            vec!["retained".to_string(), c.retained.to_string()],
            vec!["dropped (unchanged)".to_string(), c.dropped_unchanged.to_string()],
            vec!["quarantined".to_string(), c.quarantined.to_string()],
            vec!["duplicate keys".to_string(), c.duplicate_keys.to_string()],
        ];
        write!(writer, "{}", build_table(&data))?;
        writeln!(
            writer,
            "Input rows: {}   Remote rows: {}",
            c.fresh_rows, c.remote_rows
        )?;
        writeln!(writer)?;
        Ok(())
    }

    fn write_updated(&self, summary: &RunSummary, writer: &mut dyn WriteColor) -> Result<()> {
        if summary.updated_orders.is_empty() {
            return Ok(());
        }

        writeln!(writer, "Updated Orders:")?;
        for order in &summary.updated_orders {
            writeln!(writer, "  {}:", order.key)?;
            for change in &order.changes {
                write!(writer, "    {}: ", change.field)?;
                self.write_colored(writer, Color::Red, &change.old_value)?;
                write!(writer, " → ")?;
                self.write_colored(writer, Color::Green, &change.new_value)?;
                writeln!(writer)?;
            }
        }
        writeln!(writer)?;
        Ok(())
    }

    fn write_quarantined(&self, summary: &RunSummary, writer: &mut dyn WriteColor) -> Result<()> {
        let quarantined = &summary.parse_report.quarantined;
        if quarantined.is_empty() {
            return Ok(());
        }

        writeln!(writer, "Quarantined Rows:")?;
        for row in quarantined {
            writeln!(
                writer,
                "  line {}: {} cells",
                row.source_line, row.cell_count
            )?;
        }
        writeln!(writer)?;
        Ok(())
    }
}

impl Default for TerminalReport {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for TerminalReport {
    fn render_run(&self, summary: &RunSummary, writer: &mut dyn WriteColor) -> Result<()> {
        self.write_header(summary, writer)?;
        self.write_counts(summary, writer)?;
        self.write_updated(summary, writer)?;
        self.write_quarantined(summary, writer)?;

        if summary.dry_run {
            self.write_colored(writer, Color::Yellow, "Dry run:")?;
            writeln!(writer, " {} rows would be published.", summary.planned_rows)?;
        } else {
            self.write_colored(writer, Color::Green, "Published:")?;
            writeln!(writer, " {} rows.", summary.published_rows)?;
        }
        if !summary.dry_run && !summary.state_saved {
            self.write_colored(writer, Color::Yellow, "Warning:")?;
            writeln!(writer, " run state was not saved.")?;
        }
        Ok(())
    }

    fn render_status(&self, status: &StoreStatus, writer: &mut dyn WriteColor) -> Result<()> {
        if status.connected {
            self.write_colored(writer, Color::Green, "connected")?;
        } else {
            self.write_colored(writer, Color::Red, "disconnected")?;
        }
        writeln!(writer, " sheet '{}'", status.sheet_name)?;
        writeln!(writer, "Orders: {}", status.total_orders)?;
        if let Some(message) = &status.message {
            writeln!(writer, "Error: {}", message)?;
        }
        if let Some(last) = &status.last_run {
            writeln!(
                writer,
                "Last run: {} ({} records) at {}",
                last.last_processed_file,
                last.processed_count,
                last.last_processed_time.to_rfc3339()
            )?;
        }
        Ok(())
    }
}

/// JSON report
pub struct JsonReport {
    pretty: bool,
}

impl JsonReport {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn compact() -> Self {
        Self { pretty: false }
    }

    fn write_value<T: serde::Serialize>(&self, value: &T, writer: &mut dyn WriteColor) -> Result<()> {
        let json = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        writeln!(writer, "{}", json)?;
        Ok(())
    }
}

impl Default for JsonReport {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for JsonReport {
    fn render_run(&self, summary: &RunSummary, writer: &mut dyn WriteColor) -> Result<()> {
        self.write_value(summary, writer)
    }

    fn render_status(&self, status: &StoreStatus, writer: &mut dyn WriteColor) -> Result<()> {
        self.write_value(status, writer)
    }
}

/// Build a box-drawn table; the first row is the header
fn build_table(data: &[Vec<String>]) -> String {
    if data.is_empty() || data[0].is_empty() {
        return String::new();
    }

    let col_count = data[0].len();
    let mut col_widths = vec![0usize; col_count];
    for row in data {
        for (i, cell) in row.iter().enumerate().take(col_count) {
            col_widths[i] = col_widths[i].max(cell.chars().count());
        }
    }

    let border = |left: char, mid: char, right: char| {
        let mut line = String::new();
        line.push(left);
        for (i, width) in col_widths.iter().enumerate() {
            line.push_str(&"─".repeat(width + 2));
            line.push(if i + 1 < col_count { mid } else { right });
        }
        line.push('\n');
        line
    };
    let row_line = |row: &Vec<String>| {
        let mut line = String::from("│");
        for (i, width) in col_widths.iter().enumerate() {
            let cell = row.get(i).map(String::as_str).unwrap_or("");
            line.push_str(&format!(" {:width$} │", cell, width = *width));
        }
        line.push('\n');
        line
    };

    let mut output = border('┌', '┬', '┐');
    output.push_str(&row_line(&data[0]));
    output.push_str(&border('├', '┼', '┤'));
    for row in &data[1..] {
        output.push_str(&row_line(row));
    }
    output.push_str(&border('└', '┴', '┘'));
    output
}

use std::io;

use console::{measure_text_width, style, Term};
use reasoner::models::display::{DisplayEvent, DisplaySink};
use reasoner::models::stream::Channel;

/// Renders display events on stdout.
///
/// Provisional text is drawn as it arrives and erased again when the unit it
/// belongs to comes back formatted. When stdout is not a terminal only units
/// are written.
pub struct TerminalSink {
    term: Term,
    interactive: bool,
    spinner: Option<cliclack::ProgressBar>,
    channel: Option<Channel>,
    /// Committed text on the cursor's line, as written
    tail: String,
    /// Provisional text written since the last unit
    provisional: String,
}

impl TerminalSink {
    pub fn new(spinner: Option<cliclack::ProgressBar>) -> Self {
        let term = Term::stdout();
        Self {
            interactive: term.is_term(),
            term,
            spinner,
            channel: None,
            tail: String::new(),
            provisional: String::new(),
        }
    }

    fn render(&mut self, event: DisplayEvent) -> io::Result<()> {
        if let Some(spinner) = self.spinner.take() {
            spinner.stop("");
        }
        match event {
            DisplayEvent::Provisional { channel, text } => {
                self.enter(channel)?;
                if self.interactive {
                    let styled = paint(channel, &text);
                    self.term.write_str(&styled)?;
                    self.provisional.push_str(&styled);
                }
            }
            DisplayEvent::Unit { channel, text } => {
                self.enter(channel)?;
                self.erase_provisional()?;
                let styled = paint(channel, &text);
                self.term.write_str(&styled)?;
                self.tail = next_tail(&self.tail, &styled);
            }
            DisplayEvent::Error { message } => {
                self.erase_provisional()?;
                self.end_line()?;
                self.term
                    .write_line(&style(format!("Error: {}", message)).red().to_string())?;
            }
        }
        self.term.flush()
    }

    /// Print a header when the stream moves to another channel
    fn enter(&mut self, channel: Channel) -> io::Result<()> {
        if self.channel == Some(channel) {
            return Ok(());
        }
        self.erase_provisional()?;
        self.end_line()?;
        if self.channel.is_some() {
            self.term.write_line("")?;
        }
        let header = match channel {
            Channel::Reasoning => style("Thinking").dim().italic().to_string(),
            Channel::Answer => style("Answer").bold().cyan().to_string(),
        };
        self.term.write_line(&header)?;
        self.channel = Some(channel);
        Ok(())
    }

    fn erase_provisional(&mut self) -> io::Result<()> {
        if self.provisional.is_empty() {
            return Ok(());
        }
        let shown = format!("{}{}", self.tail, self.provisional);
        let rows = rows_spanned(&shown, self.term.size().1 as usize);
        self.term.clear_line()?;
        if rows > 0 {
            self.term.clear_last_lines(rows)?;
        }
        self.term.write_str(&self.tail)?;
        self.provisional.clear();
        Ok(())
    }

    fn end_line(&mut self) -> io::Result<()> {
        if !self.tail.is_empty() {
            self.term.write_line("")?;
            self.tail.clear();
        }
        Ok(())
    }
}

impl DisplaySink for TerminalSink {
    fn emit(&mut self, event: DisplayEvent) {
        if let Err(err) = self.render(event) {
            tracing::warn!("failed to write to the terminal: {}", err);
        }
    }

    fn close(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.stop("");
        }
        let result = self
            .end_line()
            .and_then(|_| self.term.write_line(""))
            .and_then(|_| self.term.flush());
        if let Err(err) = result {
            tracing::warn!("failed to write to the terminal: {}", err);
        }
    }
}

fn paint(channel: Channel, text: &str) -> String {
    match channel {
        Channel::Reasoning => style(text).dim().to_string(),
        Channel::Answer => text.to_string(),
    }
}

/// What is left on the cursor's line after writing `written` behind `tail`
fn next_tail(tail: &str, written: &str) -> String {
    match written.rfind('\n') {
        Some(index) => written[index + 1..].to_string(),
        None => format!("{}{}", tail, written),
    }
}

/// Rows the cursor moved down while `text` was written from column zero on a
/// terminal `width` columns wide
fn rows_spanned(text: &str, width: usize) -> usize {
    let width = width.max(1);
    let lines: Vec<&str> = text.split('\n').collect();
    let Some((last, complete)) = lines.split_last() else {
        return 0;
    };
    let wrapped: usize = complete
        .iter()
        .map(|line| measure_text_width(line).max(1).div_ceil(width))
        .sum();
    wrapped + measure_text_width(last).saturating_sub(1) / width
}

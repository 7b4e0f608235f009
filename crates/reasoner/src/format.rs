//! Display formatting for completed text units.
//!
//! Every stage is a pure `&str -> String` transform. The pipeline fixes their
//! order per channel:
//! - reasoning: equation formatter
//! - answer: fenced code is cut out first and highlighted; the prose between
//!   fences goes through the equation formatter
//!
//! For HTML output the prose is escaped after formatting, so the only markup
//! in the result is what the code formatter produced.
pub mod code;
pub mod equation;
pub mod symbols;

use crate::models::stream::Channel;
use code::{escape_html, split_fences, CodeBlockFormatter, Segment};
use equation::EquationFormatter;
use symbols::SymbolTable;

/// Output flavor of formatted units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Markup {
    /// Terminal text with 24-bit color escapes
    #[default]
    Ansi,
    /// HTML fragments for the web page
    Html,
}

#[derive(Debug, Clone)]
pub struct FormatOptions {
    pub markup: Markup,
    /// Replace every `*` with `×`. On by default; turn off for markdown-heavy answers.
    pub substitute_asterisk: bool,
    pub theme: String,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            markup: Markup::Ansi,
            substitute_asterisk: true,
            theme: code::DEFAULT_THEME.to_string(),
        }
    }
}

impl FormatOptions {
    pub fn html() -> Self {
        Self {
            markup: Markup::Html,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    markup: Markup,
    equations: EquationFormatter,
    code: CodeBlockFormatter,
}

impl Pipeline {
    pub fn new(options: &FormatOptions) -> Self {
        let symbols = if options.substitute_asterisk {
            SymbolTable::standard()
        } else {
            SymbolTable::standard().without("*")
        };
        Self {
            markup: options.markup,
            equations: EquationFormatter::new(symbols),
            code: CodeBlockFormatter::new(options.markup).with_theme(options.theme.clone()),
        }
    }

    pub fn markup(&self) -> Markup {
        self.markup
    }

    pub fn format(&self, channel: Channel, unit: &str) -> String {
        match channel {
            Channel::Reasoning => self.format_reasoning(unit),
            Channel::Answer => self.format_answer(unit),
        }
    }

    pub fn format_reasoning(&self, unit: &str) -> String {
        self.prose(unit)
    }

    pub fn format_answer(&self, unit: &str) -> String {
        split_fences(unit)
            .into_iter()
            .map(|segment| match segment {
                Segment::Text(text) => self.prose(text),
                Segment::Code { language, body } => self.code.render_block(language, body),
            })
            .collect()
    }

    /// Raw text escaped for the target markup, without any formatting
    pub fn passthrough(&self, text: &str) -> String {
        match self.markup {
            Markup::Ansi => text.to_string(),
            Markup::Html => escape_html(text),
        }
    }

    fn prose(&self, text: &str) -> String {
        let formatted = self.equations.format(text);
        self.passthrough(&formatted)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(&FormatOptions::default())
    }
}

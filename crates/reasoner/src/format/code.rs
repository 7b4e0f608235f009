use lazy_static::lazy_static;
use regex::{Captures, Regex};
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::highlighted_html_for_string;
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::{as_24_bit_terminal_escaped, LinesWithEndings};

use super::Markup;
use crate::errors::FormattingError;

lazy_static! {
    static ref FENCE: Regex = Regex::new(r"(?sm)^```(\w+)?\n(.*?)\n```").unwrap();
    static ref FENCE_MARKER: Regex = Regex::new(r"(?m)^```").unwrap();
    static ref SYNTAX_SET: SyntaxSet = SyntaxSet::load_defaults_newlines();
    static ref THEME_SET: ThemeSet = ThemeSet::load_defaults();
}

pub const DEFAULT_THEME: &str = "base16-ocean.dark";
const ANSI_RESET: &str = "\x1b[0m";

/// A slice of a unit, either prose or the body of a fenced code block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Code {
        language: Option<&'a str>,
        body: &'a str,
    },
}

/// Split a unit into prose and fenced code, in order. Unclosed fences stay prose.
pub fn split_fences(unit: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut last = 0;
    for caps in FENCE.captures_iter(unit) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if whole.start() > last {
            segments.push(Segment::Text(&unit[last..whole.start()]));
        }
        segments.push(Segment::Code {
            language: caps.get(1).map(|m| m.as_str()),
            body: caps.get(2).map_or("", |m| m.as_str()),
        });
        last = whole.end();
    }
    if last < unit.len() {
        segments.push(Segment::Text(&unit[last..]));
    }
    segments
}

/// Number of fence markers opening a line of `text`; odd means a block is still open.
/// Backticks inside a line of prose are not fences.
pub fn fence_count(text: &str) -> usize {
    FENCE_MARKER.find_iter(text).count()
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Syntax highlighting for fenced code blocks
#[derive(Debug, Clone)]
pub struct CodeBlockFormatter {
    markup: Markup,
    theme: String,
}

impl CodeBlockFormatter {
    pub fn new(markup: Markup) -> Self {
        Self {
            markup,
            theme: DEFAULT_THEME.to_string(),
        }
    }

    pub fn with_theme<S: Into<String>>(mut self, theme: S) -> Self {
        self.theme = theme.into();
        self
    }

    /// Replace every fenced block in `unit` with highlighted markup.
    /// Text outside the fences is returned as-is.
    pub fn format(&self, unit: &str) -> String {
        FENCE
            .replace_all(unit, |caps: &Captures| {
                let language = caps.get(1).map(|m| m.as_str());
                let body = caps.get(2).map_or("", |m| m.as_str());
                self.render_block(language, body)
            })
            .into_owned()
    }

    /// Highlighted block, or an unstyled block when highlighting is not possible
    pub fn render_block(&self, language: Option<&str>, code: &str) -> String {
        match self.highlight(language, code) {
            Ok(markup) => self.wrap(language, &markup),
            Err(err) => {
                tracing::warn!("code block rendered without highlighting: {}", err);
                self.fallback(language, code)
            }
        }
    }

    pub fn highlight(&self, language: Option<&str>, code: &str) -> Result<String, FormattingError> {
        let syntax = resolve_syntax(language)?;
        let theme = self.resolve_theme()?;
        match self.markup {
            Markup::Html => highlighted_html_for_string(code, &SYNTAX_SET, syntax, theme)
                .map_err(|e| FormattingError::Highlight(e.to_string())),
            Markup::Ansi => {
                let mut highlighter = HighlightLines::new(syntax, theme);
                let mut out = String::new();
                for line in LinesWithEndings::from(code) {
                    let ranges = highlighter
                        .highlight_line(line, &SYNTAX_SET)
                        .map_err(|e| FormattingError::Highlight(e.to_string()))?;
                    out.push_str(&as_24_bit_terminal_escaped(&ranges[..], false));
                }
                out.push_str(ANSI_RESET);
                Ok(out)
            }
        }
    }

    fn resolve_theme(&self) -> Result<&'static Theme, FormattingError> {
        THEME_SET
            .themes
            .get(&self.theme)
            .ok_or_else(|| FormattingError::Highlight(format!("unknown theme {}", self.theme)))
    }

    fn wrap(&self, language: Option<&str>, markup: &str) -> String {
        match self.markup {
            Markup::Html => format!("<div class=\"code-block\">{}</div>", markup),
            Markup::Ansi => format!("{}\n{}\n{}", ansi_header(language), markup, ansi_footer()),
        }
    }

    fn fallback(&self, language: Option<&str>, code: &str) -> String {
        match self.markup {
            Markup::Html => format!(
                "<div class=\"code-block\"><pre><code>{}</code></pre></div>",
                escape_html(code)
            ),
            Markup::Ansi => format!("{}\n{}\n{}", ansi_header(language), code, ansi_footer()),
        }
    }
}

impl Default for CodeBlockFormatter {
    fn default() -> Self {
        Self::new(Markup::Ansi)
    }
}

fn resolve_syntax(language: Option<&str>) -> Result<&'static SyntaxReference, FormattingError> {
    let Some(language) = language else {
        return Ok(SYNTAX_SET.find_syntax_plain_text());
    };
    let lower = language.to_lowercase();
    SYNTAX_SET
        .find_syntax_by_token(language)
        .or_else(|| SYNTAX_SET.find_syntax_by_name(language))
        .or_else(|| SYNTAX_SET.find_syntax_by_extension(&lower))
        .ok_or_else(|| FormattingError::UnknownLanguage(language.to_string()))
}

fn ansi_header(language: Option<&str>) -> String {
    format!("\x1b[2m┄┄ {} ┄┄{}", language.unwrap_or("text"), ANSI_RESET)
}

fn ansi_footer() -> String {
    format!("\x1b[2m┄┄┄┄{}", ANSI_RESET)
}

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use super::symbols::{superscript, SymbolTable, SUPERSCRIPT_BASES};

lazy_static! {
    static ref FRACTION: Regex = Regex::new(r"\d+(?:/\d+)+").unwrap();
    static ref EXPONENT: Regex = Regex::new(r"([A-Za-z])\^(\d)").unwrap();
    static ref EQUATION: Regex =
        Regex::new(r"(^|\. |\n)([a-zA-Z0-9_]+\s*=\s*[^.;!?\n]+)").unwrap();
    static ref OPERATOR: Regex = Regex::new(r"[+\-*/=<>]").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

const FRACTION_SLASH: char = '\u{2044}';
const MIN_BOX_WIDTH: usize = 20;

/// Typographic rendering of math inside a completed text unit.
///
/// The steps run in a fixed order and none of them produces text that an
/// earlier or later step would match again, so formatting already formatted
/// text changes nothing.
#[derive(Debug, Clone)]
pub struct EquationFormatter {
    symbols: SymbolTable,
}

impl EquationFormatter {
    pub fn new(symbols: SymbolTable) -> Self {
        Self { symbols }
    }

    pub fn format(&self, unit: &str) -> String {
        if unit.is_empty() {
            return String::new();
        }
        let text = self.symbols.apply(unit);
        let text = format_fractions(&text);
        let text = format_exponents(&text);
        box_equations(&text)
    }
}

impl Default for EquationFormatter {
    fn default() -> Self {
        Self::new(SymbolTable::standard())
    }
}

/// `3/4` becomes `3⁄4`; numerator and denominator are whole digit runs.
/// Longer slash chains such as `12/25/2024` are left alone.
pub fn format_fractions(text: &str) -> String {
    FRACTION
        .replace_all(text, |caps: &Captures| {
            let chain = &caps[0];
            match chain.split_once('/') {
                Some((numerator, denominator)) if !denominator.contains('/') => {
                    format!("{}{}{}", numerator, FRACTION_SLASH, denominator)
                }
                _ => chain.to_string(),
            }
        })
        .into_owned()
}

/// `x^3` becomes `x³` for the whitelisted single-letter bases
pub fn format_exponents(text: &str) -> String {
    EXPONENT
        .replace_all(text, |caps: &Captures| {
            let base = &caps[1];
            let whitelisted = base
                .chars()
                .next()
                .is_some_and(|c| SUPERSCRIPT_BASES.contains(&c));
            if whitelisted {
                format!("{}{}", base, superscript(&caps[2]))
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

/// Normalize operator spacing and swap ASCII operators for typographic ones
pub fn highlight_equation(eq: &str) -> String {
    let spaced = OPERATOR.replace_all(eq, |caps: &Captures| {
        let op = match &caps[0] {
            "*" => "×",
            "/" => "÷",
            "-" => "−",
            other => other,
        };
        format!(" {} ", op)
    });
    WHITESPACE.replace_all(&spaced, " ").trim().to_string()
}

/// Three-line box around `content`, `max(len + 6, 20)` characters wide
pub fn boxed(content: &str) -> String {
    let len = content.chars().count();
    let width = (len + 6).max(MIN_BOX_WIDTH);
    let padding = width - len - 2;
    let left = padding / 2;
    let right = padding - left;
    let rule = "─".repeat(width - 2);
    format!(
        "┌{rule}┐\n│{}{content}{}│\n└{rule}┘",
        " ".repeat(left),
        " ".repeat(right),
    )
}

/// Box standalone `name = expression` runs found at the start of the unit,
/// after a newline, or after `". "`
pub fn box_equations(text: &str) -> String {
    EQUATION
        .replace_all(text, |caps: &Captures| {
            let lead = if &caps[1] == ". " { "." } else { "" };
            let eq = highlight_equation(caps[2].trim());
            format!("{lead}\n{}\n", boxed(&eq))
        })
        .into_owned()
}

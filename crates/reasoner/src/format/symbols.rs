use regex::{NoExpand, Regex};

/// ASCII math tokens and their display form, applied in this order.
///
/// Alphabetic tokens only match whole words. Everything else is replaced
/// wherever it appears, which includes `*`: that rule also rewrites markdown
/// emphasis and is switchable through [`SymbolTable::without`].
pub const MATH_SYMBOLS: &[(&str, &str)] = &[
    ("^2", "²"),
    ("^3", "³"),
    ("^4", "⁴"),
    ("^5", "⁵"),
    ("^6", "⁶"),
    ("^7", "⁷"),
    ("^8", "⁸"),
    ("^9", "⁹"),
    ("^n", "ⁿ"),
    ("sqrt", "√"),
    ("pi", "π"),
    ("theta", "θ"),
    ("alpha", "α"),
    ("beta", "β"),
    ("gamma", "γ"),
    ("delta", "δ"),
    ("epsilon", "ε"),
    ("zeta", "ζ"),
    ("eta", "η"),
    ("lambda", "λ"),
    ("mu", "μ"),
    ("sigma", "σ"),
    ("tau", "τ"),
    ("phi", "φ"),
    ("omega", "ω"),
    ("Omega", "Ω"),
    ("infinity", "∞"),
    ("<=", "≤"),
    (">=", "≥"),
    ("!=", "≠"),
    ("==", "≡"),
    ("->", "→"),
    ("<-", "←"),
    ("*", "×"),
    ("integral", "∫"),
    ("sum", "∑"),
    ("product", "∏"),
    ("approx", "≈"),
    ("prop", "∝"),
    ("in", "∈"),
    ("notin", "∉"),
    ("subset", "⊂"),
    ("union", "∪"),
    ("intersection", "∩"),
    ("therefore", "∴"),
    ("because", "∵"),
    ("+-", "±"),
];

/// Single-letter bases that get a superscript exponent
pub const SUPERSCRIPT_BASES: &[char] = &['x', 'y', 'z', 'a', 'b', 'c', 'n'];

/// Superscript form of a single character, if it has one
pub fn superscript_char(c: char) -> Option<char> {
    let mapped = match c {
        '0' => '⁰',
        '1' => '¹',
        '2' => '²',
        '3' => '³',
        '4' => '⁴',
        '5' => '⁵',
        '6' => '⁶',
        '7' => '⁷',
        '8' => '⁸',
        '9' => '⁹',
        '+' => '⁺',
        '-' => '⁻',
        '=' => '⁼',
        '(' => '⁽',
        ')' => '⁾',
        'a' => 'ᵃ',
        'b' => 'ᵇ',
        'c' => 'ᶜ',
        'd' => 'ᵈ',
        'e' => 'ᵉ',
        'f' => 'ᶠ',
        'g' => 'ᵍ',
        'h' => 'ʰ',
        'i' => 'ⁱ',
        'j' => 'ʲ',
        'k' => 'ᵏ',
        'l' => 'ˡ',
        'm' => 'ᵐ',
        'n' => 'ⁿ',
        'o' => 'ᵒ',
        'p' => 'ᵖ',
        'r' => 'ʳ',
        's' => 'ˢ',
        't' => 'ᵗ',
        'u' => 'ᵘ',
        'v' => 'ᵛ',
        'w' => 'ʷ',
        'x' => 'ˣ',
        'y' => 'ʸ',
        'z' => 'ᶻ',
        _ => return None,
    };
    Some(mapped)
}

/// Convert text to superscript, leaving characters without a superscript form as-is
pub fn superscript(text: &str) -> String {
    text.chars().map(|c| superscript_char(c).unwrap_or(c)).collect()
}

#[derive(Debug, Clone)]
enum Rule {
    Word { pattern: Regex, display: &'static str },
    Literal { token: &'static str, display: &'static str },
}

#[derive(Debug, Clone)]
struct Entry {
    token: &'static str,
    rule: Rule,
}

/// Compiled form of [`MATH_SYMBOLS`]
#[derive(Debug, Clone)]
pub struct SymbolTable {
    entries: Vec<Entry>,
}

fn is_word_token(token: &str) -> bool {
    token.chars().count() > 1 && token.chars().all(char::is_alphabetic)
}

impl SymbolTable {
    pub fn standard() -> Self {
        let entries = MATH_SYMBOLS
            .iter()
            .map(|&(token, display)| {
                let rule = if is_word_token(token) {
                    Rule::Word {
                        // tokens are plain ASCII letters, so the pattern always compiles
                        pattern: Regex::new(&format!(r"\b{}\b", regex::escape(token))).unwrap(),
                        display,
                    }
                } else {
                    Rule::Literal { token, display }
                };
                Entry { token, rule }
            })
            .collect();
        Self { entries }
    }

    /// Drop a token from the table
    pub fn without(mut self, token: &str) -> Self {
        self.entries.retain(|entry| entry.token != token);
        self
    }

    pub fn contains(&self, token: &str) -> bool {
        self.entries.iter().any(|entry| entry.token == token)
    }

    pub fn lookup(&self, token: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|entry| entry.token == token)
            .map(|entry| match entry.rule {
                Rule::Word { display, .. } | Rule::Literal { display, .. } => display,
            })
    }

    pub fn apply(&self, text: &str) -> String {
        let mut text = text.to_string();
        for entry in &self.entries {
            match &entry.rule {
                Rule::Word { pattern, display } => {
                    if pattern.is_match(&text) {
                        text = pattern.replace_all(&text, NoExpand(display)).into_owned();
                    }
                }
                Rule::Literal { token, display } => {
                    if text.contains(token) {
                        text = text.replace(token, display);
                    }
                }
            }
        }
        text
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::standard()
    }
}

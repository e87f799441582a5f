use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum FormatStyle {
    /// Clause-aware indentation.
    #[default]
    Basic,
    /// Leave the statement untouched.
    None,
}

impl FormatStyle {
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("none") {
            FormatStyle::None
        } else {
            FormatStyle::Basic
        }
    }
}

impl fmt::Display for FormatStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatStyle::Basic => write!(f, "basic"),
            FormatStyle::None => write!(f, "none"),
        }
    }
}

pub const DEFAULT_INDENT: &str = "    ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOptions {
    pub indent_unit: String,
    /// Text written before the first token. `None` means a newline followed
    /// by one indent unit.
    pub initial_prefix: Option<String>,
    pub style: FormatStyle,
}

impl FormatOptions {
    pub fn with_indent_unit(mut self, indent_unit: impl Into<String>) -> Self {
        self.indent_unit = indent_unit.into();
        self
    }

    pub fn with_initial_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.initial_prefix = Some(prefix.into());
        self
    }

    pub fn with_style(mut self, style: FormatStyle) -> Self {
        self.style = style;
        self
    }

    pub fn initial_prefix(&self) -> String {
        match &self.initial_prefix {
            Some(prefix) => prefix.clone(),
            None => format!("\n{}", self.indent_unit),
        }
    }
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            indent_unit: DEFAULT_INDENT.to_string(),
            initial_prefix: None,
            style: FormatStyle::Basic,
        }
    }
}

pub const DEFAULT_MAX_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslateOptions {
    /// Deepest function-call / parenthesis nesting the parser accepts.
    pub max_depth: usize,
}

impl TranslateOptions {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

mod process;

use tracing::debug;

use crate::config::{FormatOptions, FormatStyle};
use crate::lexer::tokenize;
use crate::token::Token;

use self::process::FormatProcess;

/// Re-emits a complete SQL statement for display. Never fails.
pub trait Formatter {
    fn format(&self, sql: &str) -> String;
}

/// Clause-aware indentation.
#[derive(Debug, Clone, Default)]
pub struct BasicFormatter {
    options: FormatOptions,
}

impl BasicFormatter {
    pub fn new(options: FormatOptions) -> Self {
        Self { options }
    }
}

impl Formatter for BasicFormatter {
    fn format(&self, sql: &str) -> String {
        format_basic(&tokenize(sql), &self.options)
    }
}

/// Returns the statement unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFormatter;

impl Formatter for NoFormatter {
    fn format(&self, sql: &str) -> String {
        sql.to_string()
    }
}

fn format_basic(tokens: &[Token<'_>], options: &FormatOptions) -> String {
    if tokens.is_empty() {
        return String::new();
    }

    let prefix = options.initial_prefix();
    let mut process = FormatProcess::new(&options.indent_unit, &prefix);
    for token in tokens {
        process.feed(token);
    }
    process.finish()
}

/// Formats an already tokenized statement. Tokens must come from
/// [`tokenize`](crate::lexer::tokenize) so whitespace is still present.
pub fn format_tokens(tokens: &[Token<'_>], options: &FormatOptions) -> String {
    if tokens.is_empty() {
        return String::new();
    }

    match options.style {
        FormatStyle::Basic => format_basic(tokens, options),
        FormatStyle::None => tokens.iter().map(|t| t.text).collect(),
    }
}

pub fn formatter_for(options: &FormatOptions) -> Box<dyn Formatter> {
    match options.style {
        FormatStyle::Basic => Box::new(BasicFormatter::new(options.clone())),
        FormatStyle::None => Box::new(NoFormatter),
    }
}

/// Formats `sql` with `style` and logs it at debug level under the `sql`
/// target.
pub fn log_statement(sql: &str, style: FormatStyle) {
    let options = FormatOptions::default().with_style(style);
    let formatted = format_tokens(&tokenize(sql), &options);
    debug!(target: "sql", "{}", formatted);
}

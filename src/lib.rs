pub mod config;
pub mod dialect;
pub mod error;
pub mod formatter;
pub mod lexer;
pub mod ordering;
pub mod template;
pub mod token;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use config::{FormatOptions, FormatStyle, TranslateOptions};
pub use dialect::{
    AnsiDialect, ColumnMapper, Dialect, FunctionRegistry, FunctionResolver, MySqlDialect,
    NoOpColumnMapper, OrderByAliasResolver, SqlFunction, SqlServerDialect, SqlValueReference,
    StaticColumnMapper,
};
pub use error::{FragmentSyntaxError, MappingError, TranslationError};
pub use ordering::{OrderByFragmentTranslator, OrderByTranslation, TEMPLATE, TranslationContext};
pub use template::render_where_template;

pub fn format_sql(input: &str, options: &FormatOptions) -> String {
    let tokens = lexer::tokenize(input);
    formatter::format_tokens(&tokens, options)
}

/// Translates an order-by mapping fragment with default options.
pub fn translate_order_by(
    fragment: &str,
    context: &TranslationContext<'_>,
) -> Result<OrderByTranslation, TranslationError> {
    ordering::translate(fragment, context)
}

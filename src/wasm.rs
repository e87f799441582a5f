use crate::config::{FormatOptions, FormatStyle};
use crate::dialect::{AnsiDialect, FunctionRegistry, NoOpColumnMapper};
use crate::ordering::TranslationContext;
use crate::{format_sql, translate_order_by};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub fn format_sql_wasm(input: &str, indent: usize, style: &str) -> String {
    let options = FormatOptions::default()
        .with_indent_unit(" ".repeat(indent))
        .with_style(FormatStyle::from_name(style));
    format_sql(input, &options)
}

/// Translates `fragment` without column mapping; errors come back as JS
/// exceptions carrying the error text.
#[wasm_bindgen]
pub fn translate_order_by_wasm(fragment: &str, alias: &str) -> Result<String, JsError> {
    let functions = FunctionRegistry::new();
    let context = TranslationContext::new(&AnsiDialect, &NoOpColumnMapper, &functions);
    let translation = translate_order_by(fragment, &context)?;
    Ok(translation.render_with_alias(alias))
}

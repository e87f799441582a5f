//! Order-by fragment compiler: parse, resolve against the mapping metadata,
//! render to a `$PlaceHolder$`-qualified SQL fragment.

pub mod ast;
pub mod parser;
pub mod render;
pub mod resolver;
pub mod trace;
pub mod translation;

use tracing::trace;

use crate::config::TranslateOptions;
use crate::dialect::{ColumnMapper, Dialect, FunctionResolver};
use crate::error::TranslationError;

use self::resolver::Resolver;
use self::trace::{NoopTracer, ParseTracer};
pub use self::translation::{OrderByTranslation, TEMPLATE};

/// The collaborators a translation consults.
#[derive(Clone, Copy)]
pub struct TranslationContext<'c> {
    pub dialect: &'c dyn Dialect,
    pub column_mapper: &'c dyn ColumnMapper,
    pub functions: &'c dyn FunctionResolver,
}

impl<'c> TranslationContext<'c> {
    pub fn new(
        dialect: &'c dyn Dialect,
        column_mapper: &'c dyn ColumnMapper,
        functions: &'c dyn FunctionResolver,
    ) -> Self {
        Self {
            dialect,
            column_mapper,
            functions,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OrderByFragmentTranslator {
    options: TranslateOptions,
}

impl OrderByFragmentTranslator {
    pub fn new(options: TranslateOptions) -> Self {
        Self { options }
    }

    pub fn translate(
        &self,
        fragment: &str,
        context: &TranslationContext<'_>,
    ) -> Result<OrderByTranslation, TranslationError> {
        self.translate_with_tracer(fragment, context, &mut NoopTracer)
    }

    /// Same as [`translate`](Self::translate), reporting every grammar rule
    /// to `tracer`.
    pub fn translate_with_tracer(
        &self,
        fragment: &str,
        context: &TranslationContext<'_>,
        tracer: &mut dyn ParseTracer,
    ) -> Result<OrderByTranslation, TranslationError> {
        let parsed = parser::parse(fragment, &self.options, tracer)
            .map_err(|e| TranslationError::new(fragment, e))?;
        trace!(fragment, items = parsed.len(), "parsed order-by fragment");

        let resolved = Resolver::new(context.column_mapper, context.functions, context.dialect)
            .resolve(parsed);
        let rendered = render::render_list(&resolved, context.dialect);
        Ok(OrderByTranslation::new(rendered))
    }
}

/// Translates with default options.
pub fn translate(
    fragment: &str,
    context: &TranslationContext<'_>,
) -> Result<OrderByTranslation, TranslationError> {
    OrderByFragmentTranslator::default().translate(fragment, context)
}

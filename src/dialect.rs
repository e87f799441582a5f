//! Collaborators the order-by translator and the where-template renderer
//! consult: identifier quoting, column mapping, SQL function rendering and
//! table alias lookup.

use std::collections::HashMap;

use crate::error::MappingError;

/// Quoting and capability rules of a target SQL engine.
pub trait Dialect {
    fn open_quote(&self) -> char {
        '"'
    }

    fn close_quote(&self) -> char {
        '"'
    }

    /// Converts a back-tick quoted name into the dialect's own quoting;
    /// any other name is returned unchanged.
    fn quote(&self, name: &str) -> String {
        match name.strip_prefix('`').and_then(|n| n.strip_suffix('`')) {
            Some(inner) => self.quote_identifier(inner),
            None => name.to_string(),
        }
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("{}{}{}", self.open_quote(), name, self.close_quote())
    }

    /// Whether `nulls first` / `nulls last` may be emitted.
    fn supports_nulls_precedence(&self) -> bool {
        true
    }

    /// Engine-specific reserved words (lowercase) that must never be
    /// qualified as column references.
    fn is_keyword(&self, _lc_word: &str) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AnsiDialect;

impl Dialect for AnsiDialect {}

#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl Dialect for MySqlDialect {
    fn open_quote(&self) -> char {
        '`'
    }

    fn close_quote(&self) -> char {
        '`'
    }

    fn supports_nulls_precedence(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerDialect;

impl Dialect for SqlServerDialect {
    fn open_quote(&self) -> char {
        '['
    }

    fn close_quote(&self) -> char {
        ']'
    }

    fn supports_nulls_precedence(&self) -> bool {
        false
    }

    fn is_keyword(&self, lc_word: &str) -> bool {
        matches!(lc_word, "top" | "percent" | "nolock")
    }
}

/// What a logical property reference maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValueReference {
    Column(String),
    /// An already-templated SQL expression, emitted verbatim.
    Formula(String),
}

impl SqlValueReference {
    pub fn column(name: impl Into<String>) -> Self {
        SqlValueReference::Column(name.into())
    }

    pub fn formula(fragment: impl Into<String>) -> Self {
        SqlValueReference::Formula(fragment.into())
    }
}

/// Translates a logical property reference into physical columns.
///
/// `Err`, `Ok(None)` and `Ok(Some(vec![]))` all mean "unknown"; the
/// translator then passes the reference through as a literal column name.
pub trait ColumnMapper {
    fn map(&self, reference: &str) -> Result<Option<Vec<SqlValueReference>>, MappingError>;
}

impl<F> ColumnMapper for F
where
    F: Fn(&str) -> Result<Option<Vec<SqlValueReference>>, MappingError>,
{
    fn map(&self, reference: &str) -> Result<Option<Vec<SqlValueReference>>, MappingError> {
        self(reference)
    }
}

/// Knows nothing; every reference passes through.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpColumnMapper;

impl ColumnMapper for NoOpColumnMapper {
    fn map(&self, _reference: &str) -> Result<Option<Vec<SqlValueReference>>, MappingError> {
        Ok(None)
    }
}

/// Property-to-columns table.
#[derive(Debug, Clone, Default)]
pub struct StaticColumnMapper {
    mappings: HashMap<String, Vec<SqlValueReference>>,
}

impl StaticColumnMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_columns<I, S>(mut self, property: &str, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let refs = columns.into_iter().map(SqlValueReference::column).collect();
        self.mappings.insert(property.to_string(), refs);
        self
    }

    pub fn with_references(mut self, property: &str, references: Vec<SqlValueReference>) -> Self {
        self.mappings.insert(property.to_string(), references);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

impl ColumnMapper for StaticColumnMapper {
    fn map(&self, reference: &str) -> Result<Option<Vec<SqlValueReference>>, MappingError> {
        Ok(self.mappings.get(reference).cloned())
    }
}

/// Dialect-aware SQL function lookup and rendering.
pub trait FunctionResolver {
    fn has_function(&self, name: &str) -> bool;

    fn render(&self, name: &str, args: &[String]) -> String;

    /// A function that needs `()` even without arguments is only a function
    /// when followed by `(`; one that does not (`current_date`) is a
    /// function on its own.
    fn has_parentheses_if_no_arguments(&self, _name: &str) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlFunction {
    /// Renders `sql_name(arg1, arg2, ...)`.
    Standard { sql_name: String },
    /// Renders `sql_name` alone when called without arguments.
    NoArgs { sql_name: String },
    /// Pattern with `?1`, `?2`, ... argument slots, e.g. `lower(?1)`.
    Template(String),
}

impl SqlFunction {
    pub fn render(&self, args: &[String]) -> String {
        match self {
            SqlFunction::Standard { sql_name } => format!("{}({})", sql_name, args.join(", ")),
            SqlFunction::NoArgs { sql_name } if args.is_empty() => sql_name.clone(),
            SqlFunction::NoArgs { sql_name } => format!("{}({})", sql_name, args.join(", ")),
            SqlFunction::Template(pattern) => render_template(pattern, args),
        }
    }
}

/// Substitutes `?N` slots in one pass over the pattern; inserted arguments
/// are never rescanned. Slots without an argument are left in place.
fn render_template(pattern: &str, args: &[String]) -> String {
    let mut rendered = String::with_capacity(pattern.len());
    let mut rest = pattern;
    while let Some(idx) = rest.find('?') {
        rendered.push_str(&rest[..idx]);
        let after = &rest[idx + 1..];
        let digits = after.bytes().take_while(u8::is_ascii_digit).count();
        let arg = after[..digits]
            .parse::<usize>()
            .ok()
            .and_then(|slot| slot.checked_sub(1))
            .and_then(|slot| args.get(slot));
        match arg {
            Some(arg) => rendered.push_str(arg),
            None => rendered.push_str(&rest[idx..idx + 1 + digits]),
        }
        rest = &after[digits..];
    }
    rendered.push_str(rest);
    rendered
}

/// Case-insensitive registry of SQL functions.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, SqlFunction>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, function: SqlFunction) {
        self.functions.insert(name.to_lowercase(), function);
    }

    pub fn with_standard(mut self, name: &str, sql_name: &str) -> Self {
        self.register(
            name,
            SqlFunction::Standard {
                sql_name: sql_name.to_string(),
            },
        );
        self
    }

    pub fn with_no_args(mut self, name: &str, sql_name: &str) -> Self {
        self.register(
            name,
            SqlFunction::NoArgs {
                sql_name: sql_name.to_string(),
            },
        );
        self
    }

    pub fn with_template(mut self, name: &str, pattern: &str) -> Self {
        self.register(name, SqlFunction::Template(pattern.to_string()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&SqlFunction> {
        self.functions.get(&name.to_lowercase())
    }
}

impl FunctionResolver for FunctionRegistry {
    fn has_function(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    fn render(&self, name: &str, args: &[String]) -> String {
        match self.get(name) {
            Some(function) => function.render(args),
            None => format!("{}({})", name, args.join(", ")),
        }
    }

    fn has_parentheses_if_no_arguments(&self, name: &str) -> bool {
        !matches!(self.get(name), Some(SqlFunction::NoArgs { .. }))
    }
}

/// Picks the table alias that qualifies a given column reference.
pub trait OrderByAliasResolver {
    fn resolve_table_alias(&self, column_reference: &str) -> String;
}

impl<F> OrderByAliasResolver for F
where
    F: Fn(&str) -> String,
{
    fn resolve_table_alias(&self, column_reference: &str) -> String {
        self(column_reference)
    }
}

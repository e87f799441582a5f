use crate::dialect::OrderByAliasResolver;
use crate::token::closing_quote;

/// Stands in for the table alias until the fragment is spliced into a query.
pub const TEMPLATE: &str = "$PlaceHolder$";

const COLUMN_TERMINATORS: &str = ",()+*/-=<>'|;";

/// A translated order-by fragment whose column references are still
/// qualified with [`TEMPLATE`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderByTranslation {
    template: String,
    column_references: Vec<String>,
}

/// One `$PlaceHolder$.column` occurrence: byte range of the whole match and
/// the column text.
struct Occurrence<'a> {
    start: usize,
    end: usize,
    column: &'a str,
}

fn occurrences(template: &str) -> Vec<Occurrence<'_>> {
    let marker = format!("{TEMPLATE}.");
    let mut found = Vec::new();
    let mut cursor = 0;

    while let Some(offset) = template[cursor..].find(&marker) {
        let start = cursor + offset;
        let column_start = start + marker.len();
        let rest = &template[column_start..];
        let column_len = match rest.chars().next() {
            Some(open @ ('"' | '`' | '[')) => {
                let close = closing_quote(open);
                match rest[1..].find(close) {
                    Some(idx) => idx + 2,
                    None => rest.len(),
                }
            }
            _ => rest
                .find(|c: char| c.is_whitespace() || COLUMN_TERMINATORS.contains(c))
                .unwrap_or(rest.len()),
        };
        let end = column_start + column_len;
        found.push(Occurrence {
            start,
            end,
            column: &template[column_start..end],
        });
        cursor = end;
    }
    found
}

impl OrderByTranslation {
    pub fn new(template: String) -> Self {
        let column_references = occurrences(&template)
            .iter()
            .map(|o| o.column.to_string())
            .collect();
        Self {
            template,
            column_references,
        }
    }

    /// The fragment with `$PlaceHolder$.` qualifiers in place.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Qualified column references, in order of appearance.
    pub fn column_references(&self) -> &[String] {
        &self.column_references
    }

    /// Replaces every placeholder with the alias `resolver` picks for the
    /// column it qualifies. An empty alias leaves the bare column.
    pub fn inject_aliases(&self, resolver: &dyn OrderByAliasResolver) -> String {
        let mut out = String::with_capacity(self.template.len());
        let mut cursor = 0;
        for occurrence in occurrences(&self.template) {
            out.push_str(&self.template[cursor..occurrence.start]);
            let alias = resolver.resolve_table_alias(occurrence.column);
            if !alias.is_empty() {
                out.push_str(&alias);
                out.push('.');
            }
            out.push_str(occurrence.column);
            cursor = occurrence.end;
        }
        out.push_str(&self.template[cursor..]);
        out
    }

    pub fn render_with_alias(&self, alias: &str) -> String {
        self.inject_aliases(&|_: &str| alias.to_string())
    }

    pub fn render_unqualified(&self) -> String {
        self.render_with_alias("")
    }
}

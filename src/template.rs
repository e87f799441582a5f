//! Alias templating of mapping-level `where` fragments.
//!
//! Bare column references are qualified with a placeholder so the fragment
//! can later be spliced into a query under any table alias. Keywords,
//! function names, named parameters, string literals, quoted identifiers
//! and the table names of sub-selects are left alone.

use std::borrow::Cow;

use tracing::trace;

use crate::dialect::{Dialect, FunctionResolver};
use crate::lexer::split_keeping_delimiters;
use crate::token::FUNCTION_KEYWORDS;

const SYMBOLS: &str = "=><!+-*/()',|&`";

const KEYWORDS: &[&str] = &[
    "and", "or", "not", "like", "escape", "is", "in", "between", "null", "select", "distinct",
    "from", "join", "inner", "outer", "left", "right", "on", "where", "having", "group", "order",
    "by", "desc", "asc", "limit", "any", "some", "exists", "all", "union", "minus",
];

const BEFORE_TABLE_KEYWORDS: &[&str] = &["from", "join"];

const TRIM_SPECS: &[&str] = &["leading", "trailing", "both"];

/// Qualifies the column references of `where_fragment` with `placeholder`.
pub fn render_where_template(
    where_fragment: &str,
    placeholder: &str,
    dialect: &dyn Dialect,
    functions: &dyn FunctionResolver,
) -> String {
    let open_quote = dialect.open_quote();
    let close_quote = dialect.close_quote();
    let tokens = split_keeping_delimiters(where_fragment, |c| {
        SYMBOLS.contains(c) || c.is_whitespace() || c == open_quote || c == close_quote
    });

    let mut out = String::with_capacity(where_fragment.len() + placeholder.len() * 4);
    let mut quoted = false;
    let mut quoted_identifier = false;
    let mut before_table = false;
    let mut in_from_clause = false;
    let mut after_from_table = false;

    let mut idx = 0;
    while idx < tokens.len() {
        let mut token = Cow::Borrowed(tokens[idx]);
        let next = tokens.get(idx + 1).copied();
        idx += 1;
        let mut lc_token = token.to_lowercase();
        let mut is_quote_char = false;

        if !quoted_identifier && token == "'" {
            quoted = !quoted;
            is_quote_char = true;
        }

        if !quoted {
            let first = token.chars().next();
            let is_open_quote = if token == "`" {
                let opening = !quoted_identifier;
                let replacement = if opening { open_quote } else { close_quote };
                token = Cow::Owned(replacement.to_string());
                lc_token = token.to_string();
                quoted_identifier = opening;
                is_quote_char = true;
                opening
            } else if !quoted_identifier && first == Some(open_quote) {
                quoted_identifier = true;
                is_quote_char = true;
                true
            } else if quoted_identifier && first == Some(close_quote) {
                quoted_identifier = false;
                is_quote_char = true;
                false
            } else {
                false
            };

            if is_open_quote {
                out.push_str(placeholder);
                out.push('.');
            }
        }

        if lc_token == "extract" && next == Some("(") {
            idx += 1;
            let field = take_until(&tokens, &mut idx, "from");
            let source = take_until(&tokens, &mut idx, ")");
            let source = render_where_template(&source, placeholder, dialect, functions);
            out.push_str(&format!("extract({field} from {source})"));
            continue;
        }

        if lc_token == "trim" && next == Some("(") {
            idx += 1;
            out.push_str(&render_trim(&tokens, &mut idx, placeholder, dialect, functions));
            continue;
        }

        let quoted_or_whitespace = quoted
            || quoted_identifier
            || is_quote_char
            || token.starts_with(char::is_whitespace);

        if quoted_or_whitespace {
            out.push_str(&token);
        } else if before_table {
            out.push_str(&token);
            before_table = false;
            after_from_table = true;
        } else if after_from_table {
            if lc_token != "as" {
                after_from_table = false;
            }
            out.push_str(&token);
        } else if is_named_parameter(&token) {
            out.push_str(&token);
        } else if is_identifier(&token)
            && !is_function_or_keyword(&lc_token, next, dialect, functions)
        {
            out.push_str(placeholder);
            out.push('.');
            out.push_str(&dialect.quote(&token));
        } else {
            if BEFORE_TABLE_KEYWORDS.contains(&lc_token.as_str()) {
                before_table = true;
                in_from_clause = true;
            } else if in_from_clause && lc_token == "," {
                before_table = true;
            }
            out.push_str(&token);
        }

        if in_from_clause
            && KEYWORDS.contains(&lc_token.as_str())
            && !BEFORE_TABLE_KEYWORDS.contains(&lc_token.as_str())
        {
            in_from_clause = false;
        }
    }

    out
}

/// Concatenates tokens up to (and consuming) `delimiter`, trimmed. Stops at
/// end of input when the delimiter never shows up.
fn take_until(tokens: &[&str], idx: &mut usize, delimiter: &str) -> String {
    let mut value = String::new();
    while let Some(token) = tokens.get(*idx) {
        *idx += 1;
        if token.eq_ignore_ascii_case(delimiter) {
            break;
        }
        value.push_str(token);
    }
    value.trim().to_string()
}

#[derive(Debug, PartialEq, Eq)]
struct TrimOperands {
    spec: Option<String>,
    trim_char: Option<String>,
    from: Option<String>,
    source: String,
}

impl TrimOperands {
    /// `[spec] [char] [from] source`; `None` when the operands do not fit.
    fn from_operands(mut operands: Vec<String>) -> Option<Self> {
        match operands.len() {
            1 => Some(Self {
                spec: None,
                trim_char: None,
                from: None,
                source: operands.remove(0),
            }),
            4 => {
                let source = operands.pop()?;
                let from = operands.pop();
                let trim_char = operands.pop();
                let spec = operands.pop();
                Some(Self {
                    spec,
                    trim_char,
                    from,
                    source,
                })
            }
            2 | 3 => {
                let source = operands.pop()?;
                let from = operands.pop()?;
                if !from.eq_ignore_ascii_case("from") {
                    return None;
                }
                let first = operands.pop();
                let (spec, trim_char) = match first {
                    Some(word) if TRIM_SPECS.contains(&word.to_lowercase().as_str()) => {
                        (Some(word), None)
                    }
                    other => (None, other),
                };
                Some(Self {
                    spec,
                    trim_char,
                    from: Some(from),
                    source,
                })
            }
            _ => None,
        }
    }
}

/// Renders `trim(...)` starting right after its `(`; consumes through `)`.
fn render_trim(
    tokens: &[&str],
    idx: &mut usize,
    placeholder: &str,
    dialect: &dyn Dialect,
    functions: &dyn FunctionResolver,
) -> String {
    let start = *idx;
    let mut operands = Vec::new();
    let mut literal = String::new();
    let mut in_literal = false;

    while let Some(&token) = tokens.get(*idx) {
        *idx += 1;
        if !in_literal && token == ")" {
            break;
        }
        if token == "'" {
            literal.push('\'');
            if in_literal {
                operands.push(std::mem::take(&mut literal));
            }
            in_literal = !in_literal;
        } else if in_literal {
            literal.push_str(token);
        } else if !token.starts_with(char::is_whitespace) {
            operands.push(token.to_string());
        }
    }

    let Some(trim) = TrimOperands::from_operands(operands) else {
        trace!("unrecognised trim operands, emitting as written");
        return format!("trim({}", tokens[start..*idx].concat());
    };

    let mut out = String::from("trim(");
    if let Some(spec) = &trim.spec {
        out.push_str(spec);
        out.push(' ');
    }
    if let Some(trim_char) = &trim.trim_char {
        if trim_char.starts_with('\'') && trim_char.ends_with('\'') {
            out.push_str(trim_char);
        } else {
            out.push_str(&render_where_template(trim_char, placeholder, dialect, functions));
        }
        out.push(' ');
    }
    match &trim.from {
        Some(from) => {
            out.push_str(from);
            out.push(' ');
        }
        None if trim.spec.is_some() || trim.trim_char.is_some() => out.push_str("from "),
        None => {}
    }
    out.push_str(&render_where_template(&trim.source, placeholder, dialect, functions));
    out.push(')');
    out
}

fn is_named_parameter(token: &str) -> bool {
    token.starts_with(':')
}

/// Back-ticked names, or words starting with a letter and not already
/// qualified.
fn is_identifier(token: &str) -> bool {
    match token.chars().next() {
        Some('`') => true,
        Some(first) => first.is_alphabetic() && !token.contains('.'),
        None => false,
    }
}

fn is_function_or_keyword(
    lc_token: &str,
    next: Option<&str>,
    dialect: &dyn Dialect,
    functions: &dyn FunctionResolver,
) -> bool {
    next == Some("(")
        || KEYWORDS.contains(&lc_token)
        || is_function(lc_token, next, functions)
        || dialect.is_keyword(lc_token)
        || FUNCTION_KEYWORDS.contains(&lc_token)
}

/// Without a following `(`, only functions that take no parentheses count.
fn is_function(lc_token: &str, next: Option<&str>, functions: &dyn FunctionResolver) -> bool {
    if next == Some("(") {
        return true;
    }
    functions.has_function(lc_token) && !functions.has_parentheses_if_no_arguments(lc_token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{AnsiDialect, FunctionRegistry, MySqlDialect, SqlServerDialect};
    use crate::ordering::TEMPLATE;

    fn render(fragment: &str) -> String {
        render_where_template(fragment, TEMPLATE, &AnsiDialect, &FunctionRegistry::new())
    }

    #[test]
    fn test_simple_predicate() {
        assert_eq!(
            render("active = 1 and name like 'a%'"),
            "$PlaceHolder$.active = 1 and $PlaceHolder$.name like 'a%'"
        );
    }

    #[test]
    fn test_string_literal_untouched() {
        assert_eq!(
            render("kind = 'not a column'"),
            "$PlaceHolder$.kind = 'not a column'"
        );
    }

    #[test]
    fn test_named_parameter_and_qualified_reference() {
        assert_eq!(
            render("owner = :owner or t.owner is null"),
            "$PlaceHolder$.owner = :owner or t.owner is null"
        );
    }

    #[test]
    fn test_function_call_name_not_qualified() {
        assert_eq!(
            render("upper(name) = 'X'"),
            "upper($PlaceHolder$.name) = 'X'"
        );
    }

    #[test]
    fn test_no_paren_function_not_qualified() {
        let registry = FunctionRegistry::new().with_no_args("current_date", "current_date");
        assert_eq!(
            render_where_template("due < current_date", TEMPLATE, &AnsiDialect, &registry),
            "$PlaceHolder$.due < current_date"
        );
    }

    #[test]
    fn test_sub_select_table_names_untouched() {
        assert_eq!(
            render("id in (select o.id from orders o where o.total > 10)"),
            "$PlaceHolder$.id in (select o.id from orders o where o.total > 10)"
        );
    }

    #[test]
    fn test_sub_select_with_alias_keyword() {
        assert_eq!(
            render("exists (select 1 from items as i, tags t)"),
            "exists (select 1 from items as i, tags t)"
        );
    }

    #[test]
    fn test_backtick_quoted_identifier() {
        assert_eq!(render("`order` > 3"), "$PlaceHolder$.\"order\" > 3");
        assert_eq!(
            render_where_template("`order` > 3", TEMPLATE, &SqlServerDialect, &FunctionRegistry::new()),
            "$PlaceHolder$.[order] > 3"
        );
    }

    #[test]
    fn test_dialect_quoted_identifier() {
        assert_eq!(render("\"Order\" > 3"), "$PlaceHolder$.\"Order\" > 3");
    }

    #[test]
    fn test_dialect_keyword_not_qualified() {
        assert_eq!(
            render_where_template("top > 1", TEMPLATE, &SqlServerDialect, &FunctionRegistry::new()),
            "top > 1"
        );
        assert_eq!(
            render_where_template("top > 1", TEMPLATE, &MySqlDialect, &FunctionRegistry::new()),
            "$PlaceHolder$.top > 1"
        );
    }

    #[test]
    fn test_extract() {
        assert_eq!(
            render("extract(year from born) = 1990"),
            "extract(year from $PlaceHolder$.born) = 1990"
        );
    }

    #[test]
    fn test_trim_forms() {
        assert_eq!(render("trim(name) = 'x'"), "trim($PlaceHolder$.name) = 'x'");
        assert_eq!(
            render("trim(leading from name)"),
            "trim(leading from $PlaceHolder$.name)"
        );
        assert_eq!(
            render("trim(both ' ' from name)"),
            "trim(both ' ' from $PlaceHolder$.name)"
        );
        assert_eq!(render("trim(pad from name)"), "trim($PlaceHolder$.pad from $PlaceHolder$.name)");
    }

    #[test]
    fn test_unrecognised_trim_emitted_as_written() {
        assert_eq!(render("trim(a b)"), "trim(a b)");
    }

    #[test]
    fn test_custom_placeholder() {
        assert_eq!(
            render_where_template("deleted = 0", "e", &AnsiDialect, &FunctionRegistry::new()),
            "e.deleted = 0"
        );
    }

    #[test]
    fn test_trim_operands() {
        let ops = |words: &[&str]| {
            TrimOperands::from_operands(words.iter().map(|w| w.to_string()).collect())
        };
        assert_eq!(
            ops(&["both", "'x'", "from", "name"]),
            Some(TrimOperands {
                spec: Some("both".to_string()),
                trim_char: Some("'x'".to_string()),
                from: Some("from".to_string()),
                source: "name".to_string(),
            })
        );
        assert_eq!(ops(&["name", "other"]), None);
        assert_eq!(ops(&[]), None);
    }
}

use crate::dialect::Dialect;

use super::ast::{Expr, FunctionCall, Identifier, IdentifierForm, SortKey, SortList, SortSpec};
use super::translation::TEMPLATE;

/// Column names with a `.` are already qualified and keep their text.
fn qualify(column: String) -> String {
    if column.contains('.') {
        column
    } else {
        format!("{TEMPLATE}.{column}")
    }
}

pub fn render_identifier(ident: &Identifier, dialect: &dyn Dialect) -> String {
    match ident.form {
        IdentifierForm::Column => qualify(dialect.quote(&ident.text)),
        IdentifierForm::Quoted => qualify(dialect.quote_identifier(&ident.text)),
        IdentifierForm::StringLiteral => format!("'{}'", ident.text),
        IdentifierForm::Plain | IdentifierForm::Verbatim => ident.text.clone(),
    }
}

fn render_call(call: &FunctionCall, dialect: &dyn Dialect) -> String {
    let args: Vec<String> = call.args.iter().map(|a| render_expr(a, dialect)).collect();
    format!("{}({})", call.name, args.join(", "))
}

pub fn render_expr(expr: &Expr, dialect: &dyn Dialect) -> String {
    match expr {
        Expr::Identifier(ident) => render_identifier(ident, dialect),
        Expr::FunctionCall(call) => render_call(call, dialect),
        Expr::Binary { lhs, op, rhs } => format!(
            "{} {} {}",
            render_expr(lhs, dialect),
            op,
            render_expr(rhs, dialect)
        ),
        Expr::Unary { op, operand } if matches!(**operand, Expr::Unary { .. }) => {
            format!("{} {}", op, render_expr(operand, dialect))
        }
        Expr::Unary { op, operand } => format!("{}{}", op, render_expr(operand, dialect)),
        Expr::Parenthesized(inner) => format!("({})", render_expr(inner, dialect)),
        Expr::Sequence(words) => words
            .iter()
            .map(|w| render_expr(w, dialect))
            .collect::<Vec<_>>()
            .join(" "),
    }
}

fn render_key(key: &SortKey, dialect: &dyn Dialect) -> String {
    match key {
        SortKey::Identifier(ident) => render_identifier(ident, dialect),
        SortKey::IdentifierList(idents) => idents
            .iter()
            .map(|i| render_identifier(i, dialect))
            .collect::<Vec<_>>()
            .join(", "),
        SortKey::FunctionCall(call) => render_call(call, dialect),
    }
}

pub fn render_spec(spec: &SortSpec, dialect: &dyn Dialect) -> String {
    let mut out = render_key(&spec.key, dialect);
    if let Some(collation) = &spec.collation {
        out.push_str(" collate ");
        out.push_str(collation);
    }
    if let Some(ordering) = spec.ordering {
        out.push(' ');
        out.push_str(ordering.as_str());
    }
    if let Some(nulls) = spec.nulls
        && dialect.supports_nulls_precedence()
    {
        out.push(' ');
        out.push_str(nulls.as_str());
    }
    out
}

/// Serializes a resolved sort list, `key [collate c] [asc|desc] [nulls ...]`
/// per item, joined by `, `.
pub fn render_list(list: &SortList, dialect: &dyn Dialect) -> String {
    list.specs
        .iter()
        .map(|spec| render_spec(spec, dialect))
        .collect::<Vec<_>>()
        .join(", ")
}

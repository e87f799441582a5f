use tracing::{debug, trace};

use crate::dialect::{ColumnMapper, Dialect, FunctionResolver, SqlValueReference};

use super::ast::{Expr, FunctionCall, Identifier, IdentifierForm, SortKey, SortList, SortSpec};
use super::render::{render_expr, render_identifier};

/// Rewrites a parsed sort list against the mapping metadata. Never fails:
/// anything it cannot resolve is passed through as a literal column.
pub struct Resolver<'c> {
    mapper: &'c dyn ColumnMapper,
    functions: &'c dyn FunctionResolver,
    dialect: &'c dyn Dialect,
}

impl<'c> Resolver<'c> {
    pub fn new(
        mapper: &'c dyn ColumnMapper,
        functions: &'c dyn FunctionResolver,
        dialect: &'c dyn Dialect,
    ) -> Self {
        Self {
            mapper,
            functions,
            dialect,
        }
    }

    pub fn resolve(&self, list: SortList) -> SortList {
        let mut specs = Vec::with_capacity(list.specs.len());
        for spec in list.specs {
            let key = self.resolve_key(&spec.key);
            expand_into(&mut specs, &spec, key);
        }
        SortList { specs }
    }

    fn resolve_key(&self, key: &SortKey) -> SortKey {
        match key {
            SortKey::Identifier(ident) => {
                let mut columns = self.resolve_identifier(ident);
                if columns.len() == 1 {
                    SortKey::Identifier(columns.remove(0))
                } else {
                    SortKey::IdentifierList(columns)
                }
            }
            SortKey::IdentifierList(idents) => SortKey::IdentifierList(
                idents
                    .iter()
                    .flat_map(|ident| self.resolve_identifier(ident))
                    .collect(),
            ),
            SortKey::FunctionCall(call) => {
                SortKey::Identifier(Identifier::verbatim(self.resolve_call(call)))
            }
        }
    }

    /// One identifier in, one or more out. Only plain identifiers go to the
    /// mapper.
    fn resolve_identifier(&self, ident: &Identifier) -> Vec<Identifier> {
        match ident.form {
            IdentifierForm::Plain => {}
            IdentifierForm::Quoted => {
                return vec![Identifier::new(ident.text.clone(), IdentifierForm::Quoted)];
            }
            _ => return vec![ident.clone()],
        }

        let references = match self.mapper.map(&ident.text) {
            Ok(Some(references)) if !references.is_empty() => references,
            Ok(_) => {
                debug!(reference = %ident.text, "unknown reference, passing through");
                return vec![Identifier::column(ident.text.clone())];
            }
            Err(e) => {
                debug!(reference = %ident.text, error = %e, "column mapping failed, passing through");
                return vec![Identifier::column(ident.text.clone())];
            }
        };

        if references.len() > 1 {
            trace!(reference = %ident.text, columns = references.len(), "expanding multi-column reference");
        }
        references
            .into_iter()
            .map(|reference| match reference {
                SqlValueReference::Column(name) => Identifier::column(name),
                SqlValueReference::Formula(fragment) => Identifier::verbatim(fragment),
            })
            .collect()
    }

    /// Renders a call to its final SQL text: arguments first, then either
    /// the dialect's rendering or the call as written.
    fn resolve_call(&self, call: &FunctionCall) -> String {
        let args: Vec<String> = call
            .args
            .iter()
            .flat_map(|arg| self.resolve_argument(arg))
            .collect();

        if self.functions.has_function(&call.name) {
            trace!(function = %call.name, "rendering through function resolver");
            self.functions.render(&call.name, &args)
        } else {
            format!("{}({})", call.name, args.join(", "))
        }
    }

    /// Argument texts; a bare multi-column reference yields one text per
    /// column.
    fn resolve_argument(&self, arg: &Expr) -> Vec<String> {
        match arg {
            Expr::Identifier(ident) => self
                .resolve_identifier(ident)
                .iter()
                .map(|ident| render_identifier(ident, self.dialect))
                .collect(),
            other => vec![render_expr(&self.resolve_expr(other), self.dialect)],
        }
    }

    fn resolve_expr(&self, expr: &Expr) -> Expr {
        match expr {
            Expr::Identifier(ident) => {
                let resolved = self.resolve_identifier(ident);
                let texts: Vec<String> = resolved
                    .iter()
                    .map(|ident| render_identifier(ident, self.dialect))
                    .collect();
                match resolved.len() {
                    1 => Expr::Identifier(resolved.into_iter().next().unwrap_or_else(|| ident.clone())),
                    _ => Expr::Identifier(Identifier::verbatim(texts.join(", "))),
                }
            }
            Expr::FunctionCall(call) => Expr::Identifier(Identifier::verbatim(self.resolve_call(call))),
            Expr::Binary { lhs, op, rhs } => Expr::Binary {
                lhs: Box::new(self.resolve_expr(lhs)),
                op: op.clone(),
                rhs: Box::new(self.resolve_expr(rhs)),
            },
            Expr::Unary { op, operand } => Expr::Unary {
                op: op.clone(),
                operand: Box::new(self.resolve_expr(operand)),
            },
            Expr::Parenthesized(inner) => Expr::Parenthesized(Box::new(self.resolve_expr(inner))),
            Expr::Sequence(words) => {
                Expr::Sequence(words.iter().map(|word| self.resolve_expr(word)).collect())
            }
        }
    }
}

/// Pushes `key` with `original`'s modifiers; an identifier list becomes one
/// sibling per column, in mapper order.
fn expand_into(out: &mut Vec<SortSpec>, original: &SortSpec, key: SortKey) {
    match key {
        SortKey::IdentifierList(idents) => {
            for ident in idents {
                out.push(original.with_key(SortKey::Identifier(ident)));
            }
        }
        other => out.push(original.with_key(other)),
    }
}

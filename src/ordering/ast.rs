use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderingDirection {
    Asc,
    Desc,
}

impl OrderingDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderingDirection::Asc => "asc",
            OrderingDirection::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullPrecedence {
    First,
    Last,
}

impl NullPrecedence {
    pub fn as_str(&self) -> &'static str {
        match self {
            NullPrecedence::First => "nulls first",
            NullPrecedence::Last => "nulls last",
        }
    }
}

/// How an identifier's text is to be emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierForm {
    /// Bare reference straight from the grammar, not yet resolved.
    Plain,
    /// `"x"`, `` `x` `` or `[x]`; `text` holds the name without delimiters.
    Quoted,
    /// `'x'`; `text` holds the contents without delimiters.
    StringLiteral,
    /// Physical column, qualified with the alias placeholder when rendered.
    Column,
    /// Verbatim SQL: formulas, pre-rendered function calls, numbers and
    /// function keywords such as `as` or `from`.
    Verbatim,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub text: String,
    pub form: IdentifierForm,
}

impl Identifier {
    pub fn new(text: impl Into<String>, form: IdentifierForm) -> Self {
        Self {
            text: text.into(),
            form,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, IdentifierForm::Plain)
    }

    pub fn column(text: impl Into<String>) -> Self {
        Self::new(text, IdentifierForm::Column)
    }

    pub fn verbatim(text: impl Into<String>) -> Self {
        Self::new(text, IdentifierForm::Verbatim)
    }

    pub fn is_quoted(&self) -> bool {
        matches!(
            self.form,
            IdentifierForm::Quoted | IdentifierForm::StringLiteral
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Expr>,
}

/// A function argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Identifier(Identifier),
    FunctionCall(FunctionCall),
    Binary {
        lhs: Box<Expr>,
        op: String,
        rhs: Box<Expr>,
    },
    Unary {
        op: String,
        operand: Box<Expr>,
    },
    Parenthesized(Box<Expr>),
    /// Space-separated words, e.g. `year from d` in `extract(year from d)`.
    Sequence(Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKey {
    Identifier(Identifier),
    /// Several physical columns behind one logical reference. Only the
    /// resolver creates these.
    IdentifierList(Vec<Identifier>),
    FunctionCall(FunctionCall),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub key: SortKey,
    pub collation: Option<String>,
    pub ordering: Option<OrderingDirection>,
    pub nulls: Option<NullPrecedence>,
}

impl SortSpec {
    pub fn new(key: SortKey) -> Self {
        Self {
            key,
            collation: None,
            ordering: None,
            nulls: None,
        }
    }

    /// Same modifiers, different key.
    pub fn with_key(&self, key: SortKey) -> Self {
        Self {
            key,
            collation: self.collation.clone(),
            ordering: self.ordering,
            nulls: self.nulls,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortList {
    pub specs: Vec<SortSpec>,
}

impl SortList {
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

// Display renders a source-like debug form: no quoting rules, no alias
// placeholders.

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.form {
            IdentifierForm::Quoted => write!(f, "\"{}\"", self.text),
            IdentifierForm::StringLiteral => write!(f, "'{}'", self.text),
            _ => f.write_str(&self.text),
        }
    }
}

impl fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (idx, arg) in self.args.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Identifier(ident) => write!(f, "{ident}"),
            Expr::FunctionCall(call) => write!(f, "{call}"),
            Expr::Binary { lhs, op, rhs } => write!(f, "{lhs} {op} {rhs}"),
            // `--` would open a comment
            Expr::Unary { op, operand } if matches!(**operand, Expr::Unary { .. }) => {
                write!(f, "{op} {operand}")
            }
            Expr::Unary { op, operand } => write!(f, "{op}{operand}"),
            Expr::Parenthesized(inner) => write!(f, "({inner})"),
            Expr::Sequence(items) => {
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Identifier(ident) => write!(f, "{ident}"),
            SortKey::IdentifierList(idents) => {
                f.write_str("{")?;
                for (idx, ident) in idents.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{ident}")?;
                }
                f.write_str("}")
            }
            SortKey::FunctionCall(call) => write!(f, "{call}"),
        }
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key)?;
        if let Some(collation) = &self.collation {
            write!(f, " collate {collation}")?;
        }
        if let Some(ordering) = self.ordering {
            write!(f, " {}", ordering.as_str())?;
        }
        if let Some(nulls) = self.nulls {
            write!(f, " {}", nulls.as_str())?;
        }
        Ok(())
    }
}

impl fmt::Display for SortList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, spec) in self.specs.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{spec}")?;
        }
        Ok(())
    }
}

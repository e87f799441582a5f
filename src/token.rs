macro_rules! define_keywords {
    (
        $( $variant:ident => $text:expr ),* $(,)?
    ) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum KeywordKind {
            $( $variant, )*
        }

        impl KeywordKind {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( KeywordKind::$variant => $text, )*
                }
            }
        }

        impl std::fmt::Display for KeywordKind {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for KeywordKind {
            type Err = ();
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $( if s.eq_ignore_ascii_case($text) { return Ok(KeywordKind::$variant); } )*
                Err(())
            }
        }

        /// Lookup an order-by keyword (case-insensitive).
        pub fn lookup_keyword(word: &str) -> Option<KeywordKind> {
            word.parse().ok()
        }
    };
}

define_keywords! {
    Asc => "asc",
    Desc => "desc",
    Collate => "collate",
    Nulls => "nulls",
    First => "first",
    Last => "last",
}

impl KeywordKind {
    pub fn is_direction(&self) -> bool {
        matches!(self, KeywordKind::Asc | KeywordKind::Desc)
    }

    /// `first` and `last` only mean something after `nulls`; anywhere else
    /// they are plain column names.
    pub fn is_contextual(&self) -> bool {
        matches!(self, KeywordKind::First | KeywordKind::Last)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Keyword(KeywordKind),
    Identifier,
    QuotedIdentifier,
    StringLiteral,
    Number,
    Operator,
    OpenParen,
    CloseParen,
    Comma,
    Whitespace,
    Eof,
}

/// A slice of the input together with its classification and byte offset.
///
/// Quoted tokens keep their delimiters in `text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub position: usize,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, text: &'a str, position: usize) -> Self {
        Self {
            kind,
            text,
            position,
        }
    }

    pub fn eof(position: usize) -> Self {
        Self::new(TokenKind::Eof, "", position)
    }

    pub fn is_whitespace(&self) -> bool {
        self.kind == TokenKind::Whitespace
    }

    pub fn is_quoted(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::QuotedIdentifier | TokenKind::StringLiteral
        )
    }

    /// True unless this is a quoted token whose closing delimiter never came.
    pub fn is_terminated(&self) -> bool {
        if !self.is_quoted() {
            return true;
        }
        let mut chars = self.text.chars();
        match (chars.next(), chars.next_back()) {
            (Some(open), Some(close)) => close == closing_quote(open),
            _ => false,
        }
    }

    /// The text between the quote delimiters; the whole text for other tokens.
    pub fn unquoted(&self) -> &'a str {
        if !self.is_quoted() {
            return self.text;
        }
        let inner = &self.text[1..];
        if self.is_terminated() {
            &inner[..inner.len() - 1]
        } else {
            inner
        }
    }
}

pub(crate) fn closing_quote(open: char) -> char {
    match open {
        '[' => ']',
        other => other,
    }
}

/// Words inside function arguments that belong to the call syntax itself
/// (`cast(x as t)`, `trim(leading ' ' from x)`, `position('a' in x)`), never
/// to a column.
pub const FUNCTION_KEYWORDS: &[&str] = &[
    "as", "leading", "trailing", "both", "from", "for", "in", "placing", "case", "when", "then",
    "else", "end",
];

/// Formatter-level classification of a lowercased SQL word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    /// Opens a multi-word clause: `left`, `right`, `inner`, `outer`, `group`, `order`.
    BeginClause,
    /// Closes a clause header and starts its body: `where`, `from`, `by`, ...
    EndClause,
    Logical,
    Quantifier,
    Dml,
    Select,
    On,
    Values,
    Other,
}

const BEGIN_CLAUSES: &[&str] = &["left", "right", "inner", "outer", "group", "order"];
const END_CLAUSES: &[&str] = &[
    "where", "set", "having", "join", "from", "by", "into", "union",
];
const LOGICAL: &[&str] = &["and", "or", "when", "else", "end"];
const QUANTIFIERS: &[&str] = &["in", "all", "exists", "some", "any"];
const DML: &[&str] = &["insert", "update", "delete"];

pub fn classify_token(lc_token: &str) -> TokenClass {
    if BEGIN_CLAUSES.contains(&lc_token) {
        TokenClass::BeginClause
    } else if END_CLAUSES.contains(&lc_token) {
        TokenClass::EndClause
    } else if LOGICAL.contains(&lc_token) {
        TokenClass::Logical
    } else if QUANTIFIERS.contains(&lc_token) {
        TokenClass::Quantifier
    } else if DML.contains(&lc_token) {
        TokenClass::Dml
    } else if lc_token == "select" {
        TokenClass::Select
    } else if lc_token == "on" {
        TokenClass::On
    } else if lc_token == "values" {
        TokenClass::Values
    } else {
        TokenClass::Other
    }
}

impl TokenClass {
    /// Whether a word of this class may name a function when followed by `(`.
    pub fn may_name_function(&self) -> bool {
        !matches!(
            self,
            TokenClass::EndClause
                | TokenClass::Logical
                | TokenClass::Quantifier
                | TokenClass::Dml
                | TokenClass::Select
                | TokenClass::On
        )
    }
}

/// Heuristic used before `(`: an identifier-looking word that is not a
/// clause, logical, quantifier or DML keyword.
pub fn is_function_name(lc_token: &str) -> bool {
    let Some(first) = lc_token.chars().next() else {
        return false;
    };
    let looks_like_identifier = first.is_alphabetic() || first == '_' || first == '$' || first == '"';
    looks_like_identifier && classify_token(lc_token).may_name_function()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_keyword_case_insensitive() {
        assert_eq!(lookup_keyword("asc"), Some(KeywordKind::Asc));
        assert_eq!(lookup_keyword("DESC"), Some(KeywordKind::Desc));
        assert_eq!(lookup_keyword("Collate"), Some(KeywordKind::Collate));
        assert_eq!(lookup_keyword("nUlLs"), Some(KeywordKind::Nulls));
    }

    #[test]
    fn test_lookup_keyword_not_found() {
        assert_eq!(lookup_keyword("ascending"), None);
        assert_eq!(lookup_keyword(""), None);
        assert_eq!(lookup_keyword("order"), None);
    }

    #[test]
    fn test_keyword_predicates() {
        assert!(KeywordKind::Asc.is_direction());
        assert!(KeywordKind::Desc.is_direction());
        assert!(!KeywordKind::Nulls.is_direction());
        assert!(KeywordKind::First.is_contextual());
        assert!(!KeywordKind::Collate.is_contextual());
    }

    #[test]
    fn test_quoted_token_termination() {
        let closed = Token::new(TokenKind::StringLiteral, "'abc'", 0);
        assert!(closed.is_terminated());
        assert_eq!(closed.unquoted(), "abc");

        let open = Token::new(TokenKind::QuotedIdentifier, "\"abc", 0);
        assert!(!open.is_terminated());
        assert_eq!(open.unquoted(), "abc");

        let lone = Token::new(TokenKind::StringLiteral, "'", 0);
        assert!(!lone.is_terminated());

        let bracket = Token::new(TokenKind::QuotedIdentifier, "[order]", 3);
        assert!(bracket.is_terminated());
        assert_eq!(bracket.unquoted(), "order");
    }

    #[test]
    fn test_classify_token() {
        assert_eq!(classify_token("left"), TokenClass::BeginClause);
        assert_eq!(classify_token("order"), TokenClass::BeginClause);
        assert_eq!(classify_token("by"), TokenClass::EndClause);
        assert_eq!(classify_token("union"), TokenClass::EndClause);
        assert_eq!(classify_token("end"), TokenClass::Logical);
        assert_eq!(classify_token("exists"), TokenClass::Quantifier);
        assert_eq!(classify_token("delete"), TokenClass::Dml);
        assert_eq!(classify_token("select"), TokenClass::Select);
        assert_eq!(classify_token("on"), TokenClass::On);
        assert_eq!(classify_token("values"), TokenClass::Values);
        assert_eq!(classify_token("max"), TokenClass::Other);
    }

    #[test]
    fn test_is_function_name() {
        assert!(is_function_name("max"));
        assert!(is_function_name("\"quoted_fn\""));
        assert!(is_function_name("values"));
        assert!(is_function_name("left"));
        assert!(!is_function_name("in"));
        assert!(!is_function_name("where"));
        assert!(!is_function_name("select"));
        assert!(!is_function_name("and"));
        assert!(!is_function_name("="));
        assert!(!is_function_name("1"));
        assert!(!is_function_name(""));
    }
}

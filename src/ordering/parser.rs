//! Recursive-descent parser for order-by fragments.
//!
//! ```text
//! sortList     := sortSpec (',' sortSpec)*
//! sortSpec     := sortKey collation? ordering?
//! sortKey      := functionCall | identifier
//! functionCall := IDENT '(' (argument (',' argument)*)? ')'
//! argument     := operand ((operator operand) | operand)*
//! collation    := 'collate' IDENT
//! ordering     := ('asc' | 'desc')? ('nulls' ('first' | 'last'))?
//! ```
//!
//! Function names are not checked here; whether `foo(x)` is a known SQL
//! function is decided during resolution.

use crate::config::TranslateOptions;
use crate::error::FragmentSyntaxError;
use crate::lexer::significant_tokens;
use crate::token::{FUNCTION_KEYWORDS, KeywordKind, Token, TokenKind};

use super::ast::{
    Expr, FunctionCall, Identifier, IdentifierForm, NullPrecedence, OrderingDirection, SortKey,
    SortList, SortSpec,
};
use super::trace::{ParseTracer, Rule};

type ParseResult<T> = Result<T, FragmentSyntaxError>;

pub struct Parser<'a, 't> {
    fragment: &'a str,
    tokens: Vec<Token<'a>>,
    pos: usize,
    rule_depth: usize,
    nesting: usize,
    max_depth: usize,
    tracer: &'t mut dyn ParseTracer,
}

impl<'a, 't> Parser<'a, 't> {
    pub fn new(
        fragment: &'a str,
        options: &TranslateOptions,
        tracer: &'t mut dyn ParseTracer,
    ) -> Self {
        Self {
            fragment,
            tokens: significant_tokens(fragment),
            pos: 0,
            rule_depth: 0,
            nesting: 0,
            max_depth: options.max_depth,
            tracer,
        }
    }

    pub fn parse(mut self) -> ParseResult<SortList> {
        self.traced(Rule::SortList, Self::sort_list)
    }

    fn peek(&self) -> Token<'a> {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> Token<'a> {
        self.tokens
            .get(self.pos + offset)
            .copied()
            .unwrap_or_else(|| Token::eof(self.fragment.len()))
    }

    fn advance(&mut self) -> Token<'a> {
        let token = self.peek();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn unexpected(token: Token<'a>, expected: &'static str) -> FragmentSyntaxError {
        if token.kind == TokenKind::Eof {
            FragmentSyntaxError::UnexpectedEnd {
                position: token.position,
                expected,
            }
        } else {
            FragmentSyntaxError::UnexpectedToken {
                found: token.text.to_string(),
                position: token.position,
                expected,
            }
        }
    }

    fn traced<T>(&mut self, rule: Rule, f: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        self.tracer.enter(rule, self.rule_depth);
        self.rule_depth += 1;
        let result = f(self);
        self.rule_depth -= 1;
        self.tracer.exit(rule, self.rule_depth);
        result
    }

    fn descend(&mut self, position: usize) -> ParseResult<()> {
        if self.nesting >= self.max_depth {
            return Err(FragmentSyntaxError::NestingTooDeep {
                max_depth: self.max_depth,
                position,
            });
        }
        self.nesting += 1;
        Ok(())
    }

    fn ascend(&mut self) {
        self.nesting = self.nesting.saturating_sub(1);
    }

    fn sort_list(&mut self) -> ParseResult<SortList> {
        let mut specs = Vec::new();
        loop {
            specs.push(self.traced(Rule::SortSpec, Self::sort_spec)?);
            let next = self.peek();
            match next.kind {
                TokenKind::Comma => {
                    self.advance();
                }
                TokenKind::Eof => break,
                _ => return Err(Self::unexpected(next, "',' or end of fragment")),
            }
        }
        Ok(SortList { specs })
    }

    fn sort_spec(&mut self) -> ParseResult<SortSpec> {
        let key = self.traced(Rule::SortKey, Self::sort_key)?;
        let mut spec = SortSpec::new(key);

        if self.peek().kind == TokenKind::Keyword(KeywordKind::Collate) {
            spec.collation = Some(self.traced(Rule::Collation, Self::collation)?);
        }
        if matches!(
            self.peek().kind,
            TokenKind::Keyword(KeywordKind::Asc | KeywordKind::Desc | KeywordKind::Nulls)
        ) {
            let (ordering, nulls) = self.traced(Rule::Ordering, Self::ordering)?;
            spec.ordering = ordering;
            spec.nulls = nulls;
        }
        Ok(spec)
    }

    fn sort_key(&mut self) -> ParseResult<SortKey> {
        let token = self.peek();
        match token.kind {
            TokenKind::Identifier => self.identifier_or_call(token),
            TokenKind::Keyword(kw) if kw.is_contextual() => self.identifier_or_call(token),
            TokenKind::QuotedIdentifier | TokenKind::StringLiteral => {
                self.advance();
                Ok(SortKey::Identifier(Self::quoted(token)?))
            }
            _ => Err(Self::unexpected(token, "sort key")),
        }
    }

    fn identifier_or_call(&mut self, token: Token<'a>) -> ParseResult<SortKey> {
        if self.peek_at(1).kind == TokenKind::OpenParen {
            let call = self.traced(Rule::FunctionCall, Self::function_call)?;
            Ok(SortKey::FunctionCall(call))
        } else {
            self.advance();
            Ok(SortKey::Identifier(Identifier::plain(token.text)))
        }
    }

    fn quoted(token: Token<'a>) -> ParseResult<Identifier> {
        if !token.is_terminated() {
            return Err(FragmentSyntaxError::UnterminatedQuote {
                position: token.position,
            });
        }
        let form = if token.kind == TokenKind::StringLiteral {
            IdentifierForm::StringLiteral
        } else {
            IdentifierForm::Quoted
        };
        Ok(Identifier::new(token.unquoted(), form))
    }

    fn collation(&mut self) -> ParseResult<String> {
        self.advance();
        let name = self.peek();
        match name.kind {
            TokenKind::Identifier | TokenKind::QuotedIdentifier => {
                self.advance();
                Ok(name.text.to_string())
            }
            _ => Err(Self::unexpected(name, "collation name")),
        }
    }

    fn ordering(&mut self) -> ParseResult<(Option<OrderingDirection>, Option<NullPrecedence>)> {
        let direction = match self.peek().kind {
            TokenKind::Keyword(kw) if kw.is_direction() => Some(if kw == KeywordKind::Asc {
                OrderingDirection::Asc
            } else {
                OrderingDirection::Desc
            }),
            _ => None,
        };
        if direction.is_some() {
            self.advance();
        }

        if self.peek().kind != TokenKind::Keyword(KeywordKind::Nulls) {
            return Ok((direction, None));
        }
        self.advance();
        let which = self.peek();
        let nulls = match which.kind {
            TokenKind::Keyword(KeywordKind::First) => NullPrecedence::First,
            TokenKind::Keyword(KeywordKind::Last) => NullPrecedence::Last,
            _ => return Err(Self::unexpected(which, "'first' or 'last' after 'nulls'")),
        };
        self.advance();
        Ok((direction, Some(nulls)))
    }

    fn function_call(&mut self) -> ParseResult<FunctionCall> {
        let name = self.advance();
        self.advance();
        self.descend(name.position)?;

        let unbalanced = || FragmentSyntaxError::UnbalancedParens {
            name: name.text.to_string(),
            position: name.position,
        };

        let mut args = Vec::new();
        match self.peek().kind {
            TokenKind::CloseParen => {
                self.advance();
                self.ascend();
                return Ok(FunctionCall {
                    name: name.text.to_string(),
                    args,
                });
            }
            TokenKind::Eof => return Err(unbalanced()),
            _ => {}
        }

        loop {
            args.push(self.traced(Rule::Argument, |p| p.argument(name.text))?);
            let next = self.peek();
            match next.kind {
                TokenKind::Comma => {
                    self.advance();
                }
                TokenKind::CloseParen => {
                    self.advance();
                    break;
                }
                TokenKind::Eof => return Err(unbalanced()),
                _ => return Err(Self::unexpected(next, "',' or ')'")),
            }
        }

        self.ascend();
        Ok(FunctionCall {
            name: name.text.to_string(),
            args,
        })
    }

    /// One argument of `function`; `""` for a bare parenthesised group.
    fn argument(&mut self, function: &str) -> ParseResult<Expr> {
        let mut words = vec![self.operand()?];
        // each folded operator deepens the left-hand side by one level
        let mut chained = 0;
        loop {
            match self.peek().kind {
                TokenKind::Comma | TokenKind::CloseParen | TokenKind::Eof => break,
                TokenKind::Operator => {
                    self.descend(self.peek().position)?;
                    chained += 1;
                    let op = self.operator();
                    let rhs = self.operand()?;
                    // operators bind tighter than word juxtaposition
                    let lhs = words.pop().unwrap_or_else(|| Expr::Identifier(Identifier::verbatim("")));
                    words.push(Expr::Binary {
                        lhs: Box::new(lhs),
                        op,
                        rhs: Box::new(rhs),
                    });
                }
                _ => words.push(self.operand()?),
            }
        }
        for _ in 0..chained {
            self.ascend();
        }

        if words.len() == 1 {
            return Ok(words.remove(0));
        }
        mark_call_syntax_words(function, &mut words);
        Ok(Expr::Sequence(words))
    }

    /// Adjacent operator characters form one operator (`<=`, `<>`).
    fn operator(&mut self) -> String {
        let first = self.advance();
        let mut end = first.position + first.text.len();
        while self.peek().kind == TokenKind::Operator && self.peek().position == end {
            let next = self.advance();
            end = next.position + next.text.len();
        }
        self.fragment[first.position..end].to_string()
    }

    fn operand(&mut self) -> ParseResult<Expr> {
        let token = self.peek();
        match token.kind {
            TokenKind::Identifier | TokenKind::Keyword(KeywordKind::First | KeywordKind::Last) => {
                if self.peek_at(1).kind == TokenKind::OpenParen {
                    let call = self.traced(Rule::FunctionCall, Self::function_call)?;
                    Ok(Expr::FunctionCall(call))
                } else {
                    self.advance();
                    Ok(Expr::Identifier(Identifier::plain(token.text)))
                }
            }
            TokenKind::Number => {
                self.advance();
                Ok(Expr::Identifier(Identifier::verbatim(token.text)))
            }
            TokenKind::QuotedIdentifier | TokenKind::StringLiteral => {
                self.advance();
                Ok(Expr::Identifier(Self::quoted(token)?))
            }
            TokenKind::OpenParen => {
                self.advance();
                self.descend(token.position)?;
                let inner = self.argument("")?;
                let close = self.peek();
                match close.kind {
                    TokenKind::CloseParen => {
                        self.advance();
                    }
                    TokenKind::Eof => {
                        return Err(FragmentSyntaxError::UnbalancedParens {
                            name: "(".to_string(),
                            position: token.position,
                        });
                    }
                    _ => return Err(Self::unexpected(close, "')'")),
                }
                self.ascend();
                Ok(Expr::Parenthesized(Box::new(inner)))
            }
            TokenKind::Operator if token.text == "*" => {
                self.advance();
                Ok(Expr::Identifier(Identifier::verbatim("*")))
            }
            TokenKind::Operator if token.text == "-" || token.text == "+" => {
                self.advance();
                self.descend(token.position)?;
                let operand = self.operand()?;
                self.ascend();
                Ok(Expr::Unary {
                    op: token.text.to_string(),
                    operand: Box::new(operand),
                })
            }
            _ => Err(Self::unexpected(token, "function argument")),
        }
    }
}

/// Marks the words of a space-separated argument that are call syntax
/// rather than column references: the function keywords themselves, the
/// type after `as` and, for `extract`, the field before `from`.
fn mark_call_syntax_words(function: &str, words: &mut [Expr]) {
    let is_extract = function.eq_ignore_ascii_case("extract");
    let is_keyword = |expr: &Expr| match expr {
        Expr::Identifier(ident) if ident.form == IdentifierForm::Plain => {
            FUNCTION_KEYWORDS.contains(&ident.text.to_lowercase().as_str())
        }
        _ => false,
    };
    let lowered: Vec<Option<String>> = words
        .iter()
        .map(|w| match w {
            Expr::Identifier(ident) if is_keyword(w) => Some(ident.text.to_lowercase()),
            _ => None,
        })
        .collect();

    for idx in 0..words.len() {
        let after_as = idx > 0 && lowered[idx - 1].as_deref() == Some("as");
        let before_from =
            is_extract && lowered.get(idx + 1).and_then(|w| w.as_deref()) == Some("from");
        if lowered[idx].is_some() || after_as || before_from {
            if let Expr::Identifier(ident) = &mut words[idx]
                && ident.form == IdentifierForm::Plain
            {
                ident.form = IdentifierForm::Verbatim;
            }
        }
    }
}

/// Parses `fragment` into a sort list.
pub fn parse(
    fragment: &str,
    options: &TranslateOptions,
    tracer: &mut dyn ParseTracer,
) -> Result<SortList, FragmentSyntaxError> {
    Parser::new(fragment, options, tracer).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ordering::trace::{NoopTracer, RecordingTracer, TraceEvent};

    fn parse_ok(fragment: &str) -> SortList {
        parse(fragment, &TranslateOptions::default(), &mut NoopTracer)
            .unwrap_or_else(|e| panic!("failed to parse {fragment:?}: {e}"))
    }

    fn parse_err(fragment: &str) -> FragmentSyntaxError {
        match parse(fragment, &TranslateOptions::default(), &mut NoopTracer) {
            Ok(list) => panic!("expected error for {fragment:?}, got {list}"),
            Err(e) => e,
        }
    }

    #[test]
    fn test_single_identifier() {
        let list = parse_ok("name");
        assert_eq!(list.specs.len(), 1);
        assert_eq!(list.specs[0], SortSpec::new(SortKey::Identifier(Identifier::plain("name"))));
    }

    #[test]
    fn test_function_call_with_direction() {
        let list = parse_ok("lower(name) desc, id");
        assert_eq!(list.specs.len(), 2);
        assert_eq!(
            list.specs[0].key,
            SortKey::FunctionCall(FunctionCall {
                name: "lower".to_string(),
                args: vec![Expr::Identifier(Identifier::plain("name"))],
            })
        );
        assert_eq!(list.specs[0].ordering, Some(OrderingDirection::Desc));
        assert_eq!(list.specs[1].ordering, None);
        assert_eq!(list.to_string(), "lower(name) desc, id");
    }

    #[test]
    fn test_collation_and_nulls() {
        let list = parse_ok("name collate de_DE asc nulls last, age nulls first");
        assert_eq!(list.specs[0].collation.as_deref(), Some("de_DE"));
        assert_eq!(list.specs[0].ordering, Some(OrderingDirection::Asc));
        assert_eq!(list.specs[0].nulls, Some(NullPrecedence::Last));
        assert_eq!(list.specs[1].ordering, None);
        assert_eq!(list.specs[1].nulls, Some(NullPrecedence::First));
    }

    #[test]
    fn test_quoted_keys_keep_form() {
        let list = parse_ok("\"Name\" desc, 'literal'");
        assert_eq!(
            list.specs[0].key,
            SortKey::Identifier(Identifier::new("Name", IdentifierForm::Quoted))
        );
        assert_eq!(
            list.specs[1].key,
            SortKey::Identifier(Identifier::new("literal", IdentifierForm::StringLiteral))
        );
    }

    #[test]
    fn test_first_and_last_outside_nulls_are_identifiers() {
        let list = parse_ok("first, last desc");
        assert_eq!(list.to_string(), "first, last desc");
    }

    #[test]
    fn test_nested_and_arithmetic_arguments() {
        let list = parse_ok("coalesce(nickname, upper(name)), abs(a - -b)");
        assert_eq!(list.to_string(), "coalesce(nickname, upper(name)), abs(a - -b)");
    }

    #[test]
    fn test_compound_operator_and_star() {
        let list = parse_ok("greatest(a <= b, count(*))");
        assert_eq!(list.to_string(), "greatest(a <= b, count(*))");
    }

    #[test]
    fn test_word_sequence_marks_call_syntax() {
        let list = parse_ok("cast(code as integer), extract(year from born)");
        let SortKey::FunctionCall(cast) = &list.specs[0].key else {
            panic!("expected function call");
        };
        assert_eq!(
            cast.args[0],
            Expr::Sequence(vec![
                Expr::Identifier(Identifier::plain("code")),
                Expr::Identifier(Identifier::verbatim("as")),
                Expr::Identifier(Identifier::verbatim("integer")),
            ])
        );
        let SortKey::FunctionCall(extract) = &list.specs[1].key else {
            panic!("expected function call");
        };
        assert_eq!(
            extract.args[0],
            Expr::Sequence(vec![
                Expr::Identifier(Identifier::verbatim("year")),
                Expr::Identifier(Identifier::verbatim("from")),
                Expr::Identifier(Identifier::plain("born")),
            ])
        );
    }

    #[test]
    fn test_empty_argument_list() {
        let list = parse_ok("random()");
        assert_eq!(
            list.specs[0].key,
            SortKey::FunctionCall(FunctionCall {
                name: "random".to_string(),
                args: vec![],
            })
        );
    }

    #[test]
    fn test_empty_fragment_is_error() {
        assert_eq!(
            parse_err("   "),
            FragmentSyntaxError::UnexpectedEnd {
                position: 3,
                expected: "sort key",
            }
        );
    }

    #[test]
    fn test_trailing_comma_is_error() {
        assert_eq!(
            parse_err("name,"),
            FragmentSyntaxError::UnexpectedEnd {
                position: 5,
                expected: "sort key",
            }
        );
    }

    #[test]
    fn test_double_direction_is_error() {
        assert_eq!(
            parse_err("name desc desc"),
            FragmentSyntaxError::UnexpectedToken {
                found: "desc".to_string(),
                position: 10,
                expected: "',' or end of fragment",
            }
        );
    }

    #[test]
    fn test_unclosed_call_is_unbalanced() {
        assert_eq!(
            parse_err("lower(name desc"),
            FragmentSyntaxError::UnexpectedToken {
                found: "desc".to_string(),
                position: 11,
                expected: "function argument",
            }
        );
        assert_eq!(
            parse_err("lower(upper(name)"),
            FragmentSyntaxError::UnbalancedParens {
                name: "lower".to_string(),
                position: 0,
            }
        );
        assert_eq!(
            parse_err("lower("),
            FragmentSyntaxError::UnbalancedParens {
                name: "lower".to_string(),
                position: 0,
            }
        );
    }

    #[test]
    fn test_stray_close_paren() {
        assert_eq!(
            parse_err("name)"),
            FragmentSyntaxError::UnexpectedToken {
                found: ")".to_string(),
                position: 4,
                expected: "',' or end of fragment",
            }
        );
    }

    #[test]
    fn test_unterminated_quote_is_error() {
        assert_eq!(
            parse_err("id, \"Name desc"),
            FragmentSyntaxError::UnterminatedQuote { position: 4 }
        );
        assert_eq!(
            parse_err("upper('abc)"),
            FragmentSyntaxError::UnterminatedQuote { position: 6 }
        );
    }

    #[test]
    fn test_number_is_not_a_sort_key() {
        assert_eq!(
            parse_err("1 desc"),
            FragmentSyntaxError::UnexpectedToken {
                found: "1".to_string(),
                position: 0,
                expected: "sort key",
            }
        );
    }

    #[test]
    fn test_nulls_without_first_or_last() {
        assert_eq!(
            parse_err("name nulls"),
            FragmentSyntaxError::UnexpectedEnd {
                position: 10,
                expected: "'first' or 'last' after 'nulls'",
            }
        );
    }

    #[test]
    fn test_nesting_guard() {
        let options = TranslateOptions::default().with_max_depth(2);
        let ok = parse("f(g(x))", &options, &mut NoopTracer);
        assert!(ok.is_ok());

        let err = parse("f(g(h(x)))", &options, &mut NoopTracer);
        assert_eq!(
            err,
            Err(FragmentSyntaxError::NestingTooDeep {
                max_depth: 2,
                position: 4,
            })
        );
    }

    #[test]
    fn test_long_unary_run_hits_nesting_guard() {
        let fragment = format!("f({}x)", "-".repeat(10_000));
        assert!(matches!(
            parse(&fragment, &TranslateOptions::default(), &mut NoopTracer),
            Err(FragmentSyntaxError::NestingTooDeep { max_depth: 32, .. })
        ));
        assert_eq!(parse_ok("f(- -x)").to_string(), "f(- -x)");
    }

    #[test]
    fn test_long_operator_chain_hits_nesting_guard() {
        let fragment = format!("f({}a)", "a+".repeat(10_000));
        assert!(matches!(
            parse(&fragment, &TranslateOptions::default(), &mut NoopTracer),
            Err(FragmentSyntaxError::NestingTooDeep { max_depth: 32, .. })
        ));

        let options = TranslateOptions::default().with_max_depth(3);
        assert!(parse("f(a + b)", &options, &mut NoopTracer).is_ok());
        assert!(parse("f(a + b + c)", &options, &mut NoopTracer).is_ok());
        assert_eq!(
            parse("f(a + b + c + d)", &options, &mut NoopTracer),
            Err(FragmentSyntaxError::NestingTooDeep {
                max_depth: 3,
                position: 12,
            })
        );
    }

    #[test]
    fn test_substring_and_position_keywords() {
        let list = parse_ok("substring(name from 2 for 3), position('a' in name)");
        let SortKey::FunctionCall(substring) = &list.specs[0].key else {
            panic!("expected function call");
        };
        assert_eq!(
            substring.args[0],
            Expr::Sequence(vec![
                Expr::Identifier(Identifier::plain("name")),
                Expr::Identifier(Identifier::verbatim("from")),
                Expr::Identifier(Identifier::verbatim("2")),
                Expr::Identifier(Identifier::verbatim("for")),
                Expr::Identifier(Identifier::verbatim("3")),
            ])
        );
        let SortKey::FunctionCall(position) = &list.specs[1].key else {
            panic!("expected function call");
        };
        assert_eq!(
            position.args[0],
            Expr::Sequence(vec![
                Expr::Identifier(Identifier::new("a", IdentifierForm::StringLiteral)),
                Expr::Identifier(Identifier::verbatim("in")),
                Expr::Identifier(Identifier::plain("name")),
            ])
        );
    }

    #[test]
    fn test_tracer_sees_balanced_rules() {
        let mut tracer = RecordingTracer::default();
        parse("upper(a) desc", &TranslateOptions::default(), &mut tracer).unwrap();

        assert_eq!(tracer.events.first(), Some(&TraceEvent::Enter(Rule::SortList, 0)));
        assert_eq!(tracer.events.last(), Some(&TraceEvent::Exit(Rule::SortList, 0)));
        assert!(tracer.events.contains(&TraceEvent::Enter(Rule::FunctionCall, 3)));
        assert!(tracer.events.contains(&TraceEvent::Enter(Rule::Ordering, 2)));

        let enters = tracer
            .events
            .iter()
            .filter(|e| matches!(e, TraceEvent::Enter(..)))
            .count();
        assert_eq!(enters * 2, tracer.events.len());
    }
}

use crate::token::{Token, TokenClass, classify_token, is_function_name};

/// One formatting pass over a whitespace-preserving token stream.
///
/// Indentation is driven entirely by clause keywords and parentheses; the
/// tokens themselves are copied to the output unchanged and in order.
pub(crate) struct FormatProcess<'o> {
    indent_unit: &'o str,
    output: String,
    indent: i32,
    begin_line: bool,
    pending_space: bool,
    after_begin_before_end: bool,
    after_by_or_set_or_from_or_select: bool,
    after_on: bool,
    after_between: bool,
    after_insert: bool,
    in_function: usize,
    parens_since_select: i32,
    paren_counts: Vec<i32>,
    after_by_or_from_or_selects: Vec<bool>,
    last_token: Option<String>,
}

impl<'o> FormatProcess<'o> {
    pub(crate) fn new(indent_unit: &'o str, initial_prefix: &str) -> Self {
        Self {
            indent_unit,
            output: initial_prefix.to_string(),
            indent: 1,
            begin_line: true,
            pending_space: false,
            after_begin_before_end: false,
            after_by_or_set_or_from_or_select: false,
            after_on: false,
            after_between: false,
            after_insert: false,
            in_function: 0,
            parens_since_select: 0,
            paren_counts: Vec::new(),
            after_by_or_from_or_selects: Vec::new(),
            last_token: None,
        }
    }

    pub(crate) fn indent(&self) -> i32 {
        self.indent
    }

    pub(crate) fn feed(&mut self, token: &Token<'_>) {
        if token.is_whitespace() {
            self.white();
            return;
        }

        let text = token.text;
        let lc_token = text.to_lowercase();
        let in_list = self.after_by_or_set_or_from_or_select && self.in_function == 0;

        if in_list && text == "," {
            self.comma_after_by_or_from_or_select(text);
        } else if self.after_on && text == "," {
            self.comma_after_on(text);
        } else if text == "(" {
            self.open_paren(text);
        } else if text == ")" {
            self.close_paren(text);
        } else if token.is_quoted() {
            self.misc(text, &lc_token);
        } else {
            match classify_token(&lc_token) {
                TokenClass::BeginClause => self.begin_new_clause(text),
                TokenClass::EndClause => self.end_new_clause(text, &lc_token),
                TokenClass::Select => self.select(text),
                TokenClass::Dml => self.update_or_insert_or_delete(text, &lc_token),
                TokenClass::Values => self.values(text),
                TokenClass::On => self.on(text),
                TokenClass::Logical if self.after_between && lc_token == "and" => {
                    self.misc(text, &lc_token);
                    self.after_between = false;
                }
                TokenClass::Logical => self.logical(text, &lc_token),
                TokenClass::Quantifier | TokenClass::Other => self.misc(text, &lc_token),
            }
        }

        self.last_token = Some(lc_token);
    }

    pub(crate) fn finish(self) -> String {
        self.output
    }

    fn out(&mut self, text: &str) {
        if self.pending_space {
            self.output.push(' ');
            self.pending_space = false;
        }
        self.output.push_str(text);
    }

    fn newline(&mut self) {
        self.pending_space = false;
        self.output.push('\n');
        for _ in 0..self.indent.max(0) {
            self.output.push_str(self.indent_unit);
        }
        self.begin_line = true;
    }

    /// Whitespace collapses to one space, and to nothing at a line start.
    fn white(&mut self) {
        if !self.begin_line {
            self.pending_space = true;
        }
    }

    fn comma_after_on(&mut self, text: &str) {
        self.out(text);
        self.indent -= 1;
        self.newline();
        self.after_on = false;
        self.after_by_or_set_or_from_or_select = true;
    }

    fn comma_after_by_or_from_or_select(&mut self, text: &str) {
        self.out(text);
        self.newline();
    }

    fn logical(&mut self, text: &str, lc_token: &str) {
        if lc_token == "end" {
            self.indent -= 1;
        }
        self.newline();
        self.out(text);
        self.begin_line = false;
    }

    fn on(&mut self, text: &str) {
        self.indent += 1;
        self.after_on = true;
        self.newline();
        self.out(text);
        self.begin_line = false;
    }

    fn misc(&mut self, text: &str, lc_token: &str) {
        self.out(text);
        if lc_token == "between" {
            self.after_between = true;
        }
        if self.after_insert {
            self.newline();
            self.after_insert = false;
        } else {
            self.begin_line = false;
            if lc_token == "case" {
                self.indent += 1;
            }
        }
    }

    fn update_or_insert_or_delete(&mut self, text: &str, lc_token: &str) {
        self.out(text);
        self.indent += 1;
        self.begin_line = false;
        match lc_token {
            "update" => self.newline(),
            "insert" => self.after_insert = true,
            _ => {}
        }
    }

    fn select(&mut self, text: &str) {
        self.out(text);
        self.indent += 1;
        self.newline();
        self.paren_counts.push(self.parens_since_select);
        self.after_by_or_from_or_selects
            .push(self.after_by_or_set_or_from_or_select);
        self.parens_since_select = 0;
        self.after_by_or_set_or_from_or_select = true;
    }

    fn end_new_clause(&mut self, text: &str, lc_token: &str) {
        if !self.after_begin_before_end {
            self.indent -= 1;
            if self.after_on {
                self.indent -= 1;
                self.after_on = false;
            }
            self.newline();
        }
        self.out(text);
        if lc_token != "union" {
            self.indent += 1;
        }
        self.newline();
        self.after_begin_before_end = false;
        self.after_by_or_set_or_from_or_select = matches!(lc_token, "by" | "set" | "from");
    }

    fn begin_new_clause(&mut self, text: &str) {
        if !self.after_begin_before_end {
            if self.after_on {
                self.indent -= 1;
                self.after_on = false;
            }
            self.indent -= 1;
            self.newline();
        }
        self.out(text);
        self.begin_line = false;
        self.after_begin_before_end = true;
    }

    fn values(&mut self, text: &str) {
        self.indent -= 1;
        self.newline();
        self.out(text);
        self.indent += 1;
        self.newline();
    }

    fn close_paren(&mut self, text: &str) {
        self.parens_since_select -= 1;
        if self.parens_since_select < 0 {
            self.indent -= 1;
            // The `(` that opened this sub-select was counted in the
            // enclosing scope and is now closed.
            self.parens_since_select = self
                .paren_counts
                .pop()
                .map_or(0, |saved| (saved - 1).max(0));
            self.after_by_or_set_or_from_or_select =
                self.after_by_or_from_or_selects.pop().unwrap_or(false);
        }
        if self.in_function > 0 {
            self.in_function -= 1;
            self.out(text);
        } else {
            if !self.after_by_or_set_or_from_or_select {
                self.indent -= 1;
                self.newline();
            }
            self.out(text);
        }
        self.begin_line = false;
    }

    fn open_paren(&mut self, text: &str) {
        let after_function_name = self.last_token.as_deref().is_some_and(is_function_name);
        if after_function_name || self.in_function > 0 {
            self.in_function += 1;
        }
        self.begin_line = false;
        self.out(text);
        if self.in_function == 0 && !self.after_by_or_set_or_from_or_select {
            self.indent += 1;
            self.newline();
        }
        self.parens_since_select += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn run(sql: &str) -> FormatProcess<'static> {
        let mut process = FormatProcess::new("    ", "\n    ");
        for token in tokenize(sql) {
            process.feed(&token);
        }
        process
    }

    /// Indent right before each top-level `(` and right after its `)`.
    fn paren_indents(sql: &str) -> Vec<(i32, i32)> {
        let mut process = FormatProcess::new("    ", "\n    ");
        let mut depth = 0;
        let mut before = 0;
        let mut pairs = Vec::new();
        for token in tokenize(sql) {
            if token.text == "(" {
                if depth == 0 {
                    before = process.indent();
                }
                depth += 1;
            }
            process.feed(&token);
            if token.text == ")" {
                depth -= 1;
                if depth == 0 {
                    pairs.push((before, process.indent()));
                }
            }
        }
        pairs
    }

    #[test]
    fn test_initial_state() {
        let process = FormatProcess::new("  ", "");
        assert_eq!(process.indent(), 1);
        assert_eq!(process.finish(), "");
    }

    #[test]
    fn test_select_list_commas_break_lines() {
        assert_eq!(
            run("select a, b from t").finish(),
            "\n    select\n        a,\n        b\n    from\n        t"
        );
    }

    #[test]
    fn test_function_commas_stay_inline() {
        assert_eq!(
            run("select coalesce(a, (b + 1)) from t").finish(),
            "\n    select\n        coalesce(a, (b + 1))\n    from\n        t"
        );
    }

    #[test]
    fn test_sub_select_restores_indent() {
        let sql = "select * from t1 where a = (select max(x) from t2) and b = 1";
        assert_eq!(paren_indents(sql), vec![(2, 2)]);
        assert_eq!(
            run(sql).finish(),
            "\n    select\n        *\n    from\n        t1\n    where\n        a = (\n            select\n                max(x)\n            from\n                t2\n        )\n        and b = 1"
        );
    }

    #[test]
    fn test_between_and_is_not_logical() {
        assert_eq!(
            run("select a from t where a between 1 and 2").finish(),
            "\n    select\n        a\n    from\n        t\n    where\n        a between 1 and 2"
        );
    }

    #[test]
    fn test_case_when_indents() {
        assert_eq!(
            run("select case when a = 1 then 'x' else 'y' end from t").finish(),
            "\n    select\n        case\n            when a = 1 then 'x'\n            else 'y'\n        end\n    from\n        t"
        );
    }

    #[test]
    fn test_join_on() {
        assert_eq!(
            run("select a from t1 left outer join t2 on t1.id = t2.id where x = 1").finish(),
            "\n    select\n        a\n    from\n        t1\n    left outer join\n        t2\n            on t1.id = t2.id\n    where\n        x = 1"
        );
    }

    #[test]
    fn test_insert_values() {
        assert_eq!(
            run("insert into t (a, b) values (1, 2)").finish(),
            "\n    insert\n    into\n        t\n        (a, b)\n    values\n        (1, 2)"
        );
    }

    #[test]
    fn test_update_set() {
        assert_eq!(
            run("update t set a = 1 where id = 2").finish(),
            "\n    update\n        t\n    set\n        a = 1\n    where\n        id = 2"
        );
    }

    #[test]
    fn test_union() {
        assert_eq!(
            run("select a from t union select b from u").finish(),
            "\n    select\n        a\n    from\n        t\n    union\n    select\n        b\n    from\n        u"
        );
    }

    #[test]
    fn test_balanced_parens_restore_indent() {
        let statements = [
            "select a from t where (a = 1 or b = 2) and c = 3",
            "select a from t where id in (1, 2, 3)",
            "select a from t where id in (select id from u)",
            "select (select max(x) from u) as m from t",
            "select count(*) from t group by a having count(*) > 1",
            "select a from t where exists (select 1 from u where u.id = t.id) or (b > 2)",
            "delete from t where id in (select id from (select id from u) x)",
        ];
        for sql in statements {
            for (before, after) in paren_indents(sql) {
                assert_eq!(before, after, "unbalanced indent for: {sql}");
            }
        }
    }

    #[test]
    fn test_unbalanced_input_does_not_panic() {
        let output = run(")) select ( from ) ) , on ,").finish();
        assert!(output.contains("select"));
    }

    #[test]
    fn test_no_trailing_spaces() {
        let output = run("select a   from t   where a = 1  ").finish();
        assert!(output.lines().all(|line| !line.ends_with(' ')));
    }
}

use crate::{
    diagnostics::{Diagnostic, SourceSpan},
    lexer::{DEFAULT_MAX_TOKEN_LEN, Lexer, Token, TokenKind},
    node::Node,
};

/// Deepest nesting of lists, calls, `if` and `def` forms accepted by default.
pub const DEFAULT_MAX_NESTING: usize = 128;

/// Parses the single expression on `source`. Blank and comment-only lines
/// yield `Ok(None)`.
pub fn parse_line(source: &str) -> Result<Option<Node>, Diagnostic> {
    parse_line_with(source, DEFAULT_MAX_TOKEN_LEN, DEFAULT_MAX_NESTING)
}

pub fn parse_line_with(
    source: &str,
    max_token_len: usize,
    max_nesting: usize,
) -> Result<Option<Node>, Diagnostic> {
    let lexer = Lexer::with_max_token_len(source, max_token_len);
    let mut parser = Parser::new(lexer).with_max_nesting(max_nesting);
    if !parser.advance()? {
        return Ok(None);
    }
    let expr = parser.parse_expression()?;
    parser.finish()?;
    Ok(Some(expr))
}

/// Recursive-descent parser. `current` is the token the next call to
/// `parse_expression` starts from; after an expression is parsed it still
/// holds that expression's final token.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Option<Token>,
    depth: usize,
    max_nesting: usize,
}

impl<'a> Parser<'a> {
    pub fn new(lexer: Lexer<'a>) -> Self {
        Self {
            lexer,
            current: None,
            depth: 0,
            max_nesting: DEFAULT_MAX_NESTING,
        }
    }

    pub fn with_max_nesting(mut self, max_nesting: usize) -> Self {
        self.max_nesting = max_nesting;
        self
    }

    /// Moves to the next token. Returns `false` at end of line.
    pub fn advance(&mut self) -> Result<bool, Diagnostic> {
        self.current = self.lexer.next_token()?;
        Ok(self.current.is_some())
    }

    /// Fails if any token remains after the top-level expression.
    pub fn finish(&mut self) -> Result<(), Diagnostic> {
        match self.lexer.next_token()? {
            Some(token) => Err(self.error(
                &token,
                &format!("unexpected `{}` after expression", token.lexeme),
            )),
            None => Ok(()),
        }
    }

    pub fn parse_expression(&mut self) -> Result<Node, Diagnostic> {
        let token = self
            .current
            .clone()
            .ok_or_else(|| self.error_eof("expected an expression"))?;
        match token.kind {
            TokenKind::LParen => Ok(Node::list(self.parse_paren_content()?)),
            TokenKind::RParen => Err(self.error(&token, "unexpected `)`")),
            TokenKind::Quoted => self.parse_atom(token),
            TokenKind::Atom => match token.lexeme.as_str() {
                "def" => self.parse_def(),
                "if" => self.parse_if(),
                "list" => {
                    self.expect_lparen("list")?;
                    Ok(Node::list(self.parse_paren_content()?))
                }
                "data" => {
                    self.expect_lparen("data")?;
                    Ok(Node::data(self.parse_paren_content()?))
                }
                _ => self.parse_atom(token),
            },
        }
    }

    /// Parses expressions up to the matching `)`. The opening `(` must be the
    /// current token.
    fn parse_paren_content(&mut self) -> Result<Vec<Node>, Diagnostic> {
        self.nested(|parser| {
            let mut children = Vec::new();
            loop {
                let token = parser.advance_expecting("expected `)` to close the list")?;
                if token.kind == TokenKind::RParen {
                    break;
                }
                children.push(parser.parse_expression()?);
            }
            Ok(children)
        })
    }

    /// Runs `parse` one nesting level deeper, failing once the limit is hit.
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, Diagnostic>,
    ) -> Result<T, Diagnostic> {
        if self.depth >= self.max_nesting {
            let span = self
                .current
                .as_ref()
                .map_or(SourceSpan::point(self.lexer.position()), |token| token.span);
            return Err(Diagnostic::parse("expression nested too deeply")
                .with_span(span)
                .with_note(format!("nesting is limited to {} levels", self.max_nesting)));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn parse_def(&mut self) -> Result<Node, Diagnostic> {
        self.nested(Self::parse_def_form)
    }

    fn parse_def_form(&mut self) -> Result<Node, Diagnostic> {
        let name = self.advance_expecting("expected a name after `def`")?;
        if name.kind != TokenKind::Atom {
            return Err(self.error(&name, "expected a name after `def`"));
        }
        let next = self.advance_expecting(&format!("expected a value for `{}`", name.lexeme))?;
        if next.is("args") {
            self.expect_lparen("args")?;
            let params = self.parse_params()?;
            self.advance_expecting(&format!("expected a body for function `{}`", name.lexeme))?;
            let body = self.parse_expression()?;
            Ok(Node::function_def(name.lexeme, Node::args(params), body))
        } else {
            let value = self.parse_expression()?;
            Ok(Node::variable_def(name.lexeme, value))
        }
    }

    fn parse_params(&mut self) -> Result<Vec<Node>, Diagnostic> {
        let mut params = Vec::new();
        loop {
            let token = self.advance_expecting("expected `)` to close the parameter list")?;
            match token.kind {
                TokenKind::RParen => break,
                TokenKind::Atom => params.push(Node::symbol(token.lexeme)),
                _ => return Err(self.error(&token, "expected a parameter name")),
            }
        }
        Ok(params)
    }

    fn parse_if(&mut self) -> Result<Node, Diagnostic> {
        self.nested(Self::parse_if_form)
    }

    fn parse_if_form(&mut self) -> Result<Node, Diagnostic> {
        self.advance_expecting("missing condition in `if`")?;
        let condition = self.parse_expression()?;
        self.advance_expecting("missing true branch in `if`")?;
        let then_branch = self.parse_expression()?;
        self.advance_expecting("missing false branch in `if`")?;
        let else_branch = self.parse_expression()?;
        Ok(Node::if_node(condition, then_branch, else_branch))
    }

    fn parse_atom(&mut self, token: Token) -> Result<Node, Diagnostic> {
        if self.lexer.peek_char() == Some('(') {
            self.advance()?;
            let mut children = vec![Node::symbol(token.lexeme)];
            children.extend(self.parse_paren_content()?);
            return Ok(Node::call(children));
        }
        if let Ok(number) = token.lexeme.parse::<i64>() {
            return Ok(Node::number(number));
        }
        if token.kind == TokenKind::Quoted {
            return Ok(Node::string(token.lexeme));
        }
        Ok(Node::symbol(token.lexeme))
    }

    fn expect_lparen(&mut self, keyword: &str) -> Result<(), Diagnostic> {
        let message = format!("expected `(` after `{keyword}`");
        let token = self.advance_expecting(&message)?;
        if token.kind != TokenKind::LParen {
            return Err(self.error(&token, &message));
        }
        Ok(())
    }

    fn advance_expecting(&mut self, message: &str) -> Result<Token, Diagnostic> {
        self.advance()?;
        self.current.clone().ok_or_else(|| self.error_eof(message))
    }

    fn error(&self, token: &Token, message: &str) -> Diagnostic {
        Diagnostic::parse(message).with_span(token.span)
    }

    fn error_eof(&self, message: &str) -> Diagnostic {
        Diagnostic::parse(message)
            .with_span(SourceSpan::point(self.lexer.source().len()))
            .with_note("expressions must fit on a single line")
    }
}

use std::rc::Rc;

use crate::{
    common::{source::Source, span::Span},
    compiler::{
        ast::{Block, Expr, Func, Node, Return, Root, Value},
        error::{Error, ErrorKind, Note},
        token::{Token, TokenType, Tokens},
    },
};

/// How deeply expressions may nest before the parser gives up.
pub const DEFAULT_DEPTH_LIMIT: usize = 256;

/// We're using a precedence-climbing parser, so this little enum
/// defines different precedence levels (binding powers).
/// Each successive level is higher, so, for example,
/// multiplication is higher than addition: `* > +`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Prec {
    /// No precedence: not an operator.
    None = 0,
    /// `=`
    Assign,
    /// `||`
    Or,
    /// `&&`
    And,
    /// `==`, `!=`
    Equality,
    /// `<`, `<=`, `>`, `>=`
    Compare,
    /// `+`, `-`
    AddSub,
    /// `*`, `/`
    MulDiv,
    /// Prefix `!` and `-`.
    Unary,
    /// Calls, member access and parentheses.
    Call,
    /// Highest precedence.
    End,
}

impl Prec {
    /// Increments precedence level to cause the
    /// parser to associate infix operators to the left.
    /// `a + b + c` left-associated becomes `(a + b) + c`.
    /// `Prec::End` is already the highest precedence,
    /// so it stays put.
    pub fn left(&self) -> Prec {
        match self {
            Prec::None => Prec::Assign,
            Prec::Assign => Prec::Or,
            Prec::Or => Prec::And,
            Prec::And => Prec::Equality,
            Prec::Equality => Prec::Compare,
            Prec::Compare => Prec::AddSub,
            Prec::AddSub => Prec::MulDiv,
            Prec::MulDiv => Prec::Unary,
            Prec::Unary => Prec::Call,
            Prec::Call | Prec::End => Prec::End,
        }
    }

    /// Binding power of a token used as an infix operator.
    pub fn infix(kind: TokenType) -> Prec {
        match kind {
            TokenType::Equal => Prec::Assign,
            TokenType::Or => Prec::Or,
            TokenType::And => Prec::And,
            TokenType::EqualEq | TokenType::BangEq => Prec::Equality,
            TokenType::Less
            | TokenType::LessEq
            | TokenType::Greater
            | TokenType::GreaterEq => Prec::Compare,
            TokenType::Plus | TokenType::Minus => Prec::AddSub,
            TokenType::Star | TokenType::Slash => Prec::MulDiv,
            TokenType::LeftParen | TokenType::Dot => Prec::Call,
            _ => Prec::None,
        }
    }

    /// Binding power of a token used as a prefix operator.
    pub fn prefix(kind: TokenType) -> Prec {
        match kind {
            TokenType::Bang | TokenType::Minus => Prec::Unary,
            _ => Prec::None,
        }
    }
}

/// Numeric binding power of `kind` in prefix position, `0` if it isn't one.
pub fn prefix_binding_power(kind: TokenType) -> u8 {
    Prec::prefix(kind) as u8
}

/// Numeric binding power of `kind` in infix position, `0` if it isn't one.
pub fn infix_binding_power(kind: TokenType) -> u8 {
    Prec::infix(kind) as u8
}

/// Parses a token stream into a syntax tree,
/// with recursive descent for declarations and statements
/// and precedence climbing for expressions.
/// There is no error recovery: the first error is returned.
#[derive(Debug)]
pub struct Parser {
    source: Rc<Source>,
    tokens: Tokens,
    index: usize,
    depth: usize,
    depth_limit: usize,
}

impl Parser {
    pub fn new(source: Rc<Source>, tokens: Tokens) -> Parser {
        Parser::with_depth_limit(source, tokens, DEFAULT_DEPTH_LIMIT)
    }

    pub fn with_depth_limit(source: Rc<Source>, mut tokens: Tokens, depth_limit: usize) -> Parser {
        // the cursor relies on the stream being capped
        if tokens.last().map(|t| t.kind) != Some(TokenType::End) {
            tokens.push(Token::new(TokenType::End, source.len(), 0));
        }

        Parser {
            source,
            tokens,
            index: 0,
            depth: 0,
            depth_limit,
        }
    }

    /// Parses a token stream into a `Root` node.
    pub fn parse(source: Rc<Source>, tokens: Tokens) -> Result<Node, Error> {
        let mut parser = Parser::new(source, tokens);
        parser.parse_tree()
    }

    // token cursor

    pub fn current(&self) -> Token {
        self.tokens[self.index]
    }

    /// Moves on to the next token, never past `End`.
    pub fn advance(&mut self) -> Token {
        let token = self.current();
        if self.index + 1 < self.tokens.len() {
            self.index += 1;
        }
        token
    }

    pub fn check(&self, kind: TokenType) -> bool {
        self.current().kind == kind
    }

    /// Checks the token after the current one.
    pub fn check_next(&self, kind: TokenType) -> bool {
        self.tokens.get(self.index + 1).map(|t| t.kind) == Some(kind)
    }

    pub fn at_end(&self) -> bool {
        self.check(TokenType::End)
    }

    /// Consumes the current token if it is a `kind`,
    /// otherwise raises an error mentioning `context`.
    pub fn expect(&mut self, kind: TokenType, context: &str) -> Result<Token, Error> {
        if self.check(kind) {
            return Ok(self.advance());
        }
        Err(self.unexpected(&format!("Expected {} {}", kind, context)))
    }

    /// `End` has no text of its own, so it points just past the source.
    fn span(&self, token: Token) -> Span {
        match token.kind {
            TokenType::End => Span::point(&self.source, self.source.len()),
            _ => token.span(&self.source),
        }
    }

    /// An error pointing at the current token.
    fn unexpected(&self, reason: &str) -> Error {
        let token = self.current();
        Error::parsing(
            &format!("{}, found {}", reason, token.kind),
            &self.span(token),
        )
    }

    fn lexeme(&self, token: Token) -> &str {
        token.lexeme(&self.source.contents)
    }

    // declarations

    /// Top-level driver: collects every declaration, in order.
    pub fn parse_tree(&mut self) -> Result<Node, Error> {
        log::debug!("parsing {} tokens", self.tokens.len());
        let mut root = Root::default();

        while !self.at_end() {
            match self.current().kind {
                TokenType::Func => root.decls.push(Node::Func(self.parse_func()?)),
                _ => {
                    return Err(self.unexpected(
                        "Only function declarations are allowed at the top level",
                    ))
                },
            }
        }

        log::debug!("parsed {} declarations", root.decls.len());
        Ok(Node::Root(root))
    }

    /// `func name(a, b) { ... }`
    pub fn parse_func(&mut self) -> Result<Func, Error> {
        self.expect(TokenType::Func, "to start a function declaration")?;
        let name = self.expect(TokenType::Ident, "as the function's name")?;
        let name = self.lexeme(name).to_string();

        self.expect(TokenType::LeftParen, "to open the parameter list")?;
        let mut params = vec![];
        while !self.check(TokenType::RightParen) {
            let param = self.expect(TokenType::Ident, "in function parameters")?;
            params.push(self.lexeme(param).to_string());

            // trailing commas are fine, `func f(a, b,)`
            if !self.check(TokenType::RightParen) {
                self.expect(TokenType::Comma, "between function parameters")?;
            }
        }
        self.advance();

        let body = self.parse_block()?;
        Ok(Func { name, params, body })
    }

    /// `{ statement* }`
    pub fn parse_block(&mut self) -> Result<Block, Error> {
        let open = self.expect(TokenType::LeftBrace, "to open a block")?;
        let mut block = Block::default();

        while !self.check(TokenType::RightBrace) {
            if self.at_end() {
                let end = self.span(self.current());
                return Err(Error::error_with_note(
                    ErrorKind::Parsing,
                    "Unexpected end of source inside a block, expected `}`",
                    Note::new(Span::combine(&self.span(open), &end)),
                )
                .add_note(Note::new_with_hint(
                    "block opened here",
                    &self.span(open),
                )));
            }

            block.stmts.push(self.parse_statement()?);
        }
        self.advance();

        Ok(block)
    }

    // statements

    pub fn parse_statement(&mut self) -> Result<Node, Error> {
        match self.current().kind {
            TokenType::Return => Ok(Node::Return(self.parse_return()?)),
            TokenType::Func if self.check_next(TokenType::Ident) => Err(self.unexpected(
                "Functions can only be declared at the top level",
            )),
            _ => Err(self.unexpected("Unhandled statement")),
        }
    }

    /// `return expr;`
    pub fn parse_return(&mut self) -> Result<Return, Error> {
        self.expect(TokenType::Return, "to start a return statement")?;
        let expr = self.parse_expression(Prec::None)?;
        self.expect(TokenType::Semicolon, "after the returned expression")?;
        Ok(Return { expr })
    }

    // expressions

    /// Parses an expression whose operators all bind
    /// at least as tightly as `prec`.
    /// A lone operand is wrapped in an operator-less `Expr`.
    pub fn parse_expression(&mut self, prec: Prec) -> Result<Expr, Error> {
        let (node, _) = self.expression(prec)?;
        Ok(match node {
            Node::Expr(expr) => expr,
            operand => Expr::operand(operand),
        })
    }

    /// Raised when either the parser's own recursion
    /// or the height of the tree it builds passes `depth_limit`.
    fn too_deep(&self, token: Token) -> Error {
        Error::parsing(
            &format!(
                "Expression nests deeper than the limit of {}",
                self.depth_limit,
            ),
            &self.span(token),
        )
    }

    /// Returns the parsed node along with its height in `Expr` nodes.
    fn expression(&mut self, prec: Prec) -> Result<(Node, usize), Error> {
        self.depth += 1;
        if self.depth > self.depth_limit {
            return Err(self.too_deep(self.current()));
        }

        let mut left = self.primary()?;

        loop {
            let token = self.current();
            match token.kind {
                // expressions end cleanly here
                TokenType::Semicolon | TokenType::RightParen => break,
                TokenType::End => {
                    return Err(self.unexpected(
                        "Unexpected end of source while parsing an expression, expected `;`",
                    ))
                },
                _ => (),
            }

            let op_prec = Prec::infix(token.kind);
            if op_prec == Prec::None {
                return Err(self.unexpected("Expected an operator or `;`"));
            }
            if op_prec < prec {
                break;
            }

            // folding to the left grows the tree without recursing,
            // so its height is checked here
            left = self.infix(left, op_prec)?;
        }

        self.depth -= 1;
        Ok(left)
    }

    /// A single operand: a number or a parenthesized expression.
    fn primary(&mut self) -> Result<(Node, usize), Error> {
        let token = self.current();
        match token.kind {
            TokenType::Number => {
                self.advance();
                let value = self.lexeme(token).parse::<f64>().map_err(|_| {
                    Error::parsing("Number literal is not a valid number", &self.span(token))
                })?;
                Ok((Node::Value(Value(value)), 0))
            },
            TokenType::LeftParen => {
                self.advance();
                let inner = self.expression(Prec::None)?;
                self.expect(TokenType::RightParen, "to close the parenthesized expression")?;
                Ok(inner)
            },
            kind if Prec::prefix(kind) != Prec::None => {
                Err(self.unexpected("Prefix operators are not supported yet; expected a number"))
            },
            TokenType::End => Err(self.unexpected("Unexpected end of source, expected an expression")),
            _ => Err(self.unexpected("Expected an expression")),
        }
    }

    /// Consumes an infix operator and its right operand,
    /// folding them into the tree built so far.
    fn infix(&mut self, left: (Node, usize), prec: Prec) -> Result<(Node, usize), Error> {
        let op = self.current();
        if prec == Prec::Call {
            return Err(self.unexpected("Calls and member access are not supported yet"));
        }

        self.advance();
        let (right, right_height) = self.expression(prec.left())?;
        let (left, left_height) = left;

        let height = left_height.max(right_height) + 1;
        if height > self.depth_limit {
            return Err(self.too_deep(op));
        }

        Ok((Node::Expr(Expr::binary(left, op, right)), height))
    }
}

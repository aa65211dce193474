//! Recursive-descent parser with precedence climbing.

use crate::scanner::{ScanError, ScannerState, Token, TokenKind};
use prune_ast::node::{IncDecOp, Literal, Modifiers, Node, NodeId, OperandList};
use prune_ast::ops::is_primitive_type;
use prune_ast::{Arena, AssignOp, BinaryOp, UnaryOp};
use prune_common::{Atom, Span};
use rustc_hash::FxHashMap;
use smallvec::smallvec;

/// Error for malformed source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl From<ScanError> for ParseError {
    fn from(err: ScanError) -> ParseError {
        ParseError {
            message: err.message,
            span: err.span,
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}..{}", self.message, self.span.start, self.span.end)
    }
}

impl std::error::Error for ParseError {}

/// Parse a whole snippet as a statement sequence.
pub fn parse_program(source: &str) -> Result<(Arena, Vec<NodeId>), ParseError> {
    let mut parser = ParserState::new(source)?;
    let statements = parser.parse_statement_list(TokenKind::Eof)?;
    Ok((parser.into_arena(), statements))
}

/// Parse a single statement.
pub fn parse_statement(source: &str) -> Result<(Arena, NodeId), ParseError> {
    let mut parser = ParserState::new(source)?;
    let stmt = parser.parse_stmt()?;
    parser.expect(TokenKind::Eof)?;
    Ok((parser.into_arena(), stmt))
}

/// Parse a single expression.
pub fn parse_expression(source: &str) -> Result<(Arena, NodeId), ParseError> {
    let mut parser = ParserState::new(source)?;
    let expr = parser.parse_expr()?;
    parser.expect(TokenKind::Eof)?;
    Ok((parser.into_arena(), expr))
}

pub struct ParserState<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    arena: Arena,
    /// Lexical scope stack: name -> declaration node.
    scopes: Vec<FxHashMap<Atom, NodeId>>,
}

impl<'a> ParserState<'a> {
    pub fn new(source: &'a str) -> Result<ParserState<'a>, ParseError> {
        let tokens = ScannerState::new(source).scan_all()?;
        Ok(ParserState {
            source,
            tokens,
            pos: 0,
            arena: Arena::new(),
            scopes: vec![FxHashMap::default()],
        })
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn into_arena(self) -> Arena {
        self.arena
    }

    // =========================================================================
    // Token plumbing
    // =========================================================================

    fn peek(&self) -> TokenKind {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> TokenKind {
        self.tokens
            .get(self.pos + offset)
            .map_or(TokenKind::Eof, |t| t.kind)
    }

    fn current_span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .map_or(Span::SYNTHETIC, |t| t.span)
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos.min(self.tokens.len() - 1)];
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.peek() == kind {
            Ok(self.advance())
        } else {
            Err(self.error(format!("expected {kind:?}, found {:?}", self.peek())))
        }
    }

    fn error(&self, message: String) -> ParseError {
        ParseError {
            message,
            span: self.current_span(),
        }
    }

    fn token_text(&self, token: Token) -> &'a str {
        &self.source[token.span.start as usize..token.span.end as usize]
    }

    fn text_at(&self, offset: usize) -> &'a str {
        self.tokens
            .get(self.pos + offset)
            .map_or("", |&t| self.token_text(t))
    }

    // =========================================================================
    // Scope handling
    // =========================================================================

    fn push_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: Atom, decl: NodeId) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, decl);
        }
    }

    fn resolve(&self, name: Atom) -> Option<NodeId> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(&name).copied())
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn parse_statement_list(&mut self, terminator: TokenKind) -> Result<Vec<NodeId>, ParseError> {
        let mut statements = Vec::new();
        while self.peek() != terminator && self.peek() != TokenKind::Eof {
            statements.push(self.parse_stmt()?);
        }
        Ok(statements)
    }

    pub fn parse_stmt(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_span();
        match self.peek() {
            TokenKind::LBrace => self.parse_block(),
            TokenKind::KwIf => self.parse_if(),
            TokenKind::KwWhile => self.parse_while(),
            TokenKind::KwDo => self.parse_do_while(),
            TokenKind::KwFor => self.parse_for(),
            TokenKind::KwSwitch => self.parse_switch(),
            TokenKind::KwBreak => {
                self.advance();
                let label = self.opt_label()?;
                self.expect(TokenKind::Semicolon)?;
                Ok(self.add(Node::Break { label }, start))
            }
            TokenKind::KwContinue => {
                self.advance();
                let label = self.opt_label()?;
                self.expect(TokenKind::Semicolon)?;
                Ok(self.add(Node::Continue { label }, start))
            }
            TokenKind::KwReturn => {
                self.advance();
                let value = if self.peek() == TokenKind::Semicolon {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.expect(TokenKind::Semicolon)?;
                Ok(self.add(Node::Return { value }, start))
            }
            TokenKind::KwThrow => {
                self.advance();
                let value = self.parse_expr()?;
                self.expect(TokenKind::Semicolon)?;
                Ok(self.add(Node::Throw { value }, start))
            }
            TokenKind::KwAssert => {
                self.advance();
                let condition = self.parse_expr()?;
                let message = if self.eat(TokenKind::Colon) {
                    Some(self.parse_expr()?)
                } else {
                    None
                };
                self.expect(TokenKind::Semicolon)?;
                Ok(self.add(Node::Assert { condition, message }, start))
            }
            TokenKind::Semicolon => {
                self.advance();
                Ok(self.add(Node::Empty, start))
            }
            TokenKind::Ident if self.peek_at(1) == TokenKind::Colon => {
                let token = self.advance();
                let label = self.arena.intern(self.token_text(token));
                self.advance(); // colon
                let statement = self.parse_stmt()?;
                Ok(self.add(Node::Labeled { label, statement }, start))
            }
            _ if self.at_declaration() => self.parse_local_decl(),
            _ => {
                let expression = self.parse_expr()?;
                self.expect(TokenKind::Semicolon)?;
                Ok(self.add(Node::ExprStmt { expression }, start))
            }
        }
    }

    /// `final int x`, `int x = 1;`, `Foo f = ...;`
    fn at_declaration(&self) -> bool {
        if matches!(self.peek(), TokenKind::KwFinal | TokenKind::KwStatic) {
            return true;
        }
        self.peek() == TokenKind::Ident
            && self.peek_at(1) == TokenKind::Ident
            && matches!(self.peek_at(2), TokenKind::Assign | TokenKind::Semicolon)
    }

    fn parse_local_decl(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_span();
        let mut modifiers = Modifiers::empty();
        loop {
            if self.eat(TokenKind::KwFinal) {
                modifiers |= Modifiers::FINAL;
            } else if self.eat(TokenKind::KwStatic) {
                modifiers |= Modifiers::STATIC;
            } else {
                break;
            }
        }
        let type_token = self.expect(TokenKind::Ident)?;
        let type_name = self.arena.intern(self.token_text(type_token));
        let name_token = self.expect(TokenKind::Ident)?;
        let name = self.arena.intern(self.token_text(name_token));
        let initializer = if self.eat(TokenKind::Assign) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon)?;
        let decl = self.add(
            Node::LocalDecl {
                modifiers,
                type_name,
                name,
                initializer,
            },
            start,
        );
        self.declare(name, decl);
        Ok(decl)
    }

    fn parse_block(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_span();
        self.expect(TokenKind::LBrace)?;
        self.push_scope();
        let statements = self.parse_statement_list(TokenKind::RBrace)?;
        self.pop_scope();
        self.expect(TokenKind::RBrace)?;
        Ok(self.add(Node::Block { statements }, start))
    }

    fn parse_if(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_span();
        self.expect(TokenKind::KwIf)?;
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        let then_branch = self.parse_stmt()?;
        let else_branch = if self.eat(TokenKind::KwElse) {
            Some(self.parse_stmt()?)
        } else {
            None
        };
        Ok(self.add(
            Node::If {
                condition,
                then_branch,
                else_branch,
            },
            start,
        ))
    }

    fn parse_while(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_span();
        self.expect(TokenKind::KwWhile)?;
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        let body = self.parse_stmt()?;
        Ok(self.add(Node::While { condition, body }, start))
    }

    fn parse_do_while(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_span();
        self.expect(TokenKind::KwDo)?;
        let body = self.parse_stmt()?;
        self.expect(TokenKind::KwWhile)?;
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::Semicolon)?;
        Ok(self.add(Node::DoWhile { body, condition }, start))
    }

    fn parse_for(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_span();
        self.expect(TokenKind::KwFor)?;
        self.expect(TokenKind::LParen)?;
        self.push_scope();

        // For-each: `for (final Type name : iterable)`
        let foreach_offset = if self.peek() == TokenKind::KwFinal { 1 } else { 0 };
        let is_foreach = self.peek_at(foreach_offset) == TokenKind::Ident
            && self.peek_at(foreach_offset + 1) == TokenKind::Ident
            && self.peek_at(foreach_offset + 2) == TokenKind::Colon;
        if is_foreach {
            let mut modifiers = Modifiers::empty();
            if self.eat(TokenKind::KwFinal) {
                modifiers |= Modifiers::FINAL;
            }
            let decl_start = self.current_span();
            let type_token = self.expect(TokenKind::Ident)?;
            let type_name = self.arena.intern(self.token_text(type_token));
            let name_token = self.expect(TokenKind::Ident)?;
            let name = self.arena.intern(self.token_text(name_token));
            let variable = self.add(
                Node::LocalDecl {
                    modifiers,
                    type_name,
                    name,
                    initializer: None,
                },
                decl_start,
            );
            self.declare(name, variable);
            self.expect(TokenKind::Colon)?;
            let iterable = self.parse_expr()?;
            self.expect(TokenKind::RParen)?;
            let body = self.parse_stmt()?;
            self.pop_scope();
            return Ok(self.add(
                Node::ForEach {
                    variable,
                    iterable,
                    body,
                },
                start,
            ));
        }

        let init = if self.eat(TokenKind::Semicolon) {
            None
        } else if self.at_declaration() {
            Some(self.parse_local_decl()?)
        } else {
            let expr_start = self.current_span();
            let expression = self.parse_expr()?;
            self.expect(TokenKind::Semicolon)?;
            Some(self.add(Node::ExprStmt { expression }, expr_start))
        };
        let condition = if self.peek() == TokenKind::Semicolon {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenKind::Semicolon)?;
        let update = if self.peek() == TokenKind::RParen {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenKind::RParen)?;
        let body = self.parse_stmt()?;
        self.pop_scope();
        Ok(self.add(
            Node::For {
                init,
                condition,
                update,
                body,
            },
            start,
        ))
    }

    fn parse_switch(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_span();
        self.expect(TokenKind::KwSwitch)?;
        self.expect(TokenKind::LParen)?;
        let selector = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::LBrace)?;
        self.push_scope();

        let mut cases = Vec::new();
        let mut has_default = false;
        while !matches!(self.peek(), TokenKind::RBrace | TokenKind::Eof) {
            let case_start = self.current_span();
            let mut labels = Vec::new();
            let mut is_default = false;
            // Consecutive labels share one clause.
            loop {
                if self.eat(TokenKind::KwCase) {
                    labels.push(self.parse_expr()?);
                    self.expect(TokenKind::Colon)?;
                } else if self.eat(TokenKind::KwDefault) {
                    is_default = true;
                    has_default = true;
                    self.expect(TokenKind::Colon)?;
                } else {
                    break;
                }
            }
            if labels.is_empty() && !is_default {
                return Err(self.error("expected `case` or `default`".into()));
            }
            let mut body = Vec::new();
            while !matches!(
                self.peek(),
                TokenKind::KwCase | TokenKind::KwDefault | TokenKind::RBrace | TokenKind::Eof
            ) {
                body.push(self.parse_stmt()?);
            }
            cases.push(self.add(
                Node::Case {
                    labels,
                    is_default,
                    body,
                },
                case_start,
            ));
        }
        self.pop_scope();
        self.expect(TokenKind::RBrace)?;
        Ok(self.add(
            Node::Switch {
                selector,
                cases,
                exhaustive: has_default,
            },
            start,
        ))
    }

    fn opt_label(&mut self) -> Result<Option<Atom>, ParseError> {
        if self.peek() == TokenKind::Ident {
            let token = self.advance();
            Ok(Some(self.arena.intern(self.token_text(token))))
        } else {
            Ok(None)
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    pub fn parse_expr(&mut self) -> Result<NodeId, ParseError> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_span();
        let target = self.parse_ternary()?;
        let op = match self.peek() {
            TokenKind::Assign => Some(AssignOp::Assign),
            TokenKind::PlusAssign => Some(AssignOp::AddAssign),
            TokenKind::MinusAssign => Some(AssignOp::SubAssign),
            TokenKind::StarAssign => Some(AssignOp::MulAssign),
            TokenKind::SlashAssign => Some(AssignOp::DivAssign),
            TokenKind::PercentAssign => Some(AssignOp::RemAssign),
            TokenKind::AmpAssign => Some(AssignOp::AndAssign),
            TokenKind::PipeAssign => Some(AssignOp::OrAssign),
            TokenKind::CaretAssign => Some(AssignOp::XorAssign),
            TokenKind::ShlAssign => Some(AssignOp::ShlAssign),
            TokenKind::ShrAssign => Some(AssignOp::ShrAssign),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let value = self.parse_assignment()?;
            return Ok(self.add(Node::Assign { op, target, value }, start));
        }
        Ok(target)
    }

    fn parse_ternary(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_span();
        let condition = self.parse_binary(0)?;
        if self.eat(TokenKind::Question) {
            let then_expr = self.parse_ternary()?;
            self.expect(TokenKind::Colon)?;
            let else_expr = self.parse_ternary()?;
            return Ok(self.add(
                Node::Conditional {
                    condition,
                    then_expr,
                    else_expr,
                },
                start,
            ));
        }
        Ok(condition)
    }

    fn binary_op_at(&self, level: u8) -> Option<BinaryOp> {
        let op = match self.peek() {
            TokenKind::PipePipe => BinaryOp::Or,
            TokenKind::AmpAmp => BinaryOp::And,
            TokenKind::Pipe => BinaryOp::BitOr,
            TokenKind::Caret => BinaryOp::Xor,
            TokenKind::Amp => BinaryOp::BitAnd,
            TokenKind::EqEq => BinaryOp::Eq,
            TokenKind::BangEq => BinaryOp::Ne,
            TokenKind::Lt => BinaryOp::Lt,
            TokenKind::Gt => BinaryOp::Gt,
            TokenKind::Le => BinaryOp::Le,
            TokenKind::Ge => BinaryOp::Ge,
            TokenKind::Shl => BinaryOp::Shl,
            TokenKind::Shr => BinaryOp::Shr,
            TokenKind::UShr => BinaryOp::UShr,
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            TokenKind::Percent => BinaryOp::Rem,
            _ => return None,
        };
        (op.precedence() == level + 1).then_some(op)
    }

    /// Precedence climbing over the ten binary levels. Identical
    /// consecutive associative operators are flattened into one polyadic
    /// node, so `a && b && c` has a single three-operand `&&`.
    fn parse_binary(&mut self, level: u8) -> Result<NodeId, ParseError> {
        const MAX_LEVEL: u8 = 9;
        let start = self.current_span();
        if level > MAX_LEVEL {
            return self.parse_unary();
        }
        let mut lhs = self.parse_binary(level + 1)?;

        // `instanceof` sits at relational precedence.
        if level + 1 == 7 && self.eat(TokenKind::KwInstanceof) {
            let type_token = self.expect(TokenKind::Ident)?;
            let type_name = self.arena.intern(self.token_text(type_token));
            lhs = self.add(
                Node::InstanceOf {
                    operand: lhs,
                    type_name,
                },
                start,
            );
        }

        while let Some(op) = self.binary_op_at(level) {
            self.advance();
            let rhs = self.parse_binary(level + 1)?;
            let mut operands: OperandList = smallvec![lhs, rhs];
            if flattenable(op) {
                while self.binary_op_at(level) == Some(op) {
                    self.advance();
                    operands.push(self.parse_binary(level + 1)?);
                }
            }
            lhs = self.add(Node::Binary { op, operands }, start);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_span();
        match self.peek() {
            TokenKind::Bang => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(self.add(
                    Node::Unary {
                        op: UnaryOp::Not,
                        operand,
                    },
                    start,
                ))
            }
            TokenKind::Tilde => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(self.add(
                    Node::Unary {
                        op: UnaryOp::BitNot,
                        operand,
                    },
                    start,
                ))
            }
            TokenKind::Minus => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(self.add(
                    Node::Unary {
                        op: UnaryOp::Neg,
                        operand,
                    },
                    start,
                ))
            }
            TokenKind::Plus => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(self.add(
                    Node::Unary {
                        op: UnaryOp::Plus,
                        operand,
                    },
                    start,
                ))
            }
            TokenKind::PlusPlus => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(self.add(
                    Node::IncDec {
                        op: IncDecOp::Inc,
                        prefix: true,
                        operand,
                    },
                    start,
                ))
            }
            TokenKind::MinusMinus => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(self.add(
                    Node::IncDec {
                        op: IncDecOp::Dec,
                        prefix: true,
                        operand,
                    },
                    start,
                ))
            }
            TokenKind::LParen if self.at_cast() => {
                self.advance();
                let type_token = self.expect(TokenKind::Ident)?;
                let type_name = self.arena.intern(self.token_text(type_token));
                self.expect(TokenKind::RParen)?;
                let operand = self.parse_unary()?;
                Ok(self.add(Node::Cast { type_name, operand }, start))
            }
            _ => self.parse_postfix(),
        }
    }

    /// `(T) x` is a cast when `T` is a primitive type name, or an
    /// uppercase identifier followed by a token that can only begin a cast
    /// operand. Everything else stays a parenthesized expression.
    fn at_cast(&self) -> bool {
        if self.peek_at(1) != TokenKind::Ident || self.peek_at(2) != TokenKind::RParen {
            return false;
        }
        let name = self.text_at(1);
        if is_primitive_type(name) {
            return true;
        }
        name.starts_with(|c: char| c.is_ascii_uppercase())
            && matches!(
                self.peek_at(3),
                TokenKind::Ident
                    | TokenKind::IntLiteral
                    | TokenKind::FloatLiteral
                    | TokenKind::StringLiteral
                    | TokenKind::LParen
                    | TokenKind::Bang
                    | TokenKind::Tilde
                    | TokenKind::KwNew
                    | TokenKind::KwNull
            )
    }

    fn parse_postfix(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_span();
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek() {
                TokenKind::Dot => {
                    self.advance();
                    let name_token = self.expect(TokenKind::Ident)?;
                    let callee = self.arena.intern(self.token_text(name_token));
                    self.expect(TokenKind::LParen)?;
                    let args = self.parse_args()?;
                    expr = self.add(
                        Node::Call {
                            receiver: Some(expr),
                            callee,
                            args,
                        },
                        start,
                    );
                }
                TokenKind::PlusPlus => {
                    self.advance();
                    expr = self.add(
                        Node::IncDec {
                            op: IncDecOp::Inc,
                            prefix: false,
                            operand: expr,
                        },
                        start,
                    );
                }
                TokenKind::MinusMinus => {
                    self.advance();
                    expr = self.add(
                        Node::IncDec {
                            op: IncDecOp::Dec,
                            prefix: false,
                            operand: expr,
                        },
                        start,
                    );
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_args(&mut self) -> Result<Vec<NodeId>, ParseError> {
        let mut args = Vec::new();
        if self.peek() != TokenKind::RParen {
            loop {
                args.push(self.parse_expr()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_span();
        match self.peek() {
            TokenKind::KwTrue => {
                self.advance();
                Ok(self.add(Node::Literal(Literal::Bool(true)), start))
            }
            TokenKind::KwFalse => {
                self.advance();
                Ok(self.add(Node::Literal(Literal::Bool(false)), start))
            }
            TokenKind::KwNull => {
                self.advance();
                Ok(self.add(Node::Literal(Literal::Null), start))
            }
            TokenKind::IntLiteral => {
                let token = self.advance();
                let text = self.token_text(token).trim_end_matches(['l', 'L']);
                let value = text
                    .parse::<i64>()
                    .map_err(|_| self.error(format!("integer literal out of range: {text}")))?;
                Ok(self.add(Node::Literal(Literal::Int(value)), start))
            }
            TokenKind::FloatLiteral => {
                let token = self.advance();
                let text = self
                    .token_text(token)
                    .trim_end_matches(['f', 'F', 'd', 'D']);
                let value = text
                    .parse::<f64>()
                    .map_err(|_| self.error(format!("malformed float literal: {text}")))?;
                Ok(self.add(Node::Literal(Literal::Float(value)), start))
            }
            TokenKind::StringLiteral => {
                let token = self.advance();
                let raw = self.token_text(token);
                let contents = unescape(&raw[1..raw.len() - 1]);
                let atom = self.arena.intern(&contents);
                Ok(self.add(Node::Literal(Literal::Str(atom)), start))
            }
            TokenKind::Ident => {
                let token = self.advance();
                let name = self.arena.intern(self.token_text(token));
                if self.eat(TokenKind::LParen) {
                    let args = self.parse_args()?;
                    Ok(self.add(
                        Node::Call {
                            receiver: None,
                            callee: name,
                            args,
                        },
                        start,
                    ))
                } else {
                    let decl = self.resolve(name);
                    Ok(self.add(Node::VarRef { name, decl }, start))
                }
            }
            TokenKind::KwNew => {
                self.advance();
                let type_token = self.expect(TokenKind::Ident)?;
                let type_name = self.arena.intern(self.token_text(type_token));
                self.expect(TokenKind::LParen)?;
                let args = self.parse_args()?;
                Ok(self.add(Node::New { type_name, args }, start))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(self.add(Node::Paren(inner), start))
            }
            other => Err(self.error(format!("unexpected token {other:?} in expression"))),
        }
    }

    fn add(&mut self, node: Node, start: Span) -> NodeId {
        let end = self
            .tokens
            .get(self.pos.saturating_sub(1))
            .map_or(start, |t| t.span);
        self.arena.add_spanned(node, start.merge(end))
    }
}

/// Operators whose repeated applications collapse into one polyadic node.
fn flattenable(op: BinaryOp) -> bool {
    matches!(
        op,
        BinaryOp::And
            | BinaryOp::Or
            | BinaryOp::BitAnd
            | BinaryOp::BitOr
            | BinaryOp::Xor
            | BinaryOp::Add
            | BinaryOp::Mul
    )
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polyadic_and_is_one_node() {
        let (arena, expr) = parse_expression("a && b && c").expect("parse");
        match arena.get(expr) {
            Some(Node::Binary { op, operands }) => {
                assert_eq!(*op, BinaryOp::And);
                assert_eq!(operands.len(), 3);
            }
            other => panic!("expected polyadic &&, got {other:?}"),
        }
    }

    #[test]
    fn parens_block_flattening() {
        let (arena, expr) = parse_expression("a && (b && c)").expect("parse");
        match arena.get(expr) {
            Some(Node::Binary { operands, .. }) => assert_eq!(operands.len(), 2),
            other => panic!("expected binary &&, got {other:?}"),
        }
    }

    #[test]
    fn mixed_additive_keeps_order() {
        let (arena, expr) = parse_expression("a - b + c").expect("parse");
        match arena.get(expr) {
            Some(Node::Binary { op, operands }) => {
                assert_eq!(*op, BinaryOp::Add);
                assert_eq!(operands.len(), 2);
                assert!(matches!(
                    arena.get(operands[0]),
                    Some(Node::Binary {
                        op: BinaryOp::Sub,
                        ..
                    })
                ));
            }
            other => panic!("expected a - b + c shape, got {other:?}"),
        }
    }

    #[test]
    fn resolves_local_references() {
        let (arena, stmts) = parse_program("int x = 1; use(x);").expect("parse");
        let decl = stmts[0];
        let Some(Node::ExprStmt { expression }) = arena.get(stmts[1]) else {
            panic!("expected expression statement");
        };
        let Some(Node::Call { args, .. }) = arena.get(*expression) else {
            panic!("expected call");
        };
        match arena.get(arena.skip_parens(args[0])) {
            Some(Node::VarRef { decl: Some(d), .. }) => assert_eq!(*d, decl),
            other => panic!("expected resolved reference, got {other:?}"),
        }
    }

    #[test]
    fn unresolved_reference_stays_unbound() {
        let (arena, expr) = parse_expression("mystery").expect("parse");
        assert!(matches!(
            arena.get(expr),
            Some(Node::VarRef { decl: None, .. })
        ));
    }

    #[test]
    fn parses_primitive_cast() {
        let (arena, expr) = parse_expression("(int) x").expect("parse");
        assert!(matches!(arena.get(expr), Some(Node::Cast { .. })));
    }

    #[test]
    fn paren_identifier_is_not_a_cast() {
        let (arena, expr) = parse_expression("(x)").expect("parse");
        assert!(matches!(arena.get(expr), Some(Node::Paren(_))));
    }

    #[test]
    fn parses_instanceof() {
        let (arena, expr) = parse_expression("s instanceof String").expect("parse");
        assert!(matches!(arena.get(expr), Some(Node::InstanceOf { .. })));
    }

    #[test]
    fn parses_labeled_loops_and_switch() {
        let source = r#"
outer: while (true) {
    switch (x) {
        case 1:
        case 2:
            break outer;
        default:
            continue;
    }
}
"#;
        let (arena, stmts) = parse_program(source).expect("parse");
        assert_eq!(stmts.len(), 1);
        assert!(matches!(arena.get(stmts[0]), Some(Node::Labeled { .. })));
    }

    #[test]
    fn grouped_case_labels_share_a_clause() {
        let (arena, stmt) =
            parse_statement("switch (x) { case 1: case 2: f(); }").expect("parse");
        let Some(Node::Switch { cases, exhaustive, .. }) = arena.get(stmt) else {
            panic!("expected switch");
        };
        assert_eq!(cases.len(), 1);
        assert!(!exhaustive);
        let Some(Node::Case { labels, body, .. }) = arena.get(cases[0]) else {
            panic!("expected case clause");
        };
        assert_eq!(labels.len(), 2);
        assert_eq!(body.len(), 1);
    }

    #[test]
    fn parses_for_variants() {
        assert!(parse_statement("for (;;) {}").is_ok());
        assert!(parse_statement("for (int i = 0; i < 10; i++) f(i);").is_ok());
        assert!(parse_statement("for (int x : xs) use(x);").is_ok());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_expression("a +").is_err());
        assert!(parse_statement("if (x) {").is_err());
        assert!(parse_expression("@").is_err());
    }
}

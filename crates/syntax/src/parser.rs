//! Recursive-descent parser: tokens → [`Program`].
//!
//! Every compound expression is operator-first and parenthesized, so no
//! precedence table is needed, only an arity rule (all operators are binary).
//! The first error aborts the parse; there is no partial-program recovery.

use bitlang_common::ast::{
    AssignOp, Block, ConstDecl, Expr, ExprKind, Function, Item, Param, Place, Program, StaticDecl,
    Statement, StmtKind,
};
use bitlang_common::stack::ensure_sufficient_stack;
use bitlang_common::{Position, Type, Width};

use crate::error::ParseError;
use crate::lexer::{Spanned, Token};

/// Where the statement currently being parsed lives.
#[derive(Debug, Clone, Copy, Default)]
struct Context {
    /// Inside a function body (as opposed to top-level statements).
    in_function: bool,
    /// Return type of the enclosing function, if it has one.
    returns: Option<Type>,
    /// Number of enclosing `loop`/`for` bodies.
    loop_depth: usize,
}

pub(crate) struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    ctx: Context,
}

/// Parse a token stream (as produced by [`tokenize`](crate::lexer::tokenize)).
pub(crate) fn parse_tokens(tokens: Vec<Spanned>) -> Result<Program, ParseError> {
    Parser::new(tokens).parse_program()
}

impl Parser {
    fn new(mut tokens: Vec<Spanned>) -> Self {
        if tokens.last().map(|t| &t.token) != Some(&Token::Eof) {
            let at = tokens.last().map(|t| t.at).unwrap_or(Position::new(1, 1));
            tokens.push(Spanned {
                token: Token::Eof,
                at,
            });
        }
        Self {
            tokens,
            pos: 0,
            ctx: Context::default(),
        }
    }

    fn peek(&self) -> &Spanned {
        // `new` guarantees a trailing Eof, and `advance` never moves past it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_nth(&self, n: usize) -> &Token {
        &self.tokens[(self.pos + n).min(self.tokens.len() - 1)].token
    }

    fn advance(&mut self) -> Spanned {
        let tok = self.peek().clone();
        if tok.token != Token::Eof {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, token: &Token) -> bool {
        &self.peek().token == token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        let tok = self.peek();
        ParseError::UnexpectedToken {
            at: tok.at,
            expected,
            found: tok.token.to_string(),
        }
    }

    fn expect(&mut self, token: Token, expected: &'static str) -> Result<Position, ParseError> {
        if self.check(&token) {
            Ok(self.advance().at)
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect_ident(&mut self, expected: &'static str) -> Result<(String, Position), ParseError> {
        match &self.peek().token {
            Token::Ident(name) => {
                let name = name.clone();
                let at = self.advance().at;
                Ok((name, at))
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    fn skip_separators(&mut self) {
        while self.eat(&Token::Semicolon) {}
    }

    // ---- Items ----

    fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut items = Vec::new();

        loop {
            self.skip_separators();
            let item = match self.peek().token {
                Token::Eof => break,
                Token::Fn => Item::Function(self.parse_function()?),
                Token::Static => Item::Static(self.parse_static()?),
                Token::Const => Item::Const(self.parse_const()?),
                _ => Item::Statement(self.parse_statement()?),
            };
            items.push(item);
        }

        Ok(Program::new(items))
    }

    fn parse_function(&mut self) -> Result<Function, ParseError> {
        let at = self.expect(Token::Fn, "'fn'")?;
        let (name, _) = self.expect_ident("function name")?;

        // The parameter list is optional: `fn next_node:u8 { .. }`.
        let mut params = Vec::new();
        if self.eat(&Token::LParen) {
            while !self.eat(&Token::RParen) {
                let (name, _) = self.expect_ident("parameter name or ')'")?;
                self.expect(Token::Colon, "':'")?;
                let ty = self.parse_type()?;
                params.push(Param { name, ty });
                self.eat(&Token::Comma);
            }
        }

        let ret = if self.eat(&Token::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };

        let outer = self.ctx;
        self.ctx = Context {
            in_function: true,
            returns: ret,
            loop_depth: 0,
        };
        let body = self.parse_block();
        self.ctx = outer;

        Ok(Function {
            name,
            params,
            ret,
            body: body?,
            at,
        })
    }

    fn parse_static(&mut self) -> Result<StaticDecl, ParseError> {
        let at = self.expect(Token::Static, "'static'")?;
        let (name, _) = self.expect_ident("static name")?;
        self.expect(Token::Colon, "':'")?;
        let ty = self.parse_type()?;
        Ok(StaticDecl { name, ty, at })
    }

    fn parse_const(&mut self) -> Result<ConstDecl, ParseError> {
        let at = self.expect(Token::Const, "'const'")?;
        let (name, _) = self.expect_ident("const name")?;
        self.expect(Token::Colon, "':'")?;
        let ty = self.parse_type()?;
        self.expect(Token::Assign(AssignOp::Set), "'='")?;
        self.expect(Token::LBracket, "'['")?;

        let mut values = Vec::new();
        while !self.eat(&Token::RBracket) {
            match self.peek().token {
                Token::Number(n) => {
                    self.advance();
                    values.push(n);
                }
                _ => return Err(self.unexpected("integer literal or ']'")),
            }
            self.eat(&Token::Comma);
        }

        Ok(ConstDecl {
            name,
            ty,
            values,
            at,
        })
    }

    // ---- Types ----

    fn parse_width(&mut self) -> Result<Width, ParseError> {
        let tok = self.peek().clone();
        match tok.token {
            Token::Uint(bits) => {
                self.advance();
                Width::new(bits).map_err(|_| ParseError::UnknownType {
                    at: tok.at,
                    name: format!("u{bits}"),
                })
            }
            _ => Err(self.unexpected("integer type")),
        }
    }

    fn parse_type(&mut self) -> Result<Type, ParseError> {
        if !self.eat(&Token::LBracket) {
            return Ok(Type::Uint(self.parse_width()?));
        }

        let element = self.parse_width()?;
        let len = match self.peek().token {
            Token::Number(n) => {
                let at = self.advance().at;
                usize::try_from(n).map_err(|_| ParseError::UnexpectedToken {
                    at,
                    expected: "array length",
                    found: n.to_string(),
                })?
            }
            _ => return Err(self.unexpected("array length")),
        };
        self.expect(Token::RBracket, "']'")?;

        Ok(Type::Array { element, len })
    }

    // ---- Statements ----

    fn parse_block(&mut self) -> Result<Block, ParseError> {
        self.expect(Token::LBrace, "'{'")?;
        let mut stmts = Vec::new();

        loop {
            self.skip_separators();
            if self.eat(&Token::RBrace) {
                break;
            }
            stmts.push(self.parse_statement()?);
        }

        Ok(stmts)
    }

    fn parse_loop_body(&mut self) -> Result<Block, ParseError> {
        self.ctx.loop_depth += 1;
        let body = self.parse_block();
        self.ctx.loop_depth -= 1;
        body
    }

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        ensure_sufficient_stack(|| self.parse_statement_inner())
    }

    fn parse_statement_inner(&mut self) -> Result<Statement, ParseError> {
        let at = self.peek().at;

        let kind = match self.peek().token {
            Token::Let => {
                self.advance();
                let (name, _) = self.expect_ident("variable name")?;
                self.expect(Token::Colon, "':'")?;
                let ty = self.parse_type()?;
                self.expect(Token::Assign(AssignOp::Set), "'='")?;
                let value = self.parse_expr()?;
                StmtKind::Let { name, ty, value }
            }
            Token::Static => {
                if !self.ctx.in_function {
                    return Err(ParseError::MisplacedStatic { at });
                }
                StmtKind::Static(self.parse_static()?)
            }
            Token::If => self.parse_if()?,
            Token::For => {
                self.advance();
                let (var, _) = self.expect_ident("loop variable")?;
                self.expect(Token::Colon, "':'")?;
                let ty = Type::Uint(self.parse_width()?);
                self.expect(Token::In, "'in'")?;
                let start = self.parse_expr()?;
                self.expect(Token::DotDot, "'..'")?;
                let end = self.parse_expr()?;
                let body = self.parse_loop_body()?;
                StmtKind::For {
                    var,
                    ty,
                    start,
                    end,
                    body,
                }
            }
            Token::Loop => {
                self.advance();
                StmtKind::Loop(self.parse_loop_body()?)
            }
            Token::Break | Token::Continue => {
                let tok = self.advance().token;
                let keyword = if tok == Token::Break { "break" } else { "continue" };
                if self.ctx.loop_depth == 0 {
                    return Err(ParseError::OutsideLoop { at, keyword });
                }
                if tok == Token::Break {
                    StmtKind::Break
                } else {
                    StmtKind::Continue
                }
            }
            Token::Return => self.parse_return()?,
            Token::Panic => {
                self.advance();
                StmtKind::Panic
            }
            Token::LParen if matches!(self.peek_nth(1), Token::Assign(_)) => self.parse_assign()?,
            _ => StmtKind::Expr(self.parse_expr()?),
        };

        Ok(Statement::new(kind, at))
    }

    fn parse_if(&mut self) -> Result<StmtKind, ParseError> {
        self.expect(Token::If, "'if'")?;
        let cond = self.parse_expr()?;
        let then = self.parse_block()?;

        let otherwise = if self.eat(&Token::Else) {
            if self.check(&Token::If) {
                // `else if` is an else block holding a single `if`.
                let at = self.peek().at;
                let nested = ensure_sufficient_stack(|| self.parse_if())?;
                Some(vec![Statement::new(nested, at)])
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };

        Ok(StmtKind::If {
            cond,
            then,
            otherwise,
        })
    }

    fn parse_return(&mut self) -> Result<StmtKind, ParseError> {
        let at = self.expect(Token::Return, "'return'")?;

        // A value belongs to `return` only if it starts on the same line.
        let next = self.peek();
        let has_value = next.at.line == at.line
            && !matches!(next.token, Token::RBrace | Token::Semicolon | Token::Eof);

        match (has_value, self.ctx.returns) {
            (true, Some(_)) => Ok(StmtKind::Return(Some(self.parse_expr()?))),
            (false, None) => Ok(StmtKind::Return(None)),
            (true, None) => Err(ParseError::UnexpectedReturnValue { at }),
            (false, Some(ty)) => Err(ParseError::MissingReturnValue {
                at,
                ty: ty.to_string(),
            }),
        }
    }

    fn parse_assign(&mut self) -> Result<StmtKind, ParseError> {
        self.expect(Token::LParen, "'('")?;
        let op = match self.advance().token {
            Token::Assign(op) => op,
            _ => return Err(self.unexpected("assignment operator")),
        };

        let place = if self.eat(&Token::LBracket) {
            let index = self.parse_expr()?;
            self.expect(Token::RBracket, "']'")?;
            let (array, _) = self.expect_ident("array name")?;
            Place::Element {
                index: Box::new(index),
                array,
            }
        } else {
            Place::Var(self.expect_ident("assignment target")?.0)
        };

        let value = self.parse_expr()?;
        self.expect(Token::RParen, "')'")?;

        Ok(StmtKind::Assign { op, place, value })
    }

    // ---- Expressions ----

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        ensure_sufficient_stack(|| self.parse_expr_inner())
    }

    fn parse_expr_inner(&mut self) -> Result<Expr, ParseError> {
        let tok = self.peek().clone();
        let at = tok.at;

        let kind = match tok.token {
            Token::Number(n) => {
                self.advance();
                ExprKind::Literal(n)
            }
            Token::Ident(name) => {
                self.advance();
                ExprKind::Ident(name)
            }
            Token::LBracket => {
                self.advance();
                let index = self.parse_expr()?;
                self.expect(Token::RBracket, "']'")?;
                let (array, _) = self.expect_ident("array name")?;
                ExprKind::Index {
                    index: Box::new(index),
                    array,
                }
            }
            Token::LParen => {
                self.advance();
                let head = self.advance();
                match head.token {
                    Token::Op(op) => {
                        let operands = self.parse_operands()?;
                        let found = operands.len();
                        match <[Expr; 2]>::try_from(operands) {
                            Ok([left, right]) => ExprKind::Binary {
                                op,
                                left: Box::new(left),
                                right: Box::new(right),
                            },
                            Err(_) => {
                                return Err(ParseError::InvalidArity {
                                    at,
                                    op: op.symbol(),
                                    found,
                                })
                            }
                        }
                    }
                    Token::Ident(name) => ExprKind::Call {
                        name,
                        args: self.parse_operands()?,
                    },
                    Token::Assign(op) => {
                        return Err(ParseError::AssignmentInExpression {
                            at,
                            op: op.symbol(),
                        })
                    }
                    other => {
                        return Err(ParseError::UnexpectedToken {
                            at: head.at,
                            expected: "operator or function name",
                            found: other.to_string(),
                        })
                    }
                }
            }
            _ => return Err(self.unexpected("expression")),
        };

        Ok(Expr::new(kind, at))
    }

    /// Parse expressions up to and including the closing `)`.
    fn parse_operands(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut operands = Vec::new();
        while !self.eat(&Token::RParen) {
            operands.push(self.parse_expr()?);
        }
        Ok(operands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use bitlang_common::BinOp;

    fn parse(src: &str) -> Result<Program, ParseError> {
        parse_tokens(tokenize(src).unwrap())
    }

    fn only_statement(src: &str) -> StmtKind {
        let program = parse(src).unwrap();
        let mut stmts = program.statements();
        let stmt = stmts.next().unwrap().clone();
        assert!(stmts.next().is_none());
        stmt.kind
    }

    fn u8t() -> Type {
        Type::Uint(Width::U8)
    }

    #[test]
    fn parse_empty_program() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("// nothing\n;;\n").unwrap().is_empty());
    }

    #[test]
    fn parse_static_declaration() {
        let program = parse("static RESULT:[u8 1]").unwrap();
        let s = program.statics().next().unwrap();
        assert_eq!(s.name, "RESULT");
        assert_eq!(
            s.ty,
            Type::Array {
                element: Width::U8,
                len: 1
            }
        );
        assert_eq!(s.at, Position::new(1, 1));
    }

    #[test]
    fn parse_const_declaration_with_and_without_commas() {
        let program = parse("const A:[u8 3] = [1 2 3]\nconst B:[u8 3] = [1, 2, 3]").unwrap();
        let consts: Vec<_> = program.consts().collect();
        assert_eq!(consts[0].values, vec![1, 2, 3]);
        assert_eq!(consts[1].values, vec![1, 2, 3]);
    }

    #[test]
    fn parse_function_with_params() {
        let program = parse("fn mul(a:u8 b:u8):u8 { return (* a b) }").unwrap();
        let f = program.functions().next().unwrap();
        assert_eq!(f.name, "mul");
        assert_eq!(f.params.len(), 2);
        assert_eq!(f.params[1].name, "b");
        assert_eq!(f.ret, Some(u8t()));
        assert_eq!(f.body.len(), 1);
    }

    #[test]
    fn parse_function_without_parameter_list() {
        let program = parse("fn next_node:u8 {\n return 1\n}").unwrap();
        let f = program.functions().next().unwrap();
        assert!(f.params.is_empty());
        assert_eq!(f.ret, Some(u8t()));
    }

    #[test]
    fn parse_function_without_return_type() {
        let program = parse("fn reset() {\n return\n}").unwrap();
        let f = program.functions().next().unwrap();
        assert_eq!(f.ret, None);
        assert_eq!(f.body[0].kind, StmtKind::Return(None));
    }

    #[test]
    fn parse_prefix_expression() {
        match only_statement("let x:u8 = (+ 1 (* 2 3))") {
            StmtKind::Let { value, .. } => match value.kind {
                ExprKind::Binary { op, right, .. } => {
                    assert_eq!(op, BinOp::Add);
                    assert!(matches!(
                        right.kind,
                        ExprKind::Binary {
                            op: BinOp::Mul,
                            ..
                        }
                    ));
                }
                other => panic!("expected binary, got {other:?}"),
            },
            other => panic!("expected let, got {other:?}"),
        }
    }

    #[test]
    fn parse_index_expression() {
        match only_statement("let x:u8 = [(+ i 1)]TREE") {
            StmtKind::Let { value, .. } => {
                assert!(matches!(value.kind, ExprKind::Index { ref array, .. } if array == "TREE"))
            }
            other => panic!("expected let, got {other:?}"),
        }
    }

    #[test]
    fn parse_call_without_arguments() {
        match only_statement("(next_node)") {
            StmtKind::Expr(e) => assert_eq!(
                e.kind,
                ExprKind::Call {
                    name: "next_node".into(),
                    args: vec![]
                }
            ),
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn parse_assignments() {
        match only_statement("(= [0]RESULT (fib 12))") {
            StmtKind::Assign { op, place, .. } => {
                assert_eq!(op, AssignOp::Set);
                assert_eq!(place.name(), "RESULT");
                assert!(matches!(place, Place::Element { .. }));
            }
            other => panic!("expected assign, got {other:?}"),
        }
        match only_statement("(+= CURSOR 1)") {
            StmtKind::Assign { op, place, .. } => {
                assert_eq!(op, AssignOp::Add);
                assert_eq!(place, Place::Var("CURSOR".into()));
            }
            other => panic!("expected assign, got {other:?}"),
        }
    }

    #[test]
    fn parse_if_else_chain() {
        match only_statement("if a { !! } else if b { !! } else { !! }") {
            StmtKind::If { otherwise, .. } => {
                let otherwise = otherwise.unwrap();
                assert_eq!(otherwise.len(), 1);
                assert!(matches!(
                    otherwise[0].kind,
                    StmtKind::If {
                        otherwise: Some(_),
                        ..
                    }
                ));
            }
            other => panic!("expected if, got {other:?}"),
        }
    }

    #[test]
    fn parse_for_loop() {
        match only_statement("for i:u8 in 0..13 { (+= X i) }") {
            StmtKind::For {
                var, ty, body, ..
            } => {
                assert_eq!(var, "i");
                assert_eq!(ty, u8t());
                assert_eq!(body.len(), 1);
            }
            other => panic!("expected for, got {other:?}"),
        }
    }

    #[test]
    fn parse_loop_with_break_and_continue() {
        match only_statement("loop { if x { break } continue }") {
            StmtKind::Loop(body) => assert_eq!(body.len(), 2),
            other => panic!("expected loop, got {other:?}"),
        }
    }

    #[test]
    fn return_value_must_start_on_same_line() {
        let program = parse("fn f:u8 {\n return\n 1\n}");
        assert!(matches!(
            program,
            Err(ParseError::MissingReturnValue { .. })
        ));
    }

    #[test]
    fn return_value_in_void_function_is_rejected() {
        assert!(matches!(
            parse("fn f { return 1 }"),
            Err(ParseError::UnexpectedReturnValue { .. })
        ));
    }

    #[test]
    fn top_level_return_takes_no_value() {
        assert_eq!(only_statement("return"), StmtKind::Return(None));
        assert!(matches!(
            parse("return 5"),
            Err(ParseError::UnexpectedReturnValue { .. })
        ));
    }

    #[test]
    fn error_break_outside_loop() {
        let err = parse("fn f { break }").unwrap_err();
        assert!(matches!(
            err,
            ParseError::OutsideLoop {
                keyword: "break",
                ..
            }
        ));
    }

    #[test]
    fn error_static_in_nested_top_level_block() {
        assert!(matches!(
            parse("if 1 { static X:u8 }"),
            Err(ParseError::MisplacedStatic { .. })
        ));
        assert!(parse("fn f { if 1 { static X:u8 } }").is_ok());
    }

    #[test]
    fn error_unknown_type() {
        let err = parse("static X:u65").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnknownType {
                at: Position::new(1, 10),
                name: "u65".into()
            }
        );
        assert!(matches!(
            parse("static X:u0"),
            Err(ParseError::UnknownType { .. })
        ));
    }

    #[test]
    fn error_operator_arity() {
        assert!(matches!(
            parse("(+ 1 2 3)"),
            Err(ParseError::InvalidArity {
                op: "+",
                found: 3,
                ..
            })
        ));
        assert!(matches!(
            parse("(== 1)"),
            Err(ParseError::InvalidArity { found: 1, .. })
        ));
    }

    #[test]
    fn error_assignment_in_expression() {
        assert!(matches!(
            parse("let x:u8 = (= y 1)"),
            Err(ParseError::AssignmentInExpression { op: "=", .. })
        ));
    }

    #[test]
    fn error_missing_closing_brace() {
        let err = parse("fn f {\n").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
    }

    #[test]
    fn error_reports_position_of_offending_token() {
        let err = parse("let x:u8 = 1\nlet y u8 = 2").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnexpectedToken {
                at: Position::new(2, 7),
                expected: "':'",
                found: "type 'u8'".into()
            }
        );
    }
}

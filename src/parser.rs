use {
    crate::{
        error::RuntimeError,
        expr::{self, Expr},
        literal::LiteralValue,
        report,
        scanner::{Token, TokenKind},
        stmt::{self, Stmt},
    },
    culpa::{throw, throws},
    std::rc::Rc,
};

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    loop_depth: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FunctionKind {
    Function,
    Method,
    Lambda,
}

impl std::fmt::Display for FunctionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FunctionKind::Function => write!(f, "function"),
            FunctionKind::Method => write!(f, "method"),
            FunctionKind::Lambda => write!(f, "lambda"),
        }
    }
}

/// Generate a parser for a left-associative series of binary operators.
macro_rules! binary_rule {
    ($name:ident, $operand:ident, $($kind:ident)|+) => {
        #[throws(RuntimeError)]
        fn $name(&mut self) -> Expr {
            let mut expr = self.$operand()?;
            while self.match_any(&[$(TokenKind::$kind),+]) {
                let op = self.previous();
                let right = self.$operand()?;
                expr = Expr::Binary(expr::Binary {
                    left: Rc::new(expr),
                    op,
                    right: Rc::new(right),
                });
            }
            expr
        }
    };
}

/// Recursive descent parser for the Lox grammar:
/// ```text
/// program        → declaration* EOF ;
/// declaration    → classDecl
///                | funDecl
///                | varDecl
///                | statement ;
/// classDecl      → "class" IDENTIFIER ( "<" IDENTIFIER )? "{" function* "}" ;
/// funDecl        → "fun" function ;          // only when IDENTIFIER follows
/// function       → IDENTIFIER "(" parameters? ")" block ;
/// parameters     → IDENTIFIER ( "," IDENTIFIER )* ;
/// varDecl        → "var" IDENTIFIER ( "=" expression )? ";" ;
/// statement      → exprStmt
///                | forStmt
///                | ifStmt
///                | printStmt
///                | returnStmt
///                | whileStmt
///                | breakStmt
///                | block ;
/// exprStmt       → expression ";" ;
/// forStmt        → "for" "(" ( varDecl | exprStmt | ";" )
///                  expression? ";"
///                  expression? ")" statement ;
/// ifStmt         → "if" "(" expression ")" statement
///                  ( "else" statement )? ;
/// printStmt      → "print" expression ";" ;
/// returnStmt     → "return" expression? ";" ;
/// whileStmt      → "while" "(" expression ")" statement ;
/// breakStmt      → "break" ";" ;             // valid only inside a loop
/// block          → "{" declaration* "}" ;
/// expression     → comma ;
/// comma          → assignment ( "," assignment )* ;
/// assignment     → ( call "." )? IDENTIFIER "=" assignment
///                | logic_or ;
/// logic_or       → logic_and ( "or" logic_and )* ;
/// logic_and      → conditional ( "and" conditional )* ;
/// conditional    → equality ( "?" expression ":" expression )? ;
/// equality       → comparison ( ( "!=" | "==" ) comparison )* ;
/// comparison     → term ( ( ">" | ">=" | "<" | "<=" ) term )* ;
/// term           → factor ( ( "-" | "+" ) factor )* ;
/// factor         → unary ( ( "/" | "*" ) unary )* ;
/// unary          → ( "!" | "-" ) unary | call | lambda ;
/// call           → primary ( "(" arguments? ")" | "." IDENTIFIER )* ;
/// arguments      → equality ( "," equality )* ;   // not assignment: commas
///                                                 // belong to the list
/// lambda         → "fun" "(" parameters? ")" block ;
/// primary        → NUMBER | STRING | "true" | "false" | "nil" | "this"
///                | "(" expression ")"
///                | IDENTIFIER
///                | "super" "." IDENTIFIER ;
/// ```
/// Grammar productions are in order of increasing precedence from top to
/// bottom.
impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            current: 0,
            loop_depth: 0,
        }
    }

    /// Best-effort statement list; parse errors are reported, the parser
    /// synchronizes and leaves a `Stmt::ParseError` sentinel in place.
    pub fn parse(&mut self) -> Vec<Stmt> {
        let mut statements = vec![];
        while !self.is_at_end() {
            statements.push(self.declaration_with_error_handling());
        }
        statements
    }

    fn declaration_with_error_handling(&mut self) -> Stmt {
        match self.declaration() {
            Ok(decl) => decl,
            Err(e) => {
                let token = match e {
                    RuntimeError::ParseError { token, .. } => token,
                    _ => self.peek(),
                };
                self.synchronize();
                Stmt::ParseError { token }
            }
        }
    }

    #[throws(RuntimeError)]
    fn declaration(&mut self) -> Stmt {
        if self.match_any(&[TokenKind::KwClass]) {
            return self.class_declaration()?;
        }
        // `fun` starts a declaration only when a name follows; an anonymous
        // `fun (` falls through to the expression grammar.
        if self.check(TokenKind::KwFun) && self.check2(TokenKind::Identifier, 1) {
            self.advance();
            return Stmt::FunctionDecl(self.function(FunctionKind::Function)?);
        }
        if self.match_any(&[TokenKind::KwVar]) {
            return self.var_declaration()?;
        }
        self.statement()?
    }

    #[throws(RuntimeError)]
    fn class_declaration(&mut self) -> Stmt {
        let name = self.consume(TokenKind::Identifier, "Expect class name.")?;

        let superclass = if self.match_any(&[TokenKind::Less]) {
            self.consume(TokenKind::Identifier, "Expect superclass name.")?;
            Some(expr::Var {
                name: self.previous(),
            })
        } else {
            None
        };

        self.consume(TokenKind::LeftBrace, "Expect '{' before class body.")?;

        let mut methods = vec![];
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            methods.push(self.function(FunctionKind::Method)?);
        }

        self.consume(TokenKind::RightBrace, "Expect '}' after class body.")?;
        Stmt::Class(stmt::ClassDecl {
            name,
            superclass,
            methods,
        })
    }

    #[throws(RuntimeError)]
    fn function(&mut self, kind: FunctionKind) -> stmt::FunctionDecl {
        let name = self.consume(TokenKind::Identifier, &format!("Expect {kind} name."))?;
        stmt::FunctionDecl {
            name,
            lambda: self.lambda_decl(kind)?,
        }
    }

    /// Shared parameters-and-body parser for functions, methods and lambdas.
    #[throws(RuntimeError)]
    fn lambda_decl(&mut self, kind: FunctionKind) -> expr::Lambda {
        if kind == FunctionKind::Lambda {
            self.consume(TokenKind::LeftParen, "Expect '(' after lambda expression.")?;
        } else {
            self.consume(TokenKind::LeftParen, &format!("Expect '(' after {kind} name."))?;
        }

        let mut params = vec![];
        if !self.check(TokenKind::RightParen) {
            loop {
                if params.len() >= 255 {
                    report::error_token(&self.peek(), "Can't have more than 255 parameters.");
                }
                params.push(self.consume(TokenKind::Identifier, "Expect parameter name.")?);
                if !self.match_any(&[TokenKind::Comma]) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expect ')' after parameters.")?;

        self.consume(TokenKind::LeftBrace, &format!("Expect '{{' before {kind} body."))?;
        // A function body is a clean slate for `break` validation, so the
        // unwind can never cross a call frame.
        let enclosing_loop_depth = std::mem::replace(&mut self.loop_depth, 0);
        let body = self.block();
        self.loop_depth = enclosing_loop_depth;
        expr::Lambda {
            params,
            body: Rc::new(body?),
        }
    }

    #[throws(RuntimeError)]
    fn var_declaration(&mut self) -> Stmt {
        let name = self.consume(TokenKind::Identifier, "Expect variable name.")?;
        let initializer = if self.match_any(&[TokenKind::Equal]) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after variable declaration.")?;
        Stmt::VarDecl(stmt::VarDecl { name, initializer })
    }

    #[throws(RuntimeError)]
    fn statement(&mut self) -> Stmt {
        if self.match_any(&[TokenKind::KwFor]) {
            return self.for_statement()?;
        }
        if self.match_any(&[TokenKind::KwIf]) {
            return self.if_statement()?;
        }
        if self.match_any(&[TokenKind::KwPrint]) {
            return self.print_statement()?;
        }
        if self.match_any(&[TokenKind::KwReturn]) {
            return self.return_statement()?;
        }
        if self.match_any(&[TokenKind::KwWhile]) {
            return self.while_statement()?;
        }
        if self.match_any(&[TokenKind::KwBreak]) {
            return self.break_statement()?;
        }
        if self.match_any(&[TokenKind::LeftBrace]) {
            return Stmt::Block(self.block()?);
        }
        self.expression_statement()?
    }

    #[throws(RuntimeError)]
    fn for_statement(&mut self) -> Stmt {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'for'.")?;

        let initializer = if self.match_any(&[TokenKind::Semicolon]) {
            None
        } else if self.match_any(&[TokenKind::KwVar]) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if !self.check(TokenKind::Semicolon) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after loop condition.")?;

        let increment = if !self.check(TokenKind::RightParen) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenKind::RightParen, "Expect ')' after for clauses.")?;

        self.loop_depth += 1;
        let body = self.statement();
        self.loop_depth -= 1;
        let body = body?;

        // Desugar into a while loop:
        // {
        //   initializer;
        //   while (condition) {
        //     body;
        //     increment;
        //   }
        // }
        let body = if let Some(increment) = increment {
            Stmt::Block(vec![body, Stmt::Expression(increment)])
        } else {
            body
        };

        let condition = condition.unwrap_or(Expr::Literal(expr::Literal {
            value: LiteralValue::Bool(true),
        }));
        let body = Stmt::While(stmt::WhileStmt {
            condition,
            body: Rc::new(body),
        });

        if let Some(initializer) = initializer {
            Stmt::Block(vec![initializer, body])
        } else {
            body
        }
    }

    #[throws(RuntimeError)]
    fn if_statement(&mut self) -> Stmt {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after if condition.")?;
        let then_branch = Rc::new(self.statement()?);
        let else_branch = if self.match_any(&[TokenKind::KwElse]) {
            Some(Rc::new(self.statement()?))
        } else {
            None
        };
        Stmt::If(stmt::IfStmt {
            condition,
            then_branch,
            else_branch,
        })
    }

    #[throws(RuntimeError)]
    fn print_statement(&mut self) -> Stmt {
        let value = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expect ';' after value.")?;
        Stmt::Print(value)
    }

    #[throws(RuntimeError)]
    fn return_statement(&mut self) -> Stmt {
        let keyword = self.previous();
        let value = if !self.check(TokenKind::Semicolon) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after return value.")?;
        Stmt::Return(stmt::Return { keyword, value })
    }

    #[throws(RuntimeError)]
    fn while_statement(&mut self) -> Stmt {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after condition.")?;
        self.loop_depth += 1;
        let body = self.statement();
        self.loop_depth -= 1;
        Stmt::While(stmt::WhileStmt {
            condition,
            body: Rc::new(body?),
        })
    }

    #[throws(RuntimeError)]
    fn break_statement(&mut self) -> Stmt {
        if self.loop_depth == 0 {
            report::error_token(&self.previous(), "Must be inside a loop to use 'break'.");
        }
        self.consume(TokenKind::Semicolon, "Expect ';' after 'break'.")?;
        Stmt::Break
    }

    #[throws(RuntimeError)]
    fn expression_statement(&mut self) -> Stmt {
        let expr = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expect ';' after expression.")?;
        Stmt::Expression(expr)
    }

    // Shared block parser, reused for function bodies.
    #[throws(RuntimeError)]
    fn block(&mut self) -> Vec<Stmt> {
        let mut stmts = vec![];
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            stmts.push(self.declaration_with_error_handling());
        }
        self.consume(TokenKind::RightBrace, "Expect '}' after block.")?;
        stmts
    }

    #[throws(RuntimeError)]
    fn expression(&mut self) -> Expr {
        self.comma()?
    }

    binary_rule!(comma, assignment, Comma);

    #[throws(RuntimeError)]
    fn assignment(&mut self) -> Expr {
        let expr = self.or_expression()?;

        if self.match_any(&[TokenKind::Equal]) {
            let equals = self.previous();
            let value = self.assignment()?;
            return match expr {
                Expr::Variable(expr::Var { name }) => Expr::Assign(expr::Assign {
                    name,
                    value: Rc::new(value),
                }),
                Expr::Get(get) => Expr::Set(expr::Setter {
                    object: get.object,
                    name: get.name,
                    value: Rc::new(value),
                }),
                _ => {
                    report::error_token(&equals, "Invalid assignment target.");
                    value
                }
            };
        }

        expr
    }

    #[throws(RuntimeError)]
    fn or_expression(&mut self) -> Expr {
        let mut expr = self.and_expression()?;

        while self.match_any(&[TokenKind::KwOr]) {
            let op = self.previous();
            let right = self.and_expression()?;
            expr = Expr::Logical(expr::Logical {
                left: Rc::new(expr),
                op,
                right: Rc::new(right),
            });
        }

        expr
    }

    #[throws(RuntimeError)]
    fn and_expression(&mut self) -> Expr {
        let mut expr = self.conditional()?;

        while self.match_any(&[TokenKind::KwAnd]) {
            let op = self.previous();
            let right = self.conditional()?;
            expr = Expr::Logical(expr::Logical {
                left: Rc::new(expr),
                op,
                right: Rc::new(right),
            });
        }

        expr
    }

    #[throws(RuntimeError)]
    fn conditional(&mut self) -> Expr {
        let expr = self.equality()?;

        if self.match_any(&[TokenKind::Question]) {
            let if_true = self.expression()?;
            self.consume(
                TokenKind::Colon,
                "Expect ':' after if true branch of conditional expression.",
            )?;
            let if_false = self.expression()?;
            return Expr::Conditional(expr::Conditional {
                condition: Rc::new(expr),
                if_true: Rc::new(if_true),
                if_false: Rc::new(if_false),
            });
        }

        expr
    }

    binary_rule!(equality, comparison, BangEqual | EqualEqual);
    binary_rule!(comparison, term, Greater | GreaterEqual | Less | LessEqual);
    binary_rule!(term, factor, Minus | Plus);
    binary_rule!(factor, unary, Slash | Star);

    #[throws(RuntimeError)]
    fn unary(&mut self) -> Expr {
        if self.match_any(&[TokenKind::Bang, TokenKind::Minus]) {
            let op = self.previous();
            let right = self.unary()?;
            return Expr::Unary(expr::Unary {
                op,
                right: Rc::new(right),
            });
        }
        if self.match_any(&[TokenKind::KwFun]) {
            return Expr::Lambda(self.lambda_decl(FunctionKind::Lambda)?);
        }
        self.call()?
    }

    #[throws(RuntimeError)]
    fn call(&mut self) -> Expr {
        let mut expr = self.primary()?;

        loop {
            if self.match_any(&[TokenKind::LeftParen]) {
                expr = self.finish_call(expr)?;
            } else if self.match_any(&[TokenKind::Dot]) {
                let name = self.consume(TokenKind::Identifier, "Expect property name after '.'.")?;
                expr = Expr::Get(expr::Getter {
                    object: Rc::new(expr),
                    name,
                });
            } else {
                break;
            }
        }

        expr
    }

    #[throws(RuntimeError)]
    fn finish_call(&mut self, callee: Expr) -> Expr {
        let mut arguments = vec![];
        if !self.check(TokenKind::RightParen) {
            loop {
                if arguments.len() >= 255 {
                    report::error_token(&self.peek(), "Can't have more than 255 arguments.");
                }
                // Arguments parse at `equality`: commas here separate the
                // list, they are not the comma operator.
                arguments.push(self.equality()?);
                if !self.match_any(&[TokenKind::Comma]) {
                    break;
                }
            }
        }
        let paren = self.consume(TokenKind::RightParen, "Expect ')' after arguments.")?;

        Expr::Call(expr::Call {
            callee: Rc::new(callee),
            paren,
            arguments,
        })
    }

    #[throws(RuntimeError)]
    fn primary(&mut self) -> Expr {
        if self.match_any(&[TokenKind::KwFalse]) {
            return Expr::Literal(expr::Literal {
                value: LiteralValue::Bool(false),
            });
        }
        if self.match_any(&[TokenKind::KwTrue]) {
            return Expr::Literal(expr::Literal {
                value: LiteralValue::Bool(true),
            });
        }
        if self.match_any(&[TokenKind::KwNil]) {
            return Expr::Literal(expr::Literal {
                value: LiteralValue::Nil,
            });
        }
        if self.match_any(&[TokenKind::Number]) {
            return Expr::Literal(expr::Literal {
                value: LiteralValue::Num(
                    self.previous()
                        .literal_num()
                        .expect("scanned a numeric literal"),
                ),
            });
        }
        if self.match_any(&[TokenKind::String]) {
            return Expr::Literal(expr::Literal {
                value: LiteralValue::Str(
                    self.previous()
                        .literal_str()
                        .expect("scanned a string literal"),
                ),
            });
        }
        if self.match_any(&[TokenKind::KwSuper]) {
            let keyword = self.previous();
            self.consume(TokenKind::Dot, "Expect '.' after 'super'.")?;
            let method = self.consume(TokenKind::Identifier, "Expect superclass method name.")?;
            return Expr::Super(expr::Super { keyword, method });
        }
        if self.match_any(&[TokenKind::KwThis]) {
            return Expr::This(expr::This {
                keyword: self.previous(),
            });
        }
        if self.match_any(&[TokenKind::Identifier]) {
            return Expr::Variable(expr::Var {
                name: self.previous(),
            });
        }
        if self.match_any(&[TokenKind::LeftParen]) {
            let expr = self.expression()?;
            self.consume(TokenKind::RightParen, "Expect ')' after expression.")?;
            return Expr::Grouping(expr::Grouping {
                expr: Rc::new(expr),
            });
        }
        // A binary operator with no left-hand operand.
        if self.match_any(&[
            TokenKind::BangEqual,
            TokenKind::EqualEqual,
            TokenKind::Greater,
            TokenKind::GreaterEqual,
            TokenKind::Less,
            TokenKind::LessEqual,
            TokenKind::Plus,
            TokenKind::Slash,
            TokenKind::Star,
        ]) {
            throw!(self.error(&self.previous(), "Missing left-hand operand."));
        }

        throw!(self.error(&self.peek(), "Expected expression."));
    }

    fn match_any(&mut self, kinds: &[TokenKind]) -> bool {
        for kind in kinds {
            if self.check(*kind) {
                self.advance();
                return true;
            }
        }
        false
    }

    #[throws(RuntimeError)]
    fn consume(&mut self, kind: TokenKind, message: &str) -> Token {
        if self.check(kind) {
            return self.advance();
        }
        throw!(self.error(&self.peek(), message))
    }

    /// Report the diagnostic and hand back the error for the caller to throw
    /// (or to drop, for the recoverable ones).
    fn error(&self, token: &Token, message: &str) -> RuntimeError {
        report::error_token(token, message);
        RuntimeError::ParseError {
            token: token.clone(),
            message: message.into(),
        }
    }

    /// Synchronize the token stream to the next statement boundary.
    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous().kind == TokenKind::Semicolon {
                return;
            }

            match self.peek().kind {
                TokenKind::KwClass
                | TokenKind::KwFun
                | TokenKind::KwVar
                | TokenKind::KwFor
                | TokenKind::KwIf
                | TokenKind::KwWhile
                | TokenKind::KwPrint
                | TokenKind::KwReturn => return,
                _ => {}
            }

            self.advance();
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        if self.is_at_end() {
            return false;
        }
        self.peek().kind == kind
    }

    /// Like `check`, `extra` tokens further ahead.
    fn check2(&self, kind: TokenKind, extra: usize) -> bool {
        match self.tokens.get(self.current + extra) {
            Some(token) => token.kind == kind,
            None => false,
        }
    }

    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    // Tokens are cheap enough to clone here, which keeps borrows simple.
    fn peek(&self) -> Token {
        self.tokens[self.current].clone()
    }

    fn previous(&self) -> Token {
        self.tokens[self.current - 1].clone()
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{report, scanner::Scanner},
        pretty_assertions::assert_eq,
    };

    fn parse(source: &str) -> Vec<Stmt> {
        report::clear();
        let tokens = Scanner::new(source, 0).scan_tokens();
        Parser::new(tokens).parse()
    }

    fn parse_expression(source: &str) -> Expr {
        let stmts = parse(&format!("{source};"));
        assert!(!report::had_error(), "clean parse expected");
        match stmts.into_iter().next() {
            Some(Stmt::Expression(e)) => e,
            other => panic!("expected an expression statement, got {other:?}"),
        }
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let expr = parse_expression("1 + 2 * 3");
        let expr::Binary { left, op, right } = match expr {
            Expr::Binary(b) => b,
            other => panic!("expected binary, got {other:?}"),
        };
        assert_eq!(op.kind, TokenKind::Plus);
        assert!(matches!(left.as_ref(), Expr::Literal(_)));
        match right.as_ref() {
            Expr::Binary(mult) => assert_eq!(mult.op.kind, TokenKind::Star),
            other => panic!("expected binary, got {other:?}"),
        }
    }

    #[test]
    fn comma_sits_above_assignment() {
        let expr = parse_expression("a = 1, b = 2");
        match expr {
            Expr::Binary(b) => {
                assert_eq!(b.op.kind, TokenKind::Comma);
                assert!(matches!(b.left.as_ref(), Expr::Assign(_)));
                assert!(matches!(b.right.as_ref(), Expr::Assign(_)));
            }
            other => panic!("expected comma binary, got {other:?}"),
        }
    }

    #[test]
    fn conditional_parses_both_branches() {
        let expr = parse_expression("1 < 2 ? \"yes\" : \"no\"");
        match expr {
            Expr::Conditional(c) => {
                assert!(matches!(c.condition.as_ref(), Expr::Binary(_)));
                assert!(matches!(c.if_true.as_ref(), Expr::Literal(_)));
                assert!(matches!(c.if_false.as_ref(), Expr::Literal(_)));
            }
            other => panic!("expected conditional, got {other:?}"),
        }
    }

    #[test]
    fn assignment_is_right_associative() {
        let expr = parse_expression("a = b = 1");
        match expr {
            Expr::Assign(a) => {
                assert_eq!(a.name.lexeme, "a");
                assert!(matches!(a.value.as_ref(), Expr::Assign(_)));
            }
            other => panic!("expected assign, got {other:?}"),
        }
    }

    #[test]
    fn property_assignment_desugars_to_set() {
        let expr = parse_expression("obj.field = 1");
        assert!(matches!(expr, Expr::Set(_)));
    }

    #[test]
    fn invalid_assignment_target_is_reported_but_not_fatal() {
        report::clear();
        let tokens = Scanner::new("1 = 2;", 0).scan_tokens();
        let stmts = Parser::new(tokens).parse();
        assert!(report::had_error());
        // The statement survives as the value expression, not a sentinel.
        assert!(matches!(stmts[0], Stmt::Expression(_)));
    }

    #[test]
    fn for_loop_desugars_to_while() {
        let stmts = parse("for (var i = 0; i < 3; i = i + 1) print i;");
        assert!(!report::had_error());
        // { var i = 0; while (i < 3) { print i; i = i + 1; } }
        let block = match &stmts[0] {
            Stmt::Block(b) => b,
            other => panic!("expected block, got {other:?}"),
        };
        assert!(matches!(block[0], Stmt::VarDecl(_)));
        let body = match &block[1] {
            Stmt::While(w) => w.body.as_ref(),
            other => panic!("expected while, got {other:?}"),
        };
        match body {
            Stmt::Block(inner) => {
                assert!(matches!(inner[0], Stmt::Print(_)));
                assert!(matches!(inner[1], Stmt::Expression(Expr::Assign(_))));
            }
            other => panic!("expected block body, got {other:?}"),
        }
    }

    #[test]
    fn for_loop_without_clauses_gets_a_true_condition() {
        let stmts = parse("for (;;) print 1;");
        match &stmts[0] {
            Stmt::While(w) => assert!(matches!(
                w.condition,
                Expr::Literal(expr::Literal {
                    value: LiteralValue::Bool(true)
                })
            )),
            other => panic!("expected bare while, got {other:?}"),
        }
    }

    #[test]
    fn break_outside_a_loop_is_reported() {
        parse("break;");
        assert!(report::had_error());
    }

    #[test]
    fn break_inside_a_loop_is_fine() {
        parse("while (true) break;");
        assert!(!report::had_error());
    }

    #[test]
    fn break_inside_a_function_inside_a_loop_is_reported() {
        parse("while (true) { fun f() { break; } }");
        assert!(report::had_error());
    }

    #[test]
    fn named_function_declaration() {
        let stmts = parse("fun add(a, b) { return a + b; }");
        match &stmts[0] {
            Stmt::FunctionDecl(f) => {
                assert_eq!(f.name.lexeme, "add");
                assert_eq!(f.lambda.params.len(), 2);
            }
            other => panic!("expected function declaration, got {other:?}"),
        }
    }

    #[test]
    fn anonymous_fun_is_an_expression() {
        let stmts = parse("var f = fun (x) { return x; };");
        match &stmts[0] {
            Stmt::VarDecl(v) => assert!(matches!(v.initializer, Some(Expr::Lambda(_)))),
            other => panic!("expected var declaration, got {other:?}"),
        }
    }

    #[test]
    fn class_with_superclass_and_methods() {
        let stmts = parse("class B < A { init(x) {} greet() {} }");
        match &stmts[0] {
            Stmt::Class(c) => {
                assert_eq!(c.name.lexeme, "B");
                assert_eq!(c.superclass.as_ref().map(|s| s.name.lexeme.as_str()), Some("A"));
                assert_eq!(c.methods.len(), 2);
            }
            other => panic!("expected class declaration, got {other:?}"),
        }
    }

    #[test]
    fn super_and_this_parse_in_expressions() {
        let expr = parse_expression("super.greet");
        assert!(matches!(expr, Expr::Super(_)));
        let expr = parse_expression("this");
        assert!(matches!(expr, Expr::This(_)));
    }

    #[test]
    fn missing_left_hand_operand_is_an_error() {
        parse("* 2;");
        assert!(report::had_error());
    }

    #[test]
    fn parse_error_synchronizes_to_the_next_statement() {
        let stmts = parse("var = 1; print 2;");
        assert!(report::had_error());
        assert_eq!(stmts.len(), 2);
        assert!(matches!(stmts[0], Stmt::ParseError { .. }));
        assert!(matches!(stmts[1], Stmt::Print(_)));
    }

    #[test]
    fn too_many_arguments_is_reported_but_parsing_continues() {
        let args = (0..256).map(|i| i.to_string()).collect::<Vec<_>>().join(", ");
        let stmts = parse(&format!("f({args});"));
        assert!(report::had_error());
        match &stmts[0] {
            Stmt::Expression(Expr::Call(call)) => assert_eq!(call.arguments.len(), 256),
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn arguments_parse_below_the_comma_operator() {
        let expr = parse_expression("f(1, 2)");
        match expr {
            Expr::Call(call) => assert_eq!(call.arguments.len(), 2),
            other => panic!("expected call, got {other:?}"),
        }
    }
}

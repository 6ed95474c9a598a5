use {
    crate::{
        error::RuntimeError,
        expr::{self, Acceptor as _, Expr},
        literal::LiteralValue,
        scanner::TokenKind,
        stmt::{self, Acceptor as _, Stmt},
    },
    culpa::throws,
};

/// Renders an AST back to Lox source text. Parentheses are emitted exactly at
/// `Grouping` nodes, so reparsing the output reproduces the tree (modulo the
/// parser's own desugaring, which has already happened by the time a tree
/// exists).
pub struct AstPrinter;

impl AstPrinter {
    pub fn new() -> Self {
        Self {}
    }

    #[throws(RuntimeError)]
    pub fn print(&mut self, statements: &[Stmt]) -> String {
        let mut rendered = Vec::with_capacity(statements.len());
        for statement in statements {
            rendered.push(self.print_stmt(statement)?);
        }
        rendered.join("\n")
    }

    #[throws(RuntimeError)]
    pub fn print_stmt(&mut self, statement: &Stmt) -> String {
        statement.accept(self)?
    }

    #[throws(RuntimeError)]
    pub fn print_expr(&mut self, expression: &Expr) -> String {
        expression.accept(self)?
    }

    #[throws(RuntimeError)]
    fn block(&mut self, statements: &[Stmt]) -> String {
        let mut rendered = Vec::with_capacity(statements.len());
        for statement in statements {
            rendered.push(self.print_stmt(statement)?);
        }
        if rendered.is_empty() {
            "{ }".to_string()
        } else {
            format!("{{ {} }}", rendered.join(" "))
        }
    }

    #[throws(RuntimeError)]
    fn function(&mut self, decl: &stmt::FunctionDecl, keyword: &str) -> String {
        let params = decl
            .lambda
            .params
            .iter()
            .map(|p| p.lexeme.clone())
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "{keyword}{}({params}) {}",
            decl.name.lexeme,
            self.block(&decl.lambda.body)?
        )
    }
}

impl expr::Visitor for AstPrinter {
    type ReturnType = String;

    #[throws(RuntimeError)]
    fn visit_literal_expr(&mut self, expr: &expr::Literal) -> Self::ReturnType {
        match &expr.value {
            LiteralValue::Str(s) => format!("\"{}\"", s),
            value => value.to_string(),
        }
    }

    #[throws(RuntimeError)]
    fn visit_grouping_expr(&mut self, expr: &expr::Grouping) -> Self::ReturnType {
        format!("({})", self.print_expr(&expr.expr)?)
    }

    #[throws(RuntimeError)]
    fn visit_unary_expr(&mut self, expr: &expr::Unary) -> Self::ReturnType {
        format!("{}{}", expr.op.lexeme, self.print_expr(&expr.right)?)
    }

    #[throws(RuntimeError)]
    fn visit_binary_expr(&mut self, expr: &expr::Binary) -> Self::ReturnType {
        let left = self.print_expr(&expr.left)?;
        let right = self.print_expr(&expr.right)?;
        if expr.op.kind == TokenKind::Comma {
            format!("{left}, {right}")
        } else {
            format!("{left} {} {right}", expr.op.lexeme)
        }
    }

    #[throws(RuntimeError)]
    fn visit_logical_expr(&mut self, expr: &expr::Logical) -> Self::ReturnType {
        format!(
            "{} {} {}",
            self.print_expr(&expr.left)?,
            expr.op.lexeme,
            self.print_expr(&expr.right)?
        )
    }

    #[throws(RuntimeError)]
    fn visit_conditional_expr(&mut self, expr: &expr::Conditional) -> Self::ReturnType {
        format!(
            "{} ? {} : {}",
            self.print_expr(&expr.condition)?,
            self.print_expr(&expr.if_true)?,
            self.print_expr(&expr.if_false)?
        )
    }

    #[throws(RuntimeError)]
    fn visit_var_expr(&mut self, expr: &expr::Var) -> Self::ReturnType {
        expr.name.lexeme.clone()
    }

    #[throws(RuntimeError)]
    fn visit_assign_expr(&mut self, expr: &expr::Assign) -> Self::ReturnType {
        format!("{} = {}", expr.name.lexeme, self.print_expr(&expr.value)?)
    }

    #[throws(RuntimeError)]
    fn visit_call_expr(&mut self, expr: &expr::Call) -> Self::ReturnType {
        let mut arguments = Vec::with_capacity(expr.arguments.len());
        for argument in &expr.arguments {
            arguments.push(self.print_expr(argument)?);
        }
        format!(
            "{}({})",
            self.print_expr(&expr.callee)?,
            arguments.join(", ")
        )
    }

    #[throws(RuntimeError)]
    fn visit_get_expr(&mut self, expr: &expr::Getter) -> Self::ReturnType {
        format!("{}.{}", self.print_expr(&expr.object)?, expr.name.lexeme)
    }

    #[throws(RuntimeError)]
    fn visit_set_expr(&mut self, expr: &expr::Setter) -> Self::ReturnType {
        format!(
            "{}.{} = {}",
            self.print_expr(&expr.object)?,
            expr.name.lexeme,
            self.print_expr(&expr.value)?
        )
    }

    #[throws(RuntimeError)]
    fn visit_this_expr(&mut self, _expr: &expr::This) -> Self::ReturnType {
        "this".to_string()
    }

    #[throws(RuntimeError)]
    fn visit_super_expr(&mut self, expr: &expr::Super) -> Self::ReturnType {
        format!("super.{}", expr.method.lexeme)
    }

    #[throws(RuntimeError)]
    fn visit_lambda_expr(&mut self, expr: &expr::Lambda) -> Self::ReturnType {
        let params = expr
            .params
            .iter()
            .map(|p| p.lexeme.clone())
            .collect::<Vec<_>>()
            .join(", ");
        format!("fun ({params}) {}", self.block(&expr.body)?)
    }
}

impl stmt::Visitor for AstPrinter {
    type ReturnType = String;

    #[throws(RuntimeError)]
    fn visit_expression_stmt(&mut self, stmt: &Expr) -> Self::ReturnType {
        format!("{};", self.print_expr(stmt)?)
    }

    #[throws(RuntimeError)]
    fn visit_print_stmt(&mut self, stmt: &Expr) -> Self::ReturnType {
        format!("print {};", self.print_expr(stmt)?)
    }

    #[throws(RuntimeError)]
    fn visit_vardecl_stmt(&mut self, stmt: &stmt::VarDecl) -> Self::ReturnType {
        match &stmt.initializer {
            Some(initializer) => format!(
                "var {} = {};",
                stmt.name.lexeme,
                self.print_expr(initializer)?
            ),
            None => format!("var {};", stmt.name.lexeme),
        }
    }

    #[throws(RuntimeError)]
    fn visit_block_stmt(&mut self, stmts: &[Stmt]) -> Self::ReturnType {
        self.block(stmts)?
    }

    #[throws(RuntimeError)]
    fn visit_if_stmt(&mut self, stmt: &stmt::IfStmt) -> Self::ReturnType {
        let mut rendered = format!(
            "if ({}) {}",
            self.print_expr(&stmt.condition)?,
            self.print_stmt(&stmt.then_branch)?
        );
        if let Some(else_branch) = &stmt.else_branch {
            rendered.push_str(&format!(" else {}", self.print_stmt(else_branch)?));
        }
        rendered
    }

    #[throws(RuntimeError)]
    fn visit_while_stmt(&mut self, stmt: &stmt::WhileStmt) -> Self::ReturnType {
        format!(
            "while ({}) {}",
            self.print_expr(&stmt.condition)?,
            self.print_stmt(&stmt.body)?
        )
    }

    #[throws(RuntimeError)]
    fn visit_break_stmt(&mut self) -> Self::ReturnType {
        "break;".to_string()
    }

    #[throws(RuntimeError)]
    fn visit_fundecl_stmt(&mut self, stmt: &stmt::FunctionDecl) -> Self::ReturnType {
        self.function(stmt, "fun ")?
    }

    #[throws(RuntimeError)]
    fn visit_return_stmt(&mut self, stmt: &stmt::Return) -> Self::ReturnType {
        match &stmt.value {
            Some(value) => format!("return {};", self.print_expr(value)?),
            None => "return;".to_string(),
        }
    }

    #[throws(RuntimeError)]
    fn visit_class_stmt(&mut self, stmt: &stmt::ClassDecl) -> Self::ReturnType {
        let mut rendered = format!("class {}", stmt.name.lexeme);
        if let Some(superclass) = &stmt.superclass {
            rendered.push_str(&format!(" < {}", superclass.name.lexeme));
        }
        let mut methods = Vec::with_capacity(stmt.methods.len());
        for method in &stmt.methods {
            methods.push(self.function(method, "")?);
        }
        if methods.is_empty() {
            rendered.push_str(" { }");
        } else {
            rendered.push_str(&format!(" {{ {} }}", methods.join(" ")));
        }
        rendered
    }
}

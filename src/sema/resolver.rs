// Only a few kinds of nodes are interesting when it comes to resolving
// variables:
//
// - A block statement introduces a new scope for the statements it contains.
// - A function declaration introduces a new scope for its body and binds its
//   parameters in that scope.
// - A variable declaration adds a new variable to the current scope.
// - Variable and assignment expressions need to have their variables resolved.
//
// Classes additionally introduce the implicit `this` scope around their
// methods, and subclasses an outer `super` scope around that.

use {
    crate::{
        error::RuntimeError,
        expr::{self, Acceptor as _},
        interpreter::Interpreter,
        report,
        scanner::Token,
        stmt::{self, Acceptor as _},
    },
    culpa::throws,
    std::collections::HashMap,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VariableStatus {
    Declared,
    Defined,
    Used,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FunctionKind {
    None,
    Function,
    Method,
    Initializer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClassKind {
    None,
    Class,
    Subclass,
}

type Scope = HashMap<String, VariableStatus>;

/// Static pass between parsing and evaluation: binds every local variable
/// reference to its scope depth in the interpreter's side table and reports
/// scope misuse. All of its diagnostics are recoverable; the driver stops
/// after the pass when any were reported.
pub struct Resolver<'interp> {
    scopes: Vec<Scope>,
    current_function: FunctionKind,
    current_class: ClassKind,
    interpreter: &'interp mut Interpreter,
}

impl<'interp> Resolver<'interp> {
    pub fn new(interpreter: &'interp mut Interpreter) -> Self {
        Self {
            scopes: vec![],
            current_function: FunctionKind::None,
            current_class: ClassKind::None,
            interpreter,
        }
    }

    #[throws(RuntimeError)]
    pub fn resolve(&mut self, statements: &[stmt::Stmt]) {
        self.resolve_stmts(statements)?
    }

    #[throws(RuntimeError)]
    fn resolve_stmts(&mut self, statements: &[stmt::Stmt]) {
        for statement in statements {
            self.resolve_stmt(statement)?;
        }
    }

    #[throws(RuntimeError)]
    fn resolve_stmt(&mut self, statement: &stmt::Stmt) {
        statement.accept(self)?;
    }

    #[throws(RuntimeError)]
    fn resolve_expr(&mut self, expression: &expr::Expr) {
        expression.accept(self)?;
    }

    /// Bind a reference to the innermost scope that declares it. Names found
    /// in no local scope are left for the global environment at runtime.
    fn resolve_local(&mut self, name: &Token) {
        for (hops, scope) in self.scopes.iter_mut().rev().enumerate() {
            if let Some(status) = scope.get_mut(&name.lexeme) {
                *status = VariableStatus::Used;
                self.interpreter.resolve(name, hops);
                return;
            }
        }
    }

    #[throws(RuntimeError)]
    fn resolve_function(&mut self, function: &expr::Lambda, kind: FunctionKind) {
        let enclosing_function = std::mem::replace(&mut self.current_function, kind);

        self.begin_scope();
        for param in &function.params {
            self.declare(param);
            self.define(param);
        }
        let result = self.resolve_stmts(&function.body);
        self.end_scope();

        self.current_function = enclosing_function;
        result?
    }

    fn begin_scope(&mut self) {
        self.scopes.push(Scope::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(&name.lexeme) {
                report::error_token(name, "Already a variable with this name in this scope.");
            }
            scope.insert(name.lexeme.clone(), VariableStatus::Declared);
        }
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), VariableStatus::Defined);
        }
    }

    /// Plant an implicit binding (`this`, `super`) in the current scope.
    fn define_implicit(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), VariableStatus::Defined);
        }
    }
}

impl expr::Visitor for Resolver<'_> {
    type ReturnType = ();

    #[throws(RuntimeError)]
    fn visit_assign_expr(&mut self, expr: &expr::Assign) -> Self::ReturnType {
        self.resolve_expr(&expr.value)?;
        self.resolve_local(&expr.name);
    }

    #[throws(RuntimeError)]
    fn visit_binary_expr(&mut self, expr: &expr::Binary) -> Self::ReturnType {
        self.resolve_expr(&expr.left)?;
        self.resolve_expr(&expr.right)?;
    }

    #[throws(RuntimeError)]
    fn visit_logical_expr(&mut self, expr: &expr::Logical) -> Self::ReturnType {
        self.resolve_expr(&expr.left)?;
        self.resolve_expr(&expr.right)?;
    }

    #[throws(RuntimeError)]
    fn visit_conditional_expr(&mut self, expr: &expr::Conditional) -> Self::ReturnType {
        self.resolve_expr(&expr.condition)?;
        self.resolve_expr(&expr.if_true)?;
        self.resolve_expr(&expr.if_false)?;
    }

    #[throws(RuntimeError)]
    fn visit_unary_expr(&mut self, expr: &expr::Unary) -> Self::ReturnType {
        self.resolve_expr(&expr.right)?;
    }

    #[throws(RuntimeError)]
    fn visit_grouping_expr(&mut self, expr: &expr::Grouping) -> Self::ReturnType {
        self.resolve_expr(&expr.expr)?;
    }

    #[throws(RuntimeError)]
    fn visit_literal_expr(&mut self, _expr: &expr::Literal) -> Self::ReturnType {
        // Nothing to resolve.
    }

    #[throws(RuntimeError)]
    fn visit_var_expr(&mut self, expr: &expr::Var) -> Self::ReturnType {
        if let Some(scope) = self.scopes.last() {
            if scope.get(&expr.name.lexeme) == Some(&VariableStatus::Declared) {
                report::error_token(
                    &expr.name,
                    "Can't read local variable in its own initializer.",
                );
            }
        }
        self.resolve_local(&expr.name);
    }

    #[throws(RuntimeError)]
    fn visit_call_expr(&mut self, expr: &expr::Call) -> Self::ReturnType {
        self.resolve_expr(&expr.callee)?;
        for argument in &expr.arguments {
            self.resolve_expr(argument)?;
        }
    }

    #[throws(RuntimeError)]
    fn visit_get_expr(&mut self, expr: &expr::Getter) -> Self::ReturnType {
        // Properties are looked up dynamically; only the object resolves.
        self.resolve_expr(&expr.object)?;
    }

    #[throws(RuntimeError)]
    fn visit_set_expr(&mut self, expr: &expr::Setter) -> Self::ReturnType {
        self.resolve_expr(&expr.value)?;
        self.resolve_expr(&expr.object)?;
    }

    #[throws(RuntimeError)]
    fn visit_this_expr(&mut self, expr: &expr::This) -> Self::ReturnType {
        if self.current_class == ClassKind::None {
            report::error_token(&expr.keyword, "Can't use 'this' outside of a class.");
            return;
        }
        self.resolve_local(&expr.keyword);
    }

    #[throws(RuntimeError)]
    fn visit_super_expr(&mut self, expr: &expr::Super) -> Self::ReturnType {
        match self.current_class {
            ClassKind::None => {
                report::error_token(&expr.keyword, "Can't use 'super' outside of a class.");
            }
            ClassKind::Class => {
                report::error_token(
                    &expr.keyword,
                    "Can't use 'super' in a class with no superclass.",
                );
            }
            ClassKind::Subclass => self.resolve_local(&expr.keyword),
        }
    }

    #[throws(RuntimeError)]
    fn visit_lambda_expr(&mut self, expr: &expr::Lambda) -> Self::ReturnType {
        self.resolve_function(expr, FunctionKind::Function)?;
    }
}

impl stmt::Visitor for Resolver<'_> {
    type ReturnType = ();

    #[throws(RuntimeError)]
    fn visit_print_stmt(&mut self, stmt: &expr::Expr) -> Self::ReturnType {
        self.resolve_expr(stmt)?;
    }

    #[throws(RuntimeError)]
    fn visit_expression_stmt(&mut self, stmt: &expr::Expr) -> Self::ReturnType {
        self.resolve_expr(stmt)?;
    }

    #[throws(RuntimeError)]
    fn visit_if_stmt(&mut self, stmt: &stmt::IfStmt) -> Self::ReturnType {
        self.resolve_expr(&stmt.condition)?;
        self.resolve_stmt(&stmt.then_branch)?;
        if let Some(else_branch) = &stmt.else_branch {
            self.resolve_stmt(else_branch)?;
        }
    }

    #[throws(RuntimeError)]
    fn visit_while_stmt(&mut self, stmt: &stmt::WhileStmt) -> Self::ReturnType {
        self.resolve_expr(&stmt.condition)?;
        self.resolve_stmt(&stmt.body)?;
    }

    #[throws(RuntimeError)]
    fn visit_break_stmt(&mut self) -> Self::ReturnType {
        // Loop placement was checked by the parser.
    }

    #[throws(RuntimeError)]
    fn visit_vardecl_stmt(&mut self, stmt: &stmt::VarDecl) -> Self::ReturnType {
        self.declare(&stmt.name);
        if let Some(initializer) = &stmt.initializer {
            self.resolve_expr(initializer)?;
        }
        self.define(&stmt.name);
    }

    #[throws(RuntimeError)]
    fn visit_fundecl_stmt(&mut self, stmt: &stmt::FunctionDecl) -> Self::ReturnType {
        // Defined before resolving the body, so the function can recurse.
        self.declare(&stmt.name);
        self.define(&stmt.name);
        self.resolve_function(&stmt.lambda, FunctionKind::Function)?;
    }

    #[throws(RuntimeError)]
    fn visit_block_stmt(&mut self, stmts: &[stmt::Stmt]) -> Self::ReturnType {
        self.begin_scope();
        let result = self.resolve_stmts(stmts);
        self.end_scope();
        result?
    }

    #[throws(RuntimeError)]
    fn visit_return_stmt(&mut self, stmt: &stmt::Return) -> Self::ReturnType {
        if self.current_function == FunctionKind::None {
            report::error_token(&stmt.keyword, "Can't return from top-level code.");
        }
        if let Some(value) = &stmt.value {
            if self.current_function == FunctionKind::Initializer {
                report::error_token(&stmt.keyword, "Can't return a value from an initializer.");
            }
            self.resolve_expr(value)?;
        }
    }

    #[throws(RuntimeError)]
    fn visit_class_stmt(&mut self, stmt: &stmt::ClassDecl) -> Self::ReturnType {
        let enclosing_class = std::mem::replace(&mut self.current_class, ClassKind::Class);

        self.declare(&stmt.name);
        self.define(&stmt.name);

        if let Some(superclass) = &stmt.superclass {
            if superclass.name.lexeme == stmt.name.lexeme {
                report::error_token(&superclass.name, "A class can't inherit from itself.");
            }
            self.current_class = ClassKind::Subclass;
            superclass.accept(self)?;
            self.begin_scope();
            self.define_implicit("super");
        }

        self.begin_scope();
        self.define_implicit("this");
        let mut result = Ok(());
        for method in &stmt.methods {
            let kind = if method.name.lexeme == "init" {
                FunctionKind::Initializer
            } else {
                FunctionKind::Method
            };
            result = self.resolve_function(&method.lambda, kind);
            if result.is_err() {
                break;
            }
        }
        self.end_scope();

        if stmt.superclass.is_some() {
            self.end_scope();
        }
        self.current_class = enclosing_class;
        result?
    }
}

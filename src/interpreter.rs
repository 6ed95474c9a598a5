use {
    crate::{
        callable::{self, Callable, Function, LambdaFunction, NativeFunction},
        class::{Class, Object},
        environment::{Environment, EnvironmentImpl, Environmental},
        error::RuntimeError,
        expr::{self, Acceptor as _, Expr},
        literal::{LiteralValue, LoxCallable},
        output::Output,
        report,
        scanner::{Token, TokenKind},
        stmt::{self, Acceptor as _, Stmt},
    },
    culpa::{throw, throws},
    std::{collections::HashMap, rc::Rc},
};

/// Identity of a variable-reference site: the byte span of its token. Spans
/// stay unique across REPL lines thanks to the scanner's scan offset.
type ReferenceKey = (usize, usize);

fn reference_key(token: &Token) -> ReferenceKey {
    (token.position.span.start, token.position.span.end)
}

pub struct Interpreter {
    pub globals: Environment,
    environment: Environment,
    /// Side table filled by the resolver: reference site → scope depth.
    /// Unresolved names fall through to the globals at runtime.
    pub(crate) locals: HashMap<ReferenceKey, usize>,
    /// In REPL mode a bare expression statement prints its value.
    pub is_repl: bool,
    out: Output,
}

impl Interpreter {
    pub fn new(out: Output) -> Self {
        let globals = EnvironmentImpl::new();
        let clock = NativeFunction {
            name: "clock",
            arity: 0,
            body: callable::clock,
        };
        globals
            .define("clock", clock.into())
            .expect("fresh globals are lockable");
        Self {
            globals: globals.clone(),
            environment: globals,
            locals: HashMap::new(),
            is_repl: false,
            out,
        }
    }

    /// Evaluate the program. Runtime errors halt it, get reported and flip
    /// the runtime-error flag; they never unwind past this point.
    pub fn interpret(&mut self, statements: &[Stmt]) {
        for statement in statements {
            if let Err(e) = self.execute(statement) {
                report::runtime_error(&e);
                return;
            }
        }
    }

    #[throws(RuntimeError)]
    fn execute(&mut self, statement: &Stmt) {
        statement.accept(self)?
    }

    /// Run `statements` inside `environment`, restoring the previous scope on
    /// both normal and unwinding exits.
    #[throws(RuntimeError)]
    pub fn execute_block(&mut self, statements: &[Stmt], environment: Environment) {
        let previous = std::mem::replace(&mut self.environment, environment);
        let result = statements.iter().try_for_each(|s| self.execute(s));
        self.environment = previous;
        result?
    }

    #[throws(RuntimeError)]
    fn evaluate(&mut self, expression: &Expr) -> LiteralValue {
        expression.accept(self)?
    }

    /// Record the scope depth of a reference, called by the resolver.
    pub fn resolve(&mut self, token: &Token, depth: usize) {
        self.locals.insert(reference_key(token), depth);
    }

    #[throws(RuntimeError)]
    fn look_up_variable(&mut self, name: &Token) -> LiteralValue {
        let value = match self.locals.get(&reference_key(name)) {
            Some(distance) => self.environment.get_at(*distance, name)?,
            None => self.globals.get(name)?,
        };
        if matches!(value, LiteralValue::Unassigned) {
            throw!(RuntimeError::UnassignedVariable(name.clone()));
        }
        value
    }

    fn stringify(value: &LiteralValue) -> String {
        value.to_string()
    }
}

impl expr::Visitor for Interpreter {
    type ReturnType = LiteralValue;

    #[throws(RuntimeError)]
    fn visit_literal_expr(&mut self, expr: &expr::Literal) -> Self::ReturnType {
        expr.value.clone()
    }

    #[throws(RuntimeError)]
    fn visit_grouping_expr(&mut self, expr: &expr::Grouping) -> Self::ReturnType {
        self.evaluate(&expr.expr)?
    }

    #[throws(RuntimeError)]
    fn visit_unary_expr(&mut self, expr: &expr::Unary) -> Self::ReturnType {
        let right = self.evaluate(&expr.right)?;
        match expr.op.kind {
            TokenKind::Minus => match right {
                LiteralValue::Num(n) => LiteralValue::Num(-n),
                _ => throw!(RuntimeError::OperandNotNumber(expr.op.clone())),
            },
            TokenKind::Bang => LiteralValue::Bool(!right.is_truthy()),
            _ => unreachable!("unary operator"),
        }
    }

    #[throws(RuntimeError)]
    fn visit_binary_expr(&mut self, expr: &expr::Binary) -> Self::ReturnType {
        let left = self.evaluate(&expr.left)?;
        let right = self.evaluate(&expr.right)?;

        match expr.op.kind {
            TokenKind::Plus => match (&left, &right) {
                (LiteralValue::Num(l), LiteralValue::Num(r)) => LiteralValue::Num(l + r),
                // Permissive concatenation: a string on either side
                // stringifies the other operand.
                (LiteralValue::Str(_), _) | (_, LiteralValue::Str(_)) => LiteralValue::Str(
                    Self::stringify(&left) + &Self::stringify(&right),
                ),
                _ => throw!(RuntimeError::OperandsNotAddable(expr.op.clone())),
            },
            TokenKind::Minus => {
                let (l, r) = check_number_operands(&expr.op, &left, &right)?;
                LiteralValue::Num(l - r)
            }
            TokenKind::Star => {
                let (l, r) = check_number_operands(&expr.op, &left, &right)?;
                LiteralValue::Num(l * r)
            }
            TokenKind::Slash => {
                let (l, r) = check_number_operands(&expr.op, &left, &right)?;
                if r == 0.0 {
                    throw!(RuntimeError::DivisionByZero(expr.op.clone()));
                }
                LiteralValue::Num(l / r)
            }
            TokenKind::Greater => {
                let (l, r) = check_number_operands(&expr.op, &left, &right)?;
                LiteralValue::Bool(l > r)
            }
            TokenKind::GreaterEqual => {
                let (l, r) = check_number_operands(&expr.op, &left, &right)?;
                LiteralValue::Bool(l >= r)
            }
            TokenKind::Less => {
                let (l, r) = check_number_operands(&expr.op, &left, &right)?;
                LiteralValue::Bool(l < r)
            }
            TokenKind::LessEqual => {
                let (l, r) = check_number_operands(&expr.op, &left, &right)?;
                LiteralValue::Bool(l <= r)
            }
            TokenKind::BangEqual => LiteralValue::Bool(left != right),
            TokenKind::EqualEqual => LiteralValue::Bool(left == right),
            // The comma operator discards the left value.
            TokenKind::Comma => right,
            _ => unreachable!("binary operator"),
        }
    }

    #[throws(RuntimeError)]
    fn visit_logical_expr(&mut self, expr: &expr::Logical) -> Self::ReturnType {
        let left = self.evaluate(&expr.left)?;

        if expr.op.kind == TokenKind::KwOr {
            if left.is_truthy() {
                return left;
            }
        } else if !left.is_truthy() {
            return left;
        }

        self.evaluate(&expr.right)?
    }

    #[throws(RuntimeError)]
    fn visit_conditional_expr(&mut self, expr: &expr::Conditional) -> Self::ReturnType {
        if self.evaluate(&expr.condition)?.is_truthy() {
            self.evaluate(&expr.if_true)?
        } else {
            self.evaluate(&expr.if_false)?
        }
    }

    #[throws(RuntimeError)]
    fn visit_var_expr(&mut self, expr: &expr::Var) -> Self::ReturnType {
        self.look_up_variable(&expr.name)?
    }

    #[throws(RuntimeError)]
    fn visit_assign_expr(&mut self, expr: &expr::Assign) -> Self::ReturnType {
        let value = self.evaluate(&expr.value)?;
        match self.locals.get(&reference_key(&expr.name)) {
            Some(distance) => {
                self.environment
                    .assign_at(*distance, &expr.name, value.clone())?
            }
            None => self.globals.assign(&expr.name, value.clone())?,
        }
        value
    }

    #[throws(RuntimeError)]
    fn visit_call_expr(&mut self, expr: &expr::Call) -> Self::ReturnType {
        let callee = self.evaluate(&expr.callee)?;

        let mut arguments = Vec::with_capacity(expr.arguments.len());
        for argument in &expr.arguments {
            arguments.push(self.evaluate(argument)?);
        }

        let callable = match callee {
            LiteralValue::Callable(c) => c,
            _ => throw!(RuntimeError::NotACallable(expr.paren.clone())),
        };

        let arity = match &callable {
            LoxCallable::Function(f) => f.arity(),
            LoxCallable::Lambda(l) => l.arity(),
            LoxCallable::Native(n) => n.arity(),
            LoxCallable::Class(c) => c.arity(),
        };
        if arguments.len() != arity {
            throw!(RuntimeError::InvalidArity {
                paren: expr.paren.clone(),
                expected: arity,
                got: arguments.len(),
            });
        }

        match &callable {
            LoxCallable::Function(f) => f.call(self, &arguments)?,
            LoxCallable::Lambda(l) => l.call(self, &arguments)?,
            LoxCallable::Native(n) => n.call(self, &arguments)?,
            LoxCallable::Class(c) => c.call(self, &arguments)?,
        }
    }

    #[throws(RuntimeError)]
    fn visit_get_expr(&mut self, expr: &expr::Getter) -> Self::ReturnType {
        match self.evaluate(&expr.object)? {
            LiteralValue::Instance(instance) => instance.get(&expr.name)?,
            _ => throw!(RuntimeError::PropertyOnNonInstance(expr.name.clone())),
        }
    }

    #[throws(RuntimeError)]
    fn visit_set_expr(&mut self, expr: &expr::Setter) -> Self::ReturnType {
        let instance = match self.evaluate(&expr.object)? {
            LiteralValue::Instance(instance) => instance,
            _ => throw!(RuntimeError::FieldOnNonInstance(expr.name.clone())),
        };
        let value = self.evaluate(&expr.value)?;
        instance.set(&expr.name, value.clone())?;
        value
    }

    #[throws(RuntimeError)]
    fn visit_this_expr(&mut self, expr: &expr::This) -> Self::ReturnType {
        self.look_up_variable(&expr.keyword)?
    }

    #[throws(RuntimeError)]
    fn visit_super_expr(&mut self, expr: &expr::Super) -> Self::ReturnType {
        let distance = *self
            .locals
            .get(&reference_key(&expr.keyword))
            .ok_or_else(|| RuntimeError::UndefinedVariable(expr.keyword.clone()))?;
        let superclass = match self.environment.get_at_by_name(distance, "super")? {
            LiteralValue::Callable(LoxCallable::Class(c)) => c,
            _ => throw!(RuntimeError::SuperclassNotClass(expr.keyword.clone())),
        };
        // `this` lives in the implicit method scope just inside `super`'s.
        let object = match self.environment.get_at_by_name(distance - 1, "this")? {
            LiteralValue::Instance(instance) => instance,
            _ => throw!(RuntimeError::PropertyOnNonInstance(expr.keyword.clone())),
        };
        let method = superclass.find_method(&expr.method)?;
        method.bind(&object)?.into()
    }

    #[throws(RuntimeError)]
    fn visit_lambda_expr(&mut self, expr: &expr::Lambda) -> Self::ReturnType {
        LambdaFunction {
            declaration: expr.clone(),
            closure: self.environment.clone(),
        }
        .into()
    }
}

impl stmt::Visitor for Interpreter {
    type ReturnType = ();

    #[throws(RuntimeError)]
    fn visit_expression_stmt(&mut self, stmt: &Expr) -> Self::ReturnType {
        let value = self.evaluate(stmt)?;
        if self.is_repl {
            self.out.println(Self::stringify(&value));
        }
    }

    #[throws(RuntimeError)]
    fn visit_print_stmt(&mut self, stmt: &Expr) -> Self::ReturnType {
        let value = self.evaluate(stmt)?;
        self.out.println(Self::stringify(&value));
    }

    #[throws(RuntimeError)]
    fn visit_vardecl_stmt(&mut self, stmt: &stmt::VarDecl) -> Self::ReturnType {
        let value = match &stmt.initializer {
            Some(initializer) => self.evaluate(initializer)?,
            None => LiteralValue::Unassigned,
        };
        self.environment.define(&stmt.name.lexeme, value)?;
    }

    #[throws(RuntimeError)]
    fn visit_block_stmt(&mut self, stmts: &[Stmt]) -> Self::ReturnType {
        self.execute_block(stmts, EnvironmentImpl::nested(self.environment.clone()))?;
    }

    #[throws(RuntimeError)]
    fn visit_if_stmt(&mut self, stmt: &stmt::IfStmt) -> Self::ReturnType {
        if self.evaluate(&stmt.condition)?.is_truthy() {
            self.execute(&stmt.then_branch)?;
        } else if let Some(else_branch) = &stmt.else_branch {
            self.execute(else_branch)?;
        }
    }

    #[throws(RuntimeError)]
    fn visit_while_stmt(&mut self, stmt: &stmt::WhileStmt) -> Self::ReturnType {
        while self.evaluate(&stmt.condition)?.is_truthy() {
            match self.execute(&stmt.body) {
                Err(RuntimeError::LoopBreak) => break,
                other => other?,
            }
        }
    }

    #[throws(RuntimeError)]
    fn visit_break_stmt(&mut self) -> Self::ReturnType {
        throw!(RuntimeError::LoopBreak)
    }

    #[throws(RuntimeError)]
    fn visit_fundecl_stmt(&mut self, stmt: &stmt::FunctionDecl) -> Self::ReturnType {
        let function = Function {
            name: stmt.name.clone(),
            declaration: stmt.lambda.clone(),
            closure: self.environment.clone(),
            is_initializer: false,
        };
        self.environment.define(&stmt.name.lexeme, function.into())?;
    }

    #[throws(RuntimeError)]
    fn visit_return_stmt(&mut self, stmt: &stmt::Return) -> Self::ReturnType {
        let value = match &stmt.value {
            Some(value) => self.evaluate(value)?,
            None => LiteralValue::Nil,
        };
        throw!(RuntimeError::ReturnValue(value))
    }

    #[throws(RuntimeError)]
    fn visit_class_stmt(&mut self, stmt: &stmt::ClassDecl) -> Self::ReturnType {
        let superclass = match &stmt.superclass {
            Some(var) => match self.look_up_variable(&var.name)? {
                LiteralValue::Callable(LoxCallable::Class(c)) => Some(c),
                _ => throw!(RuntimeError::SuperclassNotClass(var.name.clone())),
            },
            None => None,
        };

        // Two-phase binding lets methods close over the class's own name.
        self.environment.define(&stmt.name.lexeme, LiteralValue::Nil)?;

        let method_closure = match &superclass {
            Some(sc) => {
                let wrapper = EnvironmentImpl::nested(self.environment.clone());
                wrapper.define("super", sc.clone().into())?;
                wrapper
            }
            None => self.environment.clone(),
        };

        let methods = stmt
            .methods
            .iter()
            .map(|method| {
                (
                    method.name.lexeme.clone(),
                    Function {
                        name: method.name.clone(),
                        declaration: method.lambda.clone(),
                        closure: method_closure.clone(),
                        is_initializer: method.name.lexeme == "init",
                    },
                )
            })
            .collect();

        let class = Rc::new(Class::new(stmt.name.lexeme.clone(), superclass, methods));
        self.environment.assign(&stmt.name, class.into())?;
    }
}

#[throws(RuntimeError)]
fn check_number_operands(
    op: &Token,
    left: &LiteralValue,
    right: &LiteralValue,
) -> (f64, f64) {
    match (left, right) {
        (LiteralValue::Num(l), LiteralValue::Num(r)) => (*l, *r),
        _ => throw!(RuntimeError::OperandsNotNumbers(op.clone())),
    }
}

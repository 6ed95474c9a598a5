use {
    crate::{error::RuntimeError, literal::LiteralValue, scanner::Token, stmt::Stmt},
    culpa::throws,
    std::rc::Rc,
};

/// Expression AST node.
#[derive(Debug, Clone)]
pub enum Expr {
    Assign(Assign),
    Binary(Binary),
    Logical(Logical),
    Conditional(Conditional),
    Unary(Unary),
    Grouping(Grouping),
    Literal(Literal),
    Variable(Var),
    Call(Call),
    Get(Getter),
    Set(Setter),
    This(This),
    Super(Super),
    Lambda(Lambda),
}

#[derive(Debug, Clone)]
pub struct Unary {
    pub op: Token,
    pub right: Rc<Expr>,
}

/// Also covers the comma operator: `op` is then a `Comma` token.
#[derive(Debug, Clone)]
pub struct Binary {
    pub left: Rc<Expr>,
    pub op: Token,
    pub right: Rc<Expr>,
}

#[derive(Debug, Clone)]
pub struct Logical {
    pub left: Rc<Expr>,
    pub op: Token,
    pub right: Rc<Expr>,
}

/// Ternary `condition ? if_true : if_false`.
#[derive(Debug, Clone)]
pub struct Conditional {
    pub condition: Rc<Expr>,
    pub if_true: Rc<Expr>,
    pub if_false: Rc<Expr>,
}

#[derive(Debug, Clone)]
pub struct Grouping {
    pub expr: Rc<Expr>,
}

#[derive(Debug, Clone)]
pub struct Literal {
    pub value: LiteralValue,
}

#[derive(Debug, Clone)]
pub struct Var {
    pub name: Token,
}

#[derive(Debug, Clone)]
pub struct Assign {
    pub name: Token,
    pub value: Rc<Expr>,
}

#[derive(Debug, Clone)]
pub struct Call {
    pub callee: Rc<Expr>,
    pub paren: Token,
    pub arguments: Vec<Expr>,
}

#[derive(Debug, Clone)]
pub struct Getter {
    pub object: Rc<Expr>,
    pub name: Token,
}

#[derive(Debug, Clone)]
pub struct Setter {
    pub object: Rc<Expr>,
    pub name: Token,
    pub value: Rc<Expr>,
}

#[derive(Debug, Clone)]
pub struct This {
    pub keyword: Token,
}

#[derive(Debug, Clone)]
pub struct Super {
    pub keyword: Token,
    pub method: Token,
}

/// Anonymous function expression; named functions and methods reuse it as
/// their declaration (see `stmt::FunctionDecl`).
#[derive(Debug, Clone)]
pub struct Lambda {
    pub params: Vec<Token>,
    pub body: Rc<Vec<Stmt>>,
}

/// Expressions visitor.
pub trait Visitor {
    type ReturnType;

    #[throws(RuntimeError)]
    fn visit_assign_expr(&mut self, expr: &Assign) -> Self::ReturnType;
    #[throws(RuntimeError)]
    fn visit_binary_expr(&mut self, expr: &Binary) -> Self::ReturnType;
    #[throws(RuntimeError)]
    fn visit_logical_expr(&mut self, expr: &Logical) -> Self::ReturnType;
    #[throws(RuntimeError)]
    fn visit_conditional_expr(&mut self, expr: &Conditional) -> Self::ReturnType;
    #[throws(RuntimeError)]
    fn visit_unary_expr(&mut self, expr: &Unary) -> Self::ReturnType;
    #[throws(RuntimeError)]
    fn visit_grouping_expr(&mut self, expr: &Grouping) -> Self::ReturnType;
    #[throws(RuntimeError)]
    fn visit_literal_expr(&mut self, expr: &Literal) -> Self::ReturnType;
    #[throws(RuntimeError)]
    fn visit_var_expr(&mut self, expr: &Var) -> Self::ReturnType;
    #[throws(RuntimeError)]
    fn visit_call_expr(&mut self, expr: &Call) -> Self::ReturnType;
    #[throws(RuntimeError)]
    fn visit_get_expr(&mut self, expr: &Getter) -> Self::ReturnType;
    #[throws(RuntimeError)]
    fn visit_set_expr(&mut self, expr: &Setter) -> Self::ReturnType;
    #[throws(RuntimeError)]
    fn visit_this_expr(&mut self, expr: &This) -> Self::ReturnType;
    #[throws(RuntimeError)]
    fn visit_super_expr(&mut self, expr: &Super) -> Self::ReturnType;
    #[throws(RuntimeError)]
    fn visit_lambda_expr(&mut self, expr: &Lambda) -> Self::ReturnType;
}

/// Expression visitor acceptor.
pub trait Acceptor {
    #[throws(RuntimeError)]
    fn accept<V: Visitor>(&self, visitor: &mut V) -> V::ReturnType;
}

impl Acceptor for Expr {
    #[throws(RuntimeError)]
    fn accept<V: Visitor>(&self, visitor: &mut V) -> V::ReturnType {
        match self {
            Expr::Assign(e) => e.accept(visitor)?,
            Expr::Binary(e) => e.accept(visitor)?,
            Expr::Logical(e) => e.accept(visitor)?,
            Expr::Conditional(e) => e.accept(visitor)?,
            Expr::Unary(e) => e.accept(visitor)?,
            Expr::Grouping(e) => e.accept(visitor)?,
            Expr::Literal(e) => e.accept(visitor)?,
            Expr::Variable(e) => e.accept(visitor)?,
            Expr::Call(e) => e.accept(visitor)?,
            Expr::Get(e) => e.accept(visitor)?,
            Expr::Set(e) => e.accept(visitor)?,
            Expr::This(e) => e.accept(visitor)?,
            Expr::Super(e) => e.accept(visitor)?,
            Expr::Lambda(e) => e.accept(visitor)?,
        }
    }
}

impl Acceptor for Assign {
    #[throws(RuntimeError)]
    fn accept<V: Visitor>(&self, visitor: &mut V) -> V::ReturnType {
        visitor.visit_assign_expr(self)?
    }
}

impl Acceptor for Binary {
    #[throws(RuntimeError)]
    fn accept<V: Visitor>(&self, visitor: &mut V) -> V::ReturnType {
        visitor.visit_binary_expr(self)?
    }
}

impl Acceptor for Logical {
    #[throws(RuntimeError)]
    fn accept<V: Visitor>(&self, visitor: &mut V) -> V::ReturnType {
        visitor.visit_logical_expr(self)?
    }
}

impl Acceptor for Conditional {
    #[throws(RuntimeError)]
    fn accept<V: Visitor>(&self, visitor: &mut V) -> V::ReturnType {
        visitor.visit_conditional_expr(self)?
    }
}

impl Acceptor for Unary {
    #[throws(RuntimeError)]
    fn accept<V: Visitor>(&self, visitor: &mut V) -> V::ReturnType {
        visitor.visit_unary_expr(self)?
    }
}

impl Acceptor for Grouping {
    #[throws(RuntimeError)]
    fn accept<V: Visitor>(&self, visitor: &mut V) -> V::ReturnType {
        visitor.visit_grouping_expr(self)?
    }
}

impl Acceptor for Literal {
    #[throws(RuntimeError)]
    fn accept<V: Visitor>(&self, visitor: &mut V) -> V::ReturnType {
        visitor.visit_literal_expr(self)?
    }
}

impl Acceptor for Var {
    #[throws(RuntimeError)]
    fn accept<V: Visitor>(&self, visitor: &mut V) -> V::ReturnType {
        visitor.visit_var_expr(self)?
    }
}

impl Acceptor for Call {
    #[throws(RuntimeError)]
    fn accept<V: Visitor>(&self, visitor: &mut V) -> V::ReturnType {
        visitor.visit_call_expr(self)?
    }
}

impl Acceptor for Getter {
    #[throws(RuntimeError)]
    fn accept<V: Visitor>(&self, visitor: &mut V) -> V::ReturnType {
        visitor.visit_get_expr(self)?
    }
}

impl Acceptor for Setter {
    #[throws(RuntimeError)]
    fn accept<V: Visitor>(&self, visitor: &mut V) -> V::ReturnType {
        visitor.visit_set_expr(self)?
    }
}

impl Acceptor for This {
    #[throws(RuntimeError)]
    fn accept<V: Visitor>(&self, visitor: &mut V) -> V::ReturnType {
        visitor.visit_this_expr(self)?
    }
}

impl Acceptor for Super {
    #[throws(RuntimeError)]
    fn accept<V: Visitor>(&self, visitor: &mut V) -> V::ReturnType {
        visitor.visit_super_expr(self)?
    }
}

impl Acceptor for Lambda {
    #[throws(RuntimeError)]
    fn accept<V: Visitor>(&self, visitor: &mut V) -> V::ReturnType {
        visitor.visit_lambda_expr(self)?
    }
}

use {
    crate::{
        error::RuntimeError,
        expr::{self, Expr},
        scanner::Token,
    },
    culpa::throws,
    std::rc::Rc,
};

/// Statement AST node.
#[derive(Debug, Clone)]
pub enum Stmt {
    /// Sentinel produced by panic-mode synchronization. It keeps the shape of
    /// the program intact but is unreachable behind the `had_error` gate.
    ParseError { token: Token },
    Print(Expr),
    Return(Return),
    Expression(Expr),
    VarDecl(VarDecl),
    If(IfStmt),
    While(WhileStmt),
    Break,
    Block(Vec<Stmt>),
    FunctionDecl(FunctionDecl),
    Class(ClassDecl),
}

#[derive(Debug, Clone)]
pub struct Return {
    pub keyword: Token,
    pub value: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct VarDecl {
    pub name: Token,
    /// `None` leaves the variable declared but unassigned.
    pub initializer: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_branch: Rc<Stmt>,
    pub else_branch: Option<Rc<Stmt>>,
}

#[derive(Debug, Clone)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Rc<Stmt>,
}

#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: Token,
    pub lambda: expr::Lambda,
}

#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub name: Token,
    pub superclass: Option<expr::Var>,
    pub methods: Vec<FunctionDecl>,
}

/// Statements visitor.
pub trait Visitor {
    type ReturnType: Default;

    #[throws(RuntimeError)]
    fn visit_print_stmt(&mut self, stmt: &Expr) -> Self::ReturnType;
    #[throws(RuntimeError)]
    fn visit_expression_stmt(&mut self, stmt: &Expr) -> Self::ReturnType;
    #[throws(RuntimeError)]
    fn visit_if_stmt(&mut self, stmt: &IfStmt) -> Self::ReturnType;
    #[throws(RuntimeError)]
    fn visit_while_stmt(&mut self, stmt: &WhileStmt) -> Self::ReturnType;
    #[throws(RuntimeError)]
    fn visit_break_stmt(&mut self) -> Self::ReturnType;
    #[throws(RuntimeError)]
    fn visit_vardecl_stmt(&mut self, stmt: &VarDecl) -> Self::ReturnType;
    #[throws(RuntimeError)]
    fn visit_fundecl_stmt(&mut self, stmt: &FunctionDecl) -> Self::ReturnType;
    #[throws(RuntimeError)]
    fn visit_block_stmt(&mut self, stmts: &[Stmt]) -> Self::ReturnType;
    #[throws(RuntimeError)]
    fn visit_return_stmt(&mut self, stmt: &Return) -> Self::ReturnType;
    #[throws(RuntimeError)]
    fn visit_class_stmt(&mut self, stmt: &ClassDecl) -> Self::ReturnType;
}

/// Statement visitor acceptor.
pub trait Acceptor {
    #[throws(RuntimeError)]
    fn accept<V: Visitor>(&self, visitor: &mut V) -> V::ReturnType;
}

impl Acceptor for Stmt {
    #[throws(RuntimeError)]
    fn accept<V: Visitor>(&self, visitor: &mut V) -> V::ReturnType {
        match self {
            Stmt::Print(e) => visitor.visit_print_stmt(e)?,
            Stmt::Expression(e) => visitor.visit_expression_stmt(e)?,
            Stmt::If(i) => i.accept(visitor)?,
            Stmt::While(w) => w.accept(visitor)?,
            Stmt::Break => visitor.visit_break_stmt()?,
            Stmt::VarDecl(d) => d.accept(visitor)?,
            Stmt::Block(b) => visitor.visit_block_stmt(b)?,
            Stmt::FunctionDecl(f) => f.accept(visitor)?,
            Stmt::Return(r) => r.accept(visitor)?,
            Stmt::Class(c) => c.accept(visitor)?,
            Stmt::ParseError { .. } => V::ReturnType::default(),
        }
    }
}

impl Acceptor for Return {
    #[throws(RuntimeError)]
    fn accept<V: Visitor>(&self, visitor: &mut V) -> V::ReturnType {
        visitor.visit_return_stmt(self)?
    }
}

impl Acceptor for VarDecl {
    #[throws(RuntimeError)]
    fn accept<V: Visitor>(&self, visitor: &mut V) -> V::ReturnType {
        visitor.visit_vardecl_stmt(self)?
    }
}

impl Acceptor for IfStmt {
    #[throws(RuntimeError)]
    fn accept<V: Visitor>(&self, visitor: &mut V) -> V::ReturnType {
        visitor.visit_if_stmt(self)?
    }
}

impl Acceptor for WhileStmt {
    #[throws(RuntimeError)]
    fn accept<V: Visitor>(&self, visitor: &mut V) -> V::ReturnType {
        visitor.visit_while_stmt(self)?
    }
}

impl Acceptor for FunctionDecl {
    #[throws(RuntimeError)]
    fn accept<V: Visitor>(&self, visitor: &mut V) -> V::ReturnType {
        visitor.visit_fundecl_stmt(self)?
    }
}

impl Acceptor for ClassDecl {
    #[throws(RuntimeError)]
    fn accept<V: Visitor>(&self, visitor: &mut V) -> V::ReturnType {
        visitor.visit_class_stmt(self)?
    }
}

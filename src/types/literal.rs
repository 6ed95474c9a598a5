use {
    crate::{
        callable::{Function, LambdaFunction, NativeFunction},
        class::{Class, LoxInstance},
    },
    std::rc::Rc,
};

/// Runtime value.
#[derive(Debug, Clone, Default)]
pub enum LiteralValue {
    Str(String),
    Num(f64),
    #[default]
    Nil,
    Bool(bool),
    /// Declared but not initialized; reading it is a runtime error, which
    /// keeps `var a;` distinguishable from `var a = nil;`.
    Unassigned,
    Callable(LoxCallable),
    Instance(LoxInstance),
}

/// Function-like values. Callables compare by identity, so each carries an
/// `Rc` to its implementation.
#[derive(Debug, Clone)]
pub enum LoxCallable {
    Function(Rc<Function>),
    Lambda(Rc<LambdaFunction>),
    Native(Rc<NativeFunction>),
    Class(Rc<Class>),
}

impl std::fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LiteralValue::Str(s) => write!(f, "{}", s),
            // f64's Display already renders integer-valued floats without a
            // trailing ".0" and never uses exponent notation.
            LiteralValue::Num(n) => write!(f, "{}", n),
            LiteralValue::Nil | LiteralValue::Unassigned => write!(f, "nil"),
            LiteralValue::Bool(b) => write!(f, "{}", b),
            LiteralValue::Callable(c) => write!(f, "{}", c),
            LiteralValue::Instance(i) => {
                write!(f, "<{} instance>", i.read().unwrap().class.name)
            }
        }
    }
}

impl std::fmt::Display for LoxCallable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoxCallable::Function(fun) => write!(f, "<fn {}>", fun.name.lexeme),
            LoxCallable::Lambda(_) => write!(f, "<anonymous fn>"),
            LoxCallable::Native(_) => write!(f, "<native fn>"),
            LoxCallable::Class(c) => write!(f, "{}", c.name),
        }
    }
}

impl LiteralValue {
    /// nil and false are falsey, everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            LiteralValue::Nil => false,
            LiteralValue::Bool(b) => *b,
            _ => true,
        }
    }
}

impl PartialEq for LiteralValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (LiteralValue::Str(a), LiteralValue::Str(b)) => a == b,
            (LiteralValue::Num(a), LiteralValue::Num(b)) => a == b,
            (LiteralValue::Nil, LiteralValue::Nil) => true,
            (LiteralValue::Unassigned, LiteralValue::Unassigned) => true,
            (LiteralValue::Bool(a), LiteralValue::Bool(b)) => a == b,
            (LiteralValue::Callable(a), LiteralValue::Callable(b)) => a == b,
            (LiteralValue::Instance(a), LiteralValue::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl PartialEq for LoxCallable {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (LoxCallable::Function(a), LoxCallable::Function(b)) => Rc::ptr_eq(a, b),
            (LoxCallable::Lambda(a), LoxCallable::Lambda(b)) => Rc::ptr_eq(a, b),
            (LoxCallable::Native(a), LoxCallable::Native(b)) => Rc::ptr_eq(a, b),
            (LoxCallable::Class(a), LoxCallable::Class(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<Function> for LiteralValue {
    fn from(f: Function) -> Self {
        LiteralValue::Callable(LoxCallable::Function(Rc::new(f)))
    }
}

impl From<LambdaFunction> for LiteralValue {
    fn from(f: LambdaFunction) -> Self {
        LiteralValue::Callable(LoxCallable::Lambda(Rc::new(f)))
    }
}

impl From<NativeFunction> for LiteralValue {
    fn from(f: NativeFunction) -> Self {
        LiteralValue::Callable(LoxCallable::Native(Rc::new(f)))
    }
}

impl From<Rc<Class>> for LiteralValue {
    fn from(c: Rc<Class>) -> Self {
        LiteralValue::Callable(LoxCallable::Class(c))
    }
}

#[cfg(test)]
mod tests {
    use {super::*, pretty_assertions::assert_eq};

    #[test]
    fn truthiness() {
        assert!(!LiteralValue::Nil.is_truthy());
        assert!(!LiteralValue::Bool(false).is_truthy());
        assert!(LiteralValue::Bool(true).is_truthy());
        assert!(LiteralValue::Num(0.0).is_truthy());
        assert!(LiteralValue::Str(String::new()).is_truthy());
    }

    #[test]
    fn stringify() {
        assert_eq!(LiteralValue::Nil.to_string(), "nil");
        assert_eq!(LiteralValue::Bool(true).to_string(), "true");
        assert_eq!(LiteralValue::Bool(false).to_string(), "false");
        assert_eq!(LiteralValue::Num(7.0).to_string(), "7");
        assert_eq!(LiteralValue::Num(2.5).to_string(), "2.5");
        assert_eq!(LiteralValue::Num(-0.5).to_string(), "-0.5");
        assert_eq!(LiteralValue::Str("hi".into()).to_string(), "hi");
    }

    #[test]
    fn value_equality() {
        assert_eq!(LiteralValue::Nil, LiteralValue::Nil);
        assert_eq!(LiteralValue::Num(1.0), LiteralValue::Num(1.0));
        assert_ne!(LiteralValue::Num(1.0), LiteralValue::Str("1".into()));
        assert_ne!(LiteralValue::Nil, LiteralValue::Bool(false));
        assert_eq!(LiteralValue::Unassigned, LiteralValue::Unassigned);
    }
}

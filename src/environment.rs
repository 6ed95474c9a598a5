use {
    crate::{error::RuntimeError, literal::LiteralValue, scanner::Token},
    anyhow::anyhow,
    culpa::{throw, throws},
    std::{
        collections::HashMap,
        rc::Rc,
        sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    },
};

/// One lexical scope at runtime. Scopes are shared: several closures may keep
/// the same parent frame alive, so the chain hangs off reference-counted
/// links from child to parent.
pub type Environment = Rc<RwLock<EnvironmentImpl>>;

#[derive(Debug, Default)]
pub struct EnvironmentImpl {
    values: HashMap<String, LiteralValue>,
    enclosing: Option<Environment>,
}

impl EnvironmentImpl {
    /// The root (globals) environment.
    pub fn new() -> Environment {
        Rc::new(RwLock::new(Self::default()))
    }

    /// A child scope enclosed by `enclosing`.
    pub fn nested(enclosing: Environment) -> Environment {
        Rc::new(RwLock::new(Self {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }))
    }
}

fn read_lock(env: &Environment) -> Result<RwLockReadGuard<'_, EnvironmentImpl>, RuntimeError> {
    env.read()
        .map_err(|_| RuntimeError::EnvironmentError(anyhow!("environment read lock poisoned")))
}

fn write_lock(env: &Environment) -> Result<RwLockWriteGuard<'_, EnvironmentImpl>, RuntimeError> {
    env.write()
        .map_err(|_| RuntimeError::EnvironmentError(anyhow!("environment write lock poisoned")))
}

/// Scope operations on the shared environment handle.
pub trait Environmental {
    fn define(&self, name: &str, value: LiteralValue) -> Result<(), RuntimeError>;
    fn get(&self, name: &Token) -> Result<LiteralValue, RuntimeError>;
    fn assign(&self, name: &Token, value: LiteralValue) -> Result<(), RuntimeError>;
    fn get_at(&self, distance: usize, name: &Token) -> Result<LiteralValue, RuntimeError>;
    fn get_at_by_name(&self, distance: usize, name: &str) -> Result<LiteralValue, RuntimeError>;
    fn assign_at(
        &self,
        distance: usize,
        name: &Token,
        value: LiteralValue,
    ) -> Result<(), RuntimeError>;
    fn ancestor(&self, distance: usize) -> Result<Environment, RuntimeError>;
}

impl Environmental for Environment {
    #[throws(RuntimeError)]
    fn define(&self, name: &str, value: LiteralValue) {
        write_lock(self)?.values.insert(name.to_string(), value);
    }

    /// Walk the chain outwards until the name is found.
    #[throws(RuntimeError)]
    fn get(&self, name: &Token) -> LiteralValue {
        let mut env = self.clone();
        loop {
            let next = {
                let guard = read_lock(&env)?;
                if let Some(value) = guard.values.get(&name.lexeme) {
                    return value.clone();
                }
                guard.enclosing.clone()
            };
            match next {
                Some(parent) => env = parent,
                None => throw!(RuntimeError::UndefinedVariable(name.clone())),
            }
        }
    }

    #[throws(RuntimeError)]
    fn assign(&self, name: &Token, value: LiteralValue) {
        let mut env = self.clone();
        loop {
            let next = {
                let mut guard = write_lock(&env)?;
                if let Some(slot) = guard.values.get_mut(&name.lexeme) {
                    *slot = value;
                    return;
                }
                guard.enclosing.clone()
            };
            match next {
                Some(parent) => env = parent,
                None => throw!(RuntimeError::UndefinedVariable(name.clone())),
            }
        }
    }

    #[throws(RuntimeError)]
    fn get_at(&self, distance: usize, name: &Token) -> LiteralValue {
        read_lock(&self.ancestor(distance)?)?
            .values
            .get(&name.lexeme)
            .cloned()
            .ok_or_else(|| RuntimeError::UndefinedVariable(name.clone()))?
    }

    /// Lookup for bindings the interpreter itself plants (`this`, `super`).
    #[throws(RuntimeError)]
    fn get_at_by_name(&self, distance: usize, name: &str) -> LiteralValue {
        read_lock(&self.ancestor(distance)?)?
            .values
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::EnvironmentError(anyhow!("missing binding '{name}'")))?
    }

    #[throws(RuntimeError)]
    fn assign_at(&self, distance: usize, name: &Token, value: LiteralValue) {
        write_lock(&self.ancestor(distance)?)?
            .values
            .insert(name.lexeme.clone(), value);
    }

    /// The environment exactly `distance` enclosing links away.
    #[throws(RuntimeError)]
    fn ancestor(&self, distance: usize) -> Environment {
        let mut env = self.clone();
        for _ in 0..distance {
            let parent = read_lock(&env)?.enclosing.clone();
            env = parent.ok_or_else(|| {
                RuntimeError::EnvironmentError(anyhow!("scope depth {distance} out of range"))
            })?;
        }
        env
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::scanner::{SourcePosition, TokenKind},
        pretty_assertions::assert_eq,
    };

    fn name(lexeme: &str) -> Token {
        Token {
            kind: TokenKind::Identifier,
            lexeme: lexeme.into(),
            literal: None,
            position: SourcePosition { line: 1, span: 0..lexeme.len() },
        }
    }

    #[test]
    fn define_then_get() {
        let env = EnvironmentImpl::new();
        env.define("x", LiteralValue::Num(1.0)).unwrap();
        assert_eq!(env.get(&name("x")).unwrap(), LiteralValue::Num(1.0));
    }

    #[test]
    fn get_walks_the_chain() {
        let globals = EnvironmentImpl::new();
        globals.define("x", LiteralValue::Str("outer".into())).unwrap();
        let inner = EnvironmentImpl::nested(globals);
        assert_eq!(
            inner.get(&name("x")).unwrap(),
            LiteralValue::Str("outer".into())
        );
    }

    #[test]
    fn undefined_variable_errors() {
        let env = EnvironmentImpl::new();
        assert!(matches!(
            env.get(&name("missing")),
            Err(RuntimeError::UndefinedVariable(_))
        ));
        assert!(matches!(
            env.assign(&name("missing"), LiteralValue::Nil),
            Err(RuntimeError::UndefinedVariable(_))
        ));
    }

    #[test]
    fn get_at_walks_exactly_that_many_hops() {
        let root = EnvironmentImpl::new();
        root.define("x", LiteralValue::Num(0.0)).unwrap();
        let mid = EnvironmentImpl::nested(root);
        mid.define("x", LiteralValue::Num(1.0)).unwrap();
        let leaf = EnvironmentImpl::nested(mid);
        leaf.define("x", LiteralValue::Num(2.0)).unwrap();

        assert_eq!(leaf.get_at(0, &name("x")).unwrap(), LiteralValue::Num(2.0));
        assert_eq!(leaf.get_at(1, &name("x")).unwrap(), LiteralValue::Num(1.0));
        assert_eq!(leaf.get_at(2, &name("x")).unwrap(), LiteralValue::Num(0.0));
        assert!(leaf.ancestor(3).is_err());
    }

    #[test]
    fn assign_at_targets_the_right_scope() {
        let root = EnvironmentImpl::new();
        root.define("x", LiteralValue::Num(0.0)).unwrap();
        let leaf = EnvironmentImpl::nested(root.clone());
        leaf.assign_at(1, &name("x"), LiteralValue::Num(9.0)).unwrap();
        assert_eq!(root.get(&name("x")).unwrap(), LiteralValue::Num(9.0));
    }

    #[test]
    fn shadowing_does_not_touch_the_parent() {
        let root = EnvironmentImpl::new();
        root.define("x", LiteralValue::Num(0.0)).unwrap();
        let leaf = EnvironmentImpl::nested(root.clone());
        leaf.define("x", LiteralValue::Num(1.0)).unwrap();
        leaf.assign(&name("x"), LiteralValue::Num(5.0)).unwrap();
        assert_eq!(root.get(&name("x")).unwrap(), LiteralValue::Num(0.0));
        assert_eq!(leaf.get(&name("x")).unwrap(), LiteralValue::Num(5.0));
    }
}

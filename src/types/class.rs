use {
    crate::{
        callable::{Callable, Function},
        error::RuntimeError,
        interpreter::Interpreter,
        literal::LiteralValue,
        scanner::Token,
    },
    anyhow::anyhow,
    culpa::{throw, throws},
    std::{collections::HashMap, rc::Rc, sync::RwLock},
};

/// Class holds the method table; instances point back at it. The method
/// table is immutable once the class statement has been evaluated.
#[derive(Debug)]
pub struct Class {
    pub name: String,
    superclass: Option<Rc<Class>>,
    methods: HashMap<String, Function>,
}

impl Class {
    pub fn new(
        name: String,
        superclass: Option<Rc<Class>>,
        methods: HashMap<String, Function>,
    ) -> Self {
        Self {
            name,
            superclass,
            methods,
        }
    }

    pub fn find_method_by_name(&self, method_name: &str) -> Option<Function> {
        self.methods.get(method_name).cloned().or_else(|| {
            self.superclass
                .as_ref()
                .and_then(|sc| sc.find_method_by_name(method_name))
        })
    }

    #[throws(RuntimeError)]
    pub fn find_method(&self, method_name: &Token) -> Function {
        self.find_method_by_name(&method_name.lexeme)
            .ok_or_else(|| RuntimeError::UndefinedProperty(method_name.clone()))?
    }
}

impl Callable for Rc<Class> {
    /// A class takes whatever its initializer takes.
    fn arity(&self) -> usize {
        self.find_method_by_name("init")
            .map(|init| init.arity())
            .unwrap_or(0)
    }

    /// Calling a class constructs an instance; `init`'s own result is
    /// discarded, construction always yields the instance.
    #[throws(RuntimeError)]
    fn call(&self, interpreter: &mut Interpreter, arguments: &[LiteralValue]) -> LiteralValue {
        let instance: LoxInstance = Rc::new(RwLock::new(LoxInstanceImpl::new(self.clone())));
        if let Some(init) = self.find_method_by_name("init") {
            init.bind(&instance)?.call(interpreter, arguments)?;
        }
        LiteralValue::Instance(instance)
    }
}

// Instances exist by-reference.
pub type LoxInstance = Rc<RwLock<LoxInstanceImpl>>;

/// Instance holds the mutable field map.
#[derive(Debug)]
pub struct LoxInstanceImpl {
    pub class: Rc<Class>,
    fields: HashMap<String, LiteralValue>,
}

impl LoxInstanceImpl {
    pub fn new(class: Rc<Class>) -> Self {
        Self {
            class,
            fields: HashMap::new(),
        }
    }
}

/// Property access on the shared instance handle.
pub trait Object {
    fn get(&self, name: &Token) -> Result<LiteralValue, RuntimeError>;
    fn set(&self, name: &Token, value: LiteralValue) -> Result<(), RuntimeError>;
}

impl Object for LoxInstance {
    /// Fields shadow methods; a found method is bound to this instance.
    #[throws(RuntimeError)]
    fn get(&self, name: &Token) -> LiteralValue {
        let class = {
            let guard = self
                .read()
                .map_err(|_| RuntimeError::EnvironmentError(anyhow!("instance lock poisoned")))?;
            if let Some(value) = guard.fields.get(&name.lexeme) {
                return value.clone();
            }
            guard.class.clone()
        };
        match class.find_method_by_name(&name.lexeme) {
            Some(method) => method.bind(self)?.into(),
            None => throw!(RuntimeError::UndefinedProperty(name.clone())),
        }
    }

    #[throws(RuntimeError)]
    fn set(&self, name: &Token, value: LiteralValue) {
        self.write()
            .map_err(|_| RuntimeError::EnvironmentError(anyhow!("instance lock poisoned")))?
            .fields
            .insert(name.lexeme.clone(), value);
    }
}

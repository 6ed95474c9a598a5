use {
    crate::{
        class::LoxInstance,
        environment::{Environment, EnvironmentImpl, Environmental},
        error::RuntimeError,
        expr,
        interpreter::Interpreter,
        literal::LiteralValue,
        scanner::Token,
    },
    culpa::{throw, throws},
    std::time::SystemTime,
};

pub trait Callable {
    fn arity(&self) -> usize;
    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: &[LiteralValue],
    ) -> Result<LiteralValue, RuntimeError>;
}

/// A named user function or method: its declaration plus the environment
/// captured where the declaration was evaluated.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: Token,
    pub declaration: expr::Lambda,
    pub closure: Environment,
    pub is_initializer: bool,
}

impl Function {
    /// Clone of this method whose closure additionally binds `this`.
    #[throws(RuntimeError)]
    pub fn bind(&self, instance: &LoxInstance) -> Self {
        let closure = EnvironmentImpl::nested(self.closure.clone());
        closure.define("this", LiteralValue::Instance(instance.clone()))?;
        Self {
            closure,
            ..self.clone()
        }
    }
}

impl Callable for Function {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    #[throws(RuntimeError)]
    fn call(&self, interpreter: &mut Interpreter, arguments: &[LiteralValue]) -> LiteralValue {
        let environment = EnvironmentImpl::nested(self.closure.clone());
        for (param, arg) in self.declaration.params.iter().zip(arguments.iter()) {
            environment.define(&param.lexeme, arg.clone())?;
        }
        match interpreter.execute_block(&self.declaration.body, environment) {
            // An initializer always yields its instance, whether the body ran
            // to completion or hit a bare `return`.
            Err(RuntimeError::ReturnValue(value)) => {
                if self.is_initializer {
                    self.closure.get_at_by_name(0, "this")?
                } else {
                    value
                }
            }
            Err(e) => throw!(e),
            Ok(()) => {
                if self.is_initializer {
                    self.closure.get_at_by_name(0, "this")?
                } else {
                    LiteralValue::Nil
                }
            }
        }
    }
}

/// An anonymous `fun (...) { ... }` expression value.
#[derive(Debug, Clone)]
pub struct LambdaFunction {
    pub declaration: expr::Lambda,
    pub closure: Environment,
}

impl Callable for LambdaFunction {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    #[throws(RuntimeError)]
    fn call(&self, interpreter: &mut Interpreter, arguments: &[LiteralValue]) -> LiteralValue {
        let environment = EnvironmentImpl::nested(self.closure.clone());
        for (param, arg) in self.declaration.params.iter().zip(arguments.iter()) {
            environment.define(&param.lexeme, arg.clone())?;
        }
        match interpreter.execute_block(&self.declaration.body, environment) {
            Err(RuntimeError::ReturnValue(value)) => value,
            Err(e) => throw!(e),
            Ok(()) => LiteralValue::Nil,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub body: fn(&mut Interpreter, &[LiteralValue]) -> Result<LiteralValue, RuntimeError>,
}

impl Callable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    #[throws(RuntimeError)]
    fn call(&self, interpreter: &mut Interpreter, arguments: &[LiteralValue]) -> LiteralValue {
        (self.body)(interpreter, arguments)?
    }
}

// Native functions

/// Seconds since the Unix epoch, with sub-second precision.
#[throws(RuntimeError)]
pub fn clock(_no_interp: &mut Interpreter, _no_args: &[LiteralValue]) -> LiteralValue {
    LiteralValue::Num(
        SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map_err(|_| RuntimeError::ClockBackwards)?
            .as_secs_f64(),
    )
}

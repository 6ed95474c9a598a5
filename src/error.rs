use {
    crate::{literal::LiteralValue, scanner::Token},
    thiserror::Error,
};

#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Raised by the parser; reported where it is created and carried only to
    /// unwind into panic-mode synchronization.
    #[error("{message}")]
    ParseError { token: Token, message: String },

    #[error("Operand must be a number.")]
    OperandNotNumber(Token),

    #[error("Operands must be numbers.")]
    OperandsNotNumbers(Token),

    #[error("Operands must be two numbers or two strings.")]
    OperandsNotAddable(Token),

    #[error("Cannot divide by zero.")]
    DivisionByZero(Token),

    #[error("Undefined variable '{}'.", .0.lexeme)]
    UndefinedVariable(Token),

    #[error("Variable '{}' is unassigned.", .0.lexeme)]
    UnassignedVariable(Token),

    #[error("Can only call functions and classes.")]
    NotACallable(Token),

    #[error("Expected {expected} but got {got}.")]
    InvalidArity {
        paren: Token,
        expected: usize,
        got: usize,
    },

    #[error("Undefined property {}.", .0.lexeme)]
    UndefinedProperty(Token),

    #[error("Only instances have properties.")]
    PropertyOnNonInstance(Token),

    #[error("Only instances have fields.")]
    FieldOnNonInstance(Token),

    #[error("Superclass must be a class.")]
    SuperclassNotClass(Token),

    #[error("System clock went backwards.")]
    ClockBackwards,

    #[error("Environment error: {0}")]
    EnvironmentError(anyhow::Error),

    // Non-local control transfers; these unwind through the evaluators and
    // are consumed at function-call and loop boundaries, never reported.
    #[error("'return' outside of a function call")]
    ReturnValue(LiteralValue),

    #[error("'break' outside of a loop")]
    LoopBreak,
}

impl RuntimeError {
    /// Token to blame for line reporting, when the error carries one.
    pub fn token(&self) -> Option<&Token> {
        match self {
            RuntimeError::ParseError { token, .. } => Some(token),
            RuntimeError::OperandNotNumber(t)
            | RuntimeError::OperandsNotNumbers(t)
            | RuntimeError::OperandsNotAddable(t)
            | RuntimeError::DivisionByZero(t)
            | RuntimeError::UndefinedVariable(t)
            | RuntimeError::UnassignedVariable(t)
            | RuntimeError::NotACallable(t)
            | RuntimeError::UndefinedProperty(t)
            | RuntimeError::PropertyOnNonInstance(t)
            | RuntimeError::FieldOnNonInstance(t)
            | RuntimeError::SuperclassNotClass(t) => Some(t),
            RuntimeError::InvalidArity { paren, .. } => Some(paren),
            RuntimeError::ClockBackwards
            | RuntimeError::EnvironmentError(_)
            | RuntimeError::ReturnValue(_)
            | RuntimeError::LoopBreak => None,
        }
    }
}

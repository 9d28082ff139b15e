use std::rc::Rc;

use crate::ast::FunDecl;

use super::environment::Environment;
use super::interpreter::{Flow, Interpreter, RuntimeError, Value};

pub trait Callable {
    fn name(&self) -> &str;
    fn arity(&self) -> u8;
    fn call(&self, interpreter: &mut Interpreter, args: Vec<Value>) -> Result<Value, RuntimeError>;
}

/// A native function provided by the host. The table of these lives in the
/// builtin module and is installed once when the globals are built.
#[derive(Clone, Copy)]
pub struct BuiltinFunc {
    pub name: &'static str,
    pub arity: u8,
    pub call: fn(&mut Interpreter, Vec<Value>) -> Result<Value, RuntimeError>,
}

impl Callable for BuiltinFunc {
    fn name(&self) -> &str {
        self.name
    }

    fn arity(&self) -> u8 {
        self.arity
    }

    fn call(&self, interpreter: &mut Interpreter, args: Vec<Value>) -> Result<Value, RuntimeError> {
        (self.call)(interpreter, args)
    }
}

/// A function declared in the program, closing over the environment that was
/// active where its declaration executed
#[derive(Clone)]
pub struct HostedFunc {
    pub declaration: FunDecl,
    pub closure: Rc<Environment>,
}

impl Callable for HostedFunc {
    fn name(&self) -> &str {
        &self.declaration.name
    }

    fn arity(&self) -> u8 {
        self.declaration.parameters.len().try_into().unwrap()
    }

    fn call(&self, interpreter: &mut Interpreter, args: Vec<Value>) -> Result<Value, RuntimeError> {
        // The parameter-binding scope doubles as the body's top level scope;
        // the body statements run against it directly rather than opening
        // another block scope
        let scope = self.closure.open_scope();
        for (parameter, value) in self.declaration.parameters.iter().zip(args) {
            scope.define(parameter, value);
        }
        for stmt in &self.declaration.body {
            if let Flow::Return(value) = interpreter.execute(&scope, stmt)? {
                return Ok(value);
            }
        }
        // Falling off the end of a function returns null
        Ok(Value::Null)
    }
}

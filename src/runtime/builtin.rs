use std::io::prelude::*;
use std::io::stdin;
use std::rc::Rc;
use std::time::SystemTime;

use super::callable::BuiltinFunc;
use super::environment::Environment;
use super::interpreter::{Interpreter, RuntimeError, Value};
use super::radix;

fn clock_impl(_interperter: &mut Interpreter, _args: Vec<Value>) -> Result<Value, RuntimeError> {
    let duration = SystemTime::UNIX_EPOCH.elapsed().unwrap();
    Ok(Value::Float(duration.as_secs_f64()))
}

fn print_impl(_interperter: &mut Interpreter, args: Vec<Value>) -> Result<Value, RuntimeError> {
    println!("{}", args[0]);
    Ok(Value::Null)
}

fn str_impl(_interperter: &mut Interpreter, args: Vec<Value>) -> Result<Value, RuntimeError> {
    Ok(Value::String(Rc::new(args[0].to_string())))
}

fn read_impl(_interperter: &mut Interpreter, _args: Vec<Value>) -> Result<Value, RuntimeError> {
    let mut line = String::new();
    _ = stdin().lock().read_line(&mut line)?;
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    Ok(Value::String(Rc::new(line)))
}

/// Coerce an int or a tagged radix value to a binary-tagged value
fn binary_impl(_interperter: &mut Interpreter, args: Vec<Value>) -> Result<Value, RuntimeError> {
    match &args[0] {
        Value::Bin(_) => Ok(args[0].clone()),
        Value::Hex(digits) => Ok(Value::Bin(Rc::new(radix::dec_to_bin(radix::hex_to_dec(
            digits,
        ))))),
        Value::Int(n) => Ok(Value::Bin(Rc::new(radix::dec_to_bin(*n)))),
        other => Err(RuntimeError::ExpectedCoercible {
            text: other.to_string(),
        }),
    }
}

/// Coerce an int or a tagged radix value to a hex-tagged value
fn hexadecimal_impl(
    _interperter: &mut Interpreter,
    args: Vec<Value>,
) -> Result<Value, RuntimeError> {
    match &args[0] {
        Value::Hex(_) => Ok(args[0].clone()),
        Value::Bin(digits) => Ok(Value::Hex(Rc::new(radix::dec_to_hex(radix::bin_to_dec(
            digits,
        ))))),
        Value::Int(n) => Ok(Value::Hex(Rc::new(radix::dec_to_hex(*n)))),
        other => Err(RuntimeError::ExpectedCoercible {
            text: other.to_string(),
        }),
    }
}

/// Coerce a tagged radix value to an int; values already carrying a decimal
/// point pass through unchanged
fn decimal_impl(_interperter: &mut Interpreter, args: Vec<Value>) -> Result<Value, RuntimeError> {
    match &args[0] {
        Value::Int(_) => Ok(args[0].clone()),
        Value::Bin(digits) => Ok(Value::Int(radix::bin_to_dec(digits))),
        Value::Hex(digits) => Ok(Value::Int(radix::hex_to_dec(digits))),
        Value::Float(_) => Ok(args[0].clone()),
        other => {
            let text = other.to_string();
            if text.contains('.') {
                return Ok(args[0].clone());
            }
            text.parse::<i64>()
                .map(Value::Int)
                .map_err(|_| RuntimeError::ExpectedInt { text })
        }
    }
}

const BUILTINS: [BuiltinFunc; 7] = [
    BuiltinFunc {
        name: "clock",
        arity: 0,
        call: clock_impl,
    },
    BuiltinFunc {
        name: "print",
        arity: 1,
        call: print_impl,
    },
    BuiltinFunc {
        name: "str",
        arity: 1,
        call: str_impl,
    },
    BuiltinFunc {
        name: "read",
        arity: 0,
        call: read_impl,
    },
    BuiltinFunc {
        name: "binary",
        arity: 1,
        call: binary_impl,
    },
    BuiltinFunc {
        name: "hexadecimal",
        arity: 1,
        call: hexadecimal_impl,
    },
    BuiltinFunc {
        name: "decimal",
        arity: 1,
        call: decimal_impl,
    },
];

pub fn populate_builtin(global_env: &Rc<Environment>) {
    for builtin in BUILTINS {
        global_env.define(builtin.name, Value::Callable(Rc::new(builtin)));
    }
}

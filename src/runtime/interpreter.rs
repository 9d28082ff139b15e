use std::{
    collections::HashMap,
    fmt::{Debug, Display},
    io,
    rc::Rc,
};

use thiserror::Error;

use crate::ast::{
    BinaryOp, Expr, ExprId, ExprInner, Literal, LogicalOp, Program, Stmt, StmtInner, UnaryOp,
};
use crate::scanner::Pos;

use super::callable::{Callable, HostedFunc};
use super::environment::Environment;
use super::radix;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Undefined variable '{name}'. [{pos}]")]
    UndefinedVariable { name: String, pos: Pos },
    #[error("Can only call functions. [{pos}]")]
    NotCallable { pos: Pos },
    #[error("Expected {expected} arguments but got {got}. [{pos}]")]
    ArityMismatch { expected: u8, got: usize, pos: Pos },
    #[error("Operand must be a number. [{pos}]")]
    OperandMustBeNumber { pos: Pos },
    #[error("Operands must be numbers. [{pos}]")]
    OperandsMustBeNumbers { pos: Pos },
    #[error("Operands must be two numbers or two strings. [{pos}]")]
    AddTypeMismatch { pos: Pos },
    #[error("divide by zero [{pos}]")]
    DivideByZero { pos: Pos },
    #[error("return outside of a function [{pos}]")]
    ReturnOutsideFunction { pos: Pos },
    #[error("Expected binary value: '{text}'.")]
    ExpectedBin { text: String },
    #[error("Expected bin, int, or hex: '{text}'.")]
    ExpectedCoercible { text: String },
    #[error("Expected int: '{text}'.")]
    ExpectedInt { text: String },
    #[error("io error: {0}")]
    IOError(#[from] io::Error),
}

/// The result of executing a single statement. `Return` carries a return
/// statement's value upward; block and body loops propagate it explicitly
/// until the nearest call boundary catches it.
pub enum Flow {
    Normal(Value),
    Return(Value),
}

#[derive(Clone)]
pub enum Value {
    String(Rc<String>),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Hexadecimal digits, prefix stripped; renders as `0x…`
    Hex(Rc<String>),
    /// Binary digits, prefix stripped; renders as `0b…`
    Bin(Rc<String>),
    Callable(Rc<dyn Callable>),
    Null,
}

impl Value {
    fn to_bool(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Null => false,
            _ => true,
        }
    }

    fn to_callable(&self) -> Option<&dyn Callable> {
        match self {
            Self::Callable(callable) => Some(callable.as_ref()),
            _ => None,
        }
    }

    // The string family participates in concatenation; tagged values carry
    // their prefixed text into the result
    fn is_text(&self) -> bool {
        matches!(self, Value::String(_) | Value::Hex(_) | Value::Bin(_))
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::String(s) => write!(f, "Value::String('{}')", s),
            Value::Int(n) => write!(f, "Value::Int({})", n),
            Value::Float(x) => write!(f, "Value::Float({})", x),
            Value::Bool(b) => write!(f, "Value::Bool({})", b),
            Value::Hex(digits) => write!(f, "Value::Hex(0x{})", digits),
            Value::Bin(digits) => write!(f, "Value::Bin(0b{})", digits),
            Value::Null => f.write_str("Value::Null"),
            Value::Callable(func) => write!(f, "Value::Callable({})", func.name()),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Int(n) => write!(f, "{}", n),
            // Rust never renders a trailing ".0" for whole floats, which is
            // exactly the display rule we want
            Value::Float(x) => write!(f, "{}", x),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Hex(digits) => write!(f, "0x{}", digits),
            Value::Bin(digits) => write!(f, "0b{}", digits),
            Value::Null => f.write_str("nil"),
            Value::Callable(func) => write!(f, "<fn {}>", func.name()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::String(left), Self::String(right)) => left == right,
            (Self::Int(left), Self::Int(right)) => left == right,
            (Self::Float(left), Self::Float(right)) => left == right,
            (Self::Bool(left), Self::Bool(right)) => left == right,
            (Self::Hex(left), Self::Hex(right)) => left == right,
            (Self::Bin(left), Self::Bin(right)) => left == right,
            (Self::Null, Self::Null) => true,
            // Function values have no useful equality
            (Self::Callable(_), Self::Callable(_)) => false,
            _ => false,
        }
    }
}

/// The operand-type combinations the arithmetic and relational operators
/// accept. Classification is total: anything else is a type error.
enum NumericPair {
    Floats(f64, f64),
    Ints(i64, i64),
    Hexes(Rc<String>, Rc<String>),
    Bins(Rc<String>, Rc<String>),
    IntFloat(i64, f64),
    FloatInt(f64, i64),
}

fn check_number_operands(left: Value, right: Value, pos: Pos) -> Result<NumericPair, RuntimeError> {
    match (left, right) {
        (Value::Float(l), Value::Float(r)) => Ok(NumericPair::Floats(l, r)),
        (Value::Int(l), Value::Int(r)) => Ok(NumericPair::Ints(l, r)),
        (Value::Hex(l), Value::Hex(r)) => Ok(NumericPair::Hexes(l, r)),
        (Value::Bin(l), Value::Bin(r)) => Ok(NumericPair::Bins(l, r)),
        (Value::Int(l), Value::Float(r)) => Ok(NumericPair::IntFloat(l, r)),
        (Value::Float(l), Value::Int(r)) => Ok(NumericPair::FloatInt(l, r)),
        _ => Err(RuntimeError::OperandsMustBeNumbers { pos }),
    }
}

// Both operands of a surviving classification viewed as floats; used by the
// operators with float-only semantics
fn as_floats(pair: NumericPair, pos: Pos) -> Result<(f64, f64), RuntimeError> {
    match pair {
        NumericPair::Floats(l, r) => Ok((l, r)),
        NumericPair::Ints(l, r) => Ok((l as f64, r as f64)),
        NumericPair::IntFloat(l, r) => Ok((l as f64, r)),
        NumericPair::FloatInt(l, r) => Ok((l, r as f64)),
        NumericPair::Hexes(_, _) | NumericPair::Bins(_, _) => {
            Err(RuntimeError::OperandsMustBeNumbers { pos })
        }
    }
}

pub struct Interpreter {
    globals: Rc<Environment>,
    // The resolution map: how many scopes upward each Variable/Assignment
    // node binds. Nodes without an entry fall back to the globals directly.
    locals: HashMap<ExprId, usize>,
}

impl Interpreter {
    pub fn new_with_globals(globals: Rc<Environment>) -> Interpreter {
        Interpreter {
            globals,
            locals: HashMap::new(),
        }
    }

    pub fn globals(&self) -> &Rc<Environment> {
        &self.globals
    }

    /// Registration call for the resolver collaborator: record how many
    /// enclosing scopes separate a Variable/Assignment node from the scope
    /// that defines its name. Must happen before any statement executes.
    pub fn resolve(&mut self, id: ExprId, depth: usize) {
        self.locals.insert(id, depth);
    }

    /// Execute a program against the globals. Stops at the first runtime
    /// error; the remaining statements never run.
    pub fn interpret(&mut self, program: &Program) -> Result<(), RuntimeError> {
        let globals = self.globals.clone();
        for stmt in &program.0 {
            if let Flow::Return(_) = self.execute(&globals, stmt)? {
                return Err(RuntimeError::ReturnOutsideFunction { pos: stmt.pos });
            }
        }
        Ok(())
    }

    /// Execute a single statement and surface its value, for REPL echo
    pub fn interpret_one(&mut self, stmt: &Stmt) -> Result<Value, RuntimeError> {
        let globals = self.globals.clone();
        match self.execute(&globals, stmt)? {
            Flow::Normal(value) => Ok(value),
            Flow::Return(_) => Err(RuntimeError::ReturnOutsideFunction { pos: stmt.pos }),
        }
    }

    // The active environment is threaded through explicitly; restoring the
    // caller's scope after a block is simply not having changed it
    pub(crate) fn execute(
        &mut self,
        env: &Rc<Environment>,
        stmt: &Stmt,
    ) -> Result<Flow, RuntimeError> {
        match &stmt.inner {
            StmtInner::VarDecl { name, init } => {
                let value = match init {
                    Some(expr) => self.eval(env, expr)?,
                    None => Value::Null,
                };
                env.define(name, value.clone());
                Ok(Flow::Normal(value))
            }
            StmtInner::FunDecl(decl) => {
                let function = HostedFunc {
                    declaration: decl.clone(),
                    closure: env.clone(),
                };
                env.define(&decl.name, Value::Callable(Rc::new(function)));
                Ok(Flow::Normal(Value::Null))
            }
            StmtInner::Namespace { name: _, body: _ } => {
                // TODO: bind the namespace's declarations under its name once
                // member access syntax exists; until then this is a no-op
                Ok(Flow::Normal(Value::Null))
            }
            StmtInner::Expr(expr) => Ok(Flow::Normal(self.eval(env, expr)?)),
            StmtInner::Block(stmts) => {
                let scope = env.open_scope();
                for stmt in stmts {
                    if let Flow::Return(value) = self.execute(&scope, stmt)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal(Value::Null))
            }
            StmtInner::If {
                expr,
                then,
                or_else,
            } => {
                if self.eval(env, expr)?.to_bool() {
                    self.execute(env, then)
                } else if let Some(or_else) = or_else {
                    self.execute(env, or_else)
                } else {
                    Ok(Flow::Normal(Value::Null))
                }
            }
            StmtInner::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.eval(env, expr)?,
                    None => Value::Null,
                };
                Ok(Flow::Return(value))
            }
        }
    }

    fn eval(&mut self, env: &Rc<Environment>, expr: &Expr) -> Result<Value, RuntimeError> {
        match &expr.inner {
            ExprInner::Literal(lit) => Ok(literal_value(lit)),
            ExprInner::Group(inner) => self.eval(env, inner),
            ExprInner::Unary { op, expr: operand } => {
                let value = self.eval(env, operand)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!value.to_bool())),
                    UnaryOp::Negative => match value {
                        Value::Int(n) => Ok(Value::Int(-n)),
                        Value::Float(x) => Ok(Value::Float(-x)),
                        _ => Err(RuntimeError::OperandMustBeNumber { pos: expr.pos }),
                    },
                }
            }
            ExprInner::Binary { left, op, right } => {
                let lhs = self.eval(env, left)?;
                let rhs = self.eval(env, right)?;
                eval_binary(*op, lhs, rhs, expr.pos)
            }
            ExprInner::Logical { left, op, right } => {
                let left_val = self.eval(env, left)?;
                // The operand value itself flows through so that expressions
                // like false || "a" evaluate to "a"
                match op {
                    LogicalOp::And => {
                        if left_val.to_bool() {
                            self.eval(env, right)
                        } else {
                            Ok(left_val)
                        }
                    }
                    LogicalOp::Or => {
                        if left_val.to_bool() {
                            Ok(left_val)
                        } else {
                            self.eval(env, right)
                        }
                    }
                }
            }
            ExprInner::Variable { id, name } => self.look_up_variable(env, *id, name, expr.pos),
            ExprInner::Assignment {
                id,
                target,
                expr: value_expr,
            } => {
                let value = self.eval(env, value_expr)?;
                // Two tiers, the same as lookup: a resolved distance writes
                // through the chain, everything else writes to the globals
                let assigned = match self.locals.get(id) {
                    Some(distance) => env.assign_at(*distance, target, value.clone()),
                    None => self.globals.assign(target, value.clone()),
                };
                if assigned {
                    Ok(value)
                } else {
                    Err(RuntimeError::UndefinedVariable {
                        name: target.clone(),
                        pos: expr.pos,
                    })
                }
            }
            ExprInner::Call { callee, arguments } => {
                let callee_val = self.eval(env, callee)?;
                let mut args = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    args.push(self.eval(env, argument)?);
                }
                match callee_val.to_callable() {
                    Some(function) => {
                        if args.len() != usize::from(function.arity()) {
                            return Err(RuntimeError::ArityMismatch {
                                expected: function.arity(),
                                got: args.len(),
                                pos: expr.pos,
                            });
                        }
                        function.call(self, args)
                    }
                    None => Err(RuntimeError::NotCallable { pos: expr.pos }),
                }
            }
        }
    }

    fn look_up_variable(
        &self,
        env: &Rc<Environment>,
        id: ExprId,
        name: &str,
        pos: Pos,
    ) -> Result<Value, RuntimeError> {
        let value = match self.locals.get(&id) {
            Some(distance) => env.get_at(*distance, name),
            None => self.globals.get(name),
        };
        value.ok_or_else(|| RuntimeError::UndefinedVariable {
            name: name.to_string(),
            pos,
        })
    }
}

fn literal_value(lit: &Literal) -> Value {
    match lit {
        Literal::Int(n) => Value::Int(*n),
        Literal::Float(x) => Value::Float(**x),
        Literal::Str(s) => Value::String(Rc::new(s.clone())),
        Literal::Hex(digits) => Value::Hex(Rc::new(digits.clone())),
        Literal::Bin(digits) => Value::Bin(Rc::new(digits.clone())),
        Literal::Boolean(b) => Value::Bool(*b),
        Literal::Null => Value::Null,
    }
}

fn eval_binary(op: BinaryOp, lhs: Value, rhs: Value, pos: Pos) -> Result<Value, RuntimeError> {
    match op {
        BinaryOp::Equal => Ok(Value::Bool(lhs == rhs)),
        BinaryOp::NotEqual => Ok(Value::Bool(lhs != rhs)),
        BinaryOp::LessThan
        | BinaryOp::LessThanEqual
        | BinaryOp::GreaterThan
        | BinaryOp::GreaterThanEqual => {
            let pair = check_number_operands(lhs, rhs, pos)?;
            Ok(Value::Bool(compare(op, pair)))
        }
        BinaryOp::Add => match (lhs, rhs) {
            (Value::Float(l), Value::Float(r)) => Ok(Value::Float(l + r)),
            (Value::Int(l), Value::Int(r)) => Ok(Value::Int(l + r)),
            (Value::Hex(l), Value::Hex(r)) => Ok(Value::Hex(Rc::new(radix::hex_add(&l, &r)))),
            (Value::Bin(l), Value::Bin(r)) => Ok(Value::Bin(Rc::new(radix::bin_add(&l, &r)))),
            // Mismatched members of the string family concatenate their
            // rendered forms
            (l, r) if l.is_text() && r.is_text() => {
                Ok(Value::String(Rc::new(format!("{}{}", l, r))))
            }
            _ => Err(RuntimeError::AddTypeMismatch { pos }),
        },
        BinaryOp::Subtract => match check_number_operands(lhs, rhs, pos)? {
            NumericPair::Floats(l, r) => Ok(Value::Float(l - r)),
            NumericPair::Ints(l, r) => Ok(Value::Int(l - r)),
            NumericPair::Hexes(l, r) => Ok(Value::Hex(Rc::new(radix::hex_subtract(&l, &r)))),
            NumericPair::Bins(l, r) => Ok(Value::Bin(Rc::new(radix::bin_subtract(&l, &r)))),
            NumericPair::IntFloat(l, r) => Ok(Value::Float(l as f64 - r)),
            NumericPair::FloatInt(l, r) => Ok(Value::Float(l - r as f64)),
        },
        BinaryOp::Multiply => {
            let (l, r) = as_floats(check_number_operands(lhs, rhs, pos)?, pos)?;
            Ok(Value::Float(l * r))
        }
        BinaryOp::Divide => {
            let (l, r) = as_floats(check_number_operands(lhs, rhs, pos)?, pos)?;
            Ok(Value::Float(l / r))
        }
        BinaryOp::Modulo => match check_number_operands(lhs, rhs, pos)? {
            NumericPair::Ints(l, r) => {
                if r == 0 {
                    Err(RuntimeError::DivideByZero { pos })
                } else {
                    Ok(Value::Int(l % r))
                }
            }
            _ => Err(RuntimeError::OperandsMustBeNumbers { pos }),
        },
        BinaryOp::BitOr | BinaryOp::BitAnd => {
            let lhs_text = lhs.to_string();
            let combine: fn(&str, &str) -> String = if op == BinaryOp::BitOr {
                radix::bin_or
            } else {
                radix::bin_and
            };
            match check_number_operands(lhs, rhs, pos)? {
                // Hex operands go through their bit patterns and re-encode in
                // their own base
                NumericPair::Hexes(l, r) => {
                    let l_bits = radix::dec_to_bin(radix::hex_to_dec(&l));
                    let r_bits = radix::dec_to_bin(radix::hex_to_dec(&r));
                    let combined = combine(&l_bits, &r_bits);
                    Ok(Value::Hex(Rc::new(radix::dec_to_hex(radix::bin_to_dec(
                        &combined,
                    )))))
                }
                NumericPair::Bins(l, r) => Ok(Value::Bin(Rc::new(combine(&l, &r)))),
                _ => Err(RuntimeError::ExpectedBin { text: lhs_text }),
            }
        }
    }
}

fn compare(op: BinaryOp, pair: NumericPair) -> bool {
    let (l, r) = match pair {
        NumericPair::Floats(l, r) => (l, r),
        NumericPair::Ints(l, r) => return compare_ints(op, l, r),
        // Tagged pairs compare by their decimal magnitude
        NumericPair::Hexes(l, r) => {
            return compare_ints(op, radix::hex_to_dec(&l), radix::hex_to_dec(&r))
        }
        NumericPair::Bins(l, r) => {
            return compare_ints(op, radix::bin_to_dec(&l), radix::bin_to_dec(&r))
        }
        NumericPair::IntFloat(l, r) => (l as f64, r),
        NumericPair::FloatInt(l, r) => (l, r as f64),
    };
    match op {
        BinaryOp::LessThan => l < r,
        BinaryOp::LessThanEqual => l <= r,
        BinaryOp::GreaterThan => l > r,
        BinaryOp::GreaterThanEqual => l >= r,
        op => panic!("operator was not relational: {}", op),
    }
}

fn compare_ints(op: BinaryOp, l: i64, r: i64) -> bool {
    match op {
        BinaryOp::LessThan => l < r,
        BinaryOp::LessThanEqual => l <= r,
        BinaryOp::GreaterThan => l > r,
        BinaryOp::GreaterThanEqual => l >= r,
        op => panic!("operator was not relational: {}", op),
    }
}

#[cfg(test)]
mod test {
    use super::super::stock_interpreter;
    use super::*;
    use crate::parser::{parse, NoopReporter};
    use crate::scanner::Scanner;

    fn run(code: &str) -> Interpreter {
        let program = parse(&mut NoopReporter {}, Scanner::new(code)).unwrap();
        let mut interpreter = stock_interpreter();
        interpreter.interpret(&program).unwrap();
        interpreter
    }

    fn run_resolved(code: &str) -> Interpreter {
        let program = parse(&mut NoopReporter {}, Scanner::new(code)).unwrap();
        let mut interpreter = stock_interpreter();
        resolve_program(&mut interpreter, &program);
        interpreter.interpret(&program).unwrap();
        interpreter
    }

    fn run_err(code: &str) -> RuntimeError {
        let program = parse(&mut NoopReporter {}, Scanner::new(code)).unwrap();
        let mut interpreter = stock_interpreter();
        interpreter.interpret(&program).unwrap_err()
    }

    fn global(interpreter: &Interpreter, name: &str) -> Value {
        interpreter
            .globals()
            .get(name)
            .unwrap_or_else(|| panic!("expected a global named {}", name))
    }

    // Plays the resolver collaborator for the tests that need locally bound
    // variables: walks the program the same way scopes nest at runtime and
    // registers a distance for every Variable/Assignment node that binds
    // inside a function or block
    fn resolve_program(interpreter: &mut Interpreter, program: &Program) {
        let mut scopes: Vec<Vec<String>> = Vec::new();
        for stmt in &program.0 {
            resolve_stmt(interpreter, &mut scopes, stmt);
        }
    }

    fn resolve_stmt(interpreter: &mut Interpreter, scopes: &mut Vec<Vec<String>>, stmt: &Stmt) {
        match &stmt.inner {
            StmtInner::VarDecl { name, init } => {
                if let Some(init) = init {
                    resolve_expr(interpreter, scopes, init);
                }
                if let Some(scope) = scopes.last_mut() {
                    scope.push(name.clone());
                }
            }
            StmtInner::FunDecl(decl) => {
                if let Some(scope) = scopes.last_mut() {
                    scope.push(decl.name.clone());
                }
                scopes.push(decl.parameters.clone());
                for stmt in &decl.body {
                    resolve_stmt(interpreter, scopes, stmt);
                }
                scopes.pop();
            }
            StmtInner::Namespace { .. } => {}
            StmtInner::Expr(expr) => resolve_expr(interpreter, scopes, expr),
            StmtInner::Block(stmts) => {
                scopes.push(Vec::new());
                for stmt in stmts {
                    resolve_stmt(interpreter, scopes, stmt);
                }
                scopes.pop();
            }
            StmtInner::If {
                expr,
                then,
                or_else,
            } => {
                resolve_expr(interpreter, scopes, expr);
                resolve_stmt(interpreter, scopes, then);
                if let Some(or_else) = or_else {
                    resolve_stmt(interpreter, scopes, or_else);
                }
            }
            StmtInner::Return(expr) => {
                if let Some(expr) = expr {
                    resolve_expr(interpreter, scopes, expr);
                }
            }
        }
    }

    fn resolve_expr(interpreter: &mut Interpreter, scopes: &mut Vec<Vec<String>>, expr: &Expr) {
        match &expr.inner {
            ExprInner::Variable { id, name } => resolve_name(interpreter, scopes, *id, name),
            ExprInner::Assignment {
                id,
                target,
                expr: value,
            } => {
                resolve_expr(interpreter, scopes, value);
                resolve_name(interpreter, scopes, *id, target);
            }
            ExprInner::Literal(_) => {}
            ExprInner::Group(inner) => resolve_expr(interpreter, scopes, inner),
            ExprInner::Unary { expr, .. } => resolve_expr(interpreter, scopes, expr),
            ExprInner::Binary { left, right, .. } | ExprInner::Logical { left, right, .. } => {
                resolve_expr(interpreter, scopes, left);
                resolve_expr(interpreter, scopes, right);
            }
            ExprInner::Call { callee, arguments } => {
                resolve_expr(interpreter, scopes, callee);
                for argument in arguments {
                    resolve_expr(interpreter, scopes, argument);
                }
            }
        }
    }

    fn resolve_name(
        interpreter: &mut Interpreter,
        scopes: &mut Vec<Vec<String>>,
        id: ExprId,
        name: &str,
    ) {
        for (depth, scope) in scopes.iter().rev().enumerate() {
            if scope.iter().any(|bound| bound == name) {
                interpreter.resolve(id, depth);
                return;
            }
        }
        // Not found locally: the node keeps no entry and the lookup falls
        // back to the globals
    }

    #[test]
    fn int_addition_stays_int() {
        let interpreter = run("let x = 1 + 2;");
        assert_eq!(Value::Int(3), global(&interpreter, "x"));
    }

    #[test]
    fn float_arithmetic() {
        let interpreter = run("let x = 1.5 + 2.25; let y = 7 / 2; let z = 3 * 4;");
        assert_eq!(Value::Float(3.75), global(&interpreter, "x"));
        // Division and multiplication always take the float path
        assert_eq!(Value::Float(3.5), global(&interpreter, "y"));
        assert_eq!(Value::Float(12.0), global(&interpreter, "z"));
    }

    #[test]
    fn modulo_is_integer_only() {
        let interpreter = run("let m = 7 % 3;");
        assert_eq!(Value::Int(1), global(&interpreter, "m"));
        let err = run_err("let m = 7.5 % 2;");
        assert!(err.to_string().contains("Operands must be numbers"));
        let err = run_err("let m = 7 % 0;");
        assert!(err.to_string().contains("divide by zero"));
    }

    #[test]
    fn string_concatenation() {
        let interpreter = run("let s = \"foo\" + \"bar\";");
        assert_eq!(
            Value::String(Rc::new("foobar".to_string())),
            global(&interpreter, "s")
        );
    }

    #[test]
    fn mixed_text_concatenates_rendered_forms() {
        let interpreter = run("let s = \"addr=\" + 0x1F;");
        assert_eq!(
            Value::String(Rc::new("addr=0x1F".to_string())),
            global(&interpreter, "s")
        );
    }

    #[test]
    fn add_type_mismatch_is_an_error() {
        let err = run_err("let x = 1 + \"one\";");
        assert!(err
            .to_string()
            .contains("Operands must be two numbers or two strings"));
    }

    #[test]
    fn hex_add_and_subtract() {
        let interpreter = run("let a = 0x126 + 0xAB1; let d = 0x10 - 0x01;");
        assert_eq!(
            Value::Hex(Rc::new("BD7".to_string())),
            global(&interpreter, "a")
        );
        assert_eq!(
            Value::Hex(Rc::new("F".to_string())),
            global(&interpreter, "d")
        );
    }

    #[test]
    fn bin_add_and_subtract() {
        let interpreter = run("let a = 0b1 + 0b11; let d = 0b10 - 0b1;");
        assert_eq!(
            Value::Bin(Rc::new("100".to_string())),
            global(&interpreter, "a")
        );
        assert_eq!(
            Value::Bin(Rc::new("1".to_string())),
            global(&interpreter, "d")
        );
    }

    #[test]
    fn bitwise_on_bin_operands() {
        let interpreter = run("let o = 0b1010 | 0b0101; let a = 0b1100 & 0b1010;");
        assert_eq!(
            Value::Bin(Rc::new("1111".to_string())),
            global(&interpreter, "o")
        );
        assert_eq!(
            Value::Bin(Rc::new("1000".to_string())),
            global(&interpreter, "a")
        );
    }

    #[test]
    fn bitwise_on_hex_operands_reencodes_hex() {
        let interpreter = run("let o = 0xF0 | 0x0F; let a = 0xFF & 0x0F;");
        assert_eq!(
            Value::Hex(Rc::new("FF".to_string())),
            global(&interpreter, "o")
        );
        assert_eq!(
            Value::Hex(Rc::new("F".to_string())),
            global(&interpreter, "a")
        );
    }

    #[test]
    fn bitwise_on_plain_numbers_is_an_error() {
        let err = run_err("let x = 1 | 2;");
        assert!(err.to_string().contains("Expected binary value"));
    }

    #[test]
    fn relational_operators() {
        let interpreter = run(
            "let a = 1 < 2; let b = 2.5 >= 2.5; let c = 1 < 1.5; let d = 0x0F < 0x10; let e = 0b10 > 0b1;",
        );
        assert_eq!(Value::Bool(true), global(&interpreter, "a"));
        assert_eq!(Value::Bool(true), global(&interpreter, "b"));
        assert_eq!(Value::Bool(true), global(&interpreter, "c"));
        assert_eq!(Value::Bool(true), global(&interpreter, "d"));
        assert_eq!(Value::Bool(true), global(&interpreter, "e"));
    }

    #[test]
    fn relational_on_strings_is_an_error() {
        let err = run_err("let x = \"a\" < \"b\";");
        assert!(err.to_string().contains("Operands must be numbers"));
    }

    #[test]
    fn equality_is_structural() {
        let interpreter = run(
            "let a = null == null; let b = 1 == 1.0; let c = \"x\" == \"x\"; let d = 0x1 == 0x1; let e = 1 != 2;",
        );
        assert_eq!(Value::Bool(true), global(&interpreter, "a"));
        // Ints and floats never compare equal structurally
        assert_eq!(Value::Bool(false), global(&interpreter, "b"));
        assert_eq!(Value::Bool(true), global(&interpreter, "c"));
        assert_eq!(Value::Bool(true), global(&interpreter, "d"));
        assert_eq!(Value::Bool(true), global(&interpreter, "e"));
    }

    #[test]
    fn unary_operators() {
        let interpreter = run("let a = -3; let b = -2.5; let c = !true; let d = !null;");
        assert_eq!(Value::Int(-3), global(&interpreter, "a"));
        assert_eq!(Value::Float(-2.5), global(&interpreter, "b"));
        assert_eq!(Value::Bool(false), global(&interpreter, "c"));
        assert_eq!(Value::Bool(true), global(&interpreter, "d"));
    }

    #[test]
    fn negating_a_string_is_an_error() {
        let err = run_err("let x = -\"nope\";");
        assert!(err.to_string().contains("Operand must be a number"));
    }

    #[test]
    fn logical_operators_flow_operand_values() {
        let interpreter = run("let a = false || \"a\"; let b = null && missing();");
        assert_eq!(
            Value::String(Rc::new("a".to_string())),
            global(&interpreter, "a")
        );
        // Short-circuit: the undefined call on the right never evaluates
        assert_eq!(Value::Null, global(&interpreter, "b"));
    }

    #[test]
    fn truthiness_in_if() {
        let interpreter = run(
            "let r = 0; if (null) r = 1; else r = 2; let s = 0; if (0x0) s = 1; else s = 2;",
        );
        assert_eq!(Value::Int(2), global(&interpreter, "r"));
        // Anything that isn't bool or null is truthy, a zero hex included
        assert_eq!(Value::Int(1), global(&interpreter, "s"));
    }

    #[test]
    fn block_shadowing_leaves_outer_binding() {
        let interpreter = run("let x = 1; { let x = 2; }");
        assert_eq!(Value::Int(1), global(&interpreter, "x"));
    }

    #[test]
    fn unresolved_assignment_falls_back_to_globals() {
        let interpreter = run("let x = 1; { x = 2; }");
        assert_eq!(Value::Int(2), global(&interpreter, "x"));
    }

    #[test]
    fn undefined_variable_is_an_error() {
        let err = run_err("let x = missing;");
        assert!(err.to_string().contains("Undefined variable 'missing'"));
        let err = run_err("missing = 1;");
        assert!(err.to_string().contains("Undefined variable 'missing'"));
    }

    #[test]
    fn var_without_initializer_is_null() {
        let interpreter = run("let x;");
        assert_eq!(Value::Null, global(&interpreter, "x"));
    }

    #[test]
    fn function_call_binds_parameters() {
        let interpreter = run_resolved("do ident(x) { return x; } let y = ident(41);");
        assert_eq!(Value::Int(41), global(&interpreter, "y"));
    }

    #[test]
    fn function_without_return_yields_null() {
        let interpreter = run_resolved("do noop() { let a = 1; } let r = noop();");
        assert_eq!(Value::Null, global(&interpreter, "r"));
    }

    #[test]
    fn return_stops_the_body() {
        let interpreter = run_resolved(
            "do pick() { if (true) { return 1; } return 2; } let r = pick();",
        );
        assert_eq!(Value::Int(1), global(&interpreter, "r"));
    }

    #[test]
    fn closure_counter_retains_state() {
        let code = "do make() {
            let n = 0;
            do bump() {
                n = n + 1;
                return n;
            }
            return bump;
        }
        let counter = make();
        let first = counter();
        let second = counter();
        ";
        let interpreter = run_resolved(code);
        assert_eq!(Value::Int(1), global(&interpreter, "first"));
        assert_eq!(Value::Int(2), global(&interpreter, "second"));
    }

    #[test]
    fn arity_mismatch_cites_both_counts() {
        let err = {
            let program = parse(
                &mut NoopReporter {},
                Scanner::new("do pair(a, b) { return a; } pair(1);"),
            )
            .unwrap();
            let mut interpreter = stock_interpreter();
            interpreter.interpret(&program).unwrap_err()
        };
        assert!(err.to_string().contains("Expected 2 arguments but got 1."));
    }

    #[test]
    fn calling_a_non_function_is_an_error() {
        let err = run_err("let x = 1; x();");
        assert!(err.to_string().contains("Can only call functions"));
    }

    #[test]
    fn top_level_return_is_an_error() {
        let err = run_err("return 1;");
        assert!(err.to_string().contains("return outside of a function"));
    }

    #[test]
    fn first_runtime_error_halts_the_program() {
        let program = parse(
            &mut NoopReporter {},
            Scanner::new("let x = 1; boom(); let x = 2;"),
        )
        .unwrap();
        let mut interpreter = stock_interpreter();
        assert!(interpreter.interpret(&program).is_err());
        // The statement after the failing call never ran
        assert_eq!(Value::Int(1), global(&interpreter, "x"));
    }

    #[test]
    fn namespace_executes_as_a_noop() {
        let interpreter = run("namespace tools { do helper() { return 1; } }");
        // Nothing inside the namespace was bound anywhere
        assert_eq!(None, interpreter.globals().get("helper"));
        assert_eq!(None, interpreter.globals().get("tools"));
    }

    #[test]
    fn builtin_calls_from_source() {
        let interpreter = run(
            "let p = print(\"hi\"); let s = str(42); let d = decimal(0xF); let b = binary(5); let h = hexadecimal(0b1111);",
        );
        assert_eq!(Value::Null, global(&interpreter, "p"));
        assert_eq!(
            Value::String(Rc::new("42".to_string())),
            global(&interpreter, "s")
        );
        assert_eq!(Value::Int(15), global(&interpreter, "d"));
        assert_eq!(
            Value::Bin(Rc::new("101".to_string())),
            global(&interpreter, "b")
        );
        assert_eq!(
            Value::Hex(Rc::new("F".to_string())),
            global(&interpreter, "h")
        );
    }

    #[test]
    fn determinism_of_pure_expressions() {
        let program = parse(&mut NoopReporter {}, Scanner::new("let x = (1 + 2) * 4.0;")).unwrap();
        let mut first = stock_interpreter();
        first.interpret(&program).unwrap();
        let mut second = stock_interpreter();
        second.interpret(&program).unwrap();
        assert_eq!(global(&first, "x"), global(&second, "x"));
    }

    #[test]
    fn quoted_prefix_strings_stay_plain_strings() {
        // A quoted "0x1F" is not a tagged numeral; + concatenates it
        let interpreter = run("let s = \"0x1F\" + \"0x01\";");
        assert_eq!(
            Value::String(Rc::new("0x1F0x01".to_string())),
            global(&interpreter, "s")
        );
    }

    #[test]
    fn repl_echo_surfaces_expression_values() {
        let program = parse(&mut NoopReporter {}, Scanner::new("1 + 2;")).unwrap();
        let mut interpreter = stock_interpreter();
        let value = interpreter.interpret_one(&program.0[0]).unwrap();
        assert_eq!(Value::Int(3), value);
    }

    #[test]
    fn value_display_forms() {
        assert_eq!("nil", Value::Null.to_string());
        assert_eq!("4", Value::Float(4.0).to_string());
        assert_eq!("4.5", Value::Float(4.5).to_string());
        assert_eq!("0x1A", Value::Hex(Rc::new("1A".to_string())).to_string());
        assert_eq!("0b101", Value::Bin(Rc::new("101".to_string())).to_string());
        assert_eq!("plain", Value::String(Rc::new("plain".to_string())).to_string());
    }
}

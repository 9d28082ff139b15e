mod builtin;
mod callable;
mod environment;
mod interpreter;
mod radix;

pub use builtin::populate_builtin;
pub use callable::{BuiltinFunc, Callable, HostedFunc};
pub use environment::Environment;
pub use interpreter::{Flow, Interpreter, RuntimeError, Value};

/// An interpreter whose globals carry the native bindings
pub fn stock_interpreter() -> Interpreter {
    let globals = Environment::new_global();
    populate_builtin(&globals);
    Interpreter::new_with_globals(globals)
}

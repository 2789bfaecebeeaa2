pub mod control_flow;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod parser;

pub use control_flow::ControlFlow;
pub use environment::Environment;
pub use error::RuntimeError;
pub use evaluator::{
    parse_and_run, parse_program, parse_with_diagnostics, Interpreter, RunOutcome,
};
pub use parser::{ParseError, ParseResult, TokenParser};

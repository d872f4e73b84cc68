//! Code evaluation against input/output test cases

mod evaluator;
mod harness;
mod input;
pub mod literal;

pub use evaluator::{outputs_match, CaseResult, CodeEvaluator, EvaluationReport, IoCase, WORKSPACE_DIR};
pub use input::{parse_call_args, CallArgs};
pub use literal::{Literal, LiteralError, Tolerance};

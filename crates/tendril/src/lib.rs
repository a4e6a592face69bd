//! tendril - Declarative Query and Transform for Semi-Structured Data
//!
//! A compact textual pattern language describes the shape a value must
//! have; the engine decides whether a value conforms, enumerates every
//! way it can conform (each way a [`Solution`] binding named variables
//! to substructures), and can produce a modified copy of the input
//! driven by those solutions.
//!
//! # Pipeline
//!
//! ```text
//!   Pattern text
//!        │
//!        ▼
//!   [tendril-lex]  ──▶ tokens
//!        │
//!        ▼
//!   [tendril-par]  ──▶ arena AST
//!        │
//!        ▼
//!   [tendril-sem]  ──▶ validated Program (labels, buckets, regexes)
//!        │
//!        ▼
//!   [tendril-engine] + Value ──▶ solutions / edited copy
//! ```
//!
//! # Example
//!
//! ```
//! use tendril::{compile, match_solutions, value_from_json};
//! use serde_json::json;
//!
//! let program = compile("{a: $x, (% as %rest)}").unwrap();
//! let input = value_from_json(json!({"a": 1, "b": 2}));
//!
//! let mut stream = match_solutions(&program, &input);
//! let solution = stream.next().unwrap();
//! assert_eq!(solution.get("x"), Some(&value_from_json(json!(1))));
//! assert_eq!(solution.get("rest"), Some(&value_from_json(json!({"b": 2}))));
//! ```

pub use tendril_engine::{
    edit_all_with, find_with, first_with, match_with, replace_all_with, EditPlan,
    LocatedSolution, LocatedSolutionStream, MatchConfig, OccKind, Occurrence, Solution,
    SolutionStream,
};
pub use tendril_sem::Program;
pub use tendril_util::{CompileError, CompileErrorKind, EditError, MatchError, Span};
pub use tendril_value::{
    path_to_string, value_from_json, value_to_json, Path, PathStep, Value,
};

use tendril_util::error::CompileResult;

/// Compile a pattern: tokenize, parse, validate.
///
/// The returned [`Program`] is immutable and may be reused across any
/// number of match invocations.
pub fn compile(source: &str) -> CompileResult<Program> {
    let tokens = tendril_lex::tokenize(source)?;
    let ast = tendril_par::parse(tokens)?;
    tendril_sem::validate(ast)
}

/// Match at the value's root, enumerating every solution in
/// deterministic order. An empty stream means no match.
pub fn match_solutions(program: &Program, value: &Value) -> SolutionStream {
    tendril_engine::match_solutions(program, value)
}

/// Apply the program at every sub-position of the value; each located
/// solution carries its root-relative path.
pub fn find(program: &Program, value: &Value) -> LocatedSolutionStream {
    tendril_engine::find(program, value)
}

/// The first located solution, short-circuiting inside the engine.
pub fn first(program: &Program, value: &Value) -> Option<LocatedSolution> {
    tendril_engine::first(program, value)
}

/// Does the value conform at its root? Short-circuits.
pub fn matches(program: &Program, value: &Value) -> bool {
    tendril_engine::matches(program, value)
}

/// Produce a copy of the value with every match site replaced by
/// `f(solution)`. With a `>> ... <<` marker in the pattern, only the
/// marked sub-pattern's subject is replaced.
pub fn replace_all(
    program: &Program,
    value: &Value,
    f: impl FnMut(&Solution) -> Value,
) -> Result<Value, EditError> {
    tendril_engine::replace_all(program, value, f)
}

/// Produce a copy of the value with per-binding substitutions: the plan
/// maps binding names to replacement values, applied at every
/// occurrence site. Plan entries for unbound names are ignored.
pub fn edit_all(
    program: &Program,
    value: &Value,
    plan: impl FnMut(&Solution) -> EditPlan,
) -> Result<Value, EditError> {
    tendril_engine::edit_all(program, value, plan)
}

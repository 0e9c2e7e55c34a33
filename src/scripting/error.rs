use rhai::EvalAltResult;
use thiserror::Error;

/// A script abort as the host reports it: where it happened and why
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{module}:{}: {message}", .line.map_or_else(|| "?".to_string(), |l| l.to_string()))]
pub struct ScriptError {
    pub module: String,
    pub line: Option<usize>,
    pub message: String,
}

impl ScriptError {
    /// Unwrap module and function-call frames down to the failure that
    /// started the unwind, keeping the innermost module name seen.
    pub fn from_eval(err: &EvalAltResult, module: &str) -> Self {
        match err {
            EvalAltResult::ErrorInModule(name, inner, _) => Self::from_eval(inner, name),
            EvalAltResult::ErrorInFunctionCall(_, source, inner, _) => {
                let module = if source.is_empty() { module } else { source };
                Self::from_eval(inner, module)
            }
            EvalAltResult::ErrorRuntime(value, pos) => Self {
                module: module.to_string(),
                line: pos.line(),
                message: value.to_string(),
            },
            other => Self {
                module: module.to_string(),
                line: other.position().line(),
                message: other.to_string(),
            },
        }
    }
}

//! The rhai engine the host runs scripts in.
//!
//! Native classes are registered once through the dispatcher (see
//! [`register_api`]) and `import` goes through the layered source resolver.
//! Script `print` and `debug` land in the log, since the terminal belongs
//! to the renderer.

use std::cell::RefCell;
use std::rc::Rc;

use rhai::{Engine, EvalAltResult};

use super::bind::{exit_status, register_api};
use super::error::ScriptError;
use super::resolver::SourceModuleResolver;
use crate::api::{ApiResult, Dispatcher};
use crate::config::Settings;
use crate::host::HostContext;
use crate::loader::SourceResolver;

/// Name errors in top-level script text are reported under
const MAIN: &str = "main";

pub struct ScriptEngine {
    engine: Engine,
    host: Rc<RefCell<HostContext>>,
}

impl ScriptEngine {
    pub fn new(host: HostContext, dispatcher: Dispatcher) -> ApiResult<Self> {
        let mut engine = Self::create_engine(host.settings());
        let host = Rc::new(RefCell::new(host));
        register_api(&mut engine, &host, dispatcher)?;
        Ok(Self { engine, host })
    }

    fn create_engine(settings: &Settings) -> Engine {
        let mut engine = Engine::new();

        // Safety limits
        if settings.max_expr_depth > 0 {
            engine.set_max_expr_depths(settings.max_expr_depth, settings.max_expr_depth);
        }
        if settings.max_call_levels > 0 {
            engine.set_max_call_levels(settings.max_call_levels);
        }
        if settings.max_operations > 0 {
            engine.set_max_operations(settings.max_operations);
        }

        engine.on_print(|msg| log::info!(target: "script", "{msg}"));
        engine.on_debug(|msg, source, pos| {
            let line = pos.line().unwrap_or(0);
            log::debug!(target: "script", "{}:{line}: {msg}", source.unwrap_or(MAIN));
        });

        engine.set_module_resolver(SourceModuleResolver::new(SourceResolver::from_settings(
            settings,
        )));

        engine
    }

    /// Evaluate script text, returning its final value
    #[cfg(test)]
    pub fn eval(&self, script: &str) -> Result<rhai::Dynamic, ScriptError> {
        self.engine
            .eval::<rhai::Dynamic>(script)
            .map_err(|err| ScriptError::from_eval(&err, MAIN))
    }

    /// Run script text for its effects. A requested exit ends the run
    /// cleanly; the status is left in [`exit_code`](Self::exit_code).
    pub fn run(&self, script: &str) -> Result<(), ScriptError> {
        match self.engine.run(script) {
            Ok(()) => Ok(()),
            Err(err) if exit_status(&err).is_some() => Ok(()),
            Err(err) => Err(self.report(&err)),
        }
    }

    /// Import the entry module and run it. Errors it raises are handed to
    /// its own `on_error` before anything reaches the host.
    pub fn run_prelude(&self) -> Result<(), ScriptError> {
        let entry = self.host.borrow().settings().entry_module.clone();
        self.run(&prelude(&entry))
    }

    fn report(&self, err: &EvalAltResult) -> ScriptError {
        let report = ScriptError::from_eval(err, MAIN);
        log::error!("{report}");
        report
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.host.borrow().exit_code()
    }

    #[cfg(test)]
    pub fn host(&self) -> std::cell::Ref<'_, HostContext> {
        self.host.borrow()
    }
}

fn prelude(entry: &str) -> String {
    format!(
        r#"
import {entry:?} as core;
try {{
    core::run();
}} catch (err) {{
    print(`error: ${{err}}`);
    core::on_error(err);
}}
"#
    )
}

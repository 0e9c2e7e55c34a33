//! Feeds `import` statements from a [`SourceResolver`].

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use rhai::module_resolvers::ModuleResolver;
use rhai::{Engine, EvalAltResult, Module, Position, Scope};

use crate::loader::{Resolved, SourceResolver};

/// Compiles each module once and hands out the cached copy afterwards
pub struct SourceModuleResolver {
    sources: SourceResolver,
    cache: RefCell<HashMap<String, Rc<Module>>>,
    loading: RefCell<HashSet<String>>,
}

impl SourceModuleResolver {
    pub fn new(sources: SourceResolver) -> Self {
        Self {
            sources,
            cache: RefCell::new(HashMap::new()),
            loading: RefCell::new(HashSet::new()),
        }
    }

    fn compile(
        &self,
        engine: &Engine,
        name: &str,
        origin: &str,
        text: &str,
        pos: Position,
    ) -> Result<Rc<Module>, Box<EvalAltResult>> {
        let in_module = |err: Box<EvalAltResult>| -> Box<EvalAltResult> {
            EvalAltResult::ErrorInModule(name.to_string(), err, pos).into()
        };

        let mut ast = engine.compile(text).map_err(|e| in_module(e.into()))?;
        ast.set_source(origin);
        let module = Module::eval_ast_as_new(Scope::new(), &ast, engine).map_err(in_module)?;
        Ok(Rc::new(module))
    }
}

impl ModuleResolver for SourceModuleResolver {
    fn resolve(
        &self,
        engine: &Engine,
        _source: Option<&str>,
        path: &str,
        pos: Position,
    ) -> Result<Rc<Module>, Box<EvalAltResult>> {
        if let Some(module) = self.cache.borrow().get(path) {
            return Ok(Rc::clone(module));
        }
        if !self.loading.borrow_mut().insert(path.to_string()) {
            return Err(EvalAltResult::ErrorInModule(
                path.to_string(),
                EvalAltResult::ErrorRuntime("cyclic import".into(), pos).into(),
                pos,
            )
            .into());
        }

        let result = match self.sources.resolve(path) {
            Ok(Resolved::Builtin(text)) => self.compile(engine, path, path, text, pos),
            Ok(Resolved::Owned { path: file, text }) => {
                self.compile(engine, path, &file.to_string_lossy(), &text, pos)
            }
            Ok(Resolved::NotFound) => {
                Err(EvalAltResult::ErrorModuleNotFound(path.to_string(), pos).into())
            }
            Err(err) => Err(EvalAltResult::ErrorInModule(
                path.to_string(),
                EvalAltResult::ErrorSystem("failed to load module".into(), Box::new(err)).into(),
                pos,
            )
            .into()),
        };
        self.loading.borrow_mut().remove(path);

        let module = result?;
        log::debug!("compiled module {path}");
        self.cache
            .borrow_mut()
            .insert(path.to_string(), Rc::clone(&module));
        Ok(module)
    }
}

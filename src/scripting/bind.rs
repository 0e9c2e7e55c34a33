//! Exposes the dispatcher's classes to rhai.
//!
//! Every class becomes a static module named after it. Static entries are
//! module functions (`Program::get_time()`), static getters are module
//! constants (`Program::ARGS`) and a foreign class gains its constructor
//! (`File::load(path, mode)`). Instance entries are global functions keyed
//! on the handle type, so `file.read(16)` and `font.height` resolve through
//! the receiver's class at call time.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use rhai::{Dynamic, Engine, EvalAltResult, Module, Position};

use super::convert::{to_dynamic, to_value};
use crate::api::{
    ApiClass, ApiError, ApiResult, CallSlots, Dispatcher, ForeignHandle, ForeignMethodFn, Signature,
    SignatureKind, Value,
};
use crate::host::HostContext;

type RhaiResult = Result<Dynamic, Box<EvalAltResult>>;

// Names rhai reserves, registered under an alias as well
const RESERVED_ALIASES: &[(&str, &str)] = &[("exit", "quit")];

// Most positional arguments any registered signature takes
const MAX_ARITY: usize = 5;

pub fn register_api(
    engine: &mut Engine,
    host: &Rc<RefCell<HostContext>>,
    dispatcher: Dispatcher,
) -> ApiResult<()> {
    let mut instance = InstanceMethods::default();

    for class in dispatcher.classes() {
        let module = class_module(host, dispatcher, class)?;
        engine.register_static_module(class.name, Rc::new(module));
        instance.collect(dispatcher, class);
    }

    engine.register_global_module(Rc::new(instance.into_module(host)));
    log::debug!(
        "registered {} classes from module {}",
        dispatcher.classes().len(),
        dispatcher.module()
    );
    Ok(())
}

/// Register `call` under `name`, taking `arity` script values
fn set_fn(
    module: &mut Module,
    name: &str,
    arity: usize,
    call: impl Fn(Vec<Value>) -> RhaiResult + 'static,
) {
    let call = Rc::new(call);
    macro_rules! arm {
        ($($arg:ident),*) => {{
            let call = Rc::clone(&call);
            module.set_native_fn(name, move |$($arg: Dynamic),*| call(vec![$(to_value(&$arg)),*]));
        }};
    }
    match arity {
        0 => arm!(),
        1 => arm!(a),
        2 => arm!(a, b),
        3 => arm!(a, b, c),
        4 => arm!(a, b, c, d),
        5 => arm!(a, b, c, d, e),
        _ => log::warn!("{name} takes {arity} arguments, at most {MAX_ARITY} are supported"),
    }
}

/// Like [`set_fn`], with a foreign receiver ahead of the arguments
fn set_method(
    module: &mut Module,
    name: &str,
    arity: usize,
    call: impl Fn(ForeignHandle, Vec<Value>) -> RhaiResult + 'static,
) {
    let call = Rc::new(call);
    macro_rules! arm {
        ($($arg:ident),*) => {{
            let call = Rc::clone(&call);
            module.set_native_fn(name, move |receiver: &mut ForeignHandle, $($arg: Dynamic),*| {
                call(receiver.clone(), vec![$(to_value(&$arg)),*])
            });
        }};
    }
    match arity {
        0 => arm!(),
        1 => arm!(a),
        2 => arm!(a, b),
        3 => arm!(a, b, c),
        4 => arm!(a, b, c, d),
        _ => log::warn!("{name} takes {arity} arguments, at most {} are supported", MAX_ARITY - 1),
    }
}

fn class_module(
    host: &Rc<RefCell<HostContext>>,
    dispatcher: Dispatcher,
    class: &'static ApiClass,
) -> ApiResult<Module> {
    let mut module = Module::new();

    for entry in class.methods.iter().filter(|m| m.is_static) {
        let Some(sig) = Signature::parse(entry.signature) else {
            log::warn!("skipping malformed signature {}::{}", class.name, entry.signature);
            continue;
        };
        let Some(func) =
            dispatcher.bind_foreign_method(dispatcher.module(), class.name, true, entry.signature)
        else {
            continue;
        };

        match sig.kind {
            SignatureKind::Getter => {
                // constant for the whole run
                let mut slots = CallSlots::for_static(Vec::new());
                func(&mut host.borrow_mut(), &mut slots)?;
                module.set_var(sig.name, to_dynamic(slots.into_return()));
            }
            SignatureKind::Method => {
                set_static_fn(&mut module, host, sig.name, sig.arity, func);
                if let Some((_, alias)) = RESERVED_ALIASES.iter().find(|(n, _)| *n == sig.name) {
                    set_static_fn(&mut module, host, alias, sig.arity, func);
                }
            }
            SignatureKind::Setter => {
                let name = format!("set_{}", sig.name);
                set_static_fn(&mut module, host, &name, sig.arity, func);
            }
        }
    }

    if let Some(foreign) = dispatcher.bind_foreign_class(dispatcher.module(), class.name) {
        if let Some(sig) = Signature::parse(foreign.constructor) {
            let host = Rc::clone(host);
            let class_name = class.name;
            set_fn(&mut module, sig.name, sig.arity, move |args| {
                let mut slots = CallSlots::for_static(args);
                let mut host = borrow_host(&host)?;
                match foreign.construct(class_name, &mut host, &mut slots) {
                    Ok(handle) => Ok(Dynamic::from(handle)),
                    Err(err) => Err(abort(&mut host, err)),
                }
            });
        }
    }

    Ok(module)
}

fn set_static_fn(
    module: &mut Module,
    host: &Rc<RefCell<HostContext>>,
    name: &str,
    arity: usize,
    func: ForeignMethodFn,
) {
    let host = Rc::clone(host);
    set_fn(module, name, arity, move |args| {
        invoke(&host, func, CallSlots::for_static(args))
    });
}

/// Handlers per `(rhai name, arity)`, one per class
#[derive(Default)]
struct InstanceMethods {
    groups: BTreeMap<(String, usize), Vec<(&'static str, ForeignMethodFn)>>,
}

impl InstanceMethods {
    fn collect(&mut self, dispatcher: Dispatcher, class: &'static ApiClass) {
        for entry in class.methods.iter().filter(|m| !m.is_static) {
            let Some(sig) = Signature::parse(entry.signature) else {
                continue;
            };
            let Some(func) = dispatcher.bind_foreign_method(
                dispatcher.module(),
                class.name,
                false,
                entry.signature,
            ) else {
                continue;
            };

            let names = match sig.kind {
                SignatureKind::Method => vec![sig.name.to_string()],
                // `font.height` and `font.height()` both work
                SignatureKind::Getter => vec![format!("get${}", sig.name), sig.name.to_string()],
                SignatureKind::Setter => vec![format!("set${}", sig.name)],
            };
            for name in names {
                self.groups
                    .entry((name, sig.arity))
                    .or_default()
                    .push((class.name, func));
            }
        }
    }

    fn into_module(self, host: &Rc<RefCell<HostContext>>) -> Module {
        let mut module = Module::new();
        for ((name, arity), handlers) in self.groups {
            let host = Rc::clone(host);
            let method = name.clone();

            set_method(&mut module, &name, arity, move |handle, args| {
                let Some((_, func)) = handlers.iter().find(|(c, _)| *c == handle.class()) else {
                    return Err(runtime_error(format!(
                        "{} has no method {method}",
                        handle.class()
                    )));
                };
                invoke(&host, *func, CallSlots::new(Value::Foreign(handle), args))
            });
        }
        module
    }
}

fn borrow_host(
    host: &RefCell<HostContext>,
) -> Result<std::cell::RefMut<'_, HostContext>, Box<EvalAltResult>> {
    host.try_borrow_mut()
        .map_err(|_| runtime_error("host is busy"))
}

/// Run one foreign call. Slot 0 becomes the rhai return value; a failure
/// aborts the calling script. rhai stamps the call site onto the error.
fn invoke(host: &RefCell<HostContext>, func: ForeignMethodFn, mut slots: CallSlots) -> RhaiResult {
    let mut host = borrow_host(host)?;
    match func(&mut host, &mut slots) {
        Ok(()) => Ok(to_dynamic(slots.into_return())),
        Err(err) => Err(abort(&mut host, err)),
    }
}

fn abort(host: &mut HostContext, err: ApiError) -> Box<EvalAltResult> {
    match err {
        ApiError::Exit(code) => {
            host.request_exit(code);
            exit_termination(code)
        }
        other => {
            log::debug!("foreign call aborted: {other}");
            runtime_error(other.to_string())
        }
    }
}

/// Marker value carried by the termination an exit request raises
const EXIT_TAG: &str = "exit";

fn exit_termination(code: i32) -> Box<EvalAltResult> {
    let mut value = rhai::Map::new();
    value.insert(EXIT_TAG.into(), Dynamic::from_int(code.into()));
    EvalAltResult::ErrorTerminated(Dynamic::from_map(value), Position::NONE).into()
}

/// Exit status if `err` is the termination raised by an exit request
pub fn exit_status(err: &EvalAltResult) -> Option<i32> {
    match err {
        EvalAltResult::ErrorTerminated(value, _) => value
            .read_lock::<rhai::Map>()?
            .get(EXIT_TAG)?
            .as_int()
            .ok()
            .and_then(|code| i32::try_from(code).ok()),
        EvalAltResult::ErrorInFunctionCall(_, _, inner, _)
        | EvalAltResult::ErrorInModule(_, inner, _) => exit_status(inner),
        _ => None,
    }
}

fn runtime_error(message: impl Into<String>) -> Box<EvalAltResult> {
    EvalAltResult::ErrorRuntime(Dynamic::from(message.into()), Position::NONE).into()
}

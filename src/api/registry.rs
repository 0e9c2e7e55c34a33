//! Static tables mapping script signatures to native handlers.
//!
//! A signature encodes name and arity the way the script-side class
//! declares it: `name(_,_)` for a method, `name` for a getter and
//! `name=(_)` for a setter. Lookup is an exact comparison, never a prefix.

use std::collections::HashSet;

use thiserror::Error;

use super::error::ApiResult;
use super::foreign::ForeignClassMethods;
use super::slots::CallSlots;
use crate::host::HostContext;

pub type ForeignMethodFn = fn(&mut HostContext, &mut CallSlots) -> ApiResult<()>;

#[derive(Clone, Copy)]
pub struct ApiRegistry {
    pub signature: &'static str,
    pub is_static: bool,
    pub func: ForeignMethodFn,
}

impl ApiRegistry {
    pub const fn on_class(signature: &'static str, func: ForeignMethodFn) -> Self {
        Self {
            signature,
            is_static: true,
            func,
        }
    }

    pub const fn on_instance(signature: &'static str, func: ForeignMethodFn) -> Self {
        Self {
            signature,
            is_static: false,
            func,
        }
    }
}

pub struct ApiClass {
    pub name: &'static str,
    pub methods: &'static [ApiRegistry],
    /// Allocation hooks, for classes whose instances wrap a native resource
    pub foreign: Option<ForeignClassMethods>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureKind {
    Method,
    Getter,
    Setter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature<'a> {
    pub name: &'a str,
    pub kind: SignatureKind,
    pub arity: usize,
}

impl<'a> Signature<'a> {
    pub fn parse(signature: &'a str) -> Option<Self> {
        let Some(open) = signature.find('(') else {
            return is_ident(signature).then_some(Signature {
                name: signature,
                kind: SignatureKind::Getter,
                arity: 0,
            });
        };

        let params = signature[open..].strip_prefix('(')?.strip_suffix(')')?;
        let arity = if params.is_empty() {
            0
        } else {
            let parts: Vec<&str> = params.split(',').collect();
            if parts.iter().any(|p| *p != "_") {
                return None;
            }
            parts.len()
        };

        let head = &signature[..open];
        let (name, kind) = match head.strip_suffix('=') {
            Some(name) if arity == 1 => (name, SignatureKind::Setter),
            Some(_) => return None,
            None => (head, SignatureKind::Method),
        };
        is_ident(name).then_some(Signature { name, kind, arity })
    }
}

fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("class {0} is registered twice")]
    DuplicateClass(&'static str),

    #[error("{class} registers {signature} twice")]
    DuplicateSignature {
        class: &'static str,
        signature: &'static str,
    },

    #[error("{class} has malformed signature {signature:?}")]
    Malformed {
        class: &'static str,
        signature: &'static str,
    },
}

/// Resolves `(module, class, static, signature)` to a handler
#[derive(Clone, Copy)]
pub struct Dispatcher {
    module: &'static str,
    classes: &'static [ApiClass],
}

impl Dispatcher {
    pub const fn new(module: &'static str, classes: &'static [ApiClass]) -> Self {
        Self { module, classes }
    }

    pub fn module(&self) -> &'static str {
        self.module
    }

    pub fn classes(&self) -> &'static [ApiClass] {
        self.classes
    }

    fn class(&self, module: &str, class: &str) -> Option<&'static ApiClass> {
        if module != self.module {
            return None;
        }
        self.classes.iter().find(|c| c.name == class)
    }

    pub fn bind_foreign_method(
        &self,
        module: &str,
        class: &str,
        is_static: bool,
        signature: &str,
    ) -> Option<ForeignMethodFn> {
        self.class(module, class)?
            .methods
            .iter()
            .find(|m| m.is_static == is_static && m.signature == signature)
            .map(|m| m.func)
    }

    pub fn bind_foreign_class(&self, module: &str, class: &str) -> Option<ForeignClassMethods> {
        self.class(module, class)?.foreign
    }

    /// Check every table once at startup
    pub fn validate(&self) -> Result<(), RegistryError> {
        let mut names = HashSet::new();
        for class in self.classes {
            if !names.insert(class.name) {
                return Err(RegistryError::DuplicateClass(class.name));
            }

            let mut seen = HashSet::new();
            let constructor = class.foreign.map(|f| (f.constructor, true));
            for (signature, is_static) in class
                .methods
                .iter()
                .map(|m| (m.signature, m.is_static))
                .chain(constructor)
            {
                if Signature::parse(signature).is_none() {
                    return Err(RegistryError::Malformed {
                        class: class.name,
                        signature,
                    });
                }
                if !seen.insert((signature, is_static)) {
                    return Err(RegistryError::DuplicateSignature {
                        class: class.name,
                        signature,
                    });
                }
            }
        }
        Ok(())
    }
}

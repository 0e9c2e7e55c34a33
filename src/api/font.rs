//! The `Font` class, wrapping a loaded [`Font`].

use std::any::Any;

use super::error::ApiResult;
use super::foreign::{ForeignClassMethods, Resource, finalize_resource};
use super::registry::{ApiClass, ApiRegistry};
use super::slots::CallSlots;
use crate::host::HostContext;
use crate::render::Font;

const NAME: &str = "Font";

const METHODS: [ApiRegistry; 3] = [
    ApiRegistry::on_instance("tab_width=(_)", set_tab_width),
    ApiRegistry::on_instance("width(_)", width),
    ApiRegistry::on_instance("height", height),
];

pub const CLASS: ApiClass = ApiClass {
    name: NAME,
    methods: &METHODS,
    foreign: Some(ForeignClassMethods {
        constructor: "load(_,_)",
        allocate,
        finalize: finalize_resource::<Font>,
    }),
};

fn allocate(_: &mut HostContext, slots: &mut CallSlots) -> ApiResult<Box<dyn Any>> {
    let path = slots.check_string(1)?;
    let size = slots.check_num(2)?;
    let font = Font::load(path, size as f32)?;
    Ok(Box::new(Resource::open(font)))
}

fn with_font<R>(
    slots: &CallSlots,
    action: &'static str,
    f: impl FnOnce(&mut Font) -> ApiResult<R>,
) -> ApiResult<R> {
    slots.check_foreign(0)?.with_open(NAME, action, f)
}

fn set_tab_width(_: &mut HostContext, slots: &mut CallSlots) -> ApiResult<()> {
    let n = slots.check_num(1)?;
    with_font(slots, "set tab width of", |font| {
        font.set_tab_width(n.max(1.0) as usize);
        Ok(())
    })?;
    slots.set_null();
    Ok(())
}

fn width(_: &mut HostContext, slots: &mut CallSlots) -> ApiResult<()> {
    let text = slots.check_string(1)?;
    let width = with_font(slots, "measure with", |font| Ok(font.width(text)))?;
    slots.set_num(width as f64);
    Ok(())
}

fn height(_: &mut HostContext, slots: &mut CallSlots) -> ApiResult<()> {
    let height = with_font(slots, "measure with", |font| Ok(font.height()))?;
    slots.set_num(height as f64);
    Ok(())
}

//! The `Renderer` class. Coordinates are surface units, colors are
//! `[r, g, b]` or `[r, g, b, a]` lists.

use super::error::{ApiError, ApiResult};
use super::registry::{ApiClass, ApiRegistry};
use super::slots::CallSlots;
use super::value::Value;
use crate::host::HostContext;
use crate::render::{Font, RenColor, RenRect};

const METHODS: [ApiRegistry; 9] = [
    ApiRegistry::on_class("show_debug(_)", show_debug),
    ApiRegistry::on_class("get_size()", get_size),
    ApiRegistry::on_class("begin_frame()", begin_frame),
    ApiRegistry::on_class("end_frame()", end_frame),
    ApiRegistry::on_class("set_clip_rect(_)", set_clip_rect_list),
    ApiRegistry::on_class("set_clip_rect(_,_,_,_)", set_clip_rect),
    ApiRegistry::on_class("draw_rect(_,_,_,_)", draw_rect),
    ApiRegistry::on_class("draw_rect(_,_,_,_,_)", draw_rect),
    ApiRegistry::on_class("draw_text(_,_,_,_,_)", draw_text),
];

pub const CLASS: ApiClass = ApiClass {
    name: "Renderer",
    methods: &METHODS,
    foreign: None,
};

const WHITE: RenColor = RenColor::gray(255);

/// Color argument at `slot`; absent or null means opaque white
pub fn check_color(slots: &CallSlots, slot: usize) -> ApiResult<RenColor> {
    if slots.get(slot).is_null() {
        return Ok(WHITE);
    }
    let parts = slots.check_list(slot)?;
    if !(3..=4).contains(&parts.len()) {
        return Err(ApiError::Invalid(format!(
            "color must have 3 or 4 components, got {}",
            parts.len()
        )));
    }

    let mut channels = [255u8; 4];
    for (i, part) in parts.iter().enumerate() {
        match part {
            Value::Num(n) => channels[i] = n.clamp(0.0, 255.0) as u8,
            other => {
                return Err(ApiError::Invalid(format!(
                    "color component {i} must be a number, got {}",
                    other.slot_type()
                )));
            }
        }
    }
    let [r, g, b, a] = channels;
    Ok(RenColor::rgba(r, g, b, a))
}

fn check_coord(slots: &CallSlots, slot: usize) -> ApiResult<i32> {
    Ok(slots.check_num(slot)? as i32)
}

fn check_rect(slots: &CallSlots, first: usize) -> ApiResult<RenRect> {
    Ok(RenRect::new(
        check_coord(slots, first)?,
        check_coord(slots, first + 1)?,
        check_coord(slots, first + 2)?,
        check_coord(slots, first + 3)?,
    ))
}

fn show_debug(host: &mut HostContext, slots: &mut CallSlots) -> ApiResult<()> {
    let enable = slots.check_bool(1)?;
    host.renderer().show_debug(enable);
    slots.set_null();
    Ok(())
}

fn get_size(host: &mut HostContext, slots: &mut CallSlots) -> ApiResult<()> {
    let (width, height) = host.renderer().size();
    slots.set_list(vec![Value::from(width), Value::from(height)]);
    Ok(())
}

fn begin_frame(host: &mut HostContext, slots: &mut CallSlots) -> ApiResult<()> {
    host.renderer().begin_frame();
    slots.set_null();
    Ok(())
}

fn end_frame(host: &mut HostContext, slots: &mut CallSlots) -> ApiResult<()> {
    host.renderer()
        .end_frame()
        .map_err(|e| ApiError::io("failed to present frame", e))?;
    slots.set_null();
    Ok(())
}

fn set_clip_rect_list(host: &mut HostContext, slots: &mut CallSlots) -> ApiResult<()> {
    let parts = slots.check_list(1)?;
    if parts.len() != 4 {
        return Err(ApiError::Invalid(format!(
            "clip rect must have 4 components, got {}",
            parts.len()
        )));
    }
    let unpacked = CallSlots::for_static(parts.to_vec());
    let rect = check_rect(&unpacked, 1)?;
    host.renderer().set_clip_rect(rect);
    slots.set_null();
    Ok(())
}

fn set_clip_rect(host: &mut HostContext, slots: &mut CallSlots) -> ApiResult<()> {
    let rect = check_rect(slots, 1)?;
    host.renderer().set_clip_rect(rect);
    slots.set_null();
    Ok(())
}

/// Serves both arities: the color slot reads as null when omitted
fn draw_rect(host: &mut HostContext, slots: &mut CallSlots) -> ApiResult<()> {
    let rect = check_rect(slots, 1)?;
    let color = check_color(slots, 5)?;
    host.renderer().draw_rect(rect, color);
    slots.set_null();
    Ok(())
}

fn draw_text(host: &mut HostContext, slots: &mut CallSlots) -> ApiResult<()> {
    let handle = slots.check_foreign(1)?;
    let text = slots.check_string(2)?;
    let x = check_coord(slots, 3)?;
    let y = check_coord(slots, 4)?;
    let color = check_color(slots, 5)?;

    let end = handle.with_open("Font", "draw with", |font: &mut Font| {
        Ok(host.renderer().draw_text(font, text, x, y, color))
    })?;
    slots.set_num(end as f64);
    Ok(())
}

//! The `Program` class: events, window, filesystem, process and clock.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, UNIX_EPOCH};

use super::error::{ApiError, ApiResult};
use super::registry::{ApiClass, ApiRegistry};
use super::slots::CallSlots;
use super::value::Value;
use crate::finder::fuzzy_match;
use crate::host::{CursorShape, HostContext, WindowMode};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(windows)]
pub const PATHSEP: &str = "\\";
#[cfg(not(windows))]
pub const PATHSEP: &str = "/";

// Longest a single wait or sleep may block
const MAX_BLOCK_SECS: f64 = 86_400.0;

const METHODS: [ApiRegistry; 24] = [
    ApiRegistry::on_class("poll_event()", poll_event),
    ApiRegistry::on_class("wait_event(_)", wait_event),
    ApiRegistry::on_class("set_cursor(_)", set_cursor),
    ApiRegistry::on_class("set_window_title(_)", set_window_title),
    ApiRegistry::on_class("set_window_mode(_)", set_window_mode),
    ApiRegistry::on_class("window_has_focus()", window_has_focus),
    ApiRegistry::on_class("show_confirm_dialog(_,_)", show_confirm_dialog),
    ApiRegistry::on_class("chdir(_)", chdir),
    ApiRegistry::on_class("list_dir(_)", list_dir),
    ApiRegistry::on_class("absolute_path(_)", absolute_path),
    ApiRegistry::on_class("get_file_info(_)", get_file_info),
    ApiRegistry::on_class("get_clipboard()", get_clipboard),
    ApiRegistry::on_class("set_clipboard(_)", set_clipboard),
    ApiRegistry::on_class("get_time()", get_time),
    ApiRegistry::on_class("sleep(_)", sleep),
    ApiRegistry::on_class("exec(_)", exec),
    ApiRegistry::on_class("fuzzy_match(_,_)", fuzzy),
    ApiRegistry::on_class("exit(_)", exit),
    ApiRegistry::on_class("ARGS", args),
    ApiRegistry::on_class("PLATFORM", platform),
    ApiRegistry::on_class("SCALE", scale),
    ApiRegistry::on_class("EXEFILE", exefile),
    ApiRegistry::on_class("VERSION", version),
    ApiRegistry::on_class("PATHSEP", pathsep),
];

pub const CLASS: ApiClass = ApiClass {
    name: "Program",
    methods: &METHODS,
    foreign: None,
};

fn seconds(n: f64) -> Duration {
    if n.is_nan() {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(n.clamp(0.0, MAX_BLOCK_SECS))
}

fn poll_event(host: &mut HostContext, slots: &mut CallSlots) -> ApiResult<()> {
    match host.poll_event() {
        Some(event) => slots.set(0, event.to_value()),
        None => slots.set_null(),
    }
    Ok(())
}

fn wait_event(host: &mut HostContext, slots: &mut CallSlots) -> ApiResult<()> {
    let timeout = seconds(slots.check_num(1)?);
    slots.set_bool(host.wait_event(timeout));
    Ok(())
}

fn set_cursor(host: &mut HostContext, slots: &mut CallSlots) -> ApiResult<()> {
    let index = slots.check_option(1, Some("arrow"), &CursorShape::OPTIONS)?;
    let shape = CursorShape::from_option(index).ok_or(ApiError::MissingOption)?;
    host.set_cursor(shape)
        .map_err(|e| ApiError::io("failed to set cursor", e))?;
    slots.set_null();
    Ok(())
}

fn set_window_title(host: &mut HostContext, slots: &mut CallSlots) -> ApiResult<()> {
    let title = slots.check_string(1)?;
    host.platform()
        .set_title(title)
        .map_err(|e| ApiError::io("failed to set window title", e))?;
    slots.set_null();
    Ok(())
}

fn set_window_mode(host: &mut HostContext, slots: &mut CallSlots) -> ApiResult<()> {
    let index = slots.check_option(1, Some("normal"), &WindowMode::OPTIONS)?;
    let mode = WindowMode::from_option(index).ok_or(ApiError::MissingOption)?;
    host.platform()
        .set_mode(mode)
        .map_err(|e| ApiError::io("failed to set window mode", e))?;
    slots.set_null();
    Ok(())
}

fn window_has_focus(host: &mut HostContext, slots: &mut CallSlots) -> ApiResult<()> {
    let focused = host.platform().has_focus();
    slots.set_bool(focused);
    Ok(())
}

fn chdir(_: &mut HostContext, slots: &mut CallSlots) -> ApiResult<()> {
    let path = slots.check_string(1)?;
    env::set_current_dir(path).map_err(|e| ApiError::io("chdir() failed", e))?;
    slots.set_null();
    Ok(())
}

fn list_dir(_: &mut HostContext, slots: &mut CallSlots) -> ApiResult<()> {
    let path = slots.check_string(1)?;
    let entries = fs::read_dir(path).map_err(|e| ApiError::io(path, e))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ApiError::io(path, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name != "." && name != ".." {
            names.push(Value::Str(name));
        }
    }
    slots.set_list(names);
    Ok(())
}

fn absolute_path(_: &mut HostContext, slots: &mut CallSlots) -> ApiResult<()> {
    let path = slots.check_string(1)?;
    let resolved = fs::canonicalize(path).map_err(|e| ApiError::io(path, e))?;
    slots.set_string(resolved.to_string_lossy());
    Ok(())
}

fn get_file_info(_: &mut HostContext, slots: &mut CallSlots) -> ApiResult<()> {
    let path = slots.check_string(1)?;
    let meta = fs::metadata(path).map_err(|e| ApiError::io(path, e))?;

    let kind = if meta.is_file() {
        Value::from("file")
    } else if meta.is_dir() {
        Value::from("dir")
    } else {
        Value::Null
    };
    let modified = meta
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0.0, |d| d.as_secs() as f64);

    let info = BTreeMap::from([
        ("type".to_string(), kind),
        ("size".to_string(), Value::Num(meta.len() as f64)),
        ("modified".to_string(), Value::Num(modified)),
    ]);
    slots.set_map(info);
    Ok(())
}

fn get_clipboard(host: &mut HostContext, slots: &mut CallSlots) -> ApiResult<()> {
    let text = host.platform().clipboard_text();
    slots.set(0, Value::from(text));
    Ok(())
}

fn set_clipboard(host: &mut HostContext, slots: &mut CallSlots) -> ApiResult<()> {
    let text = slots.check_string(1)?;
    host.platform()
        .set_clipboard_text(text)
        .map_err(|e| ApiError::io("failed to set clipboard", e))?;
    slots.set_null();
    Ok(())
}

fn get_time(host: &mut HostContext, slots: &mut CallSlots) -> ApiResult<()> {
    slots.set_num(host.elapsed());
    Ok(())
}

fn sleep(_: &mut HostContext, slots: &mut CallSlots) -> ApiResult<()> {
    let duration = seconds(slots.check_num(1)?);
    // millisecond resolution
    thread::sleep(Duration::from_millis(duration.as_millis() as u64));
    slots.set_null();
    Ok(())
}

/// Start `cmd` through the shell without waiting for it
fn exec(_: &mut HostContext, slots: &mut CallSlots) -> ApiResult<()> {
    let cmd = slots.check_string(1)?;

    #[cfg(windows)]
    let mut command = {
        let mut c = Command::new("cmd");
        c.arg("/c").arg(cmd);
        c
    };
    #[cfg(not(windows))]
    let mut command = {
        let mut c = Command::new("sh");
        c.arg("-c").arg(format!("{cmd} &"));
        c
    };

    let child = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| ApiError::io("failed to run command", e))?;

    // `sh` backgrounds the command and exits at once, so reap it here
    #[cfg(not(windows))]
    {
        let mut child = child;
        child
            .wait()
            .map_err(|e| ApiError::io("failed to run command", e))?;
    }
    #[cfg(windows)]
    drop(child);

    log::debug!("exec: {cmd}");
    slots.set_null();
    Ok(())
}

fn fuzzy(_: &mut HostContext, slots: &mut CallSlots) -> ApiResult<()> {
    let haystack = slots.check_string(1)?;
    let pattern = slots.check_string(2)?;
    let score = fuzzy_match(haystack, pattern).map(|s| s as f64);
    slots.set(0, Value::from(score));
    Ok(())
}

/// Blocks until answered; the prompt draws over the frame, so the next
/// frame is redrawn in full
fn show_confirm_dialog(host: &mut HostContext, slots: &mut CallSlots) -> ApiResult<()> {
    let title = slots.check_string(1)?;
    let message = slots.check_string(2)?;
    let answer = host
        .platform()
        .confirm(title, message)
        .map_err(|e| ApiError::io("failed to show dialog", e))?;
    host.renderer().invalidate();
    slots.set_bool(answer);
    Ok(())
}

fn exit(_: &mut HostContext, slots: &mut CallSlots) -> ApiResult<()> {
    let code = slots.check_num(1)?;
    Err(ApiError::Exit(code as i32))
}

fn args(host: &mut HostContext, slots: &mut CallSlots) -> ApiResult<()> {
    let args = host.args().iter().map(|a| Value::from(a.as_str())).collect();
    slots.set_list(args);
    Ok(())
}

fn platform(_: &mut HostContext, slots: &mut CallSlots) -> ApiResult<()> {
    slots.set_string(platform_name());
    Ok(())
}

fn platform_name() -> &'static str {
    match env::consts::OS {
        "linux" => "Linux",
        "windows" => "Windows",
        "macos" => "Mac OS X",
        "ios" => "iOS",
        "android" => "Android",
        "freebsd" => "FreeBSD",
        "netbsd" => "NetBSD",
        "openbsd" => "OpenBSD",
        _ => "Unknown",
    }
}

fn scale(host: &mut HostContext, slots: &mut CallSlots) -> ApiResult<()> {
    slots.set_num(host.settings().scale);
    Ok(())
}

fn exefile(_: &mut HostContext, slots: &mut CallSlots) -> ApiResult<()> {
    let exe = env::current_exe().map_err(|e| ApiError::io("failed to locate executable", e))?;
    slots.set_string(exe.to_string_lossy());
    Ok(())
}

fn version(_: &mut HostContext, slots: &mut CallSlots) -> ApiResult<()> {
    slots.set_string(VERSION);
    Ok(())
}

fn pathsep(_: &mut HostContext, slots: &mut CallSlots) -> ApiResult<()> {
    slots.set_string(PATHSEP);
    Ok(())
}

//! The `File` class: raw file I/O with C-style open modes.

use std::any::Any;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};

use super::error::{ApiError, ApiResult};
use super::foreign::{ForeignClassMethods, Resource, finalize_resource};
use super::registry::{ApiClass, ApiRegistry};
use super::slots::CallSlots;
use super::value::Value;
use crate::host::HostContext;

const NAME: &str = "File";

const SEEK_ORIGINS: [&str; 3] = ["cur", "set", "end"];

const METHODS: [ApiRegistry; 7] = [
    ApiRegistry::on_instance("read(_)", read),
    ApiRegistry::on_instance("read_line()", read_line),
    ApiRegistry::on_instance("write(_)", write),
    ApiRegistry::on_instance("seek(_)", seek_relative),
    ApiRegistry::on_instance("seek(_,_)", seek),
    ApiRegistry::on_instance("tell()", tell),
    ApiRegistry::on_instance("close()", close),
];

pub const CLASS: ApiClass = ApiClass {
    name: NAME,
    methods: &METHODS,
    foreign: Some(ForeignClassMethods {
        constructor: "load(_,_)",
        allocate,
        finalize: finalize_resource::<OpenFile>,
    }),
};

/// A file opened by a script. Reads go through the buffer; writes first
/// drop it so they land at the position the script sees.
#[derive(Debug)]
pub struct OpenFile {
    inner: BufReader<File>,
}

impl OpenFile {
    fn sync_position(&mut self) -> std::io::Result<()> {
        let pos = self.inner.stream_position()?;
        self.inner.seek(SeekFrom::Start(pos))?;
        Ok(())
    }
}

/// `fopen`-style mode string to open options. `b` is accepted and ignored.
fn open_options(mode: &str) -> Option<OpenOptions> {
    let mut opts = OpenOptions::new();
    match mode.replace('b', "").as_str() {
        "r" => opts.read(true),
        "w" => opts.write(true).create(true).truncate(true),
        "a" => opts.append(true).create(true),
        "r+" => opts.read(true).write(true),
        "w+" => opts.read(true).write(true).create(true).truncate(true),
        "a+" => opts.read(true).append(true).create(true),
        _ => return None,
    };
    Some(opts)
}

fn allocate(_: &mut HostContext, slots: &mut CallSlots) -> ApiResult<Box<dyn Any>> {
    let path = slots.check_string(1)?;
    let mode = slots.check_string(2)?;
    let opts =
        open_options(mode).ok_or_else(|| ApiError::Invalid(format!("invalid file mode '{mode}'")))?;
    let file = opts
        .open(path)
        .map_err(|e| ApiError::io("Failed to open file", e))?;
    log::debug!("opened {path} with mode {mode}");
    Ok(Box::new(Resource::open(OpenFile {
        inner: BufReader::new(file),
    })))
}

fn with_file<R>(
    slots: &CallSlots,
    action: &'static str,
    f: impl FnOnce(&mut OpenFile) -> ApiResult<R>,
) -> ApiResult<R> {
    slots.check_foreign(0)?.with_open(NAME, action, f)
}

fn io_err(e: std::io::Error) -> ApiError {
    ApiError::io("file error", e)
}

/// Up to `n` bytes; null at end of file
fn read(_: &mut HostContext, slots: &mut CallSlots) -> ApiResult<()> {
    let n = slots.check_num(1)?.max(0.0) as u64;
    let bytes = with_file(slots, "read from", |file| {
        let mut buf = Vec::new();
        file.inner
            .by_ref()
            .take(n)
            .read_to_end(&mut buf)
            .map_err(io_err)?;
        Ok(buf)
    })?;

    if bytes.is_empty() && n > 0 {
        slots.set_null();
    } else {
        slots.set_string(String::from_utf8_lossy(&bytes));
    }
    Ok(())
}

/// Next line without its terminator; null at end of file
fn read_line(_: &mut HostContext, slots: &mut CallSlots) -> ApiResult<()> {
    let line = with_file(slots, "read line from", |file| {
        let mut buf = Vec::new();
        let read = file.inner.read_until(b'\n', &mut buf).map_err(io_err)?;
        if read == 0 {
            return Ok(None);
        }
        if buf.ends_with(b"\n") {
            buf.pop();
            if buf.ends_with(b"\r") {
                buf.pop();
            }
        }
        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    })?;
    slots.set(0, Value::from(line));
    Ok(())
}

fn write(_: &mut HostContext, slots: &mut CallSlots) -> ApiResult<()> {
    let text = slots.check_string(1)?;
    let written = with_file(slots, "write to", |file| {
        file.sync_position().map_err(io_err)?;
        let out = file.inner.get_mut();
        out.write_all(text.as_bytes()).map_err(io_err)?;
        Ok(text.len())
    })?;
    slots.set_num(written as f64);
    Ok(())
}

fn seek_to(slots: &CallSlots, origin: usize, offset: f64) -> ApiResult<()> {
    let offset = offset as i64;
    let target = match SEEK_ORIGINS[origin] {
        "set" => SeekFrom::Start(u64::try_from(offset).map_err(|_| {
            ApiError::Invalid(format!("can't seek to negative offset {offset}"))
        })?),
        "end" => SeekFrom::End(offset),
        _ => SeekFrom::Current(offset),
    };
    with_file(slots, "seek through a", |file| {
        file.inner.seek(target).map_err(io_err)?;
        Ok(())
    })
}

/// `seek(origin, offset)`
fn seek(_: &mut HostContext, slots: &mut CallSlots) -> ApiResult<()> {
    let origin = slots.check_option(1, Some("cur"), &SEEK_ORIGINS)?;
    let offset = slots.check_num(2)?;
    seek_to(slots, origin, offset)?;
    slots.set_null();
    Ok(())
}

/// `seek(offset)`, from the current position
fn seek_relative(_: &mut HostContext, slots: &mut CallSlots) -> ApiResult<()> {
    let offset = slots.check_num(1)?;
    let origin = slots.check_option(2, Some("cur"), &SEEK_ORIGINS)?;
    seek_to(slots, origin, offset)?;
    slots.set_null();
    Ok(())
}

fn tell(_: &mut HostContext, slots: &mut CallSlots) -> ApiResult<()> {
    let pos = with_file(slots, "tell position of a", |file| {
        file.inner.stream_position().map_err(io_err)
    })?;
    slots.set_num(pos as f64);
    Ok(())
}

fn close(_: &mut HostContext, slots: &mut CallSlots) -> ApiResult<()> {
    let handle = slots.check_foreign(0)?;
    let file = handle.with_resource(NAME, |res: &mut Resource<OpenFile>| res.close(NAME))?;
    drop(file);
    slots.set_null();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::testing::headless_host;
    use proptest::prelude::*;
    use std::fs;

    struct Harness {
        host: HostContext,
        file: Value,
    }

    impl Harness {
        fn open(path: &std::path::Path, mode: &str) -> ApiResult<Self> {
            let mut host = headless_host(Vec::new());
            let methods = CLASS.foreign.expect("foreign class");
            let mut slots = CallSlots::for_static(vec![
                Value::from(path.to_str().unwrap()),
                Value::from(mode),
            ]);
            let handle = methods.construct(NAME, &mut host, &mut slots)?;
            Ok(Self {
                host,
                file: Value::Foreign(handle),
            })
        }

        fn call(&mut self, signature: &str, args: Vec<Value>) -> ApiResult<Value> {
            let entry = METHODS
                .iter()
                .find(|m| m.signature == signature)
                .expect("registered");
            let mut slots = CallSlots::new(self.file.clone(), args);
            (entry.func)(&mut self.host, &mut slots)?;
            Ok(slots.into_return())
        }
    }

    #[test]
    fn seek_set_then_tell_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        let mut f = Harness::open(&path, "w+").unwrap();

        let written = f.call("write(_)", vec![Value::from("0123456789")]).unwrap();
        assert_eq!(written, Value::from(10));
        assert_eq!(f.call("tell()", Vec::new()).unwrap(), Value::from(10));

        f.call("seek(_,_)", vec![Value::from("set"), Value::from(4)])
            .unwrap();
        assert_eq!(f.call("tell()", Vec::new()).unwrap(), Value::from(4));
        assert_eq!(f.call("read(_)", vec![Value::from(3)]).unwrap(), Value::from("456"));

        f.call("seek(_)", vec![Value::from(-2)]).unwrap();
        assert_eq!(f.call("tell()", Vec::new()).unwrap(), Value::from(5));

        f.call("seek(_,_)", vec![Value::from("end"), Value::from(-1)])
            .unwrap();
        assert_eq!(f.call("read(_)", vec![Value::from(5)]).unwrap(), Value::from("9"));
        assert_eq!(f.call("read(_)", vec![Value::from(5)]).unwrap(), Value::Null);
    }

    #[test]
    fn write_after_buffered_read_lands_at_logical_position() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mixed.txt");
        fs::write(&path, "abcdef").unwrap();

        let mut f = Harness::open(&path, "r+").unwrap();
        assert_eq!(f.call("read(_)", vec![Value::from(2)]).unwrap(), Value::from("ab"));
        f.call("write(_)", vec![Value::from("XY")]).unwrap();
        f.call("close()", Vec::new()).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "abXYef");
    }

    #[test]
    fn read_line_strips_terminators() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lines.txt");
        fs::write(&path, "one\r\ntwo\nlast").unwrap();

        let mut f = Harness::open(&path, "rb").unwrap();
        let lines: Vec<Value> = (0..4)
            .map(|_| f.call("read_line()", Vec::new()).unwrap())
            .collect();
        assert_eq!(
            lines,
            vec![
                Value::from("one"),
                Value::from("two"),
                Value::from("last"),
                Value::Null
            ]
        );
    }

    #[test]
    fn closed_file_rejects_every_use() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.txt");
        let mut f = Harness::open(&path, "w").unwrap();
        f.call("close()", Vec::new()).unwrap();

        let cases = [
            ("read(_)", vec![Value::from(1)], "Can't read from closed File"),
            ("read_line()", Vec::new(), "Can't read line from closed File"),
            ("write(_)", vec![Value::from("x")], "Can't write to closed File"),
            (
                "seek(_,_)",
                vec![Value::from("set"), Value::from(0)],
                "Can't seek through a closed File",
            ),
            ("tell()", Vec::new(), "Can't tell position of a closed File"),
            ("close()", Vec::new(), "File is already closed"),
        ];
        for (signature, args, message) in cases {
            let err = f.call(signature, args).unwrap_err();
            assert_eq!(err.to_string(), message);
        }
    }

    #[test]
    fn open_failures_abort_construction() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");

        let err = Harness::open(&missing, "r").err().unwrap();
        assert!(err.to_string().starts_with("Failed to open file: "));

        let err = Harness::open(&missing, "q").err().unwrap();
        assert_eq!(err.to_string(), "invalid file mode 'q'");
        assert!(!missing.exists());
    }

    #[test]
    fn negative_absolute_seek_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut f = Harness::open(&dir.path().join("s.txt"), "w+").unwrap();
        let err = f
            .call("seek(_,_)", vec![Value::from("set"), Value::from(-1)])
            .unwrap_err();
        assert!(matches!(err, ApiError::Invalid(_)));
        let err = f
            .call("seek(_,_)", vec![Value::from("sideways"), Value::from(0)])
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid option 'sideways'");
    }

    #[test]
    fn append_mode_writes_at_end() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        fs::write(&path, "start;").unwrap();
        let mut f = Harness::open(&path, "a").unwrap();
        f.call("write(_)", vec![Value::from("more")]).unwrap();
        drop(f);
        assert_eq!(fs::read_to_string(&path).unwrap(), "start;more");
    }

    proptest! {
        #[test]
        fn any_seek_offset_aborts_or_moves(origin in 0usize..3, offset in proptest::num::f64::ANY) {
            let dir = tempfile::tempdir().unwrap();
            let mut f = Harness::open(&dir.path().join("seek.bin"), "w+").unwrap();
            f.call("write(_)", vec![Value::from("0123456789")]).unwrap();

            let args = vec![Value::from(SEEK_ORIGINS[origin]), Value::Num(offset)];
            if f.call("seek(_,_)", args).is_ok() {
                prop_assert!(matches!(f.call("tell()", Vec::new()), Ok(Value::Num(_))));
            }
            // the object stays usable either way
            f.call("seek(_,_)", vec![Value::from("set"), Value::from(0)]).unwrap();
            prop_assert_eq!(f.call("tell()", Vec::new()).unwrap(), Value::from(0));
        }
    }
}

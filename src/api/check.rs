//! Argument contract checks.
//!
//! Every handler runs its arguments through one of these before touching
//! them. A mismatch returns an [`ApiError`] and never hands back data.

use std::collections::BTreeMap;

use super::error::{ApiError, ApiResult};
use super::foreign::ForeignHandle;
use super::slots::CallSlots;
use super::value::{SlotType, Value};

impl CallSlots {
    fn check_type(&self, slot: usize, expected: SlotType) -> ApiResult<&Value> {
        let value = self.get(slot);
        let got = value.slot_type();
        if got != expected {
            return Err(ApiError::TypeMismatch {
                slot,
                expected,
                got,
            });
        }
        Ok(value)
    }

    pub fn check_bool(&self, slot: usize) -> ApiResult<bool> {
        match self.check_type(slot, SlotType::Bool)? {
            Value::Bool(b) => Ok(*b),
            _ => unreachable!("category checked"),
        }
    }

    pub fn check_num(&self, slot: usize) -> ApiResult<f64> {
        match self.check_type(slot, SlotType::Num)? {
            Value::Num(n) => Ok(*n),
            _ => unreachable!("category checked"),
        }
    }

    pub fn check_list(&self, slot: usize) -> ApiResult<&[Value]> {
        match self.check_type(slot, SlotType::List)? {
            Value::List(items) => Ok(items),
            _ => unreachable!("category checked"),
        }
    }

    pub fn check_map(&self, slot: usize) -> ApiResult<&BTreeMap<String, Value>> {
        match self.check_type(slot, SlotType::Map)? {
            Value::Map(map) => Ok(map),
            _ => unreachable!("category checked"),
        }
    }

    pub fn check_null(&self, slot: usize) -> ApiResult<()> {
        self.check_type(slot, SlotType::Null).map(|_| ())
    }

    pub fn check_string(&self, slot: usize) -> ApiResult<&str> {
        match self.check_type(slot, SlotType::String)? {
            Value::Str(s) => Ok(s),
            _ => unreachable!("category checked"),
        }
    }

    pub fn check_foreign(&self, slot: usize) -> ApiResult<&ForeignHandle> {
        match self.check_type(slot, SlotType::Foreign)? {
            Value::Foreign(handle) => Ok(handle),
            _ => unreachable!("category checked"),
        }
    }

    pub fn check_unknown(&self, slot: usize) -> ApiResult<()> {
        self.check_type(slot, SlotType::Unknown).map(|_| ())
    }

    /// Resolve an optional string argument against a whitelist.
    ///
    /// A null or absent slot falls back to `default`; anything else must be
    /// a string. Returns the index of the matching entry in `options`.
    pub fn check_option(
        &self,
        slot: usize,
        default: Option<&str>,
        options: &[&str],
    ) -> ApiResult<usize> {
        let name = if self.get(slot).is_null() {
            default.ok_or(ApiError::MissingOption)?
        } else {
            self.check_string(slot)?
        };

        options
            .iter()
            .position(|opt| *opt == name)
            .ok_or_else(|| ApiError::InvalidOption(name.to_string()))
    }
}

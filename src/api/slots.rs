//! The register file a foreign call works against.
//!
//! Slot 0 holds the receiver on entry (for instance methods) and the return
//! value on exit. Slots 1..N are the positional arguments. Reading past the
//! end yields `null`, which is how absent optional arguments look.

use std::collections::BTreeMap;

use super::value::{SlotType, Value};

#[derive(Debug, Clone)]
pub struct CallSlots {
    slots: Vec<Value>,
    absent: Value,
}

impl CallSlots {
    /// Slots for an instance call: receiver in slot 0
    pub fn new(receiver: Value, args: Vec<Value>) -> Self {
        let mut slots = Vec::with_capacity(args.len() + 1);
        slots.push(receiver);
        slots.extend(args);
        Self {
            slots,
            absent: Value::Null,
        }
    }

    /// Slots for a static call: slot 0 starts out null
    pub fn for_static(args: Vec<Value>) -> Self {
        Self::new(Value::Null, args)
    }

    pub fn count(&self) -> usize {
        self.slots.len()
    }

    pub fn get(&self, slot: usize) -> &Value {
        self.slots.get(slot).unwrap_or(&self.absent)
    }

    pub fn slot_type(&self, slot: usize) -> SlotType {
        self.get(slot).slot_type()
    }

    pub fn set(&mut self, slot: usize, value: Value) {
        if slot >= self.slots.len() {
            self.slots.resize(slot + 1, Value::Null);
        }
        self.slots[slot] = value;
    }

    pub fn set_null(&mut self) {
        self.set(0, Value::Null);
    }

    pub fn set_bool(&mut self, b: bool) {
        self.set(0, Value::Bool(b));
    }

    pub fn set_num(&mut self, n: f64) {
        self.set(0, Value::Num(n));
    }

    pub fn set_string(&mut self, s: impl Into<String>) {
        self.set(0, Value::Str(s.into()));
    }

    pub fn set_list(&mut self, items: Vec<Value>) {
        self.set(0, Value::List(items));
    }

    pub fn set_map(&mut self, map: BTreeMap<String, Value>) {
        self.set(0, Value::Map(map));
    }

    /// Consume the slots, yielding whatever the handler left in slot 0
    pub fn into_return(mut self) -> Value {
        if self.slots.is_empty() {
            Value::Null
        } else {
            self.slots.swap_remove(0)
        }
    }
}

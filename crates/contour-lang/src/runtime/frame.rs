use std::rc::Rc;

use crate::context::{Activation, CallSite};
use crate::options::Options;
use crate::runtime::value::Value;

/// Activation record for one dynamic call: `nslots` positional bindings,
/// the running closure's captured values, and the caller that started it.
pub struct Frame<'a> {
    slots: Vec<Option<Value>>,
    nonlocals: Rc<[Value]>,
    parent: Option<&'a Frame<'a>>,
    options: &'a Options,
    call_site: CallSite,
    depth: usize,
}

impl<'a> Frame<'a> {
    pub fn make(
        nslots: usize,
        nonlocals: Rc<[Value]>,
        parent: Option<&'a Frame<'a>>,
        options: &'a Options,
        call_site: CallSite,
    ) -> Self {
        let depth = parent.map_or(0, |p| p.depth + 1);
        Self { slots: vec![None; nslots], nonlocals, parent, options, call_site, depth }
    }

    pub fn get(&self, slot: usize) -> Option<&Value> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    pub fn set(&mut self, slot: usize, value: Value) {
        self.slots[slot] = Some(value);
    }

    pub fn nonlocal(&self, index: usize) -> Option<&Value> {
        self.nonlocals.get(index)
    }

    pub fn options(&self) -> &'a Options { self.options }
    pub fn depth(&self) -> usize { self.depth }
    pub fn len(&self) -> usize { self.slots.len() }
    pub fn is_empty(&self) -> bool { self.slots.is_empty() }
}

impl Activation for Frame<'_> {
    fn call_site(&self) -> &CallSite { &self.call_site }
    fn caller(&self) -> Option<&Self> { self.parent }
}

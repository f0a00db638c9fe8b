use std::fmt;

use rustc_hash::FxHashMap;

use crate::runtime::atom::Atom;
use crate::runtime::value::Value;

/// An immutable mapping from field names to values.
#[derive(Debug, Clone, Default)]
pub struct Record {
    fields: FxHashMap<Atom, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later entries with a repeated name replace earlier ones.
    pub fn from_fields(fields: impl IntoIterator<Item = (Atom, Value)>) -> Self {
        Self { fields: fields.into_iter().collect() }
    }

    /// `None` when the field is not present.
    pub fn getfield(&self, name: &Atom) -> Option<Value> {
        self.fields.get(name).cloned()
    }

    /// Borrowing lookup, for views whose lifetime is tied to the record.
    pub fn field(&self, name: &Atom) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn has_field(&self, name: &Atom) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize { self.fields.len() }
    pub fn is_empty(&self) -> bool { self.fields.is_empty() }

    /// Field names in textual order.
    pub fn field_names(&self) -> Vec<Atom> {
        let mut names: Vec<Atom> = self.fields.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn equals(&self, other: &Record) -> bool {
        self.fields.len() == other.fields.len()
            && self.fields.iter().all(|(k, v)| {
                other.fields.get(k).is_some_and(|w| v.equals(w))
            })
    }

    /// Textual representation, fields in name order.
    pub fn print(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        out.write_str("{")?;
        for (i, name) in self.field_names().iter().enumerate() {
            if i > 0 { out.write_str(", ")?; }
            write!(out, "{name}: {}", self.fields[name])?;
        }
        out.write_str("}")
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.print(f)
    }
}

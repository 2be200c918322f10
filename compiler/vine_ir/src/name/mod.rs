//! Interned identifiers.
//!
//! Every identifier and string literal is interned once by the lexer; the
//! parser and evaluator then compare and hash plain `u32`s.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

/// Interned string identifier.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
#[repr(transparent)]
pub struct Name(u32);

impl Name {
    /// Pre-interned empty string.
    pub const EMPTY: Name = Name(0);

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self.0)
    }
}

struct InternTable {
    map: FxHashMap<&'static str, Name>,
    strings: Vec<&'static str>,
}

/// Thread-safe string interner.
///
/// Interned strings are leaked for a `'static` lifetime; the interner lives
/// as long as the runtime that owns it.
pub struct StringInterner {
    table: RwLock<InternTable>,
}

/// Interner shared between the lexer, the evaluator and task threads.
pub type SharedInterner = Arc<StringInterner>;

impl StringInterner {
    pub fn new() -> Self {
        let mut map = FxHashMap::default();
        map.insert("", Name::EMPTY);
        StringInterner {
            table: RwLock::new(InternTable {
                map,
                strings: vec![""],
            }),
        }
    }

    /// Create an interner ready to be shared.
    pub fn shared() -> SharedInterner {
        Arc::new(Self::new())
    }

    /// Intern a string, returning its `Name`.
    pub fn intern(&self, s: &str) -> Name {
        if let Some(&name) = self.table.read().map.get(s) {
            return name;
        }

        let mut table = self.table.write();
        // Another thread may have won the race between the two locks.
        if let Some(&name) = table.map.get(s) {
            return name;
        }
        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        let name = Name(u32::try_from(table.strings.len()).unwrap_or(u32::MAX));
        table.strings.push(leaked);
        table.map.insert(leaked, name);
        name
    }

    /// Look up the text behind a `Name`.
    ///
    /// Names from another interner resolve to the empty string.
    pub fn lookup(&self, name: Name) -> &'static str {
        self.table
            .read()
            .strings
            .get(name.0 as usize)
            .copied()
            .unwrap_or("")
    }

    /// Number of interned strings, including the empty string.
    pub fn len(&self) -> usize {
        self.table.read().strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;

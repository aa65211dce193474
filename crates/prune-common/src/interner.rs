//! String interning for identifier deduplication.
//!
//! Identifiers, callee names, and type names are interned once per arena so
//! that equivalence checks compare `Atom`s instead of string contents.

use rustc_hash::FxHashMap;

/// Handle to an interned string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom(u32);

impl Atom {
    /// Sentinel for "no atom" slots.
    pub const NONE: Atom = Atom(u32::MAX);

    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }
}

/// Append-only string interner.
#[derive(Debug, Default)]
pub struct Interner {
    map: FxHashMap<Box<str>, Atom>,
    strings: Vec<Box<str>>,
}

impl Interner {
    pub fn new() -> Interner {
        Interner::default()
    }

    /// Intern a string, returning its atom. Repeated calls with the same
    /// text return the same atom.
    pub fn intern(&mut self, text: &str) -> Atom {
        if let Some(&atom) = self.map.get(text) {
            return atom;
        }
        let atom = Atom(self.strings.len() as u32);
        let boxed: Box<str> = text.into();
        self.strings.push(boxed.clone());
        self.map.insert(boxed, atom);
        atom
    }

    /// Look up an already-interned string without inserting.
    pub fn get(&self, text: &str) -> Option<Atom> {
        self.map.get(text).copied()
    }

    /// Resolve an atom back to its text.
    ///
    /// `Atom::NONE` and out-of-range atoms resolve to the empty string so
    /// callers never have to handle a missing-name panic path.
    pub fn resolve(&self, atom: Atom) -> &str {
        if atom.is_none() {
            return "";
        }
        self.strings
            .get(atom.0 as usize)
            .map_or("", |s| s.as_ref())
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_dedupes() {
        let mut interner = Interner::new();
        let a = interner.intern("x");
        let b = interner.intern("y");
        let c = interner.intern("x");
        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(interner.resolve(a), "x");
        assert_eq!(interner.resolve(b), "y");
    }

    #[test]
    fn none_resolves_to_empty() {
        let interner = Interner::new();
        assert_eq!(interner.resolve(Atom::NONE), "");
    }
}

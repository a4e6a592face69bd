//! Symbol module - String interning for pattern names.
//!
//! Variable, bucket, and label names recur constantly during
//! backtracking; interning them once at compile time turns every
//! environment lookup into a `u32` comparison.
//!
//! Unlike a compiler-wide interner, a Tendril [`Interner`] is owned by a
//! single compiled program: patterns are small and programs are
//! immutable, so the table lives and dies with the `Program` and no
//! global synchronization is needed.
//!
//! # Examples
//!
//! ```
//! use tendril_util::Interner;
//!
//! let mut interner = Interner::new();
//! let a = interner.intern("x");
//! let b = interner.intern("x");
//! let c = interner.intern("y");
//!
//! assert_eq!(a, b);
//! assert_ne!(a, c);
//! assert_eq!(interner.resolve(a), "x");
//! ```

use rustc_hash::FxHashMap;

/// A compact (4-byte) handle to an interned name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

impl Symbol {
    /// The raw table index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// An owned string-interning table.
#[derive(Clone, Debug, Default)]
pub struct Interner {
    map: FxHashMap<String, Symbol>,
    strings: Vec<String>,
}

impl Interner {
    /// Create an empty interner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a name, returning its symbol. Interning the same string
    /// twice returns the same symbol.
    pub fn intern(&mut self, name: &str) -> Symbol {
        if let Some(&sym) = self.map.get(name) {
            return sym;
        }
        let sym = Symbol(self.strings.len() as u32);
        self.strings.push(name.to_string());
        self.map.insert(name.to_string(), sym);
        sym
    }

    /// Look up a symbol without interning.
    pub fn get(&self, name: &str) -> Option<Symbol> {
        self.map.get(name).copied()
    }

    /// Resolve a symbol back to its string.
    ///
    /// # Panics
    ///
    /// Panics if the symbol was produced by a different interner.
    pub fn resolve(&self, sym: Symbol) -> &str {
        &self.strings[sym.index()]
    }

    /// Number of distinct interned names.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Returns true if nothing has been interned.
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

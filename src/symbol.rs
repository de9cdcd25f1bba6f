use lazy_static::lazy_static;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;

lazy_static! {
    static ref SYMBOLS: Mutex<HashSet<&'static str>> = Mutex::new(HashSet::new());
}

/// An interned name.
///
/// Every distinct text is allocated exactly once for the lifetime of the
/// process, so equality and hashing work on the address alone.
#[derive(Copy, Clone)]
pub struct Symbol {
    name: &'static str,
}

impl Symbol {
    pub fn new<T: AsRef<str>>(name: T) -> Self {
        let name = name.as_ref();
        let mut table = SYMBOLS.lock().expect("symbol table poisoned");
        if let Some(&interned) = table.get(name) {
            return Symbol { name: interned };
        }
        let interned: &'static str = Box::leak(name.to_string().into_boxed_str());
        table.insert(interned);
        Symbol { name: interned }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.name, other.name)
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.name.as_ptr() as usize).hash(state);
    }
}

impl PartialEq<str> for Symbol {
    fn eq(&self, s: &str) -> bool {
        self.name == s
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Symbol::new(s)
    }
}

impl std::fmt::Debug for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "'{}", self.name)
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

use crate::symbol::Symbol;
use crate::value::Value;
use std::cell::{self, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

/// One frame of bindings plus the frame it is nested in.
pub struct Environment {
    map: HashMap<Symbol, Value>,
    parent: Option<EnvRef>,
}

impl Environment {
    pub fn new(parent: Option<EnvRef>) -> Environment {
        Environment {
            map: Default::default(),
            parent,
        }
    }

    pub fn lookup_local(&self, key: &Symbol) -> Option<&Value> {
        self.map.get(key)
    }

    pub fn insert<K: Into<Symbol>>(&mut self, key: K, value: Value) {
        self.map.insert(key.into(), value);
    }

    pub fn keys(&self) -> impl Iterator<Item = &Symbol> {
        self.map.keys()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Shared handle to an environment frame.
///
/// Frames are shared between the activation that created them and every
/// closure created inside, so they live as long as the longest holder.
#[derive(Clone)]
pub struct EnvRef(Rc<RefCell<Environment>>);

pub type EnvTmpRef<'a> = cell::Ref<'a, Environment>;
pub type EnvMutRef<'a> = cell::RefMut<'a, Environment>;

impl From<Environment> for EnvRef {
    fn from(env: Environment) -> Self {
        EnvRef(Rc::new(RefCell::new(env)))
    }
}

impl EnvRef {
    /// A frame without parent.
    pub fn root() -> Self {
        Environment::new(None).into()
    }

    pub fn child(&self) -> Self {
        Environment::new(Some(self.clone())).into()
    }

    pub fn borrow(&self) -> EnvTmpRef {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> EnvMutRef {
        self.0.borrow_mut()
    }

    pub fn ptr_eq(&self, other: &EnvRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Bind `key` in this frame, replacing an existing binding of the frame.
    pub fn define<K: Into<Symbol>>(&self, key: K, value: Value) {
        self.borrow_mut().insert(key, value);
    }

    /// The frame that binds `key`, searching outwards from this one.
    fn find_frame(&self, key: &Symbol) -> Option<EnvRef> {
        let mut env = self.clone();
        loop {
            let parent = {
                let frame = env.borrow();
                if frame.map.contains_key(key) {
                    break;
                }
                frame.parent.clone()
            };
            env = parent?;
        }
        Some(env)
    }

    pub fn lookup(&self, key: &Symbol) -> Option<Value> {
        let frame = self.find_frame(key)?;
        let value = frame.borrow().lookup_local(key).cloned();
        value
    }

    /// Rebind `key` in the nearest frame that binds it. Returns `None` if
    /// no frame does.
    pub fn set(&self, key: &Symbol, value: Value) -> Option<()> {
        let frame = self.find_frame(key)?;
        frame.borrow_mut().insert(*key, value);
        Some(())
    }

    /// Every name visible from this frame, innermost first, without duplicates.
    pub fn all_keys(&self) -> Vec<Symbol> {
        let mut keys: Vec<Symbol> = vec![];
        let mut env = Some(self.clone());
        while let Some(frame) = env {
            let frame = frame.borrow();
            let shadowed: Vec<Symbol> = frame
                .keys()
                .filter(|k| !keys.contains(*k))
                .cloned()
                .collect();
            keys.extend(shadowed);
            env = frame.parent.clone();
        }
        keys
    }
}

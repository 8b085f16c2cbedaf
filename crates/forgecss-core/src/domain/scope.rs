//! Variable and mixin scoping.
//!
//! Frames form a parent-linked chain. [`ScopeStack::push`] creates a child
//! of the innermost frame and [`ScopeStack::pop`] discards it together with
//! everything it bound. Lookups walk from the innermost frame outwards.
//!
//! Mixins capture the frame they were declared in, so an include can run its
//! body in a child of that frame ([`ScopeStack::enter`]) and then return to
//! the caller's chain ([`ScopeStack::leave`]).

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::domain::{ast::MixinDecl, error::DomainError, value::Value};

type FrameRef = Rc<RefCell<Frame>>;

#[derive(Default)]
struct Frame {
    variables: HashMap<String, Value>,
    mixins: HashMap<String, MixinEntry>,
    parent: Option<FrameRef>,
}

struct MixinEntry {
    decl: Rc<MixinDecl>,
    // The declaring frame owns this entry, so a strong pointer would cycle.
    defined_in: Weak<RefCell<Frame>>,
}

/// A mixin resolved by name, together with the scope it was declared in.
#[derive(Clone)]
pub struct ResolvedMixin {
    pub decl: Rc<MixinDecl>,
    pub scope: ScopeHandle,
}

/// Opaque pointer to a frame, used to switch the active chain.
#[derive(Clone)]
pub struct ScopeHandle {
    frame: FrameRef,
    depth: usize,
}

/// The evaluator's scope chain. Starts with a single root frame.
pub struct ScopeStack {
    current: FrameRef,
    depth: usize,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self {
            current: Rc::new(RefCell::new(Frame::default())),
            depth: 0,
        }
    }

    /// Number of frames above the root frame.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Create a child frame visible to nested execution.
    pub fn push(&mut self) {
        let child = Frame {
            parent: Some(Rc::clone(&self.current)),
            ..Frame::default()
        };
        self.current = Rc::new(RefCell::new(child));
        self.depth += 1;
    }

    /// Discard the innermost frame and everything it bound.
    pub fn pop(&mut self) -> Result<(), DomainError> {
        let parent = self
            .current
            .borrow()
            .parent
            .clone()
            .ok_or(DomainError::ScopeUnderflow)?;
        self.current = parent;
        self.depth -= 1;
        Ok(())
    }

    /// Bind (or overwrite) `name` in the innermost frame.
    pub fn set_variable(&mut self, name: impl Into<String>, value: Value) {
        self.current.borrow_mut().variables.insert(name.into(), value);
    }

    /// Innermost-first lookup.
    pub fn lookup(&self, name: &str) -> Result<Value, DomainError> {
        let mut frame = Some(Rc::clone(&self.current));
        while let Some(current) = frame {
            let borrowed = current.borrow();
            if let Some(value) = borrowed.variables.get(name) {
                return Ok(value.clone());
            }
            frame = borrowed.parent.clone();
        }
        Err(DomainError::UndefinedVariable {
            name: name.to_owned(),
        })
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.lookup(name).is_ok()
    }

    /// Register a mixin in the innermost frame.
    pub fn define_mixin(&mut self, decl: MixinDecl) {
        let entry = MixinEntry {
            decl: Rc::new(decl),
            defined_in: Rc::downgrade(&self.current),
        };
        let name = entry.decl.name.clone();
        self.current.borrow_mut().mixins.insert(name, entry);
    }

    /// Innermost-first mixin lookup.
    pub fn resolve_mixin(&self, name: &str) -> Result<ResolvedMixin, DomainError> {
        let mut frame = Some(Rc::clone(&self.current));
        let mut depth = self.depth;
        while let Some(current) = frame {
            let borrowed = current.borrow();
            if let Some(entry) = borrowed.mixins.get(name) {
                // The entry lives in `current`, so its declaring frame is alive.
                let defined_in = entry.defined_in.upgrade().unwrap_or_else(|| Rc::clone(&current));
                return Ok(ResolvedMixin {
                    decl: Rc::clone(&entry.decl),
                    scope: ScopeHandle {
                        frame: defined_in,
                        depth,
                    },
                });
            }
            frame = borrowed.parent.clone();
            depth = depth.saturating_sub(1);
        }
        Err(DomainError::UndefinedMixin {
            name: name.to_owned(),
        })
    }

    /// Make a fresh child of `scope` the innermost frame.
    ///
    /// Returns the caller's chain, which must be handed back to
    /// [`ScopeStack::leave`] once the nested body has finished.
    pub fn enter(&mut self, scope: &ScopeHandle) -> ScopeHandle {
        let saved = ScopeHandle {
            frame: Rc::clone(&self.current),
            depth: self.depth,
        };
        self.current = Rc::clone(&scope.frame);
        self.depth = scope.depth;
        self.push();
        saved
    }

    /// Restore a chain previously returned by [`ScopeStack::enter`].
    pub fn leave(&mut self, saved: ScopeHandle) {
        self.current = saved.frame;
        self.depth = saved.depth;
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ScopeStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeStack")
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for ResolvedMixin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedMixin")
            .field("name", &self.decl.name)
            .field("parameters", &self.decl.parameters)
            .finish_non_exhaustive()
    }
}

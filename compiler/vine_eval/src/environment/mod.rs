//! Lexical environments.
//!
//! Environments live in an [`EnvArena`] and are addressed by [`EnvRef`]
//! handles carrying a slot index and a generation. A frame's parent is a
//! handle too, so recycling a slot can never leave a dangling pointer.
//!
//! Child frames for blocks, loop iterations and calls are pooled: releasing
//! a frame clears it and puts its slot on a free list. Every `EnvRef` clone
//! shares the slot's pin, so a frame still reachable from a closure, a child
//! frame or a running task is parked on a detached list instead, and only
//! recycled by a later sweep once its last handle is gone.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use vine_ir::Name;

use crate::value::{Store, Value};
use crate::workspace::Workspace;

/// Source file an environment chain belongs to.
#[derive(Debug)]
pub struct ModuleContext {
    pub file: Arc<str>,
    pub source: Arc<str>,
    pub workspace: Workspace,
    /// Module files being loaded on the way to this one, itself included.
    pub imports: Vec<PathBuf>,
}

impl ModuleContext {
    pub fn new(
        file: impl Into<Arc<str>>,
        source: impl Into<Arc<str>>,
        workspace: Workspace,
    ) -> Self {
        ModuleContext {
            file: file.into(),
            source: source.into(),
            workspace,
            imports: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_imports(mut self, imports: Vec<PathBuf>) -> Self {
        self.imports = imports;
        self
    }

    /// Whether `path` is already being loaded further up this import chain.
    pub fn is_importing(&self, path: &Path) -> bool {
        self.imports.iter().any(|import| import == path)
    }
}

/// Why a scope operation failed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ScopeError {
    /// The name is already bound in the chain (or locally, for parameters).
    AlreadyDeclared,
    /// The name is bound nowhere in the chain.
    Undefined,
    /// The owning frame declared the name with `cst`.
    Constant,
    /// The target does not accept new bindings.
    ReadOnly,
}

/// A fallback scope consulted after the lexical chain, installed while
/// evaluating `object.(expr)`.
pub trait MountScope {
    fn lookup(&self, name: &str) -> Option<Value>;

    /// Bind `name` after it was found nowhere in the lexical chain.
    fn assign(&self, name: &str, value: Value) -> Result<(), ScopeError>;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct EnvId {
    index: u32,
    generation: u32,
}

/// Handle to a frame. Holding one keeps the frame from being recycled.
#[derive(Clone)]
pub struct EnvRef {
    id: EnvId,
    pin: Arc<()>,
}

impl EnvRef {
    #[inline]
    pub fn id(&self) -> EnvId {
        self.id
    }
}

impl std::fmt::Debug for EnvRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EnvRef({}#{})", self.id.index, self.id.generation)
    }
}

struct Frame {
    vars: FxHashMap<Name, Value>,
    consts: FxHashSet<Name>,
    parent: Option<EnvRef>,
    context: Arc<ModuleContext>,
    /// Created on first `expose`; only ever set on chain roots.
    exports: Option<Store>,
}

impl Frame {
    fn new(parent: Option<EnvRef>, context: Arc<ModuleContext>) -> Self {
        Frame {
            vars: FxHashMap::default(),
            consts: FxHashSet::default(),
            parent,
            context,
            exports: None,
        }
    }
}

struct Slot {
    generation: u32,
    frame: Option<Frame>,
    pin: Arc<()>,
    /// Parked on the detached list.
    released: bool,
}

/// Minimum detached count before a sweep is attempted.
const MIN_SWEEP: usize = 16;

struct ArenaInner {
    slots: Vec<Slot>,
    free: Vec<u32>,
    /// Released slots still pinned by outstanding handles.
    detached: Vec<u32>,
    next_sweep: usize,
}

impl ArenaInner {
    fn frame(&self, id: EnvId) -> Option<&Frame> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.frame.as_ref()
    }

    fn frame_mut(&mut self, id: EnvId) -> Option<&mut Frame> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.frame.as_mut()
    }

    /// The frame in the chain starting at `id` that binds `name`.
    fn owner(&self, id: EnvId, name: Name) -> Option<EnvId> {
        let mut current = Some(id);
        while let Some(id) = current {
            let frame = self.frame(id)?;
            if frame.vars.contains_key(&name) {
                return Some(id);
            }
            current = frame.parent.as_ref().map(EnvRef::id);
        }
        None
    }

    fn alloc(&mut self, frame: Frame) -> EnvRef {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.frame = Some(frame);
            slot.released = false;
            return EnvRef {
                id: EnvId {
                    index,
                    generation: slot.generation,
                },
                pin: slot.pin.clone(),
            };
        }
        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        let pin = Arc::new(());
        self.slots.push(Slot {
            generation: 0,
            frame: Some(frame),
            pin: pin.clone(),
            released: false,
        });
        EnvRef {
            id: EnvId {
                index,
                generation: 0,
            },
            pin,
        }
    }

    /// Clear a slot nobody references any more. Returns the frame so the
    /// caller can drop its values after unlocking.
    fn recycle(&mut self, index: u32) -> Option<Frame> {
        let slot = &mut self.slots[index as usize];
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(index);
        slot.frame.take()
    }

    /// Recycle detached slots whose handles are all gone, when the free
    /// list is empty and enough slots are parked. The returned frames must be
    /// dropped after unlocking.
    fn sweep(&mut self) -> Vec<Frame> {
        if !self.free.is_empty() || self.detached.len() < self.next_sweep {
            return Vec::new();
        }
        let detached = std::mem::take(&mut self.detached);
        let mut kept = Vec::with_capacity(detached.len());
        let mut cleared = Vec::new();
        for index in detached {
            if Arc::strong_count(&self.slots[index as usize].pin) == 1 {
                cleared.extend(self.recycle(index));
            } else {
                kept.push(index);
            }
        }
        tracing::debug!(
            recycled = cleared.len(),
            kept = kept.len(),
            "swept detached environments"
        );
        self.next_sweep = MIN_SWEEP.max(kept.len() * 2);
        self.detached = kept;
        cleared
    }
}

/// Snapshot of arena occupancy.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ArenaStats {
    pub slots: usize,
    pub free: usize,
    pub detached: usize,
    pub live: usize,
}

/// Owner of every environment frame of one runtime.
pub struct EnvArena {
    inner: Mutex<ArenaInner>,
}

impl Default for EnvArena {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvArena {
    pub fn new() -> Self {
        EnvArena {
            inner: Mutex::new(ArenaInner {
                slots: Vec::new(),
                free: Vec::new(),
                detached: Vec::new(),
                next_sweep: MIN_SWEEP,
            }),
        }
    }

    /// A new chain root for a program, module or REPL session.
    pub fn root(&self, context: Arc<ModuleContext>) -> EnvRef {
        let (env, swept) = {
            let mut inner = self.inner.lock();
            let swept = inner.sweep();
            (inner.alloc(Frame::new(None, context)), swept)
        };
        drop(swept);
        env
    }

    /// A new frame whose parent is `parent`. It shares the parent's context.
    pub fn child(&self, parent: &EnvRef) -> EnvRef {
        let (env, swept) = {
            let mut inner = self.inner.lock();
            let swept = inner.sweep();
            let context = inner.frame(parent.id).map_or_else(
                || Arc::new(ModuleContext::new("", "", Workspace::default())),
                |frame| frame.context.clone(),
            );
            (
                inner.alloc(Frame::new(Some(parent.clone()), context)),
                swept,
            )
        };
        drop(swept);
        env
    }

    /// Give a frame back to the pool.
    ///
    /// The frame is cleared and recycled right away unless another handle
    /// still pins it, in which case it waits on the detached list.
    pub fn release(&self, env: EnvRef) {
        let EnvRef { id, pin } = env;
        drop(pin);
        let cleared = {
            let mut inner = self.inner.lock();
            let Some(slot) = inner.slots.get(id.index as usize) else {
                return;
            };
            if slot.generation != id.generation || slot.frame.is_none() || slot.released {
                return;
            }
            if Arc::strong_count(&slot.pin) == 1 {
                inner.recycle(id.index)
            } else {
                inner.slots[id.index as usize].released = true;
                inner.detached.push(id.index);
                None
            }
        };
        drop(cleared);
    }

    /// Look `name` up along the chain.
    pub fn get(&self, env: &EnvRef, name: Name) -> Option<Value> {
        let inner = self.inner.lock();
        let owner = inner.owner(env.id, name)?;
        inner.frame(owner)?.vars.get(&name).cloned()
    }

    /// Look `name` up in `env` only.
    pub fn get_local(&self, env: &EnvRef, name: Name) -> Option<Value> {
        self.inner.lock().frame(env.id)?.vars.get(&name).cloned()
    }

    /// Bind a new name. Fails if the name is bound anywhere in the chain.
    pub fn define(&self, env: &EnvRef, name: Name, value: Value) -> Result<(), ScopeError> {
        self.define_checked(env, name, value, false)
    }

    /// Like [`define`](Self::define), and the binding can never be reassigned.
    pub fn define_const(&self, env: &EnvRef, name: Name, value: Value) -> Result<(), ScopeError> {
        self.define_checked(env, name, value, true)
    }

    fn define_checked(
        &self,
        env: &EnvRef,
        name: Name,
        value: Value,
        constant: bool,
    ) -> Result<(), ScopeError> {
        let mut inner = self.inner.lock();
        if inner.owner(env.id, name).is_some() {
            return Err(ScopeError::AlreadyDeclared);
        }
        let frame = inner.frame_mut(env.id).ok_or(ScopeError::Undefined)?;
        frame.vars.insert(name, value);
        if constant {
            frame.consts.insert(name);
        }
        Ok(())
    }

    /// Bind a call parameter. Only `env` itself is checked, so a parameter
    /// may shadow an outer binding.
    pub fn define_passing(&self, env: &EnvRef, name: Name, value: Value) -> Result<(), ScopeError> {
        let mut inner = self.inner.lock();
        let frame = inner.frame_mut(env.id).ok_or(ScopeError::Undefined)?;
        if frame.vars.contains_key(&name) {
            return Err(ScopeError::AlreadyDeclared);
        }
        frame.vars.insert(name, value);
        Ok(())
    }

    /// Reassign the binding of `name` in the frame that owns it.
    pub fn set(&self, env: &EnvRef, name: Name, value: Value) -> Result<(), ScopeError> {
        let old = {
            let mut inner = self.inner.lock();
            let owner = inner.owner(env.id, name).ok_or(ScopeError::Undefined)?;
            let frame = inner.frame_mut(owner).ok_or(ScopeError::Undefined)?;
            if frame.consts.contains(&name) {
                return Err(ScopeError::Constant);
            }
            frame.vars.insert(name, value)
        };
        drop(old);
        Ok(())
    }

    /// Insert or overwrite `name` in `env` itself, skipping the chain walk.
    pub fn set_local(&self, env: &EnvRef, name: Name, value: Value) {
        let old = {
            let mut inner = self.inner.lock();
            inner
                .frame_mut(env.id)
                .and_then(|frame| frame.vars.insert(name, value))
        };
        drop(old);
    }

    /// Remove a local binding.
    pub fn delete(&self, env: &EnvRef, name: Name) -> Option<Value> {
        let mut inner = self.inner.lock();
        let frame = inner.frame_mut(env.id)?;
        frame.consts.remove(&name);
        frame.vars.remove(&name)
    }

    /// Local bindings of `env`, in no particular order.
    pub fn bindings(&self, env: &EnvRef) -> Vec<(Name, Value)> {
        self.inner.lock().frame(env.id).map_or_else(Vec::new, |frame| {
            frame
                .vars
                .iter()
                .map(|(name, value)| (*name, value.clone()))
                .collect()
        })
    }

    /// Visit local bindings. The arena stays locked during the visit, so
    /// `f` must not call back into it.
    pub fn for_each(&self, env: &EnvRef, mut f: impl FnMut(Name, &Value)) {
        if let Some(frame) = self.inner.lock().frame(env.id) {
            for (name, value) in &frame.vars {
                f(*name, value);
            }
        }
    }

    pub fn is_const(&self, env: &EnvRef, name: Name) -> bool {
        let inner = self.inner.lock();
        inner
            .owner(env.id, name)
            .and_then(|owner| inner.frame(owner))
            .is_some_and(|frame| frame.consts.contains(&name))
    }

    pub fn context(&self, env: &EnvRef) -> Option<Arc<ModuleContext>> {
        self.inner.lock().frame(env.id).map(|frame| frame.context.clone())
    }

    /// Export surface of the chain `env` belongs to, if anything was exposed.
    pub fn exports(&self, env: &EnvRef) -> Option<Store> {
        let inner = self.inner.lock();
        let root = Self::chain_root(&inner, env.id)?;
        inner.frame(root)?.exports.clone()
    }

    /// Export surface of the chain, created on first use.
    pub fn exports_or_create(&self, env: &EnvRef) -> Store {
        let mut inner = self.inner.lock();
        let Some(root) = Self::chain_root(&inner, env.id) else {
            return Store::new();
        };
        match inner.frame_mut(root) {
            Some(frame) => frame.exports.get_or_insert_with(Store::new).clone(),
            None => Store::new(),
        }
    }

    fn chain_root(inner: &ArenaInner, id: EnvId) -> Option<EnvId> {
        let mut current = id;
        loop {
            match &inner.frame(current)?.parent {
                Some(parent) => current = parent.id,
                None => return Some(current),
            }
        }
    }

    pub fn stats(&self) -> ArenaStats {
        let inner = self.inner.lock();
        ArenaStats {
            slots: inner.slots.len(),
            free: inner.free.len(),
            detached: inner.detached.len(),
            live: inner.slots.iter().filter(|slot| slot.frame.is_some()).count(),
        }
    }
}

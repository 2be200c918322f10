//! RAII release of pooled environments.

use std::ops::Deref;

use crate::environment::{EnvArena, EnvRef};

/// A child environment handed back to the arena when dropped, including
/// on early return through `?`.
pub(crate) struct ScopedEnv<'a> {
    arena: &'a EnvArena,
    env: Option<EnvRef>,
}

impl<'a> ScopedEnv<'a> {
    /// A fresh child of `parent`.
    pub fn child(arena: &'a EnvArena, parent: &EnvRef) -> Self {
        ScopedEnv {
            arena,
            env: Some(arena.child(parent)),
        }
    }

    /// Take over an environment created elsewhere.
    pub fn adopt(arena: &'a EnvArena, env: EnvRef) -> Self {
        ScopedEnv {
            arena,
            env: Some(env),
        }
    }
}

impl Deref for ScopedEnv<'_> {
    type Target = EnvRef;

    fn deref(&self) -> &EnvRef {
        // Only `None` while dropping.
        match &self.env {
            Some(env) => env,
            None => unreachable!("scoped environment used after release"),
        }
    }
}

impl Drop for ScopedEnv<'_> {
    fn drop(&mut self) {
        if let Some(env) = self.env.take() {
            self.arena.release(env);
        }
    }
}

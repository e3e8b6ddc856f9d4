//! Scoped process environment overrides.
//!
//! The environment is process-global, so every override goes through one
//! lock held for the lifetime of a [`ScopedEnv`]. Changes are undone in
//! reverse order when the scope drops, before the lock is released.

use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

fn lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

/// Exclusive handle on the process environment that restores every variable
/// it touched when dropped.
pub struct ScopedEnv {
    restore: Vec<(String, Option<String>)>,
    _guard: MutexGuard<'static, ()>,
}

impl ScopedEnv {
    /// Block until no other scope is active. A scope that panicked still
    /// restored its variables, so a poisoned lock is taken over.
    pub fn lock() -> Self {
        let guard = lock().lock().unwrap_or_else(PoisonError::into_inner);
        Self {
            restore: Vec::new(),
            _guard: guard,
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> &mut Self {
        self.remember(key);
        // SAFETY: mutation only happens while the scope lock is held.
        #[allow(unused_unsafe)]
        unsafe {
            std::env::set_var(key, value);
        }
        self
    }

    pub fn remove(&mut self, key: &str) -> &mut Self {
        self.remember(key);
        // SAFETY: mutation only happens while the scope lock is held.
        #[allow(unused_unsafe)]
        unsafe {
            std::env::remove_var(key);
        }
        self
    }

    fn remember(&mut self, key: &str) {
        self.restore.push((key.to_string(), std::env::var(key).ok()));
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        while let Some((key, previous)) = self.restore.pop() {
            // SAFETY: `_guard` is still held here; fields drop after this body.
            #[allow(unused_unsafe)]
            unsafe {
                match previous {
                    Some(value) => std::env::set_var(&key, value),
                    None => std::env::remove_var(&key),
                }
            }
        }
    }
}

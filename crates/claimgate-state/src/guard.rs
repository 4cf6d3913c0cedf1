use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use claimgate_core::error::ClaimError;

/// Whole-operation mutual exclusion for the engine.
///
/// Callers on other threads wait their turn. A call re-entering from the
/// thread that already holds the guard (a custodian calling back into the
/// engine mid-transfer) is refused with `ReentrantCall` instead of deadlocking.
#[derive(Default)]
pub struct CallGuard {
    gate: Mutex<()>,
    holder: Mutex<Option<ThreadId>>,
}

/// Proof that the current thread holds the guard. Releases on drop.
pub struct Entered<'a> {
    guard: &'a CallGuard,
    _gate: MutexGuard<'a, ()>,
}

impl CallGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&self) -> Result<Entered<'_>, ClaimError> {
        let me = thread::current().id();
        if *self.holder() == Some(me) {
            return Err(ClaimError::ReentrantCall);
        }
        // A panic mid-claim leaves the mutex poisoned; the data it protects is
        // `()`, so carrying on is safe.
        let gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        *self.holder() = Some(me);
        Ok(Entered { guard: self, _gate: gate })
    }

    pub fn is_held(&self) -> bool {
        self.holder().is_some()
    }

    fn holder(&self) -> MutexGuard<'_, Option<ThreadId>> {
        self.holder.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Entered<'_> {
    fn drop(&mut self) {
        *self.guard.holder() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn same_thread_reentry_rejected() {
        let guard = CallGuard::new();
        let _outer = guard.enter().unwrap();
        assert!(matches!(guard.enter(), Err(ClaimError::ReentrantCall)));
    }

    #[test]
    fn released_on_drop() {
        let guard = CallGuard::new();
        {
            let _e = guard.enter().unwrap();
            assert!(guard.is_held());
        }
        assert!(!guard.is_held());
        assert!(guard.enter().is_ok());
    }

    #[test]
    fn other_threads_are_serialized() {
        let guard = Arc::new(CallGuard::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let guard = Arc::clone(&guard);
                let inside = Arc::clone(&inside);
                std::thread::spawn(move || {
                    let _e = guard.enter().unwrap();
                    assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                    std::thread::sleep(std::time::Duration::from_millis(2));
                    inside.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
    }
}

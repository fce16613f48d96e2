//! A lazily computed value that is computed at most once.
//!
//! Useful for derived values attached to a handler's state, such as a
//! parsed template or a connection string built from configuration.

use parking_lot::Mutex;
use std::convert::Infallible;
use std::fmt;
use std::sync::OnceLock;

/// A value computed on first access and cached for the owner's lifetime.
///
/// Concurrent first accesses run the initializer exactly once; the other
/// callers block until it finishes and then observe the same value. A failed
/// initialization caches nothing, so the next access tries again.
///
/// # Example
///
/// ```rust
/// use protorpc_axum::Cached;
///
/// let greeting = Cached::new();
/// assert_eq!(greeting.get_or_init(|| "hello".to_string()), "hello");
/// // Already computed, the initializer is not run again
/// assert_eq!(greeting.get_or_init(|| unreachable!()), "hello");
/// ```
pub struct Cached<T> {
    value: OnceLock<T>,
    init: Mutex<()>,
}

impl<T> Cached<T> {
    pub fn new() -> Self {
        Self {
            value: OnceLock::new(),
            init: Mutex::new(()),
        }
    }

    /// The value, if it has been computed.
    pub fn get(&self) -> Option<&T> {
        self.value.get()
    }

    /// Get the value, computing it with `init` on first access.
    pub fn get_or_init<F>(&self, init: F) -> &T
    where
        F: FnOnce() -> T,
    {
        match self.get_or_try_init(|| Ok::<T, Infallible>(init())) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Get the value, computing it with a fallible `init` on first access.
    pub fn get_or_try_init<F, E>(&self, init: F) -> Result<&T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if let Some(value) = self.value.get() {
            return Ok(value);
        }

        let _guard = self.init.lock();
        // Another caller may have finished while we waited for the lock
        if let Some(value) = self.value.get() {
            return Ok(value);
        }
        let value = init()?;
        Ok(self.value.get_or_init(|| value))
    }

    /// Take the value out, leaving the cache empty.
    pub fn take(&mut self) -> Option<T> {
        self.value.take()
    }
}

impl<T> Default for Cached<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for Cached<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cached")
            .field("value", &self.value.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_computed_once() {
        let calls = AtomicUsize::new(0);
        let cached = Cached::new();
        for _ in 0..3 {
            let value = cached.get_or_init(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                42
            });
            assert_eq!(*value, 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_init_is_retried() {
        let cached: Cached<u32> = Cached::new();
        let err = cached.get_or_try_init(|| Err::<u32, _>("not yet")).unwrap_err();
        assert_eq!(err, "not yet");
        assert!(cached.get().is_none());

        let value = cached.get_or_try_init(|| Ok::<_, &str>(7)).unwrap();
        assert_eq!(*value, 7);
        assert_eq!(cached.get(), Some(&7));
    }

    #[test]
    fn test_take_resets() {
        let mut cached = Cached::new();
        cached.get_or_init(|| "first");
        assert_eq!(cached.take(), Some("first"));
        assert_eq!(*cached.get_or_init(|| "second"), "second");
    }

    #[test]
    fn test_concurrent_first_access_runs_init_once() {
        const THREADS: usize = 16;

        let cached = Arc::new(Cached::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let cached = cached.clone();
                let calls = calls.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    let value = cached.get_or_init(|| {
                        calls.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(20));
                        String::from("computed")
                    });
                    value.as_ptr() as usize
                })
            })
            .collect();

        let addresses: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(addresses.windows(2).all(|pair| pair[0] == pair[1]));
    }
}

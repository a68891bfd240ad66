//! One lazily built instance per type.
//!
//! A [`SingletonCell`] lives in a `static`; the type behind it implements
//! [`Singleton`] to say how it is built and what runs right after.
//!
//! ```ignore
//! static SETTINGS: SingletonCell<Settings> = SingletonCell::new();
//! let settings = SETTINGS.get();
//! ```

use std::sync::{Once, OnceLock};

/// A type with exactly one instance per [`SingletonCell`].
pub trait Singleton: Send + Sync + 'static {
    fn create() -> Self;

    /// Runs once, after the instance has been stored.
    fn post_init(&self) {}
}

/// Holder for a [`Singleton`].
pub struct SingletonCell<T> {
    value: OnceLock<T>,
    post_init: Once,
}

impl<T: Singleton> SingletonCell<T> {
    pub const fn new() -> Self {
        Self {
            value: OnceLock::new(),
            post_init: Once::new(),
        }
    }

    /// The instance, built on first access.
    ///
    /// Callers racing the first access block until `post_init` has finished.
    pub fn get(&self) -> &T {
        let value = self.value.get_or_init(T::create);
        self.post_init.call_once(|| value.post_init());
        value
    }

    /// Whether the instance has been built yet.
    pub fn is_initialized(&self) -> bool {
        self.value.get().is_some()
    }
}

impl<T: Singleton> Default for SingletonCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    static CREATED: AtomicUsize = AtomicUsize::new(0);
    static HOOKED: AtomicUsize = AtomicUsize::new(0);

    struct Counter {
        id: usize,
    }

    impl Singleton for Counter {
        fn create() -> Self {
            Self { id: CREATED.fetch_add(1, Ordering::SeqCst) }
        }

        fn post_init(&self) {
            HOOKED.fetch_add(1, Ordering::SeqCst);
        }
    }

    static COUNTER: SingletonCell<Counter> = SingletonCell::new();

    #[test]
    fn built_once_and_hooked_once() {
        assert!(!COUNTER.is_initialized());

        let handles: Vec<_> = (0..8).map(|_| std::thread::spawn(|| COUNTER.get().id)).collect();
        let ids: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(ids.iter().all(|&id| id == ids[0]));
        assert!(std::ptr::eq(COUNTER.get(), COUNTER.get()));
        assert_eq!(CREATED.load(Ordering::SeqCst), 1);
        assert_eq!(HOOKED.load(Ordering::SeqCst), 1);
    }
}

use once_cell::sync::OnceCell;
use std::fmt;

/// A function that only runs on its first call.
///
/// Later calls return the saved result and ignore their argument, which
/// makes an expensive or non-idempotent function cheap and idempotent.
/// [`Once::reset`] forgets the saved result so the next call runs again.
///
/// ```
/// use fnkit::combinators::once;
///
/// let mut add_three = once(|a: i32| a + 3);
/// assert_eq!(*add_three.call(3), 6);
/// assert_eq!(*add_three.call(9), 6);
///
/// add_three.reset();
/// assert_eq!(*add_three.call(9), 12);
/// ```
///
/// Concurrent first calls block until one of them has produced the value.
pub struct Once<F, T> {
    func: F,
    saved: OnceCell<T>,
}

impl<F, T> Once<F, T> {
    pub fn new(func: F) -> Self {
        Self {
            func,
            saved: OnceCell::new(),
        }
    }

    pub fn call<A>(&self, arg: A) -> &T
    where
        F: Fn(A) -> T,
    {
        self.saved.get_or_init(|| (self.func)(arg))
    }

    /// Call a zero-argument function.
    pub fn run(&self) -> &T
    where
        F: Fn() -> T,
    {
        self.saved.get_or_init(&self.func)
    }

    pub fn saved_result(&self) -> Option<&T> {
        self.saved.get()
    }

    /// Forget the saved result, returning it.
    pub fn reset(&mut self) -> Option<T> {
        self.saved.take()
    }
}

impl<F, T: fmt::Debug> fmt::Debug for Once<F, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Once")
            .field("saved", &self.saved.get())
            .finish_non_exhaustive()
    }
}

pub fn once<F, T>(func: F) -> Once<F, T> {
    Once::new(func)
}

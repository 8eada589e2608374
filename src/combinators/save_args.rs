use std::fmt;
use std::sync::Mutex;

/// A function that remembers the arguments of its most recent call.
///
/// Keep it in a struct field to get per-instance history: two owners each
/// see only their own last arguments. Several arguments are passed as a
/// tuple.
pub struct SaveArgs<F, A> {
    func: F,
    saved: Mutex<Option<A>>,
}

impl<F, A: Clone> SaveArgs<F, A> {
    pub fn new(func: F) -> Self {
        Self {
            func,
            saved: Mutex::new(None),
        }
    }

    pub fn call<R>(&self, args: A) -> R
    where
        F: Fn(A) -> R,
    {
        match self.saved.lock() {
            Ok(mut saved) => *saved = Some(args.clone()),
            Err(poisoned) => *poisoned.into_inner() = Some(args.clone()),
        }
        (self.func)(args)
    }

    /// Arguments of the most recent call, if any.
    pub fn saved_args(&self) -> Option<A> {
        match self.saved.lock() {
            Ok(saved) => saved.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl<F, A: fmt::Debug> fmt::Debug for SaveArgs<F, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaveArgs")
            .field("saved", &self.saved)
            .finish_non_exhaustive()
    }
}

pub fn save_args<F, A: Clone>(func: F) -> SaveArgs<F, A> {
    SaveArgs::new(func)
}

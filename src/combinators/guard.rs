//! Wrappers that decide whether the wrapped function runs at all.

/// Skip `func` when there is no argument.
///
/// ```
/// use fnkit::combinators::pass_none;
///
/// let parse = pass_none(|s: &str| s.len());
/// assert_eq!(parse(Some("text")), Some(4));
/// assert_eq!(parse(None), None);
/// ```
pub fn pass_none<A, R, F>(func: F) -> impl Fn(Option<A>) -> Option<R>
where
    F: Fn(A) -> R,
{
    move |x| x.map(&func)
}

/// Replace trapped errors with a value derived from the original argument.
///
/// Errors for which `trap` returns false propagate unchanged.
///
/// ```
/// use fnkit::combinators::except;
///
/// let lenient = except(
///     |s: &str| s.parse::<i32>(),
///     |_| true,
///     |s: &&str| s.len() as i32,
/// );
/// assert_eq!(lenient("5"), Ok(5));
/// assert_eq!(lenient("five"), Ok(4));
/// ```
pub fn except<A, T, E, F, P, X>(func: F, trap: P, replace: X) -> impl Fn(A) -> Result<T, E>
where
    A: Clone,
    F: Fn(A) -> Result<T, E>,
    P: Fn(&E) -> bool,
    X: Fn(&A) -> T,
{
    move |arg| match func(arg.clone()) {
        Err(e) if trap(&e) => Ok(replace(&arg)),
        other => other,
    }
}

/// [`except`] with a fixed replacement value.
pub fn except_or<A, T, E, F, P>(func: F, trap: P, value: T) -> impl Fn(A) -> Result<T, E>
where
    T: Clone,
    F: Fn(A) -> Result<T, E>,
    P: Fn(&E) -> bool,
{
    move |arg| match func(arg) {
        Err(e) if trap(&e) => Ok(value.clone()),
        other => other,
    }
}

/// Return the argument untouched whenever `check()` is true.
///
/// `check` is evaluated on every call, so it can follow runtime state such
/// as a flag or a feature toggle.
pub fn bypass_when<T, F, C>(check: C, func: F) -> impl Fn(T) -> T
where
    C: Fn() -> bool,
    F: Fn(T) -> T,
{
    move |x| if check() { x } else { func(x) }
}

/// Return the argument untouched unless `check()` is true.
pub fn bypass_unless<T, F, C>(check: C, func: F) -> impl Fn(T) -> T
where
    C: Fn() -> bool,
    F: Fn(T) -> T,
{
    bypass_when(move || !check(), func)
}

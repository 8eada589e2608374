//! Composition and call-ordering helpers.

/// `compose(f, g)(x) == f(g(x))`.
pub fn compose<A, B, C, F, G>(f: F, g: G) -> impl Fn(A) -> C
where
    F: Fn(B) -> C,
    G: Fn(A) -> B,
{
    move |x| f(g(x))
}

/// Compose any number of unary functions, applied right to left.
///
/// ```
/// use fnkit::compose;
///
/// let strip_then_upper = compose!(|s: String| s.to_uppercase(), |s: &str| s.trim().to_string());
/// assert_eq!(strip_then_upper("  hi  "), "HI");
///
/// let f = compose!(|x: i32| x + 1, |x: i32| x * 10, |x: i32| x - 2);
/// assert_eq!(f(5), 31);
/// ```
#[macro_export]
macro_rules! compose {
    ($f:expr $(,)?) => {
        $f
    };
    ($f:expr, $($rest:expr),+ $(,)?) => {
        $crate::combinators::compose($f, $crate::compose!($($rest),+))
    };
}

/// Run `transform` on whatever `func` returns.
pub fn apply<A, R, T, F, X>(transform: X, func: F) -> impl Fn(A) -> T
where
    F: Fn(A) -> R,
    X: Fn(R) -> T,
{
    compose(transform, func)
}

/// Call `func`, hand its result to `action` for a side effect, return the result.
pub fn result_invoke<A, R, F, X>(action: X, func: F) -> impl Fn(A) -> R
where
    F: Fn(A) -> R,
    X: Fn(&R),
{
    move |x| {
        let result = func(x);
        action(&result);
        result
    }
}

/// Call `first()` for its side effect before every call to `func`.
pub fn first_invoke<A, R, F1, F2>(first: F1, func: F2) -> impl Fn(A) -> R
where
    F1: Fn(),
    F2: Fn(A) -> R,
{
    move |x| {
        first();
        func(x)
    }
}

/// Call `func` once right away, then hand it back.
///
/// Marks a function that is defined mainly to be run at that point, while
/// keeping it around for later calls.
pub fn invoke<R, F>(func: F) -> F
where
    F: Fn() -> R,
{
    func();
    func
}

/// Like [`invoke`] for a function that takes an argument.
pub fn invoke_with<A, R, F>(func: F, arg: A) -> F
where
    F: Fn(A) -> R,
{
    func(arg);
    func
}

/// Return the argument.
pub fn identity<T>(x: T) -> T {
    x
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    #[test]
    fn test_compose_two() {
        let f = compose(|x: f64| (x * 1000.0).round() / 1000.0, |(a, b): (f64, f64)| a / b);
        assert_eq!(f((3.0, 2.0)), 1.5);
        assert_eq!(f((18.0, 7.0)), 2.571);
    }

    #[test]
    fn test_compose_macro_single() {
        let f = crate::compose!(|x: u8| x + 1);
        assert_eq!(f(1), 2);
    }

    #[test]
    fn test_apply_reverses_result() {
        let get_numbers = apply(
            |v: Vec<u32>| v.into_iter().rev().collect::<Vec<_>>(),
            |start: u32| (start..start + 3).collect::<Vec<_>>(),
        );
        assert_eq!(get_numbers(4), vec![6, 5, 4]);
    }

    #[test]
    fn test_result_invoke_sees_result() {
        let seen = RefCell::new(Vec::new());
        let add_two = result_invoke(|r: &i32| seen.borrow_mut().push(*r), |(a, b): (i32, i32)| a + b);
        assert_eq!(add_two((2, 3)), 5);
        assert_eq!(*seen.borrow(), vec![5]);
    }

    #[test]
    fn test_first_invoke_order() {
        let log = RefCell::new(Vec::new());
        let f = first_invoke(
            || log.borrow_mut().push("first".to_string()),
            |x: &str| log.borrow_mut().push(x.to_string()),
        );
        f("second");
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn test_invoke_calls_immediately() {
        let calls = Cell::new(0);
        let f = invoke(|| calls.set(calls.get() + 1));
        assert_eq!(calls.get(), 1);
        f();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_invoke_with_arg() {
        let names = RefCell::new(Vec::new());
        let f = invoke_with(|n: &str| names.borrow_mut().push(n.to_string()), "bingo");
        f("again");
        assert_eq!(*names.borrow(), vec!["bingo", "again"]);
    }

    #[test]
    fn test_identity() {
        let v = vec![1, 2];
        let ptr = v.as_ptr();
        assert_eq!(identity(v).as_ptr(), ptr);
    }
}

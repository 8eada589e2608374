//! Small function combinators.
//!
//! | Helper | Behaviour |
//! |--------|-----------|
//! | [`compose`] / [`compose!`](crate::compose) | `f(g(x))`, any number of functions with the macro |
//! | [`apply`] | Transform a function's result |
//! | [`result_invoke`] | Side effect on a function's result |
//! | [`first_invoke`] | Side effect before every call |
//! | [`invoke`] / [`invoke_with`] | Call now, keep the function |
//! | [`identity`] | Return the argument |
//! | [`pass_none`] | `None` in, `None` out, without calling |
//! | [`except`] / [`except_or`] | Replace trapped errors |
//! | [`bypass_when`] / [`bypass_unless`] | Skip a transform on a runtime check |
//! | [`once`] | Run once, then return the saved result |
//! | [`splat`] | Call an n-ary function with a tuple |
//! | [`save_args`] | Remember the latest arguments |
//! | [`print_yielded`] | Print each item a function yields |

mod compose;
mod guard;
mod once;
mod print;
mod save_args;
mod splat;

pub use compose::{apply, compose, first_invoke, identity, invoke, invoke_with, result_invoke};
pub use guard::{bypass_unless, bypass_when, except, except_or, pass_none};
pub use once::{once, Once};
pub use print::{print_yielded, print_yielded_to};
pub use save_args::{save_args, SaveArgs};
pub use splat::{splat, Splat, Splatted};

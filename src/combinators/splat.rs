//! Call multi-argument functions with a single tuple.

/// Functions callable with their arguments packed into a tuple.
///
/// Implemented for every `Fn` of one to six arguments.
pub trait Splat<Args> {
    type Output;

    fn call_splat(&self, args: Args) -> Self::Output;
}

macro_rules! impl_splat {
    ($($ty:ident $var:ident),+) => {
        impl<Func, Ret, $($ty),+> Splat<($($ty,)+)> for Func
        where
            Func: Fn($($ty),+) -> Ret,
        {
            type Output = Ret;

            fn call_splat(&self, ($($var,)+): ($($ty,)+)) -> Ret {
                self($($var),+)
            }
        }
    };
}

impl_splat!(A a);
impl_splat!(A a, B b);
impl_splat!(A a, B b, C c);
impl_splat!(A a, B b, C c, D d);
impl_splat!(A a, B b, C c, D d, E e);
impl_splat!(A a, B b, C c, D d, E e, G g);

/// A function adapted to take one tuple. Built by [`splat`].
#[derive(Debug, Clone, Copy)]
pub struct Splatted<F> {
    func: F,
}

impl<F> Splatted<F> {
    pub fn call<Args>(&self, args: Args) -> <F as Splat<Args>>::Output
    where
        F: Splat<Args>,
    {
        self.func.call_splat(args)
    }

    pub fn into_inner(self) -> F {
        self.func
    }
}

/// Adapt `func` so it takes its arguments as one tuple.
///
/// Handy when the arguments come out of an iterator of tuples.
///
/// ```
/// use fnkit::combinators::splat;
///
/// let area = splat(|w: u32, h: u32| w * h);
/// let total: u32 = [(2, 3), (4, 5)].into_iter().map(|dims| area.call(dims)).sum();
/// assert_eq!(total, 26);
/// ```
pub fn splat<F>(func: F) -> Splatted<F> {
    Splatted { func }
}

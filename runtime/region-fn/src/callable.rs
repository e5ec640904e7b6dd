/// Something that can be invoked with the argument tuple `Args`
///
/// Implemented for every `FnMut` closure or function item taking up to six
/// arguments, so `RegionFn<(A, B), Ret>` accepts any `FnMut(A, B) -> Ret`.
pub trait Callable<Args> {
    type Output;

    fn call_with(&mut self, args: Args) -> Self::Output;
}

macro_rules! impl_callable {
    ($($arg:ident),*) => {
        impl<Func, Ret, $($arg),*> Callable<($($arg,)*)> for Func
        where
            Func: FnMut($($arg),*) -> Ret,
        {
            type Output = Ret;

            #[allow(non_snake_case)]
            #[inline]
            fn call_with(&mut self, ($($arg,)*): ($($arg,)*)) -> Ret {
                self($($arg),*)
            }
        }
    };
}

impl_callable!();
impl_callable!(A0);
impl_callable!(A0, A1);
impl_callable!(A0, A1, A2);
impl_callable!(A0, A1, A2, A3);
impl_callable!(A0, A1, A2, A3, A4);
impl_callable!(A0, A1, A2, A3, A4, A5);

//! Argument resolution.
//!
//! [`ArgList`] turns the values of the current frame into a typed tuple,
//! one [`FromStack`] conversion per parameter. Parameter `i` is read from
//! the frame position the [`CallContext`] assigns to argument `i`, so the
//! same tuple type serves free functions (base 1) and methods (base 2).
//!
//! Parameters are converted last to first; the tuple comes out in
//! declaration order. The first failing conversion aborts resolution and
//! its error names the parameter index.

use stackbind_core::{CallContext, FromStack, KindMask, NativeError};

/// A parameter list that can be read off the stack.
pub trait ArgList: Sized {
    /// Number of parameters.
    const ARITY: usize;

    /// Read every parameter, or fail on the first mismatch.
    fn resolve(ctx: &CallContext<'_>) -> Result<Self, NativeError>;

    /// Accepted value kinds per parameter, in declaration order.
    fn expected() -> Vec<KindMask>;
}

impl ArgList for () {
    const ARITY: usize = 0;

    fn resolve(_ctx: &CallContext<'_>) -> Result<Self, NativeError> {
        Ok(())
    }

    fn expected() -> Vec<KindMask> {
        Vec::new()
    }
}

// The second list repeats the parameters in reverse so reads can run
// right to left while the tuple keeps declaration order.
macro_rules! impl_arg_list {
    ($arity:expr; [$($ty:ident $var:ident),+]; [$($rty:ident $rvar:ident $ridx:tt),+]) => {
        impl<$($ty: FromStack),+> ArgList for ($($ty,)+) {
            const ARITY: usize = $arity;

            fn resolve(ctx: &CallContext<'_>) -> Result<Self, NativeError> {
                $( let $rvar = ctx.arg::<$rty>($ridx)?; )+
                Ok(($($var,)+))
            }

            fn expected() -> Vec<KindMask> {
                vec![$($ty::EXPECTED),+]
            }
        }
    };
}

impl_arg_list!(1; [A a]; [A a 0]);
impl_arg_list!(2; [A a, B b]; [B b 1, A a 0]);
impl_arg_list!(3; [A a, B b, C c]; [C c 2, B b 1, A a 0]);
impl_arg_list!(4; [A a, B b, C c, D d]; [D d 3, C c 2, B b 1, A a 0]);
impl_arg_list!(5; [A a, B b, C c, D d, E e]; [E e 4, D d 3, C c 2, B b 1, A a 0]);
impl_arg_list!(6; [A a, B b, C c, D d, E e, F f];
    [F f 5, E e 4, D d 3, C c 2, B b 1, A a 0]);
impl_arg_list!(7; [A a, B b, C c, D d, E e, F f, G g];
    [G g 6, F f 5, E e 4, D d 3, C c 2, B b 1, A a 0]);
impl_arg_list!(8; [A a, B b, C c, D d, E e, F f, G g, H h];
    [H h 7, G g 6, F f 5, E e 4, D d 3, C c 2, B b 1, A a 0]);
impl_arg_list!(9; [A a, B b, C c, D d, E e, F f, G g, H h, I i];
    [I i 8, H h 7, G g 6, F f 5, E e 4, D d 3, C c 2, B b 1, A a 0]);
impl_arg_list!(10; [A a, B b, C c, D d, E e, F f, G g, H h, I i, J j];
    [J j 9, I i 8, H h 7, G g 6, F f 5, E e 4, D d 3, C c 2, B b 1, A a 0]);
impl_arg_list!(11; [A a, B b, C c, D d, E e, F f, G g, H h, I i, J j, K k];
    [K k 10, J j 9, I i 8, H h 7, G g 6, F f 5, E e 4, D d 3, C c 2, B b 1, A a 0]);
impl_arg_list!(12; [A a, B b, C c, D d, E e, F f, G g, H h, I i, J j, K k, L l];
    [L l 11, K k 10, J j 9, I i 8, H h 7, G g 6, F f 5, E e 4, D d 3, C c 2, B b 1, A a 0]);

#[cfg(test)]
mod tests {
    use super::*;
    use stackbind_core::{ClassRegistry, ConversionError, Runtime, Value};
    use stackbind_vm::Vm;

    fn frame(vm: &mut Vm, args: &[Value]) {
        for arg in args {
            vm.push(arg.clone());
        }
    }

    #[test]
    fn tuple_keeps_declaration_order() {
        let mut vm = Vm::new();
        frame(&mut vm, &[Value::Integer(7), Value::string("x"), Value::Number(2.5)]);
        let classes = ClassRegistry::new();
        let ctx = CallContext::new(&mut vm, &classes);
        let args = <(i32, String, f64)>::resolve(&ctx).unwrap();
        assert_eq!(args, (7, "x".to_string(), 2.5));
    }

    #[test]
    fn methods_skip_the_receiver() {
        let mut vm = Vm::new();
        frame(&mut vm, &[Value::string("receiver"), Value::Integer(3)]);
        let classes = ClassRegistry::new();
        let ctx = CallContext::method(&mut vm, &classes);
        assert_eq!(<(i64,)>::resolve(&ctx).unwrap(), (3,));
    }

    #[test]
    fn failure_names_the_parameter() {
        let mut vm = Vm::new();
        frame(&mut vm, &[Value::Integer(1), Value::string("two")]);
        let classes = ClassRegistry::new();
        let ctx = CallContext::new(&mut vm, &classes);
        let err = <(i64, i64)>::resolve(&ctx).unwrap_err();
        assert_eq!(
            err,
            NativeError::Argument {
                index: 1,
                source: ConversionError::TypeMismatch {
                    expected: "integer",
                    actual: "string",
                },
            }
        );
    }

    #[test]
    fn reads_run_last_parameter_first() {
        // Both parameters are wrong; the last one is reported.
        let mut vm = Vm::new();
        frame(&mut vm, &[Value::Bool(true), Value::Bool(false)]);
        let classes = ClassRegistry::new();
        let ctx = CallContext::new(&mut vm, &classes);
        let err = <(i64, String)>::resolve(&ctx).unwrap_err();
        assert!(matches!(err, NativeError::Argument { index: 1, .. }));
    }

    #[test]
    fn missing_arguments_read_as_nil() {
        let mut vm = Vm::new();
        frame(&mut vm, &[Value::Integer(1)]);
        let classes = ClassRegistry::new();
        let ctx = CallContext::new(&mut vm, &classes);
        assert_eq!(<(i64, Option<String>)>::resolve(&ctx).unwrap(), (1, None));
        assert!(<(i64, String)>::resolve(&ctx).is_err());
    }

    #[test]
    fn extra_arguments_are_ignored() {
        let mut vm = Vm::new();
        frame(&mut vm, &[Value::Integer(1), Value::Integer(2), Value::Integer(3)]);
        let classes = ClassRegistry::new();
        let ctx = CallContext::new(&mut vm, &classes);
        assert_eq!(<(i64,)>::resolve(&ctx).unwrap(), (1,));
        assert_eq!(<()>::resolve(&ctx).unwrap(), ());
    }

    #[test]
    fn arity_and_expected_kinds() {
        assert_eq!(<()>::ARITY, 0);
        assert_eq!(<(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, bool, String)>::ARITY, 12);
        assert_eq!(
            <(i64, Option<bool>)>::expected(),
            vec![KindMask::INTEGER, KindMask::BOOL | KindMask::NIL]
        );
    }
}

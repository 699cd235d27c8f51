//! `#[derive(NativeClass)]` and `impl_object_marshal!`.

mod common;

use common::{call1, vm};
use stackbind::{Binder, NativeClass, Value, impl_object_marshal};

#[derive(Debug, Clone, PartialEq, NativeClass)]
#[stackbind(name = "Vec2")]
struct Vector2 {
    x: f64,
    y: f64,
}

#[derive(Debug, Clone, PartialEq, NativeClass)]
struct Color(u8, u8, u8);

/// Not `Clone`: can be returned but not taken by value.
#[derive(Debug, NativeClass)]
#[stackbind(no_clone)]
struct Token {
    secret: String,
}

/// Reaches the core crate through the `stackbind` re-export.
#[derive(Debug, Clone, PartialEq, NativeClass)]
#[stackbind(crate = "::stackbind::stackbind_core", name = "Cell")]
struct Cell {
    value: i64,
}

#[derive(Debug, Clone, PartialEq)]
struct Manual {
    n: i64,
}

impl NativeClass for Manual {
    const NAME: &'static str = "Manual";
}

impl_object_marshal!(Manual);

#[test]
fn names_come_from_attributes_or_idents() {
    assert_eq!(Vector2::NAME, "Vec2");
    assert_eq!(Color::NAME, "Color");
    assert_eq!(Token::NAME, "Token");
}

#[test]
fn derived_classes_marshal_by_value() {
    let mut vm = vm();
    let mut binder = Binder::new(&mut vm);
    binder
        .register::<Vector2>(None)
        .unwrap()
        .constructor(|x: f64, y: f64| Vector2 { x, y })
        .unwrap()
        .method("len", |v: &Vector2| v.x.hypot(v.y))
        .unwrap();
    binder
        .function("add", |a: Vector2, b: Vector2| Vector2 {
            x: a.x + b.x,
            y: a.y + b.y,
        })
        .unwrap();
    drop(binder);

    let a = vm
        .call_path("Vec2.new", &[Value::Number(1.0), Value::Number(2.0)])
        .unwrap()
        .remove(0);
    let b = vm
        .call_path("Vec2.new", &[Value::Number(2.0), Value::Number(2.0)])
        .unwrap()
        .remove(0);
    let sum = call1(&mut vm, "add", &[a, b]).unwrap();
    assert_eq!(vm.call_method(&sum, "len", &[]).unwrap(), vec![Value::Number(5.0)]);
}

#[test]
fn tuple_structs_derive_too() {
    let mut vm = vm();
    let mut binder = Binder::new(&mut vm);
    binder
        .register::<Color>(None)
        .unwrap()
        .constructor(|r: u8, g: u8, b: u8| Color(r, g, b))
        .unwrap()
        .method("hex", |c: &Color| format!("#{:02x}{:02x}{:02x}", c.0, c.1, c.2))
        .unwrap();
    drop(binder);

    let c = vm
        .call_path(
            "Color.new",
            &[Value::Integer(255), Value::Integer(128), Value::Integer(0)],
        )
        .unwrap()
        .remove(0);
    assert_eq!(vm.call_method(&c, "hex", &[]).unwrap(), vec![Value::string("#ff8000")]);
}

#[test]
fn no_clone_classes_can_still_be_returned() {
    let mut vm = vm();
    let mut binder = Binder::new(&mut vm);
    binder
        .register::<Token>(None)
        .unwrap()
        .method("peek", |t: &Token| t.secret.len())
        .unwrap();
    binder
        .function("issue", |secret: String| Token { secret })
        .unwrap();
    drop(binder);

    let token = call1(&mut vm, "issue", &[Value::string("abc")]).unwrap();
    assert_eq!(vm.call_method(&token, "peek", &[]).unwrap(), vec![Value::Integer(3)]);
}

#[test]
fn manual_marshal_macro() {
    let mut vm = vm();
    let mut binder = Binder::new(&mut vm);
    binder.register::<Manual>(None).unwrap();
    binder
        .function("next", |m: Manual| Manual { n: m.n + 1 })
        .unwrap()
        .function("seed", || Manual { n: 41 })
        .unwrap()
        .method::<Manual, _, _>("get", |m: &Manual| m.n)
        .unwrap();
    drop(binder);

    let seed = call1(&mut vm, "seed", &[]).unwrap();
    let next = call1(&mut vm, "next", &[seed]).unwrap();
    assert_eq!(vm.call_method(&next, "get", &[]).unwrap(), vec![Value::Integer(42)]);
}

#[test]
fn derive_through_reexported_core() {
    assert_eq!(Cell::NAME, "Cell");
    let mut vm = vm();
    let mut binder = Binder::new(&mut vm);
    binder
        .register::<Cell>(None)
        .unwrap()
        .constructor(|value: i64| Cell { value })
        .unwrap();
    binder
        .function("bump", |c: Cell| Cell { value: c.value + 1 })
        .unwrap()
        .method::<Cell, _, _>("get", |c: &Cell| c.value)
        .unwrap();
    drop(binder);

    let cell = vm.call_path("Cell.new", &[Value::Integer(41)]).unwrap().remove(0);
    let bumped = call1(&mut vm, "bump", &[cell]).unwrap();
    assert_eq!(vm.call_method(&bumped, "get", &[]).unwrap(), vec![Value::Integer(42)]);
}

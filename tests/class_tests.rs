//! Classes: construction, finalization, inheritance and registration rules.

mod common;

use common::{DropCounter, Probe, call1, vm};
use stackbind::{
    Binder, BinderConfig, Namespace, NativeClass, NativeError, Ptr, RegistrationError, Runtime,
    Value,
};
use stackbind_vm::{Vm, VmError};

fn probe_vm(drops: &DropCounter) -> Vm {
    let mut vm = vm();
    let mut binder = Binder::new(&mut vm);
    let drops = drops.clone();
    binder
        .register::<Probe>(None)
        .unwrap()
        .constructor(move |id: i64| Probe::new(id, &drops))
        .unwrap()
        .method("id", |p: &Probe| p.id)
        .unwrap();
    drop(binder);
    vm
}

// =============================================================================
// Construction and finalization
// =============================================================================

#[test]
fn constructed_object_dispatches_methods() {
    let drops = DropCounter::default();
    let mut vm = probe_vm(&drops);
    let probe = vm.call_path("Probe.new", &[Value::Integer(11)]).unwrap().remove(0);
    assert!(matches!(probe, Value::Block(_)));
    assert_eq!(vm.call_method(&probe, "id", &[]).unwrap(), vec![Value::Integer(11)]);
}

#[test]
fn collection_finalizes_exactly_once() {
    let drops = DropCounter::default();
    let mut vm = probe_vm(&drops);
    vm.call_path("Probe.new", &[Value::Integer(1)]).unwrap();
    assert_eq!(drops.count(), 0);

    let stats = vm.collect_garbage();
    assert_eq!(stats.finalizers_run, 1);
    assert_eq!(stats.blocks_freed, 1);
    assert_eq!(drops.count(), 1);

    let stats = vm.collect_garbage();
    assert_eq!(stats.blocks_freed, 0);
    assert_eq!(drops.count(), 1);
}

#[test]
fn rooted_objects_survive_collection() {
    let drops = DropCounter::default();
    let mut vm = probe_vm(&drops);
    let probe = vm.call_path("Probe.new", &[Value::Integer(2)]).unwrap().remove(0);
    vm.set_global("keep", probe.clone());
    vm.collect_garbage();
    assert_eq!(drops.count(), 0);
    assert_eq!(vm.call_method(&probe, "id", &[]).unwrap(), vec![Value::Integer(2)]);

    vm.set_global("keep", Value::Nil);
    vm.collect_garbage();
    assert_eq!(drops.count(), 1);
}

#[test]
fn double_finalization_is_harmless() {
    let drops = DropCounter::default();
    let mut vm = probe_vm(&drops);
    let probe = vm.call_path("Probe.new", &[Value::Integer(3)]).unwrap().remove(0);
    vm.set_global("keep", probe.clone());
    let gc = vm.get_path("Probe.__gc").unwrap();

    assert!(vm.call(&gc, &[probe.clone()]).unwrap().is_empty());
    assert_eq!(drops.count(), 1);
    assert!(vm.call(&gc, &[probe.clone()]).unwrap().is_empty());
    assert_eq!(drops.count(), 1);

    // The prototype table itself is not a block.
    let proto = vm.get_global("Probe");
    assert!(vm.call(&gc, &[proto]).unwrap().is_empty());

    // Methods on a finalized object fail cleanly.
    let err = vm.call_method(&probe, "id", &[]).unwrap_err();
    assert!(matches!(err, VmError::Native(NativeError::InvalidThis { .. })));

    vm.set_global("keep", Value::Nil);
    vm.collect_garbage();
    assert_eq!(drops.count(), 1);
    assert_eq!(vm.blocks().len(), 0);
}

#[test]
fn panicking_constructor_leaves_a_collectable_block() {
    let drops = DropCounter::default();
    let mut vm = probe_vm(&drops);
    let mut binder = Binder::new(&mut vm);
    struct Fragile;
    impl NativeClass for Fragile {
        const NAME: &'static str = "Fragile";
    }
    binder
        .register::<Fragile>(None)
        .unwrap()
        .constructor(|| -> Fragile { panic!("constructor failed") })
        .unwrap();
    drop(binder);

    let err = vm.call_path("Fragile.new", &[]).unwrap_err();
    assert!(matches!(err, VmError::Native(NativeError::Panic { .. })));
    assert_eq!(vm.blocks().len(), 1);
    let stats = vm.collect_garbage();
    assert_eq!(stats.blocks_freed, 1);
    assert_eq!(vm.blocks().len(), 0);
}

#[test]
fn classes_without_constructor_are_abstract() {
    let drops = DropCounter::default();
    let mut vm = vm();
    let mut binder = Binder::new(&mut vm);
    binder.register::<Probe>(None).unwrap();
    drop(binder);
    assert!(matches!(
        vm.call_path("Probe.new", &[]),
        Err(VmError::NotCallable { type_name: "nil" })
    ));
    assert_eq!(drops.count(), 0);
}

// =============================================================================
// Inheritance
// =============================================================================

#[derive(Debug, Clone, PartialEq, NativeClass)]
struct Shape {
    label: String,
}

impl Shape {
    fn label(&self) -> String {
        self.label.clone()
    }

    fn describe(&self) -> String {
        format!("shape {}", self.label)
    }

    fn rename(&mut self, label: String) {
        self.label = label;
    }
}

#[derive(Debug, Clone, PartialEq, NativeClass)]
struct Square {
    shape: Shape,
    side: f64,
}

impl Square {
    fn new(side: f64) -> Self {
        Self {
            shape: Shape {
                label: "square".into(),
            },
            side,
        }
    }

    fn area(&self) -> f64 {
        self.side * self.side
    }

    fn describe(&self) -> String {
        format!("square of side {}", self.side)
    }
}

fn shapes_vm(with_upcast: bool) -> Vm {
    let mut vm = vm();
    let mut binder = Binder::new(&mut vm);
    binder
        .register::<Shape>(None)
        .unwrap()
        .method("label", Shape::label)
        .unwrap()
        .method("describe", Shape::describe)
        .unwrap()
        .method_mut("rename", Shape::rename)
        .unwrap();
    let square = binder
        .register::<Square>(Some("Shape"))
        .unwrap()
        .constructor(Square::new)
        .unwrap()
        .method("area", Square::area)
        .unwrap()
        .method("describe", Square::describe)
        .unwrap();
    if with_upcast {
        square
            .upcast::<Shape>(|sq| &sq.shape, |sq| &mut sq.shape)
            .unwrap();
    }
    binder.function("label_of", |shape: Shape| shape.label).unwrap();
    drop(binder);
    vm
}

#[test]
fn inherited_methods_are_found_on_the_parent() {
    let mut vm = shapes_vm(true);
    let sq = vm.call_path("Square.new", &[Value::Number(3.0)]).unwrap().remove(0);
    assert_eq!(vm.call_method(&sq, "area", &[]).unwrap(), vec![Value::Number(9.0)]);
    assert_eq!(
        vm.call_method(&sq, "label", &[]).unwrap(),
        vec![Value::string("square")]
    );
    vm.call_method(&sq, "rename", &[Value::string("box")]).unwrap();
    assert_eq!(vm.call_method(&sq, "label", &[]).unwrap(), vec![Value::string("box")]);
}

#[test]
fn child_methods_shadow_parent_methods() {
    let mut vm = shapes_vm(true);
    let sq = vm.call_path("Square.new", &[Value::Number(2.0)]).unwrap().remove(0);
    assert_eq!(
        vm.call_method(&sq, "describe", &[]).unwrap(),
        vec![Value::string("square of side 2")]
    );
    // The parent's version is still reachable through the parent class.
    let parent_describe = vm.get_path("Shape.describe").unwrap();
    assert_eq!(
        vm.call(&parent_describe, &[sq]).unwrap(),
        vec![Value::string("shape square")]
    );
}

#[test]
fn inherited_methods_need_an_upcast_to_borrow_the_parent() {
    let mut vm = shapes_vm(false);
    let sq = vm.call_path("Square.new", &[Value::Number(1.0)]).unwrap().remove(0);
    let err = vm.call_method(&sq, "label", &[]).unwrap_err();
    assert!(matches!(err, VmError::Native(NativeError::InvalidThis { .. })));
}

#[test]
fn parent_values_accept_children_by_value() {
    let mut vm = shapes_vm(true);
    let sq = vm.call_path("Square.new", &[Value::Number(4.0)]).unwrap().remove(0);
    assert_eq!(call1(&mut vm, "label_of", &[sq]).unwrap(), Value::string("square"));
}

#[test]
fn objects_round_trip_by_value() {
    let mut vm = vm();
    let mut binder = Binder::new(&mut vm);
    binder
        .register::<Square>(None)
        .unwrap()
        .constructor(Square::new)
        .unwrap()
        .method("area", Square::area)
        .unwrap();
    binder
        .function("grow", |mut sq: Square, by: f64| {
            sq.side += by;
            sq
        })
        .unwrap();
    drop(binder);

    let original = vm.call_path("Square.new", &[Value::Number(1.0)]).unwrap().remove(0);
    let grown = call1(&mut vm, "grow", &[original.clone(), Value::Number(1.0)]).unwrap();
    assert_ne!(grown, original);
    assert_eq!(vm.call_method(&grown, "area", &[]).unwrap(), vec![Value::Number(4.0)]);
    // The argument was a copy.
    assert_eq!(vm.call_method(&original, "area", &[]).unwrap(), vec![Value::Number(1.0)]);
}

#[test]
fn returning_an_unbound_class_fails() {
    let mut vm = vm();
    let mut binder = Binder::new(&mut vm);
    binder.function("make", || Square::new(1.0)).unwrap();
    drop(binder);
    let err = vm.call_global("make", &[]).unwrap_err();
    assert!(matches!(err, VmError::Native(NativeError::UnknownClass { .. })));
    assert_eq!(vm.blocks().len(), 0);
}

// =============================================================================
// Registration rules
// =============================================================================

#[test]
fn duplicate_class_keeps_the_first() {
    let mut vm = vm();
    let mut binder = Binder::new(&mut vm);
    binder
        .register_class::<Shape>("Thing", None)
        .unwrap()
        .method("label", Shape::label)
        .unwrap();
    let first = binder.entry::<Shape>().unwrap().prototype;
    let err = binder.register_class::<Square>("Thing", None).err().unwrap();
    assert_eq!(
        err,
        RegistrationError::DuplicateClass {
            name: "Thing".into(),
            namespace: "global namespace".into(),
        }
    );
    drop(binder);
    assert_eq!(vm.get_global("Thing"), Value::Table(first));
    assert!(matches!(vm.raw_get(first, "label"), Value::Function(_)));
}

#[test]
fn unknown_parent_is_rejected() {
    let mut vm = vm();
    let mut binder = Binder::new(&mut vm);
    let err = binder.register::<Square>(Some("Shape")).err().unwrap();
    assert_eq!(
        err,
        RegistrationError::UnknownParent {
            name: "Shape".into(),
            namespace: "global namespace".into(),
        }
    );
}

#[test]
fn registry_mirrors_prototypes() {
    let mut vm = vm();
    let config = BinderConfig::default().with_namespace(Namespace::table("geo"));
    let mut binder = Binder::with_config(&mut vm, config);
    binder.register::<Shape>(None).unwrap();
    binder.register::<Square>(Some("Shape")).unwrap();
    let shape = binder.entry::<Shape>().unwrap();
    drop(binder);

    assert_eq!(shape.qualified_name, "geo.Shape");
    let registry = vm.registry_table();
    assert_eq!(vm.raw_get(registry, "geo.Shape"), Value::Table(shape.prototype));
    assert!(matches!(vm.raw_get(registry, "geo.Square"), Value::Table(_)));
    assert_eq!(vm.get_global("Shape"), Value::Nil);
}

#[test]
fn prototypes_outlive_their_published_name() {
    let drops = DropCounter::default();
    let mut vm = vm();
    let config = BinderConfig::default().with_registry_mirror(false);
    let mut binder = Binder::with_config(&mut vm, config);
    let made = drops.clone();
    binder
        .register::<Probe>(None)
        .unwrap()
        .method("id", |p: &Probe| p.id)
        .unwrap();
    binder
        .function_raw("make", move |ctx| {
            let id: i64 = ctx.arg(0)?;
            stackbind::stackbind_core::convert::push_object(ctx, Probe::new(id, &made))
        })
        .unwrap();
    drop(binder);

    vm.set_global("Probe", Value::Nil);
    let stats = vm.collect_garbage();
    assert_eq!(stats.tables_freed, 0);
    assert_eq!(stats.functions_freed, 0);

    let obj = call1(&mut vm, "make", &[Value::Integer(5)]).unwrap();
    assert_eq!(vm.call_method(&obj, "id", &[]).unwrap(), vec![Value::Integer(5)]);

    drop(obj);
    vm.collect_garbage();
    assert_eq!(drops.count(), 1);
}

#[test]
fn namespaced_classes_are_callable_by_path() {
    let mut vm = vm();
    let config = BinderConfig::default()
        .with_namespace(Namespace::table("geo"))
        .with_constructor_name("create");
    let mut binder = Binder::with_config(&mut vm, config);
    binder
        .register::<Square>(None)
        .unwrap()
        .constructor(Square::new)
        .unwrap()
        .constructor_named("unit", || Square::new(1.0))
        .unwrap()
        .static_function("sides", || 4u8)
        .unwrap()
        .method("area", Square::area)
        .unwrap();
    drop(binder);

    let sq = vm.call_path("geo.Square.create", &[Value::Number(5.0)]).unwrap().remove(0);
    assert_eq!(vm.call_method(&sq, "area", &[]).unwrap(), vec![Value::Number(25.0)]);
    let unit = vm.call_path("geo.Square.unit", &[]).unwrap().remove(0);
    assert_eq!(vm.call_method(&unit, "area", &[]).unwrap(), vec![Value::Number(1.0)]);
    assert_eq!(
        vm.call_path("geo.Square.sides", &[]).unwrap(),
        vec![Value::Integer(4)]
    );
}

#[test]
fn shared_registry_spans_namespaces() {
    let mut vm = vm();
    let mut binder = Binder::new(&mut vm);
    binder
        .register::<Square>(None)
        .unwrap()
        .constructor(Square::new)
        .unwrap();
    let classes = binder.classes();
    drop(binder);

    let config = BinderConfig::default().with_namespace(Namespace::table("util"));
    let mut binder = Binder::with_registry(&mut vm, classes, config);
    binder
        .function("double_side", |sq: Square| Square::new(sq.side * 2.0))
        .unwrap()
        .method::<Square, _, _>("side", |sq: &Square| sq.side)
        .unwrap();
    drop(binder);

    let sq = vm.call_path("Square.new", &[Value::Number(2.0)]).unwrap().remove(0);
    let doubled = vm.call_path("util.double_side", &[sq]).unwrap().remove(0);
    assert_eq!(vm.call_method(&doubled, "side", &[]).unwrap(), vec![Value::Number(4.0)]);
}

// =============================================================================
// Pointers
// =============================================================================

#[test]
fn pointers_share_the_object() {
    let mut vm = vm();
    let mut binder = Binder::new(&mut vm);
    binder
        .register::<Shape>(None)
        .unwrap()
        .constructor(|label: String| Shape { label })
        .unwrap()
        .method("label", Shape::label)
        .unwrap();
    binder
        .function("same", |p: Ptr<Shape>| p)
        .unwrap()
        .function_raw("shout", |ctx| {
            let p: Ptr<Shape> = ctx.arg(0)?;
            let shape = ctx.object_mut(p)?;
            shape.label = shape.label.to_uppercase();
            Ok(0)
        })
        .unwrap();
    drop(binder);

    let shape = vm.call_path("Shape.new", &[Value::string("dot")]).unwrap().remove(0);
    vm.set_global("keep", shape.clone());
    let light = call1(&mut vm, "same", &[shape.clone()]).unwrap();
    assert!(matches!(light, Value::LightBlock(_)), "got {light:?}");

    vm.call_global("shout", &[light.clone()]).unwrap();
    assert_eq!(vm.call_method(&shape, "label", &[]).unwrap(), vec![Value::string("DOT")]);
    assert_eq!(vm.call_method(&light, "label", &[]).unwrap(), vec![Value::string("DOT")]);

    // Light references do not keep the object alive.
    vm.set_global("keep", Value::Nil);
    vm.set_global("weak", light.clone());
    vm.collect_garbage();
    let err = vm.call_global("shout", &[light]).unwrap_err();
    assert!(matches!(err, VmError::Native(NativeError::Argument { index: 0, .. })));
}

//! Registry Lifecycle Tests
//!
//! Covers the registry as a shared, injectable object:
//! - Lazy registration from many threads
//! - Building -> Sealed transition
//! - Duplicate policies
//! - Type name resolution order
//! - Free functions and enums

use std::sync::Arc;
use std::thread;

use mirror_core::{
    args, Describe, DuplicatePolicy, ErrorKind, Handle, Phase, Reflect, ReflectError, Registrar,
    Registry, RegistryOptions,
};

#[derive(Debug, Clone, Default)]
struct Sensor {
    id: u32,
    reading: f64,
}

impl Describe for Sensor {}

impl Sensor {
    fn calibrated(&self, offset: f64) -> f64 {
        self.reading + offset
    }
}

impl Reflect for Sensor {
    const CLASS_NAME: &'static str = "Sensor";

    fn register(reg: &mut Registrar<'_, Self>) {
        reg.member("id", |s| &s.id, |s| &mut s.id)
            .member("reading", |s| &s.reading, |s| &mut s.reading)
            .method("calibrated", Sensor::calibrated)
            .default_constructor();
    }
}

#[derive(Debug, Clone, Default)]
struct Shadowed {
    a: i32,
    b: i32,
}

impl Describe for Shadowed {}

impl Reflect for Shadowed {
    const CLASS_NAME: &'static str = "Shadowed";

    fn register(reg: &mut Registrar<'_, Self>) {
        reg.member("value", |s| &s.a, |s| &mut s.a)
            .member("value", |s| &s.b, |s| &mut s.b);
    }
}

struct Opaque;

impl Describe for Opaque {}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Channel {
    Red = 1,
    Green = 2,
    Blue = 4,
}

impl Describe for Channel {}

impl From<Channel> for i64 {
    fn from(c: Channel) -> i64 {
        c as i64
    }
}

#[derive(Debug, Clone, Default)]
struct Wheel {
    radius: f64,
}

impl Describe for Wheel {}

impl Reflect for Wheel {
    const CLASS_NAME: &'static str = "Wheel";

    fn register(reg: &mut Registrar<'_, Self>) {
        reg.member("radius", |w| &w.radius, |w| &mut w.radius);
    }
}

/// Registers its member class through the process-wide registry
#[derive(Debug, Clone, Default)]
struct Cart {
    front: Wheel,
}

impl Describe for Cart {}

impl Reflect for Cart {
    const CLASS_NAME: &'static str = "Cart";

    fn register(reg: &mut Registrar<'_, Self>) {
        Registry::global().register::<Wheel>().unwrap();
        reg.member("front", |c| &c.front, |c| &mut c.front);
    }
}

#[derive(Debug, Clone, Default)]
struct Trailer {
    wheels: Vec<Wheel>,
}

impl Describe for Trailer {}

impl Reflect for Trailer {
    const CLASS_NAME: &'static str = "Trailer";

    fn register(reg: &mut Registrar<'_, Self>) {
        reg.depends_on::<Wheel>()
            .member("wheels", |t| &t.wheels, |t| &mut t.wheels);
    }
}

// ===== Concurrency =====

#[test]
fn test_registration_is_idempotent_across_threads() {
    let registry = Arc::new(Registry::new());
    let handles: Vec<_> = (0..16)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.class::<Sensor>().unwrap())
        })
        .collect();

    let descriptors: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let first = &descriptors[0];
    assert!(descriptors.iter().all(|d| Arc::ptr_eq(d, first)));
    assert_eq!(first.member_names(), vec!["id", "reading"]);
    assert_eq!(first.method_names(), vec!["calibrated"]);
    assert_eq!(first.constructors().len(), 1);
    assert_eq!(registry.class_names(), vec!["Sensor"]);
}

#[test]
fn test_register_may_register_other_classes() {
    let cart = Registry::global().class::<Cart>().unwrap();
    assert!(Registry::global().contains::<Wheel>());
    assert_eq!(cart.member("front").unwrap().type_name(), "Wheel");
}

#[test]
fn test_dependent_registration_across_threads() {
    let registry = Arc::new(Registry::new());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                if i % 2 == 0 {
                    registry.register::<Wheel>().unwrap();
                }
                registry.class::<Trailer>().unwrap()
            })
        })
        .collect();

    let descriptors: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(descriptors.iter().all(|d| Arc::ptr_eq(d, &descriptors[0])));
    assert_eq!(
        descriptors[0].member("wheels").unwrap().type_name(),
        "vector<Wheel>"
    );
    assert_eq!(registry.class_names(), vec!["Trailer", "Wheel"]);
}

// ===== Lifecycle =====

#[test]
fn test_seal_freezes_registrations() {
    let registry = Registry::new();
    registry.register::<Sensor>().unwrap();
    assert_eq!(registry.phase(), Phase::Building);

    registry.seal();
    registry.seal();
    assert!(registry.is_sealed());

    assert!(registry.class::<Sensor>().is_ok());
    assert!(registry.descriptor_by_name("Sensor").is_ok());

    let err = registry.class::<Shadowed>().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Lifecycle);
    assert!(matches!(
        registry.register_type_name::<Opaque>("opaque"),
        Err(ReflectError::Sealed(_))
    ));
    assert!(registry
        .register_function("late", || 1i32)
        .is_err());
}

// ===== Duplicates =====

#[test]
fn test_duplicate_member_replace_keeps_later() {
    let registry = Registry::new();
    let descriptor = registry.class::<Shadowed>().unwrap();
    assert_eq!(descriptor.member_names(), vec!["value"]);

    let instance = Shadowed { a: 1, b: 2 };
    let value = descriptor.get(&instance, "value").unwrap();
    assert_eq!(value.cast::<i32>().unwrap(), 2);
}

#[test]
fn test_duplicate_member_reject_fails_registration() {
    let registry = Registry::with_options(RegistryOptions::strict());
    assert_eq!(registry.options().duplicates, DuplicatePolicy::Reject);
    let err = registry.class::<Shadowed>().unwrap_err();
    assert!(matches!(err, ReflectError::Duplicate { what: "member", .. }));
    assert_eq!(err.kind(), ErrorKind::Collision);
    assert!(!registry.contains::<Shadowed>());
}

// ===== Type names =====

#[test]
fn test_type_name_resolution() {
    let registry = Registry::new();
    assert_eq!(registry.resolve::<i32>(), "int");
    assert_eq!(registry.resolve::<Vec<f64>>(), "vector<double>");
    assert_eq!(registry.resolve::<()>(), "void");

    let before = registry.resolve::<Sensor>();
    assert_eq!(before, std::any::type_name::<Sensor>());
    assert_eq!(registry.resolve::<Sensor>(), before);

    registry.register::<Sensor>().unwrap();
    assert_eq!(registry.resolve::<Sensor>(), "Sensor");
    assert_eq!(registry.resolve::<Vec<Sensor>>(), "vector<Sensor>");
    assert_eq!(registry.resolve::<Handle<Sensor>>(), "Sensor*");
}

#[test]
fn test_explicit_type_name() {
    let registry = Registry::new();
    registry.register_type_name::<Opaque>("opaque").unwrap();
    assert_eq!(registry.resolve::<Opaque>(), "opaque");
    assert!(registry.type_names().registered_names().contains(&"opaque"));
}

// ===== Functions and enums =====

#[test]
fn test_free_functions() {
    let registry = Registry::new();
    registry
        .register_function("hypot", |a: f64, b: f64| (a * a + b * b).sqrt())
        .unwrap();

    let f = registry.function("hypot").unwrap();
    assert_eq!(f.return_type(), "double");
    assert_eq!(f.parameter_types(), ["double", "double"]);

    let r = registry.call_function("hypot", &args![3.0f64, 4.0f64]).unwrap();
    assert_eq!(r.cast::<f64>().unwrap(), 5.0);

    let err = registry.call_function("hypot", &args![3.0f64]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ArgumentCount);
    assert!(registry.call_function("missing", &[]).unwrap_err().is_not_found());
    assert_eq!(registry.function_names(), vec!["hypot"]);
}

#[test]
fn test_enums() {
    let registry = Registry::new();
    let channel = registry
        .register_enum::<Channel>("Channel")
        .value("Red", Channel::Red)
        .value("Green", Channel::Green)
        .value("Blue", Channel::Blue)
        .build()
        .unwrap();

    assert_eq!(channel.names(), vec!["Red", "Green", "Blue"]);
    assert_eq!(channel.value_of("Blue").unwrap(), 4);
    assert_eq!(channel.name_of(2).unwrap(), "Green");
    assert_eq!(channel.variant::<Channel>(4).unwrap(), Channel::Blue);
    assert_eq!(channel.variant_named::<Channel>("Red").unwrap(), Channel::Red);
    assert!(matches!(
        channel.value_of("Alpha"),
        Err(ReflectError::EnumValueNotFound { .. })
    ));
    assert_eq!(registry.resolve::<Channel>(), "Channel");
    assert!(registry.enumeration("Palette").unwrap_err().is_not_found());
}

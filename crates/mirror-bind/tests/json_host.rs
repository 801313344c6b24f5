//! JSON Host Binding Tests
//!
//! Drives registered classes and functions through `Binder<JsonHost>` the
//! way a script runtime adapter would.

use std::sync::Arc;

use mirror_bind::{BindOptions, Binder, JsonHost};
use mirror_core::{Describe, Handle, Reflect, ReflectError, Registrar, Registry};
use serde_json::json;

#[derive(Debug, Clone, Default, PartialEq)]
struct Point {
    x: f64,
    y: f64,
}

impl Describe for Point {}

impl Point {
    fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    fn scale(&mut self, factor: f64) {
        self.x *= factor;
        self.y *= factor;
    }
}

impl Reflect for Point {
    const CLASS_NAME: &'static str = "Point";

    fn register(reg: &mut Registrar<'_, Self>) {
        reg.member("x", |p| &p.x, |p| &mut p.x)
            .member("y", |p| &p.y, |p| &mut p.y)
            .method("magnitude", Point::magnitude)
            .method("scale", Point::scale)
            .default_constructor()
            .constructor(|x: f64, y: f64| Point { x, y });
    }
}

#[derive(Debug, Clone, Default)]
struct Polyline {
    name: String,
    points: Vec<Point>,
    tags: Vec<String>,
    anchor: Option<Handle<Point>>,
}

impl Describe for Polyline {}

impl Polyline {
    fn len(&self) -> usize {
        self.points.len()
    }

    fn anchor(&self) -> Handle<Point> {
        self.anchor.clone().unwrap_or_else(|| Handle::new(Point::default()))
    }
}

impl Reflect for Polyline {
    const CLASS_NAME: &'static str = "Polyline";

    fn register(reg: &mut Registrar<'_, Self>) {
        reg.member("name", |p| &p.name, |p| &mut p.name)
            .member("tags", |p| &p.tags, |p| &mut p.tags)
            .member("points", |p| &p.points, |p| &mut p.points)
            .method("len", Polyline::len)
            .method("anchor", Polyline::anchor)
            .default_constructor();
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Signal {
    Stop = 0,
    Go = 1,
}

impl Describe for Signal {}

impl From<Signal> for i64 {
    fn from(signal: Signal) -> i64 {
        signal as i64
    }
}

#[derive(Debug, Clone)]
struct Crossing {
    signal: Signal,
}

impl Describe for Crossing {}

impl Reflect for Crossing {
    const CLASS_NAME: &'static str = "Crossing";

    fn register(reg: &mut Registrar<'_, Self>) {
        reg.member("signal", |c| &c.signal, |c| &mut c.signal)
            .method("is", |c: &Crossing, signal: Signal| c.signal == signal)
            .constructor(|signal: Signal| Crossing { signal });
    }
}

#[test]
fn test_point_end_to_end() {
    let registry = Registry::new();
    let binder = Binder::<JsonHost>::new(&registry);
    let class = binder.bind::<Point>().unwrap();
    assert_eq!(class.class_name(), "Point");
    assert_eq!(class.property_names(), vec!["x", "y"]);

    let mut point = class.construct(&[json!(3.0), json!(4.0)]).unwrap();
    let magnitude = point.call("magnitude", &[]).unwrap();
    assert!((magnitude.as_f64().unwrap() - 5.0).abs() < 1e-9);

    assert_eq!(point.call("scale", &[json!(2)]).unwrap(), json!(null));
    assert_eq!(point.get("x").unwrap(), json!(6.0));

    let json = point.to_json().unwrap();
    assert!(json.contains("\"className\": \"Point\""));
}

#[test]
fn test_bind_by_name_after_registration() {
    let registry = Registry::new();
    let binder = Binder::<JsonHost>::new(&registry);
    assert!(binder.bind_by_name("Point").unwrap_err().is_not_found());

    registry.register::<Point>().unwrap();
    let class = binder.bind_by_name("Point").unwrap();
    let point = class.construct(&[]).unwrap();
    assert_eq!(point.get("y").unwrap(), json!(0.0));
}

#[test]
fn test_containers_and_unconvertible_values() {
    let registry = Registry::new();
    registry.register::<Point>().unwrap();
    let binder = Binder::<JsonHost>::new(&registry);
    let mut line = binder.bind::<Polyline>().unwrap().construct(&[]).unwrap();

    line.set("tags", &json!(["a", "b"])).unwrap();
    assert_eq!(line.get("tags").unwrap(), json!(["a", "b"]));
    line.set("name", &json!("route")).unwrap();

    // vector<Point> and Point* have no converter in a fresh binder
    assert_eq!(line.get("points").unwrap(), json!(null));
    assert_eq!(line.call("anchor", &[]).unwrap(), json!(null));
    assert!(matches!(
        line.set("points", &json!([])),
        Err(ReflectError::UnregisteredType(name)) if name == "vector<Point>"
    ));
    assert_eq!(line.call("len", &[]).unwrap(), json!(0));
}

#[test]
fn test_custom_converter_for_registered_class() {
    let registry = Registry::new();
    registry.register::<Point>().unwrap();
    let mut binder = Binder::<JsonHost>::new(&registry);
    binder.converters_mut().register_with_vector::<Point, _, _>(
        "Point",
        |p: &Point| json!({ "x": p.x, "y": p.y }),
        |h: &serde_json::Value| {
            Some(Point {
                x: h.get("x")?.as_f64()?,
                y: h.get("y")?.as_f64()?,
            })
        },
    );

    let mut line = binder.bind::<Polyline>().unwrap().construct(&[]).unwrap();
    line.set("points", &json!([{ "x": 1.0, "y": 2.0 }, { "x": 0.0, "y": 0.5 }]))
        .unwrap();
    assert_eq!(line.call("len", &[]).unwrap(), json!(2));
    assert_eq!(line.get("points").unwrap()[1]["y"], json!(0.5));

    let err = line.set("points", &json!([{ "x": 1.0 }])).unwrap_err();
    assert!(matches!(err, ReflectError::CastMismatch { .. }));
}

#[test]
fn test_wrapped_instance_stays_with_caller() {
    let registry = Registry::new();
    let binder = Binder::<JsonHost>::new(&registry);
    let class = binder.bind::<Point>().unwrap();

    let mut native = Point { x: 1.0, y: 1.0 };
    class
        .wrap(&mut native)
        .unwrap()
        .call("scale", &[json!(0.5)])
        .unwrap();
    assert_eq!(native, Point { x: 0.5, y: 0.5 });
}

#[test]
fn test_errors_surface_to_host() {
    let registry = Registry::new();
    registry
        .register_function("sum", |a: i64, b: i64| a + b)
        .unwrap();
    let binder = Binder::<JsonHost>::new(&registry);

    let sum = binder.bind_function("sum").unwrap();
    assert_eq!(sum.parameter_types(), ["long long", "long long"]);
    assert_eq!(sum.call(&[json!(2), json!(40)]).unwrap(), json!(42));

    let err = sum.call(&[json!(2)]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Incorrect number of arguments for 'sum'. Expected 2, got 1"
    );
    assert!(matches!(
        sum.call(&[json!(2), json!("x")]),
        Err(ReflectError::CastMismatch { .. })
    ));

    let mut point = binder.bind::<Point>().unwrap().construct(&[]).unwrap();
    assert!(point.get("z").unwrap_err().is_not_found());
    assert!(point.call("Magnitude", &[]).unwrap_err().is_not_found());
    assert!(matches!(
        point.call("magnitude", &[json!(1)]),
        Err(ReflectError::ArgumentCount { .. })
    ));
}

#[test]
fn test_enum_members_and_parameters() {
    let registry = Registry::new();
    registry
        .register_enum::<Signal>("Signal")
        .value("Stop", Signal::Stop)
        .value("Go", Signal::Go)
        .build()
        .unwrap();
    let mut binder = Binder::<JsonHost>::with_options(&registry, BindOptions::strict());
    binder.bind_enum::<Signal>("Signal").unwrap();

    {
        let class = binder.bind::<Crossing>().unwrap();
        assert_eq!(class.descriptor().member("signal").unwrap().type_name(), "Signal");

        let mut crossing = class.construct(&[json!("Go")]).unwrap();
        assert_eq!(crossing.get("signal").unwrap(), json!(1));
        assert_eq!(crossing.call("is", &[json!(1)]).unwrap(), json!(true));

        crossing.set("signal", &json!(0)).unwrap();
        assert_eq!(crossing.call("is", &[json!("Stop")]).unwrap(), json!(true));
        assert!(crossing.set("signal", &json!(7)).unwrap_err().is_not_found());
        assert!(crossing.set("signal", &json!("Amber")).unwrap_err().is_not_found());
    }

    assert!(binder.bind_enum::<Signal>("Light").unwrap_err().is_not_found());
    assert!(matches!(
        binder.bind_enum::<u8>("Signal"),
        Err(ReflectError::CastMismatch { .. })
    ));
}

/// Host-supplied callable, built from a `{ "scale": k, "offset": b }` description
#[derive(Clone)]
struct Transform(Arc<dyn Fn(f64) -> f64 + Send + Sync>);

impl Describe for Transform {}

fn map_values(values: Vec<f64>, transform: Transform) -> Vec<f64> {
    values.into_iter().map(|v| (transform.0)(v)).collect()
}

#[test]
fn test_host_callable_as_argument() {
    let registry = Registry::new();
    registry
        .register_type_name::<Transform>("function<double(double)>")
        .unwrap();
    registry.register_function("map_values", map_values).unwrap();

    let mut binder = Binder::<JsonHost>::new(&registry);
    binder.converters_mut().register_type::<Transform, _, _>(
        "function<double(double)>",
        |_: &Transform| json!({ "kind": "function" }),
        |h: &serde_json::Value| {
            let scale = h.get("scale")?.as_f64()?;
            let offset = h.get("offset").and_then(|o| o.as_f64()).unwrap_or(0.0);
            Some(Transform(Arc::new(move |x| x * scale + offset)))
        },
    );

    let map = binder.bind_function("map_values").unwrap();
    assert_eq!(
        map.parameter_types(),
        ["vector<double>", "function<double(double)>"]
    );
    let out = map
        .call(&[json!([1.0, 2.0]), json!({ "scale": 10.0, "offset": 0.5 })])
        .unwrap();
    assert_eq!(out, json!([10.5, 20.5]));

    assert!(matches!(
        map.call(&[json!([1.0]), json!("not a function")]),
        Err(ReflectError::CastMismatch { .. })
    ));
}

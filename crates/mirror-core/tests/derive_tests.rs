//! Derive Macro Tests
//!
//! `#[derive(Reflect)]` on real structs, including container and field
//! attributes and extra registration through `with = path`.

use mirror_core::{Describe, Introspectable, Reflect, Registrar, Registry, Value};

#[derive(Debug, Clone, Default, Reflect)]
#[reflect(with = Person::register_extras)]
struct Person {
    name: String,
    #[reflect(rename = "years")]
    age: i32,
    #[reflect(readonly)]
    id: u64,
    #[reflect(skip)]
    cache: Option<String>,
}

impl Person {
    fn greeting(&self) -> String {
        format!("Hello, {}", self.name)
    }

    fn birthday(&mut self) -> i32 {
        self.age += 1;
        self.age
    }

    fn register_extras(reg: &mut Registrar<'_, Self>) {
        reg.method("greeting", Person::greeting)
            .method("birthday", Person::birthday)
            .default_constructor();
    }
}

#[derive(Debug, Clone, Default, Reflect)]
#[reflect(name = "Vec2")]
struct Vector {
    x: f32,
    y: f32,
}

#[derive(Debug, Clone, Default, Reflect)]
struct Path {
    points: Vec<Vector>,
}

#[test]
fn test_derived_members() {
    let mut person = Person {
        name: "Ada".to_string(),
        age: 36,
        id: 7,
        cache: None,
    };
    assert_eq!(Person::CLASS_NAME, "Person");
    assert_eq!(person.member_names(), vec!["name", "years", "id"]);
    assert!(!person.has_member("cache"));
    assert!(!person.has_member("age"));

    person.set_member_value("years", Value::from(37i32)).unwrap();
    assert_eq!(person.age, 37);
    assert!(person.set_member_value("id", Value::from(8u64)).is_err());
    assert_eq!(person.get_member_value("id").unwrap().cast::<u64>().unwrap(), 7);
    assert!(person.cache.is_none());
}

#[test]
fn test_with_registers_methods() {
    let mut person = Person {
        name: "Grace".to_string(),
        ..Person::default()
    };
    let greeting = person.call_const_method("greeting", &[]).unwrap();
    assert_eq!(greeting.cast::<String>().unwrap(), "Hello, Grace");
    assert_eq!(person.call_method("birthday", &[]).unwrap().cast::<i32>().unwrap(), 1);

    let descriptor = person.type_descriptor().unwrap();
    assert_eq!(descriptor.constructors().len(), 1);
    assert!(descriptor.constructors()[0].is_default());
}

#[test]
fn test_custom_class_name_and_nested_types() {
    let registry = Registry::new();
    let vector = registry.class::<Vector>().unwrap();
    assert_eq!(vector.class_name(), "Vec2");
    assert_eq!(vector.member("x").unwrap().type_name(), "float");

    let path = registry.class::<Path>().unwrap();
    assert_eq!(path.member("points").unwrap().type_name(), "vector<Vec2>");
    assert!(vector.constructors().is_empty());
}

#[test]
fn test_derived_type_is_describable() {
    fn assert_describe<T: Describe>() {}
    assert_describe::<Person>();
    assert_describe::<Vector>();
}

//! Type name resolution
//!
//! Maps a compile-time type to the stable string every participant uses for
//! it: descriptors record it, binders key host converters on it. Resolution
//! order for `resolve::<T>()`:
//!
//! 1. an explicit registration for `T`
//! 2. the compile-time built-in name (`int`, `double`, `string`, ...)
//! 3. structural rules (`Vec<T>` -> `vector<T>` when `T` has a non-fallback
//!    name, `Handle<T>` -> `T*`)
//! 4. the fallback `std::any::type_name::<T>()`
//!
//! A type that resolved to its fallback and is registered afterwards keeps
//! the fallback wherever it was already captured; that is logged.

use std::any::TypeId;
use std::fmt;

use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};

/// Compile-time naming hooks for types that cross the reflection boundary.
///
/// Custom classes usually get an empty impl (or one from `#[derive(Reflect)]`)
/// and are named through registration.
pub trait Describe: 'static {
    /// Canonical built-in name, if this is a built-in type
    fn builtin_name() -> Option<&'static str> {
        None
    }

    /// Name derived from the type's structure and the current registrations
    fn structural_name(_names: &TypeNames) -> Option<String> {
        None
    }
}

/// Registry of display names keyed by type identity
pub struct TypeNames {
    names: FxHashMap<TypeId, String>,
    /// Types that have been handed out under their fallback name
    fallbacks: Mutex<FxHashSet<TypeId>>,
}

macro_rules! builtin_types {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl Describe for $ty {
                fn builtin_name() -> Option<&'static str> {
                    Some($name)
                }
            }
        )*

        fn seed_builtins(names: &mut FxHashMap<TypeId, String>) {
            $(
                names.insert(TypeId::of::<$ty>(), $name.to_string());
                names.insert(TypeId::of::<Vec<$ty>>(), concat!("vector<", $name, ">").to_string());
            )*
        }
    };
}

builtin_types! {
    String => "string",
    bool => "bool",
    char => "char",
    i8 => "int8",
    u8 => "uint8",
    i16 => "short",
    u16 => "unsigned short",
    i32 => "int",
    u32 => "unsigned int",
    i64 => "long long",
    u64 => "unsigned long long",
    isize => "ptrdiff_t",
    usize => "size_t",
    f32 => "float",
    f64 => "double",
}

impl Describe for () {
    fn builtin_name() -> Option<&'static str> {
        Some("void")
    }
}

impl<T: Describe> Describe for Vec<T> {
    fn structural_name(names: &TypeNames) -> Option<String> {
        names
            .lookup::<T>()
            .map(str::to_string)
            .or_else(|| T::builtin_name().map(str::to_string))
            .or_else(|| T::structural_name(names))
            .map(|element| format!("vector<{}>", element))
    }
}

impl TypeNames {
    /// Create a name registry pre-populated with the built-in names
    pub fn new() -> Self {
        let mut names = FxHashMap::default();
        seed_builtins(&mut names);
        names.insert(TypeId::of::<()>(), "void".to_string());
        Self {
            names,
            fallbacks: Mutex::new(FxHashSet::default()),
        }
    }

    /// Create a name registry with no registrations at all
    pub fn empty() -> Self {
        Self {
            names: FxHashMap::default(),
            fallbacks: Mutex::new(FxHashSet::default()),
        }
    }

    /// Register a display name for `T`, returning the name it replaces
    pub fn register<T: 'static>(&mut self, name: impl Into<String>) -> Option<String> {
        let name = name.into();
        let id = TypeId::of::<T>();
        if self.fallbacks.get_mut().remove(&id) {
            log::warn!(
                "type {} registered as '{}' after it was already resolved by fallback name",
                std::any::type_name::<T>(),
                name
            );
        }
        self.names.insert(id, name)
    }

    /// Explicitly registered name of `T`
    pub fn lookup<T: 'static>(&self) -> Option<&str> {
        self.names.get(&TypeId::of::<T>()).map(String::as_str)
    }

    /// Explicitly registered name for a raw type identity
    pub fn lookup_id(&self, id: TypeId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// Check if `T` has an explicit registration
    pub fn is_registered<T: 'static>(&self) -> bool {
        self.names.contains_key(&TypeId::of::<T>())
    }

    /// Resolve the display name of `T`. Never fails.
    pub fn resolve<T: Describe>(&self) -> String {
        let id = TypeId::of::<T>();
        if let Some(name) = self.names.get(&id) {
            return name.clone();
        }
        if let Some(name) = T::builtin_name() {
            return name.to_string();
        }
        if let Some(name) = T::structural_name(self) {
            return name;
        }

        let fallback = std::any::type_name::<T>();
        if self.fallbacks.lock().insert(id) {
            log::trace!("no registered name for {}, using fallback", fallback);
        }
        fallback.to_string()
    }

    /// All registered names, sorted
    pub fn registered_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.names.values().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered names
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for TypeNames {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeNames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeNames")
            .field("registered", &self.names.len())
            .field("fallbacks", &self.fallbacks.lock().len())
            .finish()
    }
}

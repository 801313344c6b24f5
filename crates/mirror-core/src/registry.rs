//! Class registry
//!
//! An explicit, injectable registry of class descriptors, type names, free
//! functions and enums. Classes register lazily on first access:
//!
//! ```text
//!  class::<C>() ──read lock──> cached?  ──yes──> Arc<TypeDescriptor>
//!                                 │no
//!                  write lock, re-check, claim build slot
//!                                 │
//!                   C::register(&mut Registrar<C>)   (no lock held)
//!                                 │
//!                write lock, insert Arc, publish to readers
//! ```
//!
//! The registry moves from `Building` to `Sealed` once, through
//! [`Registry::seal`]. A sealed registry still serves every descriptor it
//! holds but refuses new classes, type names, functions and enums.

use std::any::TypeId;
use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use once_cell::sync::{Lazy, OnceCell};
use parking_lot::{RwLock, RwLockReadGuard};
use rustc_hash::FxHashMap;

use crate::callable::Callable;
use crate::descriptor::TypeDescriptor;
use crate::enums::{EnumDescriptor, EnumRegistrar};
use crate::error::{ReflectError, ReflectResult};
use crate::function::{FunctionDescriptor, FunctionTable};
use crate::introspect::Reflect;
use crate::names::{Describe, TypeNames};
use crate::options::{DuplicatePolicy, RegistryOptions};
use crate::registrar::Registrar;
use crate::value::Value;

static GLOBAL: Lazy<Registry> = Lazy::new(Registry::new);

/// Registry lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Registrations are accepted
    Building,
    /// Read-only; registrations fail with `Sealed`
    Sealed,
}

type Slot = Arc<OnceCell<Arc<TypeDescriptor>>>;

#[derive(Default)]
struct ClassTable {
    by_id: FxHashMap<TypeId, Arc<TypeDescriptor>>,
    by_name: FxHashMap<String, TypeId>,
    /// Classes whose registration is running
    pending: FxHashMap<TypeId, Slot>,
}

thread_local! {
    static BUILDING: RefCell<Vec<(usize, TypeId)>> = RefCell::new(Vec::new());
}

/// Marks a class as being registered on this thread, for cycle detection
struct BuildGuard {
    key: (usize, TypeId),
}

impl BuildGuard {
    fn enter(registry: &Registry, id: TypeId) -> Option<Self> {
        let key = (registry as *const Registry as usize, id);
        BUILDING.with(|building| {
            let mut building = building.borrow_mut();
            if building.contains(&key) {
                None
            } else {
                building.push(key);
                Some(Self { key })
            }
        })
    }
}

impl Drop for BuildGuard {
    fn drop(&mut self) {
        BUILDING.with(|building| {
            let mut building = building.borrow_mut();
            if let Some(pos) = building.iter().rposition(|key| *key == self.key) {
                building.remove(pos);
            }
        });
    }
}

/// Registry of reflectable classes, type names, functions and enums
pub struct Registry {
    options: RegistryOptions,
    sealed: AtomicBool,
    /// Neither lock is held while `Reflect::register` runs
    classes: RwLock<ClassTable>,
    names: RwLock<TypeNames>,
    functions: RwLock<FunctionTable>,
    enums: RwLock<FxHashMap<String, Arc<EnumDescriptor>>>,
}

impl Registry {
    /// Create a registry with default options
    pub fn new() -> Self {
        Self::with_options(RegistryOptions::default())
    }

    /// Create a registry with custom options
    pub fn with_options(options: RegistryOptions) -> Self {
        Self {
            options,
            sealed: AtomicBool::new(false),
            classes: RwLock::new(ClassTable::default()),
            names: RwLock::new(TypeNames::new()),
            functions: RwLock::new(FunctionTable::default()),
            enums: RwLock::new(FxHashMap::default()),
        }
    }

    /// The process-wide default registry
    pub fn global() -> &'static Registry {
        &GLOBAL
    }

    /// Registry options
    pub fn options(&self) -> &RegistryOptions {
        &self.options
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Current lifecycle phase
    pub fn phase(&self) -> Phase {
        if self.sealed.load(Ordering::Acquire) {
            Phase::Sealed
        } else {
            Phase::Building
        }
    }

    /// Check if the registry is sealed
    pub fn is_sealed(&self) -> bool {
        self.phase() == Phase::Sealed
    }

    /// Seal the registry. Idempotent.
    pub fn seal(&self) {
        let classes = self.classes.write();
        if !self.sealed.swap(true, Ordering::AcqRel) {
            log::debug!("registry sealed with {} classes", classes.by_id.len());
        }
    }

    fn ensure_building(&self, what: impl FnOnce() -> String) -> ReflectResult<()> {
        if self.is_sealed() {
            Err(ReflectError::Sealed(what()))
        } else {
            Ok(())
        }
    }

    // ========================================================================
    // Classes
    // ========================================================================

    /// Descriptor of `C`, registering the class on first access.
    ///
    /// `C::register` runs without any registry lock held, so it may register
    /// the classes it depends on (see [`Registrar::depends_on`]).
    pub fn class<C: Reflect>(&self) -> ReflectResult<Arc<TypeDescriptor>> {
        let id = TypeId::of::<C>();
        if let Some(descriptor) = self.get(id) {
            return Ok(descriptor);
        }

        let _guard = BuildGuard::enter(self, id)
            .ok_or_else(|| ReflectError::CyclicRegistration(C::CLASS_NAME.to_string()))?;

        let slot = {
            let mut classes = self.classes.write();
            if let Some(descriptor) = classes.by_id.get(&id) {
                return Ok(descriptor.clone());
            }
            self.ensure_building(|| format!("class '{}'", C::CLASS_NAME))?;
            self.check_class_name(&classes, id, C::CLASS_NAME)?;
            classes.pending.entry(id).or_default().clone()
        };

        // Concurrent first accesses wait on the same slot and share one build
        let descriptor = match slot.get_or_try_init(|| self.build::<C>()) {
            Ok(descriptor) => descriptor.clone(),
            Err(err) => {
                self.classes.write().pending.remove(&id);
                return Err(err);
            }
        };

        let mut classes = self.classes.write();
        classes.pending.remove(&id);
        if let Some(existing) = classes.by_id.get(&id) {
            return Ok(existing.clone());
        }
        if self.options.duplicates == DuplicatePolicy::Reject {
            // A same-named class may have been published during the build
            self.check_class_name(&classes, id, C::CLASS_NAME)?;
        }
        classes.by_name.insert(C::CLASS_NAME.to_string(), id);
        classes.by_id.insert(id, descriptor.clone());
        Ok(descriptor)
    }

    fn build<C: Reflect>(&self) -> ReflectResult<Arc<TypeDescriptor>> {
        {
            let mut names = self.names.write();
            if !names.is_registered::<C>() {
                names.register::<C>(C::CLASS_NAME);
            }
        }

        let mut descriptor = TypeDescriptor::new(
            C::CLASS_NAME.to_string(),
            TypeId::of::<C>(),
            self.options.constructor_fallback,
        );
        let mut registrar = Registrar::new(&mut descriptor, self, self.options.duplicates);
        C::register(&mut registrar);
        registrar.finish()?;

        log::debug!(
            "registered class '{}': {} members, {} methods, {} constructors",
            descriptor.class_name(),
            descriptor.member_names().len(),
            descriptor.method_names().len(),
            descriptor.constructors().len()
        );
        Ok(Arc::new(descriptor))
    }

    fn check_class_name(&self, classes: &ClassTable, id: TypeId, name: &str) -> ReflectResult<()> {
        match classes.by_name.get(name) {
            Some(existing) if *existing != id => match self.options.duplicates {
                DuplicatePolicy::Replace => {
                    log::warn!(
                        "class name '{}' already used by another type, later registration wins",
                        name
                    );
                    Ok(())
                }
                DuplicatePolicy::Reject => Err(ReflectError::Duplicate {
                    owner: "registry".to_string(),
                    what: "class",
                    name: name.to_string(),
                }),
            },
            _ => Ok(()),
        }
    }

    /// Register `C` eagerly
    pub fn register<C: Reflect>(&self) -> ReflectResult<()> {
        self.class::<C>().map(|_| ())
    }

    /// Descriptor of an already registered type, without registering it
    pub fn get(&self, id: TypeId) -> Option<Arc<TypeDescriptor>> {
        self.classes.read().by_id.get(&id).cloned()
    }

    /// Descriptor of an already registered class by display name
    pub fn descriptor_by_name(&self, name: &str) -> ReflectResult<Arc<TypeDescriptor>> {
        let classes = self.classes.read();
        classes
            .by_name
            .get(name)
            .and_then(|id| classes.by_id.get(id))
            .cloned()
            .ok_or_else(|| ReflectError::ClassNotFound(name.to_string()))
    }

    /// Check if `C` has been registered
    pub fn contains<C: 'static>(&self) -> bool {
        self.classes.read().by_id.contains_key(&TypeId::of::<C>())
    }

    /// Registered class names, sorted
    pub fn class_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.classes.read().by_name.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    // ========================================================================
    // Type names
    // ========================================================================

    /// Register a display name for `T`
    pub fn register_type_name<T: 'static>(&self, name: &str) -> ReflectResult<()> {
        self.ensure_building(|| format!("type name '{}'", name))?;
        self.names.write().register::<T>(name);
        Ok(())
    }

    /// Resolve the display name of `T`
    pub fn resolve<T: Describe>(&self) -> String {
        self.names.read().resolve::<T>()
    }

    /// Read access to the type names
    pub fn type_names(&self) -> RwLockReadGuard<'_, TypeNames> {
        self.names.read()
    }

    // ========================================================================
    // Free functions
    // ========================================================================

    /// Register a free function of up to eight parameters
    pub fn register_function<F, M>(&self, name: &str, f: F) -> ReflectResult<()>
    where
        F: Callable<M>,
        F::Output: Clone + Describe,
    {
        self.ensure_building(|| format!("function '{}'", name))?;
        let descriptor = FunctionDescriptor::new(name, f, &self.names.read());

        let mut functions = self.functions.write();
        if functions.contains(name) {
            match self.options.duplicates {
                DuplicatePolicy::Replace => {
                    log::warn!("function '{}' registered twice, later registration wins", name)
                }
                DuplicatePolicy::Reject => {
                    return Err(ReflectError::Duplicate {
                        owner: "registry".to_string(),
                        what: "function",
                        name: name.to_string(),
                    })
                }
            }
        }
        functions.insert(descriptor);
        Ok(())
    }

    /// Look up a function by name
    pub fn function(&self, name: &str) -> ReflectResult<Arc<FunctionDescriptor>> {
        self.functions.read().get(name)
    }

    /// Call a function by name
    pub fn call_function(&self, name: &str, args: &[Value]) -> ReflectResult<Value> {
        let function = self.function(name)?;
        function.invoke(args)
    }

    /// Check if a function is registered
    pub fn has_function(&self, name: &str) -> bool {
        self.functions.read().contains(name)
    }

    /// Registered function names, sorted
    pub fn function_names(&self) -> Vec<String> {
        self.functions.read().names()
    }

    // ========================================================================
    // Enums
    // ========================================================================

    /// Start describing enum `E` under `name`
    ///
    /// ```ignore
    /// registry
    ///     .register_enum::<Color>("Color")
    ///     .value("Red", Color::Red)
    ///     .value("Green", Color::Green)
    ///     .build()?;
    /// ```
    pub fn register_enum<E>(&self, name: &str) -> EnumRegistrar<'_, E>
    where
        E: Copy + Into<i64> + Send + Sync + 'static,
    {
        EnumRegistrar::new(self, name)
    }

    pub(crate) fn insert_enum<E: 'static>(
        &self,
        descriptor: EnumDescriptor,
    ) -> ReflectResult<Arc<EnumDescriptor>> {
        self.ensure_building(|| format!("enum '{}'", descriptor.name()))?;

        let mut enums = self.enums.write();
        if enums.contains_key(descriptor.name()) {
            match self.options.duplicates {
                DuplicatePolicy::Replace => log::warn!(
                    "enum '{}' registered twice, later registration wins",
                    descriptor.name()
                ),
                DuplicatePolicy::Reject => {
                    return Err(ReflectError::Duplicate {
                        owner: "registry".to_string(),
                        what: "enum",
                        name: descriptor.name().to_string(),
                    })
                }
            }
        }

        self.names.write().register::<E>(descriptor.name());
        log::debug!(
            "registered enum '{}' with {} values",
            descriptor.name(),
            descriptor.len()
        );
        let descriptor = Arc::new(descriptor);
        enums.insert(descriptor.name().to_string(), descriptor.clone());
        Ok(descriptor)
    }

    /// Look up an enum by name
    pub fn enumeration(&self, name: &str) -> ReflectResult<Arc<EnumDescriptor>> {
        self.enums
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ReflectError::EnumNotFound(name.to_string()))
    }

    /// Registered enum names, sorted
    pub fn enum_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.enums.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("phase", &self.phase())
            .field("classes", &self.class_names())
            .field("functions", &self.function_names())
            .field("enums", &self.enum_names())
            .finish()
    }
}

//! Registry configuration

/// What happens when a class registers two members, methods or functions
/// under the same name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Later registration replaces the earlier one; a warning is logged
    #[default]
    Replace,
    /// Registration of the class fails with `ReflectError::Duplicate`
    Reject,
}

/// What `construct` does when no constructor takes the supplied argument count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConstructorFallback {
    /// Fail with `ReflectError::NoMatchingConstructor`
    #[default]
    Strict,
    /// Fall back to the constructor registered with `default_constructor()`
    DefaultConstruct,
}

/// Registry configuration options
#[derive(Debug, Clone, Default)]
pub struct RegistryOptions {
    /// Duplicate name handling during class registration
    pub duplicates: DuplicatePolicy,
    /// Constructor selection fallback
    pub constructor_fallback: ConstructorFallback,
}

impl RegistryOptions {
    /// Options that reject duplicates and never default-construct
    pub fn strict() -> Self {
        Self {
            duplicates: DuplicatePolicy::Reject,
            constructor_fallback: ConstructorFallback::Strict,
        }
    }

    /// Set the duplicate policy
    pub fn with_duplicates(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicates = policy;
        self
    }

    /// Set the constructor fallback
    pub fn with_constructor_fallback(mut self, fallback: ConstructorFallback) -> Self {
        self.constructor_fallback = fallback;
        self
    }
}

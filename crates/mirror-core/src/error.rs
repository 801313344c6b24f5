//! Error types for registry lookups and by-name dispatch

/// Result type for registry and dispatch operations
pub type ReflectResult<T> = Result<T, ReflectError>;

/// Coarse classification of a [`ReflectError`].
///
/// Generators use this to pick a host-side failure without matching on
/// every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unknown member, method, function, class or enum value name
    NotFound,
    /// Call or construction with the wrong number of arguments
    ArgumentCount,
    /// An erased value held a different type than the one requested
    CastMismatch,
    /// No host converter exists for a resolved type name
    UnregisteredType,
    /// Two registrations under the same name
    Collision,
    /// Operation not allowed in the registry's current phase or on this receiver
    Lifecycle,
}

/// Registry and dispatch error types
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReflectError {
    /// Unknown member name
    #[error("Member '{name}' not found in class '{class}'")]
    MemberNotFound {
        /// Class that was searched
        class: String,
        /// Requested member name
        name: String,
    },

    /// Unknown method name
    #[error("Method '{name}' not found in class '{class}'")]
    MethodNotFound {
        /// Class that was searched
        class: String,
        /// Requested method name
        name: String,
    },

    /// Unknown free function name
    #[error("Function '{0}' not found")]
    FunctionNotFound(String),

    /// Unknown class (by name or not yet registered)
    #[error("Class '{0}' not found")]
    ClassNotFound(String),

    /// Unknown enum name
    #[error("Enum '{0}' not found")]
    EnumNotFound(String),

    /// Unknown enum value (by name or numeric value)
    #[error("Enum value '{value}' not found in enum '{enum_name}'")]
    EnumValueNotFound {
        /// Enum that was searched
        enum_name: String,
        /// Requested name, or the numeric value rendered as text
        value: String,
    },

    /// Wrong arity for a method, function or constructor
    #[error("Incorrect number of arguments for '{name}'. Expected {expected}, got {got}")]
    ArgumentCount {
        /// Callable name
        name: String,
        /// Registered parameter count
        expected: usize,
        /// Supplied argument count
        got: usize,
    },

    /// Erased value holds a different type
    #[error("Type mismatch: expected {expected}, got {found}")]
    CastMismatch {
        /// Requested type
        expected: String,
        /// Type actually held
        found: String,
    },

    /// Erased argument holds a different type than the parameter
    #[error("Argument {index} of '{name}': expected {expected}, got {found}")]
    ArgumentMismatch {
        /// Callable name
        name: String,
        /// Zero-based argument position
        index: usize,
        /// Parameter type
        expected: String,
        /// Type actually held
        found: String,
    },

    /// Instance handed to a descriptor is not of the described class
    #[error("Instance is not a '{expected}'")]
    InstanceMismatch {
        /// Class the descriptor belongs to
        expected: String,
    },

    /// Mutating method invoked through a shared reference
    #[error("Method '{name}' of class '{class}' needs a mutable receiver")]
    ExclusiveReceiver {
        /// Class name
        class: String,
        /// Method name
        name: String,
    },

    /// Write to a property registered without a setter
    #[error("Member '{name}' of class '{class}' is read-only")]
    ReadOnly {
        /// Class name
        class: String,
        /// Member name
        name: String,
    },

    /// No constructor accepts the supplied argument count
    #[error("No constructor of '{class}' takes {got} arguments")]
    NoMatchingConstructor {
        /// Class name
        class: String,
        /// Supplied argument count
        got: usize,
    },

    /// No host converter for a type name
    #[error("Unsupported type: {0}")]
    UnregisteredType(String),

    /// Same name registered twice under the rejecting policy
    #[error("Duplicate {what} '{name}' in '{owner}'")]
    Duplicate {
        /// Class, enum or registry the name belongs to
        owner: String,
        /// "member", "method", "function", ...
        what: &'static str,
        /// Colliding name
        name: String,
    },

    /// Registration attempted after the registry was sealed
    #[error("Registry is sealed: cannot register {0}")]
    Sealed(String),

    /// A class's registration asked for that same class again
    #[error("Class '{0}' depends on itself during registration")]
    CyclicRegistration(String),
}

impl ReflectError {
    /// Classify this error into the dispatch error taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReflectError::MemberNotFound { .. }
            | ReflectError::MethodNotFound { .. }
            | ReflectError::FunctionNotFound(_)
            | ReflectError::ClassNotFound(_)
            | ReflectError::EnumNotFound(_)
            | ReflectError::EnumValueNotFound { .. } => ErrorKind::NotFound,
            ReflectError::ArgumentCount { .. } | ReflectError::NoMatchingConstructor { .. } => {
                ErrorKind::ArgumentCount
            }
            ReflectError::CastMismatch { .. }
            | ReflectError::ArgumentMismatch { .. }
            | ReflectError::InstanceMismatch { .. } => ErrorKind::CastMismatch,
            ReflectError::UnregisteredType(_) => ErrorKind::UnregisteredType,
            ReflectError::Duplicate { .. } => ErrorKind::Collision,
            ReflectError::ExclusiveReceiver { .. }
            | ReflectError::ReadOnly { .. }
            | ReflectError::Sealed(_)
            | ReflectError::CyclicRegistration(_) => ErrorKind::Lifecycle,
        }
    }

    /// Check if this is a not-found error
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub(crate) fn cast<T: ?Sized>(found: &str) -> Self {
        ReflectError::CastMismatch {
            expected: std::any::type_name::<T>().to_string(),
            found: found.to_string(),
        }
    }
}

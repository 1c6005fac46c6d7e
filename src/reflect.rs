use std::collections::HashMap;
use std::path::Path;

use crate::descriptor::TypeDescriptor;
use crate::error::ReflectError;

/// Produces type descriptors on demand.
///
/// Failures are never fatal: walkers skip the item and filters treat the
/// missing descriptor as "no match".
pub trait Reflector {
    fn reflect_name(&self, name: &str) -> Result<TypeDescriptor, ReflectError>;

    /// Reflects `name`, which the caller discovered in `path`.
    fn reflect_file(&self, name: &str, path: &Path) -> Result<TypeDescriptor, ReflectError> {
        let _ = path;
        self.reflect_name(name)
    }
}

impl<R: Reflector + ?Sized> Reflector for &R {
    fn reflect_name(&self, name: &str) -> Result<TypeDescriptor, ReflectError> {
        (**self).reflect_name(name)
    }

    fn reflect_file(&self, name: &str, path: &Path) -> Result<TypeDescriptor, ReflectError> {
        (**self).reflect_file(name, path)
    }
}

impl<R: Reflector + ?Sized> Reflector for Box<R> {
    fn reflect_name(&self, name: &str) -> Result<TypeDescriptor, ReflectError> {
        (**self).reflect_name(name)
    }

    fn reflect_file(&self, name: &str, path: &Path) -> Result<TypeDescriptor, ReflectError> {
        (**self).reflect_file(name, path)
    }
}

/// Reflector over a fixed set of descriptors, for embedders that already
/// hold the metadata (and for tests).
#[derive(Debug, Clone, Default)]
pub struct StaticReflector {
    types: HashMap<String, TypeDescriptor>,
}

impl StaticReflector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, descriptor: TypeDescriptor) -> Self {
        self.insert(descriptor);
        self
    }

    pub fn insert(&mut self, descriptor: TypeDescriptor) {
        self.types.insert(descriptor.name.clone(), descriptor);
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl FromIterator<TypeDescriptor> for StaticReflector {
    fn from_iter<T: IntoIterator<Item = TypeDescriptor>>(iter: T) -> Self {
        let mut reflector = Self::new();
        for descriptor in iter {
            reflector.insert(descriptor);
        }
        reflector
    }
}

impl Reflector for StaticReflector {
    fn reflect_name(&self, name: &str) -> Result<TypeDescriptor, ReflectError> {
        self.types
            .get(name)
            .cloned()
            .ok_or_else(|| ReflectError::NotFound {
                name: name.to_string(),
            })
    }
}

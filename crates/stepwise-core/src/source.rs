use std::collections::BTreeMap;
use std::rc::Rc;

use crate::error::MigrationError;
use crate::unit::Migration;

/// An enumerable collection of migration units.
///
/// Implementations report every entry they hold, including ones whose
/// identifier does not follow the `NNN_name` grammar; filtering and
/// validation belong to the repository.
pub trait UnitSource {
    /// Identifiers of all entries, in no particular order.
    fn identifiers(&self) -> Result<Vec<String>, MigrationError>;

    /// Load the unit behind `identifier`.
    ///
    /// `Ok(None)` means the entry exists but yields no runnable unit.
    fn load(&self, identifier: &str) -> Result<Option<Rc<dyn Migration>>, MigrationError>;
}

impl<S: UnitSource + ?Sized> UnitSource for &S {
    fn identifiers(&self) -> Result<Vec<String>, MigrationError> {
        (**self).identifiers()
    }

    fn load(&self, identifier: &str) -> Result<Option<Rc<dyn Migration>>, MigrationError> {
        (**self).load(identifier)
    }
}

impl<S: UnitSource + ?Sized> UnitSource for Box<S> {
    fn identifiers(&self) -> Result<Vec<String>, MigrationError> {
        (**self).identifiers()
    }

    fn load(&self, identifier: &str) -> Result<Option<Rc<dyn Migration>>, MigrationError> {
        (**self).load(identifier)
    }
}

/// Units registered explicitly in code, keyed by identifier.
#[derive(Default, Clone)]
pub struct Registry {
    units: BTreeMap<String, Rc<dyn Migration>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `unit` under `identifier`, replacing any earlier registration
    /// with the same identifier.
    pub fn register(
        &mut self,
        identifier: impl Into<String>,
        unit: impl Migration + 'static,
    ) -> &mut Self {
        self.units.insert(identifier.into(), Rc::new(unit));
        self
    }

    pub fn with(mut self, identifier: impl Into<String>, unit: impl Migration + 'static) -> Self {
        self.register(identifier, unit);
        self
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("identifiers", &self.units.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl UnitSource for Registry {
    fn identifiers(&self) -> Result<Vec<String>, MigrationError> {
        Ok(self.units.keys().cloned().collect())
    }

    fn load(&self, identifier: &str) -> Result<Option<Rc<dyn Migration>>, MigrationError> {
        Ok(self.units.get(identifier).cloned())
    }
}

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use stepwise_core::{
    Direction, Migration, MigrationError, UnitId, UnitSource, key_prefix, parse_identifier,
};

/// A unit located in the source collection and loaded.
#[derive(Clone)]
pub struct ResolvedUnit {
    pub id: UnitId,
    pub unit: Rc<dyn Migration>,
}

impl ResolvedUnit {
    pub fn order_key(&self) -> u32 {
        self.id.order_key
    }

    /// Derived name, e.g. `Migration_Create_users`.
    pub fn class_name(&self) -> String {
        self.id.class_name()
    }
}

impl fmt::Debug for ResolvedUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedUnit").field("id", &self.id).finish()
    }
}

/// Discovers and loads units from a [`UnitSource`].
///
/// The identifier listing is taken once and reused until [`refresh`] is
/// called. Loaded units are cached by identifier for the same span, so
/// resolving a key twice within one run returns the same unit while the next
/// run reloads it from the source.
///
/// [`refresh`]: UnitRepository::refresh
pub struct UnitRepository<S> {
    source: S,
    identifiers: Option<Vec<String>>,
    loaded: HashMap<String, Rc<dyn Migration>>,
}

impl<S: UnitSource> UnitRepository<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            identifiers: None,
            loaded: HashMap::new(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Forget the identifier listing and every loaded unit so the next lookup
    /// rescans and reloads from the source.
    pub fn refresh(&mut self) {
        self.identifiers = None;
        self.loaded.clear();
    }

    fn identifiers(&mut self) -> Result<&[String], MigrationError> {
        if self.identifiers.is_none() {
            let listed = self.source.identifiers()?;
            tracing::debug!(count = listed.len(), "scanned migration source");
            self.identifiers = Some(listed);
        }
        Ok(self.identifiers.as_deref().unwrap_or_default())
    }

    /// Entries following the `NNN_name` grammar, ordered by order key.
    /// Entries that do not follow it are skipped.
    pub fn list_candidates(&mut self) -> Result<Vec<UnitId>, MigrationError> {
        let mut candidates: Vec<UnitId> = self
            .identifiers()?
            .iter()
            .filter_map(|id| parse_identifier(id))
            .collect();
        candidates.sort_by(|a, b| {
            a.order_key
                .cmp(&b.order_key)
                .then_with(|| a.identifier.cmp(&b.identifier))
        });
        Ok(candidates)
    }

    /// Highest order key among the valid candidates.
    pub fn latest_key(&mut self) -> Result<u32, MigrationError> {
        self.list_candidates()?
            .last()
            .map(|id| id.order_key)
            .ok_or(MigrationError::NoMigrationsFound)
    }

    /// Locate the single entry for `order_key` and validate its identifier.
    pub fn find(&mut self, order_key: u32) -> Result<UnitId, MigrationError> {
        let prefix = key_prefix(order_key);
        let matches: Vec<&String> = self
            .identifiers()?
            .iter()
            .filter(|id| id.starts_with(&prefix))
            .collect();

        match matches.as_slice() {
            [] => Err(MigrationError::MissingVersion(order_key)),
            [identifier] => parse_identifier(identifier)
                .ok_or_else(|| MigrationError::InvalidIdentifier((*identifier).clone())),
            _ => Err(MigrationError::AmbiguousVersion(order_key)),
        }
    }

    /// Load the unit behind `id` and check it can run both ways.
    pub fn load(&mut self, id: UnitId) -> Result<ResolvedUnit, MigrationError> {
        if let Some(unit) = self.loaded.get(&id.identifier) {
            return Ok(ResolvedUnit {
                id,
                unit: Rc::clone(unit),
            });
        }

        let unit = self
            .source
            .load(&id.identifier)?
            .ok_or_else(|| MigrationError::UnitNotExecutable(id.class_name()))?;

        if !unit.supports(Direction::Up) || !unit.supports(Direction::Down) {
            return Err(MigrationError::UnitNotExecutable(id.class_name()));
        }

        self.loaded.insert(id.identifier.clone(), Rc::clone(&unit));
        Ok(ResolvedUnit { id, unit })
    }

    /// [`find`](Self::find) followed by [`load`](Self::load).
    pub fn resolve_unit(&mut self, order_key: u32) -> Result<ResolvedUnit, MigrationError> {
        let id = self.find(order_key)?;
        self.load(id)
    }
}

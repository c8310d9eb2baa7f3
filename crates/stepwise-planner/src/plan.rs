use std::collections::HashSet;

use stepwise_core::{Direction, MigrationError, UnitSource};

use crate::repository::{ResolvedUnit, UnitRepository};

/// Validated, ordered units for one run.
#[derive(Debug, Clone)]
pub struct MigrationPlan {
    pub direction: Direction,
    /// Stored version when the plan was computed.
    pub from: u32,
    /// Version the store holds once every unit has run. For an upward plan
    /// this is the last unit found, which may be below the requested target.
    pub to: u32,
    pub units: Vec<ResolvedUnit>,
}

impl MigrationPlan {
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Version stored after the unit at `index` completes.
    pub fn version_after(&self, index: usize) -> u32 {
        let steps = index as u32 + 1;
        match self.direction {
            Direction::Up => self.from + steps,
            Direction::Down => self.from - steps,
        }
    }
}

/// Compute and validate the plan taking the schema from `current` to `target`.
///
/// Walking upward, the first missing order key ends the plan early so a
/// target beyond the newest unit means "as far as units exist". Walking
/// downward every key must be present, since each applied step has to be
/// reverted. Any other problem aborts the whole plan; nothing is executed
/// until every unit has been validated.
pub fn plan_migration<S: UnitSource>(
    repository: &mut UnitRepository<S>,
    current: u32,
    target: u32,
) -> Result<MigrationPlan, MigrationError> {
    let direction = if target > current {
        Direction::Up
    } else {
        Direction::Down
    };

    let keys: Box<dyn Iterator<Item = u32>> = match direction {
        Direction::Up => Box::new(current + 1..=target),
        Direction::Down => Box::new((target..current).rev().map(|k| k + 1)),
    };

    let mut names = HashSet::new();
    let mut units = Vec::new();

    for key in keys {
        let id = match repository.find(key) {
            Ok(id) => id,
            Err(MigrationError::MissingVersion(_)) if direction.is_up() => {
                tracing::debug!(key, "no unit at order key, stopping upward plan");
                break;
            }
            Err(err) => return Err(err),
        };

        if !names.insert(id.name.clone()) {
            return Err(MigrationError::DuplicateName(id.name));
        }

        units.push(repository.load(id)?);
    }

    let steps = units.len() as u32;
    let to = match direction {
        Direction::Up => current + steps,
        Direction::Down => current - steps,
    };

    Ok(MigrationPlan {
        direction,
        from: current,
        to,
        units,
    })
}

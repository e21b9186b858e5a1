use crate::error::Result;
use crate::gateway::{Gateway, Unit};

/// Maps step names to units.
///
/// Every call lists units afresh. Units can be recreated between steps (an
/// earlier step may regenerate them), so ids are never memoized.
pub struct UnitResolver<'a> {
    gateway: &'a dyn Gateway,
}

impl<'a> UnitResolver<'a> {
    pub fn new(gateway: &'a dyn Gateway) -> Self {
        Self { gateway }
    }

    /// Exact, case-sensitive name match; first match in listing order wins.
    /// `Ok(None)` when no unit carries the name.
    pub fn resolve(&self, name: &str) -> Result<Option<Unit>> {
        let units = self.gateway.list_units()?;
        Ok(units.into_iter().find(|unit| unit.name == name))
    }
}

//! Manufacturing constraints applied to the conformal system.
//!
//! Callers describe their process (material thickness, cutting tolerance,
//! bend radius, ...) as named values. Each name is handled by a
//! [`SystemAdjuster`] registered under it; names without an adjuster are
//! reported back as unsupported instead of being ignored.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use super::lscm::ConformalSystem;
use crate::error::Result;

/// Named manufacturing parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManufacturingConstraints {
    values: BTreeMap<String, f64>,
}

impl ManufacturingConstraints {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a value.
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.insert(name, value);
        self
    }

    /// Add or replace a value.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }

    /// Value of `name`, if set.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(name, value)` in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.values.iter().map(|(k, &v)| (k.as_str(), v))
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for ManufacturingConstraints {
    fn from_iter<T: IntoIterator<Item = (S, f64)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Modifies a conformal system for one manufacturing parameter.
pub trait SystemAdjuster: Send + Sync {
    /// Adjust `system` for the parameter `value`.
    fn adjust(&self, system: &mut ConformalSystem, value: f64) -> Result<()>;
}

/// Adjusters keyed by constraint name.
///
/// The default registry is empty.
#[derive(Clone, Default)]
pub struct AdjusterRegistry {
    adjusters: HashMap<String, Arc<dyn SystemAdjuster>>,
}

impl AdjusterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `adjuster` under `name`, replacing any previous one.
    pub fn register(&mut self, name: impl Into<String>, adjuster: impl SystemAdjuster + 'static) {
        self.adjusters.insert(name.into(), Arc::new(adjuster));
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, name: impl Into<String>, adjuster: impl SystemAdjuster + 'static) -> Self {
        self.register(name, adjuster);
        self
    }

    /// Whether an adjuster is registered for `name`.
    pub fn supports(&self, name: &str) -> bool {
        self.adjusters.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.adjusters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for AdjusterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdjusterRegistry")
            .field("adjusters", &self.names())
            .finish()
    }
}

/// Which constraints were applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManufacturingOutcome {
    /// Names handled by a registered adjuster.
    pub applied: Vec<String>,
    /// Names with no registered adjuster.
    pub unsupported: Vec<String>,
}

/// Run the registered adjuster for every constraint, in name order.
///
/// # Errors
///
/// Propagates the first adjuster error.
pub fn apply_manufacturing_constraints(
    system: &mut ConformalSystem,
    constraints: &ManufacturingConstraints,
    registry: &AdjusterRegistry,
) -> Result<ManufacturingOutcome> {
    let mut outcome = ManufacturingOutcome::default();
    for (name, value) in constraints.iter() {
        match registry.adjusters.get(name) {
            Some(adjuster) => {
                adjuster.adjust(system, value)?;
                outcome.applied.push(name.to_string());
            }
            None => {
                log::debug!("no adjuster for manufacturing constraint '{}'", name);
                outcome.unsupported.push(name.to_string());
            }
        }
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::parameterize::{LscmOptions, LscmSolver};
    use crate::error::MeshError;
    use crate::mesh::TriangleMesh;

    /// Scales every right-hand side entry.
    struct ScaleRhs;

    impl SystemAdjuster for ScaleRhs {
        fn adjust(&self, system: &mut ConformalSystem, value: f64) -> Result<()> {
            system.rhs *= value;
            Ok(())
        }
    }

    struct Reject;

    impl SystemAdjuster for Reject {
        fn adjust(&self, _system: &mut ConformalSystem, value: f64) -> Result<()> {
            Err(MeshError::invalid_param("thickness", value, "must be below 1"))
        }
    }

    fn square_system() -> ConformalSystem {
        let mesh = TriangleMesh::from_arrays(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            &[[0, 1, 2], [0, 2, 3]],
        );
        LscmSolver::new(&mesh, LscmOptions::default())
            .unwrap()
            .build_conformal_system()
            .unwrap()
    }

    #[test]
    fn test_default_registry_reports_unsupported() {
        let mut system = square_system();
        let constraints = ManufacturingConstraints::new()
            .with("thickness", 0.5)
            .with("bend_radius", 2.0);

        let outcome =
            apply_manufacturing_constraints(&mut system, &constraints, &AdjusterRegistry::default()).unwrap();
        assert!(outcome.applied.is_empty());
        assert_eq!(outcome.unsupported, vec!["bend_radius", "thickness"]);
    }

    #[test]
    fn test_registered_adjuster_runs() {
        let mut system = square_system();
        system.rhs[0] = 1.0;
        let registry = AdjusterRegistry::new().with("scale", ScaleRhs);
        let constraints: ManufacturingConstraints = [("scale", 3.0), ("kerf", 0.1)].into_iter().collect();

        let outcome = apply_manufacturing_constraints(&mut system, &constraints, &registry).unwrap();
        assert_eq!(outcome.applied, vec!["scale"]);
        assert_eq!(outcome.unsupported, vec!["kerf"]);
        assert_eq!(system.rhs[0], 3.0);
    }

    #[test]
    fn test_adjuster_error_propagates() {
        let mut system = square_system();
        let registry = AdjusterRegistry::new().with("thickness", Reject);
        let constraints = ManufacturingConstraints::new().with("thickness", 2.0);

        let err = apply_manufacturing_constraints(&mut system, &constraints, &registry).unwrap_err();
        assert!(matches!(err, MeshError::InvalidParameter { .. }));
    }

    #[test]
    fn test_registry_debug_lists_names() {
        let registry = AdjusterRegistry::new().with("b", ScaleRhs).with("a", ScaleRhs);
        assert_eq!(registry.names(), vec!["a", "b"]);
        assert!(format!("{:?}", registry).contains("\"a\""));
        assert!(registry.supports("a"));
        assert!(!registry.supports("c"));
    }
}

//! Decomposition backend registry
//!
//! Numerical decompositions live outside the container core. A backend is a
//! [`DecompositionBackend`] trait object registered at startup; it reports
//! whether it can run in this process through [`Availability`] instead of
//! failing on first use. [`BackendRegistry::decompose`] routes a request to the
//! first available backend that supports it and fails with
//! [`GridError::BackendUnavailable`] when there is none.
//!
//! ```
//! use gridmat_core::{DenseND, GridError, Matrix};
//! use gridmat_exec::{BackendRegistry, Decomposition};
//!
//! let registry = BackendRegistry::new();
//! let m = Matrix::new(DenseND::<f64>::zeros(&[2, 2]));
//! assert!(matches!(
//!     registry.decompose(Decomposition::Svd, &m),
//!     Err(GridError::BackendUnavailable { .. })
//! ));
//! ```

use gridmat_core::{GridError, GridResult, Matrix};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Decompositions a backend may offer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Decomposition {
    /// `{U, S, V}`
    Svd,
    /// `{Q, R}`
    Qr,
    /// `{L, U, P}`
    Lu,
    /// `{values, vectors}`
    Eigen,
    /// `{L}`
    Cholesky,
    Inverse,
    /// Least-squares solve, the second operand is the right-hand side
    Solve,
}

impl fmt::Display for Decomposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Whether a backend can run in this process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Availability {
    Available,
    /// Missing runtime support, with the reason
    Unavailable(String),
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }
}

/// A pluggable provider of decompositions.
///
/// Inputs and outputs are ordinary containers. Backends allocate their
/// results however they like and report failures through `anyhow`; the
/// registry turns them into [`GridError`]s.
pub trait DecompositionBackend: Send + Sync {
    fn name(&self) -> &str;

    fn availability(&self) -> Availability {
        Availability::Available
    }

    fn supports(&self, kind: Decomposition) -> bool;

    /// Run `kind` on `operands`, returning the result containers in the
    /// order documented on [`Decomposition`].
    fn decompose(&self, kind: Decomposition, operands: &[Matrix]) -> anyhow::Result<Vec<Matrix>>;
}

/// Registered backends, searched in registration order.
#[derive(Clone, Default)]
pub struct BackendRegistry {
    backends: Arc<RwLock<Vec<Arc<dyn DecompositionBackend>>>>,
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("backends", &self.names())
            .finish()
    }
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, backend: Arc<dyn DecompositionBackend>) {
        tracing::debug!(
            backend = backend.name(),
            available = backend.availability().is_available(),
            "registering decomposition backend"
        );
        self.backends.write().push(backend);
    }

    pub fn names(&self) -> Vec<String> {
        self.backends
            .read()
            .iter()
            .map(|b| b.name().to_string())
            .collect()
    }

    /// First available backend supporting `kind`.
    pub fn find(&self, kind: Decomposition) -> Option<Arc<dyn DecompositionBackend>> {
        self.backends
            .read()
            .iter()
            .find(|b| b.supports(kind) && b.availability().is_available())
            .cloned()
    }

    fn unavailable(&self, kind: Decomposition) -> GridError {
        let backends = self.backends.read();
        let reason = backends
            .iter()
            .filter(|b| b.supports(kind))
            .find_map(|b| match b.availability() {
                Availability::Unavailable(why) => Some(format!("{}: {}", b.name(), why)),
                Availability::Available => None,
            })
            .unwrap_or_else(|| "no registered backend supports it".to_string());
        GridError::BackendUnavailable {
            request: kind.to_string(),
            reason,
        }
    }

    pub fn decompose(&self, kind: Decomposition, matrix: &Matrix) -> GridResult<Vec<Matrix>> {
        self.decompose_with(kind, std::slice::from_ref(matrix))
    }

    /// Like [`decompose`](Self::decompose), for requests taking several
    /// operands such as [`Decomposition::Solve`].
    pub fn decompose_with(
        &self,
        kind: Decomposition,
        operands: &[Matrix],
    ) -> GridResult<Vec<Matrix>> {
        let backend = self.find(kind).ok_or_else(|| self.unavailable(kind))?;
        tracing::debug!(backend = backend.name(), %kind, "running decomposition");
        backend
            .decompose(kind, operands)
            .map_err(|e| GridError::BackendUnavailable {
                request: kind.to_string(),
                reason: format!("{} failed: {:#}", backend.name(), e),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::MatrixCalcExt;
    use crate::CalculationExt;
    use anyhow::{bail, Context};
    use gridmat_core::{DenseND, Value};

    /// Transposes for `Inverse` on permutation matrices; fails otherwise.
    struct PermutationBackend;

    impl DecompositionBackend for PermutationBackend {
        fn name(&self) -> &str {
            "permutation"
        }

        fn supports(&self, kind: Decomposition) -> bool {
            kind == Decomposition::Inverse
        }

        fn decompose(
            &self,
            _kind: Decomposition,
            operands: &[Matrix],
        ) -> anyhow::Result<Vec<Matrix>> {
            let m = operands.first().context("missing operand")?;
            for coord in m.all_coordinates() {
                let v = m.get_as_double(&coord)?;
                if v != 0.0 && v != 1.0 {
                    bail!("not a permutation matrix at {coord}");
                }
            }
            let inverse = m.transpose()?.calc_new()?;
            if let Some(annotation) = m.annotation() {
                inverse.set_annotation(Some(annotation));
            }
            Ok(vec![inverse])
        }
    }

    struct MissingRuntime;

    impl DecompositionBackend for MissingRuntime {
        fn name(&self) -> &str {
            "native-lapack"
        }

        fn availability(&self) -> Availability {
            Availability::Unavailable("library not loaded".into())
        }

        fn supports(&self, _kind: Decomposition) -> bool {
            true
        }

        fn decompose(
            &self,
            _kind: Decomposition,
            _operands: &[Matrix],
        ) -> anyhow::Result<Vec<Matrix>> {
            unreachable!("never selected while unavailable")
        }
    }

    fn permutation() -> Matrix {
        Matrix::new(DenseND::from_rows(vec![vec![0.0, 1.0], vec![1.0, 0.0]]).unwrap())
    }

    #[test]
    fn test_routes_to_supporting_backend() {
        let registry = BackendRegistry::new();
        registry.register(Arc::new(MissingRuntime));
        registry.register(Arc::new(PermutationBackend));
        assert_eq!(registry.names(), vec!["native-lapack", "permutation"]);

        let source = permutation();
        source.with_annotation(|a| a.set_label(Value::from("swap")));
        let out = registry.decompose(Decomposition::Inverse, &source).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].get_as_double(&[0, 1]).unwrap(), 1.0);
        let annotation = out[0].annotation().unwrap();
        assert_eq!(annotation.label(), Some(&Value::from("swap")));
    }

    #[test]
    fn test_unavailable_reports_reason() {
        let registry = BackendRegistry::new();
        registry.register(Arc::new(MissingRuntime));
        let err = registry
            .decompose(Decomposition::Svd, &permutation())
            .unwrap_err();
        match err {
            GridError::BackendUnavailable { request, reason } => {
                assert_eq!(request, "Svd");
                assert!(reason.contains("library not loaded"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_backend_failure_is_wrapped() {
        let registry = BackendRegistry::new();
        registry.register(Arc::new(PermutationBackend));
        let m = Matrix::new(DenseND::from_elem(&[2, 2], 3.0));
        let err = registry.decompose(Decomposition::Inverse, &m).unwrap_err();
        assert!(err.to_string().contains("not a permutation matrix"));
    }
}

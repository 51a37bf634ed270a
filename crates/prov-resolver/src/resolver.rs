//! Public entry point.

use prov_binder::BindingOracle;
use prov_common::CancellationToken;
use prov_syntax::NodeIndex;
use tracing::{Level, debug, span};

use crate::context::ResolveContext;
use crate::error::Result;
use crate::provenance::Provenance;
use crate::recursion::RecursionProfile;

/// Resolver configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Depth and work budget for each top-level resolution.
    pub profile: RecursionProfile,
}

/// Answers "where could the value of this expression have come from?".
///
/// The resolver holds no state between calls: every [`resolve`](Self::resolve)
/// gets a fresh recursion guard, so one resolver can be shared across
/// threads whenever the oracle can.
pub struct ProvenanceResolver<'r, O: BindingOracle + ?Sized> {
    oracle: &'r O,
    options: ResolverOptions,
}

impl<'r, O: BindingOracle + ?Sized> ProvenanceResolver<'r, O> {
    pub fn new(oracle: &'r O) -> Self {
        Self::with_options(oracle, ResolverOptions::default())
    }

    pub fn with_options(oracle: &'r O, options: ResolverOptions) -> Self {
        Self { oracle, options }
    }

    pub fn options(&self) -> ResolverOptions {
        self.options
    }

    /// Trace `expression` back to its origins.
    ///
    /// Returns [`ResolveError::Abandoned`](crate::ResolveError::Abandoned) as
    /// soon as `cancel` is observed; no partial result is kept.
    pub fn resolve(&self, expression: NodeIndex, cancel: &CancellationToken) -> Result<Provenance> {
        let span = span!(Level::DEBUG, "resolve", node = expression.0);
        let _enter = span.enter();

        let context = ResolveContext::new(self.oracle, cancel, self.options.profile);
        let result = context.run(expression);
        match &result {
            Ok(provenance) => debug!(entries = provenance.len(), "resolved"),
            Err(err) => debug!(%err, "resolution failed"),
        }
        result
    }

    /// Resolve several expressions, each with its own guard. Stops at the
    /// first cancellation.
    pub fn resolve_all(
        &self,
        expressions: &[NodeIndex],
        cancel: &CancellationToken,
    ) -> Result<Vec<Provenance>> {
        expressions
            .iter()
            .map(|&expression| self.resolve(expression, cancel))
            .collect()
    }
}

/// Resolve one expression with default options.
pub fn resolve<O: BindingOracle + ?Sized>(
    oracle: &O,
    expression: NodeIndex,
    cancel: &CancellationToken,
) -> Result<Provenance> {
    ProvenanceResolver::new(oracle).resolve(expression, cancel)
}

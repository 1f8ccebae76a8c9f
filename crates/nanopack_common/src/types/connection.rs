use arcstr::ArcStr;
use itertools::Itertools;

use crate::{DependencyIdx, ModuleIdx};

/// A directed edge in the module graph: the origin module references the
/// resolved target module through a dependency. An edge without an origin is
/// an extra reason injected from outside the dependency graph, e.g. being an
/// entry point.
#[derive(Debug, Clone)]
pub struct Connection {
  pub origin_module: Option<ModuleIdx>,
  pub dependency: Option<DependencyIdx>,
  pub module: ModuleIdx,
  explanations: Vec<ArcStr>,
}

impl Connection {
  pub fn new(
    origin_module: Option<ModuleIdx>,
    dependency: Option<DependencyIdx>,
    module: ModuleIdx,
  ) -> Self {
    Self { origin_module, dependency, module, explanations: Vec::new() }
  }

  /// Explanations only accumulate, they are never retracted.
  pub fn add_explanation(&mut self, explanation: ArcStr) {
    self.explanations.push(explanation);
  }

  pub fn explanations(&self) -> &[ArcStr] {
    &self.explanations
  }

  pub fn explanation(&self) -> Option<String> {
    (!self.explanations.is_empty()).then(|| self.explanations.iter().join(" "))
  }
}

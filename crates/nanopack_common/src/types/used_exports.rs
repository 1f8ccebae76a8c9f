use arcstr::ArcStr;
use nanopack_utils::indexmap::FxIndexSet;

/// Tree-shaking usage state of a module's exports, ordered from strongest
/// optimization opportunity to weakest.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum UsedExports {
  /// The module is not used at all.
  Unused,
  /// Only these export names are observably used.
  OnlyNames(FxIndexSet<ArcStr>),
  /// The whole namespace object is observed, every export counts as used.
  FullNamespace,
  /// Nothing is known yet. The safe default.
  #[default]
  Unknown,
}

impl UsedExports {
  pub fn is_export_used(&self, name: &str) -> bool {
    match self {
      Self::Unused => false,
      Self::OnlyNames(names) => names.contains(name),
      Self::FullNamespace | Self::Unknown => true,
    }
  }

  /// Whether the whole module may be dropped from the output.
  pub fn allows_removal(&self) -> bool {
    matches!(self, Self::Unused)
  }
}

#[test]
fn default_is_unknown() {
  assert_eq!(UsedExports::default(), UsedExports::Unknown);
  assert_ne!(UsedExports::Unused, UsedExports::OnlyNames(FxIndexSet::default()));
  assert_ne!(UsedExports::Unused, UsedExports::FullNamespace);
}

#[test]
fn export_usage() {
  let mut names = FxIndexSet::default();
  names.insert(arcstr::literal!("render"));
  let used = UsedExports::OnlyNames(names);
  assert!(used.is_export_used("render"));
  assert!(!used.is_export_used("hydrate"));
  assert!(UsedExports::Unknown.is_export_used("anything"));
  assert!(UsedExports::Unused.allows_removal());
  assert!(!UsedExports::FullNamespace.allows_removal());
}

use std::{
  borrow::Cow,
  path::{Path, PathBuf},
};

use sugar_path::SugarPath;

/// Display context for diagnostics. Requests inside the context directory are
/// shown relative to it, everything else is passed through untouched.
#[derive(Debug, Clone)]
pub struct RequestShortener {
  context_dir: PathBuf,
}

impl RequestShortener {
  pub fn new(context_dir: impl Into<PathBuf>) -> Self {
    Self { context_dir: context_dir.into() }
  }

  pub fn shorten<'a>(&self, request: &'a str) -> Cow<'a, str> {
    let path = Path::new(request);
    if !path.is_absolute() || !path.starts_with(&self.context_dir) {
      return Cow::Borrowed(request);
    }
    match path.relative(&self.context_dir).as_path().to_str() {
      Some(relative) => Cow::Owned(format!("./{relative}")),
      None => Cow::Borrowed(request),
    }
  }
}

#[test]
fn test_shorten() {
  let shortener = RequestShortener::new("/project");
  assert_eq!(shortener.shorten("/project/src/a.js"), "./src/a.js");
  assert_eq!(shortener.shorten("/elsewhere/b.js"), "/elsewhere/b.js");
  assert_eq!(shortener.shorten("external module"), "external module");
}

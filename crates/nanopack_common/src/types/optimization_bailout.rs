use std::fmt;

use nanopack_utils::request_shortener::RequestShortener;

pub type BailoutFormatter = Box<dyn Fn(&RequestShortener) -> String + Send + Sync>;

/// Why an optimization could not be applied to a module: either a plain
/// message or a formatter invoked lazily with the display context.
pub enum OptimizationBailout {
  Message(String),
  Lazy(BailoutFormatter),
}

impl OptimizationBailout {
  pub fn lazy(format: impl Fn(&RequestShortener) -> String + Send + Sync + 'static) -> Self {
    Self::Lazy(Box::new(format))
  }

  pub fn render(&self, shortener: &RequestShortener) -> String {
    match self {
      Self::Message(message) => message.clone(),
      Self::Lazy(format) => format(shortener),
    }
  }
}

impl fmt::Debug for OptimizationBailout {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Message(message) => f.debug_tuple("Message").field(message).finish(),
      Self::Lazy(_) => f.write_str("Lazy(..)"),
    }
  }
}

#[test]
fn render_bailout() {
  let shortener = RequestShortener::new("/app");
  let plain = OptimizationBailout::Message("ModuleConcatenation bailout".to_string());
  assert_eq!(plain.render(&shortener), "ModuleConcatenation bailout");

  let lazy = OptimizationBailout::lazy(|shortener| {
    format!("CommonJS bailout: {}", shortener.shorten("/app/src/legacy.js"))
  });
  assert_eq!(lazy.render(&shortener), "CommonJS bailout: ./src/legacy.js");
}

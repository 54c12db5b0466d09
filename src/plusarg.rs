use anyhow::Context;
use std::str::FromStr;

/// Simulator `+name=value` arguments, as seen in the process argv.
pub struct PlusArgMatcher {
  plusargs: Vec<String>,
}

impl PlusArgMatcher {
  pub fn from_args() -> Self {
    Self::from_argv(std::env::args())
  }

  pub fn from_argv<I, S>(args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let plusargs = args.into_iter().map(Into::<String>::into).filter(|arg| arg.starts_with('+')).collect();
    Self { plusargs }
  }

  /// Value of the first `+name=value`, if any.
  pub fn try_match(&self, arg_name: &str) -> Option<&str> {
    let prefix = format!("+{arg_name}=");
    self.plusargs.iter().find_map(|plusarg| plusarg.strip_prefix(prefix.as_str()))
  }

  pub fn match_(&self, arg_name: &str) -> anyhow::Result<&str> {
    self.try_match(arg_name).with_context(|| format!("required plusarg '+{arg_name}=' not found"))
  }

  /// Parses `+name=value` into `T`, falling back to `default` when absent.
  pub fn parse_or<T>(&self, arg_name: &str, default: T) -> anyhow::Result<T>
  where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
  {
    match self.try_match(arg_name) {
      Some(raw) => raw.parse().with_context(|| format!("invalid value '{raw}' for plusarg '+{arg_name}='")),
      None => Ok(default),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn matcher(args: &[&str]) -> PlusArgMatcher {
    PlusArgMatcher::from_argv(args.iter().copied())
  }

  #[test]
  fn ignores_non_plus_arguments() {
    let m = matcher(&["simv", "-l", "log-level=debug", "+log-level=warn"]);
    assert_eq!(m.try_match("log-level"), Some("warn"));
  }

  #[test]
  fn first_match_wins() {
    let m = matcher(&["+relay-burst-len=4", "+relay-burst-len=8"]);
    assert_eq!(m.try_match("relay-burst-len"), Some("4"));
  }

  #[test]
  fn name_must_match_exactly() {
    let m = matcher(&["+log-levels=debug", "+log-level"]);
    assert_eq!(m.try_match("log-level"), None);
    assert!(m.match_("log-level").is_err());
  }

  #[test]
  fn empty_value_is_a_match() {
    let m = matcher(&["+log-file="]);
    assert_eq!(m.match_("log-file").unwrap(), "");
  }

  #[test]
  fn parse_or_uses_default_when_absent() {
    let m = matcher(&[]);
    assert_eq!(m.parse_or("relay-burst-len", 10usize).unwrap(), 10);
  }

  #[test]
  fn parse_or_reports_the_plusarg_name() {
    let m = matcher(&["+relay-addr-step=two"]);
    let err = m.parse_or("relay-addr-step", 1i32).unwrap_err();
    assert!(format!("{err:#}").contains("+relay-addr-step="));
  }
}

use anyhow::Context;
use plusarg::PlusArgMatcher;
use relay::BurstConfig;
use std::{fs, path::PathBuf, sync::Mutex};
use tracing::Level;
use tracing_subscriber::{fmt::writer::BoxMakeWriter, EnvFilter, FmtSubscriber};

#[cfg(not(test))]
pub mod dpi;
pub mod plusarg;
pub mod relay;

pub struct RelayArgs {
  /// Path to the log file
  pub log_file: Option<PathBuf>,

  pub log_level: String,

  pub burst: BurstConfig,
}

impl RelayArgs {
  pub fn setup_logger(&self) -> anyhow::Result<()> {
    let log_level: Level = self
      .log_level
      .parse()
      .with_context(|| format!("parsing log level '{}'", self.log_level))?;
    let (writer, ansi) = match &self.log_file {
      Some(path) => {
        let file = fs::File::create(path).with_context(|| format!("creating log file {}", path.display()))?;
        (BoxMakeWriter::new(Mutex::new(file)), false)
      }
      None => (BoxMakeWriter::new(std::io::stderr), true),
    };
    let global_logger = FmtSubscriber::builder()
      .with_env_filter(EnvFilter::from_default_env())
      .with_max_level(log_level)
      .with_writer(writer)
      .without_time()
      .with_target(false)
      .with_ansi(ansi)
      .compact()
      .finish();
    tracing::subscriber::set_global_default(global_logger).context("installing log subscriber")?;
    Ok(())
  }

  pub fn from_plusargs(matcher: &PlusArgMatcher) -> anyhow::Result<Self> {
    let defaults = BurstConfig::default();
    let burst = BurstConfig {
      len: matcher.parse_or("relay-burst-len", defaults.len)?,
      addr_step: matcher.parse_or("relay-addr-step", defaults.addr_step)?,
      data_step: matcher.parse_or("relay-data-step", defaults.data_step)?,
    };
    if burst.len == 0 {
      anyhow::bail!("plusarg '+relay-burst-len=' must be at least 1");
    }
    Ok(Self {
      log_file: matcher.try_match("log-file").map(PathBuf::from),
      log_level: matcher.try_match("log-level").unwrap_or("info").into(),
      burst,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn args(raw: &[&str]) -> anyhow::Result<RelayArgs> {
    RelayArgs::from_plusargs(&PlusArgMatcher::from_argv(raw.iter().copied()))
  }

  #[test]
  fn defaults_without_plusargs() {
    let args = args(&["simv"]).unwrap();
    assert_eq!(args.burst, BurstConfig::default());
    assert_eq!(args.burst.len, 10);
    assert_eq!(args.log_level, "info");
    assert!(args.log_file.is_none());
  }

  #[test]
  fn burst_overrides() {
    let args = args(&["+relay-burst-len=4", "+relay-data-step=-3", "+log-file=relay.log"]).unwrap();
    assert_eq!(args.burst, BurstConfig { len: 4, addr_step: 1, data_step: -3 });
    assert_eq!(args.log_file, Some(PathBuf::from("relay.log")));
  }

  #[test]
  fn zero_burst_len_is_rejected() {
    assert!(args(&["+relay-burst-len=0"]).is_err());
  }

  #[test]
  fn malformed_step_is_rejected() {
    let err = args(&["+relay-addr-step=0x4"]).err().unwrap();
    assert!(format!("{err:#}").contains("relay-addr-step"));
  }

  #[test]
  fn bad_log_level_fails_before_installing() {
    let args = RelayArgs { log_file: None, log_level: "loud".into(), burst: BurstConfig::default() };
    assert!(args.setup_logger().is_err());
  }
}

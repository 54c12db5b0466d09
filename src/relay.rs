//! Bus-write relay: hands address/data pairs from the testbench back to the
//! simulator's `drive` task, one at a time or as an incrementing burst.

use std::ffi::c_int;
use std::fmt;
use tracing::{debug, trace};

pub const BURST_LEN: usize = 10;
pub const SEPARATOR: &str = "-----------------------------------------";

/// One bus write, in the simulator's native `int` width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddrData {
  pub addr: c_int,
  pub data: c_int,
}

impl AddrData {
  pub fn new(addr: c_int, data: c_int) -> Self {
    Self { addr, data }
  }
}

impl fmt::Display for AddrData {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Address:{} and Data:{}", self.addr, self.data)
  }
}

/// Shape of the pair sequence emitted by [`relay_write_burst_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurstConfig {
  pub len: usize,
  pub addr_step: c_int,
  pub data_step: c_int,
}

impl Default for BurstConfig {
  fn default() -> Self {
    Self { len: BURST_LEN, addr_step: 1, data_step: 2 }
  }
}

/// The `drive` task exported by the testbench.
pub trait BusDriver {
  fn drive(&mut self, pair: AddrData);
}

impl<F: FnMut(AddrData)> BusDriver for F {
  fn drive(&mut self, pair: AddrData) {
    self(pair)
  }
}

/// Console-and-stdout print capability of the simulator.
pub trait ConsoleSink {
  /// `line` carries no trailing newline.
  fn print_line(&mut self, line: &str);
}

/// Drives `(addr, data)` once, unmodified.
pub fn relay_write<D: BusDriver + ?Sized>(driver: &mut D, addr: c_int, data: c_int) {
  let pair = AddrData::new(addr, data);
  trace!("relay_write: drive({}, {})", pair.addr, pair.data);
  driver.drive(pair);
}

/// Pairs produced by a burst starting at `(addr, data)`. The starting pair
/// itself is never part of the sequence; arithmetic wraps at `c_int`.
pub fn burst_sequence(config: &BurstConfig, addr: c_int, data: c_int) -> Vec<AddrData> {
  let mut seq = Vec::with_capacity(config.len);
  let mut cur = AddrData::new(addr, data);
  for _ in 0..config.len {
    cur = step(config, cur);
    seq.push(cur);
  }
  seq
}

fn step(config: &BurstConfig, pair: AddrData) -> AddrData {
  AddrData::new(pair.addr.wrapping_add(config.addr_step), pair.data.wrapping_add(config.data_step))
}

/// Ten-pair burst with the default strides. Always returns 0.
pub fn relay_write_burst<D: BusDriver + ?Sized>(driver: &mut D, addr: c_int, data: c_int) -> c_int {
  relay_write_burst_with(driver, &BurstConfig::default(), addr, data)
}

/// Fills the burst buffer and drives each slot as soon as it is written, in
/// index order. Always returns 0.
pub fn relay_write_burst_with<D: BusDriver + ?Sized>(
  driver: &mut D,
  config: &BurstConfig,
  addr: c_int,
  data: c_int,
) -> c_int {
  debug!(
    "relay_write_burst: start=({addr}, {data}) len={} addr_step={} data_step={}",
    config.len, config.addr_step, config.data_step
  );
  let mut buffer: Vec<AddrData> = Vec::with_capacity(config.len);
  let mut cur = AddrData::new(addr, data);
  for i in 0..config.len {
    cur = step(config, cur);
    buffer.push(cur);
    trace!("relay_write_burst[{i}]: drive({}, {})", buffer[i].addr, buffer[i].data);
    driver.drive(buffer[i]);
  }
  0
}

pub fn print_debug<S: ConsoleSink + ?Sized>(sink: &mut S, addr: c_int, data: c_int) {
  sink.print_line(SEPARATOR);
  sink.print_line(&format!("{} written (by C code)", AddrData::new(addr, data)));
  sink.print_line(SEPARATOR);
}

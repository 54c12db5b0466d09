use std::ffi::{c_int, CString};
use std::sync::Mutex;
use svdpi::SvScope;
use tracing::{info, warn};

use crate::plusarg::PlusArgMatcher;
use crate::relay::{self, AddrData, BurstConfig, BusDriver, ConsoleSink};
use crate::RelayArgs;

// --------------------------
// preparing data structures
// --------------------------

struct RelayTarget {
  scope: SvScope,
  burst: BurstConfig,
}

static DPI_TARGET: Mutex<Option<RelayTarget>> = Mutex::new(None);

fn target_snapshot() -> (Option<SvScope>, BurstConfig) {
  match DPI_TARGET.lock() {
    Ok(target) => match target.as_ref() {
      Some(t) => (Some(t.scope), t.burst),
      None => (None, BurstConfig::default()),
    },
    Err(_) => (None, BurstConfig::default()),
  }
}

/// Routes pairs to the SV `drive` task, re-entering the scope captured by
/// `relay_init` when there is one.
struct SvDriver {
  scope: Option<SvScope>,
}

impl BusDriver for SvDriver {
  fn drive(&mut self, pair: AddrData) {
    if let Some(scope) = self.scope {
      svdpi::set_scope(scope);
    }
    unsafe { dpi_export::drive(pair.addr, pair.data) }
  }
}

struct IoPrintf;

impl ConsoleSink for IoPrintf {
  fn print_line(&mut self, line: &str) {
    match CString::new(line) {
      Ok(line) => unsafe { dpi_export::io_printf(c"%s\n".as_ptr(), line.as_ptr()) },
      Err(e) => warn!("print_it: dropping line with interior NUL at {}", e.nul_position()),
    }
  }
}

//----------------------
// dpi functions
//----------------------

#[no_mangle]
unsafe extern "C" fn relay_init() {
  let args = match RelayArgs::from_plusargs(&PlusArgMatcher::from_args()) {
    Ok(args) => args,
    Err(e) => {
      eprintln!("relay_init: {e:#}, using defaults");
      RelayArgs { log_file: None, log_level: "info".into(), burst: BurstConfig::default() }
    }
  };
  if let Err(e) = args.setup_logger() {
    eprintln!("relay_init: {e:#}");
  }

  let Some(scope) = SvScope::get_current() else {
    warn!("relay_init: called outside a DPI scope, drive calls use the caller's scope");
    return;
  };

  match DPI_TARGET.lock() {
    Ok(mut dpi_target) => {
      if dpi_target.is_some() {
        warn!("relay_init: called more than once, replacing previous configuration");
      }
      info!(
        "relay_init: burst len={} addr_step={} data_step={}",
        args.burst.len, args.burst.addr_step, args.burst.data_step
      );
      *dpi_target = Some(RelayTarget { scope, burst: args.burst });
    }
    Err(e) => warn!("relay_init: {e}"),
  }
}

#[cfg(not(feature = "burst"))]
#[no_mangle]
unsafe extern "C" fn c_write(addr: c_int, data: c_int) {
  let (scope, _) = target_snapshot();
  relay::relay_write(&mut SvDriver { scope }, addr, data);
}

#[cfg(feature = "burst")]
#[no_mangle]
unsafe extern "C" fn c_write(addr: c_int, data: c_int) -> c_int {
  let (scope, burst) = target_snapshot();
  relay::relay_write_burst_with(&mut SvDriver { scope }, &burst, addr, data)
}

#[no_mangle]
unsafe extern "C" fn print_it(print_addr: c_int, print_data: c_int) {
  relay::print_debug(&mut IoPrintf, print_addr, print_data);
}

//--------------------------------
// import functions and wrappers
//--------------------------------

mod dpi_export {
  use std::ffi::{c_char, c_int};
  extern "C" {
    /// `export "DPI-C" task drive(input int addr, input int data)`
    pub fn drive(addr: c_int, data: c_int);

    /// PLI console print, also mirrored to stdout
    pub fn io_printf(format: *const c_char, ...);
  }
}

use std::io::{self, BufRead};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use log::{debug, info, warn};

use failure;
use failure::{Error, Fail};

use crossbeam_channel::Sender;

use midi_sink_core::config::Config;
use midi_sink_core::midi::delivery::{Delivery, Protocol};
use midi_sink_core::midi::dispatcher::Dispatcher;
use midi_sink_core::midi::sink::Diagnostics;
use midi_sink_core::time::MonotonicClock;

mod hex;

mod monitor;
use crate::monitor::MonitorSink;

const MIDI_SINK_CONFIG: &'static str = "MIDI_SINK_CONFIG";
const DEFAULT_MIDI_SINK_CONFIG: &'static str = "monitor.toml";

const MIDI_SINK_LOG_CONFIG: &'static str = "MIDI_SINK_LOG_CONFIG";
const DEFAULT_MIDI_SINK_LOG_CONFIG: &'static str = "log4rs.yaml";

#[derive(Debug, Fail)]
enum MainError {
  #[fail(display = "Failed to init logging: {}", cause)]
  LoggingInit { cause: String },

  #[fail(display = "The MIDI delivery thread is gone")]
  DeliveryClosed,
}

fn main() -> Result<(), Error> {
  init_logging()?;

  let config = init_config()?;

  let diagnostics = Diagnostics::from_config(&config.diagnostics)?;
  let monitor = Arc::new(RwLock::new(MonitorSink::new(diagnostics)));

  let mut dispatcher = Dispatcher::new();
  dispatcher.add_sink(monitor.clone());

  let delivery = Delivery::new(
    dispatcher,
    &config.decoder,
    config.delivery.channel_capacity,
  )?;

  let read_result = read_packets(delivery.sender());

  delivery.remove_sink(monitor.clone())?;

  let stats = delivery.stop()?;
  info!(
    "{} packets, {} events, {} deliveries, {} failures",
    stats.packets, stats.events, stats.dispatch.delivered, stats.dispatch.failed
  );

  let received = monitor
    .read()
    .unwrap_or_else(PoisonError::into_inner)
    .received();
  debug!("Monitor handled {} events", received);

  read_result
}

fn init_logging() -> Result<(), Error> {
  let log_config_path = std::env::var(MIDI_SINK_LOG_CONFIG)
    .unwrap_or_else(|_| DEFAULT_MIDI_SINK_LOG_CONFIG.to_string());

  log4rs::init_file(log_config_path.as_str(), Default::default()).map_err(|err| {
    MainError::LoggingInit {
      cause: err.to_string(),
    }
  })?;

  Ok(())
}

fn init_config() -> Result<Config, Error> {
  let config_path =
    std::env::var(MIDI_SINK_CONFIG).unwrap_or_else(|_| DEFAULT_MIDI_SINK_CONFIG.to_string());

  if !Path::new(config_path.as_str()).exists() {
    info!("No configuration at {}, using defaults", config_path);
    return Ok(Config::default());
  }

  info!("Loading monitor configuration from {} ...", config_path);
  let config = Config::from_file(config_path.as_str())?;
  debug!("{:#?}", config);

  Ok(config)
}

/// Sends one packet per stdin line until EOF.
fn read_packets(protocol_tx: Sender<Protocol>) -> Result<(), Error> {
  info!("Reading hex packets from stdin ...");

  let clock = MonotonicClock::new();
  let stdin = io::stdin();

  for (index, line) in stdin.lock().lines().enumerate() {
    let line = line?;
    let timestamp = clock.now();

    let data = match hex::parse_line(line.as_str()) {
      Ok(data) => data,
      Err(err) => {
        warn!("Line {}: {}", index + 1, err);
        continue;
      }
    };

    if data.is_empty() {
      continue;
    }

    protocol_tx
      .send(Protocol::Packet { timestamp, data })
      .map_err(|_| MainError::DeliveryClosed)?;
  }

  Ok(())
}

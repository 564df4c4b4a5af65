use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, RwLock};

use failure::Fail;
use log::{log, Level, Log, Record};

use crate::config::Diagnostics as DiagnosticsConfig;
use crate::midi::event::{Notification, PropertyChange};
use crate::midi::types::{
  Channel, ControlValue, Controller, Note, PitchBend, Pressure, Program, Velocity,
};
use crate::time::Timestamp;

pub type SinkLock = Arc<RwLock<dyn MidiEventSink + Send + Sync>>;

/// Receives the MIDI events a consumer is interested in.
///
/// Every callback has a default body that does nothing besides an optional
/// diagnostic line, so implementors only override what they care about.
/// Callbacks are invoked from the delivery thread one event at a time and
/// must return promptly: a slow callback delays every event behind it.
pub trait MidiEventSink {
  /// Controls the log line written by the default callbacks. `None` keeps them silent.
  fn diagnostics(&self) -> Option<&Diagnostics> {
    None
  }

  fn note_on(&mut self, note: Note, velocity: Velocity, channel: Channel) {
    unhandled(
      self.diagnostics(),
      format_args!("note on {} vel={} {}", note.name(), velocity, channel),
    )
  }

  fn note_off(&mut self, note: Note, velocity: Velocity, channel: Channel) {
    unhandled(
      self.diagnostics(),
      format_args!("note off {} vel={} {}", note.name(), velocity, channel),
    )
  }

  fn control_change(&mut self, controller: Controller, value: ControlValue, channel: Channel) {
    unhandled(
      self.diagnostics(),
      format_args!("control change cc{}={} {}", controller, value, channel),
    )
  }

  fn poly_aftertouch(&mut self, note: Note, pressure: Pressure, channel: Channel) {
    unhandled(
      self.diagnostics(),
      format_args!(
        "poly aftertouch {} pressure={} {}",
        note.name(),
        pressure,
        channel
      ),
    )
  }

  fn channel_aftertouch(&mut self, pressure: Pressure, channel: Channel) {
    unhandled(
      self.diagnostics(),
      format_args!("channel aftertouch pressure={} {}", pressure, channel),
    )
  }

  fn pitch_bend(&mut self, value: PitchBend, channel: Channel) {
    unhandled(
      self.diagnostics(),
      format_args!("pitch bend {} {}", value, channel),
    )
  }

  fn program_change(&mut self, program: Program, channel: Channel) {
    unhandled(
      self.diagnostics(),
      format_args!("program change {} {}", program, channel),
    )
  }

  fn system_command(&mut self, data: &[u8], timestamp: Timestamp) {
    unhandled(
      self.diagnostics(),
      format_args!("system command {:02x?} at {}", data, timestamp),
    )
  }

  /// Devices or ports were added or removed.
  fn setup_changed(&mut self) {
    unhandled(self.diagnostics(), format_args!("setup changed"))
  }

  fn property_changed(&mut self, info: &PropertyChange) {
    unhandled(
      self.diagnostics(),
      format_args!("property changed '{}' on {}", info.property, info.object),
    )
  }

  fn notification(&mut self, notification: &Notification) {
    unhandled(
      self.diagnostics(),
      format_args!("notification {:?}", notification),
    )
  }
}

fn unhandled(diagnostics: Option<&Diagnostics>, args: fmt::Arguments) {
  if let Some(diagnostics) = diagnostics {
    diagnostics.unhandled(args);
  }
}

#[derive(Debug, Fail)]
pub enum DiagnosticsError {
  #[fail(display = "Invalid log level: {}", level)]
  InvalidLevel { level: String },
}

#[derive(Clone)]
enum Output {
  Global,
  Custom(Arc<dyn Log>),
}

/// Where and whether the default callbacks report the events nobody handled.
#[derive(Clone)]
pub struct Diagnostics {
  verbose: bool,
  target: String,
  level: Level,
  output: Output,
}

impl Diagnostics {
  pub const DEFAULT_TARGET: &'static str = "midi_sink::unhandled";

  pub fn quiet() -> Diagnostics {
    Diagnostics {
      verbose: false,
      target: Self::DEFAULT_TARGET.to_string(),
      level: Level::Debug,
      output: Output::Global,
    }
  }

  pub fn verbose() -> Diagnostics {
    Diagnostics {
      verbose: true,
      ..Self::quiet()
    }
  }

  pub fn from_config(config: &DiagnosticsConfig) -> Result<Diagnostics, DiagnosticsError> {
    let level =
      Level::from_str(&config.level).map_err(|_| DiagnosticsError::InvalidLevel {
        level: config.level.clone(),
      })?;

    Ok(Diagnostics {
      verbose: config.verbose,
      target: config.target.clone(),
      level,
      output: Output::Global,
    })
  }

  pub fn with_verbose(self, verbose: bool) -> Diagnostics {
    Diagnostics { verbose, ..self }
  }

  pub fn with_level(self, level: Level) -> Diagnostics {
    Diagnostics { level, ..self }
  }

  /// Sends the lines to `output` instead of the global logger.
  pub fn with_output(self, output: Arc<dyn Log>) -> Diagnostics {
    Diagnostics {
      output: Output::Custom(output),
      ..self
    }
  }

  pub fn is_verbose(&self) -> bool {
    self.verbose
  }

  pub fn target(&self) -> &str {
    self.target.as_str()
  }

  pub fn level(&self) -> Level {
    self.level
  }

  pub fn unhandled(&self, args: fmt::Arguments) {
    if !self.verbose {
      return;
    }

    match &self.output {
      Output::Global => log!(target: self.target.as_str(), self.level, "unhandled {}", args),
      Output::Custom(output) => output.log(
        &Record::builder()
          .args(format_args!("unhandled {}", args))
          .level(self.level)
          .target(self.target.as_str())
          .module_path(Some(module_path!()))
          .build(),
      ),
    }
  }
}

impl Default for Diagnostics {
  fn default() -> Diagnostics {
    Diagnostics::quiet()
  }
}

impl fmt::Debug for Diagnostics {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let output = match self.output {
      Output::Global => "global",
      Output::Custom(_) => "custom",
    };
    f.debug_struct("Diagnostics")
      .field("verbose", &self.verbose)
      .field("target", &self.target)
      .field("level", &self.level)
      .field("output", &output)
      .finish()
  }
}

/// A sink that keeps every default, useful to see what flows through a dispatcher.
#[derive(Debug, Default, Clone)]
pub struct DefaultSink {
  diagnostics: Option<Diagnostics>,
}

impl DefaultSink {
  pub fn new() -> DefaultSink {
    DefaultSink { diagnostics: None }
  }

  pub fn with_diagnostics(diagnostics: Diagnostics) -> DefaultSink {
    DefaultSink {
      diagnostics: Some(diagnostics),
    }
  }
}

impl MidiEventSink for DefaultSink {
  fn diagnostics(&self) -> Option<&Diagnostics> {
    self.diagnostics.as_ref()
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use log::Level;

  use super::*;
  use crate::config::Diagnostics as DiagnosticsConfig;
  use crate::midi::event::{MidiEvent, EventKind};
  use crate::midi::testing::{all_events, global_capture, CaptureLog};
  use crate::midi::types::Note;

  struct NotesOnly {
    received: Vec<Note>,
  }

  impl MidiEventSink for NotesOnly {
    fn note_on(&mut self, note: Note, _velocity: Velocity, _channel: Channel) {
      self.received.push(note);
    }
  }

  #[test]
  fn defaults_accept_every_event() {
    let mut sink = DefaultSink::new();
    for event in all_events() {
      event.deliver_to(&mut sink);
    }
    assert!(sink.diagnostics().is_none());
  }

  #[test]
  fn single_override_only_sees_its_kind() {
    let mut sink = NotesOnly {
      received: Vec::new(),
    };
    for event in all_events() {
      event.deliver_to(&mut sink);
    }
    let expected: Vec<Note> = all_events()
      .into_iter()
      .filter_map(|event| match event {
        MidiEvent::NoteOn { note, .. } => Some(note),
        _ => None,
      })
      .collect();
    assert_eq!(sink.received, expected);
  }

  #[test]
  fn quiet_defaults_produce_no_output() {
    let capture = Arc::new(CaptureLog::new());
    let diagnostics = Diagnostics::quiet().with_output(capture.clone());
    let mut sink = DefaultSink::with_diagnostics(diagnostics);
    for event in all_events() {
      event.deliver_to(&mut sink);
    }
    assert!(capture.lines().is_empty());
  }

  #[test]
  fn verbose_defaults_log_one_line_per_call() {
    let capture = Arc::new(CaptureLog::new());
    let diagnostics = Diagnostics::verbose()
      .with_level(Level::Info)
      .with_output(capture.clone());
    let mut sink = DefaultSink::with_diagnostics(diagnostics);

    let events = all_events();
    for event in events.iter() {
      event.deliver_to(&mut sink);
    }

    let lines = capture.lines();
    assert_eq!(lines.len(), events.len());
    for (line, event) in lines.iter().zip(events.iter()) {
      assert!(line.starts_with("INFO midi_sink::unhandled unhandled "));
      assert!(line.contains(event.kind().name()), "{} / {:?}", line, event);
    }
  }

  #[test]
  fn verbose_defaults_reach_the_global_logger() {
    let capture = global_capture();

    let target = "midi_sink::global_output";
    let config = DiagnosticsConfig {
      verbose: true,
      target: target.to_string(),
      level: "warn".to_string(),
    };
    let mut sink = DefaultSink::with_diagnostics(Diagnostics::from_config(&config).unwrap());

    let events = all_events();
    for event in events.iter() {
      event.deliver_to(&mut sink);
    }

    let prefix = format!("WARN {} unhandled ", target);
    let lines: Vec<String> = capture
      .lines()
      .into_iter()
      .filter(|line| line.starts_with(prefix.as_str()))
      .collect();
    assert_eq!(lines.len(), events.len());
    for (line, event) in lines.iter().zip(events.iter()) {
      assert!(line.contains(event.kind().name()), "{} / {:?}", line, event);
    }
  }

  #[test]
  fn overridden_callbacks_do_not_log() {
    struct Quiet {
      diagnostics: Diagnostics,
      notes: usize,
    }

    impl MidiEventSink for Quiet {
      fn diagnostics(&self) -> Option<&Diagnostics> {
        Some(&self.diagnostics)
      }

      fn note_on(&mut self, _note: Note, _velocity: Velocity, _channel: Channel) {
        self.notes += 1;
      }
    }

    let capture = Arc::new(CaptureLog::new());
    let mut sink = Quiet {
      diagnostics: Diagnostics::verbose().with_output(capture.clone()),
      notes: 0,
    };
    let events = all_events();
    for event in events.iter() {
      event.deliver_to(&mut sink);
    }

    let note_ons = events
      .iter()
      .filter(|event| event.kind() == EventKind::NoteOn)
      .count();
    assert_eq!(sink.notes, note_ons);
    assert_eq!(capture.lines().len(), events.len() - note_ons);
  }

  #[test]
  fn diagnostics_from_config() {
    let config = DiagnosticsConfig {
      verbose: true,
      target: "monitor".to_string(),
      level: "warn".to_string(),
    };
    let diagnostics = Diagnostics::from_config(&config).unwrap();
    assert!(diagnostics.is_verbose());
    assert_eq!(diagnostics.target(), "monitor");
    assert_eq!(diagnostics.level(), Level::Warn);
  }

  #[test]
  fn diagnostics_from_config_invalid_level() {
    let config = DiagnosticsConfig {
      level: "loud".to_string(),
      ..DiagnosticsConfig::default()
    };
    assert!(Diagnostics::from_config(&config).is_err());
  }
}

use std::sync::{Mutex, Once};

use log::{LevelFilter, Log, Metadata, Record};

use crate::midi::event::{
  MidiEvent, MidiObject, Notification, ObjectKind, PropertyChange, SystemCommand,
};
use crate::midi::sink::{Diagnostics, MidiEventSink};
use crate::midi::types::{
  Channel, ControlValue, Controller, Note, PitchBend, Pressure, Program, Velocity,
};
use crate::time::Timestamp;

pub struct CaptureLog {
  lines: Mutex<Vec<String>>,
}

impl CaptureLog {
  pub const fn new() -> CaptureLog {
    CaptureLog {
      lines: Mutex::new(Vec::new()),
    }
  }

  pub fn lines(&self) -> Vec<String> {
    self.lines.lock().unwrap().clone()
  }
}

impl Log for CaptureLog {
  fn enabled(&self, _metadata: &Metadata) -> bool {
    true
  }

  fn log(&self, record: &Record) {
    self.lines.lock().unwrap().push(format!(
      "{} {} {}",
      record.level(),
      record.target(),
      record.args()
    ));
  }

  fn flush(&self) {}
}

static GLOBAL_INIT: Once = Once::new();
static GLOBAL_CAPTURE: CaptureLog = CaptureLog::new();

/// Installs a shared `CaptureLog` as the process logger on first use.
/// Tests share it, so they filter lines by something only they produce.
pub fn global_capture() -> &'static CaptureLog {
  GLOBAL_INIT.call_once(|| {
    log::set_logger(&GLOBAL_CAPTURE).unwrap();
    log::set_max_level(LevelFilter::Trace);
  });
  &GLOBAL_CAPTURE
}

/// Keeps a copy of everything it receives, in order.
#[derive(Default)]
pub struct Recorder {
  pub events: Vec<MidiEvent>,
  pub diagnostics: Option<Diagnostics>,
}

impl Recorder {
  pub fn new() -> Recorder {
    Recorder::default()
  }
}

impl MidiEventSink for Recorder {
  fn diagnostics(&self) -> Option<&Diagnostics> {
    self.diagnostics.as_ref()
  }

  fn note_on(&mut self, note: Note, velocity: Velocity, channel: Channel) {
    self.events.push(MidiEvent::NoteOn {
      note,
      velocity,
      channel,
    });
  }

  fn note_off(&mut self, note: Note, velocity: Velocity, channel: Channel) {
    self.events.push(MidiEvent::NoteOff {
      note,
      velocity,
      channel,
    });
  }

  fn control_change(&mut self, controller: Controller, value: ControlValue, channel: Channel) {
    self.events.push(MidiEvent::ControlChange {
      controller,
      value,
      channel,
    });
  }

  fn poly_aftertouch(&mut self, note: Note, pressure: Pressure, channel: Channel) {
    self.events.push(MidiEvent::PolyAftertouch {
      note,
      pressure,
      channel,
    });
  }

  fn channel_aftertouch(&mut self, pressure: Pressure, channel: Channel) {
    self
      .events
      .push(MidiEvent::ChannelAftertouch { pressure, channel });
  }

  fn pitch_bend(&mut self, value: PitchBend, channel: Channel) {
    self.events.push(MidiEvent::PitchBend { value, channel });
  }

  fn program_change(&mut self, program: Program, channel: Channel) {
    self.events.push(MidiEvent::ProgramChange { program, channel });
  }

  fn system_command(&mut self, data: &[u8], timestamp: Timestamp) {
    self.events.push(MidiEvent::SystemCommand(SystemCommand::new(
      data.to_vec(),
      timestamp,
    )));
  }

  fn setup_changed(&mut self) {
    self.events.push(MidiEvent::SetupChanged);
  }

  fn property_changed(&mut self, info: &PropertyChange) {
    self.events.push(MidiEvent::PropertyChanged(info.clone()));
  }

  fn notification(&mut self, notification: &Notification) {
    self
      .events
      .push(MidiEvent::Notification(notification.clone()));
  }
}

/// One event of every kind, with values at the edges of their ranges.
pub fn all_events() -> Vec<MidiEvent> {
  let keys = MidiObject::new("Keys", ObjectKind::Source);
  vec![
    MidiEvent::NoteOn {
      note: Note::MIN,
      velocity: Velocity::MAX,
      channel: Channel::MIN,
    },
    MidiEvent::NoteOn {
      note: Note::MAX,
      velocity: Velocity::from_masked(1),
      channel: Channel::MAX,
    },
    MidiEvent::NoteOff {
      note: Note::MIDDLE_C,
      velocity: Velocity::MIN,
      channel: Channel::MIN,
    },
    MidiEvent::ControlChange {
      controller: Controller::from_masked(7),
      value: ControlValue::MAX,
      channel: Channel::from_masked(9),
    },
    MidiEvent::PolyAftertouch {
      note: Note::MIDDLE_C,
      pressure: Pressure::from_masked(64),
      channel: Channel::MAX,
    },
    MidiEvent::ChannelAftertouch {
      pressure: Pressure::MIN,
      channel: Channel::MIN,
    },
    MidiEvent::PitchBend {
      value: PitchBend::MIN,
      channel: Channel::MIN,
    },
    MidiEvent::PitchBend {
      value: PitchBend::CENTER,
      channel: Channel::MIN,
    },
    MidiEvent::PitchBend {
      value: PitchBend::MAX,
      channel: Channel::MAX,
    },
    MidiEvent::ProgramChange {
      program: Program::MAX,
      channel: Channel::MIN,
    },
    MidiEvent::SystemCommand(SystemCommand::new(Vec::new(), Timestamp::zero())),
    MidiEvent::SystemCommand(SystemCommand::new(
      vec![0xf0, 0x7e, 0x7f, 0x06, 0x01, 0xf7],
      Timestamp::from_nanos(42),
    )),
    MidiEvent::SetupChanged,
    MidiEvent::PropertyChanged(PropertyChange::new(keys.clone(), "name")),
    MidiEvent::Notification(Notification::ObjectAdded {
      parent: MidiObject::new("USB Keys", ObjectKind::Device),
      child: keys,
    }),
    MidiEvent::Notification(Notification::ThruConnectionsChanged),
  ]
}

use std::fmt;

use crate::midi::sink::MidiEventSink;
use crate::midi::types::{
  Channel, ControlValue, Controller, Note, PitchBend, Pressure, Program, Velocity,
};
use crate::time::Timestamp;

/// One variant per callback of [`MidiEventSink`].
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum EventKind {
  NoteOn,
  NoteOff,
  ControlChange,
  PolyAftertouch,
  ChannelAftertouch,
  PitchBend,
  ProgramChange,
  SystemCommand,
  SetupChanged,
  PropertyChanged,
  Notification,
}

impl EventKind {
  pub const ALL: [EventKind; 11] = [
    EventKind::NoteOn,
    EventKind::NoteOff,
    EventKind::ControlChange,
    EventKind::PolyAftertouch,
    EventKind::ChannelAftertouch,
    EventKind::PitchBend,
    EventKind::ProgramChange,
    EventKind::SystemCommand,
    EventKind::SetupChanged,
    EventKind::PropertyChanged,
    EventKind::Notification,
  ];

  pub fn name(self) -> &'static str {
    match self {
      EventKind::NoteOn => "note on",
      EventKind::NoteOff => "note off",
      EventKind::ControlChange => "control change",
      EventKind::PolyAftertouch => "poly aftertouch",
      EventKind::ChannelAftertouch => "channel aftertouch",
      EventKind::PitchBend => "pitch bend",
      EventKind::ProgramChange => "program change",
      EventKind::SystemCommand => "system command",
      EventKind::SetupChanged => "setup changed",
      EventKind::PropertyChanged => "property changed",
      EventKind::Notification => "notification",
    }
  }
}

/// Raw bytes of a system message (sysex framing included) and when it arrived.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SystemCommand {
  pub data: Vec<u8>,
  pub timestamp: Timestamp,
}

impl SystemCommand {
  pub fn new(data: Vec<u8>, timestamp: Timestamp) -> SystemCommand {
    SystemCommand { data, timestamp }
  }

  pub fn status(&self) -> Option<u8> {
    self.data.first().cloned()
  }

  pub fn is_sysex(&self) -> bool {
    self.status() == Some(0xf0)
  }

  pub fn is_realtime(&self) -> bool {
    self.status().map_or(false, |status| status >= 0xf8)
  }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum ObjectKind {
  Device,
  Entity,
  Source,
  Destination,
  Other,
}

/// Something in the MIDI setup that a notification refers to.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct MidiObject {
  pub name: String,
  pub kind: ObjectKind,
}

impl MidiObject {
  pub fn new<T>(name: T, kind: ObjectKind) -> MidiObject
  where
    T: Into<String>,
  {
    MidiObject {
      name: name.into(),
      kind,
    }
  }
}

impl fmt::Display for MidiObject {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{:?} '{}'", self.kind, self.name)
  }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PropertyChange {
  pub object: MidiObject,
  pub property: String,
}

impl PropertyChange {
  pub fn new<T>(object: MidiObject, property: T) -> PropertyChange
  where
    T: Into<String>,
  {
    PropertyChange {
      object,
      property: property.into(),
    }
  }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Notification {
  ObjectAdded { parent: MidiObject, child: MidiObject },
  ObjectRemoved { parent: MidiObject, child: MidiObject },
  ThruConnectionsChanged,
  SerialPortOwnerChanged,
  IoError { device: MidiObject, code: i32 },
  Other(String),
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum MidiEvent {
  NoteOn {
    note: Note,
    velocity: Velocity,
    channel: Channel,
  },
  NoteOff {
    note: Note,
    velocity: Velocity,
    channel: Channel,
  },
  ControlChange {
    controller: Controller,
    value: ControlValue,
    channel: Channel,
  },
  PolyAftertouch {
    note: Note,
    pressure: Pressure,
    channel: Channel,
  },
  ChannelAftertouch {
    pressure: Pressure,
    channel: Channel,
  },
  PitchBend {
    value: PitchBend,
    channel: Channel,
  },
  ProgramChange {
    program: Program,
    channel: Channel,
  },
  SystemCommand(SystemCommand),
  SetupChanged,
  PropertyChanged(PropertyChange),
  Notification(Notification),
}

impl MidiEvent {
  pub fn kind(&self) -> EventKind {
    match self {
      MidiEvent::NoteOn { .. } => EventKind::NoteOn,
      MidiEvent::NoteOff { .. } => EventKind::NoteOff,
      MidiEvent::ControlChange { .. } => EventKind::ControlChange,
      MidiEvent::PolyAftertouch { .. } => EventKind::PolyAftertouch,
      MidiEvent::ChannelAftertouch { .. } => EventKind::ChannelAftertouch,
      MidiEvent::PitchBend { .. } => EventKind::PitchBend,
      MidiEvent::ProgramChange { .. } => EventKind::ProgramChange,
      MidiEvent::SystemCommand(_) => EventKind::SystemCommand,
      MidiEvent::SetupChanged => EventKind::SetupChanged,
      MidiEvent::PropertyChanged(_) => EventKind::PropertyChanged,
      MidiEvent::Notification(_) => EventKind::Notification,
    }
  }

  pub fn channel(&self) -> Option<Channel> {
    match *self {
      MidiEvent::NoteOn { channel, .. }
      | MidiEvent::NoteOff { channel, .. }
      | MidiEvent::ControlChange { channel, .. }
      | MidiEvent::PolyAftertouch { channel, .. }
      | MidiEvent::ChannelAftertouch { channel, .. }
      | MidiEvent::PitchBend { channel, .. }
      | MidiEvent::ProgramChange { channel, .. } => Some(channel),
      _ => None,
    }
  }

  /// Invokes the callback of `sink` matching this event.
  pub fn deliver_to<S>(&self, sink: &mut S)
  where
    S: MidiEventSink + ?Sized,
  {
    match self {
      MidiEvent::NoteOn {
        note,
        velocity,
        channel,
      } => sink.note_on(*note, *velocity, *channel),
      MidiEvent::NoteOff {
        note,
        velocity,
        channel,
      } => sink.note_off(*note, *velocity, *channel),
      MidiEvent::ControlChange {
        controller,
        value,
        channel,
      } => sink.control_change(*controller, *value, *channel),
      MidiEvent::PolyAftertouch {
        note,
        pressure,
        channel,
      } => sink.poly_aftertouch(*note, *pressure, *channel),
      MidiEvent::ChannelAftertouch { pressure, channel } => {
        sink.channel_aftertouch(*pressure, *channel)
      }
      MidiEvent::PitchBend { value, channel } => sink.pitch_bend(*value, *channel),
      MidiEvent::ProgramChange { program, channel } => sink.program_change(*program, *channel),
      MidiEvent::SystemCommand(command) => {
        sink.system_command(&command.data, command.timestamp)
      }
      MidiEvent::SetupChanged => sink.setup_changed(),
      MidiEvent::PropertyChanged(info) => sink.property_changed(info),
      MidiEvent::Notification(notification) => sink.notification(notification),
    }
  }
}

impl fmt::Display for MidiEvent {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      MidiEvent::NoteOn {
        note,
        velocity,
        channel,
      }
      | MidiEvent::NoteOff {
        note,
        velocity,
        channel,
      } => write!(
        f,
        "{} {} ({}) vel={} {}",
        self.kind().name(),
        note.name(),
        note,
        velocity,
        channel
      ),
      MidiEvent::ControlChange {
        controller,
        value,
        channel,
      } => write!(f, "control change cc{}={} {}", controller, value, channel),
      MidiEvent::PolyAftertouch {
        note,
        pressure,
        channel,
      } => write!(
        f,
        "poly aftertouch {} pressure={} {}",
        note.name(),
        pressure,
        channel
      ),
      MidiEvent::ChannelAftertouch { pressure, channel } => {
        write!(f, "channel aftertouch pressure={} {}", pressure, channel)
      }
      MidiEvent::PitchBend { value, channel } => {
        write!(f, "pitch bend {} ({}) {}", value, value.value(), channel)
      }
      MidiEvent::ProgramChange { program, channel } => {
        write!(f, "program change {} {}", program, channel)
      }
      MidiEvent::SystemCommand(command) => {
        write!(f, "system command [")?;
        for (index, byte) in command.data.iter().enumerate() {
          if index > 0 {
            write!(f, " ")?;
          }
          write!(f, "{:02x}", byte)?;
        }
        write!(f, "] at {}", command.timestamp)
      }
      MidiEvent::SetupChanged => write!(f, "setup changed"),
      MidiEvent::PropertyChanged(info) => {
        write!(f, "property changed '{}' on {}", info.property, info.object)
      }
      MidiEvent::Notification(notification) => write!(f, "notification {:?}", notification),
    }
  }
}

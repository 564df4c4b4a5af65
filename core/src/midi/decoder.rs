use log::{debug, warn};

use crate::config::Decoder as DecoderConfig;
use crate::midi::event::{MidiEvent, SystemCommand};
use crate::midi::types::{
  Channel, ControlValue, Controller, Note, PitchBend, Pressure, Program, Velocity,
};
use crate::time::Timestamp;

const SYSEX_START: u8 = 0xf0;
const SYSEX_END: u8 = 0xf7;
const TUNE_REQUEST: u8 = 0xf6;

#[inline]
fn is_status(byte: u8) -> bool {
  byte & 0x80 != 0
}

#[inline]
fn is_realtime(byte: u8) -> bool {
  byte >= 0xf8
}

/// Number of data bytes that follow a status byte.
fn data_size(status: u8) -> usize {
  match status & 0xf0 {
    0xc0 | 0xd0 => 1,
    0xf0 => match status {
      0xf1 | 0xf3 => 1,
      0xf2 => 2,
      _ => 0,
    },
    _ => 2,
  }
}

/// Turns a stream of raw MIDI bytes into events.
///
/// State survives between calls to [`Decoder::decode`], so a message or a
/// SysEx split across packets is completed by the following packets.
pub struct Decoder {
  running_status: bool,
  note_on_zero_as_off: bool,
  max_sysex_len: usize,
  status: Option<u8>,
  data: Vec<u8>,
  sysex: Option<Vec<u8>>,
  sysex_overflow: bool,
}

impl Decoder {
  pub fn new(config: &DecoderConfig) -> Decoder {
    Decoder {
      running_status: config.running_status,
      note_on_zero_as_off: config.note_on_zero_as_off,
      max_sysex_len: config.max_sysex_len,
      status: None,
      data: Vec::with_capacity(2),
      sysex: None,
      sysex_overflow: false,
    }
  }

  /// Forgets any partial message.
  pub fn reset(&mut self) {
    self.status = None;
    self.data.clear();
    self.sysex = None;
    self.sysex_overflow = false;
  }

  pub fn decode(&mut self, timestamp: Timestamp, bytes: &[u8]) -> Vec<MidiEvent> {
    let mut events = Vec::new();
    for byte in bytes.iter().cloned() {
      if let Some(event) = self.push(timestamp, byte) {
        events.push(event);
      }
    }
    events
  }

  fn push(&mut self, timestamp: Timestamp, byte: u8) -> Option<MidiEvent> {
    if is_realtime(byte) {
      return self.decode_realtime(timestamp, byte);
    }

    if self.sysex.is_some() {
      return self.decode_sysex(timestamp, byte);
    }

    if is_status(byte) {
      self.decode_status(timestamp, byte)
    } else {
      self.decode_data(timestamp, byte)
    }
  }

  fn decode_realtime(&mut self, timestamp: Timestamp, status: u8) -> Option<MidiEvent> {
    match status {
      0xf9 | 0xfd => {
        debug!("Ignoring undefined real-time status {:02x}", status);
        None
      }
      _ => Some(system_command(vec![status], timestamp)),
    }
  }

  fn decode_sysex(&mut self, timestamp: Timestamp, byte: u8) -> Option<MidiEvent> {
    if !is_status(byte) {
      let max_sysex_len = self.max_sysex_len;
      if let Some(sysex) = self.sysex.as_mut() {
        if sysex.len() < max_sysex_len {
          sysex.push(byte);
        } else {
          self.sysex_overflow = true;
        }
      }
      return None;
    }

    let mut sysex = self.sysex.take().unwrap_or_default();
    let overflow = self.sysex_overflow;
    self.sysex_overflow = false;

    if byte == SYSEX_END {
      // the limit covers the whole message, framing bytes included
      if overflow || sysex.len() + 1 > self.max_sysex_len {
        warn!(
          "Dropping SysEx longer than {} bytes",
          self.max_sysex_len
        );
        return None;
      }
      sysex.push(SYSEX_END);
      return Some(system_command(sysex, timestamp));
    }

    warn!(
      "SysEx interrupted by status {:02x}, dropping {} bytes",
      byte,
      sysex.len()
    );
    self.decode_status(timestamp, byte)
  }

  fn decode_status(&mut self, timestamp: Timestamp, status: u8) -> Option<MidiEvent> {
    if !self.data.is_empty() {
      if let Some(previous) = self.status {
        debug!(
          "Status {:02x} interrupted {:02x}, dropping {:02x?}",
          status, previous, self.data
        );
      }
      self.data.clear();
    }
    match status {
      SYSEX_START => {
        self.status = None;
        self.sysex = Some(vec![SYSEX_START]);
        None
      }
      SYSEX_END => {
        warn!("Unexpected end of SysEx");
        self.status = None;
        None
      }
      TUNE_REQUEST => {
        self.status = None;
        Some(system_command(vec![status], timestamp))
      }
      0xf4 | 0xf5 => {
        debug!("Ignoring undefined system common status {:02x}", status);
        self.status = None;
        None
      }
      _ => {
        self.status = Some(status);
        None
      }
    }
  }

  fn decode_data(&mut self, timestamp: Timestamp, byte: u8) -> Option<MidiEvent> {
    let status = match self.status {
      Some(status) => status,
      None => {
        debug!("Ignoring data byte {:02x} without status", byte);
        return None;
      }
    };

    self.data.push(byte);
    if self.data.len() < data_size(status) {
      return None;
    }

    let event = self.build(status, timestamp);
    self.data.clear();
    if status >= 0xf0 || !self.running_status {
      self.status = None;
    }
    Some(event)
  }

  fn build(&self, status: u8, timestamp: Timestamp) -> MidiEvent {
    let channel = Channel::from_masked(status);
    let data = &self.data;
    match status & 0xf0 {
      0x80 => MidiEvent::NoteOff {
        note: Note::from_masked(data[0]),
        velocity: Velocity::from_masked(data[1]),
        channel,
      },
      0x90 if data[1] == 0 && self.note_on_zero_as_off => MidiEvent::NoteOff {
        note: Note::from_masked(data[0]),
        velocity: Velocity::MIN,
        channel,
      },
      0x90 => MidiEvent::NoteOn {
        note: Note::from_masked(data[0]),
        velocity: Velocity::from_masked(data[1]),
        channel,
      },
      0xa0 => MidiEvent::PolyAftertouch {
        note: Note::from_masked(data[0]),
        pressure: Pressure::from_masked(data[1]),
        channel,
      },
      0xb0 => MidiEvent::ControlChange {
        controller: Controller::from_masked(data[0]),
        value: ControlValue::from_masked(data[1]),
        channel,
      },
      0xc0 => MidiEvent::ProgramChange {
        program: Program::from_masked(data[0]),
        channel,
      },
      0xd0 => MidiEvent::ChannelAftertouch {
        pressure: Pressure::from_masked(data[0]),
        channel,
      },
      0xe0 => MidiEvent::PitchBend {
        value: PitchBend::from_lsb_msb(data[0], data[1]),
        channel,
      },
      _ => {
        let mut bytes = Vec::with_capacity(1 + data.len());
        bytes.push(status);
        bytes.extend_from_slice(data);
        system_command(bytes, timestamp)
      }
    }
  }
}

impl Default for Decoder {
  fn default() -> Decoder {
    Decoder::new(&DecoderConfig::default())
  }
}

fn system_command(data: Vec<u8>, timestamp: Timestamp) -> MidiEvent {
  MidiEvent::SystemCommand(SystemCommand::new(data, timestamp))
}

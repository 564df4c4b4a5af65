use log::info;

use midi_sink_core::midi::sink::{Diagnostics, MidiEventSink};
use midi_sink_core::midi::types::{
  Channel, ControlValue, Controller, Note, PitchBend, Pressure, Program, Velocity,
};
use midi_sink_core::time::Timestamp;

/// Prints channel voice and system messages. Setup, property and other
/// notifications are left to the default callbacks.
pub struct MonitorSink {
  diagnostics: Diagnostics,
  received: usize,
}

impl MonitorSink {
  pub fn new(diagnostics: Diagnostics) -> MonitorSink {
    MonitorSink {
      diagnostics,
      received: 0,
    }
  }

  pub fn received(&self) -> usize {
    self.received
  }
}

impl MidiEventSink for MonitorSink {
  fn diagnostics(&self) -> Option<&Diagnostics> {
    Some(&self.diagnostics)
  }

  fn note_on(&mut self, note: Note, velocity: Velocity, channel: Channel) {
    self.received += 1;
    info!("{} note on  {:<4} vel={}", channel, note.name(), velocity);
  }

  fn note_off(&mut self, note: Note, velocity: Velocity, channel: Channel) {
    self.received += 1;
    info!("{} note off {:<4} vel={}", channel, note.name(), velocity);
  }

  fn control_change(&mut self, controller: Controller, value: ControlValue, channel: Channel) {
    self.received += 1;
    info!("{} cc{}={}", channel, controller, value);
  }

  fn poly_aftertouch(&mut self, note: Note, pressure: Pressure, channel: Channel) {
    self.received += 1;
    info!("{} aftertouch {} pressure={}", channel, note.name(), pressure);
  }

  fn channel_aftertouch(&mut self, pressure: Pressure, channel: Channel) {
    self.received += 1;
    info!("{} aftertouch pressure={}", channel, pressure);
  }

  fn pitch_bend(&mut self, value: PitchBend, channel: Channel) {
    self.received += 1;
    info!("{} pitch bend {} ({})", channel, value, value.value());
  }

  fn program_change(&mut self, program: Program, channel: Channel) {
    self.received += 1;
    info!("{} program {}", channel, program);
  }

  fn system_command(&mut self, data: &[u8], timestamp: Timestamp) {
    self.received += 1;
    info!("system {:02x?} at {}", data, timestamp);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use midi_sink_core::midi::event::{MidiEvent, SystemCommand};

  #[test]
  fn counts_handled_events() {
    let mut sink = MonitorSink::new(Diagnostics::quiet());
    let events = vec![
      MidiEvent::NoteOn {
        note: Note::MIDDLE_C,
        velocity: Velocity::MAX,
        channel: Channel::MIN,
      },
      MidiEvent::PitchBend {
        value: PitchBend::CENTER,
        channel: Channel::MAX,
      },
      MidiEvent::SetupChanged,
      MidiEvent::SystemCommand(SystemCommand::new(vec![0xfa], Timestamp::zero())),
    ];
    for event in events.iter() {
      event.deliver_to(&mut sink);
    }
    assert_eq!(sink.received(), 3);
  }
}

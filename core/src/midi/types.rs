use std::fmt;

use failure::Fail;

#[derive(Debug, Fail, PartialEq, Eq)]
pub enum ValueError {
  #[fail(display = "{} out of range: {} (expected {}..={})", name, value, min, max)]
  OutOfRange {
    name: &'static str,
    value: u32,
    min: u32,
    max: u32,
  },
}

pub type ValueResult<T> = Result<T, ValueError>;

fn check(name: &'static str, value: u32, max: u32) -> ValueResult<u32> {
  if value <= max {
    Ok(value)
  } else {
    Err(ValueError::OutOfRange {
      name,
      value,
      min: 0,
      max,
    })
  }
}

macro_rules! u7_value {
  ($(#[$meta:meta])* $name:ident, $label:expr) => {
    $(#[$meta])*
    #[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
    pub struct $name(u8);

    impl $name {
      pub const MIN: $name = $name(0);
      pub const MAX: $name = $name(127);

      pub fn new(value: u8) -> ValueResult<$name> {
        check($label, u32::from(value), 127).map(|_| $name(value))
      }

      /// Keeps the lower 7 bits, as they arrive from the wire.
      pub fn from_masked(value: u8) -> $name {
        $name(value & 0x7f)
      }

      pub fn value(self) -> u8 {
        self.0
      }
    }

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
      }
    }
  };
}

u7_value!(
  /// Key number, 60 being the middle C.
  Note,
  "note"
);
u7_value!(Velocity, "velocity");
u7_value!(Controller, "controller");
u7_value!(ControlValue, "control value");
u7_value!(
  /// Aftertouch amount, either per key or for the whole channel.
  Pressure,
  "pressure"
);
u7_value!(Program, "program");

const NOTE_NAMES: [&str; 12] = [
  "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

impl Note {
  pub const MIDDLE_C: Note = Note(60);

  /// Scientific pitch notation with middle C as `C4`.
  pub fn name(self) -> String {
    let octave = i16::from(self.0 / 12) - 1;
    format!("{}{}", NOTE_NAMES[(self.0 % 12) as usize], octave)
  }
}

/// Zero based channel, 0..=15.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub struct Channel(u8);

impl Channel {
  pub const MIN: Channel = Channel(0);
  pub const MAX: Channel = Channel(15);

  pub fn new(value: u8) -> ValueResult<Channel> {
    check("channel", u32::from(value), 15).map(|_| Channel(value))
  }

  pub fn from_masked(value: u8) -> Channel {
    Channel(value & 0x0f)
  }

  pub fn value(self) -> u8 {
    self.0
  }

  /// The channel number as shown to users, 1..=16.
  pub fn number(self) -> u8 {
    self.0 + 1
  }
}

impl fmt::Display for Channel {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "ch{}", self.number())
  }
}

/// 14 bits pitch wheel position, centered at 8192.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub struct PitchBend(u16);

impl PitchBend {
  pub const MIN: PitchBend = PitchBend(0);
  pub const CENTER: PitchBend = PitchBend(8192);
  pub const MAX: PitchBend = PitchBend(16383);

  pub fn new(value: u16) -> ValueResult<PitchBend> {
    check("pitch bend", u32::from(value), 16383).map(|_| PitchBend(value))
  }

  pub fn from_lsb_msb(lsb: u8, msb: u8) -> PitchBend {
    PitchBend((u16::from(msb & 0x7f) << 7) | u16::from(lsb & 0x7f))
  }

  pub fn value(self) -> u16 {
    self.0
  }

  pub fn lsb(self) -> u8 {
    (self.0 & 0x7f) as u8
  }

  pub fn msb(self) -> u8 {
    ((self.0 >> 7) & 0x7f) as u8
  }

  /// Signed deviation from the center, -8192..=8191.
  pub fn offset(self) -> i16 {
    self.0 as i16 - Self::CENTER.0 as i16
  }
}

impl Default for PitchBend {
  fn default() -> PitchBend {
    PitchBend::CENTER
  }
}

impl fmt::Display for PitchBend {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{:+}", self.offset())
  }
}

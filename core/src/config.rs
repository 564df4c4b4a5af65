use failure;
use failure::Error;

use serde;
use serde_derive::Deserialize;

use std::fs::File;
use std::io::Read;

use crate::midi::sink::Diagnostics as SinkDiagnostics;

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Diagnostics {
  pub verbose: bool,
  pub target: String,
  pub level: String,
}

impl Default for Diagnostics {
  fn default() -> Diagnostics {
    Diagnostics {
      verbose: false,
      target: SinkDiagnostics::DEFAULT_TARGET.to_string(),
      level: "debug".to_string(),
    }
  }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Decoder {
  pub running_status: bool,
  pub note_on_zero_as_off: bool,
  pub max_sysex_len: usize,
}

impl Default for Decoder {
  fn default() -> Decoder {
    Decoder {
      running_status: true,
      note_on_zero_as_off: true,
      max_sysex_len: 4096,
    }
  }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Delivery {
  pub channel_capacity: usize,
}

impl Default for Delivery {
  fn default() -> Delivery {
    Delivery {
      channel_capacity: 1024,
    }
  }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct Config {
  pub diagnostics: Diagnostics,
  pub decoder: Decoder,
  pub delivery: Delivery,
}

impl Config {
  pub fn from_file<'a, T>(path: T) -> Result<Config, Error>
  where
    T: Into<&'a str>,
  {
    let mut content = String::new();
    let path_str = path.into();
    let mut file = File::open(path_str)?;
    file.read_to_string(&mut content)?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
  }

  pub fn from_str<'a, T>(content: T) -> Result<Config, Error>
  where
    T: Into<&'a str>,
  {
    let config: Config = toml::from_str(content.into())?;
    Ok(config)
  }
}

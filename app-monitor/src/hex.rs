use failure::Fail;

#[derive(Debug, Fail, PartialEq)]
pub enum HexError {
  #[fail(display = "Invalid hex byte '{}' at position {}", token, position)]
  InvalidByte { token: String, position: usize },
}

/// Parses a line of space separated hex bytes, such as `90 3c 7f`.
///
/// Everything after a `#` is ignored, so blank and comment lines give no bytes.
pub fn parse_line(line: &str) -> Result<Vec<u8>, HexError> {
  let content = match line.find('#') {
    Some(index) => &line[..index],
    None => line,
  };

  let mut bytes = Vec::new();
  let mut position = 0;
  for token in content.split(|c: char| c.is_whitespace() || c == ',') {
    if token.is_empty() {
      continue;
    }
    position += 1;

    let digits = token
      .strip_prefix("0x")
      .or_else(|| token.strip_prefix("0X"))
      .unwrap_or(token);
    if digits.is_empty() || digits.len() > 2 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
      return Err(invalid(token, position));
    }

    let byte = u8::from_str_radix(digits, 16).map_err(|_| invalid(token, position))?;
    bytes.push(byte);
  }

  Ok(bytes)
}

fn invalid(token: &str, position: usize) -> HexError {
  HexError::InvalidByte {
    token: token.to_string(),
    position,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn plain_bytes() {
    assert_eq!(parse_line("90 3c 7f"), Ok(vec![0x90, 0x3c, 0x7f]));
    assert_eq!(parse_line("  F8\t0xfa,0A "), Ok(vec![0xf8, 0xfa, 0x0a]));
  }

  #[test]
  fn blank_and_comments() {
    assert!(parse_line("").unwrap().is_empty());
    assert!(parse_line("   # nothing here").unwrap().is_empty());
    assert_eq!(parse_line("c0 05 # program 5"), Ok(vec![0xc0, 0x05]));
  }

  #[test]
  fn invalid_tokens() {
    assert_eq!(
      parse_line("90 zz 7f"),
      Err(HexError::InvalidByte {
        token: "zz".to_string(),
        position: 2,
      })
    );
    assert!(parse_line("903c").is_err());
    assert!(parse_line("0x").is_err());
    assert!(parse_line("+f").is_err());
    assert!(parse_line("0x0x12").is_err());
    assert!(parse_line("-1").is_err());
  }
}

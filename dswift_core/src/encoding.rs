use std::fmt;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use crate::DswiftError;
use crate::DswiftResult;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

/// The text encodings templates and generated files may use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextEncoding {
	#[default]
	#[serde(rename = "utf8", alias = "utf-8")]
	Utf8,
	#[serde(rename = "utf16le", alias = "utf-16le")]
	Utf16LittleEndian,
	#[serde(rename = "utf16be", alias = "utf-16be")]
	Utf16BigEndian,
}

impl TextEncoding {
	pub fn name(self) -> &'static str {
		match self {
			Self::Utf8 => "utf8",
			Self::Utf16LittleEndian => "utf16le",
			Self::Utf16BigEndian => "utf16be",
		}
	}

	/// The `String.Encoding` member the generator program writes with.
	pub fn swift_name(self) -> &'static str {
		match self {
			Self::Utf8 => "utf8",
			Self::Utf16LittleEndian => "utf16LittleEndian",
			Self::Utf16BigEndian => "utf16BigEndian",
		}
	}

	/// Detect the encoding from a byte-order mark. Returns the encoding and the
	/// length of the mark; files without a mark are UTF-8.
	pub fn detect(bytes: &[u8]) -> (Self, usize) {
		if bytes.starts_with(UTF8_BOM) {
			(Self::Utf8, UTF8_BOM.len())
		} else if bytes.starts_with(UTF16_LE_BOM) {
			(Self::Utf16LittleEndian, UTF16_LE_BOM.len())
		} else if bytes.starts_with(UTF16_BE_BOM) {
			(Self::Utf16BigEndian, UTF16_BE_BOM.len())
		} else {
			(Self::Utf8, 0)
		}
	}

	fn bom(self) -> &'static [u8] {
		match self {
			Self::Utf8 => UTF8_BOM,
			Self::Utf16LittleEndian => UTF16_LE_BOM,
			Self::Utf16BigEndian => UTF16_BE_BOM,
		}
	}

	/// Decode `bytes`, dropping this encoding's byte-order mark when present.
	pub fn decode(self, path: &Path, bytes: &[u8]) -> DswiftResult<String> {
		let bytes = bytes.strip_prefix(self.bom()).unwrap_or(bytes);
		let invalid = || {
			DswiftError::InvalidEncoding {
				path: path.display().to_string(),
				encoding: self.name().to_string(),
			}
		};

		match self {
			Self::Utf8 => String::from_utf8(bytes.to_vec()).map_err(|_| invalid()),
			Self::Utf16LittleEndian | Self::Utf16BigEndian => {
				if bytes.len() % 2 != 0 {
					return Err(invalid());
				}

				let units = bytes.chunks_exact(2).map(|pair| {
					let pair = [pair[0], pair[1]];
					if self == Self::Utf16LittleEndian {
						u16::from_le_bytes(pair)
					} else {
						u16::from_be_bytes(pair)
					}
				});

				char::decode_utf16(units)
					.collect::<Result<String, _>>()
					.map_err(|_| invalid())
			}
		}
	}

	/// Encode `text` without a byte-order mark.
	pub fn encode(self, text: &str) -> Vec<u8> {
		match self {
			Self::Utf8 => text.as_bytes().to_vec(),
			Self::Utf16LittleEndian => text.encode_utf16().flat_map(u16::to_le_bytes).collect(),
			Self::Utf16BigEndian => text.encode_utf16().flat_map(u16::to_be_bytes).collect(),
		}
	}
}

impl fmt::Display for TextEncoding {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// Text read from disk together with the encoding it was decoded with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
	pub text: String,
	pub encoding: TextEncoding,
}

/// Read and decode a file. A `declared` encoding wins over byte-order mark
/// detection.
pub fn read_text(path: &Path, declared: Option<TextEncoding>) -> DswiftResult<DecodedText> {
	let bytes = std::fs::read(path).map_err(|error| {
		DswiftError::ReadFile {
			path: path.display().to_string(),
			reason: error.to_string(),
		}
	})?;
	let encoding = declared.unwrap_or_else(|| TextEncoding::detect(&bytes).0);
	let text = encoding.decode(path, &bytes)?;

	Ok(DecodedText { text, encoding })
}

/// Encode and write `text`. UTF-16 output starts with a byte-order mark so
/// that the encoding is detected when the file is read back.
pub fn write_text(path: &Path, text: &str, encoding: TextEncoding) -> DswiftResult<()> {
	let mut bytes = match encoding {
		TextEncoding::Utf8 => Vec::new(),
		TextEncoding::Utf16LittleEndian | TextEncoding::Utf16BigEndian => encoding.bom().to_vec(),
	};
	bytes.extend(encoding.encode(text));
	std::fs::write(path, bytes)?;

	Ok(())
}

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

/// The command set understood by this driver.
const COMMAND_SET: &str = "PT-CBP";

// Lenient on purpose: no RFC-style validation, whitespace around tokens and a missing final `;` are fine.
static FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s:\s*([^:,;]+?)\s*:\s*([^:;]*)\s*(?:;|$))").expect("device ID pattern is valid")
});

/// A parsed IEEE 1284 device ID string (`KEY:value1,value2;KEY2:...;`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceId {
    fields: HashMap<String, Vec<String>>,
    truncated: bool,
}

impl DeviceId {
    /// Parse the raw device ID string. Fragments that don't form a key/value pair are skipped.
    pub fn parse(id: &[u8]) -> Self {
        let id = String::from_utf8_lossy(id);

        let fields = FIELD
            .captures_iter(&id)
            .map(|kv| {
                let values: Vec<String> = kv[2]
                    .split(',')
                    .map(|v| v.trim_matches(['\t', '\n', '\x0b', '\x0c', '\r', ' ']).to_string())
                    .collect();

                (kv[1].to_string(), values)
            })
            .collect();

        Self {
            fields,
            truncated: false,
        }
    }

    /// Parse a device ID as returned by the kernel: a big-endian 16-bit length followed by the string.
    /// If the length claims more than the buffer holds, whatever is there gets parsed and the ID is
    /// marked as truncated.
    pub fn parse_length_prefixed(buf: &[u8]) -> Self {
        let (data, truncated) = match buf {
            [hi, lo, rest @ ..] => {
                let length = u16::from_be_bytes([*hi, *lo]) as usize;

                match rest.get(..length) {
                    Some(data) => (data, false),
                    None => (rest, true),
                }
            }
            _ => (&[][..], true),
        };

        Self {
            truncated,
            ..Self::parse(data)
        }
    }

    /// Whether the transport cut the string short.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// All values for `key`, falling back to its `abbreviation`.
    pub fn find(&self, key: &str, abbreviation: &str) -> &[String] {
        self.fields
            .get(key)
            .or_else(|| self.fields.get(abbreviation))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The first value for `key` (or its `abbreviation`), or an empty string.
    pub fn find_first(&self, key: &str, abbreviation: &str) -> &str {
        self.find(key, abbreviation)
            .first()
            .map_or("", String::as_str)
    }

    pub fn manufacturer(&self) -> &str {
        self.find_first("MANUFACTURER", "MFG")
    }

    pub fn model(&self) -> &str {
        self.find_first("MODEL", "MDL")
    }

    /// Does the device speak the raster command set this driver produces?
    pub fn is_compatible(&self) -> bool {
        self.find("COMMAND SET", "CMD")
            .iter()
            .any(|command_set| command_set == COMMAND_SET)
    }
}

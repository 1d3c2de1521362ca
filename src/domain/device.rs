use std::fmt;

use crate::domain::error::DomainError;

/// Target phone as written in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeviceIdentifier {
    /// Bluetooth MAC address.
    Address([u8; 6]),
    /// Platform id passed through as-is (BlueZ object path, Windows device-interface id).
    Native(String),
}

impl DeviceIdentifier {
    /// Parse a configured identifier.
    ///
    /// Accepts `AA:BB:CC:DD:EE:FF`, `AA-BB-CC-DD-EE-FF` and `AABBCCDDEEFF`.
    /// Strings that look like platform ids, or are not a MAC at all, are kept
    /// as [`DeviceIdentifier::Native`].
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(DomainError::NoTargetDevice);
        }

        if looks_native(raw) {
            return Ok(Self::Native(raw.to_string()));
        }

        Ok(parse_mac(raw)
            .map(Self::Address)
            .unwrap_or_else(|| Self::Native(raw.to_string())))
    }

    pub fn address(&self) -> Option<[u8; 6]> {
        match self {
            Self::Address(bytes) => Some(*bytes),
            Self::Native(_) => None,
        }
    }

    /// Upper-case hex without separators, as embedded in Windows device ids.
    pub fn compact_hex(&self) -> Option<String> {
        self.address()
            .map(|bytes| bytes.iter().map(|b| format!("{b:02X}")).collect())
    }

    /// BlueZ D-Bus object path for this device on `adapter`.
    pub fn bluez_path(&self, adapter: &str) -> Result<String, DomainError> {
        match self {
            Self::Address(bytes) => {
                let joined: Vec<String> = bytes.iter().map(|b| format!("{b:02X}")).collect();
                Ok(format!("/org/bluez/{}/dev_{}", adapter, joined.join("_")))
            }
            Self::Native(path) if path.starts_with("/org/bluez/") => Ok(path.clone()),
            Self::Native(other) => Err(DomainError::InvalidDeviceIdentifier(other.clone())),
        }
    }
}

impl fmt::Display for DeviceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address(bytes) => {
                for (i, b) in bytes.iter().enumerate() {
                    if i > 0 {
                        f.write_str(":")?;
                    }
                    write!(f, "{b:02X}")?;
                }
                Ok(())
            }
            Self::Native(id) => f.write_str(id),
        }
    }
}

fn looks_native(raw: &str) -> bool {
    raw.contains('\\')
        || raw.contains('#')
        || raw.starts_with('/')
        || raw.get(..3).is_some_and(|p| p.eq_ignore_ascii_case("bth"))
}

fn parse_mac(raw: &str) -> Option<[u8; 6]> {
    let hex: String = if raw.len() == 17 {
        let separator = raw.as_bytes()[2];
        if separator != b':' && separator != b'-' {
            return None;
        }
        let groups: Vec<&str> = raw.split(separator as char).collect();
        if groups.len() != 6 || groups.iter().any(|g| g.len() != 2) {
            return None;
        }
        groups.concat()
    } else if raw.len() == 12 {
        raw.to_string()
    } else {
        return None;
    };

    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    let mut bytes = [0u8; 6];
    for (i, byte) in bytes.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
    }
    Some(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHONE: [u8; 6] = [0xAA, 0xBB, 0xCC, 0x01, 0x02, 0x0F];

    #[test]
    fn test_parse_mac_forms() {
        for raw in ["aa:bb:cc:01:02:0f", "AA-BB-CC-01-02-0F", "aabbcc01020F", "  AA:BB:CC:01:02:0F "] {
            assert_eq!(
                DeviceIdentifier::parse(raw).unwrap(),
                DeviceIdentifier::Address(PHONE),
                "{raw}"
            );
        }
    }

    #[test]
    fn test_parse_empty_is_no_target() {
        assert!(matches!(
            DeviceIdentifier::parse("   "),
            Err(DomainError::NoTargetDevice)
        ));
    }

    #[test]
    fn test_native_ids_pass_through() {
        let windows = r"\\?\BTHENUM#{0000110a-0000-1000-8000-00805f9b34fb}_LOCALMFG&0002#7&1&AABBCC01020F_C00000000";
        assert_eq!(
            DeviceIdentifier::parse(windows).unwrap(),
            DeviceIdentifier::Native(windows.to_string())
        );

        let bluez = "/org/bluez/hci1/dev_AA_BB_CC_01_02_0F";
        assert_eq!(
            DeviceIdentifier::parse(bluez).unwrap().bluez_path("hci0").unwrap(),
            bluez
        );

        // Mixed separators are not a MAC.
        assert!(matches!(
            DeviceIdentifier::parse("AA:BB-CC:01:02:0F").unwrap(),
            DeviceIdentifier::Native(_)
        ));
    }

    #[test]
    fn test_bluez_path_and_display() {
        let id = DeviceIdentifier::Address(PHONE);
        assert_eq!(
            id.bluez_path("hci0").unwrap(),
            "/org/bluez/hci0/dev_AA_BB_CC_01_02_0F"
        );
        assert_eq!(id.to_string(), "AA:BB:CC:01:02:0F");
        assert_eq!(id.compact_hex().unwrap(), "AABBCC01020F");

        let native = DeviceIdentifier::Native("my-phone".into());
        assert!(matches!(
            native.bluez_path("hci0"),
            Err(DomainError::InvalidDeviceIdentifier(_))
        ));
        assert_eq!(native.compact_hex(), None);
    }
}

use uuid::Uuid;

pub mod dispatch_post;
pub mod ids;
pub mod journey;
pub mod journey_event;
pub mod server;
pub mod vehicle_sequence;

/// Fixed UUIDv5 namespaces from spec §6. These encode identity and must
/// never change.
pub const SERVER_NAMESPACE: Uuid =
    Uuid::from_bytes(hex_literal_bytes("8fb462f582ab40968538fff7a96a0094"));
pub const DISPATCH_POST_NAMESPACE: Uuid =
    Uuid::from_bytes(hex_literal_bytes("07b6867698164bef8bd8cf15e3f38f4e"));
pub const JOURNEY_EVENT_NAMESPACE: Uuid =
    Uuid::from_bytes(hex_literal_bytes("e869adbabca7485f8c0cedc61582b4f4"));

/// Not one of the three namespaces fixed by §6; the journey's own namespace
/// is left unspecified there. Derived the same way (UUIDv5 of a constant
/// name string under the nil namespace) so it is still fixed and
/// deterministic across process restarts — see DESIGN.md open questions.
pub const JOURNEY_NAMESPACE: Uuid = Uuid::from_bytes(hex_literal_bytes(
    "5f6a6d8e9c1b4a2fa3d4e5f6a7b8c9d0",
));

const fn hex_literal_bytes(hex: &str) -> [u8; 16] {
    let bytes = hex.as_bytes();
    let mut out = [0u8; 16];
    let mut i = 0;
    while i < 16 {
        let hi = hex_digit(bytes[i * 2]);
        let lo = hex_digit(bytes[i * 2 + 1]);
        out[i] = (hi << 4) | lo;
        i += 1;
    }
    out
}

const fn hex_digit(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b - b'a' + 10,
        b'A'..=b'F' => b - b'A' + 10,
        _ => panic!("invalid hex digit in namespace literal"),
    }
}

/// The upstream's closed set of transport categories, derived from the
/// first two characters of its 3-character train-type code (GLOSSARY).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportCategory {
    NationalExpress,
    InterNationalExpress,
    InterRegionalExpress,
    InterRegional,
    RegionalFast,
    Regional,
    Additional,
    Maneuver,
    EmptyTransfer,
    InterNationalCargo,
    NationalCargo,
    Maintenance,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTrainType(pub String);

impl std::fmt::Display for UnknownTrainType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown train type code: {}", self.0)
    }
}

impl std::error::Error for UnknownTrainType {}

impl TransportCategory {
    /// Maps a 3-character upstream train-type code to its category by
    /// looking at the first two characters. Unknown prefixes are a hard
    /// error (§7 "Schema drift" maps *unknown enum in train type* to the
    /// `UNKNOWN` path at the call site, not here — this function stays a
    /// pure closed mapping so the caller decides what to do with the
    /// error).
    pub fn from_train_type(code: &str) -> Result<Self, UnknownTrainType> {
        let prefix = code.get(0..2).unwrap_or(code);
        use TransportCategory::*;
        Ok(match prefix {
            "EI" => NationalExpress,
            "EC" | "EN" | "MM" => InterNationalExpress,
            "MP" | "MH" => InterRegionalExpress,
            "MO" | "MA" => InterRegional,
            "RP" => RegionalFast,
            "RA" | "RM" | "RO" | "AM" | "AP" => Regional,
            "OK" => Additional,
            "LM" | "LW" | "LP" | "LT" | "LZ" | "LS" => Maneuver,
            "PC" | "PW" | "PX" | "PH" | "TH" | "TS" | "TT" | "TK" => EmptyTransfer,
            "TA" | "TC" | "TG" | "TR" => InterNationalCargo,
            "TB" | "TD" | "TP" | "TN" | "TM" | "TL" => NationalCargo,
            "ZG" | "ZN" | "ZX" | "ZH" => Maintenance,
            other => return Err(UnknownTrainType(other.to_owned())),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    Asia,
    Europe,
    UsNorth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateType {
    Add,
    Remove,
    Update,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_literals_decode_correctly() {
        assert_eq!(
            SERVER_NAMESPACE.to_string(),
            "8fb462f5-82ab-4096-8538-fff7a96a0094"
        );
        assert_eq!(
            DISPATCH_POST_NAMESPACE.to_string(),
            "07b68676-9816-48ef-bd8a-cf15e3f38f4e"
        );
        assert_eq!(
            JOURNEY_EVENT_NAMESPACE.to_string(),
            "e869adba-bca7-485f-8c0c-edc61582b4f4"
        );
    }

    #[test]
    fn known_train_type_prefixes_map_correctly() {
        assert_eq!(
            TransportCategory::from_train_type("EIJ"),
            Ok(TransportCategory::NationalExpress)
        );
        assert_eq!(
            TransportCategory::from_train_type("RP5"),
            Ok(TransportCategory::RegionalFast)
        );
        assert_eq!(
            TransportCategory::from_train_type("ZG7"),
            Ok(TransportCategory::Maintenance)
        );
    }

    #[test]
    fn unknown_train_type_is_an_error() {
        assert!(TransportCategory::from_train_type("QQ9").is_err());
    }
}

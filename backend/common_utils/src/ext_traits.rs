use error_stack::ResultExt;
use serde::de::DeserializeOwned;

use crate::errors::{CustomResult, ParsingError};

/// Parse a JSON byte slice into a typed struct, tagging parse failures with
/// the target type name for diagnostics.
pub trait ByteSliceExt {
    fn parse_struct<T: DeserializeOwned>(
        &self,
        type_name: &'static str,
    ) -> CustomResult<T, ParsingError>;
}

impl ByteSliceExt for [u8] {
    fn parse_struct<T: DeserializeOwned>(
        &self,
        type_name: &'static str,
    ) -> CustomResult<T, ParsingError> {
        serde_json::from_slice(self)
            .change_context(ParsingError::StructParseFailure(type_name))
            .attach_printable_lazy(|| {
                format!("Unable to parse {type_name} from the given bytes")
            })
    }
}

/// Serialize a value into a JSON `serde_json::Value`.
pub trait Encode {
    fn encode_to_value(&self) -> CustomResult<serde_json::Value, ParsingError>;
}

impl<T: serde::Serialize> Encode for T {
    fn encode_to_value(&self) -> CustomResult<serde_json::Value, ParsingError> {
        serde_json::to_value(self).change_context(ParsingError::EncodeError("json-value"))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[derive(Debug, PartialEq, serde::Deserialize)]
    struct Probe {
        id: i64,
    }

    #[test]
    fn parse_struct_round_trips() {
        let parsed: Probe = br#"{"id": 7}"#.parse_struct("Probe").unwrap();
        assert_eq!(parsed, Probe { id: 7 });
    }

    #[test]
    fn parse_struct_reports_type_name() {
        let err = br#"not-json"#.parse_struct::<Probe>("Probe").unwrap_err();
        assert!(format!("{err:?}").contains("Probe"));
    }
}

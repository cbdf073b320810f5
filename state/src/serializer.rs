//! JSON text serializer

use serde::{de::DeserializeOwned, Serialize};
use stashline_core::{Serializer, StashlineError, StashlineResult};

/// Compact JSON, the text format web storage holds
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl<T> Serializer<T> for JsonSerializer
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &T) -> StashlineResult<String> {
        serde_json::to_string(value).map_err(|e| StashlineError::EncodeFailed(e.to_string()))
    }

    fn decode(&self, text: &str) -> StashlineResult<T> {
        serde_json::from_str(text).map_err(|e| StashlineError::DecodeFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::HashMap;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Profile {
        user: String,
        count: u32,
    }

    #[test]
    fn test_round_trip() {
        let profile = Profile {
            user: "Stored User".to_string(),
            count: 7,
        };
        let text = JsonSerializer.encode(&profile).unwrap();
        assert_eq!(text, r#"{"user":"Stored User","count":7}"#);

        let decoded: Profile = JsonSerializer.decode(&text).unwrap();
        assert_eq!(decoded, profile);
    }

    #[test]
    fn test_decode_malformed() {
        let result: StashlineResult<Profile> = JsonSerializer.decode("{not json");
        assert!(matches!(result, Err(StashlineError::DecodeFailed(_))));
    }

    #[test]
    fn test_decode_incompatible_shape() {
        let result: StashlineResult<Profile> = JsonSerializer.decode(r#"{"user":42}"#);
        assert!(matches!(result, Err(StashlineError::DecodeFailed(_))));
    }

    #[test]
    fn test_encode_failure() {
        // JSON object keys must be strings
        let mut map: HashMap<(u8, u8), u8> = HashMap::new();
        map.insert((1, 2), 3);

        let result = Serializer::<HashMap<(u8, u8), u8>>::encode(&JsonSerializer, &map);
        assert!(matches!(result, Err(StashlineError::EncodeFailed(_))));
    }
}

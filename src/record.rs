use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::Credential;

/// The single JSON object both parties read and write on the shared medium.
///
/// Fields this protocol does not know about are carried through a
/// read-modify-write untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRecord {
    #[serde(
        default,
        deserialize_with = "blank_as_absent",
        skip_serializing_if = "Option::is_none"
    )]
    pub server_id: Option<Credential>,
    #[serde(
        default,
        deserialize_with = "blank_as_absent",
        skip_serializing_if = "Option::is_none"
    )]
    pub client_id: Option<Credential>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ExchangeRecord {
    /// The server's opening record: `server_id` and nothing else.
    pub fn announce(server_id: Credential) -> Self {
        Self {
            server_id: Some(server_id),
            ..Default::default()
        }
    }

    /// A server has announced itself and no client has answered yet.
    pub fn is_awaiting_client(&self) -> bool {
        self.server_id.is_some() && self.client_id.is_none()
    }

    /// Both ids are present; the record belongs to a finished handshake.
    pub fn is_complete(&self) -> bool {
        self.server_id.is_some() && self.client_id.is_some()
    }

    pub fn with_client(mut self, client_id: Credential) -> Self {
        self.client_id = Some(client_id);
        self
    }
}

/// `null` and `""` both mean the party has not written its id yet.
fn blank_as_absent<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<Credential>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|id| Credential::new(id).ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cred(s: &str) -> Credential {
        Credential::new(s).unwrap()
    }

    #[test]
    fn announce_serializes_server_only() {
        let record = ExchangeRecord::announce(cred("S1"));
        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            r#"{"server_id":"S1"}"#
        );
        assert!(record.is_awaiting_client());
        assert!(!record.is_complete());
    }

    #[test]
    fn merge_keeps_unknown_fields() {
        let record: ExchangeRecord =
            serde_json::from_str(r#"{"server_id":"S1","hint":42}"#).unwrap();
        let record = record.with_client(cred("C1"));
        assert!(record.is_complete());
        assert!(!record.is_awaiting_client());

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["server_id"], "S1");
        assert_eq!(value["client_id"], "C1");
        assert_eq!(value["hint"], 42);
    }

    #[test]
    fn empty_object_is_not_active() {
        let record: ExchangeRecord = serde_json::from_str("{}").unwrap();
        assert!(!record.is_awaiting_client());
        assert!(!record.is_complete());
    }

    #[test]
    fn blank_ids_read_as_absent() {
        let record: ExchangeRecord =
            serde_json::from_str(r#"{"server_id":"","client_id":null}"#)
                .unwrap();
        assert_eq!(record, ExchangeRecord::default());
        assert!(!record.is_awaiting_client());

        let record: ExchangeRecord =
            serde_json::from_str(r#"{"server_id":"S1","client_id":""}"#)
                .unwrap();
        assert_eq!(record, ExchangeRecord::announce(cred("S1")));
        assert!(record.is_awaiting_client());
        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            r#"{"server_id":"S1"}"#
        );
    }

    #[test]
    fn non_string_id_is_rejected() {
        assert!(serde_json::from_str::<ExchangeRecord>(r#"{"server_id":7}"#)
            .is_err());
    }
}

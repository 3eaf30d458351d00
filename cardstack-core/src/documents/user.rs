//! User document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::Clock;
use crate::document_id::{DocType, DocumentId};

use super::{check_type, parse_id, DocumentError, WireDocument};

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    id: DocumentId,
    pub rev: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub modified: DateTime<Utc>,
    pub imported: Option<DateTime<Utc>>,
    username: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
}

impl User {
    /// Create a user whose ID is built from the account UUID.
    pub fn new(
        uuid: Uuid,
        username: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<Self, DocumentError> {
        let username = username.into();
        if username.trim().is_empty() {
            return Err(DocumentError::Validation(
                "username must not be empty".to_string(),
            ));
        }
        let now = clock.now();
        Ok(Self {
            id: DocumentId::from_uuid(DocType::User, uuid),
            rev: None,
            created: Some(now),
            modified: now,
            imported: None,
            username,
            full_name: None,
            email: None,
        })
    }

    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserWire {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    rev: Option<String>,
    #[serde(rename = "type")]
    doc_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created: Option<DateTime<Utc>>,
    modified: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    imported: Option<DateTime<Utc>>,
    username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
}

impl WireDocument for User {
    const DOC_TYPE: DocType = DocType::User;

    type Wire = UserWire;

    fn to_wire(&self) -> UserWire {
        debug_assert_eq!(self.id.doc_type(), Self::DOC_TYPE);
        UserWire {
            id: self.id.to_string(),
            rev: self.rev.clone(),
            doc_type: Self::DOC_TYPE.as_str().to_string(),
            created: self.created,
            modified: self.modified,
            imported: self.imported,
            username: self.username.clone(),
            full_name: self.full_name.clone(),
            email: self.email.clone(),
        }
    }

    fn from_wire(wire: UserWire) -> Result<Self, DocumentError> {
        check_type(&wire.doc_type, Self::DOC_TYPE)?;
        if wire.username.trim().is_empty() {
            return Err(DocumentError::Validation(
                "username must not be empty".to_string(),
            ));
        }
        Ok(Self {
            id: parse_id(&wire.id, DocType::User)?,
            rev: wire.rev,
            created: wire.created,
            modified: wire.modified,
            imported: wire.imported,
            username: wire.username,
            full_name: wire.full_name,
            email: wire.email,
        })
    }

    fn document_id(&self) -> DocumentId {
        self.id.clone()
    }
}

wire_serde!(User);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::TimeZone;

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2017, 1, 1, 0, 0, 0).unwrap())
    }

    #[test]
    fn test_user_new() {
        let uuid = Uuid::new_v4();
        let user = User::new(uuid, "bob", &clock()).unwrap();
        assert_eq!(user.id().doc_type(), DocType::User);
        assert_eq!(user.id().identity(), uuid.as_bytes());
        assert_eq!(user.username(), "bob");
        assert!(user.id().to_string().starts_with("user-"));
    }

    #[test]
    fn test_user_requires_username() {
        assert!(matches!(
            User::new(Uuid::new_v4(), "  ", &clock()),
            Err(DocumentError::Validation(_))
        ));
    }

    #[test]
    fn test_user_json_roundtrip() {
        let mut original = User::new(Uuid::nil(), "bob", &clock()).unwrap();
        original.full_name = Some("Bob Smith".to_string());
        original.email = Some("bob@example.com".to_string());

        let json = original.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["_id"], "user-aaaaaaaaaaaaaaaaaaaaaaaaaa");
        assert_eq!(value["fullName"], "Bob Smith");

        let parsed = User::from_json(&json).unwrap();
        assert_eq!(parsed, original);
        assert_eq!(parsed.to_json().unwrap(), json);
    }

    #[test]
    fn test_user_empty_username_on_wire() {
        let json = r#"{
            "_id": "user-mjxwe",
            "type": "user",
            "modified": "2017-01-01T00:00:00Z",
            "username": ""
        }"#;
        assert!(matches!(
            User::from_json(json),
            Err(DocumentError::Validation(_))
        ));
    }
}

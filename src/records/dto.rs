use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo_types::{Record, RecordType, RecordTypeError};

/// Record type as sent by clients: enum name or enum number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireRecordType {
    Number(i64),
    Name(String),
}

impl WireRecordType {
    /// Absent means EXPENSE; anything outside the enum is rejected.
    pub fn resolve(raw: Option<&WireRecordType>) -> Result<RecordType, RecordTypeError> {
        match raw {
            None => Ok(RecordType::default()),
            Some(WireRecordType::Number(n)) => RecordType::from_number(*n),
            Some(WireRecordType::Name(name)) => RecordType::from_name(name),
        }
    }
}

impl From<RecordType> for WireRecordType {
    fn from(t: RecordType) -> Self {
        WireRecordType::Name(t.name().to_string())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateRecordRequest {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub record_type: Option<WireRecordType>,
    pub title: String,
    pub amount: i64,
    pub description: String,
    pub date: String,
    pub owner_id: String,
}

/// Full record payload; `updatedAt` is accepted and ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateRecordRequest {
    pub id: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub record_type: Option<WireRecordType>,
    pub title: String,
    pub amount: i64,
    pub description: String,
    pub date: String,
    pub owner_id: String,
    #[serde(with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeleteRecordRequest {
    pub id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GetRecordsRequest {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub record_type: Option<WireRecordType>,
    pub page: i64,
    pub owner_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PingRequest {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMessage {
    pub id: String,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub title: String,
    pub amount: i64,
    pub description: String,
    pub date: String,
    pub owner_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Record> for RecordMessage {
    fn from(r: Record) -> Self {
        Self {
            id: r.id.into(),
            record_type: r.record_type,
            title: r.title,
            amount: r.amount,
            description: r.description,
            date: r.date,
            owner_id: r.owner_id.into(),
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Reply to Create and Update.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordResponse {
    pub success: bool,
    pub record: RecordMessage,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRecordResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetRecordsResponse {
    pub success: bool,
    pub records: Vec<RecordMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page: Option<u32>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingResponse {
    pub message: String,
    pub response: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn type_accepts_name_number_or_absence() {
        let req: GetRecordsRequest =
            serde_json::from_value(json!({"type": "INCOME", "ownerId": "x"})).unwrap();
        assert_eq!(
            WireRecordType::resolve(req.record_type.as_ref()),
            Ok(RecordType::Income)
        );

        let req: GetRecordsRequest = serde_json::from_value(json!({"type": 1})).unwrap();
        assert_eq!(
            WireRecordType::resolve(req.record_type.as_ref()),
            Ok(RecordType::Income)
        );

        let req: GetRecordsRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(req.page, 0);
        assert_eq!(
            WireRecordType::resolve(req.record_type.as_ref()),
            Ok(RecordType::Expense)
        );
    }

    #[test]
    fn unknown_type_is_not_coerced() {
        let req: CreateRecordRequest = serde_json::from_value(json!({"type": 5})).unwrap();
        assert!(WireRecordType::resolve(req.record_type.as_ref()).is_err());
        let req: CreateRecordRequest =
            serde_json::from_value(json!({"type": "SAVINGS"})).unwrap();
        assert!(WireRecordType::resolve(req.record_type.as_ref()).is_err());
    }

    #[test]
    fn update_request_parses_rfc3339_created_at() {
        let req: UpdateRecordRequest = serde_json::from_value(json!({
            "id": "507f1f77bcf86cd799439011",
            "createdAt": "2024-01-31T12:30:45.123Z",
            "updatedAt": "2024-02-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(req.created_at.unwrap().unix_timestamp(), 1_706_704_245);

        let missing: UpdateRecordRequest = serde_json::from_value(json!({})).unwrap();
        assert!(missing.created_at.is_none());
    }

    #[test]
    fn records_response_omits_absent_next_page() {
        let res = GetRecordsResponse {
            success: true,
            records: vec![],
            next_page: None,
            message: String::new(),
        };
        let v = serde_json::to_value(&res).unwrap();
        assert!(v.get("nextPage").is_none());
        assert_eq!(v["success"], json!(true));
    }
}

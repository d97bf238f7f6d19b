use std::fmt;

use lazy_static::lazy_static;
use rand::RngCore;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use time::{OffsetDateTime, UtcOffset};

lazy_static! {
    static ref HEX_ID_RE: Regex = Regex::new(r"^[0-9a-fA-F]{24}$").unwrap();
}

/// Identifier parsing failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed {kind} {value:?}: expected 24 hexadecimal characters")]
pub struct IdError {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! hex_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            pub fn parse(raw: &str) -> Result<Self, IdError> {
                if HEX_ID_RE.is_match(raw) {
                    Ok(Self(raw.to_ascii_lowercase()))
                } else {
                    Err(IdError {
                        kind: $kind,
                        value: raw.to_string(),
                    })
                }
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

hex_id!(
    /// Store-assigned record identifier (12 bytes, lowercase hex).
    RecordId,
    "record id"
);

hex_id!(
    /// Identifier of the user owning a record.
    OwnerId,
    "owner id"
);

impl RecordId {
    /// New identifier: 4-byte big-endian unix seconds followed by 8 random bytes.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 12];
        let secs = OffsetDateTime::now_utc().unix_timestamp() as u32;
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        rand::thread_rng().fill_bytes(&mut bytes[4..]);
        Self(hex::encode(bytes))
    }
}

/// Kind of a financial record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordType {
    #[default]
    Expense,
    Income,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordTypeError {
    #[error("unknown record type number {0}")]
    UnknownNumber(i64),
    #[error("unknown record type name {0:?}")]
    UnknownName(String),
}

impl RecordType {
    pub fn number(self) -> i16 {
        match self {
            RecordType::Expense => 0,
            RecordType::Income => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RecordType::Expense => "EXPENSE",
            RecordType::Income => "INCOME",
        }
    }

    pub fn from_number(n: i64) -> Result<Self, RecordTypeError> {
        match n {
            0 => Ok(RecordType::Expense),
            1 => Ok(RecordType::Income),
            other => Err(RecordTypeError::UnknownNumber(other)),
        }
    }

    pub fn from_name(name: &str) -> Result<Self, RecordTypeError> {
        match name {
            "EXPENSE" => Ok(RecordType::Expense),
            "INCOME" => Ok(RecordType::Income),
            other => Err(RecordTypeError::UnknownName(other.to_string())),
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Drops sub-second precision and normalizes to UTC.
pub fn truncate_to_seconds(ts: OffsetDateTime) -> OffsetDateTime {
    let utc = ts.to_offset(UtcOffset::UTC);
    utc.replace_nanosecond(0).unwrap_or(utc)
}

pub fn now_seconds() -> OffsetDateTime {
    truncate_to_seconds(OffsetDateTime::now_utc())
}

/// A persisted record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: RecordId,
    pub owner_id: OwnerId,
    pub record_type: RecordType,
    pub title: String,
    pub description: String,
    pub amount: i64,
    pub date: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Fields for a record that does not have an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub owner_id: OwnerId,
    pub record_type: RecordType,
    pub title: String,
    pub description: String,
    pub amount: i64,
    pub date: String,
    pub created_at: OffsetDateTime,
}

/// Replacement fields for an existing record. `owner_id` is checked against
/// the stored owner, never written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordUpdate {
    pub owner_id: OwnerId,
    pub record_type: RecordType,
    pub title: String,
    pub description: String,
    pub amount: i64,
    pub date: String,
    pub created_at: OffsetDateTime,
}

impl NewRecord {
    pub fn into_record(self, id: RecordId) -> Record {
        Record {
            id,
            owner_id: self.owner_id,
            record_type: self.record_type,
            title: self.title,
            description: self.description,
            amount: self.amount,
            date: self.date,
            updated_at: self.created_at,
            created_at: self.created_at,
        }
    }
}

impl Record {
    /// Applies an update in place, refreshing `updated_at`.
    pub fn apply(&mut self, update: RecordUpdate, now: OffsetDateTime) {
        self.record_type = update.record_type;
        self.title = update.title;
        self.description = update.description;
        self.amount = update.amount;
        self.date = update.date;
        self.created_at = update.created_at;
        self.updated_at = now;
    }
}

/// Raw `records` row as stored in Postgres.
#[derive(Debug, FromRow)]
pub struct RecordRow {
    pub id: String,
    pub owner_id: String,
    pub record_type: i16,
    pub title: String,
    pub description: String,
    pub amount: i64,
    pub date: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl TryFrom<RecordRow> for Record {
    type Error = anyhow::Error;

    fn try_from(r: RecordRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: RecordId::parse(&r.id)?,
            owner_id: OwnerId::parse(&r.owner_id)?,
            record_type: RecordType::from_number(i64::from(r.record_type))?,
            title: r.title,
            description: r.description,
            amount: r.amount,
            date: r.date,
            created_at: truncate_to_seconds(r.created_at),
            updated_at: truncate_to_seconds(r.updated_at),
        })
    }
}

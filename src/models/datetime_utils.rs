use chrono::{DateTime, TimeZone, Utc};
use mongodb::bson::{self, Bson};
use serde::{self, Deserialize, Deserializer, Serialize, Serializer};

pub fn to_bson_datetime(dt: &DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(dt.timestamp_millis())
}

pub fn from_bson_datetime(dt: bson::DateTime) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(dt.timestamp_millis()).single()
}

pub fn serialize_datetime<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    Bson::DateTime(to_bson_datetime(dt)).serialize(serializer)
}

pub fn deserialize_datetime<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    match Bson::deserialize(deserializer)? {
        Bson::DateTime(dt) => from_bson_datetime(dt)
            .ok_or_else(|| serde::de::Error::custom("datetime out of range")),
        other => Err(serde::de::Error::custom(format!(
            "expecting DateTime, found {:?}",
            other.element_type()
        ))),
    }
}

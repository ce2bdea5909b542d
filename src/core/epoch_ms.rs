//! Purpose: Serde codec for Databricks epoch-millisecond timestamps.
//! Exports: `serialize`, `deserialize` (for `#[serde(with = "...")]`), `from_millis`, `to_millis`.
//! Role: Map integer milliseconds since the Unix epoch to `time::OffsetDateTime` (UTC).
//! Invariants: Absent or `null` decodes to `None`, never to the epoch.
//! Invariants: Encoding floors to the millisecond; no timezone other than UTC is assumed.
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serializer};
use time::OffsetDateTime;

const NANOS_PER_MILLI: i128 = 1_000_000;

pub fn from_millis(millis: i64) -> Option<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * NANOS_PER_MILLI).ok()
}

pub fn to_millis(instant: OffsetDateTime) -> i64 {
    let millis = instant.unix_timestamp_nanos().div_euclid(NANOS_PER_MILLI);
    // Representable OffsetDateTime values stay far inside i64 milliseconds.
    millis as i64
}

pub fn serialize<S>(value: &Option<OffsetDateTime>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(instant) => serializer.serialize_i64(to_millis(*instant)),
        None => serializer.serialize_none(),
    }
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<i64>::deserialize(deserializer)? {
        Some(millis) => from_millis(millis)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("epoch milliseconds out of range: {millis}"))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use time::OffsetDateTime;
    use time::format_description::well_known::Rfc3339;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Stamped {
        #[serde(default, with = "super")]
        at: Option<OffsetDateTime>,
    }

    fn instant(text: &str) -> OffsetDateTime {
        OffsetDateTime::parse(text, &Rfc3339).expect("rfc3339")
    }

    #[test]
    fn decodes_millis_as_utc_instant() {
        let stamped: Stamped =
            serde_json::from_value(json!({"at": 1666369196203i64})).expect("decode");
        assert_eq!(stamped.at, Some(instant("2022-10-21T16:19:56.203Z")));
    }

    #[test]
    fn encodes_instant_as_millis() {
        let stamped = Stamped {
            at: Some(instant("2022-10-21T16:19:56.203Z")),
        };
        assert_eq!(
            serde_json::to_value(&stamped).expect("encode"),
            json!({"at": 1666369196203i64})
        );
    }

    #[test]
    fn null_and_absent_decode_to_none() {
        let null: Stamped = serde_json::from_value(json!({"at": null})).expect("decode");
        assert_eq!(null.at, None);
        let absent: Stamped = serde_json::from_value(json!({})).expect("decode");
        assert_eq!(absent.at, None);
    }

    #[test]
    fn none_encodes_as_null() {
        let stamped = Stamped { at: None };
        assert_eq!(
            serde_json::to_value(&stamped).expect("encode"),
            json!({"at": null})
        );
    }

    #[test]
    fn sub_millisecond_precision_is_floored() {
        let stamped = Stamped {
            at: Some(instant("2022-10-21T16:19:56.203999Z")),
        };
        assert_eq!(
            serde_json::to_value(&stamped).expect("encode"),
            json!({"at": 1666369196203i64})
        );
    }
}

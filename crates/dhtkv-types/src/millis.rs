//! Serde adapter that writes a [`Duration`] as whole milliseconds.
//!
//! Use with `#[serde(with = "dhtkv_types::millis")]` so configuration files
//! can say `fetch_timeout = 10000` instead of a `{ secs, nanos }` table.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
    serializer.serialize_u64(millis)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use std::time::Duration;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Wrapper {
        #[serde(with = "crate::millis")]
        timeout: Duration,
    }

    #[test]
    fn writes_whole_millis() {
        let json = serde_json::to_string(&Wrapper {
            timeout: Duration::from_secs(10),
        })
        .unwrap();
        assert_eq!(json, r#"{"timeout":10000}"#);
    }

    #[test]
    fn reads_whole_millis() {
        let w: Wrapper = serde_json::from_str(r#"{"timeout":250}"#).unwrap();
        assert_eq!(w.timeout, Duration::from_millis(250));
    }
}

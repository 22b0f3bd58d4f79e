use crate::error::DecodeError;

/// Codec for values exchanged with responders.
///
/// Values travel as bencode byte strings, `<len>:<bytes>`. Decoding goes
/// through `serde_bencode` and must consume the whole payload.
pub struct PayloadCodec;

impl PayloadCodec {
    /// Encode a string value for transmission.
    pub fn encode_str(s: &str) -> Vec<u8> {
        let mut buf = Vec::with_capacity(s.len() + 8);
        buf.extend_from_slice(s.len().to_string().as_bytes());
        buf.push(b':');
        buf.extend_from_slice(s.as_bytes());
        buf
    }

    /// Encode an integer as `i<n>e`.
    pub fn encode_int(n: i64) -> Vec<u8> {
        format!("i{n}e").into_bytes()
    }

    /// Decode a string value from a received payload.
    pub fn decode_str(data: &[u8]) -> Result<String, DecodeError> {
        let mut rest = data;
        let value: String =
            serde::Deserialize::deserialize(&mut serde_bencode::Deserializer::new(&mut rest))?;
        if !rest.is_empty() {
            return Err(DecodeError::TrailingBytes(rest.len()));
        }
        Ok(value)
    }
}

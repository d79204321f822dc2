//! The on-the-wire byte layout of a Record batch, independent of whatever
//! transport carries the bytes.
//!
//! Layout: an 8-byte little-endian element count, followed by `count`
//! records, each `8 + payload_len` bytes: the key as a little-endian
//! `u64`, then exactly `payload_len` payload bytes. The payload length
//! itself is not repeated per record or per message — every record in a
//! run shares one payload size, known out of band to both ends.

use crate::error::SortError;
use crate::record::Record;

const COUNT_HEADER_LEN: usize = 8;

/// Serializes `records` into a flat byte buffer per the layout above.
pub fn encode(records: &[Record]) -> Vec<u8> {
    let payload_len = records.first().map(|r| r.payload.len()).unwrap_or(0);
    let mut buf = Vec::with_capacity(COUNT_HEADER_LEN + records.len() * (8 + payload_len));
    buf.extend_from_slice(&(records.len() as u64).to_le_bytes());
    for record in records {
        buf.extend_from_slice(&record.key.to_le_bytes());
        buf.extend_from_slice(&record.payload);
    }
    buf
}

/// Deserializes a buffer produced by [`encode`], given the payload length
/// every record in it is known to carry. Returns `SortError::Messaging`
/// on a truncated or otherwise malformed buffer.
pub fn decode(bytes: &[u8], payload_len: usize) -> Result<Vec<Record>, SortError> {
    if bytes.len() < COUNT_HEADER_LEN {
        return Err(SortError::Messaging(
            "wire buffer shorter than the count header".to_string(),
        ));
    }
    let mut count_bytes = [0u8; 8];
    count_bytes.copy_from_slice(&bytes[..COUNT_HEADER_LEN]);
    let count = u64::from_le_bytes(count_bytes) as usize;

    let record_len = 8 + payload_len;
    let expected_len = COUNT_HEADER_LEN + count * record_len;
    if bytes.len() != expected_len {
        return Err(SortError::Messaging(format!(
            "wire buffer has {} bytes, expected {expected_len} for {count} records of {record_len} bytes each",
            bytes.len()
        )));
    }

    let mut records = Vec::with_capacity(count);
    let mut cursor = COUNT_HEADER_LEN;
    for _ in 0..count {
        let mut key_bytes = [0u8; 8];
        key_bytes.copy_from_slice(&bytes[cursor..cursor + 8]);
        let key = u64::from_le_bytes(key_bytes);
        let payload = bytes[cursor + 8..cursor + record_len].to_vec();
        records.push(Record::new(key, payload));
        cursor += record_len;
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recs(pairs: &[(u64, &[u8])]) -> Vec<Record> {
        pairs
            .iter()
            .map(|&(k, p)| Record::new(k, p.to_vec()))
            .collect()
    }

    #[test]
    fn round_trips_zero_length_payloads() {
        let records = recs(&[(1, &[]), (2, &[]), (3, &[])]);
        let bytes = encode(&records);
        let decoded = decode(&bytes, 0).unwrap();
        assert_eq!(decoded, records);
    }

    #[test]
    fn round_trips_single_byte_payloads() {
        let records = recs(&[(10, &[b'A']), (20, &[b'Z'])]);
        let bytes = encode(&records);
        let decoded = decode(&bytes, 1).unwrap();
        assert_eq!(decoded, records);
    }

    #[test]
    fn round_trips_multi_byte_payloads() {
        let records = recs(&[(1, b"hello"), (2, b"world"), (3, b"abcde")]);
        let bytes = encode(&records);
        let decoded = decode(&bytes, 5).unwrap();
        assert_eq!(decoded, records);
    }

    #[test]
    fn empty_batch_round_trips_to_an_empty_vec() {
        let bytes = encode(&[]);
        let decoded = decode(&bytes, 0).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn truncated_buffer_is_rejected() {
        let records = recs(&[(1, b"abcde"), (2, b"fghij")]);
        let mut bytes = encode(&records);
        bytes.truncate(bytes.len() - 1);
        let err = decode(&bytes, 5).unwrap_err();
        assert!(matches!(err, SortError::Messaging(_)));
    }

    #[test]
    fn buffer_shorter_than_the_header_is_rejected() {
        let err = decode(&[0, 1, 2], 4);
        assert!(err.is_err());
    }
}

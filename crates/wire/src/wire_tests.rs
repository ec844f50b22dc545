use super::*;

#[test]
fn encode_returns_json_without_length_prefix() {
    let response = crate::Response::Ok;
    let encoded = encode(&response).expect("encode failed");

    let json_str = std::str::from_utf8(&encoded).expect("should be valid UTF-8");
    assert!(json_str.starts_with('{'), "should be JSON object: {json_str}");
}

#[test]
fn decode_round_trips_through_encode() {
    let request = crate::Request::DeleteJob {
        id: "job-abc".to_string(),
    };
    let encoded = encode(&request).expect("encode failed");
    let decoded: crate::Request = decode(&encoded).expect("decode failed");
    assert_eq!(request, decoded);
}

#[tokio::test]
async fn read_write_message_roundtrip() {
    let original = b"hello world";

    let mut buffer = Vec::new();
    write_message(&mut buffer, original).await.expect("write failed");
    assert_eq!(buffer.len(), 4 + original.len());

    let mut cursor = std::io::Cursor::new(buffer);
    let read_back = read_message(&mut cursor).await.expect("read failed");

    assert_eq!(read_back, original);
}

#[tokio::test]
async fn write_message_adds_length_prefix() {
    let data = b"test data";

    let mut buffer = Vec::new();
    write_message(&mut buffer, data).await.expect("write failed");

    let len = u32::from_be_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]) as usize;
    assert_eq!(len, data.len());
    assert_eq!(&buffer[4..], data);
}

#[tokio::test]
async fn read_message_rejects_oversized_frame() {
    let mut buffer = Vec::new();
    buffer.extend_from_slice(&((MAX_FRAME_BYTES as u32) + 1).to_be_bytes());

    let mut cursor = std::io::Cursor::new(buffer);
    let result = read_message(&mut cursor).await;
    assert!(matches!(result, Err(ProtocolError::FrameTooLarge(_))));
}

#[tokio::test]
async fn two_messages_can_be_written_and_read_in_sequence() {
    let mut buffer = Vec::new();
    write_message(&mut buffer, b"first").await.expect("write failed");
    write_message(&mut buffer, b"second").await.expect("write failed");

    let mut cursor = std::io::Cursor::new(buffer);
    let first = read_message(&mut cursor).await.expect("read failed");
    let second = read_message(&mut cursor).await.expect("read failed");
    assert_eq!(first, b"first");
    assert_eq!(second, b"second");
}

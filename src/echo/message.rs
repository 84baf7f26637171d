//! Classification of incoming WebSocket messages.

use std::borrow::Cow;

use tokio_tungstenite::tungstenite::Message;

/// What the connection loop does with a received message.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Write the message back unchanged.
    Echo(Message),
    /// Peer started the closing handshake.
    Close,
    /// Control or raw frame; nothing to send.
    Ignore,
}

/// Decide how to handle a received message.
pub fn classify(msg: Message) -> Action {
    match msg {
        Message::Text(_) | Message::Binary(_) => Action::Echo(msg),
        Message::Close(_) => Action::Close,
        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => Action::Ignore,
    }
}

/// Frame type name used in log fields.
pub fn kind(msg: &Message) -> &'static str {
    match msg {
        Message::Text(_) => "text",
        Message::Binary(_) => "binary",
        Message::Ping(_) => "ping",
        Message::Pong(_) => "pong",
        Message::Close(_) => "close",
        Message::Frame(_) => "frame",
    }
}

/// Payload rendered for the `received:` log line.
///
/// Binary payloads are shown as lossy UTF-8.
pub fn payload_text(msg: &Message) -> Cow<'_, str> {
    match msg {
        Message::Text(text) => Cow::Borrowed(text.as_str()),
        Message::Binary(data) => String::from_utf8_lossy(data),
        _ => Cow::Borrowed(""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_data_frames_are_echoed() {
        let text = Message::text("hello");
        assert_eq!(classify(text.clone()), Action::Echo(text));

        let binary = Message::binary(Bytes::from_static(&[0, 1, 2, 255]));
        assert_eq!(classify(binary.clone()), Action::Echo(binary));
    }

    #[test]
    fn test_empty_payload_is_echoed() {
        let empty = Message::text("");
        assert_eq!(classify(empty.clone()), Action::Echo(empty));

        let empty = Message::binary(Bytes::new());
        assert_eq!(classify(empty.clone()), Action::Echo(empty));
    }

    #[test]
    fn test_control_frames_are_not_echoed() {
        assert_eq!(classify(Message::Ping(Bytes::from_static(b"p"))), Action::Ignore);
        assert_eq!(classify(Message::Pong(Bytes::new())), Action::Ignore);
        assert_eq!(classify(Message::Close(None)), Action::Close);
    }

    #[test]
    fn test_kind() {
        assert_eq!(kind(&Message::text("a")), "text");
        assert_eq!(kind(&Message::binary(vec![1u8])), "binary");
        assert_eq!(kind(&Message::Close(None)), "close");
    }

    #[test]
    fn test_payload_text() {
        assert_eq!(payload_text(&Message::text("hi there")), "hi there");
        assert_eq!(payload_text(&Message::binary(b"bytes".to_vec())), "bytes");
        assert_eq!(payload_text(&Message::binary(vec![0xff, b'a'])), "\u{fffd}a");
        assert_eq!(payload_text(&Message::Ping(Bytes::new())), "");
    }
}

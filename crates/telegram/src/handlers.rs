use teloxide::types::{MediaKind, Message, MessageKind};

use ragbridge_common::InboundMessage;

/// Extract the plain text of a message. Media captions are not queries.
pub(crate) fn extract_text(msg: &Message) -> Option<&str> {
    match &msg.kind {
        MessageKind::Common(common) => match &common.media_kind {
            MediaKind::Text(t) => Some(t.text.as_str()),
            _ => None,
        },
        _ => None,
    }
}

/// Map a Telegram message to an [`InboundMessage`], or `None` when it
/// carries no text worth answering.
pub fn inbound_from_message(msg: &Message) -> Option<InboundMessage> {
    let text = extract_text(msg)?;
    let inbound = InboundMessage::new(msg.chat.id.0, msg.from.as_ref().map(|u| u.id.0), text);
    inbound.has_query().then_some(inbound)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {rstest::rstest, serde_json::json};

    use super::*;

    fn message(extra: serde_json::Value) -> Message {
        let mut value = json!({
            "message_id": 1,
            "date": 1,
            "chat": { "id": 42, "type": "private", "first_name": "Alice" },
            "from": {
                "id": 1001,
                "is_bot": false,
                "first_name": "Alice",
                "username": "alice"
            }
        });
        for (k, v) in extra.as_object().expect("object").clone() {
            value[k] = v;
        }
        serde_json::from_value(value).expect("deserialize message")
    }

    #[test]
    fn text_message_becomes_inbound() {
        let msg = message(json!({ "text": "What does the manual say?" }));
        let inbound = inbound_from_message(&msg).expect("text message is a query");
        assert_eq!(inbound.chat_id, 42);
        assert_eq!(inbound.user_id, Some(1001));
        assert_eq!(inbound.text, "What does the manual say?");
    }

    #[rstest]
    #[case::blank(json!({ "text": "   " }))]
    #[case::location(json!({ "location": { "latitude": 48.8566, "longitude": 2.3522 } }))]
    #[case::photo_with_caption(json!({
        "photo": [{ "file_id": "p", "file_unique_id": "pu", "width": 1, "height": 1 }],
        "caption": "look at this"
    }))]
    fn non_text_messages_are_ignored(#[case] extra: serde_json::Value) {
        assert!(inbound_from_message(&message(extra)).is_none());
    }

    #[test]
    fn group_chat_keeps_chat_id() {
        let msg: Message = serde_json::from_value(json!({
            "message_id": 7,
            "date": 1,
            "chat": { "id": -100_123, "type": "supergroup", "title": "Docs" },
            "from": { "id": 5, "is_bot": false, "first_name": "Bob" },
            "text": "hi"
        }))
        .expect("deserialize group message");
        let inbound = inbound_from_message(&msg).unwrap();
        assert_eq!(inbound.chat_id, -100_123);
        assert_eq!(inbound.user_id, Some(5));
    }
}

//! Wire types for the subset of the Telegram Bot API the bot uses.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ChatHandle, Username};
use crate::ports::{ChatUser, InboundEvent};

/// Envelope around every Bot API response.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub error_code: Option<u16>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

impl Update {
    /// Converts a text message into an inbound event.
    ///
    /// Updates without a text message (edits, stickers, joins) or without a
    /// sender (channel posts) yield `None`.
    ///
    /// The handle is the sender's user id, which is also their private chat
    /// with the bot. A command sent in a group therefore registers, opens
    /// dialogs and gets answered per person, never per group.
    pub fn into_event(self) -> Option<InboundEvent> {
        let message = self.message?;
        let text = message.text?;
        let sender = message.from?;
        let username = sender.username.and_then(|name| Username::new(name).ok());
        let user = ChatUser::new(ChatHandle::new(sender.id), username);
        Some(InboundEvent::from_text(user, &text))
    }
}

#[derive(Debug, Serialize)]
pub struct GetUpdatesRequest {
    pub offset: i64,
    pub timeout: u64,
    pub allowed_updates: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct SendMessageRequest<'a> {
    pub chat_id: i64,
    pub text: &'a str,
    pub reply_markup: ReplyMarkup,
}

#[derive(Debug, Serialize)]
pub struct EditMessageTextRequest<'a> {
    pub chat_id: i64,
    pub message_id: i64,
    pub text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ReplyMarkup {
    Keyboard(ReplyKeyboardMarkup),
    Remove(ReplyKeyboardRemove),
}

impl ReplyMarkup {
    /// One button per row, hidden after the first tap.
    pub fn choices(choices: &[String]) -> Self {
        ReplyMarkup::Keyboard(ReplyKeyboardMarkup {
            keyboard: choices
                .iter()
                .map(|choice| vec![KeyboardButton { text: choice.clone() }])
                .collect(),
            one_time_keyboard: true,
            resize_keyboard: true,
        })
    }

    pub fn remove() -> Self {
        ReplyMarkup::Remove(ReplyKeyboardRemove {
            remove_keyboard: true,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ReplyKeyboardMarkup {
    pub keyboard: Vec<Vec<KeyboardButton>>,
    pub one_time_keyboard: bool,
    pub resize_keyboard: bool,
}

#[derive(Debug, Serialize)]
pub struct KeyboardButton {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ReplyKeyboardRemove {
    pub remove_keyboard: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn update(value: serde_json::Value) -> Update {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn text_message_becomes_event_with_username() {
        let event = update(json!({
            "update_id": 10,
            "message": {
                "message_id": 3,
                "from": { "id": 777, "is_bot": false, "first_name": "Alice", "username": "alice_u" },
                "chat": { "id": 777, "type": "private" },
                "date": 1700000000,
                "text": "/mark_attendance"
            }
        }))
        .into_event();

        assert_eq!(
            event,
            Some(InboundEvent::MarkAttendance(ChatUser::new(
                ChatHandle::new(777),
                Some(Username::new("alice_u").unwrap())
            )))
        );
    }

    #[test]
    fn sender_without_username_is_kept() {
        let event = update(json!({
            "update_id": 11,
            "message": {
                "message_id": 4,
                "from": { "id": 5, "first_name": "Anon" },
                "chat": { "id": 5 },
                "text": "/start"
            }
        }))
        .into_event()
        .unwrap();

        assert_eq!(event.user().username, None);
    }

    #[test]
    fn group_messages_are_keyed_by_sender() {
        let group_update = |sender: i64, username: &str, text: &str| {
            update(json!({
                "update_id": 20,
                "message": {
                    "message_id": 9,
                    "from": { "id": sender, "is_bot": false, "first_name": "X", "username": username },
                    "chat": { "id": -1001234, "type": "group", "title": "10A parents" },
                    "text": text
                }
            }))
            .into_event()
            .unwrap()
        };

        let teacher = group_update(2001, "t1", "/start_attendance");
        let bystander = group_update(3003, "someone", "10A");

        assert_eq!(teacher.user().handle, ChatHandle::new(2001));
        assert_eq!(bystander.user().handle, ChatHandle::new(3003));
        assert_ne!(teacher.user().handle, bystander.user().handle);
    }

    #[test]
    fn messages_without_sender_are_skipped() {
        let channel_post = update(json!({
            "update_id": 21,
            "message": {
                "message_id": 10,
                "chat": { "id": -100777, "type": "channel" },
                "text": "/start"
            }
        }));

        assert!(channel_post.into_event().is_none());
    }

    #[test]
    fn non_text_updates_are_skipped() {
        let sticker = update(json!({
            "update_id": 12,
            "message": { "message_id": 5, "chat": { "id": 5 }, "sticker": {} }
        }));
        let edited = update(json!({ "update_id": 13, "edited_message": {} }));

        assert!(sticker.into_event().is_none());
        assert!(edited.into_event().is_none());
    }

    #[test]
    fn choices_render_as_one_time_keyboard() {
        let markup = ReplyMarkup::choices(&["10A".to_string(), "11B".to_string()]);
        assert_eq!(
            serde_json::to_value(markup).unwrap(),
            json!({
                "keyboard": [[{ "text": "10A" }], [{ "text": "11B" }]],
                "one_time_keyboard": true,
                "resize_keyboard": true
            })
        );
        assert_eq!(
            serde_json::to_value(ReplyMarkup::remove()).unwrap(),
            json!({ "remove_keyboard": true })
        );
    }

    #[test]
    fn error_envelope_parses() {
        let response: ApiResponse<Message> = serde_json::from_value(json!({
            "ok": false,
            "error_code": 403,
            "description": "Forbidden: bot was blocked by the user"
        }))
        .unwrap();

        assert!(!response.ok);
        assert!(response.result.is_none());
        assert_eq!(response.error_code, Some(403));
    }
}

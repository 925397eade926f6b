//! Validation messages and the ordered group a run produces.

use std::fmt;
use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::error::{ValidationFailure, ValidationResult};
use crate::models::field::Field;

/// One validation failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<Field>,
    /// Validator kind that produced the message, e.g. `"Between"`.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<i64>,
}

impl Message {
    /// Creates a message with no field, kind or code.
    ///
    /// # Examples
    ///
    /// ```
    /// use fieldcheck::Message;
    ///
    /// let message = Message::new("Field age is required")
    ///     .with_field("age")
    ///     .with_kind("PresenceOf")
    ///     .with_code(Some(10));
    /// assert_eq!(message.kind(), Some("PresenceOf"));
    /// assert_eq!(message.to_string(), "Field age is required");
    /// ```
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field: None,
            kind: None,
            code: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<Field>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Sets the numeric code; `None` clears it.
    pub fn with_code(mut self, code: Option<i64>) -> Self {
        self.code = code;
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn field(&self) -> Option<&Field> {
        self.field.as_ref()
    }

    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    pub fn code(&self) -> Option<i64> {
        self.code
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Ordered, index-addressable collection of messages.
///
/// Removal is a splice: later messages shift down one position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageGroup {
    messages: Vec<Message>,
}

impl MessageGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Message at `index`, `None` past the end.
    pub fn get(&self, index: usize) -> Option<&Message> {
        self.messages.get(index)
    }

    pub fn contains_index(&self, index: usize) -> bool {
        index < self.messages.len()
    }

    /// Replaces the message at `index`, or appends when `index == len()`.
    pub fn set(&mut self, index: usize, message: Message) -> ValidationResult<()> {
        match index.cmp(&self.messages.len()) {
            std::cmp::Ordering::Less => {
                self.messages[index] = message;
                Ok(())
            }
            std::cmp::Ordering::Equal => {
                self.messages.push(message);
                Ok(())
            }
            std::cmp::Ordering::Greater => Err(ValidationFailure::InvalidArgument(format!(
                "message index {} is out of range for a group of {}",
                index,
                self.messages.len()
            ))),
        }
    }

    /// Removes and returns the message at `index`; out-of-range is a no-op.
    pub fn remove(&mut self, index: usize) -> Option<Message> {
        if index < self.messages.len() {
            Some(self.messages.remove(index))
        } else {
            None
        }
    }

    /// Appends one message at the end.
    pub fn append_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Appends every message of a list or of another group, in order.
    pub fn append_messages<I>(&mut self, messages: I)
    where
        I: IntoIterator<Item = Message>,
    {
        self.messages.extend(messages);
    }

    /// Messages recorded against exactly `field`, in their original order.
    pub fn filter(&self, field: &str) -> Vec<Message> {
        self.messages
            .iter()
            .filter(|message| message.field().is_some_and(|f| f.matches(field)))
            .cloned()
            .collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }
}

impl Index<usize> for MessageGroup {
    type Output = Message;

    fn index(&self, index: usize) -> &Self::Output {
        &self.messages[index]
    }
}

impl From<Vec<Message>> for MessageGroup {
    fn from(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}

impl FromIterator<Message> for MessageGroup {
    fn from_iter<I: IntoIterator<Item = Message>>(iter: I) -> Self {
        Self {
            messages: iter.into_iter().collect(),
        }
    }
}

impl Extend<Message> for MessageGroup {
    fn extend<I: IntoIterator<Item = Message>>(&mut self, iter: I) {
        self.messages.extend(iter);
    }
}

impl IntoIterator for MessageGroup {
    type Item = Message;
    type IntoIter = std::vec::IntoIter<Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.into_iter()
    }
}

impl<'a> IntoIterator for &'a MessageGroup {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MessageGroup {
        MessageGroup::from(vec![
            Message::new("first").with_field("a"),
            Message::new("second").with_field("b"),
            Message::new("third").with_field("a"),
        ])
    }

    #[test]
    fn test_remove_is_a_splice() {
        let mut group = sample();
        let removed = group.remove(1).unwrap();
        assert_eq!(removed.message(), "second");
        let texts: Vec<_> = group.iter().map(Message::message).collect();
        assert_eq!(texts, vec!["first", "third"]);
        assert_eq!(group[1].message(), "third");
        assert!(group.remove(5).is_none());
    }

    #[test]
    fn test_filter_preserves_order() {
        let group = sample();
        let texts: Vec<_> = group.filter("a").into_iter().map(|m| m.to_string()).collect();
        assert_eq!(texts, vec!["first", "third"]);
        assert!(group.filter("z").is_empty());
    }

    #[test]
    fn test_filter_ignores_list_fields() {
        let group = MessageGroup::from(vec![Message::new("pair").with_field(["a", "b"])]);
        assert!(group.filter("a").is_empty());
    }

    #[test]
    fn test_set() {
        let mut group = sample();
        group.set(0, Message::new("replaced")).unwrap();
        group.set(3, Message::new("pushed")).unwrap();
        assert_eq!(group[0].message(), "replaced");
        assert_eq!(group.len(), 4);
        assert!(group.set(9, Message::new("nope")).is_err());
    }

    #[test]
    fn test_append_messages_from_group_and_vec() {
        let mut group = MessageGroup::new();
        group.append_messages(sample());
        group.append_messages(vec![Message::new("extra")]);
        assert_eq!(group.len(), 4);
        assert_eq!(group[3].message(), "extra");
    }

    #[test]
    fn test_serializes_with_type_key() {
        let message = Message::new("Field age must be within the range of 18 to 65")
            .with_field("age")
            .with_kind("Between")
            .with_code(Some(7));
        let json = serde_json::to_value(MessageGroup::from(vec![message])).unwrap();
        assert_eq!(json[0]["type"], "Between");
        assert_eq!(json[0]["field"], "age");
        assert_eq!(json[0]["code"], 7);
    }
}

/// Message collection behaviour as seen by callers of the validation engine.

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use fieldcheck::{Field, Message, MessageGroup, PresenceOf, Validation};
    use serde_json::json;

    fn group() -> MessageGroup {
        vec![
            Message::new("first").with_field("a"),
            Message::new("second").with_field("b"),
            Message::new("third").with_field("a"),
        ]
        .into()
    }

    #[test]
    fn test_remove_splices() {
        let mut messages = group();
        let removed = messages.remove(1).unwrap();
        assert_eq!(removed.message(), "second");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].message(), "third");
        assert!(messages.remove(5).is_none());
    }

    #[test]
    fn test_filter_by_field() {
        let texts: Vec<_> = group().filter("a").iter().map(|m| m.message().to_string()).collect();
        assert_eq!(texts, vec!["first", "third"]);
        assert!(group().filter("zzz").is_empty());
    }

    #[test]
    fn test_set_within_and_past_end() {
        let mut messages = group();
        messages.set(0, Message::new("replaced")).unwrap();
        messages.set(3, Message::new("pushed")).unwrap();
        assert_eq!(messages[0].message(), "replaced");
        assert_eq!(messages.len(), 4);
        assert!(messages.set(9, Message::new("gap")).is_err());
    }

    #[test]
    fn test_filter_ignores_combined_field_lists() {
        let mut validation = Validation::new();
        validation.add(["a", "b"], Rc::new(PresenceOf::default())).unwrap();
        let messages = validation.validate(Some(json!({})), None).unwrap().into_messages();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages.filter("b").len(), 1);

        let pair = Message::new("x").with_field(Field::from(["a", "b"]));
        let combined = MessageGroup::from(vec![pair]);
        assert!(combined.filter("a").is_empty());
    }

    #[test]
    fn test_serializes_as_list() {
        let messages = MessageGroup::from(vec![Message::new("required")
            .with_field("name")
            .with_kind("PresenceOf")
            .with_code(Some(7))]);
        let json = serde_json::to_value(&messages).unwrap();
        assert_eq!(json[0]["type"], json!("PresenceOf"));
        assert_eq!(json[0]["field"], json!("name"));
        assert_eq!(json[0]["code"], json!(7));
    }
}

//! Reply content seam.
//!
//! What gets posted in a reply is pluggable; the engine only needs
//! *some* text for each mention.

use mentionloop_core::Mention;

pub trait ReplyComposer: Send + Sync {
    fn compose(&self, mention: &Mention) -> String;
}

/// Posts the same configured text for every mention.
pub struct StaticComposer {
    text: String,
}

impl StaticComposer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl ReplyComposer for StaticComposer {
    fn compose(&self, _mention: &Mention) -> String {
        self.text.clone()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn test_static_composer_ignores_mention() {
        let composer = StaticComposer::new("hello");
        let mention = Mention {
            tweet_id: "1".to_string(),
            author_id: "a".to_string(),
            created_at: Utc::now(),
            text: "@bot anything".to_string(),
            handled: false,
            handled_at: None,
        };
        assert_eq!(composer.compose(&mention), "hello");
    }
}

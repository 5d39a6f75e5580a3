use chrono::NaiveDateTime;
use rumqttc::Publish;
use std::fmt;

/// Length of the payload preview shown by `Display`.
const PREVIEW_CHARS: usize = 24;

/// A message received from the broker.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MQTTMessage {
    pub topic: String,
    pub content: String,
    pub timestamp: NaiveDateTime,
}

impl fmt::Display for MQTTMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let preview: String = self.content.chars().take(PREVIEW_CHARS).collect();
        write!(f, "{} - {}: {}", self.timestamp, self.topic, preview)
    }
}

impl MQTTMessage {
    pub fn from_topic(topic: String, content: String) -> Self {
        MQTTMessage {
            topic,
            content,
            timestamp: chrono::Local::now().naive_local(),
        }
    }

    /// Payloads are decoded lossily, invalid UTF-8 becomes U+FFFD.
    pub fn from_publish(publish: &Publish) -> Self {
        Self::from_topic(
            publish.topic.clone(),
            String::from_utf8_lossy(&publish.payload).into_owned(),
        )
    }

    pub fn render(&self) -> String {
        format!("{} = {}", self.topic, self.content)
    }
}

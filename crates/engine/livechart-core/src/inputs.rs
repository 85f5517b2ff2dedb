//! Discrete inputs dispatched into the frame loop and the commands they produce.

use serde::{Deserialize, Serialize};

use crate::ids::{Key, MarkKey};

/// Interaction or control message for a chart.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    PointerEnter { key: MarkKey },
    PointerLeave { key: MarkKey },
    Click { key: MarkKey },
    /// Restrict the chart to records matching `filter` (None clears it).
    SetFilter { filter: Option<String> },
}

/// Upstream write requested by an interaction. The host forwards it to the data source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "key", rename_all = "snake_case")]
pub enum Command {
    Remove(Key),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_wire_format() {
        let m: Message =
            serde_json::from_str(r#"{ "type": "click", "key": { "type": "record", "id": "7" } }"#)
                .unwrap();
        assert_eq!(
            m,
            Message::Click {
                key: MarkKey::Record(Key::from("7"))
            }
        );
        let cmd = serde_json::to_value(Command::Remove(Key::from("7"))).unwrap();
        assert_eq!(cmd["type"], "remove");
        assert_eq!(cmd["key"], "7");
    }
}

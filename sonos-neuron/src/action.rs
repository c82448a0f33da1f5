//! The actions a host can invoke and the parameters that come with them.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;

use crate::error::NeuronError;

/// Every action the neuron understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Init,
    Play,
    /// Also invoked as `stop`
    Pause,
    Next,
    Previous,
    Mute,
    Unmute,
    Sync,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Init => "init",
            Action::Play => "play",
            Action::Pause => "pause",
            Action::Next => "next",
            Action::Previous => "previous",
            Action::Mute => "mute",
            Action::Unmute => "unmute",
            Action::Sync => "sync",
        }
    }
}

impl FromStr for Action {
    type Err = NeuronError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "init" => Ok(Action::Init),
            "play" => Ok(Action::Play),
            "pause" | "stop" => Ok(Action::Pause),
            "next" => Ok(Action::Next),
            "previous" => Ok(Action::Previous),
            "mute" => Ok(Action::Mute),
            "unmute" => Ok(Action::Unmute),
            "sync" => Ok(Action::Sync),
            other => Err(NeuronError::InvalidParameter(format!(
                "The configured value for 'action'(='{}') is not a valid action",
                other
            ))),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One call from the host: an action name plus its keyword parameters
///
/// Deserializes from the host's keyword map, e.g.
/// `{"action": "play", "room": "Kitchen", "item": "jazz radio"}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Invocation {
    pub action: Option<String>,
    pub room: Option<String>,
    pub ipv4: Option<String>,
    pub item: Option<String>,
    /// Room aliases in any shape accepted by [`crate::config::RoomConfig`]
    pub rooms: Option<Value>,
}

impl Invocation {
    pub fn new(action: &str) -> Self {
        Self {
            action: Some(action.to_string()),
            ..Default::default()
        }
    }

    pub fn room(mut self, room: &str) -> Self {
        self.room = Some(room.to_string());
        self
    }

    pub fn ipv4(mut self, ipv4: &str) -> Self {
        self.ipv4 = Some(ipv4.to_string());
        self
    }

    pub fn item(mut self, item: &str) -> Self {
        self.item = Some(item.to_string());
        self
    }

    pub fn rooms(mut self, rooms: Value) -> Self {
        self.rooms = Some(rooms);
        self
    }

    /// The requested action; absence is a `MissingParameter` error
    pub fn parse_action(&self) -> Result<Action, NeuronError> {
        self.action
            .as_deref()
            .ok_or_else(|| NeuronError::MissingParameter("You must specify a value for 'action'".to_string()))?
            .parse()
    }

    /// The `room` parameter, with an empty string treated as absent
    pub fn room_name(&self) -> Option<&str> {
        self.room.as_deref().filter(|room| !room.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("init", Action::Init)]
    #[case("play", Action::Play)]
    #[case("pause", Action::Pause)]
    #[case("stop", Action::Pause)]
    #[case("next", Action::Next)]
    #[case("previous", Action::Previous)]
    #[case("mute", Action::Mute)]
    #[case("unmute", Action::Unmute)]
    #[case("sync", Action::Sync)]
    fn test_parse_action(#[case] name: &str, #[case] expected: Action) {
        assert_eq!(name.parse::<Action>().unwrap(), expected);
    }

    #[rstest]
    #[case("Play")]
    #[case("shuffle")]
    #[case("")]
    fn test_unknown_action_is_invalid(#[case] name: &str) {
        assert!(matches!(name.parse::<Action>(), Err(NeuronError::InvalidParameter(_))));
    }

    #[test]
    fn test_missing_action() {
        let invocation = Invocation::default();
        assert!(matches!(invocation.parse_action(), Err(NeuronError::MissingParameter(_))));
    }

    #[test]
    fn test_empty_room_is_absent() {
        assert_eq!(Invocation::new("play").room("").room_name(), None);
        assert_eq!(Invocation::new("play").room("Kitchen").room_name(), Some("Kitchen"));
    }

    #[test]
    fn test_deserialize_from_host_keywords() {
        let invocation: Invocation = serde_json::from_str(
            r#"{"action": "init", "room": "Living", "rooms": {"Downstairs": ["Living", "Kitchen"]}}"#,
        )
        .unwrap();
        assert_eq!(invocation.parse_action().unwrap(), Action::Init);
        assert_eq!(invocation.room_name(), Some("Living"));
        assert!(invocation.rooms.is_some());
        assert!(invocation.ipv4.is_none());
    }
}

use std::collections::BTreeMap;

use serde::Serialize;

/// Case-insensitive lookup table: lowercased key to canonical-case name
pub type Lookup = BTreeMap<String, String>;

/// Name under which the room table is published
pub const ROOMS_VARIABLE: &str = "sonos_rooms";
/// Name under which the favorites table is published
pub const FAVORITES_VARIABLE: &str = "sonos_favorites";

/// The host's shared variable store
pub trait VariableStore {
    /// Replace the variable `name` with `value`
    fn set_variable(&mut self, name: &str, value: Lookup);
}

/// Build a lookup from canonical names
pub fn lookup<'a>(names: impl IntoIterator<Item = &'a str>) -> Lookup {
    names
        .into_iter()
        .map(|name| (name.to_lowercase(), name.to_string()))
        .collect()
}

/// Variable store kept in memory, for hosts without their own and for tests
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct InMemoryVariables {
    variables: BTreeMap<String, Lookup>,
}

impl InMemoryVariables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Lookup> {
        self.variables.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

impl VariableStore for InMemoryVariables {
    fn set_variable(&mut self, name: &str, value: Lookup) {
        self.variables.insert(name.to_string(), value);
    }
}

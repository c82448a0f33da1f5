//! Session state: zones, rooms and favorites of the household.
//!
//! A [`Session`] is created by a successful `init` and rebuilt in place by
//! every sync. Both tables are replaced as a whole and republished to the
//! host's variable store, even when parts of the sync failed.

use std::collections::BTreeMap;

use sonos_api::Favorite;
use tracing::{debug, info, warn};

use crate::config::RoomConfig;
use crate::controller::{Controller, Device, Group};
use crate::variables::{lookup, VariableStore, FAVORITES_VARIABLE, ROOMS_VARIABLE};

/// Zone name to device, visible devices only
pub type ZoneTable = BTreeMap<String, Device>;

/// Room name to members; the first member coordinates playback
pub type RoomTable = BTreeMap<String, Vec<Device>>;

/// What a sync found, and everything that went wrong along the way
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub zones: usize,
    pub rooms: usize,
    pub favorites: usize,
    pub warnings: Vec<String>,
}

impl SyncReport {
    fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message);
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    target: Device,
    default_room: String,
    configured_rooms: RoomConfig,
    zones: ZoneTable,
    rooms: RoomTable,
    favorites: Vec<Favorite>,
}

impl Session {
    /// An empty session talking to `target`; call [`Session::sync`] to fill it
    pub fn new(target: Device, default_room: &str, configured_rooms: RoomConfig) -> Self {
        Self {
            target,
            default_room: default_room.to_string(),
            configured_rooms,
            zones: ZoneTable::new(),
            rooms: RoomTable::new(),
            favorites: Vec::new(),
        }
    }

    /// The speaker used for topology and favorites queries
    pub fn target(&self) -> &Device {
        &self.target
    }

    pub fn default_room(&self) -> &str {
        &self.default_room
    }

    pub fn zones(&self) -> &ZoneTable {
        &self.zones
    }

    pub fn rooms(&self) -> &RoomTable {
        &self.rooms
    }

    pub fn room(&self, name: &str) -> Option<&[Device]> {
        self.rooms.get(name).map(Vec::as_slice)
    }

    /// Favorites in catalog order
    pub fn favorites(&self) -> &[Favorite] {
        &self.favorites
    }

    /// Rebuild zones, rooms and favorites, then publish rooms and favorites
    ///
    /// Never fails: unreachable speakers and unresolvable rooms become
    /// warnings in the returned report and leave the tables partial or
    /// empty.
    pub fn sync<C, V>(&mut self, controller: &C, variables: &mut V) -> SyncReport
    where
        C: Controller + ?Sized,
        V: VariableStore + ?Sized,
    {
        let report = self.refresh(controller);
        self.publish(variables);
        report
    }

    /// Rebuild zones, rooms and favorites without publishing anything
    pub fn refresh<C>(&mut self, controller: &C) -> SyncReport
    where
        C: Controller + ?Sized,
    {
        let mut report = SyncReport::default();

        self.zones = match controller.zone_groups(&self.target) {
            Ok(groups) => zone_table(&groups),
            Err(e) => {
                report.warn(format!("error communicating with SONOS (offline?): {}", e));
                ZoneTable::new()
            }
        };
        self.rooms = room_table(&self.zones, &self.configured_rooms, &mut report);

        self.favorites = controller.favorites(&self.target).unwrap_or_else(|e| {
            report.warn(format!("error while retrieving favorites from sonos: {}", e));
            Vec::new()
        });

        report.zones = self.zones.len();
        report.rooms = self.rooms.len();
        report.favorites = self.favorites.len();
        info!(
            rooms = report.rooms,
            favorites = report.favorites,
            warnings = report.warnings.len(),
            "syncing with SONOS successful"
        );
        report
    }

    /// Publish the current room and favorite names
    pub fn publish<V>(&self, variables: &mut V)
    where
        V: VariableStore + ?Sized,
    {
        variables.set_variable(ROOMS_VARIABLE, lookup(self.rooms.keys().map(String::as_str)));
        debug!("publishing favorites by title as {}", FAVORITES_VARIABLE);
        variables.set_variable(
            FAVORITES_VARIABLE,
            lookup(self.favorites.iter().map(|favorite| favorite.title.as_str())),
        );
    }
}

/// Every visible member of every group, keyed by zone name
pub fn zone_table(groups: &[Group]) -> ZoneTable {
    let mut zones = ZoneTable::new();
    for member in groups.iter().flat_map(|group| &group.members) {
        if member.visible {
            debug!("assigning {} to room '{}'", member.host(), member.name);
            zones.insert(member.name.clone(), member.clone());
        }
    }
    zones
}

/// One room per zone, plus the configured rooms that do not collide
///
/// Configured members are resolved against `zones`; unknown members are
/// skipped, so a configured room may end up empty.
pub fn room_table(zones: &ZoneTable, configured: &RoomConfig, report: &mut SyncReport) -> RoomTable {
    let mut rooms: RoomTable = zones
        .iter()
        .map(|(name, device)| (name.clone(), vec![device.clone()]))
        .collect();

    for room in configured.iter() {
        if rooms.contains_key(&room.name) {
            report.warn(format!(
                "room '{}' (from rooms settings) already defined in SONOS, ignoring",
                room.name
            ));
            continue;
        }

        debug!("merging pre-configured room '{}'", room.name);
        let mut members = Vec::with_capacity(room.members.len());
        for name in &room.members {
            match zones.get(name) {
                Some(device) => {
                    debug!("assigning {} to room '{}'", device.host(), room.name);
                    members.push(device.clone());
                }
                None => report.warn(format!(
                    "non-existing zone '{}' in rooms settings for room '{}'",
                    name, room.name
                )),
            }
        }
        rooms.insert(room.name.clone(), members);
    }
    rooms
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn device(uid: &str, name: &str, visible: bool, coordinator_uid: &str) -> Device {
        Device {
            uid: uid.to_string(),
            name: name.to_string(),
            ip: format!("192.168.1.{}", uid.len()),
            port: 1400,
            visible,
            coordinator_uid: coordinator_uid.to_string(),
        }
    }

    fn zones(names: &[&str]) -> ZoneTable {
        names
            .iter()
            .map(|name| (name.to_string(), device(name, name, true, name)))
            .collect()
    }

    #[test]
    fn test_zone_table_skips_invisible_members() {
        let groups = vec![
            Group {
                coordinator_uid: "A".to_string(),
                members: vec![
                    device("A", "Living", true, "A"),
                    device("SUB", "Living", false, "A"),
                    device("B", "Kitchen", true, "A"),
                ],
            },
            Group {
                coordinator_uid: "C".to_string(),
                members: vec![device("C", "Office", true, "C")],
            },
        ];

        let zones = zone_table(&groups);
        assert_eq!(zones.keys().collect::<Vec<_>>(), vec!["Kitchen", "Living", "Office"]);
        assert_eq!(zones["Living"].uid, "A");
    }

    #[test]
    fn test_configured_room_resolves_members_in_order() {
        let configured = RoomConfig::new().with_room("Downstairs", ["Living", "Kitchen"]);
        let mut report = SyncReport::default();

        let rooms = room_table(&zones(&["Kitchen", "Living"]), &configured, &mut report);
        let members: Vec<_> = rooms["Downstairs"].iter().map(|d| d.name.as_str()).collect();
        assert_eq!(members, vec!["Living", "Kitchen"]);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_colliding_configured_room_is_dropped() {
        let configured = RoomConfig::new().with_room("Kitchen", ["Living", "Kitchen"]);
        let mut report = SyncReport::default();

        let rooms = room_table(&zones(&["Kitchen", "Living"]), &configured, &mut report);
        assert_eq!(rooms["Kitchen"].len(), 1);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_collision_is_case_sensitive() {
        let configured = RoomConfig::new().with_room("kitchen", ["Kitchen"]);
        let mut report = SyncReport::default();

        let rooms = room_table(&zones(&["Kitchen"]), &configured, &mut report);
        assert_eq!(rooms.len(), 2);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_unknown_members_leave_room_empty() {
        let configured = RoomConfig::new().with_room("Garden", ["Patio"]);
        let mut report = SyncReport::default();

        let rooms = room_table(&zones(&["Kitchen"]), &configured, &mut report);
        assert!(rooms["Garden"].is_empty());
        assert_eq!(report.warnings.len(), 1);
    }

    proptest! {
        #[test]
        fn prop_rooms_are_zones_plus_non_colliding_config(
            zone_names in prop::collection::btree_set("[A-D][a-c]{0,2}", 0..6),
            configured_names in prop::collection::btree_set("[A-D][a-c]{0,2}", 0..6),
        ) {
            let names: Vec<&str> = zone_names.iter().map(String::as_str).collect();
            let zones = zones(&names);
            let configured = configured_names
                .iter()
                .fold(RoomConfig::new(), |config, name| config.with_room(name, names.iter().copied()));
            let mut report = SyncReport::default();

            let rooms = room_table(&zones, &configured, &mut report);

            let expected: BTreeSet<&String> = zone_names.union(&configured_names).collect();
            prop_assert_eq!(rooms.keys().collect::<BTreeSet<_>>(), expected);
            for name in &zone_names {
                prop_assert_eq!(rooms[name].len(), 1);
                prop_assert_eq!(&rooms[name][0].name, name);
            }
            for name in configured_names.difference(&zone_names) {
                prop_assert_eq!(rooms[name].len(), zone_names.len());
            }
            prop_assert_eq!(
                report.warnings.len(),
                configured_names.intersection(&zone_names).count()
            );
        }
    }
}

//! Action dispatch.
//!
//! [`Neuron::run`] is the single entry point a host calls. `init` builds the
//! [`Session`]; every other action borrows it.

use sonos_api::Favorite;
use tracing::{debug, warn};

use crate::action::{Action, Invocation};
use crate::config::{CoordinatorPolicy, NeuronConfig};
use crate::controller::{ControlError, Controller, Device};
use crate::error::{NeuronError, Result};
use crate::session::{Session, SyncReport};
use crate::similarity;
use crate::variables::VariableStore;

/// Result of a successful action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// `init` or `sync` ran
    Synced(SyncReport),
    /// A transport action was carried out
    Done,
}

pub struct Neuron<C, V> {
    controller: C,
    variables: V,
    coordinator_policy: CoordinatorPolicy,
    session: Option<Session>,
}

fn communication_failure(error: &ControlError) -> NeuronError {
    NeuronError::SonosFailure(format!(
        "Failure while trying to communicate with SONOS ({}): {}",
        error.kind(),
        error
    ))
}

impl<C: Controller, V: VariableStore> Neuron<C, V> {
    pub fn new(controller: C, variables: V) -> Self {
        Self {
            controller,
            variables,
            coordinator_policy: CoordinatorPolicy::default(),
            session: None,
        }
    }

    /// Policy used by `init` invocations, which carry no policy of their own
    pub fn with_coordinator_policy(mut self, policy: CoordinatorPolicy) -> Self {
        self.coordinator_policy = policy;
        self
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    pub fn variables(&self) -> &V {
        &self.variables
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Run one action invocation from the host
    pub fn run(&mut self, invocation: &Invocation) -> Result<Outcome> {
        let action = invocation.parse_action()?;
        debug!(%action, room = ?invocation.room_name(), "running action");

        match action {
            Action::Init => {
                let config = NeuronConfig::from_invocation(invocation, self.coordinator_policy)?;
                self.init(&config).map(Outcome::Synced)
            }
            Action::Sync => {
                let session = self.session.as_mut().ok_or_else(|| uninitialized(action))?;
                Ok(Outcome::Synced(session.sync(&self.controller, &mut self.variables)))
            }
            Action::Play => {
                self.play(invocation.room_name(), invocation.item.as_deref())?;
                Ok(Outcome::Done)
            }
            Action::Pause => self.on_coordinator(action, invocation, |c, d| c.pause(d)),
            Action::Next => self.on_coordinator(action, invocation, |c, d| c.next(d)),
            Action::Previous => self.on_coordinator(action, invocation, |c, d| c.previous(d)),
            Action::Mute => self.on_coordinator(action, invocation, |c, d| c.set_mute(d, true)),
            Action::Unmute => self.on_coordinator(action, invocation, |c, d| c.set_mute(d, false)),
        }
    }

    /// Connect, sync and check the default room
    ///
    /// The address is validated before any network traffic. On failure the
    /// previous session, if any, is kept.
    pub fn init(&mut self, config: &NeuronConfig) -> Result<SyncReport> {
        config.validate()?;
        debug!(ipv4 = ?config.ipv4, room = %config.room, "initializing");

        let target = match config.ipv4 {
            None => self
                .controller
                .discover(&config.room)
                .map_err(|e| communication_failure(&e))?
                .ok_or_else(|| {
                    NeuronError::SonosFailure(format!(
                        "Could not initialize sonos neuron with room='{}': no speaker with that name found",
                        config.room
                    ))
                })?,
            Some(ip) => {
                let device = self.controller.connect(ip).map_err(|e| communication_failure(&e))?;
                self.group_coordinator(device, config.coordinator_policy)?
            }
        };

        let mut session = Session::new(target, &config.room, config.rooms.clone());
        let report = session.refresh(&self.controller);

        if session.rooms().is_empty() {
            return Err(NeuronError::SonosFailure("SONOS returned an empty room list".to_string()));
        }
        if session.room(&config.room).is_none() {
            return Err(NeuronError::InvalidParameter(format!(
                "You must specify a valid sonos name for 'room' in action 'init' (got '{}')",
                config.room
            )));
        }

        session.publish(&mut self.variables);
        self.session = Some(session);
        Ok(report)
    }

    /// The device to use as session target for a directly addressed speaker
    fn group_coordinator(&self, device: Device, policy: CoordinatorPolicy) -> Result<Device> {
        let groups = self
            .controller
            .zone_groups(&device)
            .map_err(|e| communication_failure(&e))?;

        let (group, located) = groups
            .iter()
            .find_map(|group| group.member(&device.uid).map(|member| (group, member)))
            .ok_or_else(|| {
                NeuronError::SonosFailure(format!("SONOS with ipv4='{}' is not part of any group", device.ip))
            })?;

        if located.visible && located.is_coordinator() {
            return Ok(located.clone());
        }

        let coordinator = group.coordinator().ok_or_else(|| {
            NeuronError::SonosFailure(format!(
                "group coordinator '{}' of SONOS with ipv4='{}' is not in its group",
                group.coordinator_uid, device.ip
            ))
        })?;

        match policy {
            CoordinatorPolicy::Fail => Err(NeuronError::InvalidParameter(format!(
                "SONOS with ipv4='{}' is no group coordinator, use the coordinator's address '{}' for 'ipv4'",
                device.ip, coordinator.ip
            ))),
            CoordinatorPolicy::Fallback => {
                warn!(
                    "SONOS with ipv4='{}' is no coordinator, using group coordinator {}",
                    device.ip,
                    coordinator.host()
                );
                Ok(coordinator.clone())
            }
        }
    }

    fn active_session(&self, action: Action) -> Result<&Session> {
        self.session.as_ref().ok_or_else(|| uninitialized(action))
    }

    /// Name and members of `room`, or of the default room when none is given
    fn resolve_room(&self, action: Action, room: Option<&str>) -> Result<(String, Vec<Device>)> {
        let session = self.active_session(action)?;
        let room = room.unwrap_or_else(|| session.default_room());
        let members = session.room(room).ok_or_else(|| {
            NeuronError::InvalidParameter(format!(
                "the value '{}' is invalid for parameter 'room' in action '{}'",
                room, action
            ))
        })?;
        Ok((room.to_string(), members.to_vec()))
    }

    fn on_coordinator<F>(&self, action: Action, invocation: &Invocation, command: F) -> Result<Outcome>
    where
        F: FnOnce(&C, &Device) -> std::result::Result<(), ControlError>,
    {
        let (room, members) = self.resolve_room(action, invocation.room_name())?;
        let coordinator = first_member(action, &room, &members)?;
        debug!(%action, speaker = %coordinator.host(), "sending command to coordinator");
        command(&self.controller, coordinator).map_err(|e| communication_failure(&e))?;
        Ok(Outcome::Done)
    }

    fn play(&self, room: Option<&str>, item: Option<&str>) -> Result<()> {
        let (room, members) = self.resolve_room(Action::Play, room)?;
        let coordinator = first_member(Action::Play, &room, &members)?;
        let favorite = match item {
            Some(item) => Some(self.pick_favorite(item)?),
            None => None,
        };

        if members.len() > 1 {
            self.regroup(coordinator, &members[1..]);
        }

        match favorite {
            Some(favorite) => {
                debug!(favorite = %favorite.title, speaker = %coordinator.host(), "playing favorite");
                self.controller
                    .clear_queue(coordinator)
                    .and_then(|_| self.controller.add_to_queue(coordinator, &favorite))
                    .and_then(|_| self.controller.play_from_queue(coordinator, 0))
                    .map_err(|e| communication_failure(&e))
            }
            None => self
                .controller
                .play(coordinator)
                .map_err(|e| communication_failure(&e)),
        }
    }

    /// The favorite whose title is most similar to `item`
    fn pick_favorite(&self, item: &str) -> Result<Favorite> {
        let favorites = self.active_session(Action::Play)?.favorites();
        similarity::best_match(item, favorites.iter().map(|favorite| favorite.title.as_str()))
            .map(|index| favorites[index].clone())
            .ok_or_else(|| {
                NeuronError::InvalidParameter(format!(
                    "no favorites available to match item '{}'",
                    item
                ))
            })
    }

    /// Make `members` follow `coordinator`; failures only warn
    fn regroup(&self, coordinator: &Device, members: &[Device]) {
        if let Err(e) = self.controller.unjoin(coordinator) {
            warn!("failed to ungroup coordinator {}: {}", coordinator.host(), e);
        }
        for member in members {
            if !member.is_coordinator() {
                if let Err(e) = self.controller.unjoin(member) {
                    warn!("failed to ungroup {}: {}", member.host(), e);
                }
            }
            if let Err(e) = self.controller.join(member, coordinator) {
                warn!("failed to join {} to {}: {}", member.host(), coordinator.host(), e);
            }
        }
    }
}

/// The first member of a room coordinates it
fn first_member<'a>(action: Action, room: &str, members: &'a [Device]) -> Result<&'a Device> {
    members.first().ok_or_else(|| {
        NeuronError::InvalidParameter(format!(
            "room '{}' has no reachable speakers in action '{}'",
            room, action
        ))
    })
}

fn uninitialized(action: Action) -> NeuronError {
    NeuronError::SonosFailure(format!(
        "uninitialized neuron (probably failure during action='init' => SONOS unavailable?), not executing action='{}'",
        action
    ))
}

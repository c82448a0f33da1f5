//! AVTransport operations: transport control, the queue and grouping.
//!
//! Grouping on Sonos is expressed through the transport: a speaker joins a
//! group by pointing its transport at `x-rincon:<coordinator uid>` and leaves
//! by becoming the coordinator of a standalone group.

use crate::operation::{child_text, child_u32, define_operation};

define_operation! {
    operation: PlayOperation,
    action: "Play",
    service: AVTransport,
    request: { instance_id: u32 => "InstanceID", speed: String => "Speed" },
    response: (),
    parse: |_xml| Ok(()),
}

define_operation! {
    operation: PauseOperation,
    action: "Pause",
    service: AVTransport,
    request: { instance_id: u32 => "InstanceID" },
    response: (),
    parse: |_xml| Ok(()),
}

define_operation! {
    operation: NextOperation,
    action: "Next",
    service: AVTransport,
    request: { instance_id: u32 => "InstanceID" },
    response: (),
    parse: |_xml| Ok(()),
}

define_operation! {
    operation: PreviousOperation,
    action: "Previous",
    service: AVTransport,
    request: { instance_id: u32 => "InstanceID" },
    response: (),
    parse: |_xml| Ok(()),
}

define_operation! {
    /// Seek within the current track or, with `TRACK_NR`, to a 1-based queue position
    operation: SeekOperation,
    action: "Seek",
    service: AVTransport,
    request: {
        instance_id: u32 => "InstanceID",
        unit: String => "Unit",
        target: String => "Target",
    },
    response: (),
    parse: |_xml| Ok(()),
}

define_operation! {
    operation: SetAVTransportURIOperation,
    action: "SetAVTransportURI",
    service: AVTransport,
    request: {
        instance_id: u32 => "InstanceID",
        current_uri: String => "CurrentURI",
        current_uri_meta_data: String => "CurrentURIMetaData",
    },
    response: (),
    parse: |_xml| Ok(()),
}

define_operation! {
    operation: RemoveAllTracksFromQueueOperation,
    action: "RemoveAllTracksFromQueue",
    service: AVTransport,
    request: { instance_id: u32 => "InstanceID" },
    response: (),
    parse: |_xml| Ok(()),
}

/// Result of an `AddURIToQueue` call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddURIToQueueResponse {
    pub first_track_number_enqueued: u32,
    pub num_tracks_added: u32,
    pub new_queue_length: u32,
}

define_operation! {
    operation: AddURIToQueueOperation,
    action: "AddURIToQueue",
    service: AVTransport,
    request: {
        instance_id: u32 => "InstanceID",
        enqueued_uri: String => "EnqueuedURI",
        enqueued_uri_meta_data: String => "EnqueuedURIMetaData",
        desired_first_track_number_enqueued: u32 => "DesiredFirstTrackNumberEnqueued",
        enqueue_as_next: bool => "EnqueueAsNext",
    },
    response: AddURIToQueueResponse,
    parse: |xml| Ok(AddURIToQueueResponse {
        first_track_number_enqueued: child_u32(xml, "FirstTrackNumberEnqueued")?,
        num_tracks_added: child_u32(xml, "NumTracksAdded")?,
        new_queue_length: child_u32(xml, "NewQueueLength")?,
    }),
}

/// Result of leaving a group
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BecomeCoordinatorOfStandaloneGroupResponse {
    pub delegated_group_coordinator_id: String,
    pub new_group_id: String,
}

define_operation! {
    operation: BecomeCoordinatorOfStandaloneGroupOperation,
    action: "BecomeCoordinatorOfStandaloneGroup",
    service: AVTransport,
    request: { instance_id: u32 => "InstanceID" },
    response: BecomeCoordinatorOfStandaloneGroupResponse,
    parse: |xml| Ok(BecomeCoordinatorOfStandaloneGroupResponse {
        delegated_group_coordinator_id: child_text(xml, "DelegatedGroupCoordinatorID").unwrap_or_default(),
        new_group_id: child_text(xml, "NewGroupID").unwrap_or_default(),
    }),
}

/// Transport URI that makes a speaker follow `coordinator_uid`
pub fn group_uri(coordinator_uid: &str) -> String {
    format!("x-rincon:{}", coordinator_uid)
}

/// Transport URI of a speaker's own queue
pub fn queue_uri(uid: &str) -> String {
    format!("x-rincon-queue:{}#0", uid)
}

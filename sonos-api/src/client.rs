use soap_client::SoapClient;
use tracing::debug;

use crate::operation::SonosOperation;
use crate::services::av_transport::{
    self, AddURIToQueueOperation, AddURIToQueueOperationRequest, AddURIToQueueResponse,
    BecomeCoordinatorOfStandaloneGroupOperation, BecomeCoordinatorOfStandaloneGroupOperationRequest,
    NextOperation, NextOperationRequest, PauseOperation, PauseOperationRequest, PlayOperation,
    PlayOperationRequest, PreviousOperation, PreviousOperationRequest,
    RemoveAllTracksFromQueueOperation, RemoveAllTracksFromQueueOperationRequest, SeekOperation,
    SeekOperationRequest, SetAVTransportURIOperation, SetAVTransportURIOperationRequest,
};
use crate::services::content_directory::{
    parse_favorites, BrowseOperation, BrowseOperationRequest, Favorite, FAVORITES_OBJECT_ID,
};
use crate::services::rendering_control::{SetMuteOperation, SetMuteOperationRequest};
use crate::services::zone_group_topology::{
    GetZoneGroupStateOperation, GetZoneGroupStateOperationRequest, ZoneGroup,
};
use crate::Result;

const FAVORITES_PAGE_SIZE: u32 = 100;

/// Executes operations against speakers over SOAP
///
/// Every method takes the speaker's `host:port`. Calls are blocking and are
/// never retried; timeouts surface as [`crate::ApiError::Timeout`].
#[derive(Debug, Clone, Default)]
pub struct SonosClient {
    soap_client: SoapClient,
}

impl SonosClient {
    pub fn new() -> Self {
        Self {
            soap_client: SoapClient::new(),
        }
    }

    pub fn with_soap_client(soap_client: SoapClient) -> Self {
        Self { soap_client }
    }

    /// Execute a single operation
    pub fn execute<Op: SonosOperation>(&self, host: &str, request: &Op::Request) -> Result<Op::Response> {
        let service_info = Op::SERVICE.info();
        let payload = Op::build_payload(request);
        debug!(host, service = Op::SERVICE.name(), action = Op::ACTION, "executing operation");

        let xml = self.soap_client.call(
            host,
            service_info.endpoint,
            service_info.service_uri,
            Op::ACTION,
            &payload,
        )?;

        Op::parse_response(&xml)
    }

    pub fn play(&self, host: &str) -> Result<()> {
        self.execute::<PlayOperation>(
            host,
            &PlayOperationRequest {
                instance_id: 0,
                speed: "1".to_string(),
            },
        )
    }

    pub fn pause(&self, host: &str) -> Result<()> {
        self.execute::<PauseOperation>(host, &PauseOperationRequest { instance_id: 0 })
    }

    pub fn next(&self, host: &str) -> Result<()> {
        self.execute::<NextOperation>(host, &NextOperationRequest { instance_id: 0 })
    }

    pub fn previous(&self, host: &str) -> Result<()> {
        self.execute::<PreviousOperation>(host, &PreviousOperationRequest { instance_id: 0 })
    }

    pub fn set_mute(&self, host: &str, mute: bool) -> Result<()> {
        self.execute::<SetMuteOperation>(
            host,
            &SetMuteOperationRequest {
                instance_id: 0,
                channel: "Master".to_string(),
                desired_mute: mute,
            },
        )
    }

    pub fn clear_queue(&self, host: &str) -> Result<()> {
        self.execute::<RemoveAllTracksFromQueueOperation>(
            host,
            &RemoveAllTracksFromQueueOperationRequest { instance_id: 0 },
        )
    }

    /// Append `uri` with its DIDL `metadata` to the end of the queue
    pub fn add_to_queue(&self, host: &str, uri: &str, metadata: &str) -> Result<AddURIToQueueResponse> {
        self.execute::<AddURIToQueueOperation>(
            host,
            &AddURIToQueueOperationRequest {
                instance_id: 0,
                enqueued_uri: uri.to_string(),
                enqueued_uri_meta_data: metadata.to_string(),
                desired_first_track_number_enqueued: 0,
                enqueue_as_next: false,
            },
        )
    }

    /// Switch the transport to the speaker's queue and start at `index` (0-based)
    pub fn play_from_queue(&self, host: &str, uid: &str, index: u32) -> Result<()> {
        self.execute::<SetAVTransportURIOperation>(
            host,
            &SetAVTransportURIOperationRequest {
                instance_id: 0,
                current_uri: av_transport::queue_uri(uid),
                current_uri_meta_data: String::new(),
            },
        )?;
        self.execute::<SeekOperation>(
            host,
            &SeekOperationRequest {
                instance_id: 0,
                unit: "TRACK_NR".to_string(),
                target: (index + 1).to_string(),
            },
        )?;
        self.play(host)
    }

    /// Make the speaker at `host` follow the group coordinated by `coordinator_uid`
    pub fn join(&self, host: &str, coordinator_uid: &str) -> Result<()> {
        self.execute::<SetAVTransportURIOperation>(
            host,
            &SetAVTransportURIOperationRequest {
                instance_id: 0,
                current_uri: av_transport::group_uri(coordinator_uid),
                current_uri_meta_data: String::new(),
            },
        )
    }

    /// Take the speaker at `host` out of its group
    pub fn unjoin(&self, host: &str) -> Result<()> {
        self.execute::<BecomeCoordinatorOfStandaloneGroupOperation>(
            host,
            &BecomeCoordinatorOfStandaloneGroupOperationRequest { instance_id: 0 },
        )
        .map(|_| ())
    }

    /// Household topology as seen by the speaker at `host`
    pub fn zone_groups(&self, host: &str) -> Result<Vec<ZoneGroup>> {
        self.execute::<GetZoneGroupStateOperation>(host, &GetZoneGroupStateOperationRequest {})
    }

    /// All Sonos favorites, fetched page by page until `TotalMatches` is reached
    pub fn favorites(&self, host: &str) -> Result<Vec<Favorite>> {
        let mut favorites = Vec::new();
        let mut starting_index = 0;
        loop {
            let page = self.execute::<BrowseOperation>(
                host,
                &BrowseOperationRequest::children(FAVORITES_OBJECT_ID, starting_index, FAVORITES_PAGE_SIZE),
            )?;
            favorites.extend(parse_favorites(&page.result)?);
            starting_index += page.number_returned;
            if page.number_returned == 0 || starting_index >= page.total_matches {
                return Ok(favorites);
            }
        }
    }
}

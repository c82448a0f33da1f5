//! ZoneGroupTopology: which speakers exist and who coordinates whom.
//!
//! `GetZoneGroupState` answers with an escaped XML document. Newer firmware
//! wraps the groups in `<ZoneGroupState>`, older firmware returns
//! `<ZoneGroups>` at the root; both are accepted.

use serde::Deserialize;

use crate::error::{ApiError, Result};
use crate::operation::{child_text, define_operation};

define_operation! {
    operation: GetZoneGroupStateOperation,
    action: "GetZoneGroupState",
    service: ZoneGroupTopology,
    request: {},
    response: Vec<ZoneGroup>,
    parse: |xml| parse_zone_group_state(&child_text(xml, "ZoneGroupState")?),
}

/// A group of speakers playing in sync under one coordinator
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ZoneGroup {
    /// UID of the coordinating speaker
    #[serde(rename = "@Coordinator")]
    pub coordinator: String,

    #[serde(rename = "@ID")]
    pub id: String,

    #[serde(rename = "ZoneGroupMember", default)]
    pub members: Vec<ZoneGroupMember>,
}

/// One speaker as listed in the topology
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ZoneGroupMember {
    #[serde(rename = "@UUID")]
    pub uuid: String,

    /// Device description URL, e.g. `http://192.168.1.10:1400/xml/device_description.xml`
    #[serde(rename = "@Location")]
    pub location: String,

    #[serde(rename = "@ZoneName")]
    pub zone_name: String,

    /// `1` for bonded satellites and subwoofers that never show up as zones
    #[serde(rename = "@Invisible", default)]
    pub invisible: Option<String>,
}

impl ZoneGroup {
    pub fn coordinator_member(&self) -> Option<&ZoneGroupMember> {
        self.members.iter().find(|m| m.uuid == self.coordinator)
    }
}

impl ZoneGroupMember {
    pub fn is_visible(&self) -> bool {
        self.invisible.as_deref() != Some("1")
    }

    /// Host and port taken from the member's location URL
    pub fn address(&self) -> Result<(String, u16)> {
        let authority = self
            .location
            .split("//")
            .nth(1)
            .and_then(|rest| rest.split('/').next())
            .ok_or_else(|| ApiError::ParseError(format!("Bad location '{}'", self.location)))?;
        let (host, port) = authority.split_once(':').unwrap_or((authority, "1400"));
        let port = port
            .parse()
            .map_err(|_| ApiError::ParseError(format!("Bad port in location '{}'", self.location)))?;
        Ok((host.to_string(), port))
    }
}

#[derive(Debug, Deserialize)]
struct ZoneGroupStateDocument {
    #[serde(rename = "ZoneGroups")]
    zone_groups: ZoneGroupsDocument,
}

#[derive(Debug, Deserialize)]
struct ZoneGroupsDocument {
    #[serde(rename = "ZoneGroup", default)]
    zone_groups: Vec<ZoneGroup>,
}

/// Parse the decoded `ZoneGroupState` document
pub fn parse_zone_group_state(xml: &str) -> Result<Vec<ZoneGroup>> {
    let parse_error = |e: quick_xml::DeError| ApiError::ParseError(format!("ZoneGroupState: {}", e));
    if xml.contains("<ZoneGroupState") {
        let document: ZoneGroupStateDocument = quick_xml::de::from_str(xml).map_err(parse_error)?;
        Ok(document.zone_groups.zone_groups)
    } else {
        let document: ZoneGroupsDocument = quick_xml::de::from_str(xml).map_err(parse_error)?;
        Ok(document.zone_groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::SonosOperation;
    use rstest::rstest;
    use xmltree::Element;

    const WRAPPED_STATE: &str = r#"<ZoneGroupState><ZoneGroups><ZoneGroup Coordinator="RINCON_111" ID="RINCON_111:10"><ZoneGroupMember UUID="RINCON_111" Location="http://192.168.1.10:1400/xml/device_description.xml" ZoneName="Living" SoftwareVersion="79.1"><Satellite UUID="RINCON_SUB" Location="http://192.168.1.13:1400/xml/device_description.xml" ZoneName="Living" Invisible="1"/></ZoneGroupMember><ZoneGroupMember UUID="RINCON_SUB" Location="http://192.168.1.13:1400/xml/device_description.xml" ZoneName="Living" Invisible="1"/><ZoneGroupMember UUID="RINCON_222" Location="http://192.168.1.11:1400/xml/device_description.xml" ZoneName="Kitchen"/></ZoneGroup><ZoneGroup Coordinator="RINCON_333" ID="RINCON_333:4"><ZoneGroupMember UUID="RINCON_333" Location="http://192.168.1.12:1400/xml/device_description.xml" ZoneName="Office"/></ZoneGroup></ZoneGroups><VanishedDevices/></ZoneGroupState>"#;

    #[test]
    fn test_parse_wrapped_state() {
        let groups = parse_zone_group_state(WRAPPED_STATE).unwrap();
        assert_eq!(groups.len(), 2);

        let living = &groups[0];
        assert_eq!(living.coordinator, "RINCON_111");
        assert_eq!(living.members.len(), 3);
        assert_eq!(living.coordinator_member().unwrap().zone_name, "Living");

        let visible: Vec<_> = living
            .members
            .iter()
            .filter(|m| m.is_visible())
            .map(|m| m.zone_name.as_str())
            .collect();
        assert_eq!(visible, vec!["Living", "Kitchen"]);
    }

    #[test]
    fn test_parse_legacy_state() {
        let legacy = r#"<ZoneGroups><ZoneGroup Coordinator="RINCON_A" ID="RINCON_A:1"><ZoneGroupMember UUID="RINCON_A" Location="http://10.0.0.2:1400/xml/device_description.xml" ZoneName="Den"/></ZoneGroup></ZoneGroups>"#;
        let groups = parse_zone_group_state(legacy).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].members[0].zone_name, "Den");
    }

    #[test]
    fn test_parse_from_soap_response_unescapes_state() {
        let escaped = WRAPPED_STATE.replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;");
        let response = format!(
            "<GetZoneGroupStateResponse><ZoneGroupState>{}</ZoneGroupState></GetZoneGroupStateResponse>",
            escaped
        );
        let xml = Element::parse(response.as_bytes()).unwrap();
        let groups = GetZoneGroupStateOperation::parse_response(&xml).unwrap();
        assert_eq!(groups[1].members[0].zone_name, "Office");
    }

    #[test]
    fn test_garbage_state_is_parse_error() {
        assert!(matches!(
            parse_zone_group_state("<ZoneGroupState><ZoneGroups><ZoneGroup></ZoneGroups>"),
            Err(ApiError::ParseError(_))
        ));
    }

    #[rstest]
    #[case("http://192.168.1.10:1400/xml/device_description.xml", Ok(("192.168.1.10", 1400)))]
    #[case("http://192.168.1.10/xml/device_description.xml", Ok(("192.168.1.10", 1400)))]
    #[case("not a url", Err(()))]
    #[case("http://192.168.1.10:port/xml", Err(()))]
    fn test_member_address(#[case] location: &str, #[case] expected: std::result::Result<(&str, u16), ()>) {
        let member = ZoneGroupMember {
            uuid: "RINCON_1".to_string(),
            location: location.to_string(),
            zone_name: "Den".to_string(),
            invisible: None,
        };
        let actual = member.address().map_err(|_| ());
        assert_eq!(actual, expected.map(|(h, p)| (h.to_string(), p)));
    }
}

//! ContentDirectory browsing, used here for the Sonos favorites (`FV:2`).

use xmltree::{Element, XMLNode};

use crate::error::{ApiError, Result};
use crate::operation::{child_text, child_u32, define_operation};

/// Container holding the household's Sonos favorites
pub const FAVORITES_OBJECT_ID: &str = "FV:2";

/// One page of a `Browse` result
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowseResponse {
    /// Decoded DIDL-Lite document
    pub result: String,
    pub number_returned: u32,
    pub total_matches: u32,
    pub update_id: u32,
}

define_operation! {
    operation: BrowseOperation,
    action: "Browse",
    service: ContentDirectory,
    request: {
        object_id: String => "ObjectID",
        browse_flag: String => "BrowseFlag",
        filter: String => "Filter",
        starting_index: u32 => "StartingIndex",
        requested_count: u32 => "RequestedCount",
        sort_criterion: String => "SortCriterion",
    },
    response: BrowseResponse,
    parse: |xml| Ok(BrowseResponse {
        result: child_text(xml, "Result")?,
        number_returned: child_u32(xml, "NumberReturned")?,
        total_matches: child_u32(xml, "TotalMatches")?,
        update_id: child_u32(xml, "UpdateID").unwrap_or_default(),
    }),
}

impl BrowseOperationRequest {
    /// Request one page of direct children of `object_id`
    pub fn children(object_id: &str, starting_index: u32, requested_count: u32) -> Self {
        Self {
            object_id: object_id.to_string(),
            browse_flag: "BrowseDirectChildren".to_string(),
            filter: "dc:title,res,dc:creator,upnp:artist,upnp:album,upnp:albumArtURI".to_string(),
            starting_index,
            requested_count,
            sort_criterion: String::new(),
        }
    }
}

/// A saved favorite and the reference needed to enqueue it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Favorite {
    pub title: String,
    /// Playable URI from the favorite's `<res>` element
    pub uri: String,
    /// DIDL-Lite metadata of the referenced item (`r:resMD`)
    pub metadata: String,
}

/// Read the favorites out of a decoded DIDL-Lite page.
///
/// Items without a title or resource cannot be played and are skipped.
pub fn parse_favorites(didl: &str) -> Result<Vec<Favorite>> {
    if didl.trim().is_empty() {
        return Ok(Vec::new());
    }
    let root = Element::parse(didl.as_bytes())
        .map_err(|e| ApiError::ParseError(format!("DIDL-Lite: {}", e)))?;

    let favorites = root
        .children
        .iter()
        .filter_map(XMLNode::as_element)
        .filter(|element| element.name == "item")
        .filter_map(|item| {
            let title = text_of(item, "title")?;
            let uri = text_of(item, "res")?;
            Some(Favorite {
                title,
                uri,
                metadata: text_of(item, "resMD").unwrap_or_default(),
            })
        })
        .collect();
    Ok(favorites)
}

fn text_of(item: &Element, name: &str) -> Option<String> {
    item.get_child(name)
        .and_then(|child| child.get_text())
        .map(|text| text.into_owned())
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::SonosOperation;

    const FAVORITES_DIDL: &str = r#"<DIDL-Lite xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:upnp="urn:schemas-upnp-org:metadata-1-0/upnp/" xmlns:r="urn:schemas-rinconnetworks-com:metadata-1-0/" xmlns="urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/"><item id="FV:2/12" parentID="FV:2" restricted="false"><dc:title>Jazz Radio</dc:title><upnp:class>object.itemobject.item.sonos-favorite</upnp:class><r:ordinal>0</r:ordinal><res protocolInfo="x-rincon-mp3radio:*:*:*">x-rincon-mp3radio://jazz.example.com/stream?a=1&amp;b=2</res><r:type>instantPlay</r:type><r:resMD>&lt;DIDL-Lite&gt;&lt;item id="F00092020s24"/&gt;&lt;/DIDL-Lite&gt;</r:resMD></item><item id="FV:2/13" parentID="FV:2" restricted="false"><dc:title>Jazz FM</dc:title><res protocolInfo="x-sonosapi-stream:*:*:*">x-sonosapi-stream:s1234?sid=254</res></item><item id="FV:2/14" parentID="FV:2"><dc:title>Broken</dc:title></item></DIDL-Lite>"#;

    #[test]
    fn test_parse_favorites() {
        let favorites = parse_favorites(FAVORITES_DIDL).unwrap();
        assert_eq!(favorites.len(), 2);

        assert_eq!(favorites[0].title, "Jazz Radio");
        assert_eq!(favorites[0].uri, "x-rincon-mp3radio://jazz.example.com/stream?a=1&b=2");
        assert_eq!(favorites[0].metadata, r#"<DIDL-Lite><item id="F00092020s24"/></DIDL-Lite>"#);

        assert_eq!(favorites[1].title, "Jazz FM");
        assert_eq!(favorites[1].metadata, "");
    }

    #[test]
    fn test_empty_result_has_no_favorites() {
        assert!(parse_favorites("").unwrap().is_empty());
    }

    #[test]
    fn test_broken_didl_is_parse_error() {
        assert!(matches!(parse_favorites("<DIDL-Lite><item>"), Err(ApiError::ParseError(_))));
    }

    #[test]
    fn test_browse_payload() {
        let payload = BrowseOperation::build_payload(&BrowseOperationRequest::children(
            FAVORITES_OBJECT_ID,
            100,
            100,
        ));
        assert!(payload.starts_with("<ObjectID>FV:2</ObjectID><BrowseFlag>BrowseDirectChildren</BrowseFlag>"));
        assert!(payload.contains("<StartingIndex>100</StartingIndex><RequestedCount>100</RequestedCount>"));
        assert!(payload.ends_with("<SortCriterion></SortCriterion>"));
    }
}

//! Private SOAP client for UPnP device communication
//!
//! This crate provides a minimal blocking SOAP client for talking to Sonos
//! speakers. It builds the envelope, posts it to the control endpoint and
//! hands back the `<ActionResponse>` element, turning UPnP faults into
//! [`SoapError::Fault`].

mod error;

pub use error::SoapError;

use std::time::Duration;
use tracing::debug;
use xmltree::Element;

/// A minimal SOAP client for UPnP device communication
#[derive(Debug, Clone)]
pub struct SoapClient {
    agent: ureq::Agent,
}

impl SoapClient {
    /// Create a new SOAP client with default configuration
    pub fn new() -> Self {
        Self::with_timeouts(Duration::from_secs(5), Duration::from_secs(10))
    }

    /// Create a client with explicit connect and read timeouts
    pub fn with_timeouts(connect: Duration, read: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout_connect(connect)
                .timeout_read(read)
                .build(),
        }
    }

    /// Send a SOAP request and return the parsed response element
    ///
    /// # Arguments
    /// * `host` - Device address including port, e.g. `192.168.1.100:1400`
    /// * `endpoint` - Control path, e.g. `MediaRenderer/AVTransport/Control`
    /// * `service_uri` - UPnP service type
    /// * `action` - SOAP action name
    /// * `payload` - Already escaped argument elements
    pub fn call(
        &self,
        host: &str,
        endpoint: &str,
        service_uri: &str,
        action: &str,
        payload: &str,
    ) -> Result<Element, SoapError> {
        let body = format!(
            r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/"><s:Body><u:{action} xmlns:u="{service_uri}">{payload}</u:{action}></s:Body></s:Envelope>"#,
            action = action,
            service_uri = service_uri,
            payload = payload
        );

        let url = format!("http://{}/{}", host, endpoint);
        let soap_action = format!("\"{}#{}\"", service_uri, action);
        debug!(%url, action, "sending SOAP request");

        let xml_text = match self
            .agent
            .post(&url)
            .set("Content-Type", "text/xml; charset=\"utf-8\"")
            .set("SOAPACTION", &soap_action)
            .send_string(&body)
        {
            Ok(response) => response
                .into_string()
                .map_err(|e| SoapError::Network(e.to_string()))?,
            // Sonos reports UPnP faults with HTTP 500 and a SOAP body
            Err(ureq::Error::Status(code, response)) => match response.into_string() {
                Ok(text) if !text.trim().is_empty() => text,
                _ => return Err(SoapError::Network(format!("HTTP {}", code))),
            },
            Err(ureq::Error::Transport(transport)) => {
                return Err(if is_timeout(&transport) {
                    SoapError::Timeout(transport.to_string())
                } else {
                    SoapError::Network(transport.to_string())
                });
            }
        };

        let xml = Element::parse(xml_text.as_bytes())
            .map_err(|e| SoapError::Parse(e.to_string()))?;

        extract_response(&xml, action)
    }
}

impl Default for SoapClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Escape text for inclusion in an XML element body or attribute
pub fn escape_xml(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn is_timeout(transport: &ureq::Transport) -> bool {
    let mut source = std::error::Error::source(transport);
    while let Some(err) = source {
        if let Some(io) = err.downcast_ref::<std::io::Error>() {
            return matches!(
                io.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            );
        }
        source = err.source();
    }
    transport.to_string().contains("timed out")
}

fn extract_response(xml: &Element, action: &str) -> Result<Element, SoapError> {
    let body = xml
        .get_child("Body")
        .ok_or_else(|| SoapError::Parse("Missing SOAP Body".to_string()))?;

    if let Some(fault) = body.get_child("Fault") {
        let error_code = fault
            .get_child("detail")
            .and_then(|d| d.get_child("UPnPError"))
            .and_then(|e| e.get_child("errorCode"))
            .and_then(|c| c.get_text())
            .and_then(|t| t.trim().parse::<u16>().ok())
            .unwrap_or(500);
        return Err(SoapError::Fault(error_code));
    }

    let response_name = format!("{}Response", action);
    body.get_child(response_name.as_str())
        .cloned()
        .ok_or_else(|| SoapError::Parse(format!("Missing {} element", response_name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAUSE_OK: &str = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><u:PauseResponse xmlns:u="urn:schemas-upnp-org:service:AVTransport:1"></u:PauseResponse></s:Body></s:Envelope>"#;

    const FAULT_701: &str = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><s:Fault><faultcode>s:Client</faultcode><faultstring>UPnPError</faultstring><detail><UPnPError xmlns="urn:schemas-upnp-org:control-1-0"><errorCode>701</errorCode></UPnPError></detail></s:Fault></s:Body></s:Envelope>"#;

    #[test]
    fn test_extract_response_with_valid_response() {
        let xml = Element::parse(PAUSE_OK.as_bytes()).unwrap();
        let response = extract_response(&xml, "Pause").unwrap();
        assert_eq!(response.name, "PauseResponse");
    }

    #[test]
    fn test_extract_response_with_soap_fault() {
        let xml = Element::parse(FAULT_701.as_bytes()).unwrap();
        match extract_response(&xml, "Pause") {
            Err(SoapError::Fault(code)) => assert_eq!(code, 701),
            other => panic!("Expected SoapError::Fault, got {:?}", other),
        }
    }

    #[test]
    fn test_fault_without_detail_defaults_to_500() {
        let xml_str = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><s:Fault><faultcode>s:Server</faultcode></s:Fault></s:Body></s:Envelope>"#;
        let xml = Element::parse(xml_str.as_bytes()).unwrap();
        assert!(matches!(extract_response(&xml, "Play"), Err(SoapError::Fault(500))));
    }

    #[test]
    fn test_extract_response_missing_body() {
        let xml_str = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"></s:Envelope>"#;
        let xml = Element::parse(xml_str.as_bytes()).unwrap();
        match extract_response(&xml, "Play") {
            Err(SoapError::Parse(msg)) => assert!(msg.contains("Missing SOAP Body")),
            other => panic!("Expected SoapError::Parse, got {:?}", other),
        }
    }

    #[test]
    fn test_extract_response_wrong_action() {
        let xml = Element::parse(PAUSE_OK.as_bytes()).unwrap();
        match extract_response(&xml, "Play") {
            Err(SoapError::Parse(msg)) => assert!(msg.contains("Missing PlayResponse element")),
            other => panic!("Expected SoapError::Parse, got {:?}", other),
        }
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(
            escape_xml(r#"<DIDL-Lite a="b">R&B's</DIDL-Lite>"#),
            "&lt;DIDL-Lite a=&quot;b&quot;&gt;R&amp;B&apos;s&lt;/DIDL-Lite&gt;"
        );
        assert_eq!(escape_xml("plain"), "plain");
    }

    #[test]
    fn test_call_posts_envelope_with_soapaction() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/MediaRenderer/AVTransport/Control")
            .match_header(
                "soapaction",
                "\"urn:schemas-upnp-org:service:AVTransport:1#Pause\"",
            )
            .match_body(mockito::Matcher::Regex("<InstanceID>0</InstanceID>".to_string()))
            .with_status(200)
            .with_body(PAUSE_OK)
            .create();

        let client = SoapClient::new();
        let response = client
            .call(
                &server.host_with_port(),
                "MediaRenderer/AVTransport/Control",
                "urn:schemas-upnp-org:service:AVTransport:1",
                "Pause",
                "<InstanceID>0</InstanceID>",
            )
            .unwrap();

        assert_eq!(response.name, "PauseResponse");
        mock.assert();
    }

    #[test]
    fn test_call_reads_fault_from_http_500() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/MediaRenderer/AVTransport/Control")
            .with_status(500)
            .with_body(FAULT_701)
            .create();

        let result = SoapClient::new().call(
            &server.host_with_port(),
            "MediaRenderer/AVTransport/Control",
            "urn:schemas-upnp-org:service:AVTransport:1",
            "Pause",
            "<InstanceID>0</InstanceID>",
        );

        assert!(matches!(result, Err(SoapError::Fault(701))));
    }

    #[test]
    fn test_call_unreachable_host_is_network_error() {
        let client = SoapClient::with_timeouts(Duration::from_millis(200), Duration::from_millis(200));
        // Port 9 (discard) on localhost is expected to refuse connections
        let result = client.call("127.0.0.1:9", "x", "urn:x", "Play", "");
        assert!(matches!(result, Err(SoapError::Network(_)) | Err(SoapError::Timeout(_))));
    }
}

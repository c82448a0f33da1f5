//! Operation trait and the declarative macro that implements it
//!
//! An operation is a stateless description of one SOAP action: which
//! service it targets, how its request is serialized and how its response
//! element is read back.

use xmltree::Element;

use crate::error::{ApiError, Result};
use crate::service::Service;

/// A single UPnP action on a Sonos speaker
pub trait SonosOperation {
    type Request;
    type Response;

    const SERVICE: Service;
    const ACTION: &'static str;

    /// Serialize the request into escaped argument elements
    fn build_payload(request: &Self::Request) -> String;

    /// Read the typed response from the `<ActionResponse>` element
    fn parse_response(xml: &Element) -> Result<Self::Response>;
}

/// Formatting of a request field as SOAP argument text
pub trait SoapArgument {
    fn to_soap(&self) -> String;
}

impl SoapArgument for String {
    fn to_soap(&self) -> String {
        soap_client::escape_xml(self)
    }
}

impl SoapArgument for u32 {
    fn to_soap(&self) -> String {
        self.to_string()
    }
}

impl SoapArgument for bool {
    fn to_soap(&self) -> String {
        if *self { "1" } else { "0" }.to_string()
    }
}

/// Text of a required child element of a response
pub(crate) fn child_text(xml: &Element, name: &str) -> Result<String> {
    xml.get_child(name)
        .map(|child| child.get_text().map(|t| t.into_owned()).unwrap_or_default())
        .ok_or_else(|| ApiError::ParseError(format!("Missing {} in {}", name, xml.name)))
}

/// Numeric child element of a response
pub(crate) fn child_u32(xml: &Element, name: &str) -> Result<u32> {
    let text = child_text(xml, name)?;
    text.trim()
        .parse()
        .map_err(|_| ApiError::ParseError(format!("{} is not a number: '{}'", name, text)))
}

/// Define an operation, its `<Op>Request` struct and its trait impl.
///
/// Request fields are listed with the SOAP argument name they serialize to,
/// in the order the device expects them.
///
/// ```rust,ignore
/// define_operation! {
///     operation: PauseOperation,
///     action: "Pause",
///     service: AVTransport,
///     request: { instance_id: u32 => "InstanceID" },
///     response: (),
///     parse: |_xml| Ok(()),
/// }
/// ```
macro_rules! define_operation {
    (
        $(#[$meta:meta])*
        operation: $op:ident,
        action: $action:literal,
        service: $service:ident,
        request: { $($field:ident: $field_ty:ty => $arg:literal),* $(,)? },
        response: $response:ty,
        parse: |$xml:ident| $parse:expr $(,)?
    ) => {
        paste::paste! {
            #[derive(Debug, Clone, PartialEq, Eq)]
            pub struct [<$op Request>] {
                $(pub $field: $field_ty,)*
            }

            $(#[$meta])*
            pub struct $op;

            impl $crate::operation::SonosOperation for $op {
                type Request = [<$op Request>];
                type Response = $response;

                const SERVICE: $crate::service::Service = $crate::service::Service::$service;
                const ACTION: &'static str = $action;

                #[allow(unused_mut, unused_variables)]
                fn build_payload(request: &Self::Request) -> String {
                    let mut payload = String::new();
                    $(
                        payload.push_str(&format!(
                            "<{arg}>{value}</{arg}>",
                            arg = $arg,
                            value = $crate::operation::SoapArgument::to_soap(&request.$field)
                        ));
                    )*
                    payload
                }

                fn parse_response($xml: &::xmltree::Element) -> $crate::error::Result<Self::Response> {
                    $parse
                }
            }
        }
    };
}

pub(crate) use define_operation;

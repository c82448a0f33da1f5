//! RenderingControl operations (mute)

use crate::operation::define_operation;

define_operation! {
    operation: SetMuteOperation,
    action: "SetMute",
    service: RenderingControl,
    request: {
        instance_id: u32 => "InstanceID",
        channel: String => "Channel",
        desired_mute: bool => "DesiredMute",
    },
    response: (),
    parse: |_xml| Ok(()),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::SonosOperation;

    #[test]
    fn test_set_mute_payload() {
        let payload = SetMuteOperation::build_payload(&SetMuteOperationRequest {
            instance_id: 0,
            channel: "Master".to_string(),
            desired_mute: true,
        });
        assert_eq!(
            payload,
            "<InstanceID>0</InstanceID><Channel>Master</Channel><DesiredMute>1</DesiredMute>"
        );
    }
}

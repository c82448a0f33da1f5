//! Operations grouped by UPnP service

pub mod av_transport;
pub mod content_directory;
pub mod rendering_control;
pub mod zone_group_topology;

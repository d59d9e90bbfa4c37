mod camera;

pub use camera::{CameraRecord, CameraSummary, HeartbeatRequest, ListCamerasQuery, ViewEventRequest};

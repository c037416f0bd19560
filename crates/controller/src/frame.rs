use serde::{Deserialize, Serialize};

use crate::encode::ThrottlePayload;

/// Identifier of the normal throttle frame.
pub const THROTTLE_FRAME_ID: u32 = 0x20;
/// Identifier of the failure frame.
pub const FAILURE_FRAME_ID: u32 = 0xFF;

/// A frame ready to hand to the bus driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanFrame {
    pub id: u32,
    pub len: u8,
    pub data: [u8; 8],
}

impl CanFrame {
    pub fn throttle(payload: ThrottlePayload) -> Self {
        Self {
            id: THROTTLE_FRAME_ID,
            len: 8,
            data: payload,
        }
    }

    pub fn failure() -> Self {
        Self {
            id: FAILURE_FRAME_ID,
            len: 0,
            data: [0; 8],
        }
    }

    pub fn is_failure(&self) -> bool {
        self.id == FAILURE_FRAME_ID
    }

    /// The first `len` data bytes.
    pub fn payload(&self) -> &[u8] {
        self.data.get(..usize::from(self.len)).unwrap_or(&self.data)
    }
}

/// Transmission seam to the bus.
///
/// A send error is final for the session: the control cycle reports it and
/// the caller halts instead of retrying.
pub trait FrameSink {
    type Error: std::error::Error + Send + Sync + 'static;

    fn send(&mut self, frame: &CanFrame) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttle_frame_carries_full_payload() {
        let frame = CanFrame::throttle([4, 5, 6, 7, 0, 0, 0, 0]);
        assert_eq!(frame.id, 0x20);
        assert_eq!(frame.payload(), &[4, 5, 6, 7, 0, 0, 0, 0]);
        assert!(!frame.is_failure());
    }

    #[test]
    fn failure_frame_is_empty() {
        let frame = CanFrame::failure();
        assert_eq!(frame.id, 0xFF);
        assert!(frame.payload().is_empty());
        assert!(frame.is_failure());
    }
}

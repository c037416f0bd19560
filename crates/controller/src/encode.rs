use serde::{Deserialize, Serialize};

/// Eight payload bytes of the throttle frame.
pub type ThrottlePayload = [u8; 8];

/// Placement of the decimal digits in bytes 0..=4.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayloadLayout {
    /// Significant digits from byte 0, no leading zeros: 45.67 -> `4,5,6,7,0`.
    ///
    /// The digit count is not carried, so trailing zeros are ambiguous:
    /// 0.05, 5.0 and 50.0 all encode as `5,0,0,0,0`. Receivers that need the
    /// magnitude must use [`PayloadLayout::Positional`].
    #[default]
    Compact,
    /// Always five digits, ten-thousands in byte 0: 45.67 -> `0,4,5,6,7`.
    Positional,
}

const DIGITS: usize = 5;

/// Encode a throttle percentage as decimal digits with two implied decimals.
///
/// The percentage is scaled by 100 and rounded, so 45.67 becomes 4567. Each
/// digit is stored as its numeric value, most significant first. Bytes 5..=7
/// stay zero. Inputs outside [0, 100] are clamped.
pub fn encode(avg_pct: f64, layout: PayloadLayout) -> ThrottlePayload {
    let hundredths = (avg_pct * 100.0).round().clamp(0.0, 10_000.0) as u16;

    let mut digits = [0u8; DIGITS];
    let mut rest = hundredths;
    for digit in digits.iter_mut().rev() {
        *digit = (rest % 10) as u8;
        rest /= 10;
    }

    let skip = match layout {
        PayloadLayout::Positional => 0,
        PayloadLayout::Compact => digits
            .iter()
            .position(|&d| d != 0)
            .unwrap_or(DIGITS - 1),
    };

    let mut payload = [0u8; 8];
    for (slot, digit) in payload.iter_mut().zip(&digits[skip..]) {
        *slot = *digit;
    }
    payload
}

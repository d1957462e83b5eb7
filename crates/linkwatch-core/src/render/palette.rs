// ── Color palette ──
//
// The utilization scale and status colors shared by every backend.

use strum::{EnumIter, IntoEnumIterator};

use crate::model::Status;

/// An sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// `#rrggbb`.
    pub fn hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

pub const UNKNOWN: Rgb = Rgb(90, 90, 100);
pub const TEXT: Rgb = Rgb(230, 230, 230);
pub const LABEL_BOX: Rgb = Rgb(30, 30, 36);
pub const LABEL_BORDER: Rgb = Rgb(120, 120, 130);
pub const SELECTION: Rgb = Rgb(255, 255, 255);
pub const SVG_BACKGROUND: Rgb = Rgb(18, 18, 24);

/// Lower bucket boundaries; the last bucket is open above.
const BOUNDARIES: [f64; 9] = [0.0, 0.01, 0.2, 0.4, 0.6, 0.8, 0.9, 0.99, 1.01];

/// The eight utilization color buckets, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum UtilizationBucket {
    Idle,
    Low,
    Light,
    Moderate,
    Busy,
    Heavy,
    Severe,
    Saturated,
}

impl UtilizationBucket {
    /// Bucket for a utilization ratio. Negative, NaN and infinite inputs
    /// have no bucket.
    pub fn for_utilization(utilization: f64) -> Option<Self> {
        if !utilization.is_finite() || utilization < 0.0 {
            return None;
        }
        let bucket = Self::iter()
            .zip(BOUNDARIES.windows(2))
            .find(|(_, w)| utilization < w[1])
            .map_or(Self::Saturated, |(bucket, _)| bucket);
        Some(bucket)
    }

    pub fn color(self) -> Rgb {
        match self {
            Self::Idle => Rgb(192, 192, 192),
            Self::Low => Rgb(0, 120, 255),
            Self::Light => Rgb(0, 200, 255),
            Self::Moderate => Rgb(0, 210, 90),
            Self::Busy => Rgb(240, 220, 0),
            Self::Heavy => Rgb(255, 150, 0),
            Self::Severe => Rgb(255, 60, 0),
            Self::Saturated => Rgb(200, 0, 120),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "0-1%",
            Self::Low => "1-20%",
            Self::Light => "20-40%",
            Self::Moderate => "40-60%",
            Self::Busy => "60-80%",
            Self::Heavy => "80-90%",
            Self::Severe => "90-99%",
            Self::Saturated => "99%+",
        }
    }
}

/// Link color for an optional utilization.
pub fn utilization_color(utilization: Option<f64>) -> Rgb {
    utilization
        .and_then(UtilizationBucket::for_utilization)
        .map_or(UNKNOWN, UtilizationBucket::color)
}

/// Router marker color; `None` before the first snapshot.
pub fn status_color(status: Option<Status>) -> Rgb {
    match status {
        Some(Status::Ok) => Rgb(0, 200, 80),
        Some(Status::Warning) => Rgb(240, 220, 0),
        Some(Status::Critical) => Rgb(255, 130, 0),
        Some(Status::Error) => Rgb(230, 30, 30),
        None => UNKNOWN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_boundaries() {
        use UtilizationBucket as B;
        let cases = [
            (0.0, B::Idle),
            (0.009, B::Idle),
            (0.01, B::Low),
            (0.2, B::Light),
            (0.5, B::Moderate),
            (0.79, B::Busy),
            (0.85, B::Heavy),
            (0.95, B::Severe),
            (0.99, B::Saturated),
            (1.0, B::Saturated),
            (5.0, B::Saturated),
        ];
        for (u, expected) in cases {
            assert_eq!(UtilizationBucket::for_utilization(u), Some(expected), "u={u}");
        }
    }

    #[test]
    fn out_of_range_is_unknown() {
        for u in [f64::NAN, -0.1, f64::INFINITY] {
            assert_eq!(utilization_color(Some(u)), UNKNOWN);
        }
        assert_eq!(utilization_color(None), UNKNOWN);
    }

    #[test]
    fn hex_format() {
        assert_eq!(Rgb(0, 120, 255).hex(), "#0078ff");
    }
}

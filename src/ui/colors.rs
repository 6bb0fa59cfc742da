//! 24-bit RGB color theme for terminal output.

use owo_colors::Rgb;

use crate::quality::CertificationLevel;

/// 24-bit RGB color theme for locpage's terminal output.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    /// Success state color - green (34, 197, 94)
    pub success: Rgb,
    /// Error state color - red (239, 68, 68)
    pub error: Rgb,
    /// Warning state color - yellow (234, 179, 8)
    pub warning: Rgb,
    /// In-progress state color - blue (59, 130, 246)
    pub in_progress: Rgb,
    /// Muted/secondary text color - gray (107, 114, 128)
    pub muted: Rgb,
    /// Slug and location highlight color - cyan (34, 211, 238)
    pub highlight: Rgb,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            success: Rgb(34, 197, 94),
            error: Rgb(239, 68, 68),
            warning: Rgb(234, 179, 8),
            in_progress: Rgb(59, 130, 246),
            muted: Rgb(107, 114, 128),
            highlight: Rgb(34, 211, 238),
        }
    }
}

impl Theme {
    pub fn new() -> Self {
        Self::default()
    }

    /// Color for a score: green from 80, yellow from 60, red below.
    pub fn for_score(&self, score: f64) -> Rgb {
        if score >= 80.0 {
            self.success
        } else if score >= 60.0 {
            self.warning
        } else {
            self.error
        }
    }

    pub fn for_certification(&self, level: CertificationLevel) -> Rgb {
        match level {
            CertificationLevel::Platinum => Rgb(229, 228, 226),
            CertificationLevel::Gold => Rgb(250, 204, 21),
            CertificationLevel::Silver => Rgb(192, 192, 192),
            CertificationLevel::Bronze => Rgb(205, 127, 50),
            CertificationLevel::None => self.muted,
        }
    }
}

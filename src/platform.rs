use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Platform {
    YouTube,
    TikTok,
    Instagram,
    Facebook,
    #[serde(rename = "X.com")]
    X,
    Unknown,
}

// Domain markers, checked in order; first hit wins
const MARKERS: &[(&[&str], Platform)] = &[
    (&["youtube.com", "youtu.be"], Platform::YouTube),
    (&["tiktok.com"], Platform::TikTok),
    (&["instagram.com"], Platform::Instagram),
    (&["facebook.com", "fb.watch"], Platform::Facebook),
    (&["twitter.com", "x.com"], Platform::X),
];

/// Labels reported when the upstream does not list its own.
pub const SUPPORTED: [Platform; 5] = [
    Platform::YouTube,
    Platform::TikTok,
    Platform::Instagram,
    Platform::Facebook,
    Platform::X,
];

impl Platform {
    pub fn label(self) -> &'static str {
        match self {
            Platform::YouTube => "YouTube",
            Platform::TikTok => "TikTok",
            Platform::Instagram => "Instagram",
            Platform::Facebook => "Facebook",
            Platform::X => "X.com",
            Platform::Unknown => "Unknown",
        }
    }
}

pub fn detect_platform(url: &str) -> Platform {
    MARKERS
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| url.contains(n)))
        .map(|(_, platform)| *platform)
        .unwrap_or(Platform::Unknown)
}

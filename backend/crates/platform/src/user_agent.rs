//! User-Agent Classification
//!
//! Deterministic mapping of a raw User-Agent header into a coarse
//! `{device, browser, os}` triple. This feeds the device fingerprint, so the
//! matcher favors stability over completeness: the same header always yields
//! the same triple, and anything unrecognizable collapses to the `"Unknown"`
//! sentinel.

/// Sentinel used when a component cannot be determined.
pub const UNKNOWN: &str = "Unknown";

/// Coarse classification of the client software behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSoftware {
    /// Device class: `iPhone`, `iPad`, `Mobile`, `Tablet`, `Desktop` or `Unknown`
    pub device: String,
    /// Browser family, e.g. `Firefox`, `Chrome`
    pub browser: String,
    /// Operating system family, e.g. `Windows`, `Android`
    pub os: String,
}

impl ClientSoftware {
    /// The all-`Unknown` triple used for unparsable user agents.
    pub fn unknown() -> Self {
        Self {
            device: UNKNOWN.to_string(),
            browser: UNKNOWN.to_string(),
            os: UNKNOWN.to_string(),
        }
    }

    /// True when nothing could be determined from the header.
    pub fn is_unknown(&self) -> bool {
        self.device == UNKNOWN && self.browser == UNKNOWN && self.os == UNKNOWN
    }
}

/// Classify a User-Agent header.
///
/// Matching is case-insensitive. Token order follows each family's
/// conventions (e.g. Chrome ships a `Safari/` token, so Chrome is checked
/// first; Edge and Opera ship a `Chrome/` token, so they are checked before
/// Chrome).
pub fn parse(user_agent: &str) -> ClientSoftware {
    let ua = user_agent.trim().to_ascii_lowercase();
    if ua.is_empty() {
        return ClientSoftware::unknown();
    }

    let browser = detect_browser(&ua);
    let os = detect_os(&ua);

    // A header with no recognizable browser or OS token is treated as
    // unparsable rather than half-classified.
    if browser == UNKNOWN && os == UNKNOWN {
        return ClientSoftware::unknown();
    }

    ClientSoftware {
        device: detect_device(&ua).to_string(),
        browser: browser.to_string(),
        os: os.to_string(),
    }
}

fn detect_browser(ua: &str) -> &'static str {
    if ua.contains("edg/") || ua.contains("edge/") {
        "Edge"
    } else if ua.contains("opr/") || ua.contains("opera") {
        "Opera"
    } else if ua.contains("firefox/") || ua.contains("fxios/") {
        "Firefox"
    } else if ua.contains("chrome/") || ua.contains("crios/") {
        "Chrome"
    } else if ua.contains("safari/") {
        "Safari"
    } else {
        UNKNOWN
    }
}

fn detect_os(ua: &str) -> &'static str {
    if ua.contains("windows nt") || ua.contains("windows phone") {
        "Windows"
    } else if ua.contains("android") {
        "Android"
    } else if ua.contains("iphone") || ua.contains("ipad") || ua.contains("like mac os x") {
        "iOS"
    } else if ua.contains("mac os x") || ua.contains("macintosh") {
        "macOS"
    } else if ua.contains("linux") {
        "Linux"
    } else {
        UNKNOWN
    }
}

fn detect_device(ua: &str) -> &'static str {
    if ua.contains("ipad") {
        "iPad"
    } else if ua.contains("iphone") {
        "iPhone"
    } else if ua.contains("tablet") {
        "Tablet"
    } else if ua.contains("mobile") || ua.contains("android") {
        "Mobile"
    } else {
        "Desktop"
    }
}

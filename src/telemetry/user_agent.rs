//! User-agent classification
//!
//! Raw user-agent strings are unbounded, so they are never used as labels.
//! A [`UserAgentParser`] extracts vendor browser/OS family names, and those
//! names are folded into the closed [`Browser`] and [`Os`] sets. Anything
//! outside the allow-list becomes `Other`.

use serde::Serialize;
use std::fmt;

/// Vendor family names extracted from a user-agent string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedUserAgent {
    pub browser: Option<String>,
    pub os: Option<String>,
}

/// Turns a raw `User-Agent` header into vendor family names.
pub trait UserAgentParser: Send + Sync {
    fn parse(&self, user_agent: &str) -> ParsedUserAgent;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Browser {
    Chrome,
    Firefox,
    Safari,
    Edge,
    Other,
}

impl Browser {
    pub const ALL: [Browser; 5] = [
        Browser::Chrome,
        Browser::Firefox,
        Browser::Safari,
        Browser::Edge,
        Browser::Other,
    ];

    /// Fold a vendor family name into the allow-list
    pub fn from_family(name: &str) -> Self {
        match name {
            "Chrome" => Browser::Chrome,
            "Firefox" => Browser::Firefox,
            "Safari" => Browser::Safari,
            "Edge" => Browser::Edge,
            _ => Browser::Other,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Browser::Chrome => "Chrome",
            Browser::Firefox => "Firefox",
            Browser::Safari => "Safari",
            Browser::Edge => "Edge",
            Browser::Other => "Other",
        }
    }
}

impl fmt::Display for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Os {
    Windows,
    MacOs,
    Ios,
    Android,
    Linux,
    Other,
}

impl Os {
    pub const ALL: [Os; 6] = [Os::Windows, Os::MacOs, Os::Ios, Os::Android, Os::Linux, Os::Other];

    /// Fold a vendor family name into the allow-list
    pub fn from_family(name: &str) -> Self {
        match name {
            "Windows" => Os::Windows,
            "macOS" => Os::MacOs,
            "iOS" => Os::Ios,
            "Android" => Os::Android,
            "Linux" => Os::Linux,
            _ => Os::Other,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Os::Windows => "Windows",
            Os::MacOs => "macOS",
            Os::Ios => "iOS",
            Os::Android => "Android",
            Os::Linux => "Linux",
            Os::Other => "Other",
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a user-agent string into the closed browser and OS sets.
pub fn classify(parser: &dyn UserAgentParser, user_agent: &str) -> (Browser, Os) {
    let parsed = parser.parse(user_agent);
    let browser = parsed
        .browser
        .as_deref()
        .map(Browser::from_family)
        .unwrap_or(Browser::Other);
    let os = parsed
        .os
        .as_deref()
        .map(Os::from_family)
        .unwrap_or(Os::Other);
    (browser, os)
}

/// Token-based parser covering the mainstream browser and OS families.
///
/// Rules are ordered: Chromium derivatives advertise `Chrome/` and `Safari/`
/// and iOS devices advertise `like Mac OS X`, so more specific tokens are
/// checked first.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenParser;

const BROWSER_RULES: &[(&[&str], &str)] = &[
    (&["Edg/", "EdgA/", "EdgiOS/", "Edge/"], "Edge"),
    (&["OPR/", "Opera"], "Opera"),
    (&["SamsungBrowser/"], "Samsung Internet"),
    (&["YaBrowser/"], "Yandex Browser"),
    (&["Firefox/", "FxiOS/"], "Firefox"),
    (&["Chromium/"], "Chromium"),
    (&["Chrome/", "CriOS/"], "Chrome"),
    (&["MSIE ", "Trident/"], "IE"),
    (&["Safari/"], "Safari"),
];

const OS_RULES: &[(&[&str], &str)] = &[
    (&["Windows"], "Windows"),
    (&["iPhone", "iPad", "iPod"], "iOS"),
    (&["Android"], "Android"),
    (&["CrOS"], "Chrome OS"),
    (&["Macintosh", "Mac OS X"], "macOS"),
    (&["Linux", "X11"], "Linux"),
];

/// Crawler markers, matched on token boundaries so device names such as
/// `CUBOT` are not mistaken for bots
const BOT_MARKERS: &[&str] = &["bot/", "bot;", "bot)", "+http", "crawler", "spider"];

fn first_match(user_agent: &str, rules: &[(&[&str], &str)]) -> Option<String> {
    rules
        .iter()
        .find(|(tokens, _)| tokens.iter().any(|token| user_agent.contains(token)))
        .map(|(_, family)| family.to_string())
}

impl UserAgentParser for TokenParser {
    fn parse(&self, user_agent: &str) -> ParsedUserAgent {
        // Crawlers routinely embed browser tokens; never count them as one
        let lowered = user_agent.to_ascii_lowercase();
        let is_bot = BOT_MARKERS.iter().any(|marker| lowered.contains(marker));

        ParsedUserAgent {
            browser: if is_bot {
                None
            } else {
                first_match(user_agent, BROWSER_RULES)
            },
            os: first_match(user_agent, OS_RULES),
        }
    }
}

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

/// Enumeration of the platforms we have dedicated styling for.
/// Anything else renders as Other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Twitter,
    Facebook,
    Instagram,
    LinkedIn,
    GitHub,
    YouTube,
    TikTok,
    Pinterest,
    Other,
}

/// How a platform is presented: label, icon name and a two stop gradient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformStyle {
    pub label: &'static str,
    pub icon: &'static str,
    pub gradient: (&'static str, &'static str),
}

struct PlatformEntry {
    platform: Platform,
    names: &'static [&'static str],
    hosts: &'static [&'static str],
    style: PlatformStyle,
}

const PLATFORMS: &[PlatformEntry] = &[
    PlatformEntry {
        platform: Platform::Twitter,
        names: &["twitter", "x"],
        hosts: &["twitter.com", "x.com"],
        style: PlatformStyle {
            label: "Twitter",
            icon: "twitter",
            gradient: ("#1da1f2", "#0c85d0"),
        },
    },
    PlatformEntry {
        platform: Platform::Facebook,
        names: &["facebook", "fb"],
        hosts: &["facebook.com", "fb.com"],
        style: PlatformStyle {
            label: "Facebook",
            icon: "facebook",
            gradient: ("#1877f2", "#0b5fcc"),
        },
    },
    PlatformEntry {
        platform: Platform::Instagram,
        names: &["instagram", "ig"],
        hosts: &["instagram.com"],
        style: PlatformStyle {
            label: "Instagram",
            icon: "instagram",
            gradient: ("#f58529", "#dd2a7b"),
        },
    },
    PlatformEntry {
        platform: Platform::LinkedIn,
        names: &["linkedin", "linked-in"],
        hosts: &["linkedin.com", "lnkd.in"],
        style: PlatformStyle {
            label: "LinkedIn",
            icon: "linkedin",
            gradient: ("#0a66c2", "#004182"),
        },
    },
    PlatformEntry {
        platform: Platform::GitHub,
        names: &["github"],
        hosts: &["github.com"],
        style: PlatformStyle {
            label: "GitHub",
            icon: "github",
            gradient: ("#333333", "#171515"),
        },
    },
    PlatformEntry {
        platform: Platform::YouTube,
        names: &["youtube", "yt"],
        hosts: &["youtube.com", "youtu.be"],
        style: PlatformStyle {
            label: "YouTube",
            icon: "youtube",
            gradient: ("#ff0000", "#c4302b"),
        },
    },
    PlatformEntry {
        platform: Platform::TikTok,
        names: &["tiktok", "tik-tok"],
        hosts: &["tiktok.com"],
        style: PlatformStyle {
            label: "TikTok",
            icon: "tiktok",
            gradient: ("#25f4ee", "#fe2c55"),
        },
    },
    PlatformEntry {
        platform: Platform::Pinterest,
        names: &["pinterest"],
        hosts: &["pinterest.com", "pin.it"],
        style: PlatformStyle {
            label: "Pinterest",
            icon: "pinterest",
            gradient: ("#e60023", "#ad081b"),
        },
    },
];

const OTHER_STYLE: PlatformStyle = PlatformStyle {
    label: "Link",
    icon: "link",
    gradient: ("#6b7280", "#374151"),
};

impl Platform {
    /// Resolve a user entered platform name. Matching is on the whole name,
    /// case-insensitive, never on substrings.
    pub fn from_name(name: &str) -> Platform {
        let name = name.trim().to_lowercase();
        PLATFORMS
            .iter()
            .find(|entry| entry.names.contains(&name.as_str()))
            .map_or(Platform::Other, |entry| entry.platform)
    }

    /// Infer the platform from a url host, e.g. `www.github.com` is GitHub.
    pub fn from_url(url: &str) -> Platform {
        let Ok(url) = Url::parse(url) else {
            return Platform::Other;
        };
        let Some(host) = url.host_str() else {
            return Platform::Other;
        };
        let host = host.to_lowercase();

        PLATFORMS
            .iter()
            .find(|entry| entry.hosts.iter().any(|known| host_matches(&host, known)))
            .map_or(Platform::Other, |entry| entry.platform)
    }

    pub fn style(&self) -> &'static PlatformStyle {
        PLATFORMS
            .iter()
            .find(|entry| entry.platform == *self)
            .map_or(&OTHER_STYLE, |entry| &entry.style)
    }
}

/// True when `host` is `known` or one of its subdomains.
fn host_matches(host: &str, known: &str) -> bool {
    match host.strip_suffix(known) {
        Some("") => true,
        Some(prefix) => prefix.ends_with('.'),
        None => false,
    }
}

impl FromStr for Platform {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Platform::from_name(s))
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.style().label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_name_matches_whole_names_only() {
        assert_eq!(Platform::from_name("GitHub"), Platform::GitHub);
        assert_eq!(Platform::from_name("  youtube "), Platform::YouTube);
        assert_eq!(Platform::from_name("X"), Platform::Twitter);
        assert_eq!(Platform::from_name("linked-in"), Platform::LinkedIn);

        // The old substring dispatch would have matched these.
        assert_eq!(Platform::from_name("my github mirror"), Platform::Other);
        assert_eq!(Platform::from_name("xbox"), Platform::Other);
        assert_eq!(Platform::from_name(""), Platform::Other);
    }

    #[test]
    fn from_url_matches_host_and_subdomains() {
        assert_eq!(
            Platform::from_url("https://github.com/octocat"),
            Platform::GitHub
        );
        assert_eq!(
            Platform::from_url("https://www.linkedin.com/in/someone"),
            Platform::LinkedIn
        );
        assert_eq!(Platform::from_url("https://youtu.be/abc"), Platform::YouTube);
        assert_eq!(
            Platform::from_url("https://notgithub.com/octocat"),
            Platform::Other
        );
        assert_eq!(Platform::from_url("not a url"), Platform::Other);
    }

    #[test]
    fn every_platform_has_a_style() {
        let all = [
            Platform::Twitter,
            Platform::Facebook,
            Platform::Instagram,
            Platform::LinkedIn,
            Platform::GitHub,
            Platform::YouTube,
            Platform::TikTok,
            Platform::Pinterest,
        ];
        for platform in all {
            assert_ne!(platform.style(), &OTHER_STYLE, "{:?}", platform);
        }
        assert_eq!(Platform::Other.style().icon, "link");
        assert_eq!(Platform::GitHub.to_string(), "GitHub");
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Platform::LinkedIn).unwrap(),
            r#""linkedin""#
        );
    }
}

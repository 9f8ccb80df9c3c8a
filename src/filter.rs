use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use texting_robots::Robot;
use url::Url;

/// User agent used for robots.txt matching when the caller names none
pub const DEFAULT_USER_AGENT: &str = "*";

/// Path/query substrings that mark gated content
pub const DENIED_KEYWORDS: [&str; 12] = [
    "login",
    "signin",
    "account",
    "profile",
    "dashboard",
    "admin",
    "user",
    "password",
    "token",
    "auth",
    "private",
    "secure",
];

/// Configuration for URL policy checks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Hosts that may be fetched (if empty, every host is allowed)
    #[serde(default)]
    pub allowed_domains: Vec<String>,

    /// Substrings that reject a URL when found in its path or query
    #[serde(default = "default_denied_keywords")]
    pub denied_keywords: Vec<String>,
}

fn default_denied_keywords() -> Vec<String> {
    DENIED_KEYWORDS.iter().map(|k| k.to_string()).collect()
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            allowed_domains: Vec::new(),
            denied_keywords: default_denied_keywords(),
        }
    }
}

/// Robots directives for the target site, as loaded at startup
#[derive(Debug, Clone)]
pub enum RobotsPolicy {
    /// robots.txt could not be fetched; everything is allowed
    Unavailable,
    /// The site answered with a client error other than 401/403
    AllowAll,
    /// The site answered 401 or 403
    DisallowAll,
    /// Raw robots.txt body, matched per user agent
    Rules(Vec<u8>),
}

impl RobotsPolicy {
    /// Fetch `/robots.txt` for the given site.
    ///
    /// Never fails: transport errors and server errors degrade to
    /// `Unavailable` with a warning.
    pub async fn fetch(client: &reqwest::Client, base_url: &Url) -> Self {
        let robots_url = match base_url.join("/robots.txt") {
            Ok(url) => url,
            Err(e) => {
                ::log::warn!("Could not build robots.txt URL for {}: {}", base_url, e);
                return RobotsPolicy::Unavailable;
            }
        };

        let response = match client.get(robots_url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                ::log::warn!(
                    "Could not load robots.txt: {}. Proceeding without robots.txt restrictions.",
                    e
                );
                return RobotsPolicy::Unavailable;
            }
        };

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            ::log::warn!("robots.txt at {} returned {}, disallowing all", robots_url, status);
            return RobotsPolicy::DisallowAll;
        }
        if status.is_client_error() {
            ::log::info!("No robots.txt at {} ({}), allowing all", robots_url, status);
            return RobotsPolicy::AllowAll;
        }
        if !status.is_success() {
            ::log::warn!(
                "Could not load robots.txt: {} returned {}. Proceeding without robots.txt restrictions.",
                robots_url,
                status
            );
            return RobotsPolicy::Unavailable;
        }

        match response.bytes().await {
            Ok(body) => {
                ::log::info!("Robots.txt loaded from {}", robots_url);
                RobotsPolicy::Rules(body.to_vec())
            }
            Err(e) => {
                ::log::warn!(
                    "Could not read robots.txt body: {}. Proceeding without robots.txt restrictions.",
                    e
                );
                RobotsPolicy::Unavailable
            }
        }
    }

    /// Whether robots directives are being enforced
    pub fn is_loaded(&self) -> bool {
        !matches!(self, RobotsPolicy::Unavailable)
    }

    /// Parse the rules for one user agent. `None` when there are no
    /// rules to parse or they are unreadable, which allows everything.
    fn parse_for(&self, user_agent: &str) -> Option<Robot> {
        let RobotsPolicy::Rules(body) = self else {
            return None;
        };

        match Robot::new(user_agent, body) {
            Ok(robot) => Some(robot),
            Err(e) => {
                ::log::warn!("Could not parse robots.txt for agent {}: {}", user_agent, e);
                None
            }
        }
    }
}

/// Decides whether a URL may be fetched: robots directives, domain
/// allow-list and the gated-content denylist must all agree.
///
/// robots.txt is parsed at most once per user agent.
pub struct PolicyFilter {
    config: PolicyConfig,
    robots: RobotsPolicy,
    parsed: Mutex<HashMap<String, Option<Robot>>>,
}

impl fmt::Debug for PolicyFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyFilter")
            .field("config", &self.config)
            .field("robots", &self.robots)
            .finish_non_exhaustive()
    }
}

impl Default for PolicyFilter {
    fn default() -> Self {
        Self::new(PolicyConfig::default(), RobotsPolicy::Unavailable)
    }
}

impl PolicyFilter {
    /// Create a filter from configuration and already-loaded robots directives
    pub fn new(config: PolicyConfig, robots: RobotsPolicy) -> Self {
        let denied_keywords = config
            .denied_keywords
            .iter()
            .map(|k| k.to_lowercase())
            .collect();
        let allowed_domains = config
            .allowed_domains
            .iter()
            .map(|d| d.trim_start_matches('.').to_lowercase())
            .collect();

        let mut parsed = HashMap::new();
        if let RobotsPolicy::Rules(_) = robots {
            parsed.insert(
                DEFAULT_USER_AGENT.to_string(),
                robots.parse_for(DEFAULT_USER_AGENT),
            );
        }

        Self {
            config: PolicyConfig {
                allowed_domains,
                denied_keywords,
            },
            robots,
            parsed: Mutex::new(parsed),
        }
    }

    /// Create a filter, fetching robots directives for `base_url` first
    pub async fn load(config: PolicyConfig, client: &reqwest::Client, base_url: &Url) -> Self {
        let robots = RobotsPolicy::fetch(client, base_url).await;
        Self::new(config, robots)
    }

    /// Whether robots directives were available at startup
    pub fn robots_loaded(&self) -> bool {
        self.robots.is_loaded()
    }

    /// Determine if a URL may be fetched
    pub fn is_allowed(&self, url: &str, user_agent: Option<&str>) -> bool {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                ::log::debug!("Rejecting unparsable URL {}: {}", url, e);
                return false;
            }
        };

        let user_agent = user_agent.unwrap_or(DEFAULT_USER_AGENT);
        if !self.robots_allow(&parsed, user_agent) {
            ::log::debug!("{} disallowed by robots.txt", url);
            return false;
        }

        if !self.is_in_domain_scope(&parsed) {
            ::log::debug!("{} is outside the allowed domains", url);
            return false;
        }

        if let Some(keyword) = self.denied_keyword(&parsed) {
            ::log::debug!("{} looks gated (matched '{}')", url, keyword);
            return false;
        }

        true
    }

    fn robots_allow(&self, url: &Url, user_agent: &str) -> bool {
        match self.robots {
            RobotsPolicy::Unavailable | RobotsPolicy::AllowAll => true,
            RobotsPolicy::DisallowAll => false,
            RobotsPolicy::Rules(_) => {
                let mut parsed = self
                    .parsed
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                parsed
                    .entry(user_agent.to_string())
                    .or_insert_with(|| self.robots.parse_for(user_agent))
                    .as_ref()
                    .is_none_or(|robot| robot.allowed(url.as_str()))
            }
        }
    }

    /// Number of user agents whose robots rules have been parsed
    pub fn parsed_agent_count(&self) -> usize {
        self.parsed
            .lock()
            .map(|parsed| parsed.len())
            .unwrap_or_else(|poisoned| poisoned.into_inner().len())
    }

    /// Check if a URL's host is one of the allowed domains or a subdomain of one
    fn is_in_domain_scope(&self, url: &Url) -> bool {
        if self.config.allowed_domains.is_empty() {
            return true;
        }

        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_lowercase();

        self.config.allowed_domains.iter().any(|domain| {
            host == *domain
                || host
                    .strip_suffix(domain.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }

    /// First denylisted keyword found in the URL's path or query
    fn denied_keyword(&self, url: &Url) -> Option<&str> {
        let mut target = url.path().to_lowercase();
        if let Some(query) = url.query() {
            target.push('?');
            target.push_str(&query.to_lowercase());
        }

        self.config
            .denied_keywords
            .iter()
            .find(|keyword| target.contains(keyword.as_str()))
            .map(|keyword| keyword.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(body: &str) -> RobotsPolicy {
        RobotsPolicy::Rules(body.as_bytes().to_vec())
    }

    #[test]
    fn test_default_filter() {
        let filter = PolicyFilter::default();

        assert!(filter.is_allowed("https://www.jiopay.com/business", None));
        assert!(filter.is_allowed("https://cdn.example.com/img/hero.png", None));
        assert!(!filter.robots_loaded());

        // Unparsable input is never fetched
        assert!(!filter.is_allowed("not a url", None));
    }

    #[test]
    fn test_denied_keywords() {
        let filter = PolicyFilter::default();

        let gated = [
            "https://site.test/account/settings",
            "https://site.test/Login",
            "https://site.test/help?next=/admin",
            "https://site.test/api?token=abc",
            "https://site.test/users/42",
            "https://site.test/secure/area",
        ];
        for url in gated {
            assert!(!filter.is_allowed(url, None), "{} should be rejected", url);
        }

        // Only path and query are inspected, not the host
        assert!(filter.is_allowed("https://account.site.test/help", None));
    }

    #[test]
    fn test_denylist_wins_over_robots_and_domain() {
        let filter = PolicyFilter::new(
            PolicyConfig {
                allowed_domains: vec!["site.test".to_string()],
                ..PolicyConfig::default()
            },
            rules("User-agent: *\nAllow: /\n"),
        );

        assert!(filter.is_allowed("https://site.test/faq", None));
        assert!(!filter.is_allowed("https://site.test/account/settings", None));
    }

    #[test]
    fn test_domain_restriction() {
        let filter = PolicyFilter::new(
            PolicyConfig {
                allowed_domains: vec!["jiopay.com".to_string()],
                ..PolicyConfig::default()
            },
            RobotsPolicy::Unavailable,
        );

        assert!(filter.is_allowed("https://jiopay.com/faq", None));
        assert!(filter.is_allowed("https://www.jiopay.com/faq", None));
        assert!(!filter.is_allowed("https://other.com/faq", None));
        assert!(!filter.is_allowed("https://notjiopay.com/faq", None));
    }

    #[test]
    fn test_robots_rules() {
        let filter = PolicyFilter::new(
            PolicyConfig::default(),
            rules("User-agent: *\nDisallow: /internal/\n\nUser-agent: badbot\nDisallow: /\n"),
        );

        assert!(filter.robots_loaded());
        assert!(filter.is_allowed("https://site.test/faq", None));
        assert!(!filter.is_allowed("https://site.test/internal/report", None));
        assert!(!filter.is_allowed("https://site.test/faq", Some("badbot")));
    }

    #[test]
    fn test_robots_parsed_once_per_agent() {
        let filter = PolicyFilter::new(
            PolicyConfig::default(),
            rules("User-agent: *\nDisallow: /internal/\n\nUser-agent: badbot\nDisallow: /\n"),
        );
        assert_eq!(filter.parsed_agent_count(), 1);

        for i in 0..50 {
            let url = format!("https://site.test/faq/{}", i);
            assert!(filter.is_allowed(&url, None));
            assert!(!filter.is_allowed(&url, Some("badbot")));
        }
        assert!(!filter.is_allowed("https://site.test/internal/x", None));
        assert_eq!(filter.parsed_agent_count(), 2);

        // Nothing to parse without rules
        let allow = PolicyFilter::new(PolicyConfig::default(), RobotsPolicy::AllowAll);
        assert!(allow.is_allowed("https://site.test/faq", Some("badbot")));
        assert_eq!(allow.parsed_agent_count(), 0);
    }

    #[test]
    fn test_robots_status_policies() {
        let deny = PolicyFilter::new(PolicyConfig::default(), RobotsPolicy::DisallowAll);
        assert!(!deny.is_allowed("https://site.test/faq", None));

        let allow = PolicyFilter::new(PolicyConfig::default(), RobotsPolicy::AllowAll);
        assert!(allow.is_allowed("https://site.test/faq", None));
        assert!(allow.robots_loaded());
    }

    #[tokio::test]
    async fn test_fetch_robots() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("GET", "/robots.txt")
            .with_status(200)
            .with_body("User-agent: *\nDisallow: /internal/\n")
            .expect(1)
            .create_async()
            .await;

        let base = Url::parse(&server.url()).unwrap();
        let client = reqwest::Client::new();
        let filter = PolicyFilter::load(PolicyConfig::default(), &client, &base).await;

        assert!(filter.robots_loaded());
        assert!(!filter.is_allowed(&format!("{}/internal/x", server.url()), None));
        assert!(filter.is_allowed(&format!("{}/faq", server.url()), None));
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_robots_degrades_to_allow_all() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/robots.txt")
            .with_status(503)
            .create_async()
            .await;

        let base = Url::parse(&server.url()).unwrap();
        let client = reqwest::Client::new();
        let robots = RobotsPolicy::fetch(&client, &base).await;
        assert!(matches!(robots, RobotsPolicy::Unavailable));

        let mut missing = mockito::Server::new_async().await;
        let _m404 = missing
            .mock("GET", "/robots.txt")
            .with_status(404)
            .create_async()
            .await;
        let base = Url::parse(&missing.url()).unwrap();
        let robots = RobotsPolicy::fetch(&client, &base).await;
        assert!(matches!(robots, RobotsPolicy::AllowAll));
    }
}

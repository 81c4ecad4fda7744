//! Which navigations stay inside the app window.
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationDecision {
    Allow,
    /// Hand the URL to the system browser instead
    OpenExternal,
    Block,
}

#[derive(Debug, Clone)]
pub struct NavigationPolicy {
    home_host: Option<String>,
    whitelist: Vec<String>,
    block_external: bool,
}

impl NavigationPolicy {
    pub fn new(home_url: &str, whitelist: &[String], block_external: bool) -> Self {
        let home_host = Url::parse(home_url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()));

        Self {
            home_host,
            whitelist: whitelist
                .iter()
                .map(|w| w.trim().to_ascii_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
            block_external,
        }
    }

    pub fn decide(&self, target: &str) -> NavigationDecision {
        let Ok(url) = Url::parse(target) else {
            return NavigationDecision::Allow;
        };

        // about:blank, data:, blob: and friends never leave the app
        if !matches!(url.scheme(), "http" | "https") {
            return NavigationDecision::Allow;
        }

        let Some(host) = url.host_str().map(|h| h.to_ascii_lowercase()) else {
            return NavigationDecision::Allow;
        };

        if self.home_host.as_deref() == Some(host.as_str()) || self.is_whitelisted(&host) {
            return NavigationDecision::Allow;
        }

        if self.block_external {
            tracing::debug!("Blocked navigation to {}", target);
            NavigationDecision::Block
        } else {
            NavigationDecision::OpenExternal
        }
    }

    fn is_whitelisted(&self, host: &str) -> bool {
        self.whitelist.iter().any(|entry| match entry.strip_prefix("*.") {
            Some(suffix) => host == suffix || host.ends_with(&format!(".{}", suffix)),
            None => host == entry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(whitelist: &[&str], block: bool) -> NavigationPolicy {
        let whitelist: Vec<String> = whitelist.iter().map(|s| s.to_string()).collect();
        NavigationPolicy::new("https://web.whatsapp.com/", &whitelist, block)
    }

    #[test]
    fn test_same_host_is_allowed() {
        let p = policy(&[], true);
        assert_eq!(p.decide("https://web.whatsapp.com/chat/1"), NavigationDecision::Allow);
        assert_eq!(p.decide("https://WEB.whatsapp.com/"), NavigationDecision::Allow);
    }

    #[test]
    fn test_external_opens_in_browser_by_default() {
        let p = policy(&[], false);
        assert_eq!(p.decide("https://example.com/"), NavigationDecision::OpenExternal);
    }

    #[test]
    fn test_external_blocked_when_configured() {
        let p = policy(&[], true);
        assert_eq!(p.decide("https://example.com/"), NavigationDecision::Block);
    }

    #[test]
    fn test_whitelist_exact_and_wildcard() {
        let p = policy(&["accounts.google.com", "*.whatsapp.net"], true);
        assert_eq!(p.decide("https://accounts.google.com/signin"), NavigationDecision::Allow);
        assert_eq!(p.decide("https://mail.google.com/"), NavigationDecision::Block);
        assert_eq!(p.decide("https://mmg.whatsapp.net/x"), NavigationDecision::Allow);
        assert_eq!(p.decide("https://whatsapp.net/"), NavigationDecision::Allow);
        assert_eq!(p.decide("https://evilwhatsapp.net/"), NavigationDecision::Block);
    }

    #[test]
    fn test_non_http_schemes_are_allowed() {
        let p = policy(&[], true);
        assert_eq!(p.decide("about:blank"), NavigationDecision::Allow);
        assert_eq!(p.decide("data:text/html,hi"), NavigationDecision::Allow);
    }
}

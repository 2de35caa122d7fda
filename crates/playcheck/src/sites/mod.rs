//! Helpers and page objects for the sites under test.

pub mod saucedemo;
pub mod the_internet;
pub mod todomvc;

use serde::{Deserialize, Serialize};

use crate::config::SiteUrls;

/// A site under test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Site {
    /// SauceDemo storefront
    SauceDemo,
    /// The Internet playground
    TheInternet,
    /// TodoMVC demo
    TodoMvc,
}

impl Site {
    /// Configured base URL of this site
    #[must_use]
    pub fn base_url(self, urls: &SiteUrls) -> &str {
        match self {
            Self::SauceDemo => &urls.saucedemo,
            Self::TheInternet => &urls.the_internet,
            Self::TodoMvc => &urls.todomvc,
        }
    }

    /// Absolute URL of `path` on this site
    #[must_use]
    pub fn url(self, urls: &SiteUrls, path: &str) -> String {
        join_url(self.base_url(urls), path)
    }
}

/// Join a base URL and a path with exactly one slash between them.
///
/// An empty path returns the base unchanged, so bases ending in `/` or a
/// fragment keep their exact form.
#[must_use]
pub fn join_url(base: &str, path: &str) -> String {
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        return base.to_string();
    }
    format!("{}/{path}", base.trim_end_matches('/'))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod join_url_tests {
        use super::*;

        #[test]
        fn test_single_slash() {
            assert_eq!(join_url("https://a.test", "/x"), "https://a.test/x");
            assert_eq!(join_url("https://a.test/", "x"), "https://a.test/x");
            assert_eq!(join_url("https://a.test/", "/x"), "https://a.test/x");
        }

        #[test]
        fn test_empty_path_keeps_base() {
            assert_eq!(join_url("https://www.saucedemo.com/", ""), "https://www.saucedemo.com/");
            assert_eq!(join_url("https://demo.test/todomvc/#/", "/"), "https://demo.test/todomvc/#/");
        }
    }

    mod site_tests {
        use super::*;

        #[test]
        fn test_default_urls() {
            let urls = SiteUrls::default();
            assert_eq!(Site::SauceDemo.url(&urls, ""), "https://www.saucedemo.com/");
            assert_eq!(
                Site::TheInternet.url(&urls, "/status_codes/404"),
                "https://the-internet.herokuapp.com/status_codes/404"
            );
            assert_eq!(Site::TodoMvc.url(&urls, ""), "https://demo.playwright.dev/todomvc/#/");
        }

        #[test]
        fn test_mirror_override() {
            let mut urls = SiteUrls::default();
            urls.the_internet = "http://localhost:7080".to_string();
            assert_eq!(Site::TheInternet.url(&urls, "abtest"), "http://localhost:7080/abtest");
        }
    }
}

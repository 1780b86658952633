//! Invoice link detection and resolution.
//!
//! Messages from Turkish merchants often carry only a link to an e-Arşiv
//! invoice page. The resolver fetches such pages through an injected
//! [`PageFetcher`] and parses them with [`InvoicePageParser`]. Every failure
//! here is absorbed; the caller falls back to the message body.

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::HttpFetcher;

use std::future::Future;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{debug, info};
use url::Url;

use crate::error::FetchError;
use crate::extract::rules::patterns::URL;
use crate::extract::{InvoicePage, InvoicePageParser, ReceiptParser};
use crate::models::config::{LinkConfig, RcptConfig};
use crate::models::email::InboundEmail;
use crate::models::receipt::ParsedReceipt;

/// Characters trimmed from the end of a link found in running text.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', '!', '?', ')', ']'];

/// Fetches the body of a web page.
pub trait PageFetcher {
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// A fetcher that never fetches.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFetch;

impl PageFetcher for NoFetch {
    async fn fetch(&self, _url: &Url) -> Result<String, FetchError> {
        Err(FetchError::Disabled)
    }
}

/// Find invoice-page links in a message, text first, then raw markup.
///
/// A link qualifies when its host is one of the configured invoice hosts or
/// a subdomain of one, and its path contains the invoice path marker. Duplicates are
/// dropped; order of appearance is kept.
pub fn detect_invoice_links(text: &str, html: &str, config: &LinkConfig) -> Vec<Url> {
    let marker = config.invoice_path_marker.to_lowercase();
    let hosts: Vec<String> = config.invoice_hosts.iter().map(|h| h.to_lowercase()).collect();

    let mut links: Vec<Url> = Vec::new();
    for source in [text, html] {
        for found in URL.find_iter(source) {
            let raw = found.as_str().trim_end_matches(TRAILING_PUNCTUATION);
            let Ok(url) = Url::parse(raw) else {
                debug!(link = raw, "skipping unparsable link");
                continue;
            };
            let Some(host) = url.host_str().map(str::to_lowercase) else {
                continue;
            };

            let known_host = hosts.iter().any(|h| is_same_site(&host, h));
            let invoice_path = url.path().to_lowercase().contains(&marker);
            if known_host && invoice_path && !links.contains(&url) {
                links.push(url);
            }
        }
    }

    links
}

/// `host` equals `site` or ends in `.site`.
fn is_same_site(host: &str, site: &str) -> bool {
    host.strip_suffix(site)
        .is_some_and(|rest| rest.is_empty() || rest.ends_with('.'))
}

/// Resolves invoice links into receipts.
pub struct LinkResolver<'a, F> {
    config: &'a RcptConfig,
    fetcher: &'a F,
}

impl<'a, F: PageFetcher> LinkResolver<'a, F> {
    pub fn new(config: &'a RcptConfig, fetcher: &'a F) -> Self {
        Self { config, fetcher }
    }

    /// Try each invoice link in turn; the first page that parses wins.
    ///
    /// Each fetch is bounded by the configured timeout whatever the fetcher
    /// does. Returns `None` when links are disabled, none are present, or
    /// none could be fetched and parsed.
    pub async fn resolve(
        &self,
        email: &InboundEmail,
        body: &str,
        today: NaiveDate,
    ) -> Option<ParsedReceipt> {
        if !self.config.links.enabled {
            return None;
        }

        let links = detect_invoice_links(body, &email.html, &self.config.links);
        if links.is_empty() {
            return None;
        }

        let timeout = Duration::from_secs(self.config.links.timeout_secs);
        let parser = InvoicePageParser::new(&self.config.extraction);
        let sender = email.sender_address();

        for url in links {
            let html = match tokio::time::timeout(timeout, self.fetcher.fetch(&url)).await {
                Ok(Ok(html)) => html,
                Ok(Err(e)) => {
                    debug!(%url, error = %e, "invoice link fetch failed");
                    continue;
                }
                Err(_) => {
                    debug!(%url, error = %FetchError::Timeout, "invoice link fetch failed");
                    continue;
                }
            };

            match parser.parse_at(&InvoicePage::new(html, sender.as_str()), today) {
                Ok(receipt) => {
                    info!(%url, "resolved invoice link");
                    return Some(receipt);
                }
                Err(e) => debug!(%url, error = %e, "invoice page rejected"),
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const INVOICE_HTML: &str =
        "<title>Kırtasiye Dünyası - e-Arşiv Fatura</title><p>Ödenecek Tutar: 150,00 TL</p><p>Fatura Tarihi: 02.03.2024</p>";

    /// Serves one canned page and counts requests.
    struct FakeFetcher {
        response: Result<String, FetchError>,
        calls: AtomicUsize,
    }

    impl FakeFetcher {
        fn new(response: Result<String, FetchError>) -> Self {
            Self {
                response,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl PageFetcher for FakeFetcher {
        async fn fetch(&self, _url: &Url) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.clone()
        }
    }

    /// Serves a page per URL; unknown URLs are a 404.
    struct RoutedFetcher {
        pages: HashMap<String, Result<String, FetchError>>,
        calls: AtomicUsize,
    }

    impl RoutedFetcher {
        fn new<const N: usize>(routes: [(&str, Result<String, FetchError>); N]) -> Self {
            Self {
                pages: routes
                    .into_iter()
                    .map(|(url, page)| (url.to_string(), page))
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl PageFetcher for RoutedFetcher {
        async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.pages
                .get(url.as_str())
                .cloned()
                .unwrap_or(Err(FetchError::Status(404)))
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_detects_invoice_links() {
        let config = LinkConfig::default();
        let text = "Faturanız: https://portal.efinans.com.tr/EArsiv/goruntule?id=42. Ayrıca https://example.com/earsiv/x";
        let links = detect_invoice_links(text, "", &config);

        assert_eq!(links.len(), 1);
        assert_eq!(
            links[0].as_str(),
            "https://portal.efinans.com.tr/EArsiv/goruntule?id=42"
        );
    }

    #[test]
    fn test_detects_links_in_markup_once() {
        let config = LinkConfig::default();
        let html = r#"<a href="https://x.efinans.com.tr/earsiv/abc">fatura</a>"#;
        let text = "see https://x.efinans.com.tr/earsiv/abc)";
        let links = detect_invoice_links(text, html, &config);

        assert_eq!(links.len(), 1);
        assert_eq!(links[0].path(), "/earsiv/abc");
    }

    #[test]
    fn test_host_must_match_on_label_boundary() {
        let config = LinkConfig::default();
        let text = "https://efinans.com.tr.attacker.example/earsiv/1 \
            https://notefinans.com.tr/earsiv/2 \
            https://efinans.com.tr/earsiv/3";
        let links = detect_invoice_links(text, "", &config);

        assert_eq!(links.len(), 1);
        assert_eq!(links[0].host_str(), Some("efinans.com.tr"));

        assert!(is_same_site("portal.efinans.com.tr", "efinans.com.tr"));
        assert!(!is_same_site("xefinans.com.tr", "efinans.com.tr"));
    }

    #[test]
    fn test_ignores_other_paths_and_junk() {
        let config = LinkConfig::default();
        let text = "https://efinans.com.tr/about https:// http://[bad";
        assert!(detect_invoice_links(text, "", &config).is_empty());
    }

    #[tokio::test]
    async fn test_resolves_first_working_link() {
        let config = RcptConfig::default();
        let fetcher = FakeFetcher::new(Ok(INVOICE_HTML.to_string()));
        let email = InboundEmail::from_pasted_link("https://a.efinans.com.tr/earsiv/1");

        let receipt = LinkResolver::new(&config, &fetcher)
            .resolve(&email, &email.text, date(2024, 6, 1))
            .await
            .unwrap();

        assert_eq!(receipt.store, "Kırtasiye Dünyası");
        assert_eq!(receipt.amount.to_string(), "150.00");
        assert_eq!(receipt.purchase_date, date(2024, 3, 2));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_absorbed() {
        let config = RcptConfig::default();
        let fetcher = FakeFetcher::new(Err(FetchError::Status(404)));
        let text = "https://a.efinans.com.tr/earsiv/1 https://b.efinans.com.tr/earsiv/2";
        let email = InboundEmail::from_pasted_link(text);

        let resolved = LinkResolver::new(&config, &fetcher)
            .resolve(&email, &email.text, date(2024, 6, 1))
            .await;

        assert!(resolved.is_none());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_link_falls_through_to_next() {
        let config = RcptConfig::default();
        let fetcher = RoutedFetcher::new([
            ("https://a.efinans.com.tr/earsiv/1", Err(FetchError::Status(404))),
            ("https://b.efinans.com.tr/earsiv/2", Ok(INVOICE_HTML.to_string())),
        ]);
        let text = "https://a.efinans.com.tr/earsiv/1 https://b.efinans.com.tr/earsiv/2";
        let email = InboundEmail::from_pasted_link(text);

        let receipt = LinkResolver::new(&config, &fetcher)
            .resolve(&email, &email.text, date(2024, 6, 1))
            .await
            .unwrap();

        assert_eq!(receipt.store, "Kırtasiye Dünyası");
        assert_eq!(receipt.purchase_date, date(2024, 3, 2));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_stops_at_first_resolved_link() {
        let config = RcptConfig::default();
        let other = INVOICE_HTML.replace("Kırtasiye Dünyası", "Başka Mağaza");
        let fetcher = RoutedFetcher::new([
            ("https://a.efinans.com.tr/earsiv/1", Ok(INVOICE_HTML.to_string())),
            ("https://b.efinans.com.tr/earsiv/2", Ok(other)),
        ]);
        let text = "https://a.efinans.com.tr/earsiv/1 https://b.efinans.com.tr/earsiv/2";
        let email = InboundEmail::from_pasted_link(text);

        let receipt = LinkResolver::new(&config, &fetcher)
            .resolve(&email, &email.text, date(2024, 6, 1))
            .await
            .unwrap();

        assert_eq!(receipt.store, "Kırtasiye Dünyası");
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_disabled_links_are_not_fetched() {
        let mut config = RcptConfig::default();
        config.links.enabled = false;
        let fetcher = FakeFetcher::new(Ok(INVOICE_HTML.to_string()));
        let email = InboundEmail::from_pasted_link("https://a.efinans.com.tr/earsiv/1");

        let resolved = LinkResolver::new(&config, &fetcher)
            .resolve(&email, &email.text, date(2024, 6, 1))
            .await;

        assert!(resolved.is_none());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_fetch_times_out() {
        struct Hang;
        impl PageFetcher for Hang {
            async fn fetch(&self, _url: &Url) -> Result<String, FetchError> {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(String::new())
            }
        }

        let config = RcptConfig::default();
        let email = InboundEmail::from_pasted_link("https://a.efinans.com.tr/earsiv/1");
        let resolved = LinkResolver::new(&config, &Hang)
            .resolve(&email, &email.text, date(2024, 6, 1))
            .await;

        assert!(resolved.is_none());
    }
}

//! Pagination bookkeeping for Graph collections.
//!
//! Both pagers are pull-based: the driver fetches a page, processes it
//! fully (downloads included), then reports the paging block back via
//! `page_received` before asking for the next position.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::api::types::Paging;
use crate::config::{CollectionKind, Config};
use crate::store::{CursorState, MediaStore};

/// Encode a media ID as the opaque cursor the vendor hands out, so
/// pagination can be entered at an arbitrary point.
pub fn synthetic_cursor(media_id: &str) -> String {
    BASE64.encode(media_id)
}

/// Cursor-driven pagination over one Graph collection.
#[derive(Debug)]
pub struct CursorPager {
    after: Option<String>,
    pages_loaded: u32,
    max_pages: Option<u32>,
    inter_page_delay: Duration,
    complete: bool,
}

impl CursorPager {
    pub fn new(max_pages: Option<u32>, inter_page_delay: Duration) -> Self {
        Self {
            after: None,
            pages_loaded: 0,
            max_pages,
            inter_page_delay,
            complete: false,
        }
    }

    /// Seed a synthetic cursor so the walk starts after a known media ID.
    pub fn start_after(mut self, media_id: &str) -> Self {
        self.after = Some(synthetic_cursor(media_id));
        self
    }

    /// Continue from a persisted resume point.
    pub fn resume(mut self, saved: CursorState) -> Self {
        self.after = Some(saved.cursor);
        self.pages_loaded = saved.pages_loaded;
        self
    }

    /// Cursor for the next fetch.
    pub fn after(&self) -> Option<&str> {
        self.after.as_deref()
    }

    pub fn pages_loaded(&self) -> u32 {
        self.pages_loaded
    }

    /// Whether another page should be requested.
    pub fn should_fetch(&self) -> bool {
        !self.complete && self.max_pages.map_or(true, |max| self.pages_loaded < max)
    }

    /// True once the collection itself reported its end, as opposed to
    /// stopping at the page bound or losing a page to the retry budget.
    pub fn completed(&self) -> bool {
        self.complete
    }

    /// Record a fully processed page and move the cursor forward.
    ///
    /// The vendor includes `cursors.after` even on the final window, so
    /// the continuation signal is the presence of a `next` link.
    pub fn page_received(&mut self, item_count: usize, paging: Option<&Paging>) {
        self.pages_loaded += 1;

        if item_count == 0 {
            self.complete = true;
            self.after = None;
            return;
        }

        match continuation_cursor(paging) {
            Some(cursor) => self.after = Some(cursor),
            None => {
                self.complete = true;
                self.after = None;
            }
        }
    }

    /// Sleep the configured inter-page delay. No-op before the first
    /// page. Additive to the adaptive delay inside the API client.
    pub async fn pace(&self) {
        if self.pages_loaded > 0 && !self.inter_page_delay.is_zero() {
            tokio::time::sleep(self.inter_page_delay).await;
        }
    }
}

/// Link-driven pagination for collections that hand back fully-formed
/// `paging.next` URLs. The feed does; its cursors block is unreliable.
#[derive(Debug)]
pub struct LinkPager {
    next_url: Option<String>,
    pages_loaded: u32,
    max_pages: Option<u32>,
    inter_page_delay: Duration,
    complete: bool,
}

impl LinkPager {
    pub fn new(max_pages: Option<u32>, inter_page_delay: Duration) -> Self {
        Self {
            next_url: None,
            pages_loaded: 0,
            max_pages,
            inter_page_delay,
            complete: false,
        }
    }

    /// Restore the page count from a persisted resume point, so the
    /// page bound does not reset across runs.
    pub fn with_pages_loaded(mut self, pages_loaded: u32) -> Self {
        self.pages_loaded = pages_loaded;
        self
    }

    /// URL of the next page, once a page has reported one.
    pub fn next_link(&self) -> Option<&str> {
        self.next_url.as_deref()
    }

    pub fn pages_loaded(&self) -> u32 {
        self.pages_loaded
    }

    pub fn should_fetch(&self) -> bool {
        !self.complete && self.max_pages.map_or(true, |max| self.pages_loaded < max)
    }

    pub fn completed(&self) -> bool {
        self.complete
    }

    /// Record a fully processed page and capture its next link.
    pub fn page_received(&mut self, item_count: usize, paging: Option<&Paging>) {
        self.pages_loaded += 1;

        if item_count == 0 {
            self.complete = true;
            self.next_url = None;
            return;
        }

        match paging.and_then(|p| p.next.clone()) {
            Some(url) => self.next_url = Some(url),
            None => {
                self.complete = true;
                self.next_url = None;
            }
        }
    }

    /// Cursor value worth persisting for resume, extracted from the
    /// next link. Next links embed the access token, so the raw URL
    /// never goes to disk.
    pub fn persistable_cursor(&self) -> Option<String> {
        let url = url::Url::parse(self.next_url.as_deref()?).ok()?;
        url.query_pairs()
            .find(|(key, _)| key == "after")
            .map(|(_, value)| value.into_owned())
    }

    pub async fn pace(&self) {
        if self.pages_loaded > 0 && !self.inter_page_delay.is_zero() {
            tokio::time::sleep(self.inter_page_delay).await;
        }
    }
}

/// Build a cursor pager honoring `--start-after`, persisted resume
/// state, and the page bound, in that order of precedence.
pub fn seed_pager(
    config: &Config,
    store: &MediaStore,
    owner_id: i64,
    collection: CollectionKind,
) -> CursorPager {
    let delay = Duration::from_millis(config.options.min_request_delay_ms);
    let pager = CursorPager::new(config.options.max_pages, delay);

    if let Some(media_id) = &config.options.start_after {
        tracing::info!("Starting {} after media {}", collection, media_id);
        return pager.start_after(media_id);
    }

    if config.options.resume {
        match store.load_cursor(owner_id, collection.as_key()) {
            Ok(Some(saved)) => {
                tracing::info!("Resuming {} from page {}", collection, saved.pages_loaded + 1);
                return pager.resume(saved);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Failed to load {} cursor: {}", collection, e),
        }
    }

    pager
}

/// Persist a pager position. A store failure costs resumability, not
/// the run.
pub fn persist_position(
    store: &MediaStore,
    owner_id: i64,
    collection: CollectionKind,
    cursor: Option<&str>,
    pages_loaded: u32,
) {
    let Some(cursor) = cursor else {
        return;
    };
    if let Err(e) = store.save_cursor(owner_id, collection.as_key(), cursor, pages_loaded) {
        tracing::warn!("Failed to persist {} cursor: {}", collection, e);
    }
}

/// Drop the persisted position after a completed walk, so the next run
/// re-checks the collection from its head and dedup does the skipping.
pub fn clear_position(store: &MediaStore, owner_id: i64, collection: CollectionKind) {
    if let Err(e) = store.clear_cursor(owner_id, collection.as_key()) {
        tracing::warn!("Failed to clear {} cursor: {}", collection, e);
    }
}

fn continuation_cursor(paging: Option<&Paging>) -> Option<String> {
    let paging = paging?;
    paging.next.as_deref()?;

    if let Some(after) = paging.cursors.as_ref().and_then(|c| c.after.clone()) {
        if !after.is_empty() {
            return Some(after);
        }
    }

    // Some edges omit the cursors block but still carry the link.
    let next = url::Url::parse(paging.next.as_deref()?).ok()?;
    next.query_pairs()
        .find(|(key, _)| key == "after")
        .map(|(_, value)| value.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::Cursors;

    fn paging(after: Option<&str>, next: Option<&str>) -> Paging {
        Paging {
            cursors: after.map(|a| Cursors {
                before: Some("BEFORE".to_string()),
                after: Some(a.to_string()),
            }),
            next: next.map(|n| n.to_string()),
            previous: None,
        }
    }

    #[test]
    fn test_synthetic_cursor_is_base64_of_id() {
        assert_eq!(synthetic_cursor("12345"), "MTIzNDU=");
    }

    #[test]
    fn test_start_after_seeds_cursor() {
        let pager = CursorPager::new(None, Duration::ZERO).start_after("12345");
        assert_eq!(pager.after(), Some("MTIzNDU="));
        assert!(pager.should_fetch());
    }

    #[test]
    fn test_resume_restores_position() {
        let saved = CursorState {
            cursor: "CURSOR".to_string(),
            pages_loaded: 7,
        };
        let pager = CursorPager::new(None, Duration::ZERO).resume(saved);
        assert_eq!(pager.after(), Some("CURSOR"));
        assert_eq!(pager.pages_loaded(), 7);
    }

    #[test]
    fn test_cursor_advances_while_next_link_present() {
        let mut pager = CursorPager::new(None, Duration::ZERO);
        pager.page_received(25, Some(&paging(Some("AAA"), Some("https://g/next?after=AAA"))));
        assert_eq!(pager.after(), Some("AAA"));
        assert!(pager.should_fetch());
        assert!(!pager.completed());
    }

    #[test]
    fn test_missing_next_link_completes_even_with_cursor() {
        // The final window still carries cursors; only the absent next
        // link marks the end.
        let mut pager = CursorPager::new(None, Duration::ZERO);
        pager.page_received(10, Some(&paging(Some("ZZZ"), None)));
        assert!(pager.completed());
        assert!(!pager.should_fetch());
        assert_eq!(pager.after(), None);
    }

    #[test]
    fn test_cursor_parsed_from_next_link_when_cursors_absent() {
        let mut pager = CursorPager::new(None, Duration::ZERO);
        pager.page_received(
            5,
            Some(&paging(None, Some("https://g/me/photos?limit=25&after=QQQ"))),
        );
        assert_eq!(pager.after(), Some("QQQ"));
    }

    #[test]
    fn test_empty_page_completes() {
        let mut pager = CursorPager::new(None, Duration::ZERO);
        pager.page_received(0, Some(&paging(Some("AAA"), Some("https://g/next"))));
        assert!(pager.completed());
    }

    #[test]
    fn test_missing_paging_block_completes() {
        let mut pager = CursorPager::new(None, Duration::ZERO);
        pager.page_received(3, None);
        assert!(pager.completed());
    }

    #[test]
    fn test_page_bound_stops_fetching_without_completing() {
        let mut pager = CursorPager::new(Some(2), Duration::ZERO);
        pager.page_received(25, Some(&paging(Some("A"), Some("https://g/n?after=A"))));
        assert!(pager.should_fetch());
        pager.page_received(25, Some(&paging(Some("B"), Some("https://g/n?after=B"))));
        assert!(!pager.should_fetch());
        assert!(!pager.completed());
        // The position survives for the next run.
        assert_eq!(pager.after(), Some("B"));
    }

    #[test]
    fn test_link_pager_follows_next() {
        let mut pager = LinkPager::new(None, Duration::ZERO);
        assert_eq!(pager.next_link(), None);
        pager.page_received(10, Some(&paging(None, Some("https://g/feed?after=XYZ"))));
        assert_eq!(pager.next_link(), Some("https://g/feed?after=XYZ"));
        pager.page_received(10, Some(&paging(None, None)));
        assert!(pager.completed());
        assert_eq!(pager.next_link(), None);
    }

    #[test]
    fn test_link_pager_persistable_cursor_strips_secrets() {
        let mut pager = LinkPager::new(None, Duration::ZERO);
        pager.page_received(
            10,
            Some(&paging(
                None,
                Some("https://g/feed?access_token=SECRET&limit=25&after=KEEP"),
            )),
        );
        assert_eq!(pager.persistable_cursor().as_deref(), Some("KEEP"));
    }

    #[test]
    fn test_link_pager_without_after_param_persists_nothing() {
        let mut pager = LinkPager::new(None, Duration::ZERO);
        pager.page_received(
            10,
            Some(&paging(None, Some("https://g/feed?until=1234567890"))),
        );
        assert_eq!(pager.persistable_cursor(), None);
    }

    #[test]
    fn test_link_pager_page_bound() {
        let mut pager = LinkPager::new(Some(1), Duration::ZERO).with_pages_loaded(0);
        assert!(pager.should_fetch());
        pager.page_received(10, Some(&paging(None, Some("https://g/feed?after=A"))));
        assert!(!pager.should_fetch());
        assert!(!pager.completed());
    }
}

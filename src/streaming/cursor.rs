//! Bookmark-paginated cursor over `_find` results.
//!
//! The cursor buffers exactly one page. Documents are located and decoded
//! lazily from that page; when it runs dry the next page is requested with the
//! last bookmark the server returned. A page without documents ends the query.

use futures::Stream;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::CouchError;
use crate::streaming::decoder::PageDecoder;
use crate::streaming::page::{PageEnvelope, PageFetcher};
use crate::types::{QueryDescriptor, QueryMeta};
use crate::utils::cancel::CancelHandle;

/// Lifecycle of a [`Cursor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// No page has been loaded yet.
    Unopened,
    /// A page is buffered and more documents may follow.
    Positioned,
    /// The query returned every document or stopped on an error.
    Exhausted,
    /// Released by the caller.
    Closed,
}

/// Lazy iterator over the documents of a paginated query.
///
/// ```rust,no_run
/// # async fn run(mut cursor: couchdb_client::Cursor) -> couchdb_client::Result<()> {
/// while cursor.try_advance().await? {
///     let doc: serde_json::Value = cursor.decode()?;
///     println!("{doc}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Cursor {
    state: CursorState,
    page: Option<PageDecoder>,
    meta: QueryMeta,
    descriptor: QueryDescriptor,
    fetcher: PageFetcher,
    cancel: CancelHandle,
    last_error: Option<CouchError>,
    pages_fetched: usize,
}

impl Cursor {
    /// Build a cursor over the first page of a query.
    ///
    /// `descriptor` is the query that produced `first`; its bookmark is
    /// replaced by the one `first` carries.
    pub fn new(
        first: PageEnvelope,
        descriptor: QueryDescriptor,
        fetcher: PageFetcher,
        cancel: CancelHandle,
    ) -> Result<Self, CouchError> {
        let mut cursor = Self {
            state: CursorState::Unopened,
            page: None,
            meta: QueryMeta::default(),
            descriptor,
            fetcher,
            cancel,
            last_error: None,
            pages_fetched: 1,
        };
        cursor.load_page(first)?;
        Ok(cursor)
    }

    /// Buffer `envelope`, replacing the current page. Returns whether it holds
    /// any document; an empty page exhausts the cursor.
    fn load_page(&mut self, envelope: PageEnvelope) -> Result<bool, CouchError> {
        let PageEnvelope {
            docs,
            bookmark,
            warning,
            execution_stats,
            ..
        } = envelope;

        let decoder = PageDecoder::new(docs)?;
        let documents = decoder.remaining()?;

        debug!(
            endpoint = %self.fetcher.endpoint(),
            %bookmark,
            documents,
            page = self.pages_fetched,
            "buffered query page"
        );

        self.descriptor.bookmark.clone_from(&bookmark);
        self.meta = QueryMeta {
            bookmark,
            documents,
            warning,
            execution_stats,
        };

        if documents == 0 {
            self.page = None;
            self.state = CursorState::Exhausted;
            return Ok(false);
        }
        self.page = Some(decoder);
        self.state = CursorState::Positioned;
        Ok(true)
    }

    fn exhaust(&mut self, err: CouchError) -> CouchError {
        debug!(error = %err, "cursor exhausted by error");
        self.page = None;
        self.state = CursorState::Exhausted;
        self.last_error = Some(err.clone());
        err
    }

    /// Move to the next document, fetching the next page when the buffered
    /// one is used up.
    ///
    /// Returns `Ok(false)` once the query is exhausted. A failed fetch is
    /// returned from the call that hit it, exhausts the cursor and stays
    /// available through [`Cursor::last_error`]; later calls return
    /// `Ok(false)`.
    pub async fn try_advance(&mut self) -> Result<bool, CouchError> {
        match self.state {
            CursorState::Closed => {
                self.last_error = Some(CouchError::CursorClosed);
                return Err(CouchError::CursorClosed);
            }
            CursorState::Exhausted => return Ok(false),
            CursorState::Unopened | CursorState::Positioned => {}
        }

        let Some(page) = self.page.as_mut() else {
            self.state = CursorState::Exhausted;
            return Ok(false);
        };
        match page.advance() {
            Ok(true) => return Ok(true),
            Ok(false) => {}
            Err(err) => return Err(self.exhaust(err)),
        }

        // Release the spent page before waiting on the next one.
        self.page = None;
        let fetched = self
            .fetcher
            .fetch_page(&self.descriptor, &self.cancel)
            .await;
        self.pages_fetched += 1;

        let envelope = match fetched {
            Ok((_, envelope)) => envelope,
            Err(err) => return Err(self.exhaust(err)),
        };
        match self.load_page(envelope) {
            Ok(false) => Ok(false),
            Ok(true) => match self.page.as_mut().map(PageDecoder::advance) {
                Some(Ok(found)) => Ok(found),
                Some(Err(err)) => Err(self.exhaust(err)),
                None => Ok(false),
            },
            Err(err) => Err(self.exhaust(err)),
        }
    }

    /// Like [`Cursor::try_advance`], folding errors into `false`. Check
    /// [`Cursor::last_error`] after the loop to tell exhaustion from failure.
    pub async fn advance(&mut self) -> bool {
        self.try_advance().await.unwrap_or(false)
    }

    /// Deserialize the current document.
    ///
    /// A shape mismatch leaves the cursor where it is, so the same document
    /// can be decoded again into another type.
    pub fn decode<'a, T: Deserialize<'a>>(&'a self) -> Result<T, CouchError> {
        if self.state == CursorState::Closed {
            return Err(CouchError::CursorClosed);
        }
        self.page
            .as_ref()
            .ok_or(CouchError::NoCurrentDocument)?
            .decode()
    }

    /// Raw JSON of the current document.
    pub fn current_raw(&self) -> Option<&str> {
        self.page.as_ref()?.current()
    }

    /// Drain the remaining documents into `out`.
    ///
    /// Stops at the first fetch or decode error; documents decoded before the
    /// error stay in `out`.
    pub async fn all<T: DeserializeOwned>(&mut self, out: &mut Vec<T>) -> Result<(), CouchError> {
        while self.try_advance().await? {
            out.push(self.decode()?);
        }
        Ok(())
    }

    /// Turn the remaining documents into a stream. The stream ends after the
    /// first error.
    pub fn into_stream<T>(mut self) -> impl Stream<Item = Result<T, CouchError>> + Send
    where
        T: DeserializeOwned + Send + 'static,
    {
        async_stream::try_stream! {
            while self.try_advance().await? {
                let doc: T = self.decode()?;
                yield doc;
            }
        }
    }

    /// Metadata of the buffered page.
    pub fn meta(&self) -> &QueryMeta {
        &self.meta
    }

    /// Bookmark to resume this query from the end of the buffered page.
    pub fn bookmark(&self) -> &str {
        &self.meta.bookmark
    }

    /// The error that ended iteration, if any: the failure that exhausted
    /// the cursor, or `CouchError::CursorClosed` once it is advanced after
    /// `close`.
    pub fn last_error(&self) -> Option<&CouchError> {
        self.last_error.as_ref()
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    /// Number of page requests issued, the first one included.
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Handle cancelling this cursor's page fetches.
    pub fn cancel_handle(&self) -> &CancelHandle {
        &self.cancel
    }

    /// Release the buffered page. Every later call except `close` fails with
    /// `CouchError::CursorClosed`.
    pub fn close(&mut self) -> Result<(), CouchError> {
        if self.state != CursorState::Closed {
            debug!(pages = self.pages_fetched, "cursor closed");
        }
        self.page = None;
        self.state = CursorState::Closed;
        Ok(())
    }
}

//! Paginated query streaming
//!
//! - `decoder`: positional walker over one page's raw document array
//! - `page`: the `_find` envelope and the fetcher issuing one page request
//! - `cursor`: the caller-facing iterator stitching pages together

pub mod cursor;
pub mod decoder;
pub mod page;

pub use cursor::{Cursor, CursorState};
pub use decoder::{ArrayPosition, PageDecoder};
pub use page::{PageEnvelope, PageFetcher};

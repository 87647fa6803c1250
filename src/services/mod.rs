mod listing;
mod provider;
mod synopsis;

pub use listing::{parse_listing, INDEX_ROW_SELECTOR};
pub use provider::{Fragment, RenderClient};
pub use synopsis::SynopsisFetcher;

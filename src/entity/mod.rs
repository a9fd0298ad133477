// Per-screen data fetching: record state, pagination/filters, and the fetcher that drives both

pub mod debounce;
pub mod downgrade;
pub mod fetcher;
pub mod pagination;
pub mod source;
pub mod state;

pub use debounce::SearchDebouncer;
pub use downgrade::FilterDowngrade;
pub use fetcher::{EntityData, EntityDataBuilder, EntityView, FetchOutcome};
pub use pagination::{FilterState, PaginationState, PaginationStore};
pub use source::{EndpointSource, EntitySource, FnSource};
pub use state::{EntityState, FetchPhase, RequestHandle};

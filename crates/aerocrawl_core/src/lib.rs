//! Aerocrawl core: record model, pagination arithmetic, and the record queue.
mod pagination;
mod queue;
mod record;

pub use pagination::{expand_page_refs, page_ordinal, PAGE_SEGMENT};
pub use queue::{record_channel, CompletionFlag, PublishError, RecordDrain, RecordQueue};
pub use record::{Category, Coordinates, DetailFields, PageRef, Record, RecordStub};

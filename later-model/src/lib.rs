//! Shared task data model for Later.

pub mod codec;
pub mod day;
pub mod record;
pub mod task;

pub use codec::{CodecError, DecodedBook, decode_book, encode_book};
pub use day::{DayKey, DayMarker, InvalidDayKey};
pub use record::RawTaskRecord;
pub use task::{
    DraftError, LOCAL_ID_PREFIX, MAX_TASK_TITLE_LENGTH, Task, TaskBook, TaskDraft, TaskId,
    TaskPatch, UserId,
};

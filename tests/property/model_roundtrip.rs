//! Property-based tests for the task model and cache codec.
//!
//! Uses proptest to verify:
//! 1. Any well-formed task book survives encode → decode → validate.
//! 2. Day keys round-trip through their string form.
//! 3. Arbitrary raw records never panic validation (repair or reject only).
//! 4. Arbitrary strings never panic the blob decoder.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use proptest::prelude::*;

use later_model::{DayKey, RawTaskRecord, Task, TaskBook, TaskId, UserId};

// --- Strategies for model types ---

/// Strategy for valid day keys (day capped at 28 so every month works).
fn arb_day() -> impl Strategy<Value = DayKey> {
    (2000i32..2100, 1u32..=12, 1u32..=28).prop_map(|(y, m, d)| {
        DayKey::new(NaiveDate::from_ymd_opt(y, m, d).expect("valid date"))
    })
}

/// Strategy for optional wall-clock times.
fn arb_time() -> impl Strategy<Value = Option<NaiveTime>> {
    prop::option::of(
        (0u32..24, 0u32..60)
            .prop_map(|(h, m)| NaiveTime::from_hms_opt(h, m, 0).expect("valid time")),
    )
}

/// Strategy for UTC timestamps with sub-second precision.
fn arb_timestamp() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..=4_000_000_000, 0u32..1_000_000_000)
        .prop_map(|(secs, nanos)| DateTime::from_timestamp(secs, nanos).expect("valid timestamp"))
}

/// Strategy for titles that survive validation (start with a letter).
fn arb_title() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9 ]{0,62}"
}

/// Strategy for whole tasks.
fn arb_task() -> impl Strategy<Value = Task> {
    (
        "[a-z0-9-]{1,32}",
        arb_title(),
        ".{0,64}",
        arb_time(),
        any::<bool>(),
        prop::option::of("[a-z0-9]{1,16}"),
        arb_timestamp(),
        arb_timestamp(),
    )
        .prop_map(
            |(id, title, description, time, completed, user, created_at, updated_at)| Task {
                id: TaskId::confirmed(id),
                title,
                description,
                time,
                completed,
                user: user.map(UserId::new),
                created_at,
                updated_at,
            },
        )
}

/// Strategy for task books with up to 6 days of up to 4 tasks each.
fn arb_book() -> impl Strategy<Value = TaskBook> {
    prop::collection::hash_map(arb_day(), prop::collection::vec(arb_task(), 1..4), 0..6)
}

/// Strategy for arbitrary (possibly nonsensical) raw records.
fn arb_raw_record() -> impl Strategy<Value = RawTaskRecord> {
    (
        prop::option::of(".{0,16}"),
        prop::option::of(".{0,16}"),
        prop::option::of(".{0,16}"),
        prop::option::of(".{0,16}"),
        prop::option::of(".{0,16}"),
        prop::option::of(any::<bool>()),
        prop::option::of(".{0,16}"),
    )
        .prop_map(
            |(id, title, description, date, time, completed, user_id)| RawTaskRecord {
                id,
                title,
                description,
                date,
                time,
                completed,
                user_id,
                created_at: None,
                updated_at: None,
            },
        )
}

// --- Property tests ---

proptest! {
    /// Any well-formed book survives the cache round-trip without loss.
    #[test]
    fn book_round_trip_is_lossless(book in arb_book()) {
        let blob = later_model::encode_book(&book).expect("encode should succeed");
        let (back, skipped) = later_model::decode_book(&blob)
            .expect("decode should succeed")
            .into_tasks();
        prop_assert_eq!(skipped, 0);
        prop_assert_eq!(back, book);
    }

    /// Day keys round-trip through their ISO string form.
    #[test]
    fn day_key_string_round_trip(day in arb_day()) {
        let parsed = DayKey::parse(&day.to_string()).expect("parse should succeed");
        prop_assert_eq!(parsed, day);
    }

    /// Validation repairs or rejects, but never panics.
    #[test]
    fn validation_never_panics(record in arb_raw_record(), fallback in arb_day()) {
        let validated = record.validate(fallback);
        if let Some((_, task)) = validated {
            // Anything that survives validation has a usable title and id.
            prop_assert!(!task.title.trim().is_empty());
            prop_assert!(!task.id.as_str().is_empty());
        }
    }

    /// The blob decoder handles arbitrary input without panicking.
    #[test]
    fn decoder_never_panics(blob in ".{0,256}") {
        let _ = later_model::decode_book(&blob);
    }
}

//! Database layout.
//!
//! * `tracked`: name → external id.  The reserved name `prev` holds the
//!   previous-focus slot.
//! * `state`: external id → visibility code (`0` errored, `1` visible,
//!   `2` not visible).
//! * `recency`: name → score, higher is more recent.

pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS tracked (
    name TEXT PRIMARY KEY NOT NULL,
    id TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS state (
    id TEXT PRIMARY KEY NOT NULL,
    visibility INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS recency (
    name TEXT PRIMARY KEY NOT NULL,
    score INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_recency_score ON recency(score);
"#;

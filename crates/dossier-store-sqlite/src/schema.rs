//! SQL schema for the Dossier SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per distinct byte content.
CREATE TABLE IF NOT EXISTS documents (
    fingerprint TEXT PRIMARY KEY,   -- hex SHA-256 of the raw bytes
    path        TEXT NOT NULL,
    text        TEXT NOT NULL,      -- normalised at ingestion
    category    TEXT,
    source      TEXT,
    ingested_at TEXT NOT NULL,      -- ISO 8601 UTC; server-assigned
    status      TEXT NOT NULL DEFAULT 'unanalyzed',  -- 'unanalyzed' | 'analyzed'
    analyzed_at TEXT
);

CREATE TABLE IF NOT EXISTS entities (
    entity_id       TEXT PRIMARY KEY,
    name            TEXT NOT NULL,
    normalized_name TEXT NOT NULL,
    kind            TEXT NOT NULL,
    occurrences     INTEGER NOT NULL DEFAULT 1,
    first_seen      TEXT REFERENCES documents(fingerprint),
    created_at      TEXT NOT NULL,
    UNIQUE (normalized_name, kind)
);

-- An unordered entity pair seen in one document, stored smaller id first.
CREATE TABLE IF NOT EXISTS cooccurrences (
    entity_a    TEXT NOT NULL REFERENCES entities(entity_id),
    entity_b    TEXT NOT NULL REFERENCES entities(entity_id),
    fingerprint TEXT NOT NULL REFERENCES documents(fingerprint),
    PRIMARY KEY (entity_a, entity_b, fingerprint),
    CHECK (entity_a < entity_b)
);

-- Findings are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS findings (
    finding_id    TEXT PRIMARY KEY,
    kind          TEXT NOT NULL,   -- 'bridge_entity' | 'benfords_violation' | 'silence_interval'
    severity      TEXT NOT NULL,
    entity_id     TEXT REFERENCES entities(entity_id),
    fingerprint   TEXT REFERENCES documents(fingerprint),
    description   TEXT NOT NULL,
    metadata_json TEXT NOT NULL DEFAULT 'null',
    detected_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS documents_status_idx    ON documents(status);
CREATE INDEX IF NOT EXISTS cooccurrences_fp_idx    ON cooccurrences(fingerprint);
CREATE INDEX IF NOT EXISTS findings_kind_idx       ON findings(kind);

PRAGMA user_version = 1;
";

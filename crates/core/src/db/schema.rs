// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQL schema and the default taxonomy seed.

/// Highest schema version this build reads and writes.
pub const CURRENT_SCHEMA_VERSION: i64 = 7;

/// Current-shape schema. Every statement is idempotent so the batch can run
/// on every open; files written by older builds keep their old table shapes
/// and are upgraded by the migration chain instead.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS patches (
    synth TEXT NOT NULL,
    md5 TEXT NOT NULL,
    name TEXT,
    type INTEGER,
    data BLOB,
    favorite INTEGER,
    hidden INTEGER,
    sourceID TEXT,
    sourceName TEXT,
    sourceInfo TEXT,
    midiBankNo INTEGER,
    midiProgramNo INTEGER,
    categories INTEGER,
    categoryUserDecision INTEGER,
    UNIQUE (synth, md5)
);

CREATE TABLE IF NOT EXISTS imports (
    synth TEXT NOT NULL,
    name TEXT,
    id TEXT NOT NULL,
    date TEXT
);

CREATE TABLE IF NOT EXISTS categories (
    bitIndex INTEGER UNIQUE,
    name TEXT,
    color TEXT,
    active INTEGER
);

CREATE TABLE IF NOT EXISTS schema_version (
    number INTEGER
);

CREATE TABLE IF NOT EXISTS lists (
    id TEXT UNIQUE NOT NULL,
    name TEXT
);

CREATE TABLE IF NOT EXISTS patch_in_list (
    id TEXT,
    synth TEXT,
    md5 TEXT,
    order_num INTEGER NOT NULL,
    FOREIGN KEY (id) REFERENCES lists(id)
);

CREATE INDEX IF NOT EXISTS idx_patches_source ON patches(synth, sourceID);
CREATE INDEX IF NOT EXISTS idx_imports_synth_id ON imports(synth, id);
CREATE INDEX IF NOT EXISTS idx_patch_in_list_id ON patch_in_list(id, order_num);
"#;

/// Taxonomy seeded into a fresh database: `(bit index, name, color)`.
pub const DEFAULT_CATEGORIES: &[(i64, &str, &str)] = &[
    (0, "Lead", "#8dd3c7"),
    (1, "Pad", "#ffffb3"),
    (2, "Brass", "#4a75b2"),
    (3, "Organ", "#fb8072"),
    (4, "Keys", "#80b1d3"),
    (5, "Bass", "#fdb462"),
    (6, "Arp", "#b3de69"),
    (7, "Pluck", "#fccde5"),
    (8, "Drone", "#d9d9d9"),
    (9, "Drum", "#bc80bd"),
    (10, "Bell", "#ccebc5"),
    (11, "SFX", "#ffed6f"),
    (12, "Ambient", "#869cab"),
    (13, "Wind", "#317469"),
    (14, "Voice", "#a75781"),
];

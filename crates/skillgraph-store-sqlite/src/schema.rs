//! SQL schema for the skillgraph SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS competencies (
    competency_id    TEXT PRIMARY KEY,
    name             TEXT NOT NULL,
    normalized_name  TEXT NOT NULL UNIQUE,   -- find-or-create key
    description      TEXT,
    legacy_parent_id TEXT REFERENCES competencies(competency_id) ON DELETE SET NULL,
    source           TEXT NOT NULL DEFAULT 'manual',
    created_at       TEXT NOT NULL
);

-- Alternative spellings that resolve to an existing competency.
CREATE TABLE IF NOT EXISTS competency_aliases (
    alias         TEXT PRIMARY KEY,          -- normalised
    competency_id TEXT NOT NULL REFERENCES competencies(competency_id) ON DELETE CASCADE,
    created_at    TEXT NOT NULL
);

-- Authoritative N-ary competency hierarchy.
CREATE TABLE IF NOT EXISTS competency_subcompetencies (
    parent_id  TEXT NOT NULL REFERENCES competencies(competency_id) ON DELETE CASCADE,
    child_id   TEXT NOT NULL REFERENCES competencies(competency_id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,
    PRIMARY KEY (parent_id, child_id),
    CHECK (parent_id != child_id)
);

CREATE TABLE IF NOT EXISTS skills (
    skill_id        TEXT PRIMARY KEY,
    name            TEXT NOT NULL,
    normalized_name TEXT NOT NULL UNIQUE,
    description     TEXT,
    parent_skill_id TEXT REFERENCES skills(skill_id) ON DELETE SET NULL,
    created_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS skill_subskills (
    parent_skill_id TEXT NOT NULL REFERENCES skills(skill_id) ON DELETE CASCADE,
    child_skill_id  TEXT NOT NULL REFERENCES skills(skill_id) ON DELETE CASCADE,
    created_at      TEXT NOT NULL,
    PRIMARY KEY (parent_skill_id, child_skill_id),
    CHECK (parent_skill_id != child_skill_id)
);

-- Entry points from a competency into skill subtrees.
CREATE TABLE IF NOT EXISTS competency_skills (
    competency_id TEXT NOT NULL REFERENCES competencies(competency_id) ON DELETE CASCADE,
    skill_id      TEXT NOT NULL REFERENCES skills(skill_id) ON DELETE CASCADE,
    created_at    TEXT NOT NULL,
    PRIMARY KEY (competency_id, skill_id)
);

CREATE TABLE IF NOT EXISTS user_competencies (
    user_id            TEXT NOT NULL,
    competency_id      TEXT NOT NULL REFERENCES competencies(competency_id) ON DELETE CASCADE,
    coverage           REAL NOT NULL DEFAULT 0,
    proficiency        TEXT NOT NULL DEFAULT 'BEGINNER',
    required_mgs_count INTEGER NOT NULL DEFAULT 0,
    verified_mgs_count INTEGER NOT NULL DEFAULT 0,
    verified_skills    TEXT NOT NULL DEFAULT '[]',   -- JSON array of evidence
    updated_at         TEXT NOT NULL,
    PRIMARY KEY (user_id, competency_id)
);

CREATE TABLE IF NOT EXISTS career_paths (
    user_id       TEXT NOT NULL,
    competency_id TEXT NOT NULL REFERENCES competencies(competency_id) ON DELETE CASCADE,
    created_at    TEXT NOT NULL,
    PRIMARY KEY (user_id, competency_id)
);

CREATE INDEX IF NOT EXISTS subcompetencies_child_idx ON competency_subcompetencies(child_id);
CREATE INDEX IF NOT EXISTS subskills_child_idx       ON skill_subskills(child_skill_id);
CREATE INDEX IF NOT EXISTS aliases_competency_idx    ON competency_aliases(competency_id);

PRAGMA user_version = 1;
";

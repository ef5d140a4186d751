//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Evidence lists are stored as
//! compact JSON. UUIDs are stored as hyphenated lowercase strings. Closed enums
//! are stored as their strum string form.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use skillgraph_core::{
  taxonomy::{Competency, CompetencySource, CompetencySubcompetencyLink, Skill},
  user::{CareerPathEntry, ProficiencyLevel, SkillEvidence, UserCompetency},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

fn decode_opt_uuid(s: Option<&str>) -> Result<Option<Uuid>> {
  s.map(decode_uuid).transpose()
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn decode_source(s: &str) -> Result<CompetencySource> {
  CompetencySource::from_str(s)
    .map_err(|_| skillgraph_core::Error::UnknownSource(s.to_owned()).into())
}

pub fn decode_proficiency(s: &str) -> Result<ProficiencyLevel> {
  ProficiencyLevel::from_str(s)
    .map_err(|_| skillgraph_core::Error::UnknownProficiency(s.to_owned()).into())
}

// ─── Evidence ────────────────────────────────────────────────────────────────

pub fn encode_evidence(evidence: &[SkillEvidence]) -> Result<String> {
  Ok(serde_json::to_string(evidence)?)
}

pub fn decode_evidence(s: &str) -> Result<Vec<SkillEvidence>> {
  Ok(serde_json::from_str(s)?)
}

// ─── LIKE patterns ───────────────────────────────────────────────────────────

/// Wrap `fragment` in `%…%`, escaping LIKE metacharacters with `\`.
pub fn like_pattern(fragment: &str) -> String {
  let mut out = String::with_capacity(fragment.len() + 2);
  out.push('%');
  for c in fragment.chars() {
    if matches!(c, '%' | '_' | '\\') {
      out.push('\\');
    }
    out.push(c);
  }
  out.push('%');
  out
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawCompetency::from_row`]; table alias `c`.
pub const COMPETENCY_COLUMNS: &str = "c.competency_id, c.name, c.normalized_name, \
   c.description, c.legacy_parent_id, c.source, c.created_at";

/// Raw strings read directly from a `competencies` row.
pub struct RawCompetency {
  pub competency_id:    String,
  pub name:             String,
  pub normalized_name:  String,
  pub description:      Option<String>,
  pub legacy_parent_id: Option<String>,
  pub source:           String,
  pub created_at:       String,
}

impl RawCompetency {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      competency_id:    row.get(0)?,
      name:             row.get(1)?,
      normalized_name:  row.get(2)?,
      description:      row.get(3)?,
      legacy_parent_id: row.get(4)?,
      source:           row.get(5)?,
      created_at:       row.get(6)?,
    })
  }

  pub fn into_competency(self) -> Result<Competency> {
    Ok(Competency {
      competency_id:    decode_uuid(&self.competency_id)?,
      name:             self.name,
      normalized_name:  self.normalized_name,
      description:      self.description,
      legacy_parent_id: decode_opt_uuid(self.legacy_parent_id.as_deref())?,
      source:           decode_source(&self.source)?,
      created_at:       decode_dt(&self.created_at)?,
    })
  }
}

/// Column list matching [`RawSkill::from_row`]; table alias `s`.
pub const SKILL_COLUMNS: &str =
  "s.skill_id, s.name, s.normalized_name, s.description, s.parent_skill_id, s.created_at";

/// Raw strings read directly from a `skills` row.
pub struct RawSkill {
  pub skill_id:        String,
  pub name:            String,
  pub normalized_name: String,
  pub description:     Option<String>,
  pub parent_skill_id: Option<String>,
  pub created_at:      String,
}

impl RawSkill {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      skill_id:        row.get(0)?,
      name:            row.get(1)?,
      normalized_name: row.get(2)?,
      description:     row.get(3)?,
      parent_skill_id: row.get(4)?,
      created_at:      row.get(5)?,
    })
  }

  pub fn into_skill(self) -> Result<Skill> {
    Ok(Skill {
      skill_id:        decode_uuid(&self.skill_id)?,
      name:            self.name,
      normalized_name: self.normalized_name,
      description:     self.description,
      parent_skill_id: decode_opt_uuid(self.parent_skill_id.as_deref())?,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}

/// Column list matching [`RawUserCompetency::from_row`]; table alias `u`.
pub const USER_COMPETENCY_COLUMNS: &str = "u.user_id, u.competency_id, u.coverage, \
   u.proficiency, u.required_mgs_count, u.verified_mgs_count, u.verified_skills, \
   u.updated_at";

/// Raw values read directly from a `user_competencies` row.
pub struct RawUserCompetency {
  pub user_id:            String,
  pub competency_id:      String,
  pub coverage:           f64,
  pub proficiency:        String,
  pub required_mgs_count: u32,
  pub verified_mgs_count: u32,
  pub verified_skills:    String,
  pub updated_at:         String,
}

impl RawUserCompetency {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:            row.get(0)?,
      competency_id:      row.get(1)?,
      coverage:           row.get(2)?,
      proficiency:        row.get(3)?,
      required_mgs_count: row.get(4)?,
      verified_mgs_count: row.get(5)?,
      verified_skills:    row.get(6)?,
      updated_at:         row.get(7)?,
    })
  }

  pub fn into_user_competency(self) -> Result<UserCompetency> {
    Ok(UserCompetency {
      user_id:            decode_uuid(&self.user_id)?,
      competency_id:      decode_uuid(&self.competency_id)?,
      coverage:           self.coverage,
      proficiency:        decode_proficiency(&self.proficiency)?,
      required_mgs_count: self.required_mgs_count,
      verified_mgs_count: self.verified_mgs_count,
      verified_skills:    decode_evidence(&self.verified_skills)?,
      updated_at:         decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read from a `career_paths` row.
pub struct RawCareerPath {
  pub user_id:       String,
  pub competency_id: String,
  pub created_at:    String,
}

impl RawCareerPath {
  pub fn into_entry(self) -> Result<CareerPathEntry> {
    Ok(CareerPathEntry {
      user_id:       decode_uuid(&self.user_id)?,
      competency_id: decode_uuid(&self.competency_id)?,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read from a `competency_subcompetencies` row.
pub struct RawSubcompetencyLink {
  pub parent_id:  String,
  pub child_id:   String,
  pub created_at: String,
}

impl RawSubcompetencyLink {
  pub fn into_link(self) -> Result<CompetencySubcompetencyLink> {
    Ok(CompetencySubcompetencyLink {
      parent_id:  decode_uuid(&self.parent_id)?,
      child_id:   decode_uuid(&self.child_id)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

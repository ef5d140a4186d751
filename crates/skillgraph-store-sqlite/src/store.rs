//! [`SqliteStore`]: the SQLite implementation of [`TaxonomyStore`].

use std::{collections::HashSet, path::Path};

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use skillgraph_core::{
  name::{compact_name, normalize_name},
  store::TaxonomyStore,
  taxonomy::{
    Competency, CompetencySubcompetencyLink, LinkOutcome, NewCompetency, NewSkill,
    Skill,
  },
  user::{CareerPathEntry, SkillEvidence, UserCompetency},
};

use crate::{
  Error, Result,
  encode::{
    COMPETENCY_COLUMNS, RawCareerPath, RawCompetency, RawSkill, RawSubcompetencyLink,
    RawUserCompetency, SKILL_COLUMNS, USER_COMPETENCY_COLUMNS, encode_dt, encode_evidence,
    encode_uuid, like_pattern,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A taxonomy store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a `SELECT {COMPETENCY_COLUMNS} …` statement with text parameters.
  async fn query_competencies(
    &self,
    sql: String,
    params: Vec<String>,
  ) -> Result<Vec<Competency>> {
    let raws: Vec<RawCompetency> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), RawCompetency::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCompetency::into_competency).collect()
  }

  /// Run a `SELECT {SKILL_COLUMNS} …` statement with text parameters.
  async fn query_skills(&self, sql: String, params: Vec<String>) -> Result<Vec<Skill>> {
    let raws: Vec<RawSkill> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), RawSkill::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSkill::into_skill).collect()
  }

  /// Execute a single write statement and report whether it touched a row.
  async fn execute_changed(&self, sql: &'static str, params: Vec<String>) -> Result<bool> {
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(sql, rusqlite::params_from_iter(params.iter()))?)
      })
      .await?;
    Ok(changed > 0)
  }
}

// ─── TaxonomyStore impl ──────────────────────────────────────────────────────

impl TaxonomyStore for SqliteStore {
  type Error = Error;

  // ── Competencies ──────────────────────────────────────────────────────────

  async fn find_or_create_competency(
    &self,
    input: NewCompetency,
  ) -> Result<(Competency, bool)> {
    let normalized  = input.normalized_name();
    let id_str      = encode_uuid(Uuid::new_v4());
    let name        = input.name.trim().to_owned();
    let description = input.description;
    let source_str  = input.source.to_string();
    let at_str      = encode_dt(Utc::now());

    let (raw, inserted) = self
      .conn
      .call(move |conn| {
        let inserted = conn.execute(
          "INSERT INTO competencies
             (competency_id, name, normalized_name, description, source, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT (normalized_name) DO NOTHING",
          rusqlite::params![id_str, name, normalized, description, source_str, at_str],
        )? > 0;

        let raw = conn.query_row(
          &format!(
            "SELECT {COMPETENCY_COLUMNS} FROM competencies c WHERE c.normalized_name = ?1"
          ),
          rusqlite::params![normalized],
          RawCompetency::from_row,
        )?;
        Ok((raw, inserted))
      })
      .await?;

    Ok((raw.into_competency()?, inserted))
  }

  async fn get_competency(&self, id: Uuid) -> Result<Option<Competency>> {
    let found = self
      .query_competencies(
        format!("SELECT {COMPETENCY_COLUMNS} FROM competencies c WHERE c.competency_id = ?1"),
        vec![encode_uuid(id)],
      )
      .await?;
    Ok(found.into_iter().next())
  }

  async fn find_competency_by_name(&self, name: &str) -> Result<Option<Competency>> {
    let found = self
      .query_competencies(
        format!("SELECT {COMPETENCY_COLUMNS} FROM competencies c WHERE c.normalized_name = ?1"),
        vec![normalize_name(name)],
      )
      .await?;
    Ok(found.into_iter().next())
  }

  async fn find_competency_by_alias(&self, alias: &str) -> Result<Option<Competency>> {
    let found = self
      .query_competencies(
        format!(
          "SELECT {COMPETENCY_COLUMNS}
           FROM competency_aliases a
           JOIN competencies c ON c.competency_id = a.competency_id
           WHERE a.alias = ?1"
        ),
        vec![normalize_name(alias)],
      )
      .await?;
    Ok(found.into_iter().next())
  }

  async fn find_competencies_like(
    &self,
    fragment: &str,
    limit: usize,
  ) -> Result<Vec<Competency>> {
    self
      .query_competencies(
        format!(
          "SELECT {COMPETENCY_COLUMNS}
           FROM competencies c
           WHERE c.normalized_name LIKE ?1 ESCAPE '\\'
           ORDER BY length(c.normalized_name), c.normalized_name
           LIMIT {limit}"
        ),
        vec![like_pattern(&normalize_name(fragment))],
      )
      .await
  }

  async fn find_competencies_within(
    &self,
    name: &str,
    limit: usize,
  ) -> Result<Vec<Competency>> {
    let compact = compact_name(name);
    if compact.is_empty() {
      return Ok(Vec::new());
    }
    self
      .query_competencies(
        format!(
          "SELECT {COMPETENCY_COLUMNS}
           FROM competencies c
           WHERE c.normalized_name <> ''
             AND instr(?1, replace(c.normalized_name, ' ', '')) > 0
           ORDER BY length(c.normalized_name) DESC, c.normalized_name
           LIMIT {limit}"
        ),
        vec![compact],
      )
      .await
  }

  async fn list_competencies(&self) -> Result<Vec<Competency>> {
    self
      .query_competencies(
        format!("SELECT {COMPETENCY_COLUMNS} FROM competencies c ORDER BY c.normalized_name"),
        Vec::new(),
      )
      .await
  }

  async fn update_competency(&self, competency: &Competency) -> Result<()> {
    let id_str      = encode_uuid(competency.competency_id);
    let description = competency.description.clone();
    let parent_str  = competency.legacy_parent_id.map(encode_uuid);
    let source_str  = competency.source.to_string();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE competencies
           SET description = ?2, legacy_parent_id = ?3, source = ?4
           WHERE competency_id = ?1",
          rusqlite::params![id_str, description, parent_str, source_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::CompetencyNotFound(competency.competency_id));
    }
    Ok(())
  }

  async fn delete_competency(&self, id: Uuid) -> Result<bool> {
    self
      .execute_changed(
        "DELETE FROM competencies WHERE competency_id = ?1",
        vec![encode_uuid(id)],
      )
      .await
  }

  async fn add_competency_alias(&self, competency_id: Uuid, alias: &str) -> Result<bool> {
    self
      .execute_changed(
        "INSERT INTO competency_aliases (alias, competency_id, created_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT (alias) DO NOTHING",
        vec![normalize_name(alias), encode_uuid(competency_id), encode_dt(Utc::now())],
      )
      .await
  }

  async fn list_competency_aliases(&self, competency_id: Uuid) -> Result<Vec<String>> {
    let id_str = encode_uuid(competency_id);
    let aliases = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT alias FROM competency_aliases WHERE competency_id = ?1 ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(aliases)
  }

  // ── Competency hierarchy ──────────────────────────────────────────────────

  async fn find_children(&self, parent_id: Uuid) -> Result<Vec<Competency>> {
    self
      .query_competencies(
        format!(
          "SELECT {COMPETENCY_COLUMNS}
           FROM competency_subcompetencies l
           JOIN competencies c ON c.competency_id = l.child_id
           WHERE l.parent_id = ?1
           ORDER BY l.rowid"
        ),
        vec![encode_uuid(parent_id)],
      )
      .await
  }

  async fn get_parent_competencies(&self, child_id: Uuid) -> Result<Vec<Competency>> {
    self
      .query_competencies(
        format!(
          "SELECT {COMPETENCY_COLUMNS}
           FROM competency_subcompetencies l
           JOIN competencies c ON c.competency_id = l.parent_id
           WHERE l.child_id = ?1
           ORDER BY l.rowid"
        ),
        vec![encode_uuid(child_id)],
      )
      .await
  }

  async fn get_subcompetency_links(
    &self,
    parent_id: Uuid,
  ) -> Result<Vec<CompetencySubcompetencyLink>> {
    let id_str = encode_uuid(parent_id);
    let raws: Vec<RawSubcompetencyLink> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT parent_id, child_id, created_at
           FROM competency_subcompetencies
           WHERE parent_id = ?1
           ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawSubcompetencyLink {
              parent_id:  row.get(0)?,
              child_id:   row.get(1)?,
              created_at: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubcompetencyLink::into_link).collect()
  }

  async fn link_subcompetency(&self, parent_id: Uuid, child_id: Uuid) -> Result<LinkOutcome> {
    let inserted = self
      .execute_changed(
        "INSERT INTO competency_subcompetencies (parent_id, child_id, created_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT (parent_id, child_id) DO NOTHING",
        vec![encode_uuid(parent_id), encode_uuid(child_id), encode_dt(Utc::now())],
      )
      .await?;
    Ok(LinkOutcome::from_inserted(inserted))
  }

  async fn unlink_subcompetency(&self, parent_id: Uuid, child_id: Uuid) -> Result<bool> {
    self
      .execute_changed(
        "DELETE FROM competency_subcompetencies WHERE parent_id = ?1 AND child_id = ?2",
        vec![encode_uuid(parent_id), encode_uuid(child_id)],
      )
      .await
  }

  // ── Skills ────────────────────────────────────────────────────────────────

  async fn find_or_create_skill(&self, input: NewSkill) -> Result<(Skill, bool)> {
    let normalized  = input.normalized_name();
    let id_str      = encode_uuid(Uuid::new_v4());
    let name        = input.name.trim().to_owned();
    let description = input.description;
    let parent_str  = input.parent_skill_id.map(encode_uuid);
    let at_str      = encode_dt(Utc::now());

    let (raw, inserted) = self
      .conn
      .call(move |conn| {
        let inserted = conn.execute(
          "INSERT INTO skills
             (skill_id, name, normalized_name, description, parent_skill_id, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT (normalized_name) DO NOTHING",
          rusqlite::params![id_str, name, normalized, description, parent_str, at_str],
        )? > 0;

        let raw = conn.query_row(
          &format!("SELECT {SKILL_COLUMNS} FROM skills s WHERE s.normalized_name = ?1"),
          rusqlite::params![normalized],
          RawSkill::from_row,
        )?;
        Ok((raw, inserted))
      })
      .await?;

    Ok((raw.into_skill()?, inserted))
  }

  async fn get_skill(&self, id: Uuid) -> Result<Option<Skill>> {
    let found = self
      .query_skills(
        format!("SELECT {SKILL_COLUMNS} FROM skills s WHERE s.skill_id = ?1"),
        vec![encode_uuid(id)],
      )
      .await?;
    Ok(found.into_iter().next())
  }

  async fn get_skills(&self, ids: &[Uuid]) -> Result<Vec<Skill>> {
    if ids.is_empty() {
      return Ok(Vec::new());
    }
    let placeholders = vec!["?"; ids.len()].join(", ");
    self
      .query_skills(
        format!(
          "SELECT {SKILL_COLUMNS}
           FROM skills s
           WHERE s.skill_id IN ({placeholders})
           ORDER BY s.name, s.skill_id"
        ),
        ids.iter().copied().map(encode_uuid).collect(),
      )
      .await
  }

  async fn find_skill_by_name(&self, name: &str) -> Result<Option<Skill>> {
    let found = self
      .query_skills(
        format!("SELECT {SKILL_COLUMNS} FROM skills s WHERE s.normalized_name = ?1"),
        vec![normalize_name(name)],
      )
      .await?;
    Ok(found.into_iter().next())
  }

  async fn delete_skill(&self, id: Uuid) -> Result<bool> {
    self
      .execute_changed("DELETE FROM skills WHERE skill_id = ?1", vec![encode_uuid(id)])
      .await
  }

  async fn link_subskill(
    &self,
    parent_skill_id: Uuid,
    child_skill_id: Uuid,
  ) -> Result<LinkOutcome> {
    let inserted = self
      .execute_changed(
        "INSERT INTO skill_subskills (parent_skill_id, child_skill_id, created_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT (parent_skill_id, child_skill_id) DO NOTHING",
        vec![
          encode_uuid(parent_skill_id),
          encode_uuid(child_skill_id),
          encode_dt(Utc::now()),
        ],
      )
      .await?;
    Ok(LinkOutcome::from_inserted(inserted))
  }

  async fn get_subskills(&self, parent_skill_id: Uuid) -> Result<Vec<Skill>> {
    self
      .query_skills(
        format!(
          "SELECT {SKILL_COLUMNS}
           FROM skill_subskills l
           JOIN skills s ON s.skill_id = l.child_skill_id
           WHERE l.parent_skill_id = ?1
           ORDER BY l.rowid"
        ),
        vec![encode_uuid(parent_skill_id)],
      )
      .await
  }

  async fn find_skill_parents(&self, child_skill_id: Uuid) -> Result<Vec<Skill>> {
    self
      .query_skills(
        format!(
          "SELECT {SKILL_COLUMNS}
           FROM skill_subskills l
           JOIN skills s ON s.skill_id = l.parent_skill_id
           WHERE l.child_skill_id = ?1
           ORDER BY l.rowid"
        ),
        vec![encode_uuid(child_skill_id)],
      )
      .await
  }

  async fn is_leaf_skill(&self, skill_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(skill_id);
    let leaf = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT EXISTS (SELECT 1 FROM skills WHERE skill_id = ?1)
              AND NOT EXISTS (SELECT 1 FROM skill_subskills WHERE parent_skill_id = ?1)",
          rusqlite::params![id_str],
          |row| row.get::<_, bool>(0),
        )?)
      })
      .await?;
    Ok(leaf)
  }

  // ── Competency ↔ skill ────────────────────────────────────────────────────

  async fn link_skill(&self, competency_id: Uuid, skill_id: Uuid) -> Result<LinkOutcome> {
    let inserted = self
      .execute_changed(
        "INSERT INTO competency_skills (competency_id, skill_id, created_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT (competency_id, skill_id) DO NOTHING",
        vec![encode_uuid(competency_id), encode_uuid(skill_id), encode_dt(Utc::now())],
      )
      .await?;
    Ok(LinkOutcome::from_inserted(inserted))
  }

  async fn unlink_skill(&self, competency_id: Uuid, skill_id: Uuid) -> Result<bool> {
    self
      .execute_changed(
        "DELETE FROM competency_skills WHERE competency_id = ?1 AND skill_id = ?2",
        vec![encode_uuid(competency_id), encode_uuid(skill_id)],
      )
      .await
  }

  async fn get_linked_skills(&self, competency_id: Uuid) -> Result<Vec<Skill>> {
    self
      .query_skills(
        format!(
          "SELECT {SKILL_COLUMNS}
           FROM competency_skills l
           JOIN skills s ON s.skill_id = l.skill_id
           WHERE l.competency_id = ?1
           ORDER BY l.rowid"
        ),
        vec![encode_uuid(competency_id)],
      )
      .await
  }

  // ── User ledger ───────────────────────────────────────────────────────────

  async fn get_user_competency(
    &self,
    user_id: Uuid,
    competency_id: Uuid,
  ) -> Result<Option<UserCompetency>> {
    let user_str = encode_uuid(user_id);
    let comp_str = encode_uuid(competency_id);

    let raw: Option<RawUserCompetency> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {USER_COMPETENCY_COLUMNS}
                 FROM user_competencies u
                 WHERE u.user_id = ?1 AND u.competency_id = ?2"
              ),
              rusqlite::params![user_str, comp_str],
              RawUserCompetency::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUserCompetency::into_user_competency).transpose()
  }

  async fn list_user_competencies(&self, user_id: Uuid) -> Result<Vec<UserCompetency>> {
    let user_str = encode_uuid(user_id);

    let raws: Vec<RawUserCompetency> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {USER_COMPETENCY_COLUMNS}
           FROM user_competencies u
           WHERE u.user_id = ?1
           ORDER BY u.rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![user_str], RawUserCompetency::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(RawUserCompetency::into_user_competency)
      .collect()
  }

  async fn ensure_user_competency(
    &self,
    user_id: Uuid,
    competency_id: Uuid,
  ) -> Result<UserCompetency> {
    let fresh    = UserCompetency::new(user_id, competency_id);
    let user_str = encode_uuid(user_id);
    let comp_str = encode_uuid(competency_id);
    let prof_str = fresh.proficiency.to_string();
    let at_str   = encode_dt(fresh.updated_at);

    let raw: Option<RawUserCompetency> = self
      .conn
      .call(move |conn| {
        let exists: bool = conn.query_row(
          "SELECT EXISTS (SELECT 1 FROM competencies WHERE competency_id = ?1)",
          rusqlite::params![comp_str],
          |row| row.get(0),
        )?;
        if !exists {
          return Ok(None);
        }

        conn.execute(
          "INSERT INTO user_competencies (user_id, competency_id, proficiency, updated_at)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (user_id, competency_id) DO NOTHING",
          rusqlite::params![user_str, comp_str, prof_str, at_str],
        )?;

        let raw = conn.query_row(
          &format!(
            "SELECT {USER_COMPETENCY_COLUMNS}
             FROM user_competencies u
             WHERE u.user_id = ?1 AND u.competency_id = ?2"
          ),
          rusqlite::params![user_str, comp_str],
          RawUserCompetency::from_row,
        )?;
        Ok(Some(raw))
      })
      .await?;

    raw
      .ok_or(Error::CompetencyNotFound(competency_id))?
      .into_user_competency()
  }

  async fn merge_user_evidence(
    &self,
    user_id: Uuid,
    competency_id: Uuid,
    evidence: Vec<SkillEvidence>,
    required: &HashSet<Uuid>,
  ) -> Result<UserCompetency> {
    let fresh    = UserCompetency::new(user_id, competency_id);
    let user_str = encode_uuid(user_id);
    let comp_str = encode_uuid(competency_id);
    let prof_str = fresh.proficiency.to_string();
    let at_str   = encode_dt(fresh.updated_at);
    let required = required.clone();

    let row: Option<UserCompetency> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let exists: bool = tx.query_row(
          "SELECT EXISTS (SELECT 1 FROM competencies WHERE competency_id = ?1)",
          rusqlite::params![comp_str],
          |row| row.get(0),
        )?;
        if !exists {
          return Ok(None);
        }

        tx.execute(
          "INSERT INTO user_competencies (user_id, competency_id, proficiency, updated_at)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (user_id, competency_id) DO NOTHING",
          rusqlite::params![user_str, comp_str, prof_str, at_str],
        )?;
        let raw = tx.query_row(
          &format!(
            "SELECT {USER_COMPETENCY_COLUMNS}
             FROM user_competencies u
             WHERE u.user_id = ?1 AND u.competency_id = ?2"
          ),
          rusqlite::params![user_str, comp_str],
          RawUserCompetency::from_row,
        )?;

        let mut row = raw.into_user_competency().map_err(in_call)?;
        row.merge_evidence(evidence);
        let verified = row.count_verified_in(&required);
        row.apply_counts(required.len(), verified);
        let evidence_str = encode_evidence(&row.verified_skills).map_err(in_call)?;

        tx.execute(
          "UPDATE user_competencies SET
             coverage           = ?3,
             proficiency        = ?4,
             required_mgs_count = ?5,
             verified_mgs_count = ?6,
             verified_skills    = ?7,
             updated_at         = ?8
           WHERE user_id = ?1 AND competency_id = ?2",
          rusqlite::params![
            user_str,
            comp_str,
            row.coverage,
            row.proficiency.to_string(),
            row.required_mgs_count,
            row.verified_mgs_count,
            evidence_str,
            encode_dt(row.updated_at),
          ],
        )?;
        tx.commit()?;
        Ok(Some(row))
      })
      .await?;

    row.ok_or(Error::CompetencyNotFound(competency_id))
  }

  async fn save_user_competency(&self, row: &UserCompetency) -> Result<()> {
    let user_str     = encode_uuid(row.user_id);
    let comp_str     = encode_uuid(row.competency_id);
    let coverage     = row.coverage;
    let prof_str     = row.proficiency.to_string();
    let required     = row.required_mgs_count;
    let verified     = row.verified_mgs_count;
    let evidence_str = encode_evidence(&row.verified_skills)?;
    let at_str       = encode_dt(row.updated_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO user_competencies (
             user_id, competency_id, coverage, proficiency,
             required_mgs_count, verified_mgs_count, verified_skills, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
           ON CONFLICT (user_id, competency_id) DO UPDATE SET
             coverage           = excluded.coverage,
             proficiency        = excluded.proficiency,
             required_mgs_count = excluded.required_mgs_count,
             verified_mgs_count = excluded.verified_mgs_count,
             verified_skills    = excluded.verified_skills,
             updated_at         = excluded.updated_at",
          rusqlite::params![
            user_str,
            comp_str,
            coverage,
            prof_str,
            required,
            verified,
            evidence_str,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Career path ───────────────────────────────────────────────────────────

  async fn add_career_path(&self, user_id: Uuid, competency_id: Uuid) -> Result<bool> {
    self
      .execute_changed(
        "INSERT INTO career_paths (user_id, competency_id, created_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT (user_id, competency_id) DO NOTHING",
        vec![encode_uuid(user_id), encode_uuid(competency_id), encode_dt(Utc::now())],
      )
      .await
  }

  async fn remove_career_path(&self, user_id: Uuid, competency_id: Uuid) -> Result<bool> {
    self
      .execute_changed(
        "DELETE FROM career_paths WHERE user_id = ?1 AND competency_id = ?2",
        vec![encode_uuid(user_id), encode_uuid(competency_id)],
      )
      .await
  }

  async fn list_career_path(&self, user_id: Uuid) -> Result<Vec<CareerPathEntry>> {
    let user_str = encode_uuid(user_id);

    let raws: Vec<RawCareerPath> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT user_id, competency_id, created_at
           FROM career_paths
           WHERE user_id = ?1
           ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![user_str], |row| {
            Ok(RawCareerPath {
              user_id:       row.get(0)?,
              competency_id: row.get(1)?,
              created_at:    row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCareerPath::into_entry).collect()
  }
}

/// Carry a decode error out of a [`tokio_rusqlite::Connection::call`] closure.
fn in_call(e: Error) -> tokio_rusqlite::Error { tokio_rusqlite::Error::Other(Box::new(e)) }

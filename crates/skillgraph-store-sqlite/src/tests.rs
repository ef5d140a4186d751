//! Integration tests for `SqliteStore` against an in-memory database.

use std::collections::HashSet;

use skillgraph_core::{
  store::TaxonomyStore,
  taxonomy::{CompetencySource, LinkOutcome, NewCompetency, NewSkill},
  user::{ProficiencyLevel, SkillEvidence},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn competency(s: &SqliteStore, name: &str) -> Uuid {
  s.find_or_create_competency(NewCompetency::new(name, CompetencySource::Manual))
    .await
    .unwrap()
    .0
    .competency_id
}

async fn skill(s: &SqliteStore, name: &str) -> Uuid {
  s.find_or_create_skill(NewSkill::new(name)).await.unwrap().0.skill_id
}

// ─── Competencies ────────────────────────────────────────────────────────────

#[tokio::test]
async fn find_or_create_competency_is_keyed_on_normalized_name() {
  let s = store().await;

  let (first, created) = s
    .find_or_create_competency(NewCompetency::new("Machine Learning", CompetencySource::Hierarchy))
    .await
    .unwrap();
  assert!(created);
  assert_eq!(first.normalized_name, "machine learning");
  assert_eq!(first.source, CompetencySource::Hierarchy);

  let (second, created) = s
    .find_or_create_competency(NewCompetency::new("machine_learning ", CompetencySource::Manual))
    .await
    .unwrap();
  assert!(!created);
  assert_eq!(second.competency_id, first.competency_id);
  assert_eq!(second.name, "Machine Learning");

  assert_eq!(s.list_competencies().await.unwrap().len(), 1);
}

#[tokio::test]
async fn get_competency_missing_returns_none() {
  let s = store().await;
  assert!(s.get_competency(Uuid::new_v4()).await.unwrap().is_none());
  assert!(s.find_competency_by_name("nothing").await.unwrap().is_none());
}

#[tokio::test]
async fn alias_lookup_and_duplicate_alias() {
  let s = store().await;
  let react = competency(&s, "React").await;

  assert!(s.add_competency_alias(react, "ReactJS").await.unwrap());
  assert!(!s.add_competency_alias(react, "reactjs").await.unwrap());

  let found = s.find_competency_by_alias("REACTJS").await.unwrap().unwrap();
  assert_eq!(found.competency_id, react);
  assert_eq!(s.list_competency_aliases(react).await.unwrap(), vec!["reactjs"]);
}

#[tokio::test]
async fn like_search_escapes_and_orders_by_length() {
  let s = store().await;
  competency(&s, "React Native").await;
  competency(&s, "React").await;
  competency(&s, "Vue").await;

  let hits = s.find_competencies_like("react", 10).await.unwrap();
  let names: Vec<_> = hits.iter().map(|c| c.name.as_str()).collect();
  assert_eq!(names, ["React", "React Native"]);

  assert!(s.find_competencies_like("%", 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn within_search_finds_names_inside_the_input() {
  let s = store().await;
  competency(&s, "Go").await;
  competency(&s, "Web Development").await;
  competency(&s, "Python").await;
  competency(&s, "Rust").await;

  let hits = s.find_competencies_within("Python Web-Development", 10).await.unwrap();
  let names: Vec<_> = hits.iter().map(|c| c.name.as_str()).collect();
  assert_eq!(names, ["Web Development", "Python"]);

  let hits = s.find_competencies_within("golang", 10).await.unwrap();
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0].name, "Go");

  assert!(s.find_competencies_within(" . ", 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn update_competency_persists_legacy_parent() {
  let s = store().await;
  let parent = competency(&s, "Parent").await;
  let child = competency(&s, "Child").await;

  let mut c = s.get_competency(child).await.unwrap().unwrap();
  c.legacy_parent_id = Some(parent);
  c.description = Some("a child".into());
  s.update_competency(&c).await.unwrap();

  let reloaded = s.get_competency(child).await.unwrap().unwrap();
  assert_eq!(reloaded.legacy_parent_id, Some(parent));
  assert_eq!(reloaded.description.as_deref(), Some("a child"));
}

#[tokio::test]
async fn update_missing_competency_errors() {
  let s = store().await;
  let id = competency(&s, "Ghost").await;
  let c = s.get_competency(id).await.unwrap().unwrap();
  s.delete_competency(id).await.unwrap();

  let err = s.update_competency(&c).await.unwrap_err();
  assert!(matches!(err, crate::Error::CompetencyNotFound(missing) if missing == id));
}

// ─── Hierarchy ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn subcompetency_links_are_idempotent() {
  let s = store().await;
  let web = competency(&s, "Web").await;
  let front = competency(&s, "Frontend").await;
  let back = competency(&s, "Backend").await;

  assert_eq!(s.link_subcompetency(web, front).await.unwrap(), LinkOutcome::Created);
  assert_eq!(s.link_subcompetency(web, front).await.unwrap(), LinkOutcome::Existing);
  assert_eq!(s.link_subcompetency(web, back).await.unwrap(), LinkOutcome::Created);

  let children: Vec<_> = s
    .find_children(web)
    .await
    .unwrap()
    .into_iter()
    .map(|c| c.competency_id)
    .collect();
  assert_eq!(children, vec![front, back]);

  let links = s.get_subcompetency_links(web).await.unwrap();
  assert_eq!(links.len(), 2);
  assert!(links.iter().all(|l| l.parent_id == web));

  let parents = s.get_parent_competencies(front).await.unwrap();
  assert_eq!(parents.len(), 1);
  assert_eq!(parents[0].competency_id, web);

  assert!(s.unlink_subcompetency(web, front).await.unwrap());
  assert!(!s.unlink_subcompetency(web, front).await.unwrap());
  assert_eq!(s.find_children(web).await.unwrap().len(), 1);
}

#[tokio::test]
async fn self_link_is_rejected_by_schema() {
  let s = store().await;
  let a = competency(&s, "A").await;
  assert!(s.link_subcompetency(a, a).await.is_err());
}

// ─── Skills ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn skill_tree_leaves_and_parents() {
  let s = store().await;
  let root = skill(&s, "Testing").await;
  let unit = skill(&s, "Unit Testing").await;
  let mocks = skill(&s, "Mocking").await;

  s.link_subskill(root, unit).await.unwrap();
  s.link_subskill(unit, mocks).await.unwrap();

  assert!(!s.is_leaf_skill(root).await.unwrap());
  assert!(!s.is_leaf_skill(unit).await.unwrap());
  assert!(s.is_leaf_skill(mocks).await.unwrap());
  assert!(!s.is_leaf_skill(Uuid::new_v4()).await.unwrap());

  let subs = s.get_subskills(root).await.unwrap();
  assert_eq!(subs.len(), 1);
  assert_eq!(subs[0].skill_id, unit);

  let parents = s.find_skill_parents(mocks).await.unwrap();
  assert_eq!(parents[0].skill_id, unit);
}

#[tokio::test]
async fn find_or_create_skill_converges_on_name() {
  let s = store().await;
  let parent = skill(&s, "Databases").await;

  let (first, created) = s
    .find_or_create_skill(NewSkill::new("SQL Joins").under(parent))
    .await
    .unwrap();
  assert!(created);
  assert_eq!(first.parent_skill_id, Some(parent));

  let (again, created) = s.find_or_create_skill(NewSkill::new("sql-joins")).await.unwrap();
  assert!(!created);
  assert_eq!(again.skill_id, first.skill_id);

  let by_name = s.find_skill_by_name("SQL  joins").await.unwrap().unwrap();
  assert_eq!(by_name.skill_id, first.skill_id);
}

#[tokio::test]
async fn get_skills_hydrates_known_ids_sorted_by_name() {
  let s = store().await;
  let b = skill(&s, "Beta").await;
  let a = skill(&s, "Alpha").await;

  let skills = s.get_skills(&[b, Uuid::new_v4(), a]).await.unwrap();
  let names: Vec<_> = skills.iter().map(|k| k.name.as_str()).collect();
  assert_eq!(names, ["Alpha", "Beta"]);
  assert!(s.get_skills(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn competency_skill_links() {
  let s = store().await;
  let c = competency(&s, "Rust").await;
  let k = skill(&s, "Ownership").await;

  assert!(s.link_skill(c, k).await.unwrap().is_created());
  assert!(!s.link_skill(c, k).await.unwrap().is_created());
  assert_eq!(s.get_linked_skills(c).await.unwrap().len(), 1);

  assert!(s.unlink_skill(c, k).await.unwrap());
  assert!(s.get_linked_skills(c).await.unwrap().is_empty());
}

// ─── User ledger ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn ensure_user_competency_creates_once() {
  let s = store().await;
  let c = competency(&s, "Rust").await;
  let user = Uuid::new_v4();

  let row = s.ensure_user_competency(user, c).await.unwrap();
  assert_eq!(row.coverage, 0.0);
  assert_eq!(row.proficiency, ProficiencyLevel::Beginner);
  assert!(row.verified_skills.is_empty());

  s.ensure_user_competency(user, c).await.unwrap();
  assert_eq!(s.list_user_competencies(user).await.unwrap().len(), 1);
}

#[tokio::test]
async fn ensure_user_competency_for_unknown_competency_errors() {
  let s = store().await;
  let missing = Uuid::new_v4();
  let err = s
    .ensure_user_competency(Uuid::new_v4(), missing)
    .await
    .unwrap_err();
  assert!(matches!(err, crate::Error::CompetencyNotFound(id) if id == missing));
}

#[tokio::test]
async fn concurrent_evidence_merges_keep_both_sides() {
  let s = store().await;
  let c = competency(&s, "Rust").await;
  let borrowing = skill(&s, "Borrowing").await;
  let lifetimes = skill(&s, "Lifetimes").await;
  let user = Uuid::new_v4();
  let required = HashSet::from([borrowing, lifetimes]);

  let (left, right) = tokio::join!(
    s.merge_user_evidence(user, c, vec![SkillEvidence::verified(borrowing, "Borrowing")], &required),
    s.merge_user_evidence(user, c, vec![SkillEvidence::verified(lifetimes, "Lifetimes")], &required),
  );
  left.unwrap();
  right.unwrap();

  let row = s.get_user_competency(user, c).await.unwrap().unwrap();
  assert_eq!(row.verified_skills.len(), 2);
  assert_eq!((row.required_mgs_count, row.verified_mgs_count), (2, 2));
  assert_eq!(row.coverage, 100.0);
  assert_eq!(row.proficiency, ProficiencyLevel::Expert);

  let resubmitted = s
    .merge_user_evidence(user, c, vec![SkillEvidence::verified(borrowing, "Borrowing")], &required)
    .await
    .unwrap();
  assert_eq!(resubmitted.verified_skills.len(), 2);

  let missing = Uuid::new_v4();
  let err = s
    .merge_user_evidence(user, missing, Vec::new(), &required)
    .await
    .unwrap_err();
  assert!(matches!(err, crate::Error::CompetencyNotFound(id) if id == missing));
}

#[tokio::test]
async fn save_user_competency_roundtrip() {
  let s = store().await;
  let c = competency(&s, "Rust").await;
  let k = skill(&s, "Borrowing").await;
  let user = Uuid::new_v4();

  let mut row = s.ensure_user_competency(user, c).await.unwrap();
  row.merge_evidence([SkillEvidence {
    skill_id:   k,
    skill_name: "Borrowing".into(),
    verified:   true,
    score:      Some(91.5),
  }]);
  row.apply_counts(2, 1);
  s.save_user_competency(&row).await.unwrap();

  let reloaded = s.get_user_competency(user, c).await.unwrap().unwrap();
  assert_eq!(reloaded.coverage, 50.0);
  assert_eq!(reloaded.proficiency, ProficiencyLevel::Intermediate);
  assert_eq!(reloaded.required_mgs_count, 2);
  assert_eq!(reloaded.verified_mgs_count, 1);
  assert_eq!(reloaded.verified_skills, row.verified_skills);
}

// ─── Career path ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn career_path_preserves_declaration_order() {
  let s = store().await;
  let user = Uuid::new_v4();
  let a = competency(&s, "A").await;
  let b = competency(&s, "B").await;

  assert!(s.add_career_path(user, b).await.unwrap());
  assert!(s.add_career_path(user, a).await.unwrap());
  assert!(!s.add_career_path(user, a).await.unwrap());

  let ids: Vec<_> = s
    .list_career_path(user)
    .await
    .unwrap()
    .into_iter()
    .map(|e| e.competency_id)
    .collect();
  assert_eq!(ids, vec![b, a]);

  assert!(s.remove_career_path(user, b).await.unwrap());
  assert_eq!(s.list_career_path(user).await.unwrap().len(), 1);
}

// ─── Deletes ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_competency_cascades() {
  let s = store().await;
  let parent = competency(&s, "Parent").await;
  let doomed = competency(&s, "Doomed").await;
  let k = skill(&s, "Something").await;
  let user = Uuid::new_v4();

  s.link_subcompetency(parent, doomed).await.unwrap();
  s.link_skill(doomed, k).await.unwrap();
  s.add_competency_alias(doomed, "doomd").await.unwrap();
  s.ensure_user_competency(user, doomed).await.unwrap();
  s.add_career_path(user, doomed).await.unwrap();

  assert!(s.delete_competency(doomed).await.unwrap());
  assert!(!s.delete_competency(doomed).await.unwrap());

  assert!(s.find_children(parent).await.unwrap().is_empty());
  assert!(s.find_competency_by_alias("doomd").await.unwrap().is_none());
  assert!(s.list_user_competencies(user).await.unwrap().is_empty());
  assert!(s.list_career_path(user).await.unwrap().is_empty());
  // The skill itself survives; only the link goes.
  assert!(s.get_skill(k).await.unwrap().is_some());
}

#[tokio::test]
async fn delete_skill_cascades_links() {
  let s = store().await;
  let c = competency(&s, "C").await;
  let parent = skill(&s, "Parent Skill").await;
  let child = skill(&s, "Child Skill").await;
  s.link_skill(c, parent).await.unwrap();
  s.link_subskill(parent, child).await.unwrap();

  assert!(s.delete_skill(child).await.unwrap());
  assert!(s.is_leaf_skill(parent).await.unwrap());

  assert!(s.delete_skill(parent).await.unwrap());
  assert!(s.get_linked_skills(c).await.unwrap().is_empty());
}

//! Shared fixture for catalog integration tests: a catalog opened on a
//! throwaway sled database plus seed helpers for the common entity graph.

#![allow(dead_code)]

use learning_catalog::{
    Catalog, CatalogConfig, LearningObject, LearningOutcome, StandardOutcome, User,
};
use tempfile::TempDir;

pub struct CatalogFixture {
    pub catalog: Catalog,
    _temp_dir: TempDir,
}

impl CatalogFixture {
    pub async fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let temp_dir = tempfile::tempdir().expect("failed to create temp directory");
        let config = CatalogConfig::new(temp_dir.path().join("db"));
        let catalog = Catalog::open(&config)
            .await
            .expect("failed to open catalog on temporary database");
        Self {
            catalog,
            _temp_dir: temp_dir,
        }
    }

    /// Inserts a user and returns its record id.
    pub async fn seed_user(&self, login: &str, name: &str) -> String {
        let user = User::new(login, name, format!("{}@example.test", login), "pwdhash");
        self.catalog
            .insert_user(&user)
            .await
            .expect("seed user insert failed")
    }

    /// Inserts an empty learning object under `author_id`.
    pub async fn seed_object(&self, author_id: &str, name: &str) -> String {
        let object = LearningObject::new(author_id, name, "module").expect("valid length");
        self.catalog
            .insert_learning_object(&object)
            .await
            .expect("seed object insert failed")
    }

    /// Inserts a learning outcome with the given tag and text under
    /// `source_id`, phrased with an Apply-tier verb.
    pub async fn seed_outcome(&self, source_id: &str, tag: i64, text: &str) -> String {
        let outcome =
            LearningOutcome::new(tag, "Apply and Analyze", "employ", text).expect("valid outcome");
        self.catalog
            .insert_learning_outcome(source_id, &outcome)
            .await
            .expect("seed outcome insert failed")
    }

    /// Inserts a standard outcome and returns its record id.
    pub async fn seed_standard(&self, author: &str, name: &str, text: &str) -> String {
        let standard = StandardOutcome::new(author, name, "2017", text);
        self.catalog
            .insert_standard_outcome(&standard)
            .await
            .expect("seed standard outcome insert failed")
    }
}

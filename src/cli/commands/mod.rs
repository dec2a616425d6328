//! cli::commands
//!
//! Command implementations and the shared component wiring.

pub mod analyze;
pub mod apply;
pub mod scan;
pub mod serve;

use std::sync::Arc;

use crate::config::Config;
use crate::knowledge::HttpKnowledgeBase;
use crate::model::HttpTextGenerator;
use crate::patch::PatchApplier;
use crate::pipeline::{AnalyzerStage, DeployStage, PatchPlanner, ScannerStage};
use crate::scanner::SemgrepTool;
use crate::store::{BlobStore, FsBlobStore};

/// Production collaborators wired from configuration.
///
/// This is the composition root: every stage receives its handles here
/// and nowhere else, so substituting doubles in tests never fights a
/// global.
pub struct Components {
    pub store: Arc<dyn BlobStore>,
    pub scanner: Arc<ScannerStage>,
    pub analyzer: Arc<AnalyzerStage>,
    pub deploy: Arc<DeployStage>,
}

impl Components {
    /// Wire the production implementations from `config`.
    pub fn from_config(config: &Config) -> Self {
        let store: Arc<dyn BlobStore> = Arc::new(FsBlobStore::new(&config.data_dir));
        let knowledge = Arc::new(HttpKnowledgeBase::new(
            &config.knowledge_api_base,
            &config.knowledge_base_id,
        ));
        let generator = Arc::new(HttpTextGenerator::new(
            &config.generation_api_base,
            &config.model_id,
        ));

        let scanner = Arc::new(ScannerStage::new(
            Arc::new(SemgrepTool::new()),
            Arc::clone(&store),
        ));
        let analyzer = Arc::new(AnalyzerStage::new(
            knowledge,
            generator.clone(),
            Arc::clone(&store),
        ));

        let mut applier = PatchApplier::new();
        if config.push_remote {
            applier = applier.with_push(config.git_token.clone());
        }
        let deploy = Arc::new(DeployStage::new(
            Arc::clone(&store),
            PatchPlanner::new(generator),
            applier,
            config.upload_reports,
        ));

        Self {
            store,
            scanner,
            analyzer,
            deploy,
        }
    }
}

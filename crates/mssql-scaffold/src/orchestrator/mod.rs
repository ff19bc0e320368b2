//! Scaffold orchestrator - main workflow coordinator.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::codegen::{CodeGenerator, SeedExporter, VersionSequence};
use crate::config::Config;
use crate::core::schema::DatabaseInfo;
use crate::core::traits::SchemaIntrospector;
use crate::drivers;
use crate::error::{Result, ScaffoldError};

/// Scaffold orchestrator.
pub struct Orchestrator {
    config: Config,
    introspector: Arc<dyn SchemaIntrospector>,
    versions: Option<VersionSequence>,
}

/// Result of a scaffold run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScaffoldResult {
    /// Unique run identifier.
    pub run_id: String,

    /// Final status.
    pub status: String,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run completed.
    pub completed_at: DateTime<Utc>,

    /// Schema that was scaffolded.
    pub schema: String,

    /// Tables found, in generation order.
    pub tables: Vec<String>,

    /// Generated files, in write order.
    pub files_written: Vec<PathBuf>,

    /// Tables that produced seed rows.
    pub seeded_tables: Vec<String>,

    /// Total rows exported as seed data.
    pub rows_exported: u64,
}

impl Orchestrator {
    /// Create an orchestrator for the configured provider.
    ///
    /// Fails with [`ScaffoldError::UnsupportedProvider`] before any I/O.
    pub fn new(config: Config) -> Result<Self> {
        let introspector = drivers::open_introspector(&config.source)?;
        Ok(Self::from_introspector(introspector, config))
    }

    /// Create an orchestrator over an existing introspector.
    pub fn from_introspector(introspector: Arc<dyn SchemaIntrospector>, config: Config) -> Self {
        Self {
            config,
            introspector,
            versions: None,
        }
    }

    /// Use a specific version sequence instead of the wall clock.
    pub fn with_versions(mut self, versions: VersionSequence) -> Self {
        self.versions = Some(versions);
        self
    }

    pub fn introspector(&self) -> &Arc<dyn SchemaIntrospector> {
        &self.introspector
    }

    /// Schema to scaffold.
    ///
    /// In order: the scaffold `schema` setting, the source `default_schema`,
    /// a schema key of the connection string, then the user's default schema
    /// as reported by the server.
    pub async fn resolve_schema(&self) -> String {
        let configured = [
            self.config.scaffold.schema.clone(),
            self.config.source.default_schema.clone(),
            self.config.source.schema_from_connection_string(),
        ];

        if let Some(schema) = configured
            .into_iter()
            .flatten()
            .map(|s| s.trim().to_string())
            .find(|s| !s.is_empty())
        {
            debug!("Using configured schema {}", schema);
            return schema;
        }

        self.introspector.detect_default_schema().await
    }

    /// Read the schema snapshot without generating anything.
    pub async fn inspect(&self) -> Result<DatabaseInfo> {
        let schema = self.resolve_schema().await;
        self.introspector
            .get_structure(&schema, &self.config.scaffold.tables)
            .await
    }

    /// Run the scaffold.
    pub async fn run(self, cancel: CancellationToken) -> Result<ScaffoldResult> {
        let started_at = Utc::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let scaffold = self.config.scaffold.clone();

        info!("Starting scaffold run: {}", run_id);

        // Phase 1: Resolve schema and read the catalog
        let schema = self.resolve_schema().await;
        info!("Phase 1: Reading structure of schema {}", schema);

        let db = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ScaffoldError::Cancelled),
            result = self.introspector.get_structure(&schema, &scaffold.tables) => result?,
        };
        info!("Found {} tables", db.tables.len());

        if cancel.is_cancelled() {
            return Err(ScaffoldError::Cancelled);
        }

        // Phase 2: Schema migrations
        let output_dir = Path::new(&scaffold.output_dir);
        tokio::fs::create_dir_all(output_dir).await?;

        let mut generator = CodeGenerator::new(
            scaffold.namespace.clone(),
            self.versions.unwrap_or_default(),
        );

        info!("Phase 2: Generating schema migrations in {}", output_dir.display());
        let mut files_written = if scaffold.single_file {
            vec![generator.write_single_migration(&db, output_dir).await?]
        } else {
            generator.write_table_migrations(&db, output_dir).await?
        };

        // Phase 3: Seed data
        let mut seeded_tables = Vec::new();
        let mut rows_exported = 0;

        if scaffold.include_data {
            let exporter = SeedExporter::new(scaffold.chunk_size, cancel.clone());
            let introspector = self.introspector.as_ref();

            let seed = if scaffold.separate_seed_files {
                let seed_dir = output_dir.join(&scaffold.seed_folder);
                tokio::fs::create_dir_all(&seed_dir).await?;
                info!("Phase 3: Exporting seed data to {}", seed_dir.display());
                generator
                    .write_seed_files(&db, introspector, &exporter, &seed_dir)
                    .await?
            } else {
                info!("Phase 3: Exporting seed data");
                generator
                    .write_seed_data(&db, introspector, &exporter, output_dir)
                    .await?
            };

            files_written.extend(seed.files);
            seeded_tables = seed.tables;
            rows_exported = seed.stats.rows;
        }

        let completed_at = Utc::now();
        let duration = (completed_at - started_at).num_milliseconds() as f64 / 1000.0;

        let result = ScaffoldResult {
            run_id,
            status: "completed".to_string(),
            duration_seconds: duration,
            started_at,
            completed_at,
            schema,
            tables: db.tables.iter().map(|t| t.name.clone()).collect(),
            files_written,
            seeded_tables,
            rows_exported,
        };

        info!(
            "Scaffold {}: {} tables, {} files, {} rows in {:.1}s",
            result.status,
            result.tables.len(),
            result.files_written.len(),
            result.rows_exported,
            result.duration_seconds
        );

        Ok(result)
    }
}

impl ScaffoldResult {
    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

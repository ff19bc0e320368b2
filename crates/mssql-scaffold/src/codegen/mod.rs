//! FluentMigrator code generation.
//!
//! - [`plan`]: typed Up/Down operation lists
//! - [`render`]: C# source text for plans
//! - [`seed`]: chunked row export for seed migrations
//! - [`version`]: migration version numbers
//! - [`output`]: buffered output files
//!
//! [`CodeGenerator`] ties these together for the four output modes:
//! one file per table, one consolidated schema file, one seed file for all
//! tables, and one seed file per table.

pub mod output;
pub mod plan;
pub mod render;
pub mod seed;
pub mod version;

use std::path::{Path, PathBuf};

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, info};

use crate::core::identifier::class_name_part;
use crate::core::schema::{DatabaseInfo, TableInfo};
use crate::core::traits::SchemaIntrospector;
use crate::error::{Result, ScaffoldError};

pub use output::MigrationFile;
pub use plan::{MigrationPlan, Operation, OperationKind};
pub use render::ClassSpec;
pub use seed::{ExportStats, SeedExporter};
pub use version::{Clock, FixedClock, SystemClock, VersionSequence};

use render::{render_class, render_footer, render_header, SCHEMA_USINGS, SEED_USINGS};

/// Class name of the consolidated schema migration.
pub const INITIAL_SCHEMA_CLASS: &str = "InitialSchema";

/// Class name of the monolithic seed migration.
pub const SEED_DATA_CLASS: &str = "SeedData";

/// Files and counters produced by a seed export.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SeedOutput {
    pub files: Vec<PathBuf>,
    /// Tables that had at least one row.
    pub tables: Vec<String>,
    pub stats: ExportStats,
}

/// Renders schema snapshots into migration files.
pub struct CodeGenerator {
    namespace: String,
    versions: VersionSequence,
}

impl CodeGenerator {
    pub fn new(namespace: impl Into<String>, versions: VersionSequence) -> Self {
        Self {
            namespace: namespace.into(),
            versions,
        }
    }

    /// Class name of a table's schema migration.
    pub fn table_class_name(table: &TableInfo) -> String {
        format!("Create{}Table", class_name_part(&table.name))
    }

    /// Class name of a table's seed migration.
    pub fn seed_class_name(table: &TableInfo) -> String {
        format!("Seed{}Data", class_name_part(&table.name))
    }

    /// Render the migration that creates one table.
    pub fn generate_table_migration(&self, table: &TableInfo, version: &str) -> String {
        let class_name = Self::table_class_name(table);
        let spec = ClassSpec {
            namespace: &self.namespace,
            version,
            class_name: &class_name,
            summary: table.description.as_deref(),
            usings: SCHEMA_USINGS,
        };
        render_class(&spec, &MigrationPlan::for_table(table))
    }

    /// Render one migration that creates every table.
    pub fn generate_single_migration(&self, db: &DatabaseInfo, version: &str) -> String {
        let spec = ClassSpec {
            namespace: &self.namespace,
            version,
            class_name: INITIAL_SCHEMA_CLASS,
            summary: None,
            usings: SCHEMA_USINGS,
        };
        render_class(&spec, &MigrationPlan::for_database(db))
    }

    /// Write `<v>_Create<Table>Table.cs` for every table.
    pub async fn write_table_migrations(
        &mut self,
        db: &DatabaseInfo,
        dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        let mut files = Vec::with_capacity(db.tables.len());

        for table in &db.tables {
            let version = self.versions.next_version();
            let class_name = Self::table_class_name(table);
            let path = dir.join(format!("{}_{}.cs", version, class_name));

            let source = self.generate_table_migration(table, &version);
            let path = output::write_file(&path, &source).await?;
            info!("Generated {}", path.display());
            files.push(path);
        }

        Ok(files)
    }

    /// Write `<v>_InitialSchema.cs` for the whole database.
    pub async fn write_single_migration(&mut self, db: &DatabaseInfo, dir: &Path) -> Result<PathBuf> {
        let version = self.versions.next_version();
        let path = dir.join(format!("{}_{}.cs", version, INITIAL_SCHEMA_CLASS));

        let source = self.generate_single_migration(db, &version);
        let path = output::write_file(&path, &source).await?;
        info!("Generated {} ({} tables)", path.display(), db.tables.len());
        Ok(path)
    }

    /// Write `<v>_SeedData.cs` with the rows of every non-empty table.
    pub async fn write_seed_data(
        &mut self,
        db: &DatabaseInfo,
        introspector: &dyn SchemaIntrospector,
        exporter: &SeedExporter,
        dir: &Path,
    ) -> Result<SeedOutput> {
        let version = self.versions.next_version();
        let path = dir.join(format!("{}_{}.cs", version, SEED_DATA_CLASS));
        let spec = ClassSpec {
            namespace: &self.namespace,
            version: &version,
            class_name: SEED_DATA_CLASS,
            summary: None,
            usings: SEED_USINGS,
        };

        let mut file = MigrationFile::create(&path).await?;
        let body = write_seed_body(&spec, db, introspector, exporter, &mut file).await;
        let closed = file.close().await;

        let (tables, stats) = body?;
        let path = closed?;
        info!(
            "Generated {} ({} rows from {} tables)",
            path.display(),
            stats.rows,
            tables.len()
        );

        Ok(SeedOutput {
            files: vec![path],
            tables,
            stats,
        })
    }

    /// Write `<v>_Seed<Table>Data.cs` into `dir` for every non-empty table.
    pub async fn write_seed_files(
        &mut self,
        db: &DatabaseInfo,
        introspector: &dyn SchemaIntrospector,
        exporter: &SeedExporter,
        dir: &Path,
    ) -> Result<SeedOutput> {
        let mut result = SeedOutput::default();

        for table in &db.tables {
            if exporter.is_cancelled() {
                return Err(ScaffoldError::Cancelled);
            }

            let mut rows = introspector.stream_table_data(table);
            let Some(first) = rows.next().await else {
                debug!("Skipping seed file for {}: no rows", table.full_name());
                continue;
            };
            let rows = stream::once(async move { first }).chain(rows).boxed();

            let version = self.versions.next_version();
            let class_name = Self::seed_class_name(table);
            let path = dir.join(format!("{}_{}.cs", version, class_name));
            let spec = ClassSpec {
                namespace: &self.namespace,
                version: &version,
                class_name: &class_name,
                summary: None,
                usings: SEED_USINGS,
            };

            let mut file = MigrationFile::create(&path).await?;
            let body = async {
                file.write_str(&render_header(&spec)).await?;
                let stats = exporter.export(table, rows, &mut file, false).await?;
                let plan = MigrationPlan::for_seed([table]);
                file.write_str(&render_footer(&plan.down)).await?;
                Ok::<_, ScaffoldError>(stats)
            }
            .await;
            let closed = file.close().await;

            let stats = body?;
            let path = closed?;
            info!("Generated {} ({} rows)", path.display(), stats.rows);

            result.files.push(path);
            result.tables.push(table.name.clone());
            result.stats.add(stats);
        }

        Ok(result)
    }
}

async fn write_seed_body(
    spec: &ClassSpec<'_>,
    db: &DatabaseInfo,
    introspector: &dyn SchemaIntrospector,
    exporter: &SeedExporter,
    file: &mut MigrationFile,
) -> Result<(Vec<String>, ExportStats)> {
    file.write_str(&render_header(spec)).await?;

    let mut seeded: Vec<&TableInfo> = Vec::new();
    let mut total = ExportStats::default();

    for table in &db.tables {
        let rows = introspector.stream_table_data(table);
        let stats = exporter
            .export(table, rows, file, !seeded.is_empty())
            .await?;

        if stats.rows == 0 {
            debug!("No rows to seed for {}", table.full_name());
            continue;
        }
        seeded.push(table);
        total.add(stats);
    }

    let plan = MigrationPlan::for_seed(seeded.iter().copied());
    file.write_str(&render_footer(&plan.down)).await?;

    let names = seeded.iter().map(|t| t.name.clone()).collect();
    Ok((names, total))
}

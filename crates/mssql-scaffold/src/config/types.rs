//! Configuration type definitions.

use serde::{Deserialize, Serialize};

use crate::codegen::seed::DEFAULT_CHUNK_SIZE;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source database connection.
    pub source: SourceConfig,

    /// Scaffold output behavior.
    #[serde(default)]
    pub scaffold: ScaffoldConfig,
}

/// Source database configuration.
///
/// Either the discrete connection fields or a full ADO-style
/// `connection_string` may be given. When both are present the
/// connection string wins.
#[derive(Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Database provider (only "sqlserver" has an introspector).
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Database host.
    #[serde(default)]
    pub host: String,

    /// Database port (default: 1433).
    #[serde(default = "default_mssql_port")]
    pub port: u16,

    /// Database name.
    #[serde(default)]
    pub database: String,

    /// Username.
    #[serde(default)]
    pub user: String,

    /// Password.
    #[serde(default)]
    pub password: String,

    /// ADO.NET style connection string, e.g.
    /// `Server=tcp:localhost,1433;Database=app;User Id=sa;Password=...`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_string: Option<String>,

    /// Schema to scaffold when none is given on the command line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_schema: Option<String>,

    /// Encrypt connection (default: true).
    #[serde(default = "default_true")]
    pub encrypt: bool,

    /// Trust server certificate (default: false).
    #[serde(default)]
    pub trust_server_cert: bool,
}

// Custom Debug implementation to redact sensitive fields
impl std::fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceConfig")
            .field("provider", &self.provider)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field(
                "connection_string",
                &self.connection_string.as_ref().map(|_| "[REDACTED]"),
            )
            .field("default_schema", &self.default_schema)
            .field("encrypt", &self.encrypt)
            .field("trust_server_cert", &self.trust_server_cert)
            .finish()
    }
}

/// Scaffold output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScaffoldConfig {
    /// Directory the migration files are written to (default: "Migrations").
    #[serde(default = "default_migrations")]
    pub output_dir: String,

    /// C# namespace of the generated classes (default: "Migrations").
    #[serde(default = "default_migrations")]
    pub namespace: String,

    /// Only scaffold these tables. Empty means every table in the schema.
    #[serde(default)]
    pub tables: Vec<String>,

    /// Schema to read. Falls back to the connection string, then detection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Write one `InitialSchema` file instead of one file per table.
    #[serde(default)]
    pub single_file: bool,

    /// Also export table rows as seed migrations.
    #[serde(default)]
    pub include_data: bool,

    /// Write one seed file per table into `seed_folder`.
    #[serde(default)]
    pub separate_seed_files: bool,

    /// Subfolder for per-table seed files (default: "Seeds").
    #[serde(default = "default_seed_folder")]
    pub seed_folder: String,

    /// Rows per insert block when exporting data (default: 500).
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for ScaffoldConfig {
    fn default() -> Self {
        Self {
            output_dir: default_migrations(),
            namespace: default_migrations(),
            tables: Vec::new(),
            schema: None,
            single_file: false,
            include_data: false,
            separate_seed_files: false,
            seed_folder: default_seed_folder(),
            chunk_size: default_chunk_size(),
        }
    }
}

fn default_provider() -> String {
    "sqlserver".to_string()
}

fn default_mssql_port() -> u16 {
    1433
}

fn default_true() -> bool {
    true
}

fn default_migrations() -> String {
    "Migrations".to_string()
}

fn default_seed_folder() -> String {
    "Seeds".to_string()
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

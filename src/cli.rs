use clap::Parser;
use core_runtime::config::{
    ArchiveConfig, DEFAULT_ARCHIVE_FOLDER, DEFAULT_PAGE_SIZE, DEFAULT_UPLOAD_CHUNK_SIZE,
};
use core_runtime::logging::{LogFormat, LogLevel, LoggingConfig};
use provider_panopto::endpoints::DEFAULT_BASE_URL;
use std::path::PathBuf;

const MIB: usize = 1024 * 1024;

/// Archive Panopto lecture recordings into Google Drive.
///
/// Every run copies the videos that are not in Drive yet and skips the rest,
/// so an interrupted run is finished by simply running again.
#[derive(Parser, Debug)]
#[command(name = "lecture-sync", version, about, long_about)]
pub struct Cli {
    /// Name of the top-level Drive folder holding the archive
    #[arg(long, default_value = DEFAULT_ARCHIVE_FOLDER)]
    pub archive_folder: String,

    /// Only archive Panopto folders whose name contains this text (case-sensitive)
    #[arg(long, default_value = "CSE", conflicts_with = "all_folders")]
    pub filter: String,

    /// Archive every folder, ignoring --filter
    #[arg(long)]
    pub all_folders: bool,

    /// Google OAuth client secrets downloaded from the Cloud console
    #[arg(long, default_value = "credentials.json")]
    pub credentials: PathBuf,

    /// Where the Drive token is kept [default: <data dir>/lecture-sync/token.json]
    #[arg(long, conflicts_with = "keyring")]
    pub token_file: Option<PathBuf>,

    /// Keep the Drive token in the OS keychain instead of a file
    #[arg(long)]
    pub keyring: bool,

    /// Local port receiving the OAuth redirect; 0 picks a free one
    #[arg(long, default_value_t = 0)]
    pub oauth_port: u16,

    /// Print the authorization URL instead of opening a browser
    #[arg(long)]
    pub no_browser: bool,

    /// University sign-in name
    #[arg(long, env = "PANOPTO_USERNAME")]
    pub panopto_username: Option<String>,

    /// University sign-in password
    #[arg(long, env = "PANOPTO_PASSWORD", hide_env_values = true)]
    pub panopto_password: Option<String>,

    /// Panopto site root
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub panopto_base_url: String,

    /// Sessions requested per listing page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: u32,

    /// Upload chunk size in MiB
    #[arg(long, default_value_t = DEFAULT_UPLOAD_CHUNK_SIZE / MIB)]
    pub upload_chunk_mib: usize,

    /// Skip folders whose sessions cannot be listed instead of stopping
    #[arg(long)]
    pub skip_unlistable_folders: bool,

    /// Log output format: pretty, json or compact
    #[arg(long)]
    pub log_format: Option<LogFormat>,

    /// Custom log filter, e.g. "core_sync=trace,provider_panopto=debug"
    #[arg(long, env = "RUST_LOG")]
    pub log_filter: Option<String>,

    /// Increase logging verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn archive_config(&self) -> core_runtime::Result<ArchiveConfig> {
        let builder = ArchiveConfig::builder()
            .archive_folder_name(&self.archive_folder)
            .page_size(self.page_size)
            .upload_chunk_size(self.upload_chunk_mib.saturating_mul(MIB))
            .skip_unlistable_folders(self.skip_unlistable_folders);

        if self.all_folders {
            builder.all_folders().build()
        } else {
            builder.folder_filter(&self.filter).build()
        }
    }

    pub fn logging_config(&self) -> LoggingConfig {
        let mut config = LoggingConfig::default().with_level(LogLevel::from_verbosity(self.verbose));
        if let Some(format) = self.log_format {
            config = config.with_format(format);
        }
        if let Some(filter) = &self.log_filter {
            config = config.with_filter(filter);
        }
        config
    }
}

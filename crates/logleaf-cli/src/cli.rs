use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use logleaf_core::db::SortKey;

#[derive(Parser)]
#[command(name = "logleaf")]
#[command(about = "Collect stocked articles and keep track of what you have read")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import new Qiita stocks as unread leaves
    Sync,
    /// List stored leaves
    List(ListArgs),
    /// Add a leaf by hand
    #[command(alias = "new")]
    Add {
        /// Article URL
        url: String,
        /// Short note, usually the article title
        #[arg(short, long)]
        note: String,
        /// Source platform label
        #[arg(short, long, default_value = "web")]
        platform: String,
        /// Tag to attach; repeat for several tags
        #[arg(short, long = "tag", value_name = "TAG")]
        tags: Vec<String>,
    },
    /// Mark a leaf as read
    Read {
        /// Leaf ID
        id: String,
    },
    /// Delete a leaf
    Delete {
        /// Leaf ID
        id: String,
    },
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ListArgs {
    /// Number of leaves to show
    #[arg(short, long, default_value = "20")]
    pub limit: usize,
    /// Number of leaves to skip
    #[arg(long, default_value = "0")]
    pub offset: usize,
    /// Only leaves from this platform
    #[arg(long)]
    pub platform: Option<String>,
    /// Only leaves carrying this tag
    #[arg(long)]
    pub tag: Option<String>,
    /// Only unread leaves
    #[arg(long)]
    pub unread: bool,
    /// Sort field
    #[arg(long, value_enum, default_value_t = SortField::SyncedAt)]
    pub sort: SortField,
    /// Sort ascending instead of newest/last first
    #[arg(long)]
    pub asc: bool,
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum SortField {
    SyncedAt,
    Note,
    Platform,
}

impl From<SortField> for SortKey {
    fn from(field: SortField) -> Self {
        match field {
            SortField::SyncedAt => Self::SyncedAt,
            SortField::Note => Self::Note,
            SortField::Platform => Self::Platform,
        }
    }
}

//! CLI command definitions.

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Work with the invalidatable cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },

    /// Work with individual options
    #[command(name = "option")]
    Options {
        #[command(subcommand)]
        command: OptionCommands,
    },

    /// Work with fields of the settings aggregate
    Setting {
        #[command(subcommand)]
        command: SettingCommands,
    },

    /// Remove expired cache entries from the database
    Purge,
}

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Print a cached value
    Get {
        /// Logical cache key
        key: String,
    },

    /// Store a value (JSON, or a bare string)
    Set {
        key: String,
        value: String,

        /// Expiration in seconds; defaults to the configured TTL
        #[arg(long)]
        ttl: Option<u64>,
    },

    /// Delete a cached value
    Delete { key: String },

    /// Orphan every entry under the configured prefix
    Invalidate,
}

#[derive(Subcommand)]
pub enum OptionCommands {
    /// Print an option value
    Get {
        name: String,

        /// Value printed when the option doesn't exist (JSON)
        #[arg(long)]
        default: Option<String>,

        /// Use the name verbatim, without the prefix
        #[arg(long)]
        raw: bool,
    },

    /// Store an option value (JSON, or a bare string)
    Set {
        name: String,
        value: String,

        /// Don't load this option at startup
        #[arg(long)]
        no_autoload: bool,

        #[arg(long)]
        raw: bool,
    },

    /// Delete an option
    Delete {
        name: String,

        #[arg(long)]
        raw: bool,
    },
}

#[derive(Subcommand)]
pub enum SettingCommands {
    /// Print one field of the settings aggregate
    Get {
        field: String,

        /// Aggregate name; defaults to the configured settings id
        #[arg(long)]
        setting: Option<String>,

        /// Read straight from storage
        #[arg(long)]
        no_cache: bool,
    },

    /// Merge a JSON object into the aggregate ("unset" removes a field)
    Set {
        values: String,

        #[arg(long)]
        setting: Option<String>,
    },

    /// Delete one field, or the whole aggregate when no field is given
    Delete { field: Option<String> },
}

//! Command-line front end for AllNime.
//!
//! Subcommands map one-to-one onto library operations; the handlers in
//! [`commands`] only parse, call and print.

mod commands;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::clients::anilist::Season;
use crate::config::Config;
use crate::domain::{AnimeId, ListKind, Stars, Theme};
use crate::services::Profile;
use crate::state::AppContext;

/// AllNime - personal anime tracker
#[derive(Parser)]
#[command(name = "allnime")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to use instead of the default search path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Birthday (YYYY-MM-DD) used to decide whether adult titles may be shown
    #[arg(long, global = true)]
    pub birthday: Option<NaiveDate>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    #[must_use]
    pub const fn profile(&self) -> Profile {
        Profile {
            birthday: self.birthday,
            account_created: None,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search the catalog by title
    #[command(alias = "s")]
    Search {
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Show details, list status and rating for one anime
    #[command(alias = "i")]
    Info {
        id: AnimeId,
        /// Title to reconcile with if the id is unknown to the catalog
        #[arg(long, conflicts_with = "anilist")]
        title: Option<String>,
        /// Treat the id as an AniList media id
        #[arg(long)]
        anilist: bool,
    },

    /// Show the current season, or a specific one
    Season {
        #[arg(long, requires = "year")]
        season: Option<Season>,
        #[arg(long, requires = "season")]
        year: Option<i32>,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },

    /// Show the top-ranked anime
    Top {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },

    /// List catalog genres
    Genres,

    /// Look up streaming episodes by title
    Episodes {
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Manage the status lists
    #[command(alias = "l")]
    List {
        #[command(subcommand)]
        command: ListCommands,
    },

    /// Manage personal ratings
    Rate {
        #[command(subcommand)]
        command: RateCommands,
    },

    /// Manage hand-entered titles
    Manual {
        #[command(subcommand)]
        command: ManualCommands,
    },

    /// Show or set the theme preference
    Theme { theme: Option<Theme> },

    /// Show or set the language preference
    Language { language: Option<String> },

    /// Export all local data as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Import a JSON export
    Import {
        path: PathBuf,
        /// Keep existing data and add only what is missing
        #[arg(long)]
        merge: bool,
    },

    /// Show the activity log and API statistics
    Logs {
        #[arg(long, default_value_t = 20)]
        limit: usize,
        /// Clear the log and statistics
        #[arg(long)]
        clear: bool,
    },

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}

#[derive(Subcommand)]
pub enum ListCommands {
    /// Show one list, or a summary of all lists
    #[command(alias = "ls")]
    Show {
        kind: Option<ListKind>,
        /// Fetch titles from the catalog
        #[arg(long)]
        titles: bool,
    },
    /// Move an anime into a list
    Add { kind: ListKind, id: AnimeId },
    /// Remove an anime from a list
    #[command(alias = "rm")]
    Remove { kind: ListKind, id: AnimeId },
    /// Show which list an anime is in
    Status { id: AnimeId },
}

#[derive(Subcommand)]
pub enum RateCommands {
    /// Rate an anime from 1 to 5 stars
    Set {
        id: AnimeId,
        stars: Stars,
        opinion: Vec<String>,
    },
    Show {
        id: AnimeId,
    },
    #[command(alias = "rm")]
    Delete {
        id: AnimeId,
    },
    /// List every rating
    All,
}

#[derive(Subcommand)]
pub enum ManualCommands {
    /// Add an anime by hand
    Add {
        title: String,
        #[arg(long)]
        image_url: Option<String>,
        #[arg(long)]
        rating: Option<Stars>,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Replace the fields of an existing entry
    Edit {
        id: Uuid,
        title: String,
        #[arg(long)]
        image_url: Option<String>,
        #[arg(long)]
        rating: Option<Stars>,
        #[arg(long, default_value = "")]
        notes: String,
    },
    #[command(alias = "ls")]
    List,
    #[command(alias = "rm")]
    Remove {
        id: Uuid,
    },
}

/// Runs one parsed command against a freshly built context.
pub async fn dispatch(cli: Cli, config: Config) -> anyhow::Result<()> {
    if matches!(cli.command, Commands::Init) {
        return commands::cmd_init(cli.config.as_deref());
    }

    let ctx = AppContext::new(config, &cli.profile())?;

    match cli.command {
        Commands::Search { query } => commands::cmd_search(&ctx, &query.join(" ")).await,
        Commands::Info { id, anilist: true, .. } => commands::cmd_info_anilist(&ctx, id).await,
        Commands::Info { id, title, .. } => commands::cmd_info(&ctx, id, title.as_deref()).await,
        Commands::Season { season, year, page } => {
            commands::cmd_season(&ctx, season.zip(year), page).await
        }
        Commands::Top { page } => commands::cmd_top(&ctx, page).await,
        Commands::Genres => commands::cmd_genres(&ctx).await,
        Commands::Episodes { query } => commands::cmd_episodes(&ctx, &query.join(" ")).await,
        Commands::List { command } => match command {
            ListCommands::Show { kind, titles } => commands::cmd_list_show(&ctx, kind, titles).await,
            ListCommands::Add { kind, id } => commands::cmd_list_add(&ctx, kind, id),
            ListCommands::Remove { kind, id } => commands::cmd_list_remove(&ctx, kind, id),
            ListCommands::Status { id } => {
                commands::cmd_list_status(&ctx, id);
                Ok(())
            }
        },
        Commands::Rate { command } => match command {
            RateCommands::Set { id, stars, opinion } => {
                commands::cmd_rate_set(&ctx, id, stars, &opinion.join(" "))
            }
            RateCommands::Show { id } => {
                commands::cmd_rate_show(&ctx, id);
                Ok(())
            }
            RateCommands::Delete { id } => commands::cmd_rate_delete(&ctx, id),
            RateCommands::All => commands::cmd_rate_all(&ctx),
        },
        Commands::Manual { command } => match command {
            ManualCommands::Add {
                title,
                image_url,
                rating,
                notes,
            } => commands::cmd_manual_add(&ctx, commands::draft(title, image_url, rating, notes)),
            ManualCommands::Edit {
                id,
                title,
                image_url,
                rating,
                notes,
            } => commands::cmd_manual_edit(
                &ctx,
                id,
                commands::draft(title, image_url, rating, notes),
            ),
            ManualCommands::List => {
                commands::cmd_manual_list(&ctx);
                Ok(())
            }
            ManualCommands::Remove { id } => commands::cmd_manual_remove(&ctx, id),
        },
        Commands::Theme { theme } => commands::cmd_theme(&ctx, theme),
        Commands::Language { language } => commands::cmd_language(&ctx, language.as_deref()),
        Commands::Export { output } => commands::cmd_export(&ctx, output.as_deref()),
        Commands::Import { path, merge } => commands::cmd_import(&ctx, &path, merge),
        Commands::Logs { limit, clear } => {
            commands::cmd_logs(&ctx, limit, clear);
            Ok(())
        }
        Commands::Init => Ok(()),
    }
}

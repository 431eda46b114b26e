mod catalog;
mod data;
mod lists;
mod manual;
mod preferences;
mod ratings;

pub use catalog::{
    cmd_episodes, cmd_genres, cmd_info, cmd_info_anilist, cmd_search, cmd_season, cmd_top,
};
pub use data::{cmd_export, cmd_import, cmd_init, cmd_logs};
pub use lists::{cmd_list_add, cmd_list_remove, cmd_list_show, cmd_list_status};
pub use manual::{cmd_manual_add, cmd_manual_edit, cmd_manual_list, cmd_manual_remove, draft};
pub use preferences::{cmd_language, cmd_theme};
pub use ratings::{cmd_rate_all, cmd_rate_delete, cmd_rate_set, cmd_rate_show};

use crate::models::anime::AnimeRecord;

/// One-line summary used by every listing command.
pub(crate) fn print_record_line(anime: &AnimeRecord) {
    let eps = anime
        .episodes
        .map_or_else(|| "? eps".to_string(), |e| format!("{e} eps"));
    let score = anime
        .score
        .map_or_else(|| "-".to_string(), |s| format!("{s:.2}"));

    println!("• {} ({})", anime.display_title(), eps);
    println!(
        "  ID: {} | Type: {} | Score: {} | Status: {}",
        anime.id,
        anime.kind.as_deref().unwrap_or("?"),
        score,
        anime.status.as_deref().unwrap_or("?")
    );
}

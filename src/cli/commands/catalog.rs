//! Catalog browsing command handlers

use tracing::warn;

use super::print_record_line;
use crate::clients::anilist::Season;
use crate::clients::streaming::StreamingOutcome;
use crate::domain::AnimeId;
use crate::models::anime::AnimeRecord;
use crate::services::{CatalogError, LookupPath};
use crate::state::AppContext;

pub async fn cmd_search(ctx: &AppContext, query: &str) -> anyhow::Result<()> {
    println!("Searching for: {query}");

    let results = ctx.catalog.search(query).await?;

    if results.is_empty() {
        println!("No anime found matching '{query}'");
        return Ok(());
    }

    println!();
    println!("Search Results:");
    println!("{:-<60}", "");
    for anime in &results {
        print_record_line(anime);
    }

    println!();
    println!("To track one: allnime list add watching <id>");
    Ok(())
}

pub async fn cmd_info(ctx: &AppContext, id: AnimeId, title: Option<&str>) -> anyhow::Result<()> {
    let (anime, via) = match ctx.catalog.anime_details(id, title).await.into_result(id) {
        Ok(found) => found,
        Err(CatalogError::NotFound(_)) => {
            println!("Anime {id} was not found in any catalog.");
            if title.is_none() {
                println!("Pass --title to look it up by name instead.");
            }
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    println!("Anime Info");
    println!("{:-<60}", "");
    print_details(&anime);

    if let LookupPath::TitleReconciliation { from } = via {
        println!("Note:     id {from} resolved to {} by title search", anime.id);
    }

    print_tracking(ctx, anime.id);
    Ok(())
}

/// Shows an AniList media entry by AniList's own id.
pub async fn cmd_info_anilist(ctx: &AppContext, anilist_id: AnimeId) -> anyhow::Result<()> {
    let Some(anime) = ctx.anilist.get_by_id(anilist_id.value()).await? else {
        println!("AniList media {anilist_id} was not found.");
        return Ok(());
    };

    println!("Anime Info (AniList {anilist_id})");
    println!("{:-<60}", "");
    print_details(&anime);
    print_tracking(ctx, anime.id);
    Ok(())
}

fn print_tracking(ctx: &AppContext, id: AnimeId) {
    println!("List:     {}", ctx.store.get_status(id));
    match ctx.store.get_rating(id) {
        Some(rating) if rating.opinion.is_empty() => println!("Rating:   {}", rating.stars),
        Some(rating) => println!("Rating:   {} \"{}\"", rating.stars, rating.opinion),
        None => println!("Rating:   -"),
    }
}

fn print_details(anime: &AnimeRecord) {
    println!("Title:    {}", anime.title);
    if let Some(en) = anime.title_english.as_deref().filter(|t| *t != anime.title) {
        println!("English:  {en}");
    }
    if let Some(native) = &anime.title_japanese {
        println!("Native:   {native}");
    }
    println!("ID:       {}", anime.id);
    println!("Type:     {}", anime.kind.as_deref().unwrap_or("?"));
    println!(
        "Episodes: {}",
        anime
            .episodes
            .map_or_else(|| "?".to_string(), |e| e.to_string())
    );
    println!("Status:   {}", anime.status.as_deref().unwrap_or("?"));
    if let Some(score) = anime.score {
        println!("Score:    {score:.2}");
    }
    if let Some(year) = anime.year {
        let season = anime.season.as_deref().unwrap_or("");
        println!("Aired:    {season} {year}");
    }
    if !anime.genres.is_empty() {
        println!("Genres:   {}", anime.genres.join(", "));
    }
    if !anime.studios.is_empty() {
        println!("Studios:  {}", anime.studios.join(", "));
    }
    if let Some(synopsis) = &anime.synopsis {
        println!();
        println!("{synopsis}");
    }
}

pub async fn cmd_season(
    ctx: &AppContext,
    season: Option<(Season, i32)>,
    page: u32,
) -> anyhow::Result<()> {
    let results = match season {
        Some((season, year)) => ctx.anilist.season(season, year, page).await?,
        None => ctx.jikan.season_now(page).await?,
    };

    print_listing("Seasonal Anime", &results);
    Ok(())
}

pub async fn cmd_top(ctx: &AppContext, page: u32) -> anyhow::Result<()> {
    let results = match ctx.jikan.top_anime(page).await {
        Ok(results) => results,
        Err(e) => {
            warn!(error = %e, "Jikan top list failed, using AniList");
            ctx.anilist.top(page).await?
        }
    };

    print_listing("Top Anime", &results);
    Ok(())
}

fn print_listing(heading: &str, results: &[AnimeRecord]) {
    if results.is_empty() {
        println!("Nothing to show.");
        return;
    }

    println!("{heading} ({} shown)", results.len());
    println!("{:-<60}", "");
    for anime in results {
        print_record_line(anime);
    }
}

pub async fn cmd_genres(ctx: &AppContext) -> anyhow::Result<()> {
    let genres = ctx.jikan.genres().await?;

    println!("Genres ({} total)", genres.len());
    println!("{:-<40}", "");
    for genre in genres {
        match genre.count {
            Some(count) => println!("{:>5}  {} ({count})", genre.id, genre.name),
            None => println!("{:>5}  {}", genre.id, genre.name),
        }
    }
    Ok(())
}

pub async fn cmd_episodes(ctx: &AppContext, query: &str) -> anyhow::Result<()> {
    let Some(streaming) = &ctx.streaming else {
        println!("Streaming lookups are disabled in the config.");
        return Ok(());
    };

    match streaming.lookup(query).await {
        StreamingOutcome::Found(info) => {
            println!("{} ({} episodes)", info.title, info.episodes.len());
            println!("Source: {}", info.endpoint);
            println!("{:-<60}", "");
            for episode in &info.episodes {
                let title = episode.title.as_deref().unwrap_or("");
                println!("  Ep {:>4}  {title}", episode.number);
            }
        }
        StreamingOutcome::NoMatch => println!("No streaming results for '{query}'"),
        StreamingOutcome::AllEndpointsFailed { attempts } => {
            println!("⚠ Streaming lookup unavailable right now.");
            for (endpoint, reason) in attempts {
                println!("  {endpoint}: {reason}");
            }
        }
    }
    Ok(())
}

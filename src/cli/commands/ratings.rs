use crate::domain::{AnimeId, Stars};
use crate::models::activity::LogLevel;
use crate::state::AppContext;

pub fn cmd_rate_set(
    ctx: &AppContext,
    id: AnimeId,
    stars: Stars,
    opinion: &str,
) -> anyhow::Result<()> {
    let record = ctx.store.set_rating(id, stars, opinion)?;
    ctx.log_book
        .record(LogLevel::Info, format!("Rated {id} {}", record.stars));

    println!("✓ Rated {id} {}", record.stars);
    Ok(())
}

pub fn cmd_rate_show(ctx: &AppContext, id: AnimeId) {
    let Some(rating) = ctx.store.get_rating(id) else {
        println!("{id} has no rating.");
        return;
    };

    println!("{id}: {}", rating.stars);
    if !rating.opinion.is_empty() {
        println!("  \"{}\"", rating.opinion);
    }
    println!("  Updated: {}", rating.updated_at.format("%Y-%m-%d %H:%M"));
}

pub fn cmd_rate_delete(ctx: &AppContext, id: AnimeId) -> anyhow::Result<()> {
    if ctx.store.delete_rating(id)? {
        println!("✓ Deleted rating for {id}");
    } else {
        println!("{id} has no rating.");
    }
    Ok(())
}

pub fn cmd_rate_all(ctx: &AppContext) -> anyhow::Result<()> {
    let ratings = ctx.store.all_ratings()?;

    if ratings.is_empty() {
        println!("No ratings yet.");
        println!();
        println!("Rate anime with: allnime rate set <id> <1-5> [opinion]");
        return Ok(());
    }

    println!("Ratings ({} total)", ratings.len());
    println!("{:-<60}", "");
    for (id, rating) in ratings {
        if rating.opinion.is_empty() {
            println!("{id:>8}  {}", rating.stars);
        } else {
            println!("{id:>8}  {}  {}", rating.stars, rating.opinion);
        }
    }
    Ok(())
}

//! Status list command handlers

use futures::{StreamExt, stream};

use crate::domain::{AnimeId, ListKind};
use crate::models::activity::LogLevel;
use crate::services::DetailOutcome;
use crate::state::AppContext;

const TITLE_FETCH_CONCURRENCY: usize = 4;

pub async fn cmd_list_show(
    ctx: &AppContext,
    kind: Option<ListKind>,
    titles: bool,
) -> anyhow::Result<()> {
    let Some(kind) = kind else {
        let counts = ctx.store.list_counts();
        println!("Lists ({} anime total)", counts.total());
        println!("{:-<40}", "");
        for kind in ListKind::ALL {
            println!("{:<15} {:>5}", kind.name(), counts.get(kind));
        }
        return Ok(());
    };

    let ids = ctx.store.get_list(kind);
    if ids.is_empty() {
        println!("The {kind} list is empty.");
        println!();
        println!("Add anime with: allnime list add {kind} <id>");
        return Ok(());
    }

    println!("{kind} ({} total)", ids.len());
    println!("{:-<60}", "");

    if !titles {
        for id in ids {
            println!("• {id}");
        }
        return Ok(());
    }

    let lines: Vec<String> = stream::iter(ids)
        .map(|id| async move { describe(ctx, id).await })
        .buffered(TITLE_FETCH_CONCURRENCY)
        .collect()
        .await;

    for line in lines {
        println!("{line}");
    }
    Ok(())
}

async fn describe(ctx: &AppContext, id: AnimeId) -> String {
    match ctx.catalog.anime_details(id, None).await {
        DetailOutcome::Found { record, .. } => format!("• {} [{id}]", record.display_title()),
        DetailOutcome::NotFound => format!("• {id} (not in catalog)"),
        DetailOutcome::Unavailable { .. } => format!("• {id} (catalog unavailable)"),
    }
}

pub fn cmd_list_add(ctx: &AppContext, kind: ListKind, id: AnimeId) -> anyhow::Result<()> {
    if !id.is_valid() {
        anyhow::bail!("Invalid anime ID: {id}");
    }

    let previous = ctx.store.get_status(id);
    ctx.store.add_to_list(kind, id)?;
    ctx.log_book
        .record(LogLevel::Info, format!("Moved {id} from {previous} to {kind}"));

    println!("✓ {id} is now in {kind}");
    Ok(())
}

pub fn cmd_list_remove(ctx: &AppContext, kind: ListKind, id: AnimeId) -> anyhow::Result<()> {
    if ctx.store.remove_from_list(kind, id)? {
        ctx.log_book
            .record(LogLevel::Info, format!("Removed {id} from {kind}"));
        println!("✓ Removed {id} from {kind}");
    } else {
        println!("{id} is not in {kind}");
    }
    Ok(())
}

pub fn cmd_list_status(ctx: &AppContext, id: AnimeId) {
    println!("{id}: {}", ctx.store.get_status(id));
}

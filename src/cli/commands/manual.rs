//! Hand-entered titles

use uuid::Uuid;

use crate::domain::Stars;
use crate::models::tracking::ManualEntryDraft;
use crate::state::AppContext;

#[must_use]
pub fn draft(
    title: String,
    image_url: Option<String>,
    rating: Option<Stars>,
    notes: String,
) -> ManualEntryDraft {
    ManualEntryDraft {
        title,
        image_url,
        rating,
        notes,
    }
}

pub fn cmd_manual_add(ctx: &AppContext, draft: ManualEntryDraft) -> anyhow::Result<()> {
    let entry = ctx.store.add_manual_entry(draft)?;
    println!("✓ Added '{}' ({})", entry.title, entry.id);
    Ok(())
}

pub fn cmd_manual_edit(ctx: &AppContext, id: Uuid, draft: ManualEntryDraft) -> anyhow::Result<()> {
    match ctx.store.update_manual_entry(id, draft)? {
        Some(entry) => println!("✓ Updated '{}'", entry.title),
        None => println!("No manual entry with id {id}"),
    }
    Ok(())
}

pub fn cmd_manual_list(ctx: &AppContext) {
    let entries = ctx.store.manual_entries();

    if entries.is_empty() {
        println!("No manual entries.");
        println!();
        println!("Add one with: allnime manual add \"Title\"");
        return;
    }

    println!("Manual Entries ({} total)", entries.len());
    println!("{:-<70}", "");
    for entry in entries {
        let rating = entry
            .rating
            .map_or_else(|| "-".to_string(), |r| r.to_string());
        println!("• {} [{rating}]", entry.title);
        println!("  ID: {}", entry.id);
        if !entry.notes.is_empty() {
            println!("  {}", entry.notes);
        }
    }
}

pub fn cmd_manual_remove(ctx: &AppContext, id: Uuid) -> anyhow::Result<()> {
    if ctx.store.remove_manual_entry(id)? {
        println!("✓ Removed manual entry {id}");
    } else {
        println!("No manual entry with id {id}");
    }
    Ok(())
}

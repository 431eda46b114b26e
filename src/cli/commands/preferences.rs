use crate::domain::Theme;
use crate::state::AppContext;

pub fn cmd_theme(ctx: &AppContext, theme: Option<Theme>) -> anyhow::Result<()> {
    match theme {
        Some(theme) => {
            ctx.store.set_theme(theme)?;
            println!("✓ Theme set to {theme}");
        }
        None => println!("Theme: {}", ctx.store.theme()),
    }
    Ok(())
}

pub fn cmd_language(ctx: &AppContext, language: Option<&str>) -> anyhow::Result<()> {
    match language {
        Some(language) => {
            ctx.store.set_language(language)?;
            println!("✓ Language set to {language}");
        }
        None => println!("Language: {}", ctx.language()),
    }
    Ok(())
}

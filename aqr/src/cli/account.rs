use anyhow::Result;

use crate::cli::AppContext;

pub async fn session(ctx: &AppContext) -> Result<()> {
    let info = ctx.client.session().get().await?;
    ctx.output.emit(&info, |info| {
        Ok(info
            .status_label()
            .unwrap_or_else(|| "ログインしていません".to_string()))
    })
}

pub async fn stats(ctx: &AppContext) -> Result<()> {
    let progress = ctx.client.stats().get().await?.progress();
    ctx.output
        .emit(&progress, |p| Ok(format!("{} ({}%)", p.label(), p.percent)))
}

pub async fn logout(ctx: &AppContext) -> Result<()> {
    ctx.client.logout().await?;
    ctx.output.emit_text("logged out")
}

pub async fn health(ctx: &AppContext) -> Result<()> {
    let health = ctx.client.health().await?;
    ctx.output
        .emit(&health, |h| Ok(if h.ok { "ok" } else { "unhealthy" }.to_string()))
}

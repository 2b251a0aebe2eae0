use std::io::Read;

use anyhow::{Context, Result};
use aquatrack::prelude::*;

use crate::cli::AppContext;

pub async fn set_visited(ctx: &AppContext, id: &str, visited: bool) -> Result<()> {
    let mut session = ctx.view_session();
    session.start().await?;
    let view = session.set_visited(&ItemId::from(id), visited).await?;
    emit_progress(ctx, view.progress)
}

pub async fn set_note(ctx: &AppContext, id: &str, text: Option<String>, stdin: bool) -> Result<()> {
    let note = if stdin {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("read note from stdin")?;
        buf.trim_end_matches(['\r', '\n']).to_string()
    } else {
        text.unwrap_or_default()
    };

    let mut session = ctx.view_session();
    session.start().await?;
    let view = session.set_note(&ItemId::from(id), &note).await?;
    emit_progress(ctx, view.progress)
}

fn emit_progress(ctx: &AppContext, progress: Option<Progress>) -> Result<()> {
    let progress = progress.unwrap_or_default();
    ctx.output
        .emit(&progress, |p| Ok(format!("{} ({}%)", p.label(), p.percent)))
}

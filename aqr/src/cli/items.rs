use std::fmt::Write as _;

use anyhow::Result;
use aquatrack::prelude::*;
use aquatrack_view::{geography::regions, prelude::*};

use crate::{
    cli::{AppContext, ViewArgs},
    output::render_table,
};

/// Starts a view session with the command line's query and expanded regions
/// already in place, so the first render is the one reported, fit included.
async fn load_session(
    ctx: &AppContext,
    args: &ViewArgs,
) -> Result<(Session<TrackerClient, MarkerLayer>, ViewModel)> {
    let expanded: Vec<&str> = if args.expand_all {
        regions().collect()
    } else {
        args.expand.iter().map(String::as_str).collect()
    };
    let mut session = ctx.view_session().with_query(args.query()).with_expanded(expanded);
    let view = session.start().await?;
    Ok((session, view))
}

pub async fn list(ctx: &AppContext, args: &ViewArgs) -> Result<()> {
    let (_, view) = load_session(ctx, args).await?;
    ctx.output.emit(&view.list, |list| Ok(list_text(list)))
}

/// Prints the map widget as the sync left it
pub async fn map(ctx: &AppContext, args: &ViewArgs) -> Result<()> {
    let (session, view) = load_session(ctx, args).await?;
    ctx.output.emit(session.map_widget(), |_| {
        let mut text = render_table(&view.map.markers);
        text.push_str("\n\n");
        text.push_str(&viewport_text(&view.map.viewport)?);
        Ok(text)
    })
}

pub async fn view(ctx: &AppContext, args: &ViewArgs) -> Result<()> {
    let (_, view) = load_session(ctx, args).await?;
    ctx.output.emit(&view, |view| {
        let mut text = String::new();
        if let Some(label) = &view.session_label {
            writeln!(text, "{label}")?;
        }
        if let Some(progress) = view.progress {
            writeln!(text, "{} ({}%)", progress.label(), progress.percent)?;
        }
        writeln!(
            text,
            "表示: {} / {}  地図: {}",
            view.counts.shown,
            view.counts.total,
            view.map.markers.len()
        )?;
        writeln!(text, "{}", viewport_text(&view.map.viewport)?)?;
        text.push('\n');
        text.push_str(&summary_text(&view.list));
        Ok(text)
    })
}

pub async fn divisions(ctx: &AppContext) -> Result<()> {
    let mut session = ctx.view_session();
    session.start().await?;
    let options = session.division_options();
    ctx.output.emit(&options, |options| Ok(options.join("\n")))
}

fn viewport_text(viewport: &Viewport) -> Result<String> {
    let mut text = String::new();
    match viewport {
        Viewport::Keep => text.push_str("viewport: keep"),
        Viewport::FitBounds { bounds, padding } => write!(
            text,
            "viewport: fit ({:.4}, {:.4}) - ({:.4}, {:.4}) padding {padding}",
            bounds.south_west.lat, bounds.south_west.lng, bounds.north_east.lat, bounds.north_east.lng
        )?,
    }
    Ok(text)
}

/// Region headers, each followed by its cards when expanded
fn list_text(list: &ListView) -> String {
    match list {
        ListView::Flat(cards) => render_table(cards),
        ListView::Grouped(sections) if sections.is_empty() => "(該当なし)".to_string(),
        ListView::Grouped(sections) => sections
            .iter()
            .map(|section| {
                if section.cards.is_empty() {
                    section.header.label.clone()
                } else {
                    format!("{}\n{}", section.header.label, render_table(&section.cards))
                }
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// One row per region when grouped, the cards otherwise
fn summary_text(list: &ListView) -> String {
    match list {
        ListView::Flat(cards) => render_table(cards),
        ListView::Grouped(sections) if sections.is_empty() => "(該当なし)".to_string(),
        ListView::Grouped(sections) => {
            let headers: Vec<RegionHeader> = sections.iter().map(|s| s.header.clone()).collect();
            render_table(&headers)
        }
    }
}

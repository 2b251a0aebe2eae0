//! End-to-end session flows against the in-process mock server
//!
//! ```bash
//! cargo test -p aquatrack-view --test session_flow
//! ```

use anyhow::Result;
use aquatrack::mock::MockEndpoint;
use aquatrack::prelude::*;
use aquatrack::test_util::TestContext;
use aquatrack_view::prelude::*;

fn new_session(client: TrackerClient) -> Session<TrackerClient, MarkerLayer> {
    Session::new(client, MarkerLayer::default(), MapConfig::default())
}

fn region_labels(view: &ViewModel) -> Vec<String> {
    match &view.list {
        ListView::Grouped(sections) => sections.iter().map(|s| s.header.label.clone()).collect(),
        ListView::Flat(_) => Vec::new(),
    }
}

fn note_of(session: &Session<TrackerClient, MarkerLayer>, name: &str) -> Option<String> {
    session
        .state()
        .items()
        .iter()
        .find(|item| item.name == name)
        .map(|item| item.note.clone())
}

#[tokio::test]
#[test_log::test]
async fn start_renders_collapsed_regions() -> Result<()> {
    let ctx = TestContext::new().await?;
    let mut session = new_session(ctx.client.clone());

    let view = session.start().await?;
    assert_eq!(view.counts, Counts { shown: 6, total: 6 });
    assert_eq!(view.progress.map(|p| (p.visited, p.total)), Some((0, 6)));
    assert_eq!(view.session_label.as_deref(), Some("Hanako でログイン中"));
    assert_eq!(
        region_labels(&view),
        vec![
            "▶ 北海道（0/1）",
            "▶ 東北（0/1）",
            "▶ 関東（0/2）",
            "▶ 近畿（0/1）",
            "▶ 九州・沖縄（0/1）",
        ]
    );
    assert_eq!(view.list.card_count(), 0);

    // 新江ノ島水族館 has no coordinates
    let layer = session.map_widget();
    assert_eq!(layer.markers.len(), 5);
    assert_eq!(layer.fit_count, 1);
    let fitted = layer.fitted.expect("fitted bounds");
    assert!(layer.markers.iter().all(|m| fitted.contains(m.position)));

    ctx.shutdown().await;
    Ok(())
}

#[tokio::test]
#[test_log::test]
async fn logged_out_session_loads_nothing() -> Result<()> {
    let ctx = TestContext::new().await?;
    let mut session = new_session(ctx.client_for(None)?);

    let err = session.start().await.expect_err("not logged in");
    assert!(err.is_session_failure());
    assert!(matches!(err, SessionError::Session { .. }));
    assert_eq!(ctx.server.request_count(MockEndpoint::Items), 0);
    assert_eq!(ctx.server.request_count(MockEndpoint::Stats), 0);
    assert!(session.map_widget().center.is_none(), "map never initialized");

    ctx.shutdown().await;
    Ok(())
}

#[tokio::test]
#[test_log::test]
async fn visit_updates_counts_and_markers() -> Result<()> {
    let ctx = TestContext::new().await?;
    let mut session = new_session(ctx.client.clone());
    session.start().await?;

    let view = session.set_visited(&ItemId::from(3u64), true).await?;
    assert_eq!(view.progress.map(|p| p.visited), Some(1));
    assert!(region_labels(&view).contains(&"▶ 近畿（1/1）".to_string()));
    let visited: Vec<_> = session
        .map_widget()
        .markers
        .iter()
        .filter(|m| m.icon == MarkerIcon::Visited)
        .collect();
    assert_eq!(visited.len(), 1);
    assert!(visited[0].popup.starts_with("✅ 海遊館"));
    assert_eq!(session.map_widget().fit_count, 1, "reload keeps the viewport");

    let view = session.set_category(CategoryFilter::Visited);
    assert_eq!(view.counts.shown, 1);
    assert_eq!(session.map_widget().fit_count, 2);

    ctx.shutdown().await;
    Ok(())
}

#[tokio::test]
#[test_log::test]
async fn failed_note_update_keeps_old_note() -> Result<()> {
    let ctx = TestContext::new().await?;
    let mut session = new_session(ctx.client.clone());
    session.start().await?;
    session.set_note(&ItemId::from(2u64), "混雑注意").await?;

    ctx.server
        .fail_next(MockEndpoint::SetNote, 500, "db locked");
    let err = session
        .set_note(&ItemId::from(2u64), "推しはクラゲ")
        .await
        .expect_err("injected failure");
    assert_eq!(err.user_message(), "db locked");
    assert!(!err.is_session_failure());
    assert_eq!(note_of(&session, "すみだ水族館").as_deref(), Some("混雑注意"));
    assert_eq!(ctx.server.request_count(MockEndpoint::SetNote), 2, "no retry");

    ctx.shutdown().await;
    Ok(())
}

#[tokio::test]
#[test_log::test]
async fn failed_reload_keeps_previous_view() -> Result<()> {
    let ctx = TestContext::new().await?;
    let mut session = new_session(ctx.client.clone());
    session.start().await?;

    ctx.server.fail_next(MockEndpoint::Stats, 503, "maintenance");
    let err = session.reload().await.expect_err("stats fails");
    assert!(matches!(err, SessionError::Load { .. }));
    assert_eq!(err.user_message(), "maintenance");
    assert_eq!(session.state().items().len(), 6);
    assert_eq!(session.progress().map(|p| p.total), Some(6));

    ctx.shutdown().await;
    Ok(())
}

#[tokio::test]
#[test_log::test]
async fn division_filter_and_search() -> Result<()> {
    let ctx = TestContext::new().await?;
    let mut session = new_session(ctx.client.clone());
    session.start().await?;

    let options = session.division_options();
    assert_eq!(options.len(), 6);

    let view = session.set_division_filter(Some("東京都".into()));
    assert_eq!(region_labels(&view), vec!["▶ 関東（0/1）"]);

    // name sort ignores the division filter but keeps it
    let view = session.set_sort(SortMode::ByName);
    assert_eq!(view.counts.shown, 6);
    assert_eq!(view.query.division_filter.as_deref(), Some("東京都"));

    let view = session.set_search("いわき");
    assert_eq!(view.counts.shown, 1);
    let ListView::Flat(cards) = &view.list else {
        panic!("expected flat list");
    };
    assert_eq!(cards[0].title, "アクアマリンふくしま");

    ctx.shutdown().await;
    Ok(())
}

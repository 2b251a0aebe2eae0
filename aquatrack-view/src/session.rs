//! # Session
//!
//! [`Session`] ties the pieces together. It owns the single [`ViewState`], the
//! pipeline, and the map synchronizer, and routes every change through a named
//! handler that re-renders afterwards.
//!
//! Handlers take `&mut self`, so two handlers never interleave on one session.
//! Mutations write to the server first and then reload everything from it;
//! nothing is patched locally and nothing is retried.
//!
//! ```rust,no_run
//! use aquatrack::prelude::*;
//! use aquatrack_view::prelude::*;
//! # async fn example(client: TrackerClient) -> Result<(), SessionError> {
//! let mut session = Session::new(client, MarkerLayer::default(), MapConfig::default());
//! session.start().await?;
//! let view = session.set_visited(&ItemId::from(3u64), true).await?;
//! println!("{:?}", view.progress);
//! # Ok(())
//! # }
//! ```

use aquatrack::prelude::*;
use snafu::prelude::*;
use tracing::debug;

use crate::{
    api::TrackerApi,
    error::{LoadSnafu, MutationSnafu, Result, SessionRequestSnafu, SessionSnafu},
    geography::regions,
    map::{MapConfig, MapSynchronizer, MapWidget},
    pipeline::Pipeline,
    render::{ViewModel, render},
    state::{CategoryFilter, SortMode, ViewQuery, ViewState},
};

/// Message for a session check that found nobody logged in
pub const LOGIN_REQUIRED: &str = "ログインしてください";

pub struct Session<A, W> {
    api: A,
    state: ViewState,
    pipeline: Pipeline,
    map: MapSynchronizer<W>,
    progress: Option<Progress>,
    info: SessionInfo,
}

impl<A: TrackerApi, W: MapWidget> Session<A, W> {
    pub fn new(api: A, widget: W, config: MapConfig) -> Self {
        Self {
            api,
            state: ViewState::new(),
            pipeline: Pipeline::new(),
            map: MapSynchronizer::new(widget, config),
            progress: None,
            info: SessionInfo::logged_out(),
        }
    }

    /// Replaces the pipeline, e.g. to use a different collator
    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Sets the query without rendering. Call before [`Session::start`] so
    /// that the first render, and its viewport fit, already reflect it.
    pub fn with_query(mut self, query: ViewQuery) -> Self {
        self.state.set_query(query);
        self
    }

    /// Expands the named regions without rendering
    pub fn with_expanded<'a>(mut self, regions: impl IntoIterator<Item = &'a str>) -> Self {
        for region in regions {
            self.state.regions_mut().set_collapsed(region, false);
        }
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn session_info(&self) -> &SessionInfo {
        &self.info
    }

    pub fn progress(&self) -> Option<Progress> {
        self.progress
    }

    pub fn map_widget(&self) -> &W {
        self.map.widget()
    }

    /// Checks the session, then loads items and stats.
    ///
    /// # Errors
    /// - [`SessionError::Session`](crate::error::SessionError::Session) if nobody is logged in; nothing is loaded
    /// - [`SessionError::SessionRequest`](crate::error::SessionError::SessionRequest) if the check could not be made
    /// - [`SessionError::Load`](crate::error::SessionError::Load) if the initial load fails
    pub async fn start(&mut self) -> Result<ViewModel> {
        let info = self.api.session().await.context(SessionRequestSnafu)?;
        self.info = info;
        ensure!(
            self.info.logged_in,
            SessionSnafu {
                message: LOGIN_REQUIRED
            }
        );
        debug!(user = ?self.info.display_name(), "session started");
        self.reload().await
    }

    /// Fetches items and stats concurrently and re-renders.
    /// If either fetch fails, the state is left as it was.
    pub async fn reload(&mut self) -> Result<ViewModel> {
        let (items, stats) =
            tokio::try_join!(self.api.list_items(), self.api.stats()).context(LoadSnafu)?;
        debug!(items = items.len(), visited = stats.visited, total = stats.total, "reloaded");
        self.state.replace_items(items);
        self.progress = Some(stats.progress());
        Ok(self.render())
    }

    /// Renders the current state and syncs the map widget
    pub fn render(&mut self) -> ViewModel {
        let mut view = render(&mut self.state, &self.pipeline);
        view.progress = self.progress;
        view.session_label = self.info.status_label();
        self.map.apply(&view.map);
        view
    }

    pub fn set_category(&mut self, category: CategoryFilter) -> ViewModel {
        debug!(%category, "set category");
        self.state.set_category(category);
        self.render()
    }

    /// Restricts the division-sorted list to one prefecture. `None` or an
    /// empty name shows all.
    pub fn set_division_filter(&mut self, division: Option<String>) -> ViewModel {
        debug!(?division, "set division filter");
        self.state.set_division_filter(division);
        self.render()
    }

    pub fn set_search(&mut self, search: &str) -> ViewModel {
        debug!(search, "set search");
        self.state.set_search(search);
        self.render()
    }

    pub fn set_sort(&mut self, sort: SortMode) -> ViewModel {
        debug!(%sort, "set sort");
        self.state.set_sort(sort);
        self.render()
    }

    /// Collapses an expanded region or expands a collapsed one
    pub fn toggle_region(&mut self, region: &str) -> ViewModel {
        let collapsed = self.state.regions_mut().toggle(region);
        debug!(region, collapsed, "toggle region");
        self.render()
    }

    pub fn set_region_collapsed(&mut self, region: &str, collapsed: bool) -> ViewModel {
        self.state.regions_mut().set_collapsed(region, collapsed);
        self.render()
    }

    /// Expands every region
    pub fn expand_all(&mut self) -> ViewModel {
        for region in regions() {
            self.state.regions_mut().set_collapsed(region, false);
        }
        self.render()
    }

    /// Sets the visited flag on the server, then reloads.
    ///
    /// # Errors
    /// [`SessionError::Mutation`](crate::error::SessionError::Mutation) if the update fails; the state is unchanged.
    /// [`SessionError::Load`](crate::error::SessionError::Load) if the update succeeded but the reload failed.
    pub async fn set_visited(&mut self, id: &ItemId, visited: bool) -> Result<ViewModel> {
        self.api
            .set_visited(id, visited)
            .await
            .context(MutationSnafu { id: id.clone() })?;
        debug!(%id, visited, "visited updated");
        self.reload().await
    }

    /// Replaces the note on the server, then reloads. An empty note clears it.
    ///
    /// # Errors
    /// Same as [`Session::set_visited`].
    pub async fn set_note(&mut self, id: &ItemId, note: &str) -> Result<ViewModel> {
        self.api
            .set_note(id, note)
            .await
            .context(MutationSnafu { id: id.clone() })?;
        debug!(%id, len = note.len(), "note updated");
        self.reload().await
    }

    /// Prefectures present in the loaded items, for a division picker
    pub fn division_options(&self) -> Vec<String> {
        self.pipeline.division_options(self.state.items())
    }

    pub fn into_parts(self) -> (A, W) {
        (self.api, self.map.into_widget())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::{
        error::SessionError,
        list::ListView,
        map::{MarkerLayer, Viewport},
        test_items::{item, located, starred},
    };

    /// In-memory server. `fail` makes the next call of the named operation fail.
    #[derive(Default)]
    struct FakeApi {
        logged_in: bool,
        items: RefCell<Vec<LocationItem>>,
        fail: RefCell<Option<&'static str>>,
        calls: Cell<usize>,
    }

    impl FakeApi {
        fn logged_in(items: Vec<LocationItem>) -> Self {
            Self {
                logged_in: true,
                items: RefCell::new(items),
                ..Default::default()
            }
        }

        fn fail_next(&self, op: &'static str) {
            *self.fail.borrow_mut() = Some(op);
        }

        fn check(&self, op: &str) -> Result<(), TrackerError> {
            self.calls.set(self.calls.get() + 1);
            if *self.fail.borrow() == Some(op) {
                self.fail.borrow_mut().take();
                return Err(TrackerError::ApiError {
                    code: 500,
                    method: "GET".into(),
                    url: format!("/fake/{op}"),
                    message: format!("{op} failed"),
                });
            }
            Ok(())
        }

        fn update(
            &self,
            id: &ItemId,
            f: impl FnOnce(&mut LocationItem),
        ) -> Result<VisitRecord, TrackerError> {
            let mut items = self.items.borrow_mut();
            let item = items.iter_mut().find(|i| &i.id == id).ok_or_else(|| {
                TrackerError::ApiError {
                    code: 404,
                    method: "PUT".into(),
                    url: format!("/api/items/{id}"),
                    message: "Aquarium not found".into(),
                }
            })?;
            f(&mut *item);
            Ok(VisitRecord {
                item_id: Some(id.clone()),
                visited: Some(item.visited),
                note: Some(item.note.clone()),
                ..Default::default()
            })
        }
    }

    impl TrackerApi for FakeApi {
        async fn session(&self) -> Result<SessionInfo, TrackerError> {
            self.check("session")?;
            Ok(SessionInfo {
                logged_in: self.logged_in,
                name: self.logged_in.then(|| "Hanako".to_string()),
                ..Default::default()
            })
        }

        async fn list_items(&self) -> Result<Vec<LocationItem>, TrackerError> {
            self.check("items")?;
            Ok(self.items.borrow().clone())
        }

        async fn stats(&self) -> Result<Stats, TrackerError> {
            self.check("stats")?;
            let items = self.items.borrow();
            Ok(Stats {
                visited: items.iter().filter(|i| i.visited).count() as u64,
                total: items.len() as u64,
            })
        }

        async fn set_visited(&self, id: &ItemId, visited: bool) -> Result<VisitRecord, TrackerError> {
            self.check("visited")?;
            self.update(id, |item| item.visited = visited)
        }

        async fn set_note(&self, id: &ItemId, note: &str) -> Result<VisitRecord, TrackerError> {
            self.check("note")?;
            self.update(id, |item| item.note = note.to_string())
        }
    }

    fn fixture() -> Vec<LocationItem> {
        let mut sumida = located(item(2, "すみだ水族館", "東京都", false), 35.7101, 139.8107);
        sumida.note = "混雑".into();
        vec![
            located(item(1, "おたる水族館", "北海道", true), 43.2298, 141.0203),
            sumida,
            starred(located(item(3, "海遊館", "大阪府", false), 34.6545, 135.4290)),
        ]
    }

    fn session(api: FakeApi) -> Session<FakeApi, MarkerLayer> {
        Session::new(api, MarkerLayer::default(), MapConfig::default())
    }

    fn note_of(session: &Session<FakeApi, MarkerLayer>, id: u64) -> String {
        let id = ItemId::from(id);
        session
            .state()
            .items()
            .iter()
            .find(|i| i.id == id)
            .map(|i| i.note.clone())
            .unwrap_or_default()
    }

    #[tokio::test]
    #[test_log::test]
    async fn start_loads_and_renders() {
        let mut session = session(FakeApi::logged_in(fixture()));
        let view = session.start().await.expect("start");
        assert_eq!(view.counts.total, 3);
        assert_eq!(view.progress.map(|p| (p.visited, p.total)), Some((1, 3)));
        assert_eq!(view.session_label.as_deref(), Some("Hanako でログイン中"));
        assert!(matches!(view.map.viewport, Viewport::FitBounds { .. }));
        let layer = session.map_widget();
        assert_eq!(layer.markers.len(), 3);
        assert_eq!(layer.fit_count, 1);
    }

    #[tokio::test]
    #[test_log::test]
    async fn logged_out_skips_load() {
        let api = FakeApi {
            items: RefCell::new(fixture()),
            ..Default::default()
        };
        let mut session = session(api);
        let err = session.start().await.expect_err("logged out");
        assert!(matches!(err, SessionError::Session { .. }));
        assert!(err.is_session_failure());
        assert_eq!(session.api().calls.get(), 1, "only the session check was made");
        assert!(session.state().items().is_empty());
    }

    #[tokio::test]
    #[test_log::test]
    async fn failed_session_check_is_session_failure() {
        let api = FakeApi::logged_in(fixture());
        api.fail_next("session");
        let mut session = session(api);
        let err = session.start().await.expect_err("check fails");
        assert!(matches!(err, SessionError::SessionRequest { .. }));
        assert!(session.state().items().is_empty());
    }

    #[tokio::test]
    #[test_log::test]
    async fn failed_load_applies_nothing() {
        let mut session = session(FakeApi::logged_in(fixture()));
        session.start().await.expect("start");

        session.api().items.borrow_mut().pop();
        session.api().fail_next("stats");
        let err = session.reload().await.expect_err("stats fails");
        assert!(matches!(err, SessionError::Load { .. }));
        assert_eq!(err.user_message(), "stats failed");
        assert_eq!(session.state().items().len(), 3, "old items kept");
        assert_eq!(session.progress().map(|p| p.total), Some(3));
    }

    #[tokio::test]
    #[test_log::test]
    async fn failed_note_update_leaves_note_unchanged() {
        let mut session = session(FakeApi::logged_in(fixture()));
        session.start().await.expect("start");

        session.api().fail_next("note");
        let err = session
            .set_note(&ItemId::from(2u64), "推しはクラゲ")
            .await
            .expect_err("note fails");
        assert!(matches!(err, SessionError::Mutation { .. }));
        assert_eq!(err.user_message(), "note failed");
        assert_eq!(note_of(&session, 2), "混雑");
        assert_eq!(session.api().items.borrow()[1].note, "混雑");
    }

    #[tokio::test]
    #[test_log::test]
    async fn mutation_reloads_from_server() {
        let mut session = session(FakeApi::logged_in(fixture()));
        session.start().await.expect("start");

        let view = session
            .set_visited(&ItemId::from(3u64), true)
            .await
            .expect("visit");
        assert_eq!(view.progress.map(|p| p.visited), Some(2));
        assert!(session.state().items()[2].visited);

        let view = session
            .set_note(&ItemId::from(2u64), "")
            .await
            .expect("clear note");
        assert_eq!(note_of(&session, 2), "");
        assert!(
            !matches!(view.map.viewport, Viewport::FitBounds { .. }),
            "reload without filter change keeps the viewport"
        );
    }

    #[tokio::test]
    #[test_log::test]
    async fn saved_note_shows_on_card() {
        let mut session = session(FakeApi::logged_in(fixture()));
        session.start().await.expect("start");
        session.set_sort(SortMode::ByName);

        let view = session
            .set_note(&ItemId::from(2u64), "推しはクラゲ")
            .await
            .expect("note");
        let ListView::Flat(cards) = &view.list else {
            panic!("expected flat list");
        };
        let card = cards
            .iter()
            .find(|c| c.id == ItemId::from(2u64))
            .expect("sumida card");
        assert_eq!(card.note.text, "推しはクラゲ");
        assert_eq!(session.api().items.borrow()[1].note, "推しはクラゲ");
    }

    #[tokio::test]
    #[test_log::test]
    async fn empty_result_keeps_viewport() {
        let items = fixture()
            .into_iter()
            .map(|mut i| {
                i.starred = false;
                i
            })
            .collect();
        let mut session = session(FakeApi::logged_in(items));
        session.start().await.expect("start");
        assert_eq!(session.map_widget().fit_count, 1);

        let view = session.set_category(CategoryFilter::Starred);
        assert_eq!(view.counts.shown, 0);
        assert_eq!(view.map.viewport, Viewport::Keep, "nothing to fit");

        let view = session.render();
        assert_eq!(view.map.viewport, Viewport::Keep);
        let view = session.reload().await.expect("reload");
        assert_eq!(view.map.viewport, Viewport::Keep);

        let layer = session.map_widget();
        assert!(layer.markers.is_empty());
        assert_eq!(layer.fit_count, 1, "earlier fit left alone");
        assert!(layer.fitted.is_some());
    }

    #[tokio::test]
    #[test_log::test]
    async fn query_set_before_start_fits_once() {
        let query = ViewQuery {
            category: CategoryFilter::Unvisited,
            search: "  水族館 ".into(),
            ..Default::default()
        };
        let mut session = session(FakeApi::logged_in(fixture()))
            .with_query(query)
            .with_expanded(["関東"]);
        let view = session.start().await.expect("start");

        assert_eq!(view.query.search, "水族館");
        assert_eq!(view.counts.shown, 1);
        assert!(matches!(view.map.viewport, Viewport::FitBounds { .. }));
        let ListView::Grouped(sections) = &view.list else {
            panic!("expected sections");
        };
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].cards.len(), 1, "関東 is expanded");
        assert_eq!(session.map_widget().fit_count, 1);
    }

    #[tokio::test]
    #[test_log::test]
    async fn unknown_item_is_mutation_failure() {
        let mut session = session(FakeApi::logged_in(fixture()));
        session.start().await.expect("start");
        let err = session
            .set_visited(&ItemId::from(99u64), true)
            .await
            .expect_err("404");
        assert_eq!(err.user_message(), "Aquarium not found");
    }

    #[tokio::test]
    #[test_log::test]
    async fn handlers_rerender() {
        let mut session = session(FakeApi::logged_in(fixture()));
        session.start().await.expect("start");

        let view = session.set_category(CategoryFilter::Starred);
        assert_eq!(view.counts.shown, 1);
        assert_eq!(session.map_widget().markers.len(), 1);
        assert_eq!(session.map_widget().fit_count, 2);

        let view = session.toggle_region("近畿");
        let ListView::Grouped(sections) = &view.list else {
            panic!("expected sections");
        };
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].cards.len(), 1);
        assert_eq!(session.map_widget().fit_count, 2, "collapse keeps the viewport");

        let view = session.set_category(CategoryFilter::All);
        let view = match view.list {
            ListView::Grouped(_) => session.expand_all(),
            ListView::Flat(_) => panic!("expected sections"),
        };
        assert_eq!(view.list.card_count(), 3);

        let view = session.set_sort(SortMode::ByName);
        assert!(matches!(view.list, ListView::Flat(ref cards) if cards.len() == 3));

        let view = session.set_search("  クラゲ ");
        assert_eq!(view.counts.shown, 0);
        assert_eq!(view.query.search, "クラゲ");
        assert!(session.map_widget().markers.is_empty());
    }

    #[tokio::test]
    #[test_log::test]
    async fn division_options_follow_items() {
        let mut session = session(FakeApi::logged_in(fixture()));
        session.start().await.expect("start");
        let options = session.division_options();
        assert_eq!(options.len(), 3);
        assert!(options.contains(&"東京都".to_string()));

        let view = session.set_division_filter(Some("大阪府".into()));
        assert_eq!(view.counts.shown, 1);
        let view = session.set_division_filter(None);
        assert_eq!(view.counts.shown, 3);
    }
}

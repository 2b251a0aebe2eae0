//! # Map view and synchronizer
//!
//! [`MapView::build`] turns the flat filtered items into markers and a viewport
//! command. [`MapSynchronizer`] applies a `MapView` to a [`MapWidget`]: the
//! widget's markers are always cleared and placed again from scratch.
//!
//! Items without usable coordinates get no marker and don't contribute to the
//! fitted bounds. They are still listed.

use aquatrack::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::list::join_present;

/// Padding around fitted bounds, in pixels
pub const FIT_PADDING_PX: u32 = 24;

/// Marker style. A visited item and an unvisited item never share a style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerIcon {
    Visited,
    Unvisited,
}

impl MarkerIcon {
    pub fn glyph(self) -> &'static str {
        match self {
            MarkerIcon::Visited => "✅",
            MarkerIcon::Unvisited => "⬜",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub id: ItemId,
    pub position: LatLng,
    pub icon: MarkerIcon,
    /// Popup html: glyph, name, prefecture and city. Text is escaped.
    pub popup: String,
}

impl Marker {
    /// None if the item has no usable coordinates
    pub fn new(item: &LocationItem) -> Option<Self> {
        let position = item.coordinates()?;
        let icon = if item.visited {
            MarkerIcon::Visited
        } else {
            MarkerIcon::Unvisited
        };
        let place = join_present(&[item.prefecture.as_str(), item.city.as_str()]);
        Some(Self {
            id: item.id.clone(),
            position,
            icon,
            popup: format!(
                "{} {}<br>{}",
                icon.glyph(),
                escape_html(&item.name),
                escape_html(&place)
            ),
        })
    }
}

/// Rectangle enclosing a set of points
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl Bounds {
    /// None for an empty set of points
    pub fn of(points: &[LatLng]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bounds = Bounds {
            south_west: *first,
            north_east: *first,
        };
        for point in rest {
            bounds.south_west.lat = bounds.south_west.lat.min(point.lat);
            bounds.south_west.lng = bounds.south_west.lng.min(point.lng);
            bounds.north_east.lat = bounds.north_east.lat.max(point.lat);
            bounds.north_east.lng = bounds.north_east.lng.max(point.lng);
        }
        Some(bounds)
    }

    pub fn contains(&self, point: LatLng) -> bool {
        (self.south_west.lat..=self.north_east.lat).contains(&point.lat)
            && (self.south_west.lng..=self.north_east.lng).contains(&point.lng)
    }
}

/// What the widget should do with its viewport
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Viewport {
    /// Leave the viewport where the user put it
    Keep,
    FitBounds { bounds: Bounds, padding: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub markers: Vec<Marker>,
    pub viewport: Viewport,
}

impl MapView {
    /// Markers for every item with coordinates. The viewport is fitted when
    /// `fit` is set and at least one marker exists.
    pub fn build(items: &[&LocationItem], fit: bool) -> Self {
        let markers: Vec<Marker> = items.iter().filter_map(|item| Marker::new(item)).collect();
        let points: Vec<LatLng> = markers.iter().map(|m| m.position).collect();
        let viewport = if fit {
            Bounds::of(&points).map_or(Viewport::Keep, |bounds| Viewport::FitBounds {
                bounds,
                padding: FIT_PADDING_PX,
            })
        } else {
            Viewport::Keep
        };
        Self { markers, viewport }
    }
}

/// Raster tile source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TileLayer {
    pub url_template: String,
    pub attribution: String,
    pub max_zoom: u8,
}

impl Default for TileLayer {
    fn default() -> Self {
        Self {
            url_template: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            attribution: "&copy; OpenStreetMap contributors".to_string(),
            max_zoom: 19,
        }
    }
}

/// Marker clustering behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClusterOptions {
    pub show_coverage_on_hover: bool,
    pub spiderfy_on_max_zoom: bool,
    /// Markers are shown individually from this zoom level on
    pub disable_clustering_at_zoom: u8,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            show_coverage_on_hover: false,
            spiderfy_on_max_zoom: true,
            disable_clustering_at_zoom: 12,
        }
    }
}

/// Initial map setup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapConfig {
    pub center: LatLng,
    pub zoom: u8,
    pub tiles: TileLayer,
    pub cluster: ClusterOptions,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            // center of Japan
            center: LatLng {
                lat: 36.2048,
                lng: 138.2529,
            },
            zoom: 5,
            tiles: TileLayer::default(),
            cluster: ClusterOptions::default(),
        }
    }
}

/// The map rendering capability. Implementations draw tiles, clusters and
/// markers; the view engine only tells them what to show.
pub trait MapWidget {
    fn create_map(&mut self, center: LatLng, zoom: u8);
    fn add_tile_layer(&mut self, layer: &TileLayer);
    fn create_marker_cluster(&mut self, options: &ClusterOptions);
    fn place_marker(&mut self, position: LatLng, icon: MarkerIcon, popup_html: &str);
    fn clear_markers(&mut self);
    fn fit_bounds(&mut self, points: &[LatLng], padding: u32);
}

/// Keeps a [`MapWidget`] in sync with successive [`MapView`]s
#[derive(Debug)]
pub struct MapSynchronizer<W> {
    widget: W,
    config: MapConfig,
    initialized: bool,
}

impl<W: MapWidget> MapSynchronizer<W> {
    pub fn new(widget: W, config: MapConfig) -> Self {
        Self {
            widget,
            config,
            initialized: false,
        }
    }

    pub fn widget(&self) -> &W {
        &self.widget
    }

    pub fn into_widget(self) -> W {
        self.widget
    }

    fn ensure_initialized(&mut self) {
        if self.initialized {
            return;
        }
        self.widget.create_map(self.config.center, self.config.zoom);
        self.widget.add_tile_layer(&self.config.tiles);
        self.widget.create_marker_cluster(&self.config.cluster);
        self.initialized = true;
    }

    /// Clears every marker, places the view's markers, and fits the viewport
    /// if the view says so.
    pub fn apply(&mut self, view: &MapView) {
        self.ensure_initialized();
        self.widget.clear_markers();
        for marker in &view.markers {
            self.widget.place_marker(marker.position, marker.icon, &marker.popup);
        }
        if let Viewport::FitBounds { padding, .. } = view.viewport {
            let points: Vec<LatLng> = view.markers.iter().map(|m| m.position).collect();
            self.widget.fit_bounds(&points, padding);
        }
        debug!(markers = view.markers.len(), viewport = ?view.viewport, "map synced");
    }
}

/// A placed marker, as recorded by [`MarkerLayer`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedMarker {
    pub position: LatLng,
    pub icon: MarkerIcon,
    pub popup: String,
}

/// In-memory [`MapWidget`]: records what a real widget would display.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MarkerLayer {
    pub center: Option<LatLng>,
    pub zoom: Option<u8>,
    pub tile_layers: Vec<TileLayer>,
    pub cluster: Option<ClusterOptions>,
    pub markers: Vec<PlacedMarker>,
    /// Bounds of the most recent fit
    pub fitted: Option<Bounds>,
    pub fit_count: usize,
    pub clear_count: usize,
}

impl MapWidget for MarkerLayer {
    fn create_map(&mut self, center: LatLng, zoom: u8) {
        self.center = Some(center);
        self.zoom = Some(zoom);
    }

    fn add_tile_layer(&mut self, layer: &TileLayer) {
        self.tile_layers.push(layer.clone());
    }

    fn create_marker_cluster(&mut self, options: &ClusterOptions) {
        self.cluster = Some(*options);
    }

    fn place_marker(&mut self, position: LatLng, icon: MarkerIcon, popup_html: &str) {
        self.markers.push(PlacedMarker {
            position,
            icon,
            popup: popup_html.to_string(),
        });
    }

    fn clear_markers(&mut self) {
        self.markers.clear();
        self.clear_count += 1;
    }

    fn fit_bounds(&mut self, points: &[LatLng], _padding: u32) {
        if let Some(bounds) = Bounds::of(points) {
            self.fitted = Some(bounds);
            self.fit_count += 1;
        }
    }
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_items::{item, located};

    fn fixture() -> Vec<LocationItem> {
        let mut nan = item(4, "NaN Aquarium", "東京都", false);
        nan.lat = Some(f64::NAN);
        nan.lng = Some(139.0);
        let mut sumida = located(item(2, "すみだ水族館", "東京都", true), 35.7101, 139.8107);
        sumida.city = "墨田区".into();
        vec![
            located(item(1, "おたる水族館", "北海道", false), 43.2298, 141.0203),
            sumida,
            item(3, "新江ノ島水族館", "神奈川県", false),
            nan,
            located(item(5, "沖縄美ら海水族館", "沖縄県", true), 26.6943, 127.8779),
        ]
    }

    #[test]
    fn markers_skip_missing_coordinates() {
        let items = fixture();
        let refs: Vec<&LocationItem> = items.iter().collect();
        let view = MapView::build(&refs, true);
        let ids: Vec<_> = view.markers.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "5"]);

        let Viewport::FitBounds { bounds, padding } = view.viewport else {
            panic!("expected fit");
        };
        assert_eq!(padding, FIT_PADDING_PX);
        assert_eq!(bounds.south_west.lat, 26.6943);
        assert_eq!(bounds.north_east.lat, 43.2298);
        assert_eq!(bounds.south_west.lng, 127.8779);
        assert_eq!(bounds.north_east.lng, 141.0203);
    }

    #[test]
    fn marker_icon_and_popup() {
        let items = fixture();
        let marker = Marker::new(&items[1]).expect("marker");
        assert_eq!(marker.icon, MarkerIcon::Visited);
        assert_eq!(marker.popup, "✅ すみだ水族館<br>東京都 / 墨田区");

        let marker = Marker::new(&items[0]).expect("marker");
        assert_eq!(marker.icon, MarkerIcon::Unvisited);
        assert_eq!(marker.popup, "⬜ おたる水族館<br>北海道");
    }

    #[test]
    fn popup_text_is_escaped() {
        let item = located(item(9, "<b>Fish & Chips</b>", "", false), 35.0, 135.0);
        let marker = Marker::new(&item).expect("marker");
        assert_eq!(
            marker.popup,
            "⬜ &lt;b&gt;Fish &amp; Chips&lt;/b&gt;<br>"
        );
    }

    #[test]
    fn no_fit_without_markers_or_flag() {
        let items = fixture();
        let unmapped: Vec<&LocationItem> = vec![&items[2], &items[3]];
        assert_eq!(MapView::build(&unmapped, true).viewport, Viewport::Keep);

        let refs: Vec<&LocationItem> = items.iter().collect();
        assert_eq!(MapView::build(&refs, false).viewport, Viewport::Keep);
    }

    #[test]
    fn synchronizer_initializes_once_and_repopulates() {
        let items = fixture();
        let refs: Vec<&LocationItem> = items.iter().collect();
        let mut sync = MapSynchronizer::new(MarkerLayer::default(), MapConfig::default());

        sync.apply(&MapView::build(&refs, true));
        sync.apply(&MapView::build(&refs[..2], false));

        let layer = sync.widget();
        assert_eq!(layer.zoom, Some(5));
        assert_eq!(layer.tile_layers.len(), 1);
        assert_eq!(
            layer.cluster.map(|c| c.disable_clustering_at_zoom),
            Some(12)
        );
        assert_eq!(layer.clear_count, 2);
        assert_eq!(layer.markers.len(), 2, "stale markers are cleared");
        assert_eq!(layer.fit_count, 1);
    }

    #[test]
    fn bounds_contain_their_points() {
        let points = [
            LatLng { lat: 35.0, lng: 139.0 },
            LatLng { lat: 34.0, lng: 135.5 },
        ];
        let bounds = Bounds::of(&points).expect("bounds");
        assert!(points.iter().all(|p| bounds.contains(*p)));
        assert_eq!(Bounds::of(&[]), None);
    }
}

/// Single-feature selection across the four asset kinds.
///
/// The controller's `SelectedFeatureRef` is the only source of truth for
/// what is selected. The map engine's per-feature "selected" flag is a
/// write-only projection of it: the controller sets the flag for exactly one
/// `{layer, id}` pair and unsets exactly that pair on teardown. It never reads
/// the flag back and never issues a blanket clear, so a teardown can't race
/// a freshly established highlight.
///
/// Camera movement is left to the caller: a successful selection returns a
/// `SelectionView` whose `focus` point is the notification.

use crate::config::LayerConfig;
use crate::logging::{self, Component};
use crate::model::{Asset, AssetKind, LngLat, SelectedFeatureRef};
use crate::repository::EntityRepository;

// ---------------------------------------------------------------------------
// Map engine seam
// ---------------------------------------------------------------------------

/// Per-feature visual state in the map engine.
pub trait FeatureStateSink {
    fn set_selected(&mut self, layer: &str, feature_id: &str, selected: bool);
}

/// What a map click hit, as reported by the map engine's hit test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapHit {
    pub layer: String,
    pub feature_id: String,
}

/// View model for the detail panel: every attribute of the asset plus the
/// point the camera should fly to.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionView {
    pub asset: Asset,
    pub layer: String,
    pub focus: Option<LngLat>,
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct FeatureSelectionController {
    layers: LayerConfig,
    current: Option<SelectedFeatureRef>,
}

impl FeatureSelectionController {
    pub fn new(layers: LayerConfig) -> Self {
        Self {
            layers,
            current: None,
        }
    }

    pub fn selection(&self) -> Option<&SelectedFeatureRef> {
        self.current.as_ref()
    }

    /// Selects `id` within `kind`.
    ///
    /// The previous selection is always torn down first. If the id is not
    /// found the call leaves nothing selected and returns `None`.
    pub fn select_feature(
        &mut self,
        kind: AssetKind,
        id: &str,
        repo: &EntityRepository,
        map: &mut dyn FeatureStateSink,
    ) -> Option<SelectionView> {
        self.clear_selection(map);

        let Some(asset) = repo.find(kind, id) else {
            logging::debug(
                Component::Selection,
                Some(id),
                &format!("no {} with this id; nothing selected", kind),
            );
            return None;
        };

        let layer = self.layers.layer_for(kind).to_string();
        map.set_selected(&layer, id, true);
        self.current = Some(SelectedFeatureRef {
            id: id.to_string(),
            kind,
            layer: layer.clone(),
        });

        logging::debug(
            Component::Selection,
            Some(id),
            &format!("selected {} in '{}'", kind, layer),
        );

        Some(SelectionView {
            focus: asset.representative_point(),
            asset,
            layer,
        })
    }

    /// Unsets the highlight for the stored selection only, then forgets it.
    pub fn clear_selection(&mut self, map: &mut dyn FeatureStateSink) {
        if let Some(prev) = self.current.take() {
            map.set_selected(&prev.layer, &prev.id, false);
        }
    }

    /// Routes a map click. Empty space and layers that aren't bound to one of
    /// the four asset kinds behave exactly like `clear_selection`.
    pub fn handle_click(
        &mut self,
        hit: Option<&MapHit>,
        repo: &EntityRepository,
        map: &mut dyn FeatureStateSink,
    ) -> Option<SelectionView> {
        let target = hit.and_then(|h| self.layers.kind_for(&h.layer).map(|kind| (kind, h)));
        match target {
            Some((kind, h)) => self.select_feature(kind, &h.feature_id, repo, map),
            None => {
                self.clear_selection(map);
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

/// Asset repository for the drainage viewer.
///
/// Holds the four asset collections (pipes, inlets, outlets, drains) loaded
/// once per session. This is the single source of truth for asset attributes:
/// selection and simulation seeding look assets up here by kind and id rather
/// than caching their own copies. The repository is read-only after
/// construction and is shared as `Arc<EntityRepository>`.

use std::collections::HashMap;

use crate::model::{Asset, AssetKind, Drain, Inlet, Outlet, Pipe};

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct EntityRepository {
    pipes: Vec<Pipe>,
    inlets: Vec<Inlet>,
    outlets: Vec<Outlet>,
    drains: Vec<Drain>,
    /// (kind, id) → position in that kind's collection.
    index: HashMap<(AssetKind, String), usize>,
}

impl EntityRepository {
    /// Builds a repository from the four fetched collections.
    ///
    /// If a kind contains the same id twice, the first occurrence wins for
    /// lookups; the duplicate is kept in the collection but unreachable by id.
    pub fn new(
        pipes: Vec<Pipe>,
        inlets: Vec<Inlet>,
        outlets: Vec<Outlet>,
        drains: Vec<Drain>,
    ) -> Self {
        let mut index = HashMap::new();
        for (i, p) in pipes.iter().enumerate() {
            index.entry((AssetKind::Pipe, p.id.clone())).or_insert(i);
        }
        for (i, inlet) in inlets.iter().enumerate() {
            index.entry((AssetKind::Inlet, inlet.id.clone())).or_insert(i);
        }
        for (i, o) in outlets.iter().enumerate() {
            index.entry((AssetKind::Outlet, o.id.clone())).or_insert(i);
        }
        for (i, d) in drains.iter().enumerate() {
            index.entry((AssetKind::Drain, d.id.clone())).or_insert(i);
        }

        Self {
            pipes,
            inlets,
            outlets,
            drains,
            index,
        }
    }

    pub fn pipes(&self) -> &[Pipe] {
        &self.pipes
    }

    pub fn inlets(&self) -> &[Inlet] {
        &self.inlets
    }

    pub fn outlets(&self) -> &[Outlet] {
        &self.outlets
    }

    pub fn drains(&self) -> &[Drain] {
        &self.drains
    }

    /// Number of assets of one kind.
    pub fn count(&self, kind: AssetKind) -> usize {
        match kind {
            AssetKind::Pipe => self.pipes.len(),
            AssetKind::Inlet => self.inlets.len(),
            AssetKind::Outlet => self.outlets.len(),
            AssetKind::Drain => self.drains.len(),
        }
    }

    fn position(&self, kind: AssetKind, id: &str) -> Option<usize> {
        // HashMap<(K, String)> can't be probed with (K, &str) without a
        // custom Borrow impl; the owned key is small.
        self.index.get(&(kind, id.to_string())).copied()
    }

    pub fn find_pipe(&self, id: &str) -> Option<&Pipe> {
        self.position(AssetKind::Pipe, id).map(|i| &self.pipes[i])
    }

    pub fn find_inlet(&self, id: &str) -> Option<&Inlet> {
        self.position(AssetKind::Inlet, id).map(|i| &self.inlets[i])
    }

    pub fn find_outlet(&self, id: &str) -> Option<&Outlet> {
        self.position(AssetKind::Outlet, id).map(|i| &self.outlets[i])
    }

    pub fn find_drain(&self, id: &str) -> Option<&Drain> {
        self.position(AssetKind::Drain, id).map(|i| &self.drains[i])
    }

    /// Looks up an asset of the given kind. Returns `None` if not found.
    pub fn find(&self, kind: AssetKind, id: &str) -> Option<Asset> {
        match kind {
            AssetKind::Pipe => self.find_pipe(id).cloned().map(Asset::Pipe),
            AssetKind::Inlet => self.find_inlet(id).cloned().map(Asset::Inlet),
            AssetKind::Outlet => self.find_outlet(id).cloned().map(Asset::Outlet),
            AssetKind::Drain => self.find_drain(id).cloned().map(Asset::Drain),
        }
    }

    /// Checks whether an id exists within a kind.
    pub fn contains(&self, kind: AssetKind, id: &str) -> bool {
        self.position(kind, id).is_some()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Incremental, resumable shortest-path search rooted at a seed pixel.
//!
//! The search is Dijkstra over the 8-connected pixel grid with costs pulled
//! lazily from a [`LinkCost`] source. Work is done in bounded batches by
//! [`PathSearch::step`], so a single-threaded caller can interleave it with
//! event handling. Each batch returns exactly the pixels it finalized.
//!
//! Invariants:
//! - every pixel has exactly one [`ParentEntry`];
//! - a finalized entry never changes again (costs are non-negative, so the
//!   popped minimum is optimal);
//! - once the frontier is empty the search is [`SearchState::Exhausted`] and
//!   further steps are no-ops.

use log::{debug, trace};
use lw_core::{Direction, Error, Image, LinkCost, Pixel};

use crate::frontier::Frontier;

const NO_PARENT: usize = usize::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    Idle,
    Searching,
    Exhausted,
}

/// A pixel finalized by one [`PathSearch::step`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Finalized {
    pub pixel: Pixel,
    pub parent: Option<Pixel>,
    pub cost: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ParentEntry {
    #[default]
    Unvisited,
    Finalized {
        parent: Option<Pixel>,
        cost: f32,
    },
}

/// Dense row-major map from pixel to its finalized parent and path cost.
#[derive(Debug, Clone, PartialEq)]
pub struct ParentMap {
    entries: Image<ParentEntry>,
    finalized: usize,
}

impl ParentMap {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            entries: Image::new_fill(width, height, ParentEntry::Unvisited),
            finalized: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.entries.width()
    }

    pub fn height(&self) -> usize {
        self.entries.height()
    }

    pub fn get(&self, p: Pixel) -> ParentEntry {
        self.entries
            .get(p.x, p.y)
            .copied()
            .unwrap_or(ParentEntry::Unvisited)
    }

    pub fn is_finalized(&self, p: Pixel) -> bool {
        matches!(self.get(p), ParentEntry::Finalized { .. })
    }

    pub fn cost(&self, p: Pixel) -> Option<f32> {
        match self.get(p) {
            ParentEntry::Finalized { cost, .. } => Some(cost),
            ParentEntry::Unvisited => None,
        }
    }

    /// Parent of a finalized pixel; `None` for the seed and for unvisited
    /// pixels.
    pub fn parent(&self, p: Pixel) -> Option<Pixel> {
        match self.get(p) {
            ParentEntry::Finalized { parent, .. } => parent,
            ParentEntry::Unvisited => None,
        }
    }

    pub fn finalized_count(&self) -> usize {
        self.finalized
    }

    fn is_finalized_idx(&self, idx: usize) -> bool {
        matches!(self.entries.data()[idx], ParentEntry::Finalized { .. })
    }

    fn finalize(&mut self, idx: usize, parent: Option<Pixel>, cost: f32) {
        let slot = &mut self.entries.data_mut()[idx];
        debug_assert_eq!(*slot, ParentEntry::Unvisited, "pixel finalized twice");
        *slot = ParentEntry::Finalized { parent, cost };
        self.finalized += 1;
    }
}

/// One tracing session: the search tree grown from a single seed.
#[derive(Debug, Clone)]
pub struct PathSearch<C> {
    costs: C,
    seed: Pixel,
    target: Option<Pixel>,
    state: SearchState,
    parents: ParentMap,
    tentative: Vec<f32>,
    tentative_parent: Vec<usize>,
    frontier: Frontier,
}

impl<C: LinkCost> PathSearch<C> {
    pub fn new(costs: C, seed: Pixel) -> Result<Self, Error> {
        let (width, height) = costs.dimensions();
        if seed.x >= width || seed.y >= height {
            return Err(Error::OutOfBounds {
                x: seed.x as isize,
                y: seed.y as isize,
            });
        }

        let n = width * height;
        let mut tentative = vec![f32::INFINITY; n];
        let seed_idx = seed.index(width);
        tentative[seed_idx] = 0.0;

        let mut frontier = Frontier::default();
        frontier.push(seed_idx, 0.0);

        Ok(Self {
            costs,
            seed,
            target: None,
            state: SearchState::Idle,
            parents: ParentMap::new(width, height),
            tentative,
            tentative_parent: vec![NO_PARENT; n],
            frontier,
        })
    }

    pub fn seed(&self) -> Pixel {
        self.seed
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn target(&self) -> Option<Pixel> {
        self.target
    }

    pub fn costs(&self) -> &C {
        &self.costs
    }

    pub fn parent_map(&self) -> &ParentMap {
        &self.parents
    }

    pub fn is_finalized(&self, p: Pixel) -> bool {
        self.parents.is_finalized(p)
    }

    /// Pending frontier entries, including superseded ones.
    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }

    /// Records the pixel of interest. Does not advance the search.
    pub fn set_target(&mut self, target: Pixel) -> Result<(), Error> {
        if target.x >= self.parents.width() || target.y >= self.parents.height() {
            return Err(Error::OutOfBounds {
                x: target.x as isize,
                y: target.y as isize,
            });
        }
        self.target = Some(target);
        Ok(())
    }

    /// Finalizes up to `budget` pixels and returns them in finalization order.
    pub fn step(&mut self, budget: usize) -> Vec<Finalized> {
        if self.state == SearchState::Exhausted || budget == 0 {
            return Vec::new();
        }

        let width = self.parents.width();
        let height = self.parents.height();
        let mut out = Vec::with_capacity(budget.min(self.frontier.len()));

        while out.len() < budget {
            let Some(entry) = self.frontier.pop() else {
                break;
            };
            let idx = entry.idx;
            if self.tentative[idx] < entry.cost || self.parents.is_finalized_idx(idx) {
                continue;
            }

            let p = Pixel::from_index(idx, width);
            let parent = match self.tentative_parent[idx] {
                NO_PARENT => None,
                pi => Some(Pixel::from_index(pi, width)),
            };
            self.parents.finalize(idx, parent, entry.cost);
            out.push(Finalized {
                pixel: p,
                parent,
                cost: entry.cost,
            });

            for dir in Direction::ALL {
                let Some(q) = p.neighbor(dir, width, height) else {
                    continue;
                };
                let qi = q.index(width);
                if self.parents.is_finalized_idx(qi) {
                    continue;
                }
                let Some(link) = self.costs.link_cost(p, dir) else {
                    continue;
                };
                if !link.is_finite() {
                    continue;
                }
                debug_assert!(link >= 0.0, "negative link cost {link}");

                let candidate = entry.cost + link.max(0.0);
                if candidate < self.tentative[qi] {
                    self.tentative[qi] = candidate;
                    self.tentative_parent[qi] = idx;
                    self.frontier.push(qi, candidate);
                }
            }
        }

        if self.frontier.is_empty() {
            self.state = SearchState::Exhausted;
            debug!(
                "search from ({}, {}) exhausted after {} pixels",
                self.seed.x,
                self.seed.y,
                self.parents.finalized_count()
            );
        } else {
            self.state = SearchState::Searching;
        }

        trace!(
            "step: finalized {} pixels, frontier {}",
            out.len(),
            self.frontier.len()
        );
        out
    }

    /// Steps in batches of `budget` until `p` is finalized.
    ///
    /// Fails with [`Error::Unreachable`] if the search exhausts first.
    pub fn run_until_finalized(&mut self, p: Pixel, budget: usize) -> Result<(), Error> {
        if p.x >= self.parents.width() || p.y >= self.parents.height() {
            return Err(Error::OutOfBounds {
                x: p.x as isize,
                y: p.y as isize,
            });
        }

        let budget = budget.max(1);
        while !self.parents.is_finalized(p) {
            if self.state == SearchState::Exhausted {
                return Err(Error::Unreachable { x: p.x, y: p.y });
            }
            self.step(budget);
        }
        Ok(())
    }

    /// Runs the search to exhaustion; returns the number of pixels finalized.
    pub fn run_to_completion(&mut self, budget: usize) -> usize {
        let budget = budget.max(1);
        let mut total = 0;
        while self.state != SearchState::Exhausted {
            total += self.step(budget).len();
        }
        total
    }

    /// Seed-to-`target` path through the finalized parent links.
    pub fn extract_path(&self, target: Pixel) -> Result<Vec<Pixel>, Error> {
        if target.x >= self.parents.width() || target.y >= self.parents.height() {
            return Err(Error::OutOfBounds {
                x: target.x as isize,
                y: target.y as isize,
            });
        }

        if !self.parents.is_finalized(target) {
            return Err(if self.state == SearchState::Exhausted {
                Error::Unreachable {
                    x: target.x,
                    y: target.y,
                }
            } else {
                Error::Pending {
                    x: target.x,
                    y: target.y,
                }
            });
        }

        let mut path = vec![target];
        let mut cur = target;
        while let Some(parent) = self.parents.parent(cur) {
            path.push(parent);
            cur = parent;
            debug_assert!(path.len() <= self.parents.finalized_count());
        }
        debug_assert_eq!(cur, self.seed);

        path.reverse();
        Ok(path)
    }
}

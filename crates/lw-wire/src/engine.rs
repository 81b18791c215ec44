//! Interactive tracing facade.
//!
//! [`LiveWire`] owns the raster and its features for its whole lifetime and
//! at most one [`Session`] at a time. A session is created by [`LiveWire::seed`]
//! and replaced on every anchor; the stroke accumulated across sessions is
//! handed out by [`LiveWire::close`] or by an anchor click that closes it.

use std::sync::Arc;

use log::debug;
use lw_core::{Error, Pixel, Raster};
use lw_cost::{CostModel, CostWeights, TrainerConfig, train};
use lw_edge::{FeatureConfig, FeatureField, compute_features};

use crate::search::{Finalized, PathSearch};
use crate::stroke::{Stroke, StrokeBuilder, StrokeState, within_tolerance};

/// One tracing session: the search tree rooted at the current seed.
pub type Session = PathSearch<CostModel>;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    pub features: FeatureConfig,
    pub costs: CostWeights,
    pub trainer: TrainerConfig,
    /// Pixels finalized per batch when the engine resumes a search itself.
    pub step_budget: usize,
    /// Anchor clicks closer than this to the first seed (on both axes) close
    /// the stroke.
    pub close_tolerance: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            features: FeatureConfig::default(),
            costs: CostWeights::default(),
            trainer: TrainerConfig::default(),
            step_budget: 500,
            close_tolerance: 5,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), Error> {
        self.costs.normalized()?;
        self.trainer.validate()?;
        if self.step_budget == 0 {
            return Err(Error::InvalidConfig("step_budget must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnchorOutcome {
    /// The segment was frozen and a new session started at the anchor.
    Anchored,
    /// The click was near the first seed and finished the stroke.
    Closed(Stroke),
}

#[derive(Debug)]
pub struct LiveWire {
    raster: Raster,
    features: Arc<FeatureField>,
    config: EngineConfig,
    session: Option<Session>,
    stroke: Option<StrokeBuilder>,
    live: Vec<Pixel>,
    state: StrokeState,
}

impl LiveWire {
    pub fn load_raster(raster: Raster, config: EngineConfig) -> Result<Self, Error> {
        config.validate()?;
        let features = compute_features(&raster, &config.features);
        debug!(
            "loaded {}x{} raster, max gradient {:.3}",
            raster.width(),
            raster.height(),
            features.max_magnitude()
        );

        Ok(Self {
            raster,
            features: Arc::new(features),
            config,
            session: None,
            stroke: None,
            live: Vec::new(),
            state: StrokeState::Idle,
        })
    }

    pub fn from_f32(
        width: usize,
        height: usize,
        buffer: Vec<f32>,
        config: EngineConfig,
    ) -> Result<Self, Error> {
        Self::load_raster(Raster::from_vec(width, height, buffer)?, config)
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn features(&self) -> &FeatureField {
        &self.features
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn stroke_state(&self) -> StrokeState {
        self.state
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// First seed and anchors of the stroke in progress.
    pub fn control_points(&self) -> &[Pixel] {
        match &self.stroke {
            Some(stroke) => stroke.control_points(),
            None => &[],
        }
    }

    /// Starts a new stroke at `(x, y)`, discarding any stroke in progress.
    pub fn seed(&mut self, x: isize, y: isize) -> Result<(), Error> {
        let p = self.raster.pixel(x, y)?;
        self.start_session(p, &[])?;
        self.stroke = Some(StrokeBuilder::start(p));
        self.live.clear();
        self.state = StrokeState::Seeded;
        Ok(())
    }

    /// Records the cursor pixel. A no-op without a session.
    pub fn set_target(&mut self, x: isize, y: isize) -> Result<(), Error> {
        let p = self.raster.pixel(x, y)?;
        match self.session.as_mut() {
            Some(session) => session.set_target(p),
            None => Ok(()),
        }
    }

    /// Advances the current session; empty when idle or exhausted.
    pub fn step(&mut self, budget: usize) -> Vec<Finalized> {
        self.session
            .as_mut()
            .map_or_else(Vec::new, |s| s.step(budget))
    }

    /// Full preview to `(x, y)`: the frozen stroke followed by the live
    /// segment from the current seed. Resumes the search as needed.
    pub fn extract_path(&mut self, x: isize, y: isize) -> Result<Vec<Pixel>, Error> {
        let p = self.raster.pixel(x, y)?;
        let segment = self.trace_to(p)?;
        let stroke = self.stroke.as_ref().ok_or(Error::NoSession)?;
        let preview = stroke.preview(&segment);
        self.live = segment;
        self.state = StrokeState::Tracking;
        Ok(preview)
    }

    /// Cursor update: target then extract.
    pub fn preview(&mut self, x: isize, y: isize) -> Result<Vec<Pixel>, Error> {
        self.set_target(x, y)?;
        self.extract_path(x, y)
    }

    /// Freezes the segment to `(x, y)` and restarts the search there.
    ///
    /// A click inside the closing tolerance of the first seed finishes the
    /// stroke instead, once there is something to close: an anchored segment
    /// or a live preview. An unanchored preview is frozen first.
    pub fn anchor(&mut self, x: isize, y: isize) -> Result<AnchorOutcome, Error> {
        let p = self.raster.pixel(x, y)?;
        let (first, segments) = match &self.stroke {
            Some(s) => (s.first_seed(), s.segment_count()),
            None => return Err(Error::NoSession),
        };
        let has_preview = self.live.len() > 1;
        if (segments > 0 || has_preview)
            && within_tolerance(p, first, self.config.close_tolerance)
        {
            if segments == 0 {
                let live = std::mem::take(&mut self.live);
                if let Some(&end) = live.last() {
                    self.freeze(end, &live)?;
                }
            }
            let segment = match self.trace_to(first) {
                Err(Error::Unreachable { .. }) => self.trace_to(p)?,
                other => other?,
            };
            return Ok(AnchorOutcome::Closed(self.finish(&segment, true)?));
        }

        if self.session.as_ref().map(|s| s.seed()) == Some(p) {
            return Ok(AnchorOutcome::Anchored);
        }
        let segment = self.trace_to(p)?;
        self.freeze(p, &segment)?;
        Ok(AnchorOutcome::Anchored)
    }

    /// Finishes the stroke as an open polyline ending at the last preview.
    pub fn close(&mut self) -> Result<Stroke, Error> {
        let live = std::mem::take(&mut self.live);
        self.finish(&live, false)
    }

    /// Drops the stroke in progress without yielding it.
    pub fn abort(&mut self) {
        if self.stroke.is_some() {
            debug!("stroke aborted");
        }
        self.session = None;
        self.stroke = None;
        self.live.clear();
        self.state = StrokeState::Idle;
    }

    fn freeze(&mut self, end: Pixel, segment: &[Pixel]) -> Result<(), Error> {
        self.start_session(end, segment)?;
        if let Some(stroke) = self.stroke.as_mut() {
            stroke.append_segment(segment);
        }
        self.live.clear();
        self.state = StrokeState::Seeded;
        debug!(
            "anchored at ({}, {}) after {} points",
            end.x,
            end.y,
            segment.len()
        );
        Ok(())
    }

    fn start_session(&mut self, seed: Pixel, segment: &[Pixel]) -> Result<(), Error> {
        let weights = train(&self.features, seed, segment, &self.config.trainer);
        let costs = CostModel::new(Arc::clone(&self.features), &self.config.costs, weights)?;
        self.session = Some(PathSearch::new(costs, seed)?);
        debug!("session started at ({}, {})", seed.x, seed.y);
        Ok(())
    }

    fn trace_to(&mut self, p: Pixel) -> Result<Vec<Pixel>, Error> {
        let budget = self.config.step_budget;
        let session = self.session.as_mut().ok_or(Error::NoSession)?;
        session.set_target(p)?;
        session.run_until_finalized(p, budget)?;
        session.extract_path(p)
    }

    fn finish(&mut self, live: &[Pixel], closed: bool) -> Result<Stroke, Error> {
        let builder = self.stroke.take().ok_or(Error::NoSession)?;
        let stroke = builder.finish(live, closed);
        self.session = None;
        self.live.clear();
        self.state = StrokeState::Closed;
        debug!(
            "stroke finished: {} points, {} control points, closed={closed}",
            stroke.len(),
            stroke.control_points.len()
        );
        Ok(stroke)
    }
}

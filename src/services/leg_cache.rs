//! Precomputed directions between fixed sites.
//!
//! The pit/dump/base triangle never changes during a simulation, so every
//! leg is fetched once up front and the simulation only reads from here.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{PlanError, PlanResult};
use crate::services::directions::DirectionsService;
use crate::types::{Coordinates, DirectionLeg};

/// Hashable identity of a coordinate (`-0.0` folded into `0.0`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PointKey(u64, u64);

impl From<Coordinates> for PointKey {
    fn from(c: Coordinates) -> Self {
        Self((c.lat + 0.0).to_bits(), (c.lng + 0.0).to_bits())
    }
}

/// Directional: `a -> b` and `b -> a` are separate entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct LegKey {
    from: PointKey,
    to: PointKey,
}

impl LegKey {
    fn new(from: Coordinates, to: Coordinates) -> Self {
        Self { from: from.into(), to: to.into() }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LegCache {
    legs: HashMap<LegKey, DirectionLeg>,
}

impl LegCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch every distinct, non-degenerate pair once. Any failure aborts the
    /// whole population.
    pub async fn populate(
        service: &dyn DirectionsService,
        pairs: &[(Coordinates, Coordinates)],
    ) -> PlanResult<Self> {
        let mut cache = Self::new();

        for &(from, to) in pairs {
            if from == to || cache.contains(from, to) {
                continue;
            }
            let leg = service
                .get_directions(from, to)
                .await
                .map_err(|e| PlanError::upstream("directions", e))?;
            debug!("Cached leg {} -> {} ({}s) via {}", from, to, leg.duration_seconds, service.name());
            cache.insert(from, to, leg);
        }

        Ok(cache)
    }

    pub fn insert(&mut self, from: Coordinates, to: Coordinates, leg: DirectionLeg) {
        self.legs.insert(LegKey::new(from, to), leg);
    }

    pub fn contains(&self, from: Coordinates, to: Coordinates) -> bool {
        self.legs.contains_key(&LegKey::new(from, to))
    }

    /// `Ok(None)` for a zero-length leg (same point); error when a real leg
    /// was never fetched.
    pub fn lookup(&self, from: Coordinates, to: Coordinates) -> PlanResult<Option<&DirectionLeg>> {
        if from == to {
            return Ok(None);
        }
        self.legs
            .get(&LegKey::new(from, to))
            .map(Some)
            .ok_or_else(|| PlanError::invalid(format!("no directions cached for {} -> {}", from, to)))
    }

    pub fn len(&self) -> usize {
        self.legs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }
}

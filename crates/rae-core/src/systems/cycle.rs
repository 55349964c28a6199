//! Cycle Clock

use bevy_ecs::prelude::*;
use rae_events::Cycle;

use crate::error::SimError;

/// Resource: the cycle currently being simulated.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleClock {
    current: Option<Cycle>,
}

impl CycleClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` until the first cycle starts.
    pub fn current(&self) -> Option<Cycle> {
        self.current
    }

    /// Completed-or-running cycles so far.
    pub fn elapsed(&self) -> u32 {
        self.current.map_or(0, Cycle::get)
    }

    pub fn advance(&mut self) -> Cycle {
        let next = self.current.map_or(Cycle::FIRST, Cycle::next);
        self.current = Some(next);
        next
    }
}

/// System: Start the next cycle
pub fn advance_cycle(mut clock: ResMut<CycleClock>) {
    let cycle = clock.advance();
    tracing::trace!("starting {}", cycle);
}

/// Resource: a failure raised during the current cycle, taken by the driver.
#[derive(Resource, Debug, Default)]
pub struct CycleFailure(pub Option<SimError>);

/// Run condition: no earlier system of this cycle has failed.
pub fn cycle_ok(failure: Res<CycleFailure>) -> bool {
    failure.0.is_none()
}

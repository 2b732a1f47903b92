//! Accelerating rotary-encoder input.
//!
//! Fast same-direction turns climb the multiplier ladder 1 → 10 → 100.
//! A direction change or a pause steps down one rung per event.

use crate::config::MomentumCfg;

/// Multiplier rungs, slowest first.
pub const RUNGS: [i32; 3] = [1, 10, 100];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MomentumState {
    pub multiplier: i32,
    pub momentum_count: u32,
    /// -1, 0 (no event yet) or +1.
    pub last_direction: i8,
    pub last_change_ms: Option<u64>,
}

impl Default for MomentumState {
    fn default() -> Self {
        Self {
            multiplier: 1,
            momentum_count: 0,
            last_direction: 0,
            last_change_ms: None,
        }
    }
}

/// Result of one encoder event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adjustment {
    pub delta: i32,
    pub multiplier: i32,
    /// `delta * multiplier`, in grams.
    pub step_g: i64,
}

#[derive(Debug, Clone)]
pub struct MomentumController {
    cfg: MomentumCfg,
    state: MomentumState,
}

impl MomentumController {
    pub fn new(cfg: MomentumCfg) -> Self {
        Self {
            cfg,
            state: MomentumState::default(),
        }
    }

    pub fn state(&self) -> MomentumState {
        self.state
    }

    pub fn cfg(&self) -> &MomentumCfg {
        &self.cfg
    }

    pub fn reset(&mut self) {
        self.state = MomentumState::default();
    }

    /// Feed one encoder event. A zero delta is not an event and returns `None`.
    pub fn on_delta(&mut self, delta: i32, at_ms: u64) -> Option<Adjustment> {
        if delta == 0 {
            return None;
        }
        let dir: i8 = if delta > 0 { 1 } else { -1 };
        let st = &mut self.state;

        match st.last_change_ms {
            None => {
                st.momentum_count = 1;
                st.multiplier = RUNGS[0];
            }
            Some(prev) => {
                let dt = at_ms.saturating_sub(prev);
                if dt < self.cfg.window_ms && dir == st.last_direction {
                    st.momentum_count = st.momentum_count.saturating_add(1);
                    st.multiplier = match st.momentum_count {
                        0 | 1 => RUNGS[0],
                        2 => RUNGS[1],
                        _ => RUNGS[2],
                    };
                } else {
                    let (mult, count) = match st.multiplier {
                        100 => (RUNGS[1], 1),
                        _ => (RUNGS[0], 0),
                    };
                    st.multiplier = mult;
                    st.momentum_count = count;
                }
            }
        }
        st.last_direction = dir;
        st.last_change_ms = Some(at_ms);

        let adj = Adjustment {
            delta,
            multiplier: st.multiplier,
            step_g: i64::from(delta) * i64::from(st.multiplier),
        };
        tracing::trace!(
            delta,
            multiplier = adj.multiplier,
            count = st.momentum_count,
            "encoder"
        );
        Some(adj)
    }

    /// Apply one encoder event to `target_g`, clamped to the configured bounds.
    pub fn adjust(&mut self, target_g: i32, delta: i32, at_ms: u64) -> i32 {
        match self.on_delta(delta, at_ms) {
            Some(adj) => self.clamp(i64::from(target_g) + adj.step_g),
            None => target_g,
        }
    }

    fn clamp(&self, grams: i64) -> i32 {
        let clamped = grams.clamp(i64::from(self.cfg.min_g), i64::from(self.cfg.max_g));
        i32::try_from(clamped).unwrap_or(self.cfg.max_g)
    }
}

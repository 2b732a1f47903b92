//! Tare offset bookkeeping.

/// Offset subtracted from every converted weight.
///
/// Starts at zero. Replaced on every tare; never accumulated.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TareState {
    offset_g: f64,
}

impl TareState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offset(&self) -> f64 {
        self.offset_g
    }

    /// Weight as shown to the operator.
    #[inline]
    pub fn apply(&self, converted_g: f64) -> f64 {
        converted_g - self.offset_g
    }

    /// Undo `apply`, recovering the untared weight.
    #[inline]
    pub fn remove(&self, tared_g: f64) -> f64 {
        tared_g + self.offset_g
    }

    pub fn set(&mut self, offset_g: f64) {
        self.offset_g = offset_g;
    }

    pub fn clear(&mut self) {
        self.offset_g = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_and_remove_are_inverse() {
        let mut t = TareState::new();
        t.set(120.5);
        assert_eq!(t.apply(200.0), 79.5);
        assert_eq!(t.remove(t.apply(200.0)), 200.0);
        t.clear();
        assert_eq!(t.offset(), 0.0);
    }
}

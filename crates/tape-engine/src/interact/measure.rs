/// Result of a measurement between two data-space points.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeasureResult {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    pub dx: f64,
    pub dy: f64,
    /// Euclidean distance in data space.
    pub distance: f64,
    /// `(y1 - y0) / y0 * 100`; 0 when y0 is 0.
    pub percent_change: f64,
    pub valid: bool,
}

/// Two-point measure tool: begin, update while dragging, finish.
#[derive(Debug, Default)]
pub struct MeasureState {
    active: bool,
    has_second: bool,
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
}

impl MeasureState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, data_x: f64, data_y: f64) {
        self.active = true;
        self.has_second = false;
        self.x0 = data_x;
        self.y0 = data_y;
        self.x1 = data_x;
        self.y1 = data_y;
    }

    pub fn update(&mut self, data_x: f64, data_y: f64) {
        if !self.active {
            return;
        }
        self.has_second = true;
        self.x1 = data_x;
        self.y1 = data_y;
    }

    /// Complete the measurement at the given end point and return to idle.
    pub fn finish(&mut self, data_x: f64, data_y: f64) -> MeasureResult {
        if !self.active {
            return MeasureResult::default();
        }
        self.update(data_x, data_y);
        let result = self.result();
        self.active = false;
        self.has_second = false;
        result
    }

    pub fn cancel(&mut self) {
        self.active = false;
        self.has_second = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// In-progress measurement; invalid until a second point exists.
    pub fn current(&self) -> MeasureResult {
        if !self.active || !self.has_second {
            return MeasureResult::default();
        }
        self.result()
    }

    fn result(&self) -> MeasureResult {
        let dx = self.x1 - self.x0;
        let dy = self.y1 - self.y0;
        MeasureResult {
            x0: self.x0,
            y0: self.y0,
            x1: self.x1,
            y1: self.y1,
            dx,
            dy,
            distance: (dx * dx + dy * dy).sqrt(),
            percent_change: if self.y0 != 0.0 {
                (self.y1 - self.y0) / self.y0 * 100.0
            } else {
                0.0
            },
            valid: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_update_finish_produces_deltas() {
        let mut measure = MeasureState::new();
        measure.begin(10.0, 100.0);
        measure.update(12.0, 105.0);
        let result = measure.finish(13.0, 104.0);

        assert!(result.valid);
        assert_eq!(result.dx, 3.0);
        assert_eq!(result.dy, 4.0);
        assert!((result.distance - 5.0).abs() < 1e-12);
        assert!((result.percent_change - 4.0).abs() < 1e-12);
        assert!(!measure.is_active());
    }

    #[test]
    fn percent_change_is_zero_when_base_is_zero() {
        let mut measure = MeasureState::new();
        measure.begin(0.0, 0.0);
        let result = measure.finish(1.0, 10.0);
        assert!(result.valid);
        assert_eq!(result.percent_change, 0.0);
    }

    #[test]
    fn current_is_invalid_until_second_point() {
        let mut measure = MeasureState::new();
        assert!(!measure.current().valid);
        measure.begin(1.0, 1.0);
        assert!(!measure.current().valid);
        measure.update(2.0, 2.0);
        assert!(measure.current().valid);
    }

    #[test]
    fn cancel_discards_measurement() {
        let mut measure = MeasureState::new();
        measure.begin(1.0, 1.0);
        measure.cancel();
        assert!(!measure.is_active());
        assert!(!measure.finish(9.0, 9.0).valid);
    }
}

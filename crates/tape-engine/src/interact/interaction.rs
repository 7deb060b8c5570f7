use super::drawing::DrawingStore;

/// Drawing-creation state machine.
///
/// Single-click shapes (level, vertical line) complete on the first click;
/// two-point shapes collect an anchor first. `cancel` returns to idle from
/// any state without emitting anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawingMode {
    #[default]
    Idle,
    PlacingTrendlineFirst,
    PlacingTrendlineSecond,
    PlacingHorizontalLevel,
    PlacingVerticalLine,
    PlacingRectangleFirst,
    PlacingRectangleSecond,
    PlacingFibFirst,
    PlacingFibSecond,
}

#[derive(Debug, Default)]
pub struct DrawingInteraction {
    mode: DrawingMode,
    first_x: f64,
    first_y: f64,
    preview_x: f64,
    preview_y: f64,
}

impl DrawingInteraction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_trendline(&mut self) {
        self.mode = DrawingMode::PlacingTrendlineFirst;
    }

    pub fn begin_horizontal_level(&mut self) {
        self.mode = DrawingMode::PlacingHorizontalLevel;
    }

    pub fn begin_vertical_line(&mut self) {
        self.mode = DrawingMode::PlacingVerticalLine;
    }

    pub fn begin_rectangle(&mut self) {
        self.mode = DrawingMode::PlacingRectangleFirst;
    }

    pub fn begin_fib_retracement(&mut self) {
        self.mode = DrawingMode::PlacingFibFirst;
    }

    pub fn cancel(&mut self) {
        self.mode = DrawingMode::Idle;
    }

    pub fn mode(&self) -> DrawingMode {
        self.mode
    }

    pub fn is_active(&self) -> bool {
        self.mode != DrawingMode::Idle
    }

    /// Last click position, for rendering placement feedback.
    pub fn preview(&self) -> (f64, f64) {
        (self.preview_x, self.preview_y)
    }

    /// Process a click in data coordinates. Returns the id of the completed
    /// drawing, or 0 while the flow is still collecting points.
    pub fn on_click(&mut self, data_x: f64, data_y: f64, store: &mut DrawingStore) -> u32 {
        self.preview_x = data_x;
        self.preview_y = data_y;

        match self.mode {
            DrawingMode::Idle => 0,

            DrawingMode::PlacingTrendlineFirst => {
                self.first_x = data_x;
                self.first_y = data_y;
                self.mode = DrawingMode::PlacingTrendlineSecond;
                0
            }
            DrawingMode::PlacingTrendlineSecond => {
                let id = store.add_trendline(self.first_x, self.first_y, data_x, data_y);
                self.mode = DrawingMode::Idle;
                id
            }

            DrawingMode::PlacingHorizontalLevel => {
                let id = store.add_horizontal_level(data_y);
                self.mode = DrawingMode::Idle;
                id
            }

            DrawingMode::PlacingVerticalLine => {
                let id = store.add_vertical_line(data_x);
                self.mode = DrawingMode::Idle;
                id
            }

            DrawingMode::PlacingRectangleFirst => {
                self.first_x = data_x;
                self.first_y = data_y;
                self.mode = DrawingMode::PlacingRectangleSecond;
                0
            }
            DrawingMode::PlacingRectangleSecond => {
                let id = store.add_rectangle(self.first_x, self.first_y, data_x, data_y);
                self.mode = DrawingMode::Idle;
                id
            }

            DrawingMode::PlacingFibFirst => {
                self.first_x = data_x;
                self.first_y = data_y;
                self.mode = DrawingMode::PlacingFibSecond;
                0
            }
            DrawingMode::PlacingFibSecond => {
                let id = store.add_fib_retracement(self.first_x, self.first_y, data_x, data_y);
                self.mode = DrawingMode::Idle;
                id
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interact::drawing::DrawingType;

    #[test]
    fn trendline_takes_two_clicks() {
        let mut store = DrawingStore::new();
        let mut interaction = DrawingInteraction::new();

        interaction.begin_trendline();
        assert_eq!(interaction.on_click(10.0, 50.0, &mut store), 0);
        assert_eq!(interaction.mode(), DrawingMode::PlacingTrendlineSecond);

        let id = interaction.on_click(20.0, 60.0, &mut store);
        assert_ne!(id, 0);
        assert_eq!(interaction.mode(), DrawingMode::Idle);

        let d = store.get(id).unwrap();
        assert_eq!(d.kind, DrawingType::Trendline);
        assert_eq!((d.x0, d.y0, d.x1, d.y1), (10.0, 50.0, 20.0, 60.0));
    }

    #[test]
    fn horizontal_level_completes_on_first_click() {
        let mut store = DrawingStore::new();
        let mut interaction = DrawingInteraction::new();
        interaction.begin_horizontal_level();
        let id = interaction.on_click(3.0, 99.5, &mut store);
        assert_ne!(id, 0);
        assert_eq!(store.get(id).unwrap().y0, 99.5);
        assert!(!interaction.is_active());
    }

    #[test]
    fn vertical_line_uses_x_only() {
        let mut store = DrawingStore::new();
        let mut interaction = DrawingInteraction::new();
        interaction.begin_vertical_line();
        let id = interaction.on_click(7.5, 1.0, &mut store);
        assert_eq!(store.get(id).unwrap().x0, 7.5);
    }

    #[test]
    fn rectangle_and_fib_take_two_clicks() {
        let mut store = DrawingStore::new();
        let mut interaction = DrawingInteraction::new();

        interaction.begin_rectangle();
        assert_eq!(interaction.on_click(1.0, 2.0, &mut store), 0);
        let rect = interaction.on_click(3.0, 4.0, &mut store);
        assert_eq!(store.get(rect).unwrap().kind, DrawingType::Rectangle);

        interaction.begin_fib_retracement();
        assert_eq!(interaction.on_click(5.0, 6.0, &mut store), 0);
        let fib = interaction.on_click(7.0, 8.0, &mut store);
        assert_eq!(store.get(fib).unwrap().kind, DrawingType::FibRetracement);
    }

    #[test]
    fn cancel_emits_nothing_from_any_state() {
        let mut store = DrawingStore::new();
        let mut interaction = DrawingInteraction::new();

        interaction.begin_trendline();
        interaction.on_click(1.0, 1.0, &mut store);
        interaction.cancel();
        assert_eq!(interaction.mode(), DrawingMode::Idle);
        assert_eq!(store.count(), 0);

        // A click while idle does nothing.
        assert_eq!(interaction.on_click(2.0, 2.0, &mut store), 0);
        assert_eq!(store.count(), 0);
    }
}

use serde::{Deserialize, Serialize};

/// User-created annotation kinds, in data space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DrawingType {
    /// Two-point line.
    Trendline,
    /// Single price level spanning the full width.
    HorizontalLevel,
    /// Single x-coordinate spanning the full height.
    VerticalLine,
    /// Rectangle zone from (x0, y0) to (x1, y1).
    Rectangle,
    /// Fibonacci retracement over the y-range (x0, y0) -> (x1, y1).
    FibRetracement,
}

/// One annotation. Unused coordinates stay at zero (a horizontal level only
/// uses y0, a vertical line only x0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Drawing {
    pub id: u32,
    #[serde(rename = "type")]
    pub kind: DrawingType,
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    pub color: [f32; 4],
    pub line_width: f32,
}

impl Drawing {
    fn new(id: u32, kind: DrawingType) -> Self {
        Self {
            id,
            kind,
            x0: 0.0,
            y0: 0.0,
            x1: 0.0,
            y1: 0.0,
            color: [1.0, 1.0, 0.0, 1.0],
            line_width: 2.0,
        }
    }
}

/// JSON wire shape of a drawing collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DrawingSet {
    drawings: Vec<Drawing>,
}

/// Owns every annotation on a chart and hands out their ids.
#[derive(Debug, Default)]
pub struct DrawingStore {
    drawings: Vec<Drawing>,
    next_id: u32,
}

impl DrawingStore {
    pub fn new() -> Self {
        Self {
            drawings: Vec::new(),
            next_id: 1,
        }
    }

    pub fn add_trendline(&mut self, x0: f64, y0: f64, x1: f64, y1: f64) -> u32 {
        let id = self.take_id();
        let mut d = Drawing::new(id, DrawingType::Trendline);
        d.x0 = x0;
        d.y0 = y0;
        d.x1 = x1;
        d.y1 = y1;
        self.drawings.push(d);
        id
    }

    pub fn add_horizontal_level(&mut self, price: f64) -> u32 {
        let id = self.take_id();
        let mut d = Drawing::new(id, DrawingType::HorizontalLevel);
        d.y0 = price;
        self.drawings.push(d);
        id
    }

    pub fn add_vertical_line(&mut self, x: f64) -> u32 {
        let id = self.take_id();
        let mut d = Drawing::new(id, DrawingType::VerticalLine);
        d.x0 = x;
        self.drawings.push(d);
        id
    }

    pub fn add_rectangle(&mut self, x0: f64, y0: f64, x1: f64, y1: f64) -> u32 {
        let id = self.take_id();
        let mut d = Drawing::new(id, DrawingType::Rectangle);
        d.x0 = x0;
        d.y0 = y0;
        d.x1 = x1;
        d.y1 = y1;
        self.drawings.push(d);
        id
    }

    pub fn add_fib_retracement(&mut self, x0: f64, y0: f64, x1: f64, y1: f64) -> u32 {
        let id = self.take_id();
        let mut d = Drawing::new(id, DrawingType::FibRetracement);
        d.x0 = x0;
        d.y0 = y0;
        d.x1 = x1;
        d.y1 = y1;
        self.drawings.push(d);
        id
    }

    pub fn set_color(&mut self, id: u32, r: f32, g: f32, b: f32, a: f32) {
        if let Some(d) = self.drawings.iter_mut().find(|d| d.id == id) {
            d.color = [r, g, b, a];
        }
    }

    pub fn set_line_width(&mut self, id: u32, width: f32) {
        if let Some(d) = self.drawings.iter_mut().find(|d| d.id == id) {
            d.line_width = width;
        }
    }

    pub fn remove(&mut self, id: u32) {
        self.drawings.retain(|d| d.id != id);
    }

    pub fn clear(&mut self) {
        self.drawings.clear();
    }

    pub fn get(&self, id: u32) -> Option<&Drawing> {
        self.drawings.iter().find(|d| d.id == id)
    }

    pub fn drawings(&self) -> &[Drawing] {
        &self.drawings
    }

    pub fn count(&self) -> usize {
        self.drawings.len()
    }

    /// Serialise every drawing to JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string(&DrawingSet {
            drawings: self.drawings.clone(),
        })
        .expect("drawing serialisation cannot fail")
    }

    /// Replace the store's contents from a JSON snapshot. The id allocator
    /// resumes above the highest loaded id.
    pub fn load_json(&mut self, json: &str) -> Result<(), serde_json::Error> {
        let set: DrawingSet = serde_json::from_str(json)?;
        self.next_id = set.drawings.iter().map(|d| d.id).max().unwrap_or(0) + 1;
        self.drawings = set.drawings;
        Ok(())
    }

    fn take_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

use serde::{Deserialize, Serialize};

use crate::interact::Drawing;
use crate::viewport::DataRange;

/// Viewport data range as persisted in a chart snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportState {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            x_min: 0.0,
            x_max: 100.0,
            y_min: 0.0,
            y_max: 100.0,
        }
    }
}

impl From<DataRange> for ViewportState {
    fn from(r: DataRange) -> Self {
        Self {
            x_min: r.x_min,
            x_max: r.x_max,
            y_min: r.y_min,
            y_max: r.y_max,
        }
    }
}

impl From<ViewportState> for DataRange {
    fn from(s: ViewportState) -> Self {
        Self {
            x_min: s.x_min,
            x_max: s.x_max,
            y_min: s.y_min,
            y_max: s.y_max,
        }
    }
}

/// Serialisable chart configuration: everything needed to restore a user's
/// view of a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartState {
    pub version: String,
    pub viewport: ViewportState,
    #[serde(default)]
    pub drawings: Vec<Drawing>,
    #[serde(default)]
    pub theme: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub timeframe: String,
}

impl Default for ChartState {
    fn default() -> Self {
        Self {
            version: String::from("1.0"),
            viewport: ViewportState::default(),
            drawings: Vec::new(),
            theme: String::new(),
            symbol: String::new(),
            timeframe: String::new(),
        }
    }
}

pub fn serialize_chart_state(state: &ChartState) -> String {
    serde_json::to_string(state).expect("chart state serialisation cannot fail")
}

pub fn deserialize_chart_state(json: &str) -> Result<ChartState, serde_json::Error> {
    serde_json::from_str(json)
}

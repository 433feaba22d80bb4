use serde::Serialize;

use crate::constants::{DEEPFAKE_COLOR, DEEPFAKE_LABEL, PIE_HOLE, REAL_COLOR, REAL_LABEL};

/// One wedge of a pie chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub label: &'static str,
    pub value: u64,
    pub color: &'static str,
    /// Share of the whole, in percent
    pub percent: f64,
}

/// Donut chart description handed to the client for rendering
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieChart {
    pub title: String,
    pub hole: f32,
    pub slices: Vec<PieSlice>,
}

impl PieChart {
    /// Real vs. deepfake chart, or `None` when there is nothing to draw
    pub fn real_vs_fake(title: impl Into<String>, real: u64, fake: u64) -> Option<Self> {
        let total = real + fake;
        if total == 0 {
            return None;
        }

        let percent = |v: u64| (v as f64 / total as f64) * 100.0;
        let slices = [(REAL_LABEL, real, REAL_COLOR), (DEEPFAKE_LABEL, fake, DEEPFAKE_COLOR)]
            .into_iter()
            .filter(|(_, value, _)| *value > 0)
            .map(|(label, value, color)| PieSlice {
                label,
                value,
                color,
                percent: percent(value),
            })
            .collect();

        Some(PieChart {
            title: title.into(),
            hole: PIE_HOLE,
            slices,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_chart_is_none() {
        assert!(PieChart::real_vs_fake("Overall", 0, 0).is_none());
    }

    #[test]
    fn test_percentages() {
        let chart = PieChart::real_vs_fake("Overall", 3, 1).unwrap();
        assert_eq!(chart.slices.len(), 2);
        assert_eq!(chart.slices[0].label, REAL_LABEL);
        assert!((chart.slices[0].percent - 75.0).abs() < 1e-9);
        assert!((chart.slices[1].percent - 25.0).abs() < 1e-9);
        assert_eq!(chart.slices[1].color, DEEPFAKE_COLOR);
    }

    #[test]
    fn test_zero_slice_omitted() {
        let chart = PieChart::real_vs_fake("Day", 0, 4).unwrap();
        assert_eq!(chart.slices.len(), 1);
        assert_eq!(chart.slices[0].label, DEEPFAKE_LABEL);
    }
}

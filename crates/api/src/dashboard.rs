//! Dashboard Page
//!
//! A single static page that polls the query endpoint and draws a chart, a
//! history table and a focus panel for one location. The server injects its
//! settings into the page as JSON so browser and server share one source.

use axum::{extract::State, response::Html};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::routes::sensors::SENSORS_PATH;
use crate::AppState;

const TEMPLATE: &str = include_str!("../assets/dashboard.html");
const CONFIG_PLACEHOLDER: &str = "__DASHBOARD_CONFIG__";

/// Dashboard settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Poll interval for the query endpoint (seconds)
    pub poll_interval_secs: u64,
    /// Location highlighted in the focus panel
    pub focus_location: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 10,
            focus_location: "Ubicacion 1".to_string(),
        }
    }
}

/// Football cleat recommendation for a humidity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CleatType {
    /// Firm ground, dry pitch
    HardSole,
    Intermediate,
    /// Soft ground, wet pitch
    Long,
}

impl CleatType {
    /// Upper humidity bounds (inclusive), checked in order
    pub const THRESHOLDS: [(f64, CleatType); 2] =
        [(30.0, CleatType::HardSole), (60.0, CleatType::Intermediate)];

    /// Pick the cleat type for a humidity percentage
    pub fn for_humidity(humidity: f64) -> Self {
        Self::THRESHOLDS
            .iter()
            .find(|(max, _)| humidity <= *max)
            .map(|(_, cleat)| *cleat)
            .unwrap_or(CleatType::Long)
    }

    /// Label shown on the dashboard
    pub fn label(&self) -> &'static str {
        match self {
            CleatType::HardSole => "Suela dura",
            CleatType::Intermediate => "Tacos intermedios",
            CleatType::Long => "Tacos largos",
        }
    }
}

#[derive(Debug, Serialize)]
struct CleatRule {
    /// `None` for the catch-all rule
    max: Option<f64>,
    label: &'static str,
}

#[derive(Debug, Serialize)]
struct PageConfig<'a> {
    api_path: &'static str,
    poll_interval_ms: u64,
    focus_location: &'a str,
    cleat_rules: Vec<CleatRule>,
}

/// Render the page with settings embedded
pub fn render_page(config: &DashboardConfig) -> String {
    let mut cleat_rules: Vec<CleatRule> = CleatType::THRESHOLDS
        .iter()
        .map(|(max, cleat)| CleatRule {
            max: Some(*max),
            label: cleat.label(),
        })
        .collect();
    cleat_rules.push(CleatRule {
        max: None,
        label: CleatType::Long.label(),
    });

    let page = PageConfig {
        api_path: SENSORS_PATH,
        poll_interval_ms: config.poll_interval_secs.max(1).saturating_mul(1000),
        focus_location: &config.focus_location,
        cleat_rules,
    };

    // Serializing plain strings and numbers cannot fail
    let json = serde_json::to_string(&page).unwrap_or_else(|_| "{}".to_string());
    // Keep a `</script>` inside a location label from closing the block
    let json = json.replace("</", "<\\/");

    TEMPLATE.replace(CONFIG_PLACEHOLDER, &json)
}

/// Serve the dashboard
pub async fn dashboard_page(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(render_page(&state.dashboard))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleat_thresholds() {
        assert_eq!(CleatType::for_humidity(0.0), CleatType::HardSole);
        assert_eq!(CleatType::for_humidity(30.0), CleatType::HardSole);
        assert_eq!(CleatType::for_humidity(30.5), CleatType::Intermediate);
        assert_eq!(CleatType::for_humidity(60.0), CleatType::Intermediate);
        assert_eq!(CleatType::for_humidity(61.0), CleatType::Long);
        assert_eq!(CleatType::for_humidity(100.0).label(), "Tacos largos");
    }

    #[test]
    fn test_render_embeds_config() {
        let html = render_page(&DashboardConfig {
            poll_interval_secs: 15,
            focus_location: "Ubicacion 3".to_string(),
        });
        assert!(!html.contains(CONFIG_PLACEHOLDER));
        assert!(html.contains(r#""poll_interval_ms":15000"#));
        assert!(html.contains(r#""focus_location":"Ubicacion 3""#));
        assert!(html.contains(r#""api_path":"/api/sensors""#));
        assert!(html.contains(r#""label":"Tacos intermedios""#));
    }

    #[test]
    fn test_render_only_embeds_fields_the_page_reads() {
        let html = render_page(&DashboardConfig::default());
        assert!(!html.contains("recent_limit"));
    }

    #[test]
    fn test_render_escapes_script_close() {
        let html = render_page(&DashboardConfig {
            focus_location: "</script><b>".to_string(),
            ..Default::default()
        });
        assert!(!html.contains("</script><b>"));
        assert!(html.contains(r#"<\/script><b>"#));
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let html = render_page(&DashboardConfig {
            poll_interval_secs: 0,
            ..Default::default()
        });
        assert!(html.contains(r#""poll_interval_ms":1000"#));
    }
}

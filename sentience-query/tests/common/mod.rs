use std::sync::OnceLock;

use sentience_common::observability::{LogConfig, LogFormat};
use sentience_query::{Element, Snapshot, Tier, VisualCues};

static INIT_PATH: OnceLock<std::path::PathBuf> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "sentience-tests",
            log_dir: Some(std::env::temp_dir().join("sentience-tests")),
            emit_stderr: true,
            format: if std::env::var("SENTIENCE_LOG_FORMAT")
                .map(|raw| raw.trim().eq_ignore_ascii_case("json"))
                .unwrap_or(false)
            {
                LogFormat::Json
            } else {
                LogFormat::Text
            },
            default_filter: "debug".to_string(),
        };

        sentience_common::observability::init_logging(config).unwrap_or_default()
    });
}

/// The two sign-in buttons used throughout the engine tests.
pub fn sign_in_page(tier: Tier) -> Snapshot {
    Snapshot::new(
        vec![
            Element::new(1, "button").with_text("Sign In").with_importance(900.0),
            Element::new(2, "button").with_text("Sign Up").with_importance(400.0),
        ],
        tier,
    )
}

/// A busier page mixing roles, optional fields and visual cues.
pub fn landing_page(tier: Tier) -> Snapshot {
    Snapshot::new(
        vec![
            Element::new(10, "link")
                .with_text("Pricing")
                .with_importance(120.0)
                .with_bbox(400.0, 10.0, 60.0, 20.0)
                .clickable(true),
            Element::new(11, "textbox")
                .with_name("Email address")
                .with_importance(640.0)
                .with_bbox(100.0, 300.0, 280.0, 36.0)
                .clickable(true),
            Element::new(12, "button")
                .with_text("Get started")
                .with_importance(880.0)
                .with_bbox(100.0, 350.0, 140.0, 44.0)
                .with_visual_cues(VisualCues {
                    is_primary: true,
                    background_color_name: Some("blue".into()),
                    is_clickable: true,
                }),
            Element::new(13, "img").with_importance(50.0).with_bbox(0.0, 0.0, 1200.0, 400.0),
            Element::new(14, "link")
                .with_text("Sign in")
                .with_importance(640.0)
                .with_bbox(1100.0, 10.0, 60.0, 20.0)
                .clickable(true),
            Element::new(15, "button")
                .with_text("Cookie settings")
                .with_importance(0.0)
                .clickable(true),
        ],
        tier,
    )
}

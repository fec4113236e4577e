use anyhow::{Context, Result};
use sentience_config::SentienceConfig;
use sentience_drivers::sentience_browser::{
    cache::CachedSnapshot,
    capture::{SnapshotOptions, SnapshotSource},
    driver::{DriverSettings, SentienceDriver},
};
use sentience_query::{
    DiffStatus, Element, Query, Snapshot, SnapshotDiff, Tier, masked_element, query_elements,
};
use serde::Serialize;
use serde_json::Value;
use std::{borrow::Cow, fs, io::Write, path::Path, sync::Arc, time::Duration};
use tracing::info;

/// Read a saved snapshot. The second value reports whether the file carried
/// its own `tier` marker.
pub fn load_snapshot(path: &Path) -> Result<(Snapshot, bool)> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let value: Value =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    let has_tier = value.get("tier").is_some();
    let snapshot: Snapshot = serde_json::from_value(value)
        .with_context(|| format!("{} is not a snapshot", path.display()))?;
    if snapshot.is_error() {
        anyhow::bail!(
            "{} holds a failed capture: {}",
            path.display(),
            snapshot.error.as_deref().unwrap_or("no detail")
        );
    }
    Ok((snapshot, has_tier))
}

fn describe(el: &Element) -> String {
    let label = el.text.as_deref().or(el.name.as_deref()).unwrap_or("");
    format!("{}\t{}\t{:?}\t{}", el.id, el.role, label, el.importance)
}

/// Print matches as the snapshot's tier sees them; gated fields are masked.
pub fn run_query(
    out: &mut impl Write,
    config: &SentienceConfig,
    path: &Path,
    selector: &str,
    tier: Option<Tier>,
    find: bool,
    json: bool,
) -> Result<()> {
    let q = Query::parse(selector)?;
    let (snapshot, has_tier) = load_snapshot(path)?;
    let tier = tier
        .or(has_tier.then_some(snapshot.tier))
        .unwrap_or_else(|| config.effective_tier());
    let snapshot = snapshot.with_tier(tier);

    let mut matched = query_elements(&snapshot, &q);
    if find {
        matched.truncate(1);
    }
    info!(target: "app.query", selector = %q, ?tier, matched = matched.len(), "query evaluated");

    let shown: Vec<Cow<'_, Element>> =
        matched.into_iter().map(|el| masked_element(el, tier)).collect();
    if json {
        serde_json::to_writer_pretty(&mut *out, &shown)?;
        writeln!(out)?;
    } else {
        for el in &shown {
            writeln!(out, "{}", describe(el))?;
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct DiffRow<'a> {
    element: Cow<'a, Element>,
    status: Option<DiffStatus>,
}

pub fn run_diff(
    out: &mut impl Write,
    current: &Path,
    previous: Option<&Path>,
    json: bool,
) -> Result<()> {
    let (current, _) = load_snapshot(current)?;
    let previous = previous.map(load_snapshot).transpose()?.map(|(s, _)| s);
    let tier = current.tier;
    let diff = SnapshotDiff::compute(&current, previous.as_ref());

    if json {
        let rows: Vec<DiffRow<'_>> = diff
            .iter()
            .map(|d| DiffRow {
                element: masked_element(d.element, tier),
                status: d.status,
            })
            .collect();
        serde_json::to_writer_pretty(&mut *out, &rows)?;
        writeln!(out)?;
        return Ok(());
    }
    for (status, element) in diff.iter().filter_map(|d| d.status.map(|s| (s, d.element))) {
        writeln!(out, "{status:?}\t{}", describe(&masked_element(element, tier)))?;
    }
    Ok(())
}

pub fn driver_settings(config: &SentienceConfig) -> DriverSettings {
    DriverSettings {
        webdriver_url: config.browser.webdriver_url.clone(),
        headless: config.browser.headless,
        extension_dir: config.browser.extension_dir.clone(),
        extension_timeout: Duration::from_millis(config.browser.extension_timeout_ms),
    }
}

pub fn snapshot_options(config: &SentienceConfig) -> SnapshotOptions {
    SnapshotOptions {
        limit: config.snapshot.limit,
        screenshot: config.snapshot.screenshot.then_some(true),
        filter: None,
        license_key: config.license_key.clone(),
    }
}

/// Snapshot cache in front of `source`, expiring after `snapshot.cache_max_age_ms`.
pub fn snapshot_cache<S>(source: S, config: &SentienceConfig) -> CachedSnapshot<S>
where
    S: SnapshotSource,
{
    CachedSnapshot::with_max_age(
        source,
        snapshot_options(config),
        Duration::from_millis(config.snapshot.cache_max_age_ms),
    )
}

async fn capture(config: &SentienceConfig, url: &str) -> Result<Arc<Snapshot>> {
    let driver = SentienceDriver::connect(driver_settings(config)).await?;
    let cache = snapshot_cache(driver, config);
    let captured = async {
        cache.source().goto(url).await?;
        cache.get(false).await
    }
    .await;
    cache.into_source().close().await?;
    Ok(captured?)
}

/// Capture `url` and write the snapshot to `dest`, or to `out` when no file
/// is given. Nothing is written unless the capture succeeds.
pub async fn run_capture(
    out: &mut impl Write,
    config: &SentienceConfig,
    url: &str,
    dest: Option<&Path>,
) -> Result<()> {
    let snapshot = capture(config, url).await?;
    let mut body = serde_json::to_vec_pretty(&*snapshot)?;
    body.push(b'\n');

    match dest {
        Some(path) => {
            fs::write(path, &body).with_context(|| format!("writing {}", path.display()))?;
            info!(target: "app.capture", %url, path = %path.display(), "snapshot saved");
        }
        None => out.write_all(&body)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentience_common::SentienceError;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const PAGE: &str = r#"{
        "status": "success",
        "url": "https://example.com/login",
        "elements": [
            { "id": 1, "role": "button", "text": "Sign In", "importance": 900,
              "bbox": { "x": 10, "y": 10, "width": 120, "height": 40 } },
            { "id": 2, "role": "button", "text": "Sign Up", "importance": 400,
              "bbox": { "x": 10, "y": 60, "width": 120, "height": 40 } },
            { "id": 3, "role": "link", "text": "Forgot password?", "importance": 200 }
        ]
    }"#;

    fn write(tmp: &TempDir, name: &str, body: &str) -> PathBuf {
        let p = tmp.path().join(name);
        fs::write(&p, body).unwrap();
        p
    }

    fn run(
        config: &SentienceConfig,
        path: &Path,
        selector: &str,
        tier: Option<Tier>,
        find: bool,
        json: bool,
    ) -> Result<String> {
        let mut buf = Vec::new();
        run_query(&mut buf, config, path, selector, tier, find, json)?;
        Ok(String::from_utf8(buf).unwrap())
    }

    #[test]
    fn untiered_files_use_the_configured_tier() {
        let tmp = TempDir::new().unwrap();
        let p = write(&tmp, "page.json", PAGE);
        let mut config = SentienceConfig::default();

        // free: importance masked, capture order
        let out = run(&config, &p, "role=button", None, false, false).unwrap();
        let ids: Vec<_> = out.lines().map(|l| l.split('\t').next().unwrap()).collect();
        assert_eq!(ids, ["1", "2"]);
        assert_eq!(run(&config, &p, "importance>500", None, false, false).unwrap(), "");

        config.license_key = Some("sk-live".into());
        let out = run(&config, &p, "importance>500", None, true, false).unwrap();
        assert!(out.starts_with("1\tbutton\t\"Sign In\""));
    }

    #[test]
    fn explicit_tier_beats_the_file() {
        let tmp = TempDir::new().unwrap();
        let tiered = PAGE.replacen("\"status\"", "\"tier\": \"free\", \"status\"", 1);
        let p = write(&tmp, "page.json", &tiered);
        let config = SentienceConfig::default();

        assert_eq!(run(&config, &p, "importance>500", None, false, false).unwrap(), "");
        let out = run(&config, &p, "importance>500", Some(Tier::Elevated), false, false).unwrap();
        assert_eq!(out.lines().count(), 1);
    }

    #[test]
    fn empty_json_result_is_an_empty_array() {
        let tmp = TempDir::new().unwrap();
        let p = write(&tmp, "page.json", PAGE);
        let out = run(&SentienceConfig::default(), &p, "role=checkbox", None, false, true).unwrap();
        assert_eq!(out.trim(), "[]");
    }

    #[test]
    fn bad_selectors_fail_before_reading_the_file() {
        let err = run(
            &SentienceConfig::default(),
            Path::new("/nonexistent/page.json"),
            "foo=bar",
            None,
            false,
            false,
        )
        .unwrap_err();
        assert!(err.to_string().contains("foo"), "{err}");
    }

    #[test]
    fn error_captures_are_rejected() {
        let tmp = TempDir::new().unwrap();
        let p = write(&tmp, "bad.json", r#"{ "status": "error", "error": "extension timeout" }"#);
        let err = load_snapshot(&p).unwrap_err();
        assert!(err.to_string().contains("extension timeout"));
    }

    #[test]
    fn diff_lists_changes_only() {
        let tmp = TempDir::new().unwrap();
        let before = write(&tmp, "before.json", PAGE);
        let moved = PAGE
            .replace(r#""y": 60"#, r#""y": 90"#)
            .replace(r#""id": 3"#, r#""id": 4"#);
        let after = write(&tmp, "after.json", &moved);

        let mut buf = Vec::new();
        run_diff(&mut buf, &after, Some(&before), false).unwrap();
        let out = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 3, "{out}");
        assert!(lines[0].starts_with("Moved\t2"));
        assert!(lines[1].starts_with("Added\t4"));
        assert!(lines[2].starts_with("Removed\t3"));
    }

    const PRIMARY_BUTTON: &str = r#"{
        "elements": [
            { "id": 1, "role": "button", "text": "Sign In", "importance": 900,
              "visual_cues": { "is_primary": true, "background_color_name": "blue",
                               "is_clickable": true } }
        ]
    }"#;

    #[test]
    fn free_tier_output_shows_masked_values() {
        let tmp = TempDir::new().unwrap();
        let p = write(&tmp, "page.json", PRIMARY_BUTTON);
        let config = SentienceConfig::default();

        let line = run(&config, &p, "role=button", None, false, false).unwrap();
        assert_eq!(line.trim_end(), "1\tbutton\t\"Sign In\"\t0");

        let json: Value =
            serde_json::from_str(&run(&config, &p, "role=button", None, false, true).unwrap())
                .unwrap();
        assert_eq!(json[0]["importance"], 0.0);
        assert_eq!(json[0]["visual_cues"]["is_primary"], false);
        assert!(json[0]["visual_cues"]["background_color_name"].is_null());
        assert_eq!(json[0]["visual_cues"]["is_clickable"], true);

        // elevated callers see what was captured
        let line = run(&config, &p, "role=button", Some(Tier::Elevated), false, false).unwrap();
        assert!(line.trim_end().ends_with("\t900"), "{line}");
    }

    #[test]
    fn diff_output_is_masked_for_free_snapshots() {
        let tmp = TempDir::new().unwrap();
        let p = write(&tmp, "page.json", PRIMARY_BUTTON);

        let mut buf = Vec::new();
        run_diff(&mut buf, &p, None, true).unwrap();
        let json: Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(json[0]["status"], "ADDED");
        assert_eq!(json[0]["element"]["importance"], 0.0);
        assert_eq!(json[0]["element"]["visual_cues"]["is_primary"], false);
    }

    struct NeverCaptures;

    #[async_trait::async_trait]
    impl SnapshotSource for NeverCaptures {
        async fn snapshot(&self, _options: &SnapshotOptions) -> sentience_common::Result<Snapshot> {
            Err(SentienceError::Snapshot("not wired".into()))
        }
    }

    #[test]
    fn cache_follows_snapshot_settings() {
        let mut config = SentienceConfig::default();
        config.snapshot.cache_max_age_ms = 500;
        config.snapshot.limit = Some(30);
        config.license_key = Some("sk-live".into());

        let cache = snapshot_cache(NeverCaptures, &config);
        assert_eq!(cache.max_age(), Duration::from_millis(500));
        assert_eq!(cache.options().limit, Some(30));
        assert_eq!(cache.options().tier(), Tier::Elevated);
    }

    #[tokio::test]
    async fn failed_capture_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("snap.json");
        let mut config = SentienceConfig::default();
        config.browser.webdriver_url = "not a url".into();

        let mut out = Vec::new();
        let url = "https://example.com";
        let result = run_capture(&mut out, &config, url, Some(dest.as_path())).await;

        assert!(result.is_err());
        assert!(!dest.exists());
        assert!(out.is_empty());
    }
}

//! Snapshot CSVs and statistics reports of plotted channels

use anyhow::Context;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use sigview_cine::ChannelSnapshot;
use sigview_core::ChannelStats;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Statistics report of one channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelReport {
    pub id: String,
    pub generated_at: DateTime<Local>,
    pub channel: String,
    pub points: usize,
    pub stats: ChannelStats,
}

impl ChannelReport {
    pub fn from_snapshot(snapshot: &ChannelSnapshot) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            generated_at: Local::now(),
            channel: snapshot.channel.name().to_string(),
            points: snapshot.plotted.len(),
            stats: ChannelStats::calculate(&snapshot.plotted),
        }
    }
}

/// Write the plotted points as `time,value` rows to
/// `<dir>/snapshots/snapshot_<timestamp>.csv`
pub fn write_snapshot(dir: &Path, snapshot: &ChannelSnapshot) -> anyhow::Result<PathBuf> {
    let mut csv = format!("# {}\n", snapshot.channel.name());
    for point in &snapshot.plotted {
        writeln!(csv, "{},{}", point.time, point.value)?;
    }

    let path = unique_path(&dir.join("snapshots"), "snapshot", "csv", Local::now())?;
    fs::write(&path, csv).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Write a statistics report to `<dir>/reports/report_<timestamp>.json`
pub fn write_report(dir: &Path, report: &ChannelReport) -> anyhow::Result<PathBuf> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    let path = unique_path(&dir.join("reports"), "report", "json", report.generated_at)?;
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// `<dir>/<prefix>_<YYYYmmdd_HHMMSS>.<ext>`, numbered when several exports
/// land in the same second
fn unique_path(dir: &Path, prefix: &str, ext: &str, at: DateTime<Local>) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let stamp = at.format("%Y%m%d_%H%M%S");
    let mut path = dir.join(format!("{prefix}_{stamp}.{ext}"));
    let mut n = 1;
    while path.exists() {
        path = dir.join(format!("{prefix}_{stamp}_{n}.{ext}"));
        n += 1;
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_series;
    use sigview_core::{ChannelColor, ChannelId, SamplePoint, ViewRange};
    use tempfile::tempdir;

    fn snapshot() -> ChannelSnapshot {
        ChannelSnapshot {
            channel: ChannelId::Graph2,
            plotted: vec![
                SamplePoint::new(0.0, 1.0),
                SamplePoint::new(0.5, 3.0),
                SamplePoint::new(1.0, 2.0),
            ],
            buffered: 10,
            cursor: 3,
            playing: true,
            visible: true,
            color: ChannelColor::new("g"),
            view: ViewRange::new(0.0, 1.0),
            value_view: ViewRange::new(0.9, 3.1),
        }
    }

    #[test]
    fn test_snapshot_round_trips_through_loader() {
        let dir = tempdir().unwrap();
        let path = write_snapshot(dir.path(), &snapshot()).unwrap();

        assert!(path.starts_with(dir.path().join("snapshots")));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("snapshot_") && name.ends_with(".csv"));

        let (times, values) = load_series(&path).unwrap();
        assert_eq!(times, vec![0.0, 0.5, 1.0]);
        assert_eq!(values, vec![1.0, 3.0, 2.0]);
    }

    #[test]
    fn test_same_second_exports_do_not_collide() {
        let dir = tempdir().unwrap();
        let at = Local::now();
        let first = unique_path(dir.path(), "snapshot", "csv", at).unwrap();
        fs::write(&first, "").unwrap();
        let second = unique_path(dir.path(), "snapshot", "csv", at).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_report_contents() {
        let dir = tempdir().unwrap();
        let report = ChannelReport::from_snapshot(&snapshot());
        assert_eq!(report.channel, "Graph 2");
        assert_eq!(report.points, 3);
        assert_eq!(report.stats.median, 2.0);
        assert_eq!(report.stats.max, 3.0);

        let path = write_report(dir.path(), &report).unwrap();
        let restored: ChannelReport =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(restored.id, report.id);
        assert_eq!(restored.stats, report.stats);
    }
}

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Minimal serialized camera pose, enough to restore where the camera was
/// looking from and at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub position: [f32; 3],
    pub pitch: f32,
    pub yaw: f32,
}

/// One timestamped sample on a recorded camera path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseSample {
    pub time_ms: u64,
    pub pose: CameraPose,
}

/// Records the camera pose once per frame for a fixed duration, then writes
/// the whole path as JSON. Playback/interpolation is a later concern; the
/// format is just the sample list.
#[derive(Debug)]
pub struct PathRecorder {
    out_dir: PathBuf,
    samples: Vec<PoseSample>,
    started_at: Option<f32>,
    duration: f32,
}

impl PathRecorder {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            samples: Vec::new(),
            started_at: None,
            duration: 0.0,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.started_at.is_some()
    }

    /// Begin recording `duration` seconds of camera path starting at `now`.
    pub fn start(&mut self, now: f32, duration: f32) {
        log::info!("recording camera path for {duration:.1}s");
        self.samples.clear();
        self.started_at = Some(now);
        self.duration = duration;
    }

    /// Feed the current pose. Once the duration has elapsed the path is
    /// flushed to disk and recording stops. Returns the output file when a
    /// recording completed on this call.
    pub fn record(&mut self, now: f32, pose: CameraPose) -> Option<PathBuf> {
        let started_at = self.started_at?;

        if now - started_at < self.duration {
            self.samples.push(PoseSample {
                time_ms: ((now - started_at) * 1000.0) as u64,
                pose,
            });
            return None;
        }

        self.started_at = None;
        match self.flush() {
            Ok(path) => Some(path),
            Err(err) => {
                log::error!("failed to write camera recording: {err:#}");
                None
            }
        }
    }

    fn flush(&mut self) -> Result<PathBuf> {
        fs::create_dir_all(&self.out_dir)
            .with_context(|| format!("creating recording dir {:?}", self.out_dir))?;

        let filename = format!(
            "camera-{}.json",
            chrono::Utc::now().format("%Y-%m-%dT%H-%M-%S")
        );
        let path = self.out_dir.join(filename);

        let json = serde_json::to_string_pretty(&self.samples)?;
        fs::write(&path, json).with_context(|| format!("writing recording to {path:?}"))?;

        log::info!("wrote {} camera samples to {path:?}", self.samples.len());
        self.samples.clear();
        Ok(path)
    }
}

/// Load a previously recorded camera path.
pub fn load_path(path: impl AsRef<Path>) -> Result<Vec<PoseSample>> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).with_context(|| format!("reading {path:?}"))?;
    Ok(serde_json::from_str(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pose(y: f32) -> CameraPose {
        CameraPose {
            position: [0.0, y, 0.0],
            pitch: 0.0,
            yaw: -90.0,
        }
    }

    #[test]
    fn pose_serializes_to_flat_record() {
        let json = serde_json::to_string(&pose(3.0)).unwrap();
        assert!(json.contains("\"position\":[0.0,3.0,0.0]"));
        assert!(json.contains("\"yaw\":-90.0"));
    }

    #[test]
    fn recorder_is_idle_until_started() {
        let mut recorder = PathRecorder::new(std::env::temp_dir());
        assert!(!recorder.is_recording());
        assert!(recorder.record(1.0, pose(0.0)).is_none());
        assert!(recorder.samples.is_empty());
    }

    #[test]
    fn recorder_collects_samples_with_relative_times() {
        let mut recorder = PathRecorder::new(std::env::temp_dir());
        recorder.start(10.0, 5.0);

        recorder.record(10.0, pose(0.0));
        recorder.record(10.5, pose(1.0));
        recorder.record(12.0, pose(2.0));

        assert_eq!(recorder.samples.len(), 3);
        assert_eq!(recorder.samples[1].time_ms, 500);
        assert_eq!(recorder.samples[2].time_ms, 2000);
    }

    #[test]
    fn recorder_flushes_after_duration_and_stops() {
        let dir = std::env::temp_dir().join("catwalk-recorder-test");
        let mut recorder = PathRecorder::new(&dir);
        recorder.start(0.0, 1.0);

        recorder.record(0.0, pose(0.0));
        recorder.record(0.5, pose(1.0));
        let written = recorder.record(1.5, pose(2.0));

        let path = written.expect("recording should flush once the duration elapsed");
        assert!(!recorder.is_recording());

        let samples = load_path(&path).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].pose, pose(1.0));

        std::fs::remove_file(path).ok();
    }
}

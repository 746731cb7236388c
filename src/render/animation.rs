//! Frame assembly into a looping GIF, and removal of the intermediate frames

use crate::error::{PoolError, Result};
use crate::render::ensure_parent_dir;
use plotters::prelude::*;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Combines rendered frame images into one animation file
pub trait FrameAssembler {
    fn assemble(&self, frames: &[PathBuf], output: &Path, frame_delay_ms: u32) -> Result<()>;
}

/// Writes an infinitely looping GIF through plotters' GIF backend
#[derive(Debug, Clone, Copy, Default)]
pub struct GifAssembler;

impl FrameAssembler for GifAssembler {
    fn assemble(&self, frames: &[PathBuf], output: &Path, frame_delay_ms: u32) -> Result<()> {
        let assembly_error = |message: String| PoolError::Assembly {
            path: output.to_path_buf(),
            message,
        };

        if frames.is_empty() {
            return Err(assembly_error("no frames to assemble".to_string()));
        }

        // Decode everything up front so a bad frame leaves no partial GIF behind
        let mut decoded = Vec::with_capacity(frames.len());
        for frame in frames {
            let image = image::open(frame)
                .map_err(|e| assembly_error(format!("{}: {}", frame.display(), e)))?
                .to_rgb8();
            decoded.push((frame, image.dimensions(), image.into_raw()));
        }

        let dims = decoded[0].1;
        if let Some((frame, other, _)) = decoded.iter().find(|(_, d, _)| *d != dims) {
            return Err(assembly_error(format!(
                "{} is {}×{} px, expected {}×{} px",
                frame.display(),
                other.0,
                other.1,
                dims.0,
                dims.1
            )));
        }

        ensure_parent_dir(output)?;
        let root = BitMapBackend::gif(output, dims, frame_delay_ms)
            .map_err(|e| assembly_error(e.to_string()))?
            .into_drawing_area();

        for (frame, (w, h), buffer) in decoded {
            let element: BitMapElement<(i32, i32)> =
                BitMapElement::with_owned_buffer((0, 0), (w, h), buffer).ok_or_else(|| {
                    assembly_error(format!("{}: pixel buffer size mismatch", frame.display()))
                })?;
            root.draw(&element)
                .map_err(|e| assembly_error(e.to_string()))?;
            root.present()
                .map_err(|e| assembly_error(e.to_string()))?;
            debug!("Added frame {}", frame.display());
        }

        info!(
            "Assembled {} frame(s) into {} ({} ms per frame)",
            frames.len(),
            output.display(),
            frame_delay_ms
        );
        Ok(())
    }
}

/// Delete each frame file, collecting failures instead of stopping
pub fn cleanup_frames(frames: &[PathBuf]) -> Vec<(PathBuf, io::Error)> {
    frames
        .iter()
        .filter_map(|frame| match std::fs::remove_file(frame) {
            Ok(()) => None,
            Err(e) => {
                warn!("Could not remove frame {}: {}", frame.display(), e);
                Some((frame.clone(), e))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn write_frame(dir: &TempDir, name: &str, (w, h): (u32, u32), color: [u8; 3]) -> PathBuf {
        let path = dir.path().join(name);
        RgbImage::from_pixel(w, h, Rgb(color)).save(&path).unwrap();
        path
    }

    #[test]
    fn test_assemble_writes_gif() {
        let dir = TempDir::new().unwrap();
        let frames = vec![
            write_frame(&dir, "frame_2017.png", (40, 30), [255, 0, 0]),
            write_frame(&dir, "frame_2019.png", (40, 30), [0, 0, 255]),
        ];
        let output = dir.path().join("out/standings.gif");

        GifAssembler.assemble(&frames, &output, 2500).unwrap();

        let bytes = std::fs::read(&output).unwrap();
        assert!(bytes.starts_with(b"GIF89a"));
        // Frames are inputs only; assembly does not consume them
        assert!(frames.iter().all(|f| f.exists()));
    }

    #[test]
    fn test_mismatched_dimensions_rejected() {
        let dir = TempDir::new().unwrap();
        let frames = vec![
            write_frame(&dir, "a.png", (40, 30), [0, 0, 0]),
            write_frame(&dir, "b.png", (20, 30), [0, 0, 0]),
        ];
        let output = dir.path().join("standings.gif");

        let err = GifAssembler.assemble(&frames, &output, 100).unwrap_err();
        assert!(matches!(err, PoolError::Assembly { .. }));
        assert!(err.to_string().contains("b.png"));
        assert!(!output.exists());
    }

    #[test]
    fn test_no_frames_rejected() {
        let dir = TempDir::new().unwrap();
        let err = GifAssembler
            .assemble(&[], &dir.path().join("standings.gif"), 100)
            .unwrap_err();
        assert!(err.to_string().contains("no frames to assemble"));
    }

    #[test]
    fn test_unreadable_frame_rejected() {
        let dir = TempDir::new().unwrap();
        let bogus = dir.path().join("frame_2020.png");
        std::fs::write(&bogus, b"not a png").unwrap();
        let err = GifAssembler
            .assemble(&[bogus], &dir.path().join("standings.gif"), 100)
            .unwrap_err();
        assert!(matches!(err, PoolError::Assembly { .. }));
    }

    #[test]
    fn test_cleanup_reports_each_failure() {
        let dir = TempDir::new().unwrap();
        let present = write_frame(&dir, "frame_2017.png", (4, 4), [0, 0, 0]);
        let missing = dir.path().join("frame_2018.png");

        let failures = cleanup_frames(&[present.clone(), missing.clone()]);

        assert!(!present.exists());
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, missing);
        assert_eq!(failures[0].1.kind(), io::ErrorKind::NotFound);
    }
}

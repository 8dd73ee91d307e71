//! Predefined set arrangements persisted as `.pos` files.
//!
//! The format is line oriented: line 1 is `grid` or `custom`, line 2
//! the item count, line 3 the grid dimensions as `WxH`. Grid files
//! then carry one `l <fraction>` line per row and one `c <fraction>`
//! line per column; custom files carry one `p <x>:<y> <w>:<h>` line
//! per rectangle, coordinates relative to the sets area.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::settings::SetsPositionSettings;
use crate::types::{LayoutError, Rect, Result};

/// One parsed `.pos` file
#[derive(Debug, Clone, PartialEq)]
pub struct PositionsFile {
    pub path: PathBuf,
    pub settings: SetsPositionSettings,
    /// The declared item count (line 2)
    pub nb_photos: usize,
}

/// Serialize an arrangement to the `.pos` text format.
pub fn write_positions(settings: &SetsPositionSettings, nb_photos: usize) -> String {
    let mut out = String::new();
    if settings.custom_mode {
        out.push_str("custom\n");
        let _ = writeln!(out, "{}", settings.relative_rects.len());
        let _ = writeln!(out, "{}x{}", settings.nb_photos_h, settings.nb_photos_v);
        for rect in &settings.relative_rects {
            let _ = writeln!(out, "p {}:{} {}:{}", rect.x, rect.y, rect.width, rect.height);
        }
    } else {
        out.push_str("grid\n");
        let _ = writeln!(out, "{}", nb_photos);
        let _ = writeln!(out, "{}x{}", settings.nb_photos_h, settings.nb_photos_v);
        for height in &settings.lines_height {
            let _ = writeln!(out, "l {}", height);
        }
        for width in &settings.columns_width {
            let _ = writeln!(out, "c {}", width);
        }
    }
    out
}

/// Parse the `.pos` text format. Any malformed line (wrong token
/// count, unparsable number, rectangle leaving the unit square)
/// invalidates the whole file.
pub fn parse_positions(content: &str) -> Option<(SetsPositionSettings, usize)> {
    let mut settings = SetsPositionSettings {
        custom_mode: false,
        nb_photos_h: 0,
        nb_photos_v: 0,
        lines_height: Vec::new(),
        columns_width: Vec::new(),
        relative_rects: Vec::new(),
    };
    let mut nb_photos = 0usize;

    for (index, line) in content.lines().enumerate() {
        if line.is_empty() {
            break;
        }

        match index {
            0 => settings.custom_mode = line == "custom",
            1 => nb_photos = line.parse().ok()?,
            2 => {
                let (w, h) = line.split_once('x')?;
                settings.nb_photos_h = w.parse().ok()?;
                settings.nb_photos_v = h.parse().ok()?;
            }
            _ if settings.custom_mode => {
                if settings.relative_rects.len() == nb_photos {
                    break;
                }
                let mut parts = line.split(' ');
                if parts.next() != Some("p") {
                    return None;
                }
                let (x, y) = parse_pair(parts.next()?)?;
                let (w, h) = parse_pair(parts.next()?)?;
                if parts.next().is_some() {
                    return None;
                }
                if x + w > 1.0 || y + h > 1.0 {
                    return None;
                }
                settings.relative_rects.push(Rect::new(x, y, w, h));
            }
            _ => {
                let (kind, value) = line.split_once(' ')?;
                let value: f64 = value.parse().ok()?;
                match kind {
                    "l" => {
                        if settings.lines_height.len() == settings.nb_photos_v {
                            break;
                        }
                        settings.lines_height.push(value);
                    }
                    "c" => {
                        if settings.columns_width.len() == settings.nb_photos_h {
                            break;
                        }
                        settings.columns_width.push(value);
                    }
                    _ => return None,
                }
            }
        }
    }

    Some((settings, nb_photos))
}

fn parse_pair(token: &str) -> Option<(f64, f64)> {
    let (a, b) = token.split_once(':')?;
    Some((a.parse().ok()?, b.parse().ok()?))
}

/// An explicitly owned registry of predefined arrangements, loaded
/// from a directory of `.pos` files. Reload is explicit; there is no
/// process-wide cache.
#[derive(Debug, Default)]
pub struct PositionsRegistry {
    dir: PathBuf,
    entries: Vec<PositionsFile>,
}

impl PositionsRegistry {
    /// Scan a directory for `.pos` files. Malformed files are logged
    /// and skipped; the scan itself only fails on IO errors reaching
    /// the directory.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let mut registry = Self {
            dir: dir.as_ref().to_owned(),
            entries: Vec::new(),
        };
        registry.reload()?;
        Ok(registry)
    }

    pub fn reload(&mut self) -> Result<()> {
        self.entries.clear();

        let mut paths: Vec<PathBuf> = std::fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("pos")
            })
            .collect();
        paths.sort();

        for path in paths {
            let content = match std::fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    log::warn!("Skipping unreadable {}: {}", path.display(), e);
                    continue;
                }
            };
            match parse_positions(&content) {
                Some((settings, nb_photos)) => self.entries.push(PositionsFile {
                    path,
                    settings,
                    nb_photos,
                }),
                None => log::warn!("Skipping malformed positions file {}", path.display()),
            }
        }

        Ok(())
    }

    /// Persist an arrangement into the registry directory and reload.
    pub fn save(
        &mut self,
        name: &str,
        settings: &SetsPositionSettings,
        nb_photos: usize,
    ) -> Result<PathBuf> {
        if name.is_empty() {
            return Err(LayoutError::Config("Empty positions name".to_string()));
        }
        let path = self.dir.join(format!("{name}.pos"));
        std::fs::write(&path, write_positions(settings, nb_photos))?;
        self.reload()?;
        Ok(path)
    }

    pub fn all(&self) -> &[PositionsFile] {
        &self.entries
    }
}

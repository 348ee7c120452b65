use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::domain::{MapRequestParams, MapStyle, Region, zoom_label};
use crate::download::{DownloadedMap, MapSink};
use crate::error::MapError;

/// Writes each map into a directory, one file per request.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl MapSink for FileSink {
    fn store(&mut self, region: &Region, map: DownloadedMap) -> Result<PathBuf, MapError> {
        fs::create_dir_all(&self.dir).map_err(|source| MapError::Persistence {
            path: self.dir.clone(),
            source,
        })?;

        let name = file_name(&region.name, &map.params, &map.image.content_type);
        let path = self.dir.join(name);
        write_atomically(&path, &map.image.bytes)?;
        Ok(path)
    }
}

/// Write through a hidden temporary file and rename it into place, so a
/// failed write never leaves a partial image behind.
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), MapError> {
    let persistence = |source| MapError::Persistence {
        path: path.to_path_buf(),
        source,
    };

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{}.part", file_name));

    let result = File::create(&tmp).and_then(|file| {
        let mut writer = BufWriter::new(file);
        writer.write_all(bytes)?;
        writer.flush()
    });

    if let Err(e) = result.and_then(|()| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(persistence(e));
    }

    Ok(())
}

/// `<region>_boundary<suffix>.<ext>` for provider-fitted views,
/// `<region>_z<zoom>_<label><suffix>.<ext>` for fixed zoom levels.
pub fn file_name(region: &str, params: &MapRequestParams, content_type: &str) -> String {
    let mut suffix = String::new();
    if params.style != MapStyle::Normal {
        suffix.push('_');
        suffix.push_str(params.style.maptype());
    }
    if params.layers.traffic {
        suffix.push_str("_traffic");
    }
    if !params.layers.labels {
        suffix.push_str("_nolabel");
    }

    let view = match params.zoom() {
        Some(zoom) => format!("z{}_{}", zoom, zoom_label(zoom)),
        None => "boundary".to_string(),
    };

    format!(
        "{}_{}{}.{}",
        sanitize(region),
        view,
        suffix,
        extension(content_type)
    )
}

fn extension(content_type: &str) -> &'static str {
    let ct = content_type.to_ascii_lowercase();
    if ct.contains("jpeg") || ct.contains("jpg") {
        "jpg"
    } else if ct.contains("gif") {
        "gif"
    } else if ct.contains("webp") {
        "webp"
    } else {
        "png"
    }
}

fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_whitespace()
                || matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
            {
                '_'
            } else {
                c
            }
        })
        .collect();

    if cleaned.is_empty() {
        "region".to_string()
    } else {
        cleaned
    }
}

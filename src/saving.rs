use bincode::{deserialize_from, serialize_into};
use chrono::{DateTime, Utc};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::pathfinding::PathTrace;
use crate::request::{PathRequest, SortRequest};
use crate::sorting::SortTrace;

/// Extension used for saved runs (gzip-compressed bincode).
pub const SAVE_EXTENSION: &str = "bin.gz";

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VisualizationKind {
    Sorting,
    Pathfinding,
}

impl std::str::FromStr for VisualizationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sorting" => Ok(VisualizationKind::Sorting),
            "pathfinding" => Ok(VisualizationKind::Pathfinding),
            other => Err(format!("unknown visualization type '{}'", other)),
        }
    }
}

/// The originating request together with the trace it produced.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VisualizationData {
    Sorting {
        request: SortRequest,
        trace: SortTrace,
    },
    Pathfinding {
        request: PathRequest,
        trace: PathTrace,
    },
}

/// A named run a user chose to keep for later replay.
///
/// `id` is assigned by [`VisualizationStore::save`] and is empty until then.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SavedVisualization {
    #[serde(default)]
    pub id: String,
    pub owner: String,
    pub name: String,
    pub data: VisualizationData,
    pub created_at: DateTime<Utc>,
}

impl SavedVisualization {
    pub fn new(owner: impl Into<String>, name: impl Into<String>, data: VisualizationData) -> Self {
        SavedVisualization {
            id: String::new(),
            owner: owner.into(),
            name: name.into(),
            data,
            created_at: Utc::now(),
        }
    }

    pub fn kind(&self) -> VisualizationKind {
        match self.data {
            VisualizationData::Sorting { .. } => VisualizationKind::Sorting,
            VisualizationData::Pathfinding { .. } => VisualizationKind::Pathfinding,
        }
    }
}

fn write_compressed<W: Write>(writer: W, visualization: &SavedVisualization) -> io::Result<W> {
    let encoder = GzEncoder::new(writer, Compression::default());
    let mut buffered = BufWriter::new(encoder);

    serialize_into(&mut buffered, visualization)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    let encoder = buffered.into_inner().map_err(|e| e.into_error())?;
    encoder.finish()
}

fn read_compressed<R: Read>(reader: R) -> io::Result<SavedVisualization> {
    let decoder = GzDecoder::new(reader);
    let mut reader = BufReader::new(decoder);

    deserialize_from(&mut reader).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Serializes a visualization into an in-memory gzip buffer.
pub fn encode(visualization: &SavedVisualization) -> io::Result<Vec<u8>> {
    write_compressed(Vec::new(), visualization)
}

/// Inverse of [`encode`].
pub fn decode(buffer: &[u8]) -> io::Result<SavedVisualization> {
    read_compressed(io::Cursor::new(buffer))
}

pub fn load_visualization(path: impl AsRef<Path>) -> io::Result<SavedVisualization> {
    read_compressed(File::open(path)?)
}

/// Turns a user-supplied name into a safe file stem.
///
/// Anything other than ASCII alphanumerics, `-` and `_` becomes `_`.
pub fn file_stem(name: &str) -> io::Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "name must not be empty",
        ));
    }
    Ok(trimmed
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect())
}

fn not_found(owner: &str, id: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("no visualization '{}' for {}", id, owner),
    )
}

/// Directory of saved visualizations.
///
/// Each owner gets a sub-directory and each save a new file named by its id,
/// so records are never overwritten. Sanitized owner names may share a
/// directory; the owner stored in the record is what scopes reads.
#[derive(Clone, Debug)]
pub struct VisualizationStore {
    dir: PathBuf,
}

impl VisualizationStore {
    /// Opens the store, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(VisualizationStore { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn owner_dir(&self, owner: &str) -> io::Result<PathBuf> {
        Ok(self.dir.join(file_stem(owner)?))
    }

    fn path_for(&self, owner: &str, id: &str) -> io::Result<PathBuf> {
        if id.is_empty() || file_stem(id)? != id {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("malformed visualization id '{}'", id),
            ));
        }
        Ok(self
            .owner_dir(owner)?
            .join(format!("{}.{}", id, SAVE_EXTENSION)))
    }

    /// Stores `visualization` as a new record and returns it with its id.
    ///
    /// The id is `<name>-<created_at millis>`, with a `-N` suffix when that
    /// file already exists.
    pub fn save(&self, visualization: &SavedVisualization) -> io::Result<SavedVisualization> {
        let owner_dir = self.owner_dir(&visualization.owner)?;
        fs::create_dir_all(&owner_dir)?;

        let base = format!(
            "{}-{}",
            file_stem(&visualization.name)?,
            visualization.created_at.timestamp_millis()
        );
        let mut attempt = 0;
        loop {
            let id = if attempt == 0 {
                base.clone()
            } else {
                format!("{}-{}", base, attempt)
            };
            let path = owner_dir.join(format!("{}.{}", id, SAVE_EXTENSION));

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => {
                    let mut stored = visualization.clone();
                    stored.id = id;
                    write_compressed(file, &stored)?;
                    debug!(
                        "saved visualization '{}' for {} to {}",
                        stored.name,
                        stored.owner,
                        path.display()
                    );
                    return Ok(stored);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e),
            }
        }
    }

    /// Loads one of `owner`'s records. Other owners' records are `NotFound`.
    pub fn load(&self, owner: &str, id: &str) -> io::Result<SavedVisualization> {
        let visualization = load_visualization(self.path_for(owner, id)?)?;
        if visualization.owner != owner {
            return Err(not_found(owner, id));
        }
        Ok(visualization)
    }

    pub fn delete(&self, owner: &str, id: &str) -> io::Result<()> {
        self.load(owner, id)?;
        fs::remove_file(self.path_for(owner, id)?)
    }

    /// Saved runs, newest first, optionally restricted to one owner and one
    /// kind.
    ///
    /// Files that fail to decode are skipped with a warning.
    pub fn list(
        &self,
        owner: Option<&str>,
        kind: Option<VisualizationKind>,
    ) -> io::Result<Vec<SavedVisualization>> {
        let dirs = match owner {
            Some(owner) => {
                let dir = self.owner_dir(owner)?;
                if dir.is_dir() { vec![dir] } else { Vec::new() }
            }
            None => {
                let mut dirs = Vec::new();
                for entry in fs::read_dir(&self.dir)? {
                    let path = entry?.path();
                    if path.is_dir() {
                        dirs.push(path);
                    }
                }
                dirs
            }
        };

        let suffix = format!(".{}", SAVE_EXTENSION);
        let mut saved = Vec::new();
        for dir in dirs {
            for entry in fs::read_dir(&dir)? {
                let path = entry?.path();
                let is_save = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(&suffix));
                if !is_save {
                    continue;
                }
                match load_visualization(&path) {
                    Ok(visualization) => {
                        if owner.is_none_or(|o| o == visualization.owner)
                            && kind.is_none_or(|k| k == visualization.kind())
                        {
                            saved.push(visualization);
                        }
                    }
                    Err(e) => warn!("skipping unreadable save {}: {}", path.display(), e),
                }
            }
        }

        saved.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sorting::{SortAlgorithm, run_sort};

    fn sample() -> SavedVisualization {
        let request = SortRequest {
            array: vec![3, 1, 2],
            algorithm: "insertion".to_string(),
        };
        let trace = run_sort(SortAlgorithm::Insertion, &request.array);
        SavedVisualization::new(
            "ada@example.com",
            "my run",
            VisualizationData::Sorting { request, trace },
        )
    }

    #[test]
    fn in_memory_encoding_survives() {
        let saved = sample();
        let bytes = encode(&saved).unwrap();
        assert_eq!(decode(&bytes).unwrap(), saved);
        assert_eq!(saved.kind(), VisualizationKind::Sorting);
    }

    #[test]
    fn garbage_is_invalid_data() {
        assert!(decode(b"not gzip at all").is_err());
    }

    #[test]
    fn kinds_parse_from_query_names() {
        assert_eq!("sorting".parse(), Ok(VisualizationKind::Sorting));
        assert_eq!("pathfinding".parse(), Ok(VisualizationKind::Pathfinding));
        assert!("maze".parse::<VisualizationKind>().is_err());
    }

    #[test]
    fn stems_are_sanitized() {
        assert_eq!(file_stem(" ../etc/passwd ").unwrap(), "___etc_passwd");
        assert_eq!(file_stem("bfs-maze_1").unwrap(), "bfs-maze_1");
        assert_eq!(
            file_stem("   ").unwrap_err().kind(),
            io::ErrorKind::InvalidInput
        );
    }
}

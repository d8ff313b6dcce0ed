//! Flat vector index with exact nearest-neighbor search
//!
//! Vectors are stored in insertion order; position `i` corresponds to
//! document `i` of the corpus the index was built from. Search is an exact
//! scan under squared Euclidean distance, so results are fully deterministic:
//! ascending distance, ties broken by ascending position.
//!
//! The index persists to a single binary artifact:
//!
//! ```text
//! magic (8) | format version (u32 LE) | dimension (u32 LE) | count (u32 LE)
//! | corpus digest (32) | zstd-compressed f32 LE payload
//! ```
//!
//! The corpus digest in the header ties the artifact to the exact corpus
//! bytes it was built from; loaders must reject the pair when either side
//! has been regenerated independently.

use std::cmp::Ordering;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

const MAGIC: &[u8; 8] = b"CMPSVIDX";
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 8 + 4 + 4 + 4 + 32;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Index must contain at least one vector")]
    Empty,

    #[error("Invalid dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Index artifact not found: {path}")]
    ArtifactNotFound { path: PathBuf },

    #[error("Corrupt index artifact: {path}: {message}")]
    CorruptArtifact { path: PathBuf, message: String },

    #[error("Index/corpus mismatch: {0}")]
    CorpusMismatch(String),

    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },
}

/// A single search hit: vector position and squared Euclidean distance
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Neighbor {
    pub position: usize,
    pub distance: f32,
}

/// Exact nearest-neighbor index over fixed-dimension vectors
pub struct VectorIndex {
    /// Row-major vector data, `count * dimension` values
    data: Vec<f32>,
    dimension: usize,
    count: usize,
}

impl VectorIndex {
    /// Build an index from vectors in insertion order
    ///
    /// All vectors must share the same dimensionality; the first vector fixes
    /// it. An empty input is rejected.
    pub fn build(vectors: &[Vec<f32>]) -> Result<Self, IndexError> {
        let first = vectors.first().ok_or(IndexError::Empty)?;
        let dimension = first.len();

        let mut data = Vec::with_capacity(vectors.len() * dimension);
        for vector in vectors {
            if vector.len() != dimension {
                return Err(IndexError::InvalidDimension {
                    expected: dimension,
                    actual: vector.len(),
                });
            }
            data.extend_from_slice(vector);
        }

        Ok(Self {
            data,
            dimension,
            count: vectors.len(),
        })
    }

    /// Search for the `k` nearest vectors to `query`
    ///
    /// Results are sorted by ascending squared Euclidean distance with ties
    /// broken by ascending position. A `k` larger than the stored count is
    /// clamped, never an error.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, IndexError> {
        if query.len() != self.dimension {
            return Err(IndexError::InvalidDimension {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut neighbors: Vec<Neighbor> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(position, vector)| Neighbor {
                position,
                distance: squared_l2(query, vector),
            })
            .collect();

        neighbors.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(Ordering::Equal)
                .then(a.position.cmp(&b.position))
        });

        neighbors.truncate(k.min(self.count));
        Ok(neighbors)
    }

    /// Persist the index to a binary artifact, recording the digest of the
    /// corpus it was built from
    ///
    /// The write is atomic: data goes to a temp file which is synced and then
    /// renamed over the final path.
    pub fn persist(&self, path: &Path, corpus_digest: &[u8; 32]) -> Result<(), IndexError> {
        let mut header = Vec::with_capacity(HEADER_LEN);
        header.extend_from_slice(MAGIC);
        header.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        header.extend_from_slice(&(self.dimension as u32).to_le_bytes());
        header.extend_from_slice(&(self.count as u32).to_le_bytes());
        header.extend_from_slice(corpus_digest);

        let mut payload = Vec::with_capacity(self.data.len() * 4);
        for value in &self.data {
            payload.extend_from_slice(&value.to_le_bytes());
        }
        let compressed = zstd::encode_all(&payload[..], 3).map_err(|e| IndexError::Io {
            source: e,
            context: "Failed to compress index payload".to_string(),
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| IndexError::Io {
                source: e,
                context: format!("Failed to create index directory: {}", parent.display()),
            })?;
        }

        let temp_path = path.with_extension("tmp");
        let mut file = std::fs::File::create(&temp_path).map_err(|e| IndexError::Io {
            source: e,
            context: format!("Failed to create temp index file: {}", temp_path.display()),
        })?;
        file.write_all(&header).and_then(|_| file.write_all(&compressed)).map_err(|e| {
            IndexError::Io {
                source: e,
                context: format!("Failed to write index artifact: {}", temp_path.display()),
            }
        })?;
        file.sync_all().map_err(|e| IndexError::Io {
            source: e,
            context: format!("Failed to sync index artifact: {}", temp_path.display()),
        })?;
        drop(file);

        std::fs::rename(&temp_path, path).map_err(|e| IndexError::Io {
            source: e,
            context: format!(
                "Failed to rename index artifact: {} -> {}",
                temp_path.display(),
                path.display()
            ),
        })?;

        tracing::info!(
            "Persisted index ({} vectors, {}D) to {}",
            self.count,
            self.dimension,
            path.display()
        );

        Ok(())
    }

    /// Load a persisted index, returning it with the corpus digest recorded
    /// at persist time
    pub fn load(path: &Path) -> Result<(Self, [u8; 32]), IndexError> {
        if !path.exists() {
            return Err(IndexError::ArtifactNotFound {
                path: path.to_path_buf(),
            });
        }

        let bytes = std::fs::read(path).map_err(|e| IndexError::Io {
            source: e,
            context: format!("Failed to read index artifact: {}", path.display()),
        })?;

        let corrupt = |message: String| IndexError::CorruptArtifact {
            path: path.to_path_buf(),
            message,
        };

        if bytes.len() < HEADER_LEN {
            return Err(corrupt("Truncated header".to_string()));
        }
        if &bytes[0..8] != MAGIC {
            return Err(corrupt("Bad magic".to_string()));
        }

        let version = u32::from_le_bytes(bytes[8..12].try_into().unwrap());
        if version != FORMAT_VERSION {
            return Err(corrupt(format!("Unsupported format version {}", version)));
        }

        let dimension = u32::from_le_bytes(bytes[12..16].try_into().unwrap()) as usize;
        let count = u32::from_le_bytes(bytes[16..20].try_into().unwrap()) as usize;

        let mut digest = [0u8; 32];
        digest.copy_from_slice(&bytes[20..HEADER_LEN]);

        let payload = zstd::decode_all(&bytes[HEADER_LEN..])
            .map_err(|e| corrupt(format!("Failed to decompress payload: {}", e)))?;

        if payload.len() != count * dimension * 4 {
            return Err(corrupt(format!(
                "Payload length mismatch: expected {} bytes, got {}",
                count * dimension * 4,
                payload.len()
            )));
        }

        let data = payload
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes(chunk.try_into().unwrap()))
            .collect();

        tracing::info!(
            "Loaded index ({} vectors, {}D) from {}",
            count,
            dimension,
            path.display()
        );

        Ok((
            Self {
                data,
                dimension,
                count,
            },
            digest,
        ))
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

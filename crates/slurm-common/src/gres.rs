//! Decoding of Slurm GPU generic-resource (GRES) descriptors.
//!
//! Total descriptors look like `gpu:a100:8`, optionally with a socket
//! affinity suffix (`gpu:a100:8(S:0-1)`). Allocated descriptors carry the
//! allocated indices: `gpu:a100:6(IDX:0,2-6)`, or `gpu:k80:0(IDX:N/A)` when
//! nothing is allocated.

use crate::error::GresError;

/// Total-GRES value reported for nodes without any generic resource.
pub const NO_GRES: &str = "(null)";

/// Upper bound on GPUs per node accepted from a total-GRES count.
pub const MAX_DEVICES_PER_NODE: u64 = u16::MAX as u64;

const NO_INDICES: &str = "N/A";
const INDEX_PREFIX: &str = "IDX:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GresDescriptor<'a> {
    pub gpu_type: &'a str,
    pub count: u64,
    /// Parenthesised trailer without the parentheses, e.g. `IDX:0,2-6`.
    pub suffix: Option<&'a str>,
}

impl<'a> GresDescriptor<'a> {
    pub fn parse(raw: &'a str) -> Result<Self, GresError> {
        let (head, suffix) = match raw.split_once('(') {
            Some((head, rest)) => {
                let inner = rest
                    .strip_suffix(')')
                    .ok_or_else(|| GresError::Descriptor(raw.to_string()))?;
                (head, Some(inner))
            }
            None => (raw, None),
        };

        let parts: Vec<&str> = head.split(':').collect();
        let [name, gpu_type, count] = *parts.as_slice() else {
            return Err(GresError::Descriptor(raw.to_string()));
        };
        if name != "gpu" || gpu_type.is_empty() {
            return Err(GresError::Descriptor(raw.to_string()));
        }
        let count = count
            .parse::<u64>()
            .map_err(|_| GresError::Count(count.to_string()))?;

        Ok(Self {
            gpu_type,
            count,
            suffix,
        })
    }

    /// The `IDX:` list of an allocated descriptor.
    pub fn index_spec(&self) -> Option<&'a str> {
        self.suffix.and_then(|s| s.strip_prefix(INDEX_PREFIX))
    }
}

/// Expand an index-spec such as `0,2-6` into a per-index allocation bitmap of
/// length `total`.
///
/// `N/A` yields an all-free bitmap. Indices outside `0..total` and reversed
/// ranges are rejected rather than truncated. `total` above
/// [`MAX_DEVICES_PER_NODE`] is rejected before anything is allocated.
pub fn expand_index_spec(spec: &str, total: u64) -> Result<Vec<bool>, GresError> {
    if total > MAX_DEVICES_PER_NODE {
        return Err(GresError::DeviceCount {
            count: total,
            max: MAX_DEVICES_PER_NODE,
        });
    }
    let total = total as usize;
    let mut bitmap = vec![false; total];
    if spec == NO_INDICES {
        return Ok(bitmap);
    }

    for token in spec.split(',') {
        let (start, end) = match token.split_once('-') {
            Some((start, end)) => (parse_index(start, token)?, parse_index(end, token)?),
            None => {
                let idx = parse_index(token, token)?;
                (idx, idx)
            }
        };
        if start > end {
            return Err(GresError::ReversedRange { start, end });
        }
        if end >= total {
            return Err(GresError::IndexOutOfRange { index: end, total });
        }
        bitmap[start..=end].fill(true);
    }

    Ok(bitmap)
}

fn parse_index(raw: &str, token: &str) -> Result<usize, GresError> {
    raw.parse::<usize>()
        .map_err(|_| GresError::IndexToken(token.to_string()))
}

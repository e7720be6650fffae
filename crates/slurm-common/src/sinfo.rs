//! Parsing of `sinfo -N -O NodeList,AllocMem,Memory,CPUsState,StateLong,Gres,GresUsed`
//! output into [`NodeRecord`]s.

use std::collections::BTreeMap;

use crate::error::{DecodeError, GresError};
use crate::gres::{expand_index_spec, GresDescriptor, NO_GRES};
use crate::node_record::{GpuAllocation, NodeRecord};

/// `sinfo -O` format string. Column order here is the order [`SinfoRow`]
/// expects.
pub const SINFO_FORMAT: &str = "NodeList,AllocMem,Memory,CPUsState,StateLong,Gres,GresUsed:.";

const SINFO_COLUMNS: usize = 7;

/// One whitespace-split row of `sinfo` output, columns named after their
/// `-O` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinfoRow<'a> {
    pub node_list: &'a str,
    pub alloc_mem: &'a str,
    pub memory: &'a str,
    pub cpus_state: &'a str,
    pub state_long: &'a str,
    pub gres: &'a str,
    pub gres_used: &'a str,
}

impl<'a> SinfoRow<'a> {
    pub fn split(line: &'a str) -> Result<Self, DecodeError> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [node_list, alloc_mem, memory, cpus_state, state_long, gres, gres_used] = *fields.as_slice()
        else {
            return Err(DecodeError::FieldCount {
                expected: SINFO_COLUMNS,
                found: fields.len(),
            });
        };
        Ok(Self {
            node_list,
            alloc_mem,
            memory,
            cpus_state,
            state_long,
            gres,
            gres_used,
        })
    }

    pub fn decode(&self) -> Result<NodeRecord, DecodeError> {
        let [cpu_allocated, cpu_idle, cpu_other, cpu_total] = decode_cpus_state(self.cpus_state)?;

        Ok(NodeRecord {
            name: self.node_list.to_string(),
            status: self.state_long.to_string(),
            cpu_allocated,
            cpu_idle,
            cpu_other,
            cpu_total,
            mem_allocated: parse_u64("alloc_mem", self.alloc_mem)?,
            mem_total: parse_u64("memory", self.memory)?,
            gpu: decode_gpu(self.gres, self.gres_used)?,
        })
    }
}

/// `A/I/O/T` → `[allocated, idle, other, total]`.
fn decode_cpus_state(raw: &str) -> Result<[u64; 4], DecodeError> {
    let parts: Vec<&str> = raw.split('/').collect();
    let [allocated, idle, other, total] = *parts.as_slice() else {
        return Err(DecodeError::CpuState(raw.to_string()));
    };
    Ok([
        parse_u64("cpu_allocated", allocated)?,
        parse_u64("cpu_idle", idle)?,
        parse_u64("cpu_other", other)?,
        parse_u64("cpu_total", total)?,
    ])
}

fn decode_gpu(gres: &str, gres_used: &str) -> Result<Option<GpuAllocation>, DecodeError> {
    if gres == NO_GRES {
        return Ok(None);
    }

    let total = GresDescriptor::parse(gres)?;
    let used = GresDescriptor::parse(gres_used)?;
    let spec = used
        .index_spec()
        .ok_or_else(|| GresError::MissingIndexSpec(gres_used.to_string()))?;
    Ok(Some(GpuAllocation {
        gpu_type: used.gpu_type.to_string(),
        allocated_count: used.count,
        index_allocation: expand_index_spec(spec, total.count)?,
    }))
}

fn parse_u64(field: &'static str, raw: &str) -> Result<u64, DecodeError> {
    raw.parse::<u64>().map_err(|_| DecodeError::InvalidNumber {
        field,
        value: raw.to_string(),
    })
}

/// A row that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedLine {
    pub line: String,
    pub error: DecodeError,
}

/// Result of one parse pass over `sinfo` output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutcome {
    pub nodes: BTreeMap<String, NodeRecord>,
    pub rejected: Vec<RejectedLine>,
    /// Node names that appeared on more than one distinct line. Only the
    /// first line in sorted order was kept.
    pub conflicts: Vec<String>,
}

/// Decode raw `sinfo` output into one record per node.
///
/// Lines are sorted and byte-identical duplicates dropped, since `sinfo -N`
/// repeats a node once per partition it belongs to. Rows that fail to decode
/// are reported in [`ParseOutcome::rejected`] and never affect other nodes.
pub fn parse_node_records(input: &[u8]) -> ParseOutcome {
    let text = String::from_utf8_lossy(input);
    let mut lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    lines.sort_unstable();
    lines.dedup();

    let mut outcome = ParseOutcome::default();
    for line in lines {
        let record = match SinfoRow::split(line).and_then(|row| row.decode()) {
            Ok(record) => record,
            Err(error) => {
                outcome.rejected.push(RejectedLine {
                    line: line.to_string(),
                    error,
                });
                continue;
            }
        };

        if outcome.nodes.contains_key(&record.name) {
            if !outcome.conflicts.contains(&record.name) {
                outcome.conflicts.push(record.name);
            }
            continue;
        }
        outcome.nodes.insert(record.name.clone(), record);
    }
    outcome
}

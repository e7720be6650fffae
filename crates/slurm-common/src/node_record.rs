use serde::{Deserialize, Serialize};

/// GPU allocation state of a single node, decoded from its GRES columns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GpuAllocation {
    pub gpu_type: String,
    /// Allocated count as reported by the scheduler. Not reconciled with
    /// `index_allocation`.
    pub allocated_count: u64,
    /// One flag per physical GPU index, `true` when allocated.
    pub index_allocation: Vec<bool>,
}

impl GpuAllocation {
    pub fn total(&self) -> usize {
        self.index_allocation.len()
    }

    pub fn idle(&self) -> u64 {
        (self.total() as u64).saturating_sub(self.allocated_count)
    }

    /// Indices whose allocation flag is set, in ascending order.
    pub fn allocated_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.index_allocation
            .iter()
            .enumerate()
            .filter_map(|(idx, allocated)| allocated.then_some(idx))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeRecord {
    pub name: String,
    pub status: String,

    pub cpu_allocated: u64,
    pub cpu_idle: u64,
    pub cpu_other: u64,
    pub cpu_total: u64,

    pub mem_allocated: u64,
    pub mem_total: u64,

    #[serde(default)]
    pub gpu: Option<GpuAllocation>,
}

impl NodeRecord {
    pub fn has_gpu(&self) -> bool {
        self.gpu.is_some()
    }

    pub fn gpu_index_allocation(&self) -> &[bool] {
        self.gpu
            .as_ref()
            .map(|gpu| gpu.index_allocation.as_slice())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gpu(allocated_count: u64, bits: &[u8]) -> GpuAllocation {
        GpuAllocation {
            gpu_type: "a100".to_string(),
            allocated_count,
            index_allocation: bits.iter().map(|b| *b == 1).collect(),
        }
    }

    #[test]
    fn test_gpu_idle_saturates() {
        assert_eq!(gpu(3, &[1, 0, 1, 1, 0, 0, 0, 0]).idle(), 5);
        assert_eq!(gpu(9, &[1, 1]).idle(), 0);
    }

    #[test]
    fn test_allocated_indices() {
        let g = gpu(6, &[1, 0, 1, 1, 1, 1, 1, 0]);
        assert_eq!(g.allocated_indices().collect::<Vec<_>>(), vec![0, 2, 3, 4, 5, 6]);
        assert_eq!(g.total(), 8);
    }

    #[test]
    fn test_gpu_less_node_has_empty_bitmap() {
        let node = NodeRecord {
            name: "cpu01".to_string(),
            status: "idle".to_string(),
            cpu_allocated: 0,
            cpu_idle: 64,
            cpu_other: 0,
            cpu_total: 64,
            mem_allocated: 0,
            mem_total: 256_000,
            gpu: None,
        };
        assert!(!node.has_gpu());
        assert!(node.gpu_index_allocation().is_empty());
    }

    #[test]
    fn test_deserialize_without_gpu_section() {
        let node: NodeRecord = serde_json::from_str(
            r#"{"name":"cpu01","status":"idle","cpu_allocated":0,"cpu_idle":8,
                "cpu_other":0,"cpu_total":8,"mem_allocated":0,"mem_total":1024}"#,
        )
        .unwrap();
        assert_eq!(node.gpu, None);
        assert_eq!(node.cpu_total, 8);
    }
}

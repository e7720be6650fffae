use std::collections::BTreeMap;

use slurm_common::NodeRecord;

/// Per-node gauge families published on `/metrics`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gauge {
    CpuAlloc,
    CpuIdle,
    CpuOther,
    CpuTotal,
    MemAlloc,
    MemTotal,
    GpuAlloc,
    GpuAllocCount,
    GpuIdle,
    GpuTotal,
}

impl Gauge {
    pub const ALL: [Gauge; 10] = [
        Gauge::CpuAlloc,
        Gauge::CpuIdle,
        Gauge::CpuOther,
        Gauge::CpuTotal,
        Gauge::MemAlloc,
        Gauge::MemTotal,
        Gauge::GpuAlloc,
        Gauge::GpuAllocCount,
        Gauge::GpuIdle,
        Gauge::GpuTotal,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Gauge::CpuAlloc => "slurm_node_cpu_alloc",
            Gauge::CpuIdle => "slurm_node_cpu_idle",
            Gauge::CpuOther => "slurm_node_cpu_other",
            Gauge::CpuTotal => "slurm_node_cpu_total",
            Gauge::MemAlloc => "slurm_node_mem_alloc",
            Gauge::MemTotal => "slurm_node_mem_total",
            Gauge::GpuAlloc => "slurm_node_gpu_alloc",
            Gauge::GpuAllocCount => "slurm_node_gpu_alloc_count",
            Gauge::GpuIdle => "slurm_node_gpu_idle",
            Gauge::GpuTotal => "slurm_node_gpu_total",
        }
    }

    pub fn help(self) -> &'static str {
        match self {
            Gauge::CpuAlloc => "Allocated CPUs per node",
            Gauge::CpuIdle => "Idle CPUs per node",
            Gauge::CpuOther => "Other CPUs per node",
            Gauge::CpuTotal => "Total CPUs per node",
            Gauge::MemAlloc => "Allocated memory per node",
            Gauge::MemTotal => "Total memory per node",
            Gauge::GpuAlloc => "Allocation state of each GPU index (1 = allocated)",
            Gauge::GpuAllocCount => "Allocated GPUs per node as reported by the scheduler",
            Gauge::GpuIdle => "Idle GPUs per node",
            Gauge::GpuTotal => "Total GPUs per node",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub gauge: Gauge,
    pub labels: Vec<(&'static str, String)>,
    pub value: u64,
}

/// Project parsed node records onto labeled gauge observations.
///
/// GPU gauges are only emitted for nodes that advertise a GPU.
pub fn observe(nodes: &BTreeMap<String, NodeRecord>) -> Vec<Observation> {
    let mut out = Vec::new();
    for node in nodes.values() {
        let node_labels = || {
            vec![
                ("node", node.name.clone()),
                ("status", node.status.clone()),
            ]
        };
        let mut push = |gauge: Gauge, value: u64| {
            out.push(Observation {
                gauge,
                labels: node_labels(),
                value,
            });
        };

        push(Gauge::CpuAlloc, node.cpu_allocated);
        push(Gauge::CpuIdle, node.cpu_idle);
        push(Gauge::CpuOther, node.cpu_other);
        push(Gauge::CpuTotal, node.cpu_total);
        push(Gauge::MemAlloc, node.mem_allocated);
        push(Gauge::MemTotal, node.mem_total);

        let Some(gpu) = &node.gpu else { continue };
        push(Gauge::GpuAllocCount, gpu.allocated_count);
        push(Gauge::GpuIdle, gpu.idle());
        push(Gauge::GpuTotal, gpu.total() as u64);

        for (idx, allocated) in gpu.index_allocation.iter().enumerate() {
            out.push(Observation {
                gauge: Gauge::GpuAlloc,
                labels: vec![
                    ("node", node.name.clone()),
                    ("gpu_type", gpu.gpu_type.clone()),
                    ("index", idx.to_string()),
                ],
                value: u64::from(*allocated),
            });
        }
    }
    out
}

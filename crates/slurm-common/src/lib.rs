pub mod error;
pub mod gres;
pub mod node_record;
pub mod sinfo;

pub use error::{DecodeError, GresError};
pub use gres::{expand_index_spec, GresDescriptor, MAX_DEVICES_PER_NODE, NO_GRES};
pub use node_record::{GpuAllocation, NodeRecord};
pub use sinfo::{parse_node_records, ParseOutcome, RejectedLine, SinfoRow, SINFO_FORMAT};

pub mod telemetry;

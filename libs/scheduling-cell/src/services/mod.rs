pub mod allocation;
pub mod engine;
pub mod registry;
pub mod rescheduler;
pub mod slot_index;

pub use allocation::AllocationService;
pub use engine::SchedulingEngine;
pub use registry::{Provider, ProviderRegistry, ProviderSchedule};
pub use rescheduler::RescheduleService;
pub use slot_index::SlotIndex;

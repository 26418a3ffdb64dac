pub mod queue;

pub use queue::{MessageQueue, QueueError, QueueMetrics, QueueReceiver, QueueSender};

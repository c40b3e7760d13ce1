//! A minimal resource type for exercising the core machinery in tests.

use serde::{Deserialize, Serialize};

use crate::block::Block;
use crate::error::PangeaResult;
use crate::resource::{ComputedProperties, ResourceAttributes};
use crate::validation::Validator;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestQueue {
    pub queue_name: String,
    #[serde(default = "default_retention")]
    pub retention_seconds: u32,
    #[serde(default)]
    pub fifo: bool,
}

fn default_retention() -> u32 {
    345600
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestQueueComputed {
    pub is_fifo: bool,
}

impl ComputedProperties for TestQueueComputed {
    fn estimated_monthly_cost(&self) -> Option<f64> {
        Some(0.4)
    }
}

impl ResourceAttributes for TestQueue {
    const RESOURCE_TYPE: &'static str = "test_queue";
    const OUTPUTS: &'static [&'static str] = &["id", "arn", "url"];

    type Computed = TestQueueComputed;

    fn validate(&self) -> PangeaResult<()> {
        let mut v = Validator::new(Self::RESOURCE_TYPE);
        v.not_blank("queue_name", &self.queue_name);
        v.range("retention_seconds", self.retention_seconds, 60, 1_209_600);
        v.finish()
    }

    fn to_block(&self) -> Block {
        Block::new()
            .attr("queue_name", self.queue_name.as_str())
            .attr("retention_seconds", self.retention_seconds)
            .attr("fifo", self.fifo)
    }

    fn computed(&self) -> Self::Computed {
        TestQueueComputed { is_fifo: self.fifo }
    }
}

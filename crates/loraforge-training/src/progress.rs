use crate::launch::RunId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    Started { run_id: RunId },
    Message { run_id: RunId, message: String },
    Step { run_id: RunId, step: u64, total: Option<u64>, loss: Option<f64> },
    Finished { run_id: RunId },
}

pub trait ProgressSink: Send + Sync {
    fn on_event(&self, event: ProgressEvent);
}

#[derive(Debug, Default)]
pub struct StdoutProgressSink;

impl ProgressSink for StdoutProgressSink {
    fn on_event(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Started { run_id } => println!("[train:{run_id}] started"),
            ProgressEvent::Message { run_id, message } => println!("[train:{run_id}] {message}"),
            ProgressEvent::Step { run_id, step, total, loss } => {
                let steps = match total {
                    Some(total) => format!("step {step}/{total}"),
                    None => format!("step {step}"),
                };
                match loss {
                    Some(loss) => println!("[train:{run_id}] {steps} loss {loss:.4}"),
                    None => println!("[train:{run_id}] {steps}"),
                }
            }
            ProgressEvent::Finished { run_id } => println!("[train:{run_id}] finished"),
        }
    }
}

pub mod batch;
pub mod controller;
pub mod tts_client;

#[cfg(test)]
pub(crate) mod test_support;

pub use batch::{BatchRunner, CancelHandle};
pub use controller::AppController;
pub use tts_client::{ModelSelector, ModelState, RetryPolicy, Synthesized, TtsClient};

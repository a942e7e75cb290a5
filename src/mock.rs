use std::sync::{
	atomic::{AtomicUsize, Ordering},
	Mutex,
};

use async_trait::async_trait;

use crate::*;

/// A single prompt received by [`MockLlm`].
#[derive(Debug, Clone)]
pub struct MockCall {
	pub prompt: String,
	pub params: GenerationParameters,
}

#[derive(Debug)]
enum Behaviour {
	/// Echo the prompt followed by a fixed continuation.
	Continue(String),
	/// Echo the prompt followed by `" Draft <n>. And then"`, where `n` counts the calls so far.
	Count,
	Fail,
}

/// Pipeline stand-in that records every call it receives.
#[derive(Debug)]
pub struct MockLlm {
	behaviour: Behaviour,
	calls: Mutex<Vec<MockCall>>,
	counter: AtomicUsize,
}

impl MockLlm {
	fn with(behaviour: Behaviour) -> Self {
		Self { behaviour, calls: Mutex::new(vec![]), counter: AtomicUsize::new(0) }
	}

	pub fn continuing(continuation: &str) -> Self {
		Self::with(Behaviour::Continue(continuation.to_string()))
	}

	pub fn counting() -> Self {
		Self::with(Behaviour::Count)
	}

	pub fn failing() -> Self {
		Self::with(Behaviour::Fail)
	}

	pub fn calls(&self) -> Vec<MockCall> {
		self.calls.lock().unwrap().clone()
	}
}

#[async_trait]
impl Llm for MockLlm {
	fn name(&self) -> &str {
		"MockLlm"
	}

	fn eos_token_id(&self) -> Option<u32> {
		Some(2)
	}

	fn count_tokens(&self, content: &str) -> Result<usize> {
		Ok(content.split_whitespace().count())
	}

	async fn generate(&self, prompt: &str, params: &GenerationParameters) -> Result<String> {
		self.calls.lock().unwrap().push(MockCall { prompt: prompt.to_string(), params: *params });
		let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;

		match &self.behaviour {
			Behaviour::Continue(continuation) => Ok(format!("{}{}", prompt, continuation)),
			Behaviour::Count => Ok(format!("{} Draft {}. And then", prompt, n)),
			Behaviour::Fail => Err(LlmError::Status { status: 503, body: "model overloaded".into() }),
		}
	}
}

use minijinja::{context, Environment};
use uuid::Uuid;

use crate::{StoryError, StudioView, MAX_WORDS, MIN_WORDS, WORDS_STEP};

const STUDIO_TEMPLATE: &str = "index.html";
const ERROR_TEMPLATE: &str = "error.html";

/// Premises shown under the prompt box as inspiration.
pub const EXAMPLE_PROMPTS: [&str; 2] =
	["A time traveler visits ancient Egypt.", "A robot discovers human emotions."];

const PROMPT_PLACEHOLDER: &str = "e.g. A lost explorer finds a hidden jungle city...";

/// Renders the InkSpire pages.
///
/// Templates are named `*.html`, so minijinja escapes every interpolated value.
#[derive(Debug)]
pub struct Pages {
	env: Environment<'static>,
}

impl Pages {
	pub fn new() -> Result<Self, StoryError> {
		let mut env = Environment::new();
		env.add_template(STUDIO_TEMPLATE, include_str!("templates/index.html"))?;
		env.add_template(ERROR_TEMPLATE, include_str!("templates/error.html"))?;

		Ok(Self { env })
	}

	/// The story page for `view`.
	pub fn studio(&self, view: &StudioView) -> Result<String, StoryError> {
		let html = self.env.get_template(STUDIO_TEMPLATE)?.render(context! {
			view => view,
			examples => EXAMPLE_PROMPTS,
			placeholder => PROMPT_PLACEHOLDER,
			min_words => MIN_WORDS,
			max_words => MAX_WORDS,
			words_step => WORDS_STEP,
		})?;

		Ok(html)
	}

	/// A page explaining that the interaction failed, linking back to the session if known.
	pub fn error(&self, message: &str, session_id: Option<Uuid>) -> Result<String, StoryError> {
		Ok(self.env.get_template(ERROR_TEMPLATE)?.render(context! { message, session_id })?)
	}
}

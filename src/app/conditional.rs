use crate::app::freshness::Token;
use crate::app::Error;

#[derive(Debug, PartialEq, Eq)]
pub enum Conditional {
	Unchanged { token: Token },
	Fresh { token: Token, body: String },
}

impl Conditional {
	/// Skips rendering when the client already holds the current token.
	pub fn evaluate<F>(token: Token, presented: Option<&str>, render: F) -> Result<Self, Error>
	where
		F: FnOnce() -> Result<String, Error>,
	{
		if presented.is_some_and(|p| token.matches(p)) {
			return Ok(Conditional::Unchanged { token });
		}
		Ok(Conditional::Fresh {
			token,
			body: render()?,
		})
	}

	pub fn token(&self) -> Token {
		match self {
			Conditional::Unchanged { token } | Conditional::Fresh { token, .. } => *token,
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn matching_token_skips_rendering() {
		let result = Conditional::evaluate(Token(42), Some("42"), || {
			panic!("should not render")
		})
		.unwrap();
		assert_eq!(result, Conditional::Unchanged { token: Token(42) });
	}

	#[test]
	fn stale_or_missing_token_renders() {
		for presented in [None, Some("41"), Some("")] {
			let result =
				Conditional::evaluate(Token(42), presented, || Ok("<presets/>".to_owned())).unwrap();
			assert_eq!(
				result,
				Conditional::Fresh {
					token: Token(42),
					body: "<presets/>".to_owned()
				}
			);
		}
	}

	#[test]
	fn render_errors_propagate() {
		let result = Conditional::evaluate(Token(1), None, || {
			Err(Error::InvalidIdentifier("..".to_owned()))
		});
		assert!(matches!(result, Err(Error::InvalidIdentifier(_))));
	}
}

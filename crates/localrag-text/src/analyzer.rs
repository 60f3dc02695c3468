use std::collections::BTreeSet;

use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, StopWordFilter, TextAnalyzer, TokenStream};

const STOP_WORDS: &[&str] = &[
	"a","an","and","are","as","at","be","by","for","from","has","he","in","is","it","its","of","on","that","the","to","was","will","with","or","but","not","this","these","they","them","their","there","then","than","so","if","when","where","why","how","what","which","who","whom","whose","can","could","should","would","may","might","must","shall","do","does","did","have","had","having",
];

/// Case-folding term extractor. Splits on anything that is not
/// alphanumeric, so trailing punctuation never becomes part of a term.
#[derive(Clone)]
pub struct TermAnalyzer {
	analyzer: TextAnalyzer,
	plain: TextAnalyzer,
	exclude_stop_words: bool,
}

impl TermAnalyzer {
	pub fn new(exclude_stop_words: bool) -> Self {
		let plain = TextAnalyzer::builder(SimpleTokenizer::default()).filter(LowerCaser).build();
		let analyzer = if exclude_stop_words {
			TextAnalyzer::builder(SimpleTokenizer::default())
				.filter(LowerCaser)
				.filter(StopWordFilter::remove(STOP_WORDS.iter().map(|s| (*s).to_string())))
				.build()
		} else {
			plain.clone()
		};
		Self { analyzer, plain, exclude_stop_words }
	}

	pub fn excludes_stop_words(&self) -> bool { self.exclude_stop_words }

	/// Distinct terms of `text`, stop words removed when configured.
	pub fn terms(&self, text: &str) -> BTreeSet<String> {
		collect(&mut self.analyzer.clone(), text)
	}

	/// Terms for a query. A question made only of stop words ("what is
	/// it") keeps them rather than matching nothing.
	pub fn query_terms(&self, text: &str) -> BTreeSet<String> {
		let terms = self.terms(text);
		if terms.is_empty() && self.exclude_stop_words { collect(&mut self.plain.clone(), text) } else { terms }
	}
}

impl Default for TermAnalyzer {
	fn default() -> Self { Self::new(true) }
}

fn collect(analyzer: &mut TextAnalyzer, text: &str) -> BTreeSet<String> {
	let mut out = BTreeSet::new();
	let mut stream = analyzer.token_stream(text);
	while stream.advance() { out.insert(stream.token().text.clone()); }
	out
}

//! Prompt assembly for answer generation.

use localrag_core::{Passage, QueryResult};

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant that answers questions based on provided context.";

pub const NO_CONTEXT_ANSWER: &str = "I couldn't find any relevant information to answer your question.";

/// `Source i (path, chars a..b)` label used in prompts and printed sources.
pub fn source_label(rank: usize, passage: &Passage) -> String {
    format!(
        "Source {rank} ({}, chars {}..{})",
        passage.source, passage.chunk.span.start, passage.chunk.span.end
    )
}

/// Numbered context blocks, one per passage, in rank order.
pub fn build_context(result: &QueryResult) -> String {
    result
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{}:\n{}", source_label(i + 1, p), p.chunk.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_prompt(question: &str, result: &QueryResult) -> String {
    format!(
        "Based on the following information, provide a comprehensive and accurate answer to the question.

Context Information:
{context}

Question: {question}

Instructions:
- Use only the information provided in the context
- If the context doesn't contain enough information to fully answer the question, say so
- Provide a clear, well-structured answer
- Cite the sources when possible

Answer:",
        context = build_context(result),
    )
}

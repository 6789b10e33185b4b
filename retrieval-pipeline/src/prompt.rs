/// Fixed answer returned when the similarity search finds nothing; the
/// LLM is never invoked in that case.
pub static NOTHING_FOUND_ANSWER: &str = "Nothing relevant was found for your query.";

/// System-style preamble baked into every prompt. The context-only
/// constraint is non-negotiable: the model must answer strictly from the
/// supplied context and say so when the context does not contain the
/// answer.
static PROMPT_TEMPLATE_HEADER: &str = "\
You are an assistant answering questions over an indexed document collection.
Answer the question using ONLY the context below.
NEVER use information that is not in the context.
If the context does not contain the answer, state that explicitly.";

/// Assembles the final prompt from the retrieved chunk contents (in
/// retrieval order, separated by blank lines) and the user question. No
/// truncation: bounding the prompt to the model's context window is out
/// of scope here.
pub fn build_prompt(query: &str, contexts: &[String]) -> String {
    let context_block = contexts.join("\n\n");

    format!("{PROMPT_TEMPLATE_HEADER}\n\nContext:\n{context_block}\n\nQuestion:\n{query}")
}

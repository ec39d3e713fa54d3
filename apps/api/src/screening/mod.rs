// Résumé screening pipeline.
// files → text → prompt → JSON record → ranked table → CSV.
// All model calls go through llm_client::ChatModel.

pub mod batch;
pub mod evaluator;
pub mod extract;
pub mod handlers;
pub mod prompts;
pub mod report;

#[cfg(test)]
pub(crate) mod testing;

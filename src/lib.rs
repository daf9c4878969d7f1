// ============================================================
// qa-windows
// ============================================================
// Turns long tokenized contexts and answer annotations into
// fixed-length, labelled windows for extractive QA training.
//
//   cli/          Layer 1 — argument parsing, printing
//   application/  Layer 2 — prepare / build workflows
//   domain/       Layer 3 — blocks, separators, annotations, errors
//   data/         Layer 4 — windowing engine, Burn dataset/batcher
//   infra/        Layer 6 — filesystem layout, stores, tokenizer, reports

pub mod cli;
pub mod application;
pub mod domain;
pub mod data;
pub mod infra;

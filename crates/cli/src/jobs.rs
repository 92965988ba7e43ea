// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Built-in job definitions
//!
//! Functions cannot travel with a submitted job, so the CLI ships the
//! definitions a job configuration may name.

use sj_core::{map_fn, reduce_fn, summarize_fn, JobDefinition, JobRegistry};

pub const WORD_COUNT: &str = "word-count";
pub const DEDUPE: &str = "dedupe";

pub fn registry() -> JobRegistry {
    JobRegistry::new()
        .register(WORD_COUNT, word_count())
        .register(DEDUPE, dedupe())
}

/// Lower-cased words with surrounding punctuation removed
fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| !w.is_empty())
}

/// Occurrences of each word across all records
fn word_count() -> JobDefinition {
    JobDefinition::new()
        .with_mapper(map_fn(|ctx, out| {
            for word in words(&ctx.value) {
                out.write(word, "1");
            }
            Ok(())
        }))
        .with_reducer(reduce_fn(|ctx, out| {
            let mut total = 0u64;
            for value in &ctx.values {
                total += value.parse::<u64>()?;
            }
            out.write(ctx.key.clone(), total.to_string());
            Ok(())
        }))
        .with_summarizer(summarize_fn(|summary| {
            tracing::info!(
                job_id = %summary.job_id,
                distinct_words = summary.output_len(),
                failed = summary.reduce.failed_keys().count(),
                "word count finished"
            );
            Ok(())
        }))
}

/// Distinct record values, each with the key it first appeared under
fn dedupe() -> JobDefinition {
    JobDefinition::new()
        .with_mapper(map_fn(|ctx, out| {
            let value = ctx.value.trim();
            if !value.is_empty() {
                out.write(value, ctx.key.clone());
            }
            Ok(())
        }))
        .with_reducer(reduce_fn(|ctx, out| {
            if let Some(first) = ctx.values.first() {
                out.write(ctx.key.clone(), first.clone());
            }
            Ok(())
        }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sj_core::{Emitter, MapContext, Mapper, ReduceContext, Reducer};

    fn map(definition: &str, key: &str, value: &str) -> Vec<(String, String)> {
        let registry = registry();
        let mapper = registry.get(definition).unwrap().mapper.clone().unwrap();
        let ctx = MapContext {
            key: key.into(),
            value: value.into(),
            execution_no: 1,
            is_restarted: false,
        };
        let mut out = Emitter::new();
        block_on(mapper.map(&ctx, &mut out)).unwrap();
        out.into_writes()
    }

    fn reduce(definition: &str, key: &str, values: &[&str]) -> anyhow::Result<Vec<(String, String)>> {
        let registry = registry();
        let reducer = registry.get(definition).unwrap().reducer.clone().unwrap();
        let ctx = ReduceContext {
            key: key.into(),
            values: values.iter().map(|v| v.to_string()).collect(),
            execution_no: 1,
            is_restarted: false,
        };
        let mut out = Emitter::new();
        block_on(reducer.reduce(&ctx, &mut out))?;
        Ok(out.into_writes())
    }

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(future)
    }

    fn pair(k: &str, v: &str) -> (String, String) {
        (k.to_string(), v.to_string())
    }

    #[test]
    fn word_count_normalizes_words() {
        assert_eq!(
            map(WORD_COUNT, "0", "The cat, the HAT!  --"),
            vec![pair("the", "1"), pair("cat", "1"), pair("the", "1"), pair("hat", "1")]
        );
    }

    #[test]
    fn word_count_sums_partial_counts() {
        assert_eq!(
            reduce(WORD_COUNT, "the", &["1", "1", "2"]).unwrap(),
            vec![pair("the", "4")]
        );
        assert!(reduce(WORD_COUNT, "the", &["x"]).is_err());
    }

    #[test]
    fn dedupe_keeps_the_first_origin() {
        assert_eq!(map(DEDUPE, "7", "  apple "), vec![pair("apple", "7")]);
        assert!(map(DEDUPE, "8", "   ").is_empty());
        assert_eq!(
            reduce(DEDUPE, "apple", &["7", "2"]).unwrap(),
            vec![pair("apple", "7")]
        );
    }

    #[test]
    fn every_builtin_resolves() {
        let registry = registry();
        assert_eq!(registry.names(), vec![DEDUPE, WORD_COUNT]);
        for name in registry.names() {
            let plan = registry.get(name).unwrap().plan();
            assert!(plan.map && plan.reduce);
        }
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-supplied map, reduce and summarize functions
//!
//! Functions report failure by returning an error; the engine records it
//! against the key and retries within the attempt ceiling. Writes go through
//! an [`Emitter`] and are only committed when the invocation succeeds.

use crate::summary::JobSummary;
use async_trait::async_trait;

/// Invocation context for a map function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapContext {
    pub key: String,
    pub value: String,
    /// 1-based attempt number for this key
    pub execution_no: u32,
    /// Whether this slice resumed after a yield
    pub is_restarted: bool,
}

/// Invocation context for a reduce function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReduceContext {
    pub key: String,
    /// Every value written under `key` during MAP, in write order
    pub values: Vec<String>,
    pub execution_no: u32,
    pub is_restarted: bool,
}

/// Buffers one invocation's writes and self-reported usage
#[derive(Debug, Default)]
pub struct Emitter {
    writes: Vec<(String, String)>,
    units: u64,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit a key/value pair
    pub fn write(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.writes.push((key.into(), value.into()));
    }

    /// Charge usage units for work done outside the engine
    pub fn charge(&mut self, units: u64) {
        self.units = self.units.saturating_add(units);
    }

    pub fn writes(&self) -> &[(String, String)] {
        &self.writes
    }

    pub fn units(&self) -> u64 {
        self.units
    }

    pub fn into_writes(self) -> Vec<(String, String)> {
        self.writes
    }
}

#[async_trait]
pub trait Mapper: Send + Sync + 'static {
    async fn map(&self, ctx: &MapContext, out: &mut Emitter) -> anyhow::Result<()>;
}

#[async_trait]
pub trait Reducer: Send + Sync + 'static {
    async fn reduce(&self, ctx: &ReduceContext, out: &mut Emitter) -> anyhow::Result<()>;
}

/// Hook run once during SUMMARIZE with the finished job's summary
#[async_trait]
pub trait Summarizer: Send + Sync + 'static {
    async fn summarize(&self, summary: &JobSummary) -> anyhow::Result<()>;
}

/// A synchronous closure used as a [`Mapper`]
pub struct FnMapper<F>(pub F);

#[async_trait]
impl<F> Mapper for FnMapper<F>
where
    F: Fn(&MapContext, &mut Emitter) -> anyhow::Result<()> + Send + Sync + 'static,
{
    async fn map(&self, ctx: &MapContext, out: &mut Emitter) -> anyhow::Result<()> {
        (self.0)(ctx, out)
    }
}

/// A synchronous closure used as a [`Reducer`]
pub struct FnReducer<F>(pub F);

#[async_trait]
impl<F> Reducer for FnReducer<F>
where
    F: Fn(&ReduceContext, &mut Emitter) -> anyhow::Result<()> + Send + Sync + 'static,
{
    async fn reduce(&self, ctx: &ReduceContext, out: &mut Emitter) -> anyhow::Result<()> {
        (self.0)(ctx, out)
    }
}

/// A synchronous closure used as a [`Summarizer`]
pub struct FnSummarizer<F>(pub F);

#[async_trait]
impl<F> Summarizer for FnSummarizer<F>
where
    F: Fn(&JobSummary) -> anyhow::Result<()> + Send + Sync + 'static,
{
    async fn summarize(&self, summary: &JobSummary) -> anyhow::Result<()> {
        (self.0)(summary)
    }
}

/// Wrap a closure as a [`Mapper`]
pub fn map_fn<F>(f: F) -> FnMapper<F>
where
    F: Fn(&MapContext, &mut Emitter) -> anyhow::Result<()> + Send + Sync + 'static,
{
    FnMapper(f)
}

/// Wrap a closure as a [`Reducer`]
pub fn reduce_fn<F>(f: F) -> FnReducer<F>
where
    F: Fn(&ReduceContext, &mut Emitter) -> anyhow::Result<()> + Send + Sync + 'static,
{
    FnReducer(f)
}

/// Wrap a closure as a [`Summarizer`]
pub fn summarize_fn<F>(f: F) -> FnSummarizer<F>
where
    F: Fn(&JobSummary) -> anyhow::Result<()> + Send + Sync + 'static,
{
    FnSummarizer(f)
}

/// Map function that re-emits every record unchanged
pub struct IdentityMapper;

#[async_trait]
impl Mapper for IdentityMapper {
    async fn map(&self, ctx: &MapContext, out: &mut Emitter) -> anyhow::Result<()> {
        out.write(ctx.key.clone(), ctx.value.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_ctx(key: &str, value: &str) -> MapContext {
        MapContext {
            key: key.into(),
            value: value.into(),
            execution_no: 1,
            is_restarted: false,
        }
    }

    #[test]
    fn emitter_buffers_writes_and_charges() {
        let mut out = Emitter::new();
        out.write("a", "1");
        out.write("b".to_string(), "2".to_string());
        out.charge(3);
        out.charge(u64::MAX);
        assert_eq!(out.writes().len(), 2);
        assert_eq!(out.units(), u64::MAX);
        assert_eq!(
            out.into_writes(),
            vec![("a".into(), "1".into()), ("b".into(), "2".into())]
        );
    }

    #[tokio::test]
    async fn closure_mapper_sees_context() {
        let mapper = map_fn(|ctx, out| {
            for word in ctx.value.split_whitespace() {
                out.write(word, "1");
            }
            Ok(())
        });
        let mut out = Emitter::new();
        mapper.map(&map_ctx("0", "to be or"), &mut out).await.unwrap();
        assert_eq!(out.writes().len(), 3);
    }

    #[tokio::test]
    async fn closure_reducer_errors_propagate() {
        let reducer = reduce_fn(|ctx, _| {
            anyhow::bail!("cannot reduce {}", ctx.key)
        });
        let ctx = ReduceContext {
            key: "k".into(),
            values: vec![],
            execution_no: 2,
            is_restarted: true,
        };
        let err = reducer.reduce(&ctx, &mut Emitter::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "cannot reduce k");
    }

    #[tokio::test]
    async fn identity_mapper_echoes_record() {
        let mut out = Emitter::new();
        IdentityMapper.map(&map_ctx("a", "1"), &mut out).await.unwrap();
        assert_eq!(out.writes(), &[("a".to_string(), "1".to_string())]);
    }
}

//! Chain-of-responsibility plumbing for admission stages.
//!
//! Each [`AnteDecorator`] receives the remaining chain as a [`Next`]
//! continuation. A stage either fails or hands control on by calling
//! [`Next::run`], which consumes the continuation so it runs at most once.

use tracing::trace;

use crate::{
    config::RedundancyFilterConfig,
    context::Context,
    error::Result,
    keeper::HandlerInvoker,
    primitives::Tx,
    redundancy::RedundancyDecorator,
};

/// A single stage of the admission pipeline.
pub trait AnteDecorator: Send + Sync {
    fn ante_handle(&self, ctx: Context, tx: &Tx, simulate: bool, next: Next<'_>)
    -> Result<Context>;

    fn name(&self) -> &'static str;
}

/// The stages that follow the one currently running.
pub struct Next<'a> {
    remaining: &'a [Box<dyn AnteDecorator>],
}

impl<'a> Next<'a> {
    /// A continuation with no stages left. Running it returns the context as is.
    pub fn terminal() -> Self {
        Self { remaining: &[] }
    }

    pub fn run(self, ctx: Context, tx: &Tx, simulate: bool) -> Result<Context> {
        match self.remaining.split_first() {
            Some((stage, rest)) => {
                trace!(target: "ibc_ante::ante", stage = stage.name(), "Running ante stage");
                stage.ante_handle(ctx, tx, simulate, Next { remaining: rest })
            }
            None => Ok(ctx),
        }
    }
}

/// Ordered list of admission stages.
#[derive(Default)]
pub struct AnteChain {
    stages: Vec<Box<dyn AnteDecorator>>,
}

impl AnteChain {
    pub fn builder() -> AnteChainBuilder {
        AnteChainBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Runs the transaction through every stage in order.
    pub fn run(&self, ctx: Context, tx: &Tx, simulate: bool) -> Result<Context> {
        Next {
            remaining: &self.stages,
        }
        .run(ctx, tx, simulate)
    }
}

#[derive(Default)]
pub struct AnteChainBuilder {
    stages: Vec<Box<dyn AnteDecorator>>,
}

impl AnteChainBuilder {
    pub fn decorator(mut self, stage: impl AnteDecorator + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Appends the redundant-relay filter unless it is disabled.
    pub fn redundancy_filter<K>(self, config: &RedundancyFilterConfig, invoker: K) -> Self
    where
        K: HandlerInvoker + 'static,
    {
        if !config.enabled {
            return self;
        }
        self.decorator(RedundancyDecorator::new(invoker))
    }

    pub fn build(self) -> AnteChain {
        AnteChain {
            stages: self.stages,
        }
    }
}

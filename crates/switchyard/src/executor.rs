//! Sequential execution of a resolved handler chain.

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::context::RequestContext;
use crate::error::ChainError;
use crate::handler::{ChainLink, Next};

/// How a chain run ended, when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainOutcome {
    /// A handler finalized the response.
    Sent,
    /// The last handler continued past the end of the chain.
    Exhausted,
    /// Cancellation was observed between handlers.
    Cancelled,
}

/// Sender side of a cancellation pair. See [`cancellation`].
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Signals cancellation to every linked [`CancelSignal`].
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Receiver side of a cancellation pair, polled between handlers.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// Returns true once the paired handle has cancelled.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }
}

/// Creates a linked cancellation handle and signal.
///
/// The transport keeps the handle and cancels it when the client goes
/// away; the signal travels with the dispatch.
pub fn cancellation() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelSignal { rx })
}

/// Runs handler chains against a request context.
///
/// Handlers run one at a time in chain order. After each handler returns:
/// a fault halts the chain, a finalized response halts the chain, a
/// continue moves to the next handler, and anything else is a stall.
#[derive(Debug, Clone, Default)]
pub struct Executor {
    cancel: Option<CancelSignal>,
}

impl Executor {
    /// Creates an executor without cancellation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an executor that observes `cancel` between handlers.
    pub fn with_cancel(cancel: CancelSignal) -> Self {
        Self {
            cancel: Some(cancel),
        }
    }

    /// Runs `chain` against `ctx`.
    pub async fn run(
        &self,
        chain: &[ChainLink],
        ctx: &mut RequestContext,
    ) -> Result<ChainOutcome, ChainError> {
        for (index, link) in chain.iter().enumerate() {
            if self.cancelled() {
                debug!("chain cancelled before handler #{}", index);
                return Ok(ChainOutcome::Cancelled);
            }

            ctx.set_base(&link.base);
            let next = Next::new(index, chain.len() - index - 1);
            let result = link.handler.handle(ctx, next).await;

            if self.cancelled() {
                debug!("chain cancelled after handler #{}", index);
                return Ok(ChainOutcome::Cancelled);
            }

            let flow = result.map_err(|source| ChainError::Handler {
                index,
                handler: link.handler.name().to_string(),
                source,
            })?;

            if ctx.response.is_sent() {
                if flow.is_continue() {
                    debug!(
                        "handler #{} ({}) continued after sending; halting",
                        index,
                        link.handler.name()
                    );
                }
                return Ok(ChainOutcome::Sent);
            }

            if !flow.is_continue() {
                warn!(
                    "handler #{} ({}) returned without sending or continuing",
                    index,
                    link.handler.name()
                );
                return Err(ChainError::Stalled {
                    index,
                    handler: link.handler.name().to_string(),
                });
            }
        }

        Ok(ChainOutcome::Exhausted)
    }

    fn cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelSignal::is_cancelled)
    }
}

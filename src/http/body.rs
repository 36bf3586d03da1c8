//! Byte-counting response body.
//!
//! # Responsibilities
//! - Stream the backend's response body to the client frame by frame
//! - Count data bytes exactly as they pass through
//! - Enforce the request deadline while the body is streaming
//! - Settle the dispatch once: on end of stream, on error, or when the client
//!   goes away and the body is dropped
//!
//! # Design Decisions
//! - Trailers pass through untouched and are not counted
//! - Errors after the status line is sent cannot become a 503; they are
//!   logged and the client sees a truncated body

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::BoxError;
use hyper::body::{Body, Bytes, Frame, SizeHint};
use thiserror::Error;
use tokio::time::Sleep;

use crate::load_balancer::Dispatch;
use crate::observability::metrics;
use crate::resilience::Deadline;

/// Failure while relaying a response body.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("upstream body error: {0}")]
    Upstream(#[source] BoxError),

    #[error("response body not finished within {0:?}")]
    Deadline(Duration),
}

/// Wraps an upstream body, counting bytes into a [`Dispatch`].
#[derive(Debug)]
pub struct CountedBody<B> {
    inner: B,
    deadline: Pin<Box<Sleep>>,
    budget: Duration,
    dispatch: Option<Dispatch>,
}

impl<B> CountedBody<B> {
    pub fn new(inner: B, dispatch: Dispatch, deadline: Deadline) -> Self {
        Self {
            inner,
            deadline: Box::pin(deadline.sleep()),
            budget: deadline.budget(),
            dispatch: Some(dispatch),
        }
    }

    fn settle(&mut self, outcome: Outcome<'_>) {
        let Some(dispatch) = self.dispatch.take() else {
            return;
        };

        match outcome {
            Outcome::Finished => tracing::debug!(
                backend = %dispatch.address(),
                bytes = dispatch.bytes(),
                "Response body relayed"
            ),
            Outcome::Failed(e) => tracing::warn!(
                backend = %dispatch.address(),
                bytes = dispatch.bytes(),
                error = %e,
                "Failed to relay response body"
            ),
            Outcome::Abandoned => tracing::debug!(
                backend = %dispatch.address(),
                bytes = dispatch.bytes(),
                "Response body dropped before completion"
            ),
        }
        metrics::record_bytes(dispatch.address(), dispatch.bytes());
    }
}

/// How a relayed body ended.
enum Outcome<'a> {
    Finished,
    Failed(&'a StreamError),
    Abandoned,
}

impl<B> Body for CountedBody<B>
where
    B: Body<Data = Bytes> + Unpin,
    B::Error: Into<BoxError>,
{
    type Data = Bytes;
    type Error = StreamError;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        if this.dispatch.is_none() {
            return Poll::Ready(None);
        }

        // Checked before every frame so a backend that never stalls still
        // cannot outlive the deadline.
        if this.deadline.as_mut().poll(cx).is_ready() {
            let err = StreamError::Deadline(this.budget);
            this.settle(Outcome::Failed(&err));
            return Poll::Ready(Some(Err(err)));
        }

        match Pin::new(&mut this.inner).poll_frame(cx) {
            Poll::Ready(Some(Ok(frame))) => {
                if let (Some(data), Some(dispatch)) = (frame.data_ref(), this.dispatch.as_mut()) {
                    dispatch.add_bytes(data.len() as u64);
                }
                Poll::Ready(Some(Ok(frame)))
            }
            Poll::Ready(Some(Err(e))) => {
                let err = StreamError::Upstream(e.into());
                this.settle(Outcome::Failed(&err));
                Poll::Ready(Some(Err(err)))
            }
            Poll::Ready(None) => {
                this.settle(Outcome::Finished);
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }

    fn is_end_stream(&self) -> bool {
        self.dispatch.is_none()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl<B> Drop for CountedBody<B> {
    fn drop(&mut self) {
        self.settle(Outcome::Abandoned);
    }
}

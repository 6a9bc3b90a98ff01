//! Idle-triggered batch dispatch
//!
//! Loaders never seal their own batches. [`until_idle`] polls a request
//! future and, each time it returns `Pending` without anything inside it
//! having asked to be polled again, seals every open batch of a
//! [`Dispatch`] implementor. At that point every resolver that can run has
//! run and registered its keys, so a batch holds all keys of one access
//! path that the current state of the request can produce, whatever order
//! the executor polls fields in and however quickly siblings complete.

use futures_util::future::poll_fn;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll, Wake, Waker};

/// Holder of open batches that can be sealed on demand
pub trait Dispatch: Send + Sync {
    /// Seal every open batch and start its fetch; returns how many were sealed
    fn dispatch_open(&self) -> usize;
}

/// Records whether the driven future woke itself and forwards the wake
#[derive(Default)]
struct WakeFlag {
    woken: AtomicBool,
    outer: Mutex<Option<Waker>>,
}

impl Wake for WakeFlag {
    fn wake(self: Arc<Self>) {
        self.wake_by_ref();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.woken.store(true, Ordering::SeqCst);
        if let Some(waker) = &*self.outer.lock() {
            waker.wake_by_ref();
        }
    }
}

/// Drive `future` to completion, dispatching `loaders` whenever it is idle
pub async fn until_idle<Fut, D>(future: Fut, loaders: &D) -> Fut::Output
where
    Fut: Future,
    D: Dispatch + ?Sized,
{
    let mut future = std::pin::pin!(future);
    let flag = Arc::new(WakeFlag::default());
    let waker = Waker::from(flag.clone());

    poll_fn(move |cx| {
        {
            let mut outer = flag.outer.lock();
            if !outer.as_ref().is_some_and(|w| w.will_wake(cx.waker())) {
                *outer = Some(cx.waker().clone());
            }
        }
        flag.woken.store(false, Ordering::SeqCst);

        if let Poll::Ready(output) = future.as_mut().poll(&mut Context::from_waker(&waker)) {
            return Poll::Ready(output);
        }
        // Something is runnable again; it was forwarded to the outer waker.
        if flag.woken.load(Ordering::SeqCst) {
            return Poll::Pending;
        }
        if loaders.dispatch_open() > 0 {
            cx.waker().wake_by_ref();
        }
        Poll::Pending
    })
    .await
}

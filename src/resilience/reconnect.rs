//! Ensure-connected guard with a single reconnect-and-retry.
//!
//! # Behaviour
//! ```text
//! handle empty?  → open socket, store it
//! run call
//!   Ok / non-closed error → return as is
//!   closed socket        → clear handle, open again, run call once more
//! ```

use std::future::Future;
use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::chain::types::RobonomicsResult;
use crate::observability::metrics;

/// Return the live handle, opening one if none is stored.
pub async fn ensure_connected<C, Open, OpenFut>(
    handle: &ArcSwapOption<C>,
    open: &Open,
) -> RobonomicsResult<Arc<C>>
where
    Open: Fn() -> OpenFut,
    OpenFut: Future<Output = RobonomicsResult<C>>,
{
    if let Some(existing) = handle.load_full() {
        return Ok(existing);
    }

    let fresh = Arc::new(open().await?);
    handle.store(Some(fresh.clone()));
    Ok(fresh)
}

/// Run `op` against a live connection, reopening and retrying exactly once
/// if the socket turns out to be closed.
pub async fn call_with_reconnect<C, T, Open, OpenFut, Op, OpFut>(
    handle: &ArcSwapOption<C>,
    open: Open,
    op: Op,
) -> RobonomicsResult<T>
where
    Open: Fn() -> OpenFut,
    OpenFut: Future<Output = RobonomicsResult<C>>,
    Op: Fn(Arc<C>) -> OpFut,
    OpFut: Future<Output = RobonomicsResult<T>>,
{
    let connection = ensure_connected(handle, &open).await?;

    match op(connection).await {
        Err(e) if e.is_connection_closed() => {
            tracing::warn!(error = %e, "Node connection closed, reopening and retrying once");
            metrics::record_reconnect();
            handle.store(None);
            let connection = ensure_connected(handle, &open).await?;
            op(connection).await
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::types::RobonomicsError;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fake connection: just the number of the socket that was opened.
    struct Socket(u32);

    #[tokio::test]
    async fn test_reuses_open_handle() {
        let handle = ArcSwapOption::empty();
        let counter = AtomicU32::new(0);
        let opened = &counter;
        let open = move || async move {
            Ok::<_, RobonomicsError>(Socket(opened.fetch_add(1, Ordering::SeqCst)))
        };

        for _ in 0..3 {
            let id = call_with_reconnect(&handle, open, |s: Arc<Socket>| async move {
                Ok::<_, RobonomicsError>(s.0)
            })
            .await
            .unwrap();
            assert_eq!(id, 0);
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_once_on_closed_socket() {
        let handle = ArcSwapOption::empty();
        let counter = AtomicU32::new(0);
        let opened = &counter;
        let open = move || async move {
            Ok::<_, RobonomicsError>(Socket(opened.fetch_add(1, Ordering::SeqCst)))
        };

        let result = call_with_reconnect(&handle, open, |s: Arc<Socket>| async move {
            if s.0 == 0 {
                Err(RobonomicsError::ConnectionClosed("socket 0 gone".into()))
            } else {
                Ok(s.0)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(handle.load_full().unwrap().0, 1);
    }

    #[tokio::test]
    async fn test_second_closed_error_propagates() {
        let handle = ArcSwapOption::empty();
        let open_counter = AtomicU32::new(0);
        let call_counter = AtomicU32::new(0);
        let opened = &open_counter;
        let calls = &call_counter;
        let open = move || async move {
            Ok::<_, RobonomicsError>(Socket(opened.fetch_add(1, Ordering::SeqCst)))
        };

        let result = call_with_reconnect(&handle, open, move |_: Arc<Socket>| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(RobonomicsError::ConnectionClosed("still gone".into()))
        })
        .await;

        assert!(matches!(result, Err(RobonomicsError::ConnectionClosed(_))));
        assert_eq!(call_counter.load(Ordering::SeqCst), 2);
        assert_eq!(open_counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let handle = ArcSwapOption::empty();
        let call_counter = AtomicU32::new(0);
        let calls = &call_counter;
        let open = || async { Ok::<_, RobonomicsError>(Socket(0)) };

        let result = call_with_reconnect(&handle, open, move |_: Arc<Socket>| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(RobonomicsError::Rpc("Method not found".into()))
        })
        .await;

        assert!(matches!(result, Err(RobonomicsError::Rpc(_))));
        assert_eq!(call_counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_open_failure_propagates() {
        let handle: ArcSwapOption<Socket> = ArcSwapOption::empty();
        let open = || async { Err::<Socket, _>(RobonomicsError::Timeout(5)) };

        let result = call_with_reconnect(&handle, open, |s: Arc<Socket>| async move {
            Ok::<_, RobonomicsError>(s.0)
        })
        .await;
        assert!(matches!(result, Err(RobonomicsError::Timeout(5))));
        assert!(handle.load_full().is_none());
    }
}

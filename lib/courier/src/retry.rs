//! Retry execution loop.
//!
//! One wire request may be dispatched several times under a
//! [`RetryPolicy`]. Status-based exhaustion hands back the last response;
//! error-based exhaustion re-raises the last error. A policy with a zero
//! attempt budget, or no policy at all, dispatches exactly once.

use courier_core::{Response, Result, RetryPolicy, WireRequest};

use crate::transport::Transport;

pub(crate) async fn send_with_retry<T: Transport>(
    transport: &T,
    call: &str,
    policy: Option<&RetryPolicy>,
    request: &WireRequest,
) -> Result<Response> {
    let Some(policy) = policy.filter(|p| p.attempts > 0) else {
        return transport.send(request.clone()).await;
    };

    let mut attempt = 1;
    loop {
        let last = attempt >= policy.attempts;
        match transport.send(request.clone()).await {
            Ok(response) => {
                if last || !policy.should_retry_status(response.status()) {
                    return Ok(response);
                }
                tracing::warn!(
                    call,
                    attempt,
                    status = response.status(),
                    "retrying after retryable status"
                );
            }
            Err(error) => {
                if last || !policy.should_retry_error(&error) {
                    return Err(error);
                }
                tracing::warn!(call, attempt, %error, "retrying after transport error");
            }
        }

        if !policy.backoff.is_zero() {
            tokio::time::sleep(policy.backoff).await;
        }
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use bytes::Bytes;
    use courier_core::{Error, Method, RetryOn};

    use super::*;

    /// Transport returning scripted outcomes, counting dispatches.
    struct ScriptedTransport {
        outcomes: Mutex<Vec<Result<Response>>>,
        dispatched: AtomicUsize,
    }

    impl ScriptedTransport {
        fn new(outcomes: Vec<Result<Response>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes),
                dispatched: AtomicUsize::new(0),
            }
        }

        fn count(&self) -> usize {
            self.dispatched.load(Ordering::SeqCst)
        }
    }

    impl Transport for ScriptedTransport {
        async fn send(&self, _request: WireRequest) -> Result<Response> {
            self.dispatched.fetch_add(1, Ordering::SeqCst);
            self.outcomes
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .remove(0)
        }
    }

    fn response(status: u16) -> Response {
        Response::new(status, "", HashMap::new(), Bytes::new())
    }

    fn wire() -> WireRequest {
        WireRequest {
            method: Method::Get,
            url: url::Url::parse("http://api.test/x").expect("url"),
            headers: Vec::new(),
            body: None,
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn retries_until_success() {
        let transport = ScriptedTransport::new(vec![
            Ok(response(500)),
            Ok(response(500)),
            Ok(response(200)),
        ]);
        let policy = RetryPolicy::default();

        let response = send_with_retry(&transport, "c", Some(&policy), &wire())
            .await
            .expect("response");
        assert_eq!(response.status(), 200);
        assert_eq!(transport.count(), 3);
    }

    #[tokio::test]
    async fn status_exhaustion_returns_last_response() {
        let transport = ScriptedTransport::new(vec![
            Ok(response(503)),
            Ok(response(503)),
            Ok(response(503)),
        ]);
        let policy = RetryPolicy::default();

        let response = send_with_retry(&transport, "c", Some(&policy), &wire())
            .await
            .expect("response");
        assert_eq!(response.status(), 503);
        assert_eq!(transport.count(), 3);
    }

    #[tokio::test]
    async fn error_on_final_attempt_is_raised() {
        let transport =
            ScriptedTransport::new(vec![Err(Error::Timeout), Err(Error::connection("refused"))]);
        let policy = RetryPolicy::attempts(2);

        let error = send_with_retry(&transport, "c", Some(&policy), &wire())
            .await
            .expect_err("error");
        assert!(error.is_connection());
        assert_eq!(transport.count(), 2);
    }

    #[tokio::test]
    async fn non_retryable_error_stops_immediately() {
        let transport = ScriptedTransport::new(vec![Err(Error::connection("refused"))]);
        let policy = RetryPolicy::attempts(5).retry_on(vec![RetryOn::Timeout]);

        let error = send_with_retry(&transport, "c", Some(&policy), &wire())
            .await
            .expect_err("error");
        assert!(error.is_connection());
        assert_eq!(transport.count(), 1);
    }

    #[tokio::test]
    async fn no_policy_dispatches_once() {
        let transport = ScriptedTransport::new(vec![Ok(response(500))]);

        let response = send_with_retry(&transport, "c", None, &wire())
            .await
            .expect("response");
        assert_eq!(response.status(), 500);
        assert_eq!(transport.count(), 1);
    }

    #[tokio::test]
    async fn zero_attempts_dispatches_once() {
        let transport = ScriptedTransport::new(vec![Ok(response(500))]);
        let policy = RetryPolicy::attempts(0);

        let response = send_with_retry(&transport, "c", Some(&policy), &wire())
            .await
            .expect("response");
        assert_eq!(response.status(), 500);
        assert_eq!(transport.count(), 1);
    }
}

//! Wait for the workload to answer HTTP 200.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use tracing::{debug, info, warn};

use crate::config::DEFAULT_READINESS_ATTEMPTS;
use crate::docker::CancelToken;
use crate::error::LaunchError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(1);
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// One readiness check. `Ok(status)` for any HTTP response.
pub trait Probe {
    fn get(&self, url: &str) -> Result<u16>;
}

/// [`Probe`] that issues a real GET.
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to create HTTP client")?;
        Ok(Self { client })
    }
}

impl Probe for HttpProbe {
    fn get(&self, url: &str) -> Result<u16> {
        let resp = self.client.get(url).send()?;
        Ok(resp.status().as_u16())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Ready { attempts: u32 },
    TimedOut { attempts: u32 },
    Cancelled,
}

/// Bounded retry loop with fixed spacing.
#[derive(Debug, Clone)]
pub struct Poller {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for Poller {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_READINESS_ATTEMPTS,
            interval: POLL_INTERVAL,
        }
    }
}

impl Poller {
    /// Poll `url` until it answers 200, the attempts run out, or `cancel` fires.
    ///
    /// Running out of attempts is not an error: the desktop shell keeps
    /// retrying its dev URL on its own.
    pub fn wait(&self, probe: &dyn Probe, url: &str, cancel: &CancelToken) -> Readiness {
        info!(url, "waiting for service to be ready");

        for attempt in 1..=self.attempts {
            if cancel.is_cancelled() {
                return Readiness::Cancelled;
            }
            match probe.get(url) {
                Ok(200) => {
                    info!(attempt, "service is ready");
                    return Readiness::Ready { attempts: attempt };
                }
                Ok(status) => debug!(attempt, status, "not ready"),
                Err(e) => debug!(attempt, error = %e, "not reachable"),
            }
            if attempt < self.attempts {
                std::thread::sleep(self.interval);
            }
        }

        warn!(
            "{}; continuing anyway",
            LaunchError::ReadinessTimeout {
                url: url.to_string(),
                attempts: self.attempts,
            }
        );
        Readiness::TimedOut {
            attempts: self.attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use anyhow::bail;

    use super::*;

    /// Replays `statuses`, then keeps failing to connect.
    struct ScriptedProbe {
        statuses: RefCell<Vec<u16>>,
        calls: Cell<u32>,
    }

    impl ScriptedProbe {
        fn new(mut statuses: Vec<u16>) -> Self {
            statuses.reverse();
            Self {
                statuses: RefCell::new(statuses),
                calls: Cell::new(0),
            }
        }
    }

    impl Probe for ScriptedProbe {
        fn get(&self, _url: &str) -> Result<u16> {
            self.calls.set(self.calls.get() + 1);
            match self.statuses.borrow_mut().pop() {
                Some(status) => Ok(status),
                None => bail!("connection refused"),
            }
        }
    }

    fn fast(attempts: u32) -> Poller {
        Poller {
            attempts,
            interval: Duration::ZERO,
        }
    }

    #[test]
    fn default_budget_is_thirty_seconds() {
        let p = Poller::default();
        assert_eq!(p.attempts, 30);
        assert_eq!(p.interval, Duration::from_secs(1));
    }

    #[test]
    fn first_200_wins() {
        let probe = ScriptedProbe::new(vec![502, 503, 200, 200]);
        let got = fast(30).wait(&probe, "http://localhost:8088", &CancelToken::new());
        assert_eq!(got, Readiness::Ready { attempts: 3 });
        assert_eq!(probe.calls.get(), 3);
    }

    #[test]
    fn non_200_success_codes_do_not_count() {
        let probe = ScriptedProbe::new(vec![204, 301]);
        let got = fast(2).wait(&probe, "http://localhost:8088", &CancelToken::new());
        assert_eq!(got, Readiness::TimedOut { attempts: 2 });
    }

    #[test]
    fn times_out_after_exactly_the_budget() {
        let probe = ScriptedProbe::new(Vec::new());
        let got = fast(30).wait(&probe, "http://localhost:8088", &CancelToken::new());
        assert_eq!(got, Readiness::TimedOut { attempts: 30 });
        assert_eq!(probe.calls.get(), 30);
    }

    #[test]
    fn cancellation_stops_polling() {
        let probe = ScriptedProbe::new(Vec::new());
        let cancel = CancelToken::new();
        cancel.cancel();
        let got = fast(30).wait(&probe, "http://localhost:8088", &cancel);
        assert_eq!(got, Readiness::Cancelled);
        assert_eq!(probe.calls.get(), 0);
    }

    #[test]
    fn live_server_is_ready_on_first_attempt() {
        use std::io::{Read, Write};

        let listener = std::net::TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf);
            stream
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                .unwrap();
        });

        let probe = HttpProbe::new().unwrap();
        let got = fast(5).wait(
            &probe,
            &format!("http://127.0.0.1:{port}"),
            &CancelToken::new(),
        );
        assert_eq!(got, Readiness::Ready { attempts: 1 });
        server.join().unwrap();
    }

    #[test]
    fn unbound_port_times_out() {
        let port = {
            let listener = std::net::TcpListener::bind(("127.0.0.1", 0)).unwrap();
            listener.local_addr().unwrap().port()
        };
        let probe = HttpProbe::new().unwrap();
        let got = fast(3).wait(
            &probe,
            &format!("http://127.0.0.1:{port}"),
            &CancelToken::new(),
        );
        assert_eq!(got, Readiness::TimedOut { attempts: 3 });
    }
}

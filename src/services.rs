//! Backend collaborators
//!
//! Wallet auth, score submission, minting and leaderboards are owned by the
//! page. The game only sees these narrow traits; the browser build wires them
//! to a JS bridge and tests wire them to in-memory fakes.

use std::future::{self, Future};
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::leaderboard::{Board, LeaderboardRecord};
use crate::sim::state::GameEvent;

/// Boxed single-threaded future returned by every service call
pub type ServiceFuture<T> = Pin<Box<dyn Future<Output = Result<T, Error>>>>;

/// Snapshot of the wallet session, read by the simulation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub authenticated: bool,
    pub wallet_address: Option<String>,
}

impl AuthContext {
    pub fn guest() -> Self {
        Self::default()
    }

    pub fn wallet(address: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            wallet_address: Some(address.into()),
        }
    }
}

pub trait AuthProvider {
    fn authenticated(&self) -> bool;
    fn login(&mut self);
    fn wallet_address(&self) -> Option<String>;

    fn snapshot(&self) -> AuthContext {
        AuthContext {
            authenticated: self.authenticated(),
            wallet_address: self.wallet_address(),
        }
    }
}

/// Reply from a score or mint call. An empty error string means success.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceResponse {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ServiceResponse {
    pub fn ok(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            url: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.as_deref().is_none_or(str::is_empty)
    }

    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }
}

pub trait ScoreService {
    fn submit(&self, score: u64, is_death: bool, auth: &AuthContext) -> ServiceFuture<ServiceResponse>;
}

pub trait MintService {
    fn mint(&self, score: u64, auth: &AuthContext) -> ServiceFuture<ServiceResponse>;
}

pub trait LeaderboardService {
    fn top(&self, board: Board) -> ServiceFuture<Vec<LeaderboardRecord>>;
}

/// A backend call requested by the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceRequest {
    Score { score: u64, is_death: bool },
    Mint { score: u64 },
}

impl ServiceRequest {
    /// Service calls carried by a simulation event
    pub fn from_event(event: &GameEvent) -> Option<Self> {
        match *event {
            GameEvent::SubmitScore { score, is_death } => Some(Self::Score { score, is_death }),
            GameEvent::Mint { score } => Some(Self::Mint { score }),
            _ => None,
        }
    }

    /// Transaction log label
    pub fn label(&self) -> String {
        match self {
            Self::Score { score, is_death: false } => format!("Kill: {score}"),
            Self::Score { score, is_death: true } => format!("Death: {score}"),
            Self::Mint { score } => format!("Mint: {score}"),
        }
    }
}

/// Routes simulation requests to the configured backends
pub struct Services {
    score: Box<dyn ScoreService>,
    mint: Box<dyn MintService>,
}

impl Services {
    pub fn new(score: Box<dyn ScoreService>, mint: Box<dyn MintService>) -> Self {
        Self { score, mint }
    }

    pub fn dispatch(&self, request: ServiceRequest, auth: &AuthContext) -> ServiceFuture<ServiceResponse> {
        match request {
            ServiceRequest::Score { score, is_death } => self.score.submit(score, is_death, auth),
            ServiceRequest::Mint { score } => {
                if !auth.authenticated {
                    return Box::pin(future::ready(Err(Error::NotAuthenticated)));
                }
                self.mint.mint(score, auth)
            }
        }
    }
}

const NO_FUNDS: &str = "No MONs left, you can play as a guest or use Faucet";

/// User-facing text for a raw backend or wallet error
pub fn describe_failure(raw: &str) -> String {
    let text = raw.to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| text.contains(n));

    let message = if has(&["json", "unexpected end"]) {
        "Network error. Please reload the page and try again."
    } else if has(&["insufficient balance", "insufficient funds"]) {
        NO_FUNDS
    } else if has(&["replacement transaction underpriced", "nonce"]) {
        "Transaction nonce error. Please reload the page and try again."
    } else if has(&["gas", "fee"]) {
        "Gas fee error. Network might be congested."
    } else if has(&["rejected", "denied"]) {
        "Transaction was rejected. Please try again."
    } else if has(&["timeout", "timed out"]) {
        "Transaction timed out. Network might be slow."
    } else if has(&["network", "connection"]) {
        "Network connection error. Please check your internet."
    } else if has(&["revert"]) {
        "Missing revert data."
    } else {
        return raw.to_string();
    };
    message.to_string()
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::task::{Context, Poll, Waker};

    use super::*;

    fn poll_ready<T>(mut fut: ServiceFuture<T>) -> Result<T, Error> {
        let mut cx = Context::from_waker(Waker::noop());
        match fut.as_mut().poll(&mut cx) {
            Poll::Ready(result) => result,
            Poll::Pending => panic!("fake service should resolve immediately"),
        }
    }

    #[derive(Default, Clone)]
    struct FakeBackend {
        calls: Rc<RefCell<Vec<String>>>,
    }

    impl ScoreService for FakeBackend {
        fn submit(&self, score: u64, is_death: bool, _auth: &AuthContext) -> ServiceFuture<ServiceResponse> {
            self.calls.borrow_mut().push(format!("score {score} {is_death}"));
            Box::pin(future::ready(Ok(ServiceResponse::ok("https://explorer/tx/1"))))
        }
    }

    impl MintService for FakeBackend {
        fn mint(&self, score: u64, _auth: &AuthContext) -> ServiceFuture<ServiceResponse> {
            self.calls.borrow_mut().push(format!("mint {score}"));
            Box::pin(future::ready(Ok(ServiceResponse::failed("execution reverted"))))
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(ServiceRequest::Score { score: 4, is_death: false }.label(), "Kill: 4");
        assert_eq!(ServiceRequest::Score { score: 9, is_death: true }.label(), "Death: 9");
        assert_eq!(ServiceRequest::Mint { score: 12 }.label(), "Mint: 12");
    }

    #[test]
    fn test_requests_from_events() {
        let e = GameEvent::SubmitScore { score: 3, is_death: true };
        assert_eq!(
            ServiceRequest::from_event(&e),
            Some(ServiceRequest::Score { score: 3, is_death: true })
        );
        assert_eq!(ServiceRequest::from_event(&GameEvent::Countdown(2)), None);
    }

    #[test]
    fn test_dispatch_routes_calls() {
        let backend = FakeBackend::default();
        let services = Services::new(Box::new(backend.clone()), Box::new(backend.clone()));
        let auth = AuthContext::wallet("0xabc");

        let reply = poll_ready(services.dispatch(ServiceRequest::Score { score: 2, is_death: false }, &auth)).unwrap();
        assert!(reply.is_success());
        let reply = poll_ready(services.dispatch(ServiceRequest::Mint { score: 5 }, &auth)).unwrap();
        assert!(!reply.is_success());

        assert_eq!(*backend.calls.borrow(), vec!["score 2 false", "mint 5"]);
    }

    #[test]
    fn test_guest_mint_rejected_without_calling_backend() {
        let backend = FakeBackend::default();
        let services = Services::new(Box::new(backend.clone()), Box::new(backend.clone()));
        let result = poll_ready(services.dispatch(ServiceRequest::Mint { score: 5 }, &AuthContext::guest()));
        assert!(matches!(result, Err(Error::NotAuthenticated)));
        assert!(backend.calls.borrow().is_empty());
    }

    #[test]
    fn test_empty_error_counts_as_success() {
        let reply = ServiceResponse::from_json(r#"{ "url": "https://x", "error": "" }"#).unwrap();
        assert!(reply.is_success());
        let reply = ServiceResponse::from_json(r#"{ "error": "boom" }"#).unwrap();
        assert!(!reply.is_success());
    }

    #[test]
    fn test_failure_text_mapping() {
        assert_eq!(describe_failure("Unexpected end of JSON input"), "Network error. Please reload the page and try again.");
        assert_eq!(describe_failure("signer had insufficient balance"), NO_FUNDS);
        assert_eq!(describe_failure("User denied transaction signature"), "Transaction was rejected. Please try again.");
        assert_eq!(describe_failure("request timed out"), "Transaction timed out. Network might be slow.");
        assert_eq!(describe_failure("something odd"), "something odd");
    }
}

//! OTP entry and resend flow for password recovery.
//!
//! Owns the six-digit input state and the resend cooldown timer for one
//! forgot-password attempt. Network calls are delegated to the session
//! manager; this controller decides when they are allowed. State changes are
//! published through a watch channel, mirroring the session manager.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::api::ApiResult;
use crate::auth::SessionManager;

/// Number of digits in an OTP code.
pub const OTP_LEN: usize = 6;

/// Seconds a user must wait before an OTP can be resent.
pub const RESEND_COOLDOWN_SECS: u32 = 59;

/// Snapshot of the forgot-password flow, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpFlowState {
    /// Address the OTP is requested for.
    pub email: String,
    /// Masked form of `email` for display.
    pub masked_email: String,
    /// Entered digits, one slot per character. Empty string means blank.
    pub digits: [String; OTP_LEN],
    /// Slot the next keystroke goes to.
    pub focus: usize,
    /// Whether an OTP has been dispatched for this email.
    pub sent: bool,
    /// Whether the resend action is currently permitted.
    pub resend_enabled: bool,
    /// Seconds remaining until resend unlocks.
    pub cooldown_secs: u32,
}

impl OtpFlowState {
    fn initial(email: &str) -> Self {
        Self {
            email: email.to_string(),
            masked_email: mask_email(email),
            digits: Default::default(),
            focus: 0,
            sent: false,
            resend_enabled: false,
            cooldown_secs: RESEND_COOLDOWN_SECS,
        }
    }
}

/// Receiver half of the OTP flow state channel.
pub type OtpFlowRx = watch::Receiver<OtpFlowState>;

/// Drives one forgot-password attempt.
///
/// The countdown task is cancelled when the flow is reset, when a resend
/// restarts it, and when the flow is dropped; a stale timer can never tick a
/// newer state.
pub struct OtpFlow {
    manager: Arc<SessionManager>,
    state: Arc<watch::Sender<OtpFlowState>>,
    cancel: CancellationToken,
}

impl OtpFlow {
    /// Creates a fresh flow for the given email.
    pub fn new(manager: Arc<SessionManager>, email: &str) -> Self {
        let (state, _) = watch::channel(OtpFlowState::initial(email));
        Self {
            manager,
            state: Arc::new(state),
            cancel: CancellationToken::new(),
        }
    }

    /// Returns a snapshot of the current flow state.
    pub fn state(&self) -> OtpFlowState {
        self.state.borrow().clone()
    }

    /// Subscribes to flow state changes (digit entry, countdown ticks).
    pub fn subscribe(&self) -> OtpFlowRx {
        self.state.subscribe()
    }

    /// Sends or resends the OTP.
    ///
    /// The first send is always allowed; a resend only once the cooldown has
    /// elapsed. Returns `Ok(false)` without issuing a network call when the
    /// resend gate is closed. Every successful send restarts the countdown at
    /// [`RESEND_COOLDOWN_SECS`] with resend disabled.
    ///
    /// # Errors
    /// Returns an error if the OTP dispatch request fails.
    pub async fn send_otp(&mut self) -> ApiResult<bool> {
        let (sent, resend_enabled, email) = {
            let state = self.state.borrow();
            (state.sent, state.resend_enabled, state.email.clone())
        };
        if sent && !resend_enabled {
            return Ok(false);
        }

        self.manager.forgot_password(&email).await?;

        self.state.send_modify(|state| {
            state.sent = true;
            state.resend_enabled = false;
            state.cooldown_secs = RESEND_COOLDOWN_SECS;
        });
        self.restart_countdown();

        Ok(true)
    }

    /// Records a keystroke in the given digit slot.
    ///
    /// Accepts a single ASCII digit or the empty string (a backspace);
    /// anything else is ignored. Entering a digit advances focus to the next
    /// slot, clearing one moves focus back.
    pub fn submit_digit(&mut self, index: usize, value: &str) {
        if index >= OTP_LEN || !is_digit_or_empty(value) {
            return;
        }

        self.state.send_modify(|state| {
            state.digits[index] = value.to_string();
            if !value.is_empty() && index < OTP_LEN - 1 {
                state.focus = index + 1;
            }
            if value.is_empty() && index > 0 {
                state.focus = index - 1;
            }
        });
    }

    /// Returns the concatenated code once all six slots are filled.
    pub fn code(&self) -> Option<String> {
        let state = self.state.borrow();
        if state.digits.iter().all(|digit| !digit.is_empty()) {
            Some(state.digits.concat())
        } else {
            None
        }
    }

    /// Verifies the entered code with the server.
    ///
    /// Returns `Ok(false)` without a network call unless all six slots are
    /// filled. On `Ok(true)` the caller proceeds to the reset-password step
    /// with [`Self::code`] and the flow's email.
    ///
    /// # Errors
    /// Returns an error if the verification request fails.
    pub async fn submit_code(&self) -> ApiResult<bool> {
        let Some(code) = self.code() else {
            return Ok(false);
        };

        let email = self.state.borrow().email.clone();
        self.manager.verify_otp(&email, &code).await?;
        Ok(true)
    }

    /// Returns the flow to its initial state, cancelling any running
    /// countdown. Used when the user abandons an in-progress OTP entry.
    pub fn reset(&mut self) {
        self.cancel.cancel();
        self.cancel = CancellationToken::new();

        let email = self.state.borrow().email.clone();
        self.state.send_replace(OtpFlowState::initial(&email));
    }

    /// Cancels the previous countdown task (if any) and starts a new one
    /// that decrements once per second until it reaches zero, then enables
    /// resend and stops.
    fn restart_countdown(&mut self) {
        self.cancel.cancel();
        self.cancel = CancellationToken::new();

        let cancel = self.cancel.clone();
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = cancel.cancelled() => return,
                    () = tokio::time::sleep(Duration::from_secs(1)) => {}
                }

                let mut finished = false;
                state.send_modify(|state| {
                    if state.cooldown_secs > 0 {
                        state.cooldown_secs -= 1;
                    }
                    if state.cooldown_secs == 0 {
                        state.resend_enabled = true;
                        finished = true;
                    }
                });
                if finished {
                    return;
                }
            }
        });
    }
}

impl Drop for OtpFlow {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Masks an email address for display, e.g. `john.doe@example.com` becomes
/// `*****oe@***.com`.
///
/// The local part keeps its last two characters only when longer than two
/// characters; the domain keeps everything from its last dot. A domain
/// without a dot is shown unchanged, and a missing domain masks to `***`.
pub fn mask_email(email: &str) -> String {
    let (local, domain) = match email.split_once('@') {
        Some((local, domain)) => (local, domain),
        None => (email, ""),
    };

    let char_count = local.chars().count();
    let masked_local = if char_count > 2 {
        let tail: String = local.chars().skip(char_count - 2).collect();
        format!("*****{tail}")
    } else {
        "*****".to_string()
    };

    let masked_domain = if domain.is_empty() {
        "***".to_string()
    } else {
        match domain.rfind('.') {
            Some(dot) => format!("***{}", &domain[dot..]),
            None => domain.to_string(),
        }
    };

    format!("{masked_local}@{masked_domain}")
}

fn is_digit_or_empty(value: &str) -> bool {
    value.is_empty() || (value.len() == 1 && value.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use tempfile::{TempDir, tempdir};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::ApiClient;
    use crate::credentials::CredentialStore;

    fn flow_for(server_uri: &str) -> (TempDir, OtpFlow) {
        let dir = tempdir().unwrap();
        let api = Arc::new(ApiClient::new(server_uri, Duration::from_secs(5)).unwrap());
        let store = CredentialStore::at(dir.path().join("credentials.json"));
        let manager = Arc::new(SessionManager::new(api, store));
        let flow = OtpFlow::new(manager, "jane.doe@example.com");
        (dir, flow)
    }

    async fn mount_forgot_password(server: &MockServer, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path("/auth/forgot-password"))
            .and(query_param("email", "jane.doe@example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "OTP sent"})))
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    /// Test: email masking keeps the local tail and the domain suffix.
    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("john.doe@example.com"), "*****oe@***.com");
        assert_eq!(mask_email("ab@x.io"), "*****@***.io");
        assert_eq!(mask_email("jane@mail.example.co.uk"), "*****ne@***.uk");
    }

    /// Test: masking degrades gracefully for unusual addresses.
    #[test]
    fn test_mask_email_edge_cases() {
        // Domain without a dot stays as is
        assert_eq!(mask_email("abc@localhost"), "*****bc@localhost");
        // No @ at all: the whole input is treated as the local part
        assert_eq!(mask_email("nodomain"), "*****in@***");
        // Empty domain
        assert_eq!(mask_email("abc@"), "*****bc@***");
    }

    /// Test: non-digit input is rejected without touching state.
    #[test]
    fn test_submit_digit_rejects_non_numeric() {
        let (_dir, mut flow) = flow_for("http://127.0.0.1:9");

        flow.submit_digit(0, "a");
        flow.submit_digit(0, "12");
        flow.submit_digit(9, "1");

        let state = flow.state();
        assert_eq!(state.digits[0], "");
        assert_eq!(state.focus, 0);
    }

    /// Test: entering six digits advances focus through every slot and the
    /// assembled code reads in slot order.
    #[test]
    fn test_digit_entry_advances_focus() {
        let (_dir, mut flow) = flow_for("http://127.0.0.1:9");

        for (i, digit) in ["1", "2", "3", "4", "5", "6"].iter().enumerate() {
            assert_eq!(flow.state().focus, i);
            flow.submit_digit(i, digit);
        }

        // Focus stays on the last slot
        assert_eq!(flow.state().focus, OTP_LEN - 1);
        assert_eq!(flow.code().as_deref(), Some("123456"));
    }

    /// Test: backspace moves focus to the previous slot.
    #[test]
    fn test_backspace_moves_focus_back() {
        let (_dir, mut flow) = flow_for("http://127.0.0.1:9");

        flow.submit_digit(0, "1");
        flow.submit_digit(1, "2");
        assert_eq!(flow.state().focus, 2);

        flow.submit_digit(2, "");
        assert_eq!(flow.state().focus, 1);
        assert_eq!(flow.code(), None);
    }

    /// Test: the code is only available once every slot is filled.
    #[test]
    fn test_code_requires_all_slots() {
        let (_dir, mut flow) = flow_for("http://127.0.0.1:9");

        for i in 0..5 {
            flow.submit_digit(i, "7");
        }
        assert_eq!(flow.code(), None);

        flow.submit_digit(5, "7");
        assert_eq!(flow.code().as_deref(), Some("777777"));
    }

    /// Test: the first send goes out, an immediate resend is gated off with
    /// no network call.
    #[tokio::test]
    async fn test_resend_gated_until_cooldown() {
        let server = MockServer::start().await;
        mount_forgot_password(&server, 1).await;
        let (_dir, mut flow) = flow_for(&server.uri());

        assert!(flow.send_otp().await.unwrap());
        let state = flow.state();
        assert!(state.sent);
        assert!(!state.resend_enabled);
        assert_eq!(state.cooldown_secs, RESEND_COOLDOWN_SECS);

        // Cooldown has not elapsed: gated no-op
        assert!(!flow.send_otp().await.unwrap());
    }

    /// Test: submitting an incomplete code is a no-op without network.
    #[tokio::test]
    async fn test_submit_incomplete_code_is_noop() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/verify-otp"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let (_dir, mut flow) = flow_for(&server.uri());

        flow.submit_digit(0, "1");
        assert!(!flow.submit_code().await.unwrap());
    }

    /// Test: a complete code is submitted for verification.
    #[tokio::test]
    async fn test_submit_complete_code_verifies() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/verify-otp"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        let (_dir, mut flow) = flow_for(&server.uri());

        for i in 0..OTP_LEN {
            flow.submit_digit(i, "4");
        }
        assert!(flow.submit_code().await.unwrap());
    }

    /// Test: the cooldown ticks down to zero, enables resend exactly at
    /// zero, and a resend rearms it.
    #[tokio::test]
    async fn test_cooldown_enables_resend_at_zero() {
        let server = MockServer::start().await;
        mount_forgot_password(&server, 2).await;
        let (_dir, mut flow) = flow_for(&server.uri());

        assert!(flow.send_otp().await.unwrap());

        // Drive the countdown on virtual time
        tokio::time::pause();
        let mut rx = flow.subscribe();
        while !rx.borrow().resend_enabled {
            rx.changed().await.unwrap();
        }
        assert_eq!(rx.borrow().cooldown_secs, 0);

        // Stays enabled once the timer has finished
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(flow.state().resend_enabled);
        assert_eq!(flow.state().cooldown_secs, 0);
        tokio::time::resume();

        // Resend goes through and rearms the cooldown
        assert!(flow.send_otp().await.unwrap());
        let state = flow.state();
        assert!(!state.resend_enabled);
        assert_eq!(state.cooldown_secs, RESEND_COOLDOWN_SECS);
    }

    /// Test: reset returns to the initial state and stops the countdown.
    #[tokio::test]
    async fn test_reset_cancels_countdown() {
        let server = MockServer::start().await;
        mount_forgot_password(&server, 1).await;
        let (_dir, mut flow) = flow_for(&server.uri());

        assert!(flow.send_otp().await.unwrap());
        flow.submit_digit(0, "9");
        flow.reset();

        // No timer is left running: nothing changes as time passes
        tokio::time::pause();
        tokio::time::sleep(Duration::from_secs(5)).await;

        let state = flow.state();
        assert!(!state.sent);
        assert!(!state.resend_enabled);
        assert_eq!(state.cooldown_secs, RESEND_COOLDOWN_SECS);
        assert_eq!(state.digits[0], "");
    }

    /// Test: dropping the flow cancels the countdown task.
    #[tokio::test]
    async fn test_drop_cancels_countdown() {
        let server = MockServer::start().await;
        mount_forgot_password(&server, 1).await;
        let (_dir, mut flow) = flow_for(&server.uri());

        assert!(flow.send_otp().await.unwrap());
        let rx = flow.subscribe();

        tokio::time::pause();
        let before = rx.borrow().cooldown_secs;
        drop(flow);
        tokio::time::sleep(Duration::from_secs(5)).await;

        // The countdown never ticked after the drop
        assert_eq!(rx.borrow().cooldown_secs, before);
    }
}

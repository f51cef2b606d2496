//! Per-session dialogue state.
//!
//! Every active call or chat owns exactly one [`DialogueSession`]. It is
//! mutated only by controller transitions and destroyed when the call ends
//! or the exit flow completes. Sessions never share state with each other.

use serde::{Deserialize, Serialize};

/// The conversational state the session is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Presenting the top-level menu and waiting for an intent.
    Menu,
    /// Waiting for the user to name a product (or reuse the last one).
    AwaitingProduct,
    /// Waiting for a bid amount.
    AwaitingBid,
    /// Waiting for the user's ID to attach to the pending bid.
    AwaitingUserId,
    /// Waiting for a yes/no on the pending bid.
    AwaitingConfirmation,
    /// Transient state: the selected flow is being executed. Never persists
    /// across turns; the controller always advances out of it before
    /// returning.
    Processing,
}

/// The task category the user selected from the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    None,
    Bid,
    CheckBid,
    Time,
    List,
    Exit,
}

/// State for a single dialogue session.
///
/// `last_product` persists across flows until explicitly replaced;
/// `bid_amount` and `user_id` are always cleared after a completed or
/// cancelled bid flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueSession {
    pub state: SessionState,
    pub flow: Flow,
    /// The product the current flow is operating on.
    pub product_name: Option<String>,
    /// The most recently resolved product, preserved between flows.
    pub last_product: Option<String>,
    pub bid_amount: Option<f64>,
    pub user_id: Option<String>,
    /// Consecutive failed extractions in the current slot-filling state.
    /// Resets on any successful extraction.
    pub failed_prompt_count: u32,
}

impl DialogueSession {
    /// Creates a fresh session sitting at the menu.
    pub fn new() -> Self {
        Self {
            state: SessionState::Menu,
            flow: Flow::None,
            product_name: None,
            last_product: None,
            bid_amount: None,
            user_id: None,
            failed_prompt_count: 0,
        }
    }

    /// Returns to the menu, dropping everything tied to the pending flow.
    ///
    /// `last_product` survives: the user can say "menu" mid-bid and still
    /// refer back to "the same product" afterwards.
    pub fn reset_to_menu(&mut self) {
        self.state = SessionState::Menu;
        self.flow = Flow::None;
        self.product_name = None;
        self.bid_amount = None;
        self.user_id = None;
        self.failed_prompt_count = 0;
    }

    /// Clears the slots collected for a bid. Called after the bid is
    /// submitted or cancelled, never in the middle of collection.
    pub fn clear_bid_slots(&mut self) {
        self.bid_amount = None;
        self.user_id = None;
    }
}

impl Default for DialogueSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_starts_at_menu() {
        let session = DialogueSession::new();
        assert_eq!(session.state, SessionState::Menu);
        assert_eq!(session.flow, Flow::None);
        assert!(session.product_name.is_none());
        assert!(session.last_product.is_none());
        assert!(session.bid_amount.is_none());
        assert!(session.user_id.is_none());
        assert_eq!(session.failed_prompt_count, 0);
    }

    #[test]
    fn reset_to_menu_preserves_last_product() {
        let mut session = DialogueSession::new();
        session.state = SessionState::AwaitingConfirmation;
        session.flow = Flow::Bid;
        session.product_name = Some("item42".to_string());
        session.last_product = Some("item42".to_string());
        session.bid_amount = Some(500.0);
        session.user_id = Some("u77".to_string());
        session.failed_prompt_count = 1;

        session.reset_to_menu();

        assert_eq!(session.state, SessionState::Menu);
        assert_eq!(session.flow, Flow::None);
        assert!(session.product_name.is_none());
        assert!(session.bid_amount.is_none());
        assert!(session.user_id.is_none());
        assert_eq!(session.failed_prompt_count, 0);
        assert_eq!(session.last_product.as_deref(), Some("item42"));
    }

    #[test]
    fn session_state_round_trips_through_json() {
        let mut session = DialogueSession::new();
        session.state = SessionState::AwaitingBid;
        session.flow = Flow::Bid;
        session.product_name = Some("vintage clock".to_string());
        session.last_product = Some("vintage clock".to_string());

        let json = serde_json::to_string(&session).unwrap();
        assert!(json.contains("awaiting_bid"));
        assert!(json.contains("\"flow\":\"bid\""));

        let restored: DialogueSession = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.state, SessionState::AwaitingBid);
        assert_eq!(restored.flow, Flow::Bid);
        assert_eq!(restored.product_name.as_deref(), Some("vintage clock"));
    }
}

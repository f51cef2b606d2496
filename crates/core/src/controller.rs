//! The dialogue session controller.
//!
//! This module makes the auction assistant's conversation flow explicit and
//! executable: a transition table keyed on (state, flow, extracted input)
//! instead of prompt-engineered behavior. The controller owns no I/O besides
//! the auction backend calls it dispatches; speech-to-text and text-to-speech
//! stay on the far side of the [`Command`] boundary.
//!
//! One turn = one utterance in, a list of [`Command`]s out. Backend failures
//! are never fatal: they become a spoken apology and a return to the menu.

use crate::{
    Command,
    backend::{AuctionBackend, BidRequest, Product},
    intent::{self, Confirmation, MenuIntent, ProductRef},
    session::{DialogueSession, Flow, SessionState},
};
use std::sync::Arc;
use tracing::{info, warn};

/// Consecutive failed extractions in a slot-filling state before the
/// recovery path fires.
const MAX_FAILED_PROMPTS: u32 = 2;

/// The greeting spoken when a session is created.
pub fn welcome_message() -> String {
    "Welcome to SmartAuction! You can place a bid, check the highest bid, \
     list products, check time left, or exit. Please say one of the options now."
        .to_string()
}

/// Drives one dialogue session at a time through the auction flows.
///
/// The controller itself is stateless; all per-session data lives in the
/// [`DialogueSession`] passed to each turn, so one controller instance can
/// serve many isolated sessions.
pub struct DialogueController {
    backend: Arc<dyn AuctionBackend>,
}

impl DialogueController {
    pub fn new(backend: Arc<dyn AuctionBackend>) -> Self {
        Self { backend }
    }

    /// Processes a single user utterance and advances the session.
    ///
    /// The returned commands are emitted in speaking order. The session is
    /// only ever mutated here, one turn at a time.
    pub async fn handle_utterance(
        &self,
        session: &mut DialogueSession,
        input: &str,
    ) -> Vec<Command> {
        let text = input.trim();

        // "menu" is a global escape: back to the menu from anywhere,
        // without touching the backend or the remembered product.
        if intent::is_menu_command(text) {
            info!(state = ?session.state, "User requested the menu");
            session.reset_to_menu();
            return vec![Command::Say(menu_prompt())];
        }

        match session.state {
            SessionState::Menu => self.handle_menu(session, text).await,
            SessionState::AwaitingProduct => self.handle_product(session, text).await,
            SessionState::AwaitingBid => self.handle_bid_amount(session, text).await,
            SessionState::AwaitingUserId => self.handle_user_id(session, text).await,
            SessionState::AwaitingConfirmation => self.handle_confirmation(session, text).await,
            // A persisted `processing` state means the previous turn was
            // interrupted; just run the pending flow.
            SessionState::Processing => self.run_processing(session).await,
        }
    }

    async fn handle_menu(&self, session: &mut DialogueSession, text: &str) -> Vec<Command> {
        let Some(menu_intent) = intent::parse_menu_intent(text) else {
            return vec![Command::Say(
                "Please choose: place bid, check bid, list products, check time, or exit."
                    .to_string(),
            )];
        };
        session.failed_prompt_count = 0;

        match menu_intent {
            MenuIntent::Bid | MenuIntent::CheckBid | MenuIntent::Time => {
                session.flow = match menu_intent {
                    MenuIntent::Bid => Flow::Bid,
                    MenuIntent::CheckBid => Flow::CheckBid,
                    _ => Flow::Time,
                };
                // A product named in the menu utterance itself ("place a
                // bid on item42") skips the product prompt.
                match intent::extract_menu_product(text) {
                    Some(ProductRef::Named(name)) => {
                        info!(product = %name, "Product named in menu utterance");
                        session.product_name = Some(name.clone());
                        session.last_product = Some(name);
                        session.state = SessionState::Processing;
                        self.run_processing(session).await
                    }
                    Some(ProductRef::Last) if session.last_product.is_some() => {
                        session.product_name = session.last_product.clone();
                        session.state = SessionState::Processing;
                        self.run_processing(session).await
                    }
                    _ => {
                        session.state = SessionState::AwaitingProduct;
                        vec![Command::Say(product_prompt(session.last_product.as_deref()))]
                    }
                }
            }
            // List and exit need no product, so they skip straight to
            // processing.
            MenuIntent::List => {
                session.flow = Flow::List;
                session.state = SessionState::Processing;
                self.run_processing(session).await
            }
            MenuIntent::Exit => {
                session.flow = Flow::Exit;
                session.state = SessionState::Processing;
                self.run_processing(session).await
            }
        }
    }

    async fn handle_product(&self, session: &mut DialogueSession, text: &str) -> Vec<Command> {
        match intent::extract_product(text) {
            Some(ProductRef::Named(name)) => {
                session.failed_prompt_count = 0;
                session.product_name = Some(name.clone());
                session.last_product = Some(name);
                session.state = SessionState::Processing;
                self.run_processing(session).await
            }
            Some(ProductRef::Last) if session.last_product.is_some() => {
                session.failed_prompt_count = 0;
                session.product_name = session.last_product.clone();
                session.state = SessionState::Processing;
                self.run_processing(session).await
            }
            _ => {
                self.register_failed_prompt(session, product_prompt(session.last_product.as_deref()))
                    .await
            }
        }
    }

    async fn handle_bid_amount(&self, session: &mut DialogueSession, text: &str) -> Vec<Command> {
        match intent::parse_amount(text) {
            Some(amount) => {
                session.failed_prompt_count = 0;
                session.bid_amount = Some(amount);
                session.state = SessionState::AwaitingUserId;
                vec![Command::Say(
                    "Please say your user ID to confirm the bid.".to_string(),
                )]
            }
            None => {
                self.register_failed_prompt(session, "Please say a valid bid amount.".to_string())
                    .await
            }
        }
    }

    async fn handle_user_id(&self, session: &mut DialogueSession, text: &str) -> Vec<Command> {
        match intent::extract_user_id(text) {
            Some(user_id) => {
                session.failed_prompt_count = 0;
                session.user_id = Some(user_id.clone());
                session.state = SessionState::AwaitingConfirmation;
                let product = session.product_name.clone().unwrap_or_default();
                let amount = session.bid_amount.unwrap_or_default();
                vec![Command::Say(format!(
                    "Confirm ₹{} bid on {} by user ID {}? Say yes or no.",
                    amount, product, user_id
                ))]
            }
            None => {
                self.register_failed_prompt(session, "Please say a valid user ID.".to_string())
                    .await
            }
        }
    }

    async fn handle_confirmation(&self, session: &mut DialogueSession, text: &str) -> Vec<Command> {
        match intent::parse_confirmation(text) {
            Some(Confirmation::Yes) => {
                session.failed_prompt_count = 0;
                self.submit_bid(session).await
            }
            Some(Confirmation::No) => {
                info!("Bid cancelled by user");
                session.failed_prompt_count = 0;
                session.clear_bid_slots();
                session.flow = Flow::None;
                session.state = SessionState::Menu;
                vec![
                    Command::Say("Bid cancelled.".to_string()),
                    Command::Say("What else can I do for you?".to_string()),
                ]
            }
            None => {
                self.register_failed_prompt(session, "Please say yes or no.".to_string())
                    .await
            }
        }
    }

    /// Submits the pending bid and returns to the menu, clearing the bid
    /// slots whether or not the call succeeded.
    async fn submit_bid(&self, session: &mut DialogueSession) -> Vec<Command> {
        let product = session.product_name.clone().unwrap_or_default();
        let bid = BidRequest {
            product_name: product.clone(),
            bid_amount: session.bid_amount.unwrap_or_default(),
            user_id: session.user_id.clone().unwrap_or_default(),
        };

        let mut commands = match self.backend.place_bid(bid).await {
            Ok(receipt) => {
                info!(product = %product, "Bid placed");
                vec![Command::Say(format!("Bid placed! {}", receipt.message))]
            }
            Err(error) => {
                warn!(product = %product, %error, "Bid submission failed");
                vec![Command::Say(format!(
                    "Sorry, I couldn't complete your bid on {}. Please try again later.",
                    product
                ))]
            }
        };

        session.clear_bid_slots();
        session.flow = Flow::None;
        session.state = SessionState::Menu;
        commands.push(Command::Say("What else can I do for you?".to_string()));
        commands
    }

    /// Executes the selected flow once its required slots are filled.
    ///
    /// `processing` is transient: every branch leaves the session in a
    /// stable state before returning.
    async fn run_processing(&self, session: &mut DialogueSession) -> Vec<Command> {
        match session.flow {
            Flow::Bid => {
                let Some(product) = session.product_name.clone() else {
                    // Bid flow without a product: go collect one.
                    session.state = SessionState::AwaitingProduct;
                    return vec![Command::Say(product_prompt(session.last_product.as_deref()))];
                };
                session.state = SessionState::AwaitingBid;
                vec![Command::Say(format!(
                    "How much would you like to bid on {}?",
                    product
                ))]
            }
            Flow::CheckBid => {
                let product = session.product_name.clone().unwrap_or_default();
                let reply = match self.backend.highest_bid(&product).await {
                    Ok(highest) => {
                        format!("Highest bid for {} is ₹{}.", product, highest.highest_bid)
                    }
                    Err(error) => {
                        warn!(product = %product, %error, "Highest-bid lookup failed");
                        format!("Couldn't find bids for {}.", product)
                    }
                };
                session.product_name = None;
                session.flow = Flow::None;
                session.state = SessionState::Menu;
                vec![
                    Command::Say(reply),
                    Command::Say("Anything else?".to_string()),
                ]
            }
            Flow::Time => {
                let product = session.product_name.clone().unwrap_or_default();
                let reply = match self.backend.time_left(&product).await {
                    Ok(seconds) => format!(
                        "Time left for {}: {}.",
                        product,
                        format_time_left(seconds)
                    ),
                    Err(error) => {
                        warn!(product = %product, %error, "Time-left lookup failed");
                        format!("Couldn't find time for {}.", product)
                    }
                };
                session.flow = Flow::None;
                session.state = SessionState::Menu;
                vec![
                    Command::Say(reply),
                    Command::Say("What else can I help with?".to_string()),
                ]
            }
            Flow::List => {
                let reply = match self.backend.list_products().await {
                    Ok(products) if products.is_empty() => {
                        "There are no products up for auction right now.".to_string()
                    }
                    Ok(products) => {
                        format!("Available products: {}.", format_product_list(&products))
                    }
                    Err(error) => {
                        warn!(%error, "Product listing failed");
                        "Sorry, I couldn't fetch the product list right now.".to_string()
                    }
                };
                session.flow = Flow::None;
                session.state = SessionState::Menu;
                vec![
                    Command::Say(reply),
                    Command::Say("What would you like to do next?".to_string()),
                ]
            }
            Flow::Exit => {
                info!("User ended the session");
                vec![Command::EndSession(
                    "Thank you for using SmartAuction! Goodbye!".to_string(),
                )]
            }
            Flow::None => {
                // No flow selected; fall back to the menu.
                session.state = SessionState::Menu;
                vec![Command::Say(menu_prompt())]
            }
        }
    }

    /// Counts a failed extraction and re-prompts, or fires the recovery
    /// path after the second consecutive failure: reuse the last product
    /// if one is known, otherwise fall back to listing products.
    async fn register_failed_prompt(
        &self,
        session: &mut DialogueSession,
        reprompt: String,
    ) -> Vec<Command> {
        session.failed_prompt_count += 1;
        if session.failed_prompt_count < MAX_FAILED_PROMPTS {
            return vec![Command::Say(reprompt)];
        }

        session.failed_prompt_count = 0;
        if let Some(last) = session.last_product.clone() {
            info!(product = %last, "Recovering with last known product");
            session.product_name = Some(last.clone());
            session.state = SessionState::Processing;
            let mut commands = vec![Command::Say(format!("I'll use your last product {}.", last))];
            commands.extend(self.run_processing(session).await);
            commands
        } else {
            info!("No last product; recovering by listing products");
            session.flow = Flow::List;
            session.state = SessionState::Processing;
            let mut commands = vec![Command::Say(
                "Let me list the available products.".to_string(),
            )];
            commands.extend(self.run_processing(session).await);
            commands
        }
    }
}

/// The standing menu prompt.
pub fn menu_prompt() -> String {
    "You can: place a bid, check highest bid, list products, check time left, \
     or exit. What would you like?"
        .to_string()
}

fn product_prompt(last_product: Option<&str>) -> String {
    match last_product {
        Some(last) => format!(
            "Please say the product name or ID, or say 'same product' to use {}.",
            last
        ),
        None => "Please say the product name or ID.".to_string(),
    }
}

/// Converts seconds remaining into the spoken days/hours/minutes form.
fn format_time_left(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;
    format!("{} days, {} hours, {} minutes", days, hours, minutes)
}

/// Joins products into the comma-separated spoken listing.
fn format_product_list(products: &[Product]) -> String {
    products
        .iter()
        .map(|p| format!("{} (ID: {})", p.name, p.id))
        .collect::<Vec<_>>()
        .join(", ")
}

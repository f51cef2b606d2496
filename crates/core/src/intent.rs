//! Deterministic intent and slot extraction.
//!
//! The speech/LLM channel delivers plain text; this module turns it into the
//! structured values the controller needs: a menu intent, a product
//! reference, a bid amount, a user ID, or a yes/no. Matching is keyword
//! based and case insensitive. Anything this module cannot extract counts
//! as a failed prompt for the calling state.

/// The top-level task the user picked from the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuIntent {
    Bid,
    CheckBid,
    Time,
    List,
    Exit,
}

/// How the user referred to a product in `awaiting_product`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductRef {
    /// "same product" / "last product" — reuse the remembered one.
    Last,
    /// A product name or ID given verbatim.
    Named(String),
}

/// The user's answer to a yes/no confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Yes,
    No,
}

/// Returns true when the utterance is the global "menu" escape word.
pub fn is_menu_command(text: &str) -> bool {
    let lowered = text.trim().to_lowercase();
    lowered == "menu" || lowered == "main menu" || lowered == "go to menu"
}

/// Matches an utterance against the menu options.
///
/// Order matters twice over: "check time left" must resolve to `Time`
/// even though it contains "check", and "check the highest bid" must
/// resolve to `CheckBid` even though it contains "bid". So time is tested
/// before the bare "check", and both before "bid".
pub fn parse_menu_intent(text: &str) -> Option<MenuIntent> {
    let words = words_of(text);
    if words.is_empty() {
        return None;
    }
    if has_any(&words, &["exit", "goodbye", "quit", "bye"]) {
        Some(MenuIntent::Exit)
    } else if has_any(&words, &["list", "products", "catalog"]) {
        Some(MenuIntent::List)
    } else if has_any(&words, &["time"]) {
        Some(MenuIntent::Time)
    } else if has_any(&words, &["check", "highest"]) {
        Some(MenuIntent::CheckBid)
    } else if has_any(&words, &["bid", "bidding"]) {
        Some(MenuIntent::Bid)
    } else {
        None
    }
}

/// Extracts a product mentioned inline in a menu utterance, e.g.
/// "place a bid on item42" or "check the highest bid for vintage clock".
///
/// The product is whatever follows the last "on"/"for" marker word, with
/// leading articles stripped. Returns `None` when the utterance names no
/// product, in which case the caller collects one in `awaiting_product`.
pub fn extract_menu_product(text: &str) -> Option<ProductRef> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let marker = tokens.iter().rposition(|t| {
        let lowered = t.to_lowercase();
        let word = lowered.trim_matches(|c: char| !c.is_alphanumeric());
        word == "on" || word == "for"
    })?;
    let mut rest = &tokens[marker + 1..];
    while let Some(first) = rest.first() {
        match first.to_lowercase().as_str() {
            "the" | "a" | "an" | "my" => rest = &rest[1..],
            _ => break,
        }
    }
    if rest.is_empty() {
        return None;
    }
    extract_product(&rest.join(" "))
}

/// Extracts a product reference from an utterance.
///
/// Product names are free-form ("a mix of letters and numbers or anything"),
/// so the trimmed utterance itself is the name unless it asks for the
/// remembered product.
pub fn extract_product(text: &str) -> Option<ProductRef> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lowered = trimmed.to_lowercase();
    if lowered.contains("same product")
        || lowered.contains("last product")
        || lowered == "same"
    {
        return Some(ProductRef::Last);
    }
    Some(ProductRef::Named(trimmed.to_string()))
}

/// Pulls a bid amount out of an utterance.
///
/// Valid only if numeric, finite and strictly positive. Currency symbols and
/// thousands separators are tolerated ("₹1,500" parses as 1500).
pub fn parse_amount(text: &str) -> Option<f64> {
    for token in text.split_whitespace() {
        // A leading minus makes the whole token a rejected, negative amount.
        if token.starts_with('-') {
            return None;
        }
        let cleaned: String = token
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        if cleaned.is_empty() {
            continue;
        }
        if let Ok(value) = cleaned.parse::<f64>() {
            if value.is_finite() && value > 0.0 {
                return Some(value);
            }
        }
    }
    None
}

/// Extracts a user ID: any non-empty utterance qualifies.
pub fn extract_user_id(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Interprets a yes/no answer to the confirmation prompt.
pub fn parse_confirmation(text: &str) -> Option<Confirmation> {
    let words = words_of(text);
    if words.is_empty() {
        return None;
    }
    if has_any(&words, &["yes", "yeah", "yep", "confirm", "correct", "sure"]) {
        Some(Confirmation::Yes)
    } else if has_any(&words, &["no", "not", "nope", "cancel", "stop"]) {
        Some(Confirmation::No)
    } else {
        None
    }
}

/// Lowercased alphanumeric words of an utterance. Matching whole words
/// avoids substring traps ("now" is not a "no", "listen" is not "list").
fn words_of(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_string())
        .collect()
}

fn has_any(words: &[String], needles: &[&str]) -> bool {
    words.iter().any(|w| needles.contains(&w.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_intent_matches_each_option() {
        assert_eq!(parse_menu_intent("I'd like to place a bid"), Some(MenuIntent::Bid));
        assert_eq!(parse_menu_intent("bid"), Some(MenuIntent::Bid));
        assert_eq!(parse_menu_intent("check the highest bid"), Some(MenuIntent::CheckBid));
        assert_eq!(parse_menu_intent("highest bid please"), Some(MenuIntent::CheckBid));
        assert_eq!(parse_menu_intent("list products"), Some(MenuIntent::List));
        assert_eq!(parse_menu_intent("how much time is left"), Some(MenuIntent::Time));
        assert_eq!(parse_menu_intent("exit"), Some(MenuIntent::Exit));
        assert_eq!(parse_menu_intent("goodbye"), Some(MenuIntent::Exit));
    }

    #[test]
    fn menu_intent_rejects_unrelated_text() {
        assert_eq!(parse_menu_intent("tell me a joke"), None);
        assert_eq!(parse_menu_intent(""), None);
        assert_eq!(parse_menu_intent("   "), None);
    }

    #[test]
    fn check_bid_wins_over_bid_when_both_appear() {
        // "check bid" contains "bid"; the read intent must win.
        assert_eq!(parse_menu_intent("check bid"), Some(MenuIntent::CheckBid));
    }

    #[test]
    fn check_time_phrases_resolve_to_time() {
        // "check time left" contains "check"; the time intent must win.
        assert_eq!(parse_menu_intent("check time left"), Some(MenuIntent::Time));
        assert_eq!(parse_menu_intent("check time"), Some(MenuIntent::Time));
        assert_eq!(parse_menu_intent("check the time left for the auction"), Some(MenuIntent::Time));
        // A bare "check" still reads as check_bid.
        assert_eq!(parse_menu_intent("check"), Some(MenuIntent::CheckBid));
    }

    #[test]
    fn menu_product_extraction() {
        assert_eq!(
            extract_menu_product("place a bid on item42"),
            Some(ProductRef::Named("item42".to_string()))
        );
        assert_eq!(
            extract_menu_product("check the highest bid for the vintage clock"),
            Some(ProductRef::Named("vintage clock".to_string()))
        );
        assert_eq!(
            extract_menu_product("time left for item42"),
            Some(ProductRef::Named("item42".to_string()))
        );
        assert_eq!(
            extract_menu_product("bid on my last product"),
            Some(ProductRef::Last)
        );
        // No marker word, no product.
        assert_eq!(extract_menu_product("place a bid"), None);
        assert_eq!(extract_menu_product("check time left"), None);
        // A dangling marker names nothing.
        assert_eq!(extract_menu_product("place a bid on"), None);
    }

    #[test]
    fn menu_command_detection() {
        assert!(is_menu_command("menu"));
        assert!(is_menu_command("  Menu "));
        assert!(is_menu_command("main menu"));
        assert!(!is_menu_command("menus are great"));
        assert!(!is_menu_command("item42"));
    }

    #[test]
    fn product_extraction() {
        assert_eq!(
            extract_product("item42"),
            Some(ProductRef::Named("item42".to_string()))
        );
        assert_eq!(
            extract_product("  Vintage Clock  "),
            Some(ProductRef::Named("Vintage Clock".to_string()))
        );
        assert_eq!(extract_product("the same product"), Some(ProductRef::Last));
        assert_eq!(extract_product("use my last product"), Some(ProductRef::Last));
        assert_eq!(extract_product(""), None);
        assert_eq!(extract_product("   "), None);
    }

    #[test]
    fn amount_parsing_accepts_positive_numbers() {
        assert_eq!(parse_amount("500"), Some(500.0));
        assert_eq!(parse_amount("I bid 250 rupees"), Some(250.0));
        assert_eq!(parse_amount("₹1,500"), Some(1500.0));
        assert_eq!(parse_amount("99.50"), Some(99.5));
    }

    #[test]
    fn amount_parsing_rejects_invalid_input() {
        assert_eq!(parse_amount("a lot"), None);
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("zero"), None);
        assert_eq!(parse_amount("0"), None);
        assert_eq!(parse_amount("-50"), None);
    }

    #[test]
    fn intent_matching_uses_whole_words() {
        assert_eq!(parse_menu_intent("listen to me"), None);
        assert_eq!(parse_confirmation("not now"), Some(Confirmation::No));
        assert_eq!(parse_confirmation("nowhere"), None);
    }

    #[test]
    fn user_id_requires_non_empty_text() {
        assert_eq!(extract_user_id("u77"), Some("u77".to_string()));
        assert_eq!(extract_user_id("  u77  "), Some("u77".to_string()));
        assert_eq!(extract_user_id(""), None);
        assert_eq!(extract_user_id("   "), None);
    }

    #[test]
    fn confirmation_parsing() {
        assert_eq!(parse_confirmation("yes"), Some(Confirmation::Yes));
        assert_eq!(parse_confirmation("Yeah, go ahead"), Some(Confirmation::Yes));
        assert_eq!(parse_confirmation("no"), Some(Confirmation::No));
        assert_eq!(parse_confirmation("cancel that"), Some(Confirmation::No));
        assert_eq!(parse_confirmation("hmm"), None);
        assert_eq!(parse_confirmation(""), None);
    }
}

//! Generative copy for menus and recommendations.
//!
//! Purely advisory: nothing here touches orders or ledgers, and no failure
//! leaves this module. A missing credential or a backend error turns into a
//! fixed fallback text.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::Restaurant;

pub const NO_CREDENTIAL_RECOMMENDATION: &str = "I recommend trying our specials!";
pub const UNAVAILABLE_RECOMMENDATION: &str = "I'm having trouble connecting to the AI chef right now.";

#[derive(Debug, Clone, Error, PartialEq)]
pub enum AdvisorError {
    #[error("No API key configured")]
    MissingCredential,
    #[error("Generation failed: {0}")]
    Backend(String),
}

/// A text generation service.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, AdvisorError>;
}

/// Backend used when no generation service is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineBackend;

#[async_trait]
impl GenerativeBackend for OfflineBackend {
    async fn generate(&self, _prompt: &str) -> Result<String, AdvisorError> {
        Err(AdvisorError::MissingCredential)
    }
}

pub struct Advisor<B> {
    backend: B,
}

impl<B: GenerativeBackend> Advisor<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Short menu blurb for a dish.
    pub async fn suggest_menu_description(&self, item_name: &str, ingredients: &str) -> String {
        let prompt = format!(
            "Write a short, appetizing description (max 20 words) for a menu item named \"{}\" containing \"{}\".",
            item_name, ingredients
        );
        match self.backend.generate(&prompt).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => menu_fallback(item_name),
            Err(e) => {
                warn!(error = %e, item_name, "Menu description unavailable, using fallback");
                menu_fallback(item_name)
            }
        }
    }

    /// Picks one or two dishes from `menu_context` matching the customer's query.
    pub async fn recommend_from_query(&self, query: &str, menu_context: &str) -> String {
        let prompt = format!(
            "You are a food concierge for Axle Delivery.\nMenu: {}\nCustomer query: \"{}\"\n\
             Recommend 1-2 specific items from the menu above that match the query. Keep it brief.",
            menu_context, query
        );
        match self.backend.generate(&prompt).await {
            Ok(text) if !text.trim().is_empty() => {
                debug!("Recommendation generated");
                text.trim().to_string()
            }
            Ok(_) => UNAVAILABLE_RECOMMENDATION.to_string(),
            Err(AdvisorError::MissingCredential) => NO_CREDENTIAL_RECOMMENDATION.to_string(),
            Err(e) => {
                warn!(error = %e, "Recommendation unavailable, using fallback");
                UNAVAILABLE_RECOMMENDATION.to_string()
            }
        }
    }
}

fn menu_fallback(item_name: &str) -> String {
    format!("A tasty {} prepared with fresh ingredients.", item_name)
}

/// Menu summary handed to the recommender: the selected restaurant's dishes
/// with descriptions, or every dish with its restaurant when none is selected.
pub fn menu_context(restaurants: &[Restaurant], selected: Option<&Restaurant>) -> String {
    match selected {
        Some(restaurant) => restaurant
            .menu
            .iter()
            .map(|m| format!("{} ({})", m.name, m.description))
            .collect::<Vec<_>>()
            .join(", "),
        None => restaurants
            .iter()
            .flat_map(|r| r.menu.iter().map(move |m| format!("{} from {}", m.name, r.name)))
            .collect::<Vec<_>>()
            .join(", "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::catalog;

    struct Scripted(Result<String, AdvisorError>);

    #[async_trait]
    impl GenerativeBackend for Scripted {
        async fn generate(&self, _prompt: &str) -> Result<String, AdvisorError> {
            self.0.clone()
        }
    }

    #[tokio::test]
    async fn test_menu_description_fails_open() {
        let offline = Advisor::new(OfflineBackend);
        assert_eq!(
            offline.suggest_menu_description("Smash Burger", "beef, cheddar").await,
            "A tasty Smash Burger prepared with fresh ingredients."
        );

        let broken = Advisor::new(Scripted(Err(AdvisorError::Backend("503".into()))));
        assert_eq!(
            broken.suggest_menu_description("Ramen", "noodles").await,
            "A tasty Ramen prepared with fresh ingredients."
        );

        let working = Advisor::new(Scripted(Ok("  Crispy, smoky, unforgettable. \n".into())));
        assert_eq!(
            working.suggest_menu_description("Wings", "chicken").await,
            "Crispy, smoky, unforgettable."
        );
    }

    #[tokio::test]
    async fn test_recommendation_fallbacks_distinguish_missing_key() {
        let offline = Advisor::new(OfflineBackend);
        assert_eq!(offline.recommend_from_query("spicy", "").await, NO_CREDENTIAL_RECOMMENDATION);

        let broken = Advisor::new(Scripted(Err(AdvisorError::Backend("timeout".into()))));
        assert_eq!(broken.recommend_from_query("spicy", "").await, UNAVAILABLE_RECOMMENDATION);
    }

    #[test]
    fn test_menu_context_formats() {
        let restaurants = catalog::default_restaurants();
        let all = menu_context(&restaurants, None);
        let first = &restaurants[0];
        assert!(all.starts_with(&format!("{} from {}", first.menu[0].name, first.name)));
        assert_eq!(all.split(", ").count(), 6);

        let selected = menu_context(&restaurants, Some(first));
        assert!(selected.starts_with(&format!("{} ({})", first.menu[0].name, first.menu[0].description)));
        assert!(!selected.contains(" from "));
    }
}

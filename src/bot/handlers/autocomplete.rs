//! Autocomplete handlers for Discord slash command parameters.

use crate::{bot::BotData, errors::Error};

/// Discord shows at most 25 suggestions.
const MAX_SUGGESTIONS: usize = 25;

/// Suggests configured dining venues matching what the user typed so far.
pub async fn autocomplete_venue(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    matching_venues(&ctx.data().config.events.venues, partial)
}

/// Case-insensitive substring match, in configuration order.
fn matching_venues(venues: &[String], partial: &str) -> Vec<String> {
    let partial_lower = partial.trim().to_lowercase();
    venues
        .iter()
        .filter(|venue| venue.to_lowercase().contains(&partial_lower))
        .take(MAX_SUGGESTIONS)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EventSettings;

    #[test]
    fn test_matching_is_case_insensitive() {
        let venues = EventSettings::default().venues;
        assert_eq!(matching_venues(&venues, "dining"), vec![
            "North Dining Hall".to_string(),
            "South Dining Hall".to_string()
        ]);
        assert_eq!(matching_venues(&venues, "WEST"), vec!["West Commons".to_string()]);
    }

    #[test]
    fn test_empty_input_suggests_everything() {
        let venues = EventSettings::default().venues;
        assert_eq!(matching_venues(&venues, ""), venues);
    }
}

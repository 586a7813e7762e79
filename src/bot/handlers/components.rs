//! Button and select-menu clicks on event messages.

use crate::{
    bot::{
        BotData, member_from_user,
        views::{self, EventAction},
    },
    core::{EventView, Member},
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use serenity::{
    ComponentInteraction, ComponentInteractionDataKind, CreateInteractionResponse,
    CreateInteractionResponseMessage,
};
use tracing::{debug, error, instrument};

/// Routes framework events to the matching handler.
pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, BotData, Error>,
    data: &BotData,
) -> Result<()> {
    if let serenity::FullEvent::InteractionCreate {
        interaction: serenity::Interaction::Component(component),
    } = event
    {
        handle_component(ctx, component, data).await?;
    }
    Ok(())
}

/// Applies a click to its event and answers the interaction.
///
/// Successful clicks update the event message in place; rejected ones get an
/// ephemeral reply only the clicking user sees.
#[instrument(skip_all, fields(custom_id = %interaction.data.custom_id, user = %interaction.user.id))]
pub async fn handle_component(
    ctx: &serenity::Context,
    interaction: &ComponentInteraction,
    data: &BotData,
) -> Result<()> {
    let Some((action, key)) = views::parse_custom_id(&interaction.data.custom_id) else {
        debug!("Ignoring component that doesn't belong to an event");
        return Ok(());
    };
    let member = member_from_user(&interaction.user);

    let response = match apply(action, key, &member, interaction, data).await {
        Ok(view) => {
            let (embed, components) = views::render(&view, &data.config.events.venues);
            CreateInteractionResponse::UpdateMessage(
                CreateInteractionResponseMessage::new()
                    .embed(embed)
                    .components(components),
            )
        }
        Err(e) => {
            if !e.is_user_facing() {
                error!(key, ?action, "Component interaction failed: {:?}", e);
            }
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(e.user_message())
                    .ephemeral(true),
            )
        }
    };

    interaction.create_response(ctx, response).await?;
    Ok(())
}

async fn apply(
    action: EventAction,
    key: &str,
    member: &Member,
    interaction: &ComponentInteraction,
    data: &BotData,
) -> Result<EventView> {
    let controller = &data.controller;
    match action {
        EventAction::Join => controller.set_attendance(key, member, true).await,
        EventAction::Decline => controller.set_attendance(key, member, false).await,
        EventAction::Go => controller.finish(key, member).await.map(|(view, _)| view),
        EventAction::Cancel => controller.cancel(key, member).await,
        EventAction::Venue => {
            let picked = selected_value(&interaction.data.kind)?;
            let venue = data
                .config
                .events
                .canonical_venue(picked)
                .ok_or_else(|| Error::InvalidInput {
                    message: format!("'{picked}' is not a known venue"),
                })?;
            controller.set_venue(key, member, venue).await
        }
    }
}

fn selected_value(kind: &ComponentInteractionDataKind) -> Result<&str> {
    let ComponentInteractionDataKind::StringSelect { values } = kind else {
        return Err(Error::InvalidInput {
            message: "Expected a venue selection".to_string(),
        });
    };
    values
        .first()
        .map(String::as_str)
        .ok_or_else(|| Error::InvalidInput {
            message: "No venue selected".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selected_value() {
        let kind = ComponentInteractionDataKind::StringSelect {
            values: vec!["West Commons".to_string()],
        };
        assert_eq!(selected_value(&kind).ok(), Some("West Commons"));

        let empty = ComponentInteractionDataKind::StringSelect { values: vec![] };
        assert!(matches!(selected_value(&empty), Err(Error::InvalidInput { .. })));
        assert!(matches!(
            selected_value(&ComponentInteractionDataKind::Button),
            Err(Error::InvalidInput { .. })
        ));
    }
}

//! Event Dispatch
//!
//! List actions arrive as structured records naming the entity id and the
//! action instead of ad-hoc callbacks. One dispatch table maps each action
//! onto the entity operation.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::handlers::AppState;
use crate::error::Result;
use crate::models::{AddDiscoveryRequest, AddDiscoveryResponse, DeleteResponse, ToggleResponse};

/// A user action on a list item.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Event {
    ToggleFavorite {
        id: u64,
    },
    RemoveFavorite {
        id: u64,
    },
    RemoveDiscovery {
        id: u64,
    },
    AddDiscovery {
        nom: String,
        #[serde(alias = "nomSci")]
        nom_sci: String,
        #[serde(default)]
        image: Option<String>,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::ToggleFavorite { .. } => "toggle_favorite",
            Event::RemoveFavorite { .. } => "remove_favorite",
            Event::RemoveDiscovery { .. } => "remove_discovery",
            Event::AddDiscovery { .. } => "add_discovery",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum EventOutcome {
    Toggled(ToggleResponse),
    Removed(DeleteResponse),
    Added(AddDiscoveryResponse),
}

/// Runs one event against the state.
pub async fn dispatch(state: &AppState, event: Event) -> Result<EventOutcome> {
    debug!("Dispatching {}", event.name());
    let outcome = match event {
        Event::ToggleFavorite { id } => EventOutcome::Toggled(state.toggle_favorite(id).await?),
        Event::RemoveFavorite { id } => EventOutcome::Removed(state.remove_favorite(id).await?),
        Event::RemoveDiscovery { id } => EventOutcome::Removed(state.remove_discovery(id).await?),
        Event::AddDiscovery { nom, nom_sci, image } => EventOutcome::Added(
            state
                .add_discovery(AddDiscoveryRequest {
                    nom,
                    nom_sci,
                    image,
                })
                .await?,
        ),
    };
    Ok(outcome)
}

/// Handler for POST /api/events
pub async fn events_handler(
    State(state): State<AppState>,
    Json(event): Json<Event>,
) -> Result<Json<EventOutcome>> {
    Ok(Json(dispatch(&state, event).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::fixtures::{observation, state};

    #[test]
    fn test_event_deserialize() {
        let event: Event = serde_json::from_str(r#"{"action":"remove_favorite","id":7}"#).unwrap();
        assert!(matches!(event, Event::RemoveFavorite { id: 7 }));

        let event: Event = serde_json::from_str(
            r#"{"action":"add_discovery","nom":"Lierre","nomSci":"Hedera helix"}"#,
        )
        .unwrap();
        assert_eq!(event.name(), "add_discovery");
    }

    #[test]
    fn test_unknown_action_rejected() {
        let result = serde_json::from_str::<Event>(r#"{"action":"explode","id":1}"#);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_dispatch_toggle_then_remove() {
        let state = state().await;
        state
            .session
            .replace_observations(vec![observation(r#"{"id":3}"#)])
            .await
            .unwrap();

        let outcome = dispatch(&state, Event::ToggleFavorite { id: 3 }).await.unwrap();
        assert!(matches!(outcome, EventOutcome::Toggled(ToggleResponse { favorite: true, .. })));

        let outcome = dispatch(&state, Event::RemoveFavorite { id: 3 }).await.unwrap();
        assert!(matches!(outcome, EventOutcome::Removed(DeleteResponse { removed: true, .. })));
        assert!(state.favorites.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_add_and_remove_discovery() {
        let state = state().await;

        let outcome = dispatch(
            &state,
            Event::AddDiscovery {
                nom: "Lierre".into(),
                nom_sci: "Hedera helix".into(),
                image: None,
            },
        )
        .await
        .unwrap();
        let id = match outcome {
            EventOutcome::Added(added) => {
                assert!(added.accepted);
                assert!(!added.entry.has_image);
                added.entry.id
            }
            other => panic!("unexpected outcome {:?}", other),
        };

        dispatch(&state, Event::RemoveDiscovery { id }).await.unwrap();
        assert!(state.discoveries.list().await.unwrap().is_empty());
    }
}

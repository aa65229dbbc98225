use std::path::Path;

use uuid::Uuid;

use crate::{
    application::{config::Command, state::AppContext},
    controllers::{EventDetailController, EventListController, EventListState, PairingController},
    domain::error::ApiError,
};

pub async fn run(command: &Command, context: &AppContext) -> Result<(), ApiError> {
    match command {
        Command::Pair { code } => pair(context, code).await,
        Command::Status => status(context).await,
        Command::Cameras => cameras(context).await,
        Command::Events { camera, pages } => events(context, *camera, *pages).await,
        Command::Event { id, thumbnail } => event(context, *id, thumbnail.as_deref()).await,
        Command::Refresh => refresh(context).await,
        Command::SignOut => sign_out(context).await,
    }
}

async fn pair(context: &AppContext, code: &str) -> Result<(), ApiError> {
    let pairing = PairingController::new(context.client.clone());
    pairing.set_code(code).await;
    if !pairing.is_code_complete().await {
        return Err(ApiError::Rejected(
            "the pairing code must be exactly 6 digits".to_owned(),
        ));
    }

    pairing.verify().await;

    let state = pairing.snapshot().await;
    if let Some(message) = state.error_message {
        return Err(ApiError::Rejected(message));
    }

    match context.client.sessions().current_session().await {
        Some(session) => println!("Paired. Session valid until {}.", session.expires_at),
        None => println!("Paired."),
    }
    Ok(())
}

async fn status(context: &AppContext) -> Result<(), ApiError> {
    match context.client.sessions().current_session().await {
        None => println!("Not paired."),
        Some(session) if session.is_expired() => {
            println!(
                "Session expired at {}. Run `argus refresh` or pair again.",
                session.expires_at
            );
        }
        Some(session) => println!("Authenticated. Session valid until {}.", session.expires_at),
    }
    Ok(())
}

async fn cameras(context: &AppContext) -> Result<(), ApiError> {
    let cameras = context.client.fetch_cameras().await?;
    if cameras.is_empty() {
        println!("No cameras.");
        return Ok(());
    }

    for camera in cameras {
        let reachability = if camera.is_online { "online" } else { "offline" };
        let enablement = if camera.is_enabled { "" } else { " (disabled)" };
        println!(
            "{}  {}  {} [{}]{}",
            camera.id, camera.name, reachability, camera.source_type, enablement
        );
    }
    Ok(())
}

async fn events(context: &AppContext, camera: Option<Uuid>, pages: usize) -> Result<(), ApiError> {
    let list = EventListController::new(context.client.clone());
    list.load_first_page(camera).await;

    let mut state = list.snapshot().await;
    if let Some(message) = &state.error_message {
        return Err(ApiError::Rejected(message.clone()));
    }

    for _ in 1..pages {
        if !state.has_more {
            break;
        }
        list.load_more().await;
        state = list.snapshot().await;
        if let Some(message) = &state.error_message {
            return Err(ApiError::Rejected(message.clone()));
        }
    }

    print_events(&state);
    Ok(())
}

fn print_events(state: &EventListState) {
    if state.is_empty() {
        println!("No events.");
        return;
    }

    for event in &state.events {
        println!(
            "{}  {}  {:<7} {:>3}%  {}  {}",
            event.id,
            event.timestamp.format("%Y-%m-%d %H:%M:%S"),
            event.smart_detection_type.label(),
            event.confidence,
            event.camera_name,
            event.description
        );
    }
    if state.has_more {
        println!("(more events available)");
    }
}

async fn event(context: &AppContext, id: Uuid, thumbnail: Option<&Path>) -> Result<(), ApiError> {
    let detail = EventDetailController::new(context.client.clone());
    detail.load_event(id).await;

    let state = detail.snapshot().await;
    if let Some(message) = state.error_message {
        return Err(ApiError::Rejected(message));
    }
    let Some(event) = state.event else {
        return Err(ApiError::NotFound);
    };

    println!("Event      {}", event.id);
    println!("Camera     {} ({})", event.camera_name, event.camera_id);
    println!("Time       {}", event.timestamp);
    println!(
        "Detection  {} ({}% confidence)",
        event.smart_detection_type.label(),
        event.confidence
    );
    if let Some(mode) = event.analysis_mode {
        println!("Analysis   {}", mode.label());
    }
    println!("{}", event.description);

    if let Some(path) = thumbnail {
        if !event.has_thumbnail {
            println!("No thumbnail available.");
            return Ok(());
        }

        detail.load_thumbnail(id).await;
        match detail.snapshot().await.thumbnail_data {
            Some(bytes) => {
                tokio::fs::write(path, &bytes).await.map_err(|error| {
                    ApiError::Storage(format!("failed to write thumbnail: {error}"))
                })?;
                println!("Thumbnail saved to {}.", path.display());
            }
            // Thumbnail failures are non-fatal; the event itself rendered.
            None => println!("Thumbnail could not be loaded."),
        }
    }
    Ok(())
}

async fn refresh(context: &AppContext) -> Result<(), ApiError> {
    let session = context.client.refresh_session().await?;
    println!("Session refreshed. Valid until {}.", session.expires_at);
    Ok(())
}

async fn sign_out(context: &AppContext) -> Result<(), ApiError> {
    context.client.sign_out().await?;
    println!("Signed out.");
    Ok(())
}

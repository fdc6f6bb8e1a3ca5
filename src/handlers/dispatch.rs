//! Wave dispatch handlers for NATS messages

use std::sync::Arc;

use anyhow::Result;
use async_nats::{Client, Subscriber};
use futures::StreamExt;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::services::dispatch::WaveDispatcher;
use crate::services::optimizer::OptimizerClient;
use crate::types::{DispatchRequest, ErrorResponse, Request, SuccessResponse};

/// Handle dispatch.before_wave messages
pub async fn handle_before_wave(
    client: Client,
    mut subscriber: Subscriber,
    optimizer: Arc<dyn OptimizerClient>,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received dispatch.before_wave message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let request: Request<DispatchRequest> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse request: {}", e);
                let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        debug!(current_time = %request.payload.current_time, "Building before-wave dispatcher");

        let dispatcher = match WaveDispatcher::new(request.payload) {
            Ok(dispatcher) => dispatcher,
            Err(e) => {
                error!("Rejected dispatch request: {}", e);
                let error = ErrorResponse::new(request.id, e.code(), e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        match dispatcher.before_wave(optimizer.as_ref()).await {
            Ok(response) => {
                let response = SuccessResponse::new(request.id, response);
                let _ = client
                    .publish(reply, serde_json::to_vec(&response)?.into())
                    .await;
            }
            Err(e) => {
                error!("Before-wave dispatch failed: {}", e);
                let error = ErrorResponse::new(request.id, e.code(), e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
            }
        }
    }

    Ok(())
}

/// Handle dispatch.after_wave messages
pub async fn handle_after_wave(
    client: Client,
    mut subscriber: Subscriber,
    optimizer: Arc<dyn OptimizerClient>,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received dispatch.after_wave message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let request: Request<DispatchRequest> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse request: {}", e);
                let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        debug!(current_time = %request.payload.current_time, "Building after-wave dispatcher");

        let mut dispatcher = match WaveDispatcher::new(request.payload) {
            Ok(dispatcher) => dispatcher,
            Err(e) => {
                error!("Rejected dispatch request: {}", e);
                let error = ErrorResponse::new(request.id, e.code(), e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        match dispatcher.after_wave(optimizer.as_ref()).await {
            Ok(response) => {
                let response = SuccessResponse::new(request.id, response);
                let _ = client
                    .publish(reply, serde_json::to_vec(&response)?.into())
                    .await;
            }
            Err(e) => {
                error!("After-wave dispatch failed: {}", e);
                let error = ErrorResponse::new(request.id, e.code(), e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
            }
        }
    }

    Ok(())
}

pub mod handlers;
pub mod routes;

use serde::Serialize;

use crate::tts::Device;

#[derive(Debug, Serialize)]
pub struct PersonalitiesResponse {
    pub personalities: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub device: Device,
}

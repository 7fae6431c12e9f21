//! Infrastructure services

mod ai_gateway;
mod cached;
mod medical_query_service;
mod search_gateway;

pub use ai_gateway::{AiGateway, AiGatewayConfig};
pub use cached::GatewayCacheConfig;
pub use medical_query_service::{
    MedicalQuery, MedicalQueryService, QueryAnswer, DEFAULT_MAX_SOURCES,
};
pub use search_gateway::{SearchGateway, SearchGatewayConfig};

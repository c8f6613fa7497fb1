//! # Routing Metadata
//!
//! Orders may carry delivery route metadata (distance, duration, geometry).
//! Resolving it belongs to an external collaborator behind [`RouteResolver`];
//! the engine asks once, in the background right after an order is stored,
//! and treats any failure as "no route".

use crate::model::{Address, RouteInfo};
use async_trait::async_trait;
use std::fmt::Debug;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RouteError {
    #[error("routing is not configured")]
    Unavailable,
    #[error("route lookup failed: {0}")]
    Failed(String),
}

/// Resolves a delivery address to route metadata.
#[async_trait]
pub trait RouteResolver: Send + Sync + Debug {
    async fn resolve(&self, address: &Address) -> Result<RouteInfo, RouteError>;
}

/// Resolver for deployments without a routing service.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRouting;

#[async_trait]
impl RouteResolver for NoRouting {
    async fn resolve(&self, _address: &Address) -> Result<RouteInfo, RouteError> {
        Err(RouteError::Unavailable)
    }
}

/// Answers every lookup with the same route. Used by the demo binary.
#[derive(Debug, Clone)]
pub struct FixedRoute(pub RouteInfo);

#[async_trait]
impl RouteResolver for FixedRoute {
    async fn resolve(&self, _address: &Address) -> Result<RouteInfo, RouteError> {
        Ok(self.0.clone())
    }
}

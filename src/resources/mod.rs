//! Resource model and terminal handlers for the repository-manager
//! surface.

pub mod handlers;
pub mod models;

use crate::registry::HandlerRegistry;

use handlers::{
    ContentHandler, LoginHandler, LogoutHandler, MaintenanceHandler, MaintenanceKind,
    RepositoriesHandler, RepositoryStatusHandler, RepositoryStatusesHandler,
};

/// Paths shared between the typed client and the server registry.
pub mod paths {
    pub const REPOSITORIES: &str = "repositories/";
    pub const REPOSITORY_STATUSES: &str = "repository_statuses";
    pub const LOGIN: &str = "authentication/login";
    pub const LOGOUT: &str = "authentication/logout";
}

/// Wires every resource path to its handler factory. Called once at
/// startup; the registry is read-only afterwards.
pub fn build_registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();

    registry.attach("repositories", || RepositoriesHandler);
    registry.attach("repository_statuses", || RepositoryStatusesHandler);
    registry.attach("repositories/{id}/status", || RepositoryStatusHandler);
    registry.attach("repositories/{id}/content/{path..}", || ContentHandler);
    registry.attach("data_index/repositories/{id}/content", || {
        MaintenanceHandler::new(MaintenanceKind::Reindex)
    });
    registry.attach("data_cache/repositories/{id}/content", || {
        MaintenanceHandler::new(MaintenanceKind::ClearCache)
    });
    registry.attach("attributes/repositories/{id}/content", || {
        MaintenanceHandler::new(MaintenanceKind::RebuildAttributes)
    });
    registry.attach(paths::LOGIN, || LoginHandler);
    registry.attach(paths::LOGOUT, || LogoutHandler);

    registry
}

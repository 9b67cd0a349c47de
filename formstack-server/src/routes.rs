//! Centralized route configuration for the formstack API.
//!
//! Shared by the server binary and the integration tests so both exercise the
//! same routing and middleware setup.

use crate::handlers::{
    admin_handlers, auth_handlers, form_handlers, integration_handlers, main_handlers,
    template_handlers,
};
use crate::middleware::{AuthenticationMiddleware, RoleMiddleware};
use actix_web::web;
use formstack_models::Role;

/// Mounts every route under `/api`.
///
/// Public routes work anonymously; handlers behind them that need a user
/// return 401 on their own. The `/admin` scope additionally requires the
/// admin role.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .wrap(AuthenticationMiddleware)
            .route("/health", web::get().to(main_handlers::health_check))
            // Authentication
            .route("/auth/register", web::post().to(auth_handlers::register))
            .route("/auth/login", web::post().to(auth_handlers::login))
            .route("/auth/refresh", web::post().to(auth_handlers::refresh))
            .route("/auth/logout", web::post().to(auth_handlers::logout))
            .route("/me", web::get().to(auth_handlers::me))
            // Templates (static paths before `{id}`)
            .route("/templates", web::get().to(template_handlers::list_templates))
            .route("/templates", web::post().to(template_handlers::create_template))
            .route(
                "/templates/search",
                web::get().to(template_handlers::search_templates),
            )
            .route(
                "/templates/latest",
                web::get().to(template_handlers::latest_templates),
            )
            .route(
                "/templates/popular",
                web::get().to(template_handlers::popular_templates),
            )
            .route("/templates/{id}", web::get().to(template_handlers::get_template))
            .route(
                "/templates/{id}",
                web::put().to(template_handlers::update_template),
            )
            .route(
                "/templates/{id}",
                web::delete().to(template_handlers::delete_template),
            )
            .route(
                "/templates/{id}/forms",
                web::get().to(form_handlers::list_template_forms),
            )
            .route(
                "/templates/{id}/forms",
                web::post().to(form_handlers::submit_form),
            )
            .route("/tags", web::get().to(template_handlers::list_tags))
            // Forms
            .route("/forms", web::get().to(form_handlers::list_my_forms))
            .route("/forms/{id}", web::get().to(form_handlers::get_form))
            .route("/forms/{id}", web::put().to(form_handlers::update_form))
            .route("/forms/{id}", web::delete().to(form_handlers::delete_form))
            // Integrations
            .route(
                "/integrations/jira/tickets",
                web::post().to(integration_handlers::create_jira_ticket),
            )
            .route(
                "/integrations/jira/tickets",
                web::get().to(integration_handlers::list_jira_tickets),
            )
            .route(
                "/integrations/salesforce/contacts",
                web::post().to(integration_handlers::create_salesforce_contact),
            )
            // Administration
            .service(
                web::scope("/admin")
                    .wrap(RoleMiddleware::new(Role::Admin))
                    .route("/users", web::get().to(admin_handlers::list_users))
                    .route("/users/{id}", web::patch().to(admin_handlers::update_user))
                    .route("/users/{id}", web::delete().to(admin_handlers::delete_user))
                    .route("/forms", web::get().to(admin_handlers::list_all_forms)),
            ),
    );
}

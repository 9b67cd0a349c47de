// Main handlers (system/health handlers)
pub mod main_handlers;
pub use main_handlers::AppState;

// Registration, login and token refresh
pub mod auth_handlers;

// Template CRUD, search and tags
pub mod template_handlers;

// Form submissions and merged question/answer views
pub mod form_handlers;

// User management and submission history for admins
pub mod admin_handlers;

// Jira and Salesforce
pub mod integration_handlers;

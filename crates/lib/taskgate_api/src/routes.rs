//! Route paths served by the API.

pub const GET_PING: &str = "/api/ping";

pub const POST_AUTH_REGISTER: &str = "/api/auth/register";
pub const POST_AUTH_LOGIN: &str = "/api/auth/login";
pub const POST_AUTH_GOOGLE: &str = "/api/auth/google";
pub const POST_AUTH_REFRESH: &str = "/api/auth/refresh-token";
pub const POST_AUTH_LOGOUT: &str = "/api/auth/logout";
pub const POST_AUTH_FORGOT_PASSWORD: &str = "/api/auth/forgot-password";
pub const POST_AUTH_SET_NEW_PASSWORD: &str = "/api/auth/set-new-password";
pub const GET_AUTH_ME: &str = "/api/auth/me";

/// `GET` lists, `POST` creates.
pub const TASKS: &str = "/api/tasks";
/// `PATCH` updates status, `DELETE` removes.
pub const TASKS_ID: &str = "/api/tasks/{id}";

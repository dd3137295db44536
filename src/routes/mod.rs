/// Router Module Index
///
/// Routes are split by access class, mirroring the route classification the
/// gate applies in the browser. Authentication is enforced per router layer.

/// Routes open to anonymous visitors: health, gate decisions, logout.
pub mod public;

/// Routes behind the `SessionUser` layer: cover-letter editor sessions.
pub mod authenticated;

/// Routes for the `ADMIN` role. The role check lives in each handler.
pub mod admin;

/// Router Module Index
///
/// Routes are grouped by the requirement their guard enforces, so access
/// control is visible at the module level rather than inside handlers.

/// Routes reachable without a session: health, sign-in context, sign-out.
pub mod public;

/// Routes open to any signed-in principal.
pub mod authenticated;

/// Document routes guarded by `doc:read` / `doc:write`.
pub mod documents;

/// Routes restricted to the `admin` role.
pub mod admin;

/// Router Module Index
///
/// Splits the routing table by access level. Access control itself is not tied to this
/// split: the request gate installed in `create_router` decides per path using its
/// allow-list, and these modules only keep the two groups easy to audit.

/// Routes on the gate's allow-list (registration, login, utility routes).
pub mod public;

/// Routes that require Basic credentials on every request.
pub mod authenticated;

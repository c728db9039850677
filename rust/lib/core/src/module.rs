use axum::Router;

/// A service module that contributes HTTP routes to the daemon.
///
/// The returned router is already bound to its own state and is merged
/// by the binary under `/{name}`.
pub trait Module: Send + Sync {
    /// Module name, used for logging and as the route prefix.
    fn name(&self) -> &str;

    /// Routes relative to the module prefix.
    fn routes(&self) -> Router;
}

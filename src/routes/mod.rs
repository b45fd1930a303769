/// Router Module Index
///
/// Routes grouped by who may reach them. Unlike a layer-per-group setup, every
/// protected route here is a resource whose own authorization gate decides, so the
/// grouping documents intent rather than enforcing it.

/// Routes anyone can reach.
pub mod public;

/// Resources that require a signed-in identity.
pub mod authenticated;

/// Resources restricted to the `admin` role.
pub mod admin;

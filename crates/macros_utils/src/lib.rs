//! Small declarative helpers shared by the HTTP apps.

#[cfg(feature = "actix")]
#[doc(hidden)]
pub use actix_web as __actix_web;

/// Generates `pub fn routes(cfg: &mut ServiceConfig)` registering every listed
/// handler (`route handler`) and delegating to the `routes` function of every
/// listed submodule (`module name`).
///
/// ```ignore
/// macros_utils::routes! {
///     route health_route,
///     module websites,
/// }
/// ```
#[cfg(feature = "actix")]
#[macro_export]
macro_rules! routes {
    ($($body:tt)*) => {
        pub fn routes(cfg: &mut $crate::__actix_web::web::ServiceConfig) {
            $crate::__routes_inner!(cfg; $($body)*);
        }
    };
}

#[cfg(feature = "actix")]
#[doc(hidden)]
#[macro_export]
macro_rules! __routes_inner {
    ($cfg:ident;) => {};
    ($cfg:ident; route $handler:path $(, $($rest:tt)*)?) => {
        $cfg.service($handler);
        $crate::__routes_inner!($cfg; $($($rest)*)?);
    };
    ($cfg:ident; module $module:ident $(, $($rest:tt)*)?) => {
        $module::routes($cfg);
        $crate::__routes_inner!($cfg; $($($rest)*)?);
    };
}

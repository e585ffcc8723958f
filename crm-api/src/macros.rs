//! Utility macros for reducing boilerplate

/// Implement `FromRef<AppState>` so handlers can extract a single field
/// of the shared state.
///
/// # Example
/// ```ignore
/// impl_from_ref!(DynStore, store);
/// // Expands to:
/// impl axum::extract::FromRef<AppState> for DynStore {
///     fn from_ref(state: &AppState) -> Self {
///         state.store.clone()
///     }
/// }
/// ```
#[macro_export]
macro_rules! impl_from_ref {
    ($type:ty, $field:ident) => {
        impl axum::extract::FromRef<$crate::state::AppState> for $type {
            fn from_ref(state: &$crate::state::AppState) -> Self {
                state.$field.clone()
            }
        }
    };
}

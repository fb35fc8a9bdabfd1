//! Authentication state traits and macro.

use crate::jwt::TokenCodec;

/// Trait for state types that can verify access tokens.
pub trait HasAccessCodec {
    fn access_codec(&self) -> &TokenCodec;
}

/// Macro to implement `HasAccessCodec` for state structs holding a token issuer.
///
/// The struct must have an `issuer: Arc<TokenIssuer>` field.
///
/// # Example
/// ```ignore
/// use crate::impl_has_access_codec;
///
/// #[derive(Clone)]
/// pub struct MyState {
///     pub issuer: Arc<TokenIssuer>,
///     // ... other fields
/// }
///
/// impl_has_access_codec!(MyState);
/// ```
#[macro_export]
macro_rules! impl_has_access_codec {
    ($state_type:ty) => {
        impl $crate::auth::HasAccessCodec for $state_type {
            fn access_codec(&self) -> &$crate::jwt::TokenCodec {
                self.issuer.access()
            }
        }
    };
}

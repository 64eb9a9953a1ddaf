use proc_macro::TokenStream;

mod exception;

/// Derive macro declaring an exception type and its place in the hierarchy
///
/// The type must also implement `std::error::Error` (usually through
/// `thiserror`). Supertypes are listed with `extends`; a type may have more
/// than one.
///
/// # Example
/// ```ignore
/// use problemkit::Exception;
///
/// #[derive(Debug, thiserror::Error, Exception)]
/// #[error("no such ghost")]
/// #[exception(extends(GhostException))]
/// pub struct ZuulException;
/// ```
#[proc_macro_derive(Exception, attributes(exception))]
pub fn derive_exception(input: TokenStream) -> TokenStream {
    exception::derive_exception(input)
}
